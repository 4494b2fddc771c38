//! Reddit script-app credentials.

use std::fmt;

use replybot_core::BotError;

/// Environment variable for the OAuth client id.
pub const CLIENT_ID_ENV: &str = "REDDIT_CLIENT_ID";
/// Environment variable for the OAuth client secret.
pub const CLIENT_SECRET_ENV: &str = "REDDIT_CLIENT_SECRET";
/// Environment variable for the User-Agent string.
pub const USER_AGENT_ENV: &str = "REDDIT_USER_AGENT";
/// Environment variable for the bot account name.
pub const USERNAME_ENV: &str = "REDDIT_USERNAME";
/// Environment variable for the bot account password.
pub const PASSWORD_ENV: &str = "REDDIT_PASSWORD";

/// Credentials for a script-type Reddit app.
#[derive(Clone)]
pub struct RedditCredentials {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Bot account name.
    pub username: String,
    /// Bot account password.
    pub password: String,
}

impl RedditCredentials {
    /// Reads all five values from the environment.
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads all five values through `lookup`; empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| BotError::Config(format!("Missing {} environment variable", key)))
        };

        Ok(Self {
            client_id: get(CLIENT_ID_ENV)?,
            client_secret: get(CLIENT_SECRET_ENV)?,
            user_agent: get(USER_AGENT_ENV)?,
            username: get(USERNAME_ENV)?,
            password: get(PASSWORD_ENV)?,
        })
    }
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        [
            (CLIENT_ID_ENV, "id"),
            (CLIENT_SECRET_ENV, "secret"),
            (USER_AGENT_ENV, "replybot/0.1 by tester"),
            (USERNAME_ENV, "tester"),
            (PASSWORD_ENV, "hunter2"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect()
    }

    #[test]
    fn test_reads_all_values() {
        let env = full_env();
        let creds = RedditCredentials::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.username, "tester");
        assert_eq!(creds.password, "hunter2");
    }

    #[test]
    fn test_missing_value_names_variable() {
        let mut env = full_env();
        env.remove(PASSWORD_ENV);
        let err = RedditCredentials::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("REDDIT_PASSWORD"));
    }

    #[test]
    fn test_blank_value_is_missing() {
        let mut env = full_env();
        env.insert(CLIENT_ID_ENV, "  ".to_string());
        let err = RedditCredentials::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("REDDIT_CLIENT_ID"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let env = full_env();
        let creds = RedditCredentials::from_lookup(|k| env.get(k).cloned()).unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("<redacted>"));
    }
}
