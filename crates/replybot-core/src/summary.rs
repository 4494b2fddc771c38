//! End-of-run summary.

use std::fmt;

use chrono::{DateTime, Local};

/// Timestamp format used in the summary block.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Counts and timings reported when the operator exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Distinct items observed since the run (or last resume) started.
    pub seen: usize,
    /// Items in the handled set, including those seeded from history.
    pub handled: usize,
    /// When the run started; the binary uses process launch time.
    pub started_at: DateTime<Local>,
    /// When the session terminated.
    pub ended_at: DateTime<Local>,
}

impl RunSummary {
    /// Wall-clock time between start and end.
    pub fn elapsed(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }

    /// Elapsed time as `HH:MM:SS`; hours keep counting past a day.
    pub fn elapsed_hms(&self) -> String {
        let secs = self.elapsed().num_seconds().max(0);
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.started_at.format(TIMESTAMP_FORMAT).to_string();
        let end = self.ended_at.format(TIMESTAMP_FORMAT).to_string();
        writeln!(f, "Shutting down...")?;
        writeln!(f, "  Comments and submissions seen: {:>5}", self.seen)?;
        writeln!(f, "  Comments and submissions replied to: {:>5}", self.handled)?;
        writeln!(f, "  Start time: {:<25}", start)?;
        writeln!(f, "  End time: {:<25}", end)?;
        write!(f, "  Elapsed time: {:<25}", self.elapsed_hms())
    }
}
