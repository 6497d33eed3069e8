use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};

/// The three aggregation horizons for wrong-answer counters. A closed set:
/// bucket keys roll forward with the calendar and there is no API for
/// historical buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsWindow {
    All,
    Week,
    Month,
}

impl StatsWindow {
    /// The bucket key this window resolves to at a given instant (UTC).
    /// Weeks follow ISO-8601 numbering, so the ISO year is used for the
    /// week bucket, not the calendar year.
    pub fn bucket_key(&self, at: DateTime<Utc>) -> String {
        match self {
            StatsWindow::All => "ALL".to_string(),
            StatsWindow::Week => {
                let iso = at.iso_week();
                format!("WEEK:{}-W{:02}", iso.year(), iso.week())
            }
            StatsWindow::Month => format!("MONTH:{}", at.format("%Y-%m")),
        }
    }
}

impl FromStr for StatsWindow {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALL" => Ok(StatsWindow::All),
            "WEEK" => Ok(StatsWindow::Week),
            "MONTH" => Ok(StatsWindow::Month),
            _ => Err(()),
        }
    }
}

/// The three bucket keys active at a given instant. Every wrong-answer
/// event fans out into exactly these.
pub fn active_buckets(at: DateTime<Utc>) -> [String; 3] {
    [
        StatsWindow::All.bucket_key(at),
        StatsWindow::Week.bucket_key(at),
        StatsWindow::Month.bucket_key(at),
    ]
}
