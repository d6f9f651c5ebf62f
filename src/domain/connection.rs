// Reachability of the telemetry API, derived from live-data fetches only
use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityStatus {
    Online,
    #[default]
    Offline,
}

impl ConnectivityStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityStatus::Online)
    }
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityStatus::Online => f.write_str("Online"),
            ConnectivityStatus::Offline => f.write_str("Offline"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionMonitor {
    status: ConnectivityStatus,
    consecutive_failures: u32,
    last_success: Option<NaiveDateTime>,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectivityStatus {
        self.status
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_success(&self) -> Option<NaiveDateTime> {
        self.last_success
    }

    /// Returns true if the status flipped.
    pub fn record_success(&mut self, at: NaiveDateTime) -> bool {
        let changed = self.status != ConnectivityStatus::Online;
        self.status = ConnectivityStatus::Online;
        self.consecutive_failures = 0;
        self.last_success = Some(at);
        changed
    }

    /// Returns true if the status flipped.
    pub fn record_failure(&mut self) -> bool {
        let changed = self.status != ConnectivityStatus::Offline;
        self.status = ConnectivityStatus::Offline;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        changed
    }
}
