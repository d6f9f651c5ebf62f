// Single-active-view state machine
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown view '{0}' (expected live, charts, stats or control)")]
pub struct ViewError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Live,
    Charts,
    Stats,
    Control,
}

impl View {
    pub const ALL: [View; 4] = [View::Live, View::Charts, View::Stats, View::Control];

    pub fn name(&self) -> &'static str {
        match self {
            View::Live => "live",
            View::Charts => "charts",
            View::Stats => "stats",
            View::Control => "control",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        View::ALL
            .into_iter()
            .find(|v| v.name() == wanted)
            .ok_or(ViewError(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewSwitcher {
    active: View,
}

impl ViewSwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> View {
        self.active
    }

    pub fn is_active(&self, view: View) -> bool {
        self.active == view
    }

    /// Make `name` the only active view. Returns whether anything changed.
    pub fn activate(&mut self, name: &str) -> Result<bool, ViewError> {
        let target: View = name.parse()?;
        Ok(self.activate_view(target))
    }

    pub fn activate_view(&mut self, target: View) -> bool {
        if self.is_active(target) {
            return false;
        }
        self.active = target;
        true
    }
}
