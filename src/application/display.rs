// Port for whatever shows the dashboard
use crate::domain::dashboard::Dashboard;

pub trait Display {
    /// Repaint from current state. Must not fail on partial data.
    fn render(&mut self, dashboard: &Dashboard);

    /// One-off message for the operator (bad command, help text).
    fn notify(&mut self, message: &str);

    fn show_help(&mut self);
}
