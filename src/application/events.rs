// Events consumed by the dashboard runtime
use crate::application::telemetry_api::ApiError;
use crate::domain::reading::Reading;
use crate::domain::relay::{CommandOutcome, CommandTicket, RelayId};
use crate::domain::statistics::StatisticsSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    Live(Result<Reading, ApiError>),
    Statistics(Result<StatisticsSnapshot, ApiError>),
    History(Result<Vec<Reading>, ApiError>),
    RelayAck {
        ticket: CommandTicket,
        outcome: CommandOutcome,
    },
    Input(UserCommand),
    /// A line the operator typed that did not parse.
    InvalidInput(String),
}

/// Operator requests, already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    SetRelay { relay: RelayId, state: bool },
    ShowView(String),
    Refresh,
    Help,
    Quit,
}
