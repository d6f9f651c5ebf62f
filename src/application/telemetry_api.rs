// API trait for the meter server's HTTP interface
use crate::domain::reading::Reading;
use crate::domain::relay::RelayId;
use crate::domain::statistics::{StatisticsSnapshot, StatsPeriod};
use async_trait::async_trait;
use thiserror::Error;

/// Every way a call to the meter server can fail. Transport and server
/// errors are treated the same for connectivity purposes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TelemetryApi: Send + Sync {
    /// Most recent reading (`GET /latest`)
    async fn latest(&self) -> Result<Reading, ApiError>;

    /// Aggregates over a rolling period (`GET /stats?period=`)
    async fn statistics(&self, period: StatsPeriod) -> Result<StatisticsSnapshot, ApiError>;

    /// Readings from the last `hours`, oldest first (`GET /history?hours=`)
    async fn history(&self, hours: u32) -> Result<Vec<Reading>, ApiError>;

    /// Ask the server to switch a relay (`POST /relay`). Only the
    /// acknowledgement matters; the state is confirmed by later polls.
    async fn set_relay(&self, relay: RelayId, state: bool) -> Result<(), ApiError>;
}
