// Dashboard context - all client-side state in one owned value
use super::connection::ConnectionMonitor;
use super::reading::Reading;
use super::relay::{RelayCoordinator, RelayId};
use super::series::{SeriesBuffers, SeriesError};
use super::statistics::StatisticsSnapshot;
use super::view::ViewSwitcher;
use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub buffers: SeriesBuffers,
    pub relays: RelayCoordinator,
    pub connection: ConnectionMonitor,
    pub views: ViewSwitcher,
    pub statistics: Option<StatisticsSnapshot>,
    pub latest: Option<Reading>,
}

impl Dashboard {
    pub fn new(max_points: usize) -> Self {
        Self {
            buffers: SeriesBuffers::new(max_points),
            relays: RelayCoordinator::new(),
            connection: ConnectionMonitor::new(),
            views: ViewSwitcher::new(),
            statistics: None,
            latest: None,
        }
    }

    /// Apply a successful live poll: connectivity, relay reconciliation,
    /// readouts and one chart point.
    pub fn apply_reading(
        &mut self,
        reading: Reading,
        now: NaiveDateTime,
    ) -> Result<bool, SeriesError> {
        self.connection.record_success(now);
        for relay in RelayId::ALL {
            self.relays.reconcile(relay, reading.relay_state(relay));
        }
        let appended = self.buffers.append_reading(&reading);
        self.latest = Some(reading);
        appended
    }

    /// A failed live poll only changes connectivity. Returns true if it flipped.
    pub fn apply_live_failure(&mut self) -> bool {
        self.connection.record_failure()
    }

    /// History may land after the first live polls; those points survive.
    pub fn apply_history(&mut self, readings: &[Reading]) {
        self.buffers.backfill(readings);
    }

    /// Replace the snapshot wholesale so no stale aggregate survives.
    pub fn replace_statistics(&mut self, snapshot: StatisticsSnapshot) {
        self.statistics = Some(snapshot);
    }
}
