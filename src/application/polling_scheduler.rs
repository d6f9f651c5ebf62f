// Polling scheduler - live, statistics and one-time history fetches
use crate::application::events::DashboardEvent;
use crate::application::telemetry_api::TelemetryApi;
use crate::domain::statistics::StatsPeriod;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone)]
pub struct PollingSchedule {
    pub live_interval: Duration,
    pub stats_interval: Duration,
    pub history_hours: u32,
    pub stats_period: StatsPeriod,
}

impl Default for PollingSchedule {
    fn default() -> Self {
        Self {
            live_interval: Duration::from_millis(2000),
            stats_interval: Duration::from_millis(60_000),
            history_hours: 24,
            stats_period: StatsPeriod::Day,
        }
    }
}

/// Runs single fetches and delivers their typed result as an event.
#[derive(Clone)]
pub struct Fetcher {
    api: Arc<dyn TelemetryApi>,
    events: mpsc::Sender<DashboardEvent>,
    period: StatsPeriod,
}

impl Fetcher {
    pub fn new(
        api: Arc<dyn TelemetryApi>,
        events: mpsc::Sender<DashboardEvent>,
        period: StatsPeriod,
    ) -> Self {
        Self {
            api,
            events,
            period,
        }
    }

    pub async fn live(self) {
        tracing::debug!("Fetching latest reading");
        let result = self.api.latest().await;
        let _ = self.events.send(DashboardEvent::Live(result)).await;
    }

    pub async fn statistics(self) {
        tracing::debug!("Fetching {} statistics", self.period);
        let result = self.api.statistics(self.period).await;
        let _ = self.events.send(DashboardEvent::Statistics(result)).await;
    }

    pub async fn history(self, hours: u32) {
        tracing::debug!("Fetching {}h of history", hours);
        let result = self.api.history(hours).await;
        let _ = self.events.send(DashboardEvent::History(result)).await;
    }
}

pub struct PollingScheduler {
    fetcher: Fetcher,
    schedule: PollingSchedule,
}

impl PollingScheduler {
    pub fn new(
        api: Arc<dyn TelemetryApi>,
        events: mpsc::Sender<DashboardEvent>,
        schedule: PollingSchedule,
    ) -> Self {
        let fetcher = Fetcher::new(api, events, schedule.stats_period);
        Self { fetcher, schedule }
    }

    pub fn fetcher(&self) -> Fetcher {
        self.fetcher.clone()
    }

    /// Spawn the timers plus the one-time history fetch. None of them waits
    /// on another; the dashboard merges history under early live points.
    pub fn start(self) -> SchedulerHandle {
        let PollingSchedule {
            live_interval,
            stats_interval,
            history_hours,
            ..
        } = self.schedule;

        let history = tokio::spawn(self.fetcher.clone().history(history_hours));

        let live_fetcher = self.fetcher.clone();
        let live = tokio::spawn(async move {
            tick_forever(live_interval, move || live_fetcher.clone().live()).await;
        });

        let stats_fetcher = self.fetcher;
        let stats = tokio::spawn(async move {
            tick_forever(stats_interval, move || stats_fetcher.clone().statistics()).await;
        });

        tracing::info!(
            "Polling every {:?} (statistics every {:?}, {}h backfill)",
            live_interval,
            stats_interval,
            history_hours
        );

        SchedulerHandle {
            timers: vec![history, live, stats],
        }
    }
}

// Fire on a constant cadence. Each tick gets its own task so a slow fetch
// never delays the next one; in-flight fetches die with this future.
async fn tick_forever<F, Fut>(period: Duration, mut fetch: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                in_flight.spawn(fetch());
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
}

/// Owns the timer tasks; dropping it without `shutdown` leaves them running.
pub struct SchedulerHandle {
    timers: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub async fn shutdown(self) {
        for timer in &self.timers {
            timer.abort();
        }
        futures::future::join_all(self.timers).await;
        tracing::info!("Polling stopped");
    }
}
