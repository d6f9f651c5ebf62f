use crate::application::polling_scheduler::PollingSchedule;
use crate::domain::series::DEFAULT_MAX_POINTS;
use crate::domain::statistics::StatsPeriod;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiSettings,
    pub polling: PollingSettings,
    pub charts: ChartSettings,
    pub relay: RelaySettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiSettings {
    /// Includes the `/api` prefix.
    pub base_url: String,
    pub request_timeout_ms: Option<u64>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/api".to_string(),
            request_timeout_ms: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingSettings {
    pub live_interval_ms: u64,
    pub stats_interval_ms: u64,
    pub history_hours: u32,
    pub stats_period: StatsPeriod,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            live_interval_ms: 2000,
            stats_interval_ms: 60_000,
            history_hours: 24,
            stats_period: StatsPeriod::Day,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub max_points: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RelaySettings {
    pub command_timeout_ms: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            command_timeout_ms: 10_000,
        }
    }
}

impl DashboardConfig {
    pub fn schedule(&self) -> PollingSchedule {
        PollingSchedule {
            live_interval: Duration::from_millis(self.polling.live_interval_ms),
            stats_interval: Duration::from_millis(self.polling.stats_interval_ms),
            history_hours: self.polling.history_hours,
            stats_period: self.polling.stats_period,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay.command_timeout_ms)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.api.base_url.trim().is_empty(), "api.base_url cannot be empty");
        anyhow::ensure!(
            self.polling.live_interval_ms > 0,
            "polling.live_interval_ms must be positive"
        );
        anyhow::ensure!(
            self.polling.stats_interval_ms > 0,
            "polling.stats_interval_ms must be positive"
        );
        anyhow::ensure!(self.charts.max_points > 0, "charts.max_points must be positive");
        anyhow::ensure!(
            self.relay.command_timeout_ms > 0,
            "relay.command_timeout_ms must be positive"
        );
        Ok(())
    }
}

/// Defaults, then `config/dashboard.toml` if present, then `DASHBOARD__*` variables.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    load_from(
        config::File::with_name("config/dashboard").required(false),
        env_overrides(),
    )
}

fn env_overrides() -> config::Environment {
    config::Environment::with_prefix("DASHBOARD")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn load_from<F, E>(file: F, env: E) -> anyhow::Result<DashboardConfig>
where
    F: config::Source + Send + Sync + 'static,
    E: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(env)
        .build()?;

    let config: DashboardConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
