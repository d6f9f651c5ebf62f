// Main entry point - Dependency injection and runtime setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::events::{DashboardEvent, UserCommand};
use crate::application::polling_scheduler::PollingScheduler;
use crate::application::telemetry_api::TelemetryApi;
use crate::domain::dashboard::Dashboard;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_api::HttpTelemetryApi;
use crate::presentation::console::ConsoleSurface;
use crate::presentation::input::read_commands;
use crate::presentation::render::RenderAdapter;

const EVENT_BUFFER: usize = 64;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the dashboard
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_dashboard_config()?;
    tracing::info!("Using telemetry API at {}", config.api.base_url);

    let api: Arc<dyn TelemetryApi> = Arc::new(HttpTelemetryApi::new(
        &config.api.base_url,
        config.request_timeout(),
    )?);

    let (tx, rx) = mpsc::channel::<DashboardEvent>(EVENT_BUFFER);

    let scheduler = PollingScheduler::new(api.clone(), tx.clone(), config.schedule());
    let fetcher = scheduler.fetcher();
    let timers = scheduler.start();

    // Without a terminal, stdin EOF is not a request to stop; Ctrl-C is.
    let interactive = std::io::stdin().is_terminal();
    let input = tokio::spawn(read_commands(
        BufReader::new(tokio::io::stdin()),
        tx.clone(),
        interactive,
    ));

    let interrupt_tx = tx.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = interrupt_tx.send(DashboardEvent::Input(UserCommand::Quit)).await;
        }
    });

    let service = DashboardService::new(
        Dashboard::new(config.charts.max_points),
        RenderAdapter::new(ConsoleSurface::stdout()),
        api,
        fetcher,
        tx,
        config.relay_timeout(),
    );
    service.run(rx).await;

    timers.shutdown().await;
    input.abort();
    interrupt.abort();
    tracing::info!("Dashboard stopped");

    Ok(())
}
