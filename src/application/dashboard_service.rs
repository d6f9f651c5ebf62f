// Dashboard service - Owns the dashboard state and applies every event to it
use crate::application::display::Display;
use crate::application::events::{DashboardEvent, UserCommand};
use crate::application::polling_scheduler::Fetcher;
use crate::application::telemetry_api::TelemetryApi;
use crate::domain::dashboard::Dashboard;
use crate::domain::relay::{CommandOutcome, CommandTicket, Resolution};
use crate::domain::series::ChartKind;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct DashboardService<D: Display> {
    dashboard: Dashboard,
    display: D,
    api: Arc<dyn TelemetryApi>,
    fetcher: Fetcher,
    events: mpsc::Sender<DashboardEvent>,
    relay_timeout: Duration,
    tasks: JoinSet<()>,
}

impl<D: Display> DashboardService<D> {
    pub fn new(
        dashboard: Dashboard,
        display: D,
        api: Arc<dyn TelemetryApi>,
        fetcher: Fetcher,
        events: mpsc::Sender<DashboardEvent>,
        relay_timeout: Duration,
    ) -> Self {
        Self {
            dashboard,
            display,
            api,
            fetcher,
            events,
            relay_timeout,
            tasks: JoinSet::new(),
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Process events until the operator quits, then cancel any relay
    /// commands or refreshes still in flight.
    pub async fn run(mut self, mut events: mpsc::Receiver<DashboardEvent>) -> Dashboard {
        self.display.render(&self.dashboard);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if self.handle(event) == Flow::Quit {
                        break;
                    }
                }
                Some(_) = self.tasks.join_next(), if !self.tasks.is_empty() => {}
            }
        }

        self.tasks.shutdown().await;
        self.dashboard
    }

    pub fn handle(&mut self, event: DashboardEvent) -> Flow {
        match event {
            DashboardEvent::Live(Ok(reading)) => {
                let was_online = self.dashboard.connection.status().is_online();
                let now = Local::now().naive_local();
                if let Err(e) = self.dashboard.apply_reading(reading, now) {
                    tracing::error!("Could not chart reading: {}", e);
                }
                if !was_online {
                    tracing::info!("Telemetry API is reachable");
                }
                self.display.render(&self.dashboard);
            }
            DashboardEvent::Live(Err(e)) => {
                let went_offline = self.dashboard.apply_live_failure();
                let connection = &self.dashboard.connection;
                tracing::warn!(
                    "Live fetch failed ({} in a row): {}",
                    connection.consecutive_failures(),
                    e
                );
                if went_offline {
                    match connection.last_success() {
                        Some(at) => {
                            tracing::warn!("Telemetry API went offline, last reading at {}", at)
                        }
                        None => tracing::warn!("Telemetry API went offline"),
                    }
                }
                self.display.render(&self.dashboard);
            }
            DashboardEvent::Statistics(Ok(snapshot)) => {
                tracing::debug!("Statistics received: {:?}", snapshot);
                self.dashboard.replace_statistics(snapshot);
                self.display.render(&self.dashboard);
            }
            DashboardEvent::Statistics(Err(e)) => {
                tracing::warn!("Statistics fetch failed: {}", e);
            }
            DashboardEvent::History(Ok(readings)) => {
                self.dashboard.apply_history(&readings);
                let buffers = &self.dashboard.buffers;
                let charted = buffers.group(ChartKind::Power);
                if charted.is_empty() {
                    tracing::warn!("History backfill returned no readings");
                } else {
                    tracing::info!(
                        "Loaded {} historical readings, charting the last {} (cap {})",
                        readings.len(),
                        charted.len(),
                        buffers.max_points()
                    );
                }
                self.display.render(&self.dashboard);
            }
            DashboardEvent::History(Err(e)) => {
                tracing::warn!("History backfill failed: {}", e);
            }
            DashboardEvent::RelayAck { ticket, outcome } => {
                self.settle_relay(&ticket, &outcome);
            }
            DashboardEvent::Input(command) => return self.execute(command),
            DashboardEvent::InvalidInput(message) => self.display.notify(&message),
        }
        Flow::Continue
    }

    fn execute(&mut self, command: UserCommand) -> Flow {
        match command {
            UserCommand::SetRelay { relay, state } => {
                tracing::info!("Switching {} {}", relay, if state { "ON" } else { "OFF" });
                let ticket = self.dashboard.relays.request_toggle(relay, state);
                self.display.render(&self.dashboard);
                self.send_relay_command(ticket);
            }
            UserCommand::ShowView(name) => match self.dashboard.views.activate(&name) {
                Ok(true) => self.display.render(&self.dashboard),
                Ok(false) => {}
                Err(e) => self.display.notify(&e.to_string()),
            },
            UserCommand::Refresh => {
                self.tasks.spawn(self.fetcher.clone().live());
                self.tasks.spawn(self.fetcher.clone().statistics());
            }
            UserCommand::Help => self.display.show_help(),
            UserCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn send_relay_command(&mut self, ticket: CommandTicket) {
        let api = self.api.clone();
        let events = self.events.clone();
        let limit = self.relay_timeout;

        self.tasks.spawn(async move {
            let outcome =
                match tokio::time::timeout(limit, api.set_relay(ticket.relay, ticket.state)).await {
                    Ok(Ok(())) => CommandOutcome::Acknowledged,
                    Ok(Err(e)) => CommandOutcome::Failed(e.to_string()),
                    Err(_) => CommandOutcome::TimedOut,
                };
            let _ = events.send(DashboardEvent::RelayAck { ticket, outcome }).await;
        });
    }

    fn settle_relay(&mut self, ticket: &CommandTicket, outcome: &CommandOutcome) {
        match self.dashboard.relays.complete(ticket, outcome) {
            Resolution::Settled => {
                tracing::info!("{} command acknowledged", ticket.relay);
            }
            Resolution::RolledBack => {
                if let CommandOutcome::Failed(reason) = outcome {
                    let server = self.dashboard.relays.state(ticket.relay).confirmed;
                    tracing::error!(
                        "{} command failed: {} (server last reported {})",
                        ticket.relay,
                        reason,
                        if server { "ON" } else { "OFF" }
                    );
                }
            }
            Resolution::Released => {
                tracing::warn!(
                    "{} command got no answer within {:?}; waiting for the next poll",
                    ticket.relay,
                    self.relay_timeout
                );
            }
            Resolution::Superseded => {
                tracing::debug!("Ignoring outcome of superseded {} command", ticket.relay);
                return;
            }
        }
        self.display.render(&self.dashboard);
    }
}
