// Optimistic relay state and reconciliation with server-reported truth
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayId {
    One,
    Two,
}

impl RelayId {
    pub const ALL: [RelayId; 2] = [RelayId::One, RelayId::Two];

    /// Wire number used by `POST /api/relay`.
    pub fn number(&self) -> u8 {
        match self {
            RelayId::One => 1,
            RelayId::Two => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(RelayId::One),
            2 => Some(RelayId::Two),
            _ => None,
        }
    }
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Relay {}", self.number())
    }
}

impl FromStr for RelayId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(RelayId::from_number)
            .ok_or_else(|| format!("unknown relay '{}', expected 1 or 2", s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayState {
    /// What the switch shows; set optimistically on user interaction.
    pub desired: bool,
    /// Last state the server reported.
    pub confirmed: bool,
    /// A command is in flight.
    pub pending: bool,
    generation: u64,
}

/// Identifies one toggle request so its completion can be matched back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTicket {
    pub relay: RelayId,
    pub state: bool,
    previous: bool,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Acknowledged,
    Failed(String),
    TimedOut,
}

/// What applying a command outcome did to the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Settled,
    RolledBack,
    Released,
    Superseded,
}

#[derive(Debug, Clone, Default)]
pub struct RelayCoordinator {
    relays: [RelayState; 2],
}

impl RelayCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, relay: RelayId) -> RelayState {
        self.relays[Self::slot(relay)]
    }

    /// The value the switch should display.
    pub fn displayed(&self, relay: RelayId) -> bool {
        self.state(relay).desired
    }

    fn slot(relay: RelayId) -> usize {
        match relay {
            RelayId::One => 0,
            RelayId::Two => 1,
        }
    }

    /// Optimistically show `state` and hand back a ticket for the command
    /// the caller is about to send.
    pub fn request_toggle(&mut self, relay: RelayId, state: bool) -> CommandTicket {
        let entry = &mut self.relays[Self::slot(relay)];
        let previous = entry.desired;
        entry.generation += 1;
        entry.desired = state;
        entry.pending = true;

        CommandTicket {
            relay,
            state,
            previous,
            generation: entry.generation,
        }
    }

    /// Apply the outcome of a command. Outcomes of tickets replaced by a
    /// newer toggle on the same relay are ignored.
    pub fn complete(&mut self, ticket: &CommandTicket, outcome: &CommandOutcome) -> Resolution {
        let entry = &mut self.relays[Self::slot(ticket.relay)];
        if entry.generation != ticket.generation || !entry.pending {
            return Resolution::Superseded;
        }

        entry.pending = false;
        match outcome {
            CommandOutcome::Acknowledged => Resolution::Settled,
            CommandOutcome::Failed(_) => {
                entry.desired = ticket.previous;
                Resolution::RolledBack
            }
            // Keep the optimistic value; the next poll reconciles it.
            CommandOutcome::TimedOut => Resolution::Released,
        }
    }

    /// Record the server-reported state. `desired` follows it unless a
    /// command is still in flight.
    pub fn reconcile(&mut self, relay: RelayId, server_state: bool) {
        let entry = &mut self.relays[Self::slot(relay)];
        entry.confirmed = server_state;
        if !entry.pending {
            entry.desired = server_state;
        }
    }
}
