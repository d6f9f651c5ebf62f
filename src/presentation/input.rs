// Operator input - parses console commands into dashboard events
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::application::events::{DashboardEvent, UserCommand};
use crate::domain::relay::RelayId;

pub const HELP: &str = "\
commands:
  relay <1|2> <on|off>   switch a relay
  view <live|charts|stats|control>
  refresh                fetch live data and statistics now
  help                   show this text
  quit                   leave the dashboard";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown command '{0}', type 'help'")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("no such relay '{0}'")]
    UnknownRelay(String),
    #[error("relay state must be on or off, got '{0}'")]
    BadState(String),
}

fn switch_state(raw: &str) -> Result<bool, InputError> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "1" | "true" => Ok(true),
        "off" | "0" | "false" => Ok(false),
        _ => Err(InputError::BadState(raw.to_string())),
    }
}

/// Parse one line of operator input. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, InputError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match (head.to_ascii_lowercase().as_str(), args) {
        ("relay", [relay, state]) => {
            let relay = relay
                .parse::<RelayId>()
                .map_err(|_| InputError::UnknownRelay(relay.to_string()))?;
            UserCommand::SetRelay {
                relay,
                state: switch_state(state)?,
            }
        }
        ("relay", _) => return Err(InputError::Usage("relay <1|2> <on|off>")),
        ("view" | "tab", [name]) => UserCommand::ShowView(name.to_string()),
        ("view" | "tab", _) => return Err(InputError::Usage("view <name>")),
        ("refresh", []) => UserCommand::Refresh,
        ("help" | "?", []) => UserCommand::Help,
        ("quit" | "exit", []) => UserCommand::Quit,
        _ => return Err(InputError::UnknownCommand(line.trim().to_string())),
    };
    Ok(Some(command))
}

/// Forward parsed commands until the reader closes or the runtime goes away.
/// End of input counts as a quit request only with `quit_on_eof`; a detached
/// stdin (`</dev/null`, a service unit) just stops accepting commands.
pub async fn read_commands<R>(
    reader: R,
    events: mpsc::Sender<DashboardEvent>,
    quit_on_eof: bool,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let event = match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line) {
                Ok(Some(command)) => DashboardEvent::Input(command),
                Ok(None) => continue,
                Err(e) => DashboardEvent::InvalidInput(e.to_string()),
            },
            Ok(None) => {
                tracing::debug!("Operator input closed");
                if quit_on_eof {
                    let _ = events.send(DashboardEvent::Input(UserCommand::Quit)).await;
                }
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to read operator input: {}", e);
                if quit_on_eof {
                    let _ = events.send(DashboardEvent::Input(UserCommand::Quit)).await;
                }
                return;
            }
        };

        let quit = event == DashboardEvent::Input(UserCommand::Quit);
        if events.send(event).await.is_err() || quit {
            return;
        }
    }
}
