//! Connectivity console
//!
//! Reads commands from stdin on a plain thread and flips the shared
//! connectivity flag. The forwarder picks the change up on its next frame.

use std::io::BufRead;
use std::thread;

use contracts::{Connectivity, Vin};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Online,
    Offline,
    Toggle,
    Status,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "online" | "on" => Some(Self::Online),
            "offline" | "off" => Some(Self::Offline),
            "toggle" | "t" => Some(Self::Toggle),
            "status" | "s" => Some(Self::Status),
            _ => None,
        }
    }

    /// Apply to the flag, returning the state afterwards
    pub fn apply(self, connectivity: &Connectivity) -> bool {
        match self {
            Self::Online => {
                connectivity.set_online(true);
                true
            }
            Self::Offline => {
                connectivity.set_online(false);
                false
            }
            Self::Toggle => connectivity.toggle(),
            Self::Status => connectivity.is_online(),
        }
    }
}

fn state_label(online: bool) -> &'static str {
    if online {
        "ONLINE"
    } else {
        "OFFLINE"
    }
}

/// Spawn the stdin reader; it exits quietly at end of input
pub fn spawn(connectivity: Connectivity, vin: Vin) {
    let spawned = thread::Builder::new()
        .name("connectivity-console".into())
        .spawn(move || {
            println!("Console: online|on, offline|off, toggle|t, status|s");
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "Console input closed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                match ConsoleCommand::parse(&line) {
                    Some(ConsoleCommand::Status) => {
                        println!("[{}] link is {}", vin.short(), state_label(connectivity.is_online()));
                    }
                    Some(command) => {
                        let online = command.apply(&connectivity);
                        observability::record_connectivity(online);
                        info!(vin = %vin, state = state_label(online), "Connectivity changed from console");
                    }
                    None => println!("Unknown command '{}'", line.trim()),
                }
            }
            debug!("Console reader finished");
        });

    if let Err(e) = spawned {
        warn!(error = %e, "Console unavailable, connectivity stays fixed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(ConsoleCommand::parse("on"), Some(ConsoleCommand::Online));
        assert_eq!(ConsoleCommand::parse(" OFFLINE \n"), Some(ConsoleCommand::Offline));
        assert_eq!(ConsoleCommand::parse("t"), Some(ConsoleCommand::Toggle));
        assert_eq!(ConsoleCommand::parse("status"), Some(ConsoleCommand::Status));
        assert_eq!(ConsoleCommand::parse("reboot"), None);
    }

    #[test]
    fn test_apply() {
        let link = Connectivity::new(true);
        assert!(!ConsoleCommand::Offline.apply(&link));
        assert!(!link.is_online());
        assert!(ConsoleCommand::Toggle.apply(&link));
        assert!(ConsoleCommand::Status.apply(&link));
        assert!(ConsoleCommand::Online.apply(&link));
    }
}
