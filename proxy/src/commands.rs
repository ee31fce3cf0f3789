//! Admin command surface
//!
//! Text commands operating on the engine: inspect status, manage the
//! blacklist/whitelist, drive test logins, save and reload. Presentation
//! stays plain strings; hosts decide how to render them.

use std::sync::Arc;

use gateguard_core::Guard;

use crate::config::ProxySettings;

pub struct CommandHandler {
    guard: Arc<Guard>,
    config_path: Option<String>,
}

impl CommandHandler {
    pub fn new(guard: Arc<Guard>, config_path: Option<String>) -> Self {
        Self { guard, config_path }
    }

    /// Execute one command line and return the response text.
    pub async fn dispatch(&self, line: &str) -> String {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => String::new(),
            ["help"] => HELP.to_string(),
            ["status"] => self.status().await,
            ["blacklist", "list"] => {
                list(self.guard.store().addresses_matching(|meta| meta.is_blacklisted()))
            }
            ["whitelist", "list"] => {
                list(self.guard.store().addresses_matching(|meta| meta.is_whitelisted()))
            }
            ["blacklist", action @ ("add" | "remove"), token] => {
                self.toggle(token, action == &"add", Flag::Blacklist)
            }
            ["whitelist", action @ ("add" | "remove"), token] => {
                self.toggle(token, action == &"add", Flag::Whitelist)
            }
            ["login", address, nickname] => match self.guard.on_pre_login(address, nickname).await
            {
                Some(message) => format!("Denied: {message}"),
                None => "Admitted.".to_string(),
            },
            ["ping", address] => {
                self.guard.on_server_ping(address);
                format!("Recorded a server-list ping from {address}.")
            }
            ["save"] => match self.guard.save() {
                Ok(()) => "Address cache saved.".to_string(),
                Err(e) => format!("Save failed: {e}"),
            },
            ["reload"] => self.reload().await,
            _ => format!("Unknown command: {line}. Try 'help'."),
        }
    }

    async fn status(&self) -> String {
        let status = self.guard.status().await;
        format!(
            "Attack mode: {}\nConnections this window: {}\nAddresses on record: {} ({} blacklisted, {} whitelisted)\nOnline sessions: {}\nCached proxy verdicts: {}",
            if status.under_attack { "ACTIVE" } else { "inactive" },
            status.window_connections,
            status.addresses,
            status.blacklisted,
            status.whitelisted,
            status.online_sessions,
            status.proxy_cache_entries,
        )
    }

    fn toggle(&self, token: &str, add: bool, flag: Flag) -> String {
        let Some(meta) = self.guard.store().resolve_meta(token) else {
            return format!("Unknown address or nickname: {token}");
        };

        let (current, name) = match flag {
            Flag::Blacklist => (meta.is_blacklisted(), "blacklisted"),
            Flag::Whitelist => (meta.is_whitelisted(), "whitelisted"),
        };
        if add && current {
            return format!("{token} is already {name}.");
        }
        if !add && !current {
            return format!("{token} is not {name}.");
        }

        match flag {
            Flag::Blacklist => meta.set_blacklisted(add),
            Flag::Whitelist => meta.set_whitelisted(add),
        }
        if add {
            format!("{token} is now {name}.")
        } else {
            format!("{token} is no longer {name}.")
        }
    }

    async fn reload(&self) -> String {
        let Some(path) = self.config_path.as_deref() else {
            return "No configuration file was given at startup.".to_string();
        };
        let settings = match ProxySettings::load(Some(path)) {
            Ok(settings) => settings,
            Err(e) => return format!("Reload failed: {e}"),
        };
        match self.guard.reload(settings.guard).await {
            Ok(()) => "Configuration reloaded.".to_string(),
            Err(e) => format!("Reload failed: {e}"),
        }
    }
}

enum Flag {
    Blacklist,
    Whitelist,
}

fn list(mut addresses: Vec<String>) -> String {
    if addresses.is_empty() {
        return "No entries.".to_string();
    }
    addresses.sort();
    addresses.join("\n")
}

const HELP: &str = "Commands:
  status                      engine counters and attack state
  blacklist add|remove <x>    manage the blacklist (address or nickname)
  blacklist list              show blacklisted addresses
  whitelist add|remove <x>    manage the whitelist (address or nickname)
  whitelist list              show whitelisted addresses
  login <address> <nickname>  run an admission attempt
  ping <address>              record a server-list ping
  save                        flush the address cache to storage
  reload                      reload the configuration file";

#[cfg(test)]
mod tests {
    use super::*;
    use gateguard_core::{CheckMode, GuardConfig, GuardError, HttpFetcher, NullBackend,
        NullGeoResolver, Result};
    use async_trait::async_trait;

    struct NoFetch;

    #[async_trait]
    impl HttpFetcher for NoFetch {
        async fn fetch(&self, _url: &str) -> Result<String> {
            Err(GuardError::ProxyService("offline".to_string()))
        }
    }

    fn handler() -> CommandHandler {
        let mut config = GuardConfig::default();
        config.proxy_check.check_mode = CheckMode::Never;
        config.settings_check.enabled = false;
        let guard = Guard::new(
            config,
            Arc::new(NullBackend),
            Arc::new(NullGeoResolver),
            Arc::new(NoFetch),
            Arc::new(|_, _| {}),
        )
        .unwrap();
        CommandHandler::new(guard, None)
    }

    #[tokio::test]
    async fn blacklist_cycle_controls_admission() {
        let handler = handler();
        assert_eq!(
            handler.dispatch("blacklist add 203.0.113.5").await,
            "203.0.113.5 is now blacklisted."
        );
        assert_eq!(
            handler.dispatch("blacklist add 203.0.113.5").await,
            "203.0.113.5 is already blacklisted."
        );
        assert!(handler
            .dispatch("login 203.0.113.5 Steve")
            .await
            .starts_with("Denied:"));

        assert_eq!(
            handler.dispatch("blacklist list").await,
            "203.0.113.5"
        );
        assert_eq!(
            handler.dispatch("blacklist remove 203.0.113.5").await,
            "203.0.113.5 is no longer blacklisted."
        );
        assert_eq!(
            handler.dispatch("login 203.0.113.5 Steve").await,
            "Admitted."
        );
    }

    #[tokio::test]
    async fn nicknames_resolve_to_their_last_address() {
        let handler = handler();
        assert_eq!(
            handler.dispatch("login 203.0.113.5 Steve").await,
            "Admitted."
        );
        assert_eq!(
            handler.dispatch("whitelist add steve").await,
            "steve is now whitelisted."
        );
        assert!(handler
            .guard
            .store()
            .meta_for("203.0.113.5")
            .is_whitelisted());
    }

    #[tokio::test]
    async fn unknown_nickname_is_reported() {
        let handler = handler();
        assert_eq!(
            handler.dispatch("blacklist add Nobody").await,
            "Unknown address or nickname: Nobody"
        );
    }

    #[tokio::test]
    async fn status_reports_counters() {
        let handler = handler();
        handler.dispatch("login 203.0.113.5 Steve").await;
        let status = handler.dispatch("status").await;
        assert!(status.contains("Attack mode: inactive"));
        assert!(status.contains("Connections this window: 1"));
    }

    #[tokio::test]
    async fn unknown_commands_point_at_help() {
        let handler = handler();
        assert!(handler.dispatch("frobnicate").await.contains("help"));
        assert!(!handler.dispatch("").await.contains("help"));
    }
}
