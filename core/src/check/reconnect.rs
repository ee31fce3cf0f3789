//! Reconnect check
//!
//! Forces an address to connect twice before it may join: most bots try
//! once and move on. "First ever" is scoped to the current process
//! lifetime; the seen-set survives configuration reloads but not restarts.

use std::sync::Arc;

use dashmap::DashSet;

use crate::check::{CheckDescriptor, CheckMode};
use crate::config::ReconnectSettings;
use crate::user::ConnectingUser;

pub struct ReconnectCheck {
    descriptor: CheckDescriptor,
    mode: CheckMode,
    message: String,
    seen: Arc<DashSet<String>>,
}

impl ReconnectCheck {
    pub fn new(settings: &ReconnectSettings, message: String, seen: Arc<DashSet<String>>) -> Self {
        Self {
            descriptor: CheckDescriptor::new("reconnect", settings.priority),
            mode: settings.check_mode,
            message,
            seen,
        }
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_detected(&self, user: &ConnectingUser, under_attack: bool) -> bool {
        // The raw result is computed (and the address marked as seen) even
        // when the mode suppresses it, so an address observed during calm
        // periods is not asked to reconnect once an attack starts.
        let first_time = self.seen.insert(user.address.clone());
        self.mode.evaluate(under_attack, first_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(mode: CheckMode) -> ReconnectCheck {
        let settings = ReconnectSettings {
            check_mode: mode,
            ..ReconnectSettings::default()
        };
        ReconnectCheck::new(&settings, "reconnect".to_string(), Arc::new(DashSet::new()))
    }

    #[test]
    fn first_attempt_is_detected_and_second_passes() {
        let check = check(CheckMode::Always);
        let user = ConnectingUser::new("203.0.113.5", "Steve");
        assert!(check.is_detected(&user, false));
        assert!(!check.is_detected(&user, false));
    }

    #[test]
    fn addresses_seen_before_an_attack_pass_during_it() {
        let check = check(CheckMode::Attack);
        let user = ConnectingUser::new("203.0.113.5", "Steve");
        assert!(!check.is_detected(&user, false), "calm period, mode gates it off");
        assert!(
            !check.is_detected(&user, true),
            "already seen, so no detection under attack either"
        );

        let newcomer = ConnectingUser::new("198.51.100.7", "Alex");
        assert!(check.is_detected(&newcomer, true));
    }
}
