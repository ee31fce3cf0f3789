//! Server-list ping check
//!
//! A vanilla client adds the server to its list (issuing a status ping)
//! before joining; most bots connect straight away. Pings are recorded by
//! the platform through `Guard::on_server_ping`.

use std::sync::Arc;

use crate::check::{CheckDescriptor, CheckMode};
use crate::config::ServerListSettings;
use crate::storage::AddressStore;
use crate::user::ConnectingUser;

pub struct ServerListCheck {
    descriptor: CheckDescriptor,
    mode: CheckMode,
    message: String,
    store: Arc<AddressStore>,
}

impl ServerListCheck {
    pub fn new(settings: &ServerListSettings, message: String, store: Arc<AddressStore>) -> Self {
        Self {
            descriptor: CheckDescriptor::new("server-list", settings.priority),
            mode: settings.check_mode,
            message,
            store,
        }
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_detected(&self, user: &ConnectingUser, under_attack: bool) -> bool {
        self.mode
            .evaluate(under_attack, !self.store.has_pinged(&user.address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_before_login_passes() {
        let store = Arc::new(AddressStore::new());
        let settings = ServerListSettings {
            check_mode: CheckMode::Always,
            ..ServerListSettings::default()
        };
        let check = ServerListCheck::new(&settings, "ping first".to_string(), store.clone());
        let user = ConnectingUser::new("203.0.113.5", "Steve");

        assert!(check.is_detected(&user, false));
        store.mark_pinged("203.0.113.5");
        assert!(!check.is_detected(&user, false));
    }
}
