//! Proxy/VPN check
//!
//! Detection itself lives in [`crate::proxycheck::ProxyResolver`]; this
//! check only routes the cached verdict through its mode.

use std::sync::Arc;

use crate::check::{CheckDescriptor, CheckMode};
use crate::config::ProxyCheckSettings;
use crate::proxycheck::ProxyResolver;
use crate::user::ConnectingUser;

pub struct ProxyCheck {
    descriptor: CheckDescriptor,
    mode: CheckMode,
    message: String,
    resolver: Arc<ProxyResolver>,
}

impl ProxyCheck {
    pub fn new(
        settings: &ProxyCheckSettings,
        message: String,
        resolver: Arc<ProxyResolver>,
    ) -> Self {
        Self {
            descriptor: CheckDescriptor::new("proxy", settings.priority),
            mode: settings.check_mode,
            message,
            resolver,
        }
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// May suspend on a network round-trip the first time an address is
    /// seen; cached verdicts return immediately.
    pub async fn is_detected(&self, user: &ConnectingUser, under_attack: bool) -> bool {
        if self.mode == CheckMode::Never {
            return false;
        }
        let raw = self.resolver.is_proxy(&user.address).await;
        self.mode.evaluate(under_attack, raw)
    }
}
