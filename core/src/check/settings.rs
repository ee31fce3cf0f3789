//! Client-settings timing check
//!
//! Vanilla clients send a settings packet shortly after joining; many bots
//! never do. Unlike the other heuristics this one operates on the session
//! after admission: a deadline task is scheduled per online session and
//! cancelled when the packet arrives or the session ends.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use uuid::Uuid;

use crate::config::SettingsCheckSettings;
use crate::user::OnlineUser;

/// Callback used to disconnect an online session that failed a post-login
/// check. Implemented by the platform layer.
pub type KickHandler = dyn Fn(Uuid, String) + Send + Sync;

pub struct SettingsCheck {
    enabled: bool,
    delay: Duration,
    message: String,
}

impl SettingsCheck {
    pub fn new(settings: &SettingsCheckSettings, message: String) -> Self {
        Self {
            enabled: settings.enabled,
            delay: Duration::from_secs(settings.delay_secs),
            message,
        }
    }

    /// Schedule the deadline for a freshly joined session. The spawned task
    /// is stored on the session and aborted on disconnect.
    pub fn schedule(&self, user: Arc<OnlineUser>, kick: Arc<KickHandler>) {
        if !self.enabled {
            return;
        }

        let delay = self.delay;
        let message = self.message.clone();
        let session = user.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !session.settings_received() {
                debug!(
                    "Session {} ({}) sent no client settings within {:?}",
                    session.id, session.address, delay
                );
                kick(session.id, message);
            }
        });

        *user.settings_timer.lock().unwrap() = Some(handle);
    }
}
