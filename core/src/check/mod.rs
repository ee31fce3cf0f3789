//! Heuristic checks and their evaluation modes
//!
//! Every heuristic exposes a raw detection predicate and routes it through
//! [`CheckMode::evaluate`], the single place where mode semantics live.
//! The pipeline dispatches over [`GuardCheck`], a tagged list sorted once
//! at configuration load.

pub mod account_limit;
pub mod geographical;
pub mod lockdown;
pub mod name_similarity;
pub mod nickname;
pub mod proxy;
pub mod reconnect;
pub mod server_list;
pub mod settings;

use serde::{Deserialize, Serialize};

use crate::user::ConnectingUser;

pub use account_limit::AccountLimitCheck;
pub use geographical::GeographicalCheck;
pub use lockdown::LockdownCheck;
pub use name_similarity::{NameHistory, NameSimilarityCheck};
pub use nickname::NicknameCheck;
pub use proxy::ProxyCheck;
pub use reconnect::ReconnectCheck;
pub use server_list::ServerListCheck;
pub use settings::SettingsCheck;

/// When a check is allowed to produce a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckMode {
    /// Check is disabled
    Never,

    /// Check runs only while an attack is active
    Attack,

    /// Check always runs
    Always,
}

impl CheckMode {
    /// Route a raw detection result through the mode contract. This is the
    /// only place mode semantics are implemented; every heuristic calls it
    /// instead of re-implementing the switch.
    pub fn evaluate(self, under_attack: bool, detected: bool) -> bool {
        match self {
            CheckMode::Never => false,
            CheckMode::Always => detected,
            CheckMode::Attack => under_attack && detected,
        }
    }
}

/// Static identity of a check: its name and its place in the chain.
/// Priorities are assigned at configuration load and stay fixed for the
/// process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDescriptor {
    pub name: &'static str,
    pub priority: u8,
}

impl CheckDescriptor {
    pub fn new(name: &'static str, priority: u8) -> Self {
        Self { name, priority }
    }
}

/// A positive detection: which check fired and the disconnect message it
/// was configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub check: &'static str,
    pub message: String,
}

/// The priority-ordered heuristics, as a tagged list so the chain can be
/// sorted once and dispatched without virtual calls. The lockdown check is
/// not part of this list; the chain holds it separately so its maximum
/// priority is structural rather than conventional.
pub enum GuardCheck {
    Geographical(GeographicalCheck),
    Proxy(ProxyCheck),
    AccountLimit(AccountLimitCheck),
    Nickname(NicknameCheck),
    NameSimilarity(NameSimilarityCheck),
    Reconnect(ReconnectCheck),
    ServerList(ServerListCheck),
}

impl GuardCheck {
    pub fn descriptor(&self) -> &CheckDescriptor {
        match self {
            GuardCheck::Geographical(check) => check.descriptor(),
            GuardCheck::Proxy(check) => check.descriptor(),
            GuardCheck::AccountLimit(check) => check.descriptor(),
            GuardCheck::Nickname(check) => check.descriptor(),
            GuardCheck::NameSimilarity(check) => check.descriptor(),
            GuardCheck::Reconnect(check) => check.descriptor(),
            GuardCheck::ServerList(check) => check.descriptor(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GuardCheck::Geographical(check) => check.message(),
            GuardCheck::Proxy(check) => check.message(),
            GuardCheck::AccountLimit(check) => check.message(),
            GuardCheck::Nickname(check) => check.message(),
            GuardCheck::NameSimilarity(check) => check.message(),
            GuardCheck::Reconnect(check) => check.message(),
            GuardCheck::ServerList(check) => check.message(),
        }
    }

    /// Evaluate the check against a connecting user. Only the proxy check
    /// suspends; everything else is computed from in-memory state.
    pub async fn is_detected(&self, user: &ConnectingUser, under_attack: bool) -> bool {
        match self {
            GuardCheck::Geographical(check) => check.is_detected(user, under_attack),
            GuardCheck::Proxy(check) => check.is_detected(user, under_attack).await,
            GuardCheck::AccountLimit(check) => check.is_detected(user, under_attack),
            GuardCheck::Nickname(check) => check.is_detected(user, under_attack),
            GuardCheck::NameSimilarity(check) => check.is_detected(user, under_attack),
            GuardCheck::Reconnect(check) => check.is_detected(user, under_attack),
            GuardCheck::ServerList(check) => check.is_detected(user, under_attack),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_ignores_the_raw_result() {
        for raw in [false, true] {
            for attack in [false, true] {
                assert!(!CheckMode::Never.evaluate(attack, raw));
            }
        }
    }

    #[test]
    fn always_passes_the_raw_result_through() {
        for raw in [false, true] {
            for attack in [false, true] {
                assert_eq!(CheckMode::Always.evaluate(attack, raw), raw);
            }
        }
    }

    #[test]
    fn attack_gates_on_the_attack_flag() {
        for raw in [false, true] {
            for attack in [false, true] {
                assert_eq!(CheckMode::Attack.evaluate(attack, raw), raw && attack);
            }
        }
    }
}
