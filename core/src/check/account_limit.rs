//! Account-limit check
//!
//! Caps how many distinct nicknames may register from one address. A user
//! re-joining with a nickname already on record is never blocked by this
//! check, even when the address is at its limit.

use std::sync::Arc;

use crate::check::{CheckDescriptor, CheckMode};
use crate::config::AccountLimitSettings;
use crate::storage::AddressStore;
use crate::user::ConnectingUser;

pub struct AccountLimitCheck {
    descriptor: CheckDescriptor,
    mode: CheckMode,
    message: String,
    limit: usize,
    store: Arc<AddressStore>,
}

impl AccountLimitCheck {
    pub fn new(
        settings: &AccountLimitSettings,
        message: String,
        store: Arc<AddressStore>,
    ) -> Self {
        Self {
            descriptor: CheckDescriptor::new("account-limit", settings.priority),
            mode: settings.check_mode,
            message,
            limit: settings.limit,
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
        let meta = self.store.meta_for(&user.address);
        let raw = meta.nickname_count() >= self.limit && !meta.has_nickname(&user.nickname);
        self.mode.evaluate(under_attack, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(store: Arc<AddressStore>) -> AccountLimitCheck {
        let settings = AccountLimitSettings {
            check_mode: CheckMode::Always,
            limit: 3,
            ..AccountLimitSettings::default()
        };
        AccountLimitCheck::new(&settings, "limit".to_string(), store)
    }

    #[test]
    fn fourth_distinct_nickname_is_detected() {
        let store = Arc::new(AddressStore::new());
        for nickname in ["One", "Two", "Three"] {
            store.record_nickname("203.0.113.5", nickname);
        }
        let check = check(store);
        assert!(check.is_detected(&ConnectingUser::new("203.0.113.5", "Four"), false));
    }

    #[test]
    fn known_nicknames_stay_admitted_at_the_limit() {
        let store = Arc::new(AddressStore::new());
        for nickname in ["One", "Two", "Three"] {
            store.record_nickname("203.0.113.5", nickname);
        }
        let check = check(store);
        for nickname in ["One", "two", "THREE"] {
            assert!(
                !check.is_detected(&ConnectingUser::new("203.0.113.5", nickname), false),
                "{nickname} is already on record"
            );
        }
    }

    #[test]
    fn below_the_limit_nothing_is_detected() {
        let store = Arc::new(AddressStore::new());
        store.record_nickname("203.0.113.5", "One");
        let check = check(store);
        assert!(!check.is_detected(&ConnectingUser::new("203.0.113.5", "Two"), false));
    }
}
