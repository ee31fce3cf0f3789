//! The admission check chain
//!
//! Orders the configured heuristics once, descending by priority, and
//! evaluates them against each connecting user, short-circuiting on the
//! first positive detection. The lockdown check sits structurally in front
//! of the sorted list.

use std::sync::Arc;

use dashmap::DashSet;

use crate::check::{
    AccountLimitCheck, Detection, GeographicalCheck, GuardCheck, LockdownCheck, NameHistory,
    NameSimilarityCheck, NicknameCheck, ProxyCheck, ReconnectCheck, ServerListCheck,
};
use crate::config::GuardConfig;
use crate::error::Result;
use crate::geo::GeoResolver;
use crate::proxycheck::ProxyResolver;
use crate::storage::AddressStore;
use crate::user::ConnectingUser;

pub struct CheckChain {
    lockdown: LockdownCheck,
    checks: Vec<GuardCheck>,
}

impl CheckChain {
    /// Sorts the checks descending by priority; ties keep their given
    /// order. The order is fixed until the chain is rebuilt.
    pub fn new(lockdown: LockdownCheck, mut checks: Vec<GuardCheck>) -> Self {
        checks.sort_by(|a, b| b.descriptor().priority.cmp(&a.descriptor().priority));
        Self { lockdown, checks }
    }

    /// Build every configured check from the config, wiring in the shared
    /// state that must survive configuration reloads.
    pub fn from_config(
        config: &GuardConfig,
        store: Arc<AddressStore>,
        geo: Arc<dyn GeoResolver>,
        resolver: Arc<ProxyResolver>,
        reconnect_seen: Arc<DashSet<String>>,
        name_history: Arc<NameHistory>,
    ) -> Result<Self> {
        let messages = &config.messages;
        let lockdown = LockdownCheck::new(
            config.misc.lockdown_on_attack,
            messages.attack_lockdown.clone(),
        );
        let checks = vec![
            GuardCheck::Geographical(GeographicalCheck::new(
                &config.geographical,
                messages.geographical.clone(),
                geo,
            )),
            GuardCheck::Proxy(ProxyCheck::new(
                &config.proxy_check,
                messages.proxy.clone(),
                resolver,
            )),
            GuardCheck::AccountLimit(AccountLimitCheck::new(
                &config.account_limit,
                messages.account_limit.clone(),
                store.clone(),
            )),
            GuardCheck::Nickname(NicknameCheck::from_settings(
                &config.nickname_check,
                messages.nickname.clone(),
            )?),
            GuardCheck::NameSimilarity(NameSimilarityCheck::new(
                &config.name_similarity,
                messages.name_similarity.clone(),
                name_history,
            )),
            GuardCheck::Reconnect(ReconnectCheck::new(
                &config.reconnect,
                messages.reconnect.clone(),
                reconnect_seen,
            )),
            GuardCheck::ServerList(ServerListCheck::new(
                &config.server_list,
                messages.server_list.clone(),
                store,
            )),
        ];
        Ok(Self::new(lockdown, checks))
    }

    /// Evaluate the chain. Returns the first positive detection, or `None`
    /// to admit. Checks after a positive one are never evaluated.
    pub async fn evaluate(
        &self,
        user: &ConnectingUser,
        under_attack: bool,
    ) -> Option<Detection> {
        if self.lockdown.is_detected(under_attack) {
            return Some(Detection {
                check: self.lockdown.descriptor().name,
                message: self.lockdown.message().to_string(),
            });
        }

        for check in &self.checks {
            if check.is_detected(user, under_attack).await {
                return Some(Detection {
                    check: check.descriptor().name,
                    message: check.message().to_string(),
                });
            }
        }
        None
    }

    /// The sorted checks, for status listings.
    pub fn checks(&self) -> &[GuardCheck] {
        &self.checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckMode;
    use crate::config::{NicknameCheckSettings, ReconnectSettings};

    fn nickname_check(priority: u8, expression: &str, message: &str) -> GuardCheck {
        let settings = NicknameCheckSettings {
            check_mode: CheckMode::Always,
            priority,
            expression: expression.to_string(),
        };
        GuardCheck::Nickname(
            NicknameCheck::from_settings(&settings, message.to_string()).unwrap(),
        )
    }

    #[tokio::test]
    async fn first_positive_detection_wins_and_later_checks_never_run() {
        let seen = Arc::new(DashSet::new());
        let reconnect = ReconnectCheck::new(
            &ReconnectSettings {
                check_mode: CheckMode::Always,
                priority: 1,
            },
            "reconnect".to_string(),
            seen.clone(),
        );

        let chain = CheckChain::new(
            LockdownCheck::new(true, "lockdown".to_string()),
            vec![
                nickname_check(10, "no-match-expected", "high"),
                nickname_check(5, "^Steve$", "middle"),
                GuardCheck::Reconnect(reconnect),
            ],
        );

        let user = ConnectingUser::new("203.0.113.5", "Steve");
        let detection = chain.evaluate(&user, false).await.unwrap();
        assert_eq!(detection.message, "middle");
        assert!(
            seen.is_empty(),
            "the priority-1 check must not have been evaluated"
        );
    }

    #[tokio::test]
    async fn checks_run_in_descending_priority_order() {
        let chain = CheckChain::new(
            LockdownCheck::new(true, "lockdown".to_string()),
            vec![
                nickname_check(1, "^Steve$", "low"),
                nickname_check(9, "^Steve$", "high"),
            ],
        );

        let user = ConnectingUser::new("203.0.113.5", "Steve");
        let detection = chain.evaluate(&user, false).await.unwrap();
        assert_eq!(detection.message, "high");

        let priorities: Vec<u8> = chain
            .checks()
            .iter()
            .map(|check| check.descriptor().priority)
            .collect();
        assert_eq!(priorities, vec![9, 1]);
    }

    #[tokio::test]
    async fn lockdown_runs_before_everything() {
        let chain = CheckChain::new(
            LockdownCheck::new(true, "lockdown".to_string()),
            vec![nickname_check(200, "^Steve$", "nickname")],
        );

        let user = ConnectingUser::new("203.0.113.5", "Steve");
        let detection = chain.evaluate(&user, true).await.unwrap();
        assert_eq!(detection.check, "lockdown");
    }

    #[tokio::test]
    async fn no_detection_admits() {
        let chain = CheckChain::new(
            LockdownCheck::new(true, "lockdown".to_string()),
            vec![nickname_check(5, "^Bot$", "nickname")],
        );

        let user = ConnectingUser::new("203.0.113.5", "Steve");
        assert!(chain.evaluate(&user, false).await.is_none());
    }
}
