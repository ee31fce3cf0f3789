//! The guard context object
//!
//! [`Guard`] wires every component together and exposes the handlers the
//! platform listeners call: pre-login admission, server-list pings, session
//! join/settings/disconnect, and shutdown. Background tasks hold a shared
//! reference instead of reaching into global state.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use dashmap::{DashMap, DashSet};
use log::{debug, error, info};
use uuid::Uuid;

use crate::attack::AttackTracker;
use crate::check::settings::KickHandler;
use crate::check::{NameHistory, SettingsCheck};
use crate::config::GuardConfig;
use crate::error::Result;
use crate::geo::GeoResolver;
use crate::pipeline::CheckChain;
use crate::proxycheck::{HttpFetcher, ProxyResolver};
use crate::storage::backend::StorageBackend;
use crate::storage::AddressStore;
use crate::user::{ConnectingUser, OnlineUser};

/// Everything rebuilt on a configuration reload, swapped atomically under
/// one lock so in-flight admissions see a consistent chain.
struct Runtime {
    chain: CheckChain,
    resolver: Arc<ProxyResolver>,
    settings_check: SettingsCheck,
}

/// Aggregated counters for the status command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub under_attack: bool,
    pub window_connections: u32,
    pub addresses: usize,
    pub blacklisted: usize,
    pub whitelisted: usize,
    pub online_sessions: usize,
    pub proxy_cache_entries: usize,
}

/// The admission engine.
pub struct Guard {
    config: RwLock<GuardConfig>,
    store: Arc<AddressStore>,
    attack: Arc<AttackTracker>,
    backend: Arc<dyn StorageBackend>,
    geo: Arc<dyn GeoResolver>,
    fetcher: Arc<dyn HttpFetcher>,
    kick: Arc<KickHandler>,

    /// Online sessions, keyed by the platform's session id
    sessions: DashMap<Uuid, Arc<OnlineUser>>,

    /// Addresses seen at least once this process lifetime (reconnect check)
    reconnect_seen: Arc<DashSet<String>>,

    /// Recent nicknames across all addresses (name-similarity check)
    name_history: Arc<NameHistory>,

    runtime: tokio::sync::RwLock<Runtime>,
}

impl Guard {
    /// Validate the configuration, load persisted addresses and build the
    /// check chain. A backend load failure is logged and the engine starts
    /// with an empty cache; a configuration error aborts startup.
    pub fn new(
        config: GuardConfig,
        backend: Arc<dyn StorageBackend>,
        geo: Arc<dyn GeoResolver>,
        fetcher: Arc<dyn HttpFetcher>,
        kick: Arc<KickHandler>,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        let store = Arc::new(AddressStore::new());
        match backend.load() {
            Ok(records) => {
                info!("Loaded {} addresses from the storage backend", records.len());
                store.absorb(records);
            }
            Err(e) => error!("Could not load data from the storage backend: {e}"),
        }

        let attack = Arc::new(AttackTracker::new(config.misc.attack_connection_threshold));
        let reconnect_seen = Arc::new(DashSet::new());
        let name_history = Arc::new(NameHistory::new());

        let resolver = Arc::new(ProxyResolver::from_settings(
            &config.proxy_check,
            fetcher.clone(),
        )?);
        let chain = CheckChain::from_config(
            &config,
            store.clone(),
            geo.clone(),
            resolver.clone(),
            reconnect_seen.clone(),
            name_history.clone(),
        )?;
        let settings_check = SettingsCheck::new(
            &config.settings_check,
            config.messages.settings_packet.clone(),
        );

        Ok(Arc::new(Self {
            config: RwLock::new(config),
            store,
            attack,
            backend,
            geo,
            fetcher,
            kick,
            sessions: DashMap::new(),
            reconnect_seen,
            name_history,
            runtime: tokio::sync::RwLock::new(Runtime {
                chain,
                resolver,
                settings_check,
            }),
        }))
    }

    /// Admission entry point, called once per connection attempt before the
    /// protocol handshake completes. Returns the disconnect message for a
    /// denied attempt, or `None` to admit.
    ///
    /// The connection is counted against the attack window exactly once,
    /// before any verdict, so the attack state it may trip applies to this
    /// very attempt. Blacklisted addresses are denied before any check
    /// runs; whitelisted addresses bypass every check including lockdown.
    pub async fn on_pre_login(&self, address: &str, nickname: &str) -> Option<String> {
        self.attack.record_connection();

        let meta = self.store.meta_for(address);
        if meta.is_blacklisted() {
            return Some(self.config.read().unwrap().messages.blacklisted.clone());
        }
        if meta.is_whitelisted() {
            self.store.record_nickname(address, nickname);
            return None;
        }

        let user = ConnectingUser::new(address, nickname);
        let under_attack = self.attack.is_under_attack();
        let runtime = self.runtime.read().await;
        if let Some(detection) = runtime.chain.evaluate(&user, under_attack).await {
            if self.config.read().unwrap().misc.debug {
                info!(
                    "{} check detected {} ({})",
                    detection.check, user.nickname, user.address
                );
            }
            return Some(detection.message);
        }
        drop(runtime);

        self.store.record_nickname(address, nickname);
        None
    }

    /// Record a server-list ping from an address.
    pub fn on_server_ping(&self, address: &str) {
        self.store.mark_pinged(address);
    }

    /// Register a session that passed admission and schedule its
    /// client-settings deadline.
    pub async fn on_join(&self, session_id: Uuid, address: &str) {
        let user = Arc::new(OnlineUser::new(session_id, address));
        self.sessions.insert(session_id, user.clone());
        let runtime = self.runtime.read().await;
        runtime.settings_check.schedule(user, self.kick.clone());
    }

    /// The client-settings packet arrived for a session.
    pub fn on_settings_received(&self, session_id: Uuid) {
        if let Some(user) = self.sessions.get(&session_id) {
            user.mark_settings_received();
            user.cancel_settings_timer();
        }
    }

    /// Drop all transient per-session state; cancels the settings deadline.
    pub fn on_disconnect(&self, session_id: Uuid) {
        if let Some((_, user)) = self.sessions.remove(&session_id) {
            user.cancel_settings_timer();
            debug!("Session {session_id} ({}) removed", user.address);
        }
    }

    /// Whitelist the addresses of sessions that have been online long
    /// enough; run from the periodic scan task.
    pub fn auto_whitelist_tick(&self) {
        let (enabled, required) = {
            let config = self.config.read().unwrap();
            (
                config.auto_whitelist.enabled,
                Duration::from_secs(config.auto_whitelist.time_online_secs),
            )
        };
        if !enabled {
            return;
        }

        for entry in self.sessions.iter() {
            let user = entry.value();
            if user.joined_at.elapsed() < required {
                continue;
            }
            let meta = self.store.meta_for(&user.address);
            if !meta.is_whitelisted() {
                meta.set_whitelisted(true);
                info!(
                    "Auto-whitelisted {} after being online for {:?}",
                    user.address, required
                );
            }
        }
    }

    /// Flush the address cache to the backend.
    pub fn save(&self) -> Result<()> {
        self.backend.save(&self.store.snapshot())
    }

    /// Drop expired proxy verdicts; run from the periodic sweep task.
    pub async fn evict_proxy_cache(&self) {
        self.runtime.read().await.resolver.evict_expired();
    }

    /// Re-validate and apply a reloaded configuration. Check priorities are
    /// fixed for the process lifetime: values from the incoming config are
    /// ignored in favor of the ones loaded at startup, and take effect
    /// after a restart. Runtime caches (reconnect history, nickname
    /// history, address cache) survive the reload; the proxy verdict cache
    /// is rebuilt.
    pub async fn reload(&self, mut incoming: GuardConfig) -> Result<()> {
        incoming.validate()?;

        {
            let current = self.config.read().unwrap();
            incoming.geographical.priority = current.geographical.priority;
            incoming.proxy_check.priority = current.proxy_check.priority;
            incoming.account_limit.priority = current.account_limit.priority;
            incoming.nickname_check.priority = current.nickname_check.priority;
            incoming.name_similarity.priority = current.name_similarity.priority;
            incoming.reconnect.priority = current.reconnect.priority;
            incoming.server_list.priority = current.server_list.priority;
        }

        let resolver = Arc::new(ProxyResolver::from_settings(
            &incoming.proxy_check,
            self.fetcher.clone(),
        )?);
        let chain = CheckChain::from_config(
            &incoming,
            self.store.clone(),
            self.geo.clone(),
            resolver.clone(),
            self.reconnect_seen.clone(),
            self.name_history.clone(),
        )?;
        let settings_check = SettingsCheck::new(
            &incoming.settings_check,
            incoming.messages.settings_packet.clone(),
        );
        self.attack
            .set_threshold(incoming.misc.attack_connection_threshold);

        {
            let mut runtime = self.runtime.write().await;
            *runtime = Runtime {
                chain,
                resolver,
                settings_check,
            };
        }
        *self.config.write().unwrap() = incoming;
        info!("Configuration reloaded");
        Ok(())
    }

    /// Cancel session timers and persist the address cache one final time.
    pub async fn shutdown(&self) {
        for entry in self.sessions.iter() {
            entry.value().cancel_settings_timer();
        }
        self.sessions.clear();
        if let Err(e) = self.save() {
            error!("Could not save data during shutdown: {e}");
        } else {
            info!("Address cache saved, goodbye");
        }
    }

    /// Aggregated counters for the status command.
    pub async fn status(&self) -> StatusReport {
        StatusReport {
            under_attack: self.attack.is_under_attack(),
            window_connections: self.attack.current_window_count(),
            addresses: self.store.len(),
            blacklisted: self
                .store
                .addresses_matching(|meta| meta.is_blacklisted())
                .len(),
            whitelisted: self
                .store
                .addresses_matching(|meta| meta.is_whitelisted())
                .len(),
            online_sessions: self.sessions.len(),
            proxy_cache_entries: self.runtime.read().await.resolver.cache_size(),
        }
    }

    pub fn store(&self) -> &Arc<AddressStore> {
        &self.store
    }

    pub fn attack(&self) -> &AttackTracker {
        &self.attack
    }

    /// Snapshot of the active configuration.
    pub fn config(&self) -> GuardConfig {
        self.config.read().unwrap().clone()
    }
}
