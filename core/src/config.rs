//! Configuration for the admission engine
//!
//! This module provides the configuration consumed by the GateGuard core.
//! The surrounding platform is responsible for loading it from disk; the
//! core only validates it and hands the sections to the individual checks.

use crate::check::CheckMode;
use crate::error::{GuardError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Filter countries/cities players can connect from
    pub geographical: GeographicalSettings,

    /// Detect users connecting through proxies or VPNs
    pub proxy_check: ProxyCheckSettings,

    /// Limit how many accounts can be registered from a single address
    pub account_limit: AccountLimitSettings,

    /// Detect clients that never send the client-settings packet
    pub settings_check: SettingsCheckSettings,

    /// Block nicknames matching a regular expression
    pub nickname_check: NicknameCheckSettings,

    /// Detect nicknames similar to recently seen ones
    pub name_similarity: NameSimilaritySettings,

    /// Force new addresses to reconnect once before joining
    pub reconnect: ReconnectSettings,

    /// Force users to ping the server list before joining
    pub server_list: ServerListSettings,

    /// Promote long-lived sessions to the whitelist
    pub auto_whitelist: AutoWhitelistSettings,

    /// Disconnect messages sent on a positive detection
    pub messages: Messages,

    /// Attack-mode tuning and other global switches
    pub misc: MiscSettings,
}

impl GuardConfig {
    /// Validate everything that must be rejected at load time rather than
    /// silently disabling a check: regular expressions and basic bounds.
    pub fn validate(&self) -> Result<()> {
        Regex::new(&self.nickname_check.expression).map_err(|e| {
            GuardError::Config(format!("invalid nickname-check expression: {e}"))
        })?;

        for service in &self.proxy_check.services {
            Regex::new(&service.pattern).map_err(|e| {
                GuardError::Config(format!(
                    "invalid response pattern for proxy service {}: {e}",
                    service.url
                ))
            })?;
        }

        if self.misc.attack_connection_threshold == 0 {
            return Err(GuardError::Config(
                "attack-connection-threshold must be positive".to_string(),
            ));
        }
        if self.misc.attack_reset_interval_secs == 0 {
            return Err(GuardError::Config(
                "attack-reset-interval must be positive".to_string(),
            ));
        }
        if self.account_limit.limit == 0 {
            return Err(GuardError::Config(
                "account limit must be positive".to_string(),
            ));
        }
        if self.name_similarity.history_size == 0 {
            return Err(GuardError::Config(
                "name-similarity history size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Settings for the geographical check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeographicalSettings {
    /// When the check runs (never / only during attack / always)
    pub check_mode: CheckMode,

    /// Checks with bigger priority are evaluated first
    pub priority: u8,

    /// true - listed countries are blocked, false - only listed countries are allowed
    pub is_blacklist: bool,

    /// ISO 3166 country codes
    pub countries: Vec<String>,

    /// Cities that are always blocked
    pub city_blacklist: Vec<String>,
}

impl Default for GeographicalSettings {
    fn default() -> Self {
        Self {
            check_mode: CheckMode::Never,
            priority: 7,
            is_blacklist: false,
            countries: vec!["US".to_string(), "DE".to_string()],
            city_blacklist: Vec::new(),
        }
    }
}

/// A single external proxy-detection service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyServiceSettings {
    /// Endpoint template; `{IP}` is replaced with the connecting address
    pub url: String,

    /// Regex matched against the raw response body; a match means "is a proxy"
    pub pattern: String,
}

/// Settings for the proxy/VPN check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyCheckSettings {
    /// When the check runs
    pub check_mode: CheckMode,

    /// Checks with bigger priority are evaluated first
    pub priority: u8,

    /// External services queried in order; any positive match is sufficient
    pub services: Vec<ProxyServiceSettings>,

    /// How long (seconds) results are cached per address
    pub cache_duration_secs: u64,
}

impl Default for ProxyCheckSettings {
    fn default() -> Self {
        Self {
            check_mode: CheckMode::Always,
            priority: 1,
            services: vec![ProxyServiceSettings {
                url: "https://proxycheck.io/v2/{IP}?risk=1&vpn=1".to_string(),
                pattern: "(yes|VPN)".to_string(),
            }],
            cache_duration_secs: 300,
        }
    }
}

/// Settings for the account-limit check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountLimitSettings {
    /// When the check runs
    pub check_mode: CheckMode,

    /// Checks with bigger priority are evaluated first
    pub priority: u8,

    /// Maximum distinct nicknames per address
    pub limit: usize,
}

impl Default for AccountLimitSettings {
    fn default() -> Self {
        Self {
            check_mode: CheckMode::Always,
            priority: 3,
            limit: 3,
        }
    }
}

/// Settings for the client-settings timing check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsCheckSettings {
    /// Enable or disable this check
    pub enabled: bool,

    /// Seconds after joining within which the settings packet must arrive
    pub delay_secs: u64,
}

impl Default for SettingsCheckSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_secs: 5,
        }
    }
}

/// Settings for the nickname-pattern check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NicknameCheckSettings {
    /// When the check runs
    pub check_mode: CheckMode,

    /// Checks with bigger priority are evaluated first
    pub priority: u8,

    /// Nicknames matching this expression are rejected
    pub expression: String,
}

impl Default for NicknameCheckSettings {
    fn default() -> Self {
        Self {
            check_mode: CheckMode::Always,
            priority: 8,
            expression: "(?i).*(bot|mcdown).*".to_string(),
        }
    }
}

/// Settings for the name-similarity check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NameSimilaritySettings {
    /// When the check runs
    pub check_mode: CheckMode,

    /// Checks with bigger priority are evaluated first
    pub priority: u8,

    /// How many recent nicknames are kept for comparison
    pub history_size: usize,

    /// Edit distance at or below which two names count as similar.
    /// Distance 0 (identical name) is never a detection.
    pub distance: usize,
}

impl Default for NameSimilaritySettings {
    fn default() -> Self {
        Self {
            check_mode: CheckMode::Never,
            priority: 2,
            history_size: 5,
            distance: 1,
        }
    }
}

/// Settings for the reconnect check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectSettings {
    /// When the check runs
    pub check_mode: CheckMode,

    /// Checks with bigger priority are evaluated first
    pub priority: u8,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            check_mode: CheckMode::Attack,
            priority: 4,
        }
    }
}

/// Settings for the server-list ping check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerListSettings {
    /// When the check runs
    pub check_mode: CheckMode,

    /// Checks with bigger priority are evaluated first
    pub priority: u8,
}

impl Default for ServerListSettings {
    fn default() -> Self {
        Self {
            check_mode: CheckMode::Attack,
            priority: 5,
        }
    }
}

/// Settings for automatic whitelisting of long-lived sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoWhitelistSettings {
    /// Enable automatic whitelisting
    pub enabled: bool,

    /// Seconds a session must stay online before its address is whitelisted
    pub time_online_secs: u64,
}

impl Default for AutoWhitelistSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            time_online_secs: 600,
        }
    }
}

/// Disconnect messages, one per detection source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub blacklisted: String,
    pub attack_lockdown: String,
    pub geographical: String,
    pub proxy: String,
    pub account_limit: String,
    pub nickname: String,
    pub name_similarity: String,
    pub reconnect: String,
    pub server_list: String,
    pub settings_packet: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            blacklisted: "You are blacklisted on this server.".to_string(),
            attack_lockdown: "The server is under attack, try joining again in a minute.".to_string(),
            geographical: "Your country is not allowed on this server.".to_string(),
            proxy: "Proxy/VPN connections are not allowed.".to_string(),
            account_limit: "Too many accounts were registered from your address.".to_string(),
            nickname: "Your nickname is not allowed.".to_string(),
            name_similarity: "Your nickname is too similar to a recently seen player.".to_string(),
            reconnect: "Please reconnect to join the server.".to_string(),
            server_list: "Add the server to your server list before joining.".to_string(),
            settings_packet: "Client settings were not received in time.".to_string(),
        }
    }
}

/// Attack-mode tuning and global switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MiscSettings {
    /// Disconnect every non-whitelisted user while an attack is active
    pub lockdown_on_attack: bool,

    /// Connections per reset interval that activate attack mode
    pub attack_connection_threshold: u32,

    /// How often (seconds) the connection counter is reset and attack mode re-evaluated
    pub attack_reset_interval_secs: u64,

    /// How often (seconds) the address store is flushed to the backend
    pub auto_save_interval_secs: u64,

    /// Log every performed detection
    pub debug: bool,
}

impl Default for MiscSettings {
    fn default() -> Self {
        Self {
            lockdown_on_attack: true,
            attack_connection_threshold: 6,
            attack_reset_interval_secs: 80,
            auto_save_interval_secs: 600,
            debug: false,
        }
    }
}
