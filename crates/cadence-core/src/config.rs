use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default service loop cadence in seconds.
pub const DEFAULT_TICK_SECS: u64 = 30;
/// Claimed request files older than this are reclaimed and reprocessed.
pub const DEFAULT_CLAIM_STALE_SECS: u64 = 300;

/// Top-level config (cadence.toml + CADENCE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub wake: WakeConfig,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            wake: WakeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Seconds between service loop ticks.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Directory the admin process drops request files into.
    #[serde(default = "default_requests_dir")]
    pub requests_dir: String,
    /// Directory completed deliveries are written to for the external
    /// delivery process.
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: String,
    /// Directory holding one JSON profile per user.
    #[serde(default = "default_users_dir")]
    pub users_dir: String,
    /// Age after which a claimed request file is considered stuck.
    #[serde(default = "default_claim_stale_secs")]
    pub claim_stale_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            requests_dir: default_requests_dir(),
            outbox_dir: default_outbox_dir(),
            users_dir: default_users_dir(),
            claim_stale_secs: default_claim_stale_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeConfig {
    /// When false, a no-op wake adapter is used and a sleeping host simply
    /// won't be woken for reminders.
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// RTC wakealarm device written by the wake adapter.
    #[serde(default = "default_rtc_device")]
    pub rtc_device: String,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rtc_device: default_rtc_device(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_tick_secs() -> u64 {
    DEFAULT_TICK_SECS
}
fn default_claim_stale_secs() -> u64 {
    DEFAULT_CLAIM_STALE_SECS
}
fn default_requests_dir() -> String {
    format!("{}/requests", home_base())
}
fn default_outbox_dir() -> String {
    format!("{}/outbox", home_base())
}
fn default_users_dir() -> String {
    format!("{}/users", home_base())
}
fn default_rtc_device() -> String {
    "/sys/class/rtc/rtc0/wakealarm".to_string()
}

fn home_base() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.cadence")
}

impl CadenceConfig {
    /// Load config from a TOML file with CADENCE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.cadence/cadence.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: CadenceConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("CADENCE_").split("_"))
            .extract()
            .map_err(|e| crate::error::CadenceError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    format!("{}/cadence.toml", home_base())
}
