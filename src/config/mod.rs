//! Service configuration
//!
//! Loaded from a TOML file (`CONFIG_FILE`, default `config.toml`). Every
//! field has a default so a partial file is enough; a missing file is created
//! with the defaults on first start.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// IANA zone used for "today" and for history timestamps
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub subscriptions: SubscriptionConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// RSSHub instance, normalised to `scheme://host[:port]`
    #[serde(default = "default_rss_domain")]
    pub rss_domain: String,
    #[serde(default = "default_rss_path")]
    pub rss_path: String,
    /// Route the feed and TMDB requests through `proxy_url`
    #[serde(default)]
    pub use_proxy: bool,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Prefix of every history dedup key
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default = "default_min_wish")]
    pub min_wish: u64,
    #[serde(default = "default_air_date_within_days")]
    pub air_date_within_days: u32,
    /// Empty means every region passes
    #[serde(default)]
    pub region_filters: Vec<String>,
    /// Empty means every genre passes
    #[serde(default)]
    pub genre_filters: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Cron expression with seconds, e.g. `0 0 9 * * *`
    #[serde(default)]
    pub cron: String,
    /// Run once shortly after start, then reset to false
    #[serde(default)]
    pub run_once: bool,
    /// Wipe the history at start, then reset to false
    #[serde(default)]
    pub clear_history: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_tmdb_language")]
    pub language: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Folders scanned for existing shows, one show per sub-folder
    #[serde(default)]
    pub roots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    #[serde(default = "default_subscriptions_path")]
    pub ledger_path: PathBuf,
    /// Recorded as the requesting user on each subscription
    #[serde(default = "default_subscriber_name")]
    pub subscriber_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// POST target for notifications; log only when unset
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Link attached to "subscription added" messages
    #[serde(default)]
    pub subscribe_page_url: Option<String>,
    #[serde(default = "default_source_label")]
    pub source_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_rss_domain() -> String {
    DEFAULT_RSS_DOMAIN.to_string()
}

fn default_rss_path() -> String {
    DEFAULT_RSS_PATH.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_namespace() -> String {
    DEFAULT_HISTORY_NAMESPACE.to_string()
}

fn default_min_wish() -> u64 {
    DEFAULT_MIN_WISH
}

fn default_air_date_within_days() -> u32 {
    DEFAULT_AIR_DATE_WITHIN_DAYS
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_tmdb_base_url() -> String {
    DEFAULT_TMDB_BASE_URL.to_string()
}

fn default_tmdb_image_base_url() -> String {
    DEFAULT_TMDB_IMAGE_BASE_URL.to_string()
}

fn default_tmdb_language() -> String {
    DEFAULT_TMDB_LANGUAGE.to_string()
}

fn default_subscriptions_path() -> PathBuf {
    PathBuf::from(DEFAULT_SUBSCRIPTIONS_PATH)
}

fn default_subscriber_name() -> String {
    DEFAULT_SUBSCRIBER_NAME.to_string()
}

fn default_source_label() -> String {
    DEFAULT_SOURCE_LABEL.to_string()
}

fn default_history_path() -> PathBuf {
    PathBuf::from(DEFAULT_HISTORY_PATH)
}

fn default_web_enabled() -> bool {
    true
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            rss_domain: default_rss_domain(),
            rss_path: default_rss_path(),
            use_proxy: false,
            proxy_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            namespace: default_namespace(),
        }
    }
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            min_wish: default_min_wish(),
            air_date_within_days: default_air_date_within_days(),
            region_filters: Vec::new(),
            genre_filters: Vec::new(),
        }
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
            language: default_tmdb_language(),
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_subscriptions_path(),
            subscriber_name: default_subscriber_name(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            subscribe_page_url: None,
            source_label: default_source_label(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: default_web_enabled(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl FeedConfig {
    /// Full feed URL built from the normalised domain and the route.
    pub fn rss_url(&self) -> String {
        let domain = crate::utils::url::normalize_rss_domain(&self.rss_domain);
        crate::utils::url::build_rss_url(&domain, &self.rss_path)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            default_config.save_to_file(config_file)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }

    /// Write the configuration back, used to reset the one-shot flags.
    pub fn save_to_file(&self, config_file: &str) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(config_file, contents)?;
        Ok(())
    }
}
