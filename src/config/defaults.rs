//! Configuration default values
//!
//! Defaults for every configuration option, kept in one place.

// Feed defaults
pub const DEFAULT_RSS_DOMAIN: &str = "https://rsshub.app";
pub const DEFAULT_RSS_PATH: &str = "/douban/tv/coming";
pub const DEFAULT_HISTORY_NAMESPACE: &str = "doubantvcoming";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("tv-coming/", env!("CARGO_PKG_VERSION"));

// Filter defaults
pub const DEFAULT_MIN_WISH: u64 = 5000;
pub const DEFAULT_AIR_DATE_WITHIN_DAYS: u32 = 7;

// Time defaults
pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";

// TMDB defaults
pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_TMDB_LANGUAGE: &str = "zh-CN";

// Storage defaults
pub const DEFAULT_HISTORY_PATH: &str = "./data/history.json";
pub const DEFAULT_SUBSCRIPTIONS_PATH: &str = "./data/subscriptions.json";

// Notification defaults
pub const DEFAULT_SOURCE_LABEL: &str = "豆瓣即将播出订阅";
pub const DEFAULT_SUBSCRIBER_NAME: &str = "豆瓣即将播出剧集";

// Web server defaults
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8089;
