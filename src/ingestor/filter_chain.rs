//! The five-stage admission filter
//!
//! Stages run in a fixed order and the first rejection wins:
//!
//! 1. seen before (dedup key already in history)
//! 2. wish count below the threshold
//! 3. no region in the region allowlist
//! 4. no genre in the genre allowlist
//! 5. air date missing or outside `[today, today + window]`
//!
//! Stages 1-4 only need the feed item and run before any external lookup
//! ([`FilterChain::admit`]). Stage 5 needs the resolved air date and runs
//! after recognition ([`FilterChain::check_air_date`]).

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;

use crate::config::FilterSettings;
use crate::models::ItemAttributes;
use crate::utils::time::is_within_days;

/// Run-scoped filter parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub min_popularity: u64,
    /// Empty matches every item
    pub region_allowlist: Vec<String>,
    /// Empty matches every item
    pub genre_allowlist: Vec<String>,
    pub air_date_window_days: u32,
}

impl From<&FilterSettings> for FilterConfig {
    fn from(settings: &FilterSettings) -> Self {
        Self {
            min_popularity: settings.min_wish,
            region_allowlist: settings.region_filters.clone(),
            genre_allowlist: settings.genre_filters.clone(),
            air_date_window_days: settings.air_date_within_days,
        }
    }
}

/// Why an item was stopped by the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRejection {
    AlreadyProcessed,
    BelowThreshold {
        popularity: u64,
        minimum: u64,
    },
    RegionMismatch {
        regions: Vec<String>,
        allowed: Vec<String>,
    },
    GenreMismatch {
        genres: Vec<String>,
        allowed: Vec<String>,
    },
    AirDateUnresolved,
    AirDateOutOfWindow {
        air_date: String,
        window_days: u32,
    },
}

impl fmt::Display for FilterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyProcessed => write!(f, "already processed"),
            Self::BelowThreshold {
                popularity,
                minimum,
            } => write!(f, "wish count {popularity} below threshold {minimum}"),
            Self::RegionMismatch { regions, allowed } => {
                write!(f, "regions {regions:?} not in selected filters {allowed:?}")
            }
            Self::GenreMismatch { genres, allowed } => {
                write!(f, "genres {genres:?} not in selected filters {allowed:?}")
            }
            Self::AirDateUnresolved => write!(f, "no air date available"),
            Self::AirDateOutOfWindow {
                air_date,
                window_days,
            } => write!(f, "air date {air_date} not within {window_days} days"),
        }
    }
}

/// True when the allowlist is empty or shares at least one value with `values`.
pub fn match_any(values: &[String], allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
    values.iter().any(|value| allowed.contains(value.as_str()))
}

/// Filter chain bound to one run's configuration and "today".
#[derive(Debug, Clone)]
pub struct FilterChain {
    config: FilterConfig,
    today: NaiveDate,
}

impl FilterChain {
    pub fn new(config: FilterConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    /// Stages 1-4.
    pub fn admit(
        &self,
        unique_key: &str,
        attributes: &ItemAttributes,
        seen: &HashSet<String>,
    ) -> Result<(), FilterRejection> {
        if seen.contains(unique_key) {
            return Err(FilterRejection::AlreadyProcessed);
        }

        if attributes.popularity < self.config.min_popularity {
            return Err(FilterRejection::BelowThreshold {
                popularity: attributes.popularity,
                minimum: self.config.min_popularity,
            });
        }

        if !match_any(&attributes.regions, &self.config.region_allowlist) {
            return Err(FilterRejection::RegionMismatch {
                regions: attributes.regions.clone(),
                allowed: self.config.region_allowlist.clone(),
            });
        }

        if !match_any(&attributes.genres, &self.config.genre_allowlist) {
            return Err(FilterRejection::GenreMismatch {
                genres: attributes.genres.clone(),
                allowed: self.config.genre_allowlist.clone(),
            });
        }

        Ok(())
    }

    /// Stage 5: the date must resolve and satisfy `0 <= date - today <= window`.
    pub fn check_air_date(&self, air_date: Option<&str>) -> Result<(), FilterRejection> {
        let Some(air_date) = air_date.filter(|d| !d.trim().is_empty()) else {
            return Err(FilterRejection::AirDateUnresolved);
        };

        if is_within_days(air_date, self.config.air_date_window_days, self.today) {
            Ok(())
        } else {
            Err(FilterRejection::AirDateOutOfWindow {
                air_date: air_date.to_string(),
                window_days: self.config.air_date_window_days,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn config(min: u64, regions: &[&str], genres: &[&str], window: u32) -> FilterConfig {
        FilterConfig {
            min_popularity: min,
            region_allowlist: regions.iter().map(|s| s.to_string()).collect(),
            genre_allowlist: genres.iter().map(|s| s.to_string()).collect(),
            air_date_window_days: window,
        }
    }

    fn attrs(popularity: u64, regions: &[&str], genres: &[&str]) -> ItemAttributes {
        ItemAttributes {
            popularity,
            year: Some("2024".to_string()),
            regions: regions.iter().map(|s| s.to_string()).collect(),
            genres: genres.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_threshold_boundary() {
        let chain = FilterChain::new(config(5000, &[], &[], 7), today());
        let seen = HashSet::new();
        assert!(chain.admit("k", &attrs(5000, &[], &[]), &seen).is_ok());
        assert_eq!(
            chain.admit("k", &attrs(4999, &[], &[]), &seen),
            Err(FilterRejection::BelowThreshold {
                popularity: 4999,
                minimum: 5000
            })
        );
    }

    #[test]
    fn test_seen_before_wins_over_everything() {
        let chain = FilterChain::new(config(5000, &["日本"], &[], 7), today());
        let seen: HashSet<String> = ["k".to_string()].into_iter().collect();
        assert_eq!(
            chain.admit("k", &attrs(0, &["美国"], &[]), &seen),
            Err(FilterRejection::AlreadyProcessed)
        );
    }

    #[test]
    fn test_empty_allowlist_matches_all() {
        let chain = FilterChain::new(config(0, &[], &[], 7), today());
        let seen = HashSet::new();
        assert!(chain.admit("k", &attrs(0, &["冰岛"], &["默片"]), &seen).is_ok());
        assert!(chain.admit("k", &attrs(0, &[], &[]), &seen).is_ok());
    }

    #[test]
    fn test_region_match_any() {
        let seen = HashSet::new();
        let item = attrs(0, &["美国"], &[]);

        let chain = FilterChain::new(config(0, &["日本", "美国"], &[], 7), today());
        assert!(chain.admit("k", &item, &seen).is_ok());

        let chain = FilterChain::new(config(0, &["日本"], &[], 7), today());
        assert!(matches!(
            chain.admit("k", &item, &seen),
            Err(FilterRejection::RegionMismatch { .. })
        ));
    }

    #[test]
    fn test_genre_checked_after_region() {
        let seen = HashSet::new();
        let chain = FilterChain::new(config(0, &["日本"], &["喜剧"], 7), today());
        assert!(matches!(
            chain.admit("k", &attrs(0, &["日本"], &["剧情"]), &seen),
            Err(FilterRejection::GenreMismatch { .. })
        ));
        assert!(matches!(
            chain.admit("k", &attrs(0, &["美国"], &["剧情"]), &seen),
            Err(FilterRejection::RegionMismatch { .. })
        ));
        assert!(chain.admit("k", &attrs(0, &["日本"], &["喜剧", "剧情"]), &seen).is_ok());
    }

    #[test]
    fn test_window_boundaries() {
        let chain = FilterChain::new(config(0, &[], &[], 0), today());
        assert!(chain.check_air_date(Some("2024-05-10")).is_ok());

        let yesterday = (today() - Duration::days(1)).format("%Y-%m-%d").to_string();
        for window in [0, 7, 3650] {
            let chain = FilterChain::new(config(0, &[], &[], window), today());
            assert!(matches!(
                chain.check_air_date(Some(&yesterday)),
                Err(FilterRejection::AirDateOutOfWindow { .. })
            ));
        }

        let chain = FilterChain::new(config(0, &[], &[], 7), today());
        assert!(chain.check_air_date(Some("2024-05-17")).is_ok());
        assert!(chain.check_air_date(Some("2024-05-18")).is_err());
    }

    #[test]
    fn test_unresolved_air_date_rejects() {
        let chain = FilterChain::new(config(0, &[], &[], 7), today());
        assert_eq!(chain.check_air_date(None), Err(FilterRejection::AirDateUnresolved));
        assert_eq!(chain.check_air_date(Some("  ")), Err(FilterRejection::AirDateUnresolved));
        assert!(matches!(
            chain.check_air_date(Some("2024-13-40")),
            Err(FilterRejection::AirDateOutOfWindow { .. })
        ));
    }

    #[test]
    fn test_filter_config_from_settings() {
        let settings = FilterSettings {
            min_wish: 100,
            air_date_within_days: 3,
            region_filters: vec!["韩国".to_string()],
            genre_filters: vec![],
        };
        let config = FilterConfig::from(&settings);
        assert_eq!(config.min_popularity, 100);
        assert_eq!(config.air_date_window_days, 3);
        assert_eq!(config.region_allowlist, vec!["韩国"]);
    }
}
