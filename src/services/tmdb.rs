//! TMDB client
//!
//! Implements both show recognition (`/search/tv`, `/search/movie`) and the
//! air-date lookup. Lookup failures are logged and reported as `None`: the
//! pipeline treats "could not confirm" as a per-item skip, never as a run
//! failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{AirDateResolver, MediaRecognizer};
use crate::config::TmdbConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{MediaType, RecognizedMedia};

const SERVICE: &str = "tmdb";
const POSTER_SIZE: &str = "w500";
const BACKDROP_SIZE: &str = "original";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// TV results carry `name`/`first_air_date`, movie results
/// `title`/`release_date`.
#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u64,
    #[serde(alias = "title", default)]
    name: String,
    #[serde(alias = "original_title", default)]
    original_name: String,
    #[serde(alias = "release_date", default)]
    first_air_date: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TvDetails {
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    seasons: Vec<SeasonSummary>,
}

#[derive(Debug, Deserialize)]
struct SeasonSummary {
    season_number: u32,
    #[serde(default)]
    air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeasonDetails {
    #[serde(default)]
    air_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
}

/// TMDB returns `""` for unknown dates; treat that like a missing field.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub struct TmdbClient {
    client: Client,
    config: TmdbConfig,
}

impl TmdbClient {
    pub fn new(
        config: TmdbConfig,
        timeout: Duration,
        user_agent: &str,
        proxy_url: Option<&str>,
    ) -> AppResult<Self> {
        let mut builder = Client::builder().timeout(timeout).user_agent(user_agent);
        if let Some(proxy_url) = proxy_url.filter(|p| !p.trim().is_empty()) {
            let proxy = Proxy::all(proxy_url.trim())
                .map_err(|e| AppError::configuration(format!("Invalid proxy_url: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build()?;

        if config.api_key.trim().is_empty() {
            warn!("TMDB api_key is not configured, every show will be unrecognised");
        }

        Ok(Self { client, config })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        debug!("TMDB request: {} {:?}", path, query);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("language", self.config.language.as_str()),
            ])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE,
                format!("{} returned {}", path, status),
            ));
        }

        Ok(response.json::<T>().await?)
    }

    async fn search(
        &self,
        title: &str,
        year: Option<&str>,
        media_type: MediaType,
    ) -> AppResult<Vec<SearchResult>> {
        let (path, year_param) = match media_type {
            MediaType::Tv => ("/search/tv", "first_air_date_year"),
            MediaType::Movie => ("/search/movie", "year"),
        };

        let mut query = vec![("query", title.to_string())];
        if let Some(year) = year.filter(|y| !y.is_empty()) {
            query.push((year_param, year.to_string()));
        }

        let response: SearchResponse = self.get_json(path, &query).await?;
        Ok(response.results)
    }

    fn image_url(&self, size: &str, path: Option<String>) -> Option<String> {
        non_empty(path).map(|p| {
            format!(
                "{}/{}/{}",
                self.config.image_base_url.trim_end_matches('/'),
                size,
                p.trim_start_matches('/')
            )
        })
    }

    fn to_media(&self, result: SearchResult, media_type: MediaType) -> RecognizedMedia {
        let year = non_empty(result.first_air_date)
            .and_then(|date| date.get(..4).map(str::to_string));
        RecognizedMedia {
            tmdb_id: result.id,
            title: result.name,
            year,
            media_type,
            overview: non_empty(result.overview),
            poster_url: self.image_url(POSTER_SIZE, result.poster_path),
            backdrop_url: self.image_url(BACKDROP_SIZE, result.backdrop_path),
        }
    }

    async fn lookup_air_date(&self, tmdb_id: u64, season: Option<u32>) -> AppResult<Option<String>> {
        if let Some(season) = season {
            match self
                .get_json::<SeasonDetails>(&format!("/tv/{tmdb_id}/season/{season}"), &[])
                .await
            {
                Ok(details) => {
                    if let Some(date) =
                        non_empty(details.air_date).or_else(|| non_empty(details.first_air_date))
                    {
                        return Ok(Some(date));
                    }
                }
                Err(e) => debug!("Season {} lookup for TMDB {} failed: {}", season, tmdb_id, e),
            }
        }

        let details: TvDetails = self.get_json(&format!("/tv/{tmdb_id}"), &[]).await?;

        if let Some(season) = season {
            let season_date = details
                .seasons
                .iter()
                .find(|s| s.season_number == season)
                .and_then(|s| non_empty(s.air_date.clone()));
            if season_date.is_some() {
                return Ok(season_date);
            }
        }

        Ok(non_empty(details.first_air_date).or_else(|| non_empty(details.release_date)))
    }
}

#[async_trait]
impl MediaRecognizer for TmdbClient {
    async fn recognize(
        &self,
        title: &str,
        year: Option<&str>,
        media_type: MediaType,
    ) -> Option<RecognizedMedia> {
        if self.config.api_key.trim().is_empty() || title.trim().is_empty() {
            return None;
        }

        let mut results = match self.search(title, year, media_type).await {
            Ok(results) => results,
            Err(e) => {
                warn!("TMDB search for '{}' failed: {}", title, e);
                return None;
            }
        };

        // The feed's year is sometimes the broadcast year of a later season.
        if results.is_empty() && year.is_some() {
            results = match self.search(title, None, media_type).await {
                Ok(results) => results,
                Err(e) => {
                    warn!("TMDB search for '{}' failed: {}", title, e);
                    return None;
                }
            };
        }

        let position = results
            .iter()
            .position(|r| r.name == title || r.original_name == title)
            .unwrap_or(0);
        if position >= results.len() {
            debug!("TMDB has no match for '{}'", title);
            return None;
        }
        let result = results.swap_remove(position);
        Some(self.to_media(result, media_type))
    }
}

#[async_trait]
impl AirDateResolver for TmdbClient {
    async fn resolve_air_date(&self, tmdb_id: u64, season: Option<u32>) -> Option<String> {
        match self.lookup_air_date(tmdb_id, season).await {
            Ok(date) => date,
            Err(e) => {
                warn!("Failed to resolve TMDB air date for {}: {}", tmdb_id, e);
                None
            }
        }
    }
}
