//! Pipeline orchestrator
//!
//! One run fetches the feed, walks the items in feed order and, for each item
//! that survives the filter chain, recognises it, checks the library and the
//! subscription ledger, subscribes, notifies and records a history marker.
//! History is loaded once at the start of a run and saved once at the end.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use super::extractor::{extract, split_season};
use super::filter_chain::{FilterChain, FilterConfig, FilterRejection};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::{sort_newest_first, CandidateItem, HistoryRecord, MediaType};
use crate::repositories::HistoryStore;
use crate::services::notification::subscription_added;
use crate::services::{
    AirDateResolver, LibraryIndex, MediaRecognizer, Notifier, SubscriptionService,
};
use crate::sources::FeedFetcher;
use crate::utils::time::{parse_timezone, timestamp_in, today_in};

/// Run parameters, fixed when the pipeline is built.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub feed_url: String,
    pub use_proxy: bool,
    pub namespace: String,
    pub filters: FilterConfig,
    pub timezone: Tz,
    pub source_label: String,
    pub subscribe_page_url: Option<String>,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let timezone =
            parse_timezone(&config.time.timezone).map_err(AppError::configuration)?;
        Ok(Self {
            feed_url: config.feed.rss_url(),
            use_proxy: config.feed.use_proxy,
            namespace: config.feed.namespace.clone(),
            filters: FilterConfig::from(&config.filters),
            timezone,
            source_label: config.notification.source_label.clone(),
            subscribe_page_url: config.notification.subscribe_page_url.clone(),
        })
    }
}

/// The services a run talks to.
#[derive(Clone)]
pub struct PipelineCollaborators {
    pub fetcher: Arc<dyn FeedFetcher>,
    pub history: Arc<dyn HistoryStore>,
    pub recognizer: Arc<dyn MediaRecognizer>,
    pub air_dates: Arc<dyn AirDateResolver>,
    pub library: Arc<dyn LibraryIndex>,
    pub subscriptions: Arc<dyn SubscriptionService>,
    pub notifier: Arc<dyn Notifier>,
}

/// Why an item did not lead to a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Filtered(FilterRejection),
    NotRecognized,
    InLibrary,
    AlreadySubscribed,
    SubscriptionFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Filtered(rejection) => write!(f, "{rejection}"),
            SkipReason::NotRecognized => write!(f, "not recognised"),
            SkipReason::InLibrary => write!(f, "already in library"),
            SkipReason::AlreadySubscribed => write!(f, "already subscribed"),
            SkipReason::SubscriptionFailed(message) => {
                write!(f, "subscription failed: {message}")
            }
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub fetched: usize,
    pub subscribed: usize,
    pub skipped: usize,
    /// The feed could not be fetched or was empty; history was not touched
    pub aborted: bool,
    /// Stopped at an item boundary; what was recorded so far is saved
    pub cancelled: bool,
}

impl RunSummary {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            fetched: 0,
            subscribed: 0,
            skipped: 0,
            aborted: false,
            cancelled: false,
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    collaborators: PipelineCollaborators,
    run_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, collaborators: PipelineCollaborators) -> Self {
        Self {
            config,
            collaborators,
            run_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run once with "today" taken from the configured time zone.
    ///
    /// Fails with [`AppError::OperationInProgress`] while another run holds
    /// the lock.
    pub async fn run_once(&self, cancel: &CancellationToken) -> AppResult<RunSummary> {
        let today = today_in(self.config.timezone);
        self.run_for_date(cancel, today).await
    }

    pub async fn run_for_date(
        &self,
        cancel: &CancellationToken,
        today: NaiveDate,
    ) -> AppResult<RunSummary> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            return Err(AppError::operation_in_progress(
                "run",
                self.config.feed_url.clone(),
            ));
        };

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id);
        self.run_locked(run_id, cancel, today).instrument(span).await
    }

    /// Empty the history. Waits for a running run to finish first.
    pub async fn clear_history(&self) -> AppResult<()> {
        let _guard = self.run_lock.lock().await;
        self.collaborators.history.clear().await?;
        info!("History cleared");
        Ok(())
    }

    /// Every recorded item, newest first.
    pub async fn history_snapshot(&self) -> AppResult<Vec<HistoryRecord>> {
        let mut records = self.collaborators.history.load().await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn run_locked(
        &self,
        run_id: Uuid,
        cancel: &CancellationToken,
        today: NaiveDate,
    ) -> AppResult<RunSummary> {
        let mut summary = RunSummary::new(run_id);
        let feed_url = &self.config.feed_url;

        let mut history = self.collaborators.history.load().await?;
        let mut seen: HashSet<String> = history.iter().map(|r| r.unique.clone()).collect();

        info!("Fetching upcoming shows from {}", feed_url);
        let items = match self
            .collaborators
            .fetcher
            .fetch(feed_url, self.config.use_proxy)
            .await
        {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => {
                error!("Feed {} returned no items", feed_url);
                summary.aborted = true;
                return Ok(summary);
            }
            Err(e) => {
                error!("Feed {} could not be fetched: {}", feed_url, e);
                summary.aborted = true;
                return Ok(summary);
            }
        };
        summary.fetched = items.len();
        info!("Feed {} returned {} items", feed_url, items.len());

        let chain = FilterChain::new(self.config.filters.clone(), today);

        for item in &items {
            if cancel.is_cancelled() {
                info!("Run cancelled, saving progress");
                summary.cancelled = true;
                break;
            }

            match self.process_item(item, &chain, &seen).await {
                Ok(record) => {
                    seen.insert(record.unique.clone());
                    history.push(record);
                    summary.subscribed += 1;
                }
                Err(reason) => {
                    summary.skipped += 1;
                    match &reason {
                        SkipReason::SubscriptionFailed(_) => {
                            error!("{}: {}", item.title, reason)
                        }
                        SkipReason::NotRecognized => warn!(
                            "{} ({}): {}",
                            item.title, item.link, reason
                        ),
                        _ => info!("{}: {}", item.title, reason),
                    }
                }
            }
        }

        self.collaborators.history.save(&history).await?;
        info!(
            "Run finished: {} fetched, {} subscribed, {} skipped",
            summary.fetched, summary.subscribed, summary.skipped
        );
        Ok(summary)
    }

    async fn process_item(
        &self,
        item: &CandidateItem,
        chain: &FilterChain,
        seen: &HashSet<String>,
    ) -> Result<HistoryRecord, SkipReason> {
        let unique = item.unique_key(&self.config.namespace);
        let attributes = extract(&item.description, &item.category);
        debug!(
            "{}: popularity {}, regions {:?}, genres {:?}",
            item.title, attributes.popularity, attributes.regions, attributes.genres
        );

        chain
            .admit(&unique, &attributes, seen)
            .map_err(SkipReason::Filtered)?;

        let (name, season) = split_season(&item.title);
        let media = self
            .collaborators
            .recognizer
            .recognize(&name, attributes.year.as_deref(), MediaType::Tv)
            .await
            .ok_or(SkipReason::NotRecognized)?;

        let air_date = self
            .collaborators
            .air_dates
            .resolve_air_date(media.tmdb_id, season)
            .await;
        chain
            .check_air_date(air_date.as_deref())
            .map_err(SkipReason::Filtered)?;

        if self.collaborators.library.exists(&media, season).await {
            return Err(SkipReason::InLibrary);
        }
        if self.collaborators.subscriptions.exists(&media, season).await {
            return Err(SkipReason::AlreadySubscribed);
        }

        let result = self.collaborators.subscriptions.create(&media, season).await;
        if result.id.is_none() {
            return Err(SkipReason::SubscriptionFailed(result.message));
        }

        let notification = subscription_added(
            &media,
            season,
            &item.description,
            &item.link,
            &self.config.source_label,
            self.config.subscribe_page_url.as_deref(),
        );
        if let Err(e) = self.collaborators.notifier.notify(&notification).await {
            warn!("Notification for {} failed: {}", media.title_year(), e);
        }

        info!(
            "{} has {} wishes, subscription added",
            item.title, attributes.popularity
        );

        Ok(HistoryRecord {
            title: item.title.clone(),
            year: attributes.year.unwrap_or_default(),
            wish_count: attributes.popularity,
            air_date: air_date.unwrap_or_default(),
            regions: attributes.regions,
            genres: attributes.genres,
            link: item.link.clone(),
            tmdb_id: Some(media.tmdb_id),
            poster: media.poster_url.clone(),
            overview: media.overview.clone(),
            time: timestamp_in(self.config.timezone),
            unique,
        })
    }
}
