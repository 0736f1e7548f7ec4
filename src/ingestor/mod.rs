//! The ingestion pipeline: attribute extraction, the filter chain, the run
//! orchestrator and the scheduler that triggers it.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::defaults::DEFAULT_USER_AGENT;
use crate::config::Config;
use crate::errors::AppResult;
use crate::repositories::JsonFileHistoryStore;
use crate::services::{
    DirectoryLibraryIndex, JsonSubscriptionLedger, LogNotifier, Notifier, TmdbClient,
    WebhookNotifier,
};
use crate::sources::RssFeedFetcher;

pub mod extractor;
pub mod filter_chain;
pub mod orchestrator;
pub mod scheduler;

pub use filter_chain::{FilterChain, FilterConfig, FilterRejection};
pub use orchestrator::{Pipeline, PipelineCollaborators, PipelineConfig, RunSummary, SkipReason};
pub use scheduler::{create_run_trigger_channel, ProcessingTrigger, SchedulerService};

/// Wire the concrete collaborators described by `config` into a pipeline.
pub fn build_pipeline(config: &Config) -> AppResult<Pipeline> {
    let pipeline_config = PipelineConfig::from_config(config)?;
    let timeout = Duration::from_secs(config.feed.request_timeout_secs);
    let proxy_url = config.feed.proxy_url.as_deref();

    let fetcher = RssFeedFetcher::new(timeout, DEFAULT_USER_AGENT, proxy_url)?;

    let tmdb_proxy = if config.feed.use_proxy { proxy_url } else { None };
    let tmdb = Arc::new(TmdbClient::new(
        config.tmdb.clone(),
        timeout,
        DEFAULT_USER_AGENT,
        tmdb_proxy,
    )?);

    let notifier: Arc<dyn Notifier> = match config.notification.webhook_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            info!("Notifications go to webhook {}", url);
            Arc::new(WebhookNotifier::new(url.trim(), timeout)?)
        }
        _ => Arc::new(LogNotifier),
    };

    let collaborators = PipelineCollaborators {
        fetcher: Arc::new(fetcher),
        history: Arc::new(JsonFileHistoryStore::new(&config.storage.history_path)),
        recognizer: tmdb.clone(),
        air_dates: tmdb,
        library: Arc::new(DirectoryLibraryIndex::new(config.library.roots.clone())),
        subscriptions: Arc::new(JsonSubscriptionLedger::new(
            &config.subscriptions.ledger_path,
            config.subscriptions.subscriber_name.clone(),
        )),
        notifier,
    };

    Ok(Pipeline::new(pipeline_config, collaborators))
}
