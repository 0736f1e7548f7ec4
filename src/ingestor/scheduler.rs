use std::str::FromStr;
use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use cron::Schedule;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::orchestrator::Pipeline;
use crate::config::ScheduleConfig;
use crate::errors::AppError;
use crate::utils::time::now_in;

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingTrigger {
    Scheduler,
    Manual,
    Startup,
}

impl std::fmt::Display for ProcessingTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingTrigger::Scheduler => write!(f, "scheduler"),
            ProcessingTrigger::Manual => write!(f, "manual"),
            ProcessingTrigger::Startup => write!(f, "startup"),
        }
    }
}

pub type RunTriggerSender = mpsc::Sender<ProcessingTrigger>;
pub type RunTriggerReceiver = mpsc::Receiver<ProcessingTrigger>;

pub fn create_run_trigger_channel() -> (RunTriggerSender, RunTriggerReceiver) {
    mpsc::channel(8)
}

/// Parse a cron expression. Five-field crontab lines get a leading seconds
/// field of `0`.
pub fn parse_cron(expression: &str) -> Result<Schedule, String> {
    let expression = expression.trim();
    let normalized = if expression.split_whitespace().count() == 5 {
        format!("0 {expression}")
    } else {
        expression.to_string()
    };
    Schedule::from_str(&normalized)
        .map_err(|e| format!("Invalid cron expression '{expression}': {e}"))
}

pub struct SchedulerService {
    pipeline: Arc<Pipeline>,
    schedule: Option<Schedule>,
    timezone: Tz,
    trigger_rx: RunTriggerReceiver,
    cancel: CancellationToken,
    running: Option<JoinHandle<()>>,
}

impl SchedulerService {
    /// An invalid or disabled cron leaves only manual triggers active.
    pub fn new(
        pipeline: Arc<Pipeline>,
        schedule_config: &ScheduleConfig,
        timezone: Tz,
        trigger_rx: RunTriggerReceiver,
        cancel: CancellationToken,
    ) -> Self {
        let schedule = if !schedule_config.enabled || schedule_config.cron.trim().is_empty() {
            None
        } else {
            match parse_cron(&schedule_config.cron) {
                Ok(schedule) => Some(schedule),
                Err(e) => {
                    error!("{}; scheduled runs disabled", e);
                    None
                }
            }
        };

        Self {
            pipeline,
            schedule,
            timezone,
            trigger_rx,
            cancel,
            running: None,
        }
    }

    pub fn next_fire(&self) -> Option<DateTime<Tz>> {
        self.schedule
            .as_ref()
            .and_then(|schedule| schedule.upcoming(self.timezone).next())
    }

    pub async fn start(mut self) {
        info!("Starting scheduler service");
        match self.next_fire() {
            Some(next) => info!("Next scheduled run: {}", next.format("%Y-%m-%d %H:%M:%S %Z")),
            None => info!("No schedule configured, waiting for manual triggers"),
        }

        let mut triggers_open = true;

        loop {
            let wait = self.next_fire().map(|next| {
                (next - now_in(self.timezone))
                    .to_std()
                    .unwrap_or(Duration::ZERO)
            });

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Scheduler shutting down");
                    break;
                }
                trigger = self.trigger_rx.recv(), if triggers_open => {
                    match trigger {
                        Some(trigger) => self.dispatch(trigger),
                        None => {
                            debug!("Run trigger channel closed");
                            triggers_open = false;
                        }
                    }
                }
                _ = sleep_or_pending(wait) => {
                    self.dispatch(ProcessingTrigger::Scheduler);
                }
            }
        }

        if let Some(handle) = self.running.take() {
            if let Err(e) = handle.await {
                error!("Run task ended abnormally: {}", e);
            }
        }
    }

    /// Spawn a run. A run still holding the pipeline lock makes the new one
    /// fail fast, which is logged and dropped.
    fn dispatch(&mut self, trigger: ProcessingTrigger) {
        if let Some(handle) = &self.running {
            if !handle.is_finished() {
                warn!("Run already in progress, {} trigger dropped", trigger);
                return;
            }
        }

        let pipeline = self.pipeline.clone();
        let cancel = self.cancel.clone();
        self.running = Some(tokio::spawn(async move {
            execute_run(&pipeline, &cancel, trigger).await;
        }));
    }
}

/// Run the pipeline once and log the outcome.
pub async fn execute_run(
    pipeline: &Pipeline,
    cancel: &CancellationToken,
    trigger: ProcessingTrigger,
) {
    info!("Starting run ({} trigger)", trigger);
    match pipeline.run_once(cancel).await {
        Ok(summary) if summary.aborted => {
            debug!("Run {} aborted", summary.run_id);
        }
        Ok(summary) => {
            info!(
                "Run {} completed{}: {} subscribed, {} skipped",
                summary.run_id,
                if summary.cancelled { " (cancelled)" } else { "" },
                summary.subscribed,
                summary.skipped
            );
        }
        Err(AppError::OperationInProgress { .. }) => {
            warn!("Run already in progress, {} trigger dropped", trigger);
        }
        Err(e) => {
            error!("Run failed: {}", e);
        }
    }
}

async fn sleep_or_pending(wait: Option<Duration>) {
    match wait {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending::<()>().await,
    }
}
