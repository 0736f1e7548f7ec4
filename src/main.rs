use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tv_coming::{
    config::Config,
    ingestor::{
        build_pipeline, create_run_trigger_channel, scheduler::execute_run, ProcessingTrigger,
        SchedulerService,
    },
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "tv-coming")]
#[command(version)]
#[command(about = "Subscribes to upcoming TV shows that pass wish-count, region, genre and air-date filters")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Run the pipeline once and exit
    #[arg(long)]
    once: bool,

    /// Clear the processing history before doing anything else
    #[arg(long)]
    clear_history: bool,

    /// Print the processing history as JSON and exit
    #[arg(long)]
    list_history: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("tv_coming={},tower_http=trace", cli.log_level)
    } else {
        format!("tv_coming={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tv-coming v{}", env!("CARGO_PKG_VERSION"));

    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let pipeline = Arc::new(build_pipeline(&config)?);
    info!("Feed: {}", pipeline.config().feed_url);

    if cli.list_history {
        let records = pipeline.history_snapshot().await?;
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    // One-shot flags in the config file are consumed and written back as false.
    let run_now = config.schedule.run_once;
    if config.schedule.clear_history || config.schedule.run_once {
        let clear_from_config = config.schedule.clear_history;
        config.schedule.clear_history = false;
        config.schedule.run_once = false;
        if let Err(e) = config.save_to_file(&cli.config) {
            warn!("Could not reset one-shot flags in {}: {}", cli.config, e);
        }
        if clear_from_config {
            pipeline.clear_history().await?;
        }
    }
    if cli.clear_history {
        pipeline.clear_history().await?;
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!("Cannot listen for shutdown signal: {}", e),
            }
            cancel.cancel();
        });
    }

    if cli.once {
        execute_run(&pipeline, &cancel, ProcessingTrigger::Manual).await;
        return Ok(());
    }

    let timezone = pipeline.config().timezone;
    let (trigger_tx, trigger_rx) = create_run_trigger_channel();
    let scheduler = SchedulerService::new(
        pipeline.clone(),
        &config.schedule,
        timezone,
        trigger_rx,
        cancel.clone(),
    );
    let scheduler_handle = tokio::spawn(scheduler.start());

    if run_now {
        info!("Run-once flag set, starting a run now");
        trigger_tx.send(ProcessingTrigger::Startup).await?;
    }

    if config.web.enabled {
        let web_server = WebServer::new(
            &config.web,
            AppState {
                pipeline,
                trigger_tx,
            },
        )?;
        info!(
            "Starting web server on {}:{}",
            web_server.host(),
            web_server.port()
        );
        web_server.serve(cancel.clone()).await?;
    } else {
        cancel.cancelled().await;
        drop(trigger_tx);
    }

    scheduler_handle.await?;
    info!("Stopped");
    Ok(())
}
