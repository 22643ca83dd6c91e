use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use oxicord_sync::application::{
    EventPipeline, SessionCache, SyncContext, SyncPorts, ui_gateway,
};
use oxicord_sync::domain::entities::User;
use oxicord_sync::infrastructure::{
    AppConfig, CliArgs, DesktopNotificationService, HeadlessPresenter, LoopbackTransport,
    RegexReplacementHook, ReplayDriver, StateConfig, StorageManager, parse_script,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init();
    }

    Ok(())
}

fn open_script(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).wrap_err_with(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(&args);

    init_logging(&config)?;
    info!(version = oxicord_sync::VERSION, "Starting {}", oxicord_sync::NAME);

    let steps = parse_script(open_script(args.script.as_deref())?)?;
    let storage = Arc::new(storage);
    let settings = config.sync_settings();

    let (echo_tx, echo_rx) = mpsc::unbounded_channel();
    let transport =
        Arc::new(LoopbackTransport::new(User::new(0_u64, "unknown", "0000")).with_echo(echo_tx));
    let (ui, ui_loop) = ui_gateway::channel(HeadlessPresenter::new());
    let ui_task = tokio::spawn(ui_loop.run());

    let ports = SyncPorts {
        transport: transport.clone(),
        store: storage.clone(),
        notifier: Arc::new(DesktopNotificationService::new(
            settings.enable_desktop_notifications,
            settings.app_name.clone(),
        )),
        hook: Arc::new(RegexReplacementHook::new(&config.compose.replacements)),
    };
    let ctx = SyncContext::new(SessionCache::new(), ui, ports, settings);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let flush_task = tokio::spawn(
        ctx.read_state
            .clone()
            .run_flush_loop(ctx.settings.read_ack_interval, shutdown_rx),
    );
    let pipeline = EventPipeline::start(&ctx, ctx.settings.queues);

    let mut driver = ReplayDriver::new(ctx, pipeline, transport, echo_rx);
    driver.run(steps).await?;
    let ctx = driver.finish().await?;

    if shutdown_tx.send(true).is_err() {
        debug!("Read acknowledgement loop already stopped");
    }
    if let Err(e) = flush_task.await {
        warn!(error = %e, "Read acknowledgement loop ended abnormally");
    }
    if let Err(e) = ctx.read_state.persist() {
        warn!(error = %e, "Failed to persist read state");
    }

    let state = {
        let navigation = ctx.navigation.lock();
        StateConfig::from_navigation(navigation.current(), navigation.selected_guild())
    };
    storage.save_state(&state)?;

    drop(ctx);
    let presenter = ui_task.await?;
    print!("{}", presenter.render());

    info!("Shutdown complete");
    Ok(())
}
