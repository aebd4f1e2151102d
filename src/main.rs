//! Detector Monitor CLI
//!
//! Polls one detector's monitor interface and republishes every changed
//! frame for the viewer until interrupted.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use detector_monitor::{
    acquisition::{DetectorApi, FetchMode, FileConfig, MetadataSource, MonitorClient},
    metadata::{DetectorMetadata, MetadataProvider, StaticMetadata},
    metrics::{MetricsRegistry, MetricsSnapshot, MonitorState},
    notify::SocketNotifier,
    pipeline::PollLoop,
    publish::Publisher,
};
use tracing::{debug, error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "detector-monitor", version, about)]
struct Cli {
    /// Detector host name or IP address (overrides the config file).
    host: Option<String>,

    /// Detector API port.
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name used to identify the detector in logs.
    #[arg(long)]
    name: Option<String>,

    /// Monitor image to request each cycle: latest or next.
    #[arg(long)]
    fetch_mode: Option<FetchMode>,

    /// Switch the detector's monitor interface on before polling.
    #[arg(long)]
    enable_monitor: bool,

    /// Serve Prometheus metrics on this port (needs the `metrics` feature).
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<FileConfig, String> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path).map_err(|e| e.to_string())?,
        None => FileConfig::default(),
    };

    if let Some(host) = &cli.host {
        config.detector.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.detector.port = port;
    }
    if let Some(name) = &cli.name {
        config.detector.name = name.clone();
    }
    if let Some(mode) = cli.fetch_mode {
        config.detector.fetch_mode = mode;
    }
    if cli.enable_monitor {
        config.detector.enable_monitor = true;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let name = config.detector.display_name();
    info!(detector = %name, "Detector Monitor v{}", detector_monitor::VERSION);

    let api = match DetectorApi::new(&config.detector) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Failed to initialize detector transport: {}", e);
            std::process::exit(1);
        }
    };

    let client = MonitorClient::new(api.clone());
    if config.detector.enable_monitor {
        match client.enable_monitor() {
            Ok(()) => info!(detector = %name, "Monitor interface enabled"),
            Err(e) => warn!(detector = %name, error = %e, "Failed to enable monitor interface"),
        }
    }

    let metadata: Box<dyn MetadataProvider> = match config.metadata.source {
        MetadataSource::Detector => Box::new(DetectorMetadata::new(api)),
        MetadataSource::Static => Box::new(StaticMetadata::from(&config.metadata)),
    };

    let notifier = match SocketNotifier::from_config(&config.viewer) {
        Ok(notifier) => notifier,
        Err(e) => {
            eprintln!("Invalid viewer address: {}", e);
            std::process::exit(1);
        }
    };

    let monitor_state = match MetricsRegistry::new() {
        Ok(registry) => Some(Arc::new(
            MonitorState::new(name.clone(), registry)
                .with_unhealthy_after(config.metrics.unhealthy_after),
        )),
        Err(e) => {
            warn!(error = %e, "Metrics disabled");
            None
        }
    };

    #[cfg(feature = "metrics")]
    if let (Some(state), true) = (&monitor_state, config.metrics.port > 0) {
        let server = detector_monitor::metrics::MetricsServer::new(
            config.metrics.port,
            Arc::clone(state),
        );
        if let Err(e) = server.spawn() {
            warn!(error = %e, "Failed to start metrics endpoint");
        }
    }
    #[cfg(not(feature = "metrics"))]
    if config.metrics.port > 0 {
        warn!("Metrics port set but this build has no metrics endpoint");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst)) {
            error!(error = %e, "Failed to install interrupt handler");
        }
    }

    let mut poll = PollLoop::new(
        name.clone(),
        client,
        metadata,
        notifier,
        Publisher::from(&config.output),
    )
    .with_fetch_mode(config.detector.fetch_mode)
    .with_interval(Duration::from_millis(config.poll.interval_ms));

    poll.run(&shutdown, |stats| {
        if let Some(state) = &monitor_state {
            state.update(MetricsSnapshot::from_stats(stats));
        }
    });

    let stats = poll.stats();
    info!(
        detector = %name,
        polls = stats.polls,
        published = stats.published,
        unchanged = stats.unchanged,
        errors = stats.total_errors(),
        "Monitor stopped"
    );

    if let Some(state) = &monitor_state {
        debug!(status = ?state.health().status, "Final health");
        match state.encode() {
            Ok(text) => debug!("Final metrics:\n{}", text),
            Err(e) => warn!(error = %e, "Failed to encode metrics"),
        }
    }
}
