//! Camera Snapshot CLI
//!
//! Waits for the camera to warm up, captures one grayscale frame and
//! writes it to `snapshot.jpg` (or the configured path).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use camera_snapshot::{
    Camera, CameraSession, ConfigError, FileConfig, MockCamera, ReadinessProbe, SessionError,
};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "camera-snapshot", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera device index.
    #[arg(short, long)]
    device: Option<u32>,

    /// Snapshot destination.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JPEG quality (1-100).
    #[arg(short, long)]
    quality: Option<u8>,

    /// Delay between readiness probes, in milliseconds.
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Give up if the camera is still blank after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Use the synthetic mock camera instead of real hardware.
    #[arg(long)]
    mock: bool,
}

impl Cli {
    /// Loads the config file, if any, and applies command-line overrides.
    fn resolve_config(&self) -> Result<FileConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        if let Some(device) = self.device {
            config.capture.device_id = device;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(quality) = self.quality {
            config.output.jpeg_quality = quality;
        }
        if let Some(interval) = self.poll_interval_ms {
            config.readiness.poll_interval_ms = interval;
        }
        if self.timeout_ms.is_some() {
            config.readiness.timeout_ms = self.timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(feature = "camera")]
fn select_camera(mock: bool) -> Box<dyn Camera> {
    if mock {
        Box::new(MockCamera::new())
    } else {
        Box::new(camera_snapshot::NokhwaCamera::new())
    }
}

#[cfg(not(feature = "camera"))]
fn select_camera(mock: bool) -> Box<dyn Camera> {
    if !mock {
        warn!("built without the `camera` feature; using mock camera input");
    }
    Box::new(MockCamera::new())
}

fn run(cli: &Cli, cancel: Arc<AtomicBool>) -> Result<PathBuf, AppError> {
    let config = cli.resolve_config()?;
    let probe = ReadinessProbe::new(&config.readiness).with_cancel_flag(cancel);

    info!(
        device = config.capture.device_id,
        poll_interval = ?probe.poll_interval(),
        timeout = ?probe.timeout(),
        "waiting for camera"
    );

    let mut session = CameraSession::acquire_with_probe(
        select_camera(cli.mock),
        &config.capture,
        config.output.clone(),
        &probe,
    )?;
    let frame = session.capture()?;
    info!(
        captured_at = %frame.captured_at(),
        non_zero = frame.count_non_zero(),
        "frame captured"
    );
    session.save(&frame)?;
    session.release();

    Ok(config.output.path)
}

/// Builds the log filter from `RUST_LOG` directives, defaulting to `info`
/// when they set no level of their own.
fn env_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn main() -> ExitCode {
    // Initialize logging
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(rust_log.as_deref()))
        .init();

    let cli = Cli::parse();
    info!("Camera Snapshot v{}", camera_snapshot::VERSION);

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("Could not set up Ctrl+C handler: {}", e);
    }

    match run(&cli, cancel) {
        Ok(path) => {
            info!("Saved {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
