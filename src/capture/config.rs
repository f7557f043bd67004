//! Capture, readiness and output configuration.
//!
//! Defaults reproduce the plain behaviour of the tool: device 0, poll
//! every 10ms with no deadline, write `snapshot.jpg` to the working
//! directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for opening the camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index.
    pub device_id: u32,
    /// Requested frame width in pixels.
    pub width: u32,
    /// Requested frame height in pixels.
    pub height: u32,
    /// Requested frames per second.
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.fps == 0 || self.fps > 120 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}

/// How long and how often to probe a freshly opened camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Sleep between probe reads, in milliseconds.
    pub poll_interval_ms: u64,
    /// Give up after this many milliseconds. `None` waits forever.
    pub timeout_ms: Option<u64>,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            timeout_ms: None,
        }
    }
}

impl ReadinessConfig {
    /// Sleep between probe reads.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Deadline for the readiness wait, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        Ok(())
    }
}

/// Where and how the snapshot is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination file. Overwritten on every run.
    pub path: PathBuf,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("snapshot.jpg"),
            jpeg_quality: 90,
        }
    }
}

impl OutputConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidQuality(self.jpeg_quality));
        }
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputPath);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Frame rate outside 1-120.
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    /// Poll interval of zero.
    #[error("poll interval must be at least 1ms")]
    InvalidPollInterval,
    /// JPEG quality outside 1-100.
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidQuality(u8),
    /// Empty snapshot path.
    #[error("output path is empty")]
    EmptyOutputPath,
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML or has wrongly typed values.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Device settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Readiness wait settings.
    #[serde(default)]
    pub readiness: ReadinessConfig,
    /// Snapshot destination and encoding.
    #[serde(default)]
    pub output: OutputConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.readiness.validate()?;
        self.output.validate()
    }
}
