//! Camera input and frame handling.
//!
//! This module provides abstractions for reading colour frames from a
//! camera, converting them to grayscale, and configuring the device.

mod camera;
mod config;
pub mod convert;
#[cfg(feature = "camera")]
mod device;
mod frame;

pub use camera::{Camera, CameraError, MockCamera};
pub use config::{CaptureConfig, ConfigError, FileConfig, OutputConfig, ReadinessConfig};
#[cfg(feature = "camera")]
pub use device::NokhwaCamera;
pub use frame::{Frame, RawFrame};
