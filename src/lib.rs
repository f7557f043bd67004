//! Camera Snapshot Library
//!
//! Opens a camera, waits until it delivers a frame that is not entirely
//! black, captures one grayscale frame and writes it to disk as JPEG.
//!
//! # Architecture
//!
//! ```text
//! capture (Camera, RawFrame → Frame) → session (readiness, capture) → output (JPEG)
//! ```
//!
//! - [`capture`]: the [`Camera`] trait, a mock implementation, the
//!   hardware backend (`camera` feature), frame types and configuration.
//! - [`session`]: [`CameraSession`], which owns an open camera for its
//!   lifetime and closes it on release or drop.
//! - [`output`]: JPEG encoding.
//!
//! # Example
//!
//! ```no_run
//! use camera_snapshot::{CameraSession, FileConfig, MockCamera};
//!
//! let config = FileConfig::default();
//! let mut session = CameraSession::acquire(MockCamera::new(), &config).unwrap();
//! let frame = session.capture().unwrap();
//! session.save(&frame).unwrap();
//! session.release();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod output;
pub mod session;

// Re-export commonly used types at crate root
#[cfg(feature = "camera")]
pub use capture::NokhwaCamera;
pub use capture::{
    Camera, CameraError, CaptureConfig, ConfigError, FileConfig, Frame, MockCamera, OutputConfig,
    RawFrame, ReadinessConfig,
};
pub use output::{write_jpeg, SnapshotError};
pub use session::{CameraSession, ReadinessProbe, ReadyReport, SessionError, SessionState};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
