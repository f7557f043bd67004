//! Scoped camera sessions.
//!
//! A [`CameraSession`] opens a camera, waits for it to warm up, hands out
//! grayscale frames and writes snapshots. The camera is closed when the
//! session is released or dropped.

mod readiness;
mod scoped;

pub use readiness::{ReadinessProbe, ReadyReport};
pub use scoped::{CameraSession, SessionState};

use std::time::Duration;

use crate::capture::CameraError;
use crate::output::SnapshotError;
use thiserror::Error;

/// Errors that can occur during a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The camera failed to open or read.
    #[error(transparent)]
    Camera(#[from] CameraError),
    /// The camera stayed blank until the configured timeout.
    #[error("camera still blank after {waited:?} ({probes} probe frames)")]
    ReadinessTimeout {
        /// Time spent waiting.
        waited: Duration,
        /// Frames read before giving up.
        probes: u64,
    },
    /// The cancel flag was set during the wait.
    #[error("readiness wait cancelled after {probes} probe frames")]
    Cancelled {
        /// Frames read before the wait stopped.
        probes: u64,
    },
    /// The snapshot could not be written.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
