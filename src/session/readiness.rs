//! Readiness probing for freshly opened cameras.
//!
//! Many webcams deliver all-black frames for a short while after the
//! stream starts. The probe keeps reading until a frame contains at
//! least one non-zero luma sample.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::SessionError;
use crate::capture::{Camera, ReadinessConfig};

/// Log a warning once the camera has been blank for this long.
const SLOW_WARNING_AFTER: Duration = Duration::from_secs(5);

/// Outcome of a successful readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyReport {
    /// Frames read, including the first non-blank one.
    pub probes: u64,
    /// Time spent waiting.
    pub waited: Duration,
}

/// Polls a camera until it produces a non-blank frame.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    poll_interval: Duration,
    timeout: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::new(&ReadinessConfig::default())
    }
}

impl ReadinessProbe {
    /// Creates a probe from readiness settings, with no cancel flag.
    pub fn new(config: &ReadinessConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            timeout: config.timeout(),
            cancel: None,
        }
    }

    /// Stops waiting with [`SessionError::Cancelled`] once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Replaces the deadline. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sleep after each probe read.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Deadline for the wait, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Reads frames from an open camera until one has signal.
    ///
    /// Sleeps `poll_interval` after every read, including the non-blank
    /// one. Without a timeout or a cancel flag this blocks for as long as
    /// the camera stays blank. Read errors end the wait immediately.
    pub fn wait<C: Camera + ?Sized>(&self, camera: &mut C) -> Result<ReadyReport, SessionError> {
        let start = Instant::now();
        let mut probes = 0u64;
        let mut warned = false;

        loop {
            if self.cancelled() {
                tracing::warn!(probes, "readiness wait cancelled");
                return Err(SessionError::Cancelled { probes });
            }

            let frame = camera.read()?.to_grayscale();
            probes += 1;

            let ready = frame.has_signal();
            if !ready {
                tracing::debug!(probes, sequence = frame.sequence(), "blank probe frame");

                let waited = start.elapsed();
                if let Some(timeout) = self.timeout {
                    if waited >= timeout {
                        tracing::warn!(probes, ?waited, "camera never produced a non-blank frame");
                        return Err(SessionError::ReadinessTimeout { waited, probes });
                    }
                }
                if !warned && waited >= SLOW_WARNING_AFTER {
                    tracing::warn!(probes, ?waited, "camera still delivering blank frames");
                    warned = true;
                }
            }

            thread::sleep(self.poll_interval);

            if ready {
                let report = ReadyReport {
                    probes,
                    waited: start.elapsed(),
                };
                tracing::info!(
                    probes,
                    waited_ms = report.waited.as_millis() as u64,
                    "camera ready"
                );
                return Ok(report);
            }
        }
    }
}
