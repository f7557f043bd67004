//! Camera abstraction for frame capture.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real camera input and mock implementations for testing.

use std::collections::VecDeque;

use super::{CaptureConfig, RawFrame};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No device exists at the requested index.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The device exists but could not be opened or streamed.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// The capture configuration was rejected.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// A frame could not be read or decoded.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// The camera is not open.
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for camera implementations.
///
/// This abstraction allows swapping between real camera hardware
/// and mock implementations for testing.
pub trait Camera {
    /// Opens the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Reads a single colour frame.
    fn read(&mut self) -> Result<RawFrame, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources. Closing a closed camera
    /// does nothing.
    fn close(&mut self);
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        (**self).open(config)
    }

    fn read(&mut self) -> Result<RawFrame, CameraError> {
        (**self).read()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Mock camera that serves scripted or synthetic frames.
///
/// With no script it produces a non-blank gradient of the configured
/// size. With a script it returns the scripted frames in order and keeps
/// repeating the last one, which is enough to model a camera that warms
/// up after a few black frames.
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    script: VecDeque<RawFrame>,
    last: Option<RawFrame>,
    fail_reads: bool,
    sequence: u64,
    reads: u64,
    closes: u64,
}

impl MockCamera {
    /// Creates a camera that serves a synthetic non-blank pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a camera that returns `frames` in order, then repeats the
    /// last one forever.
    pub fn scripted(frames: impl IntoIterator<Item = RawFrame>) -> Self {
        Self {
            script: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Creates a camera that delivers `blank` all-black frames before
    /// `frame`.
    pub fn warming_up(blank: usize, frame: RawFrame) -> Self {
        let (w, h) = (frame.width(), frame.height());
        let frames = (0..blank)
            .map(|_| RawFrame::blank(w, h, 0))
            .chain(std::iter::once(frame));
        Self::scripted(frames)
    }

    /// Creates a camera that opens fine but never delivers a frame.
    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    /// Number of successful or failed read attempts while open.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Number of times an open camera was closed.
    pub fn closes(&self) -> u64 {
        self.closes
    }

    fn synthetic(config: &CaptureConfig, sequence: u64) -> RawFrame {
        let (w, h) = (config.width, config.height);
        let mut pixels = Vec::with_capacity((w as usize) * (h as usize) * RawFrame::CHANNELS);
        for y in 0..h {
            for x in 0..w {
                pixels.extend_from_slice(&gradient_pixel(x, y, w, h, sequence));
            }
        }
        RawFrame::new(pixels, w, h, sequence)
    }
}

/// Colour of the synthetic pattern at (`x`, `y`) in a `width` x `height`
/// frame. Widened to `u64` so large configured sizes cannot overflow.
fn gradient_pixel(x: u32, y: u32, width: u32, height: u32, sequence: u64) -> [u8; 3] {
    let (x, y) = (u64::from(x), u64::from(y));
    let r = x * 255 / u64::from(width.max(1));
    let g = y * 255 / u64::from(height.max(1));
    let b = x.wrapping_add(y).wrapping_add(sequence) % 256;
    [r as u8, g as u8, b as u8]
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!("MockCamera opened with config: {:?}", config);
        Ok(())
    }

    fn read(&mut self) -> Result<RawFrame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;
        self.reads += 1;

        if self.fail_reads {
            return Err(CameraError::CaptureFailed("mock read failure".into()));
        }

        self.sequence += 1;
        if let Some(frame) = self.script.pop_front() {
            self.last = Some(frame);
        }
        let frame = match &self.last {
            Some(frame) => RawFrame::new(
                frame.pixels().to_vec(),
                frame.width(),
                frame.height(),
                self.sequence,
            ),
            None => Self::synthetic(config, self.sequence),
        };
        Ok(frame)
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        if self.config.take().is_some() {
            self.closes += 1;
            tracing::info!("MockCamera closed");
        }
    }
}
