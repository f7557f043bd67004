//! Hardware camera backed by nokhwa.
//!
//! Only built with the `camera` feature.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};

use super::{Camera, CameraError, CaptureConfig, RawFrame};

/// A physical camera accessed through the platform's native backend.
///
/// The device is not touched until [`Camera::open`] is called. Frames are
/// decoded to RGB regardless of the format the device streams in.
#[derive(Default)]
pub struct NokhwaCamera {
    inner: Option<nokhwa::Camera>,
    sequence: u64,
}

impl NokhwaCamera {
    /// Creates an unopened camera.
    pub fn new() -> Self {
        Self::default()
    }

    fn connect(config: &CaptureConfig) -> Result<nokhwa::Camera, CameraError> {
        let index = CameraIndex::Index(config.device_id);
        let resolution = Resolution::new(config.width, config.height);

        // Closest match first, then let the device pick.
        let attempts = [
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
                resolution,
                FrameFormat::MJPEG,
                config.fps,
            ))),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
        ];

        let mut last_error = None;
        for requested in attempts {
            match nokhwa::Camera::new(index.clone(), requested) {
                Ok(camera) => return Ok(camera),
                Err(e) => {
                    tracing::debug!(error = %e, "camera format request rejected");
                    last_error = Some(e);
                }
            }
        }

        let msg = last_error.map(|e| e.to_string()).unwrap_or_default();
        let lower = msg.to_lowercase();
        if lower.contains("not found") || lower.contains("no such") {
            Err(CameraError::DeviceNotFound(format!(
                "index {}: {}",
                config.device_id, msg
            )))
        } else {
            Err(CameraError::OpenFailed(msg))
        }
    }
}

impl Camera for NokhwaCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;

        let mut camera = Self::connect(config)?;
        camera
            .open_stream()
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        let format = camera.camera_format();
        tracing::info!(
            device = config.device_id,
            width = format.resolution().width(),
            height = format.resolution().height(),
            fps = format.frame_rate(),
            "camera stream opened"
        );

        self.inner = Some(camera);
        self.sequence = 0;
        Ok(())
    }

    fn read(&mut self) -> Result<RawFrame, CameraError> {
        let camera = self.inner.as_mut().ok_or(CameraError::NotInitialized)?;
        let buffer = camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        self.sequence += 1;
        let (width, height) = (decoded.width(), decoded.height());
        Ok(RawFrame::new(decoded.into_raw(), width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.inner.take() {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!(error = %e, "failed to stop camera stream");
            }
            tracing::info!("camera closed");
        }
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.close();
    }
}
