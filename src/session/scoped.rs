//! The camera session type.

use std::path::Path;

use super::{ReadinessProbe, ReadyReport, SessionError};
use crate::capture::{Camera, CameraError, CaptureConfig, FileConfig, Frame, OutputConfig};
use crate::output;

/// Lifecycle of a [`CameraSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The camera is open and has produced a non-blank frame.
    Ready,
    /// The camera has been closed.
    Released,
}

/// Exclusive, scoped ownership of an open camera.
///
/// Acquisition is the constructor: a session only exists once the camera
/// has been opened and has delivered a frame with signal. The camera is
/// closed by [`CameraSession::release`] or, failing that, on drop.
///
/// ```
/// use camera_snapshot::{CameraSession, FileConfig, MockCamera};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut config = FileConfig::default();
/// config.capture.width = 32;
/// config.capture.height = 24;
/// config.output.path = dir.path().join("snapshot.jpg");
///
/// let mut session = CameraSession::acquire(MockCamera::new(), &config).unwrap();
/// let frame = session.capture().unwrap();
/// session.save(&frame).unwrap();
/// assert!(config.output.path.exists());
/// ```
pub struct CameraSession<C: Camera> {
    camera: C,
    state: SessionState,
    output: OutputConfig,
    report: ReadyReport,
}

impl<C: Camera> CameraSession<C> {
    /// Opens `camera` and blocks until it is ready, using the readiness
    /// settings from `config`.
    pub fn acquire(camera: C, config: &FileConfig) -> Result<Self, SessionError> {
        let probe = ReadinessProbe::new(&config.readiness);
        Self::acquire_with_probe(camera, &config.capture, config.output.clone(), &probe)
    }

    /// Opens `camera` and blocks until `probe` reports it ready.
    ///
    /// If the wait fails the camera is closed before the error is
    /// returned.
    pub fn acquire_with_probe(
        mut camera: C,
        capture: &CaptureConfig,
        output: OutputConfig,
        probe: &ReadinessProbe,
    ) -> Result<Self, SessionError> {
        camera.open(capture)?;

        let mut session = Self {
            camera,
            state: SessionState::Ready,
            output,
            report: ReadyReport {
                probes: 0,
                waited: Default::default(),
            },
        };
        // On error the session is dropped here, which closes the camera.
        session.report = probe.wait(&mut session.camera)?;
        Ok(session)
    }

    /// Reads one frame and converts it to grayscale.
    pub fn capture(&mut self) -> Result<Frame, SessionError> {
        if self.state != SessionState::Ready {
            return Err(CameraError::NotInitialized.into());
        }
        let raw = self.camera.read()?;
        if !raw.is_valid() {
            return Err(CameraError::CaptureFailed(format!(
                "frame buffer of {} bytes does not match {}x{}",
                raw.pixels().len(),
                raw.width(),
                raw.height()
            ))
            .into());
        }
        let frame = raw.to_grayscale();
        tracing::debug!(
            sequence = frame.sequence(),
            width = frame.width(),
            height = frame.height(),
            "frame captured"
        );
        Ok(frame)
    }

    /// Writes `frame` to the configured snapshot path as JPEG.
    pub fn save(&self, frame: &Frame) -> Result<(), SessionError> {
        self.save_to(frame, &self.output.path)
    }

    /// Writes `frame` to `path` as JPEG using the configured quality.
    pub fn save_to(&self, frame: &Frame, path: impl AsRef<Path>) -> Result<(), SessionError> {
        output::write_jpeg(frame, path, self.output.jpeg_quality)?;
        Ok(())
    }

    /// Closes the camera. Further calls do nothing.
    pub fn release(&mut self) {
        if self.state == SessionState::Released {
            return;
        }
        self.camera.close();
        self.state = SessionState::Released;
        tracing::info!("camera session released");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true while the camera is held open by this session.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Ready && self.camera.is_open()
    }

    /// How long acquisition waited for the camera.
    pub fn ready_report(&self) -> ReadyReport {
        self.report
    }

    /// Borrows the underlying camera.
    pub fn camera(&self) -> &C {
        &self.camera
    }
}

impl<C: Camera> Drop for CameraSession<C> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<C: Camera> std::fmt::Debug for CameraSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("state", &self.state)
            .field("output", &self.output.path)
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{MockCamera, RawFrame, ReadinessConfig};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    fn fixed_image() -> RawFrame {
        RawFrame::from_rows(
            &[
                vec![[255, 0, 0], [0, 255, 0]],
                vec![[0, 0, 255], [255, 255, 255]],
            ],
            0,
        )
    }

    fn config_in(dir: &Path) -> FileConfig {
        let mut config = FileConfig::default();
        config.readiness.poll_interval_ms = 1;
        config.output.path = dir.join("snapshot.jpg");
        config
    }

    /// Counts closes through a handle the test keeps after the camera
    /// moves into a session.
    struct Tracked {
        inner: MockCamera,
        closes: Rc<Cell<u32>>,
    }

    impl Camera for Tracked {
        fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
            self.inner.open(config)
        }

        fn read(&mut self) -> Result<RawFrame, CameraError> {
            self.inner.read()
        }

        fn is_open(&self) -> bool {
            self.inner.is_open()
        }

        fn close(&mut self) {
            if self.inner.is_open() {
                self.closes.set(self.closes.get() + 1);
            }
            self.inner.close();
        }
    }

    #[test]
    fn test_acquire_waits_for_signal() {
        let dir = tempfile::tempdir().unwrap();
        let camera = MockCamera::warming_up(5, fixed_image());

        let session = CameraSession::acquire(camera, &config_in(dir.path())).unwrap();

        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.is_active());
        assert_eq!(session.ready_report().probes, 6);
        assert_eq!(session.camera().reads(), 6);
    }

    #[test]
    fn test_capture_converts_to_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let camera = MockCamera::scripted([fixed_image()]);
        let mut session = CameraSession::acquire(camera, &config_in(dir.path())).unwrap();

        let frame = session.capture().unwrap();

        assert_eq!((frame.width(), frame.height()), (2, 2));
        assert_eq!(frame.samples(), &[76, 150, 29, 255]);
        assert_eq!(session.camera().reads(), 2);
    }

    #[test]
    fn test_capture_rejects_malformed_frame() {
        let dir = tempfile::tempdir().unwrap();
        let camera = MockCamera::scripted([RawFrame::new(vec![9; 7], 2, 2, 0)]);
        let mut session = CameraSession::acquire(camera, &config_in(dir.path())).unwrap();

        assert!(matches!(
            session.capture(),
            Err(SessionError::Camera(CameraError::CaptureFailed(_)))
        ));
    }

    #[test]
    fn test_capture_after_release_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut session =
            CameraSession::acquire(MockCamera::scripted([fixed_image()]), &config_in(dir.path()))
                .unwrap();

        session.release();

        assert_eq!(session.state(), SessionState::Released);
        assert!(!session.is_active());
        assert!(!session.camera().is_open());
        assert!(matches!(
            session.capture(),
            Err(SessionError::Camera(CameraError::NotInitialized))
        ));
    }

    #[test]
    fn test_release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut session =
            CameraSession::acquire(MockCamera::scripted([fixed_image()]), &config_in(dir.path()))
                .unwrap();

        session.release();
        session.release();

        assert_eq!(session.camera().closes(), 1);
    }

    #[test]
    fn test_drop_closes_camera() {
        let dir = tempfile::tempdir().unwrap();
        let closes = Rc::new(Cell::new(0));
        let camera = Tracked {
            inner: MockCamera::scripted([fixed_image()]),
            closes: Rc::clone(&closes),
        };

        {
            let mut session = CameraSession::acquire(camera, &config_in(dir.path())).unwrap();
            session.capture().unwrap();
            assert_eq!(closes.get(), 0);
        }

        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_explicit_release_then_drop_closes_once() {
        let dir = tempfile::tempdir().unwrap();
        let closes = Rc::new(Cell::new(0));
        let camera = Tracked {
            inner: MockCamera::scripted([fixed_image()]),
            closes: Rc::clone(&closes),
        };

        let mut session = CameraSession::acquire(camera, &config_in(dir.path())).unwrap();
        session.release();
        drop(session);

        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_failed_acquire_closes_camera() {
        let closes = Rc::new(Cell::new(0));
        let camera = Tracked {
            inner: MockCamera::scripted([RawFrame::blank(2, 2, 0)]),
            closes: Rc::clone(&closes),
        };
        let probe = ReadinessProbe::new(&ReadinessConfig {
            poll_interval_ms: 1,
            timeout_ms: Some(10),
        });

        let result = CameraSession::acquire_with_probe(
            camera,
            &CaptureConfig::default(),
            OutputConfig::default(),
            &probe,
        );

        assert!(matches!(
            result,
            Err(SessionError::ReadinessTimeout { .. })
        ));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_open_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.capture.fps = 0;

        assert!(matches!(
            CameraSession::acquire(MockCamera::new(), &config),
            Err(SessionError::Camera(CameraError::ConfigFailed(_)))
        ));
    }

    #[test]
    fn test_save_writes_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut session =
            CameraSession::acquire(MockCamera::scripted([fixed_image()]), &config).unwrap();

        let frame = session.capture().unwrap();
        session.save(&frame).unwrap();

        let decoded = image::open(&config.output.path).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (2, 2));
    }

    #[test]
    fn test_save_after_release_still_writes() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut session =
            CameraSession::acquire(MockCamera::scripted([fixed_image()]), &config).unwrap();

        let frame = session.capture().unwrap();
        session.release();
        session.save(&frame).unwrap();

        assert!(config.output.path.exists());
    }

    #[test]
    fn test_end_to_end_fixed_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.output.jpeg_quality = 100;

        {
            let mut session =
                CameraSession::acquire(MockCamera::scripted([fixed_image()]), &config).unwrap();
            let frame = session.capture().unwrap();
            session.save(&frame).unwrap();
        }

        let decoded = image::open(&config.output.path).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (2, 2));

        let expected = [76u8, 150, 29, 255];
        for (&got, &want) in decoded.as_raw().iter().zip(expected.iter()) {
            assert!(
                (got as i16 - want as i16).abs() <= 4,
                "decoded {got}, expected about {want}"
            );
        }
    }

    #[test]
    fn test_ready_report_records_wait() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.readiness.poll_interval_ms = 3;

        let session =
            CameraSession::acquire(MockCamera::warming_up(3, fixed_image()), &config).unwrap();

        // One sleep per probe read: three blank frames and the ready one.
        assert_eq!(session.ready_report().probes, 4);
        assert!(session.ready_report().waited >= Duration::from_millis(12));
    }
}
