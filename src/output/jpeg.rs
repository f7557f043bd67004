//! JPEG encoding of grayscale frames.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, ImageBuffer};
use thiserror::Error;

use crate::capture::Frame;

/// Errors that can occur while writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The frame is empty or its buffer does not match its size.
    #[error("cannot encode frame: {0}")]
    InvalidFrame(String),
    /// JPEG quality outside 1-100.
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidQuality(u8),
    /// The encoder failed.
    #[error("failed to encode JPEG: {0}")]
    Encode(#[from] image::ImageError),
    /// The file could not be created or written.
    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
}

/// Wraps a frame's samples in an `image` buffer.
pub fn to_gray_image(frame: &Frame) -> Result<GrayImage, SnapshotError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(SnapshotError::InvalidFrame(format!(
            "empty frame {}x{}",
            frame.width(),
            frame.height()
        )));
    }
    ImageBuffer::from_raw(frame.width(), frame.height(), frame.samples().to_vec()).ok_or_else(
        || {
            SnapshotError::InvalidFrame(format!(
                "{} samples do not fill {}x{}",
                frame.samples().len(),
                frame.width(),
                frame.height()
            ))
        },
    )
}

/// Encodes `frame` as JPEG into `writer`.
pub fn encode_jpeg<W: Write>(frame: &Frame, writer: W, quality: u8) -> Result<(), SnapshotError> {
    if !(1..=100).contains(&quality) {
        return Err(SnapshotError::InvalidQuality(quality));
    }
    let image = to_gray_image(frame)?;
    JpegEncoder::new_with_quality(writer, quality).encode_image(&image)?;
    Ok(())
}

/// Writes `frame` to `path` as JPEG, replacing any existing file.
pub fn write_jpeg(frame: &Frame, path: impl AsRef<Path>, quality: u8) -> Result<(), SnapshotError> {
    let path = path.as_ref();
    // Encode first so a bad frame never truncates an existing snapshot.
    let mut encoded = Vec::new();
    encode_jpeg(frame, &mut encoded, quality)?;

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&encoded)?;
    writer.flush()?;

    tracing::info!(
        path = %path.display(),
        width = frame.width(),
        height = frame.height(),
        bytes = encoded.len(),
        "snapshot written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RawFrame;

    fn flat_frame(width: u32, height: u32, value: u8) -> Frame {
        let pixels = vec![value; (width * height) as usize * 3];
        RawFrame::new(pixels, width, height, 1).to_grayscale()
    }

    #[test]
    fn test_write_and_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.jpg");
        let frame = flat_frame(16, 8, 128);

        write_jpeg(&frame, &path, 95).unwrap();

        let decoded = image::open(&path).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (16, 8));
        for (&got, &want) in decoded.as_raw().iter().zip(frame.samples()) {
            assert!((got as i16 - want as i16).abs() <= 2, "{got} vs {want}");
        }
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.jpg");
        std::fs::write(&path, vec![0xAB; 64 * 1024]).unwrap();

        write_jpeg(&flat_frame(4, 4, 200), &path, 90).unwrap();

        let decoded = image::open(&path).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (4, 4));
    }

    #[test]
    fn test_encode_starts_with_jpeg_marker() {
        let mut out = Vec::new();
        encode_jpeg(&flat_frame(2, 2, 10), &mut out, 90).unwrap();
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_invalid_quality() {
        let mut out = Vec::new();
        assert!(matches!(
            encode_jpeg(&flat_frame(2, 2, 10), &mut out, 0),
            Err(SnapshotError::InvalidQuality(0))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_frame_rejected_without_touching_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.jpg");
        std::fs::write(&path, b"previous").unwrap();

        let empty = RawFrame::new(Vec::new(), 0, 0, 1).to_grayscale();
        assert!(matches!(
            write_jpeg(&empty, &path, 90),
            Err(SnapshotError::InvalidFrame(_))
        ));
        assert_eq!(std::fs::read(&path).unwrap(), b"previous");
    }

    #[test]
    fn test_short_buffer_rejected() {
        let short = RawFrame::new(vec![255; 6], 2, 2, 1).to_grayscale();
        assert!(matches!(
            to_gray_image(&short),
            Err(SnapshotError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("snapshot.jpg");
        assert!(matches!(
            write_jpeg(&flat_frame(2, 2, 10), &path, 90),
            Err(SnapshotError::Io(_))
        ));
    }
}
