//! Frame types for colour captures and their grayscale conversions.

use chrono::{DateTime, Utc};

use super::convert;

/// A single colour frame read from the camera.
///
/// Pixels are interleaved RGB8, row-major, with no row padding.
#[derive(Clone)]
pub struct RawFrame {
    /// Interleaved RGB bytes.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Wall-clock capture time.
    captured_at: DateTime<Utc>,
    /// Monotonic sequence number assigned by the camera.
    sequence: u64,
}

impl RawFrame {
    /// Bytes per pixel of the interleaved RGB layout.
    pub const CHANNELS: usize = 3;

    /// Creates a new colour frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            captured_at: Utc::now(),
            sequence,
        }
    }

    /// Builds a frame from rows of `[r, g, b]` triplets.
    ///
    /// All rows must have the same length; the width is taken from the
    /// first row.
    pub fn from_rows(rows: &[Vec<[u8; 3]>], sequence: u64) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |row| row.len() as u32);
        let pixels = rows.iter().flatten().flatten().copied().collect();
        Self::new(pixels, width, height, sequence)
    }

    /// Returns a frame of the given size where every byte is zero.
    pub fn blank(width: u32, height: u32, sequence: u64) -> Self {
        let len = (width as usize) * (height as usize) * Self::CHANNELS;
        Self::new(vec![0u8; len], width, height, sequence)
    }

    /// Returns the interleaved RGB bytes.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the buffer holds exactly one RGB triplet per pixel.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * Self::CHANNELS
    }

    /// Converts this frame to single-channel grayscale.
    ///
    /// Trailing bytes that do not form a full RGB triplet are ignored, so
    /// callers that care should check [`RawFrame::is_valid`] first.
    pub fn to_grayscale(&self) -> Frame {
        Frame {
            samples: convert::rgb_to_luma(&self.pixels),
            width: self.width,
            height: self.height,
            captured_at: self.captured_at,
            sequence: self.sequence,
        }
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

/// A grayscale frame: one 8-bit luma sample per pixel.
///
/// Frames are immutable once produced. The only way to get one is to
/// convert a [`RawFrame`], so the sample count always matches the source
/// frame's dimensions when the source was valid.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    samples: Vec<u8>,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
    sequence: u64,
}

impl Frame {
    /// Returns the luma samples in row-major order.
    #[inline]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the capture time of the colour frame this came from.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the sample at column `x`, row `y`.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize) * (self.width as usize) + x as usize;
        self.samples.get(index).copied()
    }

    /// Returns the samples as rows.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.samples.chunks(self.width.max(1) as usize)
    }

    /// Counts samples that are not zero.
    pub fn count_non_zero(&self) -> usize {
        self.samples.iter().filter(|&&s| s != 0).count()
    }

    /// Returns true if at least one sample is non-zero.
    ///
    /// This is the readiness heuristic: a camera that is still warming up
    /// delivers all-black frames.
    pub fn has_signal(&self) -> bool {
        self.samples.iter().any(|&s| s != 0)
    }

    /// Validates that the sample buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.samples.len() == (self.width as usize) * (self.height as usize)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("non_zero", &self.count_non_zero())
            .finish()
    }
}
