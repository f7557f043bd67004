//! Snapshot persistence.

mod jpeg;

pub use jpeg::{encode_jpeg, to_gray_image, write_jpeg, SnapshotError};
