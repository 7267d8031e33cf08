//! The seam between the slot scheduler and whatever owns the GPU memory.

use std::fmt;

use crate::image_store::{DecodedImage, BYTES_PER_PIXEL};

/// Completion state of a transfer slot's last submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// The GPU has finished reading the slot; it may be rewritten.
    Retired,
    /// The GPU may still be reading the slot.
    InFlight,
}

/// A transfer slot could not be mapped for write.
///
/// Never fatal: the uploader answers it with a synchronous direct upload for
/// the frame in question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The slot's previous copy has not retired yet.
    SlotBusy,
    /// The image does not fit the slot.
    TooLarge {
        /// Bytes the image needs in the slot's layout.
        needed: usize,
        /// Bytes the slot holds.
        capacity: usize,
    },
    /// The driver refused or failed the mapping.
    MapFailed(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotBusy => write!(f, "transfer slot still in flight"),
            Self::TooLarge { needed, capacity } => write!(
                f,
                "image needs {needed} bytes, transfer slot holds {capacity}"
            ),
            Self::MapFailed(msg) => write!(f, "mapping failed: {msg}"),
        }
    }
}

impl std::error::Error for MapError {}

/// GPU-side storage driven by [`Uploader`](super::Uploader).
///
/// Slot indices passed in are always `< slot_count()`. Transfer slot `i` and
/// texture slot `i` are distinct resources; the uploader happens to advance
/// both with the same index.
pub trait TransferBackend {
    /// Number of transfer slots, equal to the number of texture slots.
    fn slot_count(&self) -> usize;

    /// Bytes each transfer slot can hold.
    fn slot_capacity(&self) -> usize;

    /// Bytes `image` occupies inside a transfer slot.
    fn footprint(&self, image: &DecodedImage) -> usize {
        image.width() as usize * image.height() as usize * BYTES_PER_PIXEL
    }

    /// Query the completion fence of a transfer slot. With `wait` set, block
    /// until the slot retires.
    fn poll_transfer(&mut self, slot: usize, wait: bool) -> FenceStatus;

    /// Map the transfer slot for write, copy the image in, release the view.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if no write-mapped view can be produced.
    fn write_transfer(
        &mut self,
        slot: usize,
        image: &DecodedImage,
    ) -> Result<(), MapError>;

    /// Submit the copy of a previously written transfer slot into a texture
    /// slot and arm the transfer slot's fence.
    fn submit_transfer(&mut self, slot: usize, texture: usize, image: &DecodedImage);

    /// Replace a texture slot's contents synchronously from host memory.
    fn upload_direct(&mut self, texture: usize, image: &DecodedImage);

    /// Read back a texture slot as tightly packed RGBA8 rows, blocking until
    /// the data is available. `None` if the slot has never been written.
    fn read_texture(&mut self, texture: usize) -> Option<Vec<u8>>;
}
