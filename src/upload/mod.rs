//! Double-buffered texture streaming.
//!
//! An [`Uploader`] owns `N` transfer slots and `N` texture slots through a
//! [`TransferBackend`]. Every call to [`Uploader::begin_upload`] moves to the
//! next slot index, checks that slot's completion fence, copies the image
//! into the write-mapped transfer slot and submits the copy into the texture
//! slot with the same index. The texture that was current until then goes
//! back to idle.
//!
//! With `N >= 2` the fence is only polled: a slot the GPU has not released
//! yet is treated as unavailable and that frame falls back to a direct,
//! synchronous upload. With `N == 1` the uploader blocks on the fence
//! instead, so the single texture is never rewritten while a copy into it
//! is pending.

mod backend;
pub mod software;
pub mod wgpu_backend;

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

pub use backend::{FenceStatus, MapError, TransferBackend};

use crate::image_store::DecodedImage;

/// Transfer/texture slot pairs used unless configured otherwise.
pub const DEFAULT_SLOT_COUNT: usize = 2;

/// Identifies one of the uploader's texture objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSlot(pub usize);

impl TextureSlot {
    /// Slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Lifecycle of a texture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// Holds nothing that is being drawn.
    #[default]
    Idle,
    /// Receiving new pixel data.
    Refreshing,
    /// Holds the most recently uploaded image; safe to draw.
    Ready,
}

/// How images travel to the GPU.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    /// Through write-mapped transfer slots, falling back to `Direct` when a
    /// slot is unavailable.
    #[default]
    Staged,
    /// Always a synchronous whole-image texture write.
    Direct,
}

impl UploadMode {
    /// The other mode.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Staged => Self::Direct,
            Self::Direct => Self::Staged,
        }
    }
}

/// The path one upload actually took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPath {
    /// Copied through a transfer slot.
    Staged,
    /// Written directly because the uploader is in [`UploadMode::Direct`].
    Direct,
    /// Written directly because the transfer slot could not be mapped.
    Fallback(MapError),
}

/// Result of [`Uploader::begin_upload`].
#[derive(Debug, Clone)]
pub struct UploadHandle {
    /// Texture slot that now holds the image.
    pub texture: TextureSlot,
    /// Transfer slot index the round-robin selected.
    pub transfer_slot: usize,
    /// Path the pixels took.
    pub path: UploadPath,
    /// Bytes moved.
    pub bytes: usize,
    /// CPU time spent inside `begin_upload`.
    pub elapsed: Duration,
}

/// Round-robin scheduler over a [`TransferBackend`]'s slots.
pub struct Uploader<B> {
    backend: B,
    states: Vec<SlotState>,
    next_slot: usize,
    current: Option<TextureSlot>,
    mode: UploadMode,
}

impl<B: TransferBackend> Uploader<B> {
    /// Wrap a backend. The slot count is the backend's.
    pub fn new(backend: B) -> Self {
        let count = backend.slot_count().max(1);
        Self {
            backend,
            states: vec![SlotState::Idle; count],
            next_slot: 0,
            current: None,
            mode: UploadMode::default(),
        }
    }

    /// Builder-style mode override.
    #[must_use]
    pub fn with_mode(mut self, mode: UploadMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of slot pairs.
    pub fn slot_count(&self) -> usize {
        self.states.len()
    }

    /// Current upload mode.
    pub fn mode(&self) -> UploadMode {
        self.mode
    }

    /// Switch upload mode; takes effect on the next upload.
    pub fn set_mode(&mut self, mode: UploadMode) {
        if mode != self.mode {
            log::info!("upload mode: {mode:?}");
        }
        self.mode = mode;
    }

    /// State of texture slot `slot`, `None` if out of range.
    pub fn slot_state(&self, slot: usize) -> Option<SlotState> {
        self.states.get(slot).copied()
    }

    /// The texture safe to draw this frame, or `None` before the first
    /// upload.
    pub fn current_texture(&self) -> Option<TextureSlot> {
        self.current
    }

    /// Shared access to the backend (texture views, readback).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Exclusive access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Move `image` into the next texture slot and make it current.
    ///
    /// When this returns, [`current_texture`](Self::current_texture) names
    /// the slot holding `image`, whichever path the pixels took.
    pub fn begin_upload(&mut self, image: &DecodedImage) -> UploadHandle {
        let started = Instant::now();
        let slot = self.next_slot;
        self.next_slot = (slot + 1) % self.slot_count();

        debug_assert!(
            self.slot_count() == 1 || self.current != Some(TextureSlot(slot)),
            "slot {slot} refreshed while drawn"
        );
        self.states[slot] = SlotState::Refreshing;

        let path = match self.mode {
            UploadMode::Direct => {
                self.backend.upload_direct(slot, image);
                UploadPath::Direct
            }
            UploadMode::Staged => match self.stage(slot, image) {
                Ok(()) => UploadPath::Staged,
                Err(err) => {
                    match err {
                        MapError::SlotBusy => {
                            log::debug!("transfer slot {slot} busy, direct upload");
                        }
                        _ => log::warn!("transfer slot {slot}: {err}, direct upload"),
                    }
                    self.backend.upload_direct(slot, image);
                    UploadPath::Fallback(err)
                }
            },
        };

        if let Some(previous) = self.current.replace(TextureSlot(slot)) {
            if previous.0 != slot {
                self.states[previous.0] = SlotState::Idle;
            }
        }
        self.states[slot] = SlotState::Ready;

        let handle = UploadHandle {
            texture: TextureSlot(slot),
            transfer_slot: slot,
            path,
            bytes: image.byte_len(),
            elapsed: started.elapsed(),
        };
        log::debug!(
            "upload {}x{} -> slot {} via {:?} in {:?}",
            image.width(),
            image.height(),
            slot,
            handle.path,
            handle.elapsed
        );
        handle
    }

    /// Staged path: fence check, write-map and copy, submit.
    fn stage(&mut self, slot: usize, image: &DecodedImage) -> Result<(), MapError> {
        let needed = self.backend.footprint(image);
        let capacity = self.backend.slot_capacity();
        if needed > capacity {
            return Err(MapError::TooLarge { needed, capacity });
        }

        let wait = self.slot_count() == 1;
        if self.backend.poll_transfer(slot, wait) == FenceStatus::InFlight {
            return Err(MapError::SlotBusy);
        }

        self.backend.write_transfer(slot, image)?;
        self.backend.submit_transfer(slot, slot, image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::software::SoftwareBackend;
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn uploader(slots: usize, latency: u32) -> Uploader<SoftwareBackend> {
        Uploader::new(SoftwareBackend::new(slots, 64 * 64 * 4).with_latency(latency))
    }

    fn current_pixels(up: &mut Uploader<SoftwareBackend>) -> Vec<u8> {
        let slot = up.current_texture().unwrap();
        up.backend_mut().read_texture(slot.index()).unwrap()
    }

    #[test]
    fn no_texture_before_first_upload() {
        let up = uploader(2, 0);
        assert_eq!(up.current_texture(), None);
        assert_eq!(up.slot_state(0), Some(SlotState::Idle));
        assert_eq!(up.slot_state(1), Some(SlotState::Idle));
        assert_eq!(up.slot_state(2), None);
    }

    #[test]
    fn second_upload_is_current() {
        let mut up = uploader(2, 0);
        let a = DecodedImage::solid(2, 2, RED).unwrap();
        let b = DecodedImage::solid(2, 2, BLUE).unwrap();

        let first = up.begin_upload(&a);
        let second = up.begin_upload(&b);

        assert_eq!(first.path, UploadPath::Staged);
        assert_eq!(second.path, UploadPath::Staged);
        assert_eq!(up.current_texture(), Some(TextureSlot(1)));
        let pixels = current_pixels(&mut up);
        assert_eq!(pixels.len(), 16);
        assert!(pixels.chunks_exact(4).all(|texel| texel == BLUE));
    }

    #[test]
    fn slots_rotate_in_lock_step() {
        let mut up = uploader(2, 0);
        let image = DecodedImage::solid(4, 4, RED).unwrap();

        let sequence: Vec<(usize, usize)> = (0..6)
            .map(|_| {
                let handle = up.begin_upload(&image);
                (handle.transfer_slot, handle.texture.index())
            })
            .collect();

        assert_eq!(
            sequence,
            vec![(0, 0), (1, 1), (0, 0), (1, 1), (0, 0), (1, 1)]
        );
    }

    #[test]
    fn states_follow_idle_refreshing_ready() {
        let mut up = uploader(2, 0);
        let image = DecodedImage::solid(1, 1, RED).unwrap();

        let _ = up.begin_upload(&image);
        assert_eq!(up.slot_state(0), Some(SlotState::Ready));
        assert_eq!(up.slot_state(1), Some(SlotState::Idle));

        let _ = up.begin_upload(&image);
        assert_eq!(up.slot_state(0), Some(SlotState::Idle));
        assert_eq!(up.slot_state(1), Some(SlotState::Ready));
    }

    #[test]
    fn current_texture_is_idempotent() {
        let mut up = uploader(2, 0);
        let _ = up.begin_upload(&DecodedImage::solid(2, 2, RED).unwrap());

        let first = up.current_texture();
        let pixels = current_pixels(&mut up);
        for _ in 0..5 {
            assert_eq!(up.current_texture(), first);
            assert_eq!(current_pixels(&mut up), pixels);
        }
    }

    #[test]
    fn cycling_through_all_images_ends_on_the_last() {
        let mut up = uploader(2, 0);
        let images: Vec<DecodedImage> = (0..5u8)
            .map(|i| DecodedImage::solid(3, 3, [i, i * 10, i * 20, 255]).unwrap())
            .collect();

        for image in &images {
            let _ = up.begin_upload(image);
        }

        assert_eq!(current_pixels(&mut up), images[4].pixels());
    }

    #[test]
    fn busy_slot_falls_back_to_direct() {
        // Slot 0 is still in flight when its turn comes round again.
        let mut up = uploader(2, 10);
        let a = DecodedImage::solid(2, 2, RED).unwrap();
        let b = DecodedImage::solid(2, 2, BLUE).unwrap();

        assert_eq!(up.begin_upload(&a).path, UploadPath::Staged);
        assert_eq!(up.begin_upload(&b).path, UploadPath::Staged);
        let third = up.begin_upload(&a);

        assert_eq!(third.path, UploadPath::Fallback(MapError::SlotBusy));
        assert_eq!(third.transfer_slot, 0);
        assert_eq!(current_pixels(&mut up), a.pixels());
        assert_eq!(up.backend().direct_uploads(), 1);
    }

    #[test]
    fn two_slots_absorb_one_frame_of_latency() {
        let mut up = uploader(2, 2);
        let image = DecodedImage::solid(2, 2, RED).unwrap();

        for _ in 0..8 {
            assert_eq!(up.begin_upload(&image).path, UploadPath::Staged);
        }
        assert_eq!(up.backend().direct_uploads(), 0);
    }

    #[test]
    fn injected_map_failure_still_updates_current_texture() {
        let mut up = uploader(2, 0);
        let a = DecodedImage::solid(2, 2, RED).unwrap();
        let b = DecodedImage::solid(2, 2, BLUE).unwrap();
        let _ = up.begin_upload(&a);

        up.backend_mut().fail_next_maps(1);
        let handle = up.begin_upload(&b);

        assert!(matches!(handle.path, UploadPath::Fallback(MapError::MapFailed(_))));
        assert_eq!(up.current_texture(), Some(handle.texture));
        assert_eq!(current_pixels(&mut up), b.pixels());

        // The next upload goes through a transfer slot again.
        assert_eq!(up.begin_upload(&a).path, UploadPath::Staged);
    }

    #[test]
    fn single_slot_waits_instead_of_falling_back() {
        let mut up = uploader(1, 100);
        let a = DecodedImage::solid(2, 2, RED).unwrap();
        let b = DecodedImage::solid(2, 2, BLUE).unwrap();

        for image in [&a, &b, &a, &b] {
            let handle = up.begin_upload(image);
            assert_eq!(handle.path, UploadPath::Staged);
            assert_eq!(handle.texture, TextureSlot(0));
        }
        assert_eq!(up.backend().waits(), 3);
        assert_eq!(current_pixels(&mut up), b.pixels());
    }

    #[test]
    fn oversized_image_goes_direct() {
        let mut up = Uploader::new(SoftwareBackend::new(2, 16));
        let big = DecodedImage::solid(4, 4, RED).unwrap();

        let handle = up.begin_upload(&big);
        assert_eq!(
            handle.path,
            UploadPath::Fallback(MapError::TooLarge {
                needed: 64,
                capacity: 16
            })
        );
        assert_eq!(current_pixels(&mut up), big.pixels());
    }

    #[test]
    fn direct_mode_still_rotates_slots() {
        let mut up = uploader(2, 0).with_mode(UploadMode::Direct);
        let image = DecodedImage::solid(2, 2, RED).unwrap();

        let paths: Vec<_> = (0..3).map(|_| up.begin_upload(&image)).collect();
        assert!(paths.iter().all(|h| h.path == UploadPath::Direct));
        assert_eq!(
            paths.iter().map(|h| h.texture.index()).collect::<Vec<_>>(),
            vec![0, 1, 0]
        );
        assert_eq!(up.backend().staged_copies(), 0);
    }

    #[test]
    fn images_of_different_sizes_replace_texture_dimensions() {
        let mut up = uploader(2, 0);
        let small = DecodedImage::solid(1, 1, RED).unwrap();
        let large = DecodedImage::solid(8, 4, BLUE).unwrap();

        let _ = up.begin_upload(&small);
        let _ = up.begin_upload(&large);
        let _ = up.begin_upload(&large);

        assert_eq!(current_pixels(&mut up).len(), large.byte_len());
    }

    #[test]
    fn mode_toggles() {
        assert_eq!(UploadMode::Staged.toggled(), UploadMode::Direct);
        assert_eq!(UploadMode::Direct.toggled(), UploadMode::Staged);
    }
}
