//! Host-memory stand-in for a GPU.
//!
//! Transfer slots and textures are plain byte vectors. A submitted copy lands
//! in its texture immediately, matching the queue-ordering guarantee a real
//! device gives later draws, but the transfer slot stays in flight until a
//! configurable number of fence polls have elapsed. That is enough to
//! exercise slot rotation, busy-slot fallbacks and readback without a
//! device, and it backs the headless benchmark mode.

use super::backend::{FenceStatus, MapError, TransferBackend};
use crate::image_store::DecodedImage;

#[derive(Debug, Default)]
struct HostTexture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[derive(Debug)]
struct HostTransfer {
    bytes: Vec<u8>,
    written: usize,
    /// Clock value at which the last submitted copy retires.
    retires_at: Option<u64>,
}

/// CPU-emulated transfer backend.
#[derive(Debug)]
pub struct SoftwareBackend {
    transfers: Vec<HostTransfer>,
    textures: Vec<Option<HostTexture>>,
    capacity: usize,
    latency: u32,
    clock: u64,
    fail_maps: u32,
    staged_copies: u64,
    direct_uploads: u64,
    waits: u64,
}

impl SoftwareBackend {
    /// `slot_count` slot pairs, each transfer slot holding `capacity` bytes.
    /// Copies retire on the next poll (`latency` 0).
    #[must_use]
    pub fn new(slot_count: usize, capacity: usize) -> Self {
        let slot_count = slot_count.max(1);
        Self {
            transfers: (0..slot_count)
                .map(|_| HostTransfer {
                    bytes: vec![0; capacity],
                    written: 0,
                    retires_at: None,
                })
                .collect(),
            textures: (0..slot_count).map(|_| None).collect(),
            capacity,
            latency: 0,
            clock: 0,
            fail_maps: 0,
            staged_copies: 0,
            direct_uploads: 0,
            waits: 0,
        }
    }

    /// Keep each submitted transfer in flight for `latency` fence polls
    /// (across all slots) before it retires.
    #[must_use]
    pub fn with_latency(mut self, latency: u32) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next `count` write mappings fail.
    pub fn fail_next_maps(&mut self, count: u32) {
        self.fail_maps = count;
    }

    /// Copies submitted through transfer slots so far.
    pub fn staged_copies(&self) -> u64 {
        self.staged_copies
    }

    /// Direct uploads performed so far.
    pub fn direct_uploads(&self) -> u64 {
        self.direct_uploads
    }

    /// Blocking fence waits performed so far.
    pub fn waits(&self) -> u64 {
        self.waits
    }

    /// Dimensions of a texture slot, if it has been written.
    pub fn texture_size(&self, texture: usize) -> Option<(u32, u32)> {
        self.textures
            .get(texture)?
            .as_ref()
            .map(|t| (t.width, t.height))
    }
}

impl TransferBackend for SoftwareBackend {
    fn slot_count(&self) -> usize {
        self.transfers.len()
    }

    fn slot_capacity(&self) -> usize {
        self.capacity
    }

    fn poll_transfer(&mut self, slot: usize, wait: bool) -> FenceStatus {
        self.clock += 1;
        let clock = self.clock;
        let transfer = &mut self.transfers[slot];
        match transfer.retires_at {
            Some(at) if at > clock => {
                if wait {
                    self.waits += 1;
                    transfer.retires_at = None;
                    FenceStatus::Retired
                } else {
                    FenceStatus::InFlight
                }
            }
            _ => {
                transfer.retires_at = None;
                FenceStatus::Retired
            }
        }
    }

    fn write_transfer(
        &mut self,
        slot: usize,
        image: &DecodedImage,
    ) -> Result<(), MapError> {
        if self.fail_maps > 0 {
            self.fail_maps -= 1;
            return Err(MapError::MapFailed("injected failure".into()));
        }

        let transfer = &mut self.transfers[slot];
        if transfer.retires_at.is_some() {
            return Err(MapError::SlotBusy);
        }
        let len = image.byte_len();
        if len > transfer.bytes.len() {
            return Err(MapError::TooLarge {
                needed: len,
                capacity: transfer.bytes.len(),
            });
        }
        transfer.bytes[..len].copy_from_slice(image.pixels());
        transfer.written = len;
        Ok(())
    }

    fn submit_transfer(&mut self, slot: usize, texture: usize, image: &DecodedImage) {
        let transfer = &mut self.transfers[slot];
        let pixels = transfer.bytes[..transfer.written].to_vec();
        transfer.retires_at =
            (self.latency > 0).then(|| self.clock + u64::from(self.latency));

        self.textures[texture] = Some(HostTexture {
            width: image.width(),
            height: image.height(),
            pixels,
        });
        self.staged_copies += 1;
    }

    fn upload_direct(&mut self, texture: usize, image: &DecodedImage) {
        self.textures[texture] = Some(HostTexture {
            width: image.width(),
            height: image.height(),
            pixels: image.pixels().to_vec(),
        });
        self.direct_uploads += 1;
    }

    fn read_texture(&mut self, texture: usize) -> Option<Vec<u8>> {
        self.textures
            .get(texture)?
            .as_ref()
            .map(|t| t.pixels.clone())
    }
}
