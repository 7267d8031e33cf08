//! Transfer backend on wgpu staging buffers.
//!
//! Each transfer slot is a `MAP_WRITE | COPY_SRC` buffer. It starts out
//! mapped; the uploader writes the image rows into it at the 256-byte row
//! pitch `copy_buffer_to_texture` requires, unmaps, records the copy and
//! submits. Right after submission the slot asks to be mapped for write
//! again. That request only completes once the GPU has finished reading the
//! buffer, so the map callback is the slot's completion fence.

use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

use super::backend::{FenceStatus, MapError, TransferBackend};
use crate::image_store::{DecodedImage, BYTES_PER_PIXEL};

/// Largest texture edge the transfer slots are sized for by default.
pub const MAX_TEXTURE_DIM: u32 = 2048;

/// Texture format of every texture slot.
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

const FENCE_PENDING: u8 = 0;
const FENCE_MAPPED: u8 = 1;
const FENCE_FAILED: u8 = 2;

/// Row pitch, in bytes, of a `width`-pixel RGBA8 row inside a transfer slot.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL as u32;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

struct StagingSlot {
    buffer: wgpu::Buffer,
    fence: Arc<AtomicU8>,
    /// Row pitch of the rows written since the last submission.
    pitch: u32,
}

impl StagingSlot {
    fn new(device: &wgpu::Device, index: usize, capacity: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("Transfer Slot {index}")),
            size: capacity,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });
        Self {
            buffer,
            fence: Arc::new(AtomicU8::new(FENCE_MAPPED)),
            pitch: 0,
        }
    }

    /// Ask for a write mapping; completes when the GPU is done with the
    /// buffer.
    fn arm_fence(&self) {
        self.fence.store(FENCE_PENDING, Ordering::SeqCst);
        let fence = self.fence.clone();
        self.buffer
            .slice(..)
            .map_async(wgpu::MapMode::Write, move |result| {
                let state = if result.is_ok() {
                    FENCE_MAPPED
                } else {
                    FENCE_FAILED
                };
                fence.store(state, Ordering::SeqCst);
            });
    }

    fn state(&self) -> u8 {
        self.fence.load(Ordering::SeqCst)
    }
}

/// A texture slot's GPU texture, recreated whenever the image size changes.
pub struct SlotTexture {
    /// The sampled texture.
    pub texture: wgpu::Texture,
    /// Full-texture view.
    pub view: wgpu::TextureView,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bumped on every reallocation so bind groups can be rebuilt.
    pub generation: u64,
}

/// wgpu implementation of [`TransferBackend`].
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    slots: Vec<StagingSlot>,
    textures: Vec<Option<SlotTexture>>,
    capacity: u64,
    generation: u64,
}

impl WgpuBackend {
    /// Allocate `slot_count` transfer slots sized for `max_dim × max_dim`
    /// RGBA8 images.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slot_count: usize,
        max_dim: u32,
    ) -> Self {
        let slot_count = slot_count.max(1);
        let capacity = u64::from(padded_bytes_per_row(max_dim)) * u64::from(max_dim);
        log::info!(
            "allocating {slot_count} transfer slot(s) of {} KiB",
            capacity / 1024
        );
        Self {
            device: device.clone(),
            queue: queue.clone(),
            slots: (0..slot_count)
                .map(|i| StagingSlot::new(device, i, capacity))
                .collect(),
            textures: (0..slot_count).map(|_| None).collect(),
            capacity,
            generation: 0,
        }
    }

    /// The texture currently held by slot `texture`.
    pub fn texture(&self, texture: usize) -> Option<&SlotTexture> {
        self.textures.get(texture)?.as_ref()
    }

    /// Make sure texture slot `index` matches the image dimensions.
    fn ensure_texture(&mut self, index: usize, width: u32, height: u32) {
        let matches = self.textures[index]
            .as_ref()
            .is_some_and(|t| t.width == width && t.height == height);
        if !matches {
            self.generation += 1;
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("Texture Slot {index}")),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.textures[index] = Some(SlotTexture {
                texture,
                view,
                width,
                height,
                generation: self.generation,
            });
        }
    }

    fn poll_device(&self, wait: bool) {
        if let Err(e) = self.device.poll(poll_type(wait)) {
            log::warn!("device poll failed: {e}");
        }
    }
}

/// Blocking poll only when the caller may wait.
fn poll_type(wait: bool) -> wgpu::PollType {
    if wait {
        wgpu::PollType::Wait
    } else {
        wgpu::PollType::Poll
    }
}

fn extent(image: &DecodedImage) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: image.width(),
        height: image.height(),
        depth_or_array_layers: 1,
    }
}

impl TransferBackend for WgpuBackend {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot_capacity(&self) -> usize {
        self.capacity as usize
    }

    fn footprint(&self, image: &DecodedImage) -> usize {
        padded_bytes_per_row(image.width()) as usize * image.height() as usize
    }

    fn poll_transfer(&mut self, slot: usize, wait: bool) -> FenceStatus {
        if self.slots[slot].state() == FENCE_PENDING {
            self.poll_device(wait);
        }
        match self.slots[slot].state() {
            FENCE_MAPPED => FenceStatus::Retired,
            FENCE_FAILED => {
                // The buffer is idle but unmapped; ask again.
                log::warn!("transfer slot {slot} lost its mapping, remapping");
                self.slots[slot].arm_fence();
                self.poll_device(wait);
                if self.slots[slot].state() == FENCE_MAPPED {
                    FenceStatus::Retired
                } else {
                    FenceStatus::InFlight
                }
            }
            _ => FenceStatus::InFlight,
        }
    }

    fn write_transfer(
        &mut self,
        slot: usize,
        image: &DecodedImage,
    ) -> Result<(), MapError> {
        let staging = &mut self.slots[slot];
        match staging.state() {
            FENCE_MAPPED => {}
            FENCE_PENDING => return Err(MapError::SlotBusy),
            _ => return Err(MapError::MapFailed(format!("slot {slot} unmapped"))),
        }

        let pitch = padded_bytes_per_row(image.width());
        let needed = pitch as usize * image.height() as usize;
        if needed as u64 > self.capacity {
            return Err(MapError::TooLarge {
                needed,
                capacity: self.capacity as usize,
            });
        }

        {
            let mut view = staging.buffer.slice(..needed as u64).get_mapped_range_mut();
            let row = image.row_bytes();
            for (y, src) in image.pixels().chunks_exact(row).enumerate() {
                let dst = y * pitch as usize;
                view[dst..dst + row].copy_from_slice(src);
            }
        }
        staging.buffer.unmap();
        staging.fence.store(FENCE_PENDING, Ordering::SeqCst);
        staging.pitch = pitch;
        Ok(())
    }

    fn submit_transfer(&mut self, slot: usize, texture: usize, image: &DecodedImage) {
        let size = extent(image);
        let pitch = self.slots[slot].pitch;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Transfer Encoder"),
            });
        self.ensure_texture(texture, image.width(), image.height());
        let Some(target) = self.texture(texture) else {
            return;
        };
        encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer: &self.slots[slot].buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(pitch),
                    rows_per_image: Some(image.height()),
                },
            },
            target.texture.as_image_copy(),
            size,
        );
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
        self.slots[slot].arm_fence();
    }

    fn upload_direct(&mut self, texture: usize, image: &DecodedImage) {
        let size = extent(image);
        self.ensure_texture(texture, image.width(), image.height());
        let Some(target) = self.texture(texture) else {
            return;
        };
        self.queue.write_texture(
            target.texture.as_image_copy(),
            image.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.row_bytes() as u32),
                rows_per_image: Some(image.height()),
            },
            size,
        );
        let _ = self.queue.submit([]);
    }

    fn read_texture(&mut self, texture: usize) -> Option<Vec<u8>> {
        let slot = self.texture(texture)?;
        let (width, height) = (slot.width, slot.height);
        let pitch = padded_bytes_per_row(width);
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Texture Readback"),
            size: u64::from(pitch) * u64::from(height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            slot.texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(pitch),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        let _ = self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = readback.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.poll_device(true);

        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::warn!("texture readback failed: {e}");
                return None;
            }
            Err(_) => return None,
        }

        let row = width as usize * BYTES_PER_PIXEL;
        let data = buffer_slice.get_mapped_range();
        let mut pixels = Vec::with_capacity(row * height as usize);
        for padded_row in data.chunks_exact(pitch as usize) {
            pixels.extend_from_slice(&padded_row[..row]);
        }
        drop(data);
        readback.unmap();
        Some(pixels)
    }
}
