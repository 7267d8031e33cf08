use serde::{Deserialize, Serialize};

use crate::upload::{UploadMode, DEFAULT_SLOT_COUNT};
use crate::upload::wgpu_backend::MAX_TEXTURE_DIM;

/// Upload pipeline tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamOptions {
    /// Staged (transfer slots) or direct texture writes.
    pub mode: UploadMode,
    /// Transfer/texture slot pairs. `1` is single-buffered re-upload.
    pub slot_count: usize,
    /// Largest accepted image edge; sizes each transfer slot.
    pub max_texture_dim: u32,
    /// Frames between image switches.
    pub switch_interval_frames: u64,
    /// Frames to wait before the first upload and the first quad draw.
    pub first_texture_frame: u64,
    /// Seconds between periodic statistics reports (0 disables them).
    pub stats_interval_secs: f32,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            mode: UploadMode::Staged,
            slot_count: DEFAULT_SLOT_COUNT,
            max_texture_dim: MAX_TEXTURE_DIM,
            switch_interval_frames: 60,
            first_texture_frame: 100,
            stats_interval_secs: 5.0,
        }
    }
}

impl StreamOptions {
    /// Slot count clamped to at least one.
    pub fn slots(&self) -> usize {
        self.slot_count.max(1)
    }

    /// Switch interval clamped to at least one frame.
    pub fn interval(&self) -> u64 {
        self.switch_interval_frames.max(1)
    }
}
