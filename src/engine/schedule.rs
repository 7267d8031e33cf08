//! When to switch images and which image comes next.

/// Frame-count cadence of image switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchSchedule {
    first_frame: u64,
    interval: u64,
    /// Frame of the last switch handed out by [`Self::take_switch`].
    last_switch: Option<u64>,
}

impl SwitchSchedule {
    /// Switch at `first_frame` and every `interval` frames after it.
    pub fn new(first_frame: u64, interval: u64) -> Self {
        Self {
            first_frame,
            interval: interval.max(1),
            last_switch: None,
        }
    }

    /// Whether frame `frame` uploads the next image.
    pub fn is_switch_frame(&self, frame: u64) -> bool {
        frame >= self.first_frame && (frame - self.first_frame) % self.interval == 0
    }

    /// Whether frame `frame` should switch now. A frame is handed out at
    /// most once, however often the loop asks before the frame ends.
    pub fn take_switch(&mut self, frame: u64) -> bool {
        if !self.is_switch_frame(frame) || self.last_switch == Some(frame) {
            return false;
        }
        self.last_switch = Some(frame);
        true
    }

    /// Whether the quad is drawn on frame `frame`.
    pub fn draws_quad(&self, frame: u64) -> bool {
        frame >= self.first_frame
    }

    /// Texture slot the quad shows on `frame`, given `image_count` images
    /// and the uploader's `ready` slot. `None` skips the quad.
    pub fn quad_slot(
        &self,
        frame: u64,
        image_count: usize,
        ready: Option<usize>,
    ) -> Option<usize> {
        if image_count == 0 || !self.draws_quad(frame) {
            return None;
        }
        ready
    }
}

/// Round-robin cursor over the image store.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    next: usize,
}

impl Playlist {
    /// Index of the image to upload next out of `len`, or `None` when there
    /// are no images.
    pub fn advance(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let index = self.next % len;
        self.next = (index + 1) % len;
        Some(index)
    }
}
