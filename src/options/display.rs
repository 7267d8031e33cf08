use serde::{Deserialize, Serialize};

use crate::renderer::QuadMotion;

/// Window and quad presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayOptions {
    /// Where the textured quad sits.
    pub motion: QuadMotion,
    /// Bounce speed in pixels per second.
    pub bounce_speed: f32,
    /// Quad edge length as a fraction of the viewport edge.
    pub quad_scale: f32,
    /// Frame cap (0 = unlimited).
    pub target_fps: u32,
    /// Borderless fullscreen instead of a 640x480 window.
    pub fullscreen: bool,
    /// Wait for vertical blank when presenting.
    pub vsync: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            motion: QuadMotion::Centered,
            bounce_speed: 240.0,
            quad_scale: 0.5,
            target_fps: 0,
            fullscreen: true,
            vsync: true,
        }
    }
}
