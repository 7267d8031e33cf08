//! Frame clock and upload statistics.

/// Delta time, smoothed FPS and frame limiting.
pub mod frame_timing;
pub mod upload_stats;
