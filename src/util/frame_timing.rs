use web_time::{Duration, Instant};

/// Per-frame clock: delta time, smoothed FPS and an optional frame cap.
pub struct FrameTiming {
    /// Target FPS (0 = unlimited)
    target_fps: u32,
    /// Minimum frame duration derived from `target_fps`
    min_frame_duration: Duration,
    /// When the clock was created
    start: Instant,
    /// Last frame timestamp
    last_frame: Instant,
    /// Frames completed so far
    frames: u64,
    /// Exponential moving average of the frame rate
    smoothed_fps: f32,
    /// Weight of the newest sample (0.0-1.0)
    smoothing: f32,
}

impl FrameTiming {
    /// Create a new frame timer with the given FPS target (0 = unlimited).
    pub fn new(target_fps: u32) -> Self {
        let min_frame_duration = if target_fps > 0 {
            Duration::from_secs_f64(1.0 / f64::from(target_fps))
        } else {
            Duration::ZERO
        };
        let now = Instant::now();

        Self {
            target_fps,
            min_frame_duration,
            start: now,
            last_frame: now,
            frames: 0,
            smoothed_fps: 60.0,
            smoothing: 0.05,
        }
    }

    /// Whether enough time has passed since the last frame to render again.
    pub fn should_render(&self) -> bool {
        if self.target_fps == 0 {
            return true;
        }
        self.last_frame.elapsed() >= self.min_frame_duration
    }

    /// Mark the end of a frame and return the seconds it took.
    pub fn end_frame(&mut self) -> f32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frames += 1;

        if frame_time > 0.0 {
            let instant_fps = 1.0 / frame_time;
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + instant_fps * self.smoothing;
        }
        frame_time
    }

    /// Seconds since the clock was created; drives the colour wave.
    pub fn seconds(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Get the current FPS (smoothed)
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_always_renders() {
        assert!(FrameTiming::new(0).should_render());
    }

    #[test]
    fn capped_waits_for_the_frame_budget() {
        let mut timing = FrameTiming::new(1);
        let _ = timing.end_frame();
        assert!(!timing.should_render());
    }

    #[test]
    fn counts_frames() {
        let mut timing = FrameTiming::new(0);
        for _ in 0..3 {
            let dt = timing.end_frame();
            assert!(dt >= 0.0);
        }
        assert_eq!(timing.frames(), 3);
    }
}
