//! Background colour wave.
//!
//! Three sines a third of a period apart, so the clear colour drifts through
//! the hue circle once every 2π seconds.

use std::f32::consts::TAU;

/// Phase offset of the green channel.
const GREEN_PHASE: f32 = TAU / 3.0;
/// Phase offset of the blue channel.
const BLUE_PHASE: f32 = 2.0 * TAU / 3.0;

/// RGB in `[0, 1]` at `seconds` since start.
pub fn wave_rgb(seconds: f32) -> [f32; 3] {
    [
        0.5 + 0.5 * seconds.sin(),
        0.5 + 0.5 * (seconds + GREEN_PHASE).sin(),
        0.5 + 0.5 * (seconds + BLUE_PHASE).sin(),
    ]
}

/// Opaque clear colour at `seconds` since start.
pub fn wave_color(seconds: f32) -> wgpu::Color {
    let [r, g, b] = wave_rgb(seconds);
    wgpu::Color {
        r: f64::from(r),
        g: f64::from(g),
        b: f64::from(b),
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn starts_at_mid_red() {
        let [r, g, b] = wave_rgb(0.0);
        assert!(close(r, 0.5));
        assert!(close(g, 0.5 + 0.5 * GREEN_PHASE.sin()));
        assert!(close(b, 0.5 + 0.5 * BLUE_PHASE.sin()));
    }

    #[test]
    fn channels_stay_in_unit_range() {
        for step in 0..1000 {
            let rgb = wave_rgb(step as f32 * 0.037);
            assert!(rgb.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn channel_sum_is_constant() {
        // Three sines 120° apart cancel out.
        for step in 0..50 {
            let [r, g, b] = wave_rgb(step as f32 * 0.3);
            assert!((r + g + b - 1.5).abs() < 1e-4);
        }
    }

    #[test]
    fn color_is_opaque() {
        assert_eq!(wave_color(3.0).a, 1.0);
    }
}
