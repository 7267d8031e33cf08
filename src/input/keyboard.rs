use serde::{Deserialize, Serialize};

/// Engine-level actions that can be bound to keys.
///
/// Serde serializes as `snake_case` strings so TOML files stay readable:
/// ```toml
/// [keybindings.bindings]
/// quit = "Escape"
/// next_image = "Space"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Close the window and exit.
    Quit,
    /// Upload the next image now instead of waiting for the interval.
    NextImage,
    /// Switch between staged and direct uploads.
    ToggleUploadMode,
    /// Switch between a centred and a bouncing quad.
    ToggleMotion,
    /// Log the upload statistics report.
    LogStats,
}

/// Key string for a winit key code, in the form bindings use (`"KeyM"`,
/// `"Escape"`).
#[cfg(feature = "viewer")]
pub fn key_name(code: winit::keyboard::KeyCode) -> String {
    format!("{code:?}")
}

#[cfg(all(test, feature = "viewer"))]
mod tests {
    use winit::keyboard::KeyCode;

    use super::*;

    #[test]
    fn key_names_match_default_bindings() {
        assert_eq!(key_name(KeyCode::Escape), "Escape");
        assert_eq!(key_name(KeyCode::Space), "Space");
        assert_eq!(key_name(KeyCode::KeyM), "KeyM");
    }
}
