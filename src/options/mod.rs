//! Run-time tunables with TOML file support.
//!
//! Every default equals the behaviour of a run without an options file, so a
//! file only needs the values it changes:
//!
//! ```toml
//! [stream]
//! mode = "direct"
//! slot_count = 1
//!
//! [display]
//! motion = "bounce"
//! ```

mod debug;
mod display;
mod images;
mod keybindings;
mod stream;

use std::path::Path;

pub use debug::DebugOptions;
pub use display::DisplayOptions;
pub use images::ImageOptions;
pub use keybindings::KeybindingOptions;
use serde::{Deserialize, Serialize};
pub use stream::StreamOptions;

use crate::error::StreamError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[stream]`) work correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Upload pipeline settings.
    pub stream: StreamOptions,
    /// Window and quad settings.
    pub display: DisplayOptions,
    /// Input file naming.
    pub images: ImageOptions,
    /// Keyboard binding options.
    pub keybindings: KeybindingOptions,
    /// Diagnostics toggles.
    pub debug: DebugOptions,
}

impl Options {
    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`StreamError::Io`] if the file cannot be read,
    /// [`StreamError::Options`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, StreamError> {
        let content = std::fs::read_to_string(path).map_err(StreamError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse options from TOML text.
    ///
    /// # Errors
    ///
    /// [`StreamError::Options`] on malformed input.
    pub fn from_toml(content: &str) -> Result<Self, StreamError> {
        let mut opts: Self = toml::from_str(content)
            .map_err(|e| StreamError::Options(e.to_string()))?;
        opts.keybindings.rebuild_reverse_map();
        Ok(opts)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// [`StreamError::Options`] if serialization fails, [`StreamError::Io`]
    /// if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), StreamError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StreamError::Options(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StreamError::Io)?;
        }
        std::fs::write(path, content).map_err(StreamError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::QuadMotion;
    use crate::upload::UploadMode;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed = Options::from_toml(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[stream]
mode = "direct"
slot_count = 1

[display]
motion = "bounce"
"#;
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(opts.stream.mode, UploadMode::Direct);
        assert_eq!(opts.stream.slot_count, 1);
        assert_eq!(opts.display.motion, QuadMotion::Bounce);
        // Everything else should be default
        assert_eq!(opts.stream.first_texture_frame, 100);
        assert_eq!(opts.images.file_name(3), "image3.png");
        assert!(opts.display.fullscreen);
        assert!(!opts.debug.verify_uploads);
    }

    #[test]
    fn malformed_toml_is_an_options_error() {
        let err = Options::from_toml("[stream]\nslot_count = \"two\"").unwrap_err();
        assert!(matches!(err, StreamError::Options(_)));
    }

    #[test]
    fn keybinding_lookup() {
        use crate::input::KeyAction;
        let opts = Options::default();
        assert_eq!(opts.keybindings.lookup("Escape"), Some(KeyAction::Quit));
        assert_eq!(opts.keybindings.lookup("Space"), Some(KeyAction::NextImage));
        assert_eq!(opts.keybindings.lookup("KeyZ"), None);
    }

    #[test]
    fn rebound_key_is_looked_up_after_load() {
        use crate::input::KeyAction;
        let toml_str = r#"
[keybindings.bindings]
quit = "KeyQ"
"#;
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(opts.keybindings.lookup("KeyQ"), Some(KeyAction::Quit));
        assert_eq!(opts.keybindings.lookup("Escape"), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("texstream.toml");
        let mut opts = Options::default();
        opts.stream.switch_interval_frames = 5;
        opts.images.prefix = "frame".into();

        opts.save(&path).unwrap();
        let loaded = Options::load(&path).unwrap();
        assert_eq!(loaded, opts);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Options::load(Path::new("/nonexistent/texstream.toml")).unwrap_err();
        assert!(matches!(err, StreamError::Io(_)));
    }
}
