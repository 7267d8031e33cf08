use serde::{Deserialize, Serialize};

/// Diagnostics toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DebugOptions {
    /// Read every uploaded texture back and compare it with the source
    /// pixels. Blocks the render thread; for bring-up only.
    pub verify_uploads: bool,
}
