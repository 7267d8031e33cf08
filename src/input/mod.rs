//! Keyboard actions and the key names they are bound by.

mod keyboard;

#[cfg(feature = "viewer")]
pub use keyboard::key_name;
pub use keyboard::KeyAction;
