//! Frame drawing: the colour-wave clear and the textured quad.

pub mod motion;
pub mod quad;
pub mod wave;

pub use motion::{Bounce, QuadMotion, QuadRect};
pub use quad::QuadRenderer;
pub use wave::wave_color;
