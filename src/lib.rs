// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Benchmark harness for streaming decoded images into GPU textures.
//!
//! A fixed set of PNG images is decoded once into an
//! [`image_store::ImageStore`]. The render loop then cycles through them,
//! pushing each one to the GPU through an [`upload::Uploader`] and drawing
//! the result as a textured quad over a colour-wave background.
//!
//! # Key entry points
//!
//! - [`upload::Uploader`] - round-robin transfer/texture slots with a
//!   per-slot completion fence and a direct-upload fallback
//! - [`upload::TransferBackend`] - the seam between the uploader and the
//!   device; [`upload::wgpu_backend::WgpuBackend`] drives a real GPU,
//!   [`upload::software::SoftwareBackend`] emulates one in host memory
//! - [`engine::StreamEngine`] - switch cadence, timing and drawing
//! - [`options::Options`] - TOML-loadable tunables
//!
//! # Upload paths
//!
//! In [`upload::UploadMode::Staged`] the image is copied into a
//! write-mapped staging buffer that the GPU then copies into the texture.
//! The staging buffer is mapped again right after submission; that mapping
//! only completes when the GPU is done reading, so it doubles as the fence
//! checked before the slot is reused. [`upload::UploadMode::Direct`] hands
//! the pixels straight to `Queue::write_texture` and is the baseline the
//! staged path is measured against.

pub mod engine;
pub mod error;
pub mod gpu;
pub mod image_store;
pub mod input;
pub mod options;
pub mod renderer;
pub mod upload;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use error::StreamError;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
