//! framerelay-core — shared types, errors, and configuration.
//!
//! Everything the other crates agree on lives here: the fixed output
//! geometry, the media source identifier, the error taxonomy of a capture
//! run, and the `FramebufferSink` seam through which decoded pixels reach
//! the display server's shared buffer.

pub mod config;
pub mod errors;
pub mod sink;
pub mod types;

pub use config::ServerConfig;
pub use errors::{CaptureError, InputError};
pub use sink::{FramebufferSink, Rect};
pub use types::*;
