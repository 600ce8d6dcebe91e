//! framerelay-capture — the capture pipeline.
//!
//! One [`CaptureSession`] exists per process. Client-connect events from the
//! display server bump its reference count and call [`CaptureSession::start`];
//! the first caller spawns the decode worker on a dedicated OS thread. The
//! worker demuxes the configured source, decodes packets, rescales every
//! produced frame to the fixed target geometry through a cached scale
//! context, and publishes each full frame into the [`FramebufferSink`].
//! Disconnects decrement the count; at zero, [`CaptureSession::stop`]
//! requests cooperative cancellation and joins the worker.
//!
//! [`FramebufferSink`]: framerelay_core::FramebufferSink

pub mod cancel;
pub mod decode;
pub mod runner;
pub mod scaler;
pub mod session;

pub use cancel::CancelToken;
pub use decode::FfmpegRunner;
pub use runner::{CaptureRunner, RunContext, RunStats};
pub use scaler::{ScalerCache, StreamDescriptor};
pub use session::{CaptureSession, ClientAction, SessionState};

#[cfg(test)]
mod test_support;
