use std::sync::Arc;

use framerelay_core::{CaptureError, FramebufferSink, MediaSource, TargetGeometry};

use crate::cancel::CancelToken;

// MARK: - RunContext

/// Everything one capture run needs, bundled at worker spawn.
#[derive(Clone)]
pub struct RunContext {
    pub source: MediaSource,
    pub target: TargetGeometry,
    pub cancel: CancelToken,
    pub sink: Arc<dyn FramebufferSink>,
}

// MARK: - RunStats

/// Outcome of a completed capture run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Full frames published to the sink, flush pass included.
    pub frames_published: u64,
}

// MARK: - CaptureRunner

/// Body of the capture worker thread.
///
/// The production implementation is [`FfmpegRunner`](crate::FfmpegRunner);
/// the seam exists so session-lifecycle behavior can be exercised with
/// scripted runners.
///
/// Implementations must honor `ctx.cancel` (checked at packet granularity)
/// and release every per-run resource on every exit path, error paths
/// included.
pub trait CaptureRunner: Send + Sync {
    fn run(&self, ctx: RunContext) -> Result<RunStats, CaptureError>;
}
