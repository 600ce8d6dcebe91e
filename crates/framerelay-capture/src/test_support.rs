//! Scripted runners and sinks for lifecycle tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use framerelay_core::{CaptureError, FramebufferSink, TargetGeometry};

use crate::runner::{CaptureRunner, RunContext, RunStats};

/// Sink that counts publishes and remembers the last rectangle.
#[derive(Default)]
pub struct CountingSink {
    publishes: AtomicU64,
    last_rect: Mutex<Option<(u32, u32, u32, u32)>>,
}

impl CountingSink {
    pub fn publishes(&self) -> u64 {
        self.publishes.load(Ordering::SeqCst)
    }

    pub fn last_rect(&self) -> Option<(u32, u32, u32, u32)> {
        *self.last_rect.lock().unwrap()
    }
}

impl FramebufferSink for CountingSink {
    fn publish(&self, _pixels: &[u8], x: u32, y: u32, width: u32, height: u32) {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        *self.last_rect.lock().unwrap() = Some((x, y, width, height));
    }
}

/// Runner that stays "capturing" until cancelled, publishing nothing.
#[derive(Default)]
pub struct BlockingRunner {
    runs: AtomicU64,
}

impl BlockingRunner {
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }
}

impl CaptureRunner for BlockingRunner {
    fn run(&self, ctx: RunContext) -> Result<RunStats, CaptureError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        while !ctx.cancel.is_cancelled() {
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(RunStats::default())
    }
}

/// Runner that publishes full frames until cancelled.
pub struct PublishingRunner {
    target: TargetGeometry,
}

impl PublishingRunner {
    pub fn new(target: TargetGeometry) -> Self {
        Self { target }
    }
}

impl CaptureRunner for PublishingRunner {
    fn run(&self, ctx: RunContext) -> Result<RunStats, CaptureError> {
        let frame = vec![0u8; self.target.buffer_len()];
        let mut stats = RunStats::default();
        while !ctx.cancel.is_cancelled() {
            ctx.sink.publish(&frame, 0, 0, self.target.width, self.target.height);
            stats.frames_published += 1;
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(stats)
    }
}

/// Runner that publishes a fixed number of frames and then returns, as a
/// stream hitting end-of-input would.
pub struct FiniteRunner {
    target: TargetGeometry,
    frames: u64,
}

impl FiniteRunner {
    pub fn new(target: TargetGeometry, frames: u64) -> Self {
        Self { target, frames }
    }
}

impl CaptureRunner for FiniteRunner {
    fn run(&self, ctx: RunContext) -> Result<RunStats, CaptureError> {
        let frame = vec![0u8; self.target.buffer_len()];
        let mut stats = RunStats::default();
        for _ in 0..self.frames {
            if ctx.cancel.is_cancelled() {
                break;
            }
            ctx.sink.publish(&frame, 0, 0, self.target.width, self.target.height);
            stats.frames_published += 1;
        }
        Ok(stats)
    }
}

/// Runner that fails immediately, as an unopenable source would.
pub struct FailingRunner;

impl CaptureRunner for FailingRunner {
    fn run(&self, ctx: RunContext) -> Result<RunStats, CaptureError> {
        Err(CaptureError::Open {
            input: ctx.source.to_string(),
            reason: "scripted failure".to_string(),
        })
    }
}
