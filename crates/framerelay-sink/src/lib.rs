//! framerelay-sink — the shared framebuffer behind the display server.
//!
//! The capture worker publishes full frames here; the display server's
//! serialization side reads them back out with [`SharedFramebuffer::snapshot`]
//! and consumes the modified region with [`SharedFramebuffer::take_dirty`].
//! Publishes are consistent per frame: the buffer lock is held only for the
//! copy, so a reader sees either the previous frame or the new one, never a
//! mix of both.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use framerelay_core::{FramebufferSink, Rect, TargetGeometry};
use tracing::trace;

struct FramebufferState {
    pixels: Vec<u8>,
    /// Union of the rectangles modified since the last `take_dirty`.
    dirty: Option<Rect>,
}

// MARK: - SharedFramebuffer

/// Heap framebuffer sized to the target geometry, shared between the capture
/// worker and the display serializer.
pub struct SharedFramebuffer {
    geometry: TargetGeometry,
    state: Mutex<FramebufferState>,
    /// Bumped on every publish; lets a serializer skip unchanged frames.
    generation: AtomicU64,
}

impl SharedFramebuffer {
    pub fn new(geometry: TargetGeometry) -> Self {
        Self {
            geometry,
            state: Mutex::new(FramebufferState {
                pixels: vec![0u8; geometry.buffer_len()],
                dirty: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    pub fn geometry(&self) -> TargetGeometry {
        self.geometry
    }

    /// Number of publishes so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Copy the current frame into `out`, resizing it to the buffer length.
    pub fn snapshot(&self, out: &mut Vec<u8>) {
        let state = self.state.lock().unwrap();
        out.clear();
        out.extend_from_slice(&state.pixels);
    }

    /// Hand the accumulated modified region to the serializer, clearing it.
    pub fn take_dirty(&self) -> Option<Rect> {
        self.state.lock().unwrap().dirty.take()
    }
}

impl FramebufferSink for SharedFramebuffer {
    fn publish(&self, pixels: &[u8], x: u32, y: u32, width: u32, height: u32) {
        let bpp = self.geometry.depth.bytes_per_pixel();

        // The capture core always sends the full rectangle; clamp anyway so
        // a misbehaving producer cannot write out of bounds.
        let x = x.min(self.geometry.width);
        let y = y.min(self.geometry.height);
        let width = width.min(self.geometry.width - x);
        let height = height.min(self.geometry.height - y);
        if width == 0 || height == 0 {
            return;
        }

        let rect = Rect::new(x, y, width, height);
        let src_row = width as usize * bpp;
        let dst_row = self.geometry.row_len();

        {
            let mut state = self.state.lock().unwrap();
            if rect == Rect::new(0, 0, self.geometry.width, self.geometry.height)
                && pixels.len() >= state.pixels.len()
            {
                let len = state.pixels.len();
                state.pixels.copy_from_slice(&pixels[..len]);
            } else {
                for row in 0..height as usize {
                    let src = row * src_row;
                    let dst = (y as usize + row) * dst_row + x as usize * bpp;
                    if src + src_row > pixels.len() {
                        break;
                    }
                    state.pixels[dst..dst + src_row].copy_from_slice(&pixels[src..src + src_row]);
                }
            }
            state.dirty = Some(match state.dirty {
                Some(existing) => existing.union(&rect),
                None => rect,
            });
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(generation, ?rect, "framebuffer updated");
    }
}

#[cfg(test)]
mod tests {
    use framerelay_core::PixelDepth;

    use super::*;

    fn fb() -> SharedFramebuffer {
        SharedFramebuffer::new(TargetGeometry::new(4, 3, PixelDepth::Bpp32))
    }

    #[test]
    fn full_frame_publish_replaces_buffer_and_marks_all() {
        let fb = fb();
        let frame = vec![0xAB; fb.geometry().buffer_len()];
        fb.publish(&frame, 0, 0, 4, 3);

        let mut out = Vec::new();
        fb.snapshot(&mut out);
        assert_eq!(out, frame);
        assert_eq!(fb.take_dirty(), Some(Rect::new(0, 0, 4, 3)));
        assert_eq!(fb.generation(), 1);
    }

    #[test]
    fn dirty_region_accumulates_until_taken() {
        let fb = fb();
        let frame = vec![0u8; fb.geometry().buffer_len()];
        fb.publish(&frame, 0, 0, 4, 3);
        fb.publish(&frame, 0, 0, 4, 3);

        assert_eq!(fb.take_dirty(), Some(Rect::new(0, 0, 4, 3)));
        assert_eq!(fb.take_dirty(), None);
        assert_eq!(fb.generation(), 2);
    }

    #[test]
    fn partial_rect_lands_at_offset() {
        let fb = fb();
        let pixel = [1u8, 2, 3, 4];
        fb.publish(&pixel, 2, 1, 1, 1);

        let mut out = Vec::new();
        fb.snapshot(&mut out);
        let offset = (1 * 4 + 2) * 4;
        assert_eq!(&out[offset..offset + 4], &pixel);
        assert_eq!(fb.take_dirty(), Some(Rect::new(2, 1, 1, 1)));
    }

    #[test]
    fn out_of_bounds_publish_is_clamped() {
        let fb = fb();
        let frame = vec![0xFF; fb.geometry().buffer_len()];
        fb.publish(&frame, 10, 10, 4, 3);
        assert_eq!(fb.generation(), 0);
        assert_eq!(fb.take_dirty(), None);
    }
}
