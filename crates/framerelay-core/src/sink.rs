// MARK: - Rect

/// A rectangle inside the target framebuffer, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

// MARK: - FramebufferSink

/// Destination for decoded, rescaled pixels.
///
/// The capture core always publishes the full target rectangle starting at
/// `(0, 0)`; partial rectangles exist in the contract for the benefit of the
/// display serializer, not the decoder. Publishing is fire-and-forget: the
/// core never reads the buffer back and assumes nothing about when (or
/// whether) the display layer ships the update to clients.
pub trait FramebufferSink: Send + Sync {
    /// Copy `width * height * bytes_per_pixel` bytes of `pixels` into the
    /// shared framebuffer at `(x, y)` and mark the rectangle as modified.
    fn publish(&self, pixels: &[u8], x: u32, y: u32, width: u32, height: u32);
}
