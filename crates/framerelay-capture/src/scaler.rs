use ffmpeg_next as ffmpeg;

use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as Scaler, flag::Flags};
use framerelay_core::{CaptureError, PixelDepth, TargetGeometry};
use tracing::warn;

// MARK: - StreamDescriptor

/// Source-side format a scale context was built for.
///
/// Owned by the decode loop; replaced wholesale when the source signals a
/// format change mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: Pixel,
}

impl StreamDescriptor {
    pub fn matches(&self, width: u32, height: u32, format: Pixel) -> bool {
        self.width == width && self.height == height && self.format == format
    }
}

impl std::fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{} {:?}", self.width, self.height, self.format)
    }
}

/// Sink pixel format for a given framebuffer depth.
pub(crate) fn target_pixel(depth: PixelDepth) -> Pixel {
    match depth {
        // 32 bpp framebuffers use the byte order clients expect for
        // little-endian 0xRRGGBB with a padding byte.
        PixelDepth::Bpp32 => Pixel::BGRA,
        PixelDepth::Bpp24 => Pixel::RGB24,
    }
}

// MARK: - ScalerCache

/// Cached conversion state from the current [`StreamDescriptor`] to the
/// fixed target geometry.
///
/// Rebuilt only when a produced frame's width, height, or pixel format
/// differs from the descriptor the context was built for, so rebuild cost is
/// O(1) per real format change, never per frame. The target side is
/// invariant for the life of the cache.
pub struct ScalerCache {
    desc: StreamDescriptor,
    target: TargetGeometry,
    scaler: Scaler,
    rebuilds: u64,
}

impl ScalerCache {
    pub fn new(desc: StreamDescriptor, target: TargetGeometry) -> Result<Self, CaptureError> {
        let scaler = build(&desc, &target)?;
        Ok(Self { desc, target, scaler, rebuilds: 0 })
    }

    /// The scale context valid for a frame of the given source format,
    /// rebuilding it first if the source format changed.
    pub fn scaler_for(
        &mut self,
        width: u32,
        height: u32,
        format: Pixel,
    ) -> Result<&mut Scaler, CaptureError> {
        if !self.desc.matches(width, height, format) {
            let new_desc = StreamDescriptor { width, height, format };
            // Mid-stream format changes are abnormal but must not kill the
            // pipeline.
            warn!(old = %self.desc, new = %new_desc, "input video format change");
            self.scaler = build(&new_desc, &self.target)?;
            self.desc = new_desc;
            self.rebuilds += 1;
        }
        Ok(&mut self.scaler)
    }

    pub fn descriptor(&self) -> &StreamDescriptor {
        &self.desc
    }

    /// Number of rebuilds since creation (0 while the source format holds).
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}

fn build(desc: &StreamDescriptor, target: &TargetGeometry) -> Result<Scaler, CaptureError> {
    Scaler::get(
        desc.format,
        desc.width,
        desc.height,
        target_pixel(target.depth),
        target.width,
        target.height,
        Flags::BILINEAR,
    )
    .map_err(|e| CaptureError::Scaler(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetGeometry {
        TargetGeometry::new(320, 240, PixelDepth::Bpp32)
    }

    fn cache(width: u32, height: u32) -> ScalerCache {
        ffmpeg::init().unwrap();
        let desc = StreamDescriptor { width, height, format: Pixel::YUV420P };
        ScalerCache::new(desc, target()).unwrap()
    }

    #[test]
    fn stable_format_never_rebuilds() {
        let mut cache = cache(640, 360);
        for _ in 0..5 {
            cache.scaler_for(640, 360, Pixel::YUV420P).unwrap();
        }
        assert_eq!(cache.rebuilds(), 0);
    }

    #[test]
    fn rebuilds_exactly_once_per_transition() {
        let mut cache = cache(640, 360);

        // G1 → G2 transition rebuilds once.
        cache.scaler_for(1280, 720, Pixel::YUV420P).unwrap();
        assert_eq!(cache.rebuilds(), 1);

        // Frames repeating G2 leave the context untouched.
        for _ in 0..4 {
            cache.scaler_for(1280, 720, Pixel::YUV420P).unwrap();
        }
        assert_eq!(cache.rebuilds(), 1);
        assert_eq!(cache.descriptor().width, 1280);
    }

    #[test]
    fn pixel_format_change_alone_invalidates() {
        let mut cache = cache(640, 360);
        cache.scaler_for(640, 360, Pixel::NV12).unwrap();
        assert_eq!(cache.rebuilds(), 1);
        assert_eq!(cache.descriptor().format, Pixel::NV12);
    }

    #[test]
    fn target_pixel_by_depth() {
        assert_eq!(target_pixel(PixelDepth::Bpp32), Pixel::BGRA);
        assert_eq!(target_pixel(PixelDepth::Bpp24), Pixel::RGB24);
    }
}
