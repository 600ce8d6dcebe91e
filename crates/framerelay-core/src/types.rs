use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CaptureError;

// MARK: - PixelDepth

/// Output pixel depth of the shared framebuffer.
///
/// Only 24 bpp (packed RGB) and 32 bpp (RGB + padding byte) layouts are
/// supported by the display server; any other depth is rejected before a
/// decoder is ever opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PixelDepth {
    Bpp24,
    Bpp32,
}

impl PixelDepth {
    pub fn bits(self) -> u8 {
        match self {
            Self::Bpp24 => 24,
            Self::Bpp32 => 32,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bpp24 => 3,
            Self::Bpp32 => 4,
        }
    }
}

impl TryFrom<u8> for PixelDepth {
    type Error = CaptureError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            24 => Ok(Self::Bpp24),
            32 => Ok(Self::Bpp32),
            other => Err(CaptureError::UnsupportedDepth(other)),
        }
    }
}

impl From<PixelDepth> for u8 {
    fn from(depth: PixelDepth) -> Self {
        depth.bits()
    }
}

impl std::fmt::Display for PixelDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bpp", self.bits())
    }
}

// MARK: - TargetGeometry

/// Shape of the sink framebuffer. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGeometry {
    pub width: u32,
    pub height: u32,
    pub depth: PixelDepth,
}

impl TargetGeometry {
    pub fn new(width: u32, height: u32, depth: PixelDepth) -> Self {
        Self { width, height, depth }
    }

    /// Size in bytes of a full frame at this geometry.
    pub fn buffer_len(&self) -> usize {
        self.width as usize * self.height as usize * self.depth.bytes_per_pixel()
    }

    /// Length in bytes of one packed row.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.depth.bytes_per_pixel()
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::InvalidConfig {
                reason: format!("target geometry {}×{} has a zero dimension", self.width, self.height),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for TargetGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{}×{}", self.width, self.height, self.depth)
    }
}

// MARK: - MediaSource

/// Identifier of the compressed video source handed to the demuxer.
///
/// A literal `-` on the command line selects the standard-input pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Local container file.
    Path(PathBuf),
    /// Network stream (anything with a scheme, e.g. `udp://…`, `http://…`).
    Url(String),
    /// Compressed stream arriving on stdin.
    Stdin,
}

impl MediaSource {
    /// Classify a raw source argument. Never fails: anything that is not
    /// the stdin sentinel or a URL is taken as a path.
    pub fn parse(s: &str) -> Self {
        if s == "-" {
            Self::Stdin
        } else if s.contains("://") {
            Self::Url(s.to_string())
        } else {
            Self::Path(PathBuf::from(s))
        }
    }

    /// Target string understood by the demuxer (`pipe:` for stdin).
    pub fn demux_target(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Url(u) => u.clone(),
            Self::Stdin => "pipe:".to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

impl FromStr for MediaSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl std::fmt::Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => write!(f, "{u}"),
            Self::Stdin => write!(f, "<stdin>"),
        }
    }
}
