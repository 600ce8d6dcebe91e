use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{PixelDepth, TargetGeometry};

/// Default listening port of the display server (offset applies on top).
pub const DEFAULT_DISPLAY_PORT: u16 = 5900;

/// Environment variable holding the optional numeric port offset.
pub const PORT_OFFSET_ENV: &str = "FRAMERELAY_PORT_OFFSET";

// MARK: - ServerConfig

/// Process-wide configuration, fixed at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub geometry: TargetGeometry,
    #[serde(alias = "desktopName")]
    pub desktop_name: String,
    #[serde(alias = "basePort")]
    pub base_port: u16,
    /// Path of the USB HID gadget device the key relay writes to, if any.
    #[serde(alias = "hidDevice")]
    pub hid_device: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            geometry: TargetGeometry::new(1024, 768, PixelDepth::Bpp32),
            desktop_name: "HDMI".to_string(),
            base_port: DEFAULT_DISPLAY_PORT,
            hid_device: None,
        }
    }
}

impl ServerConfig {
    /// Listening port after applying an optional offset (absent ⇒ base).
    pub fn effective_port(&self, offset: Option<u16>) -> u16 {
        self.base_port.saturating_add(offset.unwrap_or(0))
    }
}

/// Parse the raw value of [`PORT_OFFSET_ENV`]. Unset or non-numeric values
/// mean "no override".
pub fn parse_port_offset(raw: Option<&str>) -> Option<u16> {
    let raw = raw?;
    match raw.trim().parse::<u16>() {
        Ok(offset) => Some(offset),
        Err(_) => {
            warn!("ignoring non-numeric port offset {raw:?}");
            None
        }
    }
}
