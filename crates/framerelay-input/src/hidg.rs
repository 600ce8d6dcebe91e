use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use framerelay_core::InputError;
use tracing::{info, warn};

use crate::report::KeyReport;

// MARK: - HidKeyboard

/// Writes boot-keyboard reports to a USB HID gadget device.
///
/// The kernel's gadget function (`/dev/hidgN`) forwards each 8-byte report
/// to the USB host on the other end of the cable.
pub struct HidKeyboard {
    device: File,
    report: KeyReport,
}

impl HidKeyboard {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| InputError::DeviceOpen {
                path: path.display().to_string(),
                source,
            })?;
        info!(device = %path.display(), "HID keyboard relay ready");
        Ok(Self { device, report: KeyReport::new() })
    }

    /// Fold a key event into the report and, when it maps to anything,
    /// write the updated report to the host.
    pub fn key_event(&mut self, pressed: bool, keysym: u32) -> Result<(), InputError> {
        if self.report.apply(pressed, keysym) {
            self.device.write_all(&self.report.as_bytes())?;
        }
        Ok(())
    }
}

// MARK: - KeyRelay

/// Thread-safe wrapper around [`HidKeyboard`] for the display server's key
/// hook, which may fire from any client thread. Relay errors are logged,
/// never propagated — a broken relay must not take the display down.
pub struct KeyRelay {
    keyboard: Mutex<HidKeyboard>,
}

impl KeyRelay {
    pub fn new(keyboard: HidKeyboard) -> Self {
        Self { keyboard: Mutex::new(keyboard) }
    }

    pub fn handle(&self, pressed: bool, keysym: u32) {
        let mut keyboard = self.keyboard.lock().unwrap();
        if let Err(e) = keyboard.key_event(pressed, keysym) {
            warn!("key relay failed: {e}");
        }
    }
}
