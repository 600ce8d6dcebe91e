use std::sync::Arc;

use framerelay_capture::{CaptureSession, ClientAction};
use framerelay_input::KeyRelay;
use tracing::info;

// MARK: - ServerHooks

/// The surface the external display server calls into.
///
/// Connect/disconnect drive the capture session's reference count; key
/// events go straight to the HID relay (when one is configured) without
/// touching the capture pipeline.
pub struct ServerHooks {
    session: Arc<CaptureSession>,
    relay: Option<Arc<KeyRelay>>,
}

impl ServerHooks {
    pub fn new(session: Arc<CaptureSession>, relay: Option<Arc<KeyRelay>>) -> Self {
        Self { session, relay }
    }

    /// New-client hook. Always accepts; the first client starts capture.
    pub fn on_client_connect(&self) -> ClientAction {
        self.session.client_connected()
    }

    /// Client-gone hook. Returns `true` when the server should shut down
    /// (last client left; capture is already stopped and joined).
    pub fn on_client_disconnect(&self) -> bool {
        let shutdown = self.session.client_disconnected();
        if shutdown {
            info!("last client disconnected, shutting the display server down");
        }
        shutdown
    }

    /// Keyboard hook: `(pressed, keysym)` exactly as the protocol delivers
    /// them.
    pub fn on_key(&self, pressed: bool, keysym: u32) {
        if let Some(relay) = &self.relay {
            relay.handle(pressed, keysym);
        }
    }
}
