use std::sync::Arc;

use anyhow::Result;
use framerelay_capture::CaptureSession;
use framerelay_core::config::{parse_port_offset, PORT_OFFSET_ENV};
use framerelay_core::{MediaSource, ServerConfig};
use framerelay_input::{HidKeyboard, KeyRelay};
use framerelay_sink::SharedFramebuffer;
use tracing::{info, warn};

use crate::hooks::ServerHooks;

/// Environment variable naming the HID gadget device for the key relay.
pub const HID_DEVICE_ENV: &str = "FRAMERELAY_HID_DEVICE";

/// Wire the capture pipeline behind the display server's hooks and run.
///
/// The remote-display protocol server is an external component: it owns the
/// client sockets and calls [`ServerHooks`] on connect, disconnect, and key
/// events. Until one is linked in, the binary drives a single hook-mediated
/// session to end-of-stream, which exercises the full pipeline headless.
pub fn run(source: MediaSource) -> Result<()> {
    let mut config = ServerConfig::default();
    if let Ok(device) = std::env::var(HID_DEVICE_ENV) {
        config.hid_device = Some(device);
    }

    let offset = parse_port_offset(std::env::var(PORT_OFFSET_ENV).ok().as_deref());
    let port = config.effective_port(offset);
    info!(
        port,
        desktop = %config.desktop_name,
        geometry = %config.geometry,
        source = %source,
        "starting"
    );

    let framebuffer = Arc::new(SharedFramebuffer::new(config.geometry));
    let session = Arc::new(CaptureSession::new(
        source,
        config.geometry,
        framebuffer.clone(),
    ));

    let relay = match &config.hid_device {
        Some(path) => match HidKeyboard::open(path) {
            Ok(keyboard) => Some(Arc::new(KeyRelay::new(keyboard))),
            Err(e) => {
                warn!("input relay disabled: {e}");
                None
            }
        },
        None => None,
    };

    let hooks = ServerHooks::new(session.clone(), relay);

    hooks.on_client_connect();
    session.wait_until_idle();
    hooks.on_client_disconnect();

    info!(frames = framebuffer.generation(), "session complete");
    Ok(())
}
