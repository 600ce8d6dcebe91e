//! framerelay-input — keyboard relay to the controlled device.
//!
//! The display server hands us `(pressed, keysym)` pairs from remote
//! clients; this crate maps them onto USB HID boot-keyboard usages,
//! maintains the 8-byte report (modifier byte + 6-key rollover), and writes
//! each updated report to a USB HID gadget device (`/dev/hidgN`) so the
//! machine on the other end of the cable sees a real keyboard.

pub mod hidg;
pub mod keymap;
pub mod report;

pub use hidg::{HidKeyboard, KeyRelay};
pub use keymap::{map_keysym, KeyAction, Modifiers};
pub use report::{KeyReport, REPORT_LEN};
