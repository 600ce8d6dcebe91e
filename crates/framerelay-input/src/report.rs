use tracing::{debug, warn};

use crate::keymap::{map_keysym, KeyAction, Modifiers};

/// Byte length of a HID boot keyboard report.
pub const REPORT_LEN: usize = 8;

/// Slots in the rollover array.
const ROLLOVER: usize = 6;

// MARK: - KeyReport

/// Current state of the emulated keyboard: modifier byte plus the 6-key
/// rollover array, serialized verbatim as the gadget report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyReport {
    modifiers: Modifiers,
    keys: [u8; ROLLOVER],
}

impl KeyReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one key event into the report.
    ///
    /// Returns `true` when the resulting report should be written to the
    /// device; unmapped keysyms return `false` and change nothing.
    pub fn apply(&mut self, pressed: bool, keysym: u32) -> bool {
        match map_keysym(keysym) {
            KeyAction::Modifier(modifier) => {
                if pressed {
                    self.modifiers.insert(modifier);
                } else {
                    self.modifiers.remove(modifier);
                }
                true
            }
            KeyAction::Usage(code) => {
                if pressed {
                    self.press(code);
                } else {
                    self.release(code);
                }
                true
            }
            KeyAction::Unmapped => {
                debug!(
                    "unhandled key {} 0x{:04x}",
                    if pressed { "press" } else { "release" },
                    keysym
                );
                false
            }
        }
    }

    fn press(&mut self, code: u8) {
        // Key autorepeat arrives as repeated presses; the code is already
        // in the report then.
        if self.keys.contains(&code) {
            return;
        }
        match self.keys.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => *slot = code,
            None => warn!("too many keys pressed"),
        }
    }

    fn release(&mut self, code: u8) {
        match self.keys.iter_mut().find(|slot| **slot == code) {
            Some(slot) => *slot = 0,
            None => debug!(code, "release for key not in report"),
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys.iter().copied().filter(|&code| code != 0)
    }

    /// The 8-byte report: modifiers, reserved byte, six key slots.
    pub fn as_bytes(&self) -> [u8; REPORT_LEN] {
        let mut out = [0u8; REPORT_LEN];
        out[0] = self.modifiers.bits();
        out[2..].copy_from_slice(&self.keys);
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::keymap::{XK_CONTROL_L, XK_SHIFT_L};

    use super::*;

    #[test]
    fn press_release_cycle_returns_to_empty() {
        let mut report = KeyReport::new();
        assert!(report.apply(true, 'a' as u32));
        assert_eq!(report.as_bytes(), [0, 0, 0x04, 0, 0, 0, 0, 0]);

        assert!(report.apply(false, 'a' as u32));
        assert_eq!(report, KeyReport::new());
    }

    #[test]
    fn modifier_sets_and_clears_first_byte() {
        let mut report = KeyReport::new();
        report.apply(true, XK_SHIFT_L);
        report.apply(true, XK_CONTROL_L);
        assert_eq!(report.as_bytes()[0], (Modifiers::SHIFT_LEFT | Modifiers::CTRL_LEFT).bits());

        report.apply(false, XK_SHIFT_L);
        assert_eq!(report.modifiers(), Modifiers::CTRL_LEFT);
    }

    #[test]
    fn rollover_is_limited_to_six_keys() {
        let mut report = KeyReport::new();
        for key in ['a', 'b', 'c', 'd', 'e', 'f'] {
            report.apply(true, key as u32);
        }
        assert_eq!(report.pressed_keys().count(), 6);

        // Seventh key is dropped, the report is unchanged.
        let before = report;
        report.apply(true, 'g' as u32);
        assert_eq!(report, before);

        // Releasing one frees a slot again.
        report.apply(false, 'c' as u32);
        report.apply(true, 'g' as u32);
        assert!(report.pressed_keys().any(|code| code == 0x0a));
    }

    #[test]
    fn autorepeat_press_does_not_duplicate() {
        let mut report = KeyReport::new();
        report.apply(true, 'x' as u32);
        report.apply(true, 'x' as u32);
        assert_eq!(report.pressed_keys().count(), 1);
    }

    #[test]
    fn unmapped_key_changes_nothing() {
        let mut report = KeyReport::new();
        assert!(!report.apply(true, 0xfe03));
        assert_eq!(report, KeyReport::new());
    }

    #[test]
    fn release_of_absent_key_is_harmless() {
        let mut report = KeyReport::new();
        assert!(report.apply(false, 'q' as u32));
        assert_eq!(report, KeyReport::new());
    }
}
