//! X11 keysym → USB HID usage mapping.
//!
//! Covers the printable Latin-1 range, function keys, modifiers, and the
//! editing/navigation cluster — the keys a remote operator actually sends.
//! Anything else is reported as [`KeyAction::Unmapped`] and dropped by the
//! caller.

use bitflags::bitflags;

// X11 keysym values (keysymdef.h).
pub const XK_SPACE: u32 = 0x0020;
pub const XK_ASCIITILDE: u32 = 0x007e;
pub const XK_BACKSPACE: u32 = 0xff08;
pub const XK_TAB: u32 = 0xff09;
pub const XK_RETURN: u32 = 0xff0d;
pub const XK_ESCAPE: u32 = 0xff1b;
pub const XK_HOME: u32 = 0xff50;
pub const XK_LEFT: u32 = 0xff51;
pub const XK_UP: u32 = 0xff52;
pub const XK_RIGHT: u32 = 0xff53;
pub const XK_DOWN: u32 = 0xff54;
pub const XK_PRIOR: u32 = 0xff55;
pub const XK_NEXT: u32 = 0xff56;
pub const XK_END: u32 = 0xff57;
pub const XK_BEGIN: u32 = 0xff58;
pub const XK_INSERT: u32 = 0xff63;
pub const XK_F1: u32 = 0xffbe;
pub const XK_F12: u32 = 0xffc9;
pub const XK_SHIFT_L: u32 = 0xffe1;
pub const XK_SHIFT_R: u32 = 0xffe2;
pub const XK_CONTROL_L: u32 = 0xffe3;
pub const XK_CONTROL_R: u32 = 0xffe4;
pub const XK_ALT_L: u32 = 0xffe9;
pub const XK_ALT_R: u32 = 0xffea;
pub const XK_SUPER_L: u32 = 0xffeb;
pub const XK_SUPER_R: u32 = 0xffec;
pub const XK_DELETE: u32 = 0xffff;

bitflags! {
    /// Modifier byte of the HID boot keyboard report.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const CTRL_LEFT   = 1 << 0;
        const SHIFT_LEFT  = 1 << 1;
        const ALT_LEFT    = 1 << 2;
        const GUI_LEFT    = 1 << 3;
        const CTRL_RIGHT  = 1 << 4;
        const SHIFT_RIGHT = 1 << 5;
        const ALT_RIGHT   = 1 << 6;
        const GUI_RIGHT   = 1 << 7;
    }
}

// MARK: - KeyAction

/// What a keysym means to the HID report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Regular key with a usage code for the rollover array.
    Usage(u8),
    /// Modifier bit in the report's first byte.
    Modifier(Modifiers),
    /// No HID equivalent; logged and dropped.
    Unmapped,
}

/// HID usages for the printable Latin-1 keysyms, indexed by
/// `keysym - XK_SPACE`. Shifted characters share the usage of their base
/// key; the controlled host applies its own shift state.
#[rustfmt::skip]
const LATIN1_BASE: [u8; (XK_ASCIITILDE - XK_SPACE + 1) as usize] = [
    0x2c, // space
    0x1e, // !
    0x34, // "
    0x20, // #
    0x21, // $
    0x22, // %
    0x24, // &
    0x34, // '
    0x26, // (
    0x27, // )
    0x25, // *
    0x2e, // +
    0x36, // ,
    0x2d, // -
    0x37, // .
    0x38, // /
    0x27, 0x1e, 0x1f, 0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, // 0-9
    0x33, // :
    0x33, // ;
    0x36, // <
    0x2e, // =
    0x37, // >
    0x38, // ?
    0x1f, // @
    0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, // A-J
    0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, // K-T
    0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d,                         // U-Z
    0x2f, // [
    0x31, // backslash
    0x30, // ]
    0x23, // ^
    0x2d, // _
    0x35, // `
    0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, // a-j
    0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, // k-t
    0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d,                         // u-z
    0x2f, // {
    0x31, // |
    0x30, // }
    0x35, // ~
];

/// Map one keysym to its HID meaning.
pub fn map_keysym(keysym: u32) -> KeyAction {
    use KeyAction::*;
    match keysym {
        XK_SPACE..=XK_ASCIITILDE => Usage(LATIN1_BASE[(keysym - XK_SPACE) as usize]),
        XK_F1..=XK_F12 => Usage((keysym - XK_F1) as u8 + 0x3a),
        XK_BACKSPACE => Usage(0x2a),
        XK_TAB => Usage(0x2b),
        XK_RETURN => Usage(0x28),
        XK_ESCAPE => Usage(0x29),
        XK_DELETE => Usage(0x4c),
        XK_HOME | XK_BEGIN => Usage(0x4a),
        XK_LEFT => Usage(0x50),
        XK_UP => Usage(0x52),
        XK_RIGHT => Usage(0x4f),
        XK_DOWN => Usage(0x51),
        XK_PRIOR => Usage(0x4b),
        XK_NEXT => Usage(0x4e),
        XK_END => Usage(0x4d),
        XK_INSERT => Usage(0x49),
        XK_SHIFT_L => Modifier(Modifiers::SHIFT_LEFT),
        XK_SHIFT_R => Modifier(Modifiers::SHIFT_RIGHT),
        XK_CONTROL_L => Modifier(Modifiers::CTRL_LEFT),
        XK_CONTROL_R => Modifier(Modifiers::CTRL_RIGHT),
        XK_ALT_L => Modifier(Modifiers::ALT_LEFT),
        XK_ALT_R => Modifier(Modifiers::ALT_RIGHT),
        XK_SUPER_L => Modifier(Modifiers::GUI_LEFT),
        XK_SUPER_R => Modifier(Modifiers::GUI_RIGHT),
        _ => Unmapped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_hid_usages() {
        assert_eq!(map_keysym('a' as u32), KeyAction::Usage(0x04));
        assert_eq!(map_keysym('A' as u32), KeyAction::Usage(0x04));
        assert_eq!(map_keysym('z' as u32), KeyAction::Usage(0x1d));
        assert_eq!(map_keysym('1' as u32), KeyAction::Usage(0x1e));
        assert_eq!(map_keysym('0' as u32), KeyAction::Usage(0x27));
        assert_eq!(map_keysym(' ' as u32), KeyAction::Usage(0x2c));
    }

    #[test]
    fn function_keys_are_contiguous() {
        assert_eq!(map_keysym(XK_F1), KeyAction::Usage(0x3a));
        assert_eq!(map_keysym(XK_F1 + 4), KeyAction::Usage(0x3e)); // F5
        assert_eq!(map_keysym(XK_F12), KeyAction::Usage(0x45));
    }

    #[test]
    fn editing_cluster() {
        assert_eq!(map_keysym(XK_RETURN), KeyAction::Usage(0x28));
        assert_eq!(map_keysym(XK_ESCAPE), KeyAction::Usage(0x29));
        assert_eq!(map_keysym(XK_BACKSPACE), KeyAction::Usage(0x2a));
        assert_eq!(map_keysym(XK_LEFT), KeyAction::Usage(0x50));
        assert_eq!(map_keysym(XK_RIGHT), KeyAction::Usage(0x4f));
        assert_eq!(map_keysym(XK_DELETE), KeyAction::Usage(0x4c));
    }

    #[test]
    fn modifiers_map_to_bits() {
        assert_eq!(map_keysym(XK_SHIFT_L), KeyAction::Modifier(Modifiers::SHIFT_LEFT));
        assert_eq!(map_keysym(XK_CONTROL_R), KeyAction::Modifier(Modifiers::CTRL_RIGHT));
        assert_eq!(map_keysym(XK_ALT_L), KeyAction::Modifier(Modifiers::ALT_LEFT));
        assert_eq!(map_keysym(XK_SUPER_L), KeyAction::Modifier(Modifiers::GUI_LEFT));
    }

    #[test]
    fn unknown_keysyms_are_unmapped() {
        assert_eq!(map_keysym(0xfe03), KeyAction::Unmapped); // ISO_Level3_Shift
        assert_eq!(map_keysym(0x1008ff11), KeyAction::Unmapped); // XF86AudioLowerVolume
    }
}
