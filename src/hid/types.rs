//! HID report types for keyboard and mouse

use serde::{Deserialize, Serialize};
use std::fmt;

use super::descriptor::{REPORT_ID_KEYBOARD, REPORT_ID_MOUSE_ABSOLUTE, REPORT_ID_MOUSE_RELATIVE};
use super::encoder;

/// Keyboard report length in bytes (without report ID)
pub const KEYBOARD_REPORT_LEN: usize = 8;
/// Relative mouse report length in bytes (without report ID)
pub const MOUSE_RELATIVE_REPORT_LEN: usize = 4;
/// Absolute mouse report length in bytes (without report ID)
pub const MOUSE_ABSOLUTE_REPORT_LEN: usize = 6;

/// Logical device a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Keyboard,
    MouseRelative,
    MouseAbsolute,
}

impl ReportKind {
    /// All report kinds, in report ID order
    pub const ALL: [ReportKind; 3] = [
        ReportKind::Keyboard,
        ReportKind::MouseRelative,
        ReportKind::MouseAbsolute,
    ];

    /// Report ID declared for this kind in the report descriptor
    pub fn report_id(&self) -> u8 {
        match self {
            Self::Keyboard => REPORT_ID_KEYBOARD,
            Self::MouseRelative => REPORT_ID_MOUSE_RELATIVE,
            Self::MouseAbsolute => REPORT_ID_MOUSE_ABSOLUTE,
        }
    }

    /// Encoded payload length (without report ID)
    pub fn report_len(&self) -> usize {
        match self {
            Self::Keyboard => KEYBOARD_REPORT_LEN,
            Self::MouseRelative => MOUSE_RELATIVE_REPORT_LEN,
            Self::MouseAbsolute => MOUSE_ABSOLUTE_REPORT_LEN,
        }
    }

    /// Look up a kind by its report ID
    pub fn from_report_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.report_id() == id)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Keyboard => "keyboard",
            Self::MouseRelative => "relative mouse",
            Self::MouseAbsolute => "absolute mouse",
        };
        f.write_str(name)
    }
}

/// Keyboard modifier flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardModifiers {
    /// Left Control
    #[serde(default)]
    pub left_ctrl: bool,
    /// Left Shift
    #[serde(default)]
    pub left_shift: bool,
    /// Left Alt
    #[serde(default)]
    pub left_alt: bool,
    /// Left Meta (Windows/Super key)
    #[serde(default)]
    pub left_meta: bool,
    /// Right Control
    #[serde(default)]
    pub right_ctrl: bool,
    /// Right Shift
    #[serde(default)]
    pub right_shift: bool,
    /// Right Alt (AltGr)
    #[serde(default)]
    pub right_alt: bool,
    /// Right Meta
    #[serde(default)]
    pub right_meta: bool,
}

impl KeyboardModifiers {
    /// Convert to the HID modifier byte (usages 0xE0..=0xE7, bit 0 first)
    pub fn to_hid_byte(&self) -> u8 {
        [
            self.left_ctrl,
            self.left_shift,
            self.left_alt,
            self.left_meta,
            self.right_ctrl,
            self.right_shift,
            self.right_alt,
            self.right_meta,
        ]
        .iter()
        .enumerate()
        .fold(0u8, |byte, (bit, &on)| if on { byte | (1 << bit) } else { byte })
    }

    /// Create from the HID modifier byte
    pub fn from_hid_byte(byte: u8) -> Self {
        Self {
            left_ctrl: byte & 0x01 != 0,
            left_shift: byte & 0x02 != 0,
            left_alt: byte & 0x04 != 0,
            left_meta: byte & 0x08 != 0,
            right_ctrl: byte & 0x10 != 0,
            right_shift: byte & 0x20 != 0,
            right_alt: byte & 0x40 != 0,
            right_meta: byte & 0x80 != 0,
        }
    }
}

/// Mouse button state (3 buttons declared by the descriptor)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseButtons {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub middle: bool,
}

impl MouseButtons {
    /// Convert to the HID button bitmask
    pub fn to_hid_byte(&self) -> u8 {
        let mut byte = 0u8;
        if self.left {
            byte |= 0x01;
        }
        if self.right {
            byte |= 0x02;
        }
        if self.middle {
            byte |= 0x04;
        }
        byte
    }

    /// Create from a HID button bitmask; padding bits are ignored
    pub fn from_hid_byte(byte: u8) -> Self {
        Self {
            left: byte & 0x01 != 0,
            right: byte & 0x02 != 0,
            middle: byte & 0x04 != 0,
        }
    }
}

/// HID keyboard report (8 bytes)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    /// Modifier byte
    pub modifiers: u8,
    /// Key codes (up to 6 simultaneous keys)
    pub keys: [u8; 6],
}

impl KeyboardReport {
    /// Report with a single key in the first slot
    pub fn single(modifiers: u8, key: u8) -> Self {
        Self {
            modifiers,
            keys: [key, 0, 0, 0, 0, 0],
        }
    }

    /// Convert to bytes; the reserved byte is always zero
    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_LEN] {
        encoder::encode_keyboard_keys(self.modifiers, &self.keys)
    }

    /// Add a key to the report
    pub fn add_key(&mut self, key: u8) -> bool {
        if key == 0 || self.keys.contains(&key) {
            return key != 0;
        }
        for slot in &mut self.keys {
            if *slot == 0 {
                *slot = key;
                return true;
            }
        }
        false // All slots full
    }

    /// Remove a key, keeping the remaining keys packed in press order
    pub fn remove_key(&mut self, key: u8) {
        let mut packed = [0u8; 6];
        for (dst, src) in packed
            .iter_mut()
            .zip(self.keys.iter().filter(|&&k| k != 0 && k != key))
        {
            *dst = *src;
        }
        self.keys = packed;
    }

    /// Clear all keys and modifiers
    pub fn clear(&mut self) {
        self.modifiers = 0;
        self.keys = [0; 6];
    }

    /// Check if nothing is pressed
    pub fn is_empty(&self) -> bool {
        self.modifiers == 0 && self.keys.iter().all(|&k| k == 0)
    }
}

/// Relative mouse report (4 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseRelativeReport {
    /// Button bitmask
    pub buttons: u8,
    /// X movement
    pub dx: i8,
    /// Y movement
    pub dy: i8,
    /// Wheel movement
    pub wheel: i8,
}

impl MouseRelativeReport {
    pub fn to_bytes(&self) -> [u8; MOUSE_RELATIVE_REPORT_LEN] {
        encoder::encode_mouse_relative(self.buttons, self.dx, self.dy, self.wheel)
    }
}

/// Absolute mouse report (6 bytes)
///
/// Coordinates are kept wide and only clamped to the logical range when encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseAbsoluteReport {
    /// Button bitmask
    pub buttons: u8,
    /// X position
    pub x: i32,
    /// Y position
    pub y: i32,
    /// Wheel movement
    pub wheel: i8,
}

impl MouseAbsoluteReport {
    pub fn to_bytes(&self) -> [u8; MOUSE_ABSOLUTE_REPORT_LEN] {
        encoder::encode_mouse_absolute(self.buttons, self.x, self.y, self.wheel)
    }
}

/// A report for one of the three logical devices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HidReport {
    Keyboard(KeyboardReport),
    MouseRelative(MouseRelativeReport),
    MouseAbsolute(MouseAbsoluteReport),
}

impl HidReport {
    /// The all-released keyboard report
    pub fn key_release() -> Self {
        Self::Keyboard(KeyboardReport::default())
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            Self::Keyboard(_) => ReportKind::Keyboard,
            Self::MouseRelative(_) => ReportKind::MouseRelative,
            Self::MouseAbsolute(_) => ReportKind::MouseAbsolute,
        }
    }

    /// Encode the payload (without report ID)
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Keyboard(r) => r.to_bytes().to_vec(),
            Self::MouseRelative(r) => r.to_bytes().to_vec(),
            Self::MouseAbsolute(r) => r.to_bytes().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_conversion() {
        let mods = KeyboardModifiers {
            left_ctrl: true,
            left_shift: true,
            ..Default::default()
        };
        assert_eq!(mods.to_hid_byte(), 0x03);

        let mods2 = KeyboardModifiers::from_hid_byte(0x81);
        assert!(mods2.left_ctrl);
        assert!(mods2.right_meta);
        assert!(!mods2.left_alt);
        assert_eq!(mods2.to_hid_byte(), 0x81);
    }

    #[test]
    fn test_mouse_buttons() {
        let buttons = MouseButtons {
            left: true,
            middle: true,
            ..Default::default()
        };
        assert_eq!(buttons.to_hid_byte(), 0x05);
        assert_eq!(MouseButtons::from_hid_byte(0xFA), MouseButtons {
            left: false,
            right: true,
            middle: false,
        });
    }

    #[test]
    fn test_keyboard_report() {
        let mut report = KeyboardReport::default();
        assert!(report.add_key(0x04)); // 'A'
        assert!(report.add_key(0x05)); // 'B'
        assert!(report.add_key(0x06)); // 'C'
        assert_eq!(report.keys[..3], [0x04, 0x05, 0x06]);

        report.remove_key(0x04);
        assert_eq!(report.keys, [0x05, 0x06, 0, 0, 0, 0]);

        report.clear();
        assert!(report.is_empty());
    }

    #[test]
    fn test_keyboard_report_full() {
        let mut report = KeyboardReport::default();
        for key in 0x04..0x0A {
            assert!(report.add_key(key));
        }
        assert!(!report.add_key(0x0A));
        // Already pressed keys are not duplicated
        assert!(report.add_key(0x04));
        assert_eq!(report.keys, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
    }

    #[test]
    fn test_report_kind_ids() {
        assert_eq!(ReportKind::Keyboard.report_id(), 1);
        assert_eq!(ReportKind::MouseRelative.report_id(), 2);
        assert_eq!(ReportKind::MouseAbsolute.report_id(), 3);
        assert_eq!(ReportKind::from_report_id(3), Some(ReportKind::MouseAbsolute));
        assert_eq!(ReportKind::from_report_id(4), None);
    }

    #[test]
    fn test_hid_report_dispatch() {
        let report = HidReport::MouseRelative(MouseRelativeReport {
            buttons: 0x02,
            dx: -1,
            dy: 1,
            wheel: 0,
        });
        assert_eq!(report.kind(), ReportKind::MouseRelative);
        assert_eq!(report.encode(), vec![0x02, 0xFF, 0x01, 0x00]);

        let release = HidReport::key_release();
        assert_eq!(release.kind(), ReportKind::Keyboard);
        assert_eq!(release.encode(), vec![0u8; 8]);

        for kind in ReportKind::ALL {
            let report = match kind {
                ReportKind::Keyboard => HidReport::Keyboard(KeyboardReport::default()),
                ReportKind::MouseRelative => HidReport::MouseRelative(Default::default()),
                ReportKind::MouseAbsolute => HidReport::MouseAbsolute(Default::default()),
            };
            assert_eq!(report.encode().len(), kind.report_len());
        }
    }
}
