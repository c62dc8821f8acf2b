//! HID Report Descriptor
//!
//! One descriptor declares three application collections sharing a single
//! interrupt channel. Every report is prefixed on the wire by its Report ID:
//!
//! | ID | Collection      | Payload                                   |
//! |----|-----------------|-------------------------------------------|
//! | 1  | Keyboard        | modifiers, reserved, 6 key codes (8 bytes)|
//! | 2  | Relative mouse  | buttons, dx, dy, wheel (4 bytes)          |
//! | 3  | Absolute mouse  | buttons, x (LE16), y (LE16), wheel (6 B)  |
//!
//! The field widths here and the layouts in [`super::encoder`] must change
//! together. [`report_layouts`] recomputes the per-ID bit lengths so tests can
//! hold the two in lockstep.

use std::collections::BTreeMap;
use thiserror::Error;

/// Report ID of the keyboard collection
pub const REPORT_ID_KEYBOARD: u8 = 1;
/// Report ID of the relative mouse collection
pub const REPORT_ID_MOUSE_RELATIVE: u8 = 2;
/// Report ID of the absolute mouse collection
pub const REPORT_ID_MOUSE_ABSOLUTE: u8 = 3;

/// Combined keyboard + relative mouse + absolute mouse descriptor
pub const HID_REPORT_DESCRIPTOR: &[u8] = &[
    // ---- Keyboard ----
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, REPORT_ID_KEYBOARD, //   Report ID (1)
    // Modifier keys input (8 bits)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224) - Left Control
    0x29, 0xE7, //   Usage Maximum (231) - Right GUI
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute) - Modifier byte
    // Reserved byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant) - Reserved byte
    // Key array (6 bytes)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x65, //   Logical Maximum (101)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x65, //   Usage Maximum (101)
    0x81, 0x00, //   Input (Data, Array) - Key array (6 keys)
    0xC0, // End Collection
    // ---- Relative mouse ----
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, REPORT_ID_MOUSE_RELATIVE, //   Report ID (2)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    // Buttons (3 bits)
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x03, //     Usage Maximum (3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x03, //     Report Count (3)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute) - Button bits
    // Padding (5 bits)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x05, //     Report Size (5)
    0x81, 0x01, //     Input (Constant) - Padding
    // X, Y, Wheel
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x06, //     Input (Data, Variable, Relative) - X, Y, Wheel
    0xC0, //   End Collection
    0xC0, // End Collection
    // ---- Absolute mouse ----
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, REPORT_ID_MOUSE_ABSOLUTE, //   Report ID (3)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    // Buttons (3 bits)
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x03, //     Usage Maximum (3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x03, //     Report Count (3)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute) - Button bits
    // Padding (5 bits)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x05, //     Report Size (5)
    0x81, 0x01, //     Input (Constant) - Padding
    // X, Y position (16-bit absolute)
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x15, 0x00, //     Logical Minimum (0)
    0x26, 0xFF, 0x7F, // Logical Maximum (32767)
    0x75, 0x10, //     Report Size (16)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x02, //     Input (Data, Variable, Absolute) - X, Y
    // Wheel
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x06, //     Input (Data, Variable, Relative) - Wheel
    0xC0, //   End Collection
    0xC0, // End Collection
];

/// Descriptor parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("item at offset {0} is truncated")]
    Truncated(usize),

    #[error("long item at offset {0} is not supported")]
    LongItem(usize),

    #[error("end collection at offset {0} without open collection")]
    UnbalancedCollection(usize),

    #[error("{0} collection(s) left open")]
    UnclosedCollection(usize),

    #[error("pop at offset {0} without matching push")]
    UnbalancedPop(usize),
}

/// One Input main item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub report_size: u32,
    pub report_count: u32,
    pub logical_min: i32,
    pub logical_max: i32,
    /// Constant (padding) field
    pub constant: bool,
}

impl InputField {
    pub fn bits(&self) -> u32 {
        self.report_size * self.report_count
    }
}

/// Input fields declared under one Report ID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportLayout {
    pub report_id: u8,
    pub fields: Vec<InputField>,
}

impl ReportLayout {
    /// Total input length in bits (without the report ID byte)
    pub fn input_bits(&self) -> u32 {
        self.fields.iter().map(InputField::bits).sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct GlobalState {
    report_id: u8,
    report_size: u32,
    report_count: u32,
    logical_min: i32,
    logical_max: i32,
}

/// Walk the short items of a descriptor and collect input layouts per Report ID
pub fn report_layouts(descriptor: &[u8]) -> Result<Vec<ReportLayout>, DescriptorError> {
    let mut layouts: BTreeMap<u8, ReportLayout> = BTreeMap::new();
    let mut global = GlobalState::default();
    let mut stack: Vec<GlobalState> = Vec::new();
    let mut depth = 0usize;
    let mut pos = 0usize;

    while pos < descriptor.len() {
        let prefix = descriptor[pos];
        if prefix == 0xFE {
            return Err(DescriptorError::LongItem(pos));
        }
        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let data = descriptor
            .get(pos + 1..pos + 1 + size)
            .ok_or(DescriptorError::Truncated(pos))?;
        let item_type = (prefix >> 2) & 0x03;
        let tag = prefix >> 4;

        match (item_type, tag) {
            // Main: Input
            (0, 0x8) => {
                layouts
                    .entry(global.report_id)
                    .or_insert_with(|| ReportLayout {
                        report_id: global.report_id,
                        fields: Vec::new(),
                    })
                    .fields
                    .push(InputField {
                        report_size: global.report_size,
                        report_count: global.report_count,
                        logical_min: global.logical_min,
                        logical_max: global.logical_max,
                        constant: unsigned(data) & 0x01 != 0,
                    });
            }
            // Main: Collection / End Collection
            (0, 0xA) => depth += 1,
            (0, 0xC) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(DescriptorError::UnbalancedCollection(pos))?;
            }
            // Global items
            (1, 0x1) => global.logical_min = signed(data),
            (1, 0x2) => global.logical_max = signed(data),
            (1, 0x7) => global.report_size = unsigned(data),
            (1, 0x8) => global.report_id = unsigned(data) as u8,
            (1, 0x9) => global.report_count = unsigned(data),
            (1, 0xA) => stack.push(global),
            (1, 0xB) => global = stack.pop().ok_or(DescriptorError::UnbalancedPop(pos))?,
            // Usage pages, usages and other local items do not affect layout
            _ => {}
        }

        pos += 1 + size;
    }

    if depth != 0 {
        return Err(DescriptorError::UnclosedCollection(depth));
    }
    Ok(layouts.into_values().collect())
}

fn unsigned(data: &[u8]) -> u32 {
    data.iter()
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn signed(data: &[u8]) -> i32 {
    match data.len() {
        0 => 0,
        1 => data[0] as i8 as i32,
        2 => i16::from_le_bytes([data[0], data[1]]) as i32,
        _ => i32::from_le_bytes([data[0], data[1], data[2], data[3]]),
    }
}
