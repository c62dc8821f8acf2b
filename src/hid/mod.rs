//! HID report model
//!
//! This module holds the static wire contract shared with the host:
//! - the combined report descriptor (keyboard, relative mouse, absolute mouse)
//! - typed reports for each collection
//! - the pure encoder producing the fixed-length payloads
//!
//! Architecture:
//! ```text
//! Caller --> HidReport --> encoder --> [report ID | payload] --> Bluetooth stack --> Host
//!                                          |
//!                          [1 keyboard | 2 rel mouse | 3 abs mouse]
//! ```

pub mod descriptor;
pub mod encoder;
pub mod types;

pub use descriptor::{
    report_layouts, DescriptorError, ReportLayout, HID_REPORT_DESCRIPTOR, REPORT_ID_KEYBOARD,
    REPORT_ID_MOUSE_ABSOLUTE, REPORT_ID_MOUSE_RELATIVE,
};
pub use encoder::{
    clamp_abs_axis, encode_keyboard, encode_mouse_absolute, encode_mouse_relative, saturate_i8,
    ABS_AXIS_MAX,
};
pub use types::{
    HidReport, KeyboardModifiers, KeyboardReport, MouseAbsoluteReport, MouseButtons,
    MouseRelativeReport, ReportKind,
};
