//! Report encoder
//!
//! Pure functions packing input intents into the fixed report layouts declared
//! by [`super::descriptor::HID_REPORT_DESCRIPTOR`]. None of them can fail:
//! absolute coordinates are saturated to the logical range, everything else
//! is already byte-sized.

use super::types::{KEYBOARD_REPORT_LEN, MOUSE_ABSOLUTE_REPORT_LEN, MOUSE_RELATIVE_REPORT_LEN};

/// Logical maximum of the absolute X/Y axes (15-bit range)
pub const ABS_AXIS_MAX: i32 = 0x7FFF;

/// Encode a keyboard report with a single key.
///
/// Layout: `[modifier, reserved, key, 0, 0, 0, 0, 0]`. Calling with
/// `(0, 0)` yields the all-zero key release report.
pub fn encode_keyboard(modifier: u8, key_code: u8) -> [u8; KEYBOARD_REPORT_LEN] {
    encode_keyboard_keys(modifier, &[key_code, 0, 0, 0, 0, 0])
}

/// Encode a keyboard report with up to 6 pressed keys
pub fn encode_keyboard_keys(modifier: u8, keys: &[u8; 6]) -> [u8; KEYBOARD_REPORT_LEN] {
    [
        modifier, 0x00, keys[0], keys[1], keys[2], keys[3], keys[4], keys[5],
    ]
}

/// Encode a relative mouse report: `[buttons, dx, dy, wheel]`
pub fn encode_mouse_relative(
    buttons: u8,
    dx: i8,
    dy: i8,
    wheel: i8,
) -> [u8; MOUSE_RELATIVE_REPORT_LEN] {
    [buttons, dx as u8, dy as u8, wheel as u8]
}

/// Encode an absolute mouse report: `[buttons, x_lo, x_hi, y_lo, y_hi, wheel]`
///
/// X and Y are clamped independently to `0..=ABS_AXIS_MAX`.
pub fn encode_mouse_absolute(
    buttons: u8,
    x: i32,
    y: i32,
    wheel: i8,
) -> [u8; MOUSE_ABSOLUTE_REPORT_LEN] {
    let [x_lo, x_hi] = clamp_abs_axis(x).to_le_bytes();
    let [y_lo, y_hi] = clamp_abs_axis(y).to_le_bytes();
    [buttons, x_lo, x_hi, y_lo, y_hi, wheel as u8]
}

/// Saturate an absolute coordinate into the descriptor's logical range
pub fn clamp_abs_axis(value: i32) -> u16 {
    value.clamp(0, ABS_AXIS_MAX) as u16
}

/// Saturate a wide integer into a signed 8-bit report field
pub fn saturate_i8(value: i32) -> i8 {
    value.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_release_is_all_zero() {
        assert_eq!(encode_keyboard(0, 0), [0u8; 8]);
    }

    #[test]
    fn test_keyboard_offsets() {
        for modifier in 0..=255u8 {
            for key_code in 0..=255u8 {
                let report = encode_keyboard(modifier, key_code);
                assert_eq!(report[0], modifier);
                assert_eq!(report[1], 0);
                assert_eq!(report[2], key_code);
                assert!(report[3..].iter().all(|&b| b == 0));
            }
        }
    }

    #[test]
    fn test_mouse_relative_packing() {
        assert_eq!(encode_mouse_relative(1, 10, -10, 0), [0x01, 0x0A, 0xF6, 0x00]);
        assert_eq!(
            encode_mouse_relative(0x07, i8::MIN, i8::MAX, -1),
            [0x07, 0x80, 0x7F, 0xFF]
        );
    }

    #[test]
    fn test_mouse_absolute_clamps() {
        let report = encode_mouse_absolute(0, -5, 40000, 0);
        assert_eq!(u16::from_le_bytes([report[1], report[2]]), 0);
        assert_eq!(u16::from_le_bytes([report[3], report[4]]), 32767);

        let report = encode_mouse_absolute(0, i32::MAX, i32::MIN, 0);
        assert_eq!(u16::from_le_bytes([report[1], report[2]]), 32767);
        assert_eq!(u16::from_le_bytes([report[3], report[4]]), 0);
    }

    #[test]
    fn test_mouse_absolute_little_endian() {
        assert_eq!(
            encode_mouse_absolute(0x01, 0x1234, 0x0456, -2),
            [0x01, 0x34, 0x12, 0x56, 0x04, 0xFE]
        );
        assert_eq!(
            encode_mouse_absolute(0, 32767, 32767, 0),
            [0x00, 0xFF, 0x7F, 0xFF, 0x7F, 0x00]
        );
    }

    #[test]
    fn test_saturate_i8() {
        assert_eq!(saturate_i8(300), 127);
        assert_eq!(saturate_i8(-300), -128);
        assert_eq!(saturate_i8(-10), -10);
    }
}
