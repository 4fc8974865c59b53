//! Symbolic names for Linux input event codes
//!
//! Config files refer to keys, buttons and axes by the names used in
//! `linux/input-event-codes.h` (`KEY_A`, `BTN_SOUTH`, `ABS_X`, ...).
//! Only the codes that make sense for a keyboard-to-gamepad mapping are
//! listed; anything else can still be given as a decimal code.

/// Event type for keys and buttons (`EV_KEY`)
pub const EV_KEY: u16 = 0x01;
/// Event type for absolute axes (`EV_ABS`)
pub const EV_ABS: u16 = 0x03;

/// Number of key/button codes (`KEY_CNT`)
pub const KEY_COUNT: usize = 0x300;
/// Number of absolute axis codes (`ABS_CNT`)
pub const ABS_COUNT: usize = 0x40;

const EVENT_TYPES: &[(&str, u16)] = &[("EV_KEY", EV_KEY), ("EV_ABS", EV_ABS)];

/// Keyboard keys, in code order.
const KEYS: &[(&str, u16)] = &[
    ("KEY_ESC", 1),
    ("KEY_1", 2),
    ("KEY_2", 3),
    ("KEY_3", 4),
    ("KEY_4", 5),
    ("KEY_5", 6),
    ("KEY_6", 7),
    ("KEY_7", 8),
    ("KEY_8", 9),
    ("KEY_9", 10),
    ("KEY_0", 11),
    ("KEY_MINUS", 12),
    ("KEY_EQUAL", 13),
    ("KEY_BACKSPACE", 14),
    ("KEY_TAB", 15),
    ("KEY_Q", 16),
    ("KEY_W", 17),
    ("KEY_E", 18),
    ("KEY_R", 19),
    ("KEY_T", 20),
    ("KEY_Y", 21),
    ("KEY_U", 22),
    ("KEY_I", 23),
    ("KEY_O", 24),
    ("KEY_P", 25),
    ("KEY_LEFTBRACE", 26),
    ("KEY_RIGHTBRACE", 27),
    ("KEY_ENTER", 28),
    ("KEY_LEFTCTRL", 29),
    ("KEY_A", 30),
    ("KEY_S", 31),
    ("KEY_D", 32),
    ("KEY_F", 33),
    ("KEY_G", 34),
    ("KEY_H", 35),
    ("KEY_J", 36),
    ("KEY_K", 37),
    ("KEY_L", 38),
    ("KEY_SEMICOLON", 39),
    ("KEY_APOSTROPHE", 40),
    ("KEY_GRAVE", 41),
    ("KEY_LEFTSHIFT", 42),
    ("KEY_BACKSLASH", 43),
    ("KEY_Z", 44),
    ("KEY_X", 45),
    ("KEY_C", 46),
    ("KEY_V", 47),
    ("KEY_B", 48),
    ("KEY_N", 49),
    ("KEY_M", 50),
    ("KEY_COMMA", 51),
    ("KEY_DOT", 52),
    ("KEY_SLASH", 53),
    ("KEY_RIGHTSHIFT", 54),
    ("KEY_KPASTERISK", 55),
    ("KEY_LEFTALT", 56),
    ("KEY_SPACE", 57),
    ("KEY_CAPSLOCK", 58),
    ("KEY_F1", 59),
    ("KEY_F2", 60),
    ("KEY_F3", 61),
    ("KEY_F4", 62),
    ("KEY_F5", 63),
    ("KEY_F6", 64),
    ("KEY_F7", 65),
    ("KEY_F8", 66),
    ("KEY_F9", 67),
    ("KEY_F10", 68),
    ("KEY_NUMLOCK", 69),
    ("KEY_SCROLLLOCK", 70),
    ("KEY_KP7", 71),
    ("KEY_KP8", 72),
    ("KEY_KP9", 73),
    ("KEY_KPMINUS", 74),
    ("KEY_KP4", 75),
    ("KEY_KP5", 76),
    ("KEY_KP6", 77),
    ("KEY_KPPLUS", 78),
    ("KEY_KP1", 79),
    ("KEY_KP2", 80),
    ("KEY_KP3", 81),
    ("KEY_KP0", 82),
    ("KEY_KPDOT", 83),
    ("KEY_102ND", 86),
    ("KEY_F11", 87),
    ("KEY_F12", 88),
    ("KEY_KPENTER", 96),
    ("KEY_RIGHTCTRL", 97),
    ("KEY_KPSLASH", 98),
    ("KEY_SYSRQ", 99),
    ("KEY_RIGHTALT", 100),
    ("KEY_HOME", 102),
    ("KEY_UP", 103),
    ("KEY_PAGEUP", 104),
    ("KEY_LEFT", 105),
    ("KEY_RIGHT", 106),
    ("KEY_END", 107),
    ("KEY_DOWN", 108),
    ("KEY_PAGEDOWN", 109),
    ("KEY_INSERT", 110),
    ("KEY_DELETE", 111),
    ("KEY_MUTE", 113),
    ("KEY_VOLUMEDOWN", 114),
    ("KEY_VOLUMEUP", 115),
    ("KEY_KPEQUAL", 117),
    ("KEY_PAUSE", 119),
    ("KEY_KPCOMMA", 121),
    ("KEY_LEFTMETA", 125),
    ("KEY_RIGHTMETA", 126),
    ("KEY_COMPOSE", 127),
    ("KEY_F13", 183),
    ("KEY_F14", 184),
    ("KEY_F15", 185),
    ("KEY_F16", 186),
    ("KEY_F17", 187),
    ("KEY_F18", 188),
    ("KEY_F19", 189),
    ("KEY_F20", 190),
    ("KEY_F21", 191),
    ("KEY_F22", 192),
    ("KEY_F23", 193),
    ("KEY_F24", 194),
];

/// Joystick and gamepad buttons. Aliases (`BTN_A` for `BTN_SOUTH`, ...) come
/// after the canonical name so reverse lookup prefers the canonical one.
const BUTTONS: &[(&str, u16)] = &[
    ("BTN_0", 0x100),
    ("BTN_1", 0x101),
    ("BTN_2", 0x102),
    ("BTN_3", 0x103),
    ("BTN_4", 0x104),
    ("BTN_5", 0x105),
    ("BTN_6", 0x106),
    ("BTN_7", 0x107),
    ("BTN_8", 0x108),
    ("BTN_9", 0x109),
    ("BTN_LEFT", 0x110),
    ("BTN_RIGHT", 0x111),
    ("BTN_MIDDLE", 0x112),
    ("BTN_SIDE", 0x113),
    ("BTN_EXTRA", 0x114),
    ("BTN_TRIGGER", 0x120),
    ("BTN_THUMB", 0x121),
    ("BTN_THUMB2", 0x122),
    ("BTN_TOP", 0x123),
    ("BTN_TOP2", 0x124),
    ("BTN_PINKIE", 0x125),
    ("BTN_BASE", 0x126),
    ("BTN_BASE2", 0x127),
    ("BTN_BASE3", 0x128),
    ("BTN_BASE4", 0x129),
    ("BTN_BASE5", 0x12a),
    ("BTN_BASE6", 0x12b),
    ("BTN_DEAD", 0x12f),
    ("BTN_SOUTH", 0x130),
    ("BTN_EAST", 0x131),
    ("BTN_C", 0x132),
    ("BTN_NORTH", 0x133),
    ("BTN_WEST", 0x134),
    ("BTN_Z", 0x135),
    ("BTN_TL", 0x136),
    ("BTN_TR", 0x137),
    ("BTN_TL2", 0x138),
    ("BTN_TR2", 0x139),
    ("BTN_SELECT", 0x13a),
    ("BTN_START", 0x13b),
    ("BTN_MODE", 0x13c),
    ("BTN_THUMBL", 0x13d),
    ("BTN_THUMBR", 0x13e),
    ("BTN_DPAD_UP", 0x220),
    ("BTN_DPAD_DOWN", 0x221),
    ("BTN_DPAD_LEFT", 0x222),
    ("BTN_DPAD_RIGHT", 0x223),
    ("BTN_A", 0x130),
    ("BTN_B", 0x131),
    ("BTN_X", 0x133),
    ("BTN_Y", 0x134),
    ("BTN_GAMEPAD", 0x130),
    ("BTN_JOYSTICK", 0x120),
];

/// Absolute axes.
const AXES: &[(&str, u16)] = &[
    ("ABS_X", 0x00),
    ("ABS_Y", 0x01),
    ("ABS_Z", 0x02),
    ("ABS_RX", 0x03),
    ("ABS_RY", 0x04),
    ("ABS_RZ", 0x05),
    ("ABS_THROTTLE", 0x06),
    ("ABS_RUDDER", 0x07),
    ("ABS_WHEEL", 0x08),
    ("ABS_GAS", 0x09),
    ("ABS_BRAKE", 0x0a),
    ("ABS_HAT0X", 0x10),
    ("ABS_HAT0Y", 0x11),
    ("ABS_HAT1X", 0x12),
    ("ABS_HAT1Y", 0x13),
    ("ABS_HAT2X", 0x14),
    ("ABS_HAT2Y", 0x15),
    ("ABS_HAT3X", 0x16),
    ("ABS_HAT3Y", 0x17),
];

fn find_code(table: &[(&str, u16)], name: &str) -> Option<u16> {
    table
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, code)| code)
}

fn find_name(table: &'static [(&'static str, u16)], code: u16) -> Option<&'static str> {
    table.iter().find(|&&(_, c)| c == code).map(|&(n, _)| n)
}

/// Look up a key or button code from its name (case-insensitive).
///
/// Buttons are included because any `EV_KEY` code can be an input key.
pub fn key_code_from_name(name: &str) -> Option<u16> {
    find_code(KEYS, name).or_else(|| find_code(BUTTONS, name))
}

/// Look up a button code from its name (case-insensitive).
///
/// Keyboard key names are accepted too: a virtual device may expose any
/// `EV_KEY` code.
pub fn button_code_from_name(name: &str) -> Option<u16> {
    find_code(BUTTONS, name).or_else(|| find_code(KEYS, name))
}

/// Look up an axis code from its name (case-insensitive)
pub fn axis_code_from_name(name: &str) -> Option<u16> {
    find_code(AXES, name)
}

/// Look up an event type from its name (`EV_KEY`, `EV_ABS`)
pub fn event_type_from_name(name: &str) -> Option<u16> {
    find_code(EVENT_TYPES, name)
}

/// Name of a key or button code, if it has one
pub fn key_name(code: u16) -> Option<&'static str> {
    find_name(KEYS, code).or_else(|| find_name(BUTTONS, code))
}

/// Name of an axis code, if it has one
pub fn axis_name(code: u16) -> Option<&'static str> {
    find_name(AXES, code)
}

/// Key name for display, falling back to the numeric code
pub fn key_label(code: u16) -> String {
    key_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_lookup() {
        assert_eq!(key_code_from_name("KEY_A"), Some(30));
        assert_eq!(key_code_from_name("key_space"), Some(57));
        assert_eq!(key_code_from_name("KEY_F24"), Some(194));
        assert_eq!(key_code_from_name("BTN_SOUTH"), Some(0x130));
        assert_eq!(key_code_from_name("KEY_NOPE"), None);
    }

    #[test]
    fn test_button_aliases() {
        assert_eq!(button_code_from_name("BTN_A"), Some(0x130));
        assert_eq!(button_code_from_name("BTN_SOUTH"), Some(0x130));
        assert_eq!(key_name(0x130), Some("BTN_SOUTH"));
    }

    #[test]
    fn test_axis_lookup() {
        assert_eq!(axis_code_from_name("ABS_X"), Some(0));
        assert_eq!(axis_code_from_name("ABS_HAT0Y"), Some(0x11));
        assert_eq!(axis_code_from_name("KEY_A"), None);
        assert_eq!(axis_name(3), Some("ABS_RX"));
    }

    #[test]
    fn test_event_types() {
        assert_eq!(event_type_from_name("EV_KEY"), Some(EV_KEY));
        assert_eq!(event_type_from_name("EV_ABS"), Some(EV_ABS));
        assert_eq!(event_type_from_name("EV_REL"), None);
    }

    #[test]
    fn test_all_codes_in_range() {
        for &(name, code) in KEYS.iter().chain(BUTTONS) {
            assert!((code as usize) < KEY_COUNT, "{name} out of range");
        }
        for &(name, code) in AXES {
            assert!((code as usize) < ABS_COUNT, "{name} out of range");
        }
    }
}
