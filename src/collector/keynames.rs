//! Platform key code to key name tables.
//!
//! Names follow the vocabulary used by the bundled layouts so that a key
//! reported by the hook resolves to the same identifier the layout grid uses.
//! Codes without an entry are reported as raw [`KeyId::Code`] values.

use crate::collector::types::KeyId;

/// Name for a macOS virtual key code (`kVK_*`).
#[cfg(any(target_os = "macos", test))]
pub fn macos_key_name(code: u16) -> Option<&'static str> {
    let name = match code {
        0 => "a",
        1 => "s",
        2 => "d",
        3 => "f",
        4 => "h",
        5 => "g",
        6 => "z",
        7 => "x",
        8 => "c",
        9 => "v",
        11 => "b",
        12 => "q",
        13 => "w",
        14 => "e",
        15 => "r",
        16 => "y",
        17 => "t",
        18 => "1",
        19 => "2",
        20 => "3",
        21 => "4",
        22 => "6",
        23 => "5",
        24 => "=",
        25 => "9",
        26 => "7",
        27 => "-",
        28 => "8",
        29 => "0",
        30 => "]",
        31 => "o",
        32 => "u",
        33 => "[",
        34 => "i",
        35 => "p",
        36 => "return",
        37 => "l",
        38 => "j",
        39 => "'",
        40 => "k",
        41 => ";",
        42 => "\\",
        43 => ",",
        44 => "/",
        45 => "n",
        46 => "m",
        47 => ".",
        48 => "tab",
        49 => "space",
        50 => "`",
        51 => "delete",
        53 => "esc",
        55 => "command",
        56 => "shift",
        57 => "caps lock",
        58 => "alt",
        59 => "ctrl",
        60 => "right shift",
        61 => "right option",
        62 => "right ctrl",
        // fn/globe: 63 from modifier changes, 179 from newer keyboards
        63 | 179 => "fn",
        123 => "left",
        124 => "right",
        125 => "down",
        126 => "up",
        _ => return None,
    };
    Some(name)
}

/// Name for a Windows virtual-key code (`VK_*`).
///
/// Keys are named after their physical position on the bundled layouts, so
/// backspace reports as `"delete"` and the Windows key as `"command"`.
#[cfg(any(target_os = "windows", test))]
pub fn windows_key_name(vk: u32) -> Option<&'static str> {
    const LETTERS: [&str; 26] = [
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r",
        "s", "t", "u", "v", "w", "x", "y", "z",
    ];
    const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

    let name = match vk {
        0x30..=0x39 => DIGITS[(vk - 0x30) as usize],
        0x41..=0x5A => LETTERS[(vk - 0x41) as usize],
        0x08 => "delete",
        0x09 => "tab",
        0x0D => "return",
        0x14 => "caps lock",
        0x1B => "esc",
        0x20 => "space",
        0x25 => "left",
        0x26 => "up",
        0x27 => "right",
        0x28 => "down",
        0x5B => "command",
        0xA0 => "shift",
        0xA1 => "right shift",
        0xA2 => "ctrl",
        0xA3 => "right ctrl",
        0xA4 => "alt",
        0xA5 => "right option",
        0xBA => ";",
        0xBB => "=",
        0xBC => ",",
        0xBD => "-",
        0xBE => ".",
        0xBF => "/",
        0xC0 => "`",
        0xDB => "[",
        0xDC => "\\",
        0xDD => "]",
        0xDE => "'",
        _ => return None,
    };
    Some(name)
}

/// Resolve a macOS key code to a key identity.
#[cfg(any(target_os = "macos", test))]
pub fn macos_key_id(code: u16) -> KeyId {
    KeyId::from_parts(macos_key_name(code), u32::from(code))
}

/// Resolve a Windows key to a key identity, falling back to its scan code.
#[cfg(any(target_os = "windows", test))]
pub fn windows_key_id(vk: u32, scan_code: u32) -> KeyId {
    KeyId::from_parts(windows_key_name(vk), scan_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macos_names() {
        assert_eq!(macos_key_name(12), Some("q"));
        assert_eq!(macos_key_name(57), Some("caps lock"));
        assert_eq!(macos_key_id(54), KeyId::Code(54));
        assert_eq!(macos_key_id(63), KeyId::name("fn"));
        assert_eq!(macos_key_id(179), KeyId::name("fn"));
    }

    #[test]
    fn test_windows_names() {
        assert_eq!(windows_key_name(0x41), Some("a"));
        assert_eq!(windows_key_name(0x5A), Some("z"));
        assert_eq!(windows_key_name(0x35), Some("5"));
        assert_eq!(windows_key_name(0x08), Some("delete"));
        assert_eq!(windows_key_id(0x7B, 88), KeyId::Code(88));
    }
}
