use crate::ok;
use std::fmt::{self, Display};

/// Displays byte buffers that are mostly ASCII text, like node tags.
///
/// Printable ASCII is written as is, `\` becomes `\\`, and everything else is shown as `\xNN`.
///
/// ## Example
/// ```
/// # use rafter_utils::AsciiDisplay;
/// assert_eq!(AsciiDisplay(b"TRFM").to_string(), "TRFM");
/// assert_eq!(AsciiDisplay(b"a\x00b\\").to_string(), "a\\x00b\\\\");
/// ```
pub struct AsciiDisplay<'a>(pub &'a [u8]);

impl<'a> From<&'a [u8]> for AsciiDisplay<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self(value)
    }
}

impl<'a> Display for AsciiDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.0 {
            match byte {
                b'\\' => f.write_str("\\\\")?,
                b if b.is_ascii_graphic() || b == b' ' => write!(f, "{}", b as char)?,
                b => write!(f, r"\x{b:02X}")?,
            }
        }
        ok()
    }
}
