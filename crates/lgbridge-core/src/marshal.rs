//! String marshaling across the native boundary.
//!
//! Bridge takes `wchar_t*` (UTF-16) string arguments on Windows and UTF-8
//! `char*` everywhere else. The encoding is picked from the runtime
//! [`Platform`] on every call. Output buffers are always `wchar_t`, which is
//! 16 bits wide on Windows and 32 bits wide elsewhere.

use std::ffi::CString;
use std::os::raw::{c_char, c_ulong};

use crate::error::{BridgeError, Result};
use crate::platform::{Platform, StringEncoding};

/// A NUL-terminated string in the encoding a native call expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeString {
    Utf16(Vec<u16>),
    Utf8(CString),
}

impl NativeString {
    /// Encode `value`. Interior NULs are rejected.
    pub fn new(value: &str, encoding: StringEncoding) -> Result<Self> {
        if value.contains('\0') {
            return Err(BridgeError::InvalidString(format!(
                "{:?} contains an interior NUL",
                value
            )));
        }

        Ok(match encoding {
            StringEncoding::Utf16 => NativeString::Utf16(
                value.encode_utf16().chain(std::iter::once(0)).collect(),
            ),
            StringEncoding::Utf8 => NativeString::Utf8(
                CString::new(value).map_err(|e| BridgeError::InvalidString(e.to_string()))?,
            ),
        })
    }

    /// Encode `value` the way `platform` expects.
    pub fn for_platform(value: &str, platform: Platform) -> Result<Self> {
        Self::new(value, platform.string_encoding())
    }

    pub fn encoding(&self) -> StringEncoding {
        match self {
            NativeString::Utf16(_) => StringEncoding::Utf16,
            NativeString::Utf8(_) => StringEncoding::Utf8,
        }
    }

    pub fn as_wide_ptr(&self) -> Option<*const u16> {
        match self {
            NativeString::Utf16(wide) => Some(wide.as_ptr()),
            NativeString::Utf8(_) => None,
        }
    }

    pub fn as_utf8_ptr(&self) -> Option<*const c_char> {
        match self {
            NativeString::Utf8(utf8) => Some(utf8.as_ptr()),
            NativeString::Utf16(_) => None,
        }
    }
}

/// Narrow `value` to a C `unsigned long`, which is 32 bits on Windows.
#[allow(clippy::useless_conversion, clippy::unnecessary_fallible_conversions)]
pub fn to_c_ulong(value: u64, name: &'static str) -> Result<c_ulong> {
    c_ulong::try_from(value).map_err(|_| BridgeError::ValueOutOfRange { name, value })
}

/// Decode a `wchar_t` buffer filled by Bridge, stopping at the first NUL.
pub fn from_wide(buffer: &[libc::wchar_t]) -> String {
    let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    decode_wide(&buffer[..end])
}

#[cfg(windows)]
fn decode_wide(units: &[libc::wchar_t]) -> String {
    String::from_utf16_lossy(units)
}

#[cfg(not(windows))]
fn decode_wide(units: &[libc::wchar_t]) -> String {
    units
        .iter()
        .map(|&c| char::from_u32(c as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_encoding() {
        let s = NativeString::new("Fluo", StringEncoding::Utf16).unwrap();
        assert_eq!(s, NativeString::Utf16(vec![0x46, 0x6c, 0x75, 0x6f, 0]));
        assert!(s.as_wide_ptr().is_some());
        assert!(s.as_utf8_ptr().is_none());
    }

    #[test]
    fn test_utf8_encoding() {
        let s = NativeString::new("Renderer é", StringEncoding::Utf8).unwrap();
        match &s {
            NativeString::Utf8(c) => assert_eq!(c.as_bytes(), "Renderer é".as_bytes()),
            other => panic!("Expected UTF-8, got {:?}", other),
        }
        assert!(s.as_utf8_ptr().is_some());
    }

    #[test]
    fn test_encoding_follows_platform() {
        let windows = NativeString::for_platform("app", Platform::Windows).unwrap();
        let mac = NativeString::for_platform("app", Platform::MacOs).unwrap();
        let posix = NativeString::for_platform("app", Platform::Posix).unwrap();

        assert_eq!(windows.encoding(), StringEncoding::Utf16);
        assert_eq!(mac.encoding(), StringEncoding::Utf8);
        assert_eq!(posix.encoding(), StringEncoding::Utf8);
    }

    #[test]
    fn test_interior_nul_rejected() {
        let err = NativeString::new("a\0b", StringEncoding::Utf16).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidString(_)));
    }

    #[test]
    fn test_to_c_ulong_in_range() {
        assert_eq!(to_c_ulong(7, "display index").unwrap(), 7);
        assert_eq!(
            to_c_ulong(c_ulong::MAX as u64, "display index").unwrap(),
            c_ulong::MAX
        );
    }

    #[cfg(windows)]
    #[test]
    fn test_to_c_ulong_rejects_wide_values() {
        let err = to_c_ulong(u64::from(u32::MAX) + 1, "display index").unwrap_err();
        assert!(matches!(
            err,
            BridgeError::ValueOutOfRange { name: "display index", .. }
        ));
    }

    #[test]
    fn test_from_wide_stops_at_nul() {
        let buffer: Vec<libc::wchar_t> = "LKG-4K\0garbage"
            .chars()
            .map(|c| c as libc::wchar_t)
            .collect();
        assert_eq!(from_wide(&buffer), "LKG-4K");
        assert_eq!(from_wide(&[]), "");
    }
}
