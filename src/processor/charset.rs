// src/processor/charset.rs
//! Charset resolution and text decoding
//!
//! Supports the charsets every log producer we bridge can emit: UTF-8,
//! US-ASCII, ISO-8859-1 and the UTF-16 family.

use crate::utils::errors::{LoggerError, Result};

pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Extract the `charset` parameter of a content type, defaulting to UTF-8
///
/// Whitespace is ignored, the first `charset=` parameter wins and surrounding
/// quotes are dropped.
pub fn charset_of(content_type: Option<&str>) -> String {
    let Some(content_type) = content_type else {
        return DEFAULT_CHARSET.to_string();
    };

    let compact: String = content_type.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .split(';')
        .find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.eq_ignore_ascii_case("charset")
                .then(|| value.trim_matches('"').to_string())
        })
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string())
}

/// A charset we know how to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    UsAscii,
    Iso8859_1,
    Utf16Be,
    Utf16Le,
    /// UTF-16 with optional byte order mark, big-endian without one
    Utf16,
}

impl Charset {
    /// Resolve a charset name or common alias, case-insensitively
    pub fn for_name(name: &str) -> Option<Charset> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        let charset = match normalized.as_str() {
            "utf-8" | "utf8" => Charset::Utf8,
            "us-ascii" | "ascii" | "iso646-us" => Charset::UsAscii,
            "iso-8859-1" | "iso8859-1" | "latin1" | "l1" | "cp819" => Charset::Iso8859_1,
            "utf-16be" | "utf16be" => Charset::Utf16Be,
            "utf-16le" | "utf16le" => Charset::Utf16Le,
            "utf-16" | "utf16" => Charset::Utf16,
            _ => return None,
        };
        Some(charset)
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
            Charset::Iso8859_1 => "ISO-8859-1",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Utf16 => "UTF-16",
        }
    }

    /// Decode `bytes`; malformed input is a `Charset` error
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| self.malformed(format!("{}", e.utf8_error()))),
            Charset::UsAscii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(self.malformed(format!("non-ASCII byte at offset {}", offset))),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            Charset::Iso8859_1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Charset::Utf16Be => self.decode_utf16(bytes, u16::from_be_bytes),
            Charset::Utf16Le => self.decode_utf16(bytes, u16::from_le_bytes),
            Charset::Utf16 => match bytes {
                [0xFE, 0xFF, rest @ ..] => self.decode_utf16(rest, u16::from_be_bytes),
                [0xFF, 0xFE, rest @ ..] => self.decode_utf16(rest, u16::from_le_bytes),
                _ => self.decode_utf16(bytes, u16::from_be_bytes),
            },
        }
    }

    fn decode_utf16(&self, bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
        if bytes.len() % 2 != 0 {
            return Err(self.malformed(format!("odd length {}", bytes.len())));
        }
        let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
        char::decode_utf16(units)
            .collect::<std::result::Result<String, _>>()
            .map_err(|e| self.malformed(format!("unpaired surrogate {:#06x}", e.unpaired_surrogate())))
    }

    fn malformed(&self, reason: String) -> LoggerError {
        LoggerError::Charset(format!("malformed {} input: {}", self.name(), reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_defaults() {
        assert_eq!(charset_of(None), "UTF-8");
        assert_eq!(charset_of(Some("text/plain")), "UTF-8");
        assert_eq!(charset_of(Some("")), "UTF-8");
        assert_eq!(charset_of(Some("text/plain; charset=")), "UTF-8");
    }

    #[test]
    fn test_charset_parameter() {
        assert_eq!(charset_of(Some("text/plain; charset=ISO-8859-1")), "ISO-8859-1");
        assert_eq!(charset_of(Some("text/plain;charset=UTF-16LE")), "UTF-16LE");
        assert_eq!(charset_of(Some("text/plain; format=flowed; charset = \"latin1\"")), "latin1");
        assert_eq!(
            charset_of(Some("text/plain; charset=US-ASCII; charset=UTF-8")),
            "US-ASCII"
        );
    }

    #[test]
    fn test_aliases() {
        assert_eq!(Charset::for_name("utf8"), Some(Charset::Utf8));
        assert_eq!(Charset::for_name("ISO_8859_1"), Some(Charset::Iso8859_1));
        assert_eq!(Charset::for_name("Latin1"), Some(Charset::Iso8859_1));
        assert_eq!(Charset::for_name("KOI8-R"), None);
    }

    #[test]
    fn test_latin1() {
        let text = Charset::Iso8859_1.decode(&[0x63, 0x61, 0x66, 0xE9]).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert!(matches!(
            Charset::UsAscii.decode(&[0x41, 0xE9]),
            Err(LoggerError::Charset(_))
        ));
    }

    #[test]
    fn test_utf16_variants() {
        let be: Vec<u8> = "hé".encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        let le: Vec<u8> = "hé".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();

        assert_eq!(Charset::Utf16Be.decode(&be).unwrap(), "hé");
        assert_eq!(Charset::Utf16Le.decode(&le).unwrap(), "hé");
        assert_eq!(Charset::Utf16.decode(&be).unwrap(), "hé");

        let mut with_bom = vec![0xFF, 0xFE];
        with_bom.extend_from_slice(&le);
        assert_eq!(Charset::Utf16.decode(&with_bom).unwrap(), "hé");
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            Charset::Utf8.decode(&[0xC3, 0x28]),
            Err(LoggerError::Charset(_))
        ));
    }
}
