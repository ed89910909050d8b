//! Text decoding with an ordered list of fallback encodings.

use crate::error::{ForecastError, Result};
use std::fmt;

/// Encodings the loader knows how to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8; a leading byte order mark is stripped
    Utf8,
    /// Cyrillic single-byte code page
    Windows1251,
    /// ISO-8859-1; maps every byte and never fails
    Latin1,
}

/// Order in which input bytes are decoded.
pub const DEFAULT_ENCODINGS: [TextEncoding; 3] = [
    TextEncoding::Utf8,
    TextEncoding::Windows1251,
    TextEncoding::Latin1,
];

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Windows1251 => "windows-1251",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// Strict decode; `None` when the bytes are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
                (!had_errors).then(|| text.into_owned())
            }
            TextEncoding::Windows1251 => encoding_rs::WINDOWS_1251
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
            // code points U+0000..=U+00FF coincide with the byte values
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode `bytes` with the first encoding in `encodings` that accepts them.
pub fn decode_with(bytes: &[u8], encodings: &[TextEncoding]) -> Result<(String, TextEncoding)> {
    for &encoding in encodings {
        if let Some(text) = encoding.decode(bytes) {
            log::debug!("decoded {} bytes as {encoding}", bytes.len());
            return Ok((text, encoding));
        }
        log::debug!("input is not valid {encoding}");
    }
    Err(ForecastError::Encoding {
        tried: encodings
            .iter()
            .map(|e| e.name())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Decode `bytes` with [`DEFAULT_ENCODINGS`].
pub fn decode(bytes: &[u8]) -> Result<(String, TextEncoding)> {
    decode_with(bytes, &DEFAULT_ENCODINGS)
}
