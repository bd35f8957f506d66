//! `Content-Disposition` values that survive ASCII-only header transports
//!
//! A named disposition carries two filenames: an ASCII fallback in
//! `filename="..."` for legacy clients and the exact UTF-8 name in
//! `filename*=UTF-8''...` (RFC 5987 / RFC 6266) for everyone else.

use std::fmt;

use http::header::{HeaderValue, InvalidHeaderValue};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use unicode_normalization::UnicodeNormalization;

/// RFC 5987 `attr-char`: everything else is percent-encoded
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

const FALLBACK_BASENAME: &str = "download";

/// How the browser should treat the response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionKind {
    /// Render in the browser
    Inline,
    /// Offer as a download
    Attachment,
}

impl DispositionKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }
}

/// A `Content-Disposition` value with an optional filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    kind: DispositionKind,
    filename: Option<String>,
}

impl ContentDisposition {
    /// `inline` without a filename
    #[must_use]
    pub const fn inline() -> Self {
        Self {
            kind: DispositionKind::Inline,
            filename: None,
        }
    }

    /// `attachment` without a filename
    #[must_use]
    pub const fn attachment() -> Self {
        Self {
            kind: DispositionKind::Attachment,
            filename: None,
        }
    }

    /// Attaches the user-facing filename
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Disposition kind
    #[must_use]
    pub const fn kind(&self) -> DispositionKind {
        self.kind
    }

    /// Header value; always printable ASCII
    #[must_use]
    pub fn header_value(&self) -> String {
        self.to_string()
    }

    /// Header value for responses streamed by the application itself
    ///
    /// # Errors
    ///
    /// Returns `InvalidHeaderValue` if the rendered value is not a valid header
    pub fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.header_value())
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        if let Some(filename) = &self.filename {
            write!(
                f,
                "; filename=\"{}\"; filename*=UTF-8''{}",
                ascii_filename_fallback(filename),
                utf8_percent_encode(filename, ATTR_CHAR)
            )?;
        }
        Ok(())
    }
}

/// ASCII stand-in for `filename`, keeping the lowercased extension
///
/// The basename is NFKD-normalized, then anything outside printable ASCII
/// and the quoting characters `"` `\` `;` become `_`. An empty result is
/// replaced by `download`.
#[must_use]
pub fn ascii_filename_fallback(filename: &str) -> String {
    let (basename, extension) = match filename.rsplit_once('.') {
        Some((basename, extension)) if !extension.is_empty() => {
            (basename, Some(extension.to_lowercase()))
        }
        _ => (filename, None),
    };

    let ascii = sanitize_ascii(basename);
    let ascii = if ascii.is_empty() {
        FALLBACK_BASENAME.to_string()
    } else {
        ascii
    };

    match extension {
        Some(extension) => format!("{ascii}.{}", sanitize_ascii(&extension)),
        None => ascii,
    }
}

fn sanitize_ascii(input: &str) -> String {
    input
        .nfkd()
        .map(|c| match c {
            '"' | '\\' | ';' => '_',
            ' '..='~' => c,
            _ => '_',
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use percent_encoding::percent_decode_str;

    use super::*;

    #[test]
    fn test_without_filename() {
        assert_eq!(ContentDisposition::inline().header_value(), "inline");
        assert_eq!(ContentDisposition::attachment().header_value(), "attachment");
    }

    #[test]
    fn test_ascii_filename() {
        let value = ContentDisposition::attachment()
            .with_filename("holiday.JPG")
            .header_value();

        assert_eq!(
            value,
            "attachment; filename=\"holiday.jpg\"; filename*=UTF-8''holiday.JPG"
        );
    }

    #[test]
    fn test_non_ascii_filename() {
        let value = ContentDisposition::inline()
            .with_filename("报告.pdf")
            .header_value();

        assert_eq!(
            value,
            "inline; filename=\"__.pdf\"; filename*=UTF-8''%E6%8A%A5%E5%91%8A.pdf"
        );
        assert!(value.is_ascii());

        let encoded = value.split("UTF-8''").nth(1).unwrap();
        assert_eq!(percent_decode_str(encoded).decode_utf8().unwrap(), "报告.pdf");
    }

    #[test]
    fn test_ascii_fallback() {
        assert_eq!(ascii_filename_fallback("résumé.PDF"), "re_sume_.pdf");
        assert_eq!(ascii_filename_fallback("a\"b;c\\d.txt"), "a_b_c_d.txt");
        assert_eq!(ascii_filename_fallback(".pdf"), "download.pdf");
        assert_eq!(ascii_filename_fallback("   .pdf"), "download.pdf");
        assert_eq!(ascii_filename_fallback("报告"), "__");
        assert_eq!(ascii_filename_fallback(""), "download");
        assert_eq!(ascii_filename_fallback("notes.文档"), "notes.__");
    }

    #[test]
    fn test_quoting_characters_are_encoded() {
        let value = ContentDisposition::inline()
            .with_filename("q1 (final); \"v2\".txt")
            .header_value();

        assert_eq!(
            value,
            "inline; filename=\"q1 (final)_ _v2_.txt\"; filename*=UTF-8''q1%20%28final%29%3B%20%22v2%22.txt"
        );
    }

    #[test]
    fn test_header_value() {
        let header = ContentDisposition::inline()
            .with_filename("季度报告.pdf")
            .to_header_value()
            .unwrap();

        assert!(header.to_str().is_ok());
    }
}
