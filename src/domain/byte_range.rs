//! Byte range describing which document bytes a MAC container protects.

use std::fmt;

use crate::infra::error::{MacError, MacResult};

/// `[start1 length1 start2 length2]`, the PDF `/ByteRange` quadruple.
///
/// For a MAC placeholder this is `[0, mac_start, mac_end, total - mac_end]`:
/// everything except the placeholder itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    values: [u64; 4],
}

impl ByteRange {
    /// Byte range covering a document of `total_len` bytes minus `[mac_start, mac_end)`.
    pub fn around_placeholder(mac_start: u64, mac_end: u64, total_len: u64) -> MacResult<Self> {
        if mac_start > mac_end || mac_end > total_len {
            return Err(MacError::PlaceholderState(format!(
                "invalid placeholder bounds: start={mac_start} end={mac_end} total={total_len}"
            )));
        }
        Ok(Self {
            values: [0, mac_start, mac_end, total_len - mac_end],
        })
    }

    /// Byte range as stored in a dictionary; checked only for arithmetic sanity.
    pub fn from_values(values: [u64; 4]) -> MacResult<Self> {
        let [start1, len1, start2, len2] = values;
        let first_end = start1
            .checked_add(len1)
            .ok_or_else(|| MacError::parsing("ByteRange", "first segment overflows"))?;
        start2
            .checked_add(len2)
            .ok_or_else(|| MacError::parsing("ByteRange", "second segment overflows"))?;
        if first_end > start2 {
            return Err(MacError::parsing(
                "ByteRange",
                format!("segments overlap ({first_end} > {start2})"),
            ));
        }
        Ok(Self { values })
    }

    #[must_use]
    pub fn values(&self) -> [u64; 4] {
        self.values
    }

    /// Start of the excluded gap (the placeholder).
    #[must_use]
    pub fn gap_start(&self) -> u64 {
        self.values[0] + self.values[1]
    }

    /// End of the excluded gap.
    #[must_use]
    pub fn gap_end(&self) -> u64 {
        self.values[2]
    }

    /// Total document length the range describes.
    #[must_use]
    pub fn total_len(&self) -> u64 {
        self.values[2] + self.values[3]
    }

    /// True when `offset` falls inside one of the two digested segments.
    #[must_use]
    pub fn covers(&self, offset: u64) -> bool {
        let [start1, len1, start2, len2] = self.values;
        (offset >= start1 && offset < start1 + len1) || (offset >= start2 && offset < start2 + len2)
    }

    /// Borrow the two digested segments from `document`.
    pub fn segments<'a>(&self, document: &'a [u8]) -> MacResult<[&'a [u8]; 2]> {
        let [start1, len1, start2, len2] = self.values;
        let slice = |start: u64, len: u64| -> MacResult<&'a [u8]> {
            let start = usize::try_from(start)
                .map_err(|_| MacError::parsing("ByteRange", "offset exceeds address space"))?;
            let len = usize::try_from(len)
                .map_err(|_| MacError::parsing("ByteRange", "length exceeds address space"))?;
            document.get(start..start + len).ok_or_else(|| {
                MacError::parsing(
                    "ByteRange",
                    format!(
                        "segment {start}+{len} outside document of {} bytes",
                        document.len()
                    ),
                )
            })
        };
        Ok([slice(start1, len1)?, slice(start2, len2)?])
    }

    /// PDF array text, e.g. `[0 120 4242 310]`.
    #[must_use]
    pub fn to_pdf_array(&self) -> String {
        let [a, b, c, d] = self.values;
        format!("[{a} {b} {c} {d}]")
    }

    /// Array text right-padded with spaces to exactly `width` bytes.
    pub fn to_padded_pdf_array(&self, width: usize) -> MacResult<Vec<u8>> {
        let text = self.to_pdf_array();
        if text.len() > width {
            return Err(MacError::PlaceholderOverflow {
                what: "ByteRange",
                needed: text.len(),
                reserved: width,
            });
        }
        let mut out = text.into_bytes();
        out.resize(width, b' ');
        Ok(out)
    }

    /// Parse `[a b c d]` (surrounding whitespace tolerated).
    pub fn parse_pdf_array(text: &str) -> MacResult<Self> {
        let inner = text
            .trim()
            .strip_prefix('[')
            .and_then(|t| t.strip_suffix(']'))
            .ok_or_else(|| MacError::parsing("ByteRange", format!("not an array: {text:?}")))?;
        let numbers = inner
            .split_ascii_whitespace()
            .map(|n| {
                n.parse::<u64>()
                    .map_err(|e| MacError::parsing("ByteRange", format!("{n:?}: {e}")))
            })
            .collect::<MacResult<Vec<u64>>>()?;
        let values: [u64; 4] = numbers.try_into().map_err(|v: Vec<u64>| {
            MacError::parsing("ByteRange", format!("expected 4 numbers, found {}", v.len()))
        })?;
        Self::from_values(values)
    }
}

impl fmt::Debug for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteRange{}", self.to_pdf_array())
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pdf_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_range_excludes_gap() {
        let range = ByteRange::around_placeholder(10, 20, 50).unwrap();
        assert_eq!(range.values(), [0, 10, 20, 30]);
        assert_eq!(range.gap_start(), 10);
        assert_eq!(range.gap_end(), 20);
        assert_eq!(range.total_len(), 50);
        assert!(range.covers(9));
        assert!(!range.covers(10));
        assert!(!range.covers(19));
        assert!(range.covers(20));
        assert!(!range.covers(50));
    }

    #[test]
    fn invalid_bounds_rejected() {
        assert!(ByteRange::around_placeholder(20, 10, 50).is_err());
        assert!(ByteRange::around_placeholder(10, 60, 50).is_err());
    }

    #[test]
    fn array_text_round_trip() {
        let range = ByteRange::around_placeholder(123, 4567, 9000).unwrap();
        let padded = range.to_padded_pdf_array(80).unwrap();
        assert_eq!(padded.len(), 80);
        let text = std::str::from_utf8(&padded).unwrap();
        assert_eq!(ByteRange::parse_pdf_array(text).unwrap(), range);
    }

    #[test]
    fn padded_text_overflow() {
        let range = ByteRange::around_placeholder(1, 2, 3).unwrap();
        assert!(matches!(
            range.to_padded_pdf_array(4),
            Err(MacError::PlaceholderOverflow { .. })
        ));
    }

    #[test]
    fn segments_bounds_checked() {
        let doc = b"0123456789";
        let range = ByteRange::around_placeholder(3, 5, 10).unwrap();
        let [a, b] = range.segments(doc).unwrap();
        assert_eq!(a, b"012");
        assert_eq!(b, b"56789");
        let too_long = ByteRange::around_placeholder(3, 5, 11).unwrap();
        assert!(too_long.segments(doc).is_err());
    }

    #[test]
    fn malformed_arrays() {
        assert!(ByteRange::parse_pdf_array("0 1 2 3").is_err());
        assert!(ByteRange::parse_pdf_array("[0 1 2]").is_err());
        assert!(ByteRange::parse_pdf_array("[0 x 2 3]").is_err());
        assert!(ByteRange::parse_pdf_array("[0 10 5 3]").is_err());
    }
}
