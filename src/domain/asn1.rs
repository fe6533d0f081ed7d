//! Minimal DER writer helpers and a positional navigator over decoded structures.
//!
//! Construction concatenates pre-encoded components (the container schema is
//! fixed), while parsing walks `der::asn1::AnyRef` elements by index. Both
//! sides share the tag constants in `domain::constants`.

use der::asn1::{AnyRef, ObjectIdentifier};
use der::{Reader, SliceReader, Tagged};

use crate::domain::constants;
use crate::infra::error::{MacError, MacResult};

/// Encode ASN.1 length field (short form vs long form)
#[must_use]
pub fn encode_len(length: usize) -> Vec<u8> {
    if length < 128 {
        vec![length as u8]
    } else if length < 256 {
        vec![constants::DER_LONG_FORM_1_BYTE, length as u8]
    } else if length < 65536 {
        vec![
            constants::DER_LONG_FORM_2_BYTE,
            (length >> 8) as u8,
            (length & 0xFF) as u8,
        ]
    } else if length < (1 << 24) {
        vec![
            constants::DER_LONG_FORM_3_BYTE,
            ((length >> 16) & 0xFF) as u8,
            ((length >> 8) & 0xFF) as u8,
            (length & 0xFF) as u8,
        ]
    } else {
        vec![
            constants::DER_LONG_FORM_4_BYTE,
            ((length >> 24) & 0xFF) as u8,
            ((length >> 16) & 0xFF) as u8,
            ((length >> 8) & 0xFF) as u8,
            (length & 0xFF) as u8,
        ]
    }
}

/// Tag + length + content.
#[must_use]
pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let len = encode_len(content.len());
    let mut out = Vec::with_capacity(1 + len.len() + content.len());
    out.push(tag);
    out.extend_from_slice(&len);
    out.extend_from_slice(content);
    out
}

/// SEQUENCE over already-encoded components, in order.
#[must_use]
pub fn sequence(components: &[&[u8]]) -> Vec<u8> {
    tlv(constants::ASN1_SEQUENCE_TAG, &components.concat())
}

/// Contents of a SET OF in DER canonical order (sorted by encoding).
#[must_use]
pub fn set_of_contents(mut elements: Vec<Vec<u8>>) -> Vec<u8> {
    elements.sort();
    elements.concat()
}

#[must_use]
pub fn set_of(elements: Vec<Vec<u8>>) -> Vec<u8> {
    tlv(constants::ASN1_SET_TAG, &set_of_contents(elements))
}

#[must_use]
pub fn oid(oid: &ObjectIdentifier) -> Vec<u8> {
    tlv(constants::ASN1_OID_TAG, oid.as_bytes())
}

#[must_use]
pub fn octet_string(bytes: &[u8]) -> Vec<u8> {
    tlv(constants::ASN1_OCTET_STRING_TAG, bytes)
}

/// `AlgorithmIdentifier` with absent parameters.
#[must_use]
pub fn algorithm_identifier(algorithm: &ObjectIdentifier) -> Vec<u8> {
    sequence(&[&oid(algorithm)])
}

/// `AlgorithmIdentifier` with explicit NULL parameters.
#[must_use]
pub fn algorithm_identifier_with_null(algorithm: &ObjectIdentifier) -> Vec<u8> {
    sequence(&[&oid(algorithm), constants::ASN1_NULL])
}

/// Re-tag an encoded element, keeping its length and content (IMPLICIT tagging).
#[must_use]
pub fn retag(encoded: &[u8], tag: u8) -> Vec<u8> {
    let mut out = encoded.to_vec();
    if let Some(first) = out.first_mut() {
        *first = tag;
    }
    out
}

/// One decoded TLV element borrowed from the input buffer.
#[derive(Clone, Copy)]
pub struct DerNode<'a> {
    tag: u8,
    value: &'a [u8],
    encoded: &'a [u8],
}

impl<'a> DerNode<'a> {
    /// Decode the first element of `bytes`. Trailing bytes (e.g. zero padding
    /// left over from a hex placeholder) are ignored.
    pub fn parse(bytes: &'a [u8], what: &str) -> MacResult<Self> {
        let mut reader = SliceReader::new(bytes).map_err(|e| MacError::parsing(what, e))?;
        Self::next(&mut reader, bytes, what)
    }

    fn next(reader: &mut SliceReader<'a>, bytes: &'a [u8], what: &str) -> MacResult<Self> {
        let start = position(reader);
        let any: AnyRef<'a> = reader.decode().map_err(|e| MacError::parsing(what, e))?;
        let end = position(reader);
        Ok(Self {
            tag: u8::from(any.tag()),
            value: any.value(),
            encoded: &bytes[start..end],
        })
    }

    #[must_use]
    pub fn tag(&self) -> u8 {
        self.tag
    }
    #[must_use]
    pub fn value(&self) -> &'a [u8] {
        self.value
    }
    /// Complete encoding including tag and length.
    #[must_use]
    pub fn encoded(&self) -> &'a [u8] {
        self.encoded
    }

    pub fn expect_tag(self, tag: u8, what: &str) -> MacResult<Self> {
        if self.tag != tag {
            return Err(MacError::parsing(
                what,
                format!("expected tag 0x{tag:02x}, found 0x{:02x}", self.tag),
            ));
        }
        Ok(self)
    }

    /// All elements inside a constructed value.
    pub fn children(&self, what: &str) -> MacResult<Vec<DerNode<'a>>> {
        let mut reader =
            SliceReader::new(self.value).map_err(|e| MacError::parsing(what, e))?;
        let mut out = Vec::new();
        while !reader.is_finished() {
            out.push(Self::next(&mut reader, self.value, what)?);
        }
        Ok(out)
    }

    /// Element at a fixed schema position.
    pub fn child(&self, index: usize, what: &str) -> MacResult<DerNode<'a>> {
        self.children(what)?.get(index).copied().ok_or_else(|| {
            MacError::parsing(what, format!("missing element at position {index}"))
        })
    }

    /// Last element of a constructed value.
    pub fn last_child(&self, what: &str) -> MacResult<DerNode<'a>> {
        self.children(what)?
            .last()
            .copied()
            .ok_or_else(|| MacError::parsing(what, "empty structure"))
    }

    pub fn as_oid(&self, what: &str) -> MacResult<ObjectIdentifier> {
        if self.tag != constants::ASN1_OID_TAG {
            return Err(MacError::parsing(
                what,
                format!("expected OBJECT IDENTIFIER, found tag 0x{:02x}", self.tag),
            ));
        }
        ObjectIdentifier::from_bytes(self.value).map_err(|e| MacError::parsing(what, e))
    }

    /// Encoding with the outer tag replaced, e.g. `[2] IMPLICIT SET` back to `SET`.
    #[must_use]
    pub fn encoded_with_tag(&self, tag: u8) -> Vec<u8> {
        retag(self.encoded, tag)
    }
}

impl std::fmt::Debug for DerNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DerNode(tag=0x{:02x}, len={})", self.tag, self.value.len())
    }
}

fn position(reader: &SliceReader<'_>) -> usize {
    usize::try_from(reader.position()).unwrap_or(0)
}
