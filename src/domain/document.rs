//! Document-side view used by MAC protection: the trailer `/AuthCode`
//! dictionary, signature dictionaries, and access to the serialized bytes.

use std::collections::HashMap;
use std::fmt;

use crate::domain::byte_range::ByteRange;
use crate::domain::constants;
use crate::infra::error::{MacError, MacResult};

/// Where the MAC container of a document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacLocation {
    /// Directly in the trailer `/AuthCode` dictionary.
    Standalone,
    /// As an unsigned attribute of a document signature.
    AttachedToSignature,
}

impl MacLocation {
    #[must_use]
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            MacLocation::Standalone => constants::MAC_LOCATION_STANDALONE,
            MacLocation::AttachedToSignature => constants::MAC_LOCATION_ATTACHED,
        }
    }

    pub fn from_pdf_name(name: &str) -> MacResult<Self> {
        match name {
            constants::MAC_LOCATION_STANDALONE => Ok(MacLocation::Standalone),
            constants::MAC_LOCATION_ATTACHED => Ok(MacLocation::AttachedToSignature),
            other => Err(MacError::parsing(
                "AuthCode",
                format!("unknown MACLocation {other}"),
            )),
        }
    }
}

/// Indirect object reference (`12 0 R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub number: u32,
    pub generation: u16,
}

impl ObjectRef {
    #[must_use]
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// Fields of the trailer `/AuthCode` dictionary.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthDictionary {
    pub location: MacLocation,
    /// `/MAC`: DER container (standalone only).
    pub container: Option<Vec<u8>>,
    /// `/ByteRange` (standalone only).
    pub byte_range: Option<ByteRange>,
    /// `/SigObjRef` (attached only).
    pub signature_reference: Option<ObjectRef>,
}

impl AuthDictionary {
    #[must_use]
    pub fn standalone(container: Vec<u8>, byte_range: ByteRange) -> Self {
        Self {
            location: MacLocation::Standalone,
            container: Some(container),
            byte_range: Some(byte_range),
            signature_reference: None,
        }
    }

    #[must_use]
    pub fn attached(signature_reference: ObjectRef) -> Self {
        Self {
            location: MacLocation::AttachedToSignature,
            container: None,
            byte_range: None,
            signature_reference: Some(signature_reference),
        }
    }

    /// Serialize as `/AuthCode <<...>>`.
    #[must_use]
    pub fn to_pdf_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "{} <<{} {}",
            constants::AUTH_CODE_KEY,
            constants::MAC_LOCATION_KEY,
            self.location.as_pdf_name()
        );
        if let Some(container) = &self.container {
            out.push_str(&format!(" {} <{}>", constants::MAC_KEY, hex::encode(container)));
        }
        if let Some(range) = &self.byte_range {
            out.push_str(&format!(" {} {}", constants::BYTE_RANGE_KEY, range));
        }
        if let Some(reference) = &self.signature_reference {
            out.push_str(&format!(" {} {}", constants::SIG_OBJ_REF_KEY, reference));
        }
        out.push_str(">>");
        out.into_bytes()
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_pdf_bytes());
    }

    /// Read the last `/AuthCode` dictionary in a serialized document.
    pub fn extract(document: &[u8]) -> MacResult<Self> {
        let key = constants::AUTH_CODE_KEY.as_bytes();
        let start = document
            .windows(key.len())
            .rposition(|w| w == key)
            .ok_or_else(|| MacError::parsing("AuthCode", "no /AuthCode dictionary in document"))?;
        let tokens = tokenize_dictionary(&document[start + key.len()..])?;
        Self::from_tokens(&tokens)
    }

    fn from_tokens(tokens: &[Token]) -> MacResult<Self> {
        let mut location = None;
        let mut container = None;
        let mut byte_range = None;
        let mut signature_reference = None;

        let mut i = 0;
        while i < tokens.len() {
            let Token::Name(name) = &tokens[i] else {
                i += 1;
                continue;
            };
            let value = tokens.get(i + 1);
            match (name.as_str(), value) {
                (constants::MAC_LOCATION_KEY, Some(Token::Name(v))) => {
                    location = Some(MacLocation::from_pdf_name(v)?);
                    i += 2;
                }
                (constants::MAC_KEY, Some(Token::Hex(v))) => {
                    container = Some(v.clone());
                    i += 2;
                }
                (constants::BYTE_RANGE_KEY, Some(Token::Array(v))) => {
                    byte_range = Some(ByteRange::parse_pdf_array(v)?);
                    i += 2;
                }
                (constants::SIG_OBJ_REF_KEY, Some(Token::Integer(number))) => {
                    match (tokens.get(i + 2), tokens.get(i + 3)) {
                        (Some(Token::Integer(generation)), Some(Token::Keyword(r))) if r == "R" => {
                            let number = u32::try_from(*number)
                                .map_err(|_| MacError::parsing("SigObjRef", "object number"))?;
                            let generation = u16::try_from(*generation)
                                .map_err(|_| MacError::parsing("SigObjRef", "generation"))?;
                            signature_reference = Some(ObjectRef::new(number, generation));
                            i += 4;
                        }
                        _ => return Err(MacError::parsing("SigObjRef", "malformed reference")),
                    }
                }
                _ => i += 1,
            }
        }

        let location =
            location.ok_or_else(|| MacError::parsing("AuthCode", "missing /MACLocation"))?;
        Ok(Self {
            location,
            container,
            byte_range,
            signature_reference,
        })
    }
}

impl fmt::Debug for AuthDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthDictionary")
            .field("location", &self.location)
            .field("container_len", &self.container.as_ref().map(Vec::len))
            .field("byte_range", &self.byte_range)
            .field("signature_reference", &self.signature_reference)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Hex(Vec<u8>),
    Array(String),
    Integer(i64),
    Keyword(String),
}

/// Lex one `<< ... >>` dictionary (no nesting needed for `/AuthCode`).
fn tokenize_dictionary(bytes: &[u8]) -> MacResult<Vec<Token>> {
    let text_end = bytes.len();
    let mut i = 0;
    while i < text_end && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if !bytes[i..].starts_with(b"<<") {
        return Err(MacError::parsing("AuthCode", "expected dictionary"));
    }
    i += 2;

    let mut tokens = Vec::new();
    loop {
        while i < text_end && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= text_end {
            return Err(MacError::parsing("AuthCode", "unterminated dictionary"));
        }
        if bytes[i..].starts_with(b">>") {
            return Ok(tokens);
        }
        match bytes[i] {
            b'/' => {
                let start = i;
                i += 1;
                while i < text_end && is_regular(bytes[i]) {
                    i += 1;
                }
                tokens.push(Token::Name(String::from_utf8_lossy(&bytes[start..i]).into()));
            }
            b'<' => {
                let end = find(bytes, i, b'>')?;
                let hex_text: Vec<u8> = bytes[i + 1..end]
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                let decoded = hex::decode(&hex_text)
                    .map_err(|e| MacError::parsing("AuthCode /MAC", e))?;
                tokens.push(Token::Hex(decoded));
                i = end + 1;
            }
            b'[' => {
                let end = find(bytes, i, b']')?;
                tokens.push(Token::Array(
                    String::from_utf8_lossy(&bytes[i..=end]).into(),
                ));
                i = end + 1;
            }
            b if b.is_ascii_digit() || b == b'-' || b == b'+' => {
                let start = i;
                i += 1;
                while i < text_end && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let text = String::from_utf8_lossy(&bytes[start..i]);
                let value = text
                    .parse::<i64>()
                    .map_err(|e| MacError::parsing("AuthCode", format!("{text}: {e}")))?;
                tokens.push(Token::Integer(value));
            }
            _ => {
                let start = i;
                while i < text_end && is_regular(bytes[i]) {
                    i += 1;
                }
                if start == i {
                    return Err(MacError::parsing(
                        "AuthCode",
                        format!("unexpected byte 0x{:02x}", bytes[i]),
                    ));
                }
                tokens.push(Token::Keyword(
                    String::from_utf8_lossy(&bytes[start..i]).into(),
                ));
            }
        }
    }
}

fn is_regular(b: u8) -> bool {
    !b.is_ascii_whitespace() && !b"/<>[]()%{}".contains(&b)
}

fn find(bytes: &[u8], from: usize, needle: u8) -> MacResult<usize> {
    bytes[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|p| from + p)
        .ok_or_else(|| MacError::parsing("AuthCode", format!("missing '{}'", needle as char)))
}

/// The parts of a signature dictionary MAC validation needs.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureDictionary {
    /// Signature's own `/ByteRange`.
    pub byte_range: ByteRange,
    /// Decoded `/Contents`: the CMS signature container (may be zero padded).
    pub contents: Vec<u8>,
}

impl fmt::Debug for SignatureDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignatureDictionary(byte_range={}, contents_len={})",
            self.byte_range,
            self.contents.len()
        )
    }
}

/// Read access to a serialized document, provided by the surrounding document model.
pub trait MacDocument {
    /// Complete serialized bytes.
    fn bytes(&self) -> &[u8];

    /// Resolve a signature dictionary by reference.
    fn signature_dictionary(&self, reference: ObjectRef) -> Option<SignatureDictionary>;
}

/// Serialized bytes plus a table of signature dictionaries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocument {
    bytes: Vec<u8>,
    signatures: HashMap<ObjectRef, SignatureDictionary>,
}

impl InMemoryDocument {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            signatures: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_signature(mut self, reference: ObjectRef, signature: SignatureDictionary) -> Self {
        self.signatures.insert(reference, signature);
        self
    }

    pub fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

impl MacDocument for InMemoryDocument {
    fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn signature_dictionary(&self, reference: ObjectRef) -> Option<SignatureDictionary> {
        self.signatures.get(&reference).cloned()
    }
}
