//! Error types for MAC protection and validation.
//! Error handling types and result definitions for container construction and parsing.

use std::fmt;

use thiserror::Error;

/// Result type for MAC operations
pub type MacResult<T> = Result<T, MacError>;

/// The check that failed when a container was parsed successfully but did not
/// match the document it claims to protect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacMismatch {
    /// Recomputed integrity-info digest differs from the messageDigest attribute.
    DocumentDigest,
    /// Recomputed HMAC over the authenticated attributes differs from the stored value.
    MacValue,
    /// cmsAlgorithmProtection attribute disagrees with the outer algorithm identifiers.
    AlgorithmProtection,
    /// The wrapped authentication key failed the key-wrap integrity check.
    KeyUnwrap,
    /// The `/AuthCode` dictionary read back from the protected bytes is missing or corrupt.
    AuthDictionary,
}

impl fmt::Display for MacMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MacMismatch::DocumentDigest => "document digest does not match messageDigest attribute",
            MacMismatch::MacValue => "MAC value does not match authenticated attributes",
            MacMismatch::AlgorithmProtection => {
                "cmsAlgorithmProtection attribute does not match container algorithms"
            }
            MacMismatch::KeyUnwrap => "authentication key could not be unwrapped",
            MacMismatch::AuthDictionary => "AuthCode dictionary is missing or corrupt",
        };
        f.write_str(text)
    }
}

/// Coarse classification used by callers deciding document-level recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Parsing,
    Validation,
    Precondition,
    ProtocolMisuse,
    Io,
}

/// Comprehensive error types for MAC operations
#[derive(Error, Debug, miette::Diagnostic)]
pub enum MacError {
    #[error("Digest algorithm not supported: {0}")]
    DigestNotSupported(String),

    #[error("MAC algorithm not supported: {0}")]
    MacAlgorithmNotSupported(String),

    #[error("Key wrapping algorithm not supported: {0}")]
    WrapAlgorithmNotSupported(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("MAC container parsing failed while reading {context}: {cause}")]
    #[diagnostic(help("the container is malformed or truncated; the document cannot be checked"))]
    ContainerParsing { context: String, cause: String },

    #[error("MAC container extraction failed: {0}")]
    MacExtraction(String),

    #[error("MAC validation failed: {0}")]
    #[diagnostic(help("the protected bytes were modified after the MAC was attached"))]
    ValidationFailed(MacMismatch),

    #[error("AuthCode dictionary does not contain a MAC container")]
    ContainerNotSpecified,

    #[error("AuthCode dictionary does not contain a ByteRange")]
    ByteRangeNotSpecified,

    #[error("AuthCode dictionary does not reference a signature (SigObjRef)")]
    SignatureReferenceMissing,

    #[error("Referenced signature dictionary not found: {0}")]
    SignatureNotFound(String),

    #[error("KDF salt must be set before validation")]
    KdfSaltNotSpecified,

    #[error("Placeholder protocol misuse: {0}")]
    PlaceholderState(String),

    #[error("Placeholder overflow: {what} needs {needed} bytes but {reserved} were reserved")]
    PlaceholderOverflow {
        what: &'static str,
        needed: usize,
        reserved: usize,
    },

    #[error("IO error: {0}")]
    IoError(String),
}

impl MacError {
    /// Wrap a low-level decoding failure with the structure being navigated.
    pub fn parsing(context: impl Into<String>, cause: impl fmt::Display) -> Self {
        MacError::ContainerParsing {
            context: context.into(),
            cause: cause.to_string(),
        }
    }

    /// True when the container was readable but did not match the document.
    #[must_use]
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, MacError::ValidationFailed(_))
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            MacError::DigestNotSupported(_)
            | MacError::MacAlgorithmNotSupported(_)
            | MacError::WrapAlgorithmNotSupported(_)
            | MacError::InvalidKey(_)
            | MacError::ConfigurationError(_) => ErrorCategory::Configuration,
            MacError::ContainerParsing { .. } | MacError::MacExtraction(_) => {
                ErrorCategory::Parsing
            }
            MacError::ValidationFailed(_) => ErrorCategory::Validation,
            MacError::ContainerNotSpecified
            | MacError::ByteRangeNotSpecified
            | MacError::SignatureReferenceMissing
            | MacError::SignatureNotFound(_)
            | MacError::KdfSaltNotSpecified => ErrorCategory::Precondition,
            MacError::PlaceholderState(_) | MacError::PlaceholderOverflow { .. } => {
                ErrorCategory::ProtocolMisuse
            }
            MacError::IoError(_) => ErrorCategory::Io,
        }
    }
}

impl From<std::io::Error> for MacError {
    fn from(error: std::io::Error) -> Self {
        MacError::IoError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = MacError::DigestNotSupported("1.2.3".to_string());
        assert_eq!(error.to_string(), "Digest algorithm not supported: 1.2.3");

        let error = MacError::ValidationFailed(MacMismatch::MacValue);
        assert_eq!(
            error.to_string(),
            "MAC validation failed: MAC value does not match authenticated attributes"
        );

        let error = MacError::ValidationFailed(MacMismatch::AuthDictionary);
        assert_eq!(
            error.to_string(),
            "MAC validation failed: AuthCode dictionary is missing or corrupt"
        );
        assert_eq!(error.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_error_categories() {
        assert!(MacError::ValidationFailed(MacMismatch::DocumentDigest).is_validation_failure());
        assert!(!MacError::parsing("mac", "truncated").is_validation_failure());
        assert_eq!(
            MacError::parsing("mac", "truncated").category(),
            ErrorCategory::Parsing
        );
        assert_eq!(
            MacError::ContainerNotSpecified.category(),
            ErrorCategory::Precondition
        );
        assert_eq!(
            MacError::PlaceholderState("twice".into()).category(),
            ErrorCategory::ProtocolMisuse
        );
    }

    #[test]
    fn test_error_conversion() {
        let error: MacError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        match error {
            MacError::IoError(msg) => assert_eq!(msg, "gone"),
            _ => panic!("Wrong error type"),
        }
    }
}
