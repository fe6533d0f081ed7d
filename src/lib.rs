//! PDF MAC Library
//!
//! MAC-based integrity protection for serialized PDF documents. A CMS
//! `AuthenticatedData` container carrying an HMAC over a digest of the
//! document's byte range is embedded either in the trailer `/AuthCode`
//! dictionary or as an unsigned attribute of an existing signature, and is
//! re-derived and compared on validation.
//!
//! ```no_run
//! use pdf_mac::{InMemoryDocument, MacProperties, ProtectWorkflow, VerifyWorkflow};
//!
//! # fn main() -> pdf_mac::MacResult<()> {
//! let file_key = [0u8; 32];
//! let protected = ProtectWorkflow::new(MacProperties::default())
//!     .run(b"%PDF-2.0\n...", "/Size 1", &file_key, None)?;
//! let document = InMemoryDocument::new(protected.bytes);
//! VerifyWorkflow::new().run(&document, &file_key, &protected.kdf_salt)?;
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

pub use domain::algorithms::{KeyWrapAlgorithm, MacAlgorithm, MacDigestAlgorithm};
pub use domain::byte_range::ByteRange;
pub use domain::container::{IntegrityInfo, MacContainer};
pub use domain::context::ProtectionContext;
pub use domain::document::{
    AuthDictionary, InMemoryDocument, MacDocument, MacLocation, ObjectRef, SignatureDictionary,
};
pub use domain::properties::MacProperties;
pub use domain::verification::MacVerificationReport;
pub use infra::config::{ConfigManager, MacConfiguration};
pub use infra::error::{ErrorCategory, MacError, MacMismatch, MacResult};
pub use pipelines::protect::{AttachedProtection, ProtectWorkflow, ProtectedDocument};
pub use pipelines::verify::VerifyWorkflow;
pub use services::protector::MacProtector;
