//! Service layer module root.
//! Container construction, parsing, key handling and the protector built on them.

pub mod container_builder;
pub mod container_reader;
pub mod key_wrap;
pub mod placeholder;
pub mod protector;
pub mod signature_embedder;
pub mod validator;

pub use container_builder::{AuthAttributes, MacContainerBuilder};
pub use container_reader::{
    AlgorithmProtection, MacContainerReader, SignatureMacReader, SignerInfoView,
    StandaloneMacReader,
};
pub use placeholder::{MacPlaceholder, PlaceholderState, Reservation};
pub use protector::MacProtector;
pub use signature_embedder::SignatureMacEmbedder;
pub use validator::{MacValidator, ValidationKeys};
