pub mod algorithms;
pub mod asn1; // DER writer helpers + positional navigator
pub mod byte_range;
pub mod constants;
pub mod container;
pub mod context;
pub mod document;
pub mod properties;
pub mod verification;
