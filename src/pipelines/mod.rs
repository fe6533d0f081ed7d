//! Workflow pipelines orchestrating stateless services.

pub mod protect;
pub mod verify;
