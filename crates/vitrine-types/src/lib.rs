//! # vitrine-types
//!
//! Domain types for the vitrine instance pool.
//! This crate contains pure data types with zero external dependencies
//! (except serde for serialization).

pub mod error;
pub mod kind;

// Re-exports for convenience.
pub use error::{DiagnosticError, ErrorKind, VitrineError};
pub use kind::{ComponentKind, InstanceId};
