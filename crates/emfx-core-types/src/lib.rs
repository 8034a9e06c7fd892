//! Core types shared across EmfX layers
//!
//! This crate provides the leaf types used by the object store, the
//! parser and the logging facility:
//!
//! - **Identity**: `Identifier`, the process-unique identity of every
//!   modelled object, classifier and feature
//! - **Schema constants**: Canonical field keys and event names

pub mod identifier;
pub mod schema;

pub use identifier::Identifier;
