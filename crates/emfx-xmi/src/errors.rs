//! Error helpers for emfx-xmi
//!
//! Codec and I/O failures are folded into the core `ModelError` so a
//! `ResourceSet` sees one error type from every loader.

use emfx_core::errors::ModelError;

pub use emfx_core::errors::Result;

/// Create an XML syntax error
pub fn xml_error(err: impl std::fmt::Display) -> ModelError {
    ModelError::Xml {
        message: err.to_string(),
    }
}

/// Create a JSON syntax error
pub fn json_error(err: impl std::fmt::Display) -> ModelError {
    ModelError::Json {
        message: err.to_string(),
    }
}

/// Create an IO error for a document locator
pub fn io_error(locator: &str, err: std::io::Error) -> ModelError {
    ModelError::Io {
        locator: locator.to_string(),
        message: err.to_string(),
    }
}

/// Create an invalid-options error
pub fn options_error(reason: impl std::fmt::Display) -> ModelError {
    ModelError::InvalidOptions {
        message: reason.to_string(),
    }
}

/// Create an invalid-reference error for a malformed link
pub fn invalid_reference(link: &str) -> ModelError {
    ModelError::InvalidReference {
        reference: link.to_string(),
    }
}

/// Create an invalid-document error
pub fn invalid_document(reason: impl Into<String>) -> ModelError {
    ModelError::InvalidDocument {
        reason: reason.into(),
    }
}
