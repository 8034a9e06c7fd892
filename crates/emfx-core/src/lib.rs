//! EmfX Core - reflective object model and cross-reference resolution
//!
//! This crate provides the in-memory half of the model engine:
//! - `Value`, the closed set of storable feature values, and literal inference
//! - Metamodel descriptors (classifiers, features, packages, enum literals)
//! - `EObject`, a schema-less reflective object keyed by feature id
//! - `Resource`, the shared object table of one document
//! - `ResourceSet`, the locator registry that loads documents on demand and
//!   dereferences cross-document proxies
//!
//! Document formats live in `emfx-xmi`, which plugs into the registry through
//! the `ResourceLoader` trait.

pub mod digest;
pub mod errors;
pub mod fragment;
pub mod inference;
pub mod logging_facility;
pub mod metamodel;
pub mod object;
pub mod proxy;
pub mod resource;
pub mod resource_set;
pub mod value;

pub use emfx_core_types as types;

// Re-export commonly used types
pub use emfx_core_types::Identifier;
pub use errors::{ExError, ExErrorKind, ModelError, Result};
pub use inference::infer_value;
pub use object::EObject;
pub use proxy::{ProxyState, UnresolvedReference};
pub use resource::{Resource, ResourceContents};
pub use resource_set::{ResourceLoader, ResourceSet};
pub use value::{Decimal, Value};
