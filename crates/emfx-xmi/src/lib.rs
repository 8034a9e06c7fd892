//! EmfX XMI - document parsing and serialization
//!
//! Reads XMI documents (and their JSON rendering) into `emfx-core`
//! resources and writes them back:
//! - `document`: the syntax-independent element tree, with XML and JSON codecs
//! - `parser`: the two-pass parser (construct, then resolve links)
//! - `serializer`: resource to element tree
//! - `locator`: link splitting and locator arithmetic
//! - `options`: parser settings, loadable from TOML
//!
//! A `Parser` doubles as the `ResourceLoader` of a `ResourceSet`, so proxies
//! into documents that are not loaded yet are fetched on demand.

pub mod document;
pub mod errors;
pub mod locator;
pub mod options;
pub mod parser;
pub mod serializer;

pub use document::Element;
pub use options::ParseOptions;
pub use parser::{ParseWarning, Parsed, Parser};
pub use serializer::{serialize, serialize_resource, to_json_string, to_xmi_string};
