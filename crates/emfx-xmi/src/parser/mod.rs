//! Two-pass document parser
//!
//! Pass 1 ([`construct`]) builds every object and metamodel descriptor and
//! records links as text. Pass 2 ([`resolve`]) turns the recorded links into
//! object references or cross-document proxies. The resource is published
//! only after both passes succeed; a failed parse leaves nothing behind.

mod construct;
mod context;
mod resolve;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use emfx_core::{log_op_end, log_op_error, log_op_start};
use emfx_core::{Resource, ResourceLoader, ResourceSet};

pub use context::ParseWarning;
pub(crate) use construct::{DESCRIPTOR_LINKS, ECORE_NS_URI, ECORE_PREFIX, XMI_NS_URI, XSI_NS_URI};

use crate::document::json::read_json;
use crate::document::xml::read_xml_bytes;
use crate::document::Element;
use crate::errors::{io_error, Result};
use crate::locator::file_path;
use crate::options::ParseOptions;
use context::ParseContext;

/// Outcome of a successful parse
#[derive(Debug, Clone)]
pub struct Parsed {
    pub resource: Resource,
    /// Dangling links dropped in lenient mode
    pub warnings: Vec<ParseWarning>,
}

/// Document parser; also the file loader of a `ResourceSet`
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: Arc<ParseOptions>,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// A resource set that loads missing documents through this parser
    pub fn into_resource_set(self) -> ResourceSet {
        ResourceSet::with_loader(Arc::new(self))
    }

    /// Read and parse the document at `locator`
    ///
    /// # Errors
    ///
    /// See [`Parser::parse_with_diagnostics`].
    pub async fn parse(&self, locator: &str) -> Result<Resource> {
        self.parse_with_diagnostics(locator)
            .await
            .map(|parsed| parsed.resource)
    }

    /// Read and parse the document at `locator`, keeping the warnings
    ///
    /// Plain paths and `file:` URLs are read from disk.
    ///
    /// # Errors
    ///
    /// `UnsupportedScheme` or `Io` if the document cannot be read; any
    /// document error from [`Parser::parse_bytes`].
    pub async fn parse_with_diagnostics(&self, locator: &str) -> Result<Parsed> {
        let path = file_path(locator)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| io_error(locator, e))?;
        self.parse_bytes(locator, &bytes)
    }

    /// Parse document bytes; JSON is recognized by a leading `{`
    ///
    /// # Errors
    ///
    /// `InvalidEncoding`, `Xml` or `Json` for unreadable input; any error
    /// from [`Parser::parse_element`].
    pub fn parse_bytes(&self, locator: &str, bytes: &[u8]) -> Result<Parsed> {
        self.logged(locator, || {
            let tree = if looks_like_json(bytes) {
                std::str::from_utf8(bytes)
                    .map_err(|e| emfx_core::errors::ModelError::InvalidEncoding {
                        message: format!("document is not valid UTF-8: {}", e),
                    })
                    .and_then(read_json)?
            } else {
                read_xml_bytes(bytes)?
            };
            self.run_passes(locator, &tree)
        })
    }

    /// Parse XML document text
    ///
    /// # Errors
    ///
    /// See [`Parser::parse_bytes`].
    pub fn parse_str(&self, locator: &str, text: &str) -> Result<Parsed> {
        self.parse_bytes(locator, text.as_bytes())
    }

    /// Parse the JSON form of a document tree
    ///
    /// # Errors
    ///
    /// `Json` if the text is not an element tree; any error from
    /// [`Parser::parse_element`].
    pub fn parse_json_str(&self, locator: &str, text: &str) -> Result<Parsed> {
        self.logged(locator, || self.run_passes(locator, &read_json(text)?))
    }

    /// Build a resource from an already read element tree
    ///
    /// # Errors
    ///
    /// - `UnsupportedVersion` / `MissingRequiredAttribute` for the version
    ///   check on the top element
    /// - `MissingRequiredAttribute`, `UnknownElement` or `InvalidDocument`
    ///   from construction
    /// - `InvalidReference` for malformed links, and for dangling links in
    ///   strict mode
    pub fn parse_element(&self, locator: &str, root: &Element) -> Result<Parsed> {
        self.logged(locator, || self.run_passes(locator, root))
    }

    /// Run one parse between a `parse` start event and its end or error event
    fn logged(&self, locator: &str, parse: impl FnOnce() -> Result<Published>) -> Result<Parsed> {
        let start = Instant::now();
        log_op_start!("parse", locator = locator);

        match parse() {
            Ok(parsed) => {
                let (object_count, root_count) = parsed.counts;
                log_op_end!(
                    "parse",
                    duration_ms = start.elapsed().as_millis() as u64,
                    locator = locator,
                    object_count = object_count as u64,
                    root_count = root_count as u64,
                    warning_count = parsed.warnings.len() as u64
                );
                Ok(Parsed {
                    resource: parsed.resource,
                    warnings: parsed.warnings,
                })
            }
            Err(err) => {
                log_op_error!(
                    "parse",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    locator = locator
                );
                Err(err)
            }
        }
    }

    fn run_passes(&self, locator: &str, root: &Element) -> Result<Published> {
        let mut ctx = ParseContext::new(locator, &self.options);

        construct::construct_document(&mut ctx, root)?;
        tracing::debug!(
            locator,
            objects = ctx.contents.count(),
            pending_count = ctx.pending_count(),
            "construction pass complete"
        );

        resolve::resolve_document(&mut ctx)?;
        tracing::debug!(locator, warnings = ctx.warnings.len(), "resolution pass complete");

        let counts = (ctx.contents.count(), ctx.contents.root_ids().len());
        Ok(Published {
            resource: Resource::from_contents(ctx.contents),
            warnings: ctx.warnings,
            counts,
        })
    }
}

struct Published {
    resource: Resource,
    warnings: Vec<ParseWarning>,
    counts: (usize, usize),
}

fn looks_like_json(bytes: &[u8]) -> bool {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

#[async_trait]
impl ResourceLoader for Parser {
    async fn load(&self, locator: &str, _set: &ResourceSet) -> Result<Resource> {
        self.parse(locator).await
    }
}
