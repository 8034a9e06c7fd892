//! Cross-document proxies
//!
//! A link into another document is stored as an `UnresolvedReference`
//! until a caller dereferences it through a `ResourceSet`. Clones of one
//! proxy share a memo cell, so the first successful resolution is reused
//! by every copy of the value.

use emfx_core_types::Identifier;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Observable state of a proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyState<'a> {
    Unresolved { locator: &'a str, fragment: &'a str },
    /// Resolution ran; `None` means the fragment matched nothing
    Resolved(Option<Identifier>),
}

/// A not-yet-dereferenced link to an object in another document
#[derive(Clone)]
pub struct UnresolvedReference {
    locator: String,
    fragment: String,
    resolved: Arc<OnceCell<Option<Identifier>>>,
}

impl UnresolvedReference {
    /// Create a proxy; an empty fragment addresses the first root (`/`)
    pub fn new(locator: impl Into<String>, fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        Self {
            locator: locator.into(),
            fragment: if fragment.is_empty() {
                "/".to_string()
            } else {
                fragment
            },
            resolved: Arc::new(OnceCell::new()),
        }
    }

    /// Absolute locator of the target document
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Fragment inside the target document
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// `locator#fragment`
    pub fn uri(&self) -> String {
        format!("{}#{}", self.locator, self.fragment)
    }

    pub fn state(&self) -> ProxyState<'_> {
        match self.resolved.get() {
            Some(target) => ProxyState::Resolved(*target),
            None => ProxyState::Unresolved {
                locator: &self.locator,
                fragment: &self.fragment,
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.initialized()
    }

    pub(crate) fn memo(&self) -> &OnceCell<Option<Identifier>> {
        &self.resolved
    }
}

// Identity of a proxy is its target address, not its memo state.
impl PartialEq for UnresolvedReference {
    fn eq(&self, other: &Self) -> bool {
        self.locator == other.locator && self.fragment == other.fragment
    }
}

impl fmt::Debug for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnresolvedReference")
            .field("locator", &self.locator)
            .field("fragment", &self.fragment)
            .field("resolved", &self.resolved.get())
            .finish()
    }
}
