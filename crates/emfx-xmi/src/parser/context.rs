use std::collections::HashMap;
use std::fmt;

use emfx_core::{Identifier, ResourceContents};

use crate::options::ParseOptions;

/// A link that matched nothing in its document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub object_id: Identifier,
    pub feature: String,
    pub link: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dangling reference '{}' on feature '{}' of object {}",
            self.link, self.feature, self.object_id
        )
    }
}

/// Link recorded during construction, resolved in the second pass
#[derive(Debug, Clone)]
pub(crate) struct PendingLink {
    pub object: Identifier,
    pub feature: String,
    pub link: String,
}

/// Deferred descriptor link: `eType`, `eSuperTypes` or `eOpposite`
#[derive(Debug, Clone)]
pub(crate) struct PendingDescriptor {
    /// Feature id for `eType`/`eOpposite`, class id for `eSuperTypes`
    pub owner: Identifier,
    pub link: String,
}

/// State of one parse, created fresh per call and threaded through both
/// passes
///
/// Nothing here is shared with other parses, so a proxy resolution that
/// re-enters the parser for another document starts from a clean slate.
pub(crate) struct ParseContext<'o> {
    pub options: &'o ParseOptions,
    pub contents: ResourceContents,
    /// `//Name` (and `//Name/feature`, `//sub/Name`) -> metamodel element
    pub fragments: HashMap<String, Identifier>,
    /// Fragment path of each metamodel element, for building child paths
    pub paths: HashMap<Identifier, String>,
    pub links: Vec<PendingLink>,
    pub types: Vec<PendingDescriptor>,
    pub supertypes: Vec<PendingDescriptor>,
    pub opposites: Vec<PendingDescriptor>,
    pub warnings: Vec<ParseWarning>,
}

impl<'o> ParseContext<'o> {
    pub fn new(locator: &str, options: &'o ParseOptions) -> Self {
        Self {
            options,
            contents: ResourceContents::new(locator),
            fragments: HashMap::new(),
            paths: HashMap::new(),
            links: Vec::new(),
            types: Vec::new(),
            supertypes: Vec::new(),
            opposites: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.links.len() + self.types.len() + self.supertypes.len() + self.opposites.len()
    }

    /// Attributes that steer parsing rather than carry feature values
    pub fn is_control_attribute(&self, name: &str) -> bool {
        name == "xmlns"
            || name.starts_with("xmlns:")
            || name.starts_with("xmi:")
            || name.starts_with("xsi:")
            || name == self.options.identity_attribute
            || name == self.options.type_attribute
            || name == self.options.version_attribute
    }
}
