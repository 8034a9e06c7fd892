use emfx_core_types::Identifier;

/// A namespace grouping classifiers and nested packages
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub id: Identifier,
    pub name: String,
    pub ns_uri: String,
    pub ns_prefix: String,
    pub classifiers: Vec<Identifier>,
    pub subpackages: Vec<Identifier>,
}

impl Package {
    pub fn new(
        id: Identifier,
        name: impl Into<String>,
        ns_uri: impl Into<String>,
        ns_prefix: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            ns_uri: ns_uri.into(),
            ns_prefix: ns_prefix.into(),
            classifiers: Vec::new(),
            subpackages: Vec::new(),
        }
    }
}
