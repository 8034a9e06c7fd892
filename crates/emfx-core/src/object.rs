use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use emfx_core_types::Identifier;

use crate::metamodel::Feature;
use crate::value::Value;

/// Reflective object - one modelled instance
///
/// A generic, schema-less representation: identity, classifier, and a map
/// from feature identifier to value. Storage is keyed by the feature's id,
/// never its name, so renaming a feature descriptor keeps stored data.
/// Multiplicity bounds are not enforced here.
///
/// Equality and hashing are identity-based.
#[derive(Debug, Clone)]
pub struct EObject {
    id: Identifier,
    classifier: Identifier,
    values: HashMap<Identifier, Value>,
}

impl EObject {
    /// Create an object with a fresh identifier
    pub fn new(classifier: Identifier) -> Self {
        Self::with_id(Identifier::new(), classifier)
    }

    /// Create an object reusing an identifier minted elsewhere (e.g. a
    /// metamodel element mirrored as an object)
    pub fn with_id(id: Identifier, classifier: Identifier) -> Self {
        Self {
            id,
            classifier,
            values: HashMap::new(),
        }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn classifier(&self) -> Identifier {
        self.classifier
    }

    pub fn get(&self, feature: &Feature) -> Option<&Value> {
        self.get_by_id(&feature.id)
    }

    /// Set a value; `None` is identical to `unset`
    pub fn set(&mut self, feature: &Feature, value: Option<Value>) {
        self.set_by_id(feature.id, value);
    }

    pub fn is_set(&self, feature: &Feature) -> bool {
        self.values.contains_key(&feature.id)
    }

    pub fn unset(&mut self, feature: &Feature) {
        self.values.remove(&feature.id);
    }

    pub fn get_by_id(&self, feature_id: &Identifier) -> Option<&Value> {
        self.values.get(feature_id)
    }

    pub fn set_by_id(&mut self, feature_id: Identifier, value: Option<Value>) {
        match value {
            Some(v) => {
                self.values.insert(feature_id, v);
            }
            None => {
                self.values.remove(&feature_id);
            }
        }
    }

    /// Remove and return a stored value
    pub fn take_by_id(&mut self, feature_id: &Identifier) -> Option<Value> {
        self.values.remove(feature_id)
    }

    /// Feature ids with a stored value (unordered)
    pub fn set_features(&self) -> impl Iterator<Item = &Identifier> {
        self.values.keys()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.values.values_mut()
    }
}

impl PartialEq for EObject {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EObject {}

impl Hash for EObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
