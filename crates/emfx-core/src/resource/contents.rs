use std::collections::HashMap;

use emfx_core_types::Identifier;

use crate::errors::{ModelError, Result};
use crate::metamodel::{FeatureShape, Metamodel};
use crate::object::EObject;
use crate::value::Value;

/// Object table of one loaded document
///
/// Synchronous store behind a `Resource` handle. The parser builds one of
/// these privately and only publishes it once both passes succeed; callers
/// holding a `Resource` reach it through `Resource::read`/`Resource::write`.
#[derive(Debug, Clone)]
pub struct ResourceContents {
    locator: String,
    roots: Vec<Identifier>,
    objects: HashMap<Identifier, EObject>,
    order: Vec<Identifier>,
    metamodel: Metamodel,
    /// identity marker (`xmi:id`) -> object
    identities: HashMap<String, Identifier>,
    /// object -> identity marker
    markers: HashMap<Identifier, String>,
    /// prefix -> namespace URI, as declared on the top element
    namespaces: Vec<(String, String)>,
}

impl ResourceContents {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            roots: Vec::new(),
            objects: HashMap::new(),
            order: Vec::new(),
            metamodel: Metamodel::new(),
            identities: HashMap::new(),
            markers: HashMap::new(),
            namespaces: Vec::new(),
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Register an object as a root and a table entry
    pub fn add(&mut self, object: EObject) -> Identifier {
        let id = self.register(object);
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
        id
    }

    /// Register an object in the table only; re-registering an id replaces
    /// the stored object but keeps its table position
    pub fn register(&mut self, object: EObject) -> Identifier {
        let id = object.id();
        if self.objects.insert(id, object).is_none() {
            self.order.push(id);
        }
        id
    }

    /// Promote an already registered object to a root
    ///
    /// # Errors
    ///
    /// `ObjectNotFound` if the id is not in the table.
    pub fn mark_root(&mut self, id: Identifier) -> Result<()> {
        if !self.objects.contains_key(&id) {
            return Err(ModelError::ObjectNotFound { object_id: id });
        }
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
        Ok(())
    }

    pub fn root_ids(&self) -> &[Identifier] {
        &self.roots
    }

    pub fn roots(&self) -> impl Iterator<Item = &EObject> {
        self.roots.iter().filter_map(|id| self.objects.get(id))
    }

    /// All objects in insertion order
    pub fn objects(&self) -> impl Iterator<Item = &EObject> {
        self.order.iter().filter_map(|id| self.objects.get(id))
    }

    pub fn object_ids(&self) -> &[Identifier] {
        &self.order
    }

    pub fn object(&self, id: &Identifier) -> Option<&EObject> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: &Identifier) -> Option<&mut EObject> {
        self.objects.get_mut(id)
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.objects.contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.objects.len()
    }

    pub fn metamodel(&self) -> &Metamodel {
        &self.metamodel
    }

    pub fn metamodel_mut(&mut self) -> &mut Metamodel {
        &mut self.metamodel
    }

    // ===== Name-addressed reflective access =====

    /// Look up an object by id and read a feature by name
    pub fn e_get(&self, id: &Identifier, feature_name: &str) -> Option<&Value> {
        let object = self.objects.get(id)?;
        let feature = self
            .metamodel
            .feature_by_name(&object.classifier(), feature_name)?;
        object.get(feature)
    }

    /// Look up an object by id and write a feature by name
    ///
    /// An existing feature of that name is written as it is, whatever its
    /// shape. Unknown names are created on the object's class; object
    /// values create a non-containment reference, literals an attribute.
    ///
    /// # Errors
    ///
    /// `ObjectNotFound` if the id is not in the table.
    pub fn e_set(&mut self, id: &Identifier, feature_name: &str, value: Option<Value>) -> Result<()> {
        let object = self
            .objects
            .get_mut(id)
            .ok_or(ModelError::ObjectNotFound { object_id: *id })?;
        if let Some(feature) = self
            .metamodel
            .feature_by_name(&object.classifier(), feature_name)
        {
            object.set_by_id(feature.id, value);
            return Ok(());
        }
        let shape = match &value {
            Some(v) if holds_links(v) => FeatureShape::CrossReference,
            _ => FeatureShape::Attribute,
        };
        self.set_feature(id, feature_name, shape, value)
    }

    /// Write a feature by name, creating it with `shape` if the class does
    /// not have it yet
    ///
    /// # Errors
    ///
    /// `ObjectNotFound` if the id is not in the table; errors from
    /// `Metamodel::ensure_feature`.
    pub fn set_feature(
        &mut self,
        id: &Identifier,
        feature_name: &str,
        shape: FeatureShape,
        value: Option<Value>,
    ) -> Result<()> {
        let classifier = self
            .objects
            .get(id)
            .map(EObject::classifier)
            .ok_or(ModelError::ObjectNotFound { object_id: *id })?;

        if value.is_none() {
            if let Some(feature) = self.metamodel.feature_by_name(&classifier, feature_name) {
                let feature_id = feature.id;
                if let Some(object) = self.objects.get_mut(id) {
                    object.set_by_id(feature_id, None);
                }
            }
            return Ok(());
        }

        let feature_id = self
            .metamodel
            .ensure_feature(&classifier, feature_name, shape)?;
        if let Some(object) = self.objects.get_mut(id) {
            object.set_by_id(feature_id, value);
        }
        Ok(())
    }

    // ===== Identity markers =====

    /// Record the document-local identity marker of an object
    pub fn assign_marker(&mut self, id: Identifier, marker: impl Into<String>) {
        let marker = marker.into();
        self.identities.insert(marker.clone(), id);
        self.markers.insert(id, marker);
    }

    pub fn object_by_marker(&self, marker: &str) -> Option<Identifier> {
        self.identities.get(marker).copied()
    }

    pub fn marker_of(&self, id: &Identifier) -> Option<&str> {
        self.markers.get(id).map(String::as_str)
    }

    // ===== Namespaces =====

    pub fn declare_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        let uri = uri.into();
        match self.namespaces.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = uri,
            None => self.namespaces.push((prefix, uri)),
        }
    }

    pub fn namespaces(&self) -> &[(String, String)] {
        &self.namespaces
    }

    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    // ===== Containment =====

    /// Directly contained children of an object, in feature order
    pub fn contents_of(&self, id: &Identifier) -> Vec<Identifier> {
        let Some(object) = self.objects.get(id) else {
            return Vec::new();
        };
        self.metamodel
            .all_features(&object.classifier())
            .into_iter()
            .filter(|f| f.is_containment())
            .filter_map(|f| object.get(f))
            .flat_map(Value::object_ids)
            .collect()
    }

    /// Containing object, containment feature name and position (for
    /// multi-valued features)
    pub fn container_of(&self, id: &Identifier) -> Option<(Identifier, String, Option<usize>)> {
        for object in self.objects() {
            for feature in self.metamodel.all_features(&object.classifier()) {
                if !feature.is_containment() {
                    continue;
                }
                match object.get(feature) {
                    Some(Value::Object(child)) if child == id => {
                        return Some((object.id(), feature.name.clone(), None));
                    }
                    Some(Value::Many(items)) => {
                        if let Some(pos) = items.iter().position(|v| v.as_object() == Some(*id)) {
                            return Some((object.id(), feature.name.clone(), Some(pos)));
                        }
                    }
                    _ => {}
                }
            }
        }
        None
    }

    /// Containment path of an object (`/`, `/1`, `//@members.0`, ...)
    ///
    /// Returns `None` for objects not reachable from a root.
    pub fn fragment_of(&self, id: &Identifier) -> Option<String> {
        if let Some(pos) = self.roots.iter().position(|r| r == id) {
            return Some(if pos == 0 {
                "/".to_string()
            } else {
                format!("/{}", pos)
            });
        }
        let mut guard = 0usize;
        let mut segments = Vec::new();
        let mut current = *id;
        loop {
            if let Some(pos) = self.roots.iter().position(|r| *r == current) {
                segments.reverse();
                let head = if pos == 0 { String::new() } else { pos.to_string() };
                return Some(format!("/{}/{}", head, segments.join("/")));
            }
            let (parent, feature, index) = self.container_of(&current)?;
            segments.push(match index {
                Some(i) => format!("@{}.{}", feature, i),
                None => format!("@{}", feature),
            });
            current = parent;
            guard += 1;
            if guard > self.objects.len() {
                // containment cycle
                return None;
            }
        }
    }
}

fn holds_links(value: &Value) -> bool {
    match value {
        Value::Object(_) | Value::Proxy(_) => true,
        Value::Many(items) => items.first().map(holds_links).unwrap_or(false),
        _ => false,
    }
}
