use std::collections::{HashMap, HashSet};

use emfx_core_types::Identifier;

use super::classifier::Classifier;
use super::feature::{Feature, FeatureShape};
use super::package::Package;
use crate::errors::{ModelError, Result};

/// Per-resource registry of classifiers and packages
///
/// Holds the classifier → ordered-features index used for name-based
/// reflective access. Feature ids are indexed back to their owning class so
/// id-keyed lookups never need a scan.
#[derive(Debug, Clone, Default)]
pub struct Metamodel {
    classifiers: HashMap<Identifier, Classifier>,
    order: Vec<Identifier>,
    by_name: HashMap<String, Identifier>,
    packages: HashMap<Identifier, Package>,
    package_order: Vec<Identifier>,
    feature_owner: HashMap<Identifier, Identifier>,
}

impl Metamodel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a classifier; the first classifier registered under a name
    /// owns that name in the index
    pub fn define_classifier(&mut self, classifier: Classifier) -> Identifier {
        let id = classifier.id;
        for feature in classifier.features() {
            self.feature_owner.insert(feature.id, id);
        }
        self.by_name.entry(classifier.name.clone()).or_insert(id);
        if self.classifiers.insert(id, classifier).is_none() {
            self.order.push(id);
        }
        id
    }

    /// Look up a classifier by name, synthesizing an empty placeholder class
    /// for an unseen name
    pub fn get_or_create_classifier(&mut self, name: &str, ns_prefix: Option<&str>) -> Identifier {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        tracing::debug!(classifier = name, "synthesizing placeholder classifier");
        self.define_classifier(Classifier::placeholder(name, ns_prefix.map(str::to_string)))
    }

    pub fn classifier(&self, id: &Identifier) -> Option<&Classifier> {
        self.classifiers.get(id)
    }

    pub fn classifier_mut(&mut self, id: &Identifier) -> Option<&mut Classifier> {
        self.classifiers.get_mut(id)
    }

    pub fn classifier_named(&self, name: &str) -> Option<&Classifier> {
        self.by_name.get(name).and_then(|id| self.classifiers.get(id))
    }

    /// Classifiers in registration order
    pub fn classifiers(&self) -> impl Iterator<Item = &Classifier> {
        self.order.iter().filter_map(|id| self.classifiers.get(id))
    }

    pub fn define_package(&mut self, package: Package) -> Identifier {
        let id = package.id;
        if self.packages.insert(id, package).is_none() {
            self.package_order.push(id);
        }
        id
    }

    pub fn package(&self, id: &Identifier) -> Option<&Package> {
        self.packages.get(id)
    }

    pub fn package_mut(&mut self, id: &Identifier) -> Option<&mut Package> {
        self.packages.get_mut(id)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.package_order.iter().filter_map(|id| self.packages.get(id))
    }

    /// Append a feature to a class
    ///
    /// # Errors
    ///
    /// `ClassifierNotFound` if the id is unknown, `Internal` if the
    /// classifier is not a class.
    pub fn add_feature(&mut self, classifier_id: &Identifier, feature: Feature) -> Result<Identifier> {
        let classifier = self
            .classifiers
            .get_mut(classifier_id)
            .ok_or(ModelError::ClassifierNotFound {
                classifier_id: *classifier_id,
            })?;
        let name = classifier.name.clone();
        let data = classifier
            .class_data_mut()
            .ok_or_else(|| ModelError::Internal {
                message: format!("classifier {} cannot own features", name),
            })?;
        let feature_id = feature.id;
        data.features.push(feature);
        self.feature_owner.insert(feature_id, *classifier_id);
        Ok(feature_id)
    }

    pub fn feature(&self, feature_id: &Identifier) -> Option<&Feature> {
        let owner = self.feature_owner.get(feature_id)?;
        self.classifiers
            .get(owner)?
            .features()
            .iter()
            .find(|f| f.id == *feature_id)
    }

    pub fn feature_mut(&mut self, feature_id: &Identifier) -> Option<&mut Feature> {
        let owner = *self.feature_owner.get(feature_id)?;
        self.classifiers
            .get_mut(&owner)?
            .class_data_mut()?
            .features
            .iter_mut()
            .find(|f| f.id == *feature_id)
    }

    /// Class owning a feature
    pub fn feature_owner(&self, feature_id: &Identifier) -> Option<&Identifier> {
        self.feature_owner.get(feature_id)
    }

    /// Ancestors of a class in depth-first order, excluding the class
    ///
    /// Only same-resource supertypes participate; cycles are cut.
    pub fn supertypes(&self, classifier_id: &Identifier) -> Vec<Identifier> {
        let mut seen = HashSet::from([*classifier_id]);
        let mut out = Vec::new();
        let mut stack: Vec<Identifier> = self.direct_supertypes(classifier_id);
        stack.reverse();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            let mut parents = self.direct_supertypes(&next);
            parents.reverse();
            stack.extend(parents);
        }
        out
    }

    fn direct_supertypes(&self, classifier_id: &Identifier) -> Vec<Identifier> {
        self.classifiers
            .get(classifier_id)
            .and_then(Classifier::class_data)
            .map(|d| d.supertypes.iter().filter_map(|t| t.resolved()).collect())
            .unwrap_or_default()
    }

    /// Find a feature by name on a class or any of its supertypes
    pub fn feature_by_name(&self, classifier_id: &Identifier, name: &str) -> Option<&Feature> {
        std::iter::once(*classifier_id)
            .chain(self.supertypes(classifier_id))
            .filter_map(|id| self.classifiers.get(&id))
            .flat_map(|c| c.features().iter())
            .find(|f| f.name == name)
    }

    /// All features of a class, inherited ones first
    pub fn all_features(&self, classifier_id: &Identifier) -> Vec<&Feature> {
        let mut lineage = self.supertypes(classifier_id);
        lineage.reverse();
        lineage.push(*classifier_id);
        lineage
            .iter()
            .filter_map(|id| self.classifiers.get(id))
            .flat_map(|c| c.features().iter())
            .collect()
    }

    /// Get-or-create a feature by name so schema-less callers can always
    /// store a value
    ///
    /// # Errors
    ///
    /// Fails if the classifier is unknown or is not a class, and with
    /// `FeatureShapeConflict` when the class already has a feature of that
    /// name whose containment differs from `shape`. Attributes and
    /// non-containment references are interchangeable.
    pub fn ensure_feature(
        &mut self,
        classifier_id: &Identifier,
        name: &str,
        shape: FeatureShape,
    ) -> Result<Identifier> {
        if let Some(feature) = self.feature_by_name(classifier_id, name) {
            if feature.is_containment() != (shape == FeatureShape::Containment) {
                let class = self
                    .classifiers
                    .get(classifier_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                return Err(ModelError::FeatureShapeConflict {
                    class,
                    feature: name.to_string(),
                });
            }
            return Ok(feature.id);
        }
        tracing::trace!(feature = name, "creating feature on demand");
        self.add_feature(
            classifier_id,
            Feature::with_id(Identifier::new(), name, shape),
        )
    }
}
