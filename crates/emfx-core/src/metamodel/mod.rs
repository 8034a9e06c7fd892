//! Metamodel descriptors
//!
//! Classifiers (class, primitive type, enumeration), their features and
//! packages, plus the per-resource `Metamodel` registry that indexes them.

pub mod classifier;
pub mod feature;
pub mod package;
pub mod registry;

pub use classifier::{ClassData, Classifier, ClassifierKind, EnumLiteral};
pub use feature::{Feature, FeatureKind, FeatureShape, TypeRef, UNBOUNDED};
pub use package::Package;
pub use registry::Metamodel;
