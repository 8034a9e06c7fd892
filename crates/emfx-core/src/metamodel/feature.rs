use emfx_core_types::Identifier;

use crate::proxy::UnresolvedReference;

/// Upper bound of a many-valued feature
pub const UNBOUNDED: i32 = -1;

/// Declared type of a feature, or supertype of a class
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// Classifier in the same resource
    Resolved(Identifier),
    /// Classifier in another document
    Proxy(UnresolvedReference),
    /// Link text recorded during construction, cleared by resolution
    Pending(String),
}

impl TypeRef {
    pub fn resolved(&self) -> Option<Identifier> {
        match self {
            TypeRef::Resolved(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TypeRef::Pending(_))
    }
}

/// Variant data of a feature descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    Attribute {
        ty: Option<TypeRef>,
        lower: i32,
        upper: i32,
        default_literal: Option<String>,
    },
    Reference {
        ty: Option<TypeRef>,
        lower: i32,
        upper: i32,
        containment: bool,
        opposite: Option<Identifier>,
    },
}

/// Shape requested when a feature is created on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureShape {
    Attribute,
    Containment,
    CrossReference,
}

/// A field descriptor on a class
///
/// Object storage is keyed by `id`; `name` is display data and may change
/// without invalidating stored values.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Identifier,
    pub name: String,
    pub kind: FeatureKind,
}

impl Feature {
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::with_id(Identifier::new(), name, FeatureShape::Attribute)
    }

    pub fn reference(name: impl Into<String>, containment: bool) -> Self {
        let shape = if containment {
            FeatureShape::Containment
        } else {
            FeatureShape::CrossReference
        };
        Self::with_id(Identifier::new(), name, shape)
    }

    /// Descriptor with default bounds (0..1) and no declared type
    pub fn with_id(id: Identifier, name: impl Into<String>, shape: FeatureShape) -> Self {
        let kind = match shape {
            FeatureShape::Attribute => FeatureKind::Attribute {
                ty: None,
                lower: 0,
                upper: 1,
                default_literal: None,
            },
            FeatureShape::Containment | FeatureShape::CrossReference => FeatureKind::Reference {
                ty: None,
                lower: 0,
                upper: 1,
                containment: shape == FeatureShape::Containment,
                opposite: None,
            },
        };
        Self {
            id,
            name: name.into(),
            kind,
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, FeatureKind::Attribute { .. })
    }

    pub fn is_containment(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                containment: true,
                ..
            }
        )
    }

    pub fn ty(&self) -> Option<&TypeRef> {
        match &self.kind {
            FeatureKind::Attribute { ty, .. } | FeatureKind::Reference { ty, .. } => ty.as_ref(),
        }
    }

    pub fn set_ty(&mut self, new_ty: Option<TypeRef>) {
        match &mut self.kind {
            FeatureKind::Attribute { ty, .. } | FeatureKind::Reference { ty, .. } => *ty = new_ty,
        }
    }

    pub fn bounds(&self) -> (i32, i32) {
        match self.kind {
            FeatureKind::Attribute { lower, upper, .. }
            | FeatureKind::Reference { lower, upper, .. } => (lower, upper),
        }
    }

    pub fn set_bounds(&mut self, new_lower: i32, new_upper: i32) {
        match &mut self.kind {
            FeatureKind::Attribute { lower, upper, .. }
            | FeatureKind::Reference { lower, upper, .. } => {
                *lower = new_lower;
                *upper = new_upper;
            }
        }
    }

    pub fn is_many(&self) -> bool {
        let (_, upper) = self.bounds();
        upper == UNBOUNDED || upper > 1
    }
}
