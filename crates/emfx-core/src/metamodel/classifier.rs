use emfx_core_types::Identifier;

use super::feature::{Feature, TypeRef};

/// One value of an enumeration
#[derive(Debug, Clone, PartialEq)]
pub struct EnumLiteral {
    pub id: Identifier,
    pub name: String,
    pub value: i32,
    pub literal: String,
}

impl EnumLiteral {
    /// Literal with `value` defaulting to `ordinal` and display text to `name`
    pub fn new(
        id: Identifier,
        name: impl Into<String>,
        ordinal: usize,
        value: Option<i32>,
        literal: Option<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id,
            value: value.unwrap_or(ordinal as i32),
            literal: literal.unwrap_or_else(|| name.clone()),
            name,
        }
    }
}

/// Class-specific descriptor data
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassData {
    pub is_abstract: bool,
    pub is_interface: bool,
    pub features: Vec<Feature>,
    pub supertypes: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierKind {
    Class(ClassData),
    PrimitiveType { instance_type_name: Option<String> },
    Enum { literals: Vec<EnumLiteral> },
}

/// A type descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    pub id: Identifier,
    pub name: String,
    /// Namespace prefix the classifier was first seen under, if any
    pub ns_prefix: Option<String>,
    /// Synthesized for an unseen instance tag rather than declared
    pub placeholder: bool,
    pub kind: ClassifierKind,
}

impl Classifier {
    pub fn class(id: Identifier, name: impl Into<String>, data: ClassData) -> Self {
        Self {
            id,
            name: name.into(),
            ns_prefix: None,
            placeholder: false,
            kind: ClassifierKind::Class(data),
        }
    }

    pub fn primitive(id: Identifier, name: impl Into<String>, instance_type_name: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ns_prefix: None,
            placeholder: false,
            kind: ClassifierKind::PrimitiveType { instance_type_name },
        }
    }

    pub fn enumeration(id: Identifier, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ns_prefix: None,
            placeholder: false,
            kind: ClassifierKind::Enum {
                literals: Vec::new(),
            },
        }
    }

    /// Schema-less class synthesized for an unseen tag
    pub fn placeholder(name: impl Into<String>, ns_prefix: Option<String>) -> Self {
        Self {
            id: Identifier::new(),
            name: name.into(),
            ns_prefix,
            placeholder: true,
            kind: ClassifierKind::Class(ClassData::default()),
        }
    }

    pub fn class_data(&self) -> Option<&ClassData> {
        match &self.kind {
            ClassifierKind::Class(data) => Some(data),
            _ => None,
        }
    }

    pub fn class_data_mut(&mut self) -> Option<&mut ClassData> {
        match &mut self.kind {
            ClassifierKind::Class(data) => Some(data),
            _ => None,
        }
    }

    /// Own features only; see `Metamodel::all_features` for inherited ones
    pub fn features(&self) -> &[Feature] {
        self.class_data().map(|d| d.features.as_slice()).unwrap_or(&[])
    }

    pub fn literals(&self) -> &[EnumLiteral] {
        match &self.kind {
            ClassifierKind::Enum { literals } => literals,
            _ => &[],
        }
    }

    pub fn literal_named(&self, name: &str) -> Option<&EnumLiteral> {
        self.literals().iter().find(|l| l.name == name)
    }
}
