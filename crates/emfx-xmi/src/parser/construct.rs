//! Construction pass
//!
//! Walks the element tree depth-first, registering one object per element.
//! Metamodel elements additionally produce typed descriptors sharing the
//! object's identifier. Links are only recorded here; nothing is resolved
//! until every object of the document exists.

use emfx_core::errors::ModelError;
use emfx_core::metamodel::{
    ClassData, Classifier, ClassifierKind, EnumLiteral, Feature, FeatureKind, FeatureShape, Package,
    TypeRef,
};
use emfx_core::{infer_value, EObject, Identifier, Value};

use super::context::{ParseContext, PendingDescriptor, PendingLink};
use crate::document::{split_qualified, Element};
use crate::errors::{invalid_document, Result};
use crate::locator::link_tokens;

pub(crate) const ECORE_PREFIX: &str = "ecore";
pub(crate) const ECORE_NS_URI: &str = "http://www.eclipse.org/emf/2002/Ecore";
pub(crate) const XMI_NS_URI: &str = "http://www.omg.org/XMI";
pub(crate) const XSI_NS_URI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Descriptor attributes that hold links rather than literals
pub(crate) const DESCRIPTOR_LINKS: [&str; 3] = ["eType", "eSuperTypes", "eOpposite"];

/// Ecore kinds kept as plain reflective objects
const GENERIC_ECORE_KINDS: [&str; 7] = [
    "EAnnotation",
    "EStringToStringMapEntry",
    "EOperation",
    "EParameter",
    "EGenericType",
    "ETypeParameter",
    "EObject",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementKind {
    Package,
    Class,
    Enum,
    EnumLiteral,
    DataType,
    Attribute,
    Reference,
    Instance,
}

impl ElementKind {
    fn from_ecore_name(name: &str) -> Option<Self> {
        Some(match name {
            "EPackage" => ElementKind::Package,
            "EClass" => ElementKind::Class,
            "EEnum" => ElementKind::Enum,
            "EEnumLiteral" => ElementKind::EnumLiteral,
            "EDataType" => ElementKind::DataType,
            "EAttribute" => ElementKind::Attribute,
            "EReference" => ElementKind::Reference,
            _ => return None,
        })
    }

    /// True for elements that produce a typed descriptor
    pub fn is_descriptor(self) -> bool {
        self != ElementKind::Instance
    }
}

/// Position of an element in the metamodel tree
#[derive(Debug, Clone, Copy)]
enum Owner {
    Document,
    Package(Identifier),
    Class(Identifier),
    Enum(Identifier),
    Other,
}

/// Outcome of dispatching an element
struct Dispatch<'e> {
    kind: ElementKind,
    class_name: &'e str,
    prefix: Option<&'e str>,
}

/// Build every object of a document and mark the top-level ones as roots
///
/// # Errors
///
/// `UnsupportedVersion`, `MissingRequiredAttribute`, `UnknownElement` or
/// `InvalidDocument`; the context is left half-built and must be dropped.
pub(crate) fn construct_document(ctx: &mut ParseContext<'_>, root: &Element) -> Result<()> {
    check_version(ctx, root)?;
    declare_namespaces(ctx, root);

    let tops: Vec<&Element> = if is_xmi_wrapper(ctx, root) {
        root.children.iter().collect()
    } else {
        vec![root]
    };
    for top in tops {
        let id = construct(ctx, top, Owner::Document)?;
        ctx.contents.mark_root(id)?;
    }
    Ok(())
}

fn check_version(ctx: &ParseContext<'_>, root: &Element) -> Result<()> {
    let attribute = &ctx.options.version_attribute;
    match root.attr(attribute) {
        Some(marker) if !ctx.options.accepts_version(marker.trim()) => {
            Err(ModelError::UnsupportedVersion {
                marker: marker.to_string(),
            })
        }
        Some(_) => Ok(()),
        None if ctx.options.require_version => Err(ModelError::MissingRequiredAttribute {
            name: attribute.clone(),
        }),
        None => Ok(()),
    }
}

fn declare_namespaces(ctx: &mut ParseContext<'_>, element: &Element) {
    for (name, uri) in &element.attributes {
        if name == "xmlns" {
            ctx.contents.declare_namespace("", uri.as_str());
        } else if let Some(prefix) = name.strip_prefix("xmlns:") {
            ctx.contents.declare_namespace(prefix, uri.as_str());
        }
    }
}

fn is_xmi_wrapper(ctx: &ParseContext<'_>, element: &Element) -> bool {
    element.local_name() == "XMI"
        && element.prefix().is_some_and(|p| {
            p == "xmi"
                || ctx
                    .contents
                    .namespace_uri(p)
                    .is_some_and(|uri| uri.starts_with("http://www.omg.org/"))
        })
}

fn is_ecore_prefix(ctx: &ParseContext<'_>, prefix: Option<&str>) -> bool {
    match prefix {
        Some(p) => p == ECORE_PREFIX || ctx.contents.namespace_uri(p) == Some(ECORE_NS_URI),
        None => false,
    }
}

/// Decide which constructor handles an element
///
/// The type attribute wins over the tag. Tags `eLiterals` and
/// `eSubpackages` imply their kind when no type attribute is present.
fn classify<'e>(ctx: &ParseContext<'_>, element: &'e Element) -> Result<Dispatch<'e>> {
    let discriminator = element.attr(&ctx.options.type_attribute).map(str::trim);
    let (prefix, local) = match discriminator {
        Some("") => {
            return Err(ModelError::UnknownElement {
                tag: element.tag.clone(),
            })
        }
        Some(ty) => split_qualified(ty),
        None => match element.local_name() {
            "eLiterals" => (Some(ECORE_PREFIX), "EEnumLiteral"),
            "eSubpackages" => (Some(ECORE_PREFIX), "EPackage"),
            _ => (element.prefix(), element.local_name()),
        },
    };

    if is_ecore_prefix(ctx, prefix) {
        if let Some(kind) = ElementKind::from_ecore_name(local) {
            return Ok(Dispatch {
                kind,
                class_name: local,
                prefix,
            });
        }
        if GENERIC_ECORE_KINDS.contains(&local) {
            return Ok(Dispatch {
                kind: ElementKind::Instance,
                class_name: local,
                prefix,
            });
        }
        return Err(ModelError::UnknownElement {
            tag: discriminator.unwrap_or(&element.tag).to_string(),
        });
    }

    if local.is_empty() {
        return Err(ModelError::UnknownElement {
            tag: element.tag.clone(),
        });
    }
    Ok(Dispatch {
        kind: ElementKind::Instance,
        class_name: local,
        prefix,
    })
}

/// Build one element and its subtree; returns the new object's id
///
/// The object is registered table-only. Whether it is a root is decided by
/// the caller.
fn construct(ctx: &mut ParseContext<'_>, element: &Element, owner: Owner) -> Result<Identifier> {
    declare_namespaces(ctx, element);
    let dispatch = classify(ctx, element)?;

    let id = Identifier::new();
    let classifier = ctx
        .contents
        .metamodel_mut()
        .get_or_create_classifier(dispatch.class_name, dispatch.prefix);
    ctx.contents.register(EObject::with_id(id, classifier));
    if let Some(marker) = element.attr(&ctx.options.identity_attribute) {
        ctx.contents.assign_marker(id, marker);
    }

    let child_owner = match dispatch.kind {
        ElementKind::Package => {
            build_package(ctx, id, element, owner)?;
            Owner::Package(id)
        }
        ElementKind::Class => {
            let name = required(element, "name")?;
            let data = ClassData {
                is_abstract: flag(element, "abstract"),
                is_interface: flag(element, "interface"),
                ..ClassData::default()
            };
            define_classifier(ctx, owner, Classifier::class(id, name, data));
            Owner::Class(id)
        }
        ElementKind::Enum => {
            let name = required(element, "name")?;
            define_classifier(ctx, owner, Classifier::enumeration(id, name));
            Owner::Enum(id)
        }
        ElementKind::DataType => {
            let name = required(element, "name")?;
            let instance_type = element.attr("instanceClassName").map(str::to_string);
            define_classifier(ctx, owner, Classifier::primitive(id, name, instance_type));
            Owner::Other
        }
        ElementKind::EnumLiteral => {
            build_literal(ctx, id, element, owner)?;
            Owner::Other
        }
        ElementKind::Attribute | ElementKind::Reference => {
            build_feature(ctx, id, element, owner, dispatch.kind)?;
            Owner::Other
        }
        ElementKind::Instance => Owner::Other,
    };

    for (name, raw) in &element.attributes {
        if ctx.is_control_attribute(name) {
            continue;
        }
        if dispatch.kind.is_descriptor() && DESCRIPTOR_LINKS.contains(&name.as_str()) {
            for link in link_tokens(raw) {
                record_link(ctx, dispatch.kind, id, name, link);
            }
            continue;
        }
        ctx.contents
            .set_feature(&id, name, FeatureShape::Attribute, Some(infer_value(raw)))?;
    }

    let mut literals: Vec<(String, Vec<Value>)> = Vec::new();
    let mut contained: Vec<(String, Vec<Value>)> = Vec::new();
    for child in &element.children {
        let feature = child.local_name().to_string();
        if let Some(link) = child.attr(&ctx.options.link_attribute) {
            record_link(ctx, dispatch.kind, id, &feature, link.trim());
            continue;
        }
        if child.attributes.is_empty() && child.children.is_empty() {
            if let Some(text) = &child.text {
                push_grouped(&mut literals, feature, infer_value(text));
                continue;
            }
        }
        let child_id = construct(ctx, child, child_owner)?;
        push_grouped(&mut contained, feature, Value::Object(child_id));
    }

    for (feature, values) in literals {
        ctx.contents
            .set_feature(&id, &feature, FeatureShape::Attribute, Value::from_items(values))?;
    }
    for (feature, children) in contained {
        ctx.contents
            .set_feature(&id, &feature, FeatureShape::Containment, Value::from_items(children))?;
    }
    Ok(id)
}

fn push_grouped(groups: &mut Vec<(String, Vec<Value>)>, feature: String, value: Value) {
    match groups.iter_mut().find(|(name, _)| *name == feature) {
        Some((_, values)) => values.push(value),
        None => groups.push((feature, vec![value])),
    }
}

fn required<'e>(element: &'e Element, name: &str) -> Result<&'e str> {
    element
        .attr(name)
        .ok_or_else(|| ModelError::MissingRequiredAttribute {
            name: name.to_string(),
        })
}

fn flag(element: &Element, name: &str) -> bool {
    element
        .attr(name)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn int_attr(element: &Element, name: &str) -> Option<i32> {
    element.attr(name).and_then(|v| v.trim().parse().ok())
}

/// Record the fragment path of a named metamodel element
fn register_path(ctx: &mut ParseContext<'_>, owner: Owner, id: Identifier, name: &str) {
    let parent = match owner {
        Owner::Package(p) | Owner::Class(p) | Owner::Enum(p) => {
            ctx.paths.get(&p).cloned().unwrap_or_else(|| "/".to_string())
        }
        Owner::Document | Owner::Other => "/".to_string(),
    };
    let path = format!("{}/{}", parent, name);
    ctx.fragments.entry(path.clone()).or_insert(id);
    ctx.paths.insert(id, path);
}

fn build_package(ctx: &mut ParseContext<'_>, id: Identifier, element: &Element, owner: Owner) -> Result<()> {
    let name = required(element, "name")?;
    let ns_uri = required(element, "nsURI")?;
    let ns_prefix = required(element, "nsPrefix")?;

    let metamodel = ctx.contents.metamodel_mut();
    metamodel.define_package(Package::new(id, name, ns_uri, ns_prefix));
    match owner {
        Owner::Package(parent) => {
            if let Some(parent) = metamodel.package_mut(&parent) {
                parent.subpackages.push(id);
            }
            register_path(ctx, owner, id, name);
        }
        _ => {
            // becomes the next root once constructed
            let path = match ctx.contents.root_ids().len() {
                0 => "/".to_string(),
                index => format!("/{}", index),
            };
            ctx.paths.insert(id, path);
        }
    }
    Ok(())
}

fn define_classifier(ctx: &mut ParseContext<'_>, owner: Owner, mut classifier: Classifier) {
    let id = classifier.id;
    let name = classifier.name.clone();
    let metamodel = ctx.contents.metamodel_mut();
    if let Owner::Package(package) = owner {
        if let Some(package) = metamodel.package_mut(&package) {
            package.classifiers.push(id);
            classifier.ns_prefix = Some(package.ns_prefix.clone());
        }
    }
    metamodel.define_classifier(classifier);
    register_path(ctx, owner, id, &name);
}

fn build_literal(ctx: &mut ParseContext<'_>, id: Identifier, element: &Element, owner: Owner) -> Result<()> {
    let name = required(element, "name")?;
    let Owner::Enum(enum_id) = owner else {
        tracing::debug!(literal = name, "enum literal outside an enum kept as object only");
        return Ok(());
    };
    if let Some(classifier) = ctx.contents.metamodel_mut().classifier_mut(&enum_id) {
        if let ClassifierKind::Enum { literals } = &mut classifier.kind {
            let ordinal = literals.len();
            literals.push(EnumLiteral::new(
                id,
                name,
                ordinal,
                int_attr(element, "value"),
                element.attr("literal").map(str::to_string),
            ));
        }
    }
    register_path(ctx, owner, id, name);
    Ok(())
}

fn build_feature(
    ctx: &mut ParseContext<'_>,
    id: Identifier,
    element: &Element,
    owner: Owner,
    kind: ElementKind,
) -> Result<()> {
    let name = required(element, "name")?;
    let Owner::Class(class_id) = owner else {
        return Err(invalid_document(format!("feature '{}' declared outside a class", name)));
    };
    let lower = int_attr(element, "lowerBound").unwrap_or(0);
    let upper = int_attr(element, "upperBound").unwrap_or(1);
    let kind = if kind == ElementKind::Attribute {
        FeatureKind::Attribute {
            ty: None,
            lower,
            upper,
            default_literal: element.attr("defaultValueLiteral").map(str::to_string),
        }
    } else {
        FeatureKind::Reference {
            ty: None,
            lower,
            upper,
            containment: flag(element, "containment"),
            opposite: None,
        }
    };
    ctx.contents.metamodel_mut().add_feature(
        &class_id,
        Feature {
            id,
            name: name.to_string(),
            kind,
        },
    )?;
    register_path(ctx, owner, id, name);
    Ok(())
}

/// Queue a link for the resolution pass
///
/// Descriptor links are queued twice: once for the mirror object's feature
/// and once for the typed descriptor, which holds a pending marker until
/// resolution.
fn record_link(ctx: &mut ParseContext<'_>, kind: ElementKind, id: Identifier, feature: &str, link: &str) {
    ctx.links.push(PendingLink {
        object: id,
        feature: feature.to_string(),
        link: link.to_string(),
    });

    let pending = PendingDescriptor {
        owner: id,
        link: link.to_string(),
    };
    match (kind, feature) {
        (ElementKind::Attribute | ElementKind::Reference, "eType") => {
            if let Some(descriptor) = ctx.contents.metamodel_mut().feature_mut(&id) {
                descriptor.set_ty(Some(TypeRef::Pending(link.to_string())));
            }
            ctx.types.push(pending);
        }
        (ElementKind::Class, "eSuperTypes") => {
            if let Some(data) = ctx
                .contents
                .metamodel_mut()
                .classifier_mut(&id)
                .and_then(Classifier::class_data_mut)
            {
                data.supertypes.push(TypeRef::Pending(link.to_string()));
            }
            ctx.supertypes.push(pending);
        }
        (ElementKind::Reference, "eOpposite") => ctx.opposites.push(pending),
        _ => {}
    }
}
