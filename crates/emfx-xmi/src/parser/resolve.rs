//! Resolution pass
//!
//! Runs once every object of the document exists, so forward and backward
//! links resolve the same way. Same-document links become object
//! references, links into other documents become proxies, and links that
//! match nothing are dropped with a warning (or rejected in strict mode).

use emfx_core::fragment::resolve_fragment;
use emfx_core::metamodel::{Classifier, FeatureKind, FeatureShape, TypeRef};
use emfx_core::{Identifier, UnresolvedReference, Value};

use super::context::{ParseContext, ParseWarning, PendingDescriptor};
use crate::errors::{invalid_reference, Result};
use crate::locator::{resolve_locator, split_link, Link};

/// Where a link points
#[derive(Debug, Clone)]
pub(crate) enum Target {
    Local(Identifier),
    External(UnresolvedReference),
    Dangling,
}

/// Resolve every link recorded by the construction pass
///
/// Supertypes go first so that feature types and cross-references can be
/// checked against complete class hierarchies.
///
/// # Errors
///
/// `InvalidReference` for a malformed link, or for a dangling one when
/// `strict_references` is set.
pub(crate) fn resolve_document(ctx: &mut ParseContext<'_>) -> Result<()> {
    resolve_supertypes(ctx)?;
    resolve_types(ctx)?;
    resolve_opposites(ctx)?;
    resolve_links(ctx)
}

/// Resolve one link string relative to the document being parsed
pub(crate) fn resolve_link(ctx: &ParseContext<'_>, link: &str) -> Result<Target> {
    match split_link(link)? {
        Link::SameDocument(fragment) => Ok(local_target(ctx, fragment)),
        Link::External { document, fragment } => {
            let locator = resolve_locator(ctx.contents.locator(), document)?;
            if locator == ctx.contents.locator() {
                Ok(local_target(ctx, fragment))
            } else {
                Ok(Target::External(UnresolvedReference::new(locator, fragment)))
            }
        }
    }
}

fn local_target(ctx: &ParseContext<'_>, fragment: &str) -> Target {
    match resolve_fragment(&ctx.contents, Some(&ctx.fragments), fragment) {
        Some(id) => Target::Local(id),
        None => Target::Dangling,
    }
}

/// Type reference for a descriptor link; `None` if it names no classifier
fn type_ref(ctx: &ParseContext<'_>, pending: &PendingDescriptor) -> Result<Option<TypeRef>> {
    Ok(match resolve_link(ctx, &pending.link)? {
        Target::Local(id) if ctx.contents.metamodel().classifier(&id).is_some() => {
            Some(TypeRef::Resolved(id))
        }
        Target::External(proxy) => Some(TypeRef::Proxy(proxy)),
        Target::Local(_) | Target::Dangling => {
            tracing::debug!(owner = %pending.owner, link = %pending.link, "descriptor link names no classifier");
            None
        }
    })
}

fn resolve_supertypes(ctx: &mut ParseContext<'_>) -> Result<()> {
    let pending = std::mem::take(&mut ctx.supertypes);
    let mut grouped: Vec<(Identifier, Vec<TypeRef>)> = Vec::new();
    for entry in &pending {
        let resolved = type_ref(ctx, entry)?;
        let slot = match grouped.iter().position(|(class, _)| *class == entry.owner) {
            Some(i) => i,
            None => {
                grouped.push((entry.owner, Vec::new()));
                grouped.len() - 1
            }
        };
        if let Some(ty) = resolved {
            grouped[slot].1.push(ty);
        }
    }

    let metamodel = ctx.contents.metamodel_mut();
    for (class, supertypes) in grouped {
        if let Some(data) = metamodel
            .classifier_mut(&class)
            .and_then(Classifier::class_data_mut)
        {
            data.supertypes = supertypes;
        }
    }
    Ok(())
}

fn resolve_types(ctx: &mut ParseContext<'_>) -> Result<()> {
    let pending = std::mem::take(&mut ctx.types);
    for entry in &pending {
        let resolved = type_ref(ctx, entry)?;
        if let Some(feature) = ctx.contents.metamodel_mut().feature_mut(&entry.owner) {
            feature.set_ty(resolved);
        }
    }
    Ok(())
}

fn resolve_opposites(ctx: &mut ParseContext<'_>) -> Result<()> {
    let pending = std::mem::take(&mut ctx.opposites);
    for entry in &pending {
        let target = match resolve_link(ctx, &entry.link)? {
            Target::Local(id) if ctx.contents.metamodel().feature(&id).is_some() => id,
            Target::External(proxy) => {
                tracing::debug!(feature = %entry.owner, target = %proxy.uri(), "opposite in another document left unset");
                continue;
            }
            _ => continue,
        };
        if let Some(feature) = ctx.contents.metamodel_mut().feature_mut(&entry.owner) {
            if let FeatureKind::Reference { opposite, .. } = &mut feature.kind {
                *opposite = Some(target);
            }
        }
    }
    Ok(())
}

fn resolve_links(ctx: &mut ParseContext<'_>) -> Result<()> {
    let pending = std::mem::take(&mut ctx.links);
    for link in pending {
        let value = match resolve_link(ctx, &link.link)? {
            Target::Local(id) => Value::Object(id),
            Target::External(proxy) => Value::Proxy(proxy),
            Target::Dangling => {
                if ctx.options.strict_references {
                    return Err(invalid_reference(&link.link));
                }
                tracing::warn!(
                    object_id = %link.object,
                    feature = %link.feature,
                    link = %link.link,
                    "dangling reference dropped"
                );
                ctx.warnings.push(ParseWarning {
                    object_id: link.object,
                    feature: link.feature,
                    link: link.link,
                });
                continue;
            }
        };
        let existing = ctx.contents.e_get(&link.object, &link.feature).cloned();
        ctx.contents.set_feature(
            &link.object,
            &link.feature,
            FeatureShape::CrossReference,
            Some(Value::append(existing, value)),
        )?;
    }
    Ok(())
}
