//! Resource serialization
//!
//! Writes a resource back into the element tree the parser reads, so that
//! `parse(serialize(r))` rebuilds the same structure:
//!
//! - a single root becomes the top element; several roots are wrapped in
//!   `xmi:XMI`
//! - single primitives become attributes, many-valued primitives become
//!   text children
//! - contained objects become child elements named after their feature,
//!   with `xsi:type` when the class differs from the tag
//! - links become `<feature href="..."/>` children; on metamodel objects
//!   `eType`, `eSuperTypes` and `eOpposite` stay space-separated attributes
//!
//! Output always uses the standard `xmi:id`, `xsi:type`, `xmi:version` and
//! `href` attribute names.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use emfx_core::{log_op_end, log_op_start};
use emfx_core::{Identifier, Resource, ResourceContents, ResourceSet, Value};

use crate::document::json::write_json;
use crate::document::xml::write_xml;
use crate::document::Element;
use crate::errors::Result;
use crate::locator::relativize;
use crate::parser::{DESCRIPTOR_LINKS, ECORE_NS_URI, ECORE_PREFIX, XMI_NS_URI, XSI_NS_URI};

const XMI_VERSION: &str = "2.0";

/// Build the element tree of a resource
///
/// Links to objects outside the resource are dropped with a warning; use
/// [`serialize_resource`] with a `ResourceSet` to keep them.
pub fn serialize(contents: &ResourceContents) -> Element {
    Emitter::new(contents, HashMap::new()).document()
}

/// Build the element tree of a shared resource
///
/// Objects of other resources in `set` are written as links into their
/// documents, relative to this resource's locator where possible.
pub async fn serialize_resource(resource: &Resource, set: Option<&ResourceSet>) -> Element {
    let start = Instant::now();
    log_op_start!("serialize", locator = resource.locator());

    let foreign = match set {
        Some(set) => foreign_links(resource, set).await,
        None => HashMap::new(),
    };
    let contents = resource.read().await;
    let tree = Emitter::new(&*contents, foreign).document();

    log_op_end!(
        "serialize",
        duration_ms = start.elapsed().as_millis() as u64,
        locator = resource.locator(),
        object_count = contents.count() as u64
    );
    tree
}

/// Serialize a resource as XMI text
///
/// # Errors
///
/// `Xml` if writing fails.
pub fn to_xmi_string(contents: &ResourceContents) -> Result<String> {
    write_xml(&serialize(contents))
}

/// Serialize a resource as the JSON form of its element tree
///
/// # Errors
///
/// `Json` if writing fails.
pub fn to_json_string(contents: &ResourceContents) -> Result<String> {
    write_json(&serialize(contents))
}

/// Link text for every object referenced from `resource` but owned by
/// another resource of `set`
async fn foreign_links(resource: &Resource, set: &ResourceSet) -> HashMap<Identifier, String> {
    let targets: Vec<Identifier> = {
        let contents = resource.read().await;
        let mut found = Vec::new();
        for object in contents.objects() {
            for feature_id in object.set_features() {
                if let Some(value) = object.get_by_id(feature_id) {
                    found.extend(
                        value
                            .object_ids()
                            .into_iter()
                            .filter(|id| !contents.contains(id)),
                    );
                }
            }
        }
        found
    };

    let mut links = HashMap::new();
    for target in targets {
        if links.contains_key(&target) {
            continue;
        }
        let Some(owner) = set.locate(&target).await else {
            continue;
        };
        let owner_contents = owner.read().await;
        let fragment = owner_contents
            .marker_of(&target)
            .map(str::to_string)
            .or_else(|| owner_contents.fragment_of(&target));
        if let Some(fragment) = fragment {
            let document = relativize(resource.locator(), owner.locator());
            links.insert(target, format!("{}#{}", document, fragment));
        }
    }
    links
}

struct Emitter<'c> {
    contents: &'c ResourceContents,
    foreign: HashMap<Identifier, String>,
    visited: HashSet<Identifier>,
    uses_xsi: bool,
    prefixes: HashSet<String>,
}

impl<'c> Emitter<'c> {
    fn new(contents: &'c ResourceContents, foreign: HashMap<Identifier, String>) -> Self {
        Self {
            contents,
            foreign,
            visited: HashSet::new(),
            uses_xsi: false,
            prefixes: HashSet::new(),
        }
    }

    fn document(mut self) -> Element {
        let contents = self.contents;
        let roots: Vec<Element> = contents
            .root_ids()
            .iter()
            .filter_map(|id| {
                let tag = self.qualified_name(id);
                self.object(*id, &tag)
            })
            .collect();

        let mut top = match <[Element; 1]>::try_from(roots) {
            Ok([root]) => root,
            Err(roots) => {
                let mut wrapper = Element::new("xmi:XMI");
                wrapper.children = roots;
                wrapper
            }
        };

        let mut header = vec![("xmi:version".to_string(), XMI_VERSION.to_string())];
        header.extend(self.namespace_declarations());
        header.append(&mut top.attributes);
        top.attributes = header;
        top
    }

    /// Declared namespaces plus the ones the output needs
    fn namespace_declarations(&self) -> Vec<(String, String)> {
        let mut declared: Vec<(String, String)> = self.contents.namespaces().to_vec();
        let mut ensure = |prefix: &str, uri: &str| {
            if !declared.iter().any(|(p, _)| p == prefix) {
                declared.push((prefix.to_string(), uri.to_string()));
            }
        };
        ensure("xmi", XMI_NS_URI);
        if self.uses_xsi {
            ensure("xsi", XSI_NS_URI);
        }
        if self.prefixes.contains(ECORE_PREFIX) {
            ensure(ECORE_PREFIX, ECORE_NS_URI);
        }
        declared
            .into_iter()
            .map(|(prefix, uri)| {
                let name = if prefix.is_empty() {
                    "xmlns".to_string()
                } else {
                    format!("xmlns:{}", prefix)
                };
                (name, uri)
            })
            .collect()
    }

    fn qualified_name(&mut self, id: &Identifier) -> String {
        let classifier = self
            .contents
            .object(id)
            .and_then(|o| self.contents.metamodel().classifier(&o.classifier()));
        match classifier {
            Some(c) => match &c.ns_prefix {
                Some(prefix) => {
                    self.prefixes.insert(prefix.clone());
                    format!("{}:{}", prefix, c.name)
                }
                None => c.name.clone(),
            },
            None => "EObject".to_string(),
        }
    }

    fn is_metamodel_object(&self, id: &Identifier) -> bool {
        self.contents
            .object(id)
            .and_then(|o| self.contents.metamodel().classifier(&o.classifier()))
            .is_some_and(|c| c.ns_prefix.as_deref() == Some(ECORE_PREFIX))
    }

    fn object(&mut self, id: Identifier, tag: &str) -> Option<Element> {
        if !self.visited.insert(id) {
            tracing::warn!(object_id = %id, "containment cycle; object written once");
            return None;
        }
        let contents = self.contents;
        let object = contents.object(&id)?;
        let mut element = Element::new(tag);

        let qualified = self.qualified_name(&id);
        if qualified != tag {
            self.uses_xsi = true;
            element.attributes.push(("xsi:type".to_string(), qualified));
        }
        if let Some(marker) = contents.marker_of(&id) {
            element
                .attributes
                .push(("xmi:id".to_string(), marker.to_string()));
        }

        let descriptor = self.is_metamodel_object(&id);
        for feature in contents.metamodel().all_features(&object.classifier()) {
            let Some(value) = object.get(feature) else {
                continue;
            };
            let name = feature.name.as_str();

            if feature.is_containment() {
                for child in value.object_ids() {
                    if let Some(child) = self.object(child, name) {
                        element.children.push(child);
                    }
                }
                continue;
            }

            if holds_links(value) {
                let links: Vec<String> = value
                    .items()
                    .iter()
                    .filter_map(|item| self.link(&id, name, item))
                    .collect();
                if descriptor && DESCRIPTOR_LINKS.contains(&name) {
                    if !links.is_empty() {
                        element.attributes.push((name.to_string(), links.join(" ")));
                    }
                } else {
                    for link in links {
                        element
                            .children
                            .push(Element::new(name).with_attr("href", link));
                    }
                }
                continue;
            }

            match value {
                Value::Many(items) => {
                    for literal in items.iter().filter_map(Value::to_literal) {
                        element.children.push(Element::new(name).with_text(literal));
                    }
                }
                single => {
                    if let Some(literal) = single.to_literal() {
                        element.attributes.push((name.to_string(), literal));
                    }
                }
            }
        }
        Some(element)
    }

    /// Link text for one reference value
    fn link(&self, owner: &Identifier, feature: &str, value: &Value) -> Option<String> {
        match value {
            Value::Proxy(proxy) => Some(format!(
                "{}#{}",
                relativize(self.contents.locator(), proxy.locator()),
                proxy.fragment()
            )),
            Value::Object(target) if self.contents.contains(target) => {
                let fragment = self
                    .contents
                    .marker_of(target)
                    .map(str::to_string)
                    .or_else(|| self.contents.fragment_of(target));
                if fragment.is_none() {
                    tracing::warn!(object_id = %owner, feature, target = %target, "link target not reachable from a root; dropped");
                }
                fragment.map(|f| format!("#{}", f))
            }
            Value::Object(target) => {
                let link = self.foreign.get(target).cloned();
                if link.is_none() {
                    tracing::warn!(object_id = %owner, feature, target = %target, "link target outside the resource; dropped");
                }
                link
            }
            _ => None,
        }
    }
}

fn holds_links(value: &Value) -> bool {
    value
        .items()
        .first()
        .is_some_and(|v| matches!(v, Value::Object(_) | Value::Proxy(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use emfx_core::metamodel::FeatureShape;
    use emfx_core::EObject;

    fn team() -> (ResourceContents, Identifier, Vec<Identifier>) {
        let mut contents = ResourceContents::new("/models/team.xmi");
        let team_class = contents
            .metamodel_mut()
            .get_or_create_classifier("Team", Some("team"));
        let member_class = contents.metamodel_mut().get_or_create_classifier("Member", None);
        contents.declare_namespace("team", "http://example.org/team");

        let team = contents.add(EObject::new(team_class));
        contents
            .e_set(&team, "name", Some(Value::from("Engineering")))
            .unwrap();
        let members: Vec<Identifier> = ["Alice", "Bob"]
            .iter()
            .map(|name| {
                let id = contents.register(EObject::new(member_class));
                contents.e_set(&id, "name", Some(Value::from(*name))).unwrap();
                id
            })
            .collect();
        contents
            .set_feature(
                &team,
                "members",
                FeatureShape::Containment,
                Value::from_items(members.iter().copied().map(Value::Object).collect()),
            )
            .unwrap();
        contents
            .e_set(&team, "lead", Some(Value::Object(members[1])))
            .unwrap();
        (contents, team, members)
    }

    #[test]
    fn test_single_root_is_top_element() {
        let (contents, _, _) = team();
        let tree = serialize(&contents);

        assert_eq!(tree.tag, "team:Team");
        assert_eq!(tree.attr("xmi:version"), Some("2.0"));
        assert_eq!(tree.attr("xmlns:team"), Some("http://example.org/team"));
        assert_eq!(tree.attr("xmlns:xsi"), Some(XSI_NS_URI));
        assert_eq!(tree.attr("name"), Some("Engineering"));

        let members: Vec<&Element> = tree.children.iter().filter(|c| c.tag == "members").collect();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].attr("xsi:type"), Some("Member"));

        let lead = tree.children.iter().find(|c| c.tag == "lead").unwrap();
        assert_eq!(lead.attr("href"), Some("#//@members.1"));
    }

    #[test]
    fn test_markers_win_over_paths() {
        let (mut contents, _, members) = team();
        contents.assign_marker(members[1], "bob");
        let tree = serialize(&contents);
        let lead = tree.children.iter().find(|c| c.tag == "lead").unwrap();
        assert_eq!(lead.attr("href"), Some("#bob"));
    }

    #[test]
    fn test_several_roots_are_wrapped() {
        let mut contents = ResourceContents::new("mem:two");
        let class = contents.metamodel_mut().get_or_create_classifier("Note", None);
        contents.add(EObject::new(class));
        contents.add(EObject::new(class));

        let tree = serialize(&contents);
        assert_eq!(tree.tag, "xmi:XMI");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.attr("xmlns:xmi"), Some(XMI_NS_URI));
    }

    #[test]
    fn test_proxy_links_are_relative() {
        let (mut contents, team, _) = team();
        contents
            .e_set(
                &team,
                "partner",
                Some(Value::Proxy(emfx_core::UnresolvedReference::new(
                    "/models/other.xmi",
                    "//@x.1",
                ))),
            )
            .unwrap();
        let tree = serialize(&contents);
        let partner = tree.children.iter().find(|c| c.tag == "partner").unwrap();
        assert_eq!(partner.attr("href"), Some("other.xmi#//@x.1"));
    }
}
