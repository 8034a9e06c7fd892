//! Structural digest of a resource
//!
//! Produces a SHA256 hash of a canonical JSON rendering of the containment
//! trees below a resource's roots. Identifiers never enter the rendering,
//! so two independently built resources with the same shape digest equal.
//!
//! ## Canonical form
//!
//! - objects render as `{class, marker?, features}`, features keyed by name
//! - primitives render as `{kind: text}`, e.g. `{"I64": "1"}`, so a
//!   change of kind with the same document text still changes the digest
//! - contained children are nested in place
//! - non-containment links render as the target's containment path
//! - proxies render as `locator#fragment`

use std::collections::HashSet;

use emfx_core_types::Identifier;
use serde_json::{json, Map, Value as Json};
use sha2::{Digest, Sha256};

use crate::resource::ResourceContents;
use crate::value::Value;

/// Digest of the containment trees of a resource
///
/// Returns a hex-encoded SHA256 digest (64 characters). Objects registered
/// in the table but unreachable from a root do not contribute.
///
/// ```
/// use emfx_core::digest::structural_digest;
/// use emfx_core::ResourceContents;
///
/// let a = ResourceContents::new("mem:a");
/// let b = ResourceContents::new("mem:b");
/// assert_eq!(structural_digest(&a), structural_digest(&b));
/// ```
pub fn structural_digest(contents: &ResourceContents) -> String {
    let mut visited = HashSet::new();
    let roots: Vec<Json> = contents
        .root_ids()
        .iter()
        .map(|id| render_object(contents, id, &mut visited))
        .collect();
    hash_string(&Json::Array(roots).to_string())
}

fn render_object(contents: &ResourceContents, id: &Identifier, visited: &mut HashSet<Identifier>) -> Json {
    if !visited.insert(*id) {
        return json!({ "cycle": contents.fragment_of(id) });
    }
    let Some(object) = contents.object(id) else {
        return Json::Null;
    };
    let metamodel = contents.metamodel();
    let class = metamodel
        .classifier(&object.classifier())
        .map(|c| c.name.clone())
        .unwrap_or_default();

    let mut features = Map::new();
    for feature in metamodel.all_features(&object.classifier()) {
        let Some(value) = object.get(feature) else {
            continue;
        };
        let rendered = render_value(contents, value, feature.is_containment(), visited);
        features.insert(feature.name.clone(), rendered);
    }

    let mut out = Map::new();
    out.insert("class".to_string(), Json::String(class));
    if let Some(marker) = contents.marker_of(id) {
        out.insert("marker".to_string(), Json::String(marker.to_string()));
    }
    out.insert("features".to_string(), Json::Object(features));
    Json::Object(out)
}

fn render_value(
    contents: &ResourceContents,
    value: &Value,
    containment: bool,
    visited: &mut HashSet<Identifier>,
) -> Json {
    match value {
        Value::Many(items) => Json::Array(
            items
                .iter()
                .map(|v| render_value(contents, v, containment, visited))
                .collect(),
        ),
        Value::Object(target) if containment => render_object(contents, target, visited),
        Value::Object(target) => json!({ "ref": contents.fragment_of(target) }),
        Value::Proxy(proxy) => json!({ "proxy": proxy.uri() }),
        primitive => {
            let mut tagged = Map::new();
            tagged.insert(
                primitive.kind_name().to_string(),
                Json::String(primitive.to_literal().unwrap_or_default()),
            );
            Json::Object(tagged)
        }
    }
}

/// Hash a string using SHA256.
fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
