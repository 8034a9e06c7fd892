//! Same-document fragment and path resolution
//!
//! Fragments address an object inside one document without naming the
//! document:
//!
//! - `//Person`: a classifier fragment, looked up in the parse-time
//!   fragment map (or, after parsing, by name-walking from the first root)
//! - `//@members.0`: a containment path from the first root: take
//!   feature `members`, element 0
//! - `/1/@items`: path from the second root through single-valued `items`
//! - `a17`: a bare identity marker (`xmi:id`)

use std::collections::HashMap;

use emfx_core_types::Identifier;

use crate::resource::ResourceContents;
use crate::value::Value;

/// Resolve a same-document fragment
///
/// Fragments containing `/` go through [`resolve_path`]; bare fragments are
/// looked up first in `fragments`, then in the resource's identity markers.
pub fn resolve_fragment(
    contents: &ResourceContents,
    fragments: Option<&HashMap<String, Identifier>>,
    fragment: &str,
) -> Option<Identifier> {
    if fragment.contains('/') {
        return resolve_path(contents, fragments, fragment);
    }
    fragments
        .and_then(|map| map.get(fragment).copied())
        .or_else(|| contents.object_by_marker(fragment))
}

/// Resolve a containment path relative to the resource's roots
///
/// Returns `None` as soon as any segment fails to resolve.
pub fn resolve_path(
    contents: &ResourceContents,
    fragments: Option<&HashMap<String, Identifier>>,
    path: &str,
) -> Option<Identifier> {
    if let Some(id) = fragments.and_then(|map| map.get(path)) {
        return Some(*id);
    }

    let rest = path.strip_prefix('/')?;
    let mut segments = rest.split('/').peekable();

    let mut current = match segments.peek() {
        Some(first) if first.is_empty() => {
            segments.next();
            *contents.root_ids().first()?
        }
        Some(first) if first.bytes().all(|b| b.is_ascii_digit()) => {
            let index: usize = first.parse().ok()?;
            segments.next();
            *contents.root_ids().get(index)?
        }
        _ => *contents.root_ids().first()?,
    };

    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        current = step(contents, current, segment)?;
    }
    Some(current)
}

fn step(contents: &ResourceContents, from: Identifier, segment: &str) -> Option<Identifier> {
    match segment.strip_prefix('@') {
        Some(feature_segment) => {
            let (name, index) = match feature_segment.rsplit_once('.') {
                Some((name, idx)) if !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()) => {
                    (name, Some(idx.parse::<usize>().ok()?))
                }
                _ => (feature_segment, None),
            };
            let value = contents.e_get(&from, name)?;
            match (value, index) {
                (Value::Object(id), None) => Some(*id),
                (Value::Object(id), Some(0)) => Some(*id),
                (Value::Many(items), Some(i)) => items.get(i)?.as_object(),
                _ => None,
            }
        }
        // Named navigation: the contained child whose `name` matches
        None => contents
            .contents_of(&from)
            .into_iter()
            .find(|child| contents.e_get(child, "name").and_then(Value::as_str) == Some(segment)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::FeatureShape;
    use crate::object::EObject;

    fn team() -> (ResourceContents, Identifier, Vec<Identifier>) {
        let mut contents = ResourceContents::new("/m/team.xmi");
        let team_class = contents.metamodel_mut().get_or_create_classifier("Team", None);
        let member_class = contents.metamodel_mut().get_or_create_classifier("Member", None);
        let team = contents.add(EObject::new(team_class));
        let members: Vec<_> = ["Alice", "Bob", "Carol"]
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
        (contents, team, members)
    }

    #[test]
    fn test_indexed_path() {
        let (contents, _, members) = team();
        assert_eq!(resolve_fragment(&contents, None, "//@members.0"), Some(members[0]));
        assert_eq!(resolve_fragment(&contents, None, "//@members.2"), Some(members[2]));
    }

    #[test]
    fn test_root_paths() {
        let (contents, team, _) = team();
        assert_eq!(resolve_path(&contents, None, "/"), Some(team));
        assert_eq!(resolve_path(&contents, None, "/0"), Some(team));
        assert_eq!(resolve_path(&contents, None, "/1"), None);
    }

    #[test]
    fn test_out_of_range_and_unknown_feature() {
        let (contents, _, _) = team();
        assert_eq!(resolve_fragment(&contents, None, "//@members.3"), None);
        assert_eq!(resolve_fragment(&contents, None, "//@nothing.0"), None);
        assert_eq!(resolve_fragment(&contents, None, "//@members"), None);
    }

    #[test]
    fn test_named_navigation() {
        let (contents, _, members) = team();
        assert_eq!(resolve_fragment(&contents, None, "//Bob"), Some(members[1]));
    }

    #[test]
    fn test_fragment_map_wins() {
        let (contents, team, _) = team();
        let mut map = HashMap::new();
        map.insert("//Person".to_string(), team);
        assert_eq!(resolve_fragment(&contents, Some(&map), "//Person"), Some(team));
    }

    #[test]
    fn test_bare_marker() {
        let (mut contents, _, members) = team();
        contents.assign_marker(members[1], "bob");
        assert_eq!(resolve_fragment(&contents, None, "bob"), Some(members[1]));
        assert_eq!(resolve_fragment(&contents, None, "nobody"), None);
    }

    #[test]
    fn test_path_round_trips_fragment_of() {
        let (contents, _, members) = team();
        for member in &members {
            let path = contents.fragment_of(member).unwrap();
            assert_eq!(resolve_path(&contents, None, &path), Some(*member));
        }
    }
}
