//! Link strings and locator arithmetic
//!
//! A link is either same-document (`#fragment`) or names another document
//! (`other.xmi`, `other.xmi#//@x.1`, `http://host/m.ecore#//Person`).
//! Relative document names resolve against the directory of the referring
//! document's own locator.

use std::path::PathBuf;

use emfx_core::errors::ModelError;
use url::Url;

use crate::errors::{invalid_reference, Result};

/// A parsed link string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link<'a> {
    SameDocument(&'a str),
    External { document: &'a str, fragment: &'a str },
}

/// Split a link into document part and fragment
///
/// An absent or empty fragment addresses the first root (`/`).
///
/// # Errors
///
/// `InvalidReference` for an empty link, embedded whitespace, or more than
/// one `#`.
pub fn split_link(link: &str) -> Result<Link<'_>> {
    let link = link.trim();
    if link.is_empty() || link.chars().any(char::is_whitespace) || link.matches('#').count() > 1 {
        return Err(invalid_reference(link));
    }
    Ok(match link.split_once('#') {
        Some(("", fragment)) => Link::SameDocument(or_root(fragment)),
        Some((document, fragment)) => Link::External {
            document,
            fragment: or_root(fragment),
        },
        None => Link::External {
            document: link,
            fragment: "/",
        },
    })
}

fn or_root(fragment: &str) -> &str {
    if fragment.is_empty() {
        "/"
    } else {
        fragment
    }
}

/// Split a link list attribute into individual links
///
/// Type prefixes (`ecore:EDataType` in `"ecore:EDataType other#//T"`) are
/// dropped.
pub fn link_tokens(raw: &str) -> Vec<&str> {
    raw.split_whitespace()
        .filter(|token| !(token.contains(':') && !token.contains('#') && !token.contains('/')))
        .collect()
}

/// Parse a locator that carries a real scheme
///
/// Single-letter schemes are drive letters, not URLs.
fn absolute_url(locator: &str) -> Option<Url> {
    Url::parse(locator).ok().filter(|u| u.scheme().len() > 1)
}

/// Resolve a document reference against the referring document's locator
///
/// Absolute locators with a scheme are returned verbatim.
///
/// # Errors
///
/// `InvalidReference` if URL joining fails.
pub fn resolve_locator(base: &str, reference: &str) -> Result<String> {
    if absolute_url(reference).is_some() {
        return Ok(reference.to_string());
    }
    match absolute_url(base) {
        Some(base_url) if !base_url.cannot_be_a_base() => base_url
            .join(reference)
            .map(String::from)
            .map_err(|_| invalid_reference(reference)),
        _ => Ok(join_plain(base, reference)),
    }
}

/// Shortest link text that resolves back to `target` from `base`
pub fn relativize(base: &str, target: &str) -> String {
    match (absolute_url(base), absolute_url(target)) {
        (Some(b), Some(t)) => b.make_relative(&t).unwrap_or_else(|| target.to_string()),
        (None, None) => {
            let dir = directory_of(base);
            match target.strip_prefix(dir) {
                Some(rest) if !dir.is_empty() && !rest.is_empty() => rest.to_string(),
                _ => target.to_string(),
            }
        }
        _ => target.to_string(),
    }
}

/// Filesystem path behind a locator
///
/// # Errors
///
/// `UnsupportedScheme` for any scheme other than `file`; `InvalidReference`
/// for a `file` URL without a usable path.
pub fn file_path(locator: &str) -> Result<PathBuf> {
    match absolute_url(locator) {
        Some(url) if url.scheme() == "file" => {
            url.to_file_path().map_err(|_| invalid_reference(locator))
        }
        Some(url) => Err(ModelError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
            locator: locator.to_string(),
        }),
        None => Ok(PathBuf::from(locator)),
    }
}

fn directory_of(locator: &str) -> &str {
    match locator.rfind('/') {
        Some(i) => &locator[..=i],
        None => "",
    }
}

fn join_plain(base: &str, reference: &str) -> String {
    if reference.starts_with('/') {
        return normalize(reference);
    }
    normalize(&format!("{}{}", directory_of(base), reference))
}

fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_same_document() {
        assert_eq!(split_link("#//@members.0").unwrap(), Link::SameDocument("//@members.0"));
        assert_eq!(split_link("#a17").unwrap(), Link::SameDocument("a17"));
        assert_eq!(split_link("#").unwrap(), Link::SameDocument("/"));
    }

    #[test]
    fn test_split_external_defaults_fragment() {
        assert_eq!(
            split_link("other.xmi").unwrap(),
            Link::External {
                document: "other.xmi",
                fragment: "/"
            }
        );
        assert_eq!(
            split_link("other.xmi#//@x.1").unwrap(),
            Link::External {
                document: "other.xmi",
                fragment: "//@x.1"
            }
        );
    }

    #[test]
    fn test_malformed_links() {
        for bad in ["", "   ", "a#b#c", "a b#c"] {
            assert!(
                matches!(split_link(bad), Err(ModelError::InvalidReference { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_link_tokens_drop_type_prefix() {
        assert_eq!(
            link_tokens("ecore:EDataType http://www.eclipse.org/emf/2002/Ecore#//EString"),
            vec!["http://www.eclipse.org/emf/2002/Ecore#//EString"]
        );
        assert_eq!(link_tokens("#//A  #//B"), vec!["#//A", "#//B"]);
        assert_eq!(link_tokens("other.ecore"), vec!["other.ecore"]);
    }

    #[test]
    fn test_resolve_relative_plain_paths() {
        assert_eq!(resolve_locator("/dir/base.xmi", "other.xmi").unwrap(), "/dir/other.xmi");
        assert_eq!(resolve_locator("/dir/sub/base.xmi", "../lib/x.ecore").unwrap(), "/dir/lib/x.ecore");
        assert_eq!(resolve_locator("base.xmi", "other.xmi").unwrap(), "other.xmi");
        assert_eq!(resolve_locator("/dir/base.xmi", "/abs/x.xmi").unwrap(), "/abs/x.xmi");
    }

    #[test]
    fn test_resolve_absolute_and_url_bases() {
        assert_eq!(
            resolve_locator("/dir/base.xmi", "http://www.eclipse.org/emf/2002/Ecore").unwrap(),
            "http://www.eclipse.org/emf/2002/Ecore"
        );
        assert_eq!(
            resolve_locator("file:///dir/base.xmi", "other.xmi").unwrap(),
            "file:///dir/other.xmi"
        );
        assert_eq!(resolve_locator("mem:team", "other.xmi").unwrap(), "other.xmi");
    }

    #[test]
    fn test_relativize() {
        assert_eq!(relativize("/dir/base.xmi", "/dir/other.xmi"), "other.xmi");
        assert_eq!(relativize("/dir/base.xmi", "/elsewhere/other.xmi"), "/elsewhere/other.xmi");
        assert_eq!(
            relativize("file:///dir/base.xmi", "file:///dir/other.xmi"),
            "other.xmi"
        );
    }

    #[test]
    fn test_file_path_schemes() {
        assert_eq!(file_path("/m/a.xmi").unwrap(), PathBuf::from("/m/a.xmi"));
        assert!(matches!(
            file_path("https://example.org/a.xmi"),
            Err(ModelError::UnsupportedScheme { .. })
        ));
    }
}
