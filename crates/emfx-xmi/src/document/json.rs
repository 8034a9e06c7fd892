//! JSON syntax for the document tree
//!
//! The JSON form is the serde rendering of [`Element`]: `tag`, `attributes`
//! as `[name, value]` pairs, `children`, and optional `text`.

use super::Element;
use crate::errors::{json_error, Result};

/// Read an element tree from its JSON form
///
/// # Errors
///
/// `Json` if the text is not a valid element tree.
pub fn read_json(text: &str) -> Result<Element> {
    serde_json::from_str(text).map_err(json_error)
}

/// Write an element tree as pretty-printed JSON
///
/// # Errors
///
/// `Json` if serialization fails.
pub fn write_json(root: &Element) -> Result<String> {
    serde_json::to_string_pretty(root).map_err(json_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emfx_core::errors::ModelError;

    #[test]
    fn test_json_shape() {
        let tree = Element::new("Team").with_attr("name", "Engineering");
        let text = write_json(&tree).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["tag"], "Team");
        assert_eq!(raw["attributes"][0][1], "Engineering");
        assert!(raw.get("children").is_none());
        assert_eq!(read_json(&text).unwrap(), tree);
    }

    #[test]
    fn test_missing_tag_is_rejected() {
        let err = read_json(r##"{"attributes": []}"##).unwrap_err();
        assert!(matches!(err, ModelError::Json { .. }));
    }
}
