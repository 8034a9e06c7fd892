//! Parser configuration
//!
//! Options are plain data with serde defaults, so a TOML file only needs to
//! name the settings it changes:
//!
//! ```toml
//! strict_references = true
//! supported_versions = ["2.0"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{io_error, options_error, Result};

/// Settings for one `Parser`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Accepted values of the version attribute on the top element
    pub supported_versions: Vec<String>,
    /// Reject documents whose top element carries no version attribute
    pub require_version: bool,
    /// Raise `InvalidReference` for dangling links instead of dropping them
    pub strict_references: bool,
    pub identity_attribute: String,
    pub type_attribute: String,
    pub version_attribute: String,
    /// Attribute of a child element that marks it as a link
    pub link_attribute: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            supported_versions: ["2.0", "2.1", "20110701", "20131001"]
                .iter()
                .map(|v| v.to_string())
                .collect(),
            require_version: false,
            strict_references: false,
            identity_attribute: "xmi:id".to_string(),
            type_attribute: "xsi:type".to_string(),
            version_attribute: "xmi:version".to_string(),
            link_attribute: "href".to_string(),
        }
    }
}

impl ParseOptions {
    /// Parse options from TOML text
    ///
    /// # Errors
    ///
    /// `InvalidOptions` on malformed TOML, unknown keys, or invalid values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: ParseOptions =
            toml::from_str(text).map_err(|e| options_error(format!("TOML parse error: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a TOML file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read; see [`ParseOptions::from_toml_str`].
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| io_error(&path.display().to_string(), e))?;
        Self::from_toml_str(&text)
    }

    /// Check that every control attribute name is set
    ///
    /// # Errors
    ///
    /// `InvalidOptions` naming the first empty setting.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("identity_attribute", &self.identity_attribute),
            ("type_attribute", &self.type_attribute),
            ("version_attribute", &self.version_attribute),
            ("link_attribute", &self.link_attribute),
        ];
        for (setting, value) in names {
            if value.trim().is_empty() {
                return Err(options_error(format!("{} must not be empty", setting)));
            }
        }
        Ok(())
    }

    pub fn accepts_version(&self, marker: &str) -> bool {
        self.supported_versions.iter().any(|v| v == marker)
    }
}
