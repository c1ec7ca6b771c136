use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "arbor.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Functional components resolved in a row before giving up
    #[serde(default = "default_max_functional_depth")]
    pub max_functional_depth: usize,

    /// Attribute renames applied before a value reaches the tree
    #[serde(default = "default_attribute_aliases")]
    pub attribute_aliases: BTreeMap<String, String>,

    /// Style properties whose numeric values are written without `px`
    #[serde(default = "default_unitless_style_properties")]
    pub unitless_style_properties: BTreeSet<String>,
}

fn default_max_functional_depth() -> usize {
    256
}

fn default_attribute_aliases() -> BTreeMap<String, String> {
    [("className", "class"), ("htmlFor", "for")]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

fn default_unitless_style_properties() -> BTreeSet<String> {
    [
        "animationIterationCount",
        "columnCount",
        "fillOpacity",
        "flex",
        "flexGrow",
        "flexShrink",
        "fontWeight",
        "lineClamp",
        "lineHeight",
        "opacity",
        "order",
        "orphans",
        "strokeOpacity",
        "widows",
        "zIndex",
        "zoom",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl EngineConfig {
    /// Load config from a directory, falling back to defaults when the file is absent
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
                path: config_path.display().to_string(),
                source,
            })?;
            Self::from_json(&content)
        } else {
            Ok(EngineConfig::default())
        }
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Attribute name after alias resolution
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.attribute_aliases
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }

    pub fn is_unitless(&self, property: &str) -> bool {
        self.unitless_style_properties.contains(property)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_functional_depth: default_max_functional_depth(),
            attribute_aliases: default_attribute_aliases(),
            unitless_style_properties: default_unitless_style_properties(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "maxFunctionalDepth": 8,
            "attributeAliases": { "className": "class", "tabIndex": "tabindex" }
        }"#;

        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.max_functional_depth, 8);
        assert_eq!(config.resolve_alias("tabIndex"), "tabindex");
        assert_eq!(config.resolve_alias("htmlFor"), "htmlFor");
        assert!(config.is_unitless("opacity"));
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_functional_depth, 256);
        assert_eq!(config.resolve_alias("className"), "class");
        assert_eq!(config.resolve_alias("htmlFor"), "for");
        assert!(config.is_unitless("zIndex"));
        assert!(!config.is_unitless("width"));
    }

    #[test]
    fn test_config_round_trip() {
        let config = EngineConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert!(json.contains("\"maxFunctionalDepth\": 256"));
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("arbor-config-missing");
        let config = EngineConfig::load(&dir).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
