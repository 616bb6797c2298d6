use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use scopelog_types::SeverityMask;

/// Terminals known to render escape sequences literally
static MONOCHROME_TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(dumb|unknown|vt(52|100|102|220)|ansi-mono|emacs)$")
        .expect("valid terminal regex")
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Construction options for a [`crate::LogEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed set of namespaces, in display order
    pub namespaces: Vec<String>,

    /// Storage key the filter map is persisted under
    pub storage_key: String,

    /// Force monochrome decoration
    pub disable_colors: bool,

    /// Mask for namespaces without a stored preference
    pub default_severity: SeverityMask,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespaces: Vec::new(),
            storage_key: "scopelog".to_string(),
            disable_colors: false,
            default_severity: SeverityMask::ERROR,
        }
    }
}

impl EngineConfig {
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_default_severity(mut self, mask: SeverityMask) -> Self {
        self.default_severity = mask;
        self
    }

    pub fn with_colors_disabled(mut self, disabled: bool) -> Self {
        self.disable_colors = disabled;
        self
    }

    /// Namespaces with duplicates removed, first occurrence wins
    pub fn unique_namespaces(&self) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(self.namespaces.len());
        for namespace in &self.namespaces {
            if !unique.contains(namespace) {
                unique.push(namespace.clone());
            }
        }
        unique
    }
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(EngineConfig::default())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<EngineConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<EngineConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

/// Whether the current environment can show coloured output
pub fn colors_supported() -> bool {
    let no_color = std::env::var("NO_COLOR").ok();
    let term = std::env::var("TERM").ok();
    colors_supported_for(no_color.as_deref(), term.as_deref())
}

/// `NO_COLOR` (any non-empty value) or a monochrome `TERM` disables colours
pub fn colors_supported_for(no_color: Option<&str>, term: Option<&str>) -> bool {
    if no_color.is_some_and(|v| !v.is_empty()) {
        return false;
    }
    !term.is_some_and(|t| MONOCHROME_TERM_RE.is_match(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.storage_key, "scopelog");
        assert_eq!(config.default_severity, SeverityMask::ERROR);
        assert!(!config.disable_colors);
        assert!(config.namespaces.is_empty());
    }

    #[test]
    fn test_parse_toml_with_named_levels() {
        let raw = r#"
            namespaces = ["net", "ui"]
            storage_key = "my-app"
            default_severity = ["error", "warn"]
        "#;
        let config: EngineConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.namespaces, vec!["net", "ui"]);
        assert_eq!(config.storage_key, "my-app");
        assert_eq!(
            config.default_severity,
            SeverityMask::ERROR | SeverityMask::WARN
        );
    }

    #[test]
    fn test_parse_toml_with_bits() {
        let config: EngineConfig = toml::from_str("default_severity = 15").unwrap();
        assert_eq!(config.default_severity, SeverityMask::ALL);
        assert!(toml::from_str::<EngineConfig>("default_severity = 16").is_err());
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let result = load_config(Some(Path::new("/nonexistent/scopelog.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_unique_namespaces() {
        let config = EngineConfig::new(["net", "ui", "net"]);
        assert_eq!(config.unique_namespaces(), vec!["net", "ui"]);
    }

    #[test]
    fn test_color_detection() {
        assert!(colors_supported_for(None, Some("xterm-256color")));
        assert!(colors_supported_for(Some(""), None));
        assert!(!colors_supported_for(Some("1"), Some("xterm")));
        assert!(!colors_supported_for(None, Some("dumb")));
        assert!(!colors_supported_for(None, Some("VT100")));
    }
}
