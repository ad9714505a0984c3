//! RequireJS-style module alias configuration.
//!
//! Only `baseUrl` and `paths` matter here; every other key (`shim`, `map`,
//! `packages`, ...) is ignored. A config is either read from disk once per
//! run or handed over already parsed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// A single alias value: one path, or a list of fallback paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasTarget {
    /// `"jquery": "lib/jquery"`
    Single(String),
    /// `"jquery": ["//cdn/jquery", "lib/jquery"]`
    Fallbacks(Vec<String>),
}

impl AliasTarget {
    /// The path this alias rewrites to.
    ///
    /// For fallback lists the last entry wins.
    #[must_use]
    pub fn effective(&self) -> Option<&str> {
        match self {
            Self::Single(path) => Some(path),
            Self::Fallbacks(paths) => paths.last().map(String::as_str),
        }
    }
}

/// Parsed module alias configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleAliasConfig {
    /// Directory, relative to the project root, that non-relative module ids resolve from
    #[serde(default)]
    pub base_url: String,
    /// Alias name to target path
    #[serde(default)]
    pub paths: HashMap<String, AliasTarget>,
}

impl ModuleAliasConfig {
    /// Read and parse a config file.
    ///
    /// Accepts plain JSON or a JavaScript file wrapping a JSON-compatible
    /// object literal, such as `require.config({...})`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::AliasConfig`] if its contents cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("alias config not readable: {}", path.display()),
            ))
        })?;
        let config = Self::parse(&content).map_err(|message| Error::AliasConfig {
            path: path.to_path_buf(),
            message,
        })?;
        debug!(
            config = %path.display(),
            aliases = config.paths.len(),
            base_url = %config.base_url,
            "Loaded alias config"
        );
        Ok(config)
    }

    /// Parse config text, returning the parser message on failure.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when no config object can be read.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let object = config_object(content).ok_or("no configuration object found")?;
        serde_json::from_str(object).map_err(|e| e.to_string())
    }

    /// Look up the rewrite target for an alias name.
    #[must_use]
    pub fn alias_target(&self, name: &str) -> Option<&str> {
        self.paths.get(name).and_then(AliasTarget::effective)
    }

    /// Directory that non-relative module ids resolve from.
    ///
    /// `baseUrl` is always taken relative to the project root, including a
    /// leading `/`, which in browser configs means the web root.
    #[must_use]
    pub fn base_dir(&self, project_root: &Path) -> PathBuf {
        let base = self.base_url.trim_start_matches('/');
        if base.is_empty() {
            project_root.to_path_buf()
        } else {
            project_root.join(base)
        }
    }
}

/// Slice out the outermost `{...}` of a config file.
fn config_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (start < end).then(|| &content[start..=end])
}

/// Where an alias config comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A config file to read once
    Path(PathBuf),
    /// A config that is already loaded
    Loaded(ModuleAliasConfig),
}

impl ConfigSource {
    /// Produce the config, reading it from disk when necessary.
    ///
    /// An empty path means "no config" and never touches the disk.
    ///
    /// # Errors
    ///
    /// Propagates [`ModuleAliasConfig::load`] failures.
    pub fn resolve(&self) -> Result<Option<ModuleAliasConfig>> {
        match self {
            Self::Path(path) if path.as_os_str().is_empty() => Ok(None),
            Self::Path(path) => ModuleAliasConfig::load(path).map(Some),
            Self::Loaded(config) => Ok(Some(config.clone())),
        }
    }
}

impl From<ModuleAliasConfig> for ConfigSource {
    fn from(config: ModuleAliasConfig) -> Self {
        Self::Loaded(config)
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for ConfigSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const JSON_CONFIG: &str = r#"{
        "baseUrl": "js",
        "paths": {
            "a": "./a",
            "foobar": "./b",
            "jquery": ["//cdn.example.com/jquery", "vendor/jquery"]
        },
        "shim": { "jquery": { "exports": "$" } }
    }"#;

    #[test]
    fn parses_json_config() {
        let config = ModuleAliasConfig::parse(JSON_CONFIG).expect("should parse");

        assert_eq!(config.base_url, "js");
        assert_eq!(config.alias_target("a"), Some("./a"));
        assert_eq!(config.alias_target("foobar"), Some("./b"));
    }

    #[test]
    fn fallback_list_takes_last_entry() {
        let config = ModuleAliasConfig::parse(JSON_CONFIG).expect("should parse");

        assert_eq!(config.alias_target("jquery"), Some("vendor/jquery"));
    }

    #[test]
    fn parses_javascript_wrapped_config() {
        let content = r#"require.config({"baseUrl": "", "paths": {"foobar": "./c"}});"#;

        let config = ModuleAliasConfig::parse(content).expect("should parse");

        assert_eq!(config.alias_target("foobar"), Some("./c"));
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let config = ModuleAliasConfig::parse("{}").expect("should parse");

        assert!(config.base_url.is_empty());
        assert!(config.paths.is_empty());
    }

    #[test]
    fn rejects_content_without_object() {
        assert!(ModuleAliasConfig::parse("requirejs.config();").is_err());
    }

    #[test]
    fn base_dir_is_relative_to_project_root() {
        let root = Path::new("/project");
        let mut config = ModuleAliasConfig::default();
        assert_eq!(config.base_dir(root), PathBuf::from("/project"));

        config.base_url = "/scripts".to_string();
        assert_eq!(config.base_dir(root), PathBuf::from("/project/scripts"));
    }

    #[test]
    fn empty_path_source_resolves_to_none() {
        let source = ConfigSource::from("");

        assert_eq!(source.resolve().expect("should not read"), None);
    }

    #[test]
    fn loaded_source_resolves_without_io() {
        let config = ModuleAliasConfig::parse(JSON_CONFIG).expect("should parse");
        let source = ConfigSource::from(config.clone());

        assert_eq!(source.resolve().expect("should resolve"), Some(config));
    }

    #[test]
    fn path_source_reads_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("config.json");
        fs::write(&path, JSON_CONFIG).expect("should write config");

        let loaded = ConfigSource::from(path.clone())
            .resolve()
            .expect("should load");

        assert_eq!(loaded, Some(ModuleAliasConfig::load(&path).expect("should load")));
    }

    #[test]
    fn load_reports_unparseable_config() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("config.js");
        fs::write(&path, "require.config({ paths: { a: './a' } });").expect("should write");

        let err = ModuleAliasConfig::load(&path).expect_err("unquoted keys are not JSON");

        assert!(matches!(err, Error::AliasConfig { .. }));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ModuleAliasConfig::load(Path::new("/nonexistent/config.json"))
            .expect_err("missing file should fail");

        assert!(matches!(err, Error::Io(_)));
    }
}
