//! Workspace configuration: built-in defaults, optionally overridden by a
//! `.gorefactor.toml` file at the workspace root, optionally overridden
//! again by explicit `Engine::load` arguments.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{GorefactorError, Result};

/// The name of the module descriptor file the workspace loader looks for
/// to determine the module's root import path (e.g. `go.mod`'s `module`
/// directive for the illustrative Go-like target language).
const DEFAULT_MODULE_DESCRIPTOR: &str = "go.mod";
const DEFAULT_VENDOR_DIR: &str = "vendor";
const DEFAULT_SOURCE_EXTENSION: &str = "go";
const DEFAULT_TEST_SUFFIX: &str = "_test";
const DEFAULT_WATCHER_DEBOUNCE_MS: u64 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub module_descriptor_file: String,
    pub vendored_deps_dir: String,
    pub source_extension: String,
    pub test_file_suffix: String,
    pub watcher_debounce: Duration,
    pub backup_before_write: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            module_descriptor_file: DEFAULT_MODULE_DESCRIPTOR.to_string(),
            vendored_deps_dir: DEFAULT_VENDOR_DIR.to_string(),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            test_file_suffix: DEFAULT_TEST_SUFFIX.to_string(),
            watcher_debounce: Duration::from_millis(DEFAULT_WATCHER_DEBOUNCE_MS),
            backup_before_write: true,
        }
    }
}

/// The on-disk `.gorefactor.toml` shape. Every field is optional: an
/// absent field falls back to [`WorkspaceConfig::default`], and an absent
/// file falls back to defaults entirely.
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlConfig {
    module_descriptor_file: Option<String>,
    vendored_deps_dir: Option<String>,
    source_extension: Option<String>,
    test_file_suffix: Option<String>,
    watcher_debounce_ms: Option<u64>,
    backup_before_write: Option<bool>,
}

/// Explicit overrides an `Engine::load` caller can pass, taking precedence
/// over both the built-in defaults and `.gorefactor.toml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub module_descriptor_file: Option<String>,
    pub vendored_deps_dir: Option<String>,
    pub source_extension: Option<String>,
    pub test_file_suffix: Option<String>,
    pub watcher_debounce: Option<Duration>,
    pub backup_before_write: Option<bool>,
}

impl WorkspaceConfig {
    /// Resolves a workspace's configuration: defaults, then
    /// `<root>/.gorefactor.toml` if present, then `overrides`.
    pub fn resolve(root: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = Self::default();

        let config_path = root.join(".gorefactor.toml");
        if config_path.exists() {
            let text = std::fs::read_to_string(&config_path).map_err(|source| GorefactorError::FileSystemError {
                path: config_path.clone(),
                source,
            })?;
            let toml_config: TomlConfig = toml::from_str(&text)
                .map_err(|e| GorefactorError::invalid(format!("invalid .gorefactor.toml: {e}")))?;
            config.apply_toml(toml_config);
        }

        config.apply_overrides(overrides);
        Ok(config)
    }

    fn apply_toml(&mut self, toml_config: TomlConfig) {
        if let Some(v) = toml_config.module_descriptor_file {
            self.module_descriptor_file = v;
        }
        if let Some(v) = toml_config.vendored_deps_dir {
            self.vendored_deps_dir = v;
        }
        if let Some(v) = toml_config.source_extension {
            self.source_extension = v;
        }
        if let Some(v) = toml_config.test_file_suffix {
            self.test_file_suffix = v;
        }
        if let Some(ms) = toml_config.watcher_debounce_ms {
            self.watcher_debounce = Duration::from_millis(ms);
        }
        if let Some(v) = toml_config.backup_before_write {
            self.backup_before_write = v;
        }
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = &overrides.module_descriptor_file {
            self.module_descriptor_file = v.clone();
        }
        if let Some(v) = &overrides.vendored_deps_dir {
            self.vendored_deps_dir = v.clone();
        }
        if let Some(v) = &overrides.source_extension {
            self.source_extension = v.clone();
        }
        if let Some(v) = &overrides.test_file_suffix {
            self.test_file_suffix = v.clone();
        }
        if let Some(v) = overrides.watcher_debounce {
            self.watcher_debounce = v;
        }
        if let Some(v) = overrides.backup_before_write {
            self.backup_before_write = v;
        }
    }

    pub fn is_test_file(&self, path: &Path) -> bool {
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.ends_with(self.test_file_suffix.as_str()))
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.source_extension.as_str())
    }

    pub fn backup_root(&self, root: &Path) -> PathBuf {
        root.join(".gorefactor-backup")
    }

    pub fn backup_dir(&self, root: &Path, timestamp: &str) -> PathBuf {
        self.backup_root(root).join(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkspaceConfig::resolve(dir.path(), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.source_extension, "go");
        assert!(config.backup_before_write);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".gorefactor.toml"),
            "source_extension = \"gox\"\nbackup_before_write = false\n",
        )
        .unwrap();
        let config = WorkspaceConfig::resolve(dir.path(), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.source_extension, "gox");
        assert!(!config.backup_before_write);
    }

    #[test]
    fn explicit_overrides_beat_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".gorefactor.toml"), "source_extension = \"gox\"\n").unwrap();
        let overrides = ConfigOverrides {
            source_extension: Some("g2".to_string()),
            ..Default::default()
        };
        let config = WorkspaceConfig::resolve(dir.path(), &overrides).unwrap();
        assert_eq!(config.source_extension, "g2");
    }

    #[test]
    fn is_test_file_checks_suffix() {
        let config = WorkspaceConfig::default();
        assert!(config.is_test_file(Path::new("foo_test.go")));
        assert!(!config.is_test_file(Path::new("foo.go")));
    }
}
