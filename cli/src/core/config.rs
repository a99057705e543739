//! # P7Pack Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module implements configuration loading, merging, and validation for
//! P7Pack. Configuration decides which engine binary is driven, where per-job
//! working directories are created, how the engine process is supervised, and
//! which archive options apply when the command line leaves them out.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Command-line flags (applied by the `compress` handler, not here)
//! 2. Project-specific `.p7pack.toml` in the current directory or an ancestor
//! 3. User-specific `<config dir>/p7pack/config.toml`
//! 4. Default values defined in the code
//!
//! Paths are tilde-expanded and the merged result is validated before use.
//!
//! ## Examples
//!
//! ```toml
//! [engine]
//! binary = "/usr/bin/7z"
//! timeout_secs = 3600
//! merge_stderr = false
//!
//! [output]
//! work_root = "~/archives"
//!
//! [defaults]
//! level = 7
//! method = "LZMA2"
//! format = "7z"
//! solid = true
//! ```
//!
use crate::common::archive::options::{ArchiveFormat, CompressionMethod};
use crate::core::error::{ArchiveError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub defaults: JobDefaults,
}

/// How the external archiving engine is located and supervised.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Engine executable, either a bare name looked up on PATH or a path (can use ~).
    #[serde(default = "default_engine_binary")]
    pub binary: String,
    /// Optional wall-clock limit for one engine run. Unset means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Surface stderr lines in the progress stream instead of capturing them separately.
    #[serde(default)]
    pub merge_stderr: bool,
}

/// Where job working directories are created.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Parent directory for `p7zip_output_*` job directories (can use ~).
    #[serde(default = "default_work_root")]
    pub work_root: String,
}

/// Archive options used when the command line does not set them.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JobDefaults {
    #[serde(default = "default_level")]
    pub level: u8,
    #[serde(default = "default_method")]
    pub method: CompressionMethod,
    #[serde(default = "default_format")]
    pub format: ArchiveFormat,
    #[serde(default = "default_solid")]
    pub solid: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            binary: default_engine_binary(),
            timeout_secs: None,
            merge_stderr: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            work_root: default_work_root(),
        }
    }
}

impl Default for JobDefaults {
    fn default() -> Self {
        JobDefaults {
            level: default_level(),
            method: default_method(),
            format: default_format(),
            solid: default_solid(),
        }
    }
}

impl EngineConfig {
    /// The configured timeout as a `Duration`. Zero is treated as "no timeout".
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn default_engine_binary() -> String {
    "7z".to_string()
}
fn default_work_root() -> String {
    std::env::temp_dir().to_string_lossy().into_owned()
}
fn default_level() -> u8 {
    5
}
fn default_method() -> CompressionMethod {
    CompressionMethod::Lzma2
}
fn default_format() -> ArchiveFormat {
    ArchiveFormat::SevenZip
}
fn default_solid() -> bool {
    true
}

/// One configuration file as written. Unset keys stay `None` so a later
/// layer can tell "not mentioned" apart from "set to the default".
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct ConfigLayer {
    #[serde(default)]
    engine: EngineLayer,
    #[serde(default)]
    output: OutputLayer,
    #[serde(default)]
    defaults: DefaultsLayer,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct EngineLayer {
    binary: Option<String>,
    timeout_secs: Option<u64>,
    merge_stderr: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct OutputLayer {
    work_root: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct DefaultsLayer {
    level: Option<u8>,
    method: Option<CompressionMethod>,
    format: Option<ArchiveFormat>,
    solid: Option<bool>,
}

const PROJECT_CONFIG_FILENAME: &str = ".p7pack.toml";

/// Loads, merges, expands and validates configuration from all file sources.
pub fn load_config() -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config = merge_configs(user_config, project_config);
    expand_config_paths(&mut merged_config);
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<ConfigLayer>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "P7Pack", "p7pack") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<ConfigLayer>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.p7pack.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

/// Walks from `start` towards the filesystem root looking for `.p7pack.toml`.
/// The search stops at the first directory containing `.git`.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<ConfigLayer> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Layers the files over the built-in defaults. For every key the project
/// file wins over the user file, and a key set in neither keeps its default.
fn merge_configs(user: Option<ConfigLayer>, project: Option<ConfigLayer>) -> Config {
    let user = user.unwrap_or_default();
    let project = project.unwrap_or_default();
    let defaults = Config::default();

    Config {
        engine: EngineConfig {
            binary: project
                .engine
                .binary
                .or(user.engine.binary)
                .unwrap_or(defaults.engine.binary),
            timeout_secs: project.engine.timeout_secs.or(user.engine.timeout_secs),
            merge_stderr: project
                .engine
                .merge_stderr
                .or(user.engine.merge_stderr)
                .unwrap_or(defaults.engine.merge_stderr),
        },
        output: OutputConfig {
            work_root: project
                .output
                .work_root
                .or(user.output.work_root)
                .unwrap_or(defaults.output.work_root),
        },
        defaults: JobDefaults {
            level: project
                .defaults
                .level
                .or(user.defaults.level)
                .unwrap_or(defaults.defaults.level),
            method: project
                .defaults
                .method
                .or(user.defaults.method)
                .unwrap_or(defaults.defaults.method),
            format: project
                .defaults
                .format
                .or(user.defaults.format)
                .unwrap_or(defaults.defaults.format),
            solid: project
                .defaults
                .solid
                .or(user.defaults.solid)
                .unwrap_or(defaults.defaults.solid),
        },
    }
}

fn expand_config_paths(config: &mut Config) {
    config.output.work_root = shellexpand::tilde(&config.output.work_root).into_owned();
    config.engine.binary = shellexpand::tilde(&config.engine.binary).into_owned();
    debug!(
        "Expanded paths: work_root={}, engine={}",
        config.output.work_root, config.engine.binary
    );
}

fn validate_config(config: &Config) -> Result<()> {
    if config.engine.binary.trim().is_empty() {
        return Err(anyhow!(ArchiveError::Config(
            "engine.binary cannot be empty.".to_string()
        )));
    }
    if config.defaults.level > 9 {
        return Err(anyhow!(ArchiveError::Config(format!(
            "defaults.level must be between 0 and 9, got {}.",
            config.defaults.level
        ))));
    }
    let work_root = PathBuf::from(&config.output.work_root);
    if work_root.is_file() {
        return Err(anyhow!(ArchiveError::Config(format!(
            "Configured work root '{}' exists but is not a directory.",
            work_root.display()
        ))));
    }
    if !work_root.exists() {
        warn!(
            "Configured work root '{}' does not exist yet; it will be created on first use.",
            work_root.display()
        );
    }
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_deserialize_basic_toml() {
        let toml_content = r#"
            [engine]
            binary = "/opt/p7zip/7z"
            timeout_secs = 600

            [output]
            work_root = "~/archives"

            [defaults]
            level = 9
            method = "PPMd"
            format = "zip"
        "#;

        let config: Config = toml::from_str(toml_content).expect("Failed to parse TOML");

        assert_eq!(config.engine.binary, "/opt/p7zip/7z");
        assert_eq!(config.engine.timeout(), Some(Duration::from_secs(600)));
        assert!(!config.engine.merge_stderr);
        assert_eq!(config.output.work_root, "~/archives"); // Not yet expanded
        assert_eq!(config.defaults.level, 9);
        assert_eq!(config.defaults.method, CompressionMethod::Ppmd);
        assert_eq!(config.defaults.format, ArchiveFormat::Zip);
        assert!(config.defaults.solid); // Default
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[engine]\nbinray = \"7z\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let engine = EngineConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(engine.timeout(), None);
    }

    #[test]
    fn test_path_expansion() {
        let mut config = Config {
            output: OutputConfig {
                work_root: "~/p7_jobs".to_string(),
            },
            ..Default::default()
        };

        expand_config_paths(&mut config);

        let home_dir = dirs::home_dir().unwrap();
        assert_eq!(
            config.output.work_root,
            home_dir.join("p7_jobs").to_string_lossy()
        );
        assert_eq!(config.engine.binary, "7z"); // Bare names are unchanged
    }

    fn layer(toml_content: &str) -> ConfigLayer {
        toml::from_str(toml_content).expect("Failed to parse TOML layer")
    }

    #[test]
    fn test_merge_project_overrides_user() {
        let user = layer(
            r#"
            [engine]
            binary = "/usr/local/bin/7zz"
            timeout_secs = 60

            [defaults]
            level = 7
            "#,
        );
        let project = layer("[defaults]\nformat = \"tar\"\n");

        let merged = merge_configs(Some(user), Some(project));

        assert_eq!(merged.engine.binary, "/usr/local/bin/7zz");
        assert_eq!(merged.engine.timeout_secs, Some(60));
        assert_eq!(merged.defaults.level, 7);
        assert_eq!(merged.defaults.format, ArchiveFormat::Tar);
        assert_eq!(merged.defaults.method, CompressionMethod::Lzma2); // Default
    }

    #[test]
    fn test_merge_project_can_restore_default_values() {
        let user = layer(
            r#"
            [engine]
            merge_stderr = true
            timeout_secs = 60

            [defaults]
            level = 7
            solid = false
            "#,
        );
        let project = layer(
            r#"
            [engine]
            merge_stderr = false
            timeout_secs = 0

            [defaults]
            level = 5
            solid = true
            "#,
        );

        let merged = merge_configs(Some(user), Some(project));

        assert!(!merged.engine.merge_stderr);
        assert_eq!(merged.engine.timeout(), None);
        assert_eq!(merged.defaults.level, 5);
        assert!(merged.defaults.solid);
    }

    #[test]
    fn test_merge_without_files_is_default() {
        assert_eq!(merge_configs(None, None), Config::default());
    }

    #[test]
    fn test_layer_rejects_unknown_fields() {
        let result: std::result::Result<ConfigLayer, _> =
            toml::from_str("[defaults]\nlvl = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_find_project_config_in_ancestor() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir(temp_dir.path().join(".git")).unwrap();
        fs::write(temp_dir.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            find_project_config_path(&nested),
            Some(temp_dir.path().join(PROJECT_CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_find_project_config_stops_at_git() {
        let temp_dir = tempdir().unwrap();
        let repo = temp_dir.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        // Lives above the repository root, so it must not be picked up.
        fs::write(temp_dir.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();

        assert_eq!(find_project_config_path(&repo), None);
    }

    #[test]
    fn test_validate_config_invalid_level() {
        let config = Config {
            defaults: JobDefaults {
                level: 12,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("defaults.level must be between 0 and 9"));
    }

    #[test]
    fn test_validate_config_work_root_is_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("not_a_dir");
        fs::write(&file_path, "").unwrap();

        let config = Config {
            output: OutputConfig {
                work_root: file_path.to_string_lossy().to_string(),
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("is not a directory"));
    }
}
