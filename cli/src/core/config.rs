//! # scriptrs Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module implements the configuration system for scriptrs, handling loading,
//! merging, validation, and access to configuration data. It supports a multi-level
//! configuration approach that combines defaults, user settings, and project-specific
//! overrides.
//!
//! ## Architecture
//!
//! The configuration system follows these principles:
//! - Configuration is loaded from multiple sources in order of precedence
//! - Paths are validated and expanded (e.g., `~` to home directory)
//! - Configuration is validated for correctness before use
//! - Structured data models ensure type safety
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.scriptrs.toml` in the starting directory or its ancestors
//! 2. User-specific `config.toml` in the platform config directory
//! 3. Default values defined in the code
//!
//! ## Examples
//!
//! ```rust
//! let cfg = config::load_config(Path::new("."))?;
//!
//! // Interpreter used for shell-interpreted commands
//! let shell = &cfg.runner.shell;
//!
//! // Language for banners and notices
//! let locale = cfg.locale();
//! ```
//!
//! The configuration is loaded once per command execution and passed
//! to the modules that need it.
//!
use crate::common::fs::io;
use crate::core::error::{Result, ScriptrsError};
use crate::core::i18n::Locale;
use crate::runner::manifest::RunnerConvention;
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)] // Error if unknown fields are in TOML
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// How commands are launched.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Interpreter for shell-interpreted command strings.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Flag that hands the command string to the interpreter.
    #[serde(default = "default_shell_arg")]
    pub shell_arg: String,
    /// Forces a runner convention instead of detecting it from lock files.
    #[serde(default)]
    pub convention: Option<RunnerConvention>,
    /// Default working directory (can use ~). Will be expanded.
    #[serde(default)]
    pub working_dir: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            shell_arg: default_shell_arg(),
            convention: None,
            working_dir: None,
        }
    }
}

/// How output is presented.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Language tag for banners and labels. Falls back to `LANG`, then English.
    #[serde(default)]
    pub locale: Option<String>,
    /// Emit start and terminal banners.
    #[serde(default = "default_banners")]
    pub banners: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            locale: None,
            banners: default_banners(),
        }
    }
}

impl Config {
    /// Resolves the configured locale, falling back to `LANG` and then English.
    pub fn locale(&self) -> Locale {
        match &self.display.locale {
            Some(tag) => Locale::from_tag(tag).unwrap_or_default(),
            None => Locale::from_env(),
        }
    }

    /// Working directory used when a command does not name one.
    pub fn default_working_dir(&self) -> Option<PathBuf> {
        self.runner.working_dir.as_ref().map(PathBuf::from)
    }
}

fn default_shell() -> String {
    if cfg!(windows) {
        "cmd".to_string()
    } else {
        "sh".to_string()
    }
}
fn default_shell_arg() -> String {
    if cfg!(windows) {
        "/C".to_string()
    } else {
        "-c".to_string()
    }
}
fn default_banners() -> bool {
    true
}

const PROJECT_CONFIG_FILENAME: &str = ".scriptrs.toml";

/// Loads, merges, expands, and validates the configuration visible from `start_dir`.
pub fn load_config(start_dir: &Path) -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config(start_dir)?;
    let mut merged_config = merge_configs(user_config.unwrap_or_default(), project_config);
    expand_config_paths(&mut merged_config).context("Failed to expand paths in configuration")?;
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "Scriptrs", "scriptrs") {
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

fn load_project_config(start_dir: &Path) -> Result<Option<Config>> {
    if let Some(project_config_path) = find_project_config_path(start_dir)? {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.scriptrs.toml) found from {}.", start_dir.display());
        Ok(None)
    }
}

fn find_project_config_path(start_dir: &Path) -> Result<Option<PathBuf>> {
    let start = if start_dir.is_absolute() {
        start_dir.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(start_dir)
    };
    let mut path: &Path = &start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Ok(Some(project_config));
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return Ok(None);
        }
        match path.parent() {
            Some(parent) => path = parent,
            None => break,
        }
    }
    Ok(None)
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = io::read_file_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project_cfg = match project {
        Some(p) => p,
        None => return user,
    };
    let mut merged = Config::default();
    merged.runner.shell = if project_cfg.runner.shell != default_shell() {
        project_cfg.runner.shell
    } else {
        user.runner.shell
    };
    merged.runner.shell_arg = if project_cfg.runner.shell_arg != default_shell_arg() {
        project_cfg.runner.shell_arg
    } else {
        user.runner.shell_arg
    };
    merged.runner.convention = project_cfg.runner.convention.or(user.runner.convention);
    merged.runner.working_dir = project_cfg.runner.working_dir.or(user.runner.working_dir);
    merged.display.locale = project_cfg.display.locale.or(user.display.locale);
    merged.display.banners = if project_cfg.display.banners != default_banners() {
        project_cfg.display.banners
    } else {
        user.display.banners
    };
    merged
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    if let Some(dir) = config.runner.working_dir.as_mut() {
        *dir = shellexpand::tilde(dir.as_str()).into_owned();
        debug!("Expanded working directory: {}", dir);
    }
    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    info!("Validating final configuration...");
    if config.runner.shell.trim().is_empty() {
        return Err(anyhow!(ScriptrsError::Config(
            "runner.shell cannot be empty.".to_string()
        )));
    }
    if config.runner.shell_arg.trim().is_empty() {
        return Err(anyhow!(ScriptrsError::Config(
            "runner.shell_arg cannot be empty.".to_string()
        )));
    }
    if let Some(dir) = config.default_working_dir() {
        if !dir.exists() {
            return Err(anyhow!(ScriptrsError::Config(format!(
                "Configured working directory '{}' does not exist.",
                dir.display()
            ))));
        } else if !dir.is_dir() {
            return Err(anyhow!(ScriptrsError::Config(format!(
                "Configured working directory '{}' exists but is not a directory.",
                dir.display()
            ))));
        }
    }
    if let Some(tag) = &config.display.locale {
        if Locale::from_tag(tag).is_none() {
            warn!("Unsupported locale '{}', falling back to English.", tag);
        }
    }
    info!("Configuration validation successful.");
    Ok(())
}
