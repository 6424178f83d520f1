// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Configuration Module
//!
//! Layered configuration for a portal build. Values are applied in order:
//! built-in defaults, an optional TOML file, environment variables with a
//! prefix, then programmatic overrides. The result is validated once.
//!
//! ## Example
//!
//! ```rust,no_run
//! use docsportal::core::config::{ConfigBuilder, Profile};
//!
//! let config = ConfigBuilder::new()
//!     .with_file("docsportal.toml")
//!     .with_env_prefix("DOCSPORTAL_")
//!     .with_profile(Profile::Production)
//!     .build()
//!     .unwrap();
//!
//! assert!(config.minify_output());
//! ```
//!
//! A configuration file looks like this:
//!
//! ```toml
//! output_dir = "public"
//! content_dir = "content"
//! on_missing = "placeholder"
//!
//! [site]
//! title = "WaddlePerf"
//! base_path = "/docs"
//!
//! [output]
//! minify = true
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toml::Value as TomlValue;

use crate::builtin;
use crate::resolver::DEFAULT_BASE_PATH;
use crate::{PortalError, Result};

/// Specifies operational profiles for configuration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Development profile: readable output.
    #[default]
    Development,
    /// Staging profile for checking a build before release.
    Staging,
    /// Production profile: output is always minified.
    Production,
    /// Custom profile.
    Custom,
}

/// What the build does with a topic that fails to resolve.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MissingContentPolicy {
    /// Abort the build with the resolution error.
    #[default]
    Fail,
    /// Write a "page not found" placeholder and continue.
    Placeholder,
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_output_dir")]
    /// Directory the static site is written to.
    pub output_dir: PathBuf,

    #[serde(default)]
    /// Directory of `{slug}.html` / `{slug}.md` files; built-in content when unset.
    pub content_dir: Option<PathBuf>,

    #[serde(default)]
    /// Directory of `.hbs` templates overriding the built-in ones.
    pub template_dir: Option<PathBuf>,

    #[serde(default)]
    /// TOML catalog file; built-in catalog when unset.
    pub catalog_file: Option<PathBuf>,

    #[serde(default)]
    /// The current operational profile.
    pub profile: Profile,

    #[serde(default)]
    /// Handling of topics that fail to resolve.
    pub on_missing: MissingContentPolicy,

    #[serde(default)]
    /// Site identity and page text.
    pub site: SiteConfig,

    #[serde(default)]
    /// Template rendering settings.
    pub template: TemplateConfig,

    #[serde(default)]
    /// Output generation settings.
    pub output: OutputConfig,
}

/// Site identity and fixed page text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    /// Site name, used in page titles.
    pub title: String,

    #[serde(default = "default_base_path")]
    /// Logical path of the documentation index.
    pub base_path: String,

    #[serde(default = "default_home_url")]
    /// Target of the "Back to Home" link.
    pub home_url: String,

    #[serde(default = "default_index_heading")]
    /// Heading of the index page.
    pub index_heading: String,

    #[serde(default = "default_index_intro")]
    /// Intro paragraph of the index page.
    pub index_intro: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            base_path: default_base_path(),
            home_url: default_home_url(),
            index_heading: default_index_heading(),
            index_intro: default_index_intro(),
        }
    }
}

/// Template rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default)]
    /// Treat missing template variables as errors.
    pub strict_mode: bool,
}

/// Output generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    /// Minify generated HTML.
    pub minify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            content_dir: None,
            template_dir: None,
            catalog_file: None,
            profile: Profile::default(),
            on_missing: MissingContentPolicy::default(),
            site: SiteConfig::default(),
            template: TemplateConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }

    /// Whether generated HTML is minified.
    pub fn minify_output(&self) -> bool {
        self.output.minify || self.profile == Profile::Production
    }
}

/// Builds a [`Config`] from a file, the environment, and overrides.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<PathBuf>,
    env_prefix: Option<String>,
    profile: Option<Profile>,
    overrides: Vec<(String, TomlValue)>,
}

impl ConfigBuilder {
    /// Creates a builder that starts from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a TOML configuration file.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Reads variables starting with `prefix` (e.g. `DOCSPORTAL_OUTPUT_DIR`).
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Sets the profile.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Overrides a key such as `output_dir` or `site.base_path`.
    ///
    /// Overrides apply in the order they are added, after the file and
    /// environment.
    pub fn with_override<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<TomlValue>,
    {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Loads, layers, and validates the configuration.
    pub fn build(self) -> Result<Config> {
        let mut config = match &self.config_file {
            Some(path) => load_from_file(path)?,
            None => Config::default(),
        };

        if let Some(profile) = self.profile {
            config.profile = profile;
        }

        if let Some(prefix) = &self.env_prefix {
            apply_env_overrides(&mut config, prefix, env::vars())?;
        }

        for (key, value) in &self.overrides {
            apply_config_value(&mut config, key, value)?;
        }

        validate_config(&config)?;
        Ok(config)
    }
}

// Internal helper functions

fn load_from_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        PortalError::config_error(
            format!("Failed to read config file: {}", e),
            Some(path.to_path_buf()),
        )
    })?;

    toml::from_str(&content).map_err(|e| {
        PortalError::config_error(
            format!("Failed to parse config file: {}", e),
            Some(path.to_path_buf()),
        )
    })
}

fn apply_env_overrides<I>(
    config: &mut Config,
    prefix: &str,
    vars: I,
) -> Result<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    // Sorted so the outcome does not depend on environment order.
    let mut matched: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in vars {
        if let Some(stripped) = key.strip_prefix(prefix) {
            let config_key = env_key_to_config_key(
                stripped.trim_start_matches('_'),
            );
            _ = matched.insert(config_key, value);
        }
    }
    for (key, value) in matched {
        apply_config_value(config, &key, &TomlValue::String(value))?;
    }
    Ok(())
}

/// `SITE_BASE_PATH` → `site.base_path`; `OUTPUT_DIR` → `output_dir`.
fn env_key_to_config_key(key: &str) -> String {
    let key = key.to_lowercase();
    for section in ["site_", "template_", "output_"] {
        if let Some(rest) = key.strip_prefix(section) {
            if !is_top_level_key(&key) {
                return format!("{}.{}", section.trim_end_matches('_'), rest);
            }
        }
    }
    key
}

fn is_top_level_key(key: &str) -> bool {
    matches!(
        key,
        "output_dir"
            | "content_dir"
            | "template_dir"
            | "catalog_file"
            | "profile"
            | "on_missing"
    )
}

fn value_to_string(value: &TomlValue) -> String {
    match value {
        TomlValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.trim().parse().map_err(|e| {
        PortalError::config_error(
            format!("Invalid {} value '{}': {}", key, value, e),
            None,
        )
    })
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn apply_config_value(
    config: &mut Config,
    key: &str,
    value: &TomlValue,
) -> Result<()> {
    let value = value_to_string(value);
    match key {
        "output_dir" => config.output_dir = PathBuf::from(value),
        "content_dir" => config.content_dir = optional_path(&value),
        "template_dir" => config.template_dir = optional_path(&value),
        "catalog_file" => config.catalog_file = optional_path(&value),
        "profile" => {
            config.profile = match value.to_lowercase().as_str() {
                "development" => Profile::Development,
                "staging" => Profile::Staging,
                "production" => Profile::Production,
                "custom" => Profile::Custom,
                other => {
                    return Err(PortalError::config_error(
                        format!("Invalid profile value '{}'", other),
                        None,
                    ))
                }
            };
        }
        "on_missing" => {
            config.on_missing = match value.to_lowercase().as_str() {
                "fail" => MissingContentPolicy::Fail,
                "placeholder" => MissingContentPolicy::Placeholder,
                other => {
                    return Err(PortalError::config_error(
                        format!("Invalid on_missing value '{}'", other),
                        None,
                    ))
                }
            };
        }
        "site.title" => config.site.title = value,
        "site.base_path" => config.site.base_path = value,
        "site.home_url" => config.site.home_url = value,
        "site.index_heading" => config.site.index_heading = value,
        "site.index_intro" => config.site.index_intro = value,
        "template.strict_mode" => {
            config.template.strict_mode = parse_bool(key, &value)?
        }
        "output.minify" => config.output.minify = parse_bool(key, &value)?,
        _ => {
            return Err(PortalError::config_error(
                format!("Unknown configuration key: {}", key),
                None,
            ));
        }
    }
    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    if let Some(dir) = &config.content_dir {
        validate_dir(dir, "content")?;
    }
    if let Some(dir) = &config.template_dir {
        validate_dir(dir, "template")?;
    }
    if let Some(file) = &config.catalog_file {
        if !file.is_file() {
            return Err(PortalError::config_error(
                format!("catalog file does not exist: {}", file.display()),
                Some(file.clone()),
            ));
        }
    }
    if config.output_dir.exists() && !config.output_dir.is_dir() {
        return Err(PortalError::config_error(
            "output path is not a directory",
            Some(config.output_dir.clone()),
        ));
    }
    if !config.site.base_path.starts_with('/') {
        return Err(PortalError::config_error(
            format!(
                "site.base_path `{}` must start with `/`",
                config.site.base_path
            ),
            None,
        ));
    }
    Ok(())
}

fn validate_dir(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        return Err(PortalError::config_error(
            format!("{} directory does not exist: {}", name, path.display()),
            Some(path.to_path_buf()),
        ));
    }
    if !path.is_dir() {
        return Err(PortalError::config_error(
            format!("{} path is not a directory: {}", name, path.display()),
            Some(path.to_path_buf()),
        ));
    }
    Ok(())
}

// Default value functions

fn default_output_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_title() -> String {
    "WaddlePerf".to_string()
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

fn default_home_url() -> String {
    "/".to_string()
}

fn default_index_heading() -> String {
    builtin::INDEX_HEADING.to_string()
}

fn default_index_intro() -> String {
    builtin::INDEX_INTRO.to_string()
}
