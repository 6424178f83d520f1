// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # HTML Output Generation
//!
//! Writes rendered pages to disk.
//!
//! Each page may carry metadata, passed as the `metadata` object of the
//! generation options, which is injected into `<head>` as escaped
//! `<meta name=… content=…>` tags. Minification uses `minify-html` and can be
//! switched on for the generator or per page with the `minify` option.
//!
//! ```rust,no_run
//! use docsportal::generators::html::HtmlGenerator;
//! use docsportal::OutputGenerator;
//! use std::path::Path;
//!
//! let generator = HtmlGenerator::new().with_minification(true);
//! generator.generate(
//!     "<html><head></head><body>Hello</body></html>",
//!     Path::new("public/docs/index.html"),
//!     Some(&serde_json::json!({
//!         "metadata": { "description": "Documentation index" }
//!     })),
//! ).unwrap();
//! ```

use crate::{OutputGenerator, PortalError, Result};
use log::debug;
use minify_html::{minify, Cfg};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Generator-wide settings.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Minify every page.
    pub minify: bool,

    /// Metadata injected into every page, before per-page metadata.
    pub metadata: Option<JsonValue>,
}

/// HTML output generator.
///
/// Clones share settings; the `with_*` builders give the result its own
/// copy, leaving other clones unchanged.
#[derive(Debug, Clone, Default)]
pub struct HtmlGenerator {
    config: Arc<RwLock<GeneratorConfig>>,
}

impl HtmlGenerator {
    /// Creates a generator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables minification.
    pub fn with_minification(self, enable: bool) -> Self {
        self.update(|config| config.minify = enable)
    }

    /// Sets metadata injected into every page.
    pub fn with_metadata(self, metadata: JsonValue) -> Self {
        self.update(|config| config.metadata = Some(metadata))
    }

    fn update<F: FnOnce(&mut GeneratorConfig)>(self, change: F) -> Self {
        let mut config = self.config.read().clone();
        change(&mut config);
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// A copy of the current settings.
    pub fn config(&self) -> GeneratorConfig {
        self.config.read().clone()
    }

    /// Applies metadata and minification to `content`.
    fn process_html(
        &self,
        content: &str,
        path: &Path,
        options: Option<&JsonValue>,
    ) -> Result<String> {
        let config = self.config.read();
        let mut processed = content.to_string();

        let mut meta_tags = String::new();
        if let Some(metadata) = &config.metadata {
            meta_tags.push_str(&generate_meta_tags(metadata));
        }
        if let Some(metadata) = options.and_then(|o| o.get("metadata")) {
            meta_tags.push_str(&generate_meta_tags(metadata));
        }
        if !meta_tags.is_empty() {
            inject_metadata(&mut processed, &meta_tags);
        }

        let minify_page = options
            .and_then(|o| o.get("minify"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(config.minify);
        if minify_page {
            processed = minify_html(&processed, path)?;
        }
        Ok(processed)
    }
}

/// Inserts `meta_tags` before `</head>`, creating a head section when the
/// document has none.
fn inject_metadata(content: &mut String, meta_tags: &str) {
    if let Some(head_end) = content.find("</head>") {
        content.insert_str(head_end, meta_tags);
    } else if let Some(html_start) = content.find("<html") {
        let insert_at = content[html_start..]
            .find('>')
            .map_or(content.len(), |p| html_start + p + 1);
        content.insert_str(insert_at, &format!("<head>{}</head>", meta_tags));
    } else {
        content.insert_str(0, &format!("<head>{}</head>", meta_tags));
    }
}

/// Renders the string entries of a metadata object as `<meta>` tags.
fn generate_meta_tags(metadata: &JsonValue) -> String {
    let mut meta_tags = String::new();
    if let Some(obj) = metadata.as_object() {
        for (key, value) in obj {
            if let Some(content) = value.as_str() {
                meta_tags.push_str(&format!(
                    r#"<meta name="{}" content="{}">"#,
                    handlebars::html_escape(key),
                    handlebars::html_escape(content)
                ));
            }
        }
    }
    meta_tags
}

/// Minifies HTML content using the `minify-html` crate.
fn minify_html(content: &str, path: &Path) -> Result<String> {
    let cfg = Cfg {
        minify_css: true,
        minify_js: true,
        ..Cfg::default()
    };
    String::from_utf8(minify(content.as_bytes(), &cfg)).map_err(|e| {
        PortalError::output_generation_error(
            "HTML minification failed",
            path.to_path_buf(),
            Some(Box::new(e)),
        )
    })
}

impl OutputGenerator for HtmlGenerator {
    fn generate(
        &self,
        content: &str,
        path: &Path,
        options: Option<&JsonValue>,
    ) -> Result<()> {
        self.validate(path, options)?;
        let processed = self.process_html(content, path, options)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PortalError::io_error(parent.to_path_buf(), e))?;
        }
        let file = File::create(path)
            .map_err(|e| PortalError::io_error(path.to_path_buf(), e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(processed.as_bytes())
            .map_err(|e| PortalError::io_error(path.to_path_buf(), e))?;
        writer
            .flush()
            .map_err(|e| PortalError::io_error(path.to_path_buf(), e))?;

        debug!("Wrote {} ({} bytes)", path.display(), processed.len());
        Ok(())
    }

    fn validate(
        &self,
        path: &Path,
        options: Option<&JsonValue>,
    ) -> Result<()> {
        if path.extension().and_then(|s| s.to_str()) != Some("html") {
            return Err(PortalError::output_generation_error(
                "Invalid file extension - expected .html",
                path.to_path_buf(),
                None,
            ));
        }
        let Some(opts) = options else {
            return Ok(());
        };
        let Some(obj) = opts.as_object() else {
            return Err(PortalError::output_generation_error(
                "Invalid options format - expected JSON object",
                path.to_path_buf(),
                None,
            ));
        };
        for (key, value) in obj {
            match key.as_str() {
                "minify" if !value.is_boolean() => {
                    return Err(PortalError::output_generation_error(
                        "minify option must be a boolean",
                        path.to_path_buf(),
                        None,
                    ));
                }
                "metadata" if !value.is_object() => {
                    return Err(PortalError::output_generation_error(
                        "metadata option must be an object",
                        path.to_path_buf(),
                        None,
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const PAGE: &str = "<!DOCTYPE html>\n<html>\n<head>\n<title>Usage</title>\n</head>\n<body>\n    <p>Hello</p>\n</body>\n</html>\n";

    #[test]
    fn test_generate_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs/usage/index.html");

        HtmlGenerator::new().generate(PAGE, &path, None).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), PAGE);
    }

    #[test]
    fn test_metadata_is_injected_and_escaped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.html");
        let options = json!({
            "metadata": { "description": "Tips & \"tricks\"", "ignored": 3 }
        });

        HtmlGenerator::new()
            .with_metadata(json!({ "generator": "docsportal" }))
            .generate(PAGE, &path, Some(&options))
            .unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains(
            r#"<meta name="generator" content="docsportal"><meta name="description" content="Tips &amp; &quot;tricks&quot;"></head>"#
        ));
        assert!(!html.contains("ignored"));
    }

    #[test]
    fn test_head_is_created_when_missing() {
        let mut content = "<html lang=\"en\"><body></body></html>".to_string();
        inject_metadata(&mut content, "<meta name=\"a\" content=\"b\">");
        assert_eq!(
            content,
            "<html lang=\"en\"><head><meta name=\"a\" content=\"b\"></head><body></body></html>"
        );
    }

    #[test]
    fn test_minification() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.html");

        HtmlGenerator::new()
            .with_minification(true)
            .generate(PAGE, &path, None)
            .unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.len() < PAGE.len());
        assert!(html.contains("<p>Hello"));
        assert!(!html.contains("\n    <p>"));
    }

    #[test]
    fn test_minify_option_overrides_generator() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.html");

        HtmlGenerator::new()
            .with_minification(true)
            .generate(PAGE, &path, Some(&json!({ "minify": false })))
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), PAGE);
    }

    #[test]
    fn test_validate() {
        let generator = HtmlGenerator::new();
        let html = Path::new("out/index.html");

        assert!(generator.validate(html, None).is_ok());
        assert!(generator.validate(Path::new("out/index.txt"), None).is_err());
        assert!(generator.validate(html, Some(&json!("minify"))).is_err());
        assert!(generator.validate(html, Some(&json!({ "minify": 1 }))).is_err());
        assert!(generator
            .validate(html, Some(&json!({ "metadata": "x" })))
            .is_err());
        assert!(generator
            .validate(html, Some(&json!({ "minify": true, "extra": 1 })))
            .is_ok());
    }

    #[test]
    fn test_builder_on_clone_leaves_original() {
        let base = HtmlGenerator::new();
        let minified = base.clone().with_minification(true);

        assert!(minified.config().minify);
        assert!(!base.config().minify);
    }

    #[test]
    fn test_config_reflects_builder() {
        let config = HtmlGenerator::new().with_minification(true).config();
        assert!(config.minify);
        assert!(config.metadata.is_none());
    }
}
