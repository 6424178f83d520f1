// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Catalog Registry
//!
//! The catalog is the single source of truth for which documentation topics
//! exist and in what order they appear. It is built once, validated, and then
//! frozen: there is no update or delete operation, so the invariants checked
//! at construction hold for every later read.
//!
//! Invariants enforced by [`Catalog::new`]:
//!
//! - every slug is unique across the catalog
//! - every slug is URL-safe (ASCII letters, digits, `-` and `_`)
//! - every title and description is non-empty
//!
//! ## Example
//!
//! ```
//! use docsportal::catalog::CatalogBuilder;
//!
//! let catalog = CatalogBuilder::new()
//!     .topic("installation", "Installation Guide", "Set it up.")
//!     .topic("usage", "Usage Guide", "Use it.")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(catalog.len(), 2);
//! assert_eq!(catalog.position("usage"), Some(1));
//! ```

use crate::{PortalError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Metadata for one documentation topic, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDescriptor {
    /// URL-safe identifier, unique across the catalog.
    pub slug: String,
    /// Display name.
    pub title: String,
    /// One-paragraph summary shown on the index page.
    pub description: String,
}

impl TopicDescriptor {
    /// Creates a descriptor. Validation happens when it joins a catalog.
    pub fn new<S, T, D>(slug: S, title: T, description: D) -> Self
    where
        S: Into<String>,
        T: Into<String>,
        D: Into<String>,
    {
        Self {
            slug: slug.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Returns `true` when `slug` can be used verbatim as a URL path segment.
pub fn is_url_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// The ordered, immutable set of documentation topics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    topics: Vec<TopicDescriptor>,
    index: HashMap<String, usize>,
}

/// On-disk catalog layout: a list of `[[topics]]` tables.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    topics: Vec<TopicDescriptor>,
}

impl Catalog {
    /// Builds a catalog from topics in display order, checking every
    /// invariant before freezing it.
    pub fn new(topics: Vec<TopicDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(topics.len());

        for (position, topic) in topics.iter().enumerate() {
            if !is_url_safe_slug(&topic.slug) {
                return Err(PortalError::catalog_integrity(format!(
                    "slug `{}` at position {} is not URL-safe",
                    topic.slug, position
                )));
            }
            if topic.title.trim().is_empty() {
                return Err(PortalError::catalog_integrity(format!(
                    "topic `{}` has an empty title",
                    topic.slug
                )));
            }
            if topic.description.trim().is_empty() {
                return Err(PortalError::catalog_integrity(format!(
                    "topic `{}` has an empty description",
                    topic.slug
                )));
            }
            if let Some(first) = index.insert(topic.slug.clone(), position)
            {
                return Err(PortalError::catalog_integrity(format!(
                    "duplicate slug `{}` at positions {} and {}",
                    topic.slug, first, position
                )));
            }
        }

        debug!("Catalog frozen with {} topics", topics.len());
        Ok(Self { topics, index })
    }

    /// The catalog with no topics.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a TOML catalog made of `[[topics]]` tables.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(source).map_err(|e| {
            PortalError::config_error(
                format!("Failed to parse catalog: {}", e),
                None,
            )
        })?;
        Self::new(file.topics)
    }

    /// Reads and parses a TOML catalog file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| PortalError::io_error(path.to_path_buf(), e))?;
        Self::from_toml_str(&source).map_err(|e| match e {
            PortalError::ConfigError { message, .. } => {
                PortalError::config_error(message, Some(path.to_path_buf()))
            }
            other => other,
        })
    }

    /// Every topic, in declared order.
    pub fn list_all(&self) -> &[TopicDescriptor] {
        &self.topics
    }

    /// Point lookup by slug.
    pub fn find_by_slug(&self, slug: &str) -> Option<&TopicDescriptor> {
        self.position(slug).map(|i| &self.topics[i])
    }

    /// Zero-based display position of `slug`.
    pub fn position(&self, slug: &str) -> Option<usize> {
        self.index.get(slug).copied()
    }

    /// Topic at a display position.
    pub fn get(&self, position: usize) -> Option<&TopicDescriptor> {
        self.topics.get(position)
    }

    /// Slugs in declared order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> + '_ {
        self.topics.iter().map(|t| t.slug.as_str())
    }

    /// Number of topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// `true` when the catalog declares no topics.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// `true` when `slug` is declared.
    pub fn contains(&self, slug: &str) -> bool {
        self.index.contains_key(slug)
    }
}

/// Fluent construction of a [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    topics: Vec<TopicDescriptor>,
}

impl CatalogBuilder {
    /// Starts an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a topic; order of calls is display order.
    pub fn topic<S, T, D>(mut self, slug: S, title: T, description: D) -> Self
    where
        S: Into<String>,
        T: Into<String>,
        D: Into<String>,
    {
        self.topics
            .push(TopicDescriptor::new(slug, title, description));
        self
    }

    /// Appends an existing descriptor.
    pub fn descriptor(mut self, descriptor: TopicDescriptor) -> Self {
        self.topics.push(descriptor);
        self
    }

    /// Validates and freezes the catalog.
    pub fn build(self) -> Result<Catalog> {
        Catalog::new(self.topics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn three_topics() -> Catalog {
        CatalogBuilder::new()
            .topic("installation", "Installation Guide", "Install it.")
            .topic("usage", "Usage Guide", "Use it.")
            .topic("architecture", "Architecture", "How it fits.")
            .build()
            .unwrap()
    }

    #[test]
    fn test_list_all_preserves_declared_order() {
        let catalog = three_topics();
        let slugs: Vec<&str> =
            catalog.list_all().iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["installation", "usage", "architecture"]);
        assert_eq!(catalog.list_all(), catalog.list_all());
    }

    #[test]
    fn test_find_by_slug() {
        let catalog = three_topics();
        let usage = catalog.find_by_slug("usage").unwrap();
        assert_eq!(usage.title, "Usage Guide");
        assert!(catalog.find_by_slug("does-not-exist").is_none());
        assert!(catalog.contains("architecture"));
    }

    #[test]
    fn test_slugs_are_unique() {
        let catalog = three_topics();
        let unique: HashSet<&str> = catalog.slugs().collect();
        assert_eq!(unique.len(), catalog.len());
    }

    #[test]
    fn test_duplicate_slug_is_rejected() {
        let result = CatalogBuilder::new()
            .topic("usage", "Usage", "One.")
            .topic("usage", "Usage again", "Two.")
            .build();
        let err = result.unwrap_err();
        assert!(matches!(err, PortalError::CatalogIntegrity { .. }));
        assert!(err.to_string().contains("duplicate slug `usage`"));
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        assert!(CatalogBuilder::new()
            .topic("usage", "  ", "Summary.")
            .build()
            .is_err());
        assert!(CatalogBuilder::new()
            .topic("usage", "Usage", "")
            .build()
            .is_err());
    }

    #[test]
    fn test_unsafe_slugs_are_rejected() {
        for slug in ["", "a b", "../etc", "über", "a/b"] {
            let result =
                CatalogBuilder::new().topic(slug, "Title", "Desc.").build();
            assert!(result.is_err(), "slug {:?} should be rejected", slug);
        }
        assert!(is_url_safe_slug("release-notes"));
        assert!(is_url_safe_slug("public_regions2"));
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.list_all().is_empty());
        assert!(catalog.find_by_slug("installation").is_none());
    }

    #[test]
    fn test_from_toml_str() {
        let catalog = Catalog::from_toml_str(
            r#"
[[topics]]
slug = "license"
title = "License"
description = "Terms of use."
"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().slug, "license");
    }

    #[test]
    fn test_from_toml_str_without_topics_is_empty() {
        let catalog = Catalog::from_toml_str("").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_from_file_reports_path_on_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.toml");
        fs::write(&path, "[[topics]]\nslug = 3\n").unwrap();

        match Catalog::from_file(&path).unwrap_err() {
            PortalError::ConfigError { path: Some(p), .. } => {
                assert_eq!(p, path)
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
