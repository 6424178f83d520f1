// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The built-in WaddlePerf documentation portal.
//!
//! Topic metadata is declared here in display order and each topic's body is
//! compiled into the binary from `content/{slug}.html`. The same directory
//! can be passed to the content loader to edit pages without rebuilding.

use crate::catalog::{Catalog, TopicDescriptor};
use crate::content::{ContentStore, TopicContent};
use crate::Result;

/// Heading of the built-in index page.
pub const INDEX_HEADING: &str = "📚 Documentation";

/// Intro paragraph of the built-in index page.
pub const INDEX_INTRO: &str = "Comprehensive guides and documentation for WaddlePerf - your network performance testing platform";

/// `(slug, title, description)` in display order.
const TOPICS: &[(&str, &str, &str)] = &[
    (
        "installation",
        "Installation Guide",
        "Step-by-step instructions to install and set up WaddlePerf on your system",
    ),
    (
        "usage",
        "Usage Guide",
        "Learn how to use WaddlePerf for network performance testing and monitoring",
    ),
    (
        "architecture",
        "Architecture",
        "Technical overview of WaddlePerf's system architecture and components",
    ),
    (
        "autoperf",
        "AutoPerf Mode",
        "Automated performance monitoring with tiered testing and alerts",
    ),
    (
        "contributing",
        "Contributing",
        "Guidelines for contributing to the WaddlePerf project",
    ),
    (
        "release-notes",
        "Release Notes",
        "Latest updates, features, and improvements in WaddlePerf releases",
    ),
    (
        "public-regions",
        "Public Regions",
        "Information about public WaddlePerf test regions and endpoints",
    ),
    (
        "license",
        "License",
        "License information and terms for using WaddlePerf",
    ),
];

/// `(slug, body)` for every built-in topic.
const BODIES: &[(&str, &str)] = &[
    ("installation", include_str!("../content/installation.html")),
    ("usage", include_str!("../content/usage.html")),
    ("architecture", include_str!("../content/architecture.html")),
    ("autoperf", include_str!("../content/autoperf.html")),
    ("contributing", include_str!("../content/contributing.html")),
    ("release-notes", include_str!("../content/release-notes.html")),
    ("public-regions", include_str!("../content/public-regions.html")),
    ("license", include_str!("../content/license.html")),
];

/// The built-in catalog.
pub fn catalog() -> Result<Catalog> {
    Catalog::new(
        TOPICS
            .iter()
            .map(|&(slug, title, description)| {
                TopicDescriptor::new(slug, title, description)
            })
            .collect(),
    )
}

/// The built-in content for every topic of [`catalog`].
pub fn content() -> Result<ContentStore> {
    let mut store = ContentStore::new();
    for &(slug, body) in BODIES {
        store.insert(TopicContent::new(slug, body.trim()))?;
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_order() {
        let catalog = catalog().unwrap();
        let slugs: Vec<&str> = catalog.slugs().collect();
        assert_eq!(
            slugs,
            vec![
                "installation",
                "usage",
                "architecture",
                "autoperf",
                "contributing",
                "release-notes",
                "public-regions",
                "license",
            ]
        );
    }

    #[test]
    fn test_every_builtin_topic_has_content() {
        let catalog = catalog().unwrap();
        let content = content().unwrap();
        for slug in catalog.slugs() {
            let body = &content.get(slug).unwrap().body;
            assert!(!body.is_empty(), "`{}` has an empty body", slug);
        }
        assert!(content.orphans(&catalog).is_empty());
    }

    #[test]
    fn test_installation_is_the_expanded_page() {
        let content = content().unwrap();
        let body = content.get("installation").unwrap().body.as_str();
        assert!(body.contains("id=\"quick-start\""));
        assert!(body.contains("System Tray Mode"));
    }
}
