// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Topic Resolver
//!
//! Turns a requested slug into everything one documentation page needs:
//! the matching descriptor, its content payload, and the navigation derived
//! from catalog order (previous and next topic, breadcrumb trail).
//!
//! The resolver owns a frozen [`Catalog`] and [`ContentStore`]. Every
//! operation takes `&self` and has no side effects, so resolution for
//! different slugs can run on any number of threads.
//!
//! ## Example
//!
//! ```
//! use docsportal::catalog::CatalogBuilder;
//! use docsportal::content::ContentStore;
//! use docsportal::resolver::TopicResolver;
//!
//! let catalog = CatalogBuilder::new()
//!     .topic("installation", "Installation Guide", "Set it up.")
//!     .topic("usage", "Usage Guide", "Use it.")
//!     .topic("architecture", "Architecture", "How it fits.")
//!     .build()
//!     .unwrap();
//! let content = ContentStore::new()
//!     .with_content("installation", "<p>install</p>").unwrap()
//!     .with_content("usage", "<p>usage</p>").unwrap()
//!     .with_content("architecture", "<p>arch</p>").unwrap();
//!
//! let resolver = TopicResolver::new(catalog, content);
//! let page = resolver.resolve("usage").unwrap();
//! assert_eq!(page.navigation.previous.unwrap().slug, "installation");
//! assert_eq!(page.navigation.next.unwrap().slug, "architecture");
//! ```

use crate::builtin::{INDEX_HEADING, INDEX_INTRO};
use crate::catalog::{Catalog, TopicDescriptor};
use crate::content::{ContentStore, TopicContent};
use crate::core::error::NotFoundReason;
use crate::{PortalError, Result};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::path::PathBuf;

/// Label of the first breadcrumb entry on every topic page.
pub const ROOT_LABEL: &str = "Documentation index";

/// Default logical path of the index page.
pub const DEFAULT_BASE_PATH: &str = "/docs";

/// Maps slugs to logical URLs and output files.
///
/// The index lives at the base path and each topic at `{base}/{slug}`.
/// Output files use directory-style pages: `{base}/index.html` and
/// `{base}/{slug}/index.html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLayout {
    prefix: String,
}

impl RouteLayout {
    /// Creates a layout rooted at `base_path`, which must start with `/`.
    pub fn new(base_path: &str) -> Result<Self> {
        if !base_path.starts_with('/') {
            return Err(PortalError::config_error(
                format!("base path `{}` must start with `/`", base_path),
                None,
            ));
        }
        let prefix = base_path.trim_matches('/').to_string();
        if prefix.split('/').any(|s| s == "." || s == "..") {
            return Err(PortalError::config_error(
                format!("base path `{}` must not contain `.` or `..`", base_path),
                None,
            ));
        }
        Ok(Self { prefix })
    }

    /// Logical URL of the index page.
    pub fn index_url(&self) -> String {
        format!("/{}", self.prefix)
    }

    /// Logical URL of a topic page.
    pub fn topic_url(&self, slug: &str) -> String {
        if self.prefix.is_empty() {
            format!("/{}", slug)
        } else {
            format!("/{}/{}", self.prefix, slug)
        }
    }

    /// Output file of the index page, relative to the output directory.
    pub fn index_output(&self) -> PathBuf {
        self.base_dir().join("index.html")
    }

    /// Output file of a topic page, relative to the output directory.
    pub fn topic_output(&self, slug: &str) -> PathBuf {
        self.base_dir().join(slug).join("index.html")
    }

    fn base_dir(&self) -> PathBuf {
        self.prefix.split('/').filter(|s| !s.is_empty()).collect()
    }
}

impl Default for RouteLayout {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_BASE_PATH.trim_matches('/').to_string(),
        }
    }
}

/// One static page the build must generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Topic slug, absent for the index page.
    pub slug: Option<String>,
    /// Logical URL of the page.
    pub url: String,
    /// Output file, relative to the output directory.
    pub output: PathBuf,
}

/// One entry of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    /// Text shown for the entry.
    pub label: String,
    /// Logical URL the entry links to.
    pub href: String,
    /// Slug of the topic, absent for the root entry.
    pub slug: Option<String>,
}

/// Navigation derived from catalog order for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationContext {
    /// The resolved topic.
    pub current: TopicDescriptor,
    /// Root entry first, current topic last.
    pub breadcrumb: Vec<Breadcrumb>,
    /// Topic before `current`, absent for the first topic.
    pub previous: Option<TopicDescriptor>,
    /// Topic after `current`, absent for the last topic.
    pub next: Option<TopicDescriptor>,
}

/// Everything a topic page needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPage {
    /// The matched catalog entry.
    pub descriptor: TopicDescriptor,
    /// The topic body.
    pub content: TopicContent,
    /// Breadcrumb and sibling links.
    pub navigation: NavigationContext,
}

/// One card on the index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCard {
    /// Topic slug.
    pub slug: String,
    /// Topic title.
    pub title: String,
    /// Topic summary.
    pub description: String,
    /// Logical URL of the topic page.
    pub href: String,
}

/// Data for the index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexPage {
    /// Logical URL of the index page.
    pub url: String,
    /// Page heading.
    pub heading: String,
    /// Intro paragraph under the heading.
    pub intro: String,
    /// One card per topic, in catalog order.
    pub topics: Vec<TopicCard>,
}

/// Resolves slugs against a frozen catalog and content store.
#[derive(Debug, Clone)]
pub struct TopicResolver {
    catalog: Catalog,
    content: ContentStore,
    layout: RouteLayout,
    index_heading: String,
    index_intro: String,
}

impl TopicResolver {
    /// Creates a resolver with the default route layout.
    pub fn new(catalog: Catalog, content: ContentStore) -> Self {
        Self {
            catalog,
            content,
            layout: RouteLayout::default(),
            index_heading: INDEX_HEADING.to_string(),
            index_intro: INDEX_INTRO.to_string(),
        }
    }

    /// Replaces the index page heading and intro paragraph.
    pub fn with_index_text<H, I>(mut self, heading: H, intro: I) -> Self
    where
        H: Into<String>,
        I: Into<String>,
    {
        self.index_heading = heading.into();
        self.index_intro = intro.into();
        self
    }

    /// Replaces the route layout.
    pub fn with_layout(mut self, layout: RouteLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The catalog this resolver reads.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The content this resolver reads.
    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// The route layout used for links and output paths.
    pub fn layout(&self) -> &RouteLayout {
        &self.layout
    }

    /// Resolves `slug` into a complete page.
    ///
    /// Fails with [`PortalError::NotFound`] when the slug is not in the
    /// catalog, or is in the catalog without content.
    pub fn resolve(&self, slug: &str) -> Result<ResolvedPage> {
        let position = self.catalog.position(slug).ok_or_else(|| {
            PortalError::not_found(slug, NotFoundReason::UnknownSlug)
        })?;
        let content = self.content.get(slug).ok_or_else(|| {
            PortalError::not_found(slug, NotFoundReason::MissingContent)
        })?;

        let topics = self.catalog.list_all();
        let descriptor = topics[position].clone();
        let previous = position
            .checked_sub(1)
            .and_then(|i| topics.get(i))
            .cloned();
        let next = topics.get(position + 1).cloned();

        let breadcrumb = vec![
            Breadcrumb {
                label: ROOT_LABEL.to_string(),
                href: self.layout.index_url(),
                slug: None,
            },
            Breadcrumb {
                label: descriptor.title.clone(),
                href: self.layout.topic_url(slug),
                slug: Some(descriptor.slug.clone()),
            },
        ];

        debug!(
            "Resolved `{}` (previous: {:?}, next: {:?})",
            slug,
            previous.as_ref().map(|t| t.slug.as_str()),
            next.as_ref().map(|t| t.slug.as_str())
        );

        Ok(ResolvedPage {
            navigation: NavigationContext {
                current: descriptor.clone(),
                breadcrumb,
                previous,
                next,
            },
            content: content.clone(),
            descriptor,
        })
    }

    /// The index route followed by one route per topic, in catalog order.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes = Vec::with_capacity(self.catalog.len() + 1);
        routes.push(Route {
            slug: None,
            url: self.layout.index_url(),
            output: self.layout.index_output(),
        });
        routes.extend(self.catalog.slugs().map(|slug| Route {
            slug: Some(slug.to_string()),
            url: self.layout.topic_url(slug),
            output: self.layout.topic_output(slug),
        }));
        routes
    }

    /// Data for the index page.
    pub fn index_page(&self) -> IndexPage {
        IndexPage {
            url: self.layout.index_url(),
            heading: self.index_heading.clone(),
            intro: self.index_intro.clone(),
            topics: self
                .catalog
                .list_all()
                .iter()
                .map(|topic| TopicCard {
                    slug: topic.slug.clone(),
                    title: topic.title.clone(),
                    description: topic.description.clone(),
                    href: self.layout.topic_url(&topic.slug),
                })
                .collect(),
        }
    }

    /// Resolves every catalog slug, failing on the first that does not.
    ///
    /// Content without a catalog entry is reported as a warning.
    pub fn verify(&self) -> Result<()> {
        for slug in self.catalog.slugs() {
            let _ = self.resolve(slug)?;
        }
        for orphan in self.content.orphans(&self.catalog) {
            warn!("Content for `{}` has no catalog entry", orphan);
        }
        Ok(())
    }

    /// Render context for a topic page: the page itself plus the URLs its
    /// links point at.
    pub fn page_context(&self, page: &ResolvedPage) -> Result<JsonValue> {
        let mut context = serde_json::to_value(page).map_err(|e| {
            PortalError::internal_error(format!(
                "Failed to serialise page `{}`: {}",
                page.descriptor.slug, e
            ))
        })?;
        let link = |topic: &Option<TopicDescriptor>| {
            topic.as_ref().map(|t| self.layout.topic_url(&t.slug))
        };
        context["url"] = self.layout.topic_url(&page.descriptor.slug).into();
        context["index_url"] = self.layout.index_url().into();
        context["previous_url"] = link(&page.navigation.previous).into();
        context["next_url"] = link(&page.navigation.next).into();
        Ok(context)
    }
}
