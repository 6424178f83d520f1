// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Content Module
//!
//! Topic content payloads and the collaborator that sources them from files.
//!
//! At the catalog layer a payload is an opaque [`Markup`] blob: it is never
//! parsed or interpreted, and renderers embed it verbatim. Payloads live in a
//! [`ContentStore`], keyed by slug, which is filled once before resolution
//! and not changed afterwards.
//!
//! ## Key Features
//!
//! - **Opaque payloads** treated as pre-formatted, already-safe markup
//! - **Content directory loading** of `{slug}.html` and `{slug}.md` files
//! - **Markdown rendering** with tables, footnotes, strikethrough and
//!   heading anchors
//! - **Front matter** (`slug`, `toc`) and an optional table of contents

use crate::catalog::Catalog;
use crate::{ContentProcessor, PortalError, Result};
use log::{debug, warn};
use pulldown_cmark::{
    html, CowStr, Event, HeadingLevel, Options as MarkdownOptions, Parser,
    Tag, TagEnd,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum size of a single content file in bytes (10MB).
const MAX_CONTENT_SIZE: usize = 10 * 1024 * 1024;

/// Deepest heading level listed in a generated table of contents.
const TOC_MAX_LEVEL: u8 = 3;

/// A pre-rendered markup payload, embedded verbatim by renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markup(String);

impl Markup {
    /// Wraps an already-rendered markup string.
    pub fn new<S: Into<String>>(markup: S) -> Self {
        Self(markup.into())
    }

    /// The markup as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the payload, returning the markup string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// `true` when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Markup {
    fn from(markup: String) -> Self {
        Self(markup)
    }
}

impl From<&str> for Markup {
    fn from(markup: &str) -> Self {
        Self(markup.to_string())
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The body of one topic, keyed by the slug of its catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicContent {
    /// Slug of the catalog entry this content belongs to.
    pub slug: String,
    /// The pre-rendered document body.
    pub body: Markup,
}

impl TopicContent {
    /// Creates a content payload for `slug`.
    pub fn new<S: Into<String>, B: Into<Markup>>(slug: S, body: B) -> Self {
        Self {
            slug: slug.into(),
            body: body.into(),
        }
    }
}

/// Topic payloads keyed by slug; at most one payload per slug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentStore {
    entries: HashMap<String, TopicContent>,
}

impl ContentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a payload. A second payload for the same slug is rejected.
    pub fn insert(&mut self, content: TopicContent) -> Result<()> {
        if self.entries.contains_key(&content.slug) {
            return Err(PortalError::catalog_integrity(format!(
                "content for `{}` is declared more than once",
                content.slug
            )));
        }
        _ = self.entries.insert(content.slug.clone(), content);
        Ok(())
    }

    /// Builder-style [`ContentStore::insert`].
    pub fn with_content<S: Into<String>, B: Into<Markup>>(
        mut self,
        slug: S,
        body: B,
    ) -> Result<Self> {
        self.insert(TopicContent::new(slug, body))?;
        Ok(self)
    }

    /// Payload for `slug`, if any.
    pub fn get(&self, slug: &str) -> Option<&TopicContent> {
        self.entries.get(slug)
    }

    /// `true` when a payload exists for `slug`.
    pub fn contains(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }

    /// Number of payloads.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the store holds no payloads.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slugs that have content but no catalog entry, sorted.
    pub fn orphans(&self, catalog: &Catalog) -> Vec<&str> {
        self.entries
            .keys()
            .map(String::as_str)
            .filter(|slug| !catalog.contains(slug))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Front matter recognised at the top of a Markdown content file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    /// Declared slug; must match the slug the file is loaded for.
    #[serde(default)]
    pub slug: Option<String>,
    /// Prepend a table of contents.
    #[serde(default)]
    pub toc: bool,
}

/// One heading collected for the table of contents.
#[derive(Debug)]
struct TocEntry {
    text: String,
    level: u8,
    id: String,
}

/// Renders Markdown topic files into markup payloads.
#[derive(Debug, Clone)]
pub struct MarkdownProcessor {
    options: MarkdownOptions,
}

impl MarkdownProcessor {
    /// Creates a processor with heading attributes enabled.
    pub fn new() -> Self {
        Self {
            options: MarkdownOptions::ENABLE_HEADING_ATTRIBUTES,
        }
    }

    /// Enables or disables table support.
    pub fn with_tables(mut self, enable: bool) -> Self {
        self.options.set(MarkdownOptions::ENABLE_TABLES, enable);
        self
    }

    /// Enables or disables strikethrough support.
    pub fn with_strikethrough(mut self, enable: bool) -> Self {
        self.options
            .set(MarkdownOptions::ENABLE_STRIKETHROUGH, enable);
        self
    }

    /// Enables or disables footnote support.
    pub fn with_footnotes(mut self, enable: bool) -> Self {
        self.options.set(MarkdownOptions::ENABLE_FOOTNOTES, enable);
        self
    }

    /// Splits leading `---` front matter from the Markdown body.
    fn split_front_matter<'c>(
        &self,
        content: &'c str,
    ) -> Result<(FrontMatter, &'c str)> {
        let rest = match content
            .strip_prefix("---\n")
            .or_else(|| content.strip_prefix("---\r\n"))
        {
            Some(rest) => rest,
            None => return Ok((FrontMatter::default(), content)),
        };

        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim_end() == "---" {
                let yaml = &rest[..offset];
                let body = &rest[offset + line.len()..];
                let front_matter = if yaml.trim().is_empty() {
                    FrontMatter::default()
                } else {
                    serde_yml::from_str(yaml).map_err(|e| {
                        PortalError::content_processing_error(
                            "Invalid front matter",
                            Some(Box::new(e)),
                        )
                    })?
                };
                return Ok((front_matter, body));
            }
            offset += line.len();
        }

        Err(PortalError::content_processing_error(
            "Front matter is not closed with `---`",
            None,
        ))
    }

    /// Renders Markdown to HTML, giving every heading an anchor id.
    fn render(&self, markdown: &str, toc: bool) -> String {
        let mut events: Vec<Event<'_>> =
            Parser::new_ext(markdown, self.options).collect();
        let mut entries = Vec::new();
        // Explicit `{#id}` anchors are reserved before any are generated.
        let mut used: HashSet<String> = events
            .iter()
            .filter_map(|event| match event {
                Event::Start(Tag::Heading { id: Some(id), .. }) => {
                    Some(id.to_string())
                }
                _ => None,
            })
            .collect();

        let mut i = 0;
        while i < events.len() {
            let level = match &events[i] {
                Event::Start(Tag::Heading { level, .. }) => *level,
                _ => {
                    i += 1;
                    continue;
                }
            };

            let mut text = String::new();
            let mut end = i + 1;
            while end < events.len() {
                match &events[end] {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) | Event::Code(t) => text.push_str(t),
                    _ => {}
                }
                end += 1;
            }

            if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
                let anchor = match id {
                    Some(existing) => existing.to_string(),
                    None => {
                        let anchor =
                            unique_anchor(heading_anchor(&text), &mut used);
                        *id = Some(CowStr::from(anchor.clone()));
                        anchor
                    }
                };
                entries.push(TocEntry {
                    text,
                    level: heading_level_number(level),
                    id: anchor,
                });
            }
            i = end + 1;
        }

        let mut output = String::with_capacity(markdown.len() * 2);
        if toc {
            output.push_str(&build_toc_html(&entries));
        }
        html::push_html(&mut output, events.into_iter());
        output
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
            .with_tables(true)
            .with_strikethrough(true)
            .with_footnotes(true)
    }
}

impl ContentProcessor for MarkdownProcessor {
    /// Renders Markdown with optional front matter.
    ///
    /// The context may carry `slug` (checked against the front matter slug)
    /// and `toc` (forces a table of contents).
    fn process(
        &self,
        content: &str,
        context: Option<&JsonValue>,
    ) -> Result<String> {
        self.validate(content)?;

        let (front_matter, body) = self.split_front_matter(content)?;
        let expected_slug =
            context.and_then(|ctx| ctx.get("slug")).and_then(JsonValue::as_str);

        if let (Some(declared), Some(expected)) =
            (front_matter.slug.as_deref(), expected_slug)
        {
            if declared != expected {
                return Err(PortalError::content_processing_error(
                    format!(
                        "front matter slug `{}` does not match `{}`",
                        declared, expected
                    ),
                    None,
                ));
            }
        }

        let toc = front_matter.toc
            || context
                .and_then(|ctx| ctx.get("toc"))
                .and_then(JsonValue::as_bool)
                .unwrap_or(false);

        Ok(self.render(body, toc))
    }

    fn validate(&self, content: &str) -> Result<()> {
        if content.len() > MAX_CONTENT_SIZE {
            return Err(PortalError::content_processing_error(
                format!(
                    "Content exceeds maximum size of {} bytes",
                    MAX_CONTENT_SIZE
                ),
                None,
            ));
        }
        if content.trim().is_empty() {
            return Err(PortalError::content_processing_error(
                "Content cannot be empty",
                None,
            ));
        }
        Ok(())
    }
}

/// Lowercase, hyphenated anchor for a heading.
pub fn heading_anchor(text: &str) -> String {
    let mut anchor = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        match c {
            'a'..='z' | '0'..='9' => anchor.push(c),
            ' ' | '-' | '_' if !anchor.ends_with('-') => anchor.push('-'),
            _ => {}
        }
    }
    let anchor = anchor.trim_matches('-').to_string();
    if anchor.is_empty() {
        "section".to_string()
    } else {
        anchor
    }
}

fn unique_anchor(base: String, used: &mut HashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut suffix = 0;
    while used.contains(&candidate) {
        suffix += 1;
        candidate = format!("{}-{}", base, suffix);
    }
    _ = used.insert(candidate.clone());
    candidate
}

fn heading_level_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn build_toc_html(entries: &[TocEntry]) -> String {
    let mut toc = String::from(
        "<nav class=\"toc\" aria-label=\"Table of Contents\">\n<ul>\n",
    );
    let mut current_level = 1;

    for entry in entries.iter().filter(|e| e.level <= TOC_MAX_LEVEL) {
        while entry.level > current_level {
            toc.push_str("<ul>\n");
            current_level += 1;
        }
        while entry.level < current_level {
            toc.push_str("</ul>\n");
            current_level -= 1;
        }
        toc.push_str(&format!(
            "<li><a href=\"#{}\">{}</a></li>\n",
            entry.id,
            handlebars::html_escape(&entry.text)
        ));
    }

    while current_level > 1 {
        toc.push_str("</ul>\n");
        current_level -= 1;
    }
    toc.push_str("</ul>\n</nav>\n");
    toc
}

/// Reads topic content files from a directory.
///
/// For each catalog slug the loader looks for `{slug}.html`, embedded
/// verbatim, and `{slug}.md`, rendered with a [`MarkdownProcessor`]. Slugs
/// without a file are left missing for the resolver to report.
#[derive(Debug)]
pub struct ContentLoader {
    content_dir: PathBuf,
    markdown: MarkdownProcessor,
}

impl ContentLoader {
    /// Creates a loader for `content_dir`.
    pub fn new<P: AsRef<Path>>(content_dir: P) -> Self {
        Self {
            content_dir: content_dir.as_ref().to_path_buf(),
            markdown: MarkdownProcessor::default(),
        }
    }

    /// Replaces the Markdown processor.
    pub fn with_markdown(mut self, markdown: MarkdownProcessor) -> Self {
        self.markdown = markdown;
        self
    }

    /// Loads the content of every catalog topic found in the directory.
    pub fn load(&self, catalog: &Catalog) -> Result<ContentStore> {
        if !self.content_dir.is_dir() {
            return Err(PortalError::config_error(
                "Content directory does not exist",
                Some(self.content_dir.clone()),
            ));
        }

        let mut store = ContentStore::new();
        for slug in catalog.slugs() {
            let html_path = self.content_dir.join(format!("{}.html", slug));
            if let Some(body) = read_content(&html_path)? {
                debug!("Loading HTML content for `{}`", slug);
                store.insert(TopicContent::new(slug, body))?;
            }

            let md_path = self.content_dir.join(format!("{}.md", slug));
            if let Some(source) = read_content(&md_path)? {
                debug!("Rendering Markdown content for `{}`", slug);
                let body = self
                    .markdown
                    .process(&source, Some(&serde_json::json!({ "slug": slug })))
                    .map_err(|e| match e {
                        PortalError::ContentProcessingError {
                            message,
                            source,
                        } => PortalError::content_processing_error(
                            format!("{} ({})", message, md_path.display()),
                            source,
                        ),
                        other => other,
                    })?;
                store.insert(TopicContent::new(slug, body))?;
            }
        }

        for stem in self.content_stems()? {
            if !catalog.contains(&stem) {
                warn!(
                    "Content file `{}` has no catalog entry and will not be published",
                    stem
                );
            }
        }

        Ok(store)
    }

    /// File stems of `.html` and `.md` files in the content directory.
    fn content_stems(&self) -> Result<BTreeSet<String>> {
        let mut stems = BTreeSet::new();
        let entries = fs::read_dir(&self.content_dir)
            .map_err(|e| PortalError::io_error(self.content_dir.clone(), e))?;
        for entry in entries {
            let path = entry?.path();
            let is_content = matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("html") | Some("md")
            );
            if !is_content || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                _ = stems.insert(stem.to_string());
            }
        }
        Ok(stems)
    }
}

/// Contents of a content file; `None` when it is absent or blank, so the
/// topic is reported as missing content.
fn read_content(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let source = fs::read_to_string(path)
        .map_err(|e| PortalError::io_error(path.to_path_buf(), e))?;
    if source.trim().is_empty() {
        warn!("Ignoring empty content file {}", path.display());
        return Ok(None);
    }
    Ok(Some(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use serde_json::json;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        CatalogBuilder::new()
            .topic("installation", "Installation Guide", "Install it.")
            .topic("usage", "Usage Guide", "Use it.")
            .topic("license", "License", "Terms.")
            .build()
            .unwrap()
    }

    #[test]
    fn test_store_rejects_duplicate_content() {
        let store = ContentStore::new()
            .with_content("usage", "<p>one</p>")
            .unwrap();
        let err = store.with_content("usage", "<p>two</p>").unwrap_err();
        assert!(matches!(err, PortalError::CatalogIntegrity { .. }));
    }

    #[test]
    fn test_store_orphans() {
        let store = ContentStore::new()
            .with_content("usage", "<p>usage</p>")
            .unwrap()
            .with_content("zeta", "<p>z</p>")
            .unwrap()
            .with_content("alpha", "<p>a</p>")
            .unwrap();
        assert_eq!(store.orphans(&catalog()), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_markup_is_kept_verbatim() {
        let body = "<div class=\"tip\"><strong>Tip</strong></div>";
        let content = TopicContent::new("usage", body);
        assert_eq!(content.body.as_str(), body);
        assert_eq!(content.body.to_string(), body);
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!({ "slug": "usage", "body": body })
        );
    }

    #[test]
    fn test_markdown_renders_heading_anchors() {
        let processor = MarkdownProcessor::default();
        let html = processor
            .process("## Quick Start\n\nText.\n\n## Quick Start\n", None)
            .unwrap();
        assert!(html.contains("<h2 id=\"quick-start\">Quick Start</h2>"));
        assert!(html.contains("<h2 id=\"quick-start-1\">Quick Start</h2>"));
    }

    fn heading_ids(html: &str) -> Vec<&str> {
        html.split("id=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .collect()
    }

    #[test]
    fn test_generated_anchor_avoids_explicit_id() {
        let processor = MarkdownProcessor::default();
        let html = processor
            .process("# Quick Start {#quick-start}\n\n## Quick Start\n", None)
            .unwrap();
        assert_eq!(heading_ids(&html), vec!["quick-start", "quick-start-1"]);
    }

    #[test]
    fn test_suffixed_anchor_does_not_collide() {
        let processor = MarkdownProcessor::default();
        let html = processor
            .process("# A\n\n# A\n\n# A-1\n", Some(&json!({ "toc": true })))
            .unwrap();
        let ids = heading_ids(&html);
        assert_eq!(ids, vec!["a", "a-1", "a-1-1"]);
        assert!(html.contains("<a href=\"#a-1-1\">A-1</a>"));
    }

    #[test]
    fn test_markdown_keeps_explicit_heading_ids() {
        let processor = MarkdownProcessor::default();
        let html =
            processor.process("# Docker {#docker-setup}\n", None).unwrap();
        assert!(html.contains("id=\"docker-setup\""));
    }

    #[test]
    fn test_markdown_tables_and_strikethrough() {
        let processor = MarkdownProcessor::default();
        let html = processor
            .process("| A | B |\n|---|---|\n| 1 | 2 |\n\n~~old~~", None)
            .unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>"));
    }

    #[test]
    fn test_front_matter_toc() {
        let processor = MarkdownProcessor::default();
        let input = "---\ntoc: true\n---\n# Setup\n\n## Linux\n\n## macOS\n";
        let html = processor.process(input, None).unwrap();
        assert!(html.starts_with("<nav class=\"toc\""));
        assert!(html.contains("<a href=\"#linux\">Linux</a>"));
        assert!(!html.contains("toc: true"));
    }

    #[test]
    fn test_toc_from_context() {
        let processor = MarkdownProcessor::default();
        let html = processor
            .process("# One\n", Some(&json!({ "toc": true })))
            .unwrap();
        assert!(html.contains("<a href=\"#one\">One</a>"));
    }

    #[test]
    fn test_front_matter_slug_mismatch() {
        let processor = MarkdownProcessor::default();
        let input = "---\nslug: usage\n---\n# Body\n";
        assert!(processor
            .process(input, Some(&json!({ "slug": "usage" })))
            .is_ok());
        let err = processor
            .process(input, Some(&json!({ "slug": "license" })))
            .unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_unclosed_front_matter() {
        let processor = MarkdownProcessor::default();
        assert!(processor.process("---\ntoc: true\n# Body\n", None).is_err());
    }

    #[test]
    fn test_validation() {
        let processor = MarkdownProcessor::default();
        assert!(processor.validate("").is_err());
        assert!(processor.validate("   \n").is_err());
        assert!(processor.validate("# Valid").is_ok());
    }

    #[test]
    fn test_heading_anchor() {
        assert_eq!(heading_anchor("Hello World! 123"), "hello-world-123");
        assert_eq!(heading_anchor("  Linux -- AMD64 "), "linux-amd64");
        assert_eq!(heading_anchor("🐳"), "section");
    }

    #[test]
    fn test_loader_reads_html_and_markdown() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("installation.html"),
            "<h2>Quick Start</h2>",
        )
        .unwrap();
        fs::write(temp_dir.path().join("usage.md"), "# Usage\n\nRun it.")
            .unwrap();
        fs::write(temp_dir.path().join("stray.md"), "# Stray").unwrap();

        let store = ContentLoader::new(temp_dir.path()).load(&catalog()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get("installation").unwrap().body.as_str(),
            "<h2>Quick Start</h2>"
        );
        assert!(store.get("usage").unwrap().body.as_str().contains("<h1"));
        assert!(!store.contains("license"));
        assert!(!store.contains("stray"));
    }

    #[test]
    fn test_loader_treats_blank_files_as_missing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("installation.html"), "  \n").unwrap();
        fs::write(temp_dir.path().join("usage.md"), "").unwrap();
        fs::write(temp_dir.path().join("license.md"), "# License\n").unwrap();

        let store = ContentLoader::new(temp_dir.path()).load(&catalog()).unwrap();

        assert!(!store.contains("installation"));
        assert!(!store.contains("usage"));
        assert!(store.contains("license"));
    }

    #[test]
    fn test_loader_rejects_two_files_for_one_slug() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("usage.html"), "<p>a</p>").unwrap();
        fs::write(temp_dir.path().join("usage.md"), "b").unwrap();

        let err = ContentLoader::new(temp_dir.path())
            .load(&catalog())
            .unwrap_err();
        assert!(matches!(err, PortalError::CatalogIntegrity { .. }));
    }

    #[test]
    fn test_loader_requires_directory() {
        let temp_dir = TempDir::new().unwrap();
        let err = ContentLoader::new(temp_dir.path().join("missing"))
            .load(&catalog())
            .unwrap_err();
        assert!(matches!(err, PortalError::ConfigError { .. }));
    }

    #[test]
    fn test_loader_reports_markdown_path() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("usage.md"), "---\nslug: other\n---\nx")
            .unwrap();
        let err = ContentLoader::new(temp_dir.path())
            .load(&catalog())
            .unwrap_err();
        assert!(err.to_string().contains("usage.md"));
    }
}
