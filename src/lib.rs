// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # DocsPortal Library
//!
//! DocsPortal publishes a fixed set of documentation topics as a static
//! site: an index page listing every topic, and one page per topic with a
//! breadcrumb trail and previous/next links in catalog order.
//!
//! The core is small and pure. A [`catalog::Catalog`] holds the ordered,
//! validated topic descriptors, a [`content::ContentStore`] holds each
//! topic's pre-rendered body, and a [`resolver::TopicResolver`] turns a slug
//! into the page data a renderer needs. Around it, [`DocsPortal`] loads the
//! configuration, renders pages with Handlebars and writes them to disk.

#![doc = include_str!("../README.md")]
#![doc(html_root_url = "https://docs.rs/docsportal")]
#![crate_name = "docsportal"]
#![crate_type = "lib"]

use crate::catalog::Catalog;
use crate::content::{ContentLoader, ContentStore};
use crate::core::config::{Config, MissingContentPolicy};
use crate::generators::html::HtmlGenerator;
use crate::resolver::{RouteLayout, TopicResolver};
use crate::template::{
    HandlebarsRenderer, INDEX_TEMPLATE, NOT_FOUND_TEMPLATE, TOPIC_TEMPLATE,
};
use log::{debug, info, warn};
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};

pub use crate::core::error::{PortalError, Result};

/// Module containing core utilities, such as configuration and error handling.
pub mod core {
    /// Handles configuration of the DocsPortal application.
    pub mod config;
    /// Contains error types and handling for DocsPortal.
    pub mod error;
}

/// The built-in WaddlePerf documentation set.
pub mod builtin;

/// The ordered, validated topic registry.
pub mod catalog;

/// Provides command-line interface utilities.
pub mod cli;

/// Topic content payloads and their loader.
pub mod content;

/// Provides output generation utilities.
pub mod generators {
    /// HTML page writer.
    pub mod html;
}

/// Slug resolution, navigation and routes.
pub mod resolver;

/// Provides template rendering utilities.
pub mod template;

/// Trait for content processing implementations.
///
/// Implementations of this trait process content, transforming it based on
/// a given context.
pub trait ContentProcessor: Send + Sync + std::fmt::Debug {
    /// Processes the provided content with an optional context.
    ///
    /// # Arguments
    /// * `content` - The content to be processed.
    /// * `context` - An optional context for additional processing.
    ///
    /// # Returns
    /// * `Result<String>` - The processed content, or an error if processing fails.
    fn process(
        &self,
        content: &str,
        context: Option<&JsonValue>,
    ) -> Result<String>;

    /// Validates the content without processing.
    fn validate(&self, content: &str) -> Result<()>;
}

/// Trait for template rendering implementations.
///
/// This trait defines methods for rendering and validating templates.
pub trait TemplateRenderer: Send + Sync + std::fmt::Debug {
    /// Renders a template with the specified context.
    ///
    /// # Arguments
    /// * `template` - The template name.
    /// * `context` - The context data for rendering the template.
    fn render(&self, template: &str, context: &JsonValue) -> Result<String>;

    /// Checks that the template exists and can accept the context.
    fn validate(&self, template: &str, context: &JsonValue) -> Result<()>;
}

/// Trait for output generation implementations.
///
/// Defines methods for generating output files.
pub trait OutputGenerator: Send + Sync + std::fmt::Debug {
    /// Generates output from the given content to the specified path.
    ///
    /// # Arguments
    /// * `content` - The content to be output.
    /// * `path` - The output file path.
    /// * `options` - Optional settings for generation.
    fn generate(
        &self,
        content: &str,
        path: &Path,
        options: Option<&JsonValue>,
    ) -> Result<()>;

    /// Validates the path and options for output generation.
    fn validate(&self, path: &Path, options: Option<&JsonValue>) -> Result<()>;
}

/// Outcome of [`DocsPortal::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Every file written, index first.
    pub written: Vec<PathBuf>,
    /// Slugs written as "page not found" placeholders.
    pub placeholders: Vec<String>,
}

/// The documentation site build pipeline.
#[derive(Debug)]
pub struct DocsPortal {
    config: Config,
    resolver: TopicResolver,
    renderer: Box<dyn TemplateRenderer>,
    generator: Box<dyn OutputGenerator>,
}

impl DocsPortal {
    /// Creates a pipeline from explicit collaborators.
    pub fn new(
        config: Config,
        resolver: TopicResolver,
        renderer: Box<dyn TemplateRenderer>,
        generator: Box<dyn OutputGenerator>,
    ) -> Self {
        Self {
            config,
            resolver,
            renderer,
            generator,
        }
    }

    /// Creates a pipeline from configuration.
    ///
    /// The built-in catalog and content are used unless `catalog_file` or
    /// `content_dir` point elsewhere.
    pub fn from_config(config: Config) -> Result<Self> {
        let resolver = resolver_from_config(&config)?;

        let renderer = match &config.template_dir {
            Some(dir) => HandlebarsRenderer::with_template_dir(dir)?,
            None => HandlebarsRenderer::new()?,
        }
        .with_strict_mode(config.template.strict_mode);
        let generator =
            HtmlGenerator::new().with_minification(config.minify_output());

        Ok(Self::new(
            config,
            resolver,
            Box::new(renderer),
            Box::new(generator),
        ))
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The resolver pages are built from.
    pub fn resolver(&self) -> &TopicResolver {
        &self.resolver
    }

    /// Renders and writes the index page and every topic page.
    pub fn build(&self) -> Result<BuildReport> {
        info!(
            "Building {} topics into {}",
            self.resolver.catalog().len(),
            self.config.output_dir.display()
        );

        let site = serde_json::to_value(&self.config.site).map_err(|e| {
            PortalError::internal_error(format!(
                "Failed to serialise site settings: {}",
                e
            ))
        })?;
        let mut report = BuildReport::default();

        for route in self.resolver.routes() {
            let path = self.config.output_dir.join(&route.output);
            match route.slug {
                None => {
                    self.write_index(&site, &path)?;
                }
                Some(slug) => match self.resolver.resolve(&slug) {
                    Ok(page) => {
                        let mut context = self.resolver.page_context(&page)?;
                        context["site"] = site.clone();
                        let description = page.descriptor.description.clone();
                        self.write_page(
                            TOPIC_TEMPLATE,
                            &context,
                            &path,
                            &description,
                        )?;
                    }
                    Err(e) if e.is_not_found() => match self.config.on_missing {
                        MissingContentPolicy::Fail => return Err(e),
                        MissingContentPolicy::Placeholder => {
                            warn!("{} Writing a placeholder page.", e);
                            let context = json!({
                                "site": site,
                                "slug": slug,
                                "url": route.url,
                                "index_url": self.resolver.layout().index_url(),
                            });
                            self.write_page(
                                NOT_FOUND_TEMPLATE,
                                &context,
                                &path,
                                "Page not found",
                            )?;
                            report.placeholders.push(slug);
                        }
                    },
                    Err(e) => return Err(e),
                },
            }
            report.written.push(path);
        }

        info!(
            "Wrote {} pages ({} placeholders)",
            report.written.len(),
            report.placeholders.len()
        );
        Ok(report)
    }

    fn write_index(&self, site: &JsonValue, path: &Path) -> Result<()> {
        let index = self.resolver.index_page();
        let context = json!({
            "site": site,
            "url": index.url,
            "heading": index.heading,
            "intro": index.intro,
            "topics": index.topics,
        });
        self.write_page(INDEX_TEMPLATE, &context, path, &index.intro)
    }

    fn write_page(
        &self,
        template: &str,
        context: &JsonValue,
        path: &Path,
        description: &str,
    ) -> Result<()> {
        self.renderer.validate(template, context)?;
        let html = self.renderer.render(template, context)?;
        let options = json!({ "metadata": { "description": description } });
        debug!("Writing `{}` page to {}", template, path.display());
        self.generator.generate(&html, path, Some(&options))
    }
}

/// Builds the resolver described by `config`: catalog, content and routes.
pub fn resolver_from_config(config: &Config) -> Result<TopicResolver> {
    let catalog = match &config.catalog_file {
        Some(path) => Catalog::from_file(path)?,
        None => builtin::catalog()?,
    };
    let content: ContentStore = match &config.content_dir {
        Some(dir) => ContentLoader::new(dir).load(&catalog)?,
        None => builtin::content()?,
    };
    let layout = RouteLayout::new(&config.site.base_path)?;
    Ok(TopicResolver::new(catalog, content)
        .with_layout(layout)
        .with_index_text(
            config.site.index_heading.clone(),
            config.site.index_intro.clone(),
        ))
}
