// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Template Rendering Module
//!
//! Renders page data into HTML documents with Handlebars.
//!
//! Two templates are always registered:
//!
//! - `index`: the documentation index, one card per topic
//! - `topic`: a single topic page with breadcrumb and previous/next links
//!
//! A template directory may override either of them, or add partials and
//! other templates, with `.hbs` files named after the template. Variables
//! written as `{{name}}` are HTML-escaped; topic bodies are written with
//! `{{{content.body}}}` and therefore embedded verbatim.

use crate::{PortalError, Result, TemplateRenderer};
use handlebars::Handlebars;
use log::debug;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Name of the index page template.
pub const INDEX_TEMPLATE: &str = "index";

/// Name of the topic page template.
pub const TOPIC_TEMPLATE: &str = "topic";

/// Name of the placeholder template used for topics that do not resolve.
pub const NOT_FOUND_TEMPLATE: &str = "not_found";

const LAYOUT_PARTIAL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{page_title}}</title>
</head>
<body>
<main class="docs">
{{> @partial-block }}
</main>
</body>
</html>
"#;

const INDEX_SOURCE: &str = r#"{{#> layout page_title=(concat heading " | " site.title) }}
<header class="docs-header">
<h1>{{heading}}</h1>
<p>{{intro}}</p>
</header>
<section class="docs-grid">
{{#each topics}}
<a class="docs-card" href="{{href}}">
<h3>{{title}}</h3>
<p>{{description}}</p>
<div class="docs-card-more">Read more →</div>
</a>
{{/each}}
</section>
<footer class="docs-footer">
<a href="{{site.home_url}}">← Back to Home</a>
</footer>
{{/layout}}
"#;

const TOPIC_SOURCE: &str = r#"{{#> layout page_title=(concat descriptor.title " | " site.title) }}
<nav class="breadcrumb" aria-label="Breadcrumb">
<ol>
{{#each navigation.breadcrumb}}
{{#if @last}}<li aria-current="page">{{label}}</li>{{else}}<li><a href="{{href}}">{{label}}</a></li>{{/if}}
{{/each}}
</ol>
</nav>
<a class="docs-back" href="{{index_url}}">← Back to Documentation</a>
<h1>{{descriptor.title}}</h1>
<article class="docs-content">
{{{content.body}}}
</article>
<nav class="docs-pager">
{{#if navigation.previous}}<a class="docs-previous" rel="prev" href="{{previous_url}}">← {{navigation.previous.title}}</a>{{/if}}
{{#if navigation.next}}<a class="docs-next" rel="next" href="{{next_url}}">{{navigation.next.title}} →</a>{{/if}}
</nav>
{{/layout}}
"#;

const NOT_FOUND_SOURCE: &str = r#"{{#> layout page_title=(concat "Page not found | " site.title) }}
<h1>Page not found</h1>
<p>The topic <code>{{slug}}</code> is not available.</p>
<a class="docs-back" href="{{index_url}}">← Back to Documentation</a>
{{/layout}}
"#;

/// Renderer for Handlebars templates.
///
/// Clones share one engine; the `with_*` builders give the result its own
/// copy, leaving other clones unchanged.
#[derive(Clone)]
pub struct HandlebarsRenderer {
    engine: Arc<RwLock<Handlebars<'static>>>,
    strict_mode: bool,
}

impl std::fmt::Debug for HandlebarsRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let engine = self.engine.read();
        let mut templates: Vec<&String> =
            engine.get_templates().keys().collect();
        templates.sort();
        f.debug_struct("HandlebarsRenderer")
            .field("templates", &templates)
            .field("strict_mode", &self.strict_mode)
            .finish()
    }
}

impl HandlebarsRenderer {
    /// Creates a renderer with the built-in templates.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::html_escape);
        handlebars_concat(&mut handlebars);

        let renderer = Self {
            engine: Arc::new(RwLock::new(handlebars)),
            strict_mode: false,
        };
        renderer.register("layout", LAYOUT_PARTIAL, true)?;
        renderer.register(INDEX_TEMPLATE, INDEX_SOURCE, false)?;
        renderer.register(TOPIC_TEMPLATE, TOPIC_SOURCE, false)?;
        renderer.register(NOT_FOUND_TEMPLATE, NOT_FOUND_SOURCE, false)?;
        Ok(renderer)
    }

    /// Creates a renderer and applies overrides from `template_dir`.
    pub fn with_template_dir(template_dir: &Path) -> Result<Self> {
        let renderer = Self::new()?;
        renderer.load_templates(template_dir)?;
        Ok(renderer)
    }

    /// Enables or disables strict mode: missing variables become errors.
    pub fn with_strict_mode(self, strict: bool) -> Self {
        let mut renderer = self.detached();
        renderer.strict_mode = strict;
        renderer.engine.write().set_strict_mode(strict);
        renderer
    }

    /// Registers a partial template.
    pub fn with_partial(self, name: &str, template: &str) -> Result<Self> {
        let renderer = self.detached();
        renderer.register(name, template, true)?;
        Ok(renderer)
    }

    /// Registers a template string.
    pub fn with_template(self, name: &str, template: &str) -> Result<Self> {
        let renderer = self.detached();
        renderer.register(name, template, false)?;
        Ok(renderer)
    }

    /// A renderer with its own copy of the engine.
    fn detached(&self) -> Self {
        let engine = self.engine.read().clone();
        Self {
            engine: Arc::new(RwLock::new(engine)),
            strict_mode: self.strict_mode,
        }
    }

    fn register(&self, name: &str, source: &str, partial: bool) -> Result<()> {
        let mut engine = self.engine.write();
        let registered = if partial {
            engine.register_partial(name, source)
        } else {
            engine.register_template_string(name, source)
        };
        registered.map_err(|e| {
            PortalError::template_rendering_error(
                format!("Failed to register template: {}", e),
                name.to_string(),
                Some(Box::new(e)),
            )
        })
    }

    /// Loads `.hbs` files; `layout.hbs` and files starting with `_` are
    /// registered as partials, everything else as templates.
    fn load_templates(&self, template_dir: &Path) -> Result<()> {
        let entries = fs::read_dir(template_dir).map_err(|e| {
            PortalError::template_rendering_error(
                format!("Failed to read template directory: {}", e),
                String::new(),
                Some(Box::new(e)),
            )
        })?;

        for entry in entries {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|s| s.to_str()) != Some("hbs")
            {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    PortalError::template_rendering_error(
                        "Invalid template filename",
                        path.display().to_string(),
                        None,
                    )
                })?;
            let source = fs::read_to_string(&path)
                .map_err(|e| PortalError::io_error(path.clone(), e))?;

            if stem == "layout" {
                debug!("Overriding layout partial from {}", path.display());
                self.register(stem, &source, true)?;
            } else if let Some(partial) = stem.strip_prefix('_') {
                debug!("Registering partial `{}`", partial);
                self.register(partial, &source, true)?;
            } else {
                debug!("Registering template `{}`", stem);
                self.register(stem, &source, false)?;
            }
        }
        Ok(())
    }

    /// `true` when a template called `name` is registered.
    pub fn has_template(&self, name: &str) -> bool {
        self.engine.read().has_template(name)
    }
}

/// Registers `concat`, joining its string parameters.
fn handlebars_concat(handlebars: &mut Handlebars<'static>) {
    handlebars.register_helper(
        "concat",
        Box::new(
            |h: &handlebars::Helper<'_>,
             _: &Handlebars<'_>,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext<'_, '_>,
             out: &mut dyn handlebars::Output|
             -> handlebars::HelperResult {
                let joined: String = h
                    .params()
                    .iter()
                    .map(|p| match p.value() {
                        JsonValue::String(s) => s.clone(),
                        JsonValue::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect();
                out.write(&joined)?;
                Ok(())
            },
        ),
    );
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, template: &str, context: &JsonValue) -> Result<String> {
        self.engine.read().render(template, context).map_err(|e| {
            PortalError::template_rendering_error(
                format!("Template rendering failed: {}", e),
                template.to_string(),
                Some(Box::new(e)),
            )
        })
    }

    fn validate(&self, template: &str, context: &JsonValue) -> Result<()> {
        if !self.has_template(template) {
            return Err(PortalError::template_rendering_error(
                format!("Template '{}' not found", template),
                template.to_string(),
                None,
            ));
        }
        if !context.is_object() {
            return Err(PortalError::template_rendering_error(
                "Render context must be a JSON object",
                template.to_string(),
                None,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn site() -> JsonValue {
        json!({
            "title": "WaddlePerf",
            "home_url": "/"
        })
    }

    fn topic_context() -> JsonValue {
        json!({
            "site": site(),
            "descriptor": { "slug": "usage", "title": "Usage Guide", "description": "Use it." },
            "content": { "slug": "usage", "body": "<p>Run <code>waddleperf</code> & wait</p>" },
            "navigation": {
                "current": { "slug": "usage", "title": "Usage Guide", "description": "Use it." },
                "breadcrumb": [
                    { "label": "Documentation index", "href": "/docs", "slug": null },
                    { "label": "Usage Guide", "href": "/docs/usage", "slug": "usage" }
                ],
                "previous": { "slug": "installation", "title": "Installation Guide", "description": "Install." },
                "next": null
            },
            "url": "/docs/usage",
            "index_url": "/docs",
            "previous_url": "/docs/installation",
            "next_url": null
        })
    }

    #[test]
    fn test_topic_page_embeds_body_verbatim() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let html = renderer.render(TOPIC_TEMPLATE, &topic_context()).unwrap();

        assert!(html.contains("<p>Run <code>waddleperf</code> & wait</p>"));
        assert!(html.contains("<title>Usage Guide | WaddlePerf</title>"));
        assert!(html.contains("<h1>Usage Guide</h1>"));
        assert!(html.contains(r#"<li><a href="/docs">Documentation index</a></li>"#));
        assert!(html.contains(r#"<li aria-current="page">Usage Guide</li>"#));
        assert!(html.contains(r#"href="/docs/installation">← Installation Guide</a>"#));
        assert!(!html.contains("docs-next"));
    }

    #[test]
    fn test_index_page_escapes_text() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let context = json!({
            "site": site(),
            "url": "/docs",
            "heading": "Documentation",
            "intro": "Guides & docs",
            "topics": [
                { "slug": "usage", "title": "Usage <Guide>", "description": "Use it.", "href": "/docs/usage" }
            ]
        });
        let html = renderer.render(INDEX_TEMPLATE, &context).unwrap();

        assert!(html.contains("Usage &lt;Guide&gt;"));
        assert!(html.contains("Guides &amp; docs"));
        assert!(html.contains(r#"href="/docs/usage""#));
        assert!(html.contains("Read more →"));
        assert!(html.contains("← Back to Home"));
    }

    #[test]
    fn test_empty_index_has_no_cards() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let context = json!({
            "site": site(),
            "url": "/docs",
            "heading": "Documentation",
            "intro": "Guides & docs",
            "topics": []
        });
        let html = renderer.render(INDEX_TEMPLATE, &context).unwrap();
        assert!(!html.contains("docs-card\""));
        assert!(html.contains("<h1>Documentation</h1>"));
    }

    #[test]
    fn test_not_found_template() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let context =
            json!({ "site": site(), "slug": "usage", "index_url": "/docs" });
        let html = renderer.render(NOT_FOUND_TEMPLATE, &context).unwrap();
        assert!(html.contains("<code>usage</code>"));
    }

    #[test]
    fn test_template_dir_overrides() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("topic.hbs"),
            "{{> banner}}<main>{{{content.body}}}</main>",
        )
        .unwrap();
        fs::write(temp_dir.path().join("_banner.hbs"), "<b>{{site.title}}</b>")
            .unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let renderer =
            HandlebarsRenderer::with_template_dir(temp_dir.path()).unwrap();
        let html = renderer.render(TOPIC_TEMPLATE, &topic_context()).unwrap();
        assert_eq!(
            html,
            "<b>WaddlePerf</b><main><p>Run <code>waddleperf</code> & wait</p></main>"
        );
        assert!(renderer.has_template(INDEX_TEMPLATE));
        assert!(!renderer.has_template("notes"));
    }

    #[test]
    fn test_invalid_template_is_reported() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let err = renderer.with_template("broken", "{{#if}}").unwrap_err();
        assert!(matches!(err, PortalError::TemplateRenderingError { .. }));
    }

    #[test]
    fn test_strict_mode_rejects_missing_variables() {
        let renderer = HandlebarsRenderer::new()
            .unwrap()
            .with_strict_mode(true)
            .with_template("greeting", "Hello {{name}}")
            .unwrap();
        assert!(renderer.render("greeting", &json!({})).is_err());
        assert_eq!(
            renderer.render("greeting", &json!({ "name": "docs" })).unwrap(),
            "Hello docs"
        );
    }

    #[test]
    fn test_builders_on_clone_leave_original() {
        let base = HandlebarsRenderer::new()
            .unwrap()
            .with_template("greeting", "Hello {{name}}")
            .unwrap();
        let strict = base.clone().with_strict_mode(true);
        let extended =
            base.clone().with_template("farewell", "Bye").unwrap();

        assert!(strict.render("greeting", &json!({})).is_err());
        assert_eq!(base.render("greeting", &json!({})).unwrap(), "Hello ");
        assert!(extended.has_template("farewell"));
        assert!(!base.has_template("farewell"));
    }

    #[test]
    fn test_validate() {
        let renderer = HandlebarsRenderer::new().unwrap();
        assert!(renderer.validate(TOPIC_TEMPLATE, &json!({})).is_ok());
        assert!(renderer.validate("missing", &json!({})).is_err());
        assert!(renderer.validate(TOPIC_TEMPLATE, &json!("text")).is_err());
    }
}
