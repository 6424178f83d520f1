// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Error Handling for DocsPortal
//!
//! This module defines the error type shared by the catalog, the topic
//! resolver and the collaborators that render and write pages. The
//! `thiserror` crate is used to keep error creation and display consistent
//! across the library.
//!
//! Two variants belong to the catalog core itself:
//!
//! - [`PortalError::NotFound`] is returned by resolution when a slug has no
//!   catalog entry, or has one but no content payload.
//! - [`PortalError::CatalogIntegrity`] is returned while constructing a
//!   catalog or content store whose declared data is malformed.
//!
//! Everything else describes failures in the surrounding build.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A unified result type for the DocsPortal library.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Why a slug failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The slug is not declared in the catalog.
    UnknownSlug,
    /// The slug is declared in the catalog but has no content payload.
    MissingContent,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::UnknownSlug => {
                f.write_str("no such topic in the catalog")
            }
            NotFoundReason::MissingContent => {
                f.write_str("topic is declared but has no content")
            }
        }
    }
}

/// The main error type for DocsPortal.
#[derive(Error, Debug)]
pub enum PortalError {
    /// A requested topic could not be resolved.
    ///
    /// The build pipeline decides whether this fails the build or produces
    /// a placeholder page.
    #[error("Topic `{slug}` not found: {reason}.")]
    NotFound {
        /// The slug that was requested.
        slug: String,
        /// Whether the catalog entry or its content is missing.
        reason: NotFoundReason,
    },

    /// The declared catalog or content set is malformed.
    ///
    /// Raised at construction time for duplicate slugs, empty required
    /// fields, slugs that are not URL-safe, or content declared twice.
    #[error("Catalog integrity error: {message}.")]
    CatalogIntegrity {
        /// Description of the violated invariant.
        message: String,
    },

    /// Error related to configuration loading or validation.
    #[error("Configuration error: {message}.")]
    ConfigError {
        /// Detailed description of the configuration error.
        message: String,
        /// Optional path of the file or directory that caused the error.
        path: Option<PathBuf>,
    },

    /// Error encountered while loading or converting content files.
    #[error("Content processing error: {message}.")]
    ContentProcessingError {
        /// Detailed description of the content processing error.
        message: String,
        /// Optional source error providing additional context.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error in HTML output generation.
    #[error("Output generation error: {message} at {path:?}.")]
    OutputGenerationError {
        /// Description of the output generation error.
        message: String,
        /// Path associated with the error.
        path: PathBuf,
        /// Optional source error providing additional context.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error related to template rendering.
    #[error(
        "Template rendering error: {message} in template `{template}`."
    )]
    TemplateRenderingError {
        /// Description of the template rendering error.
        message: String,
        /// The template associated with the error.
        template: String,
        /// Optional source error providing additional context.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error encountered during file operations.
    #[error("File IO error at `{path:?}`: {source}")]
    IOError {
        /// Path associated with the IO error.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// General internal error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for PortalError {
    /// Converts a standard IO error into a `PortalError::IOError` with an
    /// empty path.
    fn from(source: std::io::Error) -> Self {
        PortalError::IOError {
            path: PathBuf::new(),
            source,
        }
    }
}

impl PortalError {
    /// Creates a `NotFound` error for a slug.
    pub fn not_found<S: Into<String>>(
        slug: S,
        reason: NotFoundReason,
    ) -> Self {
        PortalError::NotFound {
            slug: slug.into(),
            reason,
        }
    }

    /// Creates a `CatalogIntegrity` error with a specific message.
    pub fn catalog_integrity<S: Into<String>>(message: S) -> Self {
        PortalError::CatalogIntegrity {
            message: message.into(),
        }
    }

    /// Creates a `ConfigError` with a specific message.
    ///
    /// # Parameters
    /// - `message`: A description of the configuration error.
    /// - `path`: Optional path of the file causing the error.
    pub fn config_error<S: Into<String>>(
        message: S,
        path: Option<PathBuf>,
    ) -> Self {
        PortalError::ConfigError {
            message: message.into(),
            path,
        }
    }

    /// Creates a `ContentProcessingError` with a message and optional source.
    pub fn content_processing_error<S: Into<String>>(
        message: S,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PortalError::ContentProcessingError {
            message: message.into(),
            source,
        }
    }

    /// Creates an `OutputGenerationError` with a message, path, and optional source.
    pub fn output_generation_error<S: Into<String>>(
        message: S,
        path: PathBuf,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PortalError::OutputGenerationError {
            message: message.into(),
            path,
            source,
        }
    }

    /// Creates a `TemplateRenderingError` with a message, template name, and optional source.
    pub fn template_rendering_error<S: Into<String>>(
        message: S,
        template: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PortalError::TemplateRenderingError {
            message: message.into(),
            template,
            source,
        }
    }

    /// Wraps an IO error as an `IOError` variant with the specified path.
    pub fn io_error(path: PathBuf, source: std::io::Error) -> Self {
        PortalError::IOError { path, source }
    }

    /// Creates a general internal error with a custom message.
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        PortalError::InternalError(message.into())
    }

    /// Returns `true` for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortalError::NotFound { .. })
    }
}
