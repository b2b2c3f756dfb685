//! Domain-specific error types for the dispatch resolver.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! The core returns typed errors ([`ParseError`], [`ResolveError`]);
//! one-step entry points such as
//! [`DispatchBundle::from_text`](crate::bundle::DispatchBundle::from_text)
//! return [`DispatchError`], and the binary's command handlers convert any of
//! them to [`anyhow::Error`] via `?`.
//!
//! # Error hierarchy
//!
//! ```text
//! DispatchError
//! ├── Parse(ParseError)     — malformed or unsafe registry documents
//! ├── Resolve(ResolveError) — requests the registry cannot satisfy
//! └── Config(ConfigError)   — config files, registry lookup, CLI values
//! ```
use std::path::PathBuf;

use thiserror::Error;

use crate::registry::ApiVersion;
use crate::registry::version::InvalidVersion;

/// Top-level error type.
///
/// Aggregates the domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The registry document could not be turned into a specification.
    #[error("Specification error: {0}")]
    Parse(#[from] ParseError),

    /// The request cannot be resolved against the specification.
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Configuration or environment problem.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while parsing a registry document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Structural problem: unknown root, missing attribute, duplicate name,
    /// dangling alias, bad version or expression, or unsafe XML.
    #[error("malformed specification in <{element}>: {reason}")]
    MalformedSpecification {
        /// Offending element, with its name attribute when known.
        element: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ParseError {
    /// Shorthand for [`ParseError::MalformedSpecification`].
    pub(crate) fn malformed(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSpecification {
            element: element.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while resolving a request against a specification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The requested family does not appear in the document.
    #[error("unknown API family '{family}' (available: {available})")]
    UnknownFamily {
        /// Requested family.
        family: String,
        /// Comma-separated families present in the document.
        available: String,
    },

    /// An extension name that the document does not define.
    #[error("unknown extension '{name}'{}", required_by_suffix(.required_by.as_deref()))]
    UnknownExtension {
        /// Missing extension name.
        name: String,
        /// Extension whose dependency named it, if any.
        required_by: Option<String>,
    },

    /// The extension exists but not for the requested family.
    #[error("extension '{name}' is not supported by API family '{family}'")]
    UnsupportedExtension {
        /// Extension name.
        name: String,
        /// Requested family.
        family: String,
    },

    /// A version precondition is above the requested target.
    #[error("'{name}' requires API version {required}, but the target is {target}")]
    UnmetVersionRequirement {
        /// Extension (or request) imposing the requirement.
        name: String,
        /// Minimum version needed.
        required: ApiVersion,
        /// Requested target version.
        target: ApiVersion,
    },

    /// A feature or extension dependency expression is not satisfied.
    #[error("'{name}' has an unmet dependency: {expression}")]
    UnmetDependency {
        /// Owner of the expression.
        name: String,
        /// The expression, in registry syntax.
        expression: String,
    },

    /// Extension dependencies loop back on themselves.
    #[error("extension dependency cycle detected: {}", .cycle.join(" → "))]
    CyclicDependency {
        /// The cycle, first element repeated at the end.
        cycle: Vec<String>,
    },

    /// Alias chain does not terminate.
    #[error("alias chain starting at '{name}' does not terminate")]
    CyclicAlias {
        /// Command where the walk started.
        name: String,
    },

    /// A requirement names a command the document does not define.
    #[error("'{required_by}' requires unknown command '{name}'")]
    UnknownCommand {
        /// Missing command name.
        name: String,
        /// Feature or extension listing it.
        required_by: String,
    },
}

fn required_by_suffix(required_by: Option<&str>) -> String {
    required_by.map_or_else(String::new, |r| format!(" (required by '{r}')"))
}

/// Errors that arise from configuration loading and registry lookup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading a file.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML config file could not be parsed.
    #[error("Invalid config file {path}: {message}")]
    InvalidToml {
        /// Path to the config file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// No registry file was given and none was found in the search path.
    #[error("Failed to find a Vulkan registry (searched: {})", display_paths(.searched))]
    SpecificationNotFound {
        /// Every candidate location that was checked.
        searched: Vec<PathBuf>,
    },

    /// The path exists but is not a regular file.
    #[error("The path {0} does not refer to a regular file")]
    NotAFile(PathBuf),

    /// An `api_version` value is neither `latest` nor `X.Y`.
    #[error(transparent)]
    InvalidVersion(#[from] InvalidVersion),
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
