//! Settings from the config file and the command line.
//!
//! Precedence is command line, then the TOML config file (`--config`, or
//! `vkdispatch.toml` in the working directory), then built-in defaults.
//! Both sources are read into a [`PartialConfig`]; the command line's is
//! layered over the file's and the result becomes [`Settings`].
pub mod locate;
pub mod toml_loader;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::resolve::{ExtensionSelection, ResolveRequest, TargetVersion};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "vkdispatch.toml";

/// Family resolved when none is configured.
pub const DEFAULT_API: &str = "vulkan";

/// One source of settings; absent keys defer to lower-priority sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    /// Path to `vk.xml`.
    pub specification: Option<PathBuf>,
    /// API family.
    pub api: Option<String>,
    /// `latest` or `X.Y`.
    pub api_version: Option<String>,
    /// Extension names; `all` selects every supported extension.
    pub extensions: Option<Vec<String>>,
    /// Opaque strings passed through to the bundle.
    pub template_arguments: Option<Vec<String>>,
    /// Whether deprecated extensions may be selected.
    pub enable_deprecated: Option<bool>,
    /// Suppress warnings.
    pub quiet: Option<bool>,
}

impl PartialConfig {
    /// Layer `over` on top of `self`: every key `over` sets wins.
    #[must_use]
    pub fn merge(self, over: Self) -> Self {
        Self {
            specification: over.specification.or(self.specification),
            api: over.api.or(self.api),
            api_version: over.api_version.or(self.api_version),
            extensions: over.extensions.or(self.extensions),
            template_arguments: over.template_arguments.or(self.template_arguments),
            enable_deprecated: over.enable_deprecated.or(self.enable_deprecated),
            quiet: over.quiet.or(self.quiet),
        }
    }

    /// Read a config file.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in
    /// `cwd` is used when present. A relative `specification` is taken
    /// relative to the config file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotAFile`] for a missing explicit file, or any
    /// error from [`toml_loader::load_config`].
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotAFile(path.to_path_buf())),
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = cwd.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    return Ok((Self::default(), None));
                }
                candidate
            }
        };

        let mut config: Self = toml_loader::load_config(&path)?;
        if let Some(spec) = config.specification.take() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            config.specification = Some(if spec.is_relative() { base.join(spec) } else { spec });
        }
        Ok((config, Some(path)))
    }
}

/// Fully merged settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Explicit registry path; `None` means search.
    pub specification: Option<PathBuf>,
    /// API family.
    pub api: String,
    /// Target version.
    pub api_version: TargetVersion,
    /// Extension selection.
    pub extensions: ExtensionSelection,
    /// Pass-through template arguments.
    pub template_arguments: Vec<String>,
    /// Whether deprecated extensions may be selected.
    pub enable_deprecated: bool,
    /// Suppress warnings.
    pub quiet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            specification: None,
            api: DEFAULT_API.to_string(),
            api_version: TargetVersion::Latest,
            extensions: ExtensionSelection::All,
            template_arguments: Vec::new(),
            enable_deprecated: true,
            quiet: false,
        }
    }
}

impl TryFrom<PartialConfig> for Settings {
    type Error = ConfigError;

    fn try_from(partial: PartialConfig) -> Result<Self, Self::Error> {
        let defaults = Self::default();
        Ok(Self {
            specification: partial.specification,
            api: partial.api.unwrap_or(defaults.api),
            api_version: partial
                .api_version
                .as_deref()
                .map(str::parse::<TargetVersion>)
                .transpose()?
                .unwrap_or(defaults.api_version),
            extensions: partial
                .extensions
                .map_or(defaults.extensions, ExtensionSelection::from_names),
            template_arguments: partial.template_arguments.unwrap_or_default(),
            enable_deprecated: partial.enable_deprecated.unwrap_or(defaults.enable_deprecated),
            quiet: partial.quiet.unwrap_or(defaults.quiet),
        })
    }
}

impl Settings {
    /// The resolution request these settings describe.
    #[must_use]
    pub fn request(&self) -> ResolveRequest {
        ResolveRequest::new(self.api.clone())
            .with_target(self.api_version)
            .with_extensions(self.extensions.clone())
            .with_deprecated(self.enable_deprecated)
    }
}
