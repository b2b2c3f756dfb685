//! CLI subcommands and the setup they share.
pub mod inspect;
pub mod resolve;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{PartialConfig, Settings, locate};
use crate::logging::Logger;
use crate::registry::Specification;

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates config loading, registry lookup and parsing so that each
/// command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Settings after layering the command line over the config file.
    pub settings: Settings,
    /// Canonical path of the registry that was parsed.
    pub path: PathBuf,
    /// The parsed registry.
    pub spec: Specification,
}

impl CommandSetup {
    /// Load settings from the working directory and the command line, then
    /// locate and parse the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory is unavailable, or any
    /// error from [`CommandSetup::load`].
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to determine working directory")?;
        Self::load(global.config.as_deref(), &cwd, global.to_overrides(), log)
    }

    /// Layer `overrides` over the config file, then locate and parse the
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is invalid, the registry cannot
    /// be found or read, or it is not a well-formed specification.
    pub fn load(config: Option<&Path>, cwd: &Path, overrides: PartialConfig, log: &Logger) -> Result<Self> {
        log.stage("Loading configuration");
        let (file, config_path) = PartialConfig::load(config, cwd)?;
        match &config_path {
            Some(path) => log.debug(&format!("config file: {}", path.display())),
            None => log.debug("no config file, using defaults"),
        }
        let settings = Settings::try_from(file.merge(overrides))?;
        log.set_quiet(settings.quiet);

        let path = locate::locate(settings.specification.as_deref())?;
        log.stage("Parsing specification");
        log.info(&format!("registry: {}", path.display()));

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let spec = Specification::parse(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        log.debug(&format!("{} commands", spec.commands().len()));
        log.debug(&format!("{} features", spec.features().len()));
        log.debug(&format!("{} extensions", spec.extensions().len()));
        log.info(&format!("families: {}", spec.families().join(", ")));

        Ok(Self {
            settings,
            path,
            spec,
        })
    }
}
