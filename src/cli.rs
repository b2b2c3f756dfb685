//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::PartialConfig;

/// Top-level CLI entry point for the Vulkan dispatch resolver.
#[derive(Parser, Debug)]
#[command(
    name = "vkdispatch",
    about = "Resolve Vulkan registry commands into dispatch tables",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
///
/// Every option left unset defers to the config file.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Suppress warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./vkdispatch.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to vk.xml (default: search the Vulkan SDK and system prefixes)
    #[arg(short = 's', long = "specification", global = true)]
    pub specification_path: Option<PathBuf>,

    /// API family to resolve (vulkan, vulkansc, ...)
    #[arg(short, long, global = true)]
    pub api: Option<String>,

    /// Target API version: `latest` or MAJOR.MINOR
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Extensions to enable, comma separated; `all` enables every supported one
    #[arg(short, long, global = true, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Skip deprecated extensions when selecting
    #[arg(long, global = true)]
    pub no_enable_deprecated: bool,
}

impl GlobalOpts {
    /// The settings these options override; flags left off stay `None`.
    #[must_use]
    pub fn to_overrides(&self) -> PartialConfig {
        PartialConfig {
            specification: self.specification_path.clone(),
            api: self.api.clone(),
            api_version: self.api_version.clone(),
            extensions: self.extensions.clone(),
            template_arguments: None,
            enable_deprecated: self.no_enable_deprecated.then_some(false),
            quiet: self.quiet.then_some(true),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the registry and write the dispatch bundle as JSON
    Resolve(ResolveOpts),
    /// Summarize the registry: families, versions and command counts
    Inspect(InspectOpts),
    /// Print version information
    Version,
}

/// Options for the `resolve` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct ResolveOpts {
    /// Write the bundle here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Arguments passed through to the bundle, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub template_arguments: Option<Vec<String>>,

    /// Emit single-line JSON
    #[arg(long)]
    pub compact: bool,
}

/// Options for the `inspect` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct InspectOpts {
    /// Also list every enabled extension per version
    #[arg(long)]
    pub extensions_detail: bool,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_resolve_with_api() {
        let cli = Cli::parse_from(["vkdispatch", "--api", "vulkansc", "resolve"]);
        assert_eq!(cli.global.api, Some("vulkansc".to_string()));
        assert!(matches!(cli.command, Command::Resolve(_)));
    }

    #[test]
    fn parse_resolve_with_specification_short() {
        let cli = Cli::parse_from(["vkdispatch", "-s", "vk.xml", "resolve"]);
        assert_eq!(cli.global.specification_path, Some(PathBuf::from("vk.xml")));
    }

    #[test]
    fn parse_extension_list() {
        let cli = Cli::parse_from([
            "vkdispatch",
            "resolve",
            "--extensions",
            "VK_KHR_surface,VK_KHR_swapchain",
        ]);
        assert_eq!(
            cli.global.extensions,
            Some(vec!["VK_KHR_surface".to_string(), "VK_KHR_swapchain".to_string()])
        );
    }

    #[test]
    fn parse_resolve_options() {
        let cli = Cli::parse_from([
            "vkdispatch",
            "resolve",
            "-o",
            "out.json",
            "-t",
            "a,b",
            "--compact",
        ]);
        assert!(
            matches!(&cli.command, Command::Resolve(_)),
            "Expected Resolve command"
        );
        if let Command::Resolve(opts) = cli.command {
            assert_eq!(opts.output, Some(PathBuf::from("out.json")));
            assert_eq!(
                opts.template_arguments,
                Some(vec!["a".to_string(), "b".to_string()])
            );
            assert!(opts.compact);
        }
    }

    #[test]
    fn parse_inspect() {
        let cli = Cli::parse_from(["vkdispatch", "inspect", "--extensions-detail"]);
        assert!(matches!(
            cli.command,
            Command::Inspect(InspectOpts {
                extensions_detail: true
            })
        ));
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["vkdispatch", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_verbose_and_quiet() {
        let cli = Cli::parse_from(["vkdispatch", "-v", "-q", "resolve"]);
        assert!(cli.verbose);
        assert!(cli.global.quiet);
    }

    // ------------------------------------------------------------------
    // overrides
    // ------------------------------------------------------------------

    #[test]
    fn unset_flags_do_not_override() {
        let cli = Cli::parse_from(["vkdispatch", "resolve"]);
        assert_eq!(cli.global.to_overrides(), PartialConfig::default());
    }

    #[test]
    fn set_flags_override() {
        let cli = Cli::parse_from([
            "vkdispatch",
            "--api-version",
            "1.2",
            "--no-enable-deprecated",
            "-q",
            "resolve",
        ]);
        let overrides = cli.global.to_overrides();
        assert_eq!(overrides.api_version.as_deref(), Some("1.2"));
        assert_eq!(overrides.enable_deprecated, Some(false));
        assert_eq!(overrides.quiet, Some(true));
        assert_eq!(overrides.api, None);
    }
}
