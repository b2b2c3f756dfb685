//! Command: resolve the registry and emit the dispatch bundle.
use std::io::Write as _;
use std::path::Path;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::bundle::DispatchBundle;
use crate::cli::{GlobalOpts, ResolveOpts};
use crate::logging::Logger;
use crate::registry::DispatchLevel;
use crate::resolve::Note;

/// Run the resolve command.
///
/// # Errors
///
/// Returns an error if setup fails, the request cannot be resolved, or the
/// bundle cannot be written.
pub fn run(global: &GlobalOpts, opts: &ResolveOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let bundle = build(&setup, opts, log)?;
    let json = render(&bundle, opts.compact)?;
    write_output(&json, opts.output.as_deref(), log)
}

/// Resolve the configured request and report what happened.
///
/// # Errors
///
/// Returns an error if the request cannot be resolved.
pub fn build(setup: &CommandSetup, opts: &ResolveOpts, log: &Logger) -> Result<DispatchBundle> {
    let settings = &setup.settings;
    log.stage("Resolving commands");
    log.info(&format!(
        "api: {}, version: {}, extensions: {}",
        settings.api,
        settings.api_version,
        settings.extensions
    ));

    let arguments = opts
        .template_arguments
        .clone()
        .unwrap_or_else(|| settings.template_arguments.clone());
    let bundle = DispatchBundle::build(&setup.spec, &settings.request(), arguments, Some(&setup.path))
        .with_context(|| format!("failed to resolve API family '{}'", settings.api))?;

    for note in &bundle.notes {
        match note {
            Note::Unavailable { .. } => log.debug(&note.to_string()),
            _ => log.warn(&note.to_string()),
        }
    }
    log.info(&format!(
        "resolved {} commands ({} global, {} instance, {} device) in {} groups",
        bundle.command_count(),
        bundle.global.len(),
        bundle.instance.len(),
        bundle.device.len(),
        bundle.groups.len()
    ));
    log.debug(&format!(
        "enabled {} features, {} extensions at {}",
        bundle.specification.features.len(),
        bundle.specification.extensions.len(),
        bundle.specification.target
    ));
    log_contents(&bundle, log);
    Ok(bundle)
}

/// Log every enabled feature, extension and command at debug level.
fn log_contents(bundle: &DispatchBundle, log: &Logger) {
    for feature in &bundle.specification.features {
        log.debug(&format!(
            "feature {} {} [{}] guard: {}",
            feature.name,
            feature.version,
            feature.families.join(", "),
            feature.guard.as_deref().unwrap_or("1")
        ));
    }
    for extension in &bundle.specification.extensions {
        log.debug(&format!(
            "extension {} [{}] deprecated: {} guard: {}",
            extension.name,
            extension.families.join(", "),
            extension.deprecated,
            extension.guard.as_deref().unwrap_or("1")
        ));
    }
    for (level, commands) in [
        (DispatchLevel::Global, &bundle.global),
        (DispatchLevel::Instance, &bundle.instance),
        (DispatchLevel::Device, &bundle.device),
    ] {
        for command in commands {
            log.debug(&format!("command {} {level} if {}", command.name, command.guard));
        }
    }
}

/// Serialize the bundle as JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(bundle: &DispatchBundle, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(bundle)
    } else {
        serde_json::to_string_pretty(bundle)
    };
    json.context("failed to serialize dispatch bundle")
}

fn write_output(json: &str, output: Option<&Path>, log: &Logger) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display()))?;
        log.info(&format!("wrote {}", path.display()));
    } else {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}").context("failed to write to stdout")?;
    }
    Ok(())
}
