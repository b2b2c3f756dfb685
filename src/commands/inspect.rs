//! Command: summarize the registry for the configured family.
use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, InspectOpts};
use crate::config::Settings;
use crate::logging::Logger;
use crate::registry::{ApiVersion, DispatchLevel, Specification};
use crate::resolve;

/// What resolving one core version of the family yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReport {
    /// Core version the selection was resolved at.
    pub version: ApiVersion,
    /// Number of enabled features.
    pub features: usize,
    /// Names of the enabled extensions.
    pub extensions: Vec<String>,
    /// Commands dispatched without an instance or device.
    pub global: usize,
    /// Commands dispatched through an instance or physical device.
    pub instance: usize,
    /// Commands dispatched through a device or its children.
    pub device: usize,
    /// Distinct enabling conditions.
    pub groups: usize,
}

/// Run the inspect command.
///
/// # Errors
///
/// Returns an error if setup fails, any version cannot be resolved, or
/// stdout cannot be written.
pub fn run(global: &GlobalOpts, opts: &InspectOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    log.stage("Inspecting versions");
    let reports = reports(&setup.spec, &setup.settings)
        .with_context(|| format!("failed to resolve API family '{}'", setup.settings.api))?;

    let mut stdout = std::io::stdout().lock();
    write_summary(&mut stdout, &setup.spec, &setup.settings, &reports, opts.extensions_detail)
        .context("failed to write to stdout")
}

/// Resolve the configured selection at every core version of the family,
/// in version order.
///
/// Versions are resolved in parallel; the specification is shared
/// read-only between workers.
///
/// # Errors
///
/// Returns the first resolution error.
pub fn reports(spec: &Specification, settings: &Settings) -> Result<Vec<VersionReport>> {
    use rayon::prelude::*;

    let base = settings.request();
    let versions: Vec<ApiVersion> = spec.features_of(&base.family).iter().map(|f| f.version).collect();
    if versions.is_empty() {
        // Let resolve produce the error listing the available families.
        resolve::resolve(spec, &base)?;
    }

    versions
        .into_par_iter()
        .map(|version| -> Result<VersionReport> {
            let request = base.clone().with_version(version);
            let resolved = resolve::resolve(spec, &request)?;
            let (set, groups) = resolve::group_by(&resolved)?;
            Ok(VersionReport {
                version,
                features: resolved.features().len(),
                extensions: resolved.extensions().iter().map(|e| e.name.clone()).collect(),
                global: set.level(DispatchLevel::Global).len(),
                instance: set.level(DispatchLevel::Instance).len(),
                device: set.level(DispatchLevel::Device).len(),
                groups: groups.len(),
            })
        })
        .collect()
}

fn write_summary(
    out: &mut impl std::io::Write,
    spec: &Specification,
    settings: &Settings,
    reports: &[VersionReport],
    extensions_detail: bool,
) -> std::io::Result<()> {
    writeln!(out, "families: {}", spec.families().join(", "))?;
    if let Some(header) = spec.header_version(&settings.api) {
        writeln!(out, "header version: {header}")?;
    }
    let supported = spec
        .extensions()
        .values()
        .filter(|e| e.supports(&settings.api))
        .count();
    writeln!(
        out,
        "{}: {} extensions supported, selection: {}",
        settings.api, supported, settings.extensions
    )?;
    for report in reports {
        writeln!(
            out,
            "  {}: {} global, {} instance, {} device commands in {} groups ({} extensions)",
            report.version,
            report.global,
            report.instance,
            report.device,
            report.groups,
            report.extensions.len()
        )?;
        if extensions_detail {
            for name in &report.extensions {
                writeln!(out, "    {name}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::PartialConfig;
    use crate::resolve::testing::{SCENARIO, spec};

    fn settings(config: PartialConfig) -> Settings {
        Settings::try_from(config).unwrap()
    }

    fn family_f() -> Settings {
        settings(PartialConfig {
            api: Some("F".to_string()),
            ..PartialConfig::default()
        })
    }

    #[test]
    fn one_report_per_version_in_order() {
        let spec = spec(SCENARIO);
        let reports = reports(&spec, &family_f()).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].version, ApiVersion::new(1, 0));
        assert_eq!(
            (reports[0].global, reports[0].instance, reports[0].device),
            (1, 1, 1)
        );
        assert_eq!(reports[1].version, ApiVersion::new(1, 1));
        assert_eq!(
            (reports[1].global, reports[1].instance, reports[1].device),
            (1, 1, 2)
        );
        assert_eq!(reports[1].extensions, vec!["X"]);
    }

    #[test]
    fn unknown_family_fails() {
        let spec = spec(SCENARIO);
        let err = reports(&spec, &settings(PartialConfig::default())).unwrap_err();
        assert!(format!("{err:#}").contains("available: F"));
    }

    #[test]
    fn summary_lists_versions_and_extensions() {
        let spec = spec(SCENARIO);
        let settings = family_f();
        let reports = reports(&spec, &settings).unwrap();
        let mut out = Vec::new();
        write_summary(&mut out, &spec, &settings, &reports, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("families: F\n"), "{text}");
        assert!(text.contains("F: 1 extensions supported, selection: all"), "{text}");
        assert!(
            text.contains("  1.1: 1 global, 1 instance, 2 device commands in 2 groups (1 extensions)\n    X\n"),
            "{text}"
        );
    }
}
