//! The immutable result handed to the rendering step.
//!
//! A [`DispatchBundle`] owns everything a template needs: the three
//! dispatch-level command lists with their conditions and preprocessor
//! guards, the condition groups, the caller's pass-through arguments, a
//! summary of what was resolved, a read-only view of the whole registry, and
//! the time resolution started. It serializes to JSON with `serde`.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{DispatchError, ResolveError};
use crate::registry::{
    ApiVersion, Command, CommandId, DispatchLevel, Extension, ExtensionScope, Feature, Param,
    Requirement, Specification,
};
use crate::resolve::{self, CommandEntry, Note, ResolveRequest, ResolvedFeatureSet};

/// A command in one of the level lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleCommand {
    /// Canonical command name.
    pub name: String,
    /// Rendered availability condition.
    pub condition: String,
    /// The condition as a preprocessor expression.
    pub guard: String,
}

impl From<&CommandEntry<'_>> for BundleCommand {
    fn from(entry: &CommandEntry<'_>) -> Self {
        Self {
            name: entry.name.to_string(),
            condition: entry.condition.to_string(),
            guard: entry.condition.to_guard(),
        }
    }
}

/// One `<require>` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementSummary {
    /// Families the block is limited to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<Vec<String>>,
    /// Dependency expression in registry syntax.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends: Option<String>,
    /// The dependency as a preprocessor expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    /// Command names in document order.
    pub commands: Vec<String>,
}

impl From<&Requirement> for RequirementSummary {
    fn from(requirement: &Requirement) -> Self {
        Self {
            api: requirement.api.clone(),
            depends: requirement.depends.as_ref().map(ToString::to_string),
            guard: requirement.depends.as_ref().map(|d| d.to_guard()),
            commands: requirement.commands.clone(),
        }
    }
}

/// A core version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSummary {
    /// Feature name.
    pub name: String,
    /// Its version.
    pub version: ApiVersion,
    /// Families it belongs to.
    pub families: Vec<String>,
    /// Dependency expression in registry syntax.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends: Option<String>,
    /// The dependency as a preprocessor expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    /// `<require>` blocks.
    pub requirements: Vec<RequirementSummary>,
    /// Commands it removes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removals: Vec<String>,
}

impl From<&Feature> for FeatureSummary {
    fn from(f: &Feature) -> Self {
        Self {
            name: f.name.clone(),
            version: f.version,
            families: f.families.clone(),
            depends: f.depends.as_ref().map(ToString::to_string),
            guard: f.depends.as_ref().map(|d| d.to_guard()),
            requirements: f.requirements.iter().map(RequirementSummary::from).collect(),
            removals: f.removals.clone(),
        }
    }
}

/// An extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionSummary {
    /// Extension name.
    pub name: String,
    /// Registry number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Families that support it.
    pub families: Vec<String>,
    /// Instance or device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ExtensionScope>,
    /// Spec revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    /// Lowest core version it can be enabled on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_core: Option<ApiVersion>,
    /// Dependency expression in registry syntax.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends: Option<String>,
    /// The dependency as a preprocessor expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    /// Whether the registry deprecates it.
    pub deprecated: bool,
    /// Replacement named by the deprecation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_by: Option<String>,
    /// Replacement named by the obsoletion, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obsoleted_by: Option<String>,
    /// What it was promoted to, if anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted_to: Option<String>,
    /// `<require>` blocks.
    pub requirements: Vec<RequirementSummary>,
}

impl From<&Extension> for ExtensionSummary {
    fn from(e: &Extension) -> Self {
        Self {
            name: e.name.clone(),
            number: e.number,
            families: e.families.clone(),
            scope: e.scope,
            revision: e.revision,
            requires_core: e.min_version,
            depends: e.depends.as_ref().map(ToString::to_string),
            guard: e.depends.as_ref().map(|d| d.to_guard()),
            deprecated: e.is_deprecated(),
            deprecated_by: e.deprecated_by.clone().filter(|d| !d.is_empty()),
            obsoleted_by: e.obsoleted_by.clone().filter(|o| !o.is_empty()),
            promoted_to: e.promoted_to.clone(),
            requirements: e.requirements.iter().map(RequirementSummary::from).collect(),
        }
    }
}

/// A command as the registry declares it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSummary {
    /// Command name.
    pub name: String,
    /// How it is dispatched, classified through its canonical form.
    pub level: DispatchLevel,
    /// Canonical command, for aliases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    /// Return type, for canonical commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    /// Parameters, for canonical commands.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

/// Everything the registry declares, independent of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryView {
    /// Every feature, in document order.
    pub features: Vec<FeatureSummary>,
    /// Every extension, sorted by name.
    pub extensions: Vec<ExtensionSummary>,
    /// Every command, sorted by name.
    pub commands: Vec<CommandSummary>,
}

impl RegistryView {
    /// Describe the whole specification.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::CyclicAlias`] if an alias never reaches a
    /// canonical command.
    pub fn new(spec: &Specification) -> Result<Self, ResolveError> {
        let mut commands = spec
            .commands()
            .iter()
            .enumerate()
            .map(|(index, command)| command_summary(spec, index, command))
            .collect::<Result<Vec<_>, _>>()?;
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self {
            features: spec.features().iter().map(FeatureSummary::from).collect(),
            extensions: spec.extensions().values().map(ExtensionSummary::from).collect(),
            commands,
        })
    }
}

fn command_summary(spec: &Specification, index: usize, command: &Command) -> Result<CommandSummary, ResolveError> {
    let id = CommandId(index);
    let canonical = spec.canonical(id)?;
    Ok(CommandSummary {
        name: command.name.clone(),
        level: spec.level(id)?,
        alias_of: (canonical != id).then(|| spec.name_of(canonical).to_string()),
        return_type: command.return_type().map(str::to_string),
        params: command.params().to_vec(),
    })
}

/// What was resolved, from which document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecificationSummary {
    /// Where the registry was read from, when it came from a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// `VK_HEADER_VERSION` for the resolved family, when defined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_version: Option<u32>,
    /// Every family in the document.
    pub families: Vec<String>,
    /// Resolved family.
    pub family: String,
    /// Concrete target version.
    pub target: ApiVersion,
    /// Enabled features, sorted by name.
    pub features: Vec<FeatureSummary>,
    /// Enabled extensions, sorted by name.
    pub extensions: Vec<ExtensionSummary>,
}

/// Output of one resolution, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchBundle {
    /// Global-level commands, sorted by name.
    pub global: Vec<BundleCommand>,
    /// Instance-level commands, sorted by name.
    pub instance: Vec<BundleCommand>,
    /// Device-level commands, sorted by name.
    pub device: Vec<BundleCommand>,
    /// Condition to sorted command names.
    pub groups: BTreeMap<String, Vec<String>>,
    /// Condition to its preprocessor guard, one entry per group.
    pub guards: BTreeMap<String, String>,
    /// Opaque caller arguments, passed through unchanged.
    pub arguments: Vec<String>,
    /// The resolved specification.
    pub specification: SpecificationSummary,
    /// The whole registry, read-only.
    pub registry: RegistryView,
    /// When resolution started.
    pub buildtime: DateTime<Utc>,
    /// Non-fatal diagnostics; not serialized.
    #[serde(skip)]
    pub notes: Vec<Note>,
}

impl DispatchBundle {
    /// Resolve `request` against `spec`, classify and group the result.
    ///
    /// The build time is captured before resolution starts.
    ///
    /// # Errors
    ///
    /// Returns the first [`ResolveError`] encountered.
    pub fn build(
        spec: &Specification,
        request: &ResolveRequest,
        arguments: Vec<String>,
        path: Option<&Path>,
    ) -> Result<Self, ResolveError> {
        let buildtime = Utc::now();
        let resolved = resolve::resolve(spec, request)?;
        Self::from_resolved(&resolved, arguments, path, buildtime)
    }

    /// Parse registry text and build the bundle for `request` in one step.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Parse`] for a malformed document and
    /// [`DispatchError::Resolve`] when the request cannot be satisfied.
    pub fn from_text(
        text: &str,
        request: &ResolveRequest,
        arguments: Vec<String>,
    ) -> Result<Self, DispatchError> {
        let spec = Specification::parse(text)?;
        Ok(Self::build(&spec, request, arguments, None)?)
    }

    /// Build from an already resolved feature set.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::CyclicAlias`] if a command cannot be classified.
    pub fn from_resolved(
        resolved: &ResolvedFeatureSet<'_>,
        arguments: Vec<String>,
        path: Option<&Path>,
        buildtime: DateTime<Utc>,
    ) -> Result<Self, ResolveError> {
        let (set, groups) = resolve::group_by(resolved)?;
        let spec = resolved.spec();

        Ok(Self {
            global: set.global().iter().map(BundleCommand::from).collect(),
            instance: set.instance().iter().map(BundleCommand::from).collect(),
            device: set.device().iter().map(BundleCommand::from).collect(),
            guards: groups
                .iter()
                .map(|g| (g.condition.to_string(), g.condition.to_guard()))
                .collect(),
            groups: groups
                .into_iter()
                .map(|g| {
                    (
                        g.condition.to_string(),
                        g.commands.into_iter().map(str::to_string).collect(),
                    )
                })
                .collect(),
            arguments,
            specification: SpecificationSummary {
                path: path.map(Path::to_path_buf),
                header_version: spec.header_version(resolved.family()),
                families: spec.families().to_vec(),
                family: resolved.family().to_string(),
                target: resolved.target(),
                features: resolved.features().iter().copied().map(FeatureSummary::from).collect(),
                extensions: resolved.extensions().iter().copied().map(ExtensionSummary::from).collect(),
            },
            registry: RegistryView::new(spec)?,
            buildtime,
            notes: resolved.notes().to_vec(),
        })
    }

    /// Total number of commands across the three levels.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.global.len() + self.instance.len() + self.device.len()
    }
}
