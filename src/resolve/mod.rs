//! Resolution of a request against a [`Specification`].
//!
//! [`resolve`] decides which features and extensions are enabled for a
//! family, target version and extension selection, then gathers the
//! canonical commands they require. [`group_by`] turns that into per-level
//! command lists annotated with the condition each command is available
//! under.
//!
//! Everything here is a pure function of its inputs. Diagnostics that a
//! caller may want to surface (skipped requirement blocks, deprecated
//! extensions) are collected as [`Note`]s on the result instead of being
//! logged.
pub mod condition;
pub mod group;
#[cfg(test)]
pub(crate) mod testing;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

pub use condition::{Atom, Condition};
pub use group::{CommandEntry, Group, ResolvedCommandSet, group_by};

use crate::error::ResolveError;
use crate::registry::version::InvalidVersion;
use crate::registry::{ApiVersion, CommandId, Depends, Extension, Feature, Requirement, Specification};

/// Which core version to resolve for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetVersion {
    /// The highest version the family defines.
    #[default]
    Latest,
    /// A specific version.
    Exact(ApiVersion),
}

impl FromStr for TargetVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("latest") {
            Ok(Self::Latest)
        } else {
            s.parse().map(Self::Exact)
        }
    }
}

impl fmt::Display for TargetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Exact(v) => v.fmt(f),
        }
    }
}

/// Which extensions the caller asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionSelection {
    /// Every extension the family supports. Extensions that cannot be
    /// enabled at the target are skipped rather than failing.
    All,
    /// Exactly these extensions, plus whatever they depend on.
    Named(BTreeSet<String>),
}

impl Default for ExtensionSelection {
    fn default() -> Self {
        Self::Named(BTreeSet::new())
    }
}

impl ExtensionSelection {
    /// Build a selection from names, where the name `all` selects everything.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.contains("all") {
            Self::All
        } else {
            Self::Named(names)
        }
    }
}

impl fmt::Display for ExtensionSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Named(names) if names.is_empty() => f.write_str("none"),
            Self::Named(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

/// A resolution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// API family, e.g. `vulkan`.
    pub family: String,
    /// Target core version.
    pub target: TargetVersion,
    /// Requested extensions.
    pub extensions: ExtensionSelection,
    /// Whether deprecated extensions may be selected.
    pub include_deprecated: bool,
}

impl ResolveRequest {
    /// Latest version of `family`, no extensions, deprecated extensions allowed.
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            target: TargetVersion::Latest,
            extensions: ExtensionSelection::default(),
            include_deprecated: true,
        }
    }

    /// Set the target version.
    #[must_use]
    pub const fn with_target(mut self, target: TargetVersion) -> Self {
        self.target = target;
        self
    }

    /// Target an exact version.
    #[must_use]
    pub const fn with_version(self, version: ApiVersion) -> Self {
        self.with_target(TargetVersion::Exact(version))
    }

    /// Set the extension selection.
    #[must_use]
    pub fn with_extensions(mut self, extensions: ExtensionSelection) -> Self {
        self.extensions = extensions;
        self
    }

    /// Allow or refuse deprecated extensions in the selection.
    #[must_use]
    pub const fn with_deprecated(mut self, include: bool) -> Self {
        self.include_deprecated = include;
        self
    }
}

/// A feature or extension that requires commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner<'s> {
    /// An enabled core version.
    Feature(&'s Feature),
    /// An enabled extension.
    Extension(&'s Extension),
}

impl<'s> Owner<'s> {
    /// Feature or extension name.
    #[must_use]
    pub fn name(&self) -> &'s str {
        match *self {
            Self::Feature(f) => &f.name,
            Self::Extension(e) => &e.name,
        }
    }

    fn requirements(&self) -> &'s [Requirement] {
        match *self {
            Self::Feature(f) => &f.requirements,
            Self::Extension(e) => &e.requirements,
        }
    }

    fn removals(&self) -> &'s [String] {
        match *self {
            Self::Feature(f) => &f.removals,
            Self::Extension(e) => &e.removals,
        }
    }
}

/// Something worth telling the user that did not stop resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    /// A selected extension was dropped because it is deprecated.
    DeprecatedSkipped {
        /// Extension name.
        name: String,
    },
    /// A deprecated extension was enabled.
    DeprecatedEnabled {
        /// Extension name.
        name: String,
        /// Suggested replacement, if the registry names one.
        replacement: Option<String>,
    },
    /// An extension from an `all` selection cannot be enabled at the target.
    Unavailable {
        /// Extension name.
        name: String,
        /// Why it cannot be enabled.
        reason: ResolveError,
    },
    /// A `<require>` block was ignored because its `depends` is not met.
    RequirementSkipped {
        /// Feature or extension owning the block.
        owner: String,
        /// The block's dependency expression.
        expression: String,
    },
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeprecatedSkipped { name } => {
                write!(f, "skipping deprecated extension {name}")
            }
            Self::DeprecatedEnabled { name, replacement } => match replacement.as_deref() {
                Some(r) if !r.is_empty() => {
                    write!(f, "extension {name} is deprecated (replaced by {r})")
                }
                _ => write!(f, "extension {name} is deprecated"),
            },
            Self::Unavailable { name, reason } => {
                write!(f, "skipping extension {name}: {reason}")
            }
            Self::RequirementSkipped { owner, expression } => write!(
                f,
                "skipping commands required by {owner}: dependency {expression} is not enabled"
            ),
        }
    }
}

/// One canonical command and every enabled owner that requires it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand<'s> {
    /// Canonical command id.
    pub id: CommandId,
    /// Canonical command name.
    pub name: &'s str,
    /// Owners in enabling order: features by version, then extensions by name.
    pub owners: Vec<Owner<'s>>,
}

/// Output of [`resolve`].
#[derive(Debug, Clone)]
pub struct ResolvedFeatureSet<'s> {
    spec: &'s Specification,
    family: String,
    target: ApiVersion,
    features: Vec<&'s Feature>,
    extensions: Vec<&'s Extension>,
    commands: Vec<ResolvedCommand<'s>>,
    notes: Vec<Note>,
}

impl<'s> ResolvedFeatureSet<'s> {
    /// The specification this was resolved against.
    #[must_use]
    pub const fn spec(&self) -> &'s Specification {
        self.spec
    }

    /// Resolved family.
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Concrete target version.
    #[must_use]
    pub const fn target(&self) -> ApiVersion {
        self.target
    }

    /// Enabled features, sorted by name.
    #[must_use]
    pub fn features(&self) -> &[&'s Feature] {
        &self.features
    }

    /// Enabled extensions, sorted by name.
    #[must_use]
    pub fn extensions(&self) -> &[&'s Extension] {
        &self.extensions
    }

    /// Enabled canonical commands, sorted by name.
    #[must_use]
    pub fn commands(&self) -> &[ResolvedCommand<'s>] {
        &self.commands
    }

    /// Enabled canonical command names, sorted.
    #[must_use]
    pub fn command_names(&self) -> Vec<&'s str> {
        self.commands.iter().map(|c| c.name).collect()
    }

    /// Whether a feature or extension with this name is enabled.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name == name) || self.extensions.iter().any(|e| e.name == name)
    }

    /// Non-fatal diagnostics, in the order they arose.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

/// Resolve `request` against `spec`.
///
/// # Errors
///
/// Returns the first [`ResolveError`] encountered; there is no partial
/// result.
pub fn resolve<'s>(
    spec: &'s Specification,
    request: &ResolveRequest,
) -> Result<ResolvedFeatureSet<'s>, ResolveError> {
    let family = request.family.as_str();
    let family_features = spec.features_of(family);
    let (Some(lowest), Some(latest)) = (family_features.first(), family_features.last()) else {
        return Err(ResolveError::UnknownFamily {
            family: family.to_string(),
            available: spec.resolvable_families().join(", "),
        });
    };

    let target = match request.target {
        TargetVersion::Latest => latest.version,
        TargetVersion::Exact(version) if version < lowest.version => {
            return Err(ResolveError::UnmetVersionRequirement {
                name: lowest.name.clone(),
                required: lowest.version,
                target: version,
            });
        }
        TargetVersion::Exact(version) => version,
    };

    let mut resolver = Resolver {
        spec,
        family,
        target,
        features: family_features
            .iter()
            .copied()
            .filter(|f| f.version <= target)
            .map(|f| (f.name.as_str(), f))
            .collect(),
        extensions: BTreeMap::new(),
        visiting: Vec::new(),
        notes: Vec::new(),
    };
    resolver.select(request)?;
    resolver.check_features()?;
    let commands = resolver.gather()?;

    tracing::debug!(
        family,
        %target,
        features = resolver.features.len(),
        extensions = resolver.extensions.len(),
        commands = commands.len(),
        "resolved request"
    );

    let Resolver {
        features,
        extensions,
        notes,
        ..
    } = resolver;
    Ok(ResolvedFeatureSet {
        spec,
        family: family.to_string(),
        target,
        features: features.into_values().collect(),
        extensions: extensions.into_values().collect(),
        commands,
        notes,
    })
}

/// Per-request working state.
struct Resolver<'s, 'r> {
    spec: &'s Specification,
    family: &'r str,
    target: ApiVersion,
    features: BTreeMap<&'s str, &'s Feature>,
    extensions: BTreeMap<&'s str, &'s Extension>,
    /// Extensions whose dependencies are being enabled, outermost first.
    visiting: Vec<&'s str>,
    notes: Vec<Note>,
}

impl<'s> Resolver<'s, '_> {
    fn is_enabled(&self, name: &str) -> bool {
        self.features.contains_key(name) || self.extensions.contains_key(name)
    }

    fn is_satisfied(&self, depends: &Depends) -> bool {
        depends.is_satisfied(&|name: &str| self.is_enabled(name))
    }

    fn select(&mut self, request: &ResolveRequest) -> Result<(), ResolveError> {
        let spec = self.spec;
        let family = self.family;
        match &request.extensions {
            ExtensionSelection::Named(names) => {
                for name in names {
                    if !request.include_deprecated
                        && let Some(ext) = spec.extension(name)
                        && ext.is_deprecated()
                    {
                        self.notes.push(Note::DeprecatedSkipped { name: name.clone() });
                        continue;
                    }
                    self.enable_extension(name, None)?;
                }
            }
            ExtensionSelection::All => {
                for ext in spec.extensions().values().filter(|e| e.supports(family)) {
                    if !request.include_deprecated && ext.is_deprecated() {
                        self.notes.push(Note::DeprecatedSkipped {
                            name: ext.name.clone(),
                        });
                        continue;
                    }
                    let snapshot = self.extensions.clone();
                    let notes = self.notes.len();
                    match self.enable_extension(&ext.name, None) {
                        Ok(()) => {}
                        Err(
                            reason @ (ResolveError::UnmetVersionRequirement { .. }
                            | ResolveError::UnsupportedExtension { .. }
                            | ResolveError::UnmetDependency { .. }),
                        ) => {
                            self.extensions = snapshot;
                            self.notes.truncate(notes);
                            self.notes.push(Note::Unavailable {
                                name: ext.name.clone(),
                                reason,
                            });
                        }
                        // Cycles and dangling names are defects of the document.
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        Ok(())
    }

    fn enable_extension(&mut self, name: &str, required_by: Option<&str>) -> Result<(), ResolveError> {
        if self.extensions.contains_key(name) {
            return Ok(());
        }
        if let Some(start) = self.visiting.iter().position(|v| *v == name) {
            let mut cycle: Vec<String> = self.visiting.iter().skip(start).map(|v| (*v).to_string()).collect();
            cycle.push(name.to_string());
            return Err(ResolveError::CyclicDependency { cycle });
        }
        let Some(ext) = self.spec.extension(name) else {
            return Err(ResolveError::UnknownExtension {
                name: name.to_string(),
                required_by: required_by.map(str::to_string),
            });
        };
        if !ext.supports(self.family) {
            return Err(ResolveError::UnsupportedExtension {
                name: ext.name.clone(),
                family: self.family.to_string(),
            });
        }
        if let Some(required) = ext.min_version
            && required > self.target
        {
            return Err(ResolveError::UnmetVersionRequirement {
                name: ext.name.clone(),
                required,
                target: self.target,
            });
        }

        self.visiting.push(&ext.name);
        let result = match &ext.depends {
            Some(depends) => self.satisfy(depends, &ext.name),
            None => Ok(()),
        };
        self.visiting.pop();
        result?;

        if ext.is_deprecated() {
            self.notes.push(Note::DeprecatedEnabled {
                name: ext.name.clone(),
                replacement: ext.deprecated_by.clone(),
            });
        }
        self.extensions.insert(&ext.name, ext);
        Ok(())
    }

    /// Enable whatever `depends` needs, on behalf of `owner`.
    fn satisfy(&mut self, depends: &'s Depends, owner: &'s str) -> Result<(), ResolveError> {
        match depends {
            Depends::Name(name) => self.require_name(name, owner),
            Depends::All(operands) => operands.iter().try_for_each(|d| self.satisfy(d, owner)),
            Depends::Any(operands) => {
                if operands.iter().any(|d| self.is_satisfied(d)) {
                    return Ok(());
                }
                let mut dangling = None;
                for operand in operands {
                    let snapshot = self.extensions.clone();
                    let notes = self.notes.len();
                    match self.satisfy(operand, owner) {
                        Ok(()) => return Ok(()),
                        Err(e @ ResolveError::CyclicDependency { .. }) => return Err(e),
                        Err(e) => {
                            self.extensions = snapshot;
                            self.notes.truncate(notes);
                            if dangling.is_none() && matches!(e, ResolveError::UnknownExtension { .. }) {
                                dangling = Some(e);
                            }
                        }
                    }
                }
                // No alternative works; a name the document never defines is
                // reported over the generic failure.
                Err(dangling.unwrap_or_else(|| ResolveError::UnmetDependency {
                    name: owner.to_string(),
                    expression: depends.to_string(),
                }))
            }
        }
    }

    /// A single name in a dependency expression: a core version or an extension.
    fn require_name(&mut self, name: &str, owner: &str) -> Result<(), ResolveError> {
        if self.is_enabled(name) {
            return Ok(());
        }
        if let Some(feature) = self.spec.feature(name) {
            return Err(if feature.supports(self.family) && feature.version > self.target {
                ResolveError::UnmetVersionRequirement {
                    name: owner.to_string(),
                    required: feature.version,
                    target: self.target,
                }
            } else {
                ResolveError::UnmetDependency {
                    name: owner.to_string(),
                    expression: name.to_string(),
                }
            });
        }
        self.enable_extension(name, Some(owner))
    }

    fn check_features(&self) -> Result<(), ResolveError> {
        for feature in self.features.values() {
            if let Some(depends) = &feature.depends
                && !self.is_satisfied(depends)
            {
                return Err(ResolveError::UnmetDependency {
                    name: feature.name.clone(),
                    expression: depends.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Collect the canonical commands required by every enabled owner.
    fn gather(&mut self) -> Result<Vec<ResolvedCommand<'s>>, ResolveError> {
        let spec = self.spec;
        let family = self.family;
        let mut features: Vec<&'s Feature> = self.features.values().copied().collect();
        features.sort_by_key(|f| f.version);
        let owners: Vec<Owner<'s>> = features
            .into_iter()
            .map(Owner::Feature)
            .chain(self.extensions.values().copied().map(Owner::Extension))
            .collect();

        let mut required: BTreeMap<CommandId, Vec<Owner<'s>>> = BTreeMap::new();
        for owner in &owners {
            for requirement in owner.requirements().iter().filter(|r| r.applies_to(family)) {
                if let Some(depends) = &requirement.depends
                    && !self.is_satisfied(depends)
                {
                    if !requirement.commands.is_empty() {
                        self.notes.push(Note::RequirementSkipped {
                            owner: owner.name().to_string(),
                            expression: depends.to_string(),
                        });
                    }
                    continue;
                }
                for name in &requirement.commands {
                    let id = spec.command_id(name).ok_or_else(|| ResolveError::UnknownCommand {
                        name: name.clone(),
                        required_by: owner.name().to_string(),
                    })?;
                    let list = required.entry(spec.canonical(id)?).or_default();
                    if !list.iter().any(|o| o.name() == owner.name()) {
                        list.push(*owner);
                    }
                }
            }
        }

        for owner in &owners {
            for name in owner.removals() {
                if let Some(id) = spec.command_id(name) {
                    required.remove(&spec.canonical(id)?);
                }
            }
        }

        let mut commands: Vec<ResolvedCommand<'s>> = required
            .into_iter()
            .map(|(id, owners)| ResolvedCommand {
                id,
                name: spec.name_of(id),
                owners,
            })
            .collect();
        commands.sort_by(|a, b| a.name.cmp(b.name));
        Ok(commands)
    }
}
