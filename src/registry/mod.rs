//! In-memory model of a Vulkan-style XML registry.
//!
//! Only what dispatch resolution needs is modeled: commands (with enough of
//! their prototype to classify them), features, extensions, and handle
//! types. Everything else in the document is skipped.
//!
//! The [`Specification`] is immutable once [`Specification::parse`] returns,
//! so a single instance can be shared across threads and resolved against
//! any number of requests.
pub mod command;
pub mod depends;
pub mod feature;
mod parse;
pub mod version;
pub mod xml;

use std::collections::BTreeMap;

pub use command::{Command, CommandId, CommandKind, DispatchLevel, Handle, HandleTable, Param};
pub use depends::Depends;
pub use feature::{Extension, ExtensionScope, Feature, Requirement};
pub use version::ApiVersion;

use crate::error::{ParseError, ResolveError};

/// The parsed registry.
#[derive(Debug, Clone)]
pub struct Specification {
    commands: Vec<Command>,
    command_index: BTreeMap<String, CommandId>,
    features: Vec<Feature>,
    extensions: BTreeMap<String, Extension>,
    families: Vec<String>,
    handles: HandleTable,
    /// `VK_HEADER_VERSION` defines in document order, with their `api` lists.
    header_versions: parse::HeaderVersions,
}

impl Specification {
    /// Parse registry text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedSpecification`] for unsafe or
    /// malformed XML, an unexpected root element, a missing required
    /// attribute, a duplicate name, an invalid version or dependency
    /// expression, or an alias to a command that does not exist.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let root = xml::parse(text).map_err(|e| ParseError::malformed("document", e.to_string()))?;
        let spec = parse::registry(&root)?;
        tracing::debug!(
            commands = spec.commands.len(),
            features = spec.features.len(),
            extensions = spec.extensions.len(),
            "parsed specification"
        );
        Ok(spec)
    }

    /// Every command, indexable by [`CommandId`].
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Look up a command by name.
    #[must_use]
    pub fn command_id(&self, name: &str) -> Option<CommandId> {
        self.command_index.get(name).copied()
    }

    /// The command with the given id.
    #[must_use]
    pub fn command(&self, id: CommandId) -> Option<&Command> {
        self.commands.get(id.index())
    }

    /// Features in document order.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Look up a feature by name.
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Features of `family`, ordered by version.
    #[must_use]
    pub fn features_of(&self, family: &str) -> Vec<&Feature> {
        let mut out: Vec<&Feature> = self.features.iter().filter(|f| f.supports(family)).collect();
        out.sort_by_key(|f| f.version);
        out
    }

    /// Lowest version defined for `family`.
    #[must_use]
    pub fn lowest_version(&self, family: &str) -> Option<ApiVersion> {
        self.features_of(family).first().map(|f| f.version)
    }

    /// Highest version defined for `family`.
    #[must_use]
    pub fn latest_version(&self, family: &str) -> Option<ApiVersion> {
        self.features_of(family).last().map(|f| f.version)
    }

    /// Extensions keyed by name.
    #[must_use]
    pub const fn extensions(&self) -> &BTreeMap<String, Extension> {
        &self.extensions
    }

    /// Look up an extension by name.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.get(name)
    }

    /// Family tags present in the document, sorted.
    #[must_use]
    pub fn families(&self) -> &[String] {
        &self.families
    }

    /// Families that define at least one core version, sorted.
    ///
    /// A family named only by extension `supported` lists is not here: it
    /// has no version to resolve against.
    #[must_use]
    pub fn resolvable_families(&self) -> Vec<&str> {
        self.families
            .iter()
            .filter(|family| self.features.iter().any(|f| f.supports(family)))
            .map(String::as_str)
            .collect()
    }

    /// Whether `family` appears anywhere in the document.
    #[must_use]
    pub fn has_family(&self, family: &str) -> bool {
        self.families.iter().any(|f| f == family)
    }

    /// Known handle types.
    #[must_use]
    pub const fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// `VK_HEADER_VERSION` for `family`: the first define whose `api` names
    /// the family or that has no `api` at all.
    #[must_use]
    pub fn header_version(&self, family: &str) -> Option<u32> {
        self.header_versions
            .iter()
            .find(|(api, _)| api.as_ref().is_none_or(|api| api.iter().any(|a| a == family)))
            .map(|(_, version)| *version)
    }

    /// Follow the alias chain from `id` to its canonical command.
    ///
    /// A canonical command resolves to itself.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::CyclicAlias`] if the chain does not reach a
    /// canonical command within `commands.len()` hops.
    pub fn canonical(&self, id: CommandId) -> Result<CommandId, ResolveError> {
        let mut current = id;
        for _ in 0..=self.commands.len() {
            match self.command(current).and_then(Command::alias_of) {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
        Err(ResolveError::CyclicAlias {
            name: self.name_of(id).to_string(),
        })
    }

    /// Dispatch level of a command, classified through its canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::CyclicAlias`] when `id` is an alias that never
    /// reaches a canonical command.
    pub fn level(&self, id: CommandId) -> Result<DispatchLevel, ResolveError> {
        let canonical = self.canonical(id)?;
        let params = self.command(canonical).map(Command::params).unwrap_or_default();
        Ok(command::classify(self.name_of(canonical), params, &self.handles))
    }

    /// Name of a command, or an empty string for a foreign id.
    #[must_use]
    pub fn name_of(&self, id: CommandId) -> &str {
        self.command(id).map_or("", |c| c.name.as_str())
    }
}
