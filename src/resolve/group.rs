//! Per-command conditions and the groups they form.
use std::collections::BTreeMap;

use super::condition::{Atom, Condition};
use super::{Owner, ResolvedFeatureSet};
use crate::error::ResolveError;
use crate::registry::{CommandId, DispatchLevel};

/// A resolved command with its level and condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry<'s> {
    /// Canonical command id.
    pub id: CommandId,
    /// Canonical command name.
    pub name: &'s str,
    /// How the command is dispatched.
    pub level: DispatchLevel,
    /// When the command is available.
    pub condition: Condition,
}

/// Resolved commands split by dispatch level, each list sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCommandSet<'s> {
    global: Vec<CommandEntry<'s>>,
    instance: Vec<CommandEntry<'s>>,
    device: Vec<CommandEntry<'s>>,
}

impl<'s> ResolvedCommandSet<'s> {
    /// Commands callable without an instance.
    #[must_use]
    pub fn global(&self) -> &[CommandEntry<'s>] {
        &self.global
    }

    /// Commands dispatched through an instance or physical device.
    #[must_use]
    pub fn instance(&self) -> &[CommandEntry<'s>] {
        &self.instance
    }

    /// Commands dispatched through a device.
    #[must_use]
    pub fn device(&self) -> &[CommandEntry<'s>] {
        &self.device
    }

    /// The list for one level.
    #[must_use]
    pub fn level(&self, level: DispatchLevel) -> &[CommandEntry<'s>] {
        match level {
            DispatchLevel::Global => &self.global,
            DispatchLevel::Instance => &self.instance,
            DispatchLevel::Device => &self.device,
        }
    }

    /// Every entry: global, then instance, then device.
    pub fn iter(&self) -> impl Iterator<Item = &CommandEntry<'s>> {
        self.global.iter().chain(&self.instance).chain(&self.device)
    }

    /// Total number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.global.len() + self.instance.len() + self.device.len()
    }

    /// Whether no command is enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Commands sharing one condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<'s> {
    /// The shared condition.
    pub condition: Condition,
    /// Member names, sorted.
    pub commands: Vec<&'s str>,
}

/// Classify every resolved command and compute its condition, then merge
/// commands with identical conditions into groups.
///
/// An enabled feature contributes [`Atom::Always`]. An enabled extension
/// contributes its name, plus the core version it was promoted to when that
/// version is enabled. Groups are ordered by condition, so `always` comes
/// first.
///
/// # Errors
///
/// Returns [`ResolveError::CyclicAlias`] if a command cannot be classified
/// through its canonical form.
pub fn group_by<'s>(
    resolved: &ResolvedFeatureSet<'s>,
) -> Result<(ResolvedCommandSet<'s>, Vec<Group<'s>>), ResolveError> {
    let spec = resolved.spec();
    let mut set = ResolvedCommandSet::default();
    let mut groups: BTreeMap<Condition, Vec<&'s str>> = BTreeMap::new();

    for command in resolved.commands() {
        let condition = Condition::from_atoms(command.owners.iter().flat_map(|owner| atoms(*owner, resolved)));
        let level = spec.level(command.id)?;
        groups.entry(condition.clone()).or_default().push(command.name);
        let entry = CommandEntry {
            id: command.id,
            name: command.name,
            level,
            condition,
        };
        match level {
            DispatchLevel::Global => set.global.push(entry),
            DispatchLevel::Instance => set.instance.push(entry),
            DispatchLevel::Device => set.device.push(entry),
        }
    }

    let groups = groups
        .into_iter()
        .map(|(condition, commands)| Group { condition, commands })
        .collect();
    Ok((set, groups))
}

/// Atoms one owner contributes.
fn atoms(owner: Owner<'_>, resolved: &ResolvedFeatureSet<'_>) -> Vec<Atom> {
    match owner {
        Owner::Feature(_) => vec![Atom::Always],
        Owner::Extension(ext) => {
            let mut atoms = vec![Atom::Extension(ext.name.clone())];
            if let Some(promoted) = ext.promoted_to.as_deref()
                && let Some(feature) = resolved.features().iter().find(|f| f.name == promoted)
            {
                atoms.push(Atom::CoreVersion {
                    version: feature.version,
                    name: feature.name.clone(),
                });
            }
            atoms
        }
    }
}
