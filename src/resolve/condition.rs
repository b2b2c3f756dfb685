//! Availability conditions attached to resolved commands.
use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::registry::ApiVersion;

/// One reason a command is available.
///
/// The derived order (`Always`, then core versions by version, then
/// extensions by name) is what makes rendered conditions deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atom {
    /// Unconditionally available for the target.
    Always,
    /// Available through a core version.
    CoreVersion {
        /// The version.
        version: ApiVersion,
        /// Feature name, e.g. `VK_VERSION_1_1`.
        name: String,
    },
    /// Available when the named extension is enabled.
    Extension(String),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("always"),
            Self::CoreVersion { name, .. } | Self::Extension(name) => f.write_str(name),
        }
    }
}

/// A disjunction of [`Atom`]s.
///
/// [`Atom::Always`] absorbs everything else, so a condition is either
/// exactly `always` or a sorted set of version and extension atoms.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Condition {
    atoms: BTreeSet<Atom>,
}

impl Condition {
    /// The unconditional condition.
    #[must_use]
    pub fn always() -> Self {
        Self {
            atoms: BTreeSet::from([Atom::Always]),
        }
    }

    /// OR the given atoms together.
    pub fn from_atoms(atoms: impl IntoIterator<Item = Atom>) -> Self {
        let mut condition = Self::default();
        for atom in atoms {
            condition.push(atom);
        }
        condition
    }

    /// OR one more atom into the condition.
    pub fn push(&mut self, atom: Atom) {
        if self.is_always() {
            return;
        }
        if atom == Atom::Always {
            self.atoms.clear();
        }
        self.atoms.insert(atom);
    }

    /// Whether this is the unconditional condition.
    #[must_use]
    pub fn is_always(&self) -> bool {
        self.atoms.contains(&Atom::Always)
    }

    /// Whether no atom has been added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Atoms in their canonical order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    /// Preprocessor guard: `1` for `always`, otherwise every atom as
    /// `defined(NAME)` joined with `||`.
    #[must_use]
    pub fn to_guard(&self) -> String {
        if self.is_always() {
            return "1".to_string();
        }
        self.atoms
            .iter()
            .map(|atom| format!("defined({atom})"))
            .collect::<Vec<_>>()
            .join(" || ")
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, atom) in self.atoms.iter().enumerate() {
            if i > 0 {
                f.write_str(" || ")?;
            }
            atom.fmt(f)?;
        }
        Ok(())
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
