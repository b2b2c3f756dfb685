//! Core API versions (`<feature>`) and extensions (`<extension>`).
use std::fmt;

use serde::Serialize;

use super::depends::Depends;
use super::version::ApiVersion;

/// One `<require>` block: a list of commands pulled in by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Requirement {
    /// Families this block applies to; `None` means every family of the owner.
    pub api: Option<Vec<String>>,
    /// Extra condition on the block (`<require depends="...">`).
    pub depends: Option<Depends>,
    /// Command names in document order.
    pub commands: Vec<String>,
}

impl Requirement {
    /// Whether this block applies to `family`.
    #[must_use]
    pub fn applies_to(&self, family: &str) -> bool {
        self.api
            .as_ref()
            .is_none_or(|apis| apis.iter().any(|a| a == family))
    }
}

/// A bundle of commands introduced by a core API version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Feature name, e.g. `VK_VERSION_1_2`.
    pub name: String,
    /// Families the feature belongs to (`api="vulkan,vulkansc"`).
    pub families: Vec<String>,
    /// Version ordinal (`number="1.2"`).
    pub version: ApiVersion,
    /// Extra condition the feature itself declares.
    pub depends: Option<Depends>,
    /// `<require>` blocks.
    pub requirements: Vec<Requirement>,
    /// Commands named by `<remove>` blocks.
    pub removals: Vec<String>,
}

impl Feature {
    /// Whether the feature belongs to `family`.
    #[must_use]
    pub fn supports(&self, family: &str) -> bool {
        self.families.iter().any(|f| f == family)
    }
}

/// Whether an extension extends the instance or a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionScope {
    /// `type="instance"`.
    Instance,
    /// `type="device"`.
    Device,
}

impl fmt::Display for ExtensionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Instance => "instance",
            Self::Device => "device",
        })
    }
}

/// An independently toggleable capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Extension name, e.g. `VK_KHR_swapchain`.
    pub name: String,
    /// Registry extension number.
    pub number: Option<u32>,
    /// Families the extension supports; empty when `supported="disabled"`.
    pub families: Vec<String>,
    /// Instance or device extension, when declared.
    pub scope: Option<ExtensionScope>,
    /// Lowest core version the extension can be enabled on (`requiresCore`).
    pub min_version: Option<ApiVersion>,
    /// Other extensions or versions this one depends on.
    pub depends: Option<Depends>,
    /// Revision from the `<NAME>_SPEC_VERSION` enum, when present.
    pub revision: Option<u32>,
    /// Feature or extension this was promoted to.
    pub promoted_to: Option<String>,
    /// Replacement for a deprecated extension; empty when deprecated without one.
    pub deprecated_by: Option<String>,
    /// Replacement for an obsolete extension.
    pub obsoleted_by: Option<String>,
    /// `<require>` blocks.
    pub requirements: Vec<Requirement>,
    /// Commands named by `<remove>` blocks.
    pub removals: Vec<String>,
}

impl Extension {
    /// Whether the extension can be enabled for `family`.
    #[must_use]
    pub fn supports(&self, family: &str) -> bool {
        self.families.iter().any(|f| f == family)
    }

    /// Whether the registry marks the extension deprecated.
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        self.deprecated_by.is_some()
    }
}
