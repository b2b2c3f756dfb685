//! Commands, handle types, and dispatch-level classification.
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Index of a command in [`Specification::commands`](super::Specification::commands).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(pub(crate) usize);

impl CommandId {
    /// Position of the command in the specification's command table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One parameter of a command prototype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    /// Declared type name (the `<type>` child), without qualifiers.
    pub type_name: String,
    /// Parameter name.
    pub name: String,
    /// Whether the registry marks the parameter `optional="true"`.
    pub optional: bool,
}

/// Either a full prototype or a pointer to another command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// A command with its own prototype.
    Canonical {
        /// Return type name.
        return_type: String,
        /// Ordered parameters.
        params: Vec<Param>,
    },
    /// An alternate name for another command.
    Alias(CommandId),
}

/// A named entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Unique command name, e.g. `vkCreateDevice`.
    pub name: String,
    /// Prototype or alias target.
    pub kind: CommandKind,
}

impl Command {
    /// The command this one aliases, if any.
    #[must_use]
    pub const fn alias_of(&self) -> Option<CommandId> {
        match self.kind {
            CommandKind::Alias(target) => Some(target),
            CommandKind::Canonical { .. } => None,
        }
    }

    /// Return type of a canonical command.
    #[must_use]
    pub fn return_type(&self) -> Option<&str> {
        match &self.kind {
            CommandKind::Canonical { return_type, .. } => Some(return_type.as_str()),
            CommandKind::Alias(_) => None,
        }
    }

    /// Parameters of a canonical command; empty for aliases.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        match &self.kind {
            CommandKind::Canonical { params, .. } => params,
            CommandKind::Alias(_) => &[],
        }
    }
}

/// How a command is looked up at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchLevel {
    /// Callable without any instance or device (`vkGetInstanceProcAddr(NULL, ...)`).
    Global,
    /// Dispatched through an instance or physical device.
    Instance,
    /// Dispatched through a device or one of its children.
    Device,
}

impl fmt::Display for DispatchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Global => "Global",
            Self::Instance => "Instance",
            Self::Device => "Device",
        })
    }
}

/// A handle type declared with `category="handle"`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Handle {
    /// Parent handle types, empty for a root handle.
    pub parents: Vec<String>,
    /// `VK_DEFINE_HANDLE` (pointer-sized, carries a dispatch table).
    pub dispatchable: bool,
    /// Handle type this name aliases.
    pub alias: Option<String>,
}

/// All known handle types, keyed by type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleTable {
    handles: BTreeMap<String, Handle>,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::with_vulkan_defaults()
    }
}

impl HandleTable {
    /// A table without any handles.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            handles: BTreeMap::new(),
        }
    }

    /// A table pre-seeded with the dispatchable Vulkan handles, so documents
    /// without a `<types>` section still classify.
    #[must_use]
    pub fn with_vulkan_defaults() -> Self {
        let mut table = Self::empty();
        for (name, parent) in [
            ("VkInstance", None),
            ("VkPhysicalDevice", Some("VkInstance")),
            ("VkDevice", Some("VkPhysicalDevice")),
            ("VkQueue", Some("VkDevice")),
            ("VkCommandBuffer", Some("VkCommandPool")),
        ] {
            table.insert(
                name,
                Handle {
                    parents: parent.map(str::to_string).into_iter().collect(),
                    dispatchable: true,
                    alias: None,
                },
            );
        }
        table
    }

    /// Add or replace a handle definition.
    pub fn insert(&mut self, name: impl Into<String>, handle: Handle) {
        self.handles.insert(name.into(), handle);
    }

    /// Look up a handle, following aliases.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Handle> {
        let mut current = self.handles.get(name)?;
        // Alias chains are short; the bound only guards malformed documents.
        for _ in 0..self.handles.len() {
            match &current.alias {
                Some(target) => current = self.handles.get(target)?,
                None => return Some(current),
            }
        }
        None
    }

    /// Whether `name` is a dispatchable handle type.
    #[must_use]
    pub fn is_dispatchable(&self, name: &str) -> bool {
        self.get(name).is_some_and(|h| h.dispatchable)
    }

    /// Whether `name` is a root handle (the instance) or a dispatchable
    /// direct child of one (the physical device).
    #[must_use]
    pub fn is_instance_domain(&self, name: &str) -> bool {
        let Some(handle) = self.get(name) else {
            return false;
        };
        if handle.parents.is_empty() {
            return true;
        }
        handle.dispatchable
            && handle
                .parents
                .iter()
                .all(|p| self.get(p).is_some_and(|parent| parent.parents.is_empty()))
    }
}

/// Commands the loader exports with a null owner even though their first
/// parameter is an instance handle.
const LOADER_ENTRY_POINTS: &[&str] = &["vkGetInstanceProcAddr"];

/// Classify a canonical command into a dispatch level.
///
/// First match wins:
/// 1. a loader entry point, no parameters, or a first parameter that is not
///    a dispatchable handle: [`DispatchLevel::Global`];
/// 2. a first parameter in the instance domain: [`DispatchLevel::Instance`];
/// 3. anything else: [`DispatchLevel::Device`].
#[must_use]
pub fn classify(name: &str, params: &[Param], handles: &HandleTable) -> DispatchLevel {
    let Some(first) = params.first() else {
        return DispatchLevel::Global;
    };
    if LOADER_ENTRY_POINTS.contains(&name) || !handles.is_dispatchable(&first.type_name) {
        DispatchLevel::Global
    } else if handles.is_instance_domain(&first.type_name) {
        DispatchLevel::Instance
    } else {
        DispatchLevel::Device
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn param(type_name: &str, optional: bool) -> Param {
        Param {
            type_name: type_name.to_string(),
            name: "p".to_string(),
            optional,
        }
    }

    #[test]
    fn no_params_is_global() {
        assert_eq!(
            classify("vkTest", &[], &HandleTable::default()),
            DispatchLevel::Global
        );
    }

    #[test]
    fn non_handle_first_param_is_global() {
        let params = [param("VkInstanceCreateInfo", false), param("VkInstance", false)];
        assert_eq!(
            classify("vkTest", &params, &HandleTable::default()),
            DispatchLevel::Global
        );
    }

    #[test]
    fn get_instance_proc_addr_is_global() {
        let params = [param("VkInstance", true), param("char", false)];
        assert_eq!(
            classify("vkGetInstanceProcAddr", &params, &HandleTable::default()),
            DispatchLevel::Global
        );
    }

    #[test]
    fn optional_instance_is_still_instance_level() {
        let params = [param("VkInstance", true)];
        assert_eq!(
            classify("vkDestroyInstance", &params, &HandleTable::default()),
            DispatchLevel::Instance
        );
    }

    #[test]
    fn instance_and_physical_device_are_instance_level() {
        let handles = HandleTable::default();
        assert_eq!(
            classify("vkTest", &[param("VkInstance", false)], &handles),
            DispatchLevel::Instance
        );
        assert_eq!(
            classify("vkTest", &[param("VkPhysicalDevice", false)], &handles),
            DispatchLevel::Instance
        );
    }

    #[test]
    fn device_children_are_device_level() {
        let handles = HandleTable::default();
        for ty in ["VkDevice", "VkQueue", "VkCommandBuffer"] {
            assert_eq!(
                classify("vkTest", &[param(ty, false)], &handles),
                DispatchLevel::Device,
                "{ty}"
            );
        }
    }

    #[test]
    fn non_dispatchable_handle_is_global() {
        let mut handles = HandleTable::default();
        handles.insert(
            "VkSurfaceKHR",
            Handle {
                parents: vec!["VkInstance".to_string()],
                dispatchable: false,
                alias: None,
            },
        );
        assert_eq!(
            classify("vkTest", &[param("VkSurfaceKHR", false)], &handles),
            DispatchLevel::Global
        );
    }

    #[test]
    fn handle_aliases_are_followed() {
        let mut handles = HandleTable::default();
        handles.insert(
            "VkDeviceAlias",
            Handle {
                alias: Some("VkDevice".to_string()),
                ..Handle::default()
            },
        );
        assert_eq!(
            classify("vkTest", &[param("VkDeviceAlias", false)], &handles),
            DispatchLevel::Device
        );
    }

    #[test]
    fn cyclic_handle_alias_is_not_dispatchable() {
        let mut handles = HandleTable::empty();
        handles.insert(
            "A",
            Handle {
                alias: Some("B".to_string()),
                ..Handle::default()
            },
        );
        handles.insert(
            "B",
            Handle {
                alias: Some("A".to_string()),
                ..Handle::default()
            },
        );
        assert!(!handles.is_dispatchable("A"));
        assert_eq!(classify("vkTest", &[param("A", false)], &handles), DispatchLevel::Global);
    }

    #[test]
    fn alias_command_has_no_params() {
        let cmd = Command {
            name: "vkFooKHR".to_string(),
            kind: CommandKind::Alias(CommandId(0)),
        };
        assert_eq!(cmd.alias_of(), Some(CommandId(0)));
        assert!(cmd.params().is_empty());
        assert_eq!(cmd.return_type(), None);
    }

    #[test]
    fn canonical_command_reports_return_type() {
        let cmd = Command {
            name: "vkCreateInstance".to_string(),
            kind: CommandKind::Canonical {
                return_type: "VkResult".to_string(),
                params: Vec::new(),
            },
        };
        assert_eq!(cmd.return_type(), Some("VkResult"));
        assert_eq!(cmd.alias_of(), None);
    }

    #[test]
    fn level_display_is_title_case() {
        assert_eq!(DispatchLevel::Global.to_string(), "Global");
        assert_eq!(DispatchLevel::Device.to_string(), "Device");
    }
}
