// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed workspace holding a trimmed Vulkan
// registry and an optional `vkdispatch.toml`, plus a fluent builder so each
// integration test can set up an isolated environment without repeating
// filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use vkdispatch::commands::CommandSetup;
use vkdispatch::config::PartialConfig;
use vkdispatch::logging::Logger;
use vkdispatch::registry::Specification;

/// The registry every test resolves against.
pub const REGISTRY: &str = include_str!("../fixtures/vk.xml");

/// Parse [`REGISTRY`].
pub fn specification() -> Specification {
    Specification::parse(REGISTRY).expect("parse fixture registry")
}

/// An isolated workspace backed by a [`tempfile::TempDir`].
///
/// Holds `vk.xml` at its root. The directory is deleted when dropped.
pub struct IntegrationTestContext {
    /// Temporary directory containing the workspace.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create a new context containing only the fixture registry.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::write(root.path().join("vk.xml"), REGISTRY).expect("write vk.xml");
        Self { root }
    }

    /// Path to the workspace root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Path to the fixture registry inside the workspace.
    pub fn registry_path(&self) -> PathBuf {
        self.root.path().join("vk.xml")
    }

    /// Run the shared command setup from the workspace root with the given
    /// command-line overrides.
    pub fn setup(&self, overrides: PartialConfig) -> CommandSetup {
        self.try_setup(overrides).expect("command setup")
    }

    /// Like [`IntegrationTestContext::setup`], returning the error.
    pub fn try_setup(&self, overrides: PartialConfig) -> anyhow::Result<CommandSetup> {
        CommandSetup::load(None, self.root.path(), overrides, &Logger::new())
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a new context backed by the fixture registry.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write `vkdispatch.toml` with `content`. A `specification` key is not
    /// needed; [`TestContextBuilder::with_registry_config`] adds one.
    pub fn with_config(self, content: &str) -> Self {
        std::fs::write(self.ctx.root.path().join("vkdispatch.toml"), content)
            .expect("write vkdispatch.toml");
        self
    }

    /// Write `vkdispatch.toml` pointing at the fixture registry, followed by
    /// `extra`.
    pub fn with_registry_config(self, extra: &str) -> Self {
        self.with_config(&format!("specification = \"vk.xml\"\n{extra}"))
    }

    /// Overwrite the workspace's `vk.xml`.
    pub fn with_registry(self, content: &str) -> Self {
        std::fs::write(self.ctx.registry_path(), content).expect("write vk.xml");
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}
