//! Vulkan registry dispatch resolver.
//!
//! Reads the Vulkan API registry (`vk.xml`), resolves which commands a
//! given API family, core version and extension selection makes available,
//! classifies each command by the object it is dispatched through, and
//! groups commands by the condition under which a loader may fetch them.
//!
//! The public API is organised into layers:
//!
//! - **[`registry`]**: parse `vk.xml` into an immutable [`registry::Specification`]
//! - **[`resolve`]**: turn a request into enabled features, extensions and commands,
//!   then classify and group them
//! - **[`bundle`]**: the serializable result handed to code generation
//! - **[`config`]** and **[`commands`]**: settings and the CLI subcommands
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod bundle;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod resolve;
