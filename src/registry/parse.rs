//! Turn a registry element tree into a [`Specification`].
use std::collections::{BTreeMap, BTreeSet};

use super::command::{Command, CommandId, CommandKind, Handle, HandleTable, Param};
use super::depends::Depends;
use super::feature::{Extension, ExtensionScope, Feature, Requirement};
use super::version::ApiVersion;
use super::xml::Element;
use super::Specification;
use crate::error::ParseError;

/// Family value the registry uses for extensions no API supports.
const DISABLED: &str = "disabled";

/// Build a specification from the document element.
pub(super) fn registry(root: &Element) -> Result<Specification, ParseError> {
    if root.name != "registry" {
        return Err(ParseError::malformed(
            &root.name,
            format!("expected <registry> as the document element, found <{}>", root.name),
        ));
    }

    let (commands, command_index) = commands(root)?;
    let features = features(root)?;
    let extensions = extensions(root)?;
    let (handles, header_versions) = types(root)?;

    let families: BTreeSet<String> = features
        .iter()
        .flat_map(|f| f.families.iter())
        .chain(extensions.values().flat_map(|e| e.families.iter()))
        .cloned()
        .collect();

    Ok(Specification {
        commands,
        command_index,
        features,
        extensions,
        families: families.into_iter().collect(),
        handles,
        header_versions,
    })
}

/// Fetch a mandatory attribute.
fn required<'a>(element: &'a Element, attr: &str, label: &str) -> Result<&'a str, ParseError> {
    element
        .attr(attr)
        .ok_or_else(|| ParseError::malformed(label, format!("missing required attribute '{attr}'")))
}

/// Split a comma-separated attribute value, dropping empty entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_depends(value: Option<&str>, label: &str) -> Result<Option<Depends>, ParseError> {
    value
        .map(|v| Depends::parse(v).map_err(|e| ParseError::malformed(label, e.to_string())))
        .transpose()
}

/// A parsed `<command>` before aliases are linked.
enum Pending {
    Canonical { return_type: String, params: Vec<Param> },
    Alias(String),
}

fn commands(root: &Element) -> Result<(Vec<Command>, BTreeMap<String, CommandId>), ParseError> {
    let mut pending: Vec<(String, Pending)> = Vec::new();
    let mut index: BTreeMap<String, CommandId> = BTreeMap::new();
    let mut api_variants: BTreeMap<String, Option<String>> = BTreeMap::new();

    for element in root.children_named("commands").flat_map(|c| c.children_named("command")) {
        let (name, entry) = if let Some(target) = element.attr("alias") {
            let name = required(element, "name", "command")?;
            (name.to_string(), Pending::Alias(target.to_string()))
        } else {
            let proto = element
                .child("proto")
                .ok_or_else(|| ParseError::malformed("command", "missing <proto>"))?;
            let name = proto
                .child_text("name")
                .filter(|n| !n.is_empty())
                .ok_or_else(|| ParseError::malformed("command", "missing prototype <name>"))?;
            let label = format!("command {name}");
            let params = element
                .children_named("param")
                .map(|p| param(p, &label))
                .collect::<Result<Vec<_>, _>>()?;
            let return_type = proto.child_text("type").unwrap_or("void").to_string();
            (name.to_string(), Pending::Canonical { return_type, params })
        };

        let api = element.attr("api").map(str::to_string);
        if let Some(previous_api) = api_variants.get(&name) {
            // Per-API variants of one command share a dispatch shape; the
            // first one wins. Anything else is a genuine duplicate.
            if api.is_some() && previous_api.is_some() && api != *previous_api {
                continue;
            }
            return Err(ParseError::malformed(
                format!("command {name}"),
                "duplicate command name",
            ));
        }
        api_variants.insert(name.clone(), api);
        index.insert(name.clone(), CommandId(pending.len()));
        pending.push((name, entry));
    }

    let commands = pending
        .into_iter()
        .map(|(name, entry)| {
            let kind = match entry {
                Pending::Canonical { return_type, params } => {
                    CommandKind::Canonical { return_type, params }
                }
                Pending::Alias(target) => {
                    let id = index.get(&target).copied().ok_or_else(|| {
                        ParseError::malformed(
                            format!("command {name}"),
                            format!("alias target '{target}' is not defined"),
                        )
                    })?;
                    CommandKind::Alias(id)
                }
            };
            Ok(Command { name, kind })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok((commands, index))
}

fn param(element: &Element, label: &str) -> Result<Param, ParseError> {
    let type_name = element
        .child_text("type")
        .ok_or_else(|| ParseError::malformed(label, "parameter without <type>"))?;
    let name = element
        .child_text("name")
        .ok_or_else(|| ParseError::malformed(label, "parameter without <name>"))?;
    // `optional="false,true"` describes pointer then pointee; the first entry
    // is about the parameter itself.
    let optional = element
        .attr("optional")
        .and_then(|o| o.split(',').next())
        .is_some_and(|o| o.trim() == "true");
    Ok(Param {
        type_name: type_name.to_string(),
        name: name.to_string(),
        optional,
    })
}

/// `<require>` and `<remove>` blocks shared by features and extensions.
fn requirements(
    element: &Element,
    label: &str,
) -> Result<(Vec<Requirement>, Vec<String>), ParseError> {
    let command_names = |block: &Element| {
        block
            .children_named("command")
            .map(|c| required(c, "name", label).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()
    };

    let mut requirements = Vec::new();
    for block in element.children_named("require") {
        requirements.push(Requirement {
            api: block.attr("api").map(split_list),
            depends: parse_depends(block.attr("depends"), label)?,
            commands: command_names(block)?,
        });
    }

    let mut removals = Vec::new();
    for block in element.children_named("remove") {
        removals.extend(command_names(block)?);
    }
    Ok((requirements, removals))
}

fn features(root: &Element) -> Result<Vec<Feature>, ParseError> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for element in root.children_named("feature") {
        let name = required(element, "name", "feature")?;
        let label = format!("feature {name}");
        if !seen.insert(name.to_string()) {
            return Err(ParseError::malformed(label, "duplicate feature name"));
        }
        let families = split_list(required(element, "api", &label)?);
        let number = required(element, "number", &label)?;
        let version: ApiVersion = number
            .parse()
            .map_err(|e: super::version::InvalidVersion| ParseError::malformed(&label, e.to_string()))?;
        let depends = parse_depends(element.attr("depends"), &label)?;
        let (requirements, removals) = requirements(element, &label)?;
        out.push(Feature {
            name: name.to_string(),
            families,
            version,
            depends,
            requirements,
            removals,
        });
    }
    Ok(out)
}

fn extensions(root: &Element) -> Result<BTreeMap<String, Extension>, ParseError> {
    let mut out = BTreeMap::new();
    for element in root
        .children_named("extensions")
        .flat_map(|e| e.children_named("extension"))
    {
        let name = required(element, "name", "extension")?;
        let label = format!("extension {name}");
        if out.contains_key(name) {
            return Err(ParseError::malformed(label, "duplicate extension name"));
        }

        let families = split_list(required(element, "supported", &label)?)
            .into_iter()
            .filter(|f| f != DISABLED)
            .collect();
        let number = element
            .attr("number")
            .map(|n| {
                n.trim()
                    .parse::<u32>()
                    .map_err(|e| ParseError::malformed(&label, format!("invalid number '{n}': {e}")))
            })
            .transpose()?;
        let scope = match element.attr("type") {
            None => None,
            Some("instance") => Some(ExtensionScope::Instance),
            Some("device") => Some(ExtensionScope::Device),
            Some(other) => {
                return Err(ParseError::malformed(
                    label,
                    format!("unknown extension type '{other}'"),
                ));
            }
        };
        let min_version = element
            .attr("requiresCore")
            .map(|v| {
                v.parse::<ApiVersion>()
                    .map_err(|e| ParseError::malformed(&label, e.to_string()))
            })
            .transpose()?;
        let depends = match element.attr("depends") {
            Some(expr) => parse_depends(Some(expr), &label)?,
            None => element
                .attr("requires")
                .and_then(|r| Depends::all_of(split_list(r))),
        };
        let (requirements, removals) = requirements(element, &label)?;

        out.insert(
            name.to_string(),
            Extension {
                name: name.to_string(),
                number,
                families,
                scope,
                min_version,
                depends,
                revision: revision(element, name),
                promoted_to: element.attr("promotedto").map(str::to_string),
                deprecated_by: element.attr("deprecatedby").map(str::to_string),
                obsoleted_by: element.attr("obsoletedby").map(str::to_string),
                requirements,
                removals,
            },
        );
    }
    Ok(out)
}

/// Value of the `<NAME>_SPEC_VERSION` enum inside the extension's requirements.
fn revision(element: &Element, name: &str) -> Option<u32> {
    let enum_name = format!("{}_SPEC_VERSION", name.to_uppercase());
    element
        .children_named("require")
        .flat_map(|r| r.children_named("enum"))
        .find(|e| e.attr("name") == Some(enum_name.as_str()))
        .and_then(|e| e.attr("value"))
        .and_then(|v| v.trim().trim_matches('"').parse().ok())
}

/// `VK_HEADER_VERSION` defines, each with the families it applies to.
pub(super) type HeaderVersions = Vec<(Option<Vec<String>>, u32)>;

/// Handle types and the `VK_HEADER_VERSION` defines.
fn types(root: &Element) -> Result<(HandleTable, HeaderVersions), ParseError> {
    let mut handles = HandleTable::with_vulkan_defaults();
    let mut header_versions = Vec::new();

    for element in root.children_named("types").flat_map(|t| t.children_named("type")) {
        match element.attr("category") {
            Some("handle") => {
                let name = element
                    .attr("name")
                    .or_else(|| element.child_text("name"))
                    .ok_or_else(|| ParseError::malformed("type", "handle without a name"))?;
                handles.insert(
                    name,
                    Handle {
                        parents: element.attr("parent").map(split_list).unwrap_or_default(),
                        dispatchable: element.child_text("type") == Some("VK_DEFINE_HANDLE"),
                        alias: element.attr("alias").map(str::to_string),
                    },
                );
            }
            Some("define") if element.child_text("name") == Some("VK_HEADER_VERSION") => {
                if let Some(version) = element.text.split_whitespace().last().and_then(|v| v.parse().ok()) {
                    header_versions.push((element.attr("api").map(split_list), version));
                }
            }
            _ => {}
        }
    }
    Ok((handles, header_versions))
}
