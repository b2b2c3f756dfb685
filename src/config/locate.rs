//! Finding the registry file on disk.
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Location of `vk.xml` below an SDK or install prefix.
const REGISTRY_SUFFIX: &[&str] = &["share", "vulkan", "registry", "vk.xml"];

/// Candidate registry locations, in search order.
///
/// `env` looks up environment variables; `home` is the user's home
/// directory, if known.
#[must_use]
pub fn search_paths(env: impl Fn(&str) -> Option<String>, home: Option<&Path>) -> Vec<PathBuf> {
    let mut prefixes: Vec<PathBuf> = Vec::new();
    if let Some(sdk) = env("VULKAN_SDK").filter(|s| !s.is_empty()) {
        prefixes.push(PathBuf::from(sdk));
    }
    if cfg!(windows)
        && let Some(sdk) = env("VULKAN_SDK_PATH").filter(|s| !s.is_empty())
    {
        prefixes.push(PathBuf::from(sdk));
    }
    if let Some(home) = home {
        prefixes.push(home.join(".local"));
    }
    prefixes.push(PathBuf::from("/usr/local"));
    prefixes.push(PathBuf::from("/usr"));

    prefixes
        .into_iter()
        .map(|prefix| REGISTRY_SUFFIX.iter().fold(prefix, |path, part| path.join(part)))
        .collect()
}

/// The current user's home directory from the environment.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Resolve the registry path.
///
/// An explicit path must name a regular file. Without one, the first
/// existing file among [`search_paths`] wins. The result is canonicalized.
///
/// # Errors
///
/// Returns [`ConfigError::NotAFile`] for an explicit path that is not a
/// regular file, [`ConfigError::Io`] if it cannot be canonicalized, and
/// [`ConfigError::SpecificationNotFound`] when the search finds nothing.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let candidates = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(ConfigError::NotAFile(path.to_path_buf()));
            }
            vec![path.to_path_buf()]
        }
        None => search_paths(|key| std::env::var(key).ok(), home_dir().as_deref()),
    };

    let Some(found) = candidates.iter().find(|p| p.is_file()) else {
        return Err(ConfigError::SpecificationNotFound {
            searched: candidates,
        });
    };
    dunce::canonicalize(found).map_err(|source| ConfigError::Io {
        path: found.clone(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn system_prefixes_come_last() {
        let paths = search_paths(no_env, None);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/usr/local/share/vulkan/registry/vk.xml"),
                PathBuf::from("/usr/share/vulkan/registry/vk.xml"),
            ]
        );
    }

    #[test]
    fn sdk_and_home_are_searched_first() {
        let env = |key: &str| (key == "VULKAN_SDK").then(|| "/opt/sdk".to_string());
        let paths = search_paths(env, Some(Path::new("/home/me")));
        assert_eq!(paths[0], PathBuf::from("/opt/sdk/share/vulkan/registry/vk.xml"));
        assert_eq!(
            paths[1],
            PathBuf::from("/home/me/.local/share/vulkan/registry/vk.xml")
        );
        assert_eq!(paths.len(), 4);
    }

    #[test]
    fn empty_sdk_variable_is_ignored() {
        let env = |_: &str| Some(String::new());
        assert_eq!(search_paths(env, None).len(), 2);
    }

    #[test]
    fn explicit_file_is_canonicalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vk.xml");
        std::fs::write(&path, "<registry/>").unwrap();
        let found = locate(Some(&path)).unwrap();
        assert_eq!(found, dunce::canonicalize(&path).unwrap());
    }

    #[test]
    fn explicit_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate(Some(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::NotAFile(_)));
    }

    #[test]
    fn explicit_missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate(Some(&dir.path().join("nope.xml"))).unwrap_err();
        assert!(err.to_string().contains("nope.xml"));
    }
}
