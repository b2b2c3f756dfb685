//! TOML configuration file parsing.
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ConfigError;

/// Load and deserialize a TOML config file.
///
/// A missing file deserializes as empty TOML, so every optional key takes its
/// default.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file exists but cannot be read, and
/// [`ConfigError::InvalidToml`] if it does not match `T`.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = if path.exists() {
        std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        String::new()
    };

    toml::from_str(&content).map_err(|e| ConfigError::InvalidToml {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq, Eq)]
    struct Sample {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        items: Vec<String>,
    }

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let sample: Sample = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn parses_present_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        std::fs::write(&path, "name = \"x\"\nitems = [\"a\", \"b\"]\n").unwrap();
        let sample: Sample = load_config(&path).unwrap();
        assert_eq!(sample.name.as_deref(), Some("x"));
        assert_eq!(sample.items, vec!["a", "b"]);
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "name = [").unwrap();
        let err = load_config::<Sample>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidToml { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn wrong_type_is_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed.toml");
        std::fs::write(&path, "name = 3\n").unwrap();
        assert!(matches!(
            load_config::<Sample>(&path).unwrap_err(),
            ConfigError::InvalidToml { .. }
        ));
    }
}
