//! Build properties for `${property}` version placeholders
//!
//! Loaded from a TOML file and `--property KEY=VALUE` flags; flags win.

use anyhow::{bail, Context, Result};
use modrewrite_core::PropertySource;
use std::collections::BTreeMap;
use std::path::Path;

/// Build properties keyed by name
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildProperties {
    values: BTreeMap<String, String>,
}

impl BuildProperties {
    /// Load properties from a TOML file
    ///
    /// Top-level scalar keys and the keys of an optional `[properties]` table
    /// become properties. Dotted property names must be quoted.
    pub fn load_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(contents)?;
        let mut properties = Self::default();

        for (key, value) in &table {
            match value {
                toml::Value::Table(nested) if key == "properties" => {
                    for (name, value) in nested {
                        properties.set(name.clone(), scalar(name, value)?);
                    }
                }
                _ => properties.set(key.clone(), scalar(key, value)?),
            }
        }

        Ok(properties)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Apply `KEY=VALUE` overrides
    pub fn extend(&mut self, overrides: impl IntoIterator<Item = (String, String)>) {
        self.values.extend(overrides);
    }
}

impl PropertySource for BuildProperties {
    fn property(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

fn scalar(name: &str, value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        _ => bail!("Property '{}' must be a string, number or boolean", name),
    }
}

/// Parse a `KEY=VALUE` command line argument
pub fn parse_key_value(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", arg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_properties_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("build.toml");
        fs::write(
            &path,
            r#"
"version.lib" = "1.2.3"
release = true

[properties]
"version.other" = "4.5"
build = 7
"#,
        )
        .unwrap();

        let properties = BuildProperties::load_path(&path).unwrap();

        assert_eq!(properties.values.len(), 4);
        assert_eq!(properties.property("version.lib").as_deref(), Some("1.2.3"));
        assert_eq!(properties.property("release").as_deref(), Some("true"));
        assert_eq!(properties.property("version.other").as_deref(), Some("4.5"));
        assert_eq!(properties.property("build").as_deref(), Some("7"));
    }

    #[test]
    fn test_rejects_arrays() {
        let result = BuildProperties::from_toml_str("versions = [\"1\", \"2\"]");
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut properties = BuildProperties::from_toml_str("\"version.lib\" = \"1.0\"").unwrap();
        properties.extend(vec![("version.lib".to_string(), "2.0".to_string())]);
        assert_eq!(properties.property("version.lib").as_deref(), Some("2.0"));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = BuildProperties::load_path(&temp.path().join("nope.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read"));
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("version.lib=1.0").unwrap(),
            ("version.lib".to_string(), "1.0".to_string())
        );
        assert_eq!(
            parse_key_value("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=1").is_err());
    }
}
