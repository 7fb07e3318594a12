//! Project configuration file (`source.yaml`)

use crate::params::ParameterSet;
use crate::probe::{DependencyDescriptor, OverrideValue};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Project metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub copyright: String,
}

/// One exported type of the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSection {
    /// Type name, e.g. "widget" for `libexample_widget_t`
    pub name: String,

    /// Name of the values the type holds, used by the free function tests
    #[serde(default = "default_value_name")]
    pub value_name: String,
}

fn default_value_name() -> String {
    "value".to_string()
}

/// The library being scaffolded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySection {
    /// Full library name including the `lib` prefix
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Types that get lifecycle tests
    #[serde(default)]
    pub types: Vec<TypeSection>,
}

/// Python binding module, when it differs from `py<suffix>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonModuleSection {
    pub name: String,
}

/// Root of the project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project: ProjectSection,

    pub library: LibrarySection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_module: Option<PythonModuleSection>,

    #[serde(default)]
    pub dependencies: Vec<DependencyDescriptor>,
}

impl ProjectConfig {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: ProjectConfig =
            serde_yaml::from_str(content).context("Invalid project configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.library.name.trim().is_empty() {
            anyhow::bail!("library.name must not be empty");
        }
        check_identifier("library.name", &self.library.name)?;
        if let Some(module) = &self.python_module {
            check_identifier("python_module.name", &module.name)?;
        }

        let mut types = HashSet::new();
        for ty in &self.library.types {
            if ty.name.trim().is_empty() {
                anyhow::bail!("library.types entries need a name");
            }
            check_identifier("Type name", &ty.name)?;
            check_identifier("value_name", &ty.value_name)?;
            if !types.insert(ty.name.as_str()) {
                anyhow::bail!("Type '{}' is listed more than once", ty.name);
            }
        }

        let mut names = HashSet::new();
        for dep in &self.dependencies {
            check_identifier("Dependency name", &dep.name)?;
            if !names.insert(dep.name.as_str()) {
                anyhow::bail!("Dependency '{}' is listed more than once", dep.name);
            }
        }
        Ok(())
    }

    /// Replace dependency overrides, like `--with-libNAME=VALUE`
    pub fn apply_overrides(&mut self, overrides: &[(String, OverrideValue)]) -> Result<()> {
        for (name, value) in overrides {
            let Some(index) = self
                .dependencies
                .iter()
                .position(|d| d.name == *name || d.library_id() == *name)
            else {
                let available: Vec<&str> = self.dependencies.iter().map(|d| d.name.as_str()).collect();
                anyhow::bail!(
                    "Dependency '{}' not found. Available dependencies: {}",
                    name,
                    available.join(", ")
                );
            };
            self.dependencies[index].override_value = value.clone();
        }
        Ok(())
    }

    /// Base tokens describing the library
    pub fn library_parameters(&self) -> ParameterSet {
        let mut tokens = vec![
            ("authors", self.project.authors.join(", ")),
            ("copyright", self.project.copyright.clone()),
            ("library_name", self.library.name.clone()),
            ("library_description", self.library.description.clone()),
        ];
        if let Some(module) = &self.python_module {
            tokens.push(("python_module_name", module.name.clone()));
        }
        tokens.into_iter().collect()
    }

    /// Base tokens for one exported type
    pub fn type_parameters(&self, ty: &TypeSection) -> ParameterSet {
        let mut params = self.library_parameters();
        // Library tokens never use these names, so there is nothing to clash with.
        let _ = params.insert("type_name", ty.name.clone());
        let _ = params.insert("value_name", ty.value_name.clone());
        params
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeSection> {
        self.library.types.iter().find(|t| t.name == name)
    }
}

/// Names end up in C identifiers and in destination paths
fn check_identifier(what: &str, name: &str) -> Result<()> {
    let valid = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if !valid {
        anyhow::bail!(
            "{} '{}' must contain only letters, digits and '_' and not start with a digit",
            what,
            name
        );
    }
    Ok(())
}

/// Parse a `NAME=VALUE` override argument
pub fn parse_override(arg: &str) -> Result<(String, OverrideValue)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected NAME=VALUE, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Missing dependency name in '{}'", arg);
    }
    Ok((name.to_string(), OverrideValue::parse(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"
project:
  authors: ["Jane Doe <jane@example.com>", "John Roe"]
  copyright: "2012-2016"
library:
  name: libexample
  description: Library to access the example format
  types:
    - name: widget
      value_name: item
    - name: gadget
dependencies:
  - name: mapidb
    min_version: "20120405"
  - name: cerror
    min_version: "20120425"
    override: disabled
"#;

    #[test]
    fn test_parse_sample() {
        let config = ProjectConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.library.types.len(), 2);
        assert_eq!(config.library.types[1].value_name, "value");
        assert_eq!(config.dependencies[1].override_value, OverrideValue::Disabled);
    }

    #[test]
    fn test_library_parameters() {
        let config = ProjectConfig::from_yaml_str(SAMPLE).unwrap();
        let params = config.library_parameters();
        assert_eq!(params.get("authors"), Some("Jane Doe <jane@example.com>, John Roe"));
        assert_eq!(params.get("library_name"), Some("libexample"));
        assert!(!params.contains("python_module_name"));
    }

    #[test]
    fn test_type_parameters() {
        let config = ProjectConfig::from_yaml_str(SAMPLE).unwrap();
        let widget = config.find_type("widget").unwrap();
        let params = config.type_parameters(widget);
        assert_eq!(params.get("type_name"), Some("widget"));
        assert_eq!(params.get("value_name"), Some("item"));
    }

    #[test]
    fn test_duplicate_types_rejected() {
        let yaml = "library:\n  name: libx\n  types:\n    - name: a\n    - name: a\n";
        assert!(ProjectConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_empty_library_name_rejected() {
        assert!(ProjectConfig::from_yaml_str("library:\n  name: \"\"\n").is_err());
    }

    #[test]
    fn test_path_like_names_rejected() {
        let cases = [
            "library:\n  name: ../libexample\n",
            "library:\n  name: lib/example\n",
            "library:\n  name: libx\n  types:\n    - name: ../widget\n",
            "library:\n  name: libx\npython_module:\n  name: py.x\n",
            "library:\n  name: libx\ndependencies:\n  - name: ../mapidb\n    min_version: \"1\"\n",
        ];
        for yaml in cases {
            let err = ProjectConfig::from_yaml_str(yaml).unwrap_err();
            assert!(err.to_string().contains("only letters"), "{yaml}: {err}");
        }
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = ProjectConfig::from_yaml_str(SAMPLE).unwrap();
        config
            .apply_overrides(&[
                ("libmapidb".to_string(), OverrideValue::parse("/opt/mapidb")),
                ("cerror".to_string(), OverrideValue::Auto),
            ])
            .unwrap();
        assert_eq!(
            config.dependencies[0].override_value,
            OverrideValue::Path(PathBuf::from("/opt/mapidb"))
        );
        assert_eq!(config.dependencies[1].override_value, OverrideValue::Auto);

        let err = config
            .apply_overrides(&[("bfio".to_string(), OverrideValue::Auto)])
            .unwrap_err();
        assert!(err.to_string().contains("mapidb, cerror"));
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("mapidb=/opt/mapidb").unwrap(),
            ("mapidb".to_string(), OverrideValue::Path(PathBuf::from("/opt/mapidb")))
        );
        assert_eq!(
            parse_override("mapidb=no").unwrap().1,
            OverrideValue::Disabled
        );
        assert_eq!(
            parse_override("mapidb=yes").unwrap().1,
            OverrideValue::Required
        );
        assert!(parse_override("mapidb").is_err());
        assert!(parse_override("=auto").is_err());
    }
}
