//! Declarative description of one external library dependency

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Value of a dependency's user override, like `configure --with-libfoo=...`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OverrideValue {
    /// Detect the dependency
    #[default]
    Auto,
    /// Detect the dependency on the system; a miss is an error
    Required,
    /// Do not use the dependency
    Disabled,
    /// Use the dependency installed below this prefix
    Path(PathBuf),
}

impl OverrideValue {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "auto" | "auto-detect" => OverrideValue::Auto,
            "yes" | "required" => OverrideValue::Required,
            "disabled" | "no" => OverrideValue::Disabled,
            path => OverrideValue::Path(PathBuf::from(path)),
        }
    }
}

impl From<String> for OverrideValue {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<OverrideValue> for String {
    fn from(value: OverrideValue) -> Self {
        value.to_string()
    }
}

impl fmt::Display for OverrideValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideValue::Auto => write!(f, "auto"),
            OverrideValue::Required => write!(f, "yes"),
            OverrideValue::Disabled => write!(f, "disabled"),
            OverrideValue::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Marker for `local_path` that turns off the bundled fallback
pub const NO_LOCAL_FALLBACK: &str = "none";

/// One named external library dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    /// Library name without the `lib` prefix (e.g. "mapidb")
    pub name: String,

    /// Minimum acceptable version
    pub min_version: String,

    /// Header to probe for (defaults to `lib<name>.h`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    /// Representative symbol to link against (defaults to `lib<name>_get_version`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    /// User override: auto, disabled or an installation prefix
    #[serde(default, rename = "override")]
    pub override_value: OverrideValue,

    /// Location of the bundled copy (defaults to `../lib<name>`, "none" disables)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl DependencyDescriptor {
    pub fn new(name: impl Into<String>, min_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_version: min_version.into(),
            header: None,
            symbol: None,
            override_value: OverrideValue::Auto,
            local_path: None,
        }
    }

    pub fn with_override(mut self, value: OverrideValue) -> Self {
        self.override_value = value;
        self
    }

    pub fn with_local_path(mut self, path: impl Into<String>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    /// Name used with `-l`
    pub fn link_name(&self) -> &str {
        self.name.strip_prefix("lib").unwrap_or(&self.name)
    }

    /// Library identifier, e.g. "libmapidb"
    pub fn library_id(&self) -> String {
        format!("lib{}", self.link_name())
    }

    pub fn header(&self) -> String {
        self.header
            .clone()
            .unwrap_or_else(|| format!("{}.h", self.library_id()))
    }

    pub fn symbol(&self) -> String {
        self.symbol
            .clone()
            .unwrap_or_else(|| format!("{}_get_version", self.library_id()))
    }

    /// Where the bundled copy lives, if a fallback is allowed
    pub fn local_fallback(&self) -> Option<PathBuf> {
        match self.local_path.as_deref() {
            Some(NO_LOCAL_FALLBACK) => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(format!("../{}", self.library_id()))),
        }
    }

    /// `HAVE_LIB<NAME>`
    pub fn have_define(&self) -> String {
        format!("HAVE_{}", crate::params::upper_case(&self.library_id()))
    }

    /// `HAVE_LOCAL_LIB<NAME>`
    pub fn have_local_define(&self) -> String {
        format!("HAVE_LOCAL_{}", crate::params::upper_case(&self.library_id()))
    }
}
