//! Probe outcomes and the flags attached to them

use super::descriptor::DependencyDescriptor;
use crate::params::ParameterSet;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// How a dependency ended up being satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeOutcome {
    Disabled,
    SystemViaPackageConfig,
    SystemViaManualProbe,
    Absent,
    LocalFallback,
}

impl ProbeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeOutcome::Disabled => "disabled",
            ProbeOutcome::SystemViaPackageConfig => "system-pkg-config",
            ProbeOutcome::SystemViaManualProbe => "system-manual",
            ProbeOutcome::Absent => "absent",
            ProbeOutcome::LocalFallback => "local-fallback",
        }
    }

    /// Satisfied by an installed copy of the library
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            ProbeOutcome::SystemViaPackageConfig | ProbeOutcome::SystemViaManualProbe
        )
    }

    /// Generated code can use the library (installed or bundled)
    pub fn provides_library(&self) -> bool {
        self.is_system() || *self == ProbeOutcome::LocalFallback
    }

    /// Value of `ac_cv_<libid>` in the build macro
    fn ac_cv_value(&self) -> &'static str {
        match self {
            ProbeOutcome::SystemViaPackageConfig | ProbeOutcome::SystemViaManualProbe => "yes",
            ProbeOutcome::LocalFallback => "local",
            ProbeOutcome::Disabled | ProbeOutcome::Absent => "no",
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Preprocessor defines and build flags for one outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeFlags {
    pub defines: BTreeMap<String, String>,
    pub cppflags: Vec<String>,
    pub ldflags: Vec<String>,
    /// Prefix or bundled copy the flags point at
    pub source: Option<PathBuf>,
}

/// The resolved state of one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub outcome: ProbeOutcome,
    pub flags: ProbeFlags,
}

impl ProbeResult {
    /// Build a result; defines are derived from the outcome alone
    pub(crate) fn new(
        dependency: &DependencyDescriptor,
        outcome: ProbeOutcome,
        cppflags: Vec<String>,
        ldflags: Vec<String>,
        source: Option<PathBuf>,
    ) -> Self {
        let mut defines = BTreeMap::new();
        let have = if outcome.provides_library() { "1" } else { "0" };
        defines.insert(dependency.have_define(), have.to_string());
        if outcome == ProbeOutcome::LocalFallback {
            defines.insert(dependency.have_local_define(), "1".to_string());
        }

        Self {
            outcome,
            flags: ProbeFlags {
                defines,
                cppflags,
                ldflags,
                source,
            },
        }
    }

    /// `NAME=VALUE` strings for every define, in name order
    pub fn define_pairs(&self) -> Vec<String> {
        self.flags
            .defines
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect()
    }

    /// Tokens the build macro template renders from
    pub fn tokens(&self, dependency: &DependencyDescriptor) -> ParameterSet {
        let system = self.outcome.is_system();
        let library_id = dependency.library_id();
        let gated = |value: String| if system { value } else { String::new() };

        [
            ("dependency_name", dependency.name.clone()),
            ("library_id", library_id.clone()),
            ("min_version", dependency.min_version.clone()),
            ("probe_outcome", self.outcome.as_str().to_string()),
            ("ac_cv_value", self.outcome.ac_cv_value().to_string()),
            (
                "have_library",
                flag(self.outcome.provides_library()).to_string(),
            ),
            (
                "have_local_library",
                flag(self.outcome == ProbeOutcome::LocalFallback).to_string(),
            ),
            ("cppflags", self.flags.cppflags.join(" ")),
            ("ldflags", self.flags.ldflags.join(" ")),
            (
                "pc_libs_private",
                gated(format!("-l{}", dependency.link_name())),
            ),
            ("spec_requires", gated(library_id.clone())),
            ("spec_build_requires", gated(format!("{}-devel", library_id))),
        ]
        .into_iter()
        .collect()
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
