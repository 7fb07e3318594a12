//! yalgen Core - Template expansion and dependency probing for yal-family libraries
//!
//! This library renders the boilerplate of a yal-family C library (`libfoo`,
//! `pyfoo`, `foo_test_*`) from a small project description. It is used by the
//! `yalgen` binary but has no terminal dependencies of its own.
//!
//! # Architecture
//!
//! The library is organized leaves first:
//!
//! - **Parameters** - `ParameterSet` and the rule table deriving every token from a base set
//! - **Templates** - `${token}` templates, the flat renderer and the template corpus
//! - **Probing** - the staged decision procedure resolving one external dependency
//! - **Emission** - artifact kinds, destinations and output writers
//! - **Generator** - one run over a project: probe, plan, render, write
//!
//! # Example Usage
//!
//! ```ignore
//! use yalgen_core::{FileWriter, Generator, ProjectConfig, SystemEnvironment, TemplateCorpus};
//!
//! let config = ProjectConfig::load(Path::new("source.yaml"))?;
//! let env = SystemEnvironment::new(DEFAULT_PROBE_TIMEOUT);
//! let mut generator = Generator::new(TemplateCorpus::builtin()?, env);
//! let report = generator.generate(&config, &FileWriter::new("out")).await?;
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod generator;
pub mod params;
pub mod probe;
pub mod templates;

// Re-export main types for convenience
pub use config::ProjectConfig;
pub use emit::{Artifact, ArtifactKind, FileWriter, OutputWriter, StdoutWriter};
pub use error::{GenerateError, Result};
pub use generator::{ArtifactFailure, GenerationReport, Generator, ResolvedDependency};
pub use params::{ParameterResolver, ParameterSet};
pub use probe::{
    DependencyDescriptor, DependencyProber, FixedEnvironment, OverrideValue, ProbeEnvironment,
    ProbeOutcome, ProbeResult, SystemEnvironment, DEFAULT_PROBE_TIMEOUT,
};
pub use templates::{Template, TemplateCorpus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
