//! Dependency probing
//!
//! This module provides:
//! - Dependency descriptors and override values
//! - The environment capability trait and its implementations
//! - The staged decision procedure and its per-run cache

pub mod descriptor;
pub mod engine;
pub mod env;
pub mod result;
pub mod version;

pub use descriptor::{DependencyDescriptor, OverrideValue};
pub use engine::{decide, DependencyProber};
pub use env::{
    FixedEnvironment, LinkCheck, PackageConfigLookup, ProbeEnvironment, SystemEnvironment,
    DEFAULT_PROBE_TIMEOUT,
};
pub use result::{ProbeFlags, ProbeOutcome, ProbeResult};
