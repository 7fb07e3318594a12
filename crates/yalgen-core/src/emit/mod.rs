//! Artifact assembly and output
//!
//! This module provides:
//! - Artifact kinds and their deterministic destinations
//! - Final assembly of rendered text plus probe metadata
//! - Output writers (atomic files, stdout listing)

pub mod artifact;
pub mod writer;

pub use artifact::{emit, Artifact, ArtifactKind};
pub use writer::{write_listing, FileWriter, OutputWriter, StdoutWriter};
