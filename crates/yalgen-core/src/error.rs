//! Error types for template expansion, probing and emission.
//!
//! Structural errors (unresolved tokens, bad override paths) always reach the
//! caller. Recoverable probe trouble is absorbed by the probe engine and never
//! shows up here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while generating artifacts.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A template references a token that is neither supplied nor derivable.
    #[error("Template '{template}' references unresolved token '{token}'")]
    UnresolvedToken { token: String, template: String },

    /// A template body could not be parsed.
    #[error("Malformed template '{template}' at byte {offset}: {reason}")]
    MalformedTemplate {
        template: String,
        offset: usize,
        reason: String,
    },

    /// A derived token depends on itself.
    #[error("Token '{token}' is derived from itself")]
    DerivationCycle { token: String },

    /// Two parameter sources disagree about the value of a token.
    #[error("Token '{token}' is defined twice with different values")]
    ConflictingToken { token: String },

    /// A user-supplied dependency override points at a missing path.
    #[error("Override path for dependency '{dependency}' does not exist: {}", path.display())]
    PathNotFound { dependency: String, path: PathBuf },

    /// A user-supplied override exists but does not provide the dependency.
    #[error("Unable to find a usable '{dependency}' in directory: {}", path.display())]
    OverrideUnusable { dependency: String, path: PathBuf },

    /// A dependency marked as required was not found on the system.
    #[error("Unable to find a supported '{dependency}' on the system")]
    RequiredMissing { dependency: String },

    /// An artifact could not be written to its destination.
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two planned artifacts would be written to the same destination.
    #[error("More than one artifact targets {}", path.display())]
    DuplicateDestination { path: PathBuf },

    /// A template required by the run is missing from the corpus.
    #[error("Template '{name}' not found in corpus")]
    MissingTemplate { name: String },
}

impl GenerateError {
    /// True for errors that stop the whole run rather than a single artifact.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            GenerateError::PathNotFound { .. }
                | GenerateError::OverrideUnusable { .. }
                | GenerateError::RequiredMissing { .. }
                | GenerateError::DuplicateDestination { .. }
                | GenerateError::MissingTemplate { .. }
                | GenerateError::MalformedTemplate { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;
