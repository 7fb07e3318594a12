//! Artifact output: atomic files or a stdout listing

use super::artifact::Artifact;
use crate::error::{GenerateError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination for emitted artifacts
pub trait OutputWriter: Send + Sync {
    fn write_artifact(&self, artifact: &Artifact) -> Result<()>;
}

/// Writes artifacts below an output directory
///
/// Each file is written to a temporary sibling and renamed into place, so a
/// destination either keeps its old contents or gets the complete new ones.
#[derive(Debug, Clone)]
pub struct FileWriter {
    output_dir: PathBuf,
}

impl FileWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl OutputWriter for FileWriter {
    fn write_artifact(&self, artifact: &Artifact) -> Result<()> {
        let path = self.output_dir.join(&artifact.destination);
        let failure = |source: std::io::Error| GenerateError::WriteFailure {
            path: path.clone(),
            source,
        };

        let parent = path.parent().unwrap_or(&self.output_dir);
        std::fs::create_dir_all(parent).map_err(failure)?;

        let mut file = tempfile::NamedTempFile::new_in(parent).map_err(failure)?;
        file.write_all(artifact.contents.as_bytes())
            .map_err(failure)?;
        file.as_file().sync_all().map_err(failure)?;
        file.persist(&path).map_err(|e| failure(e.error))?;

        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Prints artifacts to stdout, each under a banner with its path
#[derive(Debug, Clone, Default)]
pub struct StdoutWriter;

impl StdoutWriter {
    pub fn new() -> Self {
        Self
    }
}

/// Write an artifact listing: 80-column banner, centred path, contents
pub fn write_listing(out: &mut impl Write, artifact: &Artifact) -> std::io::Result<()> {
    let rule = "-".repeat(80);
    writeln!(out, "{}", rule)?;
    writeln!(out, "{: ^80}", artifact.destination.display().to_string())?;
    writeln!(out, "{}", rule)?;
    writeln!(out)?;
    out.write_all(artifact.contents.as_bytes())
}

impl OutputWriter for StdoutWriter {
    fn write_artifact(&self, artifact: &Artifact) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        write_listing(&mut out, artifact).map_err(|source| GenerateError::WriteFailure {
            path: artifact.destination.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::ArtifactKind;

    fn artifact(dest: &str, contents: &str) -> Artifact {
        Artifact {
            kind: ArtifactKind::TestSource,
            destination: PathBuf::from(dest),
            contents: contents.to_string(),
        }
    }

    #[test]
    fn test_file_writer_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileWriter::new(dir.path());
        writer
            .write_artifact(&artifact("tests/example_test_widget.c", "int x;\n"))
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("tests/example_test_widget.c")).unwrap();
        assert_eq!(written, "int x;\n");
    }

    #[test]
    fn test_file_writer_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileWriter::new(dir.path());
        writer.write_artifact(&artifact("a.h", "a much longer first version\n")).unwrap();
        writer.write_artifact(&artifact("a.h", "short\n")).unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("a.h")).unwrap(), "short\n");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_file_writer_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A file where a directory is needed
        std::fs::write(dir.path().join("tests"), "").unwrap();
        let writer = FileWriter::new(dir.path());

        let err = writer
            .write_artifact(&artifact("tests/example_test_widget.c", "x"))
            .unwrap_err();
        assert!(matches!(err, GenerateError::WriteFailure { .. }));
    }

    #[test]
    fn test_listing_format() {
        let mut out = Vec::new();
        write_listing(&mut out, &artifact("m4/libmapidb.m4", "dnl body\n")).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "-".repeat(80));
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[1].trim(), "m4/libmapidb.m4");
        assert_eq!(lines[2], "-".repeat(80));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "dnl body");
    }
}
