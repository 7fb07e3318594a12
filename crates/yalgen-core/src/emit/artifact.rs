//! Artifact kinds, destinations, and final assembly

use crate::error::{GenerateError, Result};
use crate::params::ParameterSet;
use crate::probe::ProbeResult;
use crate::templates::render_str;
use std::fmt;
use std::path::PathBuf;

/// What an artifact is, which decides where it goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Library source file (`libyal/libyal_*`)
    LibrarySource,
    /// Python binding header (`pyyal/pyyal_*`)
    HeaderStub,
    /// Type lifecycle test program (`yal_test_type/*`)
    TestSource,
    /// Autoconf dependency macro (`m4/*`)
    BuildMacro,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::LibrarySource,
        ArtifactKind::HeaderStub,
        ArtifactKind::TestSource,
        ArtifactKind::BuildMacro,
    ];

    /// Corpus directory holding templates of this kind
    pub fn corpus_dir(&self) -> &'static str {
        match self {
            ArtifactKind::LibrarySource => "libyal",
            ArtifactKind::HeaderStub => "pyyal",
            ArtifactKind::TestSource => "yal_test_type",
            ArtifactKind::BuildMacro => "m4",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ArtifactKind::LibrarySource => "library source",
            ArtifactKind::HeaderStub => "header stub",
            ArtifactKind::TestSource => "test source",
            ArtifactKind::BuildMacro => "build macro",
        }
    }

    /// Tokens the destination of this kind is built from
    pub fn destination_tokens(&self) -> &'static [&'static str] {
        match self {
            ArtifactKind::LibrarySource => &["library_name"],
            ArtifactKind::HeaderStub => &["python_module_name"],
            ArtifactKind::TestSource => &["library_name_suffix", "type_name"],
            ArtifactKind::BuildMacro => &["library_id"],
        }
    }

    /// Destination path for an artifact rendered from `template_name`
    pub fn destination(&self, template_name: &str, params: &ParameterSet) -> Result<PathBuf> {
        let file_name = template_name.rsplit('/').next().unwrap_or(template_name);
        let pattern = match self {
            ArtifactKind::LibrarySource => format!(
                "${{library_name}}/${{library_name}}_{}",
                escape(file_name.strip_prefix("libyal_").unwrap_or(file_name))
            ),
            ArtifactKind::HeaderStub => format!(
                "${{python_module_name}}/${{python_module_name}}_{}",
                escape(file_name.strip_prefix("pyyal_").unwrap_or(file_name))
            ),
            ArtifactKind::TestSource => "tests/${library_name_suffix}_test_${type_name}.c".to_string(),
            ArtifactKind::BuildMacro => "m4/${library_id}.m4".to_string(),
        };
        render_str(template_name, &pattern, params).map(PathBuf::from)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn escape(text: &str) -> String {
    text.replace('$', "$$")
}

/// A rendered file and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub destination: PathBuf,
    pub contents: String,
}

/// Assemble the final artifact for rendered text
///
/// Build macros get a banner recording the probe outcome and its defines;
/// other kinds carry the rendered text unchanged.
pub fn emit(
    kind: ArtifactKind,
    template_name: &str,
    rendered: String,
    params: &ParameterSet,
    probe: Option<&ProbeResult>,
) -> Result<Artifact> {
    let destination = kind.destination(template_name, params)?;

    let contents = match (kind, probe) {
        (ArtifactKind::BuildMacro, Some(result)) => {
            let library_id = params
                .get("library_id")
                .ok_or_else(|| GenerateError::UnresolvedToken {
                    token: "library_id".to_string(),
                    template: template_name.to_string(),
                })?;
            let mut banner = format!(
                "dnl Generated by yalgen: {} resolved as {}\n",
                library_id, result.outcome
            );
            for define in result.define_pairs() {
                banner.push_str(&format!("dnl   {}\n", define));
            }
            banner.push_str("dnl\n");
            banner + &rendered
        }
        _ => rendered,
    };

    Ok(Artifact {
        kind,
        destination,
        contents,
    })
}
