//! Template corpus loading from a directory or the built-in set

use super::template::Template;
use crate::emit::ArtifactKind;
use crate::error::{GenerateError, Result};
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Section of the type test artifact that opens the file
pub const TEST_HEADER_SECTION: &str = "header";

/// Lifecycle sections of the type test artifact, in output order
pub const TEST_LIFECYCLE_SECTIONS: &[&str] = &["initialize", "free", "clear_with_free_function"];

/// Section of the type test artifact that closes the file
pub const TEST_MAIN_SECTION: &str = "main";

const BUILTIN: &[(&str, &str)] = &[
    (
        "libyal/libyal_extern.h",
        include_str!("../../data/libyal/libyal_extern.h"),
    ),
    (
        "libyal/libyal_support.h",
        include_str!("../../data/libyal/libyal_support.h"),
    ),
    (
        "pyyal/pyyal_guid.h",
        include_str!("../../data/pyyal/pyyal_guid.h"),
    ),
    (
        "yal_test_type/header.c",
        include_str!("../../data/yal_test_type/header.c"),
    ),
    (
        "yal_test_type/initialize.c",
        include_str!("../../data/yal_test_type/initialize.c"),
    ),
    (
        "yal_test_type/free.c",
        include_str!("../../data/yal_test_type/free.c"),
    ),
    (
        "yal_test_type/clear_with_free_function.c",
        include_str!("../../data/yal_test_type/clear_with_free_function.c"),
    ),
    (
        "yal_test_type/main.c",
        include_str!("../../data/yal_test_type/main.c"),
    ),
    (
        "m4/libyal_dependency.m4",
        include_str!("../../data/m4/libyal_dependency.m4"),
    ),
];

/// Parsed templates keyed by their corpus-relative path
#[derive(Debug, Clone, Default)]
pub struct TemplateCorpus {
    templates: BTreeMap<String, (ArtifactKind, Template)>,
}

impl TemplateCorpus {
    /// The corpus compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_entries(BUILTIN.iter().copied())
    }

    /// Build a corpus from `(relative path, body)` pairs
    ///
    /// Entries outside the known artifact directories are ignored.
    pub fn from_entries<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut templates = BTreeMap::new();
        for (name, body) in entries {
            let Some(kind) = kind_for_path(name) else {
                tracing::debug!("Ignoring template outside artifact directories: {}", name);
                continue;
            };
            let template = Template::parse(name, body)?;
            templates.insert(name.to_string(), (kind, template));
        }
        Ok(Self { templates })
    }

    /// Load every template below a corpus directory
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Template directory not found: {}", dir.display());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(dir)
                .with_context(|| format!("{} is outside {}", entry.path().display(), dir.display()))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if name.split('/').any(|part| part.starts_with('.')) {
                continue;
            }
            let body = std::fs::read_to_string(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            entries.push((name, body));
        }

        let corpus = Self::from_entries(entries.iter().map(|(n, b)| (n.as_str(), b.as_str())))?;
        Ok(corpus)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name).map(|(_, template)| template)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Every template, in name order
    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &Template)> {
        self.templates.values().map(|(kind, template)| (*kind, template))
    }

    /// Templates of one artifact kind, in name order
    pub fn templates(&self, kind: ArtifactKind) -> impl Iterator<Item = &Template> {
        self.iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, template)| template)
    }

    /// Sections making up one type test artifact, in output order
    ///
    /// Every section is required since main runs each lifecycle test.
    pub fn type_test_sections(&self) -> Result<Vec<&Template>> {
        let dir = ArtifactKind::TestSource.corpus_dir();
        std::iter::once(&TEST_HEADER_SECTION)
            .chain(TEST_LIFECYCLE_SECTIONS)
            .chain(std::iter::once(&TEST_MAIN_SECTION))
            .map(|section| {
                let name = format!("{}/{}.c", dir, section);
                self.get(&name)
                    .ok_or(GenerateError::MissingTemplate { name })
            })
            .collect()
    }
}

fn kind_for_path(name: &str) -> Option<ArtifactKind> {
    let (dir, _) = name.split_once('/')?;
    ArtifactKind::ALL
        .iter()
        .copied()
        .find(|kind| kind.corpus_dir() == dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParameterResolver, ParameterSet};
    use crate::templates::render;

    #[test]
    fn test_builtin_corpus_parses() {
        let corpus = TemplateCorpus::builtin().unwrap();
        assert_eq!(corpus.len(), BUILTIN.len());
        assert_eq!(corpus.templates(ArtifactKind::BuildMacro).count(), 1);
        assert_eq!(corpus.templates(ArtifactKind::HeaderStub).count(), 1);
    }

    #[test]
    fn test_type_test_section_order() {
        let corpus = TemplateCorpus::builtin().unwrap();
        let names: Vec<&str> = corpus
            .type_test_sections()
            .unwrap()
            .iter()
            .map(|t| t.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "yal_test_type/header.c",
                "yal_test_type/initialize.c",
                "yal_test_type/free.c",
                "yal_test_type/clear_with_free_function.c",
                "yal_test_type/main.c",
            ]
        );
    }

    #[test]
    fn test_missing_main_section() {
        let corpus = TemplateCorpus::from_entries([
            ("yal_test_type/header.c", "/* ${type_name} */\n"),
            ("yal_test_type/initialize.c", "int initialize;\n"),
            ("yal_test_type/free.c", "int free;\n"),
            ("yal_test_type/clear_with_free_function.c", "int clear;\n"),
        ])
        .unwrap();
        let err = corpus.type_test_sections().unwrap_err();
        assert!(
            matches!(err, GenerateError::MissingTemplate { name } if name == "yal_test_type/main.c")
        );
    }

    #[test]
    fn test_missing_lifecycle_section() {
        let corpus = TemplateCorpus::from_entries([
            ("yal_test_type/header.c", "/* ${type_name} */\n"),
            ("yal_test_type/initialize.c", "int initialize;\n"),
            ("yal_test_type/free.c", "int free;\n"),
            ("yal_test_type/main.c", "int main;\n"),
        ])
        .unwrap();
        let err = corpus.type_test_sections().unwrap_err();
        assert!(matches!(
            err,
            GenerateError::MissingTemplate { name } if name == "yal_test_type/clear_with_free_function.c"
        ));
    }

    #[test]
    fn test_unknown_directories_ignored() {
        let corpus = TemplateCorpus::from_entries([
            ("manuals/libyal.3", "${library_name}"),
            ("README", "text"),
            ("pyyal/pyyal_file.h", "${python_module_name}"),
        ])
        .unwrap();
        assert_eq!(corpus.len(), 1);
        assert!(corpus.get("pyyal/pyyal_file.h").is_some());
    }

    #[test]
    fn test_from_dir_matches_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("libyal")).unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(
            dir.path().join("libyal/libyal_extern.h"),
            "#define ${library_name_upper_case}_EXTERN\n",
        )
        .unwrap();
        std::fs::write(dir.path().join(".git/config"), "${nope").unwrap();

        let corpus = TemplateCorpus::from_dir(dir.path()).unwrap();
        assert_eq!(corpus.len(), 1);
        let template = corpus.get("libyal/libyal_extern.h").unwrap();
        assert_eq!(template.placeholders(), vec!["library_name_upper_case"]);
    }

    #[test]
    fn test_from_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TemplateCorpus::from_dir(&dir.path().join("missing")).is_err());
    }

    /// Every built-in template renders completely for a full parameter set.
    #[test]
    fn test_builtin_templates_are_total() {
        let corpus = TemplateCorpus::builtin().unwrap();
        let base: ParameterSet = [
            ("authors", "Jane Doe"),
            ("copyright", "2016"),
            ("library_name", "libexample"),
            ("library_description", "Library to access the example format"),
            ("type_name", "widget"),
            ("value_name", "item"),
            ("dependency_name", "mapidb"),
            ("library_id", "libmapidb"),
            ("min_version", "20120405"),
            ("probe_outcome", "local-fallback"),
            ("ac_cv_value", "local"),
            ("have_library", "1"),
            ("have_local_library", "1"),
            ("cppflags", "-I../libmapidb"),
            ("ldflags", "../libmapidb/libmapidb.la"),
            ("pc_libs_private", ""),
            ("spec_requires", ""),
            ("spec_build_requires", ""),
        ]
        .into_iter()
        .collect();
        let resolver = ParameterResolver::new(base);

        for (_, template) in corpus.iter() {
            let params = resolver.resolve_template(template).unwrap();
            let rendered = render(template, &params).unwrap();
            assert!(!rendered.contains("${"), "{} left a placeholder", template.name());
        }
    }
}
