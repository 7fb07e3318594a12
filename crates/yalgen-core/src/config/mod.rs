//! Project configuration

pub mod project;

pub use project::{
    parse_override, LibrarySection, ProjectConfig, ProjectSection, PythonModuleSection,
    TypeSection,
};
