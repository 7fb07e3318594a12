//! Template parsing, rendering, and corpus loading
//!
//! This module provides:
//! - `Template`, a parsed `${token}` template
//! - `render`, a flat token-replace pass over a template
//! - `TemplateCorpus`, the set of templates a run renders from

pub mod corpus;
pub mod renderer;
pub mod template;

pub use corpus::TemplateCorpus;
pub use renderer::{render, render_str};
pub use template::{Segment, Template};
