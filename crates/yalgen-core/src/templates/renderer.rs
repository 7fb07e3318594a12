//! Placeholder substitution

use super::template::{Segment, Template};
use crate::error::{GenerateError, Result};
use crate::params::ParameterSet;

/// Render a template against a completed parameter set
///
/// Every placeholder is checked before any text is produced, so a render
/// either substitutes everything or fails with `UnresolvedToken`.
pub fn render(template: &Template, params: &ParameterSet) -> Result<String> {
    let mut size = 0;
    for segment in template.segments() {
        size += match segment {
            Segment::Literal(text) => text.len(),
            Segment::Placeholder(token) => params
                .get(token)
                .ok_or_else(|| GenerateError::UnresolvedToken {
                    token: token.clone(),
                    template: template.name().to_string(),
                })?
                .len(),
        };
    }

    let mut output = String::with_capacity(size);
    for segment in template.segments() {
        match segment {
            Segment::Literal(text) => output.push_str(text),
            Segment::Placeholder(token) => {
                if let Some(value) = params.get(token) {
                    output.push_str(value);
                }
            }
        }
    }
    Ok(output)
}

/// Parse and render a one-off template string, e.g. a destination pattern
pub fn render_str(name: &str, body: &str, params: &ParameterSet) -> Result<String> {
    render(&Template::parse(name, body)?, params)
}
