//! Template parsing
//!
//! Templates are plain text with `${token}` placeholders. `$$` produces a
//! literal `$`; any other `$` is ordinary text.

use crate::error::{GenerateError, Result};
use std::collections::BTreeSet;

/// One piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed, immutable template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template body
    pub fn parse(name: impl Into<String>, body: &str) -> Result<Self> {
        let name = name.into();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = body;
        let mut offset = 0;

        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if after.starts_with('$') {
                literal.push('$');
                rest = &after[1..];
                offset += pos + 2;
            } else if let Some(inner) = after.strip_prefix('{') {
                let close = inner.find('}').ok_or_else(|| GenerateError::MalformedTemplate {
                    template: name.clone(),
                    offset: offset + pos,
                    reason: "unterminated placeholder".to_string(),
                })?;
                let token = &inner[..close];
                if !is_token_name(token) {
                    return Err(GenerateError::MalformedTemplate {
                        template: name.clone(),
                        offset: offset + pos,
                        reason: format!("invalid token name '{}'", token),
                    });
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(token.to_string()));

                // "$" + "{" + token + "}"
                let consumed = pos + 2 + close + 1;
                rest = &rest[consumed..];
                offset += consumed;
            } else {
                literal.push('$');
                rest = after;
                offset += pos + 1;
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Referenced token names, sorted and without duplicates
    pub fn placeholders(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Placeholder(token) => Some(token.as_str()),
                Segment::Literal(_) => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn is_token_name(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Segment {
        Segment::Literal(s.to_string())
    }

    fn ph(s: &str) -> Segment {
        Segment::Placeholder(s.to_string())
    }

    #[test]
    fn test_parse_mixed_segments() {
        let template = Template::parse("t", "int ${prefix}_test_${type_name}( void );").unwrap();
        assert_eq!(
            template.segments(),
            &[
                lit("int "),
                ph("prefix"),
                lit("_test_"),
                ph("type_name"),
                lit("( void );"),
            ]
        );
    }

    #[test]
    fn test_dollar_escape_and_bare_dollar() {
        let template = Template::parse("t", "cost $$5 and $HOME ${a}$").unwrap();
        assert_eq!(
            template.segments(),
            &[lit("cost $5 and $HOME "), ph("a"), lit("$")]
        );
    }

    #[test]
    fn test_escaped_placeholder_is_literal() {
        let template = Template::parse("t", "$${not_a_token}").unwrap();
        assert_eq!(template.segments(), &[lit("${not_a_token}")]);
        assert!(template.placeholders().is_empty());
    }

    #[test]
    fn test_placeholders_sorted_unique() {
        let template = Template::parse("t", "${b}${a}${b}").unwrap();
        assert_eq!(template.placeholders(), vec!["a", "b"]);
    }

    #[test]
    fn test_unterminated_placeholder_reports_offset() {
        let err = Template::parse("broken.c", "abc ${type_name").unwrap_err();
        match err {
            GenerateError::MalformedTemplate {
                template, offset, ..
            } => {
                assert_eq!(template, "broken.c");
                assert_eq!(offset, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_offset_after_earlier_placeholder() {
        let err = Template::parse("t", "${a}x${").unwrap_err();
        assert!(matches!(err, GenerateError::MalformedTemplate { offset: 5, .. }));
    }

    #[test]
    fn test_invalid_token_names_rejected() {
        for body in ["${}", "${1abc}", "${a-b}", "${a ${b}}"] {
            assert!(Template::parse("t", body).is_err(), "{body} should not parse");
        }
    }

    #[test]
    fn test_whitespace_preserved() {
        let body = "\t${a}  \n\n  ${b}\r\n";
        let template = Template::parse("t", body).unwrap();
        assert_eq!(
            template.segments(),
            &[lit("\t"), ph("a"), lit("  \n\n  "), ph("b"), lit("\r\n")]
        );
    }
}
