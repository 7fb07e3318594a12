//! Derivation of dependent tokens from a base parameter set

use super::ParameterSet;
use crate::error::{GenerateError, Result};
use crate::templates::Template;
use std::collections::BTreeMap;

/// Suffix that turns any resolvable token into its upper-case variant
pub const UPPER_CASE_SUFFIX: &str = "_upper_case";

/// A token computed from other tokens
struct DerivationRule {
    token: &'static str,
    inputs: &'static [&'static str],
    derive: fn(&[&str]) -> String,
}

/// Built-in derivation table. Each token appears once; inputs must not
/// (transitively) refer back to the rule's own token.
const RULES: &[DerivationRule] = &[
    DerivationRule {
        token: "library_name_suffix",
        inputs: &["library_name"],
        derive: |v| v[0].strip_prefix("lib").unwrap_or(v[0]).to_string(),
    },
    DerivationRule {
        token: "python_module_name",
        inputs: &["library_name_suffix"],
        derive: |v| format!("py{}", v[0]),
    },
    DerivationRule {
        token: "python_module_authors",
        inputs: &["authors"],
        derive: |v| v[0].to_string(),
    },
    DerivationRule {
        token: "python_module_copyright",
        inputs: &["copyright"],
        derive: |v| v[0].to_string(),
    },
    DerivationRule {
        token: "python_module_guid",
        inputs: &["python_module_name"],
        derive: |v| format!("{}_guid", v[0]),
    },
    DerivationRule {
        token: "type_prefix",
        inputs: &["library_name_suffix", "type_name"],
        derive: |v| format!("lib{}_{}", v[0], v[1]),
    },
    DerivationRule {
        token: "test_prefix",
        inputs: &["library_name_suffix", "type_name"],
        derive: |v| format!("{}_test_{}", v[0], v[1]),
    },
];

fn find_rule(token: &str) -> Option<&'static DerivationRule> {
    RULES.iter().find(|rule| rule.token == token)
}

/// Canonical upper-case form of a token value.
///
/// ASCII letters are upper-cased, digits and `_` are kept and every other
/// character becomes `_`. Runs of separators are not collapsed.
pub fn upper_case(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Derives the tokens templates need from a base parameter set
///
/// Supplied base tokens always win over a derivation rule of the same name.
#[derive(Debug, Clone)]
pub struct ParameterResolver {
    base: ParameterSet,
}

impl ParameterResolver {
    pub fn new(base: ParameterSet) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &ParameterSet {
        &self.base
    }

    /// Resolve every placeholder referenced by a template
    pub fn resolve_template(&self, template: &Template) -> Result<ParameterSet> {
        self.resolve(template.placeholders(), template.name())
    }

    /// Resolve the given tokens; `context` names the requester in errors
    pub fn resolve<'a, I>(&self, required: I, context: &str) -> Result<ParameterSet>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut memo = Memo::new(&self.base);
        let mut resolved = self.base.clone();
        for token in required {
            let value = memo.resolve(token, context)?;
            resolved.insert(token, value)?;
        }
        Ok(resolved)
    }

    /// Base tokens plus every rule-derived token whose inputs are available
    ///
    /// Upper-case variants are not listed since any token has one.
    pub fn resolve_available(&self) -> ParameterSet {
        let mut memo = Memo::new(&self.base);
        let mut resolved = self.base.clone();
        for rule in RULES {
            if let Ok(value) = memo.resolve(rule.token, "") {
                // Base tokens are already present with the same value.
                let _ = resolved.insert(rule.token, value);
            }
        }
        resolved
    }

    /// True when the token is supplied or can be derived
    pub fn can_resolve(&self, token: &str) -> bool {
        Memo::new(&self.base).resolve(token, "").is_ok()
    }
}

/// Working state for one resolution pass
struct Memo<'a> {
    base: &'a ParameterSet,
    derived: BTreeMap<String, String>,
    visiting: Vec<String>,
}

impl<'a> Memo<'a> {
    fn new(base: &'a ParameterSet) -> Self {
        Self {
            base,
            derived: BTreeMap::new(),
            visiting: Vec::new(),
        }
    }

    fn resolve(&mut self, token: &str, context: &str) -> Result<String> {
        if let Some(value) = self.base.get(token) {
            return Ok(value.to_string());
        }
        if let Some(value) = self.derived.get(token) {
            return Ok(value.clone());
        }
        if self.visiting.iter().any(|t| t == token) {
            return Err(GenerateError::DerivationCycle {
                token: token.to_string(),
            });
        }

        self.visiting.push(token.to_string());
        let value = self.derive(token, context);
        self.visiting.pop();

        let value = value?;
        self.derived.insert(token.to_string(), value.clone());
        Ok(value)
    }

    fn derive(&mut self, token: &str, context: &str) -> Result<String> {
        if let Some(rule) = find_rule(token) {
            let mut inputs = Vec::with_capacity(rule.inputs.len());
            for input in rule.inputs {
                inputs.push(self.resolve(input, context)?);
            }
            let refs: Vec<&str> = inputs.iter().map(String::as_str).collect();
            return Ok((rule.derive)(&refs));
        }

        if let Some(stem) = token.strip_suffix(UPPER_CASE_SUFFIX) {
            if !stem.is_empty() {
                return self.resolve(stem, context).map(|v| upper_case(&v));
            }
        }

        Err(GenerateError::UnresolvedToken {
            token: token.to_string(),
            template: context.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn base() -> ParameterSet {
        [
            ("library_name", "libexample"),
            ("type_name", "widget"),
            ("value_name", "item"),
            ("authors", "Jane Doe"),
            ("copyright", "2016"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_rule_table_has_unique_tokens() {
        let mut seen = HashSet::new();
        for rule in RULES {
            assert!(seen.insert(rule.token), "duplicate rule for {}", rule.token);
        }
    }

    #[test]
    fn test_library_name_suffix() {
        let resolver = ParameterResolver::new(base());
        let params = resolver
            .resolve(["library_name_suffix", "library_name_suffix_upper_case"], "t")
            .unwrap();
        assert_eq!(params.get("library_name_suffix"), Some("example"));
        assert_eq!(params.get("library_name_suffix_upper_case"), Some("EXAMPLE"));
    }

    #[test]
    fn test_suffix_without_lib_prefix_is_whole_name() {
        let params: ParameterSet = [("library_name", "zlib")].into_iter().collect();
        let resolved = ParameterResolver::new(params)
            .resolve(["library_name_suffix"], "t")
            .unwrap();
        assert_eq!(resolved.get("library_name_suffix"), Some("zlib"));
    }

    #[test]
    fn test_chained_derivation() {
        let resolver = ParameterResolver::new(base());
        let params = resolver
            .resolve(["python_module_guid_upper_case"], "t")
            .unwrap();
        assert_eq!(params.get("python_module_guid_upper_case"), Some("PYEXAMPLE_GUID"));
    }

    #[test]
    fn test_compound_tokens() {
        let resolver = ParameterResolver::new(base());
        let params = resolver.resolve(["type_prefix", "test_prefix"], "t").unwrap();
        assert_eq!(params.get("type_prefix"), Some("libexample_widget"));
        assert_eq!(params.get("test_prefix"), Some("example_test_widget"));
    }

    #[test]
    fn test_base_token_overrides_rule() {
        let mut params = base();
        params.insert("python_module_name", "pyex").unwrap();
        let resolved = ParameterResolver::new(params)
            .resolve(["python_module_name_upper_case"], "t")
            .unwrap();
        assert_eq!(resolved.get("python_module_name_upper_case"), Some("PYEX"));
    }

    #[test]
    fn test_unresolved_token_names_template() {
        let resolver = ParameterResolver::new(base());
        let err = resolver
            .resolve(["library_name", "volume_name"], "libyal_extern.h")
            .unwrap_err();
        match err {
            GenerateError::UnresolvedToken { token, template } => {
                assert_eq!(token, "volume_name");
                assert_eq!(template, "libyal_extern.h");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_upper_case_of_missing_token_is_unresolved() {
        let resolver = ParameterResolver::new(ParameterSet::new());
        let err = resolver.resolve(["type_name_upper_case"], "t").unwrap_err();
        assert!(matches!(err, GenerateError::UnresolvedToken { token, .. } if token == "type_name"));
    }

    #[test]
    fn test_bare_suffix_is_not_a_token() {
        let resolver = ParameterResolver::new(base());
        assert!(!resolver.can_resolve("_upper_case"));
    }

    #[test]
    fn test_resolution_is_order_independent() {
        let resolver = ParameterResolver::new(base());
        let tokens = [
            "test_prefix",
            "library_name_suffix_upper_case",
            "python_module_guid",
            "type_name_upper_case",
        ];
        let forward = resolver.resolve(tokens, "t").unwrap();
        let backward = resolver.resolve(tokens.iter().rev().copied(), "t").unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_resolve_available_skips_missing_inputs() {
        let params: ParameterSet = [("library_name", "libexample")].into_iter().collect();
        let resolved = ParameterResolver::new(params).resolve_available();
        assert_eq!(resolved.get("python_module_name"), Some("pyexample"));
        assert!(!resolved.contains("type_prefix"));
        assert!(!resolved.contains("python_module_authors"));
    }

    #[test]
    fn test_upper_case_convention() {
        assert_eq!(upper_case("libexample"), "LIBEXAMPLE");
        assert_eq!(upper_case("lib-foo.bar"), "LIB_FOO_BAR");
        assert_eq!(upper_case("type name"), "TYPE_NAME");
        assert_eq!(upper_case("a--b"), "A__B");
        assert_eq!(upper_case("utf8_string"), "UTF8_STRING");
    }
}
