//! Parameter sets and token derivation
//!
//! This module provides:
//! - `ParameterSet`, the token name to value mapping every template renders against
//! - `ParameterResolver`, which derives the tokens a template needs from a base set

pub mod derive;

use crate::error::{GenerateError, Result};
use std::collections::BTreeMap;

pub use derive::{upper_case, ParameterResolver, UPPER_CASE_SUFFIX};

/// Token name to value mapping
///
/// Backed by an ordered map so iteration, and anything rendered from it,
/// is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    tokens: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token, rejecting a second definition with a different value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        match self.tokens.get(&name) {
            Some(existing) if *existing != value => Err(GenerateError::ConflictingToken { token: name }),
            Some(_) => Ok(()),
            None => {
                self.tokens.insert(name, value);
                Ok(())
            }
        }
    }

    /// Merge another set into this one under the same no-conflict rule
    pub fn merge(&mut self, other: &ParameterSet) -> Result<()> {
        for (name, value) in other.iter() {
            self.insert(name, value)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.tokens.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tokens.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    /// Later pairs replace earlier ones with the same name.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            tokens: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_same_value_twice_is_allowed() {
        let mut params = ParameterSet::new();
        params.insert("type_name", "widget").unwrap();
        params.insert("type_name", "widget").unwrap();
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_insert_conflicting_value_fails() {
        let mut params = ParameterSet::new();
        params.insert("type_name", "widget").unwrap();

        let err = params.insert("type_name", "gadget").unwrap_err();
        assert!(matches!(err, GenerateError::ConflictingToken { token } if token == "type_name"));
        assert_eq!(params.get("type_name"), Some("widget"));
    }

    #[test]
    fn test_merge_detects_conflicts() {
        let mut left: ParameterSet = [("a", "1"), ("b", "2")].into_iter().collect();
        let right: ParameterSet = [("b", "2"), ("c", "3")].into_iter().collect();
        left.merge(&right).unwrap();
        assert_eq!(left.len(), 3);

        let clash: ParameterSet = [("c", "4")].into_iter().collect();
        assert!(left.merge(&clash).is_err());
    }

    #[test]
    fn test_iteration_is_sorted() {
        let params: ParameterSet = [("zeta", "1"), ("alpha", "2"), ("mid", "3")]
            .into_iter()
            .collect();
        let names: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
