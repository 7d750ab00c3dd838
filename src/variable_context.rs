//! # Variable context
//!
//! Immutable mapping from a variable name to its stable index inside an
//! observation's value vector. One context is built per binning run and
//! shared read-only by every aggregator; all name resolution happens at
//! aggregator construction so the accumulation hot path only ever works
//! with integer indexes.

use itertools::Itertools;

use crate::l3bin_errors::L3binError;

/// Immutable name → index mapping for the variables of a binning run
///
/// # Fields
///
/// * `names` - The variable names, position in the vector = index in an
///   observation's value vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableContext {
    names: Vec<String>,
}

impl VariableContext {
    /// Build a variable context from an ordered list of variable names
    ///
    /// Arguments
    /// ---------
    /// * `names`: the variable names, in observation-vector order
    ///
    /// Return
    /// ------
    /// * a new VariableContext, or an error if a name appears twice
    pub fn new<I, S>(names: I) -> Result<Self, L3binError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if let Some(duplicate) = names.iter().duplicates().next() {
            return Err(L3binError::DuplicateVariable(duplicate.clone()));
        }
        Ok(VariableContext { names })
    }

    /// Number of variables in the context
    pub fn variable_count(&self) -> usize {
        self.names.len()
    }

    /// Name of the variable at `index`, if any
    pub fn variable_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Index of the variable called `name`, if any
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Index of the variable called `name`, failing fast on unknown names
    ///
    /// Arguments
    /// ---------
    /// * `name`: the variable name to resolve
    ///
    /// Return
    /// ------
    /// * the index of the variable, or [`L3binError::UnknownVariable`]
    pub fn require_index(&self, name: &str) -> Result<usize, L3binError> {
        self.variable_index(name)
            .ok_or_else(|| L3binError::UnknownVariable(name.to_string()))
    }
}

#[cfg(test)]
mod variable_context_test {

    use super::*;

    #[test]
    fn test_lookup() {
        let context = VariableContext::new(["chl", "tsm", "flags"]).unwrap();

        assert_eq!(context.variable_count(), 3);
        assert_eq!(context.variable_index("chl"), Some(0));
        assert_eq!(context.variable_index("flags"), Some(2));
        assert_eq!(context.variable_index("missing"), None);
        assert_eq!(context.variable_name(1), Some("tsm"));
        assert_eq!(context.variable_name(3), None);
    }

    #[test]
    fn test_require_index_unknown_variable() {
        let context = VariableContext::new(["chl"]).unwrap();

        assert_eq!(context.require_index("chl"), Ok(0));
        assert_eq!(
            context.require_index("tsm"),
            Err(L3binError::UnknownVariable("tsm".to_string()))
        );
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = VariableContext::new(["chl", "tsm", "chl"]);
        assert_eq!(
            result.unwrap_err(),
            L3binError::DuplicateVariable("chl".to_string())
        );
    }
}
