//! Regex rewrite rule compilation.
//!
//! # Responsibilities
//! - Compile configured `{regex, replacement}` pairs once at setup
//! - Apply a rule list to a string as a chain of global replacements
//!
//! # Design Decisions
//! - Rule order is preserved; each rule sees the previous rule's output
//! - One invalid pattern fails the whole set (no partial rule sets)
//! - Compiled sets are immutable and shared read-only between requests

use regex::Regex;
use thiserror::Error;

use crate::config::schema::Rewrite;

/// Errors raised while compiling rewrite rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The configured pattern is not a valid regular expression.
    #[error("error compiling regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled rewrite: pattern plus replacement template.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    regex: Regex,
    replacement: String,
}

impl CompiledRule {
    /// Compile a single configured rewrite.
    pub fn compile(rewrite: &Rewrite) -> Result<Self, RuleError> {
        let regex = Regex::new(&rewrite.regex).map_err(|source| RuleError::InvalidRegex {
            pattern: rewrite.regex.clone(),
            source,
        })?;

        Ok(Self {
            regex,
            replacement: rewrite.replacement.clone(),
        })
    }

    /// Replace every match of the pattern in `value`.
    pub fn apply(&self, value: &str) -> String {
        self.regex
            .replace_all(value, self.replacement.as_str())
            .into_owned()
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

/// An ordered, immutable list of compiled rules for one cookie attribute.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every rewrite, failing on the first invalid pattern.
    pub fn compile(rewrites: &[Rewrite]) -> Result<Self, RuleError> {
        let rules = rewrites
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Run the chain: every rule rewrites the output of the previous one.
    pub fn apply(&self, value: &str) -> String {
        self.rules
            .iter()
            .fold(value.to_owned(), |current, rule| rule.apply(&current))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }
}
