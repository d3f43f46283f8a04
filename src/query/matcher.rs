//! Label matchers
//!
//! Supports the four selector operators:
//! - `=`  : Exact string equality
//! - `!=` : String inequality
//! - `=~` : Regex match (fully anchored)
//! - `!~` : Regex non-match (fully anchored)
//!
//! A label missing from a sample reads as the empty string, so
//! `job!="api"` matches samples without `job` and `job=""` selects them.

use std::fmt;

use regex::Regex;

use crate::error::{Result, ValidationError};
use crate::types::{Labels, METRIC_NAME_LABEL};

/// Matching operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOp {
    /// Exact equality: label="value"
    Equal,
    /// Inequality: label!="value"
    NotEqual,
    /// Regex match: label=~"pattern"
    RegexMatch,
    /// Regex non-match: label!~"pattern"
    RegexNoMatch,
}

impl fmt::Display for MatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchOp::Equal => "=",
            MatchOp::NotEqual => "!=",
            MatchOp::RegexMatch => "=~",
            MatchOp::RegexNoMatch => "!~",
        })
    }
}

/// A `(label, operator, value)` predicate
///
/// Regex patterns are compiled once at construction.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
    name: String,
    op: MatchOp,
    value: String,
    regex: Option<Regex>,
}

impl LabelMatcher {
    /// Build a matcher, compiling the pattern for regex operators
    pub fn new(op: MatchOp, name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let value = value.into();

        let regex = match op {
            MatchOp::RegexMatch | MatchOp::RegexNoMatch => {
                let anchored = format!("^(?:{})$", value);
                let re = Regex::new(&anchored).map_err(|e| ValidationError::InvalidRegex {
                    pattern: value.clone(),
                    message: e.to_string(),
                })?;
                Some(re)
            }
            MatchOp::Equal | MatchOp::NotEqual => None,
        };

        Ok(Self {
            name,
            op,
            value,
            regex,
        })
    }

    /// `name="value"`
    pub fn equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: MatchOp::Equal,
            value: value.into(),
            regex: None,
        }
    }

    /// `name!="value"`
    pub fn not_equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: MatchOp::NotEqual,
            value: value.into(),
            regex: None,
        }
    }

    /// `name=~"pattern"`
    pub fn regex(name: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
        Self::new(MatchOp::RegexMatch, name, pattern)
    }

    /// `name!~"pattern"`
    pub fn not_regex(name: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
        Self::new(MatchOp::RegexNoMatch, name, pattern)
    }

    /// `__name__="metric"`
    pub fn metric_name(metric: impl Into<String>) -> Self {
        Self::equal(METRIC_NAME_LABEL, metric)
    }

    /// Label name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operator
    pub fn op(&self) -> MatchOp {
        self.op
    }

    /// Value or pattern as given
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Test a single label value
    pub fn matches_value(&self, value: &str) -> bool {
        match (self.op, &self.regex) {
            (MatchOp::Equal, _) => value == self.value,
            (MatchOp::NotEqual, _) => value != self.value,
            (MatchOp::RegexMatch, Some(re)) => re.is_match(value),
            (MatchOp::RegexNoMatch, Some(re)) => !re.is_match(value),
            // Regex ops always carry a compiled pattern
            (_, None) => false,
        }
    }

    /// Test a label set (absent label reads as "")
    pub fn matches(&self, labels: &Labels) -> bool {
        self.matches_value(labels.get_or_empty(&self.name))
    }
}

impl PartialEq for LabelMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.op == other.op && self.value == other.value
    }
}

impl fmt::Display for LabelMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}\"{}\"",
            self.name,
            self.op,
            crate::types::escape_label_value(&self.value)
        )
    }
}

/// Whether every matcher holds (an empty list matches everything)
pub fn matches_all(matchers: &[LabelMatcher], labels: &Labels) -> bool {
    matchers.iter().all(|m| m.matches(labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_equal_and_not_equal() {
        let l = labels(&[("__name__", "up"), ("job", "api")]);
        assert!(LabelMatcher::equal("job", "api").matches(&l));
        assert!(!LabelMatcher::equal("job", "db").matches(&l));
        assert!(LabelMatcher::not_equal("job", "db").matches(&l));
        assert!(LabelMatcher::metric_name("up").matches(&l));
    }

    #[test]
    fn test_regex_is_anchored() {
        let l = labels(&[("method", "GET")]);
        assert!(LabelMatcher::regex("method", "GET|POST").unwrap().matches(&l));
        assert!(!LabelMatcher::regex("method", "GE").unwrap().matches(&l));
        assert!(LabelMatcher::regex("method", "G.*").unwrap().matches(&l));
        assert!(LabelMatcher::not_regex("method", "P.*").unwrap().matches(&l));
        assert!(!LabelMatcher::not_regex("method", "GET").unwrap().matches(&l));
    }

    #[test]
    fn test_absent_label_is_empty_string() {
        let l = labels(&[("__name__", "up")]);
        assert!(LabelMatcher::equal("job", "").matches(&l));
        assert!(LabelMatcher::not_equal("job", "api").matches(&l));
        assert!(!LabelMatcher::equal("job", "api").matches(&l));
        assert!(LabelMatcher::regex("job", ".*").unwrap().matches(&l));
        assert!(!LabelMatcher::regex("job", ".+").unwrap().matches(&l));
        assert!(LabelMatcher::not_regex("job", "api").unwrap().matches(&l));
    }

    #[test]
    fn test_invalid_regex() {
        let err = LabelMatcher::regex("job", "(unclosed").unwrap_err();
        assert!(matches!(err, crate::error::Error::Validation(ref m) if m.contains("(unclosed")));
    }

    #[test]
    fn test_conjunction() {
        let l = labels(&[("__name__", "up"), ("job", "api"), ("env", "prod")]);
        let both = vec![
            LabelMatcher::equal("job", "api"),
            LabelMatcher::equal("env", "prod"),
        ];
        assert!(matches_all(&both, &l));

        let conflicting = vec![
            LabelMatcher::equal("job", "api"),
            LabelMatcher::equal("env", "dev"),
        ];
        assert!(!matches_all(&conflicting, &l));
        assert!(matches_all(&[], &l));
    }

    #[test]
    fn test_display() {
        let m = LabelMatcher::not_regex("path", "a\"b").unwrap();
        assert_eq!(m.to_string(), r#"path!~"a\"b""#);
        assert_eq!(m.op(), MatchOp::RegexNoMatch);
        assert_eq!(m.name(), "path");
        assert_eq!(m.value(), "a\"b");
    }
}
