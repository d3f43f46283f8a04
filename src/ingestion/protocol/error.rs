//! Exposition parsing error types
//!
//! Provides detailed error types for parsing failures with context about
//! the error location and nature.

use std::fmt;

/// Maximum characters of the offending line kept as context
const MAX_CONTEXT_CHARS: usize = 50;

/// Parse error with location and context
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Kind of error that occurred
    pub kind: ParseErrorKind,
    /// Line number where error occurred (1-indexed)
    pub line: Option<usize>,
    /// Column/byte offset where error occurred (1-indexed)
    pub column: Option<usize>,
    /// The problematic input snippet (truncated if too long)
    pub context: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(kind: ParseErrorKind) -> Self {
        Self {
            kind,
            line: None,
            column: None,
            context: None,
        }
    }

    /// Add line number to error
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add column/offset to error
    pub fn at_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    /// Add context snippet to error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let ctx = context.into();
        self.context = if ctx.chars().count() > MAX_CONTEXT_CHARS {
            let truncated: String = ctx.chars().take(MAX_CONTEXT_CHARS - 3).collect();
            Some(format!("{}...", truncated))
        } else {
            Some(ctx)
        };
        self
    }

    /// Check if this is a syntax error within a single line
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self.kind,
            ParseErrorKind::UnexpectedChar { .. }
                | ParseErrorKind::UnterminatedLabelValue
                | ParseErrorKind::InvalidEscape { .. }
                | ParseErrorKind::UnexpectedEof
                | ParseErrorKind::UnexpectedTrailing { .. }
                | ParseErrorKind::MissingMetricName
                | ParseErrorKind::MissingValue
        )
    }

    /// Check if this error comes from assembling metric families
    /// (the individual line was well formed)
    pub fn is_family_error(&self) -> bool {
        matches!(
            self.kind,
            ParseErrorKind::DuplicateType { .. }
                | ParseErrorKind::DuplicateHelp { .. }
                | ParseErrorKind::TypeAfterSamples { .. }
                | ParseErrorKind::MissingLabel { .. }
                | ParseErrorKind::InvalidFamilyMember { .. }
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(line) = self.line {
            if let Some(col) = self.column {
                write!(f, " at line {}, column {}", line, col)?;
            } else {
                write!(f, " at line {}", line)?;
            }
        }

        if let Some(ref ctx) = self.context {
            write!(f, " near '{}'", ctx)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Kinds of parse errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input is not valid UTF-8
    InvalidUtf8,

    /// Line exceeds the configured maximum length
    LineTooLong {
        /// Length of the offending line in bytes
        length: usize,
        /// Configured maximum
        max: usize,
    },

    /// Sample line or comment lacks a metric name
    MissingMetricName,

    /// Label name does not match `[a-zA-Z_][a-zA-Z0-9_]*`
    InvalidLabelName {
        /// The rejected name
        name: String,
    },

    /// `__name__` used inside braces
    ReservedLabel {
        /// The reserved label name
        name: String,
    },

    /// Same label name twice in one sample
    DuplicateLabel {
        /// The duplicated label name
        label: String,
    },

    /// Unexpected character encountered
    UnexpectedChar {
        /// The unexpected character
        char: char,
        /// What was expected
        expected: String,
    },

    /// Label value without closing quote
    UnterminatedLabelValue,

    /// Invalid escape sequence
    InvalidEscape {
        /// The invalid escape sequence
        sequence: String,
    },

    /// Sample line without a value
    MissingValue,

    /// Value is not a float
    InvalidValue {
        /// The rejected token
        value: String,
    },

    /// Timestamp is not an integer
    InvalidTimestamp {
        /// The rejected token
        value: String,
    },

    /// Tokens after the timestamp
    UnexpectedTrailing {
        /// The extra text
        text: String,
    },

    /// `# TYPE` names an unknown type
    UnknownMetricType {
        /// The rejected type token
        type_name: String,
    },

    /// `# HELP` or `# TYPE` line missing its tokens
    MalformedComment {
        /// Description of the problem
        message: String,
    },

    /// Second `# TYPE` for the same family
    DuplicateType {
        /// Family name
        metric: String,
    },

    /// Second `# HELP` for the same family
    DuplicateHelp {
        /// Family name
        metric: String,
    },

    /// `# TYPE` after samples of that family were seen
    TypeAfterSamples {
        /// Family name
        metric: String,
    },

    /// Bucket or quantile line lacking its `le` / `quantile` label, or
    /// carrying a non-numeric one
    MissingLabel {
        /// Sample name
        metric: String,
        /// Label that was required
        label: String,
    },

    /// Sample name does not fit the family it collides with
    InvalidFamilyMember {
        /// Sample name
        metric: String,
        /// Family the name collides with
        family: String,
    },

    /// Unexpected end of input
    UnexpectedEof,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidUtf8 => write!(f, "Invalid UTF-8 encoding"),
            ParseErrorKind::LineTooLong { length, max } => {
                write!(f, "Line of {} bytes exceeds maximum of {}", length, max)
            }
            ParseErrorKind::MissingMetricName => write!(f, "Missing metric name"),
            ParseErrorKind::InvalidLabelName { name } => {
                write!(f, "Invalid label name: '{}'", name)
            }
            ParseErrorKind::ReservedLabel { name } => {
                write!(f, "Label name '{}' is reserved", name)
            }
            ParseErrorKind::DuplicateLabel { label } => {
                write!(f, "Duplicate label name: {}", label)
            }
            ParseErrorKind::UnexpectedChar { char, expected } => {
                write!(f, "Unexpected character '{}', expected {}", char, expected)
            }
            ParseErrorKind::UnterminatedLabelValue => write!(f, "Unterminated label value"),
            ParseErrorKind::InvalidEscape { sequence } => {
                write!(f, "Invalid escape sequence: {}", sequence)
            }
            ParseErrorKind::MissingValue => write!(f, "Missing sample value"),
            ParseErrorKind::InvalidValue { value } => {
                write!(f, "Invalid sample value: '{}'", value)
            }
            ParseErrorKind::InvalidTimestamp { value } => {
                write!(f, "Invalid timestamp: '{}'", value)
            }
            ParseErrorKind::UnexpectedTrailing { text } => {
                write!(f, "Unexpected trailing input: '{}'", text)
            }
            ParseErrorKind::UnknownMetricType { type_name } => {
                write!(f, "Unknown metric type: '{}'", type_name)
            }
            ParseErrorKind::MalformedComment { message } => {
                write!(f, "Malformed comment: {}", message)
            }
            ParseErrorKind::DuplicateType { metric } => {
                write!(f, "Second TYPE line for metric {}", metric)
            }
            ParseErrorKind::DuplicateHelp { metric } => {
                write!(f, "Second HELP line for metric {}", metric)
            }
            ParseErrorKind::TypeAfterSamples { metric } => {
                write!(f, "TYPE line for metric {} after its samples", metric)
            }
            ParseErrorKind::MissingLabel { metric, label } => {
                write!(f, "Sample {} needs a numeric '{}' label", metric, label)
            }
            ParseErrorKind::InvalidFamilyMember { metric, family } => {
                write!(f, "Sample {} does not belong to family {}", metric, family)
            }
            ParseErrorKind::UnexpectedEof => write!(f, "Unexpected end of input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_location() {
        let err = ParseError::new(ParseErrorKind::MissingValue)
            .at_line(4)
            .at_column(12)
            .with_context("http_requests_total{code=\"200\"}");
        let msg = err.to_string();
        assert!(msg.contains("Missing sample value"));
        assert!(msg.contains("line 4, column 12"));
        assert!(msg.contains("http_requests_total"));
    }

    #[test]
    fn test_context_truncation_is_char_safe() {
        let long = "é".repeat(80);
        let err = ParseError::new(ParseErrorKind::MissingValue).with_context(long);
        let ctx = err.context.unwrap();
        assert!(ctx.ends_with("..."));
        assert_eq!(ctx.chars().count(), MAX_CONTEXT_CHARS);
    }

    #[test]
    fn test_classification() {
        assert!(ParseError::new(ParseErrorKind::UnterminatedLabelValue).is_syntax_error());
        assert!(ParseError::new(ParseErrorKind::DuplicateType {
            metric: "x".to_string()
        })
        .is_family_error());
        assert!(!ParseError::new(ParseErrorKind::InvalidUtf8).is_family_error());
    }
}
