//! Exposition Format Parser
//!
//! Implements a zero-copy, single-pass parser for the line-oriented metrics
//! exposition text format, plus the assembly of parsed lines into metric
//! families.
//!
//! # Format
//!
//! ```text
//! # HELP <metric_name> <help text>
//! # TYPE <metric_name> counter|gauge|histogram|summary|untyped
//! <metric_name>[{<label>="<value>",...}] <value> [<timestamp_ms>]
//! ```
//!
//! # Examples
//!
//! ```text
//! # TYPE http_requests_total counter
//! http_requests_total{method="GET",code="200"} 1027 1395066363000
//! http_request_duration_seconds_bucket{le="0.05"} 24054
//! process_start_time_seconds 1.7e9
//! ```
//!
//! # Escaping
//!
//! - Label values: `\\`, `\"`, `\n`, `\t`
//! - Help text: `\\`, `\n` (other backslashes are kept literally)

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use super::error::{ParseError, ParseErrorKind};
use super::{Bucket, Metric, MetricFamily, MetricType, MetricValue, Quantile};
use crate::types::{
    render_pairs, BUCKET_LABEL, BUCKET_SUFFIX, COUNT_SUFFIX, METRIC_NAME_LABEL, QUANTILE_LABEL,
    SUM_SUFFIX,
};

/// Parser configuration
#[derive(Debug, Clone)]
pub struct ExpositionConfig {
    /// Maximum line length in bytes (default: 1 MiB)
    pub max_line_length: usize,
}

impl Default for ExpositionConfig {
    fn default() -> Self {
        Self {
            max_line_length: 1024 * 1024,
        }
    }
}

/// One meaningful line of exposition text
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine<'a> {
    /// `# HELP name text`
    Help {
        /// Family name
        metric: &'a str,
        /// Unescaped help text
        text: String,
    },
    /// `# TYPE name type`
    Type {
        /// Family name
        metric: &'a str,
        /// Declared type
        metric_type: MetricType,
    },
    /// A sample line
    Sample(SampleLine<'a>),
}

/// Parsed sample line (before family assembly)
#[derive(Debug, Clone, PartialEq)]
pub struct SampleLine<'a> {
    /// Metric name as written on the line
    pub name: &'a str,
    /// Label pairs in input order
    pub labels: Vec<(&'a str, Cow<'a, str>)>,
    /// Sample value
    pub value: f64,
    /// Optional timestamp in milliseconds
    pub timestamp: Option<i64>,
}

impl SampleLine<'_> {
    /// Value of a label on this line
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_ref())
    }
}

/// Exposition format parser
///
/// # Example
///
/// ```rust
/// use kuba_promstore::ingestion::protocol::{ExpositionParser, ParsedLine};
///
/// let parser = ExpositionParser::new();
/// let line = parser.parse_line(r#"up{job="api"} 1 1700000000000"#).unwrap();
/// match line {
///     Some(ParsedLine::Sample(s)) => {
///         assert_eq!(s.name, "up");
///         assert_eq!(s.label("job"), Some("api"));
///         assert_eq!(s.timestamp, Some(1_700_000_000_000));
///     }
///     _ => panic!("expected a sample"),
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExpositionParser {
    config: ExpositionConfig,
}

impl ExpositionParser {
    /// Create a new parser with default configuration
    pub fn new() -> Self {
        Self {
            config: ExpositionConfig::default(),
        }
    }

    /// Create a new parser with custom configuration
    pub fn with_config(config: ExpositionConfig) -> Self {
        Self { config }
    }

    /// Parse a single line
    ///
    /// Returns `Ok(None)` for blank lines and plain comments.
    pub fn parse_line<'a>(&self, line: &'a str) -> Result<Option<ParsedLine<'a>>, ParseError> {
        if line.len() > self.config.max_line_length {
            return Err(ParseError::new(ParseErrorKind::LineTooLong {
                length: line.len(),
                max: self.config.max_line_length,
            }));
        }

        let mut parser = LineParser::new(line);
        parser.skip_whitespace();

        if parser.is_eof() {
            return Ok(None);
        }

        if parser.peek() == Some('#') {
            parser.advance();
            return parser.parse_comment();
        }

        parser.parse_sample().map(|s| Some(ParsedLine::Sample(s)))
    }

    /// Parse a whole document into metric families
    ///
    /// Fails on the first malformed line; families without any sample are
    /// dropped from the result.
    pub fn parse(&self, input: &str) -> Result<Vec<MetricFamily>, ParseError> {
        let mut builder = FamilyBuilder::default();

        for (line_num, raw) in input.lines().enumerate() {
            let parsed = self
                .parse_line(raw)
                .map_err(|e| e.at_line(line_num + 1).with_context(raw.trim()))?;

            if let Some(parsed) = parsed {
                builder.push(parsed).map_err(|kind| {
                    ParseError::new(kind)
                        .at_line(line_num + 1)
                        .with_context(raw.trim())
                })?;
            }
        }

        Ok(builder.finish())
    }

    /// Parse raw bytes, validating UTF-8 first
    pub fn parse_bytes(&self, input: &[u8]) -> Result<Vec<MetricFamily>, ParseError> {
        let input_str = std::str::from_utf8(input).map_err(|e| {
            ParseError::new(ParseErrorKind::InvalidUtf8).at_column(e.valid_up_to() + 1)
        })?;
        self.parse(input_str)
    }
}

// ============================================================================
// Line Parser
// ============================================================================

/// Internal parser state machine for one line
struct LineParser<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> LineParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Peek at the next character without consuming it
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Advance position by one character
    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.position += c.len_utf8();
        }
    }

    /// Check if we're at end of input
    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Skip blanks and tabs
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Error positioned at the current column
    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind).at_column(self.position + 1)
    }

    /// Consume characters up to the next blank or tab
    fn take_token(&mut self) -> &'a str {
        let start = self.position;
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' {
                break;
            }
            self.advance();
        }
        &self.input[start..self.position]
    }

    /// Parse a `# ...` line (the `#` is already consumed)
    fn parse_comment(&mut self) -> Result<Option<ParsedLine<'a>>, ParseError> {
        self.skip_whitespace();
        let keyword = self.take_token();

        match keyword {
            "HELP" => {
                self.skip_whitespace();
                let metric = self.parse_metric_name()?;
                self.expect_separator()?;
                self.skip_whitespace();
                let text = unescape_help(self.input[self.position..].trim_end());
                Ok(Some(ParsedLine::Help { metric, text }))
            }
            "TYPE" => {
                self.skip_whitespace();
                let metric = self.parse_metric_name()?;
                self.expect_separator()?;
                self.skip_whitespace();

                let type_start = self.position;
                let type_name = self.take_token();
                if type_name.is_empty() {
                    return Err(self.error_here(ParseErrorKind::MalformedComment {
                        message: format!("TYPE line for {} has no type", metric),
                    }));
                }
                let metric_type = type_name
                    .parse::<MetricType>()
                    .map_err(|kind| ParseError::new(kind).at_column(type_start + 1))?;

                self.skip_whitespace();
                if !self.is_eof() {
                    return Err(self.error_here(ParseErrorKind::UnexpectedTrailing {
                        text: self.input[self.position..].to_string(),
                    }));
                }
                Ok(Some(ParsedLine::Type {
                    metric,
                    metric_type,
                }))
            }
            // Any other comment is ignored
            _ => Ok(None),
        }
    }

    /// After a metric name only a blank, tab, or end of line may follow
    fn expect_separator(&self) -> Result<(), ParseError> {
        match self.peek() {
            None | Some(' ') | Some('\t') => Ok(()),
            Some(c) => Err(self.error_here(ParseErrorKind::UnexpectedChar {
                char: c,
                expected: "whitespace after metric name".to_string(),
            })),
        }
    }

    /// Parse a metric name: `[a-zA-Z_:][a-zA-Z0-9_:]*`
    fn parse_metric_name(&mut self) -> Result<&'a str, ParseError> {
        let start = self.position;

        match self.peek() {
            Some(c) if is_metric_name_start(c) => self.advance(),
            _ => return Err(self.error_here(ParseErrorKind::MissingMetricName)),
        }
        while let Some(c) = self.peek() {
            if is_metric_name_char(c) {
                self.advance();
            } else {
                break;
            }
        }

        Ok(&self.input[start..self.position])
    }

    /// Parse a sample line
    fn parse_sample(&mut self) -> Result<SampleLine<'a>, ParseError> {
        let name = self.parse_metric_name()?;

        match self.peek() {
            None | Some(' ') | Some('\t') | Some('{') => {}
            Some(c) => {
                return Err(self.error_here(ParseErrorKind::UnexpectedChar {
                    char: c,
                    expected: "whitespace or '{' after metric name".to_string(),
                }))
            }
        }

        self.skip_whitespace();
        let labels = if self.peek() == Some('{') {
            self.advance(); // consume '{'
            self.parse_labels()?
        } else {
            Vec::new()
        };

        self.skip_whitespace();
        if self.is_eof() {
            return Err(self.error_here(ParseErrorKind::MissingValue));
        }

        let value_start = self.position;
        let value_token = self.take_token();
        let value = parse_float(value_token).ok_or_else(|| {
            ParseError::new(ParseErrorKind::InvalidValue {
                value: value_token.to_string(),
            })
            .at_column(value_start + 1)
        })?;

        self.skip_whitespace();
        let timestamp = if !self.is_eof() {
            Some(self.parse_timestamp()?)
        } else {
            None
        };

        self.skip_whitespace();
        if !self.is_eof() {
            return Err(self.error_here(ParseErrorKind::UnexpectedTrailing {
                text: self.input[self.position..].to_string(),
            }));
        }

        Ok(SampleLine {
            name,
            labels,
            value,
            timestamp,
        })
    }

    /// Parse a label set (the opening brace is already consumed)
    #[allow(clippy::type_complexity)]
    fn parse_labels(&mut self) -> Result<Vec<(&'a str, Cow<'a, str>)>, ParseError> {
        let mut labels = Vec::new();
        let mut seen = HashSet::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('}') => {
                    self.advance();
                    break;
                }
                None => return Err(self.error_here(ParseErrorKind::UnexpectedEof)),
                _ => {}
            }

            let name_start = self.position;
            let name = self.parse_label_name()?;
            if name == METRIC_NAME_LABEL {
                return Err(ParseError::new(ParseErrorKind::ReservedLabel {
                    name: name.to_string(),
                })
                .at_column(name_start + 1));
            }
            if !seen.insert(name) {
                return Err(ParseError::new(ParseErrorKind::DuplicateLabel {
                    label: name.to_string(),
                })
                .at_column(name_start + 1));
            }

            self.skip_whitespace();
            self.expect_char('=', "'=' after label name")?;
            self.skip_whitespace();
            self.expect_char('"', "opening quote of label value")?;
            let value = self.parse_label_value()?;
            labels.push((name, value));

            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.advance(),
                Some('}') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    return Err(self.error_here(ParseErrorKind::UnexpectedChar {
                        char: c,
                        expected: "',' or '}' after label".to_string(),
                    }))
                }
                None => return Err(self.error_here(ParseErrorKind::UnexpectedEof)),
            }
        }

        Ok(labels)
    }

    fn expect_char(&mut self, expected: char, what: &str) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(self.error_here(ParseErrorKind::UnexpectedChar {
                char: c,
                expected: what.to_string(),
            })),
            None => Err(self.error_here(ParseErrorKind::UnexpectedEof)),
        }
    }

    /// Parse a label name: `[a-zA-Z_][a-zA-Z0-9_]*`
    fn parse_label_name(&mut self) -> Result<&'a str, ParseError> {
        let start = self.position;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | ',' | '}' | '"' | ' ' | '\t' | '!' | '~') {
                break;
            }
            self.advance();
        }

        let name = &self.input[start..self.position];
        if name.is_empty() {
            return Err(ParseError::new(ParseErrorKind::UnexpectedChar {
                char: self.peek().unwrap_or('\0'),
                expected: "label name".to_string(),
            })
            .at_column(start + 1));
        }
        if !is_valid_label_name(name) {
            return Err(ParseError::new(ParseErrorKind::InvalidLabelName {
                name: name.to_string(),
            })
            .at_column(start + 1));
        }
        Ok(name)
    }

    /// Parse a quoted label value (the opening quote is already consumed)
    ///
    /// Borrows from the input unless an escape forces a copy.
    fn parse_label_value(&mut self) -> Result<Cow<'a, str>, ParseError> {
        let input = self.input;
        let start = self.position;
        let mut owned: Option<String> = None;

        loop {
            match self.peek() {
                Some('"') => {
                    let end = self.position;
                    self.advance(); // consume closing quote
                    return Ok(match owned {
                        Some(s) => Cow::Owned(s),
                        None => Cow::Borrowed(&input[start..end]),
                    });
                }
                Some('\\') => {
                    let escape_at = self.position;
                    let buf = owned.get_or_insert_with(|| input[start..escape_at].to_string());
                    self.advance(); // consume backslash
                    match self.peek() {
                        Some('\\') => buf.push('\\'),
                        Some('"') => buf.push('"'),
                        Some('n') => buf.push('\n'),
                        Some('t') => buf.push('\t'),
                        Some(c) => {
                            return Err(ParseError::new(ParseErrorKind::InvalidEscape {
                                sequence: format!("\\{}", c),
                            })
                            .at_column(escape_at + 1));
                        }
                        None => {
                            return Err(self.error_here(ParseErrorKind::UnterminatedLabelValue))
                        }
                    }
                    self.advance();
                }
                Some(c) => {
                    if let Some(buf) = owned.as_mut() {
                        buf.push(c);
                    }
                    self.advance();
                }
                None => return Err(self.error_here(ParseErrorKind::UnterminatedLabelValue)),
            }
        }
    }

    /// Parse an integer millisecond timestamp
    fn parse_timestamp(&mut self) -> Result<i64, ParseError> {
        let start = self.position;
        let token = self.take_token();
        token.parse::<i64>().map_err(|_| {
            ParseError::new(ParseErrorKind::InvalidTimestamp {
                value: token.to_string(),
            })
            .at_column(start + 1)
        })
    }
}

fn is_metric_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':'
}

fn is_metric_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a sample value, accepting `NaN`, `+Inf`, `-Inf`
pub(crate) fn parse_float(token: &str) -> Option<f64> {
    if token.is_empty() {
        return None;
    }
    token.parse::<f64>().ok()
}

/// Unescape help text (`\\` and `\n`)
fn unescape_help(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\\') => {
                    result.push('\\');
                    chars.next();
                }
                Some('n') => {
                    result.push('\n');
                    chars.next();
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

// ============================================================================
// Family Assembly
// ============================================================================

/// Where a sample line lands within the families seen so far
enum Target {
    /// New untyped family named after the line
    NewFamily,
    /// Counter, gauge or untyped instance of an existing family
    Scalar(usize),
    /// Histogram bucket of family `.0`
    Bucket(usize),
    /// Summary quantile of family `.0`
    Quantile(usize),
    /// `_sum` line of family `.0`
    Sum(usize),
    /// `_count` line of family `.0`
    Count(usize),
}

struct FamilyState {
    family: MetricFamily,
    type_declared: bool,
    /// Histogram/summary instance lookup by (label key, timestamp)
    groups: HashMap<(String, Option<i64>), usize>,
}

impl FamilyState {
    fn new(name: &str, metric_type: MetricType, type_declared: bool) -> Self {
        Self {
            family: MetricFamily::new(name, metric_type),
            type_declared,
            groups: HashMap::new(),
        }
    }

    /// Find or create the histogram/summary instance a line belongs to
    fn group_mut(&mut self, labels: Vec<(String, String)>, timestamp: Option<i64>) -> &mut Metric {
        let mut sorted: Vec<(&str, &str)> = labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
        let key = (render_pairs(&sorted), timestamp);

        let metrics = &mut self.family.metrics;
        let metric_type = self.family.metric_type;
        let idx = *self.groups.entry(key).or_insert_with(|| {
            let value = match metric_type {
                MetricType::Summary => MetricValue::Summary {
                    quantiles: Vec::new(),
                    sum: None,
                    count: None,
                },
                _ => MetricValue::Histogram {
                    buckets: Vec::new(),
                    sum: None,
                    count: None,
                },
            };
            metrics.push(Metric {
                labels,
                value,
                timestamp,
            });
            metrics.len() - 1
        });
        &mut metrics[idx]
    }
}

#[derive(Default)]
struct FamilyBuilder {
    families: Vec<FamilyState>,
    index: HashMap<String, usize>,
}

impl FamilyBuilder {
    fn get_or_create(&mut self, name: &str) -> &mut FamilyState {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.families
                    .push(FamilyState::new(name, MetricType::Untyped, false));
                self.index.insert(name.to_string(), self.families.len() - 1);
                self.families.len() - 1
            }
        };
        &mut self.families[idx]
    }

    fn push(&mut self, line: ParsedLine<'_>) -> Result<(), ParseErrorKind> {
        match line {
            ParsedLine::Help { metric, text } => {
                let state = self.get_or_create(metric);
                if state.family.help.is_some() {
                    return Err(ParseErrorKind::DuplicateHelp {
                        metric: metric.to_string(),
                    });
                }
                state.family.help = Some(text);
                Ok(())
            }
            ParsedLine::Type {
                metric,
                metric_type,
            } => {
                let state = self.get_or_create(metric);
                if state.type_declared {
                    return Err(ParseErrorKind::DuplicateType {
                        metric: metric.to_string(),
                    });
                }
                if !state.family.metrics.is_empty() {
                    return Err(ParseErrorKind::TypeAfterSamples {
                        metric: metric.to_string(),
                    });
                }
                state.family.metric_type = metric_type;
                state.type_declared = true;
                Ok(())
            }
            ParsedLine::Sample(sample) => self.push_sample(sample),
        }
    }

    fn family_of_type(&self, name: &str, types: &[MetricType]) -> Option<usize> {
        self.index
            .get(name)
            .copied()
            .filter(|&idx| types.contains(&self.families[idx].family.metric_type))
    }

    fn resolve(&self, name: &str) -> Result<Target, ParseErrorKind> {
        // A HELP line alone leaves an empty untyped placeholder; that must not
        // shadow a declared histogram or summary owning this name as a member.
        let exact = self.index.get(name).copied().filter(|&idx| {
            let state = &self.families[idx];
            state.type_declared
                || !state.family.metrics.is_empty()
                || self.parent_of(name).is_none()
        });
        if let Some(idx) = exact {
            return match self.families[idx].family.metric_type {
                MetricType::Histogram => Err(ParseErrorKind::InvalidFamilyMember {
                    metric: name.to_string(),
                    family: name.to_string(),
                }),
                MetricType::Summary => Ok(Target::Quantile(idx)),
                _ => Ok(Target::Scalar(idx)),
            };
        }

        Ok(self.parent_of(name).unwrap_or(Target::NewFamily))
    }

    /// Histogram or summary family `name` is a `_bucket`/`_sum`/`_count` member of
    fn parent_of(&self, name: &str) -> Option<Target> {
        let both = [MetricType::Histogram, MetricType::Summary];
        if let Some(base) = name.strip_suffix(BUCKET_SUFFIX) {
            if let Some(idx) = self.family_of_type(base, &[MetricType::Histogram]) {
                return Some(Target::Bucket(idx));
            }
        }
        if let Some(base) = name.strip_suffix(SUM_SUFFIX) {
            if let Some(idx) = self.family_of_type(base, &both) {
                return Some(Target::Sum(idx));
            }
        }
        if let Some(base) = name.strip_suffix(COUNT_SUFFIX) {
            if let Some(idx) = self.family_of_type(base, &both) {
                return Some(Target::Count(idx));
            }
        }
        None
    }

    fn push_sample(&mut self, sample: SampleLine<'_>) -> Result<(), ParseErrorKind> {
        let target = self.resolve(sample.name)?;

        match target {
            Target::NewFamily | Target::Scalar(_) => {
                let state = self.get_or_create(sample.name);
                state.family.metrics.push(Metric {
                    labels: owned_labels(&sample, None),
                    value: MetricValue::Scalar(sample.value),
                    timestamp: sample.timestamp,
                });
            }
            Target::Bucket(idx) => {
                let upper_bound = required_float_label(&sample, BUCKET_LABEL)?;
                let labels = owned_labels(&sample, Some(BUCKET_LABEL));
                let metric = self.families[idx].group_mut(labels, sample.timestamp);
                if let MetricValue::Histogram { buckets, .. } = &mut metric.value {
                    buckets.push(Bucket {
                        upper_bound,
                        cumulative_count: sample.value,
                    });
                }
            }
            Target::Quantile(idx) => {
                let quantile = required_float_label(&sample, QUANTILE_LABEL)?;
                let labels = owned_labels(&sample, Some(QUANTILE_LABEL));
                let metric = self.families[idx].group_mut(labels, sample.timestamp);
                if let MetricValue::Summary { quantiles, .. } = &mut metric.value {
                    quantiles.push(Quantile {
                        quantile,
                        value: sample.value,
                    });
                }
            }
            Target::Sum(idx) | Target::Count(idx) => {
                let is_sum = matches!(target, Target::Sum(_));
                let labels = owned_labels(&sample, None);
                let metric = self.families[idx].group_mut(labels, sample.timestamp);
                let slot = match &mut metric.value {
                    MetricValue::Histogram { sum, count, .. }
                    | MetricValue::Summary { sum, count, .. } => {
                        if is_sum {
                            sum
                        } else {
                            count
                        }
                    }
                    MetricValue::Scalar(_) => return Ok(()),
                };
                *slot = Some(sample.value);
            }
        }

        Ok(())
    }

    fn finish(self) -> Vec<MetricFamily> {
        self.families
            .into_iter()
            .filter(|state| !state.family.metrics.is_empty())
            .map(|state| state.family)
            .collect()
    }
}

/// Copy a line's labels, leaving out `skip`
fn owned_labels(sample: &SampleLine<'_>, skip: Option<&str>) -> Vec<(String, String)> {
    sample
        .labels
        .iter()
        .filter(|(k, _)| Some(*k) != skip)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Read a label that must hold a float (`le`, `quantile`)
fn required_float_label(sample: &SampleLine<'_>, label: &str) -> Result<f64, ParseErrorKind> {
    sample
        .label(label)
        .and_then(parse_float)
        .ok_or_else(|| ParseErrorKind::MissingLabel {
            metric: sample.name.to_string(),
            label: label.to_string(),
        })
}
