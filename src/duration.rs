//! Duration strings such as `30s`, `5m` or `1h30m`
//!
//! Units: `ms`, `s`, `m`, `h`, `d`, `w`, `y` (365 days). Terms may be
//! chained and their values are summed.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::digit1,
    combinator::all_consuming,
    multi::many1,
    IResult, Parser,
};

use crate::error::ValidationError;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;
const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;
const MS_PER_YEAR: i64 = 365 * MS_PER_DAY;

fn unit_ms(unit: &str) -> i64 {
    match unit {
        "ms" => 1,
        "s" => MS_PER_SECOND,
        "m" => MS_PER_MINUTE,
        "h" => MS_PER_HOUR,
        "d" => MS_PER_DAY,
        "w" => MS_PER_WEEK,
        _ => MS_PER_YEAR,
    }
}

/// One `<digits><unit>` term
fn duration_term(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, num) = digit1(input)?;
    let (input, unit) = alt((
        tag("ms"),
        tag("s"),
        tag("m"),
        tag("h"),
        tag("d"),
        tag("w"),
        tag("y"),
    ))
    .parse(input)?;
    Ok((input, (num, unit)))
}

fn duration_terms(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    all_consuming(many1(duration_term)).parse(input)
}

/// Parse a duration string into milliseconds
///
/// # Example
///
/// ```rust
/// use kuba_promstore::duration::parse_duration;
///
/// assert_eq!(parse_duration("1m").unwrap(), 60_000);
/// assert_eq!(parse_duration("1h30m").unwrap(), 5_400_000);
/// assert!(parse_duration("ten minutes").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<i64, ValidationError> {
    let trimmed = input.trim();
    let (_, terms) = duration_terms(trimmed).map_err(|_| ValidationError::InvalidFormat {
        field: "duration".to_string(),
        message: format!(
            "'{}' is not a duration like 30s, 5m or 1h30m (units: ms, s, m, h, d, w, y)",
            input
        ),
    })?;

    let overflow = || ValidationError::OutOfRange {
        field: "duration".to_string(),
        value: input.to_string(),
        min: "0ms".to_string(),
        max: format!("{}ms", i64::MAX),
    };

    let mut total: i64 = 0;
    for (num, unit) in terms {
        let n: i64 = num.parse().map_err(|_| overflow())?;
        let term = n.checked_mul(unit_ms(unit)).ok_or_else(overflow)?;
        total = total.checked_add(term).ok_or_else(overflow)?;
    }
    Ok(total)
}

/// Render milliseconds with the largest whole units, e.g. `90000` as `1m30s`
pub fn format_duration(ms: i64) -> String {
    if ms == 0 {
        return "0s".to_string();
    }

    let units = [
        (MS_PER_YEAR, "y"),
        (MS_PER_WEEK, "w"),
        (MS_PER_DAY, "d"),
        (MS_PER_HOUR, "h"),
        (MS_PER_MINUTE, "m"),
        (MS_PER_SECOND, "s"),
        (1, "ms"),
    ];

    let mut out = String::new();
    let mut rest = ms.unsigned_abs();
    if ms < 0 {
        out.push('-');
    }
    for (size, suffix) in units {
        let size = size as u64;
        if rest >= size {
            out.push_str(&format!("{}{}", rest / size, suffix));
            rest %= size;
        }
    }
    out
}
