//! Scalar type classification.
//!
//! Every cleaned field value is mapped onto a [`TypeTag`] drawn from a fixed,
//! totally ordered lattice. Classification is an ordered series of fallible
//! attempts: the strict literal grammar first, then the permissive temporal
//! parser, and finally the `TEXT` fallback.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::temporal;

/// Values longer than this many characters are candidates for temporal parsing.
const TEMPORAL_MIN_LENGTH: usize = 5;
/// Temporal values longer than this carry a time component.
const DATE_MAX_LENGTH: usize = 10;
/// Integers with at least this many characters are widened to `BIGINT`.
const BIGINT_MIN_LENGTH: usize = 10;

/// Inferred column type. Declaration order is the generality order used by
/// [`TypeTag::join`]: `Blank` is the most specific, `Text` the universal fallback.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TypeTag {
    #[default]
    Blank,
    DateTime,
    Date,
    Int,
    BigInt,
    Float,
    Text,
}

impl TypeTag {
    pub fn join(self, other: TypeTag) -> TypeTag {
        self.max(other)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, TypeTag::Int | TypeTag::BigInt | TypeTag::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Blank => "BLANK",
            TypeTag::DateTime => "DATETIME",
            TypeTag::Date => "DATE",
            TypeTag::Int => "INT",
            TypeTag::BigInt => "BIGINT",
            TypeTag::Float => "FLOAT",
            TypeTag::Text => "TEXT",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of value produced by a successful literal parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Integer,
    Float,
    /// Strings, booleans, `None`, containers and imaginary numbers.
    Other,
}

/// Classifies a single cleaned value.
pub fn classify(value: &str) -> TypeTag {
    if value.is_empty() {
        return TypeTag::Blank;
    }
    let length = value.chars().count();
    match parse_literal(value) {
        Some(Literal::Integer) => {
            if value.starts_with('0') && length > 1 {
                TypeTag::Text
            } else if length < BIGINT_MIN_LENGTH {
                TypeTag::Int
            } else {
                TypeTag::BigInt
            }
        }
        Some(Literal::Float) => TypeTag::Float,
        Some(Literal::Other) => TypeTag::Text,
        None => classify_temporal(value, length).unwrap_or(TypeTag::Text),
    }
}

fn classify_temporal(value: &str, length: usize) -> Option<TypeTag> {
    if length <= TEMPORAL_MIN_LENGTH || !temporal::is_temporal(value) {
        return None;
    }
    if length > DATE_MAX_LENGTH {
        Some(TypeTag::DateTime)
    } else {
        Some(TypeTag::Date)
    }
}

/// Parses `value` under a strict literal grammar.
///
/// Unlike a lenient numeric parse, zero-padded decimals such as `007` are
/// rejected outright, so identifiers that merely look numeric never become
/// numbers.
pub fn parse_literal(value: &str) -> Option<Literal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if matches!(trimmed, "True" | "False" | "None") {
        return Some(Literal::Other);
    }
    if is_quoted_string(trimmed) || is_bracketed(trimmed) {
        return Some(Literal::Other);
    }

    let body = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }

    if let Some(imaginary) = body.strip_suffix(['j', 'J']) {
        return parse_number(imaginary).map(|_| Literal::Other);
    }
    parse_number(body)
}

fn parse_number(body: &str) -> Option<Literal> {
    if body.is_empty() {
        return None;
    }
    if is_prefixed_integer(body) {
        return Some(Literal::Integer);
    }

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };

    if let Some(exponent) = exponent {
        let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        if !is_digit_run(digits, |c| c.is_ascii_digit()) {
            return None;
        }
    }

    if let Some((whole, fraction)) = mantissa.split_once('.') {
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        let whole_ok = whole.is_empty() || is_digit_run(whole, |c| c.is_ascii_digit());
        let fraction_ok = fraction.is_empty() || is_digit_run(fraction, |c| c.is_ascii_digit());
        return (whole_ok && fraction_ok).then_some(Literal::Float);
    }

    if !is_digit_run(mantissa, |c| c.is_ascii_digit()) {
        return None;
    }
    if exponent.is_some() {
        return Some(Literal::Float);
    }
    // Decimal integers may only carry leading zeros when every digit is zero.
    if mantissa.starts_with('0') && mantissa.chars().any(|c| c != '0' && c != '_') {
        return None;
    }
    Some(Literal::Integer)
}

fn is_prefixed_integer(body: &str) -> bool {
    let Some(rest) = body.strip_prefix('0') else {
        return false;
    };
    let mut chars = rest.chars();
    let radix_check: fn(char) -> bool = match chars.next() {
        Some('x' | 'X') => |c: char| c.is_ascii_hexdigit(),
        Some('o' | 'O') => |c: char| ('0'..='7').contains(&c),
        Some('b' | 'B') => |c: char| c == '0' || c == '1',
        _ => return false,
    };
    let digits = chars.as_str();
    // A single underscore may follow the radix prefix.
    let digits = digits.strip_prefix('_').unwrap_or(digits);
    is_digit_run(digits, radix_check)
}

/// Digits with single underscores allowed strictly between them.
fn is_digit_run(value: &str, is_digit: impl Fn(char) -> bool) -> bool {
    if value.is_empty() || value.starts_with('_') || value.ends_with('_') || value.contains("__")
    {
        return false;
    }
    value.chars().all(|c| c == '_' || is_digit(c))
}

fn is_quoted_string(value: &str) -> bool {
    let mut chars = value.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return false;
    };
    if first != last || !matches!(first, '\'' | '"') {
        return false;
    }
    !chars.as_str().contains(first)
}

fn is_bracketed(value: &str) -> bool {
    (value.starts_with('[') && value.ends_with(']'))
        || (value.starts_with('{') && value.ends_with('}'))
}
