//! Per-field running statistics.
//!
//! A [`FieldStatistics`] accumulator is owned by the scan driver for each
//! column. It folds every eligible value into a running type join, a maximum
//! length, a numeric digit envelope, and a set of formatting quirk flags. Once
//! the scan completes it is frozen into an immutable [`FieldSchema`].

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    classify::{TypeTag, classify},
    error::ProfileError,
};

/// Fields whose share of values holding non-ASCII characters exceeds this
/// percentage are treated as unicode text.
pub const UNICODE_THRESHOLD_PERCENT: f64 = 1.0;

const STRIPPED_CHARACTERS: [char; 4] = ['(', ')', ',', '$'];
const DASH_PLACEHOLDER: &str = "-";

/// Spreadsheet-export formatting conventions observed in a field.
///
/// Flags are only ever raised, never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuirkFlags {
    pub has_control_char: bool,
    pub has_parentheses: bool,
    pub has_dollar_sign: bool,
    pub has_double_dot: bool,
    pub has_dash_placeholder: bool,
    pub has_comma: bool,
    pub has_scientific_notation: bool,
}

/// The finalized, read-only summary of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub max_length: usize,
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    pub whole_digits: Option<usize>,
    pub fraction_digits: Option<usize>,
    #[serde(flatten)]
    pub quirks: QuirkFlags,
    pub unicode_ratio: f64,
}

/// Precision and scale derived from a float field's digit envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalEnvelope {
    pub precision: usize,
    pub scale: usize,
}

impl FieldSchema {
    pub fn is_unicode(&self) -> bool {
        self.unicode_ratio > UNICODE_THRESHOLD_PERCENT
    }

    /// Width used for string columns; never below one.
    pub fn storage_length(&self) -> usize {
        self.max_length.max(1)
    }

    pub fn has_sign_quirks(&self) -> bool {
        self.quirks.has_parentheses || self.quirks.has_dash_placeholder
    }

    /// Decimal precision/scale for a `FLOAT` field.
    ///
    /// Precision reserves one digit beyond the observed whole and fractional
    /// widths.
    pub fn decimal_envelope(&self) -> Result<DecimalEnvelope, ProfileError> {
        match (self.whole_digits, self.fraction_digits) {
            (Some(whole), Some(fraction)) => Ok(DecimalEnvelope {
                precision: whole + fraction + 1,
                scale: fraction,
            }),
            _ => Err(ProfileError::MissingDigitEnvelope {
                field: self.name.clone(),
            }),
        }
    }
}

/// A raw value with formatting characters removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedValue {
    pub value: String,
    pub dash_placeholder: bool,
}

/// Strips currency, grouping and parenthesis characters and maps a lone dash
/// to zero.
pub fn clean_value(raw: &str) -> CleanedValue {
    let stripped: String = raw
        .chars()
        .filter(|c| !STRIPPED_CHARACTERS.contains(c))
        .collect();
    let trimmed = stripped.trim();
    if trimmed == DASH_PLACEHOLDER {
        CleanedValue {
            value: "0".to_string(),
            dash_placeholder: true,
        }
    } else {
        CleanedValue {
            value: trimmed.to_string(),
            dash_placeholder: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldStatistics {
    max_length: usize,
    type_tag: TypeTag,
    whole_digits: Option<usize>,
    fraction_digits: Option<usize>,
    quirks: QuirkFlags,
    unicode_values: usize,
}

impl FieldStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn quirks(&self) -> &QuirkFlags {
        &self.quirks
    }

    /// Folds one value from an eligible record into the running state.
    pub fn observe(&mut self, raw: &str) {
        let cleaned = clean_value(raw);
        if cleaned.dash_placeholder {
            self.quirks.has_dash_placeholder = true;
        }

        self.type_tag = self.type_tag.join(classify(&cleaned.value));

        if self.type_tag.is_numeric() {
            self.record_numeric_quirks(raw, &cleaned.value);
        }

        if self.type_tag == TypeTag::Float
            && !cleaned.value.is_empty()
            && !cleaned.value.contains("..")
        {
            self.widen_envelope(&cleaned.value);
        }

        self.max_length = self.max_length.max(raw.chars().count());
    }

    /// Marks a raw CR or LF seen inside this field.
    pub fn mark_control_char(&mut self) {
        self.quirks.has_control_char = true;
    }

    /// Counts one value holding non-ASCII or non-printable characters.
    pub fn record_unicode_value(&mut self) {
        self.unicode_values += 1;
    }

    pub fn finalize(self, name: String, records_scanned: usize) -> FieldSchema {
        let unicode_ratio = if records_scanned == 0 {
            0.0
        } else {
            (self.unicode_values as f64 / records_scanned as f64 * 100.0).min(100.0)
        };
        FieldSchema {
            name,
            max_length: self.max_length,
            type_tag: self.type_tag,
            whole_digits: self.whole_digits,
            fraction_digits: self.fraction_digits,
            quirks: self.quirks,
            unicode_ratio,
        }
    }

    fn record_numeric_quirks(&mut self, raw: &str, cleaned: &str) {
        let quirks = &mut self.quirks;
        quirks.has_parentheses |= raw.contains('(');
        quirks.has_dollar_sign |= raw.contains('$');
        quirks.has_double_dot |= cleaned.contains("..");
        quirks.has_comma |= raw.contains(',');
        quirks.has_scientific_notation |= raw.contains(['e', 'E']);
    }

    fn widen_envelope(&mut self, cleaned: &str) {
        let Some((whole, fraction)) = positional_digits(cleaned) else {
            debug!("Value '{cleaned}' has no finite float form; digit envelope unchanged");
            return;
        };
        self.whole_digits = Some(self.whole_digits.map_or(whole, |w| w.max(whole)));
        self.fraction_digits = Some(self.fraction_digits.map_or(fraction, |f| f.max(fraction)));
    }
}

/// Lengths of the whole and fractional parts of `value` rendered in
/// shortest positional (non-exponential) notation with at least one
/// fractional digit. A leading minus sign counts toward the whole part.
pub fn positional_digits(value: &str) -> Option<(usize, usize)> {
    let parsed: f64 = value.replace('_', "").parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    let rendered = parsed.to_string();
    Some(match rendered.split_once('.') {
        Some((whole, fraction)) => (whole.len(), fraction.len()),
        None => (rendered.len(), 1),
    })
}
