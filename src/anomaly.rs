//! Structural and character-level anomaly detection.
//!
//! The scanner never fails: every problem it finds is appended to an ordered
//! log of [`AnomalyRecord`]s and the scan continues. Whether the log is fatal
//! is decided once, after the scan, from the kinds it contains.

use std::fmt;

use serde::Serialize;

pub const NOT_APPLICABLE: &str = "n/a";

/// Number of leading data records used to establish the baseline field count.
pub const BASELINE_SAMPLE_RECORDS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AnomalyKind {
    IncorrectFieldCount,
    ErroneousDoubleQuote,
    NonPrintableCharacter,
}

impl AnomalyKind {
    pub fn label(self) -> &'static str {
        match self {
            AnomalyKind::IncorrectFieldCount => "Incorrect field count",
            AnomalyKind::ErroneousDoubleQuote => "Erroneous double-quote",
            AnomalyKind::NonPrintableCharacter => "Non-printable or Control Character",
        }
    }

    /// Structural anomalies mean the file cannot be parsed reliably as-is.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            AnomalyKind::IncorrectFieldCount | AnomalyKind::ErroneousDoubleQuote
        )
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where an anomaly was found and what triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AnomalyLocation {
    Record {
        actual: usize,
        expected: usize,
    },
    Field {
        name: Option<String>,
        index: usize,
        value: String,
        character: String,
        character_name: String,
        character_code: u32,
    },
}

/// One entry of the diagnostic log. Line numbers are 1-based data record
/// ordinals; line 0 is the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalyRecord {
    pub kind: AnomalyKind,
    pub line: usize,
    pub location: AnomalyLocation,
}

impl AnomalyRecord {
    pub fn field_count(line: usize, actual: usize, expected: usize) -> Self {
        Self {
            kind: AnomalyKind::IncorrectFieldCount,
            line,
            location: AnomalyLocation::Record { actual, expected },
        }
    }

    pub fn field_name(&self) -> Option<&str> {
        match &self.location {
            AnomalyLocation::Field { name, .. } => name.as_deref(),
            AnomalyLocation::Record { .. } => None,
        }
    }

    pub fn field_index(&self) -> Option<usize> {
        match &self.location {
            AnomalyLocation::Field { index, .. } => Some(*index),
            AnomalyLocation::Record { .. } => None,
        }
    }

    pub fn character(&self) -> Option<&str> {
        match &self.location {
            AnomalyLocation::Field { character, .. } => Some(character),
            AnomalyLocation::Record { .. } => None,
        }
    }

    /// Column headings of the tabular issue log.
    pub fn log_headers() -> [&'static str; 8] {
        [
            "Issue",
            "Line",
            "Field Name",
            "Field Number",
            "Field Value",
            "Character Value",
            "Character Name",
            "Character Integer Value",
        ]
    }

    /// Renders the record as one issue-log row matching [`Self::log_headers`].
    pub fn log_row(&self) -> [String; 8] {
        let issue = self.kind.label().to_string();
        let line = self.line.to_string();
        match &self.location {
            AnomalyLocation::Record { actual, expected } => [
                issue,
                line,
                NOT_APPLICABLE.to_string(),
                format!("{actual} fields instead of {expected}"),
                NOT_APPLICABLE.to_string(),
                NOT_APPLICABLE.to_string(),
                NOT_APPLICABLE.to_string(),
                NOT_APPLICABLE.to_string(),
            ],
            AnomalyLocation::Field {
                name,
                index,
                value,
                character,
                character_name,
                character_code,
            } => [
                issue,
                line,
                name.clone().unwrap_or_else(|| NOT_APPLICABLE.to_string()),
                (index + 1).to_string(),
                value.clone(),
                character.clone(),
                character_name.clone(),
                character_code.to_string(),
            ],
        }
    }
}

/// Character-level findings for a single field value, reported back to the
/// caller so it can update that field's statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFindings {
    pub control_char: bool,
    pub unicode: bool,
}

/// Median of the observed field counts; the lower middle value is used for
/// even-sized samples so the baseline is always an observed count.
pub fn baseline_field_count(counts: &[usize]) -> Option<usize> {
    if counts.is_empty() {
        return None;
    }
    let mut sorted = counts.to_vec();
    sorted.sort_unstable();
    Some(sorted[(sorted.len() - 1) / 2])
}

fn is_printable(ch: char) -> bool {
    ch == ' ' || ch.is_ascii_graphic()
}

/// Display value and name for an offending character.
fn describe_character(ch: char) -> (String, String) {
    match ch {
        '\n' => ("LF".to_string(), "Line Feed".to_string()),
        '\r' => ("CR".to_string(), "Carriage Return".to_string()),
        other => (
            other.to_string(),
            unicode_names2::name(other)
                .map(|name| name.to_string())
                .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
        ),
    }
}

#[derive(Debug)]
pub struct AnomalyScanner {
    baseline: usize,
    check_characters: bool,
    anomalies: Vec<AnomalyRecord>,
}

impl AnomalyScanner {
    pub fn new(baseline: usize, check_characters: bool) -> Self {
        Self {
            baseline,
            check_characters,
            anomalies: Vec::new(),
        }
    }

    pub fn baseline(&self) -> usize {
        self.baseline
    }

    pub fn anomalies(&self) -> &[AnomalyRecord] {
        &self.anomalies
    }

    /// Checks a record's width against the baseline. Returns `true` when the
    /// record is eligible to feed field statistics.
    pub fn check_record(&mut self, line: usize, field_count: usize) -> bool {
        if field_count == self.baseline {
            return true;
        }
        self.anomalies
            .push(AnomalyRecord::field_count(line, field_count, self.baseline));
        false
    }

    /// Checks one field value for unbalanced quotes and characters outside
    /// printable ASCII. Character anomalies are only logged when enabled.
    pub fn check_field(
        &mut self,
        line: usize,
        index: usize,
        name: Option<&str>,
        value: &str,
    ) -> FieldFindings {
        let mut findings = FieldFindings::default();

        if value.matches('"').count() % 2 != 0 {
            self.anomalies.push(AnomalyRecord {
                kind: AnomalyKind::ErroneousDoubleQuote,
                line,
                location: AnomalyLocation::Field {
                    name: name.map(str::to_string),
                    index,
                    value: value.to_string(),
                    character: "\"".to_string(),
                    character_name: "Double Quote".to_string(),
                    character_code: u32::from('"'),
                },
            });
        }

        if value.chars().all(is_printable) {
            return findings;
        }

        // Findings feed the field schema whether or not the characters are logged.
        let reported_value = value.trim_matches(['\r', '\n']);
        for ch in value.chars().filter(|c| !is_printable(*c)) {
            if matches!(ch, '\n' | '\r') {
                findings.control_char = true;
            } else {
                findings.unicode = true;
            }
            if !self.check_characters {
                continue;
            }
            let (character, character_name) = describe_character(ch);
            self.anomalies.push(AnomalyRecord {
                kind: AnomalyKind::NonPrintableCharacter,
                line,
                location: AnomalyLocation::Field {
                    name: name.map(str::to_string),
                    index,
                    value: reported_value.to_string(),
                    character,
                    character_name,
                    character_code: u32::from(ch),
                },
            });
        }
        findings
    }

    pub fn into_anomalies(self) -> Vec<AnomalyRecord> {
        self.anomalies
    }
}
