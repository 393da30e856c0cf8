//! Schema aggregation driver.
//!
//! Profiling makes two sequential passes over the decoded text:
//!
//! 1. a **survey** that reads the field counts of the leading records to fix
//!    the baseline width, and counts records to size the sampling stride;
//! 2. a **scan** that feeds every examined record to the [`AnomalyScanner`]
//!    and every field of an eligible record to its [`FieldStatistics`].
//!
//! All accumulators are owned by the scan and frozen into a [`Profile`] when it
//! completes; nothing survives between runs.

use std::{collections::HashSet, sync::OnceLock};

use anyhow::{Context, Result};
use csv::StringRecord;
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;

use crate::{
    anomaly::{AnomalyRecord, AnomalyScanner, BASELINE_SAMPLE_RECORDS, baseline_field_count},
    classify::TypeTag,
    error::ProfileError,
    io_utils,
    stats::{FieldSchema, FieldStatistics},
};

/// A typical cap for sampled scans of very large files.
pub const DEFAULT_SAMPLE_CAP: usize = 250_000;
const PROGRESS_INTERVAL: usize = 100_000;
/// Line number reported for the header row.
const HEADER_LINE: usize = 0;

static HEADER_SEPARATORS: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Examine at most roughly this many records; `None` scans everything.
    pub sample_cap: Option<usize>,
    /// Report characters outside printable ASCII.
    pub check_characters: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            sample_cap: None,
            check_characters: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanMode {
    Full,
    /// Every `step`-th record, starting with the first.
    Sampled { step: usize },
}

impl ScanMode {
    pub fn resolve(total_records: usize, sample_cap: Option<usize>) -> Self {
        match sample_cap {
            Some(cap) if cap > 0 && total_records > cap => ScanMode::Sampled {
                step: total_records.div_ceil(cap),
            },
            _ => ScanMode::Full,
        }
    }

    pub fn includes(self, index: usize) -> bool {
        match self {
            ScanMode::Full => true,
            ScanMode::Sampled { step } => index % step == 0,
        }
    }
}

/// Result of the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Survey {
    pub baseline: usize,
    pub total_records: usize,
}

/// Overall outcome of the anomaly log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    /// Only non-printable or control characters; rendering may proceed.
    ContentOnly,
    /// Field-count or quoting problems; the file is not reliably parseable.
    Structural,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub fields: Vec<FieldSchema>,
    pub anomalies: Vec<AnomalyRecord>,
    pub baseline_field_count: usize,
    pub total_records: usize,
    pub records_scanned: usize,
    pub mode: ScanMode,
}

impl Profile {
    pub fn verdict(&self) -> Verdict {
        if self.anomalies.is_empty() {
            Verdict::Clean
        } else if self.anomalies.iter().any(|a| a.kind.is_structural()) {
            Verdict::Structural
        } else {
            Verdict::ContentOnly
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Every `FLOAT` field must carry a digit envelope.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for field in &self.fields {
            if field.type_tag == TypeTag::Float {
                field.decimal_envelope()?;
            }
        }
        Ok(())
    }
}

/// Replaces runs of characters outside `[0-9A-Za-z]` with `_`. Empty names
/// become `field_<n>` and repeats get a numeric suffix.
pub fn sanitize_headers<'a, I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let pattern = HEADER_SEPARATORS
        .get_or_init(|| Regex::new("[^0-9a-zA-Z]+").expect("header separator pattern"));
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for (idx, header) in headers.into_iter().enumerate() {
        let mut name = pattern.replace_all(header, "_").into_owned();
        if name.is_empty() {
            name = format!("field_{}", idx + 1);
        }
        let mut candidate = name.clone();
        let mut suffix = 2;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{name}_{suffix}");
            suffix += 1;
        }
        names.push(candidate);
    }
    names
}

/// First pass: baseline width from the leading records plus the total count.
pub fn survey(text: &str, delimiter: u8) -> Result<Survey> {
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
    let header_width = reader.headers().context("Reading header row")?.len();
    let mut counts = Vec::with_capacity(BASELINE_SAMPLE_RECORDS);
    let mut total_records = 0usize;
    let mut record = StringRecord::new();
    while reader
        .read_record(&mut record)
        .with_context(|| format!("Reading record {}", total_records + 1))?
    {
        if counts.len() < BASELINE_SAMPLE_RECORDS {
            counts.push(record.len());
        }
        total_records += 1;
    }
    let baseline = baseline_field_count(&counts).unwrap_or(header_width);
    if baseline != header_width {
        warn!("Baseline of {baseline} field(s) differs from the {header_width} header column(s)");
    }
    Ok(Survey {
        baseline,
        total_records,
    })
}

/// Profiles decoded, delimiter-normalized text whose first record is the header.
pub fn profile_text(text: &str, delimiter: u8, options: &ScanOptions) -> Result<Profile> {
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
    let headers = reader.headers().context("Reading header row")?.clone();
    if headers.is_empty() {
        return Err(ProfileError::EmptyInput.into());
    }
    let names = sanitize_headers(headers.iter());
    debug!("Sanitized headers: {:?}", names);

    let survey = survey(text, delimiter)?;
    let mode = ScanMode::resolve(survey.total_records, options.sample_cap);
    info!(
        "Baseline field count {} from the first {} record(s); {} record(s) total, {:?} scan",
        survey.baseline,
        survey.total_records.min(BASELINE_SAMPLE_RECORDS),
        survey.total_records,
        mode
    );

    let mut scanner = AnomalyScanner::new(survey.baseline, options.check_characters);
    // A header that disagrees with the data width cannot name the staging columns.
    scanner.check_record(HEADER_LINE, headers.len());
    let mut fields = vec![FieldStatistics::new(); names.len()];
    let mut record = StringRecord::new();
    let mut index = 0usize;
    let mut scanned = 0usize;

    while reader
        .read_record(&mut record)
        .with_context(|| format!("Reading record {}", index + 1))?
    {
        let line = index + 1;
        let included = mode.includes(index);
        index += 1;
        if !included {
            continue;
        }
        scanned += 1;
        if scanned % PROGRESS_INTERVAL == 0 {
            info!("Processed {scanned} record(s)");
        }

        let eligible = scanner.check_record(line, record.len());
        for (idx, value) in record.iter().enumerate() {
            let findings =
                scanner.check_field(line, idx, names.get(idx).map(String::as_str), value);
            let Some(stats) = fields.get_mut(idx) else {
                continue;
            };
            if findings.control_char {
                stats.mark_control_char();
            }
            if findings.unicode {
                stats.record_unicode_value();
            }
            if eligible {
                stats.observe(value);
            }
        }
    }

    let fields: Vec<FieldSchema> = names
        .into_iter()
        .zip(fields)
        .map(|(name, stats)| stats.finalize(name, scanned))
        .collect();
    for field in &fields {
        debug!(
            "Field '{}': {} (max length {}, unicode {:.2}%)",
            field.name, field.type_tag, field.max_length, field.unicode_ratio
        );
    }

    let anomalies = scanner.into_anomalies();
    info!(
        "Scanned {scanned} of {} record(s); {} anomaly record(s)",
        survey.total_records,
        anomalies.len()
    );

    Ok(Profile {
        fields,
        anomalies,
        baseline_field_count: survey.baseline,
        total_records: survey.total_records,
        records_scanned: scanned,
        mode,
    })
}
