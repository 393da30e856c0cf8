//! Writers for the issue log, the load script, and the optional profile export.

use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    anomaly::AnomalyRecord,
    dialect::Dialect,
    io_utils,
    profile::{Profile, ScanMode},
    stats::FieldSchema,
};

pub fn write_issue_log(path: &Path, anomalies: &[AnomalyRecord]) -> Result<()> {
    let mut writer = io_utils::open_issue_writer(path)?;
    writer
        .write_record(AnomalyRecord::log_headers())
        .context("Writing issue log headers")?;
    for (idx, anomaly) in anomalies.iter().enumerate() {
        writer
            .write_record(anomaly.log_row())
            .with_context(|| format!("Writing issue log row {}", idx + 1))?;
    }
    writer.flush().context("Flushing issue log")?;
    Ok(())
}

pub fn write_script(path: &Path, script: &str) -> Result<()> {
    fs::write(path, script).with_context(|| format!("Writing load script {path:?}"))
}

#[derive(Debug, Serialize)]
struct ProfileExport<'a> {
    source: String,
    encoding: &'static str,
    dialect: Dialect,
    baseline_field_count: usize,
    total_records: usize,
    records_scanned: usize,
    mode: ScanMode,
    anomaly_count: usize,
    fields: &'a [FieldSchema],
}

/// Writes the finalized field schemas as JSON when `path` ends in `.json`,
/// YAML otherwise.
pub fn export_profile(
    path: &Path,
    source: &Path,
    encoding: &'static encoding_rs::Encoding,
    dialect: Dialect,
    profile: &Profile,
) -> Result<()> {
    let export = ProfileExport {
        source: source.display().to_string(),
        encoding: encoding.name(),
        dialect,
        baseline_field_count: profile.baseline_field_count,
        total_records: profile.total_records,
        records_scanned: profile.records_scanned,
        mode: profile.mode,
        anomaly_count: profile.anomalies.len(),
        fields: &profile.fields,
    };
    let file = File::create(path).with_context(|| format!("Creating profile file {path:?}"))?;
    let writer = BufWriter::new(file);
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::to_writer_pretty(writer, &export).context("Writing profile JSON")
    } else {
        serde_yaml::to_writer(writer, &export).context("Writing profile YAML")
    }
}
