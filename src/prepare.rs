use std::{path::Path, time::Instant};

use anyhow::{Context, Result};
use chrono::Local;
use log::{error, info, warn};

use crate::{
    RunOutcome,
    cli::Cli,
    dialect, io_utils,
    io_utils::Delimiter,
    profile::{self, ScanOptions, Verdict},
    render::{self, ScriptContext},
    report,
};

pub const ISSUES_SUFFIX: &str = "_issues.log";
pub const SCRIPT_SUFFIX: &str = "_load.sql";

pub fn execute(args: &Cli) -> Result<RunOutcome> {
    let started = Instant::now();
    let delimiter = Delimiter::parse(&args.delimiter)?;
    info!(
        "Analyzing '{}' with delimiter '{}'",
        args.file.display(),
        io_utils::printable_delimiter(delimiter.original())
    );

    let bytes = io_utils::read_input(&args.file)?;
    let (text, encoding) = io_utils::decode_with_fallback(&bytes)
        .with_context(|| format!("Decoding {:?}", args.file))?;
    info!("Decoded input as {}", encoding.name());

    let dialect = dialect::detect_dialect(&text, delimiter.original());
    info!(
        "Line terminator {}, quoted fields {}",
        dialect.line_terminator,
        if dialect.quoted { "present" } else { "absent" }
    );

    let normalized = delimiter.normalize(&text);
    let options = ScanOptions {
        sample_cap: args.sample_cap,
        check_characters: !args.skip_char_check,
    };
    let profile = profile::profile_text(&normalized, delimiter.byte(), &options)
        .with_context(|| format!("Profiling {:?}", args.file))?;
    profile.validate()?;

    if let Some(path) = &args.profile {
        report::export_profile(path, &args.file, encoding, dialect, &profile)?;
        info!("Field profile written to {path:?}");
    }

    let output_dir = args.output_dir.as_deref();
    if !profile.anomalies.is_empty() {
        let issues_path = io_utils::sibling_output_path(&args.file, output_dir, ISSUES_SUFFIX);
        report::write_issue_log(&issues_path, &profile.anomalies)?;
        info!(
            "{} issue(s) written to {issues_path:?}",
            profile.anomalies.len()
        );
    }

    match profile.verdict() {
        Verdict::Structural => {
            error!(
                "Records with incorrect field counts or erroneous quotes found; review the issue log and correct the data before re-running"
            );
            return Ok(RunOutcome::Halted);
        }
        Verdict::ContentOnly => warn!(
            "Only non-ASCII, non-printable or control characters found; generating the load script, but review the issue log"
        ),
        Verdict::Clean => info!("No issues detected; generating the load script"),
    }

    let source_path = absolute_source(&args.file)?;
    let context = ScriptContext {
        source_path: &source_path,
        delimiter: &delimiter,
        dialect,
        generated_at: Local::now(),
    };
    let script = render::render_load_script(&profile.fields, &context)?;
    let script_path = io_utils::sibling_output_path(&args.file, output_dir, SCRIPT_SUFFIX);
    report::write_script(&script_path, &script)?;
    info!("Load script written to {script_path:?}");

    info!(
        "Processed {} record(s) in {:.3}s",
        profile.records_scanned,
        started.elapsed().as_secs_f64()
    );
    Ok(RunOutcome::Completed)
}

fn absolute_source(path: &Path) -> Result<std::path::PathBuf> {
    std::path::absolute(path).with_context(|| format!("Resolving absolute path of {path:?}"))
}
