use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Analyze a delimited data file and prepare a SQL Server load script",
    long_about = None
)]
pub struct Cli {
    /// Delimited text file to analyze
    #[arg(short = 'f', long = "file")]
    pub file: PathBuf,
    /// Field delimiter; `\t` or `tab` for tab, multi-character delimiters allowed
    #[arg(short = 'd', long = "delimiter")]
    pub delimiter: String,
    /// Examine roughly this many evenly spaced records instead of every record
    #[arg(long = "sample-cap")]
    pub sample_cap: Option<usize>,
    /// Skip the per-character check for non-printable and non-ASCII characters
    #[arg(long = "skip-char-check")]
    pub skip_char_check: bool,
    /// Directory for the issue log and load script (defaults to the input's directory)
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// Also write the inferred field profile (.json for JSON, YAML otherwise)
    #[arg(long = "profile")]
    pub profile: Option<PathBuf>,
}
