//! I/O utilities for decoding input, normalizing delimiters, and building
//! CSV readers and writers.
//!
//! All file I/O in loadprep flows through this module. It provides:
//!
//! - **Decoding**: UTF-8 first, with a single Windows-1252 retry via `encoding_rs`.
//! - **Delimiter resolution**: `\t`/`tab` aliases, and rewriting of delimiters
//!   the CSV reader cannot take directly to a single `|`.
//! - **Reader/writer construction**: flexible readers (ragged rows are data,
//!   not errors) and a non-numeric-quoting writer for the issue log.
//! - **Output naming**: `<file>_issues.log` / `<file>_load.sql` placement.

use std::{
    borrow::Cow,
    ffi::OsString,
    fs::File,
    io::{BufWriter, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::error::ProfileError;

/// Delimiter substituted for anything other than `,` or `|`.
pub const NORMALIZED_DELIMITER: u8 = b'|';

/// The delimiter as given by the user and the single byte the parser uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    original: String,
    normalized: u8,
}

impl Delimiter {
    /// Accepts any non-empty delimiter string; `\t` and `tab` mean TAB.
    pub fn parse(raw: &str) -> Result<Self> {
        let original = match raw {
            "\\t" | "tab" | "TAB" => "\t".to_string(),
            "" => return Err(anyhow!("Delimiter cannot be empty")),
            other => other.to_string(),
        };
        let normalized = match original.as_str() {
            "," => b',',
            "|" => b'|',
            _ => NORMALIZED_DELIMITER,
        };
        Ok(Self {
            original,
            normalized,
        })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn byte(&self) -> u8 {
        self.normalized
    }

    pub fn needs_rewrite(&self) -> bool {
        self.original.as_bytes() != [self.normalized]
    }

    /// Rewrites every occurrence of the original delimiter to the normalized one.
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.needs_rewrite() {
            Cow::Owned(text.replace(&self.original, &(self.normalized as char).to_string()))
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Form used inside generated SQL string literals.
    pub fn sql_literal(&self) -> String {
        self.original.replace('\t', "\\t").replace('\'', "''")
    }
}

pub fn printable_delimiter(delimiter: &str) -> String {
    match delimiter {
        "\t" => "\\t".to_string(),
        "\n" => "\\n".to_string(),
        other => other.to_string(),
    }
}

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    File::open(path)
        .with_context(|| format!("Opening input file {path:?}"))?
        .read_to_end(&mut bytes)
        .with_context(|| format!("Reading input file {path:?}"))?;
    Ok(bytes)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Decodes as UTF-8, retrying once as Windows-1252.
pub fn decode_with_fallback(
    bytes: &[u8],
) -> Result<(String, &'static Encoding), ProfileError> {
    if let Some(text) = decode_bytes(bytes, UTF_8) {
        return Ok((text, UTF_8));
    }
    decode_bytes(bytes, WINDOWS_1252)
        .map(|text| (text, WINDOWS_1252))
        .ok_or(ProfileError::Decode {
            primary: UTF_8.name(),
            fallback: WINDOWS_1252.name(),
        })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .quote(b'"')
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_issue_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path).with_context(|| format!("Creating issue log {path:?}"))?;
    let mut builder = csv::WriterBuilder::new();
    builder
        .quote_style(QuoteStyle::NonNumeric)
        .double_quote(true);
    Ok(builder.from_writer(BufWriter::new(file)))
}

/// `<dir>/<input file name><suffix>`, where `dir` defaults to the input's own
/// directory.
pub fn sibling_output_path(input: &Path, output_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let mut name: OsString = input
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("input"));
    name.push(suffix);
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}
