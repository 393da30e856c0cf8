//! T-SQL load-script generation.
//!
//! The script has three statements: a `#SHELL` staging table of string
//! columns, a `BULK INSERT` of the raw file into it, and a `SELECT ... INTO
//! #FORMAT` projection that trims, cleans and casts every column to its
//! inferred type.

use std::{fmt::Write as _, path::Path};

use chrono::{DateTime, Local};
use itertools::Itertools;

use crate::{
    classify::TypeTag,
    dialect::{Dialect, LineTerminator},
    error::ProfileError,
    io_utils::Delimiter,
    stats::FieldSchema,
};

const BANNER: &str = "--===============================";

/// Everything the script needs besides the field schemas.
#[derive(Debug, Clone)]
pub struct ScriptContext<'a> {
    /// Absolute path of the raw file, as SQL Server will read it.
    pub source_path: &'a Path,
    pub delimiter: &'a Delimiter,
    pub dialect: Dialect,
    pub generated_at: DateTime<Local>,
}

pub fn render_load_script(
    fields: &[FieldSchema],
    context: &ScriptContext<'_>,
) -> Result<String, ProfileError> {
    let projections = fields
        .iter()
        .map(|field| Ok(format!("\t{} AS {}", cast_expression(field)?, bracketed(&field.name))))
        .collect::<Result<Vec<_>, ProfileError>>()?;

    let mut script = String::new();
    let _ = writeln!(script, "{BANNER}");
    let _ = writeln!(script, "--SQL LOAD SCRIPT");
    let _ = writeln!(script, "--DESC: ?????");
    let _ = writeln!(
        script,
        "--DATE: {}",
        context.generated_at.format("%Y-%m-%d %H:%M:%S%.6f")
    );
    let _ = writeln!(script, "--BY: ????");
    let _ = writeln!(script, "{BANNER}\n\n");

    render_staging_table(&mut script, fields);
    render_bulk_insert(&mut script, context);

    let _ = writeln!(script, "GO\nDROP TABLE IF EXISTS #FORMAT\nSELECT");
    let _ = writeln!(script, "{}", projections.iter().join(",\n"));
    let _ = writeln!(script, "INTO #FORMAT\nFROM #SHELL\n;\n");
    Ok(script)
}

fn render_staging_table(script: &mut String, fields: &[FieldSchema]) {
    let _ = writeln!(script, "GO\nDROP TABLE IF EXISTS #SHELL\nCREATE TABLE #SHELL (");
    let columns = fields
        .iter()
        .map(|field| format!("\t{}\t{}", bracketed(&field.name), string_type(field)))
        .join(",\n");
    let _ = writeln!(script, "{columns}\n);\n\n");
}

fn render_bulk_insert(script: &mut String, context: &ScriptContext<'_>) {
    let path = context.source_path.display().to_string().replace('\'', "''");
    let _ = writeln!(script, "GO\nBULK INSERT #SHELL\nFROM '{path}' WITH (");
    let _ = writeln!(script, "CODEPAGE = '65001',");
    let _ = writeln!(script, "FIRSTROW = 2,");
    let _ = writeln!(
        script,
        "FIELDTERMINATOR = '{}',",
        context.delimiter.sql_literal()
    );
    let comment = if context.dialect.quoted { "" } else { "--" };
    let _ = writeln!(script, "{comment}FORMAT = 'CSV',");
    let _ = writeln!(script, "{comment}FIELDQUOTE = '\"',");
    let terminator = match context.dialect.line_terminator {
        LineTerminator::Lf => "0x0a",
        LineTerminator::Crlf => "\\n",
    };
    let _ = writeln!(script, "ROWTERMINATOR = '{terminator}'");
    let _ = writeln!(script, "--DATAFILETYPE = 'char' --(or 'widechar')");
    let _ = writeln!(script, ");\n\n");
}

fn bracketed(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

fn string_type(field: &FieldSchema) -> String {
    let base = if field.is_unicode() { "NVARCHAR" } else { "VARCHAR" };
    format!("{base}({})", field.storage_length())
}

/// Column reference with embedded CR/LF removed when the field carries them.
fn base_column(field: &FieldSchema) -> String {
    let column = bracketed(&field.name);
    if field.quirks.has_control_char {
        format!("REPLACE(REPLACE({column},CHAR(10),''),CHAR(13),'')")
    } else {
        column
    }
}

/// Base column wrapped in the numeric clean-up replacements the field needs,
/// innermost first: `$` removal, `..` collapse, `,` removal.
fn cleaned_column(field: &FieldSchema) -> String {
    let mut expr = base_column(field);
    if field.quirks.has_dollar_sign {
        expr = format!("REPLACE({expr},'$','')");
    }
    if field.quirks.has_double_dot {
        expr = format!("REPLACE({expr},'..','.')");
    }
    if field.quirks.has_comma {
        expr = format!("REPLACE({expr},',','')");
    }
    expr
}

/// The cleansing-and-cast expression projecting one staged column.
pub fn cast_expression(field: &FieldSchema) -> Result<String, ProfileError> {
    let base = base_column(field);
    let expr = match field.type_tag {
        TypeTag::Blank | TypeTag::Text => {
            format!("CAST(NULLIF(LTRIM(RTRIM({base})),'') AS {})", string_type(field))
        }
        TypeTag::Date => format!("CAST(NULLIF(LTRIM(RTRIM({base})),'') AS DATE)"),
        TypeTag::DateTime => format!("CAST(NULLIF(LTRIM(RTRIM({base})),'') AS DATETIME2)"),
        TypeTag::Int => integer_cast(field, "INT"),
        TypeTag::BigInt => integer_cast(field, "BIGINT"),
        TypeTag::Float => decimal_cast(field)?,
    };
    Ok(expr)
}

fn integer_cast(field: &FieldSchema, sql_type: &str) -> String {
    let column = bracketed(&field.name);
    let base = base_column(field);
    let cleaned = cleaned_column(field);
    if field.has_sign_quirks() {
        format!(
            "CAST(CASE WHEN RTRIM(LTRIM(REPLACE({base},'$',''))) = '-' THEN 0\n\
             \t\tWHEN CHARINDEX('(',{column}) > 0 THEN RTRIM(LTRIM(REPLACE(REPLACE({cleaned},'(',''),')',''))) * -1\n\
             \t\tELSE NULLIF(RTRIM(LTRIM({cleaned})),'')\n\
             \t\tEND AS {sql_type})"
        )
    } else {
        format!("CAST(NULLIF(RTRIM(LTRIM({cleaned})),'') AS {sql_type})")
    }
}

fn decimal_cast(field: &FieldSchema) -> Result<String, ProfileError> {
    let envelope = field.decimal_envelope()?;
    let decimal = format!("DECIMAL({},{})", envelope.precision, envelope.scale);
    let column = bracketed(&field.name);
    let base = base_column(field);
    let cleaned = cleaned_column(field);
    let expr = if field.has_sign_quirks() {
        format!(
            "CAST(CASE WHEN RTRIM(LTRIM(REPLACE({base},'$',''))) = '-' THEN 0.0\n\
             \t\tWHEN CHARINDEX('(',{column}) > 0 THEN CAST(RTRIM(LTRIM(REPLACE(REPLACE({cleaned},'(',''),')',''))) AS FLOAT) * -1.0\n\
             \t\tELSE CAST(NULLIF(RTRIM(LTRIM({cleaned})),'') AS FLOAT)\n\
             \t\tEND AS {decimal})"
        )
    } else if field.quirks.has_scientific_notation {
        format!(
            "CASE WHEN {column} LIKE '%e%' THEN CAST(CAST(NULLIF(RTRIM(LTRIM({cleaned})),'') AS FLOAT) AS {decimal})\n\
             \t\tELSE CAST(NULLIF(RTRIM(LTRIM({cleaned})),'') AS {decimal})\n\
             \t\tEND"
        )
    } else {
        format!("CAST(NULLIF(RTRIM(LTRIM({cleaned})),'') AS {decimal})")
    };
    Ok(expr)
}
