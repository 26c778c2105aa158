use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

/// One data line of a source table, keyed by the verbatim header strings
/// (bracket-decorated prefixes like `[>]` and `[h]` included).
pub type RawRow = HashMap<String, String>;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Reads a delimited export into ordered row records.
///
/// Rows shorter than the header are padded with empty fields, extra trailing
/// fields are dropped, and fully blank lines are skipped. A leading UTF-8
/// byte-order mark is stripped before the header is parsed.
pub fn read_table(path: &Path) -> Result<Vec<RawRow>> {
    if !path.exists() {
        bail!("source file not found: {}", path.display());
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let data = raw.strip_prefix(UTF8_BOM).unwrap_or(&raw);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to parse header of {}", path.display()))?
        .iter()
        .map(ToOwned::to_owned)
        .collect();

    if headers.is_empty() {
        bail!("no header row in {}", path.display());
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("malformed row {} in {}", index + 2, path.display()))?;

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let mut row = RawRow::with_capacity(headers.len());
        for (column, header) in headers.iter().enumerate() {
            row.insert(
                header.clone(),
                record.get(column).unwrap_or_default().to_owned(),
            );
        }
        rows.push(row);
    }

    info!(path = %path.display(), rows = rows.len(), "parsed source table");

    Ok(rows)
}

/// Field accessor tolerant of missing columns; absent keys read as empty.
pub fn field<'a>(row: &'a RawRow, key: &str) -> &'a str {
    row.get(key).map(String::as_str).unwrap_or_default()
}
