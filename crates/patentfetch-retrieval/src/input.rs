//! Identifier list loading.
//!
//! Supported inputs:
//! - `.csv` / `.tsv`: the column whose header matches the configured name
//!   (default `Display Key`), as exported from a spreadsheet.
//! - anything else: plain text, one identifier per line.
//!
//! Blank cells and lines are dropped. Any failure here is fatal for the batch.

use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::InputError;

/// Read identifiers from `path`, picking the format from its extension.
pub fn read_identifiers(path: &Path, column: &str) -> Result<Vec<String>, InputError> {
    let file = std::fs::File::open(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let ids = match ext.as_deref() {
        Some("csv") => identifiers_from_csv(file, column, b',')?,
        Some("tsv") => identifiers_from_csv(file, column, b'\t')?,
        _ => identifiers_from_lines(file).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?,
    };

    if ids.is_empty() {
        return Err(InputError::Empty { path: path.to_path_buf() });
    }

    info!("Found {} patent numbers in {}", ids.len(), path.display());
    Ok(ids)
}

/// Values of `column` from delimited text with a header row.
pub fn identifiers_from_csv<R: Read>(
    reader: R,
    column: &str,
    delimiter: u8,
) -> Result<Vec<String>, InputError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    debug!(columns = ?headers, "Input columns");

    let Some(idx) = headers.iter().position(|h| h == column.trim()) else {
        return Err(InputError::MissingColumn { column: column.to_string(), available: headers });
    };

    let mut ids = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(value) = record.get(idx) {
            if !value.trim().is_empty() {
                ids.push(value.to_string());
            }
        }
    }
    Ok(ids)
}

/// One identifier per non-blank line. `#` starts a comment line.
pub fn identifiers_from_lines<R: Read>(mut reader: R) -> std::io::Result<Vec<String>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    Ok(content
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .map(String::from)
        .collect())
}
