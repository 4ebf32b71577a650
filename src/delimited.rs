//! CSV reader/writer for the tabular file.
//!
//! RFC 4180: values containing `,`, `"`, or newlines are wrapped in
//! double-quotes with internal `"` doubled. The writer emits cells into
//! a pre-allocated byte buffer; the reader is the inverse state machine
//! and is strict — a stray quote or a record with the wrong number of
//! fields is a fatal [`TransformError::Tabular`], since such a record
//! cannot be attributed to an entity.

use crate::error::TransformError;
use crate::rows::{COLUMNS, Row};

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write a cell with RFC 4180 escaping.
fn write_cell(out: &mut Vec<u8>, cell: &[u8]) {
    let needs_quoting = cell
        .iter()
        .any(|&b| b == b',' || b == b'"' || b == b'\n' || b == b'\r');
    if !needs_quoting {
        out.extend_from_slice(cell);
        return;
    }
    out.push(b'"');
    for &b in cell {
        if b == b'"' {
            out.push(b'"');
        }
        out.push(b);
    }
    out.push(b'"');
}

/// Serialize the header plus one line per row. Output is byte-exact for
/// a given row set.
pub fn write_rows(rows: &[Row]) -> Vec<u8> {
    let mut out = Vec::with_capacity((rows.len() + 1) * COLUMNS.len() * 12);
    for (i, column) in COLUMNS.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        out.extend_from_slice(column.as_bytes());
    }
    out.push(b'\n');
    for row in rows {
        for (i, cell) in row.cells().iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            write_cell(&mut out, cell.as_bytes());
        }
        out.push(b'\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn parse_records(content: &str) -> Result<Vec<Vec<String>>, TransformError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => {
                if field.is_empty() && !field_was_quoted {
                    in_quotes = true;
                    field_was_quoted = true;
                } else {
                    return Err(TransformError::Tabular(format!(
                        "stray quote in record {}",
                        records.len() + 1
                    )));
                }
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_was_quoted = false;
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
                field_was_quoted = false;
            }
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
                field_was_quoted = false;
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(TransformError::Tabular(
            "unterminated quoted field at end of file".to_string(),
        ));
    }
    if !field.is_empty() || !record.is_empty() || field_was_quoted {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

/// Parse the tabular file: validate the header against the fixed column
/// set, then build one [`Row`] per record.
pub fn read_rows(content: &str) -> Result<Vec<Row>, TransformError> {
    let mut records = parse_records(content)?.into_iter();
    let header = records
        .next()
        .ok_or_else(|| TransformError::Tabular("empty tabular file".to_string()))?;
    if header != COLUMNS {
        return Err(TransformError::Tabular(format!(
            "unexpected header: expected the {} fixed columns starting with {:?}, found {:?}",
            COLUMNS.len(),
            COLUMNS[0],
            header.first().map(String::as_str).unwrap_or("")
        )));
    }

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        let row = Row::from_cells(record)
            .map_err(|reason| TransformError::Tabular(format!("record {}: {reason}", index + 1)))?;
        rows.push(row);
    }
    Ok(rows)
}
