//! Readers for the legacy CSV exports.
//!
//! Both exports are read with a flexible `csv` reader so that rows with
//! more (or fewer) fields than the header are observed instead of being
//! rejected by the parser. What happens to such a row depends on the file:
//! a bad user row is fatal, a bad NFT row is logged and skipped. Header
//! names are trimmed, so `user_id, contract_address` still matches.

pub mod nfts;
pub mod users;

pub use nfts::{NftExport, read_nfts};
pub use users::read_users;

use std::path::Path;

use crate::error::MigrationError;

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers);
    builder
}

fn input_error(origin: &Path, source: csv::Error) -> MigrationError {
    MigrationError::Input {
        path: origin.to_path_buf(),
        source,
    }
}

fn open(path: &Path) -> Result<std::fs::File, MigrationError> {
    std::fs::File::open(path).map_err(|e| input_error(path, e.into()))
}

/// Fails if any of `required` is absent from `headers`.
fn require_columns(
    headers: &csv::StringRecord,
    required: &[&'static str],
    origin: &Path,
) -> Result<(), MigrationError> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(MigrationError::MissingColumn {
                path: origin.to_path_buf(),
                column,
            });
        }
    }
    Ok(())
}

/// Line number of a record, falling back to its index when the reader did
/// not track a position. The header is line 1.
fn line_of(position: Option<&csv::Position>, index: usize) -> u64 {
    position.map_or_else(
        || u64::try_from(index).unwrap_or(u64::MAX).saturating_add(2),
        csv::Position::line,
    )
}

/// Decodes every field of a raw row, replacing invalid UTF-8 with U+FFFD.
fn lossy_record(raw: &csv::ByteRecord) -> csv::StringRecord {
    raw.iter().map(String::from_utf8_lossy).collect()
}

/// Renders a row that does not fit the header as a JSON object: named
/// fields first, anything past the last header under `_overflow`.
fn raw_row_doc(headers: &csv::StringRecord, record: &csv::StringRecord) -> serde_json::Value {
    let mut doc = serde_json::Map::new();
    for (name, value) in headers.iter().zip(record.iter()) {
        doc.insert(name.to_string(), serde_json::Value::from(value));
    }
    let overflow: Vec<serde_json::Value> = record
        .iter()
        .skip(headers.len())
        .map(serde_json::Value::from)
        .collect();
    if !overflow.is_empty() {
        doc.insert("_overflow".to_string(), serde_json::Value::Array(overflow));
    }
    serde_json::Value::Object(doc)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn raw_row_doc_keeps_overflow_fields() {
        let headers = csv::StringRecord::from(vec!["a", "b"]);
        let record = csv::StringRecord::from(vec!["1", "2", "3", "4"]);
        assert_eq!(
            raw_row_doc(&headers, &record),
            serde_json::json!({ "a": "1", "b": "2", "_overflow": ["3", "4"] })
        );
    }

    #[test]
    fn raw_row_doc_short_row_has_no_overflow() {
        let headers = csv::StringRecord::from(vec!["a", "b"]);
        let record = csv::StringRecord::from(vec!["1"]);
        let doc = raw_row_doc(&headers, &record);
        assert_eq!(doc, serde_json::json!({ "a": "1" }));
    }

    #[test]
    fn lossy_record_keeps_valid_fields() {
        let raw = csv::ByteRecord::from(vec![b"0xC0".as_slice(), b"Pun\xffk".as_slice()]);
        let record = lossy_record(&raw);
        assert_eq!(record.get(0), Some("0xC0"));
        assert_eq!(record.get(1), Some("Pun\u{fffd}k"));
    }

    #[test]
    fn padded_header_names_are_trimmed() {
        let input = "id , username\n1,alice\n";
        let mut reader = reader_builder().from_reader(input.as_bytes());
        let Ok(headers) = reader.headers() else {
            panic!("headers should parse");
        };
        let checked = require_columns(headers, &["id", "username"], Path::new("u.csv"));
        assert!(checked.is_ok());
    }

    #[test]
    fn missing_column_is_reported() {
        let headers = csv::StringRecord::from(vec!["id", "username"]);
        let result = require_columns(&headers, &["id", "wallet_address"], Path::new("u.csv"));
        assert!(matches!(
            result,
            Err(MigrationError::MissingColumn {
                column: "wallet_address",
                ..
            })
        ));
    }
}
