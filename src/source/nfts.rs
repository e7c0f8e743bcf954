//! Legacy NFT export (`glry-nfts.csv`).
//!
//! Unlike the users export, a bad NFT row never stops the run. Rows that do
//! not fit the header, cannot be decoded, or carry an unparseable
//! `position`/`hidden` are turned into [`ErrorRecord`]s here; everything
//! else comes back as a typed [`LegacyNft`] for the ingestion stage.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{input_error, line_of, lossy_record, open, raw_row_doc, reader_builder, require_columns};
use crate::domain::legacy::parse_hidden_flag;
use crate::domain::{ErrorRecord, LegacyNft};
use crate::error::{MigrationError, RejectReason};

/// Columns the NFT export must carry.
pub const NFT_COLUMNS: [&str; 12] = [
    "user_id",
    "contract_address",
    "token_id",
    "name",
    "description",
    "external_url",
    "creator_address",
    "creator_opensea_name",
    "image_thumbnail_url",
    "image_preview_url",
    "position",
    "hidden",
];

/// An NFT row with every column still as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftRecord {
    /// Owning legacy user id.
    pub user_id: String,
    /// Token contract address.
    pub contract_address: String,
    /// Token id.
    pub token_id: String,
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// Project URL.
    pub external_url: String,
    /// Creator wallet address.
    pub creator_address: String,
    /// Creator marketplace username.
    pub creator_opensea_name: String,
    /// Cached thumbnail URL.
    pub image_thumbnail_url: String,
    /// Cached preview URL.
    pub image_preview_url: String,
    /// Display position, integer text.
    pub position: String,
    /// Hidden flag, boolean text.
    pub hidden: String,
}

impl NftRecord {
    /// Parses the typed columns.
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason::InvalidField`] when `position` is not an
    /// integer or `hidden` is not a boolean.
    pub fn into_legacy(self) -> Result<LegacyNft, RejectReason> {
        let Ok(position) = self.position.trim().parse::<i64>() else {
            return Err(RejectReason::InvalidField {
                field: "position",
                value: self.position,
            });
        };
        let Some(hidden) = parse_hidden_flag(&self.hidden) else {
            return Err(RejectReason::InvalidField {
                field: "hidden",
                value: self.hidden,
            });
        };

        Ok(LegacyNft {
            user_id: self.user_id.trim().to_string(),
            contract_address: self.contract_address.trim().to_string(),
            token_id: self.token_id.trim().to_string(),
            name: self.name,
            description: self.description,
            external_url: self.external_url,
            creator_address: self.creator_address,
            creator_name: self.creator_opensea_name,
            image_thumbnail_url: self.image_thumbnail_url,
            image_preview_url: self.image_preview_url,
            position,
            hidden,
        })
    }
}

/// Result of reading the NFT export.
#[derive(Debug, Default)]
pub struct NftExport {
    /// Rows that parsed, in file order.
    pub rows: Vec<LegacyNft>,
    /// Rows rejected while reading.
    pub rejected: Vec<ErrorRecord>,
}

impl NftExport {
    fn reject(&mut self, line: u64, doc: &impl Serialize, reason: &RejectReason) {
        tracing::warn!(line, category = reason.category(), error = %reason, "skipping nft row");
        self.rejected.push(ErrorRecord::new(doc, reason));
    }
}

/// Reads the NFT export at `path`.
///
/// # Errors
///
/// Returns [`MigrationError::Input`] if the file cannot be read and
/// [`MigrationError::MissingColumn`] if the header lacks a required column.
/// Individual bad rows are not errors; they land in
/// [`NftExport::rejected`].
pub fn read_nfts(path: &Path) -> Result<NftExport, MigrationError> {
    parse_nfts(open(path)?, path)
}

/// Reads the NFT export from `input`. `origin` only labels errors.
///
/// # Errors
///
/// Same as [`read_nfts`].
pub fn parse_nfts<R: Read>(input: R, origin: &Path) -> Result<NftExport, MigrationError> {
    let mut reader = reader_builder().from_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| input_error(origin, e))?
        .clone();
    require_columns(&headers, &NFT_COLUMNS, origin)?;

    let mut export = NftExport::default();
    for (index, result) in reader.byte_records().enumerate() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) if e.is_io_error() => return Err(input_error(origin, e)),
            Err(e) => {
                let line = line_of(e.position(), index);
                let reason = RejectReason::Unreadable(e.to_string());
                export.reject(line, &serde_json::json!({ "line": line }), &reason);
                continue;
            }
        };
        let line = line_of(raw.position(), index);

        let record = match csv::StringRecord::from_byte_record(raw) {
            Ok(record) => record,
            Err(e) => {
                let reason = RejectReason::Unreadable(e.utf8_error().to_string());
                let lossy = lossy_record(&e.into_byte_record());
                export.reject(line, &raw_row_doc(&headers, &lossy), &reason);
                continue;
            }
        };

        if record.len() != headers.len() {
            let reason = RejectReason::SchemaMismatch {
                expected: headers.len(),
                found: record.len(),
            };
            export.reject(line, &raw_row_doc(&headers, &record), &reason);
            continue;
        }

        let parsed = match record.deserialize::<NftRecord>(Some(&headers)) {
            Ok(parsed) => parsed,
            Err(e) => {
                let reason = RejectReason::Unreadable(e.to_string());
                export.reject(line, &raw_row_doc(&headers, &record), &reason);
                continue;
            }
        };

        match parsed.clone().into_legacy() {
            Ok(nft) => export.rows.push(nft),
            Err(reason) => export.reject(line, &parsed, &reason),
        }
    }

    tracing::info!(
        path = %origin.display(),
        rows = export.rows.len(),
        rejected = export.rejected.len(),
        "read nfts export"
    );
    Ok(export)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    const HEADER: &str = "user_id,contract_address,token_id,name,description,external_url,\
creator_address,creator_opensea_name,image_thumbnail_url,image_preview_url,position,hidden\n";

    fn parse_bytes(input: &[u8]) -> NftExport {
        let Ok(export) = parse_nfts(input, Path::new("glry-nfts.csv")) else {
            panic!("export should parse");
        };
        export
    }

    fn parse(body: &str) -> NftExport {
        parse_bytes(format!("{HEADER}{body}").as_bytes())
    }

    fn first_rejection(export: &NftExport) -> &ErrorRecord {
        let Some(record) = export.rejected.first() else {
            panic!("expected a rejection");
        };
        record
    }

    #[test]
    fn parses_typed_columns() {
        let row = "1,0xC0,42,Punk,desc,https://x.io,0xCR,maker,thumb,preview,7,t\n";
        let export = parse(row);
        assert!(export.rejected.is_empty());
        let Some(nft) = export.rows.first() else {
            panic!("expected one row");
        };
        assert_eq!(nft.user_id, "1");
        assert_eq!(nft.token_id, "42");
        assert_eq!(nft.creator_name, "maker");
        assert_eq!(nft.position, 7);
        assert!(nft.hidden);
    }

    #[test]
    fn overflowing_row_is_rejected_not_truncated() {
        let export = parse(
            "1,0xC0,42,Punk,\"a, b\",url,0xCR,maker,thumb,preview,0,f\n\
             1,0xC0,43,Punk,a, b,url,0xCR,maker,thumb,preview,1,f\n",
        );
        assert_eq!(export.rows.len(), 1);
        assert_eq!(export.rejected.len(), 1);
        let record = first_rejection(&export);
        let expected = "schema mismatch: expected 12 fields, found 13";
        assert_eq!(record.error, expected);
        assert_eq!(record.doc.get("token_id"), Some(&json!("43")));
        assert_eq!(record.doc.get("_overflow"), Some(&json!(["f"])));
    }

    #[test]
    fn invalid_utf8_row_keeps_its_fields() {
        let mut input = HEADER.as_bytes().to_vec();
        input.extend_from_slice(b"1,0xC0,42,Pun\xffk,,,,,,,0,f\n");
        input.extend_from_slice(b"1,0xC0,43,Fine,,,,,,,1,f\n");

        let export = parse_bytes(&input);

        assert_eq!(export.rows.len(), 1);
        let record = first_rejection(&export);
        assert!(record.error.starts_with("unreadable row"));
        assert_eq!(record.doc.get("user_id"), Some(&json!("1")));
        assert_eq!(record.doc.get("contract_address"), Some(&json!("0xC0")));
        assert_eq!(record.doc.get("token_id"), Some(&json!("42")));
        assert_eq!(record.doc.get("name"), Some(&json!("Pun\u{fffd}k")));
    }

    #[test]
    fn padded_header_still_maps_columns() {
        let header = "user_id, contract_address, token_id, name, description, external_url, \
creator_address, creator_opensea_name, image_thumbnail_url, image_preview_url, position, hidden\n";
        let input = format!("{header}1,0xC0,42,Punk,,,,,,,3,f\n");

        let export = parse_bytes(input.as_bytes());

        assert!(export.rejected.is_empty());
        let Some(nft) = export.rows.first() else {
            panic!("expected one row");
        };
        assert_eq!(nft.contract_address, "0xC0");
        assert_eq!(nft.position, 3);
    }

    #[test]
    fn non_integer_position_is_rejected() {
        let export = parse(
            "1,0xC0,42,Punk,,,,,,,first,f\n\
             1,0xC0,43,Punk,,,,,,,2,f\n",
        );
        assert_eq!(export.rows.len(), 1);
        let record = first_rejection(&export);
        assert!(record.error.contains("position"));
        assert_eq!(record.doc.get("position"), Some(&json!("first")));
    }

    #[test]
    fn empty_contract_passes_reader_for_ingest_validation() {
        let export = parse("1,,42,Punk,,,,,,,0,\n");
        assert_eq!(export.rows.len(), 1);
        let Some(nft) = export.rows.first() else {
            panic!("expected one row");
        };
        assert!(nft.contract_address.is_empty());
        assert!(!nft.hidden);
    }

    #[test]
    fn missing_position_column_is_fatal() {
        let result = parse_nfts(
            "user_id,contract_address,token_id\n1,0xC0,1\n".as_bytes(),
            Path::new("glry-nfts.csv"),
        );
        assert!(matches!(result, Err(MigrationError::MissingColumn { .. })));
    }
}
