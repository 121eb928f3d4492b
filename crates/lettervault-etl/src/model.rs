//! Typed row shapes for the staging snapshot and the vault projections
//!
//! Explicit structs instead of per-row column-name lookups, so the column set
//! of every target table is checked at compile time. Each row type encodes
//! itself for bulk copy in the exact order its `COLUMNS` list names.

use serde::Deserialize;
use sqlx::FromRow;

use lettervault_common::hash_business_key;

use crate::copy::{push_opt_text, push_text, CopyRow};

/// One source record, exactly as landed in staging.
///
/// The feed carries camelCase `userId`; staging and everything downstream use
/// `user_id`. Title and body are nullable through the wire and round-trip
/// through the NULL sentinel on bulk copy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, FromRow)]
pub struct RawRecord {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// A staged record plus the derived business-key digests.
///
/// The digests are pure functions of the keys, so hubs and links stay
/// joinable by digest alone across batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    pub user_id: i64,
    pub letter_id: i64,
    pub title: Option<String>,
    pub body: Option<String>,
    pub user_id_hash: String,
    pub letter_id_hash: String,
}

impl EnrichedRecord {
    pub fn from_raw(raw: RawRecord) -> Self {
        Self {
            user_id_hash: hash_business_key(raw.user_id),
            letter_id_hash: hash_business_key(raw.id),
            user_id: raw.user_id,
            letter_id: raw.id,
            title: raw.title,
            body: raw.body,
        }
    }
}

/// Users hub row: one per distinct user business key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubUserRow {
    pub user_id: i64,
    pub user_id_hash: String,
}

/// Letters hub row: one per staged record, not deduplicated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubLetterRow {
    pub letter_id: i64,
    pub letter_id_hash: String,
}

/// Letters satellite row: descriptive attributes keyed by the letter digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatelliteLetterRow {
    pub letter_id_hash: String,
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Posts link row: the user-to-letter relationship, by digest pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPostRow {
    pub user_id_hash: String,
    pub letter_id_hash: String,
}

impl CopyRow for RawRecord {
    const COLUMNS: &'static [&'static str] = &["user_id", "id", "title", "body"];

    fn encode(&self, buf: &mut String) {
        buf.push_str(&self.user_id.to_string());
        buf.push(',');
        buf.push_str(&self.id.to_string());
        buf.push(',');
        push_opt_text(buf, self.title.as_deref());
        buf.push(',');
        push_opt_text(buf, self.body.as_deref());
        buf.push('\n');
    }
}

impl CopyRow for HubUserRow {
    const COLUMNS: &'static [&'static str] = &["user_id", "user_id_hash"];

    fn encode(&self, buf: &mut String) {
        buf.push_str(&self.user_id.to_string());
        buf.push(',');
        push_text(buf, &self.user_id_hash);
        buf.push('\n');
    }
}

impl CopyRow for HubLetterRow {
    const COLUMNS: &'static [&'static str] = &["letter_id", "letter_id_hash"];

    fn encode(&self, buf: &mut String) {
        buf.push_str(&self.letter_id.to_string());
        buf.push(',');
        push_text(buf, &self.letter_id_hash);
        buf.push('\n');
    }
}

impl CopyRow for SatelliteLetterRow {
    const COLUMNS: &'static [&'static str] = &["letter_id_hash", "title", "body"];

    fn encode(&self, buf: &mut String) {
        push_text(buf, &self.letter_id_hash);
        buf.push(',');
        push_opt_text(buf, self.title.as_deref());
        buf.push(',');
        push_opt_text(buf, self.body.as_deref());
        buf.push('\n');
    }
}

impl CopyRow for LinkPostRow {
    const COLUMNS: &'static [&'static str] = &["user_id_hash", "letter_id_hash"];

    fn encode(&self, buf: &mut String) {
        push_text(buf, &self.user_id_hash);
        buf.push(',');
        push_text(buf, &self.letter_id_hash);
        buf.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_field_mapping() {
        let record: RawRecord = serde_json::from_str(
            r#"{"userId": 1, "id": 10, "title": "A", "body": "x"}"#,
        )
        .unwrap();
        assert_eq!(record.user_id, 1);
        assert_eq!(record.id, 10);
        assert_eq!(record.title.as_deref(), Some("A"));
    }

    #[test]
    fn test_missing_attributes_deserialize_as_null() {
        let record: RawRecord = serde_json::from_str(r#"{"userId": 1, "id": 10}"#).unwrap();
        assert_eq!(record.title, None);
        assert_eq!(record.body, None);
    }

    #[test]
    fn test_enrichment_hashes_both_keys() {
        let enriched = EnrichedRecord::from_raw(RawRecord {
            user_id: 1,
            id: 10,
            title: Some("A".to_string()),
            body: Some("x".to_string()),
        });
        assert_eq!(enriched.user_id_hash, hash_business_key(1));
        assert_eq!(enriched.letter_id_hash, hash_business_key(10));
        assert_eq!(enriched.user_id_hash.len(), 32);
    }

    #[test]
    fn test_raw_record_encoding_with_nulls() {
        let record = RawRecord {
            user_id: 1,
            id: 10,
            title: None,
            body: Some("x".to_string()),
        };
        let mut buf = String::new();
        record.encode(&mut buf);
        assert_eq!(buf, "1,10,\\N,x\n");
    }
}
