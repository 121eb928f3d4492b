//! Bulk-copy loader for the target store
//!
//! Streams typed rows into a named table with `COPY ... FROM STDIN`, CSV
//! encoded, header omitted, `\N` as the NULL sentinel. Every invocation opens
//! its own dedicated connection so concurrent loads never share a transaction
//! or cursor.
//!
//! A uniqueness violation means the target already holds this batch's keys;
//! that outcome is reported to the caller as [`CopyOutcome::Duplicate`]
//! rather than raised, so a re-run of the same batch stays non-fatal.

use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::{debug, warn};

use crate::error::{EtlError, Result};

/// Default bulk-copy chunk size in bytes.
///
/// Serialization flushes to the wire whenever the buffer reaches this size,
/// so memory use stays bounded independent of batch row count.
pub const DEFAULT_COPY_CHUNK_BYTES: usize = 65_536;

/// NULL sentinel in the copy stream; a quoted `"\N"` stays a literal value.
const NULL_SENTINEL: &str = "\\N";

/// Fully qualified target table (schema + table name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// `schema.table` form used in COPY statements and log events
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// A row that can serialize itself into one CSV record of a copy stream
pub trait CopyRow {
    /// Column names, in the exact order `encode` writes the fields
    const COLUMNS: &'static [&'static str];

    /// Append this row as one CSV record, including the record terminator
    fn encode(&self, buf: &mut String);
}

/// Result of one table load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// All rows landed; `rows` is the server-reported copied count
    Loaded { rows: u64 },
    /// The target rejected the batch as already present; nothing was
    /// re-attempted
    Duplicate { attempted: usize },
}

/// Append one text field, quoting only when the value requires it.
///
/// An unquoted field equal to the NULL sentinel would be read back as NULL,
/// so that exact value is always quoted.
pub(crate) fn push_text(buf: &mut String, value: &str) {
    if value == NULL_SENTINEL || value.contains(['"', ',', '\n', '\r']) {
        buf.push('"');
        for c in value.chars() {
            if c == '"' {
                buf.push('"');
            }
            buf.push(c);
        }
        buf.push('"');
    } else {
        buf.push_str(value);
    }
}

/// Append an optional text field, writing the NULL sentinel for `None`
pub(crate) fn push_opt_text(buf: &mut String, value: Option<&str>) {
    match value {
        Some(v) => push_text(buf, v),
        None => buf.push_str(NULL_SENTINEL),
    }
}

fn copy_statement(target: &TableRef, columns: &[&str]) -> String {
    let column_list = columns
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT CSV, NULL '\\N')",
        target.qualified(),
        column_list
    )
}

/// Translate a driver error into the pipeline taxonomy for one table load
fn classify(err: sqlx::Error, target: &TableRef) -> EtlError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => EtlError::DuplicateLoad {
            table: target.qualified(),
        },
        _ => EtlError::Database(err),
    }
}

/// Bulk-copy `rows` into `target` over a dedicated connection.
///
/// Zero rows is a completed no-op load. A uniqueness conflict is logged and
/// returned as [`CopyOutcome::Duplicate`]; any other failure is fatal for
/// this table load and propagates to the caller.
pub async fn copy_rows<R: CopyRow>(
    database_url: &str,
    target: &TableRef,
    rows: &[R],
    chunk_bytes: usize,
) -> Result<CopyOutcome> {
    let mut conn = PgConnection::connect(database_url).await?;
    let result = run_copy(&mut conn, target, rows, chunk_bytes).await;
    conn.close().await.ok();

    match result {
        Ok(copied) => Ok(CopyOutcome::Loaded { rows: copied }),
        Err(EtlError::DuplicateLoad { table }) => {
            warn!(
                table = %table,
                rows_attempted = rows.len(),
                "Duplicate load: batch keys already present, skipping table"
            );
            Ok(CopyOutcome::Duplicate {
                attempted: rows.len(),
            })
        },
        Err(err) => Err(err),
    }
}

async fn run_copy<R: CopyRow>(
    conn: &mut PgConnection,
    target: &TableRef,
    rows: &[R],
    chunk_bytes: usize,
) -> Result<u64> {
    let statement = copy_statement(target, R::COLUMNS);
    debug!(table = %target, rows = rows.len(), "Starting bulk copy");

    let mut copy = conn
        .copy_in_raw(&statement)
        .await
        .map_err(|e| classify(e, target))?;

    let mut buffer = String::with_capacity(chunk_bytes.min(1 << 20) + 256);
    for row in rows {
        row.encode(&mut buffer);
        if buffer.len() >= chunk_bytes {
            if let Err(e) = copy.send(buffer.as_bytes()).await {
                return Err(classify(e, target));
            }
            buffer.clear();
        }
    }

    if !buffer.is_empty() {
        if let Err(e) = copy.send(buffer.as_bytes()).await {
            return Err(classify(e, target));
        }
    }

    let copied = copy.finish().await.map_err(|e| classify(e, target))?;
    debug!(table = %target, rows = copied, "Bulk copy finished");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoteRow {
        id: i64,
        note: Option<String>,
    }

    impl CopyRow for NoteRow {
        const COLUMNS: &'static [&'static str] = &["id", "note"];

        fn encode(&self, buf: &mut String) {
            buf.push_str(&self.id.to_string());
            buf.push(',');
            push_opt_text(buf, self.note.as_deref());
            buf.push('\n');
        }
    }

    fn encoded(row: NoteRow) -> String {
        let mut buf = String::new();
        row.encode(&mut buf);
        buf
    }

    #[test]
    fn test_copy_statement_names_columns() {
        let target = TableRef::new("dds", "h_users");
        assert_eq!(
            copy_statement(&target, &["user_id", "user_id_hash"]),
            "COPY dds.h_users (\"user_id\", \"user_id_hash\") FROM STDIN WITH (FORMAT CSV, NULL '\\N')"
        );
    }

    #[test]
    fn test_plain_values_unquoted() {
        let row = NoteRow {
            id: 7,
            note: Some("plain text".to_string()),
        };
        assert_eq!(encoded(row), "7,plain text\n");
    }

    #[test]
    fn test_null_sentinel_for_none() {
        let row = NoteRow { id: 7, note: None };
        assert_eq!(encoded(row), "7,\\N\n");
    }

    #[test]
    fn test_literal_sentinel_value_is_quoted() {
        let row = NoteRow {
            id: 7,
            note: Some("\\N".to_string()),
        };
        assert_eq!(encoded(row), "7,\"\\N\"\n");
    }

    #[test]
    fn test_separator_and_quote_escaping() {
        let row = NoteRow {
            id: 7,
            note: Some("a,b \"c\"\nd".to_string()),
        };
        assert_eq!(encoded(row), "7,\"a,b \"\"c\"\"\nd\"\n");
    }

    #[test]
    fn test_table_ref_display() {
        let target = TableRef::new("stg", "raw_test_data");
        assert_eq!(target.to_string(), "stg.raw_test_data");
        assert_eq!(target.qualified(), "stg.raw_test_data");
    }
}
