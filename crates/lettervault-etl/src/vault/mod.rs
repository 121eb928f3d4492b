//! Vault layer: transform the staging snapshot into the Data Vault model
//!
//! One batch end to end: read the full staging snapshot, derive the key
//! digests, project the four tables, then run the four bulk copies
//! concurrently on one task. Table loads are independent: there is no
//! cross-table transaction, a fatal error in one load never cancels the
//! siblings, and the batch completes once all four settle.

pub mod project;

use futures::future::{join_all, BoxFuture};
use tracing::{error, info};

use crate::config::Config;
use crate::copy::{self, CopyOutcome, CopyRow, TableRef};
use crate::db;
use crate::error::Result;
use crate::vault::project::TableSet;

/// Outcome of one table load within a batch
#[derive(Debug)]
pub struct TableLoad {
    pub table: String,
    pub outcome: Result<CopyOutcome>,
}

impl TableLoad {
    /// A load is fatal only when it errored; a duplicate outcome is a
    /// completed load.
    pub fn is_fatal(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Per-table results of one vault batch
#[derive(Debug)]
pub struct BatchReport {
    pub loads: Vec<TableLoad>,
}

impl BatchReport {
    pub fn fatal_count(&self) -> usize {
        self.loads.iter().filter(|l| l.is_fatal()).count()
    }

    pub fn table_count(&self) -> usize {
        self.loads.len()
    }
}

/// Drives one batch from the staging snapshot into the vault tables
pub struct VaultLoader {
    database_url: String,
    staging: TableRef,
    hub_users: TableRef,
    hub_letters: TableRef,
    satellite_letters: TableRef,
    link_posts: TableRef,
    chunk_bytes: usize,
}

impl VaultLoader {
    pub fn new(config: &Config) -> Self {
        let vault = &config.vault;
        Self {
            database_url: config.database.url.clone(),
            staging: TableRef::new(&config.staging.schema, &config.staging.table),
            hub_users: TableRef::new(&vault.schema, &vault.hub_users),
            hub_letters: TableRef::new(&vault.schema, &vault.hub_letters),
            satellite_letters: TableRef::new(&vault.schema, &vault.satellite_letters),
            link_posts: TableRef::new(&vault.schema, &vault.link_posts),
            chunk_bytes: config.database.copy_chunk_bytes,
        }
    }

    /// Run one full batch: fetch the staging snapshot, enrich, project, load
    /// all four tables.
    ///
    /// Fetch and transform errors abort the batch before any load starts.
    /// Once loading begins the batch always completes; per-table failures
    /// are reported in the returned [`BatchReport`].
    pub async fn run(&self) -> Result<BatchReport> {
        let raw = db::fetch_staged(&self.database_url, &self.staging).await?;
        info!(rows = raw.len(), "Staged snapshot fetched");

        let enriched = project::enrich(raw);
        let tables = project::project(&enriched);

        Ok(self.load(tables).await)
    }

    /// Launch the four table loads concurrently and wait for all of them
    async fn load(&self, tables: TableSet) -> BatchReport {
        let loads: Vec<BoxFuture<'_, TableLoad>> = vec![
            Box::pin(self.load_table(self.hub_users.clone(), tables.hub_users)),
            Box::pin(self.load_table(self.hub_letters.clone(), tables.hub_letters)),
            Box::pin(self.load_table(self.satellite_letters.clone(), tables.satellite_letters)),
            Box::pin(self.load_table(self.link_posts.clone(), tables.link_posts)),
        ];

        let report = BatchReport {
            loads: join_all(loads).await,
        };
        info!(
            tables = report.table_count(),
            failed = report.fatal_count(),
            "Vault batch settled"
        );
        report
    }

    async fn load_table<R>(&self, target: TableRef, rows: Vec<R>) -> TableLoad
    where
        R: CopyRow + Send + Sync,
    {
        let result = copy::copy_rows(&self.database_url, &target, &rows, self.chunk_bytes).await;
        match &result {
            Ok(CopyOutcome::Loaded { rows }) => {
                info!(table = %target, rows, "Table load complete");
            },
            // the duplicate warning is emitted by copy_rows
            Ok(CopyOutcome::Duplicate { .. }) => {},
            Err(err) => error!(table = %target, error = %err, "Table load failed"),
        }
        TableLoad {
            table: target.qualified(),
            outcome: result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;

    fn load(table: &str, outcome: Result<CopyOutcome>) -> TableLoad {
        TableLoad {
            table: table.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_duplicate_is_not_fatal() {
        let report = BatchReport {
            loads: vec![
                load("dds.h_users", Ok(CopyOutcome::Loaded { rows: 10 })),
                load("dds.h_letters", Ok(CopyOutcome::Duplicate { attempted: 100 })),
            ],
        };
        assert_eq!(report.fatal_count(), 0);
        assert_eq!(report.table_count(), 2);
    }

    #[test]
    fn test_fatal_load_is_counted() {
        let report = BatchReport {
            loads: vec![
                load("dds.h_users", Ok(CopyOutcome::Loaded { rows: 10 })),
                load("dds.l_posts", Err(EtlError::config("connection refused"))),
            ],
        };
        assert_eq!(report.fatal_count(), 1);
        assert!(report.loads[1].is_fatal());
    }
}
