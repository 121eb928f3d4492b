//! Staging layer: land the source feed unmodified
//!
//! Downloads the full batch from the HTTP source and bulk-copies it into the
//! staging table. No transformation happens here beyond field naming; the
//! staging table is the raw snapshot the vault layer reads.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::config::{Config, SourceConfig};
use crate::copy::{copy_rows, CopyOutcome, TableRef};
use crate::error::{EtlError, Result};
use crate::model::RawRecord;

/// Loads the source feed into the staging table in raw form
pub struct StagingLoader {
    database_url: String,
    source: SourceConfig,
    target: TableRef,
    chunk_bytes: usize,
}

impl StagingLoader {
    pub fn new(config: &Config) -> Self {
        Self {
            database_url: config.database.url.clone(),
            source: config.source.clone(),
            target: TableRef::new(&config.staging.schema, &config.staging.table),
            chunk_bytes: config.database.copy_chunk_bytes,
        }
    }

    /// Download the full batch from the source feed.
    ///
    /// The whole batch is returned in one response; there is no pagination
    /// contract. A transport error or non-success status aborts the batch
    /// before anything is written.
    pub async fn fetch_posts(&self) -> Result<Vec<RawRecord>> {
        debug!(url = %self.source.url, "Downloading source batch");

        let client = Client::builder()
            .timeout(Duration::from_secs(self.source.timeout_secs))
            .build()
            .map_err(|e| EtlError::fetch(&self.source.url, e))?;

        let response = client
            .get(&self.source.url)
            .send()
            .await
            .map_err(|e| EtlError::fetch(&self.source.url, e))?;

        if !response.status().is_success() {
            return Err(EtlError::FetchStatus {
                url: self.source.url.clone(),
                status: response.status(),
            });
        }

        let records: Vec<RawRecord> = response
            .json()
            .await
            .map_err(|e| EtlError::fetch(&self.source.url, e))?;

        info!(rows = records.len(), "Source batch downloaded");
        Ok(records)
    }

    /// Land the batch in the staging table.
    pub async fn load(&self, records: &[RawRecord]) -> Result<CopyOutcome> {
        copy_rows(&self.database_url, &self.target, records, self.chunk_bytes).await
    }

    /// Run the full staging pass: fetch, then bulk copy.
    pub async fn run(&self) -> Result<()> {
        let records = self.fetch_posts().await?;
        if let CopyOutcome::Loaded { rows } = self.load(&records).await? {
            info!(table = %self.target, rows, "Staging load complete");
        }
        Ok(())
    }
}
