//! Connection helpers for the target store
//!
//! Every database operation runs on a scoped, dedicated connection: acquired
//! at the start of the operation, committed on success, rolled back on
//! failure, closed on every exit path. Bulk copies never share a connection
//! with each other or with the staging read.

use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::debug;

use crate::copy::TableRef;
use crate::error::Result;
use crate::model::RawRecord;

/// Open a dedicated connection to the target store
pub async fn connect(url: &str) -> Result<PgConnection> {
    Ok(PgConnection::connect(url).await?)
}

/// Fetch the full staging snapshot in one blocking query.
///
/// The read runs inside a single transaction: committed after the fetch,
/// rolled back on failure.
pub async fn fetch_staged(url: &str, staging: &TableRef) -> Result<Vec<RawRecord>> {
    let mut conn = connect(url).await?;
    let sql = format!(
        "SELECT user_id, id, title, body FROM {}",
        staging.qualified()
    );

    debug!(table = %staging, "Fetching staged snapshot");
    let mut tx = conn.begin().await?;
    let result = sqlx::query_as::<_, RawRecord>(&sql).fetch_all(&mut *tx).await;

    let outcome = match result {
        Ok(records) => tx.commit().await.map(|_| records).map_err(Into::into),
        Err(err) => {
            tx.rollback().await.ok();
            Err(err.into())
        },
    };

    conn.close().await.ok();
    outcome
}
