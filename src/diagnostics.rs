//! One-shot maintenance routines behind the `init_db`, `check_db` and
//! `probe_db` binaries.

use crate::errors::RemoteError;
use crate::models::{Counter, TributeRecord, TributeUpdate};
use crate::remote::TributeTable;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The table was empty; a zero row was inserted and the probe stopped.
    Seeded(TributeRecord),
    /// The candle count was bumped and read back.
    Verified {
        before: TributeRecord,
        after: TributeRecord,
    },
}

/// Creates the schema and reads the row back to confirm it.
pub async fn initialize<T: TributeTable>(table: &T) -> Result<TributeRecord, RemoteError> {
    let seeded = table.ensure_schema().await?;
    info!(id = %seeded.id, "tribute schema ready");

    let record = table.fetch_row().await?;
    log_record(&record);
    Ok(record)
}

pub async fn check<T: TributeTable>(table: &T) -> Result<TributeRecord, RemoteError> {
    info!("checking tribute table");
    let record = table.fetch_row().await?;
    log_record(&record);
    Ok(record)
}

/// Exercises the full read/write path against a live table.
pub async fn probe<T: TributeTable>(table: &T) -> Result<ProbeOutcome, RemoteError> {
    match table.ping().await? {
        Some(rows) => info!(rows, "connection ok"),
        None => info!("connection ok"),
    }

    let before = match table.fetch_row().await {
        Ok(record) => record,
        Err(RemoteError::NoRow) => {
            warn!("tribute table is empty, inserting seed row");
            let seeded = table.insert_seed().await?;
            info!(id = %seeded.id, "seed row inserted");
            return Ok(ProbeOutcome::Seeded(seeded));
        }
        Err(err) => return Err(err),
    };
    log_record(&before);

    let candles = before.candles.saturating_add(1);
    let updated = table
        .update_row(TributeUpdate::set(Counter::Candles, candles))
        .await?;
    info!(candles = updated.candles, "update accepted");

    let after = table.fetch_row().await?;
    if after.candles != candles {
        return Err(RemoteError::VerifyFailed {
            expected: candles,
            actual: after.candles,
        });
    }
    log_record(&after);

    Ok(ProbeOutcome::Verified { before, after })
}

fn log_record(record: &TributeRecord) {
    info!(
        candles = record.candles,
        flowers = record.flowers,
        updated_at = %record.updated_at,
        "current tribute counts"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryTable;

    #[tokio::test]
    async fn initialize_twice_leaves_one_zero_row() {
        let table = MemoryTable::new();
        let first = initialize(&table).await.unwrap();
        let second = initialize(&table).await.unwrap();

        assert_eq!(first, second);
        assert_eq!((second.candles, second.flowers), (0, 0));
        assert_eq!(table.row_count(), 1);
    }

    #[tokio::test]
    async fn check_requires_existing_table() {
        assert!(matches!(
            check(&MemoryTable::new()).await,
            Err(RemoteError::MissingTable)
        ));

        let record = check(&MemoryTable::with_row(4, 2)).await.unwrap();
        assert_eq!((record.candles, record.flowers), (4, 2));
    }

    #[tokio::test]
    async fn probe_bumps_candles_and_verifies() {
        let table = MemoryTable::with_row(9, 1);
        let outcome = probe(&table).await.unwrap();

        let (before, after) = match outcome {
            ProbeOutcome::Verified { before, after } => (before, after),
            other => panic!("expected verified outcome, got {other:?}"),
        };
        assert_eq!(before.candles, 9);
        assert_eq!(after.candles, 10);
        assert_eq!(after.flowers, 1);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn probe_seeds_empty_table() {
        let table = MemoryTable::empty();
        assert_eq!(table.ping().await.unwrap(), Some(0));

        let outcome = probe(&table).await.unwrap();
        let record = match outcome {
            ProbeOutcome::Seeded(record) => record,
            other => panic!("expected seeded outcome, got {other:?}"),
        };
        assert_eq!((record.candles, record.flowers), (0, 0));
        assert_eq!(table.row_count(), 1);
    }
}
