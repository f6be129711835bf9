use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument};

use crate::db::DbError;
use crate::ingest::models::{RawReading, YearlyStat};

/// Rows actually written by one file's batch, duplicates excluded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    pub readings_inserted: usize,
    pub readings_duplicate: usize,
    pub stats_inserted: usize,
    pub stats_duplicate: usize,
}

impl WriteCounts {
    pub fn add(&mut self, other: &WriteCounts) {
        self.readings_inserted += other.readings_inserted;
        self.readings_duplicate += other.readings_duplicate;
        self.stats_inserted += other.stats_inserted;
        self.stats_duplicate += other.stats_duplicate;
    }
}

/// Insert-once writer for raw readings and yearly stats.
///
/// Both tables resolve natural-key conflicts with `DO NOTHING`: the first row
/// written for a key wins and later values for that key are discarded.
#[derive(Clone)]
pub struct IngestRepository {
    pool: PgPool,
}

impl IngestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write one file's readings and stats as a single transaction.
    ///
    /// On any error the transaction is dropped uncommitted, so nothing from
    /// this batch becomes visible.
    #[instrument(skip(self, readings, stats), fields(readings = readings.len(), stats = stats.len()))]
    pub async fn write_file_batch(
        &self,
        readings: &[RawReading],
        stats: &[YearlyStat],
    ) -> Result<WriteCounts, DbError> {
        debug!(
            "Beginning transaction for {} readings and {} yearly stats",
            readings.len(),
            stats.len()
        );
        let mut tx = self.pool.begin().await?;

        let (readings_inserted, readings_duplicate) =
            self.insert_readings_tx(&mut tx, readings).await?;
        let (stats_inserted, stats_duplicate) =
            self.insert_yearly_stats_tx(&mut tx, stats).await?;

        tx.commit().await?;

        let counts = WriteCounts {
            readings_inserted,
            readings_duplicate,
            stats_inserted,
            stats_duplicate,
        };
        info!(
            "Inserted {} new readings ({} duplicates skipped), {} new yearly stats ({} duplicates skipped)",
            counts.readings_inserted,
            counts.readings_duplicate,
            counts.stats_inserted,
            counts.stats_duplicate
        );
        Ok(counts)
    }

    // ============================================================
    // Transaction-aware methods
    // ============================================================

    /// Insert readings inside an open transaction.
    ///
    /// Returns (inserted, duplicates).
    #[instrument(skip(self, tx, readings), fields(count = readings.len()))]
    pub async fn insert_readings_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        readings: &[RawReading],
    ) -> Result<(usize, usize), DbError> {
        let mut inserted = 0;
        let mut duplicates = 0;

        for reading in readings {
            let result = sqlx::query(
                r#"
                INSERT INTO wx_readings (site_id, date, tmax, tmin, precip)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (site_id, date) DO NOTHING
                "#,
            )
            .bind(&reading.site_id)
            .bind(reading.date)
            .bind(reading.tmax)
            .bind(reading.tmin)
            .bind(reading.precip)
            .execute(&mut **tx)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
            } else {
                duplicates += 1;
            }
        }

        debug!("Readings: {} inserted, {} duplicates", inserted, duplicates);
        Ok((inserted, duplicates))
    }

    /// Insert yearly stats inside an open transaction.
    ///
    /// Returns (inserted, duplicates).
    #[instrument(skip(self, tx, stats), fields(count = stats.len()))]
    pub async fn insert_yearly_stats_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        stats: &[YearlyStat],
    ) -> Result<(usize, usize), DbError> {
        let mut inserted = 0;
        let mut duplicates = 0;

        for stat in stats {
            let result = sqlx::query(
                r#"
                INSERT INTO wx_yearly_stats (site_id, year, tmax_yearly, tmin_yearly, precip_yearly)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (site_id, year) DO NOTHING
                "#,
            )
            .bind(&stat.site_id)
            .bind(stat.year)
            .bind(stat.tmax_yearly)
            .bind(stat.tmin_yearly)
            .bind(stat.precip_yearly)
            .execute(&mut **tx)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
            } else {
                duplicates += 1;
            }
        }

        debug!("Yearly stats: {} inserted, {} duplicates", inserted, duplicates);
        Ok((inserted, duplicates))
    }
}
