use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::db::{DbError, YearlyStatRecord};

/// Read-side queries over `wx_yearly_stats`
#[derive(Clone)]
pub struct YearlyStatsRepository {
    pool: PgPool,
}

impl YearlyStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Yearly stats for a station, optionally bounded by an inclusive year range
    #[instrument(skip(self))]
    pub async fn find_by_site(
        &self,
        site_id: &str,
        start_year: Option<i32>,
        end_year: Option<i32>,
    ) -> Result<Vec<YearlyStatRecord>, DbError> {
        let stats = sqlx::query_as::<_, YearlyStatRecord>(
            r#"
            SELECT id, site_id, year, tmax_yearly, tmin_yearly, precip_yearly
            FROM wx_yearly_stats
            WHERE site_id = $1
              AND ($2::int IS NULL OR year >= $2)
              AND ($3::int IS NULL OR year <= $3)
            ORDER BY year ASC
            "#,
        )
        .bind(site_id)
        .bind(start_year)
        .bind(end_year)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} yearly stats for {}", stats.len(), site_id);
        Ok(stats)
    }
}
