use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::db::{DbError, WeatherRecord};

/// Read-side queries over `wx_readings`
#[derive(Clone)]
pub struct ReadingRepository {
    pool: PgPool,
}

impl ReadingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count readings for a station, optionally bounded by an inclusive date range
    #[instrument(skip(self))]
    pub async fn count_by_site(
        &self,
        site_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM wx_readings
            WHERE site_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            "#,
        )
        .bind(site_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Page through a station's readings in date order
    #[instrument(skip(self))]
    pub async fn find_by_site_paginated(
        &self,
        site_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<WeatherRecord>, DbError> {
        debug!(
            "Querying readings for {} (offset={}, limit={})",
            site_id, offset, limit
        );

        let readings = sqlx::query_as::<_, WeatherRecord>(
            r#"
            SELECT id, site_id, date, tmax, tmin, precip
            FROM wx_readings
            WHERE site_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date ASC
            OFFSET $4
            LIMIT $5
            "#,
        )
        .bind(site_id)
        .bind(start_date)
        .bind(end_date)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} readings", readings.len());
        Ok(readings)
    }

    /// Every station id with at least one stored reading
    #[instrument(skip(self))]
    pub async fn find_site_ids(&self) -> Result<Vec<String>, DbError> {
        let sites: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT site_id FROM wx_readings ORDER BY site_id")
                .fetch_all(&self.pool)
                .await?;

        debug!("Found {} distinct sites", sites.len());
        Ok(sites)
    }
}
