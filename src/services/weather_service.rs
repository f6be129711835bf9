use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::db::{DbError, ReadingRepository, WeatherRecord, YearlyStatRecord, YearlyStatsRepository};

pub const MAX_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum WeatherServiceError {
    #[error("No data found for site_id: {0}")]
    NotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Query parameters for raw daily readings
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeatherQuery {
    /// Weather station ID
    pub site_id: String,
    /// Inclusive start date (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD)
    pub end_date: Option<NaiveDate>,
    /// Page number, starting at 1
    #[serde(default = "default_page")]
    pub page: u32,
    /// Records per page (1-1000)
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    100
}

impl WeatherQuery {
    fn validate(&self) -> Result<(), WeatherServiceError> {
        if self.page < 1 {
            return Err(WeatherServiceError::InvalidParameter(
                "page must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&self.limit) {
            return Err(WeatherServiceError::InvalidParameter(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

/// Query parameters for yearly statistics
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Weather station ID
    pub site_id: String,
    /// Inclusive start year (YYYY)
    pub start_year: Option<i32>,
    /// Inclusive end year (YYYY)
    pub end_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_records: i64,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeatherPage {
    pub data: Vec<WeatherRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct YearlyStatsResponse {
    pub data: Vec<YearlyStatRecord>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SitesResponse {
    pub sites: Vec<String>,
    pub count: usize,
}

/// Ceiling division of records into pages
pub fn total_pages(total_records: i64, limit: u32) -> u32 {
    if total_records <= 0 || limit == 0 {
        return 0;
    }
    let limit = i64::from(limit);
    ((total_records + limit - 1) / limit) as u32
}

/// Read-only queries over ingested weather data
#[derive(Clone)]
pub struct WeatherService {
    reading_repo: ReadingRepository,
    stats_repo: YearlyStatsRepository,
}

impl WeatherService {
    pub fn new(reading_repo: ReadingRepository, stats_repo: YearlyStatsRepository) -> Self {
        Self {
            reading_repo,
            stats_repo,
        }
    }

    /// One page of a station's daily readings
    pub async fn get_readings_page(
        &self,
        query: &WeatherQuery,
    ) -> Result<WeatherPage, WeatherServiceError> {
        query.validate()?;

        let total_records = self
            .reading_repo
            .count_by_site(&query.site_id, query.start_date, query.end_date)
            .await?;

        if total_records == 0 {
            return Err(WeatherServiceError::NotFound(query.site_id.clone()));
        }

        let data = self
            .reading_repo
            .find_by_site_paginated(
                &query.site_id,
                query.start_date,
                query.end_date,
                query.offset(),
                i64::from(query.limit),
            )
            .await?;

        debug!(
            "Page {} of readings for {}: {} of {} records",
            query.page,
            query.site_id,
            data.len(),
            total_records
        );

        Ok(WeatherPage {
            data,
            pagination: Pagination {
                page: query.page,
                limit: query.limit,
                total_records,
                total_pages: total_pages(total_records, query.limit),
            },
        })
    }

    /// Yearly stats for a station within an optional year range
    pub async fn get_yearly_stats(
        &self,
        query: &StatsQuery,
    ) -> Result<YearlyStatsResponse, WeatherServiceError> {
        if let (Some(start), Some(end)) = (query.start_year, query.end_year) {
            if start > end {
                return Err(WeatherServiceError::InvalidParameter(
                    "start_year must not be after end_year".to_string(),
                ));
            }
        }

        let data = self
            .stats_repo
            .find_by_site(&query.site_id, query.start_year, query.end_year)
            .await?;

        if data.is_empty() {
            return Err(WeatherServiceError::NotFound(query.site_id.clone()));
        }

        Ok(YearlyStatsResponse { data })
    }

    /// Distinct station ids with stored readings
    pub async fn list_sites(&self) -> Result<SitesResponse, WeatherServiceError> {
        let sites = self.reading_repo.find_site_ids().await?;
        Ok(SitesResponse {
            count: sites.len(),
            sites,
        })
    }
}
