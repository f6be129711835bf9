use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Database entity models

/// Stored daily observation (tenths of °C, tenths of mm)
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct WeatherRecord {
    pub id: i64,
    pub site_id: String,
    pub date: NaiveDate,
    pub tmax: Option<i32>,
    pub tmin: Option<i32>,
    pub precip: Option<i32>,
}

/// Stored yearly aggregate (°C, cm)
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct YearlyStatRecord {
    pub id: i64,
    pub site_id: String,
    pub year: i32,
    pub tmax_yearly: Option<f64>,
    pub tmin_yearly: Option<f64>,
    pub precip_yearly: f64,
}
