// API integration tests that verify HTTP endpoints
// Tests the actual Axum router against data written through IngestRepository

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, NaiveDate};
use http_body_util::BodyExt; // For `.collect()`
use serde_json::Value;
use serial_test::serial;
use sqlx::PgPool;
use tower::ServiceExt; // For `oneshot`
use wx_ingest::api::{create_router, generate_openapi_spec, AppState};
use wx_ingest::db::{IngestRepository, ReadingRepository, YearlyStatsRepository};
use wx_ingest::ingest::{aggregate_yearly, RawReading};
use wx_ingest::services::WeatherService;

const TEST_API_SITE: &str = "USCAPI0001";
const TEST_API_SITE_NOT_FOUND: &str = "USCAPI9999";

/// Load 250 consecutive days starting 2022-12-01 and their yearly stats
async fn seed_site(pool: &PgPool) {
    common::cleanup_sites(pool, &[TEST_API_SITE]).await;

    let start = NaiveDate::from_ymd_opt(2022, 12, 1).unwrap();
    let readings: Vec<RawReading> = (0..250)
        .map(|i| RawReading {
            site_id: TEST_API_SITE.to_string(),
            date: start + Duration::days(i),
            tmax: Some(200 + i as i32),
            tmin: if i % 2 == 0 { Some(-10) } else { None },
            precip: Some(10),
        })
        .collect();
    let stats = aggregate_yearly(&readings);

    IngestRepository::new(pool.clone())
        .write_file_batch(&readings, &stats)
        .await
        .expect("Failed to seed readings");
}

fn app(pool: &PgPool) -> axum::Router {
    let weather_service = WeatherService::new(
        ReadingRepository::new(pool.clone()),
        YearlyStatsRepository::new(pool.clone()),
    );
    create_router(AppState { weather_service })
}

async fn get_json(pool: &PgPool, uri: &str) -> (StatusCode, Value) {
    let response = app(pool)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
#[serial]
async fn test_health_endpoint() {
    let pool = common::setup_test_db().await;

    let (status, body) = get_json(&pool, "/api/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[serial]
async fn test_weather_first_page_defaults() {
    let pool = common::setup_test_db().await;
    seed_site(&pool).await;

    let (status, body) = get_json(&pool, &format!("/api/v1/weather?site_id={TEST_API_SITE}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 100);
    assert_eq!(body["pagination"]["total_records"], 250);
    assert_eq!(body["pagination"]["total_pages"], 3);

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 100);
    assert_eq!(data[0]["date"], "2022-12-01");
    assert_eq!(data[1]["tmin"], Value::Null);

    common::cleanup_sites(&pool, &[TEST_API_SITE]).await;
}

#[tokio::test]
#[serial]
async fn test_weather_last_page_and_date_range() {
    let pool = common::setup_test_db().await;
    seed_site(&pool).await;

    let (status, body) = get_json(
        &pool,
        &format!("/api/v1/weather?site_id={TEST_API_SITE}&page=3&limit=100"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 50);

    let (status, body) = get_json(
        &pool,
        &format!(
            "/api/v1/weather?site_id={TEST_API_SITE}&start_date=2023-01-01&end_date=2023-01-31"
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total_records"], 31);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data[0]["date"], "2023-01-01");
    assert_eq!(data[30]["date"], "2023-01-31");

    common::cleanup_sites(&pool, &[TEST_API_SITE]).await;
}

#[tokio::test]
#[serial]
async fn test_weather_unknown_site_returns_404() {
    let pool = common::setup_test_db().await;
    common::cleanup_sites(&pool, &[TEST_API_SITE_NOT_FOUND]).await;

    let (status, body) = get_json(
        &pool,
        &format!("/api/v1/weather?site_id={TEST_API_SITE_NOT_FOUND}"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains(TEST_API_SITE_NOT_FOUND));
}

#[tokio::test]
#[serial]
async fn test_weather_rejects_out_of_range_limit() {
    let pool = common::setup_test_db().await;

    let (status, _) = get_json(
        &pool,
        &format!("/api/v1/weather?site_id={TEST_API_SITE}&limit=5000"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&pool, &format!("/api/v1/weather?site_id={TEST_API_SITE}&page=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_weather_stats_by_year_range() {
    let pool = common::setup_test_db().await;
    seed_site(&pool).await;

    let (status, body) = get_json(
        &pool,
        &format!("/api/v1/weather/stats?site_id={TEST_API_SITE}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["year"], 2022);
    assert_eq!(data[1]["year"], 2023);

    // December 2022: 31 days of precip 10 tenths-mm = 3.1 cm
    assert_eq!(data[0]["precip_yearly"].as_f64().unwrap(), 310.0 / 100.0);

    let (status, body) = get_json(
        &pool,
        &format!("/api/v1/weather/stats?site_id={TEST_API_SITE}&start_year=2023&end_year=2023"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["year"], 2023);

    let (status, _) = get_json(
        &pool,
        &format!("/api/v1/weather/stats?site_id={TEST_API_SITE}&start_year=1900&end_year=1901"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup_sites(&pool, &[TEST_API_SITE]).await;
}

#[tokio::test]
#[serial]
async fn test_sites_lists_distinct_station_ids() {
    let pool = common::setup_test_db().await;
    seed_site(&pool).await;

    let (status, body) = get_json(&pool, "/api/v1/sites").await;

    assert_eq!(status, StatusCode::OK);
    let sites: Vec<&str> = body["sites"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert_eq!(
        sites.iter().filter(|s| **s == TEST_API_SITE).count(),
        1,
        "Site must be listed exactly once"
    );
    assert_eq!(body["count"].as_u64().unwrap() as usize, sites.len());

    common::cleanup_sites(&pool, &[TEST_API_SITE]).await;
}

#[test]
fn test_openapi_spec_lists_all_paths() {
    let spec = serde_json::to_value(generate_openapi_spec()).unwrap();
    let paths = spec["paths"].as_object().unwrap();

    for path in [
        "/api/v1/health",
        "/api/v1/weather",
        "/api/v1/weather/stats",
        "/api/v1/sites",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}
