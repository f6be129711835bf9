use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use utoipa::{OpenApi, ToSchema};

use crate::db::{WeatherRecord, YearlyStatRecord};
use crate::services::weather_service::{
    Pagination, SitesResponse, StatsQuery, WeatherPage, WeatherQuery, YearlyStatsResponse,
};
use crate::services::{WeatherService, WeatherServiceError};

#[derive(Clone)]
pub struct AppState {
    pub weather_service: WeatherService,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Station API",
        description = "Read access to ingested weather station readings and yearly statistics"
    ),
    paths(health, get_weather, get_weather_stats, get_sites),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        WeatherRecord,
        YearlyStatRecord,
        Pagination,
        WeatherPage,
        YearlyStatsResponse,
        SitesResponse
    ))
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/weather", get(get_weather))
        .route("/weather/stats", get(get_weather_stats))
        .route("/sites", get(get_sites))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn to_api_error(e: WeatherServiceError) -> ApiError {
    let status = match &e {
        WeatherServiceError::NotFound(_) => {
            warn!("{}", e);
            StatusCode::NOT_FOUND
        }
        WeatherServiceError::InvalidParameter(_) => {
            warn!("{}", e);
            StatusCode::BAD_REQUEST
        }
        WeatherServiceError::Database(_) => {
            error!("{}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            detail: e.to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "Page of daily readings ordered by date", body = WeatherPage),
        (status = 400, description = "Invalid paging parameters", body = ErrorResponse),
        (status = 404, description = "No readings for this station and range", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(site_id = %query.site_id))]
async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherPage>, ApiError> {
    debug!(
        "Fetching readings for {} (page={}, limit={})",
        query.site_id, query.page, query.limit
    );

    let page = state
        .weather_service
        .get_readings_page(&query)
        .await
        .map_err(to_api_error)?;

    info!(
        "Retrieved {} readings for {} (page {}/{}, total={})",
        page.data.len(),
        query.site_id,
        page.pagination.page,
        page.pagination.total_pages,
        page.pagination.total_records
    );

    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/weather/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Yearly statistics ordered by year", body = YearlyStatsResponse),
        (status = 400, description = "Invalid year range", body = ErrorResponse),
        (status = 404, description = "No statistics for this station and range", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(site_id = %query.site_id))]
async fn get_weather_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<YearlyStatsResponse>, ApiError> {
    debug!("Fetching yearly stats for {}", query.site_id);

    let stats = state
        .weather_service
        .get_yearly_stats(&query)
        .await
        .map_err(to_api_error)?;

    info!("Retrieved {} yearly stats for {}", stats.data.len(), query.site_id);
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/v1/sites",
    responses((status = 200, description = "Distinct station ids", body = SitesResponse))
)]
#[instrument(skip(state))]
async fn get_sites(State(state): State<AppState>) -> Result<Json<SitesResponse>, ApiError> {
    let sites = state
        .weather_service
        .list_sites()
        .await
        .map_err(to_api_error)?;

    info!("Retrieved {} sites", sites.count);
    Ok(Json(sites))
}
