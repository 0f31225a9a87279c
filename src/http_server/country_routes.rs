//! Country HTTP Routes
//!
//! CRUD and statistics endpoints over the countries collection. Handlers
//! call exactly one query helper each. The pass-through helpers are not
//! routed here.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    response::Redirect,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use super::errors::{ApiError, ApiResult};
use crate::countries::{Country, CountryError, CountryQueries, Table};
use crate::store::Document;

// ==================
// Shared State
// ==================

/// State shared across country handlers
pub struct CountryState {
    pub queries: CountryQueries,
}

impl CountryState {
    pub fn new(queries: CountryQueries) -> Self {
        Self { queries }
    }
}

// ==================
// Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct InsertResponse {
    pub message: String,
    pub id: String,
}

/// Count of countries on one side of the average
#[derive(Debug, Serialize)]
pub struct AverageCountResponse {
    pub count: u64,
    pub average: f64,
}

// ==================
// Country Routes
// ==================

/// Create country routes
pub fn country_routes(state: Arc<CountryState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        // Writes
        .route("/insert_country/", post(insert_country_handler))
        .route("/update_country/{id}", put(update_country_handler))
        .route("/delete_country/{id}", delete(delete_country_handler))
        // Lookups
        .route("/countries_info/", get(countries_info_handler))
        .route("/country/{name}", get(country_handler))
        .route("/country_by_id/{id}", get(country_by_id_handler))
        .route("/countries_search/{name}", get(search_handler))
        .route("/countries_by_region/{region}", get(by_region_handler))
        .route("/countries_ranked_by_happiness/", get(ranked_handler))
        .route("/countries_by_trust/{threshold}", get(by_trust_handler))
        // Statistics
        .route("/happiness_scores_stats/", get(stats_handler))
        .route("/countries_happiness/{h1}/{h2}", get(happiness_between_handler))
        .route("/world_average_happiness/", get(world_average_handler))
        .route("/least_happy_country/", get(least_happy_handler))
        .route("/most_happy_country/", get(most_happy_handler))
        .route("/countries_above_average/", get(above_average_handler))
        .route("/countries_below_average/", get(below_average_handler))
        .with_state(state)
}

async fn home_handler() -> Redirect {
    Redirect::temporary("/countries_info/")
}

// ==================
// Write Handlers
// ==================

async fn insert_country_handler(
    State(state): State<Arc<CountryState>>,
    payload: Result<Json<Country>, JsonRejection>,
) -> ApiResult<Json<InsertResponse>> {
    let Json(country) = payload?;
    let id = state.queries.insert_country(&country)?;

    Ok(Json(InsertResponse {
        message: "Country inserted successfully".to_string(),
        id,
    }))
}

async fn update_country_handler(
    State(state): State<Arc<CountryState>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(body) = payload?;
    let patch: Document = match body {
        Value::Object(map) => map,
        other => {
            return Err(ApiError::InvalidBody(format!(
                "expected a JSON object, got {}",
                other
            )))
        }
    };

    match state.queries.update_country(&id, &patch)? {
        Some(_) => Ok(MessageResponse::new("Country updated successfully")),
        None => Err(CountryError::NotFound.into()),
    }
}

async fn delete_country_handler(
    State(state): State<Arc<CountryState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.queries.delete_country(&id)?;
    Ok(MessageResponse::new("Country deleted successfully"))
}

// ==================
// Lookup Handlers
// ==================

async fn countries_info_handler(State(state): State<Arc<CountryState>>) -> ApiResult<Json<Table>> {
    Ok(Json(state.queries.all_countries()?))
}

async fn country_handler(
    State(state): State<Arc<CountryState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Table>> {
    state
        .queries
        .country_by_name(&name)?
        .map(Json)
        .ok_or_else(|| CountryError::NotFound.into())
}

async fn country_by_id_handler(
    State(state): State<Arc<CountryState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Document>> {
    Ok(Json(state.queries.get_country_by_id(&id)?))
}

async fn search_handler(
    State(state): State<Arc<CountryState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(state.queries.search_countries(&name)?))
}

async fn by_region_handler(
    State(state): State<Arc<CountryState>>,
    Path(region): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(state.queries.countries_by_region(&region)?))
}

async fn ranked_handler(State(state): State<Arc<CountryState>>) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(state.queries.countries_ranked_by_happiness()?))
}

async fn by_trust_handler(
    State(state): State<Arc<CountryState>>,
    threshold: Result<Path<f64>, PathRejection>,
) -> ApiResult<Json<Vec<Document>>> {
    let Path(threshold) = threshold?;
    Ok(Json(state.queries.countries_by_trust(threshold)?))
}

// ==================
// Statistics Handlers
// ==================

async fn stats_handler(State(state): State<Arc<CountryState>>) -> ApiResult<Json<Document>> {
    Ok(Json(state.queries.happiness_scores_stats()?))
}

async fn happiness_between_handler(
    State(state): State<Arc<CountryState>>,
    bounds: Result<Path<(f64, f64)>, PathRejection>,
) -> ApiResult<Json<Table>> {
    let Path((h1, h2)) = bounds?;
    Ok(Json(state.queries.countries_happiness_between(h1, h2)?))
}

async fn world_average_handler(State(state): State<Arc<CountryState>>) -> ApiResult<Json<Table>> {
    Ok(Json(state.queries.world_average_happiness()?))
}

async fn least_happy_handler(State(state): State<Arc<CountryState>>) -> ApiResult<Json<Table>> {
    Ok(Json(state.queries.least_happy_country()?))
}

async fn most_happy_handler(State(state): State<Arc<CountryState>>) -> ApiResult<Json<Table>> {
    Ok(Json(state.queries.most_happy_country()?))
}

async fn above_average_handler(
    State(state): State<Arc<CountryState>>,
) -> ApiResult<Json<AverageCountResponse>> {
    average_count(state.queries.nb_countries_happiness_sup_avg()?)
}

async fn below_average_handler(
    State(state): State<Arc<CountryState>>,
) -> ApiResult<Json<AverageCountResponse>> {
    average_count(state.queries.nb_countries_happiness_inf_avg()?)
}

fn average_count(result: Option<(u64, f64)>) -> ApiResult<Json<AverageCountResponse>> {
    let (count, average) = result
        .ok_or_else(|| ApiError::NotFound("No happiness scores to average".to_string()))?;
    Ok(Json(AverageCountResponse { count, average }))
}
