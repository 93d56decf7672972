use std::collections::HashMap;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use farescope_core::{FlightSearchQuery, FlightSearchRequest, LocationQuery};
use serde_json::{json, Map, Value};

use crate::error::AppError;
use crate::state::AppState;

const ACTION_LOCATIONS: &str = "locations";

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/flights", get(get_flights).fallback(method_not_allowed))
}

/// GET /api/flights
///
/// `action=locations&keyword=..` runs a location lookup; anything else is a
/// flight search.
pub async fn get_flights(
    State(state): State<AppState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(mut params) = params.map_err(|e| AppError::ValidationError(e.body_text()))?;

    if params.get("action").map(String::as_str) == Some(ACTION_LOCATIONS) {
        return search_locations(&state, params.get("keyword").map(String::as_str)).await;
    }
    params.remove("action");

    let query = search_query(params)?;
    let request = FlightSearchRequest::parse(query).map_err(AppError::from_core("Invalid search"))?;

    let results = state
        .provider
        .search_flights(&request)
        .await
        .map_err(AppError::from_core("Failed to search flights"))?;

    tracing::debug!("Returning {} offers", results.data.len());
    Ok(Json(results).into_response())
}

async fn search_locations(state: &AppState, keyword: Option<&str>) -> Result<Response, AppError> {
    let query = LocationQuery::new(keyword).map_err(AppError::from_core("Invalid lookup"))?;
    let locations = state
        .provider
        .search_locations(&query)
        .await
        .map_err(AppError::from_core("Failed to search locations"))?;

    Ok(Json(json!({ "data": locations })).into_response())
}

/// Unknown parameters are rejected here, before any upstream call.
fn search_query(params: HashMap<String, String>) -> Result<FlightSearchQuery, AppError> {
    let object: Map<String, Value> = params.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
    serde_json::from_value(Value::Object(object))
        .map_err(|e| AppError::ValidationError(format!("Invalid query parameters: {}", e)))
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
