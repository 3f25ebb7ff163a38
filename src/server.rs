//! HTTP surface over the aggregation engine and the range resolver.
//!
//! Every endpoint answers `{success, data}` or `{success: false, error}`;
//! input errors are reported with status 400.

use crate::error::{HorizonError, HorizonResult};
use crate::query::{AggregationEngine, AggregationRequest, AggregationResult};
use crate::range::{
    compute_range_from_custom, compute_range_from_preset, default_resolution, lookup,
    preset_window, registry, DateRange, NavigationAction, NavigationParams, NavigationState,
    PresetKey, RegistryEntry, CUSTOM_KEY,
};
use crate::time::{parse_timezone, Resolution, Timestamp};
use crate::HorizonConfig;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, warn};
use uuid::Uuid;

pub struct ServerState {
    pub timezone: Tz,
    pub default_preset: PresetKey,
    pub engine: AggregationEngine,
}

pub type AppState = Arc<ServerState>;

impl ServerState {
    pub fn from_config(config: &HorizonConfig) -> HorizonResult<AppState> {
        Ok(Arc::new(ServerState {
            timezone: config.timezone()?,
            default_preset: config.default_preset.parse()?,
            engine: AggregationEngine::default(),
        }))
    }

    fn timezone_for(&self, requested: Option<&str>) -> HorizonResult<Tz> {
        match requested.filter(|s| !s.is_empty()) {
            Some(name) => parse_timezone(name),
            None => Ok(self.timezone),
        }
    }

    fn now(&self, tz: Tz) -> Timestamp {
        Utc::now().with_timezone(&tz)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type ApiReply<T> = (StatusCode, Json<ApiResponse<T>>);

fn respond<T: Serialize>(result: HorizonResult<T>) -> ApiReply<T> {
    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        ),
        Err(e) => {
            let status = if e.is_user_error() {
                warn!("Rejected request: {}", e);
                StatusCode::BAD_REQUEST
            } else {
                error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timezone: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
    pub preset: Option<String>,
    pub end_anchor: Option<String>,
    pub resolution: Option<String>,
    pub timezone: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    #[serde(default)]
    pub params: NavigationParams,
    pub action: NavigationAction,
    pub timezone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResponse {
    pub params: NavigationParams,
    pub available_resolutions: Vec<Resolution>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/time-series", get(time_series))
        .route("/api/presets", get(presets))
        .route("/api/range", get(resolve_range))
        .route("/api/navigate", post(navigate))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timezone: state.timezone.name().to_string(),
    })
}

async fn time_series(
    State(state): State<AppState>,
    Query(request): Query<AggregationRequest>,
) -> ApiReply<AggregationResult> {
    let request_id = Uuid::new_v4();
    info_span!("time_series", %request_id).in_scope(|| {
        let result = request
            .validate(state.timezone)
            .and_then(|window| state.engine.execute(&window));
        respond(result)
    })
}

async fn presets() -> ApiReply<Vec<RegistryEntry>> {
    respond(Ok(registry()))
}

fn range_for(state: &ServerState, params: &RangeParams) -> HorizonResult<DateRange> {
    let tz = state.timezone_for(params.timezone.as_deref())?;
    let key = params
        .preset
        .clone()
        .unwrap_or_else(|| state.default_preset.to_string());

    if key == CUSTOM_KEY {
        let resolution = match params.resolution.as_deref() {
            Some(value) => value.parse()?,
            None => default_resolution(None),
        };
        return match (params.from.as_deref(), params.to.as_deref()) {
            (Some(from), Some(to)) => compute_range_from_custom(from, to, resolution, tz),
            _ => Err(HorizonError::MissingParameter("from, to".to_string())),
        };
    }

    let preset = lookup(&key)?;
    let resolution = match params.resolution.as_deref() {
        Some(value) => value.parse()?,
        None => preset.default_resolution,
    };
    match params.end_anchor.as_deref() {
        Some(anchor) => compute_range_from_preset(&key, anchor, resolution, tz),
        None => preset_window(preset, &state.now(tz), resolution),
    }
}

async fn resolve_range(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> ApiReply<DateRange> {
    respond(range_for(&state, &params))
}

fn navigate_with(state: &ServerState, request: &NavigateRequest) -> HorizonResult<NavigateResponse> {
    let tz = state.timezone_for(request.timezone.as_deref())?;
    let now = state.now(tz);

    let mut navigation = NavigationState::restore(&request.params, &now, tz)?;
    navigation.apply(&request.action, &now)?;

    Ok(NavigateResponse {
        params: navigation.to_params(),
        available_resolutions: navigation.available_resolutions().to_vec(),
    })
}

async fn navigate(
    State(state): State<AppState>,
    payload: Result<Json<NavigateRequest>, JsonRejection>,
) -> ApiReply<NavigateResponse> {
    match payload {
        Ok(Json(request)) => respond(navigate_with(&state, &request)),
        Err(rejection) => {
            warn!("Malformed navigate request: {}", rejection);
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(rejection.body_text()),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        ServerState::from_config(&HorizonConfig::default()).unwrap()
    }

    #[test]
    fn test_range_for_preset_with_anchor() {
        let params = RangeParams {
            preset: Some("1w".to_string()),
            end_anchor: Some("2024-06-15T00:00:00".to_string()),
            ..Default::default()
        };
        let range = range_for(&state(), &params).unwrap();
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json["startDate"], "2024-06-09T00:00:00.000Z");
        assert_eq!(json["endDate"], "2024-06-15T23:59:59.999Z");
    }

    #[test]
    fn test_range_for_custom_requires_bounds() {
        let params = RangeParams {
            preset: Some("custom".to_string()),
            from: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            range_for(&state(), &params),
            Err(HorizonError::MissingParameter(_))
        ));
    }

    #[test]
    fn test_respond_maps_user_errors_to_bad_request() {
        let (status, Json(body)) = respond::<()>(Err(HorizonError::UnknownPreset("x".to_string())));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("Unknown preset: x"));

        let (status, _) = respond::<()>(Err(HorizonError::UnsupportedResolution("x".to_string())));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
