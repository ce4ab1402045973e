use crate::{auth, checklist, models, shipments, units, users, AppState};
use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Json, Router,
};
use http::{HeaderValue, StatusCode};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub(super) fn setup(app_state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/shipments", get(shipments::list).post(shipments::create))
        .route("/api/shipments/stats", get(shipments::stats))
        .route("/api/shipments/stats/over-time", get(shipments::stats_over_time))
        .route("/api/shipments/fpy/weekly", get(shipments::weekly_fpy))
        .route("/api/shipments/manifest", get(shipments::manifest))
        .route("/api/shipments/weekly", get(shipments::weekly))
        .route(
            "/api/shipments/{id}",
            get(shipments::details).delete(shipments::delete),
        )
        .route("/api/shipments/{id}/status", put(shipments::update_status))
        .route("/api/units", post(units::create))
        .route("/api/units/check-serial", get(units::check_serial))
        .route(
            "/api/units/check-original-serial",
            get(units::check_original_serial),
        )
        .route("/api/units/{id}", put(units::update).delete(units::delete))
        .route("/api/models", get(models::list).post(models::create))
        .route("/api/models/check-part-number", get(models::check_part_number))
        .route("/api/models/{id}", put(models::update))
        .route("/api/checklist/items", get(checklist::items))
        .route("/api/checklist/responses", post(checklist::save_response))
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/account/password", put(users::change_own_password))
        .route("/api/users/{id}", put(users::update))
        .route("/api/users/{id}/toggle-active", put(users::toggle_active))
        .route("/api/users/{id}/password", put(users::reset_password))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Any origin when `origin` is unset or `*`, otherwise the comma separated origins listed.
pub(super) fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    match origin.map(str::trim) {
        None | Some("") | Some("*") => Ok(CorsLayer::permissive()),
        Some(origins) => {
            let origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid origin {o}")))
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok(CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any))
        }
    }
}

pub async fn fallback(_uri: http::Uri) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}
