use crate::handlers;
use crate::middleware::require_session;
use crate::state::AppState;
use axum::{
    extract::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::Level;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/add_energy", post(handlers::add_energy))
        .route("/get_energy_data", get(handlers::get_energy_data))
        .route("/delete_entry", post(handlers::delete_entry))
        .route("/calculate_savings", get(handlers::calculate_savings))
        .route("/energy_tips", get(handlers::energy_tips))
        .route("/compare", get(handlers::compare))
        .route("/get_analytics", get(handlers::get_analytics))
        .route("/api/solar_forecast", get(handlers::solar_forecast_api))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/", get(handlers::index))
        .route("/register", get(handlers::register_page).post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/dashboard", get(handlers::dashboard))
        .route("/solar_forecast", get(handlers::solar_forecast))
        .merge(api)
        .fallback(handlers::fallback)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}
