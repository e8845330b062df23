use crate::analytics;
use crate::auth::{clear_session_cookie, create_token, hash_password, session_cookie, verify_password};
use crate::errors::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::filter::{parse_timestamp, select_entries, DateWindow};
use crate::forecast::{fetch_solar_forecast, Coordinates, ForecastQuery};
use crate::middleware::{session_user, SessionUser};
use crate::models::{
    AnalyticsResponse, CompareResponse, Credentials, DeleteRequest, EnergyDataResponse,
    EnergyQuery, EntryView, ForecastResponse, NewEntry, SavingsResponse, StatusResponse, TipsResponse,
};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::tips;
use crate::ui::{render_dashboard, render_login, render_register, render_solar_forecast};
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    Extension, Json,
};
use chrono::Local;
use tracing::{error, info, warn};

pub async fn index() -> Html<String> {
    Html(render_login())
}

pub async fn register_page() -> Html<String> {
    Html(render_register())
}

pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match session_user(&state, &headers).await {
        Some(user) => Html(render_dashboard(&user.username)).into_response(),
        None => Redirect::to("/").into_response(),
    }
}

pub async fn solar_forecast(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match session_user(&state, &headers).await {
        Some(_) => Html(render_solar_forecast()).into_response(),
        None => Redirect::to("/").into_response(),
    }
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Credentials>,
) -> Result<Json<StatusResponse>, AppError> {
    let username = payload.username.trim().to_string();
    let password = payload.password.trim().to_string();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::bad_request("Username and password are required"));
    }

    if state.data.lock().await.find_user(&username).is_some() {
        return Err(AppError::conflict("Username already exists"));
    }

    let cost = state.config.bcrypt_cost;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(AppError::internal)?
        .map_err(|err| AppError::internal(std::io::Error::other(err)))?;

    let mut data = state.data.lock().await;
    // Re-checked under the write lock, another request may have claimed the name while hashing.
    if data.find_user(&username).is_some() {
        return Err(AppError::conflict("Username already exists"));
    }
    let user_id = data.add_user(username.clone(), password_hash).id;
    persist_data(&state.config.data_path, &data).await?;

    info!(user_id, username = %username, "registered user");
    Ok(Json(StatusResponse::success("User registered successfully")))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Credentials>,
) -> Result<Response, AppError> {
    let username = payload.username.trim().to_string();
    let password = payload.password.trim().to_string();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::bad_request("Username and password are required"));
    }

    let user = state.data.lock().await.find_user(&username).cloned();
    let Some(user) = user else {
        warn!(username = %username, "login for unknown user");
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(AppError::internal)?
        .map_err(|err| {
            error!(user_id = user.id, "stored password hash is unusable: {err}");
            AppError::internal(std::io::Error::other(err))
        })?;
    if !valid {
        warn!(username = %username, "login with wrong password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let ttl = state.config.session_ttl_hours;
    let token = create_token(user.id, &user.username, &state.config.session_secret, ttl)
        .map_err(|err| AppError::internal(std::io::Error::other(err)))?;

    info!(user_id = user.id, "user logged in");
    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&token, ttl))]),
        Json(StatusResponse::success("Logged in")),
    )
        .into_response())
}

pub async fn logout() -> Response {
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn add_energy(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    AppJson(payload): AppJson<NewEntry>,
) -> Result<Json<StatusResponse>, AppError> {
    validate_entry(&payload)?;

    let mut data = state.data.lock().await;
    let entry_id = data.add_entry(user.id, payload);
    persist_data(&state.config.data_path, &data).await?;

    info!(user_id = user.id, entry_id, "added energy entry");
    Ok(Json(StatusResponse::success("Energy data added")))
}

fn validate_entry(entry: &NewEntry) -> Result<(), AppError> {
    if parse_timestamp(&entry.date).is_none() {
        return Err(AppError::bad_request(
            "date must be YYYY-MM-DD or YYYY-MM-DDTHH:MM with a year between 1 and 9999",
        ));
    }

    for (name, value) in [
        ("solar_energy", entry.solar_energy),
        ("electric_energy", entry.electric_energy),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::bad_request(format!(
                "{name} must be a non-negative number"
            )));
        }
    }

    for (name, value) in [("temperature", entry.temperature), ("humidity", entry.humidity)] {
        if value.is_some_and(|v| !v.is_finite()) {
            return Err(AppError::bad_request(format!("{name} must be a number")));
        }
    }
    Ok(())
}

pub async fn get_energy_data(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    AppQuery(query): AppQuery<EnergyQuery>,
) -> Result<Json<EnergyDataResponse>, AppError> {
    let window = DateWindow::from_query(&query, Local::now().date_naive())?;

    let data = state.data.lock().await;
    let selected = select_entries(data.entries_for(user.id), window);

    Ok(Json(EnergyDataResponse {
        status: "success".to_string(),
        data: selected.into_iter().map(EntryView::from).collect(),
    }))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    AppJson(payload): AppJson<DeleteRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let entry_id = payload
        .id
        .ok_or_else(|| AppError::bad_request("Missing entry ID"))?;

    let mut data = state.data.lock().await;
    if !data.remove_entry(user.id, entry_id) {
        return Err(AppError::not_found("Entry not found"));
    }
    persist_data(&state.config.data_path, &data).await?;

    info!(user_id = user.id, entry_id, "deleted energy entry");
    Ok(Json(StatusResponse::success("Entry deleted")))
}

pub async fn calculate_savings(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Json<SavingsResponse> {
    let data = state.data.lock().await;
    let savings = tips::savings(&data.entries_for(user.id), state.config.savings_rate);
    Json(SavingsResponse {
        status: "success".to_string(),
        savings,
    })
}

pub async fn energy_tips(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Json<TipsResponse> {
    let data = state.data.lock().await;
    Json(TipsResponse {
        status: "success".to_string(),
        tips: tips::energy_tips(&data.entries_for(user.id)),
    })
}

pub async fn compare(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Json<CompareResponse> {
    let data = state.data.lock().await;
    let (solar_total, electric_total) = tips::totals(&data.entries_for(user.id));
    Json(CompareResponse {
        status: "success".to_string(),
        solar_total,
        electric_total,
    })
}

pub async fn get_analytics(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Json<AnalyticsResponse> {
    let entries: Vec<_> = {
        let data = state.data.lock().await;
        data.entries_for(user.id).into_iter().cloned().collect()
    };
    let refs: Vec<_> = entries.iter().collect();

    Json(AnalyticsResponse {
        status: "success".to_string(),
        analysis: analytics::analyze(&refs),
    })
}

pub async fn solar_forecast_api(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ForecastQuery>,
) -> Result<Json<ForecastResponse>, AppError> {
    let coords = Coordinates::from_query(&query)?;
    let forecast = fetch_solar_forecast(&state.http, &state.config.forecast_url, coords).await?;
    Ok(Json(ForecastResponse {
        status: "success".to_string(),
        forecast,
    }))
}

pub async fn fallback() -> (StatusCode, Json<StatusResponse>) {
    (StatusCode::NOT_FOUND, Json(StatusResponse::fail("Not found")))
}
