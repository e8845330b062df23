use crate::errors::AppError;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

pub const DEFAULT_LATITUDE: f64 = 12.9716;
pub const DEFAULT_LONGITUDE: f64 = 77.5946;

#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Blank or missing values fall back to the default location.
    pub fn from_query(query: &ForecastQuery) -> Result<Self, AppError> {
        Ok(Self {
            latitude: coordinate(query.lat.as_deref(), "lat", 90.0, DEFAULT_LATITUDE)?,
            longitude: coordinate(query.lon.as_deref(), "lon", 180.0, DEFAULT_LONGITUDE)?,
        })
    }
}

fn coordinate(value: Option<&str>, name: &str, limit: f64, default: f64) -> Result<f64, AppError> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(default);
    };
    value
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite() && parsed.abs() <= limit)
        .ok_or_else(|| AppError::bad_request(format!("{name} must be a number between -{limit} and {limit}")))
}

/// Hourly shortwave radiation for `coords`, as returned by the upstream service.
pub async fn fetch_solar_forecast(
    client: &reqwest::Client,
    base_url: &str,
    coords: Coordinates,
) -> Result<Value, AppError> {
    let response = client
        .get(base_url)
        .query(&[
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("hourly", "shortwave_radiation".to_string()),
        ])
        .send()
        .await
        .map_err(|err| {
            warn!("forecast request failed: {err}");
            AppError::bad_gateway("Forecast service unavailable")
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!(%status, "forecast service returned an error");
        return Err(AppError::bad_gateway("API Error"));
    }

    let forecast = response.json::<Value>().await.map_err(|err| {
        warn!("forecast body is not JSON: {err}");
        AppError::bad_gateway("Forecast service returned an invalid response")
    })?;
    info!(latitude = coords.latitude, longitude = coords.longitude, "fetched solar forecast");
    Ok(forecast)
}
