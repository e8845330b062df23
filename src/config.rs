use std::{env, path::PathBuf};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/state.json";
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 24;
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;
pub const DEFAULT_SAVINGS_RATE: f64 = 0.15;
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DEV_SESSION_SECRET: &str = "energy-tracker-dev-secret";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub session_secret: String,
    pub session_ttl_hours: u64,
    pub bcrypt_cost: u32,
    pub savings_rate: f64,
    pub forecast_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let session_secret = match lookup("APP_SESSION_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("APP_SESSION_SECRET not set, using development secret");
                DEV_SESSION_SECRET.to_string()
            }
        };

        Self {
            port: parsed(&lookup, "PORT").unwrap_or(DEFAULT_PORT),
            data_path: lookup("APP_DATA_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            session_secret,
            session_ttl_hours: parsed::<u64>(&lookup, "SESSION_TTL_HOURS")
                .filter(|hours| *hours > 0)
                .map(|hours| hours.min(MAX_SESSION_TTL_HOURS))
                .unwrap_or(DEFAULT_SESSION_TTL_HOURS),
            bcrypt_cost: parsed(&lookup, "BCRYPT_COST")
                .filter(|cost| (4..=31).contains(cost))
                .unwrap_or(bcrypt::DEFAULT_COST),
            savings_rate: parsed::<f64>(&lookup, "SAVINGS_RATE")
                .filter(|rate| rate.is_finite() && *rate >= 0.0)
                .unwrap_or(DEFAULT_SAVINGS_RATE),
            forecast_url: lookup("FORECAST_URL")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_FORECAST_URL.to_string()),
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}
