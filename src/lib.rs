pub mod analytics;
pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod extract;
pub mod filter;
pub mod forecast;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod storage;
pub mod tips;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::load_data;
