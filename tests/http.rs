use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct EntryView {
    id: u64,
    date: String,
    solar_energy: f64,
    electric_energy: f64,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct EnergyDataResponse {
    status: String,
    data: Vec<EntryView>,
}

#[derive(Debug, Deserialize)]
struct CompareResponse {
    solar_total: f64,
    electric_total: f64,
}

#[derive(Debug, Deserialize)]
struct Recommendations {
    carbon: Vec<String>,
    cost: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Analysis {
    current_pattern: f64,
    next_hour_prediction: f64,
    carbon_footprint: f64,
    energy_cost: f64,
    recommendations: Recommendations,
}

#[derive(Debug, Deserialize)]
struct AnalyticsResponse {
    status: String,
    analysis: Analysis,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    status: String,
    forecast: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TipsResponse {
    status: String,
    tips: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SavingsResponse {
    status: String,
    savings: f64,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));
static USER_SEQ: AtomicU32 = AtomicU32::new(0);

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("energy_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(extra_env: &[(&str, String)]) -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_energy_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("APP_SESSION_SECRET", "http-test-secret")
        .env("BCRYPT_COST", "4")
        .env("RUST_LOG", "info")
        .envs(extra_env.iter().map(|(key, value)| (*key, value.as_str())))
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server(&[]).await);
    *guard = Some(Arc::clone(&server));
    server
}

fn cookie_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn unique_username(prefix: &str) -> String {
    format!("{prefix}_{}_{}", std::process::id(), USER_SEQ.fetch_add(1, Ordering::SeqCst))
}

/// Registers a fresh user and returns a client holding its session cookie.
async fn logged_in_client(base_url: &str, prefix: &str) -> Client {
    let client = cookie_client();
    let username = unique_username(prefix);
    let creds = serde_json::json!({ "username": username, "password": "pw-123" });

    let registered: StatusResponse = client
        .post(format!("{base_url}/register"))
        .json(&creds)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(registered.status, "success", "{}", registered.message);

    let login = client
        .post(format!("{base_url}/login"))
        .json(&creds)
        .send()
        .await
        .unwrap();
    assert!(login.status().is_success());
    client
}

async fn add_entry(client: &Client, base_url: &str, date: &str, solar: f64, electric: f64) {
    let response = client
        .post(format!("{base_url}/add_energy"))
        .json(&serde_json::json!({
            "date": date,
            "solar_energy": solar,
            "electric_energy": electric,
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

async fn energy_data(client: &Client, url: String) -> EnergyDataResponse {
    client.get(url).send().await.unwrap().json().await.unwrap()
}

#[tokio::test]
async fn http_api_requires_session() {
    let server = shared_server().await;
    let client = cookie_client();

    for path in ["/get_energy_data", "/get_analytics", "/energy_tips", "/calculate_savings"] {
        let response = client
            .get(format!("{}{path}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: StatusResponse = response.json().await.unwrap();
        assert_eq!(body.status, "fail");
    }

    let dashboard = client
        .get(format!("{}/dashboard", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(dashboard.status().is_redirection());
}

#[tokio::test]
async fn http_register_rejects_duplicates_and_blank_fields() {
    let server = shared_server().await;
    let client = cookie_client();
    let creds = serde_json::json!({ "username": unique_username("dup"), "password": "secret" });

    let first = client
        .post(format!("{}/register", server.base_url))
        .json(&creds)
        .send()
        .await
        .unwrap();
    assert!(first.status().is_success());

    let second = client
        .post(format!("{}/register", server.base_url))
        .json(&creds)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let blank = client
        .post(format!("{}/register", server.base_url))
        .json(&serde_json::json!({ "username": "  ", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_login_with_wrong_password_fails() {
    let server = shared_server().await;
    let client = cookie_client();
    let username = unique_username("wrongpw");

    client
        .post(format!("{}/register", server.base_url))
        .json(&serde_json::json!({ "username": username, "password": "right" }))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/login", server.base_url))
        .json(&serde_json::json!({ "username": username, "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: StatusResponse = response.json().await.unwrap();
    assert_eq!(body.message, "Invalid credentials");
}

#[tokio::test]
async fn http_add_energy_shows_up_in_history() {
    let server = shared_server().await;
    let client = logged_in_client(&server.base_url, "adder").await;

    add_entry(&client, &server.base_url, "2026-01-02", 5.5, 2.0).await;
    add_entry(&client, &server.base_url, "2026-01-01", 3.0, 4.0).await;

    let data = energy_data(&client, format!("{}/get_energy_data", server.base_url)).await;
    assert_eq!(data.status, "success");
    assert_eq!(data.data.len(), 2);
    assert_eq!(data.data[0].date, "2026-01-01");
    assert_eq!(data.data[1].solar_energy, 5.5);
    assert_eq!(data.data[1].temperature, 25.0);

    let filtered = energy_data(
        &client,
        format!(
            "{}/get_energy_data?from_date=2026-01-02&to_date=2026-01-31",
            server.base_url
        ),
    )
    .await;
    assert_eq!(filtered.data.len(), 1);
    assert_eq!(filtered.data[0].electric_energy, 2.0);

    let totals: CompareResponse = client
        .get(format!("{}/compare", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(totals.solar_total, 8.5);
    assert_eq!(totals.electric_total, 6.0);
}

#[tokio::test]
async fn http_add_energy_validates_input() {
    let server = shared_server().await;
    let client = logged_in_client(&server.base_url, "validator").await;

    let bad_date = client
        .post(format!("{}/add_energy", server.base_url))
        .json(&serde_json::json!({ "date": "yesterday", "solar_energy": 1.0, "electric_energy": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_date.status(), StatusCode::BAD_REQUEST);

    let negative = client
        .post(format!("{}/add_energy", server.base_url))
        .json(&serde_json::json!({ "date": "2026-01-01", "solar_energy": -1.0, "electric_energy": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let bad_range = client
        .get(format!("{}/get_energy_data?range=decade", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_range.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_delete_only_touches_own_entries() {
    let server = shared_server().await;
    let owner = logged_in_client(&server.base_url, "owner").await;
    let other = logged_in_client(&server.base_url, "other").await;

    add_entry(&owner, &server.base_url, "2026-02-01", 1.0, 1.0).await;
    let data = energy_data(&owner, format!("{}/get_energy_data", server.base_url)).await;
    let id = data.data[0].id;

    let foreign = other
        .post(format!("{}/delete_entry", server.base_url))
        .json(&serde_json::json!({ "id": id.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let missing = owner
        .post(format!("{}/delete_entry", server.base_url))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let deleted: StatusResponse = owner
        .post(format!("{}/delete_entry", server.base_url))
        .json(&serde_json::json!({ "id": id.to_string() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted.status, "success");

    let data = energy_data(&owner, format!("{}/get_energy_data", server.base_url)).await;
    assert!(data.data.is_empty());
}

#[tokio::test]
async fn http_analytics_tips_and_savings() {
    let server = shared_server().await;
    let client = logged_in_client(&server.base_url, "analyst").await;

    let empty: AnalyticsResponse = client
        .get(format!("{}/get_analytics", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(empty.status, "success");
    assert_eq!(empty.analysis.current_pattern, 0.0);
    assert_eq!(empty.analysis.next_hour_prediction, 0.0);
    assert_eq!(empty.analysis.energy_cost, 0.0);
    assert_eq!(empty.analysis.recommendations.carbon.len(), 1);

    add_entry(&client, &server.base_url, "2026-01-01", 2.0, 10.0).await;

    let analytics: AnalyticsResponse = client
        .get(format!("{}/get_analytics", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!((analytics.analysis.carbon_footprint - 5.0).abs() < 1e-9);
    assert!((analytics.analysis.energy_cost - 1.0).abs() < 1e-9);
    assert!(!analytics.analysis.recommendations.cost.is_empty());

    let tips: TipsResponse = client
        .get(format!("{}/energy_tips", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tips.status, "success");
    assert!(!tips.tips.is_empty());

    let savings: SavingsResponse = client
        .get(format!("{}/calculate_savings", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(savings.status, "success");
    assert!((savings.savings - 0.3).abs() < 1e-9);
}

#[tokio::test]
async fn http_logout_clears_session() {
    let server = shared_server().await;
    let client = logged_in_client(&server.base_url, "leaver").await;

    let dashboard = client
        .get(format!("{}/dashboard", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(dashboard.status(), StatusCode::OK);
    assert!(dashboard.text().await.unwrap().contains("Welcome, leaver_"));

    let logout = client
        .get(format!("{}/logout", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(logout.status().is_redirection());

    let after = client
        .get(format!("{}/get_energy_data", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn http_malformed_bodies_use_fail_envelope() {
    let server = shared_server().await;
    let client = logged_in_client(&server.base_url, "malformed").await;

    let broken = client
        .post(format!("{}/register", server.base_url))
        .header("content-type", "application/json")
        .body("{bad")
        .send()
        .await
        .unwrap();
    assert_eq!(broken.status(), StatusCode::BAD_REQUEST);
    let body: StatusResponse = broken.json().await.unwrap();
    assert_eq!(body.status, "fail");
    assert!(!body.message.is_empty());

    let incomplete = client
        .post(format!("{}/add_energy", server.base_url))
        .json(&serde_json::json!({ "date": "2026-01-01", "electric_energy": 1.0 }))
        .send()
        .await
        .unwrap();
    assert!(incomplete.status().is_client_error());
    let body: StatusResponse = incomplete.json().await.unwrap();
    assert_eq!(body.status, "fail");

    let no_content_type = client
        .post(format!("{}/delete_entry", server.base_url))
        .body(r#"{"id":1}"#)
        .send()
        .await
        .unwrap();
    assert!(no_content_type.status().is_client_error());
    let body: StatusResponse = no_content_type.json().await.unwrap();
    assert_eq!(body.status, "fail");
}

#[tokio::test]
async fn http_register_trims_username_before_duplicate_check() {
    let server = shared_server().await;
    let client = cookie_client();
    let username = unique_username("trimmed");

    let first = client
        .post(format!("{}/register", server.base_url))
        .json(&serde_json::json!({ "username": username, "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert!(first.status().is_success());

    let padded = client
        .post(format!("{}/register", server.base_url))
        .json(&serde_json::json!({ "username": format!("  {username} "), "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(padded.status(), StatusCode::CONFLICT);
    let body: StatusResponse = padded.json().await.unwrap();
    assert_eq!(body.message, "Username already exists");
}

#[tokio::test]
async fn http_named_ranges_select_recent_entries() {
    let server = shared_server().await;
    let client = logged_in_client(&server.base_url, "ranger").await;
    let today = chrono::Local::now().date_naive();

    for days_ago in [0, 10, 100, 400] {
        let day = today - chrono::Duration::days(days_ago);
        add_entry(&client, &server.base_url, &day.format("%Y-%m-%d").to_string(), 1.0, 1.0).await;
    }

    for (range, expected) in [("today", 1), ("week", 1), ("month", 2), ("year", 3), ("all", 4)] {
        let data = energy_data(
            &client,
            format!("{}/get_energy_data?range={range}", server.base_url),
        )
        .await;
        assert_eq!(data.status, "success");
        assert_eq!(data.data.len(), expected, "range={range}");
    }

    let inverted = client
        .get(format!(
            "{}/get_energy_data?from_date=2026-02-01&to_date=2026-01-01",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(inverted.status(), StatusCode::BAD_REQUEST);
    let body: StatusResponse = inverted.json().await.unwrap();
    assert_eq!(body.status, "fail");
}

#[tokio::test]
async fn http_extreme_years_are_rejected_and_analytics_survive() {
    let server = shared_server().await;
    let client = logged_in_client(&server.base_url, "farfuture").await;

    for date in ["+262142-12-31T23:00", "-262143-01-01", "0000-01-01"] {
        let response = client
            .post(format!("{}/add_energy", server.base_url))
            .json(&serde_json::json!({ "date": date, "solar_energy": 1.0, "electric_energy": 1.0 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{date}");
    }

    add_entry(&client, &server.base_url, "0001-01-01T00:00", 1.0, 2.0).await;
    add_entry(&client, &server.base_url, "9999-12-31T23:00", 1.0, 2.0).await;

    let analytics = client
        .get(format!("{}/get_analytics", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(analytics.status(), StatusCode::OK);
    let body: AnalyticsResponse = analytics.json().await.unwrap();
    assert_eq!(body.status, "success");
    assert!(body.analysis.next_hour_prediction.is_finite());
}

/// Stands in for the forecast service: latitude 0 answers 500, anything else a small payload.
async fn spawn_forecast_stub() -> String {
    use axum::{extract::Query, http::StatusCode as AxumStatus, routing::get, Json, Router};

    async fn forecast(Query(params): Query<HashMap<String, String>>) -> Result<Json<serde_json::Value>, AxumStatus> {
        if params.get("latitude").map(String::as_str) == Some("0") {
            return Err(AxumStatus::INTERNAL_SERVER_ERROR);
        }
        assert_eq!(params.get("hourly").map(String::as_str), Some("shortwave_radiation"));
        Ok(Json(serde_json::json!({
            "latitude": params.get("latitude"),
            "hourly": {
                "time": ["2026-03-15T10:00", "2026-03-15T11:00"],
                "shortwave_radiation": [410.0, 520.5],
            },
        })))
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/v1/forecast", get(forecast));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v1/forecast")
}

#[tokio::test]
async fn http_solar_forecast_proxies_upstream() {
    let stub_url = spawn_forecast_stub().await;
    let server = spawn_server(&[("FORECAST_URL", stub_url)]).await;

    let anonymous = cookie_client()
        .get(format!("{}/api/solar_forecast", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    let page = cookie_client()
        .get(format!("{}/solar_forecast", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(page.status().is_redirection());

    let client = logged_in_client(&server.base_url, "forecaster").await;
    let page = client
        .get(format!("{}/solar_forecast", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("forecast-form"));

    let ok: ForecastResponse = client
        .get(format!("{}/api/solar_forecast?lat=51.5&lon=-0.12", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ok.status, "success");
    assert_eq!(ok.forecast["hourly"]["shortwave_radiation"][1], 520.5);
    assert_eq!(ok.forecast["latitude"], "51.5");

    let defaulted: ForecastResponse = client
        .get(format!("{}/api/solar_forecast", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(defaulted.forecast["latitude"], "12.9716");

    let upstream_error = client
        .get(format!("{}/api/solar_forecast?lat=0&lon=0", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(upstream_error.status(), StatusCode::BAD_GATEWAY);
    let body: StatusResponse = upstream_error.json().await.unwrap();
    assert_eq!(body.status, "fail");
    assert_eq!(body.message, "API Error");

    let bad_coords = client
        .get(format!("{}/api/solar_forecast?lat=95&lon=0", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_coords.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_login_with_corrupt_stored_hash_is_server_error() {
    let data_path = unique_data_path();
    let store = serde_json::json!({
        "users": [{ "id": 1, "username": "legacy", "password_hash": "not-a-bcrypt-hash" }],
        "entries": [],
        "next_user_id": 2,
        "next_entry_id": 1,
    });
    std::fs::write(&data_path, serde_json::to_vec_pretty(&store).unwrap()).unwrap();
    let server = spawn_server(&[("APP_DATA_PATH", data_path)]).await;

    let response = cookie_client()
        .post(format!("{}/login", server.base_url))
        .json(&serde_json::json!({ "username": "legacy", "password": "anything" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: StatusResponse = response.json().await.unwrap();
    assert_eq!(body.status, "fail");
    assert_ne!(body.message, "Invalid credentials");
}
