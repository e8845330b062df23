use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_TEMPERATURE: f64 = 25.0;
pub const DEFAULT_HUMIDITY: f64 = 60.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyEntry {
    pub id: u64,
    pub user_id: u64,
    pub date: String,
    pub solar_energy: f64,
    pub electric_energy: f64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_humidity")]
    pub humidity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub entries: Vec<EnergyEntry>,
    #[serde(default = "first_id")]
    pub next_user_id: u64,
    #[serde(default = "first_id")]
    pub next_entry_id: u64,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            entries: Vec::new(),
            next_user_id: 1,
            next_entry_id: 1,
        }
    }
}

impl AppData {
    pub fn find_user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }

    pub fn user_by_id(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn add_user(&mut self, username: String, password_hash: String) -> &User {
        let id = self.next_user_id;
        self.next_user_id += 1;
        self.users.push(User {
            id,
            username,
            password_hash,
        });
        &self.users[self.users.len() - 1]
    }

    pub fn add_entry(&mut self, user_id: u64, entry: NewEntry) -> u64 {
        let id = self.next_entry_id;
        self.next_entry_id += 1;
        self.entries.push(EnergyEntry {
            id,
            user_id,
            date: entry.date.trim().to_string(),
            solar_energy: entry.solar_energy,
            electric_energy: entry.electric_energy,
            temperature: entry.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            humidity: entry.humidity.unwrap_or(DEFAULT_HUMIDITY),
        });
        id
    }

    /// Removes the entry only when it belongs to `user_id`.
    pub fn remove_entry(&mut self, user_id: u64, entry_id: u64) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !(entry.id == entry_id && entry.user_id == user_id));
        self.entries.len() != before
    }

    pub fn entries_for(&self, user_id: u64) -> Vec<&EnergyEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .collect()
    }
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_humidity() -> f64 {
    DEFAULT_HUMIDITY
}

fn first_id() -> u64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct NewEntry {
    pub date: String,
    pub solar_energy: f64,
    pub electric_energy: f64,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

/// The dashboard posts ids read from `data-id` attributes, so strings are accepted too.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawId::Number(id)) => Some(id),
        Some(RawId::Text(text)) => text.trim().parse().ok(),
        Some(RawId::Other(_)) | None => None,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct EnergyQuery {
    pub range: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryView {
    pub id: u64,
    pub date: String,
    pub solar_energy: f64,
    pub electric_energy: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl From<&EnergyEntry> for EntryView {
    fn from(entry: &EnergyEntry) -> Self {
        Self {
            id: entry.id,
            date: entry.date.clone(),
            solar_energy: entry.solar_energy,
            electric_energy: entry.electric_energy,
            temperature: entry.temperature,
            humidity: entry.humidity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnergyDataResponse {
    pub status: String,
    pub data: Vec<EntryView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavingsResponse {
    pub status: String,
    pub savings: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TipsResponse {
    pub status: String,
    pub tips: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompareResponse {
    pub status: String,
    pub solar_total: f64,
    pub electric_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub carbon: Vec<String>,
    pub cost: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub current_pattern: f64,
    pub next_hour_prediction: f64,
    pub carbon_footprint: f64,
    pub energy_cost: f64,
    pub recommendations: Recommendations,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub status: String,
    pub analysis: Analysis,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub status: String,
    pub forecast: serde_json::Value,
}
