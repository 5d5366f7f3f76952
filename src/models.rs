use serde_derive::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

// Same horizon tokio uses for its own far-future deadlines.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(86400 * 365 * 30);

/// Paged list envelope used by the `/meters/` and `/readings/` endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiList<T> {
    pub count: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Body of a successful `/access-token/` call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub token_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
}

/// A bearer token together with the instant it stops being valid.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub user_id: String,
    pub expires_at: Instant,
}

impl AccessToken {
    /// Lifetimes beyond the far-future horizon are clamped to it.
    pub fn from_response(response: AccessTokenResponse, issued_at: Instant) -> Self {
        let lifetime = Duration::from_secs(response.expires_in).min(MAX_TOKEN_LIFETIME);
        Self {
            expires_at: issued_at + lifetime,
            access_token: response.access_token,
            token_type: response.token_type,
            user_id: response.user_id,
        }
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        self.expires_at > now
    }

    /// Value for the `Authorization` header, e.g. `Bearer abc123`.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Utility type a meter measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalMedium {
    Electricity,
    Gas,
    Water,
}

impl PhysicalMedium {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "electricity" => Some(Self::Electricity),
            "gas" => Some(Self::Gas),
            "water" => Some(Self::Water),
            _ => None,
        }
    }
}

/// A meter as listed by `/meters/`.
///
/// Known fields are mapped explicitly; anything else the API sends is kept
/// in `extra`. `readings` is filled in by the reading fetcher and holds only
/// the readings of the latest fetch.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
pub struct Meter {
    pub url: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub meter_id: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub physical_medium: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub physical_unit: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub appearance: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub created: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub modified: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub resource_id: Option<u64>,
    #[serde(default, deserialize_with = "optional_text")]
    pub changed_hash: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub zip_code: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub location_in_building: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub fraction_digits: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub integer_digits: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_double_tariff: Option<bool>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
    #[serde(skip)]
    pub readings: Vec<Reading>,
}

impl Meter {
    pub fn medium(&self) -> Option<PhysicalMedium> {
        self.physical_medium.as_deref().and_then(PhysicalMedium::parse)
    }

    pub fn latest_reading(&self) -> Option<&Reading> {
        // The API lists readings newest first.
        self.readings.first()
    }
}

/// A single reading as listed by `/readings/`.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
pub struct Reading {
    pub resource_id: u64,
    pub reading_date: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    /// URL of the meter this reading belongs to.
    pub meter: String,
}

/// Accepts either a JSON string or a JSON number and keeps it as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match <Value as serde::Deserialize>::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Scalar as text; `null`, arrays and objects become `None`.
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match <Value as serde::Deserialize>::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Ok(None),
    }
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(optional_text(deserializer)?.unwrap_or_default())
}

/// Decodes `T` from a number or a numeric string; anything else becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned + std::str::FromStr,
{
    let value = <Value as serde::Deserialize>::deserialize(deserializer)?;
    if let Value::String(s) = &value {
        return Ok(s.trim().parse().ok());
    }
    Ok(serde_json::from_value(value).ok())
}
