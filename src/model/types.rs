//! Wire-shaped records. Field names follow the JSON document already stored
//! remotely, so everything serializes in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub city: String,
    pub zip: String,
    pub region: String,
}

impl Address {
    /// Single-line postal form, skipping empty parts.
    pub fn one_line(&self) -> String {
        let street = [self.street.trim(), self.number.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let city = [self.zip.trim(), self.city.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        [street.as_str(), city.as_str(), self.region.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `dare` is owed by the client, `avere` is paid by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "dare")]
    Debit,
    #[serde(rename = "avere")]
    Credit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_date: Option<String>,
}

impl Transaction {
    /// Signed amount: debits positive, credits negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Debit => self.amount,
            TransactionKind::Credit => -self.amount,
        }
    }
}

/// Event tag. Tags this crate does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClientEventKind {
    Appointment,
    Deadline,
    Note,
    Other(String),
}

impl From<String> for ClientEventKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "appointment" => ClientEventKind::Appointment,
            "deadline" => ClientEventKind::Deadline,
            "note" => ClientEventKind::Note,
            _ => ClientEventKind::Other(tag),
        }
    }
}

impl From<ClientEventKind> for String {
    fn from(kind: ClientEventKind) -> Self {
        match kind {
            ClientEventKind::Appointment => "appointment".to_string(),
            ClientEventKind::Deadline => "deadline".to_string(),
            ClientEventKind::Note => "note".to_string(),
            ClientEventKind::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEvent {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: ClientEventKind,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub company_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub vat_id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub coords: Coordinate,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub events: Vec<ClientEvent>,
    #[serde(default)]
    pub loyalty_points: f64,
    #[serde(default)]
    pub last_visit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// RFC 3339 string or epoch milliseconds. Anything else reads as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|ms| ms as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

impl Client {
    /// Outstanding balance: sum of debits minus sum of credits.
    pub fn balance(&self) -> f64 {
        self.transactions.iter().map(Transaction::signed_amount).sum()
    }

    pub fn contact_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    pub client_id: String,
    #[serde(default)]
    pub time: String,
}

/// Tour state. Unknown states are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TourStatus {
    #[default]
    Planned,
    Completed,
    Cancelled,
    Other(String),
}

impl From<String> for TourStatus {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "planned" => TourStatus::Planned,
            "completed" => TourStatus::Completed,
            "cancelled" => TourStatus::Cancelled,
            _ => TourStatus::Other(tag),
        }
    }
}

impl From<TourStatus> for String {
    fn from(status: TourStatus) -> Self {
        match status {
            TourStatus::Planned => "planned".to_string(),
            TourStatus::Completed => "completed".to_string(),
            TourStatus::Cancelled => "cancelled".to_string(),
            TourStatus::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub stops: Vec<RouteStop>,
    #[serde(default)]
    pub status: TourStatus,
}

/// The single payload synchronized with the remote store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub clients: Vec<Client>,
    pub tours: Vec<Tour>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty() && self.tours.is_empty()
    }
}
