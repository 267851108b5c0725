//! Remote store backed by a Supabase (PostgREST) table.
//!
//! The whole document lives in the `data` column of one row whose id is fixed
//! per application. Pull selects that row; push upserts it.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::model::Document;
use crate::sync::remote::RemoteStore;

pub const DEFAULT_TABLE: &str = "app_state";
pub const DEFAULT_RECORD_ID: &str = "haircrm_main";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub table: String,
    pub record_id: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            table: DEFAULT_TABLE.to_string(),
            record_id: DEFAULT_RECORD_ID.to_string(),
        }
    }

    /// `<url>/rest/v1/<table>`
    pub fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), self.table)
    }
}

#[derive(Debug, Deserialize)]
struct StateRow {
    #[serde(default)]
    data: Option<Document>,
}

/// First row's `data`, if any. Extra columns and document fields are ignored.
fn document_from_rows(body: &str) -> Result<Option<Document>> {
    let rows: Vec<StateRow> =
        serde_json::from_str(body).context("[REMOTE] malformed state rows")?;
    Ok(rows.into_iter().next().and_then(|row| row.data))
}

pub struct SupabaseRemote {
    http: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseRemote {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        if config.url.trim().is_empty() || config.anon_key.trim().is_empty() {
            bail!("[REMOTE] Supabase url and key are both required");
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("[REMOTE] building http client")?;
        Ok(Self { http, config })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }
}

#[async_trait]
impl RemoteStore for SupabaseRemote {
    async fn pull(&self) -> Result<Option<Document>> {
        let id_filter = format!("eq.{}", self.config.record_id);
        log::debug!("[REMOTE] GET {} id={}", self.config.endpoint(), id_filter);

        let response = self
            .request(self.http.get(self.config.endpoint()))
            .query(&[("id", id_filter.as_str()), ("select", "data")])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        document_from_rows(&body)
    }

    async fn push(&self, doc: &Document) -> Result<()> {
        let row = json!({
            "id": self.config.record_id,
            "data": doc,
            "updated_at": Utc::now(),
        });
        log::debug!("[REMOTE] upsert {} ({} clients)", self.config.record_id, doc.clients.len());

        self.request(self.http.post(self.config.endpoint()))
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "supabase"
    }

    fn target(&self) -> Option<String> {
        Some(format!("{}?id={}", self.config.endpoint(), self.config.record_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let config = SupabaseConfig::new("https://abc.supabase.co/", "key");
        assert_eq!(config.endpoint(), "https://abc.supabase.co/rest/v1/app_state");
    }

    #[test]
    fn missing_credentials_are_rejected() {
        assert!(SupabaseRemote::new(SupabaseConfig::new("", "key")).is_err());
        assert!(SupabaseRemote::new(SupabaseConfig::new("https://x.supabase.co", " ")).is_err());
    }

    #[test]
    fn empty_result_set_means_absent() {
        assert_eq!(document_from_rows("[]").unwrap(), None);
    }

    #[test]
    fn null_data_means_absent() {
        assert_eq!(document_from_rows(r#"[{"data": null}]"#).unwrap(), None);
    }

    #[test]
    fn row_data_is_parsed_and_extras_ignored() {
        let body = r#"[{
            "id": "haircrm_main",
            "updated_at": "2026-01-01T00:00:00Z",
            "data": {
                "clients": [{"id": "c1", "companyName": "Salone", "coords": {"lat": 45.0, "lng": 9.0}}],
                "tours": [{"id": "t1", "name": "Mon", "date": "2026-01-05",
                           "stops": [{"clientId": "c1", "time": "09:00"}], "status": "planned"}],
                "theme": "dark"
            }
        }]"#;

        let doc = document_from_rows(body).unwrap().unwrap();
        assert_eq!(doc.clients[0].company_name, "Salone");
        assert_eq!(doc.tours[0].stops[0].client_id, "c1");
    }

    #[test]
    fn unfamiliar_row_values_still_parse() {
        let body = r#"[{
            "data": {
                "clients": [{"id": "c1", "companyName": "Salone", "coords": {"lat": 45.0, "lng": 9.0},
                             "rating": 4.5, "createdAt": 1735689600000,
                             "events": [{"id": "e1", "date": "2026-01-05", "type": "visit"}]}],
                "tours": [{"id": "t1", "name": "Mon", "date": "2026-01-05", "stops": [], "status": "in_progress"}]
            }
        }]"#;

        let doc = document_from_rows(body).unwrap().unwrap();
        assert_eq!(doc.clients[0].rating, 4.5);
        assert!(doc.clients[0].created_at.is_some());
        assert_eq!(doc.tours[0].status, crate::model::TourStatus::Other("in_progress".into()));
    }

    #[test]
    fn same_record_has_same_target() {
        let a = SupabaseRemote::new(SupabaseConfig::new("https://abc.supabase.co/", "k1")).unwrap();
        let b = SupabaseRemote::new(SupabaseConfig::new("https://abc.supabase.co", "k2")).unwrap();
        let mut other = SupabaseConfig::new("https://abc.supabase.co", "k1");
        other.record_id = "second".to_string();
        let c = SupabaseRemote::new(other).unwrap();

        assert_eq!(a.target(), b.target());
        assert_ne!(a.target(), c.target());
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(document_from_rows("<html>").is_err());
    }
}
