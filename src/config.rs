//! Persisted user settings and the appearance images kept beside them.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::persistence::{
    get_json, put_json, LocalStore, BACKGROUND_IMAGE_KEY, HOME_IMAGE_KEY, SETTINGS_KEY,
};
use crate::sync::remote::SupabaseConfig;

/// Shown on the home screen until the user picks an image.
pub const DEFAULT_HOME_IMAGE: &str = "https://cdn-icons-png.flaticon.com/512/3050/3050525.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    /// Local store only.
    #[default]
    #[serde(rename = "none")]
    #[value(name = "none")]
    Local,
    Supabase,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub cloud_provider: CloudProvider,
    pub supabase_url: String,
    pub supabase_key: String,
    pub google_maps_api_key: String,
}

impl Settings {
    /// Stored settings, or defaults when none were saved.
    pub fn load<S: LocalStore + ?Sized>(store: &S) -> Result<Self> {
        Ok(get_json(store, SETTINGS_KEY)?.unwrap_or_default())
    }

    pub fn save<S: LocalStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        put_json(store, SETTINGS_KEY, self)
    }

    /// Applies command-line / environment values on top of the stored ones.
    /// A Supabase url given this way also selects Supabase as provider.
    pub fn with_overrides(mut self, url: Option<String>, key: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.supabase_url = url;
            self.cloud_provider = CloudProvider::Supabase;
        }
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.supabase_key = key;
        }
        self
    }

    /// Remote configuration, when Supabase is selected and fully configured.
    pub fn supabase(&self) -> Option<SupabaseConfig> {
        if self.cloud_provider != CloudProvider::Supabase {
            return None;
        }
        if self.supabase_url.trim().is_empty() || self.supabase_key.trim().is_empty() {
            log::warn!("[CONFIG] Supabase selected but url or key missing, staying local");
            return None;
        }
        Some(SupabaseConfig::new(
            self.supabase_url.trim(),
            self.supabase_key.trim(),
        ))
    }
}

pub fn home_image<S: LocalStore + ?Sized>(store: &S) -> Result<String> {
    Ok(get_json(store, HOME_IMAGE_KEY)?.unwrap_or_else(|| DEFAULT_HOME_IMAGE.to_string()))
}

/// `None` restores the default image.
pub fn set_home_image<S: LocalStore + ?Sized>(store: &mut S, url: Option<&str>) -> Result<()> {
    match url {
        Some(url) => put_json(store, HOME_IMAGE_KEY, &url),
        None => store.remove(HOME_IMAGE_KEY),
    }
}

pub fn background_image<S: LocalStore + ?Sized>(store: &S) -> Result<Option<String>> {
    get_json(store, BACKGROUND_IMAGE_KEY)
}

pub fn set_background_image<S: LocalStore + ?Sized>(
    store: &mut S,
    url: Option<&str>,
) -> Result<()> {
    match url {
        Some(url) => put_json(store, BACKGROUND_IMAGE_KEY, &url),
        None => store.remove(BACKGROUND_IMAGE_KEY),
    }
}
