//! Environment configuration for the remote collaborators.

use std::sync::Arc;

use dental_core::media::{MediaError, MediaResult, DEFAULT_UPLOAD_PRESET};

pub const CLOUD_NAME_VAR: &str = "CLOUDINARY_CLOUD_NAME";
pub const API_KEY_VAR: &str = "CLOUDINARY_API_KEY";
pub const API_SECRET_VAR: &str = "CLOUDINARY_API_SECRET";
pub const UPLOAD_PRESET_VAR: &str = "CLOUDINARY_UPLOAD_PRESET";
pub const WHATSAPP_TOKEN_VAR: &str = "WHATSAPP_API_TOKEN";
pub const WHATSAPP_PHONE_ID_VAR: &str = "WHATSAPP_PHONE_NUMBER_ID";

/// Country calling code prepended to canonical 10-digit numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Source of configuration values, looked up by variable name.
pub type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Lookup backed by the process environment. Blank values count as unset.
pub fn env_lookup() -> Lookup {
    Arc::new(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub upload_preset: String,
}

impl MediaConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup().as_ref())
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            cloud_name: lookup(CLOUD_NAME_VAR),
            api_key: lookup(API_KEY_VAR),
            api_secret: lookup(API_SECRET_VAR),
            upload_preset: lookup(UPLOAD_PRESET_VAR).unwrap_or_else(|| DEFAULT_UPLOAD_PRESET.to_string()),
        }
    }

    /// Uploads cannot proceed without the account name.
    pub fn require_cloud_name(&self) -> MediaResult<&str> {
        self.cloud_name
            .as_deref()
            .ok_or(MediaError::MissingConfig(CLOUD_NAME_VAR))
    }

    /// Key and secret for signed deletes, if both are set.
    pub fn delete_credentials(&self) -> Option<(&str, &str)> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => Some((key, secret)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingConfig {
    pub api_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub country_code: String,
}

impl MessagingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup().as_ref())
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            api_token: lookup(WHATSAPP_TOKEN_VAR),
            phone_number_id: lookup(WHATSAPP_PHONE_ID_VAR),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.api_token, &self.phone_number_id) {
            (Some(token), Some(id)) => Some((token, id)),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn lookup_from(pairs: &[(&str, &str)]) -> Lookup {
    let owned: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Arc::new(move |key| {
        owned
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
}
