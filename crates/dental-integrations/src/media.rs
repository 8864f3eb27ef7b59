//! Cloudinary-backed image storage.
//!
//! Uploads are unsigned and go through an upload preset. Deletes are signed
//! with the API secret; without delete credentials they are skipped rather
//! than failed, since an orphaned blob only costs storage.

use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use dental_core::media::{BlobDeletion, BlobStore, MediaError, MediaResult, UploadRequest, UploadedBlob};

use crate::config::{env_lookup, Lookup, MediaConfig};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

pub fn upload_url(cloud_name: &str) -> String {
    format!("{}/{}/image/upload", API_BASE, cloud_name)
}

pub fn destroy_url(cloud_name: &str) -> String {
    format!("{}/{}/image/destroy", API_BASE, cloud_name)
}

/// Request signature: parameters sorted by name, joined as `k=v&k=v`, with
/// the secret appended, hashed with SHA-256 and hex encoded.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Form fields of a signed destroy call.
pub fn destroy_form(public_id: &str, timestamp: i64, api_key: &str, api_secret: &str) -> Vec<(String, String)> {
    let timestamp = timestamp.to_string();
    let signature = sign(&[("public_id", public_id), ("timestamp", &timestamp)], api_secret);
    vec![
        ("public_id".to_string(), public_id.to_string()),
        ("timestamp".to_string(), timestamp),
        ("api_key".to_string(), api_key.to_string()),
        ("signature".to_string(), signature),
        ("signature_algorithm".to_string(), "sha256".to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: Option<String>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub fn parse_upload_response(body: &str) -> MediaResult<UploadedBlob> {
    let response: UploadResponse =
        serde_json::from_str(body).map_err(|e| MediaError::InvalidResponse(e.to_string()))?;
    if let Some(error) = response.error {
        return Err(MediaError::Upload(error.message));
    }
    match (response.secure_url, response.public_id) {
        (Some(secure_url), Some(public_id)) => Ok(UploadedBlob { secure_url, public_id }),
        _ => Err(MediaError::InvalidResponse(
            "upload response without secure_url or public_id".to_string(),
        )),
    }
}

pub fn parse_destroy_response(body: &str) -> MediaResult<BlobDeletion> {
    let response: DestroyResponse =
        serde_json::from_str(body).map_err(|e| MediaError::InvalidResponse(e.to_string()))?;
    if let Some(error) = response.error {
        return Err(MediaError::Delete(error.message));
    }
    match response.result.as_deref() {
        Some("ok") => Ok(BlobDeletion::Deleted),
        // Already gone counts as done
        Some("not found") => Ok(BlobDeletion::Deleted),
        Some(other) => Err(MediaError::Delete(other.to_string())),
        None => Err(MediaError::InvalidResponse("destroy response without result".to_string())),
    }
}

/// A preset named on the request wins over the configured one.
fn resolve_preset<'a>(request: &'a UploadRequest, config: &'a MediaConfig) -> &'a str {
    request.upload_preset.as_deref().unwrap_or(config.upload_preset.as_str())
}

/// Remote blob store. Configuration is read on every call.
pub struct CloudinaryStore {
    lookup: Lookup,
}

impl CloudinaryStore {
    pub fn from_env() -> Self {
        Self { lookup: env_lookup() }
    }

    pub fn with_lookup(lookup: Lookup) -> Self {
        Self { lookup }
    }

    fn config(&self) -> MediaConfig {
        MediaConfig::from_lookup(self.lookup.as_ref())
    }
}

impl BlobStore for CloudinaryStore {
    fn upload(&self, request: &UploadRequest) -> MediaResult<UploadedBlob> {
        let config = self.config();
        let cloud_name = config.require_cloud_name()?;

        let preset = resolve_preset(request, &config);
        debug!(folder = %request.folder, size = request.bytes.len(), "uploading image");

        let body = transport::upload(&upload_url(cloud_name), request, preset)
            .map_err(|e| MediaError::Upload(format!("{:#}", e)))?;
        let blob = parse_upload_response(&body)?;
        info!(public_id = %blob.public_id, "image uploaded");
        Ok(blob)
    }

    fn delete(&self, public_id: &str) -> MediaResult<BlobDeletion> {
        let config = self.config();
        let Some((api_key, api_secret)) = config.delete_credentials() else {
            warn!(public_id, "image delete skipped, storage credentials not configured");
            return Ok(BlobDeletion::Skipped("delete credentials not configured".to_string()));
        };
        let cloud_name = match config.require_cloud_name() {
            Ok(name) => name,
            Err(e) => {
                warn!(public_id, "image delete skipped, cloud name not configured");
                return Ok(BlobDeletion::Skipped(e.to_string()));
            }
        };

        let form = destroy_form(public_id, Utc::now().timestamp(), api_key, api_secret);
        let body = transport::post_form(&destroy_url(cloud_name), &form)
            .map_err(|e| MediaError::Delete(format!("{:#}", e)))?;
        parse_destroy_response(&body)
    }
}

#[cfg(feature = "http")]
mod transport {
    use anyhow::{Context, Result};
    use reqwest::blocking::{multipart, Client};

    use dental_core::media::UploadRequest;

    pub fn upload(url: &str, request: &UploadRequest, preset: &str) -> Result<String> {
        let file = multipart::Part::bytes(request.bytes.clone()).file_name(request.file_name.clone());
        let form = multipart::Form::new()
            .part("file", file)
            .text("upload_preset", preset.to_string())
            .text("folder", request.folder.clone())
            .text("tags", request.tags.join(","));

        Client::new()
            .post(url)
            .multipart(form)
            .send()
            .context("upload request failed")?
            .text()
            .context("reading upload response")
    }

    pub fn post_form(url: &str, form: &[(String, String)]) -> Result<String> {
        Client::new()
            .post(url)
            .form(form)
            .send()
            .context("storage request failed")?
            .text()
            .context("reading storage response")
    }
}

#[cfg(not(feature = "http"))]
mod transport {
    use anyhow::{bail, Result};

    use dental_core::media::UploadRequest;

    pub fn upload(_url: &str, _request: &UploadRequest, _preset: &str) -> Result<String> {
        bail!("built without the `http` feature")
    }

    pub fn post_form(_url: &str, _form: &[(String, String)]) -> Result<String> {
        bail!("built without the `http` feature")
    }
}
