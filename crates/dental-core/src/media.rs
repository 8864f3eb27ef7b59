//! Remote image storage collaborator.
//!
//! One uploaded blob may back many [`ToothImage`](crate::models::ToothImage)
//! rows; the public id returned here is what a later delete needs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ToothNumber;

/// Upload preset used when neither the request nor the environment names one.
pub const DEFAULT_UPLOAD_PRESET: &str = "dental_images";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Delete failed: {0}")]
    Delete(String),

    #[error("Unexpected storage response: {0}")]
    InvalidResponse(String),
}

pub type MediaResult<T> = Result<T, MediaError>;

/// A binary payload to store remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub file_name: String,
    /// `None` defers to the store's configured preset
    pub upload_preset: Option<String>,
    pub folder: String,
    pub tags: Vec<String>,
}

impl UploadRequest {
    /// Request for an image filed under one tooth (`teeth/NN`).
    pub fn for_tooth(bytes: Vec<u8>, file_name: impl Into<String>, tooth: ToothNumber) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            upload_preset: None,
            folder: tooth_folder(tooth),
            tags: vec![format!("tooth_{}", tooth.code())],
        }
    }

    /// Request for an image shared by several teeth.
    ///
    /// Filed under the first tooth's folder and tagged with every tooth.
    pub fn for_teeth(bytes: Vec<u8>, file_name: impl Into<String>, teeth: &[ToothNumber]) -> Self {
        let folder = teeth
            .first()
            .map(|t| tooth_folder(*t))
            .unwrap_or_else(|| "teeth".to_string());
        let mut tags: Vec<String> = teeth.iter().map(|t| format!("tooth_{}", t.code())).collect();
        tags.push("bulk_upload".to_string());
        Self {
            bytes,
            file_name: file_name.into(),
            upload_preset: None,
            folder,
            tags,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

pub fn tooth_folder(tooth: ToothNumber) -> String {
    format!("teeth/{}", tooth.code())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedBlob {
    pub secure_url: String,
    pub public_id: String,
}

/// Result of a blob delete that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobDeletion {
    Deleted,
    /// Nothing was attempted, e.g. delete credentials are not configured
    Skipped(String),
}

pub trait BlobStore {
    fn upload(&self, request: &UploadRequest) -> MediaResult<UploadedBlob>;
    fn delete(&self, public_id: &str) -> MediaResult<BlobDeletion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tooth_folder() {
        let tooth = ToothNumber::new(7).unwrap();
        let request = UploadRequest::for_tooth(vec![1, 2, 3], "a.jpg", tooth);
        assert_eq!(request.folder, "teeth/07");
        assert_eq!(request.tags, vec!["tooth_07".to_string()]);
        assert_eq!(request.upload_preset, None);
        assert_eq!(request.size_bytes(), 3);
    }

    #[test]
    fn test_shared_upload_tags_every_tooth() {
        let teeth = [ToothNumber::new(3).unwrap(), ToothNumber::new(14).unwrap()];
        let request = UploadRequest::for_teeth(vec![0; 8], "x.png", &teeth);
        assert_eq!(request.folder, "teeth/03");
        assert_eq!(request.tags, vec!["tooth_03", "tooth_14", "bulk_upload"]);
    }
}
