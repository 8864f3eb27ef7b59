//! Bulk image upload: one blob, one row per tooth.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{require_patient, BulkError, BulkOutcome, BulkProgress, BulkResult, RollbackReport, ToothSelection};
use crate::db::{ImageStore, PatientStore};
use crate::effects::{BestEffort, SideEffect, SideEffectFailure};
use crate::media::{BlobDeletion, BlobStore, UploadRequest, UploadedBlob};
use crate::models::{required, ImageType, ToothImage};

#[derive(Debug, Clone, PartialEq)]
pub struct BulkImageRequest {
    pub clinic_id: String,
    pub patient_id: String,
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub image_type: ImageType,
    pub description: Option<String>,
    /// Overrides the default upload preset
    pub upload_preset: Option<String>,
}

/// Summary of a finished upload, shared by every row it created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkImageUpload {
    pub blob: UploadedBlob,
    pub images: Vec<ToothImage>,
}

/// Upload the image once and attach it to every selected tooth.
///
/// The patient must exist in the request's clinic and the upload must
/// succeed before any row is written. Rows are inserted one
/// tooth at a time; if any insert fails, the rows written so far are deleted
/// and exactly one delete of the uploaded blob is attempted.
pub fn run_bulk_image_upload<S, B, F>(
    store: &S,
    blobs: &B,
    selection: &ToothSelection,
    request: &BulkImageRequest,
    mut progress: F,
) -> BulkResult<BulkOutcome<BulkImageUpload>>
where
    S: PatientStore + ImageStore,
    B: BlobStore,
    F: FnMut(&BulkProgress),
{
    if selection.is_empty() {
        return Err(BulkError::EmptySelection);
    }
    let teeth = selection.teeth();
    required("clinic_id", &request.clinic_id)?;
    required("patient_id", &request.patient_id)?;
    if request.bytes.is_empty() {
        return Err(crate::models::ValidationError::Required("image").into());
    }
    require_patient(store, &request.clinic_id, &request.patient_id)?;

    let total = teeth.len();
    let mut upload = UploadRequest::for_teeth(request.bytes.clone(), request.file_name.clone(), &teeth);
    if let Some(preset) = &request.upload_preset {
        upload.upload_preset = Some(preset.clone());
    }

    progress(&BulkProgress::new(0, total, "Uploading image"));
    let blob = blobs.upload(&upload)?;
    info!(public_id = %blob.public_id, teeth = total, "image uploaded for bulk attach");

    let mut inserted: Vec<ToothImage> = Vec::with_capacity(total);
    for tooth in &teeth {
        progress(&BulkProgress::new(
            inserted.len(),
            total,
            format!("Attaching image to tooth {}", tooth),
        ));

        let written = ToothImage::new(
            &request.clinic_id,
            &request.patient_id,
            *tooth,
            &blob.secure_url,
            &blob.public_id,
            request.image_type,
            request.description.clone(),
            upload.size_bytes(),
        )
        .map_err(|e| e.to_string())
        .and_then(|image| {
            store
                .insert_image(&image)
                .map(|_| image)
                .map_err(|e| e.to_string())
        });

        match written {
            Ok(image) => inserted.push(image),
            Err(cause) => {
                error!(tooth = %tooth, error = %cause, "image insert failed, rolling back batch");
                progress(&BulkProgress::new(inserted.len(), total, "Rolling back attached images"));
                return Ok(BulkOutcome::RolledBack(undo_images(store, blobs, &inserted, &blob, cause)));
            }
        }
    }

    progress(&BulkProgress::new(total, total, format!("Image attached to {} teeth", total)));
    Ok(BulkOutcome::Succeeded(BestEffort::new(BulkImageUpload {
        blob,
        images: inserted,
    })))
}

fn undo_images<S: ImageStore, B: BlobStore>(
    store: &S,
    blobs: &B,
    inserted: &[ToothImage],
    blob: &UploadedBlob,
    cause: String,
) -> RollbackReport {
    let mut report = RollbackReport {
        cause,
        undone: 0,
        failures: Vec::new(),
    };

    for image in inserted {
        match store.delete_image(&image.clinic_id, &image.id) {
            Ok(_) => report.undone += 1,
            Err(e) => {
                error!(image_id = %image.id, error = %e, "rollback delete failed");
                report.failures.push(SideEffectFailure {
                    effect: SideEffect::RollbackDelete,
                    target: image.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    // An orphaned blob is only a storage cost, so this never escalates.
    match blobs.delete(&blob.public_id) {
        Ok(BlobDeletion::Deleted) => info!(public_id = %blob.public_id, "uploaded blob removed"),
        Ok(BlobDeletion::Skipped(reason)) => {
            warn!(public_id = %blob.public_id, reason = %reason, "uploaded blob left in storage");
            report.failures.push(SideEffectFailure {
                effect: SideEffect::BlobDelete,
                target: blob.public_id.clone(),
                reason,
            });
        }
        Err(e) => {
            warn!(public_id = %blob.public_id, error = %e, "failed to remove uploaded blob");
            report.failures.push(SideEffectFailure {
                effect: SideEffect::BlobDelete,
                target: blob.public_id.clone(),
                reason: e.to_string(),
            });
        }
    }

    report
}
