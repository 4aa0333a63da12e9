//! Per-record deletion steps shared by every workflow.
//!
//! Order per record: the key-value delete is awaited first and is the only
//! step whose failure counts. The image and résumé blobs are then deleted
//! concurrently; both are awaited and neither error propagates.

use tracing::warn;

use crate::models::record::Record;
use crate::storage::{FileStore, KvStore, StoreError};

/// Deletes one blob, returning the path if it was left behind.
async fn delete_blob(files: &dyn FileStore, record_id: &str, path: Option<&str>) -> Option<String> {
    let path = path?;
    match files.delete(path).await {
        Ok(()) => None,
        Err(e) => {
            warn!("Blob {path} of record {record_id} not deleted: {e}");
            Some(path.to_string())
        }
    }
}

/// Deletes both blobs of a record concurrently. Returns the orphaned paths.
pub async fn delete_blobs(files: &dyn FileStore, record: &Record) -> Vec<String> {
    let (image, resume) = record.blob_paths();
    let (image, resume) = tokio::join!(
        delete_blob(files, &record.id, image),
        delete_blob(files, &record.id, resume),
    );
    image.into_iter().chain(resume).collect()
}

/// Removes a record: key-value entry first, then its blobs.
/// `Err` means the record still exists; `Ok` carries any orphaned blob paths.
pub async fn delete_record(
    kv: &dyn KvStore,
    files: &dyn FileStore,
    record: &Record,
) -> Result<Vec<String>, StoreError> {
    kv.delete(&record.key()).await?;
    Ok(delete_blobs(files, record).await)
}
