use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key-value namespace every résumé record lives under.
pub const RECORD_NAMESPACE: &str = "resume";

/// Pattern enumerating every record key (`resume:*`).
pub fn record_pattern() -> String {
    format!("{RECORD_NAMESPACE}:*")
}

/// Key of a single record (`resume:<id>`).
pub fn record_key(id: &str) -> String {
    format!("{RECORD_NAMESPACE}:{id}")
}

/// One analyzed résumé, as written by the analysis pipeline.
///
/// Stored as JSON under `resume:<id>`. The two paths point into the file store;
/// either may be missing for records written before the upload finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_path: Option<String>,
    #[serde(default)]
    pub feedback: Value,
}

impl Record {
    pub fn key(&self) -> String {
        record_key(&self.id)
    }

    /// Blob paths owned by this record, skipping absent or blank ones.
    pub fn blob_paths(&self) -> (Option<&str>, Option<&str>) {
        fn present(path: &Option<String>) -> Option<&str> {
            path.as_deref().filter(|p| !p.trim().is_empty())
        }
        (present(&self.image_path), present(&self.resume_path))
    }
}
