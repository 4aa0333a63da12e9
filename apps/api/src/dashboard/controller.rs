//! Dashboard: the in-memory view of one session plus the workflows that
//! mutate it.
//!
//! State here is only ever changed after the key-value store has confirmed a
//! delete. A failed authoritative delete leaves records and selection exactly
//! as they were, so the caller can retry or reload.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::dashboard::deletion::{delete_blobs, delete_record};
use crate::dashboard::loader::fetch_records;
use crate::dashboard::selection::{Selection, SelectionState};
use crate::errors::AppError;
use crate::models::record::Record;
use crate::storage::{FileStore, KvStore};

// ────────────────────────────────────────────────────────────────────────────
// Views and reports
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub records: Vec<Record>,
    /// Selected ids in list order.
    pub selected: Vec<String>,
    pub selection_state: SelectionState,
    /// Set when the last load could not reach the store.
    pub load_error: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub id: String,
    pub orphaned_blobs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDelete {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDelete>,
    pub orphaned_blobs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WipeReport {
    /// Records that were loaded when the namespace was cleared.
    pub cleared: usize,
    pub orphaned_blobs: Vec<String>,
}

/// Result of the "delete selected" action, which wipes everything when the
/// whole list is selected.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BulkOutcome {
    Batch(BatchReport),
    Wipe(WipeReport),
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

pub struct Dashboard {
    kv: Arc<dyn KvStore>,
    files: Arc<dyn FileStore>,
    records: Vec<Record>,
    selection: Selection,
    load_error: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
}

impl Dashboard {
    pub fn new(kv: Arc<dyn KvStore>, files: Arc<dyn FileStore>) -> Self {
        Self {
            kv,
            files,
            records: Vec::new(),
            selection: Selection::default(),
            load_error: None,
            loaded_at: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    #[cfg(test)]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            records: self.records.clone(),
            selected: self.selection.ordered_ids(&self.records),
            selection_state: self.selection.state(self.records.len()),
            load_error: self.load_error.clone(),
            loaded_at: self.loaded_at,
        }
    }

    /// Replaces the list with a fresh read of the store and drops the
    /// selection. An unreachable store leaves an empty list and `load_error`.
    pub async fn reload(&mut self) {
        self.selection.clear();
        self.loaded_at = Some(Utc::now());
        match fetch_records(self.kv.as_ref()).await {
            Ok(loaded) => {
                info!(
                    "Loaded {} records ({} entries skipped)",
                    loaded.records.len(),
                    loaded.skipped
                );
                self.records = loaded.records;
                self.load_error = None;
            }
            Err(e) => {
                warn!("Record load failed: {e}");
                self.records.clear();
                self.load_error = Some(e.to_string());
            }
        }
    }

    /// Flips one loaded id. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> Result<bool, AppError> {
        if self.record(id).is_none() {
            return Err(AppError::NotFound(format!("Record {id} is not loaded")));
        }
        Ok(self.selection.toggle(id))
    }

    pub fn toggle_all(&mut self) {
        self.selection.toggle_all(&self.records);
    }

    /// Deletes one loaded record. An id that is not loaded is a no-op.
    pub async fn delete_one(&mut self, id: &str) -> Result<DeleteReport, AppError> {
        let Some(record) = self.record(id).cloned() else {
            warn!("Delete requested for record {id}, which is not loaded");
            return Err(AppError::NotFound(format!("Record {id} is not loaded")));
        };

        let orphaned_blobs =
            delete_record(self.kv.as_ref(), self.files.as_ref(), &record).await?;
        self.forget(&[record.id.clone()]);

        info!(
            "Deleted record {id} ({} orphaned blobs)",
            orphaned_blobs.len()
        );
        Ok(DeleteReport {
            id: record.id,
            orphaned_blobs,
        })
    }

    /// The bulk action behind "delete selected". A selection covering the
    /// whole list goes through [`Dashboard::delete_all`].
    pub async fn delete_selected(&mut self) -> Result<BulkOutcome, AppError> {
        if self.selection.is_empty() {
            return Err(AppError::Validation("No records selected".to_string()));
        }
        if self.selection.len() == self.records.len() {
            return self.delete_all().await.map(BulkOutcome::Wipe);
        }
        Ok(BulkOutcome::Batch(self.delete_batch().await?))
    }

    /// Deletes each selected record in list order, one at a time.
    /// Per-record failures are collected rather than returned.
    pub async fn delete_batch(&mut self) -> Result<BatchReport, AppError> {
        let ids = self.selection.ordered_ids(&self.records);
        if ids.is_empty() {
            return Err(AppError::Validation("No records selected".to_string()));
        }

        let mut report = BatchReport::default();
        for id in ids {
            let Some(record) = self.record(&id).cloned() else {
                continue;
            };
            match delete_record(self.kv.as_ref(), self.files.as_ref(), &record).await {
                Ok(orphaned) => {
                    report.orphaned_blobs.extend(orphaned);
                    report.deleted.push(id);
                }
                Err(e) => {
                    warn!("Batch delete of record {id} failed: {e}");
                    report.failed.push(FailedDelete {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.forget(&report.deleted);
        info!(
            "Batch delete: {} deleted, {} failed, {} orphaned blobs",
            report.deleted.len(),
            report.failed.len(),
            report.orphaned_blobs.len()
        );
        Ok(report)
    }

    /// Clears the whole record namespace in one store call, then removes the
    /// blobs of every loaded record. The view ends up empty once the clear
    /// succeeds, whatever happens to the blobs.
    pub async fn delete_all(&mut self) -> Result<WipeReport, AppError> {
        self.kv.clear().await?;

        let mut report = WipeReport {
            cleared: self.records.len(),
            orphaned_blobs: Vec::new(),
        };
        for record in &self.records {
            report
                .orphaned_blobs
                .extend(delete_blobs(self.files.as_ref(), record).await);
        }

        self.records.clear();
        self.selection.clear();
        info!(
            "Wiped {} records ({} orphaned blobs)",
            report.cleared,
            report.orphaned_blobs.len()
        );
        Ok(report)
    }

    /// Drops deleted records from the list and the selection.
    fn forget(&mut self, ids: &[String]) {
        let gone: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.records.retain(|r| !gone.contains(r.id.as_str()));
        for id in ids {
            self.selection.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryFileStore, MemoryKvStore};
    use bytes::Bytes;
    use serde_json::json;

    struct Fixture {
        kv: Arc<MemoryKvStore>,
        files: Arc<MemoryFileStore>,
        dashboard: Dashboard,
    }

    /// Seeds one record per id, each with an image and a résumé blob.
    async fn fixture(ids: &[&str]) -> Fixture {
        let kv = Arc::new(MemoryKvStore::new());
        let files = Arc::new(MemoryFileStore::new());
        for id in ids {
            let value = json!({
                "id": id,
                "companyName": format!("Company {id}"),
                "jobTitle": "Engineer",
                "imagePath": format!("/imgs/{id}.png"),
                "resumePath": format!("/pdfs/{id}.pdf"),
                "feedback": { "overallScore": 70 }
            });
            kv.put(format!("resume:{id}"), value.to_string());
            files.put(format!("/imgs/{id}.png"), Bytes::from_static(b"img"));
            files.put(format!("/pdfs/{id}.pdf"), Bytes::from_static(b"pdf"));
        }
        let mut dashboard = Dashboard::new(kv.clone(), files.clone());
        dashboard.reload().await;
        Fixture {
            kv,
            files,
            dashboard,
        }
    }

    fn ids(d: &Dashboard) -> Vec<&str> {
        d.records().iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_reload_skips_bad_entries_and_keeps_order() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.put("resume:b", r#"{"id":"b"}"#);
        kv.put("resume:x", "garbage");
        kv.put("resume:t", "");
        kv.put("resume:a", r#"{"id":"a"}"#);
        let mut d = Dashboard::new(kv, Arc::new(MemoryFileStore::new()));
        d.reload().await;
        assert_eq!(ids(&d), vec!["b", "a"]);
        assert!(d.view().load_error.is_none());
        assert!(d.is_loaded());
    }

    #[tokio::test]
    async fn test_record_filed_under_foreign_key_is_never_listed() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.put("resume:x", r#"{"id":"y"}"#);
        let mut d = Dashboard::new(kv.clone(), Arc::new(MemoryFileStore::new()));
        d.reload().await;
        assert!(d.records().is_empty());

        let err = d.delete_one("y").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(kv.delete_calls(), 0);
        assert!(kv.contains("resume:x"));
    }

    #[tokio::test]
    async fn test_unreachable_store_gives_empty_list_and_error_state() {
        let mut f = fixture(&["a"]).await;
        f.kv.set_unavailable(true);
        f.dashboard.reload().await;
        let view = f.dashboard.view();
        assert!(view.records.is_empty());
        assert!(view.load_error.is_some());

        // Retry once the store is back.
        f.kv.set_unavailable(false);
        f.dashboard.reload().await;
        assert_eq!(ids(&f.dashboard), vec!["a"]);
        assert!(f.dashboard.view().load_error.is_none());
    }

    #[tokio::test]
    async fn test_delete_one_removes_record_everywhere() {
        let mut f = fixture(&["a", "b"]).await;
        f.dashboard.toggle("a").unwrap();
        let report = f.dashboard.delete_one("a").await.unwrap();
        assert!(report.orphaned_blobs.is_empty());
        assert_eq!(ids(&f.dashboard), vec!["b"]);
        assert!(f.dashboard.view().selected.is_empty());
        assert!(!f.kv.contains("resume:a"));
        assert!(!f.files.contains("/imgs/a.png"));

        f.dashboard.reload().await;
        assert_eq!(ids(&f.dashboard), vec!["b"]);
    }

    #[tokio::test]
    async fn test_delete_one_kv_failure_leaves_state_unchanged() {
        let mut f = fixture(&["a", "b"]).await;
        f.dashboard.toggle("a").unwrap();
        f.kv.fail_delete("resume:a");

        let err = f.dashboard.delete_one("a").await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert_eq!(ids(&f.dashboard), vec!["a", "b"]);
        assert_eq!(f.dashboard.view().selected, vec!["a"]);
        assert!(f.files.contains("/imgs/a.png"));
    }

    #[tokio::test]
    async fn test_delete_one_with_failing_blob_still_deletes() {
        let mut f = fixture(&["a"]).await;
        f.files.fail_delete("/pdfs/a.pdf");
        let report = f.dashboard.delete_one("a").await.unwrap();
        assert_eq!(report.orphaned_blobs, vec!["/pdfs/a.pdf".to_string()]);
        assert!(f.dashboard.records().is_empty());
        assert!(!f.files.contains("/imgs/a.png"));
    }

    #[tokio::test]
    async fn test_delete_one_unknown_id_is_noop() {
        let mut f = fixture(&["a"]).await;
        let err = f.dashboard.delete_one("zzz").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(f.kv.delete_calls(), 0);
        assert_eq!(ids(&f.dashboard), vec!["a"]);
    }

    #[tokio::test]
    async fn test_batch_with_one_failure_keeps_failed_selected() {
        let mut f = fixture(&["a", "b", "c", "d"]).await;
        for id in ["a", "b", "c"] {
            f.dashboard.toggle(id).unwrap();
        }
        f.kv.fail_delete("resume:b");

        let report = f.dashboard.delete_batch().await.unwrap();
        assert_eq!(report.deleted, vec!["a", "c"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "b");
        assert_eq!(ids(&f.dashboard), vec!["b", "d"]);
        assert_eq!(f.dashboard.view().selected, vec!["b"]);
        assert!(f.kv.contains("resume:b"));
    }

    #[tokio::test]
    async fn test_batch_scenario_unselected_record_with_missing_blobs() {
        let mut f = fixture(&["A", "B", "C"]).await;
        // B's blobs are already gone from the file store.
        f.files.delete("/imgs/B.png").await.unwrap();
        f.files.delete("/pdfs/B.pdf").await.unwrap();
        f.dashboard.toggle("A").unwrap();
        f.dashboard.toggle("C").unwrap();

        let outcome = f.dashboard.delete_selected().await.unwrap();
        assert!(matches!(outcome, BulkOutcome::Batch(_)));
        assert_eq!(ids(&f.dashboard), vec!["B"]);
        assert!(f.dashboard.view().selected.is_empty());
        assert!(f.kv.contains("resume:B"));
        assert_eq!(f.kv.clear_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_selected_requires_selection() {
        let mut f = fixture(&["a"]).await;
        let err = f.dashboard.delete_selected().await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.kv.delete_calls() + f.kv.clear_calls(), 0);
    }

    #[tokio::test]
    async fn test_select_all_routes_to_bulk_clear() {
        let mut f = fixture(&["a", "b", "c"]).await;
        f.dashboard.toggle_all();
        let outcome = f.dashboard.delete_selected().await.unwrap();

        assert!(matches!(outcome, BulkOutcome::Wipe(WipeReport { cleared: 3, .. })));
        assert_eq!(f.kv.clear_calls(), 1);
        assert_eq!(f.kv.delete_calls(), 0);
        assert!(f.dashboard.records().is_empty());
        assert_eq!(f.kv.len(), 0);
    }

    #[tokio::test]
    async fn test_delete_all_ignores_blob_failures() {
        let mut f = fixture(&["A", "B", "C"]).await;
        f.files.fail_delete("/imgs/A.png");
        f.dashboard.toggle("B").unwrap();

        let report = f.dashboard.delete_all().await.unwrap();
        assert_eq!(report.orphaned_blobs, vec!["/imgs/A.png".to_string()]);
        let view = f.dashboard.view();
        assert!(view.records.is_empty());
        assert!(view.selected.is_empty());
        // Every other blob was still attempted.
        assert_eq!(f.files.delete_attempts().len(), 6);
        assert!(!f.files.contains("/pdfs/A.pdf"));
    }

    #[tokio::test]
    async fn test_delete_all_clear_failure_changes_nothing() {
        let mut f = fixture(&["a", "b"]).await;
        f.dashboard.toggle("a").unwrap();
        f.kv.fail_clear(true);

        assert!(f.dashboard.delete_all().await.is_err());
        assert_eq!(ids(&f.dashboard), vec!["a", "b"]);
        assert_eq!(f.dashboard.view().selected, vec!["a"]);
        assert!(f.files.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_is_rejected() {
        let mut f = fixture(&["a"]).await;
        assert!(f.dashboard.toggle("nope").is_err());
        assert_eq!(f.dashboard.view().selection_state, SelectionState::None);
    }

    #[tokio::test]
    async fn test_reload_clears_selection() {
        let mut f = fixture(&["a", "b"]).await;
        f.dashboard.toggle_all();
        assert_eq!(f.dashboard.view().selection_state, SelectionState::All);
        f.dashboard.reload().await;
        assert_eq!(f.dashboard.view().selection_state, SelectionState::None);
    }
}
