//! Record Loader: turns the raw `resume:*` entries into the ordered record list.
//!
//! Malformed and empty entries never become records. Empty values are treated
//! as tombstones and skipped quietly; unparseable ones are logged at warn.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::models::record::{record_key, record_pattern, Record};
use crate::storage::{KvEntry, KvStore, StoreError};

#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<Record>,
    /// Entries excluded as empty, malformed, misfiled or duplicate.
    pub skipped: usize,
}

/// Parses entries in store order. Never fails: bad entries are dropped.
pub fn parse_entries(entries: Vec<KvEntry>) -> LoadedRecords {
    let mut loaded = LoadedRecords::default();
    let mut seen_ids = HashSet::new();

    for entry in entries {
        let raw = match entry.value.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                debug!("Skipping empty entry {}", entry.key);
                loaded.skipped += 1;
                continue;
            }
        };

        let record: Record = match serde_json::from_str(raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed entry {}: {e}", entry.key);
                loaded.skipped += 1;
                continue;
            }
        };

        if record.id.trim().is_empty() {
            warn!("Skipping entry {} with empty id", entry.key);
            loaded.skipped += 1;
            continue;
        }
        // Deletes address `resume:<id>`, so an entry filed under any other
        // key could never actually be removed.
        if entry.key != record_key(&record.id) {
            warn!(
                "Skipping entry {}: id '{}' does not match its key",
                entry.key, record.id
            );
            loaded.skipped += 1;
            continue;
        }
        if !seen_ids.insert(record.id.clone()) {
            warn!("Skipping entry {}: duplicate id '{}'", entry.key, record.id);
            loaded.skipped += 1;
            continue;
        }

        loaded.records.push(record);
    }

    loaded
}

/// Fetches and parses every record. Only a failed `list` is an error.
pub async fn fetch_records(kv: &dyn KvStore) -> Result<LoadedRecords, StoreError> {
    let entries = kv.list(&record_pattern(), true).await?;
    Ok(parse_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKvStore;

    fn entry(key: &str, value: Option<&str>) -> KvEntry {
        KvEntry {
            key: key.to_string(),
            value: value.map(String::from),
        }
    }

    #[test]
    fn test_malformed_and_empty_entries_are_excluded() {
        let loaded = parse_entries(vec![
            entry("resume:a", Some(r#"{"id":"a","companyName":"Acme"}"#)),
            entry("resume:b", Some("{not json")),
            entry("resume:c", Some("")),
            entry("resume:d", Some("   ")),
            entry("resume:e", None),
            entry("resume:f", Some(r#"{"id":"f"}"#)),
        ]);
        let ids: Vec<_> = loaded.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "f"]);
        assert_eq!(loaded.skipped, 4);
    }

    #[test]
    fn test_all_malformed_yields_empty_list() {
        let loaded = parse_entries(vec![entry("resume:x", Some("null")), entry("resume:y", Some("[]"))]);
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.skipped, 2);
    }

    #[test]
    fn test_store_order_is_preserved() {
        let loaded = parse_entries(vec![
            entry("resume:z", Some(r#"{"id":"z"}"#)),
            entry("resume:a", Some(r#"{"id":"a"}"#)),
            entry("resume:m", Some(r#"{"id":"m"}"#)),
        ]);
        let ids: Vec<_> = loaded.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_duplicate_and_blank_ids_are_skipped() {
        let loaded = parse_entries(vec![
            entry("resume:a", Some(r#"{"id":"a","jobTitle":"first"}"#)),
            entry("resume:a", Some(r#"{"id":"a","jobTitle":"second"}"#)),
            entry("resume:blank", Some(r#"{"id":"  "}"#)),
        ]);
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].job_title.as_deref(), Some("first"));
        assert_eq!(loaded.skipped, 2);
    }

    #[test]
    fn test_id_not_matching_key_is_skipped() {
        let loaded = parse_entries(vec![
            entry("resume:x", Some(r#"{"id":"y"}"#)),
            entry("resume:z", Some(r#"{"id":"z"}"#)),
        ]);
        let ids: Vec<_> = loaded.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["z"]);
        assert_eq!(loaded.skipped, 1);
    }

    #[tokio::test]
    async fn test_fetch_ignores_other_namespaces() {
        let kv = MemoryKvStore::new();
        kv.put("resume:a", r#"{"id":"a"}"#);
        kv.put("settings:theme", "dark");
        let loaded = fetch_records(&kv).await.unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.skipped, 0);
    }

    #[tokio::test]
    async fn test_fetch_surfaces_unreachable_store() {
        let kv = MemoryKvStore::new();
        kv.set_unavailable(true);
        assert!(fetch_records(&kv).await.is_err());
    }
}
