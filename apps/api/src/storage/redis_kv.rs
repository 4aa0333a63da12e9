//! Redis-backed key-value store.
//!
//! Every logical key is stored under `<namespace>:<key>`, so `clear` can drop
//! the whole namespace server-side without touching other tenants of the
//! same Redis database.

use std::collections::HashSet;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client as RedisClient, Script};
use tracing::{debug, info, warn};

use super::{KvEntry, KvStore, StoreError};

const SCAN_BATCH: usize = 250;

/// Deletes every key matching ARGV[1] in one server-side call.
/// DEL is chunked to stay under Lua's unpack limit.
const CLEAR_NAMESPACE_LUA: &str = r#"
local keys = redis.call('KEYS', ARGV[1])
for i = 1, #keys, 5000 do
    redis.call('DEL', unpack(keys, i, math.min(i + 4999, #keys)))
end
return #keys
"#;

#[derive(Clone)]
pub struct RedisKvStore {
    client: RedisClient,
    namespace: String,
}

impl RedisKvStore {
    pub fn new(client: RedisClient, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Redis connection failed: {e}")))
    }

    fn physical(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn logical<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<KvEntry>, StoreError> {
        let mut conn = self.connection().await?;
        let physical_pattern = self.physical(pattern);

        // SCAN may return a key more than once; keep the first sighting.
        let mut seen = HashSet::new();
        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&physical_pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(backend)?;
            keys.extend(batch.into_iter().filter(|k| seen.insert(k.clone())));
            if next == 0 {
                break;
            }
            cursor = next;
        }
        debug!("SCAN {physical_pattern} returned {} keys", keys.len());

        let values = if include_values && !keys.is_empty() {
            let raw: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
                .arg(&keys)
                .query_async(&mut conn)
                .await
                .map_err(backend)?;
            decode_values(&keys, raw)
        } else {
            vec![None; keys.len()]
        };

        Ok(keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| {
                self.logical(key).map(|k| KvEntry {
                    key: k.to_string(),
                    value,
                })
            })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: i64 = redis::cmd("DEL")
            .arg(self.physical(key))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let removed: i64 = Script::new(CLEAR_NAMESPACE_LUA)
            .arg(self.physical("*"))
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;
        info!("Cleared namespace '{}' ({removed} keys)", self.namespace);
        Ok(())
    }
}

/// Converts MGET values one by one. A value that is not UTF-8 becomes `None`,
/// so only that entry is skipped by the loader.
fn decode_values(keys: &[String], raw: Vec<Option<Vec<u8>>>) -> Vec<Option<String>> {
    keys.iter()
        .zip(raw)
        .map(|(key, value)| {
            value.and_then(|bytes| match String::from_utf8(bytes) {
                Ok(text) => Some(text),
                Err(_) => {
                    warn!("Value of {key} is not valid UTF-8");
                    None
                }
            })
        })
        .collect()
}

fn backend(e: redis::RedisError) -> StoreError {
    if e.is_connection_refusal() || e.is_io_error() || e.is_timeout() {
        StoreError::Unavailable(format!("Redis: {e}"))
    } else {
        StoreError::Backend(format!("Redis: {e}"))
    }
}
