use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum spacing between full scans for expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

enum Value {
    Text(String),
    Hash(HashMap<String, i64>),
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

struct Table {
    entries: HashMap<String, Entry>,
    last_sweep: Instant,
}

impl Table {
    fn live(&mut self, key: &str) -> Option<&mut Entry> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|e| e.expires_at <= Instant::now());
        if expired {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    /// Drops every expired entry, at most once per `SWEEP_INTERVAL`. Called on
    /// writes so keys that are never read again are still reclaimed.
    fn sweep(&mut self, now: Instant) {
        if now.duration_since(self.last_sweep) < SWEEP_INTERVAL {
            return;
        }
        self.entries.retain(|_, e| e.expires_at > now);
        self.last_sweep = now;
    }
}

/// TTL key-value store with string and integer-hash values. Expired entries
/// are dropped on access and by a periodic sweep on writes.
pub struct MemoryKv {
    table: Mutex<Table>,
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self {
            table: Mutex::new(Table {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.table.lock().await.entries.len()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut table = self.table.lock().await;
        match table.live(key).map(|e| &e.value) {
            Some(Value::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub async fn set(&self, key: String, value: String, ttl: Duration) {
        let now = Instant::now();
        let mut table = self.table.lock().await;
        table.sweep(now);
        table.entries.insert(
            key,
            Entry {
                value: Value::Text(value),
                expires_at: now + ttl,
            },
        );
    }

    pub async fn del(&self, key: &str) -> bool {
        self.table.lock().await.entries.remove(key).is_some()
    }

    pub async fn hgetall(&self, key: &str) -> Option<HashMap<String, i64>> {
        let mut table = self.table.lock().await;
        match table.live(key).map(|e| &e.value) {
            Some(Value::Hash(h)) => Some(h.clone()),
            _ => None,
        }
    }

    /// Merges `fields` into the hash and resets its TTL.
    pub async fn hset(&self, key: &str, fields: &[(&str, i64)], ttl: Duration) {
        let now = Instant::now();
        let mut table = self.table.lock().await;
        table.sweep(now);
        let expires_at = now + ttl;
        match table.live(key) {
            Some(Entry {
                value: Value::Hash(h),
                expires_at: exp,
            }) => {
                for (f, v) in fields {
                    h.insert((*f).to_string(), *v);
                }
                *exp = expires_at;
            }
            _ => {
                let hash = fields
                    .iter()
                    .map(|(f, v)| ((*f).to_string(), *v))
                    .collect();
                table.entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::Hash(hash),
                        expires_at,
                    },
                );
            }
        }
    }

    /// Increments `field` only when the hash exists.
    pub async fn hincr_if_present(&self, key: &str, field: &str, delta: i64) -> bool {
        let mut table = self.table.lock().await;
        match table.live(key) {
            Some(Entry {
                value: Value::Hash(h),
                ..
            }) => {
                *h.entry(field.to_string()).or_insert(0) += delta;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let kv = MemoryKv::new();
        kv.set("a".into(), "1".into(), Duration::from_secs(60)).await;
        assert_eq!(kv.get("a").await.as_deref(), Some("1"));
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(kv.get("a").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn hincr_needs_a_live_hash() {
        let kv = MemoryKv::new();
        assert!(!kv.hincr_if_present("h", "like_cnt", 1).await);
        assert!(kv.hgetall("h").await.is_none());

        kv.hset("h", &[("like_cnt", 4)], Duration::from_secs(5)).await;
        assert!(kv.hincr_if_present("h", "like_cnt", 1).await);
        assert_eq!(kv.hgetall("h").await.unwrap()["like_cnt"], 5);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!kv.hincr_if_present("h", "like_cnt", 1).await);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_reclaimed_without_being_read() {
        let kv = MemoryKv::new();
        for n in 0..1000 {
            kv.set(format!("article:detail:{n}"), "x".into(), Duration::from_secs(60))
                .await;
        }
        kv.hset("interactive:article:1", &[("like_cnt", 1)], Duration::from_secs(60))
            .await;
        assert_eq!(kv.len().await, 1001);

        tokio::time::advance(Duration::from_secs(3600)).await;
        kv.set("fresh".into(), "y".into(), Duration::from_secs(60)).await;
        assert_eq!(kv.len().await, 1);
        assert_eq!(kv.get("fresh").await.as_deref(), Some("y"));
    }
}
