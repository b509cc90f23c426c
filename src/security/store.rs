//! In-process key-value store with per-key expiry.
//!
//! Backs the rate limiter. Each key holds one value and an absolute expiry
//! timestamp; expired values are invisible to readers and are dropped either
//! when touched or by a periodic full sweep.
//!
//! `update` runs its closure while holding the shard lock for that key, so a
//! read-modify-write for one identifier cannot interleave with another.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

struct StoredEntry<V> {
    value: V,
    expires_at_ms: u64,
}

impl<V> StoredEntry<V> {
    fn is_live(&self, now_ms: u64) -> bool {
        self.expires_at_ms > now_ms
    }
}

/// A concurrent map whose entries carry a time-to-live.
pub struct MemoryStore<V> {
    entries: DashMap<String, StoredEntry<V>>,
    writes: AtomicU64,
    sweep_interval: u64,
}

impl<V: Clone> MemoryStore<V> {
    /// Create a store that purges expired entries every `sweep_interval` writes.
    pub fn new(sweep_interval: u64) -> Self {
        Self {
            entries: DashMap::new(),
            writes: AtomicU64::new(0),
            sweep_interval: sweep_interval.max(1),
        }
    }

    /// Read the live value for a key.
    pub fn get(&self, key: &str, now_ms: u64) -> Option<V> {
        {
            let entry = self.entries.get(key)?;
            if entry.is_live(now_ms) {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove_if(key, |_, e| !e.is_live(now_ms));
        None
    }

    /// Atomically read and optionally replace the value for a key.
    ///
    /// `f` receives the live value (expired values are passed as `None`) and
    /// returns the caller's result plus an optional `(value, ttl)` to store.
    pub fn update<R, F>(&self, key: &str, now_ms: u64, f: F) -> R
    where
        F: FnOnce(Option<&V>) -> (R, Option<(V, Duration)>),
    {
        let (result, wrote) = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let live = occupied.get().is_live(now_ms);
                let (result, write) = f(if live { Some(&occupied.get().value) } else { None });
                match write {
                    Some((value, ttl)) => {
                        occupied.insert(StoredEntry {
                            value,
                            expires_at_ms: deadline(now_ms, ttl),
                        });
                        (result, true)
                    }
                    None => {
                        if !live {
                            occupied.remove();
                        }
                        (result, false)
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let (result, write) = f(None);
                match write {
                    Some((value, ttl)) => {
                        vacant.insert(StoredEntry {
                            value,
                            expires_at_ms: deadline(now_ms, ttl),
                        });
                        (result, true)
                    }
                    None => (result, false),
                }
            }
        };

        // The entry guard is released here; sweeping takes every shard lock.
        if wrote {
            self.maybe_sweep(now_ms);
        }
        result
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_live(now_ms));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            tracing::debug!(purged, remaining = self.entries.len(), "Purged expired rate limit records");
        }
        purged
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn maybe_sweep(&self, now_ms: u64) {
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % self.sweep_interval == 0 {
            self.purge_expired(now_ms);
        }
    }
}

fn deadline(now_ms: u64, ttl: Duration) -> u64 {
    let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    now_ms.saturating_add(ttl_ms)
}
