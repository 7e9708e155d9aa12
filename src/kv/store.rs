//! Key/value store: key to typed scalar value, with optional expiry and
//! conditional write semantics.
//!
//! A single readers-writer lock guards the whole mapping. Read-path
//! operations (`get`, `exists`, arithmetic reads) take the reader lock
//! first and only escalate to the writer lock to delete an entry they
//! observed expired — and when they do, they re-verify the entry under
//! the writer lock before deleting it, so a key that was overwritten in
//! the gap between the two lock acquisitions is never clobbered.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    String,
    Integer,
}

#[derive(Debug, Clone)]
struct Entry {
    enc: Encoding,
    payload: Vec<u8>,
    expiry: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expiry, Some(deadline) if deadline <= now)
    }

    fn as_int(&self, key: &str) -> Result<i64> {
        match self.enc {
            Encoding::Integer => Ok(i64::from_be_bytes(
                self.payload[..8]
                    .try_into()
                    .expect("Integer entries always hold 8 bytes"),
            )),
            Encoding::String => Err(StorageError::NotInteger { key: key.to_string() }),
        }
    }

    fn from_int(value: i64, expiry: Option<Instant>) -> Entry {
        Entry {
            enc: Encoding::Integer,
            payload: value.to_be_bytes().to_vec(),
            expiry,
        }
    }

    fn display_bytes(&self) -> Vec<u8> {
        match self.enc {
            Encoding::String => self.payload.clone(),
            Encoding::Integer => {
                let value = i64::from_be_bytes(self.payload[..8].try_into().unwrap());
                value.to_string().into_bytes()
            }
        }
    }
}

/// Attempts to parse `payload` as a signed 64-bit decimal integer,
/// following `-?[0-9]+` with range checking. Leading `+` and redundant
/// leading zeros are accepted and canonicalized away by the round trip.
fn try_parse_int(payload: &[u8]) -> Option<i64> {
    std::str::from_utf8(payload).ok()?.parse::<i64>().ok()
}

fn make_entry(value: &[u8], expiry: Option<Instant>) -> Entry {
    match try_parse_int(value) {
        Some(n) => Entry::from_int(n, expiry),
        None => Entry {
            enc: Encoding::String,
            payload: value.to_vec(),
            expiry,
        },
    }
}

/// Conditions and side effects for [`KvStore::set`]. Not all combinations
/// are mutually exclusive; the dispatch layer is responsible for
/// rejecting nonsensical combinations (e.g. `NX` with `XX`) before
/// calling in.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions<'a> {
    pub nx: bool,
    pub xx: bool,
    pub ex: Option<Duration>,
    pub px: Option<Duration>,
    pub ifeq: Option<&'a [u8]>,
    pub get: bool,
}

pub struct KvStore {
    map: RwLock<HashMap<String, Entry>>,
}

impl Default for KvStore {
    fn default() -> Self {
        KvStore::new()
    }
}

impl KvStore {
    pub fn new() -> Self {
        KvStore {
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Diagnostic-only: the number of entries currently in the map,
    /// including ones that have expired but have not yet been lazily or
    /// periodically swept. Used by tests to observe expiry timing.
    pub fn internal_count(&self) -> usize {
        self.map.read().len()
    }

    #[tracing::instrument(skip(self, value))]
    pub fn set(&self, key: &str, value: &[u8], opts: SetOptions<'_>) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let mut map = self.map.write();

        let current = map.get(key).filter(|e| !e.is_expired(now));
        let previous_for_get = current.map(Entry::display_bytes);

        if opts.nx && current.is_some() {
            return if opts.get {
                Ok(previous_for_get)
            } else {
                Err(StorageError::WrongCondition { key: key.to_string() })
            };
        }
        if opts.xx && current.is_none() {
            return if opts.get {
                Ok(previous_for_get)
            } else {
                Err(StorageError::WrongCondition { key: key.to_string() })
            };
        }
        if let Some(expected) = opts.ifeq {
            let matches = current.map(|e| e.display_bytes() == expected).unwrap_or(false);
            if !matches {
                return if opts.get {
                    Ok(previous_for_get)
                } else {
                    Err(StorageError::WrongCondition { key: key.to_string() })
                };
            }
        }

        let expiry = match (opts.ex, opts.px) {
            (Some(d), _) if !d.is_zero() => Some(now + d),
            (_, Some(d)) if !d.is_zero() => Some(now + d),
            _ => None,
        };

        map.insert(key.to_string(), make_entry(value, expiry));

        Ok(previous_for_get)
    }

    #[tracing::instrument(skip(self))]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        {
            let map = self.map.read();
            match map.get(key) {
                None => return None,
                Some(e) if !e.is_expired(now) => return Some(e.display_bytes()),
                Some(_) => {}
            }
        }
        self.expire_if_still_expired(key);
        None
    }

    #[tracing::instrument(skip(self))]
    pub fn exists(&self, keys: &[&str]) -> usize {
        let now = Instant::now();
        let mut count = 0;
        for key in keys {
            let expired = {
                let map = self.map.read();
                match map.get(*key) {
                    None => continue,
                    Some(e) if !e.is_expired(now) => {
                        count += 1;
                        continue;
                    }
                    Some(_) => true,
                }
            };
            if expired {
                self.expire_if_still_expired(key);
            }
        }
        count
    }

    #[tracing::instrument(skip(self))]
    pub fn del(&self, keys: &[&str]) -> usize {
        let now = Instant::now();
        let mut map = self.map.write();
        let mut count = 0;
        for key in keys {
            if let Some(e) = map.remove(*key) {
                if !e.is_expired(now) {
                    count += 1;
                }
            }
        }
        count
    }

    pub fn incr(&self, key: &str) -> Result<i64> {
        self.incr_by(key, 1)
    }

    pub fn decr(&self, key: &str) -> Result<i64> {
        self.decr_by(key, 1)
    }

    pub fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.incr_by(key, delta.checked_neg().ok_or(StorageError::IntegerOverflow {
            key: key.to_string(),
        })?)
    }

    #[tracing::instrument(skip(self))]
    pub fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let now = Instant::now();
        let mut map = self.map.write();

        let (base, expiry) = match map.get(key) {
            Some(e) if !e.is_expired(now) => (e.as_int(key)?, e.expiry),
            _ => (0, None),
        };

        let new_value = base
            .checked_add(delta)
            .ok_or_else(|| StorageError::IntegerOverflow { key: key.to_string() })?;

        map.insert(key.to_string(), Entry::from_int(new_value, expiry));
        Ok(new_value)
    }

    /// `-2` if absent, `-1` if present without expiry, else milliseconds
    /// until expiry.
    #[tracing::instrument(skip(self))]
    pub fn get_ttl(&self, key: &str) -> i64 {
        let now = Instant::now();
        let map = self.map.read();
        match map.get(key) {
            None => -2,
            Some(e) if e.is_expired(now) => -2,
            Some(e) => match e.expiry {
                None => -1,
                Some(deadline) => deadline.saturating_duration_since(now).as_millis() as i64,
            },
        }
    }

    /// Drops every entry whose deadline has passed as of `now`. Called by
    /// the periodic background worker; cooperative, scans once under the
    /// writer lock.
    pub(crate) fn sweep_expired(&self, now: Instant) -> usize {
        let mut map = self.map.write();
        let before = map.len();
        map.retain(|_, e| !e.is_expired(now));
        before - map.len()
    }

    /// Re-verifies under the writer lock that `key`'s entry is still the
    /// one observed expired before deleting it, closing the TOCTOU window
    /// between the reader-lock observation and this call.
    fn expire_if_still_expired(&self, key: &str) {
        let mut map = self.map.write();
        if let Some(e) = map.get(key) {
            if e.is_expired(Instant::now()) {
                map.remove(key);
            }
        }
    }
}
