//! List store: key to quicklist mapping.
//!
//! Lookups take the mapping's shared lock; creating a quicklist for a
//! new key on RPUSH/LPUSH briefly escalates to the exclusive lock using
//! a check-create-recheck sequence so two racing pushes to the same new
//! key never allocate two quicklists. Once a quicklist exists, all
//! further locking for that key is delegated to it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::list::quicklist::Quicklist;

pub struct ListStore {
    map: RwLock<HashMap<String, Arc<Quicklist>>>,
    max_list_pack_size: usize,
}

impl ListStore {
    pub fn new(max_list_pack_size: usize) -> Self {
        ListStore {
            map: RwLock::new(HashMap::new()),
            max_list_pack_size,
        }
    }

    fn get_or_create(&self, key: &str) -> Arc<Quicklist> {
        if let Some(ql) = self.map.read().get(key) {
            return Arc::clone(ql);
        }
        let mut map = self.map.write();
        Arc::clone(
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Quicklist::new(self.max_list_pack_size))),
        )
    }

    #[tracing::instrument(skip(self, values))]
    pub fn rpush(&self, key: &str, values: &[&[u8]]) -> usize {
        self.get_or_create(key).rpush(values)
    }

    #[tracing::instrument(skip(self, values))]
    pub fn lpush(&self, key: &str, values: &[&[u8]]) -> usize {
        self.get_or_create(key).lpush(values)
    }

    #[tracing::instrument(skip(self))]
    pub fn rpop(&self, key: &str, count: usize) -> Option<Vec<Vec<u8>>> {
        let ql = self.map.read().get(key).map(Arc::clone)?;
        Some(ql.rpop(count))
    }

    #[tracing::instrument(skip(self))]
    pub fn lpop(&self, key: &str, count: usize) -> Option<Vec<Vec<u8>>> {
        let ql = self.map.read().get(key).map(Arc::clone)?;
        Some(ql.lpop(count))
    }

    #[tracing::instrument(skip(self))]
    pub fn llen(&self, key: &str) -> usize {
        self.map.read().get(key).map(|ql| ql.length()).unwrap_or(0)
    }

    #[tracing::instrument(skip(self))]
    pub fn lindex(&self, key: &str, index: isize) -> Option<Vec<u8>> {
        self.map.read().get(key)?.at_index(index)
    }
}
