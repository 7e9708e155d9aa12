//! Storage façade: composes the key/value and list stores and owns the
//! background expiry worker's lifetime.

use std::sync::Arc;

use crate::config::StorageConfig;
use crate::kv::expiry::ExpiryWorker;
use crate::kv::store::KvStore;
use crate::list::store::ListStore;

/// Literal identity the dispatch layer surfaces for the `HELLO` command.
#[derive(Debug, Clone, Copy)]
pub struct ServerInfo {
    pub server: &'static str,
    pub version: &'static str,
    pub proto: i64,
    pub mode: &'static str,
    pub role: &'static str,
}

impl Default for ServerInfo {
    fn default() -> Self {
        ServerInfo {
            server: "Avacado",
            version: "0.1.0",
            proto: 2,
            mode: "standalone",
            role: "master",
        }
    }
}

pub struct Storage {
    kv: Arc<KvStore>,
    lists: Arc<ListStore>,
    expiry_worker: ExpiryWorker,
}

impl Storage {
    pub fn new(config: StorageConfig) -> Self {
        let kv = Arc::new(KvStore::new());
        let lists = Arc::new(ListStore::new(config.max_list_pack_size));
        let expiry_worker = ExpiryWorker::spawn(Arc::clone(&kv), config.expiry_sweep_interval);
        Storage {
            kv,
            lists,
            expiry_worker,
        }
    }

    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    pub fn lists(&self) -> &ListStore {
        &self.lists
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo::default()
    }

    /// Stops the background expiry worker and releases it. The KV and
    /// list maps are dropped along with `self`; there is no persisted
    /// state to flush.
    pub fn close(&mut self) {
        self.expiry_worker.stop();
    }
}

impl Default for Storage {
    fn default() -> Self {
        Storage::new(StorageConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::store::SetOptions;

    #[test]
    fn facade_composes_kv_and_lists() {
        let mut storage = Storage::new(StorageConfig::default());
        storage.kv().set("k", b"v", SetOptions::default()).unwrap();
        assert_eq!(storage.kv().get("k"), Some(b"v".to_vec()));

        storage.lists().rpush("l", &[b"a", b"b"]);
        assert_eq!(storage.lists().llen("l"), 2);

        storage.close();
    }

    #[test]
    fn server_info_matches_documented_literals() {
        let storage = Storage::new(StorageConfig::default());
        let info = storage.server_info();
        assert_eq!(info.server, "Avacado");
        assert_eq!(info.version, "0.1.0");
        assert_eq!(info.proto, 2);
        assert_eq!(info.mode, "standalone");
        assert_eq!(info.role, "master");
    }
}
