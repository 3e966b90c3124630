use std::collections::HashMap;
use std::sync::Mutex;

use atum_protocol::{ServerInfo, SignatureAlgorithm};

use crate::{Cache, public_key_cache_key};

/// In-process cache backed by hash maps. The default backend: always
/// available, never touches disk, forgotten when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCache {
    public_keys: Mutex<HashMap<String, i64>>,
    server_infos: Mutex<HashMap<String, ServerInfo>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn store_public_key(
        &self,
        server_url: &str,
        alg: &SignatureAlgorithm,
        public_key: &[u8],
        expires: i64,
    ) {
        let key = public_key_cache_key(server_url, alg, public_key);
        self.public_keys.lock().unwrap().insert(key, expires);
    }

    fn public_key_expiry(
        &self,
        server_url: &str,
        alg: &SignatureAlgorithm,
        public_key: &[u8],
    ) -> Option<i64> {
        let key = public_key_cache_key(server_url, alg, public_key);
        self.public_keys.lock().unwrap().get(&key).copied()
    }

    fn store_server_info(&self, server_url: &str, info: &ServerInfo) {
        self.server_infos
            .lock()
            .unwrap()
            .insert(server_url.to_string(), info.clone());
    }

    fn server_info(&self, server_url: &str) -> Option<ServerInfo> {
        self.server_infos.lock().unwrap().get(server_url).cloned()
    }
}
