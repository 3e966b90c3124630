use atum_protocol::{ServerInfo, SignatureAlgorithm};

use crate::Cache;

/// A cache that remembers nothing.
///
/// With this backend every stamp starts without server info and every
/// verification re-asks the server about the key. Correct, just slower;
/// useful for testing and for callers that must not keep local state.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl Cache for NoCache {
    fn store_public_key(
        &self,
        _server_url: &str,
        _alg: &SignatureAlgorithm,
        _public_key: &[u8],
        _expires: i64,
    ) {
    }

    fn public_key_expiry(
        &self,
        _server_url: &str,
        _alg: &SignatureAlgorithm,
        _public_key: &[u8],
    ) -> Option<i64> {
        None
    }

    fn store_server_info(&self, _server_url: &str, _info: &ServerInfo) {}

    fn server_info(&self, _server_url: &str) -> Option<ServerInfo> {
        None
    }
}
