//! Client-side caching for Atum.
//!
//! The client remembers two things per server: the server's capability
//! snapshot ([`ServerInfo`]) and, per `(server, algorithm, public key)`,
//! until when that key is trusted. Both live behind the [`Cache`] trait so
//! callers can swap the backend; [`MemoryCache`] is the default and
//! [`NoCache`] disables caching entirely (every verification then asks the
//! server again).
//!
//! Cache availability must never affect protocol correctness: a backend
//! that loses data or hits an I/O problem degrades to answering "miss",
//! it never surfaces an error through this trait.

#![forbid(unsafe_code)]

mod memory;
mod noop;

pub use memory::MemoryCache;
pub use noop::NoCache;

use atum_protocol::{ServerInfo, SignatureAlgorithm};

/// Caches, for each known Atum server, its public keys (for faster
/// verification) and its [`ServerInfo`] (for faster stamping).
///
/// Every operation must be safe to call concurrently without external
/// locking, and each write is a full replace: last write wins, there are
/// no read-modify-write races to worry about.
pub trait Cache: Send + Sync {
    /// Records that `public_key` is vouched for by `server_url` until the
    /// Unix time `expires`. Upsert; last write wins.
    fn store_public_key(
        &self,
        server_url: &str,
        alg: &SignatureAlgorithm,
        public_key: &[u8],
        expires: i64,
    );

    /// Returns until when this public key should be trusted for the given
    /// server, or `None` when the key was never stored (or the backend
    /// chose to evict it). A returned expiry may lie in the past; judging
    /// staleness is the caller's job.
    fn public_key_expiry(
        &self,
        server_url: &str,
        alg: &SignatureAlgorithm,
        public_key: &[u8],
    ) -> Option<i64>;

    /// Caches the server's capability snapshot. Upsert; last write wins.
    fn store_server_info(&self, server_url: &str, info: &ServerInfo);

    /// Retrieves the cached capability snapshot, if available.
    fn server_info(&self, server_url: &str) -> Option<ServerInfo>;
}

/// Key under which a trust decision is filed: hex public key, algorithm
/// tag and server URL, in that order.
pub(crate) fn public_key_cache_key(
    server_url: &str,
    alg: &SignatureAlgorithm,
    public_key: &[u8],
) -> String {
    format!(
        "{}-{}-{}",
        data_encoding::HEXLOWER.encode(public_key),
        alg,
        server_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_separates_components() {
        let a = public_key_cache_key("https://a/", &SignatureAlgorithm::Ed25519, &[0x01]);
        let b = public_key_cache_key("https://b/", &SignatureAlgorithm::Ed25519, &[0x01]);
        let c = public_key_cache_key("https://a/", &SignatureAlgorithm::XmssMt, &[0x01]);
        let d = public_key_cache_key("https://a/", &SignatureAlgorithm::Ed25519, &[0x02]);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
