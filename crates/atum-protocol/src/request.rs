use atum_pow::PowProof;
use serde::{Deserialize, Serialize};

use crate::alg::SignatureAlgorithm;
use crate::encode::base64_bytes;

/// A request to put a timestamp on a nonce.
///
/// Only `nonce` is mandatory. The time defaults to the client's wall clock
/// at send; the signature algorithm defaults to whatever the server
/// prefers. The proof of work, when a server demands one, is filled in by
/// the client right before sending and is bound to the exact
/// `(time, nonce)` pair via
/// [`encode_time_nonce`](crate::encode_time_nonce).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// The nonce to timestamp. Must be non-empty; servers reject nonces
    /// longer than [`ServerInfo::max_nonce_size`](crate::ServerInfo::max_nonce_size).
    #[serde(rename = "Nonce", with = "base64_bytes")]
    pub nonce: Vec<u8>,

    /// Unix time to put on the timestamp. Servers reject times further
    /// than their acceptable lag from their own clock.
    #[serde(rename = "Time", skip_serializing_if = "Option::is_none", default)]
    pub time: Option<i64>,

    /// Preferred signature algorithm. Servers fall back to their default
    /// when the preference is absent or unsupported.
    #[serde(
        rename = "PreferredSigAlg",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub preferred_sig_alg: Option<SignatureAlgorithm>,

    /// Proof of work over `encode_time_nonce(time, nonce)`, if the server
    /// requires one for the effective signature algorithm.
    #[serde(
        rename = "ProofOfWork",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub proof_of_work: Option<PowProof>,
}

impl Request {
    pub fn new(nonce: Vec<u8>) -> Self {
        Request {
            nonce,
            time: None,
            preferred_sig_alg: None,
            proof_of_work: None,
        }
    }
}
