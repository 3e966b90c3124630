use std::collections::BTreeMap;

use atum_pow::PowRequest;
use serde::{Deserialize, Serialize};

use crate::alg::SignatureAlgorithm;

/// Capabilities published by an Atum server.
///
/// Clients cache this per server URL: it lets them attach the right proof
/// of work and pick a supported algorithm without a discovery round trip.
/// There is no TTL; the snapshot is overwritten whenever the server sends
/// a fresher one, notably on a proof-of-work mismatch reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// The maximum size of nonce accepted.
    #[serde(rename = "MaxNonceSize")]
    pub max_nonce_size: i64,

    /// Maximum lag to accept, in seconds.
    #[serde(rename = "AcceptableLag")]
    pub acceptable_lag: i64,

    /// Default signature algorithm the server uses.
    #[serde(rename = "DefaultSigAlg")]
    pub default_sig_alg: SignatureAlgorithm,

    /// Proof-of-work puzzle demanded per signature algorithm. Algorithms
    /// missing from the map require no proof of work.
    #[serde(rename = "RequiredProofOfWork", default)]
    pub required_proof_of_work: BTreeMap<SignatureAlgorithm, PowRequest>,
}

impl ServerInfo {
    /// The puzzle required for `alg`, if any.
    pub fn required_pow(&self, alg: &SignatureAlgorithm) -> Option<&PowRequest> {
        self.required_proof_of_work.get(alg)
    }
}
