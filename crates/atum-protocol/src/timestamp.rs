use std::fmt;

use data_encoding::BASE64;
use serde::{Deserialize, Serialize};

use crate::alg::{HashAlgorithm, SignatureAlgorithm};
use crate::encode::base64_bytes;

/// A signed assertion binding a nonce to a point in time.
///
/// Owned by the caller once the server hands it back; persist it wherever
/// and however you like (it round-trips through JSON). It stays verifiable
/// for as long as `sig.public_key` remains vouched for by the server at
/// `server_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    /// The Unix time the server asserts.
    #[serde(rename = "Time")]
    pub time: i64,

    /// URL of the server that created the timestamp.
    #[serde(rename = "ServerUrl")]
    pub server_url: String,

    /// The signature over `encode_time_nonce(time, nonce)`.
    #[serde(rename = "Sig")]
    pub sig: Signature,

    /// Present when the nonce was derived by hashing a longer message;
    /// needed to re-derive the nonce from that message at verification.
    #[serde(rename = "Hashing", skip_serializing_if = "Option::is_none", default)]
    pub hashing: Option<Hashing>,
}

/// The signature of a timestamp. `data` and `public_key` are
/// algorithm-specific serialized blobs; nothing outside the signature
/// engine should look inside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(rename = "Alg")]
    pub alg: SignatureAlgorithm,

    /// The serialized signature.
    #[serde(rename = "Data", with = "base64_bytes")]
    pub data: Vec<u8>,

    /// The serialized public key the signature was set with.
    #[serde(rename = "PublicKey", with = "base64_bytes")]
    pub public_key: Vec<u8>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} signature by {}",
            self.alg,
            BASE64.encode(&self.public_key)
        )
    }
}

/// How a message was reduced to the signed nonce.
///
/// The prefix is a secret salt chosen by the *requester*, mixed in ahead
/// of the message so the server never sees a bare hash of the plaintext
/// it could correlate elsewhere. It has to come from a cryptographically
/// secure random source and must be stored with the timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hashing {
    #[serde(rename = "Hash")]
    pub hash: HashAlgorithm,

    #[serde(rename = "Prefix", with = "base64_bytes")]
    pub prefix: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Timestamp {
        Timestamp {
            time: 1_600_000_000,
            server_url: "https://atum.example.org/".to_string(),
            sig: Signature {
                alg: SignatureAlgorithm::Ed25519,
                data: vec![0x01; 64],
                public_key: vec![0x02; 32],
            },
            hashing: None,
        }
    }

    #[test]
    fn json_round_trip() {
        let ts = sample();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn wire_field_names_match_go() {
        let ts = sample();
        let value: serde_json::Value = serde_json::to_value(&ts).unwrap();
        assert!(value.get("Time").is_some());
        assert!(value.get("ServerUrl").is_some());
        let sig = value.get("Sig").unwrap();
        assert!(sig.get("Alg").is_some());
        assert!(sig.get("Data").is_some());
        assert!(sig.get("PublicKey").is_some());
        // Byte blobs are base64 strings, as Go marshals []byte
        assert!(sig.get("Data").unwrap().is_string());
    }

    #[test]
    fn hashing_round_trips_when_present() {
        let mut ts = sample();
        ts.hashing = Some(Hashing {
            hash: HashAlgorithm::Shake256,
            prefix: vec![0xab; 32],
        });

        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("\"Hash\":\"shake256\""));
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }
}
