//! Canonical byte encodings.

use data_encoding::BASE64;

/// The canonical byte string a server signs (and a client proof-of-works):
/// the 8-byte big-endian time followed by the raw nonce.
///
/// This must be bit-exact across implementations; a timestamp created by
/// one client has to verify under another.
pub fn encode_time_nonce(time: i64, nonce: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + nonce.len());
    out.extend_from_slice(&time.to_be_bytes());
    out.extend_from_slice(nonce);
    out
}

/// Serde adapter encoding `Vec<u8>` fields as standard base64 strings,
/// matching how Go's `encoding/json` marshals `[]byte`.
pub mod base64_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::BASE64;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(s.as_bytes()).map_err(D::Error::custom)
    }
}
