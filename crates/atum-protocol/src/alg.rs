//! Algorithm identifiers exchanged on the wire.
//!
//! Both enums keep an `Unknown` variant: a server newer than this client
//! may advertise algorithms we have never heard of, and that must parse
//! cleanly and fail later as "unsupported", never as a JSON error.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A signature scheme an Atum server can sign timestamps with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignatureAlgorithm {
    /// Ed25519 EdDSA signatures, see RFC 8032.
    Ed25519,

    /// XMSS^MT stateful hash-based signatures, see RFC 8391.
    XmssMt,

    /// An algorithm this client does not implement.
    Unknown(String),
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &str {
        match self {
            SignatureAlgorithm::Ed25519 => "ed25519",
            SignatureAlgorithm::XmssMt => "xmssmt",
            SignatureAlgorithm::Unknown(s) => s,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SignatureAlgorithm {
    fn from(s: &str) -> Self {
        match s {
            "ed25519" => SignatureAlgorithm::Ed25519,
            "xmssmt" => SignatureAlgorithm::XmssMt,
            other => SignatureAlgorithm::Unknown(other.to_string()),
        }
    }
}

impl Serialize for SignatureAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SignatureAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SignatureAlgorithm::from(s.as_str()))
    }
}

/// How a long message was reduced to the nonce that actually got signed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHAKE256 extendable-output hash squeezed to 64 bytes.
    Shake256,

    /// A hash this client does not implement.
    Unknown(String),
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &str {
        match self {
            HashAlgorithm::Shake256 => "shake256",
            HashAlgorithm::Unknown(s) => s,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for HashAlgorithm {
    fn from(s: &str) -> Self {
        match s {
            "shake256" => HashAlgorithm::Shake256,
            other => HashAlgorithm::Unknown(other.to_string()),
        }
    }
}

impl Serialize for HashAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HashAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(HashAlgorithm::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_round_trip() {
        for (alg, tag) in [
            (SignatureAlgorithm::Ed25519, "\"ed25519\""),
            (SignatureAlgorithm::XmssMt, "\"xmssmt\""),
        ] {
            assert_eq!(serde_json::to_string(&alg).unwrap(), tag);
            let back: SignatureAlgorithm = serde_json::from_str(tag).unwrap();
            assert_eq!(back, alg);
        }
    }

    #[test]
    fn unknown_tag_survives_parsing() {
        let alg: SignatureAlgorithm = serde_json::from_str("\"sphincs+\"").unwrap();
        assert_eq!(alg, SignatureAlgorithm::Unknown("sphincs+".to_string()));
        assert_eq!(serde_json::to_string(&alg).unwrap(), "\"sphincs+\"");
    }

    #[test]
    fn unknown_hash_survives_parsing() {
        let hash: HashAlgorithm = serde_json::from_str("\"blake2b\"").unwrap();
        assert_eq!(hash, HashAlgorithm::Unknown("blake2b".to_string()));
    }
}
