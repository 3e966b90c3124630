use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::info::ServerInfo;
use crate::timestamp::Timestamp;

/// The reply of an Atum server to a [`Request`](crate::Request).
///
/// `error` and `stamp` are mutually exclusive in practice. Most error
/// replies carry `info` so the client can refresh its cached view of the
/// server, notably its current proof-of-work puzzles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none", default)]
    pub error: Option<ErrorCode>,

    #[serde(rename = "Stamp", skip_serializing_if = "Option::is_none", default)]
    pub stamp: Option<Timestamp>,

    #[serde(rename = "Info", skip_serializing_if = "Option::is_none", default)]
    pub info: Option<ServerInfo>,
}

/// Protocol-level errors a server can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// The requested time is too far from the server's clock.
    LagTooLarge,

    /// The request carried no nonce.
    MissingNonce,

    /// The nonce exceeds the server's maximum.
    NonceTooLong,

    /// A proof of work was required but absent.
    MissingProofOfWork,

    /// The attached proof of work does not check out, e.g. because it was
    /// computed against a stale puzzle.
    InvalidProofOfWork,

    /// An error code this client does not know.
    Unknown(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::LagTooLarge => "lag-too-large",
            ErrorCode::MissingNonce => "missing-nonce",
            ErrorCode::NonceTooLong => "nonce-too-long",
            ErrorCode::MissingProofOfWork => "missing-proof-of-work",
            ErrorCode::InvalidProofOfWork => "invalid-proof-of-work",
            ErrorCode::Unknown(s) => s,
        }
    }

    /// The two proof-of-work codes are resolved by retrying with fresh
    /// server info; everything else is final.
    pub fn is_pow_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::MissingProofOfWork | ErrorCode::InvalidProofOfWork
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        match s {
            "lag-too-large" => ErrorCode::LagTooLarge,
            "missing-nonce" => ErrorCode::MissingNonce,
            "nonce-too-long" => ErrorCode::NonceTooLong,
            "missing-proof-of-work" => ErrorCode::MissingProofOfWork,
            "invalid-proof-of-work" => ErrorCode::InvalidProofOfWork,
            other => ErrorCode::Unknown(other.to_string()),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ErrorCode::from(s.as_str()))
    }
}

/// The server's answer to "do you (still) vouch for this public key?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCheckResponse {
    /// Whether the key is currently vouched for.
    #[serde(rename = "Trusted")]
    pub trusted: bool,

    /// Unix time until which the client may rely on this answer without
    /// asking again.
    #[serde(rename = "Expires")]
    pub expires: i64,
}
