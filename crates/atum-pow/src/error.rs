use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown proof-of-work algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("malformed proof-of-work request: {0}")]
    MalformedRequest(String),

    #[error("malformed proof-of-work proof: {0}")]
    MalformedProof(String),

    #[error("base64 decode failed: {0}")]
    Decode(#[from] data_encoding::DecodeError),
}
