use atum_protocol::{ErrorCode, HashAlgorithm, SignatureAlgorithm};

/// Errors surfaced by the stamping and verification flows.
///
/// The structure mirrors how callers should react: `Transport`, `Json` and
/// `Io` mean the operation could not be completed and may succeed on a
/// manual retry; `Server` means the server refused the request; everything
/// else is a local validation failure that retrying will not fix. A
/// timestamp that *completed* verification and turned out invalid is
/// reported as `Ok(false)`, never through this type.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("transport: {0}")]
    Transport(#[from] ureq::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The server replied with a protocol-level error. Proof-of-work
    /// codes only surface here after the one permitted retry has been
    /// spent.
    #[error("server: {0}")]
    Server(ErrorCode),

    /// The server signalled a proof-of-work mismatch but sent no fresh
    /// puzzle parameters to retry with.
    #[error("server demanded proof of work without advertising a puzzle")]
    MissingPowPuzzle,

    #[error("server reply carried neither a stamp nor an error")]
    EmptyReply,

    #[error("a nonce must not be empty")]
    EmptyNonce,

    /// Caught locally when the server's advertised maximum is known; the
    /// server would reject the request anyway.
    #[error("nonce of {len} bytes exceeds the server's maximum of {max}")]
    NonceTooLong { len: usize, max: i64 },

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(SignatureAlgorithm),

    #[error("unsupported hash algorithm: {0}")]
    UnsupportedHash(HashAlgorithm),

    /// The server's vouching for the key ends before the time the
    /// timestamp claims, so the key cannot have signed it while trusted.
    #[error("public key expired at {expires}, before the timestamp's time {stamp_time}")]
    KeyExpired { expires: i64, stamp_time: i64 },

    #[error("operation cancelled")]
    Cancelled,
}
