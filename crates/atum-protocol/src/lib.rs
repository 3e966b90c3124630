//! Wire-level data structures of the Atum trusted-timestamping protocol.
//!
//! Everything a client and server exchange is JSON with Go-style field
//! names and base64-encoded byte blobs; the structures here serialize to
//! exactly that form. The one canonical *binary* encoding in the protocol
//! is [`encode_time_nonce`], the byte string that actually gets signed
//! (and, when required, proof-of-worked).

// The protocol crate uses only safe Rust.
#![forbid(unsafe_code)]

pub mod alg;
pub mod encode;
pub mod info;
pub mod request;
pub mod response;
pub mod timestamp;
pub mod util;

// Re-export commonly used types
pub use alg::{HashAlgorithm, SignatureAlgorithm};
pub use encode::encode_time_nonce;
pub use info::ServerInfo;
pub use request::Request;
pub use response::{ErrorCode, PublicKeyCheckResponse, Response};
pub use timestamp::{Hashing, Signature, Timestamp};
pub use util::ClockSource;
