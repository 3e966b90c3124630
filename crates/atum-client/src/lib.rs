//! Client for the Atum trusted-timestamping protocol.
//!
//! Given a nonce, or a long message reduced to one by hashing, an Atum
//! server returns a signed assertion that it saw the nonce at a point in
//! time. [`Client::stamp`] obtains such a [`Timestamp`]; [`Client::verify`]
//! checks one later, asking the server to vouch for the signing key on
//! first use and caching that trust decision until it expires.
//!
//! ```no_run
//! use atum_client::Client;
//!
//! # fn main() -> Result<(), atum_client::ClientError> {
//! let client = Client::new("https://atum.example.org");
//! let stamp = client.stamp(vec![0x01, 0x02])?;
//! assert!(client.verify(&stamp, &[0x01, 0x02])?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod args;
mod client;
mod error;
mod sig;

pub use atum_protocol::Timestamp;
pub use client::{CancelToken, Client, ClientBuilder};
pub use error::ClientError;
pub use sig::{NONCE_SIZE, dangerous_verify_signature, derive_nonce};
