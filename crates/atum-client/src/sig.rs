//! Nonce derivation and per-algorithm signature verification.
//!
//! Nothing in this module touches the network or the cache; everything is
//! a pure function of its inputs, which keeps it testable against fixed
//! vectors.

use std::io::Read;

use aws_lc_rs::signature::{ED25519, UnparsedPublicKey};
use sha3::Shake256;
use sha3::digest::{ExtendableOutput, Update, XofReader};

use atum_protocol::{HashAlgorithm, Signature, SignatureAlgorithm, encode_time_nonce};

use crate::error::ClientError;

/// Size of a derived nonce in bytes.
pub const NONCE_SIZE: usize = 64;

/// Derives the nonce for a long message: absorb the secret prefix and then
/// the whole message into the extendable-output hash and squeeze
/// [`NONCE_SIZE`] bytes.
///
/// The message is streamed, so arbitrarily large inputs never have to fit
/// in memory. This is the only operation in the client that streams.
pub fn derive_nonce(
    hash: &HashAlgorithm,
    prefix: &[u8],
    message: &mut dyn Read,
) -> Result<Vec<u8>, ClientError> {
    match hash {
        HashAlgorithm::Shake256 => {
            let mut hasher = Shake256::default();
            hasher.update(prefix);

            let mut buf = [0u8; 8192];
            loop {
                let n = message.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }

            let mut nonce = vec![0u8; NONCE_SIZE];
            XofReader::read(&mut hasher.finalize_xof(), &mut nonce);
            Ok(nonce)
        }
        unknown @ HashAlgorithm::Unknown(_) => {
            Err(ClientError::UnsupportedHash(unknown.clone()))
        }
    }
}

/// Checks `sig` over `encode_time_nonce(time, nonce)` WITHOUT any trust
/// check on the public key.
///
/// A valid signature by an attacker's key passes this function. Callers
/// must have established through some other channel that `sig.public_key`
/// belongs to the server they trust; [`Client::verify`] does exactly that
/// and is the entry point ordinary callers want.
///
/// Malformed keys and signature blobs count as verification failures
/// (`Ok(false)`); only an algorithm this client does not implement is an
/// error.
///
/// [`Client::verify`]: crate::Client::verify
pub fn dangerous_verify_signature(
    sig: &Signature,
    time: i64,
    nonce: &[u8],
) -> Result<bool, ClientError> {
    let message = encode_time_nonce(time, nonce);

    match &sig.alg {
        SignatureAlgorithm::Ed25519 => {
            let key = UnparsedPublicKey::new(&ED25519, &sig.public_key);
            Ok(key.verify(&message, &sig.data).is_ok())
        }
        SignatureAlgorithm::XmssMt => {
            let Ok(public_key) = atum_xmssmt::PublicKey::from_bytes(&sig.public_key) else {
                return Ok(false);
            };
            let Ok(signature) = atum_xmssmt::Signature::from_bytes(&sig.data) else {
                return Ok(false);
            };
            Ok(public_key.verify(&message, &signature))
        }
        unknown @ SignatureAlgorithm::Unknown(_) => {
            Err(ClientError::UnsupportedAlgorithm(unknown.clone()))
        }
    }
}
