//! Proof-of-work puzzles for the Atum trusted-timestamping protocol.
//!
//! An Atum server may demand a proof-of-work before it signs a timestamp.
//! The server advertises a [`PowRequest`] per signature algorithm; the
//! client binds the puzzle to its request payload with [`PowRequest::fulfil`]
//! and sends the resulting [`PowProof`] along with the request.
//!
//! Both sides exchange puzzles and proofs as compact self-describing
//! strings, e.g. `sha2bday-16-3q2+7w==`, so the set of puzzle algorithms
//! can grow without changing the JSON schema around them.

#![forbid(unsafe_code)]

pub mod error;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use aws_lc_rs::digest;
use data_encoding::BASE64;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use crate::error::Error;

/// Hardest puzzle this crate will accept. A prefix can never be longer
/// than the SHA-256 digest it is cut from, and any difficulty near this
/// bound is already far beyond what a client could solve.
pub const MAX_DIFFICULTY: u32 = 256;

/// The puzzle algorithms understood by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowAlgorithm {
    /// Find a 3-way collision on the leading bits of
    /// `SHA-256(counter || puzzle nonce || payload)`.
    Sha2Bday,
}

impl PowAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowAlgorithm::Sha2Bday => "sha2bday",
        }
    }
}

impl fmt::Display for PowAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "sha2bday" => Ok(PowAlgorithm::Sha2Bday),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// A server-advertised puzzle: which algorithm to use, how many leading
/// bits have to collide and the server-chosen puzzle nonce that keeps
/// clients from precomputing proofs.
///
/// Wire form: `<algorithm>-<difficulty>-<base64 nonce>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowRequest {
    pub algorithm: PowAlgorithm,
    pub difficulty: u32,
    pub nonce: Vec<u8>,
}

impl PowRequest {
    pub fn new(difficulty: u32, nonce: Vec<u8>) -> Self {
        PowRequest {
            algorithm: PowAlgorithm::Sha2Bday,
            difficulty,
            nonce,
        }
    }

    /// Solves the puzzle for the given payload.
    ///
    /// The returned proof is only valid for this exact `(puzzle, payload)`
    /// pair. Expected running time grows with roughly `2^(2*difficulty/3)`; the
    /// search itself never fails, it just takes longer for harder puzzles.
    pub fn fulfil(&self, data: &[u8]) -> PowProof {
        match self.algorithm {
            PowAlgorithm::Sha2Bday => self.fulfil_sha2bday(data),
        }
    }

    fn fulfil_sha2bday(&self, data: &[u8]) -> PowProof {
        let mut buckets: HashMap<Vec<u8>, Vec<u64>> = HashMap::new();
        let mut counter: u64 = 0;

        loop {
            let prefix = self.bday_prefix(counter, data);
            let entry = buckets.entry(prefix).or_default();
            entry.push(counter);

            if entry.len() == 3 {
                // Counters are generated in increasing order, so the
                // bucket is already sorted.
                return PowProof {
                    algorithm: PowAlgorithm::Sha2Bday,
                    counters: [entry[0], entry[1], entry[2]],
                };
            }

            counter += 1;
        }
    }

    /// The first `difficulty` bits of `SHA-256(counter || nonce || data)`,
    /// packed into bytes with unused trailing bits cleared.
    fn bday_prefix(&self, counter: u64, data: &[u8]) -> Vec<u8> {
        let mut ctx = digest::Context::new(&digest::SHA256);
        ctx.update(&counter.to_le_bytes());
        ctx.update(&self.nonce);
        ctx.update(data);
        bit_prefix(ctx.finish().as_ref(), self.difficulty.min(MAX_DIFFICULTY))
    }
}

impl fmt::Display for PowRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.algorithm,
            self.difficulty,
            BASE64.encode(&self.nonce)
        )
    }
}

impl FromStr for PowRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let mut parts = s.splitn(3, '-');
        let alg = parts.next().unwrap_or_default();
        let difficulty = parts
            .next()
            .ok_or_else(|| Error::MalformedRequest(s.to_string()))?;
        let nonce = parts
            .next()
            .ok_or_else(|| Error::MalformedRequest(s.to_string()))?;

        let difficulty: u32 = difficulty
            .parse()
            .map_err(|_| Error::MalformedRequest(s.to_string()))?;
        if difficulty > MAX_DIFFICULTY {
            return Err(Error::MalformedRequest(s.to_string()));
        }

        Ok(PowRequest {
            algorithm: alg.parse()?,
            difficulty,
            nonce: BASE64.decode(nonce.as_bytes())?,
        })
    }
}

impl Serialize for PowRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PowRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// A solved puzzle: three strictly increasing counters whose digests share
/// the demanded bit prefix.
///
/// Wire form: `<algorithm>-<base64 of three little-endian u64 counters>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowProof {
    pub algorithm: PowAlgorithm,
    pub counters: [u64; 3],
}

impl PowProof {
    /// Checks this proof against the puzzle it claims to solve and the
    /// payload it must be bound to.
    pub fn check(&self, request: &PowRequest, data: &[u8]) -> bool {
        if self.algorithm != request.algorithm || request.difficulty > MAX_DIFFICULTY {
            return false;
        }

        let [a, b, c] = self.counters;
        if !(a < b && b < c) {
            return false;
        }

        let pa = request.bday_prefix(a, data);
        let pb = request.bday_prefix(b, data);
        let pc = request.bday_prefix(c, data);
        pa == pb && pb == pc
    }
}

impl fmt::Display for PowProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 24];
        for (i, counter) in self.counters.iter().enumerate() {
            buf[i * 8..(i + 1) * 8].copy_from_slice(&counter.to_le_bytes());
        }
        write!(f, "{}-{}", self.algorithm, BASE64.encode(&buf))
    }
}

impl FromStr for PowProof {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let (alg, rest) = s
            .split_once('-')
            .ok_or_else(|| Error::MalformedProof(s.to_string()))?;
        let buf = BASE64.decode(rest.as_bytes())?;
        if buf.len() != 24 {
            return Err(Error::MalformedProof(s.to_string()));
        }

        let mut counters = [0u64; 3];
        for (i, chunk) in buf.chunks_exact(8).enumerate() {
            counters[i] = u64::from_le_bytes(chunk.try_into().unwrap());
        }

        Ok(PowProof {
            algorithm: alg.parse()?,
            counters,
        })
    }
}

impl Serialize for PowProof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PowProof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

fn bit_prefix(digest: &[u8], bits: u32) -> Vec<u8> {
    let nbytes = (bits as usize).div_ceil(8);
    let mut out = digest[..nbytes].to_vec();

    let partial = bits % 8;
    if partial != 0 {
        let mask = 0xffu8 << (8 - partial);
        if let Some(last) = out.last_mut() {
            *last &= mask;
        }
    }

    out
}
