//! Keyed hash constructions of RFC 8391 section 5.1, for n = 32.
//!
//! Every construction prefixes a 32-byte domain-separation constant:
//! 0 for F, 1 for H, 2 for H_msg and 3 for PRF.

use aws_lc_rs::digest;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake128;

use crate::address::Address;
use crate::params::HashFunc;

/// Hash output size in bytes.
pub(crate) const N: usize = 32;

fn hash_parts(func: HashFunc, parts: &[&[u8]]) -> [u8; N] {
    let mut out = [0u8; N];
    match func {
        HashFunc::Sha2 => {
            let mut ctx = digest::Context::new(&digest::SHA256);
            for part in parts {
                ctx.update(part);
            }
            out.copy_from_slice(ctx.finish().as_ref());
        }
        HashFunc::Shake => {
            let mut xof = Shake128::default();
            for part in parts {
                xof.update(part);
            }
            xof.finalize_xof().read(&mut out);
        }
    }
    out
}

/// `toByte(x, 32)`: x as a 32-byte big-endian integer.
pub(crate) fn to_byte32(x: u64) -> [u8; N] {
    let mut out = [0u8; N];
    out[N - 8..].copy_from_slice(&x.to_be_bytes());
    out
}

/// PRF: keyed pseudorandom function over a 32-byte input.
pub(crate) fn prf(func: HashFunc, key: &[u8; N], input: &[u8; N]) -> [u8; N] {
    hash_parts(func, &[&to_byte32(3), key, input])
}

/// H_msg: randomized message hash, keyed by `r || root || toByte(idx)`.
pub(crate) fn h_msg(
    func: HashFunc,
    r: &[u8; N],
    root: &[u8; N],
    idx: u64,
    msg: &[u8],
) -> [u8; N] {
    hash_parts(func, &[&to_byte32(2), r, root, &to_byte32(idx), msg])
}

/// F: the chaining function. Key and bitmask are derived from the public
/// seed at the given address.
pub(crate) fn f(func: HashFunc, pub_seed: &[u8; N], adrs: &mut Address, x: &[u8; N]) -> [u8; N] {
    adrs.set_key_and_mask(0);
    let key = prf(func, pub_seed, &adrs.to_bytes());
    adrs.set_key_and_mask(1);
    let bitmask = prf(func, pub_seed, &adrs.to_bytes());

    let mut masked = [0u8; N];
    for i in 0..N {
        masked[i] = x[i] ^ bitmask[i];
    }
    hash_parts(func, &[&to_byte32(0), &key, &masked])
}

/// RAND_HASH / H: combines two tree nodes under key and bitmasks derived
/// at the given address.
pub(crate) fn rand_hash(
    func: HashFunc,
    pub_seed: &[u8; N],
    adrs: &mut Address,
    left: &[u8; N],
    right: &[u8; N],
) -> [u8; N] {
    adrs.set_key_and_mask(0);
    let key = prf(func, pub_seed, &adrs.to_bytes());
    adrs.set_key_and_mask(1);
    let bm0 = prf(func, pub_seed, &adrs.to_bytes());
    adrs.set_key_and_mask(2);
    let bm1 = prf(func, pub_seed, &adrs.to_bytes());

    let mut masked = [0u8; 2 * N];
    for i in 0..N {
        masked[i] = left[i] ^ bm0[i];
        masked[N + i] = right[i] ^ bm1[i];
    }
    hash_parts(func, &[&to_byte32(1), &key, &masked])
}
