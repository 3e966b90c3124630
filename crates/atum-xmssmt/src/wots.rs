//! WOTS+ one-time signatures (RFC 8391 section 3), verification side.
//!
//! Fixed to w = 16 and n = 32: messages split into 64 base-16 digits plus
//! a 3-digit checksum, 67 chains total.

use crate::address::Address;
use crate::hash::{N, f};
use crate::params::HashFunc;

/// Number of message digits.
const LEN1: usize = 64;
/// Number of checksum digits.
const LEN2: usize = 3;
/// Total number of chains.
pub(crate) const LEN: usize = LEN1 + LEN2;

/// Winternitz parameter.
const W: u8 = 16;

/// Splits a message hash into base-16 digits and appends the left-aligned
/// 12-bit checksum as three more digits.
pub(crate) fn digits(msg: &[u8; N]) -> [u8; LEN] {
    let mut out = [0u8; LEN];
    for (i, &byte) in msg.iter().enumerate() {
        out[2 * i] = byte >> 4;
        out[2 * i + 1] = byte & 0x0f;
    }

    // csum fits in 10 bits (64 * 15); left-shift by 4 so the 12 checksum
    // bits sit at the top of two bytes, then take the first three digits.
    let csum: u32 = out[..LEN1].iter().map(|&d| (W - 1 - d) as u32).sum();
    let csum = csum << 4;
    let hi = (csum >> 8) as u8;
    let lo = (csum & 0xff) as u8;
    out[LEN1] = hi >> 4;
    out[LEN1 + 1] = hi & 0x0f;
    out[LEN1 + 2] = lo >> 4;

    out
}

/// Applies the chaining function `steps` times starting at position
/// `start`. The address must already carry the right OTS and chain slots.
pub(crate) fn chain(
    func: HashFunc,
    pub_seed: &[u8; N],
    adrs: &mut Address,
    x: &[u8; N],
    start: u8,
    steps: u8,
) -> [u8; N] {
    let mut out = *x;
    for position in start..start + steps {
        adrs.set_hash(position as u32);
        out = f(func, pub_seed, adrs, &out);
    }
    out
}

/// Recovers the WOTS+ public key elements from a signature: each chain is
/// simply run to its end, `w - 1 - digit` more steps.
pub(crate) fn pk_from_sig(
    func: HashFunc,
    pub_seed: &[u8; N],
    adrs: &mut Address,
    msg: &[u8; N],
    sig: &[[u8; N]],
) -> Vec<[u8; N]> {
    debug_assert_eq!(sig.len(), LEN);
    let digits = digits(msg);

    let mut pk = Vec::with_capacity(LEN);
    for i in 0..LEN {
        adrs.set_chain(i as u32);
        pk.push(chain(
            func,
            pub_seed,
            adrs,
            &sig[i],
            digits[i],
            W - 1 - digits[i],
        ));
    }
    pk
}

/// Signing-side chains, used by the test signer only: run each chain from
/// its secret start up to the digit.
#[cfg(test)]
pub(crate) fn sign(
    func: HashFunc,
    pub_seed: &[u8; N],
    adrs: &mut Address,
    msg: &[u8; N],
    sk: &[[u8; N]],
) -> Vec<[u8; N]> {
    let digits = digits(msg);

    let mut sig = Vec::with_capacity(LEN);
    for i in 0..LEN {
        adrs.set_chain(i as u32);
        sig.push(chain(func, pub_seed, adrs, &sk[i], 0, digits[i]));
    }
    sig
}

/// Public key generation from secrets, test signer only.
#[cfg(test)]
pub(crate) fn pk_gen(
    func: HashFunc,
    pub_seed: &[u8; N],
    adrs: &mut Address,
    sk: &[[u8; N]],
) -> Vec<[u8; N]> {
    let mut pk = Vec::with_capacity(LEN);
    for i in 0..LEN {
        adrs.set_chain(i as u32);
        pk.push(chain(func, pub_seed, adrs, &sk[i], 0, W - 1));
    }
    pk
}
