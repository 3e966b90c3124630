//! XMSS^MT (RFC 8391) signature *verification*.
//!
//! Atum servers may sign timestamps with XMSS^MT, a stateful hash-based
//! scheme. The statefulness only matters on the signer's side (a one-time
//! key component must never be reused); verification is stateless and
//! read-only, which is all a timestamping client ever needs. This crate
//! therefore implements key/signature parsing and the verification
//! predicate, nothing else.
//!
//! Both serialized forms are self-describing: a 4-byte big-endian
//! parameter-set OID precedes the actual key or signature bytes.

#![forbid(unsafe_code)]

mod address;
mod error;
mod hash;
mod params;
mod wots;

pub use error::Error;
pub use params::{HashFunc, Params};

use aws_lc_rs::constant_time::verify_slices_are_equal;

use crate::address::{ADDR_TYPE_HASHTREE, ADDR_TYPE_LTREE, ADDR_TYPE_OTS, Address};
use crate::hash::{N, h_msg, rand_hash};

/// A serialized-form XMSS^MT public key: parameter OID, hyper-tree root
/// and the public seed all hash keys and bitmasks derive from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    params: Params,
    root: [u8; N],
    pub_seed: [u8; N],
}

impl PublicKey {
    /// Parses `oid || root || pub_seed`.
    pub fn from_bytes(bytes: &[u8]) -> Result<PublicKey, Error> {
        if bytes.len() < 4 {
            return Err(Error::TooShort(4, bytes.len()));
        }
        let oid = u32::from_be_bytes(bytes[..4].try_into().unwrap());
        let params = Params::from_oid(oid)?;

        let expected = 4 + 2 * N;
        if bytes.len() != expected {
            return Err(Error::LengthMismatch(expected, bytes.len()));
        }

        let mut root = [0u8; N];
        let mut pub_seed = [0u8; N];
        root.copy_from_slice(&bytes[4..4 + N]);
        pub_seed.copy_from_slice(&bytes[4 + N..]);

        Ok(PublicKey {
            params,
            root,
            pub_seed,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 2 * N);
        out.extend_from_slice(&self.params.oid().to_be_bytes());
        out.extend_from_slice(&self.root);
        out.extend_from_slice(&self.pub_seed);
        out
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Runs the XMSS^MT verification predicate: recompute the hyper-tree
    /// root from the signature and compare against ours.
    ///
    /// A signature serialized under a different parameter set never
    /// verifies.
    pub fn verify(&self, msg: &[u8], sig: &Signature) -> bool {
        if sig.params.oid() != self.params.oid() {
            return false;
        }
        verify_raw(
            &self.params,
            &self.pub_seed,
            &self.root,
            sig.index,
            &sig.randomness,
            &sig.layers,
            msg,
        )
    }
}

/// One layer of an XMSS^MT signature: a WOTS+ signature on the node below
/// plus the authentication path to the layer's subtree root.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LayerSig {
    wots: Vec<[u8; N]>,
    auth: Vec<[u8; N]>,
}

/// A parsed XMSS^MT signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Params,
    index: u64,
    randomness: [u8; N],
    layers: Vec<LayerSig>,
}

impl Signature {
    /// Parses `oid || index || randomness || layers`, where each layer is
    /// 67 WOTS+ chain values followed by the authentication path.
    pub fn from_bytes(bytes: &[u8]) -> Result<Signature, Error> {
        if bytes.len() < 4 {
            return Err(Error::TooShort(4, bytes.len()));
        }
        let oid = u32::from_be_bytes(bytes[..4].try_into().unwrap());
        let params = Params::from_oid(oid)?;

        let expected = 4 + params.sig_bytes();
        if bytes.len() != expected {
            return Err(Error::LengthMismatch(expected, bytes.len()));
        }

        let mut cursor = &bytes[4..];

        let mut index: u64 = 0;
        for &byte in &cursor[..params.index_bytes()] {
            index = index << 8 | byte as u64;
        }
        cursor = &cursor[params.index_bytes()..];

        if params.full_height < 64 && index >= 1u64 << params.full_height {
            return Err(Error::IndexOutOfRange(index, params.full_height));
        }

        let mut randomness = [0u8; N];
        randomness.copy_from_slice(&cursor[..N]);
        cursor = &cursor[N..];

        let mut layers = Vec::with_capacity(params.layers as usize);
        for _ in 0..params.layers {
            let wots = take_nodes(&mut cursor, wots::LEN);
            let auth = take_nodes(&mut cursor, params.tree_height() as usize);
            layers.push(LayerSig { wots, auth });
        }

        Ok(Signature {
            params,
            index,
            randomness,
            layers,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.params.sig_bytes());
        out.extend_from_slice(&self.params.oid().to_be_bytes());

        let idx_bytes = self.params.index_bytes();
        let idx_be = self.index.to_be_bytes();
        out.extend_from_slice(&idx_be[8 - idx_bytes..]);

        out.extend_from_slice(&self.randomness);
        for layer in &self.layers {
            for node in layer.wots.iter().chain(layer.auth.iter()) {
                out.extend_from_slice(node);
            }
        }
        out
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The leaf index this signature consumed; exposed because signers
    /// must never reuse it.
    pub fn index(&self) -> u64 {
        self.index
    }
}

fn take_nodes(cursor: &mut &[u8], count: usize) -> Vec<[u8; N]> {
    let mut out = Vec::with_capacity(count);
    for chunk in cursor[..count * N].chunks_exact(N) {
        let mut node = [0u8; N];
        node.copy_from_slice(chunk);
        out.push(node);
    }
    *cursor = &cursor[count * N..];
    out
}

/// Compresses the 67 WOTS+ public key elements into a single leaf node
/// (RFC 8391 algorithm 9).
fn ltree(params: &Params, pub_seed: &[u8; N], adrs: &mut Address, pk: &mut [[u8; N]]) -> [u8; N] {
    let func = params.func;
    let mut len = pk.len();
    let mut height: u32 = 0;

    while len > 1 {
        adrs.set_tree_height(height);
        for i in 0..len / 2 {
            adrs.set_tree_index(i as u32);
            pk[i] = rand_hash(func, pub_seed, adrs, &pk[2 * i], &pk[2 * i + 1]);
        }
        if len % 2 == 1 {
            pk[len / 2] = pk[len - 1];
        }
        len = len.div_ceil(2);
        height += 1;
    }

    pk[0]
}

/// Walks an authentication path from a leaf to its subtree root
/// (RFC 8391 algorithm 13, iterative form).
fn compute_root(
    params: &Params,
    pub_seed: &[u8; N],
    adrs: &mut Address,
    leaf: [u8; N],
    idx_leaf: u32,
    auth: &[[u8; N]],
) -> [u8; N] {
    let func = params.func;
    let mut node = leaf;
    let mut idx = idx_leaf;

    for (height, sibling) in auth.iter().enumerate() {
        adrs.set_tree_height(height as u32);
        adrs.set_tree_index(idx >> 1);
        node = if idx & 1 == 0 {
            rand_hash(func, pub_seed, adrs, &node, sibling)
        } else {
            rand_hash(func, pub_seed, adrs, sibling, &node)
        };
        idx >>= 1;
    }

    node
}

/// Recomputes one subtree root from a layer signature.
fn root_from_sig(
    params: &Params,
    pub_seed: &[u8; N],
    layer: u32,
    tree: u64,
    idx_leaf: u32,
    msg: &[u8; N],
    sig: &LayerSig,
) -> [u8; N] {
    let mut adrs = Address::default();
    adrs.set_layer(layer);
    adrs.set_tree(tree);

    adrs.set_type(ADDR_TYPE_OTS);
    adrs.set_ots(idx_leaf);
    let mut wots_pk = wots::pk_from_sig(params.func, pub_seed, &mut adrs, msg, &sig.wots);

    adrs.set_type(ADDR_TYPE_LTREE);
    adrs.set_ltree(idx_leaf);
    let leaf = ltree(params, pub_seed, &mut adrs, &mut wots_pk);

    adrs.set_type(ADDR_TYPE_HASHTREE);
    compute_root(params, pub_seed, &mut adrs, leaf, idx_leaf, &sig.auth)
}

fn verify_raw(
    params: &Params,
    pub_seed: &[u8; N],
    root: &[u8; N],
    index: u64,
    randomness: &[u8; N],
    layers: &[LayerSig],
    msg: &[u8],
) -> bool {
    if layers.len() != params.layers as usize {
        return false;
    }

    let mhash = h_msg(params.func, randomness, root, index, msg);

    let tree_height = params.tree_height();
    let leaf_mask = (1u64 << tree_height) - 1;

    let mut idx_tree = index >> tree_height;
    let mut idx_leaf = (index & leaf_mask) as u32;

    let mut node = root_from_sig(params, pub_seed, 0, idx_tree, idx_leaf, &mhash, &layers[0]);

    for (layer, sig) in layers.iter().enumerate().skip(1) {
        idx_leaf = (idx_tree & leaf_mask) as u32;
        idx_tree >>= tree_height;
        node = root_from_sig(
            params,
            pub_seed,
            layer as u32,
            idx_tree,
            idx_leaf,
            &node,
            sig,
        );
    }

    verify_slices_are_equal(&node, root).is_ok()
}
