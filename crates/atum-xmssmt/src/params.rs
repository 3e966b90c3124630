use crate::error::Error;

/// Hash function family a parameter set is instantiated with.
///
/// Per RFC 8391, the 256-bit SHAKE parameter sets use SHAKE128 with a
/// 32-byte output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFunc {
    Sha2,
    Shake,
}

/// An XMSS^MT parameter set.
///
/// Only the 256-bit sets are registered (n = 32, Winternitz w = 16); the
/// 512-bit sets do not occur in Atum timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub(crate) oid: u32,
    pub(crate) func: HashFunc,
    /// Total height of the hyper-tree.
    pub(crate) full_height: u32,
    /// Number of tree layers; `full_height` is a multiple of this.
    pub(crate) layers: u32,
}

/// Registered parameter sets from RFC 8391 section 5.4 (the 256-bit ones).
const REGISTRY: &[Params] = &[
    Params::raw(0x0000_0001, HashFunc::Sha2, 20, 2),
    Params::raw(0x0000_0002, HashFunc::Sha2, 20, 4),
    Params::raw(0x0000_0003, HashFunc::Sha2, 40, 2),
    Params::raw(0x0000_0004, HashFunc::Sha2, 40, 4),
    Params::raw(0x0000_0005, HashFunc::Sha2, 40, 8),
    Params::raw(0x0000_0006, HashFunc::Sha2, 60, 3),
    Params::raw(0x0000_0007, HashFunc::Sha2, 60, 6),
    Params::raw(0x0000_0008, HashFunc::Sha2, 60, 12),
    Params::raw(0x0000_0011, HashFunc::Shake, 20, 2),
    Params::raw(0x0000_0012, HashFunc::Shake, 20, 4),
    Params::raw(0x0000_0013, HashFunc::Shake, 40, 2),
    Params::raw(0x0000_0014, HashFunc::Shake, 40, 4),
    Params::raw(0x0000_0015, HashFunc::Shake, 40, 8),
    Params::raw(0x0000_0016, HashFunc::Shake, 60, 3),
    Params::raw(0x0000_0017, HashFunc::Shake, 60, 6),
    Params::raw(0x0000_0018, HashFunc::Shake, 60, 12),
];

impl Params {
    const fn raw(oid: u32, func: HashFunc, full_height: u32, layers: u32) -> Params {
        Params {
            oid,
            func,
            full_height,
            layers,
        }
    }

    /// Looks up a registered parameter set by its wire OID.
    pub fn from_oid(oid: u32) -> Result<Params, Error> {
        REGISTRY
            .iter()
            .find(|p| p.oid == oid)
            .copied()
            .ok_or(Error::UnknownOid(oid))
    }

    /// Unregistered parameter set. Tiny trees keep signing tractable in
    /// tests; blobs carrying OID zero never parse, so these cannot leak
    /// onto the wire.
    #[cfg(test)]
    pub(crate) fn custom(func: HashFunc, full_height: u32, layers: u32) -> Params {
        assert!(full_height % layers == 0);
        Params::raw(0, func, full_height, layers)
    }

    pub fn oid(&self) -> u32 {
        self.oid
    }

    /// Height of each subtree.
    pub(crate) fn tree_height(&self) -> u32 {
        self.full_height / self.layers
    }

    /// Bytes used to encode the leaf index in a serialized signature.
    pub(crate) fn index_bytes(&self) -> usize {
        (self.full_height as usize).div_ceil(8)
    }

    /// Serialized signature size, excluding the 4-byte OID prefix.
    pub(crate) fn sig_bytes(&self) -> usize {
        let per_layer = (crate::wots::LEN + self.tree_height() as usize) * crate::hash::N;
        self.index_bytes() + crate::hash::N + self.layers as usize * per_layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_oids_resolve() {
        let p = Params::from_oid(0x11).unwrap();
        assert_eq!(p.func, HashFunc::Shake);
        assert_eq!(p.full_height, 20);
        assert_eq!(p.layers, 2);
        assert_eq!(p.tree_height(), 10);
        assert_eq!(p.index_bytes(), 3);
    }

    #[test]
    fn unknown_oid_is_rejected() {
        assert!(matches!(Params::from_oid(0x42), Err(Error::UnknownOid(_))));
        assert!(matches!(Params::from_oid(0), Err(Error::UnknownOid(_))));
    }

    #[test]
    fn signature_sizes() {
        // XMSSMT-SHA2_20/2_256: 3 + 32 + 2*(67+10)*32 = 4963
        let p = Params::from_oid(0x01).unwrap();
        assert_eq!(p.sig_bytes(), 3 + 32 + 2 * (67 + 10) * 32);

        // XMSSMT-SHA2_60/12_256: 8 + 32 + 12*(67+5)*32
        let p = Params::from_oid(0x08).unwrap();
        assert_eq!(p.sig_bytes(), 8 + 32 + 12 * (67 + 5) * 32);
    }
}
