//! RFC 8391 hash function addresses.
//!
//! Every hash invocation in XMSS is domain-separated by a 32-byte address
//! identifying where in the hyper-tree it happens: which layer, which
//! subtree, and which position inside an OTS chain, L-tree or hash tree.

/// Address type tags (word 3).
pub(crate) const ADDR_TYPE_OTS: u32 = 0;
pub(crate) const ADDR_TYPE_LTREE: u32 = 1;
pub(crate) const ADDR_TYPE_HASHTREE: u32 = 2;

/// A 32-byte address: eight big-endian u32 words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Address {
    words: [u32; 8],
}

impl Address {
    pub fn set_layer(&mut self, layer: u32) {
        self.words[0] = layer;
    }

    pub fn set_tree(&mut self, tree: u64) {
        self.words[1] = (tree >> 32) as u32;
        self.words[2] = tree as u32;
    }

    /// Sets the address type and, per RFC 8391, zeroes all the words
    /// after it.
    pub fn set_type(&mut self, addr_type: u32) {
        self.words[3] = addr_type;
        self.words[4] = 0;
        self.words[5] = 0;
        self.words[6] = 0;
        self.words[7] = 0;
    }

    /// OTS address (word 4, type 0) or L-tree address (word 4, type 1).
    pub fn set_ots(&mut self, ots: u32) {
        self.words[4] = ots;
    }

    pub fn set_ltree(&mut self, ltree: u32) {
        self.words[4] = ltree;
    }

    /// Chain address within a WOTS+ key (word 5, type 0).
    pub fn set_chain(&mut self, chain: u32) {
        self.words[5] = chain;
    }

    /// Hash address within a WOTS+ chain (word 6, type 0).
    pub fn set_hash(&mut self, hash: u32) {
        self.words[6] = hash;
    }

    /// Node height within an L-tree or hash tree (word 5, types 1 and 2).
    pub fn set_tree_height(&mut self, height: u32) {
        self.words[5] = height;
    }

    /// Node index within an L-tree or hash tree (word 6, types 1 and 2).
    pub fn set_tree_index(&mut self, index: u32) {
        self.words[6] = index;
    }

    /// 0 selects the hash key, 1 and 2 select bitmasks (word 7).
    pub fn set_key_and_mask(&mut self, selector: u32) {
        self.words[7] = selector;
    }

    pub fn to_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, word) in self.words.iter().enumerate() {
            out[i * 4..(i + 1) * 4].copy_from_slice(&word.to_be_bytes());
        }
        out
    }
}
