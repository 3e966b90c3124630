use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown XMSS^MT parameter set oid: {0:#010x}")]
    UnknownOid(u32),

    #[error("blob too short: {0} bytes needed, {1} bytes available")]
    TooShort(usize, usize),

    #[error("blob length mismatch: expected {0} bytes, got {1}")]
    LengthMismatch(usize, usize),

    #[error("signature index {0} out of range for tree height {1}")]
    IndexOutOfRange(u64, u32),
}
