/// All possible errors thrown by `prefix-index` functions
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("Invalid address length: {0} bytes. Must be 4 (IPv4) or 16 (IPv6)")]
    InvalidAddressLength(usize),
    #[error("Mask is {mask} bytes long but the address it applies to is {address} bytes long")]
    MaskLengthMismatch { address: usize, mask: usize },
}

/// Result type for `prefix-index`
pub type Result<T> = std::result::Result<T, Error>;
