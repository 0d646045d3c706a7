use std::fmt;

/// The shard a prefix is stored in, and the only shard searched for a matching address.
///
/// Keys are taken from the comparison form of an address, so IPv4-mapped IPv6
/// addresses are keyed on the first byte of the IPv4 address they embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    /// First byte of an IPv4 (or IPv4-mapped) address
    Ipv4(u8),
    /// First two bytes of a native IPv6 address
    Ipv6([u8; 2]),
}

impl BucketKey {
    /// Pick the bucket for a 4 or 16 byte address in comparison form
    pub(crate) fn from_comparison_octets(octets: &[u8]) -> Self {
        match octets.len() {
            4 => Self::Ipv4(octets[0]),
            _ => Self::Ipv6([octets[0], octets[1]]),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4(first) => write!(f, "{first}.*"),
            Self::Ipv6([first, second]) => write!(f, "{first:02x}{second:02x}::*"),
        }
    }
}
