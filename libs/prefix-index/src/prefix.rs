use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

use crate::{
    address::{embedded_ipv4, Address},
    bucket::BucketKey,
    error::{Error, Result},
};

/// A network prefix described by its base address and a mask of the same length.
///
/// The base address is expected to already be masked (`addr[i] == addr[i] & mask[i]`).
/// Masks are not checked for contiguity. A malformed mask simply produces whatever the
/// bitwise comparison in [`NetworkPrefix::contains`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkPrefix {
    /// IPv4 prefix
    V4 { addr: [u8; 4], mask: [u8; 4] },
    /// IPv6 prefix. This may be an IPv4-mapped prefix
    V6 { addr: [u8; 16], mask: [u8; 16] },
}

impl NetworkPrefix {
    /// Construct a prefix from raw address and mask bytes
    pub fn new(addr: &[u8], mask: &[u8]) -> Result<Self> {
        // The address length decides the family, the mask just has to agree with it
        let address = Address::try_from(addr)?;
        if mask.len() != addr.len() {
            return Err(Error::MaskLengthMismatch {
                address: addr.len(),
                mask: mask.len(),
            });
        }

        Ok(match address {
            Address::V4(addr) => Self::V4 {
                addr,
                mask: [mask[0], mask[1], mask[2], mask[3]],
            },
            Address::V6(addr) => {
                let mut mask_octets = [0u8; 16];
                mask_octets.copy_from_slice(mask);
                Self::V6 {
                    addr,
                    mask: mask_octets,
                }
            }
        })
    }

    /// Get the base address of this prefix
    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            Self::V4 { addr, .. } => Address::V4(*addr),
            Self::V6 { addr, .. } => Address::V6(*addr),
        }
    }

    /// Get the raw mask bytes
    #[must_use]
    pub fn mask(&self) -> &[u8] {
        match self {
            Self::V4 { mask, .. } => &mask[..],
            Self::V6 { mask, .. } => &mask[..],
        }
    }

    /// Check if this is a 16-byte prefix whose base address is IPv4-mapped
    #[must_use]
    pub fn is_ipv4_mapped(&self) -> bool {
        self.address().is_ipv4_mapped()
    }

    /// Get the number of leading 1-bits in the mask.
    ///
    /// Returns `None` if the mask is not a contiguous run of 1-bits followed by 0-bits.
    #[must_use]
    pub fn prefix_len(&self) -> Option<u8> {
        let (ones, rest_is_zero) = match self {
            Self::V4 { mask, .. } => {
                let bits = u32::from_be_bytes(*mask);
                let ones = bits.leading_ones();
                (ones, bits.checked_shl(ones).unwrap_or(0) == 0)
            }
            Self::V6 { mask, .. } => {
                let bits = u128::from_be_bytes(*mask);
                let ones = bits.leading_ones();
                (ones, bits.checked_shl(ones).unwrap_or(0) == 0)
            }
        };
        if rest_is_zero {
            u8::try_from(ones).ok()
        } else {
            None
        }
    }

    /// Get the bucket this prefix is filed under
    #[must_use]
    pub fn bucket_key(&self) -> BucketKey {
        BucketKey::from_comparison_octets(self.comparison_parts().0)
    }

    /// Check if the mask is shorter than the bucket key, meaning this prefix
    /// covers addresses filed under other buckets
    #[must_use]
    pub fn is_wider_than_bucket(&self) -> bool {
        let (addr, mask) = self.comparison_parts();
        let key_len = if addr.len() == 4 { 1 } else { 2 };
        mask[..key_len].iter().any(|byte| *byte != 0xff)
    }

    /// Check if `address` lies within this prefix.
    ///
    /// IPv4 addresses and their IPv4-mapped IPv6 forms are interchangeable on both sides.
    /// An IPv4 prefix never contains a native IPv6 address and vice versa.
    #[must_use]
    pub fn contains<A: Into<Address>>(&self, address: A) -> bool {
        self.contains_octets(address.into().comparison_octets())
    }

    /// Containment check against an address that has already been reduced to its comparison form
    #[profiling::function]
    pub(crate) fn contains_octets(&self, octets: &[u8]) -> bool {
        let (addr, mask) = self.comparison_parts();
        if addr.len() != octets.len() {
            return false;
        }
        addr.iter()
            .zip(mask)
            .zip(octets)
            .all(|((net, mask), octet)| *net == octet & mask)
    }

    /// The base address and mask bytes used in comparisons.
    ///
    /// IPv4-mapped prefixes are reduced to their trailing 4 bytes.
    fn comparison_parts(&self) -> (&[u8], &[u8]) {
        match self {
            Self::V4 { addr, mask } => (&addr[..], &mask[..]),
            Self::V6 { addr, mask } => match embedded_ipv4(addr) {
                Some(tail) => (tail, &mask[12..]),
                None => (&addr[..], &mask[..]),
            },
        }
    }
}

impl From<Ipv4Net> for NetworkPrefix {
    fn from(net: Ipv4Net) -> Self {
        Self::V4 {
            addr: net.network().octets(),
            mask: net.netmask().octets(),
        }
    }
}

impl From<Ipv6Net> for NetworkPrefix {
    fn from(net: Ipv6Net) -> Self {
        Self::V6 {
            addr: net.network().octets(),
            mask: net.netmask().octets(),
        }
    }
}

impl From<IpNet> for NetworkPrefix {
    fn from(net: IpNet) -> Self {
        match net {
            IpNet::V4(net) => net.into(),
            IpNet::V6(net) => net.into(),
        }
    }
}

impl fmt::Display for NetworkPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix_len() {
            Some(len) => write!(f, "{}/{}", self.address(), len),
            // Non-contiguous masks are written out in full
            None => {
                let mask = match self {
                    Self::V4 { mask, .. } => IpAddr::V4(Ipv4Addr::from(*mask)),
                    Self::V6 { mask, .. } => IpAddr::V6(Ipv6Addr::from(*mask)),
                };
                write!(f, "{}/{}", self.address(), mask)
            }
        }
    }
}
