use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};

use crate::error::{Error, Result};

/// The first 12 bytes shared by every IPv4-mapped IPv6 address (`::ffff:0:0/96`)
pub const IPV4_MAPPED_PREFIX: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff];

/// Returns the embedded IPv4 octets if `octets` is an IPv4-mapped IPv6 address
#[must_use]
pub(crate) fn embedded_ipv4(octets: &[u8; 16]) -> Option<&[u8]> {
    if octets[..12] == IPV4_MAPPED_PREFIX {
        Some(&octets[12..])
    } else {
        None
    }
}

/// A raw IPv4 or IPv6 address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    /// 4-byte IPv4 address
    V4([u8; 4]),
    /// 16-byte IPv6 address. This may be an IPv4-mapped address
    V6([u8; 16]),
}

impl Address {
    /// Get the raw bytes of this address
    #[must_use]
    pub fn octets(&self) -> &[u8] {
        match self {
            Self::V4(octets) => &octets[..],
            Self::V6(octets) => &octets[..],
        }
    }

    /// Check if this is a 16-byte address in the `::ffff:0:0/96` range
    #[must_use]
    pub fn is_ipv4_mapped(&self) -> bool {
        match self {
            Self::V4(_) => false,
            Self::V6(octets) => embedded_ipv4(octets).is_some(),
        }
    }

    /// Get the IPv4 address embedded in an IPv4-mapped address
    #[must_use]
    pub fn to_ipv4_embedded(&self) -> Option<Ipv4Addr> {
        match self {
            Self::V4(_) => None,
            Self::V6(octets) => {
                embedded_ipv4(octets).map(|tail| Ipv4Addr::new(tail[0], tail[1], tail[2], tail[3]))
            }
        }
    }

    /// The bytes this address is compared with during containment checks.
    ///
    /// IPv4-mapped addresses are reduced to the 4 bytes they embed.
    #[must_use]
    pub(crate) fn comparison_octets(&self) -> &[u8] {
        match self {
            Self::V4(octets) => &octets[..],
            Self::V6(octets) => embedded_ipv4(octets).unwrap_or(&octets[..]),
        }
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            4 => Ok(Self::V4([bytes[0], bytes[1], bytes[2], bytes[3]])),
            16 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(bytes);
                Ok(Self::V6(octets))
            }
            len => Err(Error::InvalidAddressLength(len)),
        }
    }
}

impl From<Ipv4Addr> for Address {
    fn from(addr: Ipv4Addr) -> Self {
        Self::V4(addr.octets())
    }
}

impl From<Ipv6Addr> for Address {
    fn from(addr: Ipv6Addr) -> Self {
        Self::V6(addr.octets())
    }
}

impl From<IpAddr> for Address {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(addr) => addr.into(),
            IpAddr::V6(addr) => addr.into(),
        }
    }
}

impl From<Address> for IpAddr {
    fn from(addr: Address) -> Self {
        match addr {
            Address::V4(octets) => IpAddr::V4(octets.into()),
            Address::V6(octets) => IpAddr::V6(octets.into()),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&IpAddr::from(*self), f)
    }
}
