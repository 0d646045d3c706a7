use rustc_hash::FxHashMap;

use crate::{
    address::Address,
    bucket::BucketKey,
    error::Result,
    prefix::NetworkPrefix,
};

/// Summary of how prefixes are spread across buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    /// Number of prefixes in the IPv4 table (including IPv4-mapped prefixes)
    pub ipv4_prefixes: usize,
    /// Number of prefixes in the IPv6 table
    pub ipv6_prefixes: usize,
    /// Number of distinct first-byte keys in use
    pub ipv4_buckets: usize,
    /// Number of distinct first-two-byte keys in use
    pub ipv6_buckets: usize,
    /// Size of the most crowded bucket in either table
    pub largest_bucket: usize,
}

/// A set of network prefixes that can quickly find the prefix containing an address.
///
/// IPv4 and IPv4-mapped prefixes are filed under the first byte of their IPv4 network
/// address. Native IPv6 prefixes are filed under their first two bytes. A lookup only
/// tests the prefixes sharing the address's key, in the order they were added, and
/// returns the first one that contains it.
///
/// Prefixes shorter than their bucket key (`/8` for IPv4, `/16` for IPv6) are still filed
/// under the key of their own network address, so they only match addresses sharing that key.
///
/// The index is meant to be built once and then only read. Since lookups take `&self`,
/// a finished index can be shared between any number of threads.
#[derive(Debug, Clone, Default)]
pub struct PrefixIndex {
    /// IPv4 and IPv4-mapped prefixes, keyed on the first IPv4 byte
    by_first_byte: FxHashMap<u8, Vec<NetworkPrefix>>,
    /// Native IPv6 prefixes, keyed on the first two bytes
    by_first_two_bytes: FxHashMap<[u8; 2], Vec<NetworkPrefix>>,
    /// Total number of stored prefixes
    len: usize,
}

impl PrefixIndex {
    /// Construct a new empty `PrefixIndex`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prefix to the end of its bucket.
    ///
    /// Prefixes added earlier take priority over overlapping prefixes added later.
    #[profiling::function]
    pub fn add<P: Into<NetworkPrefix>>(&mut self, prefix: P) {
        let prefix = prefix.into();
        let key = prefix.bucket_key();
        log::trace!("Adding {} to bucket {}", prefix, key);
        if prefix.is_wider_than_bucket() {
            log::debug!(
                "{} is shorter than its bucket key and will only match addresses in bucket {}",
                prefix,
                key
            );
        }

        match key {
            BucketKey::Ipv4(first) => self.by_first_byte.entry(first).or_default().push(prefix),
            BucketKey::Ipv6(first_two) => self
                .by_first_two_bytes
                .entry(first_two)
                .or_default()
                .push(prefix),
        }
        self.len += 1;

        #[cfg(feature = "metrics")]
        match key {
            BucketKey::Ipv4(_) => prefix_metrics::metric!(PREFIXES_STORED, TABLE_IPV4).inc(),
            BucketKey::Ipv6(_) => prefix_metrics::metric!(PREFIXES_STORED, TABLE_IPV6).inc(),
        }
    }

    /// Add a prefix given as raw address and mask bytes.
    ///
    /// Fails if the address is not 4 or 16 bytes long, or if the mask length differs from it.
    pub fn add_bytes(&mut self, addr: &[u8], mask: &[u8]) -> Result<()> {
        self.add(NetworkPrefix::new(addr, mask)?);
        Ok(())
    }

    /// Find the first added prefix that contains `address`
    #[must_use]
    #[profiling::function]
    pub fn find<A: Into<Address>>(&self, address: A) -> Option<&NetworkPrefix> {
        let address = address.into();
        let octets = address.comparison_octets();

        let found = self
            .bucket(BucketKey::from_comparison_octets(octets))
            .and_then(|bucket| bucket.iter().find(|prefix| prefix.contains_octets(octets)));

        #[cfg(feature = "metrics")]
        record_lookup(&address, found.is_some());

        found
    }

    /// Find the first added prefix that contains the address given as raw bytes.
    ///
    /// Fails if the address is not 4 or 16 bytes long.
    pub fn find_bytes(&self, address: &[u8]) -> Result<Option<&NetworkPrefix>> {
        Ok(self.find(Address::try_from(address)?))
    }

    /// Get the prefixes filed under a bucket, in priority order
    #[must_use]
    pub fn bucket(&self, key: BucketKey) -> Option<&[NetworkPrefix]> {
        match key {
            BucketKey::Ipv4(first) => self.by_first_byte.get(&first),
            BucketKey::Ipv6(first_two) => self.by_first_two_bytes.get(&first_two),
        }
        .map(Vec::as_slice)
    }

    /// Iterate over every stored prefix.
    ///
    /// Prefixes sharing a bucket come out in priority order. The order of buckets is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = &NetworkPrefix> {
        self.by_first_byte
            .values()
            .chain(self.by_first_two_bytes.values())
            .flatten()
    }

    /// Get the total number of stored prefixes
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the index has no prefixes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Describe how the stored prefixes are spread across buckets
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            ipv4_prefixes: self.by_first_byte.values().map(Vec::len).sum(),
            ipv6_prefixes: self.by_first_two_bytes.values().map(Vec::len).sum(),
            ipv4_buckets: self.by_first_byte.len(),
            ipv6_buckets: self.by_first_two_bytes.len(),
            largest_bucket: self
                .by_first_byte
                .values()
                .chain(self.by_first_two_bytes.values())
                .map(Vec::len)
                .max()
                .unwrap_or(0),
        }
    }
}

impl<P: Into<NetworkPrefix>> Extend<P> for PrefixIndex {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for prefix in iter {
            self.add(prefix);
        }
    }
}

impl<P: Into<NetworkPrefix>> FromIterator<P> for PrefixIndex {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

/// Count a lookup under the family of the address that was looked up
#[cfg(feature = "metrics")]
fn record_lookup(address: &Address, found: bool) {
    use prefix_metrics::metrics::label_values::{
        FAMILY_IPV4, FAMILY_IPV4_MAPPED, FAMILY_IPV6, STATUS_FOUND, STATUS_MISSED,
    };

    let family = match address {
        Address::V4(_) => FAMILY_IPV4,
        Address::V6(_) if address.is_ipv4_mapped() => FAMILY_IPV4_MAPPED,
        Address::V6(_) => FAMILY_IPV6,
    };
    let status = if found { STATUS_FOUND } else { STATUS_MISSED };
    prefix_metrics::metrics::PREFIX_LOOKUPS
        .with_label_values(&[family, status])
        .inc();
}

#[cfg(test)]
mod tests {
    use std::{
        net::{IpAddr, Ipv4Addr, Ipv6Addr},
        sync::Arc,
    };

    use ipnet::IpNet;

    use super::*;
    use crate::Error;

    fn prefix(cidr: &str) -> NetworkPrefix {
        cidr.parse::<IpNet>().unwrap().into()
    }

    fn addr(addr: &str) -> IpAddr {
        addr.parse().unwrap()
    }

    fn index_of(cidrs: &[&str]) -> PrefixIndex {
        cidrs.iter().map(|cidr| prefix(cidr)).collect()
    }

    #[test]
    fn test_find_v4() {
        let index = index_of(&["192.168.0.0/24", "10.0.0.0/8"]);
        assert_eq!(index.find(addr("192.168.0.2")), Some(&prefix("192.168.0.0/24")));
        assert_eq!(index.find(addr("192.168.1.2")), None);
        assert_eq!(index.find(addr("10.200.1.1")), Some(&prefix("10.0.0.0/8")));
    }

    #[test]
    fn test_find_v6() {
        let index = index_of(&["2600:1700:4103::/48", "2600:1f00::/24"]);
        assert_eq!(
            index.find(addr("2600:1700:4103:2b1a:9c4e:1a2f:b3d5:c8e6")),
            Some(&prefix("2600:1700:4103::/48"))
        );
        assert_eq!(
            index.find(addr("2600:1f12::1")),
            Some(&prefix("2600:1f00::/24"))
        );
        assert_eq!(index.find(addr("2601::1")), None);
    }

    #[test]
    fn test_mapped_query_finds_plain_prefix() {
        let index = index_of(&["10.0.0.0/8"]);
        let mapped = index
            .find_bytes(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0x0a, 0, 0, 0x05])
            .unwrap();
        assert_eq!(mapped, Some(&prefix("10.0.0.0/8")));
    }

    #[test]
    fn test_plain_query_finds_mapped_prefix() {
        let index = index_of(&["::ffff:10.0.0.0/104"]);
        assert_eq!(
            index.find(Ipv4Addr::new(10, 0, 0, 5)),
            Some(&prefix("::ffff:10.0.0.0/104"))
        );
        assert_eq!(
            index.find(addr("::ffff:10.0.0.5")),
            Some(&prefix("::ffff:10.0.0.0/104"))
        );
        assert_eq!(index.find(Ipv4Addr::new(11, 0, 0, 5)), None);

        // Mapped prefixes live in the IPv4 table
        let stats = index.stats();
        assert_eq!(stats.ipv4_prefixes, 1);
        assert_eq!(stats.ipv6_prefixes, 0);
    }

    #[test]
    fn test_family_isolation() {
        let index = index_of(&["192.168.0.0/16", "0.0.0.0/0"]);
        assert_eq!(index.find(addr("2001:db8::1")), None);
        // 0xc0a8 are the first two bytes of 192.168.x.x
        assert_eq!(index.find(addr("c0a8::1")), None);

        let index = index_of(&["::/0"]);
        assert_eq!(index.find(addr("192.168.0.1")), None);
        assert_eq!(index.find(addr("::ffff:192.168.0.1")), None);
    }

    #[test]
    fn test_insertion_order_priority() {
        let index = index_of(&["10.0.0.0/8", "10.1.0.0/16"]);
        assert_eq!(index.find(addr("10.1.0.5")), Some(&prefix("10.0.0.0/8")));

        let index = index_of(&["10.1.0.0/16", "10.0.0.0/8"]);
        assert_eq!(index.find(addr("10.1.0.5")), Some(&prefix("10.1.0.0/16")));
        assert_eq!(index.find(addr("10.2.0.5")), Some(&prefix("10.0.0.0/8")));
    }

    #[test]
    fn test_round_trip_among_unrelated_prefixes() {
        let mut index = PrefixIndex::new();
        let mut targets = Vec::new();

        // Fill every IPv4 bucket and a spread of IPv6 buckets with noise
        for first in 0..=255u8 {
            index.add(NetworkPrefix::V4 {
                addr: [first, 77, 0, 0],
                mask: [255, 255, 0, 0],
            });
            index.add(NetworkPrefix::V6 {
                addr: Ipv6Addr::new(u16::from(first) << 8, 0x77, 0, 0, 0, 0, 0, 0).octets(),
                mask: Ipv6Addr::new(0xffff, 0xffff, 0, 0, 0, 0, 0, 0).octets(),
            });
        }

        for (cidr, probe) in [
            ("172.16.0.0/12", "172.31.255.254"),
            ("172.16.4.0/24", "172.16.4.9"),
            ("2001:db8:abcd::/48", "2001:db8:abcd:12::1"),
            ("2001:db8::/32", "2001:db8:1::1"),
            ("::ffff:198.51.100.0/120", "198.51.100.77"),
        ] {
            index.add(prefix(cidr));
            targets.push((prefix(cidr), addr(probe)));
        }

        for (target, probe) in targets {
            assert!(target.contains(probe));
            let found = index.find(probe).unwrap();
            assert!(found.contains(probe));
            assert_eq!(found.bucket_key(), target.bucket_key());
        }
    }

    #[test]
    fn test_agrees_with_linear_scan() {
        let prefixes: Vec<NetworkPrefix> = [
            "10.0.0.0/8",
            "10.10.0.0/16",
            "192.168.0.0/24",
            "192.168.7.0/24",
            "100.64.0.0/10",
            "::ffff:100.127.0.0/112",
            "2001:db8::/32",
            "2001:db8:1::/48",
            "fe80::/10",
            "fc00::/16",
        ]
        .iter()
        .map(|cidr| prefix(cidr))
        .collect();
        let index: PrefixIndex = prefixes.iter().copied().collect();

        for probe in [
            "10.10.1.1",
            "10.11.1.1",
            "192.168.7.9",
            "192.168.8.9",
            "100.127.0.1",
            "::ffff:100.100.0.1",
            "2001:db8:1::1",
            "2001:db9::1",
            "fe80::1",
            "fc00:12::1",
            "fd12::1",
            "::1",
        ] {
            let probe = addr(probe);
            let linear = prefixes.iter().find(|prefix| prefix.contains(probe));
            assert_eq!(index.find(probe), linear, "mismatch for {probe}");
        }
    }

    #[test]
    fn test_short_prefixes_stay_in_their_own_bucket() {
        let index = index_of(&["10.0.0.0/7", "fc00::/7"]);
        assert!(prefix("10.0.0.0/7").contains(addr("11.0.0.1")));

        // Found through the bucket of the network address
        assert_eq!(index.find(addr("10.0.0.1")), Some(&prefix("10.0.0.0/7")));
        assert_eq!(index.find(addr("fc00::1")), Some(&prefix("fc00::/7")));

        // Not found through any other bucket the prefix covers
        assert_eq!(index.find(addr("11.0.0.1")), None);
        assert_eq!(index.find(addr("fd00::1")), None);
    }

    #[test]
    fn test_empty_index() {
        let index = PrefixIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.find(addr("10.0.0.1")), None);
        assert_eq!(index.find(addr("::ffff:10.0.0.1")), None);
        assert_eq!(index.find(addr("2001:db8::1")), None);
        assert_eq!(index.find_bytes(&[10, 0, 0, 1]), Ok(None));
        assert_eq!(index.find_bytes(&[0; 16]), Ok(None));
        assert_eq!(index.find_bytes(&[0; 7]), Err(Error::InvalidAddressLength(7)));
        assert_eq!(index.stats(), IndexStats::default());
        assert_eq!(index.iter().count(), 0);
    }

    #[test]
    fn test_bad_lengths_are_rejected() {
        let mut index = PrefixIndex::new();
        assert_eq!(
            index.add_bytes(&[10, 0, 0], &[255, 0, 0]),
            Err(Error::InvalidAddressLength(3))
        );
        assert_eq!(
            index.add_bytes(&[10, 0, 0, 0], &[255, 0, 0]),
            Err(Error::MaskLengthMismatch {
                address: 4,
                mask: 3
            })
        );
        assert!(index.is_empty());
        assert_eq!(index.find_bytes(&[]), Err(Error::InvalidAddressLength(0)));

        index.add_bytes(&[10, 0, 0, 0], &[255, 0, 0, 0]).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_idempotent_reads() {
        let index = index_of(&["10.0.0.0/8", "2001:db8::/32"]);
        let first = index.find(addr("10.9.9.9")).copied();
        for _ in 0..100 {
            assert_eq!(index.find(addr("10.9.9.9")).copied(), first);
            assert_eq!(index.find(addr("2001:db9::1")), None);
        }
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_stats_and_iter() {
        let index = index_of(&[
            "10.0.0.0/8",
            "10.1.0.0/16",
            "11.0.0.0/8",
            "2001:db8::/32",
            "2001:db9::/32",
            "2a00::/12",
        ]);
        assert_eq!(
            index.stats(),
            IndexStats {
                ipv4_prefixes: 3,
                ipv6_prefixes: 3,
                ipv4_buckets: 2,
                ipv6_buckets: 2,
                largest_bucket: 2,
            }
        );
        assert_eq!(index.len(), 6);
        assert_eq!(index.iter().count(), 6);
        assert_eq!(
            index.bucket(BucketKey::Ipv4(10)),
            Some(&[prefix("10.0.0.0/8"), prefix("10.1.0.0/16")][..])
        );
        assert_eq!(index.bucket(BucketKey::Ipv4(12)), None);
    }

    #[test]
    fn test_concurrent_readers() {
        let index = Arc::new(index_of(&["10.0.0.0/8", "2001:db8::/32"]));
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let index = Arc::clone(&index);
                scope.spawn(move || {
                    for _ in 0..1000 {
                        assert_eq!(index.find(addr("10.1.2.3")), Some(&prefix("10.0.0.0/8")));
                        assert_eq!(index.find(addr("2001:db8::7")), Some(&prefix("2001:db8::/32")));
                        assert_eq!(index.find(addr("11.1.2.3")), None);
                    }
                });
            }
        });
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_lookups_are_counted() {
        let found = prefix_metrics::metric!(PREFIX_LOOKUPS, FAMILY_IPV4_MAPPED, STATUS_FOUND);
        let before = found.get();

        let index = index_of(&["10.0.0.0/8"]);
        assert!(index.find(addr("::ffff:10.0.0.1")).is_some());

        assert!(found.get() > before);
    }
}
