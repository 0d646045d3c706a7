use lazy_static::lazy_static;

pub mod label_values {
    /// Plain 4-byte IPv4 address
    pub const FAMILY_IPV4: &str = "ipv4";
    /// IPv4 address written in its IPv4-mapped IPv6 form
    pub const FAMILY_IPV4_MAPPED: &str = "ipv4_mapped";
    /// Native IPv6 address
    pub const FAMILY_IPV6: &str = "ipv6";

    /// A containing prefix was found
    pub const STATUS_FOUND: &str = "found";
    /// No prefix contained the address
    pub const STATUS_MISSED: &str = "missed";

    /// The table keyed on the first address byte
    pub const TABLE_IPV4: &str = "ipv4";
    /// The table keyed on the first two address bytes
    pub const TABLE_IPV6: &str = "ipv6";
}

lazy_static! {
    /// Counter for the number of containment lookups
    pub static ref PREFIX_LOOKUPS: prometheus::IntCounterVec = prometheus::register_int_counter_vec!(
        "prefix_lookups",
        "Number of containment lookups performed",
        &["family", "status"]
    ).unwrap();

    /// Number of prefixes stored in each bucket table, across every index in the process
    pub static ref PREFIXES_STORED: prometheus::IntGaugeVec = prometheus::register_int_gauge_vec!(
        "prefixes_stored",
        "Number of prefixes stored per bucket table",
        &["table"]
    ).unwrap();
}
