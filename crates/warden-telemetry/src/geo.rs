//! IP-to-country attribution for the geographic distribution rollup.

use std::net::Ipv4Addr;

use tracing::warn;

/// Resolves an IP address to an ISO country code.
pub trait GeoResolver: Send + Sync + 'static {
    /// Country for the given address, or None when unattributable.
    fn country(&self, ip: &str) -> Option<String>;
}

/// CIDR-table resolver configured from `telemetry.geo_table` entries of
/// the form `"81.2.69.0/24=GB"`. Entries that fail to parse are skipped
/// with a warning; unmatched and non-IPv4 addresses resolve to None.
#[derive(Debug, Clone, Default)]
pub struct StaticGeoResolver {
    prefixes: Vec<(u32, u32, String)>,
}

impl StaticGeoResolver {
    /// Build a resolver from configuration entries.
    pub fn from_table(entries: &[String]) -> Self {
        let mut prefixes = Vec::new();
        for entry in entries {
            match parse_entry(entry) {
                Some(parsed) => prefixes.push(parsed),
                None => warn!(entry = %entry, "Skipping malformed geo table entry"),
            }
        }
        // Longest prefix first so the most specific route wins.
        prefixes.sort_by(|a, b| b.1.cmp(&a.1));
        Self { prefixes }
    }
}

impl GeoResolver for StaticGeoResolver {
    fn country(&self, ip: &str) -> Option<String> {
        let addr: Ipv4Addr = ip.parse().ok()?;
        let addr = u32::from(addr);
        self.prefixes
            .iter()
            .find(|(network, mask, _)| addr & mask == network & mask)
            .map(|(_, _, country)| country.clone())
    }
}

fn parse_entry(entry: &str) -> Option<(u32, u32, String)> {
    let (cidr, country) = entry.split_once('=')?;
    let (network, len) = cidr.split_once('/')?;
    let network: Ipv4Addr = network.parse().ok()?;
    let len: u32 = len.parse().ok()?;
    if len > 32 || country.is_empty() {
        return None;
    }
    let mask = if len == 0 { 0 } else { u32::MAX << (32 - len) };
    Some((u32::from(network), mask, country.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        let resolver = StaticGeoResolver::from_table(&[
            "81.2.69.0/24=GB".to_string(),
            "10.0.0.0/8=ZZ".to_string(),
        ]);
        assert_eq!(resolver.country("81.2.69.142"), Some("GB".to_string()));
        assert_eq!(resolver.country("10.20.30.40"), Some("ZZ".to_string()));
        assert_eq!(resolver.country("192.0.2.1"), None);
        assert_eq!(resolver.country("not-an-ip"), None);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let resolver = StaticGeoResolver::from_table(&[
            "garbage".to_string(),
            "1.2.3.0/40=XX".to_string(),
            "81.2.69.0/24=GB".to_string(),
        ]);
        assert_eq!(resolver.country("81.2.69.1"), Some("GB".to_string()));
    }
}
