use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use serde::{Serialize, Deserialize};

use crate::netdive::NetdiveError;

/// Port assumed when an address has none
pub const DEFAULT_PORT: u16 = 443;

/// Lookup target for an IP address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Resolved hostname; empty until a lookup fills it in
    pub host: String,
    pub port: u16,
}

/// Lookup results for a hostname, empty when freshly loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub details: BTreeMap<String, String>,
}

/// First field of every non-blank CSV row
fn first_fields<R: Read>(reader: R) -> Result<Vec<String>, NetdiveError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut fields = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        match record.get(0).map(str::trim) {
            Some(field) if !field.is_empty() => fields.push(field.to_string()),
            _ => continue,
        }
    }
    Ok(fields)
}

/// Split `ip:port`; anything else (including IPv6) is an address on the default port
fn parse_entry(entry: &str) -> Result<(String, u16), NetdiveError> {
    let parts: Vec<&str> = entry.split(':').collect();
    match parts.as_slice() {
        [ip, port] => {
            let port = port.trim().parse::<u16>().map_err(|_| NetdiveError::InvalidPort {
                entry: entry.to_string(),
                port: port.to_string(),
            })?;
            Ok((ip.to_string(), port))
        }
        _ => Ok((entry.to_string(), DEFAULT_PORT)),
    }
}

/// Parse an IP list from a reader. See `load_ip_list`.
pub fn read_ip_list<R: Read>(reader: R) -> Result<(Vec<String>, BTreeMap<String, Target>), NetdiveError> {
    let mut addresses = Vec::new();
    let mut targets = BTreeMap::new();

    for entry in first_fields(reader)? {
        let (ip, port) = parse_entry(&entry)?;
        addresses.push(ip.clone());
        targets.insert(ip, Target { host: String::new(), port });
    }

    debug!("Read {} IP targets", addresses.len());
    Ok((addresses, targets))
}

/// Load `ip[:port]` entries, one per line.
///
/// Returns the addresses in file order and a target per address.
pub fn load_ip_list<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, BTreeMap<String, Target>), NetdiveError> {
    read_ip_list(File::open(path)?)
}

/// Parse a hostname list from a reader. See `load_hostname_list`.
pub fn read_hostname_list<R: Read>(reader: R) -> Result<BTreeMap<String, HostRecord>, NetdiveError> {
    Ok(first_fields(reader)?
        .into_iter()
        .map(|host| (host, HostRecord::default()))
        .collect())
}

/// Load hostnames, one per line, each with an empty record
pub fn load_hostname_list<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, HostRecord>, NetdiveError> {
    read_hostname_list(File::open(path)?)
}

/// Key each item as `{key}1`, `{key}2`, ... in order
pub fn split_list<T: Clone>(items: &[T], key: &str) -> Vec<(String, T)> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (format!("{}{}", key, i + 1), item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_ip_list() {
        let data = "10.0.0.1:8080\n192.168.1.5\n\n::1\n";
        let (addresses, targets) = read_ip_list(data.as_bytes()).unwrap();

        assert_eq!(addresses, vec!["10.0.0.1", "192.168.1.5", "::1"]);
        assert_eq!(targets["10.0.0.1"], Target { host: String::new(), port: 8080 });
        assert_eq!(targets["192.168.1.5"].port, DEFAULT_PORT);
        assert_eq!(targets["::1"].port, DEFAULT_PORT);
    }

    #[test]
    fn test_invalid_port() {
        match read_ip_list("10.0.0.1:http\n".as_bytes()) {
            Err(NetdiveError::InvalidPort { entry, port }) => {
                assert_eq!(entry, "10.0.0.1:http");
                assert_eq!(port, "http");
            }
            other => panic!("expected InvalidPort, got {:?}", other),
        }
    }

    #[test]
    fn test_read_hostname_list_uses_first_column() {
        let data = "example.com,ignored\nwebstore.illinois.edu\nexample.com\n";
        let hosts = read_hostname_list(data.as_bytes()).unwrap();
        assert_eq!(hosts.len(), 2);
        assert!(hosts["example.com"].details.is_empty());
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let ips = dir.path().join("ips.txt");
        std::fs::write(&ips, "1.1.1.1:53\n").unwrap();

        let (addresses, _) = load_ip_list(&ips).unwrap();
        assert_eq!(addresses, vec!["1.1.1.1"]);
        assert!(load_hostname_list(dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn test_split_list() {
        let keyed = split_list(&["a", "b", "c"], "ip");
        assert_eq!(keyed, vec![
            ("ip1".to_string(), "a"),
            ("ip2".to_string(), "b"),
            ("ip3".to_string(), "c"),
        ]);
    }
}
