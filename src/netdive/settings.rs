use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Serialize, Deserialize};

use crate::netdive::NetdiveError;

/// Default location of the API credentials file
pub const API_KEYS_PATH: &str = "./settings/api_keys.txt";

/// Parse `key: value` lines into a map.
///
/// Lines split at the first `": "`; trailing line endings are stripped from the
/// value and blank lines are skipped.
pub fn parse_settings(content: &str) -> Result<BTreeMap<String, String>, NetdiveError> {
    let mut settings = BTreeMap::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line.split_once(": ").ok_or_else(|| NetdiveError::MalformedSetting {
            line: i + 1,
            content: line.to_string(),
        })?;
        settings.insert(key.to_string(), value.to_string());
    }
    Ok(settings)
}

/// Read a settings file from disk
pub fn populate_settings<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, String>, NetdiveError> {
    parse_settings(&fs::read_to_string(path)?)
}

/// Fetch a required key
pub fn require(settings: &BTreeMap<String, String>, key: &str) -> Result<String, NetdiveError> {
    settings
        .get(key)
        .cloned()
        .ok_or_else(|| NetdiveError::MissingSetting(key.to_string()))
}

/// Credentials for the third-party lookup services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Sent as the `api-key` parameter
    pub ipdata: String,
    /// Sent as the `apikey` parameter
    pub virustotal: String,
    /// Sent as the `api-key` parameter
    pub wdsi: String,
}

/// Load the `ipdata`, `VirusTotal` and `WDSI` keys from a settings file
pub fn load_api_keys<P: AsRef<Path>>(path: P) -> Result<ApiKeys, NetdiveError> {
    let settings = populate_settings(path)?;

    let ipdata = require(&settings, "ipdata")?;
    info!("IPData API key successfully loaded");
    let virustotal = require(&settings, "VirusTotal")?;
    info!("VirusTotal API key successfully loaded");
    let wdsi = require(&settings, "WDSI")?;
    info!("WDSI API key successfully loaded");

    Ok(ApiKeys { ipdata, virustotal, wdsi })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_settings_strips_newlines() {
        let settings = parse_settings("ipdata: abc123\nVirusTotal: vt-key\r\nWDSI: w: with colon\n\n").unwrap();
        assert_eq!(settings.len(), 3);
        assert_eq!(settings["ipdata"], "abc123");
        assert_eq!(settings["VirusTotal"], "vt-key");
        assert_eq!(settings["WDSI"], "w: with colon");
    }

    #[test]
    fn test_malformed_line() {
        match parse_settings("ipdata: ok\nbroken line\n") {
            Err(NetdiveError::MalformedSetting { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "broken line");
            }
            other => panic!("expected MalformedSetting, got {:?}", other),
        }
    }

    #[test]
    fn test_load_api_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "ipdata: one\nVirusTotal: two\nWDSI: three\n").unwrap();

        let keys = load_api_keys(file.path()).unwrap();
        assert_eq!(keys, ApiKeys {
            ipdata: "one".to_string(),
            virustotal: "two".to_string(),
            wdsi: "three".to_string(),
        });
    }

    #[test]
    fn test_missing_api_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "ipdata: one\nWDSI: three\n").unwrap();

        match load_api_keys(file.path()) {
            Err(NetdiveError::MissingSetting(key)) => assert_eq!(key, "VirusTotal"),
            other => panic!("expected MissingSetting, got {:?}", other),
        }
    }
}
