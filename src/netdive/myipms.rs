use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::debug;

use crate::netdive::settings::require;
use crate::netdive::NetdiveError;

/// Timestamp layout the myip.ms API signs, e.g. `2019-06-24_01:14:45`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Builds signed request URLs for the myip.ms host lookup API
#[derive(Debug, Clone, PartialEq)]
pub struct MyIpMsClient {
    pub api_id: String,
    pub api_key: String,
    pub api_url: String,
}

impl MyIpMsClient {
    pub fn new(api_id: impl Into<String>, api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            api_key: api_key.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Read `myipms_api_id`, `myipms_api_key` and `myipms_api_url` from settings
    pub fn from_settings(settings: &BTreeMap<String, String>) -> Result<Self, NetdiveError> {
        Ok(Self::new(
            require(settings, "myipms_api_id")?,
            require(settings, "myipms_api_key")?,
            require(settings, "myipms_api_url")?,
        ))
    }

    /// GMT timestamp in the signed format
    pub fn timestamp(at: DateTime<Utc>) -> String {
        at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Hex MD5 over the request path with credentials and timestamp
    pub fn signature(&self, query: &str, timestamp: &str) -> String {
        let signed = format!(
            "{}/{}/api_id/{}/api_key/{}/timestamp/{}",
            self.api_url, query, self.api_id, self.api_key, timestamp
        );
        format!("{:x}", md5::compute(signed.as_bytes()))
    }

    /// Full lookup URL for an IP address or site name.
    ///
    /// `as_array` appends `/asarray/yes` for array-shaped JSON output.
    pub fn request_url(&self, query: &str, timestamp: &str, as_array: bool) -> String {
        let mut url = format!(
            "{}/{}/api_id/{}/api_key/{}/signature/{}/timestamp/{}",
            self.api_url,
            query,
            self.api_id,
            self.api_key,
            self.signature(query, timestamp),
            timestamp
        );
        if as_array {
            url.push_str("/asarray/yes");
        }
        debug!("Built myip.ms request for {}", query);
        url
    }

    /// Request URL stamped with the current time
    pub fn request_url_now(&self, query: &str, as_array: bool) -> String {
        self.request_url(query, &Self::timestamp(Utc::now()), as_array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client() -> MyIpMsClient {
        MyIpMsClient::new("id123", "key456", "https://api.myip.ms/")
    }

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2019, 6, 24, 1, 14, 45).unwrap();
        assert_eq!(MyIpMsClient::timestamp(at), "2019-06-24_01:14:45");
    }

    #[test]
    fn test_signature_is_md5_of_path() {
        let c = client();
        let expected = format!(
            "{:x}",
            md5::compute("https://api.myip.ms/yahoo.com/api_id/id123/api_key/key456/timestamp/2019-06-24_01:14:45")
        );
        let sig = c.signature("yahoo.com", "2019-06-24_01:14:45");
        assert_eq!(sig, expected);
        assert_eq!(sig.len(), 32);
    }

    #[test]
    fn test_request_url() {
        let c = client();
        let ts = "2019-06-24_01:14:45";
        let sig = c.signature("12.12.12.100", ts);

        let url = c.request_url("12.12.12.100", ts, false);
        assert_eq!(url, format!(
            "https://api.myip.ms/12.12.12.100/api_id/id123/api_key/key456/signature/{}/timestamp/{}",
            sig, ts
        ));
        assert!(c.request_url("12.12.12.100", ts, true).ends_with("/timestamp/2019-06-24_01:14:45/asarray/yes"));
    }

    #[test]
    fn test_from_settings() {
        let mut settings = BTreeMap::new();
        settings.insert("myipms_api_id".to_string(), "a".to_string());
        settings.insert("myipms_api_key".to_string(), "b".to_string());
        assert!(matches!(
            MyIpMsClient::from_settings(&settings),
            Err(NetdiveError::MissingSetting(key)) if key == "myipms_api_url"
        ));

        settings.insert("myipms_api_url".to_string(), "https://api.myip.ms".to_string());
        let c = MyIpMsClient::from_settings(&settings).unwrap();
        assert_eq!(c.api_url, "https://api.myip.ms");
    }
}
