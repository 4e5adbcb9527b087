//! NetDive IP-intelligence helpers
//!
//! Loaders for the credential settings file and the target lists, the table
//! reshaping used to present lookup results, and request signing for the
//! myip.ms API. Nothing here performs network I/O.

use std::fmt::{self, Display};
use std::error::Error;

pub mod keys;
pub mod myipms;
pub mod settings;
pub mod table;
pub mod targets;

pub use keys::get_dummy_api_key;
pub use myipms::MyIpMsClient;
pub use settings::{load_api_keys, populate_settings, ApiKeys};
pub use table::{combine_rows, decode_bytes, expand_column, Table};
pub use targets::{load_hostname_list, load_ip_list, split_list, HostRecord, Target, DEFAULT_PORT};

/// Error type for NetDive operations
#[derive(Debug)]
pub enum NetdiveError {
    /// File error
    Io(std::io::Error),
    /// Malformed CSV input or failed CSV output
    Csv(csv::Error),
    /// JSON input that is not an array of objects
    Json(String),
    /// A settings line without a `key: value` separator
    MalformedSetting { line: usize, content: String },
    /// A required settings key is absent
    MissingSetting(String),
    /// A port that is not a number in 0-65535
    InvalidPort { entry: String, port: String },
    /// A referenced table column does not exist
    UnknownColumn(String),
    /// Bytes that are not valid UTF-8
    InvalidUtf8(String),
}

impl Display for NetdiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetdiveError::Io(e) => write!(f, "IO error: {}", e),
            NetdiveError::Csv(e) => write!(f, "CSV error: {}", e),
            NetdiveError::Json(msg) => write!(f, "JSON error: {}", msg),
            NetdiveError::MalformedSetting { line, content } => {
                write!(f, "Line {} is not 'key: value': {:?}", line, content)
            }
            NetdiveError::MissingSetting(key) => write!(f, "Missing setting: {}", key),
            NetdiveError::InvalidPort { entry, port } => {
                write!(f, "Invalid port '{}' in entry '{}'", port, entry)
            }
            NetdiveError::UnknownColumn(column) => write!(f, "Unknown column: {}", column),
            NetdiveError::InvalidUtf8(msg) => write!(f, "Invalid UTF-8: {}", msg),
        }
    }
}

impl Error for NetdiveError {}

impl From<std::io::Error> for NetdiveError {
    fn from(e: std::io::Error) -> Self {
        NetdiveError::Io(e)
    }
}

impl From<csv::Error> for NetdiveError {
    fn from(e: csv::Error) -> Self {
        NetdiveError::Csv(e)
    }
}

impl From<serde_json::Error> for NetdiveError {
    fn from(e: serde_json::Error) -> Self {
        NetdiveError::Json(e.to_string())
    }
}
