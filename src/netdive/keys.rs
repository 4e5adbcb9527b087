use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

/// Longest placeholder key handed out
pub const DUMMY_KEY_LEN: usize = 63;

/// Random lowercase alphanumeric placeholder for an API key.
///
/// Built from four base64-encoded v4 UUIDs with the padding and symbols removed.
pub fn get_dummy_api_key() -> String {
    let mut key: String = (0..4)
        .map(|_| STANDARD.encode(Uuid::new_v4().as_bytes()).to_lowercase())
        .collect::<String>()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    key.truncate(DUMMY_KEY_LEN);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_key_shape() {
        let key = get_dummy_api_key();
        // 4 x 22 encoded chars, minus at most a few '+' and '/'
        assert!(key.len() <= DUMMY_KEY_LEN);
        assert!(key.len() > 40);
        assert!(key.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_dummy_keys_differ() {
        assert_ne!(get_dummy_api_key(), get_dummy_api_key());
    }
}
