use regex::Regex;

// Two or more word characters, matching the usual bag-of-words token pattern
lazy_static::lazy_static! {
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").expect("token pattern is valid");
}

/// Lowercase `text` and split it into word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_drops_short_tokens() {
        let tokens = tokenize("Go until jurong point, crazy.. Available only in A bugis");
        assert_eq!(
            tokens,
            vec!["go", "until", "jurong", "point", "crazy", "available", "only", "in", "bugis"]
        );
    }

    #[test]
    fn test_tokenize_keeps_digits_and_unicode() {
        let tokens = tokenize("WINNER!! Call 09061701461 für £900");
        assert_eq!(tokens, vec!["winner", "call", "09061701461", "für", "900"]);
    }
}
