//! Cache key schema
//!
//! Two key families back the resolution pipeline: the URL of the current
//! image and the encoded bytes for a specific URL. The binary key is always
//! derived from the URL that was just resolved, so stale entries in the two
//! families can never combine into inconsistent output.

/// TTL applied to every cache write, in seconds
pub const TTL_SECONDS: u64 = 600;

/// Key holding the currently resolved image URL
pub const LATEST_IMAGE: &str = "latestImage";

/// Key holding the encoded image bytes for a given source URL
pub fn binary_key(url: &str) -> String {
    format!("latestImage:bin:{url}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_key_embeds_url() {
        assert_eq!(
            binary_key("https://img.example/1.jpg"),
            "latestImage:bin:https://img.example/1.jpg"
        );
    }
}
