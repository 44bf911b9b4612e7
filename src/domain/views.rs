//! Deduplication keys for post view tracking.
//!
//! Client addresses never appear in keys: only the first eight bytes of a
//! salted SHA-256 digest, hex encoded.

use std::time::Duration;

use sha2::{Digest, Sha256};

pub const VIEW_KEY_PREFIX: &str = "post:view:";
pub const VIEW_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const CLIENT_HASH_BYTES: usize = 8;

/// Key marking that `client_addr` viewed `post_id` within the current window.
pub fn view_key(post_id: i64, client_addr: &str, salt: &str) -> String {
    format!(
        "{VIEW_KEY_PREFIX}{post_id}:{}",
        client_fingerprint(client_addr, salt)
    )
}

/// Fixed-length, non-reversible stand-in for a client address.
pub fn client_fingerprint(client_addr: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(client_addr.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..CLIENT_HASH_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_embeds_post_id_and_hashed_address() {
        let key = view_key(42, "203.0.113.7", "");
        let fingerprint = key
            .strip_prefix("post:view:42:")
            .expect("key carries the post id");

        assert_eq!(fingerprint.len(), CLIENT_HASH_BYTES * 2);
        assert!(fingerprint.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert!(!key.contains("203.0.113.7"));
    }

    #[test]
    fn unsalted_fingerprint_matches_plain_sha256_prefix() {
        // sha256("127.0.0.1") starts with 12ca17b49af22894
        assert_eq!(client_fingerprint("127.0.0.1", ""), "12ca17b49af22894");
    }

    #[test]
    fn salt_and_address_change_the_key() {
        let base = view_key(1, "198.51.100.1", "");
        assert_ne!(base, view_key(1, "198.51.100.1", "pepper"));
        assert_ne!(base, view_key(1, "198.51.100.2", ""));
        assert_ne!(base, view_key(2, "198.51.100.1", ""));
        assert_eq!(base, view_key(1, "198.51.100.1", ""));
    }
}
