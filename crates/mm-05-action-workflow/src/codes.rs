//! # Activation Codes and Content Hashes
//!
//! One-time codes for the out-of-band confirmation channel, alternative
//! username suggestions, and the content hash binding off-chain blobs to
//! their signed references.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Alphabet for activation codes. Ambiguous glyphs (0/O, 1/I/L) excluded so
/// codes survive being read aloud.
const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

const CODE_GROUPS: usize = 4;
const CODE_GROUP_LEN: usize = 4;

/// Generate a one-time activation code, four groups of four characters,
/// e.g. `R2D4-QX9M-7KPH-WZ3N`.
pub fn generate_activation_code() -> String {
    let mut rng = rand::thread_rng();
    let mut groups = Vec::with_capacity(CODE_GROUPS);
    for _ in 0..CODE_GROUPS {
        let group: String = (0..CODE_GROUP_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        groups.push(group);
    }
    groups.join("-")
}

/// Suggest an alternative for a taken username.
pub fn alternative_username(username: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("{}_{}", username, suffix)
}

/// Content hash of an off-chain blob, lowercase hex SHA-256 with an `h1:`
/// prefix marking the algorithm.
pub fn content_hash(blob: &[u8]) -> String {
    let digest = Sha256::digest(blob);
    format!("h1:{}", hex::encode(digest))
}

/// Whether `claimed` is the content hash of `blob`.
pub fn content_hash_matches(blob: &[u8], claimed: &str) -> bool {
    content_hash(blob) == claimed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        let code = generate_activation_code();
        assert_eq!(code.len(), CODE_GROUPS * CODE_GROUP_LEN + CODE_GROUPS - 1);
        let groups: Vec<&str> = code.split('-').collect();
        assert_eq!(groups.len(), CODE_GROUPS);
        for group in groups {
            assert_eq!(group.len(), CODE_GROUP_LEN);
            assert!(group.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_codes_are_random() {
        assert_ne!(generate_activation_code(), generate_activation_code());
    }

    #[test]
    fn test_alternative_username_keeps_stem() {
        let alt = alternative_username("alice");
        assert!(alt.starts_with("alice_"));
        assert_ne!(alt, "alice");
    }

    #[test]
    fn test_content_hash_matches() {
        let blob = b"{\"title\":\"weather data\"}";
        let hash = content_hash(blob);
        assert!(hash.starts_with("h1:"));
        assert!(content_hash_matches(blob, &hash));
        assert!(!content_hash_matches(b"other", &hash));
    }
}
