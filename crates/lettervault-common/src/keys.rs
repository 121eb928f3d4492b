//! Business-key digests for the vault layer
//!
//! Hubs and links are joined purely by digest, never by the original key, so
//! the digest must be a stable pure function of the key's canonical string
//! form across runs and processes. MD5 is kept for compatibility with the
//! digests already loaded historically; it is a content key here, not a
//! security boundary.

use md5::{Digest, Md5};
use std::fmt::Display;

/// Hash a business key into a 32-character lowercase hex digest.
///
/// The key is rendered to its canonical string form first (decimal for
/// integer keys, no padding or sign normalization).
pub fn hash_business_key<K: Display>(key: K) -> String {
    let mut hasher = Md5::new();
    hasher.update(key.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(hash_business_key(1), "c4ca4238a0b923820dcc509a6f75849b");
        assert_eq!(hash_business_key(10), "d3d9446802a44259755d38e6d163e820");
        assert_eq!(hash_business_key(""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(hash_business_key(42), hash_business_key(42));
        assert_eq!(hash_business_key("42"), hash_business_key(42));
    }

    #[test]
    fn test_digest_shape() {
        let digest = hash_business_key(i64::MAX);
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
