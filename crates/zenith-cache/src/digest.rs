//! # SHA-256 Digests
//!
//! Hex-encoded SHA-256 used to address build artifacts and fingerprint
//! build inputs.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`. Always 64 characters.
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// True when `s` has the shape of a [`sha256_hex`] output.
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn shape_check() {
        assert!(is_sha256_hex(&sha256_hex(b"")));
        assert!(!is_sha256_hex("readme"));
        assert!(!is_sha256_hex(&"A".repeat(64)));
    }
}
