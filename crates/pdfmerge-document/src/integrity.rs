// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content digests: SHA-256 over the raw bytes of an input file, printed on
// image pages when hash annotation is enabled.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 of `data` and return it as a lowercase hex string.
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn digest_of_empty_input() {
        assert_eq!(content_digest(b""), EMPTY_SHA256);
    }

    #[test]
    fn digest_known_value() {
        // SHA-256("hello"), checked with coreutils sha256sum.
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(content_digest(b"hello"), expected);
    }

    #[test]
    fn digest_is_64_lowercase_hex_chars() {
        let digest = content_digest(&[0xffu8; 1024]);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
