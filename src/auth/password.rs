// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password digests.
//!
//! Stored credentials are `base64(SHA-256(password))`. The digest is
//! deterministic so credentials can be looked up by `(username, digest)`.

use base64ct::{Base64, Encoding};
use sha2::{Digest, Sha256};

/// Digest a clear-text password for storage or lookup.
pub fn password_digest(password: &str) -> String {
    Base64::encode_string(&Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_base64_sha256() {
        // echo -n "bar" | sha256sum | xxd -r -p | base64
        assert_eq!(
            password_digest("bar"),
            "/N4rLtula/QIYB+3If6bXDONEO5CnqBPrlURto+/j7k="
        );
    }

    #[test]
    fn digest_never_equals_input() {
        let digest = password_digest("hunter2");
        assert_ne!(digest, "hunter2");
        assert_eq!(digest, password_digest("hunter2"));
        assert_ne!(digest, password_digest("hunter3"));
    }
}
