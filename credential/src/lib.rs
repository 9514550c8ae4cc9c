//! SHA-256 hashing and verification of administrator passwords.
//!
//! Elections persist only the digest of the administrator password. Both
//! functions are stateless and deterministic; verification recomputes the
//! digest and compares, so a plaintext is never stored or logged.

use pollbox_types::CredentialDigest;
use sha2::{Digest, Sha256};

/// Compute the credential digest of a password.
pub fn hash_password(password: &str) -> CredentialDigest {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    CredentialDigest::new(output)
}

/// Check a password attempt against a stored digest.
pub fn verify_password(password: &str, digest: &CredentialDigest) -> bool {
    hash_password(password) == *digest
}
