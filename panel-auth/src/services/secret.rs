//! Opaque one-time secrets and their stored fingerprints.
//!
//! Every refresh, invitation and reset token is built on these two functions:
//! the raw value goes to the client once, only the fingerprint is persisted.

use rand::{rngs::OsRng, RngCore};
use secrecy::Secret;
use sha2::{Digest, Sha256};

use super::error::ServiceError;

/// Entropy of refresh, invitation and reset secrets.
pub const SECRET_BYTES: usize = 32;

/// Raw secret as handed to the client. Redacted in `Debug` output.
pub type RawSecret = Secret<String>;

/// Generate `n` random bytes from the OS CSPRNG, hex encoded.
pub fn generate_secret(n: usize) -> Result<RawSecret, ServiceError> {
    let mut bytes = vec![0u8; n];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "OS entropy source failed");
        ServiceError::Internal(anyhow::anyhow!("Failed to generate secret: {}", e))
    })?;
    Ok(Secret::new(hex::encode(bytes)))
}

/// SHA-256 of the raw secret, lowercase hex.
pub fn fingerprint(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
