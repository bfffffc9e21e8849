//! Stable fingerprints for plan descriptions.

use blake3::Hasher;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// First 12 hex chars; enough to tell plans apart in logs.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(12);
        hex
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    let mut h = Hasher::new();
    h.update(bytes);
    Fingerprint(h.finalize().into())
}

/// Fingerprint any serde-serializable value deterministically (via JSON).
pub fn fingerprint_serde<T: Serialize>(v: &T) -> Result<Fingerprint> {
    let bytes = serde_json::to_vec(v)?;
    Ok(fingerprint_bytes(&bytes))
}
