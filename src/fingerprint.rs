//! Deterministic content fingerprints for reference data.
//!
//! Fork trees, position graphs and pattern libraries are built once at
//! startup and shared by every walker. A fingerprint identifies the exact
//! reference data a report was computed against, so two processes can tell
//! whether their graphs agree without comparing them field by field.
//!
//! Hashing is SHA-256 with domain separation and length prefixing over a
//! canonical byte encoding; collection order is fixed before hashing.
//!
//! # Citations
//! - SHA-256: NIST FIPS 180-4 (2015)
//! - Domain separation & length prefixing: Bernstein et al., "How to hash into elliptic curves" (2009)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Domain for fork-tree fingerprints (v1).
pub const DOMAIN_FORK_TREE_V1: &[u8] = b"FORK_TREE_V1";

/// Domain for position-graph fingerprints (v1).
pub const DOMAIN_POSITION_GRAPH_V1: &[u8] = b"POSITION_GRAPH_V1";

/// Domain for pattern-library fingerprints (v1).
pub const DOMAIN_PATTERN_LIBRARY_V1: &[u8] = b"PATTERN_LIBRARY_V1";

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// Creates a zero hash (all zeros).
    #[inline]
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes SHA-256 of `data` with domain separation.
    ///
    /// Input layout: `b"IDG:" || domain || b":v1" || len(data) as u64 LE || data`.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"IDG:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Lowercase hex encoding of the full hash.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 4 bytes are enough to tell fingerprints apart in logs.
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Types with a canonical, order-independent byte encoding.
pub trait Canonicalizable {
    /// Serialize to canonical byte representation.
    fn to_canonical_bytes(&self) -> Vec<u8>;

    /// Compute the domain-separated hash of the canonical bytes.
    fn fingerprint_in(&self, domain: &[u8]) -> HashValue {
        HashValue::hash_with_domain(domain, &self.to_canonical_bytes())
    }
}

/// Appends a length-prefixed string to a canonical byte buffer.
pub(crate) fn push_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u64).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Appends an `f64` in a bit-exact form.
pub(crate) fn push_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_bits().to_le_bytes());
}
