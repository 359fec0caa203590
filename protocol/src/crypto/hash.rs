//! # Hashing Utilities
//!
//! Two hash functions, two jobs:
//!
//! - **SHA-256**: transaction IDs (`double_sha256`) and ordinary address
//!   derivation. The txid is consensus-critical: the faucet proof-of-work
//!   gate is a constraint on its bytes, so builders and validators must
//!   hash exactly the same serialization with exactly this function.
//!
//! - **BLAKE3**: domain-separated derivation of contract addresses from
//!   their evalcode. Nothing on the consensus path compares these hashes
//!   except by equality, so the faster hash is fine here.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use ccpool_protocol::crypto::sha256;
///
/// let hash = sha256(b"ccpool");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// This is the transaction ID function. Its output bytes are exactly what
/// the faucet proof-of-work gate inspects (first and last byte).
///
/// # Example
///
/// ```
/// use ccpool_protocol::crypto::double_sha256;
///
/// let tx_id = double_sha256(b"raw transaction bytes");
/// assert_eq!(tx_id.len(), 32);
/// ```
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated hash using BLAKE3's `derive_key` mode.
///
/// `domain_separated_hash("pool", data)` and `domain_separated_hash("marker",
/// data)` never collide even for identical `data`, which is what keeps a
/// contract's pool address and its marker address distinct.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc")
        let expected =
            hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
                .unwrap();
        assert_eq!(sha256(b"abc").to_vec(), expected);
    }

    #[test]
    fn double_sha256_is_sha256_of_sha256() {
        let data = b"ccpool double hash";
        assert_eq!(double_sha256(data), sha256(&sha256(data)));
        assert_ne!(double_sha256(data), sha256(data));
    }

    #[test]
    fn double_sha256_known_vector() {
        // Double SHA-256 of the empty string.
        let expected =
            hex::decode("5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456")
                .unwrap();
        assert_eq!(double_sha256(b"").to_vec(), expected);
    }

    #[test]
    fn domain_separation_changes_output() {
        let a = domain_separated_hash("context-a", b"same");
        let b = domain_separated_hash("context-b", b"same");
        assert_ne!(a, b);
        assert_ne!(a, blake3_hash(b"same"));
    }

    #[test]
    fn blake3_is_deterministic() {
        assert_eq!(blake3_hash(b"x"), blake3_hash(b"x"));
    }
}
