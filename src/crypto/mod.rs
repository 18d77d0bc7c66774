//! Hashing primitives.
//!
//! - BLAKE3 for addresses, transaction IDs and storage leaf hashes
//! - SHA-256 Merkle trees (`rs_merkle`) for state roots

mod hash;

pub use hash::{hash_data, merkle_root, Hash};
