//! Cryptographic primitives for the Mooring node.
//!
//! Ed25519 key generation, message signing and verification, Blake2b
//! hashing, and the anchor root combinator binding pre-commits to commits.

pub mod anchor;
pub mod hash;
pub mod keys;
pub mod sign;

pub use anchor::combine_roots;
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
