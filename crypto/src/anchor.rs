//! Anchor root combinator.
//!
//! A pre-commit stakes a claim on an anchor slot with a `signing_root` that
//! does not reveal the final document root. The later commit proves
//! authorship by revealing `proof` such that
//! `blake2b_256(signing_root || proof)` reconstructs the committed root.
//! The chain performs this check when a pre-commit exists for the slot.

use crate::hash::blake2b_256_multi;
use mooring_types::DocumentRoot;

/// Combine a signing root with a commit proof into the document root the
/// chain expects.
pub fn combine_roots(signing_root: &DocumentRoot, proof: &[u8; 32]) -> DocumentRoot {
    DocumentRoot::new(blake2b_256_multi(&[signing_root.as_bytes(), proof]))
}
