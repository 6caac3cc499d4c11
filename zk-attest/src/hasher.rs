//! Deterministic text-to-field hashing.
//!
//! Reactions are free-text words typed by participants. Before anything
//! cryptographic happens they are normalized (trim + lowercase) so that
//! "Happy", " happy " and "HAPPY" commit to the same digest on every client.
//! The normalized string is then hashed with SHA-256 and the 32-byte output
//! is reduced into the BN254 scalar field, big-endian.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};

/// Normalize raw reaction text: trim surrounding whitespace and lowercase.
///
/// Total function. Empty or whitespace-only input normalizes to the empty
/// string, which still hashes deterministically.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Map a normalized reaction string to a field element.
///
/// SHA-256 over the UTF-8 bytes, interpreted as a big-endian integer and
/// reduced mod Fr's modulus. Callers must pass already-normalized text;
/// the hash itself does no normalization.
pub fn reaction_to_field(normalized: &str) -> Fr {
    let digest = Sha256::digest(normalized.as_bytes());
    Fr::from_be_bytes_mod_order(&digest)
}

/// Map a scope string to a field element, same construction as reactions.
///
/// The scope is a public deployment identifier; its field encoding is a
/// public input of the circuit and feeds the nullifier.
pub fn scope_to_field(scope: &str) -> Fr {
    let digest = Sha256::digest(scope.as_bytes());
    Fr::from_be_bytes_mod_order(&digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Happy "), "happy");
        assert_eq!(normalize("HAPPY"), "happy");
        assert_eq!(normalize("happy"), "happy");
    }

    #[test]
    fn normalize_is_total_on_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n"), "");
        // Empty input still hashes to a well-defined element.
        assert_eq!(reaction_to_field(""), reaction_to_field(""));
    }

    #[test]
    fn hashing_is_deterministic() {
        let a = reaction_to_field("happy");
        let b = reaction_to_field("happy");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_words_hash_to_distinct_elements() {
        assert_ne!(reaction_to_field("happy"), reaction_to_field("sad"));
    }

    #[test]
    fn normalized_variants_agree_after_normalization() {
        let canonical = reaction_to_field(&normalize("happy"));
        for raw in ["Happy", " happy", "HAPPY  ", "\thappy\n"] {
            assert_eq!(reaction_to_field(&normalize(raw)), canonical);
        }
    }

    #[test]
    fn scope_domain_is_the_same_construction_but_separate_input() {
        // Same bytes hash identically regardless of which helper is used;
        // separation comes from where the value is placed in the circuit.
        assert_eq!(scope_to_field("unveiled-emotions"), reaction_to_field("unveiled-emotions"));
        assert_ne!(scope_to_field("unveiled-emotions"), scope_to_field("other-scope"));
    }
}
