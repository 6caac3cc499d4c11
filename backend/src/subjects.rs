//! Static subject configuration.
//!
//! Each subject (an artwork in the gallery deployment) carries a canonical
//! digest: the artist's own reaction, hashed out-of-band with `attest digest`
//! at provisioning time. The server only ever sees the digest, never the word.
//! Loaded once at startup and immutable for the process lifetime.

use crate::errors::ApiError;
use std::collections::HashMap;
use std::path::Path;
use zk_attest::types::FrHex;

#[derive(Debug, Clone)]
pub struct SubjectConfig {
    canonical: HashMap<String, String>,
}

impl SubjectConfig {
    /// Load `subject_id -> canonical_digest_hex` from a JSON file.
    ///
    /// Every digest must decode as a field element; a bad entry fails startup
    /// rather than surfacing later as a digest that can never match.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ApiError::BadRequest(format!("cannot read subjects file: {e}")))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        let canonical: HashMap<String, String> = serde_json::from_str(raw)
            .map_err(|e| ApiError::BadRequest(format!("invalid subjects file: {e}")))?;

        for (subject_id, digest_hex) in &canonical {
            FrHex(digest_hex.clone()).to_fr().map_err(|e| {
                ApiError::BadRequest(format!("subject {subject_id}: bad canonical digest: {e}"))
            })?;
        }

        Ok(Self { canonical })
    }

    pub fn canonical_digest(&self, subject_id: &str) -> Option<&str> {
        self.canonical.get(subject_id).map(String::as_str)
    }

    pub fn contains(&self, subject_id: &str) -> bool {
        self.canonical.contains_key(subject_id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.canonical.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    fn digest_hex(word: &str) -> String {
        let preimage = zk_attest::hasher::reaction_to_field(word);
        FrHex::from_fr(&zk_attest::groth16::compute_digest(preimage)).0
    }

    #[test]
    fn loads_and_indexes_subjects() {
        let json = format!(r#"{{"1": "{}", "2": "{}"}}"#, digest_hex("happy"), digest_hex("calm"));
        let cfg = SubjectConfig::from_json(&json).unwrap();

        assert!(cfg.contains("1"));
        assert!(!cfg.contains("7"));
        assert_eq!(cfg.ids(), vec!["1".to_string(), "2".to_string()]);
        assert_eq!(cfg.canonical_digest("1"), Some(digest_hex("happy").as_str()));
    }

    #[test]
    fn rejects_undecodable_canonical_digest() {
        assert!(SubjectConfig::from_json(r#"{"1": "not-hex"}"#).is_err());
    }

    #[test]
    fn bundled_subjects_file_is_valid() {
        let cfg = SubjectConfig::from_json(include_str!("../subjects.json")).unwrap();
        assert_eq!(cfg.ids().len(), 6);
        for id in cfg.ids() {
            let hex = cfg.canonical_digest(&id).unwrap();
            let _: Fr = FrHex(hex.to_string()).to_fr().unwrap();
        }
    }
}
