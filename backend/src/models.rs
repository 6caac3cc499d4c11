use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Body of `POST /api/v1/submissions`.
///
/// All fields are public values produced by the client-side commitment
/// generator; the raw reaction never appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub subject_id: String,

    /// Poseidon digest of the hashed reaction, compressed-Fr hex.
    pub digest_hex: String,

    /// Poseidon(scope, preimage), compressed-Fr hex.
    pub nullifier_hex: String,

    /// Scope string the proof was generated under. Must match the
    /// deployment scope or the submission is rejected.
    pub scope: String,

    /// Groth16 proof, compressed arkworks encoding, base64.
    pub proof_b64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub accepted: bool,

    /// Present only when accepted.
    pub submission_id: Option<Uuid>,
}

/// Body of `GET /api/v1/subjects/:id/stats`.
///
/// Raw counts only. Match rates and percentages are derived by the caller,
/// which must treat `total == 0` as "no data" rather than dividing.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub subject_id: String,
    pub total: u64,
    pub counts: HashMap<String, u64>,

    /// Stable chart color per digest, so charts don't reshuffle on reload.
    pub colors: HashMap<String, String>,

    pub canonical_digest_hex: String,
    pub canonical_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubjectListResponse {
    pub subject_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ZkVkResponse {
    pub curve: String,
    pub proof_system: String,
    pub vk_b64: String,
}
