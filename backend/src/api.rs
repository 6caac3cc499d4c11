use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::state::AppState;
use crate::stats::{palette_color, SubjectSummary};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;
use zk_attest::groth16::{deserialize_proof, verify_attestation};
use zk_attest::hasher::scope_to_field;
use zk_attest::types::FrHex;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/subjects", get(list_subjects))
        .route("/api/v1/subjects/:id/stats", get(subject_stats))
        .route("/api/v1/submissions", post(submit))
        .route("/api/v1/zk/vk", get(get_vk))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Accept one attestation: verify the proof against the deployment scope,
/// then append the digest. Cryptographic rejection is `accepted: false`
/// with HTTP 200; only structurally malformed input is an HTTP error.
async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmissionRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    if !state.subjects.contains(&req.subject_id) {
        return Err(ApiError::NotFound("unknown subject".to_string()));
    }

    // The verifier only ever checks against its own configured scope. A proof
    // generated under a different scope cannot bind to it, so a mismatched
    // scope string is a plain rejection, not an error.
    if req.scope != state.scope {
        tracing::warn!(subject_id = %req.subject_id, scope = %req.scope, "scope mismatch");
        return Ok(Json(SubmissionResponse { accepted: false, submission_id: None }));
    }

    // Structural decoding. Failures here are 400s, before any pairing check.
    let digest = FrHex(req.digest_hex.clone())
        .to_fr()
        .map_err(|e| ApiError::BadRequest(format!("invalid digest: {e}")))?;
    let nullifier = FrHex(req.nullifier_hex.clone())
        .to_fr()
        .map_err(|e| ApiError::BadRequest(format!("invalid nullifier: {e}")))?;

    let proof_bytes = base64::engine::general_purpose::STANDARD
        .decode(&req.proof_b64)
        .map_err(|_| ApiError::BadRequest("invalid proof_b64".to_string()))?;
    let proof =
        deserialize_proof(&proof_bytes).map_err(|_| ApiError::BadRequest("invalid proof".to_string()))?;

    let keys = state.ensure_keys().await?;
    let scope_fr = scope_to_field(&state.scope);

    // Pairing checks are CPU-bound; keep them off the async path.
    let vk = keys.vk.clone();
    let valid = tokio::task::spawn_blocking(move || {
        verify_attestation(vk.as_ref(), &proof, digest, nullifier, scope_fr)
    })
    .await
    .map_err(|_| ApiError::Internal)?
    .map_err(|e| ApiError::BadRequest(format!("unverifiable proof: {e}")))?;

    if !valid {
        tracing::info!(subject_id = %req.subject_id, "proof rejected");
        return Ok(Json(SubmissionResponse { accepted: false, submission_id: None }));
    }

    // Verification already succeeded; the store stays ignorant of cryptography.
    // Re-encode the digest so stored rows all carry the one canonical hex form
    // and aggregation's string equality coincides with field equality.
    let digest_hex = FrHex::from_fr(&digest).0;

    let submission_id = Uuid::new_v4();
    db::insert_submission(&state.db, submission_id, &req.subject_id, &digest_hex).await?;

    tracing::info!(subject_id = %req.subject_id, %submission_id, "submission accepted");

    Ok(Json(SubmissionResponse {
        accepted: true,
        submission_id: Some(submission_id),
    }))
}

/// Digest frequency counts for a subject. Raw counts only; the caller derives
/// percentages and must treat `total == 0` as "no data".
async fn subject_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    let Some(canonical_digest_hex) = state.subjects.canonical_digest(&id).map(str::to_string) else {
        return Err(ApiError::NotFound("unknown subject".to_string()));
    };

    let rows = db::count_by_digest(&state.db, &id).await?;
    let summary = SubjectSummary::from_rows(rows);

    let colors = summary
        .counts()
        .keys()
        .map(|digest_hex| (digest_hex.clone(), palette_color(digest_hex).to_string()))
        .collect();

    Ok(Json(StatsResponse {
        subject_id: id,
        total: summary.total(),
        canonical_count: summary.canonical_count(&canonical_digest_hex),
        counts: summary.counts().clone(),
        colors,
        canonical_digest_hex,
    }))
}

async fn list_subjects(State(state): State<AppState>) -> Json<SubjectListResponse> {
    Json(SubjectListResponse {
        subject_ids: state.subjects.ids(),
    })
}

async fn get_vk(State(state): State<AppState>) -> Result<Json<ZkVkResponse>, ApiError> {
    let keys = state.ensure_keys().await?;
    let vk_bytes = zk_attest::groth16::serialize_vk(keys.vk.as_ref()).map_err(|_| ApiError::Internal)?;

    let b64 = base64::engine::general_purpose::STANDARD.encode(vk_bytes);

    Ok(Json(ZkVkResponse {
        curve: "bn254".to_string(),
        proof_system: "groth16".to_string(),
        vk_b64: b64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subjects::SubjectConfig;
    use zk_attest::groth16::{compute_digest, prove_attestation, serialize_proof};
    use zk_attest::hasher::{normalize, reaction_to_field};

    const TEST_SCOPE: &str = "unveiled-emotions";

    fn digest_hex(word: &str) -> String {
        FrHex::from_fr(&compute_digest(reaction_to_field(word))).0
    }

    async fn test_state() -> AppState {
        // One connection: a pooled in-memory sqlite gets a fresh database
        // per connection otherwise.
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::init_schema(&db).await.unwrap();

        let subjects = SubjectConfig::from_json(&format!(
            r#"{{"1": "{}", "2": "{}"}}"#,
            digest_hex("happy"),
            digest_hex("calm"),
        ))
        .unwrap();

        // Per-test key directory so setups don't collide across tests.
        let data_dir = std::env::temp_dir()
            .join("attest-api-tests")
            .join(Uuid::new_v4().to_string());

        AppState::new(db, data_dir, TEST_SCOPE.to_string(), subjects)
    }

    fn make_request(state_scope: &str, subject_id: &str, word: &str, keys: &crate::state::ZkKeys) -> SubmissionRequest {
        let preimage = reaction_to_field(&normalize(word));
        let scope_fr = scope_to_field(state_scope);

        let mut rng = rand::rngs::OsRng;
        let (proof, digest, nullifier) =
            prove_attestation(&mut rng, keys.pk.as_ref(), preimage, scope_fr).unwrap();

        SubmissionRequest {
            subject_id: subject_id.to_string(),
            digest_hex: FrHex::from_fr(&digest).0,
            nullifier_hex: FrHex::from_fr(&nullifier).0,
            scope: state_scope.to_string(),
            proof_b64: base64::engine::general_purpose::STANDARD
                .encode(serialize_proof(&proof).unwrap()),
        }
    }

    #[tokio::test]
    async fn valid_submission_is_accepted_and_counted() {
        let state = test_state().await;
        let keys = state.ensure_keys().await.unwrap();

        let req = make_request(TEST_SCOPE, "1", "happy", &keys);
        let expected_digest = req.digest_hex.clone();

        let resp = submit(State(state.clone()), Json(req)).await.unwrap();
        assert!(resp.0.accepted);
        assert!(resp.0.submission_id.is_some());

        let stats = subject_stats(State(state), Path("1".to_string())).await.unwrap();
        assert_eq!(stats.0.total, 1);
        assert_eq!(stats.0.counts.get(&expected_digest), Some(&1));
        // "happy" is subject 1's canonical answer.
        assert_eq!(stats.0.canonical_count, 1);
    }

    #[tokio::test]
    async fn three_reactions_aggregate_with_expected_ratio() {
        let state = test_state().await;
        let keys = state.ensure_keys().await.unwrap();

        for word in ["calm", "Calm ", "tense"] {
            let req = make_request(TEST_SCOPE, "2", word, &keys);
            let resp = submit(State(state.clone()), Json(req)).await.unwrap();
            assert!(resp.0.accepted);
        }

        let stats = subject_stats(State(state), Path("2".to_string())).await.unwrap();
        assert_eq!(stats.0.total, 3);
        assert_eq!(stats.0.counts.get(&digest_hex("calm")), Some(&2));
        assert_eq!(stats.0.counts.get(&digest_hex("tense")), Some(&1));

        let summary = SubjectSummary::from_rows(
            stats.0.counts.into_iter().collect(),
        );
        assert_eq!(summary.share(&digest_hex("calm")), Some(2.0 / 3.0));
    }

    #[tokio::test]
    async fn stats_carry_a_stable_color_per_digest() {
        let state = test_state().await;
        let keys = state.ensure_keys().await.unwrap();

        for word in ["calm", "tense"] {
            let req = make_request(TEST_SCOPE, "2", word, &keys);
            assert!(submit(State(state.clone()), Json(req)).await.unwrap().0.accepted);
        }

        let stats = subject_stats(State(state.clone()), Path("2".to_string())).await.unwrap();

        // One color per counted digest, from the deterministic palette.
        assert_eq!(stats.0.colors.len(), stats.0.counts.len());
        for digest_hex in stats.0.counts.keys() {
            assert_eq!(stats.0.colors.get(digest_hex).unwrap(), palette_color(digest_hex));
        }

        // Stable across reloads.
        let again = subject_stats(State(state), Path("2".to_string())).await.unwrap();
        assert_eq!(again.0.colors, stats.0.colors);
    }

    #[tokio::test]
    async fn proof_under_foreign_scope_is_rejected_not_erred() {
        let state = test_state().await;
        let keys = state.ensure_keys().await.unwrap();

        // Proof generated for another deployment's scope, presented with the
        // matching scope string swapped in. Digest is unchanged.
        let mut req = make_request("other-deployment", "1", "happy", &keys);
        req.scope = TEST_SCOPE.to_string();

        let resp = submit(State(state.clone()), Json(req)).await.unwrap();
        assert!(!resp.0.accepted);

        // Nothing was persisted.
        let stats = subject_stats(State(state), Path("1".to_string())).await.unwrap();
        assert_eq!(stats.0.total, 0);
    }

    #[tokio::test]
    async fn mismatched_scope_string_is_rejected_without_verifying() {
        let state = test_state().await;
        let keys = state.ensure_keys().await.unwrap();

        let mut req = make_request(TEST_SCOPE, "1", "happy", &keys);
        req.scope = "somewhere-else".to_string();

        let resp = submit(State(state), Json(req)).await.unwrap();
        assert!(!resp.0.accepted);
    }

    #[tokio::test]
    async fn malformed_proof_blob_is_a_structural_error() {
        let state = test_state().await;
        let keys = state.ensure_keys().await.unwrap();

        let mut req = make_request(TEST_SCOPE, "1", "happy", &keys);
        req.proof_b64 = "AAAA".to_string();

        let err = submit(State(state), Json(req)).await.err().unwrap();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn unknown_subject_is_not_found() {
        let state = test_state().await;
        let keys = state.ensure_keys().await.unwrap();

        let req = make_request(TEST_SCOPE, "99", "happy", &keys);
        let err = submit(State(state.clone()), Json(req)).await.err().unwrap();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = subject_stats(State(state), Path("99".to_string())).await.err().unwrap();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_subject_reports_no_data() {
        let state = test_state().await;

        let stats = subject_stats(State(state), Path("1".to_string())).await.unwrap();
        assert_eq!(stats.0.total, 0);
        assert!(stats.0.counts.is_empty());
        assert_eq!(stats.0.canonical_count, 0);

        // Callers deriving a match rate must land on the explicit no-data state.
        let summary = SubjectSummary::from_rows(vec![]);
        assert_eq!(summary.share(&stats.0.canonical_digest_hex), None);
    }
}
