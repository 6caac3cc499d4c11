//! Groth16 prover/verifier orchestration for the attestation circuit.
//!
//! SECURITY NOTE (prototype): Groth16 requires a trusted setup that produces a proving key (PK)
//! and verifying key (VK). This prototype generates keys locally. In production, an MPC ceremony
//! (or a transparent system) should be used.

use crate::circuit::AttestationCircuit;
use crate::constants::poseidon_config;
use ark_bn254::{Bn254, Fr};
use ark_crypto_primitives::sponge::poseidon::PoseidonSponge;
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_groth16::{Groth16, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZkError {
    #[error("proving failed: {0}")]
    Proving(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("arkworks error: {0}")]
    Ark(String),
}

/// Compute the public digest for a preimage: Poseidon(preimage).
///
/// This MUST match the circuit's digest constraint. Independent of scope.
pub fn compute_digest(preimage: Fr) -> Fr {
    let cfg = poseidon_config();
    let mut sponge = PoseidonSponge::<Fr>::new(&cfg);
    sponge.absorb(&[preimage].as_slice());
    sponge.squeeze_field_elements(1)[0]
}

/// Compute the public nullifier: Poseidon(scope, preimage).
///
/// This MUST match the circuit's nullifier constraint. The same preimage under
/// a different scope yields an unrelated nullifier.
pub fn compute_nullifier(preimage: Fr, scope: Fr) -> Fr {
    let cfg = poseidon_config();
    let mut sponge = PoseidonSponge::<Fr>::new(&cfg);
    sponge.absorb(&[scope, preimage].as_slice());
    sponge.squeeze_field_elements(1)[0]
}

/// Assemble the public-input vector expected by Groth16.
///
/// ORDERING MUST MATCH the circuit's `new_input` allocation order.
pub fn attestation_public_inputs(digest: Fr, nullifier: Fr, scope: Fr) -> Vec<Fr> {
    vec![digest, nullifier, scope]
}

/// Generate a Groth16 keypair for the attestation circuit.
///
/// The constraint system does not depend on witness values, so a zero witness
/// is enough to lay out the circuit. Run once per deployment.
pub fn setup_keys(rng: &mut impl RngCore) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), ZkError> {
    let preimage = Fr::from(0u64);
    let scope = Fr::from(0u64);

    let circuit = AttestationCircuit {
        preimage,
        public_digest: compute_digest(preimage),
        public_nullifier: compute_nullifier(preimage, scope),
        public_scope: scope,
    };

    let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(circuit, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    let vk = pk.vk.clone();
    Ok((pk, vk))
}

/// Prove knowledge of `preimage` behind its digest, bound to `scope`.
///
/// Returns the proof together with the public (digest, nullifier) pair the
/// caller must transmit alongside it. On failure nothing is returned; there is
/// no partial artifact.
pub fn prove_attestation(
    rng: &mut impl RngCore,
    pk: &ProvingKey<Bn254>,
    preimage: Fr,
    scope: Fr,
) -> Result<(Proof<Bn254>, Fr, Fr), ZkError> {
    let digest = compute_digest(preimage);
    let nullifier = compute_nullifier(preimage, scope);

    let circuit = AttestationCircuit {
        preimage,
        public_digest: digest,
        public_nullifier: nullifier,
        public_scope: scope,
    };

    let proof = Groth16::<Bn254>::create_random_proof_with_reduction(circuit, pk, rng)
        .map_err(|e| ZkError::Proving(format!("{e}")))?;

    Ok((proof, digest, nullifier))
}

/// Verify an attestation proof against public (digest, nullifier, scope).
///
/// A well-formed but cryptographically invalid proof yields `Ok(false)`, never
/// an error; callers branch on the boolean. Errors are reserved for structural
/// problems inside the pairing check itself.
pub fn verify_attestation(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    digest: Fr,
    nullifier: Fr,
    scope: Fr,
) -> Result<bool, ZkError> {
    let public_inputs = attestation_public_inputs(digest, nullifier, scope);
    Groth16::<Bn254>::verify_proof(&ark_groth16::prepare_verifying_key(vk), proof, &public_inputs)
        .map_err(|e| ZkError::Ark(format!("{e}")))
}

/// Serialize a proving key to bytes.
pub fn serialize_pk(pk: &ProvingKey<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    pk.serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, ZkError> {
    ProvingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_vk(vk: &VerifyingKey<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    vk.serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, ZkError> {
    VerifyingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    proof
        .serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ZkError> {
    Proof::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}
