//! R1CS circuit for the attestation statement.
//!
//! What this circuit proves (for one submission):
//! 1) The prover knows a private preimage `m` (the hashed reaction text).
//! 2) The public digest equals Poseidon(m).
//! 3) The public nullifier equals Poseidon(scope, m), binding the proof to the
//!    public scope so a proof made for one deployment cannot be replayed in another.
//!
//! Privacy: the preimage is a witness (never public). Only digest, nullifier and
//! scope are public.

use crate::constants::poseidon_config;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Circuit proving preimage knowledge behind a (digest, nullifier, scope) triple.
#[derive(Clone, Debug)]
pub struct AttestationCircuit {
    /// Private preimage: the field encoding of the normalized reaction.
    pub preimage: Fr,

    /// Public digest: Poseidon(preimage).
    pub public_digest: Fr,

    /// Public nullifier: Poseidon(scope, preimage).
    pub public_nullifier: Fr,

    /// Public scope: field encoding of the deployment scope string.
    pub public_scope: Fr,
}

impl ConstraintSynthesizer<Fr> for AttestationCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // --- Public inputs ---
        // IMPORTANT: allocation order MUST match `groth16::attestation_public_inputs`.
        // We use: digest, nullifier, scope.
        let public_digest = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.public_digest))?;
        let public_nullifier = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.public_nullifier))?;
        let public_scope = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.public_scope))?;

        // --- Witness ---
        let preimage = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.preimage))?;

        let poseidon_cfg = poseidon_config();

        // digest = Poseidon(preimage)
        let mut digest_sponge = PoseidonSpongeVar::<Fr>::new(cs.clone(), &poseidon_cfg);
        digest_sponge.absorb(&[preimage.clone()].as_slice())?;
        let digest = digest_sponge.squeeze_field_elements(1)?[0].clone();
        digest.enforce_equal(&public_digest)?;

        // nullifier = Poseidon(scope, preimage)
        //
        // The scope var is re-absorbed rather than a constant so the verifier's
        // public scope is what the nullifier binds to.
        let mut nullifier_sponge = PoseidonSpongeVar::<Fr>::new(cs, &poseidon_cfg);
        nullifier_sponge.absorb(&[public_scope, preimage].as_slice())?;
        let nullifier = nullifier_sponge.squeeze_field_elements(1)?[0].clone();
        nullifier.enforce_equal(&public_nullifier)?;

        Ok(())
    }
}
