//! Types shared between the circuit and the host-side prover/verifier.

use ark_bn254::Fr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON-friendly representation of a field element.
///
/// Fr values travel as hex strings of arkworks' canonical compressed encoding,
/// so every component (client, server, stored rows) agrees byte-for-byte and
/// hex-string equality coincides with field equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrHex(pub String);

impl FrHex {
    pub fn from_fr(x: &Fr) -> Self {
        let mut bytes = Vec::new();
        x.serialize_compressed(&mut bytes)
            .expect("in-memory serialization");
        Self(hex::encode(bytes))
    }

    pub fn to_fr(&self) -> Result<Fr, String> {
        let bytes = hex::decode(&self.0).map_err(|e| format!("invalid hex: {e}"))?;
        Fr::deserialize_compressed(&bytes[..]).map_err(|e| format!("invalid field bytes: {e}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public inputs for an attestation proof.
///
/// Ordering MUST match the circuit's public input allocation order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttestationPublicInputs {
    pub digest: FrHex,
    pub nullifier: FrHex,
    /// The deployment scope as the string the client used; the field encoding
    /// is derived from it on both sides.
    pub scope: String,
}
