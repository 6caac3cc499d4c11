//! Client-side commitment generator.
//!
//! `attest digest <word>` prints the canonical digest for a reaction word, for
//! provisioning `subjects.json` without ever handing the word to the server.
//!
//! `attest prove <subject_id> <word> [scope]` runs the full client pipeline:
//! normalize, hash to the field, generate the Groth16 proof, self-verify, and
//! print the exact JSON body for `POST /api/v1/submissions`. Keys are read
//! from (or created under) `data/keys`, the same layout the server uses, so
//! proofs made here verify against the server's verifying key.

use ark_bn254::Bn254;
use ark_groth16::{ProvingKey, VerifyingKey};
use base64::Engine;
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;
use zk_attest::groth16::{
    deserialize_pk, deserialize_vk, prove_attestation, serialize_pk, serialize_proof, serialize_vk,
    setup_keys, verify_attestation,
};
use zk_attest::hasher::{normalize, reaction_to_field, scope_to_field};
use zk_attest::types::FrHex;

const DEFAULT_SCOPE: &str = "unveiled-emotions";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let result = match args.first().map(String::as_str) {
        Some("digest") if args.len() == 2 => print_digest(&args[1]),
        Some("prove") if args.len() == 3 || args.len() == 4 => {
            let scope = args.get(3).map(String::as_str).unwrap_or(DEFAULT_SCOPE);
            prove(&args[1], &args[2], scope)
        }
        _ => {
            eprintln!("usage: attest digest <word>");
            eprintln!("       attest prove <subject_id> <word> [scope]");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_digest(word: &str) -> Result<(), Box<dyn std::error::Error>> {
    let preimage = reaction_to_field(&normalize(word));
    let digest = zk_attest::groth16::compute_digest(preimage);
    println!("{}", FrHex::from_fr(&digest));
    Ok(())
}

fn prove(subject_id: &str, word: &str, scope: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (pk, vk) = load_or_setup_keys(Path::new("data"))?;

    let preimage = reaction_to_field(&normalize(word));
    let scope_fr = scope_to_field(scope);

    let mut rng = rand::rngs::OsRng;
    let (proof, digest, nullifier) = prove_attestation(&mut rng, &pk, preimage, scope_fr)?;

    // Never hand out a proof that would be rejected.
    if !verify_attestation(&vk, &proof, digest, nullifier, scope_fr)? {
        return Err("generated proof failed self-verification".into());
    }

    let proof_b64 =
        base64::engine::general_purpose::STANDARD.encode(serialize_proof(&proof)?);

    let body = json!({
        "subject_id": subject_id,
        "digest_hex": FrHex::from_fr(&digest).as_str(),
        "nullifier_hex": FrHex::from_fr(&nullifier).as_str(),
        "scope": scope,
        "proof_b64": proof_b64,
    });

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn load_or_setup_keys(
    data_dir: &Path,
) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), Box<dyn std::error::Error>> {
    let keys_dir = data_dir.join("keys");
    std::fs::create_dir_all(&keys_dir)?;

    let pk_path = keys_dir.join("groth16_pk.bin");
    let vk_path = keys_dir.join("groth16_vk.bin");

    if pk_path.exists() && vk_path.exists() {
        let pk = deserialize_pk(&std::fs::read(&pk_path)?)?;
        let vk = deserialize_vk(&std::fs::read(&vk_path)?)?;
        return Ok((pk, vk));
    }

    eprintln!("no keys under {}; running setup", keys_dir.display());

    let mut rng = rand::rngs::OsRng;
    let (pk, vk) = setup_keys(&mut rng)?;

    std::fs::write(&pk_path, serialize_pk(&pk)?)?;
    std::fs::write(&vk_path, serialize_vk(&vk)?)?;

    Ok((pk, vk))
}
