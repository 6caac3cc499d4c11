//! ZK layer for the private emotion attestation service.
//!
//! This crate contains:
//! - Normalization and text-to-field hashing for reaction words.
//! - A SNARK circuit proving knowledge of a digest preimage, bound to a public scope.
//! - Prover + verifier orchestration.
//! - Serialization helpers for transporting proofs and public inputs.

pub mod constants;
pub mod circuit;
pub mod groth16;
pub mod hasher;
pub mod types;
