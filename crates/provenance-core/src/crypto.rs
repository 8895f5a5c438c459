//! Pluggable signature verification for authorship claims.
//!
//! The registry stores a 65-byte signature with every record but does not
//! interpret it. A [`SignatureVerifier`] decides whether a signature binds a
//! fingerprint to the claimed signer. [`AcceptAllVerifier`] is the no-op used
//! when verification is disabled; [`Ed25519Verifier`] checks real signatures
//! against a [`KeyDirectory`].
//!
//! ## Ed25519 claim layout
//!
//! ```text
//! signature blob = ed25519_signature (64 bytes) || scheme tag (0x00)
//! signed message = CLAIM_DOMAIN || fingerprint (32 bytes) || principal (UTF-8)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::{CoreError, Result};
use crate::types::{ClaimSignature, Fingerprint, Principal};

/// Domain separator for claim signatures.
pub const CLAIM_DOMAIN: &[u8] = b"provenance/claim/v1";

/// Trailing byte identifying an Ed25519 claim signature.
pub const ED25519_SCHEME_TAG: u8 = 0x00;

/// Decides whether `signature` is a valid claim over `fingerprint` by `signer`.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, fingerprint: &Fingerprint, signature: &ClaimSignature, signer: &Principal) -> bool;
}

/// Accepts every signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllVerifier;

impl SignatureVerifier for AcceptAllVerifier {
    fn verify(&self, _: &Fingerprint, _: &ClaimSignature, _: &Principal) -> bool {
        true
    }
}

/// The message a signer signs to claim `fingerprint`.
pub fn claim_message(fingerprint: &Fingerprint, signer: &Principal) -> Vec<u8> {
    let mut msg = Vec::with_capacity(CLAIM_DOMAIN.len() + 32 + signer.as_bytes().len());
    msg.extend_from_slice(CLAIM_DOMAIN);
    msg.extend_from_slice(fingerprint.as_bytes());
    msg.extend_from_slice(signer.as_bytes());
    msg
}

/// Maps principals to their Ed25519 verifying keys.
///
/// Entries are immutable once written, so a lock poisoned by a panicking
/// writer still guards a consistent map and is recovered rather than
/// reported.
#[derive(Default)]
pub struct KeyDirectory {
    keys: RwLock<HashMap<Principal, VerifyingKey>>,
}

impl KeyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `principal` to a 32-byte Ed25519 public key, replacing any
    /// earlier binding.
    pub fn insert(&self, principal: Principal, public_key: [u8; 32]) -> Result<()> {
        let key = VerifyingKey::from_bytes(&public_key)
            .map_err(|e| CoreError::invalid("public_key", e.to_string()))?;
        self.write().insert(principal, key);
        Ok(())
    }

    pub fn get(&self, principal: &Principal) -> Option<VerifyingKey> {
        self.read().get(principal).copied()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Principal, VerifyingKey>> {
        self.keys.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Principal, VerifyingKey>> {
        self.keys.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for KeyDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyDirectory({} keys)", self.len())
    }
}

/// Verifies Ed25519 claim signatures against a key directory.
///
/// Unknown signers, a wrong scheme tag, or a bad signature all fail.
#[derive(Debug, Default)]
pub struct Ed25519Verifier {
    directory: KeyDirectory,
}

impl Ed25519Verifier {
    pub fn new(directory: KeyDirectory) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &KeyDirectory {
        &self.directory
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, fingerprint: &Fingerprint, signature: &ClaimSignature, signer: &Principal) -> bool {
        let Some(key) = self.directory.get(signer) else {
            return false;
        };
        let (sig_bytes, tag) = signature.0.split_at(64);
        if tag[0] != ED25519_SCHEME_TAG {
            return false;
        }
        let Ok(sig) = Signature::from_slice(sig_bytes) else {
            return false;
        };
        key.verify(&claim_message(fingerprint, signer), &sig).is_ok()
    }
}

/// An Ed25519 keypair for producing claim signatures.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The 32-byte public key.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a claim over `fingerprint` as `signer`.
    pub fn sign_claim(&self, fingerprint: &Fingerprint, signer: &Principal) -> ClaimSignature {
        let sig = self.signing_key.sign(&claim_message(fingerprint, signer));
        let mut blob = [0u8; 65];
        blob[..64].copy_from_slice(&sig.to_bytes());
        blob[64] = ED25519_SCHEME_TAG;
        ClaimSignature(blob)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", &hex::encode(self.public_key())[..16])
    }
}
