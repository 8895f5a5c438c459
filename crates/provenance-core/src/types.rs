//! Strong type definitions for the provenance registry.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Logical time supplied by the host (block height).
///
/// Monotonically non-decreasing across operations; the registry never reads a
/// wall clock.
pub type LogicalTime = u64;

/// Maximum length of a principal identity, in bytes.
pub const MAX_PRINCIPAL_LEN: usize = 128;

/// A 32-byte content fingerprint.
///
/// The caller hashes the content before submission; the registry only ever
/// sees the digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Create a new Fingerprint from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string. Accepts an optional `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| CoreError::invalid("fingerprint", e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Fingerprint {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Fingerprint {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = slice.try_into().map_err(|_| {
            CoreError::invalid("fingerprint", format!("expected 32 bytes, got {}", slice.len()))
        })?;
        Ok(Self(arr))
    }
}

/// The identity of a caller, as authenticated by the host environment.
///
/// The registry treats principals as opaque, exact-match keys.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Create a principal, rejecting empty or oversized identities.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::invalid("principal", "must not be empty"));
        }
        if id.len() > MAX_PRINCIPAL_LEN {
            return Err(CoreError::invalid(
                "principal",
                format!("{} bytes exceeds maximum of {}", id.len(), MAX_PRINCIPAL_LEN),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.0)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Principal {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.0
    }
}

/// A 65-byte signature blob attached to a claim.
///
/// Stored verbatim. Whether (and how) it is checked is up to the configured
/// [`SignatureVerifier`](crate::crypto::SignatureVerifier).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimSignature(pub [u8; 65]);

impl ClaimSignature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The zero signature (placeholder when no signer is involved).
    pub const ZERO: Self = Self([0u8; 65]);
}

impl fmt::Debug for ClaimSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimSig({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for ClaimSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 65]> for ClaimSignature {
    fn from(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for ClaimSignature {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; 65] = slice.try_into().map_err(|_| {
            CoreError::invalid("signature", format!("expected 65 bytes, got {}", slice.len()))
        })?;
        Ok(Self(arr))
    }
}

// serde only derives for arrays up to 32 elements.
impl Serialize for ClaimSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for ClaimSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SigVisitor;

        impl<'de> Visitor<'de> for SigVisitor {
            type Value = ClaimSignature;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("65 signature bytes")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Self::Value, E> {
                ClaimSignature::try_from(v).map_err(E::custom)
            }

            fn visit_seq<A: de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut arr = [0u8; 65];
                for (i, slot) in arr.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                }
                if seq.next_element::<u8>()?.is_some() {
                    return Err(de::Error::invalid_length(66, &self));
                }
                Ok(ClaimSignature(arr))
            }
        }

        deserializer.deserialize_bytes(SigVisitor)
    }
}
