//! Registry entities: content records, author statistics, verifier entries,
//! and the argument set for a registration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::text::{ContentType, StorageUrl, Title};
use crate::types::{ClaimSignature, Fingerprint, LogicalTime, Principal};

/// Maximum number of fingerprints a single author may register.
pub const MAX_CONTENT_PER_AUTHOR: u64 = 100;

/// Version stamped on every new record. No re-versioning path exists.
pub const RECORD_VERSION: u32 = 1;

/// The authorship claim stored under a fingerprint.
///
/// Every field is fixed at registration. `is_active` and `version` are
/// carried for forward compatibility; nothing mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Caller identity at registration time.
    pub author: Principal,
    /// Logical time of registration.
    pub timestamp: LogicalTime,
    pub content_type: ContentType,
    /// Recorded verbatim.
    pub signature: ClaimSignature,
    pub title: Title,
    pub is_active: bool,
    pub storage_url: Option<StorageUrl>,
    pub version: u32,
}

impl ContentRecord {
    /// Build the record a successful registration writes.
    pub fn claim(request: &RegistrationRequest, author: Principal, now: LogicalTime) -> Self {
        Self {
            author,
            timestamp: now,
            content_type: request.content_type.clone(),
            signature: request.signature,
            title: request.title.clone(),
            is_active: true,
            storage_url: request.storage_url.clone(),
            version: RECORD_VERSION,
        }
    }
}

/// Per-author registration counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorStats {
    /// Number of successful registrations; also the next sequence number.
    pub content_count: u64,
    /// Logical time of the most recent registration.
    pub last_activity: LogicalTime,
}

impl AuthorStats {
    /// Stats after one more registration at `now`.
    pub fn advanced(self, now: LogicalTime) -> Self {
        Self {
            content_count: self.content_count + 1,
            last_activity: now,
        }
    }
}

/// Trusted-verifier flag. Written only by an administrative path outside the
/// registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierEntry {
    pub active: bool,
}

/// The validated arguments of a registration.
///
/// Length and charset bounds are enforced when the request is built, so the
/// registry only sees well-formed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub fingerprint: Fingerprint,
    pub content_type: ContentType,
    pub signature: ClaimSignature,
    pub title: Title,
    pub storage_url: Option<StorageUrl>,
}

impl RegistrationRequest {
    /// Start building a request for `fingerprint`.
    pub fn builder(fingerprint: Fingerprint, signature: ClaimSignature) -> RegistrationRequestBuilder {
        RegistrationRequestBuilder {
            fingerprint,
            signature,
            content_type: String::new(),
            title: String::new(),
            storage_url: None,
        }
    }
}

/// Builder for [`RegistrationRequest`].
#[derive(Debug, Clone)]
pub struct RegistrationRequestBuilder {
    fingerprint: Fingerprint,
    signature: ClaimSignature,
    content_type: String,
    title: String,
    storage_url: Option<String>,
}

impl RegistrationRequestBuilder {
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn storage_url(mut self, url: impl Into<String>) -> Self {
        self.storage_url = Some(url.into());
        self
    }

    /// Replace the signature (e.g. after signing the fingerprint).
    pub fn signature(mut self, signature: ClaimSignature) -> Self {
        self.signature = signature;
        self
    }

    /// Validate every field and produce the request.
    pub fn build(self) -> Result<RegistrationRequest> {
        Ok(RegistrationRequest {
            fingerprint: self.fingerprint,
            content_type: ContentType::new(self.content_type)?,
            signature: self.signature,
            title: Title::new(self.title)?,
            storage_url: self.storage_url.map(StorageUrl::new).transpose()?,
        })
    }
}
