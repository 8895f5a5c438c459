//! Proptest generators for property-based testing.

use proptest::prelude::*;

use provenance_core::{
    AuthorStats, ClaimSignature, ContentType, Fingerprint, Principal, RegistrationRequest,
    StorageUrl, Title,
};

/// Generate a random Fingerprint.
pub fn fingerprint() -> impl Strategy<Value = Fingerprint> {
    any::<[u8; 32]>().prop_map(Fingerprint::from_bytes)
}

/// Generate a random 65-byte ClaimSignature.
pub fn claim_signature() -> impl Strategy<Value = ClaimSignature> {
    prop::collection::vec(any::<u8>(), 65).prop_map(|bytes| {
        let mut blob = [0u8; 65];
        blob.copy_from_slice(&bytes);
        ClaimSignature::from_bytes(blob)
    })
}

/// Generate a principal name.
pub fn principal() -> impl Strategy<Value = Principal> {
    "[a-z][a-z0-9_-]{0,31}".prop_map(|s| Principal::new(s).expect("pattern is a valid principal"))
}

pub fn content_type() -> impl Strategy<Value = ContentType> {
    "[a-z/+.-]{1,20}".prop_map(|s| ContentType::new(s).expect("pattern fits content type"))
}

/// Printable ASCII, up to the title limit.
pub fn title() -> impl Strategy<Value = Title> {
    "[ -~]{0,100}".prop_map(|s| Title::new(s).expect("pattern fits title"))
}

/// Any UTF-8, up to 256 characters.
pub fn storage_url() -> impl Strategy<Value = StorageUrl> {
    prop::collection::vec(any::<char>(), 0..=256)
        .prop_map(|chars| StorageUrl::new(chars.into_iter().collect::<String>()).expect("fits url"))
}

/// Generate author stats with a count inside the quota.
pub fn author_stats() -> impl Strategy<Value = AuthorStats> {
    (0u64..=100, any::<u64>()).prop_map(|(content_count, last_activity)| AuthorStats {
        content_count,
        last_activity,
    })
}

/// Generate a well-formed registration request.
pub fn registration_request() -> impl Strategy<Value = RegistrationRequest> {
    (
        fingerprint(),
        claim_signature(),
        content_type(),
        title(),
        prop::option::of(storage_url()),
    )
        .prop_map(|(fingerprint, signature, content_type, title, storage_url)| {
            RegistrationRequest {
                fingerprint,
                content_type,
                signature,
                title,
                storage_url,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use provenance_core::{decode_author_stats, decode_record, encode_author_stats, encode_record, ContentRecord};

    proptest! {
        #[test]
        fn canonical_record_encoding_is_stable(
            request in registration_request(),
            author in principal(),
            now in any::<u64>(),
        ) {
            let record = ContentRecord::claim(&request, author, now);
            let bytes = encode_record(&record);
            let decoded = decode_record(&bytes).unwrap();
            prop_assert_eq!(&decoded, &record);
            prop_assert_eq!(encode_record(&decoded), bytes);
        }

        #[test]
        fn stats_decode_rejects_truncation(stats in author_stats()) {
            let bytes = encode_author_stats(&stats);
            prop_assert_eq!(decode_author_stats(&bytes).unwrap(), stats);
            prop_assert!(decode_author_stats(&bytes[..bytes.len() - 1]).is_err());
        }

        #[test]
        fn generated_requests_round_trip_builder(request in registration_request()) {
            let mut builder = RegistrationRequest::builder(request.fingerprint, request.signature)
                .content_type(request.content_type.as_str())
                .title(request.title.as_str());
            if let Some(url) = &request.storage_url {
                builder = builder.storage_url(url.as_str());
            }
            prop_assert_eq!(builder.build().unwrap(), request);
        }
    }
}
