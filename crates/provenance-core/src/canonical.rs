//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (logical time is an unsigned integer)
//!
//! Stored rows and state dumps go through these encoders, so two stores that
//! hold the same state produce identical bytes.

use ciborium::value::{Integer, Value};

use crate::error::{CoreError, Result};
use crate::record::{AuthorStats, ContentRecord, VerifierEntry};
use crate::text::{ContentType, StorageUrl, Title};
use crate::types::{ClaimSignature, Principal};

/// Record field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const AUTHOR: u64 = 0;
    pub const TIMESTAMP: u64 = 1;
    pub const CONTENT_TYPE: u64 = 2;
    pub const SIGNATURE: u64 = 3;
    pub const TITLE: u64 = 4;
    pub const IS_ACTIVE: u64 = 5;
    pub const STORAGE_URL: u64 = 6;
    pub const VERSION: u64 = 7;

    pub const CONTENT_COUNT: u64 = 0;
    pub const LAST_ACTIVITY: u64 = 1;

    pub const ACTIVE: u64 = 0;
}

fn key(k: u64) -> Value {
    Value::Integer(k.into())
}

/// Encode a content record to canonical CBOR bytes.
pub fn encode_record(record: &ContentRecord) -> Vec<u8> {
    let storage_url = match &record.storage_url {
        Some(url) => Value::Text(url.as_str().to_string()),
        None => Value::Null,
    };

    let entries = vec![
        (key(keys::AUTHOR), Value::Text(record.author.as_str().to_string())),
        (key(keys::TIMESTAMP), Value::Integer(record.timestamp.into())),
        (
            key(keys::CONTENT_TYPE),
            Value::Text(record.content_type.as_str().to_string()),
        ),
        (key(keys::SIGNATURE), Value::Bytes(record.signature.0.to_vec())),
        (key(keys::TITLE), Value::Text(record.title.as_str().to_string())),
        (key(keys::IS_ACTIVE), Value::Bool(record.is_active)),
        (key(keys::STORAGE_URL), storage_url),
        (key(keys::VERSION), Value::Integer(record.version.into())),
    ];

    encode_cbor_value_canonical(&Value::Map(entries))
}

/// Encode author stats to canonical CBOR bytes.
pub fn encode_author_stats(stats: &AuthorStats) -> Vec<u8> {
    let entries = vec![
        (key(keys::CONTENT_COUNT), Value::Integer(stats.content_count.into())),
        (key(keys::LAST_ACTIVITY), Value::Integer(stats.last_activity.into())),
    ];
    encode_cbor_value_canonical(&Value::Map(entries))
}

/// Encode a verifier entry to canonical CBOR bytes.
pub fn encode_verifier_entry(entry: &VerifierEntry) -> Vec<u8> {
    let entries = vec![(key(keys::ACTIVE), Value::Bool(entry.active))];
    encode_cbor_value_canonical(&Value::Map(entries))
}

/// Decode a content record, rejecting anything that is not the canonical
/// encoding of a well-formed record.
pub fn decode_record(bytes: &[u8]) -> Result<ContentRecord> {
    let value = parse(bytes)?;
    let map = as_map(&value, "record")?;

    let author = match get(map, keys::AUTHOR) {
        Some(Value::Text(s)) => Principal::new(s.clone())?,
        _ => return Err(CoreError::malformed("record", "invalid author")),
    };
    let timestamp = get_uint(map, keys::TIMESTAMP, "record", "timestamp")?;
    let content_type = match get(map, keys::CONTENT_TYPE) {
        Some(Value::Text(s)) => ContentType::new(s.clone())?,
        _ => return Err(CoreError::malformed("record", "invalid content_type")),
    };
    let signature = match get(map, keys::SIGNATURE) {
        Some(Value::Bytes(b)) if b.len() == 65 => ClaimSignature::try_from(b.as_slice())?,
        _ => return Err(CoreError::malformed("record", "invalid signature")),
    };
    let title = match get(map, keys::TITLE) {
        Some(Value::Text(s)) => Title::new(s.clone())?,
        _ => return Err(CoreError::malformed("record", "invalid title")),
    };
    let is_active = match get(map, keys::IS_ACTIVE) {
        Some(Value::Bool(b)) => *b,
        _ => return Err(CoreError::malformed("record", "invalid is_active")),
    };
    let storage_url = match get(map, keys::STORAGE_URL) {
        Some(Value::Text(s)) => Some(StorageUrl::new(s.clone())?),
        Some(Value::Null) => None,
        _ => return Err(CoreError::malformed("record", "invalid storage_url")),
    };
    let version = u32::try_from(get_uint(map, keys::VERSION, "record", "version")?)
        .map_err(|_| CoreError::malformed("record", "version out of range"))?;

    let record = ContentRecord {
        author,
        timestamp,
        content_type,
        signature,
        title,
        is_active,
        storage_url,
        version,
    };

    ensure_canonical(bytes, &encode_record(&record), "record")?;
    Ok(record)
}

/// Decode author stats from canonical bytes.
pub fn decode_author_stats(bytes: &[u8]) -> Result<AuthorStats> {
    let value = parse(bytes)?;
    let map = as_map(&value, "author stats")?;

    let stats = AuthorStats {
        content_count: get_uint(map, keys::CONTENT_COUNT, "author stats", "content_count")?,
        last_activity: get_uint(map, keys::LAST_ACTIVITY, "author stats", "last_activity")?,
    };

    ensure_canonical(bytes, &encode_author_stats(&stats), "author stats")?;
    Ok(stats)
}

/// Decode a verifier entry from canonical bytes.
pub fn decode_verifier_entry(bytes: &[u8]) -> Result<VerifierEntry> {
    let value = parse(bytes)?;
    let map = as_map(&value, "verifier entry")?;

    let active = match get(map, keys::ACTIVE) {
        Some(Value::Bool(b)) => *b,
        _ => return Err(CoreError::malformed("verifier entry", "invalid active flag")),
    };
    let entry = VerifierEntry { active };

    ensure_canonical(bytes, &encode_verifier_entry(&entry), "verifier entry")?;
    Ok(entry)
}

fn parse(bytes: &[u8]) -> Result<Value> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}

fn as_map<'a>(value: &'a Value, kind: &'static str) -> Result<&'a [(Value, Value)]> {
    match value {
        Value::Map(m) => Ok(m),
        _ => Err(CoreError::malformed(kind, "expected map")),
    }
}

fn get(map: &[(Value, Value)], wanted: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if u64::try_from(*i).ok() == Some(wanted)))
        .map(|(_, v)| v)
}

fn get_uint(
    map: &[(Value, Value)],
    wanted: u64,
    kind: &'static str,
    field: &'static str,
) -> Result<u64> {
    match get(map, wanted) {
        Some(Value::Integer(i)) => u64::try_from(*i)
            .map_err(|_| CoreError::malformed(kind, format!("{} out of range", field))),
        _ => Err(CoreError::malformed(kind, format!("missing {}", field))),
    }
}

fn ensure_canonical(input: &[u8], reencoded: &[u8], kind: &'static str) -> Result<()> {
    if input != reencoded {
        return Err(CoreError::malformed(kind, "non-canonical encoding"));
    }
    Ok(())
}

/// Encode a CBOR Value to canonical bytes.
fn encode_cbor_value_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
///
/// Only the value kinds produced by the encoders above are reachable.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        // Floats, tags and other simple values never appear in registry state.
        other => unreachable!("unsupported CBOR value in canonical encoding: {:?}", other),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RECORD_VERSION;

    fn sample_record(storage_url: Option<&str>) -> ContentRecord {
        ContentRecord {
            author: Principal::new("alice").unwrap(),
            timestamp: 1_000,
            content_type: ContentType::new("article").unwrap(),
            signature: ClaimSignature::from_bytes([0x5a; 65]),
            title: Title::new("Hello World").unwrap(),
            is_active: true,
            storage_url: storage_url.map(|u| StorageUrl::new(u).unwrap()),
            version: RECORD_VERSION,
        }
    }

    #[test]
    fn test_record_encoding_deterministic() {
        let record = sample_record(Some("ipfs://bafy"));
        assert_eq!(encode_record(&record), encode_record(&record.clone()));
    }

    #[test]
    fn test_record_roundtrip_with_and_without_url() {
        for url in [None, Some("https://example.org/x")] {
            let record = sample_record(url);
            let decoded = decode_record(&encode_record(&record)).unwrap();
            assert_eq!(record, decoded);
        }
    }

    #[test]
    fn test_record_map_header() {
        let bytes = encode_record(&sample_record(None));
        // Map with 8 entries, first key is 0 (author).
        assert_eq!(bytes[0], 0xa8);
        assert_eq!(bytes[1], 0x00);
        // Text "alice".
        assert_eq!(bytes[2], 0x65);
        assert_eq!(&bytes[3..8], b"alice");
    }

    #[test]
    fn test_stats_encoding() {
        let stats = AuthorStats {
            content_count: 100,
            last_activity: 70_000,
        };
        let bytes = encode_author_stats(&stats);
        assert_eq!(bytes, vec![0xa2, 0x00, 0x18, 100, 0x01, 0x1a, 0x00, 0x01, 0x11, 0x70]);
        assert_eq!(decode_author_stats(&bytes).unwrap(), stats);
    }

    #[test]
    fn test_verifier_entry_encoding() {
        let bytes = encode_verifier_entry(&VerifierEntry { active: true });
        assert_eq!(bytes, vec![0xa1, 0x00, 0xf5]);
        assert!(decode_verifier_entry(&bytes).unwrap().active);
    }

    #[test]
    fn test_non_canonical_integer_rejected() {
        // content_count 5 encoded in two bytes instead of one.
        let bytes = vec![0xa2, 0x00, 0x18, 0x05, 0x01, 0x00];
        let err = decode_author_stats(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::Malformed { .. }));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let bytes = encode_record(&sample_record(None));
        assert!(decode_record(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    #[should_panic(expected = "unsupported CBOR value")]
    fn test_float_refused() {
        encode_cbor_value_canonical(&Value::Float(1.5));
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();

        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 0, 256);
        assert_eq!(buf, vec![0x19, 0x01, 0x00]);

        buf.clear();
        encode_uint(&mut buf, 0, u64::MAX);
        assert_eq!(buf[0], 0x1b);
        assert_eq!(buf.len(), 9);
    }

    proptest::proptest! {
        #[test]
        fn stats_survive_full_range(content_count: u64, last_activity: u64) {
            let stats = AuthorStats { content_count, last_activity };
            let bytes = encode_author_stats(&stats);
            proptest::prop_assert_eq!(decode_author_stats(&bytes).unwrap(), stats);
        }

        #[test]
        fn record_timestamp_survives_full_range(timestamp: u64) {
            let record = ContentRecord { timestamp, ..sample_record(None) };
            proptest::prop_assert_eq!(decode_record(&encode_record(&record)).unwrap(), record);
        }
    }
}
