//! MemoryStore and SqliteStore must agree on every batch outcome.

use proptest::prelude::*;

use provenance_core::{
    AuthorStats, ClaimSignature, ContentRecord, Fingerprint, Principal, RegistrationRequest,
    VerifierEntry,
};
use provenance_store::{MemoryStore, SqliteStore, Store, StoreError, WriteBatch};

#[derive(Debug, Clone)]
enum Op {
    Record(u8, u8),
    Index(u8, u64, u8),
    Stats(u8, u64, u64),
    Verifier(u8, bool),
}

fn principal(n: u8) -> Principal {
    Principal::new(format!("p{}", n % 4)).unwrap()
}

fn fingerprint(n: u8) -> Fingerprint {
    Fingerprint::from_bytes([n % 8; 32])
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<u8>(), any::<u8>()).prop_map(|(a, f)| Op::Record(a, f)),
        (any::<u8>(), 0u64..4, any::<u8>()).prop_map(|(a, s, f)| Op::Index(a, s, f)),
        (any::<u8>(), 0u64..100, any::<u64>()).prop_map(|(a, c, t)| Op::Stats(a, c, t)),
        (any::<u8>(), any::<bool>()).prop_map(|(v, active)| Op::Verifier(v, active)),
    ]
}

fn batch(ops: &[Op]) -> WriteBatch {
    let mut batch = WriteBatch::new();
    for op in ops {
        match op {
            Op::Record(a, f) => {
                let request = RegistrationRequest::builder(fingerprint(*f), ClaimSignature::ZERO)
                    .content_type("doc")
                    .title("t")
                    .build()
                    .unwrap();
                batch.insert_record(fingerprint(*f), ContentRecord::claim(&request, principal(*a), 1));
            }
            Op::Index(a, seq, f) => {
                batch.insert_index_entry(principal(*a), *seq, fingerprint(*f));
            }
            Op::Stats(a, content_count, last_activity) => {
                batch.put_author_stats(
                    principal(*a),
                    AuthorStats {
                        content_count: *content_count,
                        last_activity: *last_activity,
                    },
                );
            }
            Op::Verifier(v, active) => {
                batch.put_verifier(principal(*v), VerifierEntry { active: *active });
            }
        }
    }
    batch
}

proptest! {
    #[test]
    fn backends_agree(batches in prop::collection::vec(prop::collection::vec(op(), 1..5), 1..12)) {
        let memory = MemoryStore::new();
        let sqlite = SqliteStore::open_memory().unwrap();

        for ops in &batches {
            let before = memory.dump().unwrap();
            let a = memory.commit(batch(ops));
            let b = sqlite.commit(batch(ops));

            match (&a, &b) {
                (Ok(()), Ok(())) => {}
                (
                    Err(StoreError::Conflict { table: ta, key: ka }),
                    Err(StoreError::Conflict { table: tb, key: kb }),
                ) => {
                    prop_assert_eq!(ta, tb);
                    prop_assert_eq!(ka, kb);
                    prop_assert_eq!(&memory.dump().unwrap(), &before);
                }
                _ => prop_assert!(false, "backends disagree: {:?} vs {:?}", a, b),
            }

            prop_assert_eq!(
                memory.dump().unwrap().canonical_bytes(),
                sqlite.dump().unwrap().canonical_bytes()
            );
        }
    }
}
