//! Property tests for the snapshot format.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::Bytes;
use proptest::prelude::*;
use testkit_protocol::{ColumnMeta, ResultSetSnapshot, Snapshot};
use testkit_types::{SqlType, SqlValue};

fn cell() -> impl Strategy<Value = (Option<i32>, Option<String>)> {
    (
        proptest::option::of(any::<i32>()),
        proptest::option::of("[a-zA-Z0-9 ]{0,20}"),
    )
}

fn result_set() -> impl Strategy<Value = ResultSetSnapshot> {
    (proptest::collection::vec(cell(), 0..20), -1i32..100).prop_map(|(cells, affected)| {
        let mut set = ResultSetSnapshot::new(vec![
            ColumnMeta::new("Number", SqlType::Int, true),
            ColumnMeta::new("Label", SqlType::NVarChar { max_length: 20 }, true),
        ])
        .with_records_affected(affected);
        for (number, label) in cells {
            set.push_row(vec![
                number.map_or(SqlValue::Null, SqlValue::Int),
                label.map_or(SqlValue::Null, SqlValue::String),
            ]);
        }
        set
    })
}

proptest! {
    #[test]
    fn decode_inverts_encode(sets in proptest::collection::vec(result_set(), 0..4)) {
        let snapshot = Snapshot::new(sets);
        let encoded = snapshot.encode().unwrap();
        prop_assert_eq!(Snapshot::decode(encoded).unwrap(), snapshot);
    }

    #[test]
    fn decode_arbitrary_bytes_never_panics(raw in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut data = b"TKSN\x01\x00".to_vec();
        data.extend(raw);
        let _ = Snapshot::decode(Bytes::from(data));
    }
}
