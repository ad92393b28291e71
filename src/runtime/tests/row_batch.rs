// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use proptest::prelude::*;

use tern_repr::desc::{RowSchema, TupleDescriptor};
use tern_repr::ScalarType;
use tern_runtime::{tuple, Codec, RowBatch};

/// A row of the test schema: one tuple of (i64, bool?, string?).
#[derive(Debug, Clone, PartialEq)]
struct TestRow {
    num: i64,
    flag: Option<bool>,
    name: Option<Vec<u8>>,
}

fn test_schema() -> Arc<RowSchema> {
    Arc::new(RowSchema::new(vec![TupleDescriptor::from_types(&[
        ScalarType::Int64,
        ScalarType::Bool,
        ScalarType::String,
    ])]))
}

fn build_batch(schema: &Arc<RowSchema>, rows: &[TestRow], self_contained: bool) -> RowBatch {
    let mut batch = RowBatch::new(Arc::clone(schema), rows.len().max(1));
    let desc = &schema.tuples()[0];
    for row in rows {
        let idx = batch.add_row().expect("batch sized to the row count");
        let t = batch.alloc_tuple(0);
        tuple::slot_mut(batch.tuple_data_mut(t), &desc.slots()[0])
            .copy_from_slice(&row.num.to_le_bytes());
        match row.flag {
            Some(flag) => {
                tuple::slot_mut(batch.tuple_data_mut(t), &desc.slots()[1])[0] = u8::from(flag);
            }
            None => desc.slots()[1].null_indicator.set(batch.tuple_data_mut(t)),
        }
        match &row.name {
            Some(name) => batch.set_var_len(t, &desc.slots()[2], name),
            None => desc.slots()[2].null_indicator.set(batch.tuple_data_mut(t)),
        }
        batch.set_tuple(idx, 0, Some(t));
        batch.commit_last_row();
    }
    batch.set_is_self_contained(self_contained);
    batch
}

fn read_batch(batch: &RowBatch, schema: &RowSchema) -> Vec<TestRow> {
    let desc = &schema.tuples()[0];
    (0..batch.num_rows())
        .map(|i| {
            let t = batch.row(i)[0].expect("tuple present");
            let data = batch.tuple_data(t);
            let num = i64::from_le_bytes(
                tuple::slot(data, &desc.slots()[0]).try_into().unwrap(),
            );
            let flag = if desc.slots()[1].null_indicator.is_set(data) {
                None
            } else {
                Some(tuple::slot(data, &desc.slots()[1])[0] != 0)
            };
            let name = if desc.slots()[2].null_indicator.is_set(data) {
                None
            } else {
                Some(batch.var_len(t, &desc.slots()[2]).to_vec())
            };
            TestRow { num, flag, name }
        })
        .collect()
}

fn arb_row() -> impl Strategy<Value = TestRow> {
    (
        any::<i64>(),
        proptest::option::of(any::<bool>()),
        proptest::option::of(prop::collection::vec(any::<u8>(), 0..64)),
    )
        .prop_map(|(num, flag, name)| TestRow { num, flag, name })
}

proptest! {
    #[test]
    fn wire_round_trip_preserves_rows(
        rows in prop::collection::vec(arb_row(), 0..40),
        self_contained in any::<bool>(),
        compress in any::<bool>(),
    ) {
        let schema = test_schema();
        let batch = build_batch(&schema, &rows, self_contained);
        let codec = if compress { Codec::Lz4 } else { Codec::None };
        let wire = batch.serialize(codec);
        prop_assert_eq!(wire.num_rows, rows.len());

        let rebuilt = RowBatch::from_wire(Arc::clone(&schema), &wire).unwrap();
        prop_assert_eq!(rebuilt.num_rows(), rows.len());
        prop_assert!(rebuilt.is_self_contained());
        prop_assert_eq!(read_batch(&rebuilt, &schema), rows);
    }

    #[test]
    fn transfer_keeps_every_payload_reachable(rows in prop::collection::vec(arb_row(), 1..20)) {
        let schema = test_schema();
        let mut src = build_batch(&schema, &rows, true);
        let refs: Vec<_> = (0..src.num_rows()).map(|i| src.row(i).to_vec()).collect();

        let mut dest = RowBatch::new(Arc::clone(&schema), rows.len());
        src.transfer_tuple_data(&mut dest);
        prop_assert_eq!(src.num_rows(), 0);

        // Replay the row structure in the destination; the moved pool must
        // resolve every handle to the original bytes.
        for (i, row_refs) in refs.iter().enumerate() {
            let idx = dest.add_row().unwrap();
            prop_assert_eq!(idx, i);
            for (pos, t) in row_refs.iter().enumerate() {
                dest.set_tuple(idx, pos, *t);
            }
            dest.commit_last_row();
        }
        prop_assert_eq!(read_batch(&dest, &schema), rows);
    }
}
