// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Tuple and row schema descriptors.
//!
//! Descriptors are the schema contract between the catalog layer and the
//! runtime: slot count, slot byte offsets, and slot types for each tuple in
//! a row. The runtime consumes them and never mutates them. The layout
//! builder here stands in for the catalog's layout computation so tests and
//! embedded users can construct schemas directly from types.

use serde::{Deserialize, Serialize};

use crate::scalar::ScalarType;

/// Locates a slot's NULL bit within its tuple's null-indicator bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NullIndicator {
    pub byte_offset: usize,
    pub bit_mask: u8,
}

impl NullIndicator {
    /// True if the slot is NULL in `tuple`.
    pub fn is_set(&self, tuple: &[u8]) -> bool {
        tuple[self.byte_offset] & self.bit_mask != 0
    }

    /// Marks the slot NULL in `tuple`.
    pub fn set(&self, tuple: &mut [u8]) {
        tuple[self.byte_offset] |= self.bit_mask;
    }

    /// Marks the slot non-NULL in `tuple`.
    pub fn clear(&self, tuple: &mut [u8]) {
        tuple[self.byte_offset] &= !self.bit_mask;
    }
}

/// Describes one slot of a tuple: its type, its byte offset within the
/// tuple, and where its NULL bit lives.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SlotDescriptor {
    pub col_type: ScalarType,
    pub tuple_offset: usize,
    pub null_indicator: NullIndicator,
}

/// Describes the fixed-size layout of one tuple.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TupleDescriptor {
    byte_size: usize,
    slots: Vec<SlotDescriptor>,
}

impl TupleDescriptor {
    /// Assembles a descriptor from an externally computed layout.
    pub fn new(byte_size: usize, slots: Vec<SlotDescriptor>) -> TupleDescriptor {
        debug_assert!(slots.iter().all(|s| {
            s.tuple_offset + s.col_type.slot_width() <= byte_size
        }));
        TupleDescriptor { byte_size, slots }
    }

    /// Computes a layout for `types`: null-indicator bytes first, then one
    /// slot per type in declaration order, each aligned to its width.
    pub fn from_types(types: &[ScalarType]) -> TupleDescriptor {
        debug_assert!(!types.is_empty());
        let null_bytes = (types.len() + 7) / 8;
        let mut offset = null_bytes;
        let mut slots = Vec::with_capacity(types.len());
        for (i, ty) in types.iter().enumerate() {
            let align = ty.slot_alignment();
            offset = offset.div_ceil(align) * align;
            slots.push(SlotDescriptor {
                col_type: *ty,
                tuple_offset: offset,
                null_indicator: NullIndicator {
                    byte_offset: i / 8,
                    bit_mask: 1 << (i % 8),
                },
            });
            offset += ty.slot_width();
        }
        TupleDescriptor {
            byte_size: offset,
            slots,
        }
    }

    /// The fixed size of a tuple with this layout, in bytes.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn slots(&self) -> &[SlotDescriptor] {
        &self.slots
    }
}

/// The schema of a row: one tuple descriptor per row position.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RowSchema {
    tuples: Vec<TupleDescriptor>,
}

impl RowSchema {
    /// Creates a schema from tuple descriptors, which must be non-empty.
    pub fn new(tuples: Vec<TupleDescriptor>) -> RowSchema {
        debug_assert!(!tuples.is_empty());
        RowSchema { tuples }
    }

    pub fn tuples(&self) -> &[TupleDescriptor] {
        &self.tuples
    }

    /// The number of tuples in each row of this schema.
    pub fn tuples_per_row(&self) -> usize {
        self.tuples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adt::varchar::VarCharMaxLength;

    #[test]
    fn layout_aligns_slots() {
        let desc = TupleDescriptor::from_types(&[
            ScalarType::Int32,
            ScalarType::String,
            ScalarType::Bool,
            ScalarType::Int64,
        ]);
        let offsets: Vec<usize> = desc.slots().iter().map(|s| s.tuple_offset).collect();
        // One null byte, then i32 at 4, var-len slot at 8, bool at 20,
        // i64 padded out to 24.
        assert_eq!(offsets, vec![4, 8, 20, 24]);
        assert_eq!(desc.byte_size(), 32);
    }

    #[test]
    fn null_indicators_are_distinct() {
        let types = vec![ScalarType::Bool; 10];
        let desc = TupleDescriptor::from_types(&types);
        let mut tuple = vec![0u8; desc.byte_size()];
        for slot in desc.slots() {
            assert!(!slot.null_indicator.is_set(&tuple));
            slot.null_indicator.set(&mut tuple);
        }
        for slot in desc.slots() {
            assert!(slot.null_indicator.is_set(&tuple));
        }
        // Ten slots need two null-indicator bytes.
        assert_eq!(tuple[0], 0xff);
        assert_eq!(tuple[1], 0x03);
        desc.slots()[3].null_indicator.clear(&mut tuple);
        assert!(!desc.slots()[3].null_indicator.is_set(&tuple));
        assert_eq!(tuple[0], 0xf7);
    }

    #[test]
    fn var_len_slots_share_a_width() {
        let bounded = ScalarType::VarChar(VarCharMaxLength::try_from(16).unwrap());
        let desc = TupleDescriptor::from_types(&[bounded, ScalarType::String]);
        assert_eq!(
            desc.slots()[0].col_type.slot_width(),
            desc.slots()[1].col_type.slot_width(),
        );
    }
}
