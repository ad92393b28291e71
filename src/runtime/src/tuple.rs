// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Byte-level access to tuple slots.
//!
//! A tuple is an opaque fixed-size block laid out by a
//! [`TupleDescriptor`]: null-indicator bytes followed by one slot per
//! column. Fixed-width values are stored little-endian in their slots;
//! variable-length values store a 12-byte reference whose in-memory form is
//! `(chunk, offset, len)` naming pool bytes and whose wire form is
//! `(blob offset: u64, len: u32)`. The two forms share a width so
//! serialization can rewrite one into the other in place.
//!
//! [`TupleDescriptor`]: tern_repr::TupleDescriptor

use tern_repr::desc::SlotDescriptor;
use tern_repr::scalar::VAR_LEN_SLOT_WIDTH;

use crate::pool::{ChunkId, PoolRef};

/// The fixed slot bytes for `slot` within `tuple`.
pub fn slot<'a>(tuple: &'a [u8], slot: &SlotDescriptor) -> &'a [u8] {
    &tuple[slot.tuple_offset..slot.tuple_offset + slot.col_type.slot_width()]
}

/// The fixed slot bytes for `slot` within `tuple`, mutably.
pub fn slot_mut<'a>(tuple: &'a mut [u8], slot: &SlotDescriptor) -> &'a mut [u8] {
    &mut tuple[slot.tuple_offset..slot.tuple_offset + slot.col_type.slot_width()]
}

/// Decodes the in-memory form of a var-len slot.
pub fn read_var_slot(slot: &[u8]) -> PoolRef {
    debug_assert_eq!(slot.len(), VAR_LEN_SLOT_WIDTH);
    PoolRef {
        chunk: ChunkId::from_u32(u32::from_le_bytes(slot[0..4].try_into().expect("chunk id"))),
        offset: u32::from_le_bytes(slot[4..8].try_into().expect("offset")),
        len: u32::from_le_bytes(slot[8..12].try_into().expect("len")),
    }
}

/// Encodes the in-memory form of a var-len slot.
pub fn write_var_slot(slot: &mut [u8], r: PoolRef) {
    debug_assert_eq!(slot.len(), VAR_LEN_SLOT_WIDTH);
    slot[0..4].copy_from_slice(&r.chunk.as_u32().to_le_bytes());
    slot[4..8].copy_from_slice(&r.offset.to_le_bytes());
    slot[8..12].copy_from_slice(&r.len.to_le_bytes());
}

/// Decodes the wire form of a var-len slot: `(blob offset, len)`.
pub(crate) fn read_wire_var_slot(slot: &[u8]) -> (u64, u32) {
    debug_assert_eq!(slot.len(), VAR_LEN_SLOT_WIDTH);
    (
        u64::from_le_bytes(slot[0..8].try_into().expect("blob offset")),
        u32::from_le_bytes(slot[8..12].try_into().expect("len")),
    )
}

/// Encodes the wire form of a var-len slot.
pub(crate) fn write_wire_var_slot(slot: &mut [u8], offset: u64, len: u32) {
    debug_assert_eq!(slot.len(), VAR_LEN_SLOT_WIDTH);
    slot[0..8].copy_from_slice(&offset.to_le_bytes());
    slot[8..12].copy_from_slice(&len.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_repr::desc::TupleDescriptor;
    use tern_repr::ScalarType;

    #[test]
    fn var_slot_forms_round_trip_in_the_same_bytes() {
        let mut bytes = [0u8; VAR_LEN_SLOT_WIDTH];
        let r = PoolRef {
            chunk: ChunkId::from_u32(7),
            offset: 4096,
            len: 11,
        };
        write_var_slot(&mut bytes, r);
        assert_eq!(read_var_slot(&bytes), r);

        write_wire_var_slot(&mut bytes, 1 << 33, 11);
        assert_eq!(read_wire_var_slot(&bytes), (1 << 33, 11));
    }

    #[test]
    fn zeroed_slot_decodes_to_the_invalid_chunk() {
        let bytes = [0u8; VAR_LEN_SLOT_WIDTH];
        let r = read_var_slot(&bytes);
        assert_eq!(r.chunk.as_u32(), 0);
        assert_eq!(r.len, 0);
    }

    #[test]
    fn slot_views_address_the_descriptor_layout() {
        let desc = TupleDescriptor::from_types(&[ScalarType::Int32, ScalarType::Int64]);
        let mut tuple = vec![0u8; desc.byte_size()];
        slot_mut(&mut tuple, &desc.slots()[0]).copy_from_slice(&42i32.to_le_bytes());
        slot_mut(&mut tuple, &desc.slots()[1]).copy_from_slice(&(-1i64).to_le_bytes());
        assert_eq!(slot(&tuple, &desc.slots()[0]), &42i32.to_le_bytes());
        assert_eq!(slot(&tuple, &desc.slots()[1]), &(-1i64).to_le_bytes());
    }
}
