// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The transportable form of a row batch.
//!
//! A [`WireRowBatch`] is self-describing and pointer-free: a row count, one
//! byte offset per tuple reference (with a sentinel for NULL tuples), and a
//! single contiguous blob holding every tuple's fixed bytes and var-len
//! payloads, referenced by offset rather than address. The blob may be
//! LZ4-compressed, in which case the declared uncompressed size is
//! validated on receipt — a mismatch is corruption, never silently
//! tolerated.
//!
//! Serialization is the one place in the runtime forced to either copy
//! (distinct tuples gathered into one buffer) or rewrite in place (the
//! self-contained case, where the pool's chunks already are the data and
//! only the var-len slots need their handles turned into blob offsets).
//! Both paths are deliberate; see [`RowBatch::serialize`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use tern_repr::desc::RowSchema;
use tern_repr::scalar::VAR_LEN_SLOT_WIDTH;

use crate::pool::{ChunkId, MemPool, PoolRef};
use crate::row_batch::{RowBatch, TupleRef};
use crate::tuple;

/// Offset recorded for a NULL tuple.
pub const NULL_TUPLE_OFFSET: i64 = -1;

/// Blobs smaller than this never compress well enough to pay for the
/// round-trip.
const MIN_COMPRESS_SIZE: usize = 64;

/// Compression applied to [`WireRowBatch::tuple_data`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Codec {
    None,
    Lz4,
}

/// A serialized row batch: fully self-describing, pointer-free, and safe to
/// ship between processes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireRowBatch {
    pub num_rows: usize,
    pub num_tuples_per_row: usize,
    /// One entry per row per tuple position: the tuple's byte offset in the
    /// uncompressed blob, or [`NULL_TUPLE_OFFSET`].
    pub tuple_offsets: Vec<i64>,
    pub codec: Codec,
    /// Size of the blob before compression; validated on receipt.
    pub uncompressed_size: usize,
    pub tuple_data: Vec<u8>,
}

/// Corruption detected while reconstructing a batch from the wire.
#[derive(Debug, Error)]
pub enum WireBatchError {
    #[error("decompressed size {actual} does not match declared size {declared}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },
    #[error("corrupt compressed tuple data: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),
    #[error("offset {offset}..+{len} out of range for {available}-byte tuple data")]
    OffsetOutOfRange {
        offset: i64,
        len: usize,
        available: usize,
    },
    #[error("malformed row batch: {0}")]
    Malformed(String),
}

impl RowBatch {
    /// Converts this batch's committed rows into a wire message, consuming
    /// the batch. An in-flight row, if any, is ignored.
    ///
    /// Tuple references become byte offsets into one contiguous blob
    /// holding a deduplicated copy of each distinct tuple's fixed bytes and
    /// var-len payloads. A self-contained batch skips the per-tuple copy:
    /// its pool chunks already hold exactly the live data, so var-len slots
    /// are rewritten in place and the chunks are moved out wholesale.
    ///
    /// With `Codec::Lz4` the blob is compressed, and kept compressed only
    /// when that actually shrinks it.
    pub fn serialize(mut self, codec: Codec) -> WireRowBatch {
        let (tuple_offsets, blob) = if self.is_self_contained {
            self.convert_in_place()
        } else {
            self.deep_copy()
        };
        let uncompressed_size = blob.len();
        let (codec, tuple_data) = match codec {
            Codec::Lz4 if blob.len() >= MIN_COMPRESS_SIZE => {
                let compressed = lz4_flex::compress(&blob);
                if compressed.len() < blob.len() {
                    (Codec::Lz4, compressed)
                } else {
                    (Codec::None, blob)
                }
            }
            _ => (Codec::None, blob),
        };
        trace!(
            num_rows = self.num_rows,
            uncompressed_size,
            transmitted_size = tuple_data.len(),
            ?codec,
            "serialized row batch",
        );
        WireRowBatch {
            num_rows: self.num_rows,
            num_tuples_per_row: self.num_tuples_per_row,
            tuple_offsets,
            codec,
            uncompressed_size,
            tuple_data,
        }
    }

    /// Gathers each distinct referenced tuple into a fresh blob, rewriting
    /// var-len slots in the copy.
    fn deep_copy(&self) -> (Vec<i64>, Vec<u8>) {
        let mut blob = Vec::with_capacity(self.pool.total_allocated_bytes());
        let mut offsets = Vec::with_capacity(self.num_rows * self.num_tuples_per_row);
        let mut seen: HashMap<TupleRef, i64> = HashMap::new();
        for row_idx in 0..self.num_rows {
            for pos in 0..self.num_tuples_per_row {
                let Some(t) = self.tuple_ptrs[row_idx * self.num_tuples_per_row + pos] else {
                    offsets.push(NULL_TUPLE_OFFSET);
                    continue;
                };
                if let Some(&off) = seen.get(&t) {
                    offsets.push(off);
                    continue;
                }
                let desc = &self.schema.tuples()[pos];
                let start = blob.len();
                seen.insert(t, start as i64);
                offsets.push(start as i64);
                blob.extend_from_slice(self.pool.get(t));
                for slot in desc.slots() {
                    if !slot.col_type.is_var_len() {
                        continue;
                    }
                    let tuple_copy = &blob[start..start + desc.byte_size()];
                    if slot.null_indicator.is_set(tuple_copy) {
                        continue;
                    }
                    let slot_at = start + slot.tuple_offset;
                    let r = tuple::read_var_slot(&blob[slot_at..slot_at + VAR_LEN_SLOT_WIDTH]);
                    let payload_off = blob.len() as u64;
                    blob.extend_from_slice(self.pool.get(r));
                    tuple::write_wire_var_slot(
                        &mut blob[slot_at..slot_at + VAR_LEN_SLOT_WIDTH],
                        payload_off,
                        r.len,
                    );
                }
            }
        }
        (offsets, blob)
    }

    /// Rewrites var-len slots inside the pool itself, then moves the pool's
    /// chunks out as the blob. Requires the producer's self-containment
    /// assertion to hold; a reference into a foreign pool panics here.
    fn convert_in_place(&mut self) -> (Vec<i64>, Vec<u8>) {
        let mut base: HashMap<ChunkId, u64> = HashMap::new();
        let mut total = 0u64;
        for (id, data) in self.pool.chunks() {
            base.insert(id, total);
            total += data.len() as u64;
        }

        let mut offsets = Vec::with_capacity(self.num_rows * self.num_tuples_per_row);
        let mut rewritten: HashSet<TupleRef> = HashSet::new();
        for row_idx in 0..self.num_rows {
            for pos in 0..self.num_tuples_per_row {
                let Some(t) = self.tuple_ptrs[row_idx * self.num_tuples_per_row + pos] else {
                    offsets.push(NULL_TUPLE_OFFSET);
                    continue;
                };
                offsets.push((base[&t.chunk] + u64::from(t.offset)) as i64);
                if !rewritten.insert(t) {
                    continue;
                }
                let desc = &self.schema.tuples()[pos];
                for slot in desc.slots() {
                    if !slot.col_type.is_var_len() {
                        continue;
                    }
                    if slot.null_indicator.is_set(self.pool.get(t)) {
                        continue;
                    }
                    let slot_bytes = tuple::slot_mut(self.pool.get_mut(t), slot);
                    let r = tuple::read_var_slot(slot_bytes);
                    let payload_off = base[&r.chunk] + u64::from(r.offset);
                    tuple::write_wire_var_slot(slot_bytes, payload_off, r.len);
                }
            }
        }

        let pool = std::mem::replace(&mut self.pool, MemPool::new());
        let mut chunks = pool.into_chunk_data();
        let blob = if chunks.len() == 1 {
            chunks.pop().unwrap_or_default()
        } else {
            let mut blob = Vec::with_capacity(total as usize);
            for chunk in &chunks {
                blob.extend_from_slice(chunk);
            }
            blob
        };
        (offsets, blob)
    }

    /// Reconstructs an in-memory batch from a wire message, copying the
    /// blob into the new batch's own pool and converting transmitted
    /// offsets back into handles. The result is self-contained; `wire` may
    /// be discarded once this returns.
    pub fn from_wire(
        schema: Arc<RowSchema>,
        wire: &WireRowBatch,
    ) -> Result<RowBatch, WireBatchError> {
        if wire.num_tuples_per_row != schema.tuples_per_row() {
            return Err(WireBatchError::Malformed(format!(
                "batch has {} tuples per row, schema has {}",
                wire.num_tuples_per_row,
                schema.tuples_per_row(),
            )));
        }
        if wire.tuple_offsets.len() != wire.num_rows * wire.num_tuples_per_row {
            return Err(WireBatchError::Malformed(format!(
                "{} tuple offsets for {} rows of {} tuples",
                wire.tuple_offsets.len(),
                wire.num_rows,
                wire.num_tuples_per_row,
            )));
        }

        let blob: Vec<u8> = match wire.codec {
            Codec::None => {
                if wire.tuple_data.len() != wire.uncompressed_size {
                    return Err(WireBatchError::UncompressedSizeMismatch {
                        declared: wire.uncompressed_size,
                        actual: wire.tuple_data.len(),
                    });
                }
                wire.tuple_data.clone()
            }
            Codec::Lz4 => {
                let blob = lz4_flex::decompress(&wire.tuple_data, wire.uncompressed_size)?;
                if blob.len() != wire.uncompressed_size {
                    return Err(WireBatchError::UncompressedSizeMismatch {
                        declared: wire.uncompressed_size,
                        actual: blob.len(),
                    });
                }
                blob
            }
        };
        if blob.len() > u32::MAX as usize {
            return Err(WireBatchError::Malformed(format!(
                "{}-byte tuple data exceeds the addressable pool range",
                blob.len(),
            )));
        }

        let capacity = wire.num_rows.max(1);
        let mut batch = RowBatch::new(schema, capacity);
        let mut pool = MemPool::new();
        let blob_ref = pool.allocate(blob.len());
        pool.get_mut(blob_ref).copy_from_slice(&blob);
        let chunk = blob_ref.chunk;

        let mut converted: HashSet<i64> = HashSet::new();
        for (i, &tuple_off) in wire.tuple_offsets.iter().enumerate() {
            if tuple_off == NULL_TUPLE_OFFSET {
                continue;
            }
            let pos = i % wire.num_tuples_per_row;
            let desc = &batch.schema.tuples()[pos];
            let byte_size = desc.byte_size();
            let in_range = tuple_off >= 0
                && (tuple_off as u64)
                    .checked_add(byte_size as u64)
                    .is_some_and(|end| end <= blob.len() as u64);
            if !in_range {
                return Err(WireBatchError::OffsetOutOfRange {
                    offset: tuple_off,
                    len: byte_size,
                    available: blob.len(),
                });
            }
            let t = TupleRef {
                chunk,
                offset: blob_ref.offset + tuple_off as u32,
                len: byte_size as u32,
            };
            if converted.insert(tuple_off) {
                for slot in desc.slots() {
                    if !slot.col_type.is_var_len() {
                        continue;
                    }
                    if slot.null_indicator.is_set(pool.get(t)) {
                        continue;
                    }
                    let slot_bytes = tuple::slot_mut(pool.get_mut(t), slot);
                    let (payload_off, len) = tuple::read_wire_var_slot(slot_bytes);
                    if payload_off.checked_add(u64::from(len)).map_or(true, |end| {
                        end > blob.len() as u64
                    }) {
                        return Err(WireBatchError::OffsetOutOfRange {
                            offset: payload_off as i64,
                            len: len as usize,
                            available: blob.len(),
                        });
                    }
                    let payload = PoolRef {
                        chunk,
                        offset: blob_ref.offset + payload_off as u32,
                        len,
                    };
                    tuple::write_var_slot(tuple::slot_mut(pool.get_mut(t), slot), payload);
                }
            }
            batch.tuple_ptrs[i] = Some(t);
        }
        batch.num_rows = wire.num_rows;
        batch.pool = pool;
        batch.is_self_contained = true;
        trace!(
            num_rows = batch.num_rows,
            blob_size = blob.len(),
            "reconstructed row batch from wire",
        );
        Ok(batch)
    }
}
