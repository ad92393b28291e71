// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Bounded batches of rows exchanged between execution operators.

use std::sync::Arc;

use tern_repr::desc::{RowSchema, SlotDescriptor};

use crate::pool::{MemPool, PoolRef};
use crate::tuple;

/// A reference to one tuple's fixed-size block in a pool.
pub type TupleRef = PoolRef;

/// A batch of rows, each composed of one tuple reference per descriptor in
/// the batch's schema.
///
/// The maximum number of rows is fixed at construction; the owner adds rows
/// up to that capacity, committing each one before starting the next. Tuple
/// bytes and var-len payloads live in the batch's [`MemPool`] and are
/// addressed by [`TupleRef`] handles, so a committed row stays valid until
/// the batch is [`reset`], transferred, or serialized.
///
/// A batch is single-owner: it is filled and handed off by one
/// thread/stage at a time, and [`transfer_tuple_data`] is the hand-off.
///
/// [`reset`]: RowBatch::reset
/// [`transfer_tuple_data`]: RowBatch::transfer_tuple_data
#[derive(Debug)]
pub struct RowBatch {
    pub(crate) schema: Arc<RowSchema>,
    /// If true, the last row hasn't been committed yet.
    pub(crate) has_in_flight_row: bool,
    pub(crate) is_self_contained: bool,
    /// Count of committed rows.
    pub(crate) num_rows: usize,
    pub(crate) capacity: usize,
    pub(crate) num_tuples_per_row: usize,
    /// `capacity * num_tuples_per_row` reference slots, sized once.
    pub(crate) tuple_ptrs: Box<[Option<TupleRef>]>,
    pub(crate) pool: MemPool,
}

impl RowBatch {
    /// Creates a batch for up to `capacity` rows of the tuples described by
    /// `schema`. The schema must be non-empty and the capacity positive.
    pub fn new(schema: Arc<RowSchema>, capacity: usize) -> RowBatch {
        debug_assert!(!schema.tuples().is_empty());
        debug_assert!(capacity > 0);
        let num_tuples_per_row = schema.tuples_per_row();
        RowBatch {
            schema,
            has_in_flight_row: false,
            is_self_contained: false,
            num_rows: 0,
            capacity,
            num_tuples_per_row,
            tuple_ptrs: vec![None; capacity * num_tuples_per_row].into_boxed_slice(),
            pool: MemPool::new(),
        }
    }

    /// Starts a row of NULL tuples after the last committed row and returns
    /// its index, or `None` if the batch is full.
    ///
    /// Two consecutive calls without a [`commit_last_row`] between them
    /// have the same effect as a single call: the same index comes back and
    /// the same reference slots are re-cleared.
    ///
    /// [`commit_last_row`]: RowBatch::commit_last_row
    pub fn add_row(&mut self) -> Option<usize> {
        if self.num_rows == self.capacity {
            return None;
        }
        self.has_in_flight_row = true;
        let start = self.num_rows * self.num_tuples_per_row;
        self.tuple_ptrs[start..start + self.num_tuples_per_row].fill(None);
        Some(self.num_rows)
    }

    /// Commits the in-flight row started by [`add_row`].
    ///
    /// [`add_row`]: RowBatch::add_row
    pub fn commit_last_row(&mut self) {
        debug_assert!(self.has_in_flight_row);
        debug_assert!(self.num_rows < self.capacity);
        self.num_rows += 1;
        self.has_in_flight_row = false;
    }

    /// True if the batch has reached capacity.
    pub fn is_full(&self) -> bool {
        self.num_rows == self.capacity
    }

    /// True if this batch ends its producer's stream: a short or empty
    /// batch never needs another producer call to refill it.
    pub fn eos(&self) -> bool {
        self.num_rows == 0 || self.num_rows < self.capacity
    }

    /// The tuple references of row `idx`, which must be committed or
    /// in-flight.
    pub fn row(&self, idx: usize) -> &[Option<TupleRef>] {
        debug_assert!(idx < self.num_rows + usize::from(self.has_in_flight_row));
        &self.tuple_ptrs[idx * self.num_tuples_per_row..][..self.num_tuples_per_row]
    }

    /// The tuple references of row `idx`, mutably.
    pub fn row_mut(&mut self, idx: usize) -> &mut [Option<TupleRef>] {
        debug_assert!(idx < self.num_rows + usize::from(self.has_in_flight_row));
        &mut self.tuple_ptrs[idx * self.num_tuples_per_row..][..self.num_tuples_per_row]
    }

    /// Stores a tuple reference at position `pos` of row `row`.
    pub fn set_tuple(&mut self, row: usize, pos: usize, t: Option<TupleRef>) {
        debug_assert!(pos < self.num_tuples_per_row);
        self.row_mut(row)[pos] = t;
    }

    /// Copies row `src`'s tuple references over row `dest`'s.
    pub fn copy_row(&mut self, src: usize, dest: usize) {
        let refs: Vec<Option<TupleRef>> = self.row(src).to_vec();
        self.row_mut(dest).copy_from_slice(&refs);
    }

    /// Clears row `idx` back to all-NULL tuples.
    pub fn clear_row(&mut self, idx: usize) {
        self.row_mut(idx).fill(None);
    }

    /// Clears committed and in-flight state and replaces the pool with a
    /// fresh, empty one. Handles into the old pool are invalid afterwards.
    /// Capacity is unchanged.
    pub fn reset(&mut self) {
        self.num_rows = 0;
        self.has_in_flight_row = false;
        self.is_self_contained = false;
        self.pool = MemPool::new();
    }

    /// Moves all pool-held memory into `dest`'s pool without copying bytes,
    /// then resets this batch. Rows committed before the call must not be
    /// read from this batch again; the only safe continuation here is
    /// refilling from [`add_row`].
    ///
    /// [`add_row`]: RowBatch::add_row
    pub fn transfer_tuple_data(&mut self, dest: &mut RowBatch) {
        dest.pool.acquire_data(&mut self.pool);
        self.reset();
    }

    /// The number of committed rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn schema(&self) -> &Arc<RowSchema> {
        &self.schema
    }

    /// A self-contained batch holds every byte reachable from its committed
    /// tuples in its own pool, and nothing else. The producer asserts this
    /// — the batch cannot derive it on its own — and serialization trusts
    /// it to choose the in-place path.
    pub fn is_self_contained(&self) -> bool {
        self.is_self_contained
    }

    pub fn set_is_self_contained(&mut self, v: bool) {
        self.is_self_contained = v;
    }

    /// The pool holding this batch's tuple data, for producers that
    /// allocate into it directly or attach side pools via
    /// [`MemPool::acquire_data`].
    pub fn tuple_data_pool(&mut self) -> &mut MemPool {
        &mut self.pool
    }

    /// Allocates a zeroed tuple block laid out for row position `pos`.
    ///
    /// A zeroed tuple has every null bit clear and every var-len slot
    /// pointing at the invalid chunk; callers set null bits or write
    /// payloads before committing the row.
    pub fn alloc_tuple(&mut self, pos: usize) -> TupleRef {
        let byte_size = self.schema.tuples()[pos].byte_size();
        self.pool.allocate(byte_size)
    }

    /// The fixed bytes of tuple `t`.
    pub fn tuple_data(&self, t: TupleRef) -> &[u8] {
        self.pool.get(t)
    }

    /// The fixed bytes of tuple `t`, mutably.
    pub fn tuple_data_mut(&mut self, t: TupleRef) -> &mut [u8] {
        self.pool.get_mut(t)
    }

    /// Copies `payload` into the pool and stores its handle in the var-len
    /// `slot` of tuple `t`.
    pub fn set_var_len(&mut self, t: TupleRef, slot: &SlotDescriptor, payload: &[u8]) {
        debug_assert!(slot.col_type.is_var_len());
        let r = self.pool.allocate(payload.len());
        self.pool.get_mut(r).copy_from_slice(payload);
        tuple::write_var_slot(tuple::slot_mut(self.pool.get_mut(t), slot), r);
    }

    /// Resolves the payload referenced by the var-len `slot` of tuple `t`.
    pub fn var_len(&self, t: TupleRef, slot: &SlotDescriptor) -> &[u8] {
        debug_assert!(slot.col_type.is_var_len());
        let r = tuple::read_var_slot(tuple::slot(self.pool.get(t), slot));
        self.pool.get(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_repr::desc::TupleDescriptor;
    use tern_repr::ScalarType;

    fn schema() -> Arc<RowSchema> {
        Arc::new(RowSchema::new(vec![TupleDescriptor::from_types(&[
            ScalarType::Int64,
            ScalarType::String,
        ])]))
    }

    #[test]
    fn add_row_is_idempotent_without_commit() {
        let mut batch = RowBatch::new(schema(), 4);
        let first = batch.add_row();
        assert_eq!(first, Some(0));
        assert_eq!(batch.num_rows(), 0);
        let again = batch.add_row();
        assert_eq!(again, first);
        assert_eq!(batch.num_rows(), 0);

        batch.commit_last_row();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.add_row(), Some(1));
    }

    #[test]
    fn add_row_reclears_the_in_flight_row() {
        let mut batch = RowBatch::new(schema(), 4);
        let row = batch.add_row().unwrap();
        let t = batch.alloc_tuple(0);
        batch.set_tuple(row, 0, Some(t));
        assert!(batch.row(row)[0].is_some());
        // Abandon the row; the slot comes back cleared.
        let row = batch.add_row().unwrap();
        assert!(batch.row(row)[0].is_none());
    }

    #[test]
    fn add_row_fails_at_capacity() {
        let mut batch = RowBatch::new(schema(), 2);
        for _ in 0..2 {
            batch.add_row().unwrap();
            batch.commit_last_row();
        }
        assert!(batch.is_full());
        assert_eq!(batch.add_row(), None);
    }

    #[test]
    fn eos_on_short_or_empty_batches() {
        let mut batch = RowBatch::new(schema(), 2);
        assert!(batch.eos());
        batch.add_row().unwrap();
        batch.commit_last_row();
        assert!(batch.eos());
        batch.add_row().unwrap();
        batch.commit_last_row();
        assert!(!batch.eos());
    }

    #[test]
    fn var_len_round_trip() {
        let mut batch = RowBatch::new(schema(), 1);
        let row = batch.add_row().unwrap();
        let t = batch.alloc_tuple(0);
        let desc = Arc::clone(batch.schema());
        let slot = &desc.tuples()[0].slots()[1];
        batch.set_var_len(t, slot, b"twelve chars");
        batch.set_tuple(row, 0, Some(t));
        batch.commit_last_row();
        assert_eq!(batch.var_len(t, slot), b"twelve chars");
    }

    #[test]
    fn reset_clears_rows_and_pool() {
        let mut batch = RowBatch::new(schema(), 2);
        batch.add_row().unwrap();
        batch.alloc_tuple(0);
        batch.commit_last_row();
        batch.set_is_self_contained(true);

        batch.reset();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.capacity(), 2);
        assert!(!batch.is_self_contained());
        assert!(batch.tuple_data_pool().is_empty());
    }

    #[test]
    fn transfer_empties_source_and_fills_destination() {
        let schema = schema();
        let mut src = RowBatch::new(Arc::clone(&schema), 2);
        let row = src.add_row().unwrap();
        let t = src.alloc_tuple(0);
        let slot = &schema.tuples()[0].slots()[1];
        src.set_var_len(t, slot, b"payload bytes");
        src.set_tuple(row, 0, Some(t));
        src.commit_last_row();

        let mut dest = RowBatch::new(Arc::clone(&schema), 2);
        src.transfer_tuple_data(&mut dest);

        assert_eq!(src.num_rows(), 0);
        assert!(src.tuple_data_pool().is_empty());
        // The destination pool now resolves the old handles.
        assert_eq!(dest.var_len(t, slot), b"payload bytes");
    }

    #[test]
    fn copy_and_clear_rows() {
        let mut batch = RowBatch::new(schema(), 2);
        let r0 = batch.add_row().unwrap();
        let t = batch.alloc_tuple(0);
        batch.set_tuple(r0, 0, Some(t));
        batch.commit_last_row();
        let r1 = batch.add_row().unwrap();
        batch.commit_last_row();

        batch.copy_row(r0, r1);
        assert_eq!(batch.row(r1)[0], Some(t));
        batch.clear_row(r0);
        assert!(batch.row(r0)[0].is_none());
    }
}
