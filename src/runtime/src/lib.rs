// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The in-memory row runtime for Tern's execution engine.
//!
//! Operators exchange data in [`RowBatch`]es: bounded containers of rows,
//! each row an array of references to fixed-size tuples whose bytes live in
//! a [`MemPool`] owned by the batch. A batch is filled by one operator,
//! then consumed locally, handed off by transferring its pool, or
//! serialized into a [`WireRowBatch`] for transport to another node and
//! reconstructed there.
//!
//! Batches are single-owner and never internally synchronized; ownership
//! transfer is the hand-off mechanism.

pub mod pool;
pub mod row_batch;
pub mod tuple;
pub mod wire;

pub use crate::pool::{ChunkId, MemPool, PoolRef};
pub use crate::row_batch::{RowBatch, TupleRef};
pub use crate::wire::{Codec, WireBatchError, WireRowBatch};
