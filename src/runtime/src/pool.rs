// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Bump-allocated tuple memory.
//!
//! A [`MemPool`] holds the bytes behind a batch's tuples and var-len
//! payloads: fixed-size blocks and payloads are bump-allocated out of
//! chunks, addressed by [`PoolRef`] handles rather than pointers, and
//! released only in bulk — there is no per-tuple deallocation. Whole chunks
//! move between pools on ownership transfer without copying a byte, and
//! because chunk ids are process-unique, handles minted before a transfer
//! still resolve against the receiving pool afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Chunks start at this size and double per chunk until [`MAX_CHUNK_SIZE`].
const INITIAL_CHUNK_SIZE: usize = 4 * 1024;

const MAX_CHUNK_SIZE: usize = 1024 * 1024;

static NEXT_CHUNK_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies one chunk of pool memory for the lifetime of the process.
///
/// Id zero is never allocated: zero-filled slot bytes decode to an id that
/// no pool resolves, so an unwritten var-len slot can never alias live
/// data.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ChunkId(u32);

impl ChunkId {
    fn next() -> ChunkId {
        ChunkId(NEXT_CHUNK_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Reinterprets a slot-encoded id. The result resolves only against a
    /// pool that holds the chunk.
    pub fn from_u32(id: u32) -> ChunkId {
        ChunkId(id)
    }
}

/// A reference to `len` bytes at `offset` within chunk `chunk`.
///
/// Handles are plain data: copying one never copies the bytes it names,
/// and a handle outlives any one pool — it is valid against whichever pool
/// currently owns its chunk.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct PoolRef {
    pub chunk: ChunkId,
    pub offset: u32,
    pub len: u32,
}

#[derive(Debug)]
struct Chunk {
    id: ChunkId,
    data: Vec<u8>,
}

/// An arena holding tuple data for one owner at a time.
#[derive(Debug)]
pub struct MemPool {
    chunks: Vec<Chunk>,
    /// Chunk id to position in `chunks`.
    index: HashMap<ChunkId, usize>,
    /// Position of the chunk currently being bump-allocated into.
    current: Option<usize>,
    next_chunk_size: usize,
    total_allocated: usize,
}

impl MemPool {
    pub fn new() -> MemPool {
        MemPool {
            chunks: Vec::new(),
            index: HashMap::new(),
            current: None,
            next_chunk_size: INITIAL_CHUNK_SIZE,
            total_allocated: 0,
        }
    }

    /// Allocates `len` zeroed bytes and returns their handle.
    pub fn allocate(&mut self, len: usize) -> PoolRef {
        debug_assert!(len <= u32::MAX as usize);
        let at = match self.current {
            Some(at) if self.chunks[at].data.len() + len <= self.chunks[at].data.capacity() => at,
            _ => self.add_chunk(len),
        };
        let chunk = &mut self.chunks[at];
        let offset = chunk.data.len();
        chunk.data.resize(offset + len, 0);
        self.total_allocated += len;
        PoolRef {
            chunk: chunk.id,
            offset: offset as u32,
            len: len as u32,
        }
    }

    fn add_chunk(&mut self, min_size: usize) -> usize {
        let size = self.next_chunk_size.max(min_size.next_power_of_two());
        self.next_chunk_size = (self.next_chunk_size * 2).min(MAX_CHUNK_SIZE);
        let id = ChunkId::next();
        self.index.insert(id, self.chunks.len());
        self.chunks.push(Chunk {
            id,
            data: Vec::with_capacity(size),
        });
        self.current = Some(self.chunks.len() - 1);
        self.chunks.len() - 1
    }

    /// Resolves a handle to its bytes.
    ///
    /// Panics if this pool does not hold the handle's chunk — resolving a
    /// handle against the wrong pool is a programmer error, like indexing
    /// past the end of a slice.
    pub fn get(&self, r: PoolRef) -> &[u8] {
        let chunk = &self.chunks[self.index[&r.chunk]];
        &chunk.data[r.offset as usize..(r.offset + r.len) as usize]
    }

    /// Resolves a handle to its bytes, mutably.
    pub fn get_mut(&mut self, r: PoolRef) -> &mut [u8] {
        let chunk = &mut self.chunks[self.index[&r.chunk]];
        &mut chunk.data[r.offset as usize..(r.offset + r.len) as usize]
    }

    /// True if this pool holds the chunk `r` points into.
    pub fn contains(&self, r: PoolRef) -> bool {
        self.index.contains_key(&r.chunk)
    }

    /// Moves all of `src`'s chunks into this pool without copying bytes.
    /// Handles minted against `src` resolve against `self` afterwards;
    /// `src` is left empty.
    pub fn acquire_data(&mut self, src: &mut MemPool) {
        for chunk in src.chunks.drain(..) {
            self.index.insert(chunk.id, self.chunks.len());
            self.total_allocated += chunk.data.len();
            self.chunks.push(chunk);
        }
        src.index.clear();
        src.current = None;
        src.total_allocated = 0;
    }

    /// Total bytes handed out by this pool's chunks.
    pub fn total_allocated_bytes(&self) -> usize {
        self.total_allocated
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The pool's chunks in allocation order.
    pub(crate) fn chunks(&self) -> impl Iterator<Item = (ChunkId, &[u8])> {
        self.chunks.iter().map(|c| (c.id, c.data.as_slice()))
    }

    /// Consumes the pool, yielding each chunk's bytes in allocation order.
    pub(crate) fn into_chunk_data(self) -> Vec<Vec<u8>> {
        self.chunks.into_iter().map(|c| c.data).collect()
    }
}

impl Default for MemPool {
    fn default() -> MemPool {
        MemPool::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_zeroed_and_disjoint() {
        let mut pool = MemPool::new();
        let a = pool.allocate(16);
        pool.get_mut(a).fill(0xaa);
        let b = pool.allocate(16);
        assert!(pool.get(b).iter().all(|&byte| byte == 0));
        assert_eq!(pool.get(a), &[0xaa; 16]);
        assert_eq!(pool.total_allocated_bytes(), 32);
    }

    #[test]
    fn handles_survive_chunk_growth() {
        let mut pool = MemPool::new();
        let first = pool.allocate(8);
        pool.get_mut(first).copy_from_slice(b"abcdefgh");
        // Force several new chunks.
        for _ in 0..64 {
            pool.allocate(INITIAL_CHUNK_SIZE);
        }
        assert_eq!(pool.get(first), b"abcdefgh");
    }

    #[test]
    fn oversized_allocation_gets_its_own_chunk() {
        let mut pool = MemPool::new();
        let big = pool.allocate(3 * MAX_CHUNK_SIZE);
        assert_eq!(pool.get(big).len(), 3 * MAX_CHUNK_SIZE);
    }

    #[test]
    fn acquire_data_moves_chunks() {
        let mut src = MemPool::new();
        let r = src.allocate(5);
        src.get_mut(r).copy_from_slice(b"hello");

        let mut dest = MemPool::new();
        dest.acquire_data(&mut src);

        assert!(src.is_empty());
        assert_eq!(src.total_allocated_bytes(), 0);
        assert!(!src.contains(r));
        assert!(dest.contains(r));
        assert_eq!(dest.get(r), b"hello");
        assert_eq!(dest.total_allocated_bytes(), 5);
    }

    #[test]
    fn source_pool_is_reusable_after_acquire() {
        let mut src = MemPool::new();
        src.allocate(5);
        let mut dest = MemPool::new();
        dest.acquire_data(&mut src);

        let r = src.allocate(3);
        src.get_mut(r).copy_from_slice(b"new");
        assert_eq!(src.get(r), b"new");
    }
}
