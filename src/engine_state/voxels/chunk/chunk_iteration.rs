//! # Chunk Iteration Module
//!
//! This module provides an iterator over the non-air blocks of a chunk.
//!
//! ## Memory-Aware Iteration
//!
//! The `ChunkBlockIterator` walks the chunk's occupancy bit vector rather than
//! the dense block array, so runs of air are skipped a machine word at a time.
//! Terrain chunks are mostly air above the surface and mostly stone below it,
//! and the mesher only cares about the former's boundary, so this is where most
//! of the meshing time is saved.

use bitvec::{order::Lsb0, slice::IterOnes};
use cgmath::Point3;

use crate::engine_state::voxels::block::block_type::BlockType;

use super::Chunk;

/// An iterator over all non-air blocks in a chunk, in block-array order.
///
/// Yields the local position of each block together with its type.
pub struct ChunkBlockIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Set bits of the occupancy vector still to visit
    occupied: IterOnes<'a, usize, Lsb0>,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates a new `ChunkBlockIterator` positioned before the first non-air block.
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkBlockIterator {
            chunk_ref,
            occupied: chunk_ref.occupancy().iter_ones(),
        }
    }
}

impl Iterator for ChunkBlockIterator<'_> {
    type Item = (Point3<usize>, BlockType);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.occupied.next()?;
        Some((Chunk::local_from_index(index), self.chunk_ref.blocks()[index]))
    }
}
