//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a 32x32x32 block array plus the
//! face lists derived from it and the flags that track where the chunk is in
//! its load/mesh/bake lifecycle.
//!
//! ## Storage
//!
//! Blocks are stored densely, one [`BlockType`] byte per cell, indexed
//! `x + y * CHUNK_DIMENSION + z * CHUNK_PLANE_SIZE`. Next to the dense array
//! the chunk keeps an occupancy bit vector (1 bit per cell, set for every
//! non-air cell) which the mesher walks to skip air quickly.
//!
//! ## Lifecycle
//!
//! 1. Reserved by the grid: every cell is [`BlockType::INVALID`].
//! 2. Filled once by the world generator, then edits are replayed on top.
//! 3. Meshed: `mesh_data_ready` is set once the face lists are current.
//! 4. Baked: `mesh_baked` is set once the face lists were handed to the renderer.
//!
//! Any block change inside the chunk (or across a touching face) calls
//! [`Chunk::invalidate_mesh`], sending it back to step 2's end state.

use bitvec::prelude::BitVec;
use cgmath::Point3;

use super::block::block_type::BlockType;
use crate::engine_state::rendering::meshing::FaceRecord;

pub mod chunk_iteration;
pub mod coordinates;

/// The dimension (width, height, depth) of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 32;
/// The number of blocks in a single 2D plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of blocks in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_DIMENSION;

/// Represents a 32x32x32 collection of voxel blocks in the world.
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: Point3<i32>,

    blocks: Box<[BlockType]>,

    /// One bit per cell, set where the cell holds anything other than air or
    /// the sentinel. Kept in sync with `blocks` by every write.
    occupancy: BitVec,

    /// Packed faces of opaque blocks, drawn in the first pass.
    pub opaque_faces: Vec<FaceRecord>,
    /// Packed faces of translucent blocks, drawn after all opaque geometry.
    pub translucent_faces: Vec<FaceRecord>,

    /// Set once the world generator has filled the block array.
    pub generated: bool,
    /// Set when the face lists reflect the current blocks.
    pub mesh_data_ready: bool,
    /// Set when the face lists have been uploaded to the render backend.
    pub mesh_baked: bool,
    /// Set while the chunk is inside the render window around the viewpoint.
    pub in_render: bool,
}

impl Chunk {
    /// Creates a placeholder chunk whose every cell is the `INVALID` sentinel.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates of the new chunk
    pub fn new(position: Point3<i32>) -> Self {
        Chunk {
            position,
            blocks: vec![BlockType::INVALID; CHUNK_SIZE as usize].into_boxed_slice(),
            occupancy: BitVec::repeat(false, CHUNK_SIZE as usize),
            opaque_faces: Vec::new(),
            translucent_faces: Vec::new(),
            generated: false,
            mesh_data_ready: false,
            mesh_baked: false,
            in_render: false,
        }
    }

    /// Index of a local cell in the dense block array.
    #[inline]
    pub fn index(x: usize, y: usize, z: usize) -> usize {
        x + y * CHUNK_DIMENSION as usize + z * CHUNK_PLANE_SIZE as usize
    }

    /// Inverse of [`Chunk::index`].
    #[inline]
    pub fn local_from_index(index: usize) -> Point3<usize> {
        let dimension = CHUNK_DIMENSION as usize;
        Point3::new(
            index % dimension,
            (index / dimension) % dimension,
            index / (dimension * dimension),
        )
    }

    /// Whether a local coordinate lies inside the chunk.
    #[inline]
    pub fn contains_local(x: i32, y: i32, z: i32) -> bool {
        (0..CHUNK_DIMENSION).contains(&x)
            && (0..CHUNK_DIMENSION).contains(&y)
            && (0..CHUNK_DIMENSION).contains(&z)
    }

    /// Bounds-checked block lookup.
    ///
    /// # Returns
    /// The block at the local coordinates, or [`BlockType::INVALID`] when any
    /// coordinate falls outside `0..CHUNK_DIMENSION`.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        if Self::contains_local(x, y, z) {
            self.blocks[Self::index(x as usize, y as usize, z as usize)]
        } else {
            BlockType::INVALID
        }
    }

    /// Block lookup for callers that already established the bounds.
    ///
    /// Coordinates must be in `0..CHUNK_DIMENSION`; this is only checked in
    /// debug builds.
    #[inline]
    pub fn get_block_unchecked(&self, x: usize, y: usize, z: usize) -> BlockType {
        debug_assert!(
            Self::contains_local(x as i32, y as i32, z as i32),
            "local block ({x}, {y}, {z}) outside chunk"
        );
        self.blocks[Self::index(x, y, z)]
    }

    /// Overwrites one cell.
    ///
    /// Does not touch the mesh flags; block edits go through the chunk grid,
    /// which also invalidates neighbours.
    ///
    /// # Returns
    /// The previous block, or `None` if the coordinates are out of bounds.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block_type: BlockType) -> Option<BlockType> {
        if !Self::contains_local(x, y, z) {
            return None;
        }
        let index = Self::index(x as usize, y as usize, z as usize);
        let previous = std::mem::replace(&mut self.blocks[index], block_type);
        self.occupancy.set(index, Self::occupies(block_type));
        Some(previous)
    }

    /// Replaces the whole block array with freshly generated contents and marks
    /// the chunk generated.
    ///
    /// # Panics
    /// Panics if `blocks` does not hold exactly `CHUNK_SIZE` cells.
    pub fn fill(&mut self, blocks: Box<[BlockType]>) {
        assert_eq!(blocks.len(), CHUNK_SIZE as usize, "chunk block array has the wrong size");
        for (index, block_type) in blocks.iter().enumerate() {
            self.occupancy.set(index, Self::occupies(*block_type));
        }
        self.blocks = blocks;
        self.generated = true;
        self.invalidate_mesh();
    }

    /// Read-only view of the dense block array.
    pub fn blocks(&self) -> &[BlockType] {
        &self.blocks
    }

    /// Occupancy bits, one per cell in block-array order.
    pub fn occupancy(&self) -> &BitVec {
        &self.occupancy
    }

    /// Number of non-air cells.
    pub fn occupied_count(&self) -> usize {
        self.occupancy.count_ones()
    }

    /// Stores freshly built face lists.
    pub fn set_mesh(&mut self, opaque_faces: Vec<FaceRecord>, translucent_faces: Vec<FaceRecord>) {
        self.opaque_faces = opaque_faces;
        self.translucent_faces = translucent_faces;
        self.mesh_data_ready = true;
    }

    /// Marks the face lists stale so the next bake rebuilds and re-uploads them.
    pub fn invalidate_mesh(&mut self) {
        self.mesh_data_ready = false;
        self.mesh_baked = false;
    }

    /// World block position of this chunk's minimum corner.
    pub fn origin(&self) -> Point3<i32> {
        coordinates::chunk_origin(self.position)
    }

    fn occupies(block_type: BlockType) -> bool {
        !matches!(block_type, BlockType::AIR | BlockType::INVALID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chunk_is_all_sentinel() {
        let chunk = Chunk::new(Point3::new(1, 2, 3));
        assert!(chunk.blocks().iter().all(|b| *b == BlockType::INVALID));
        assert_eq!(chunk.occupied_count(), 0);
        assert!(!chunk.generated && !chunk.mesh_data_ready && !chunk.mesh_baked && !chunk.in_render);
        assert_eq!(chunk.origin(), Point3::new(32, 64, 96));
    }

    #[test]
    fn safe_lookup_returns_sentinel_out_of_bounds() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_block(0, 0, 0, BlockType::STONE);
        assert_eq!(chunk.get_block(0, 0, 0), BlockType::STONE);
        assert_eq!(chunk.get_block(-1, 0, 0), BlockType::INVALID);
        assert_eq!(chunk.get_block(0, CHUNK_DIMENSION, 0), BlockType::INVALID);
        assert_eq!(chunk.set_block(0, 0, 32, BlockType::STONE), None);
    }

    #[test]
    fn set_block_tracks_occupancy() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        assert_eq!(chunk.set_block(4, 5, 6, BlockType::WATER), Some(BlockType::INVALID));
        assert_eq!(chunk.occupied_count(), 1);
        assert_eq!(chunk.set_block(4, 5, 6, BlockType::AIR), Some(BlockType::WATER));
        assert_eq!(chunk.occupied_count(), 0);
    }

    #[test]
    fn index_round_trips() {
        for (x, y, z) in [(0, 0, 0), (31, 0, 0), (0, 31, 0), (0, 0, 31), (7, 19, 23)] {
            let index = Chunk::index(x, y, z);
            assert_eq!(Chunk::local_from_index(index), Point3::new(x, y, z));
        }
        assert_eq!(Chunk::index(1, 1, 1), 1 + 32 + 1024);
    }

    #[test]
    fn fill_marks_generated_and_stale() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.mesh_baked = true;
        let mut blocks = vec![BlockType::AIR; CHUNK_SIZE as usize];
        blocks[Chunk::index(1, 2, 3)] = BlockType::SAND;
        chunk.fill(blocks.into_boxed_slice());

        assert!(chunk.generated);
        assert!(!chunk.mesh_baked);
        assert_eq!(chunk.occupied_count(), 1);
        assert_eq!(chunk.get_block_unchecked(1, 2, 3), BlockType::SAND);
    }
}
