//! Face-culling mesher.
//!
//! Turns a chunk's block array into two lists of packed [`FaceRecord`]s: one for
//! opaque blocks and one for translucent blocks, which the renderer draws in a
//! second pass.
//!
//! # Culling rules
//! For every non-air block and each of its six faces, the block on the other
//! side of the face is looked up (inside the chunk, or in the neighbouring chunk
//! when the face lies on the chunk boundary). The face is emitted when:
//! - the neighbouring chunk is not available (not resident or not generated yet),
//! - the neighbour is air,
//! - or the block is opaque and the neighbour is translucent.
//!
//! The downward face of the lowest layer of the world is never emitted, since
//! nothing can look at it from below.
//!
//! The mesher is a pure function of its inputs and only reads block arrays, so it
//! runs on worker threads.

use cgmath::Point3;

use crate::engine_state::voxels::{
    block::{atlas_offset, block_side::BlockSide, block_type::BlockType},
    chunk::{chunk_iteration::ChunkBlockIterator, Chunk, CHUNK_DIMENSION},
};

pub mod face;

pub use face::FaceRecord;

/// Neighbouring chunks of the chunk being meshed, indexed by [`BlockSide`] id.
///
/// `None` means the neighbour is not loaded; faces towards it are emitted.
pub type NeighborChunks<'a> = [Option<&'a Chunk>; 6];

/// Output of [`mesh_chunk`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChunkMesh {
    /// Faces of opaque blocks
    pub opaque: Vec<FaceRecord>,
    /// Faces of translucent blocks
    pub translucent: Vec<FaceRecord>,
}

impl ChunkMesh {
    /// Total number of faces in both lists.
    pub fn face_count(&self) -> usize {
        self.opaque.len() + self.translucent.len()
    }
}

/// Builds the face lists of `chunk` from scratch.
///
/// # Arguments
/// * `chunk` - The chunk to mesh
/// * `neighbors` - The six adjacent chunks, `None` where not loaded
pub fn mesh_chunk(chunk: &Chunk, neighbors: &NeighborChunks) -> ChunkMesh {
    let mut mesh = ChunkMesh::default();
    let world_floor_chunk = chunk.position.y == 0;

    for (local, block_type) in ChunkBlockIterator::new(chunk) {
        let output = if block_type.is_translucent() {
            &mut mesh.translucent
        } else {
            &mut mesh.opaque
        };

        for side in BlockSide::all() {
            if side == BlockSide::BOTTOM && world_floor_chunk && local.y == 0 {
                continue;
            }

            let neighbor = neighbor_block(chunk, neighbors, local, side);
            if !face_visible(block_type, neighbor) {
                continue;
            }

            output.push(FaceRecord::pack(
                side,
                Point3::new(local.x as u8, local.y as u8, local.z as u8),
                atlas_offset(block_type, side),
            ));
        }
    }

    mesh
}

/// The block across `side` of the block at `local`, or `None` when it lies in
/// a chunk that is not available.
fn neighbor_block(
    chunk: &Chunk,
    neighbors: &NeighborChunks,
    local: Point3<usize>,
    side: BlockSide,
) -> Option<BlockType> {
    let offset = side.normal();
    let x = local.x as i32 + offset.x;
    let y = local.y as i32 + offset.y;
    let z = local.z as i32 + offset.z;

    if Chunk::contains_local(x, y, z) {
        return Some(chunk.get_block_unchecked(x as usize, y as usize, z as usize));
    }

    let neighbor = neighbors[side as usize]?;
    match neighbor.get_block(
        x.rem_euclid(CHUNK_DIMENSION),
        y.rem_euclid(CHUNK_DIMENSION),
        z.rem_euclid(CHUNK_DIMENSION),
    ) {
        // still a placeholder
        BlockType::INVALID => None,
        block_type => Some(block_type),
    }
}

fn face_visible(block_type: BlockType, neighbor: Option<BlockType>) -> bool {
    match neighbor {
        None | Some(BlockType::AIR) => true,
        Some(neighbor) => block_type.is_opaque() && neighbor.is_translucent(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::CHUNK_SIZE;

    fn air_chunk(position: Point3<i32>) -> Chunk {
        let mut chunk = Chunk::new(position);
        chunk.fill(vec![BlockType::AIR; CHUNK_SIZE as usize].into_boxed_slice());
        chunk
    }

    fn sides(faces: &[FaceRecord]) -> Vec<BlockSide> {
        let mut sides: Vec<_> = faces.iter().filter_map(|f| f.side()).collect();
        sides.sort_by_key(|s| *s as u8);
        sides
    }

    #[test]
    fn lone_block_emits_six_faces() {
        let mut chunk = air_chunk(Point3::new(0, 1, 0));
        chunk.set_block(5, 5, 5, BlockType::STONE);

        let mesh = mesh_chunk(&chunk, &[None; 6]);
        assert_eq!(sides(&mesh.opaque), BlockSide::all().to_vec());
        assert!(mesh.translucent.is_empty());
        assert!(mesh.opaque.iter().all(|f| f.local() == Point3::new(5, 5, 5)));
    }

    #[test]
    fn no_faces_between_adjacent_opaque_blocks() {
        let mut chunk = air_chunk(Point3::new(0, 1, 0));
        chunk.set_block(5, 5, 5, BlockType::STONE);
        chunk.set_block(6, 5, 5, BlockType::DIRT);

        let mesh = mesh_chunk(&chunk, &[None; 6]);
        assert_eq!(mesh.opaque.len(), 10);
        assert!(!mesh
            .opaque
            .iter()
            .any(|f| f.local() == Point3::new(5, 5, 5) && f.side() == Some(BlockSide::RIGHT)));
        assert!(!mesh
            .opaque
            .iter()
            .any(|f| f.local() == Point3::new(6, 5, 5) && f.side() == Some(BlockSide::LEFT)));
    }

    #[test]
    fn solid_interior_has_no_internal_faces() {
        let mut chunk = air_chunk(Point3::new(0, 1, 0));
        for x in 0..3 {
            for y in 0..3 {
                for z in 0..3 {
                    chunk.set_block(10 + x, 10 + y, 10 + z, BlockType::STONE);
                }
            }
        }

        let mesh = mesh_chunk(&chunk, &[None; 6]);
        // 6 sides of a 3x3x3 cube, 9 faces each
        assert_eq!(mesh.opaque.len(), 54);
        assert!(!mesh.opaque.iter().any(|f| f.local() == Point3::new(11, 11, 11)));
    }

    #[test]
    fn absent_neighbor_renders_boundary_face() {
        let mut chunk = air_chunk(Point3::new(0, 1, 0));
        chunk.set_block(CHUNK_DIMENSION - 1, 4, 4, BlockType::STONE);

        let mut right = air_chunk(Point3::new(1, 1, 0));
        right.set_block(0, 4, 4, BlockType::STONE);

        let without = mesh_chunk(&chunk, &[None; 6]);
        assert!(without.opaque.iter().any(|f| f.side() == Some(BlockSide::RIGHT)));

        let mut neighbors: NeighborChunks = [None; 6];
        neighbors[BlockSide::RIGHT as usize] = Some(&right);
        let with = mesh_chunk(&chunk, &neighbors);
        assert!(!with.opaque.iter().any(|f| f.side() == Some(BlockSide::RIGHT)));
        assert_eq!(with.opaque.len(), 5);
    }

    #[test]
    fn ungenerated_neighbor_counts_as_absent() {
        let mut chunk = air_chunk(Point3::new(0, 1, 0));
        chunk.set_block(4, CHUNK_DIMENSION - 1, 4, BlockType::STONE);
        let placeholder = Chunk::new(Point3::new(0, 2, 0));

        let mut neighbors: NeighborChunks = [None; 6];
        neighbors[BlockSide::TOP as usize] = Some(&placeholder);
        let mesh = mesh_chunk(&chunk, &neighbors);
        assert!(mesh.opaque.iter().any(|f| f.side() == Some(BlockSide::TOP)));
    }

    #[test]
    fn faces_are_routed_by_source_translucency() {
        let mut chunk = air_chunk(Point3::new(0, 1, 0));
        chunk.set_block(5, 5, 5, BlockType::STONE);
        chunk.set_block(5, 6, 5, BlockType::WATER);

        let mesh = mesh_chunk(&chunk, &[None; 6]);
        // the stone shows its top through the water, the water hides its bottom
        assert_eq!(mesh.opaque.len(), 6);
        assert_eq!(mesh.translucent.len(), 5);
        assert!(!mesh
            .translucent
            .iter()
            .any(|f| f.side() == Some(BlockSide::BOTTOM)));
    }

    #[test]
    fn world_floor_bottom_faces_are_skipped() {
        let mut chunk = air_chunk(Point3::new(0, 0, 0));
        chunk.set_block(3, 0, 3, BlockType::STONE);
        let mesh = mesh_chunk(&chunk, &[None; 6]);
        assert_eq!(mesh.opaque.len(), 5);
        assert!(!mesh.opaque.iter().any(|f| f.side() == Some(BlockSide::BOTTOM)));
    }

    #[test]
    fn atlas_offsets_follow_the_block_side() {
        let mut chunk = air_chunk(Point3::new(0, 1, 0));
        chunk.set_block(1, 1, 1, BlockType::GRASS);
        let mesh = mesh_chunk(&chunk, &[None; 6]);
        for face in &mesh.opaque {
            let side = face.side().unwrap();
            assert_eq!(face.atlas(), atlas_offset(BlockType::GRASS, side));
        }
    }
}
