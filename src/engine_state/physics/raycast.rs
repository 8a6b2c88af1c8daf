//! Voxel raycasting using the DDA (Amanatides & Woo) algorithm.
//!
//! The ray walks cell by cell from its origin, always crossing the nearest
//! grid boundary next, and stops in the first newly entered cell that holds a
//! block. The cell the ray starts in is never reported.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::{
    core::MtResource,
    engine_state::voxels::{
        block::{block_side::BlockSide, block_type::BlockType},
        chunk::{
            coordinates::{block_containing, world_to_chunk_coord, world_to_local},
            Chunk,
        },
        chunk_grid::ChunkGrid,
    },
};

/// A ray in world space. The direction need not be normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: Point3<f32>,
    /// Direction of travel
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Creates a ray.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Ray { origin, direction }
    }
}

/// The block a ray stopped at.
pub struct RaycastHit {
    /// World position of the block
    pub block_position: Point3<i32>,
    /// The chunk owning the block
    pub chunk: MtResource<Chunk>,
    /// The block that was hit
    pub block_type: BlockType,
    /// The face the ray entered the block through
    pub face: BlockSide,
    /// Distance travelled from the origin to the entry point
    pub distance: f32,
}

impl RaycastHit {
    /// The cell on the other side of the hit face, where a placed block goes.
    pub fn adjacent_position(&self) -> Point3<i32> {
        self.block_position + self.face.normal()
    }
}

/// Casts `ray` through the grid for at most `radius` world units.
///
/// # Returns
/// The first non-air block entered, or `None` if the ray travels further than
/// `radius`, leaves the world's vertical bounds or has no direction.
///
/// # Panics
/// Panics if the ray enters a cell whose chunk is not resident. Callers keep
/// the scan inside the loaded region.
pub fn raycast(grid: &ChunkGrid, ray: &Ray, radius: f32) -> Option<RaycastHit> {
    let length = ray.direction.magnitude();
    if length == 0.0 || radius <= 0.0 {
        return None;
    }
    let max_t = radius / length;

    let origin = [ray.origin.x, ray.origin.y, ray.origin.z];
    let direction = [ray.direction.x, ray.direction.y, ray.direction.z];
    let start = block_containing(ray.origin);
    let mut cell = [start.x, start.y, start.z];

    let mut step = [0i32; 3];
    let mut t_max = [f32::INFINITY; 3];
    let mut t_delta = [f32::INFINITY; 3];
    for axis in 0..3 {
        let d = direction[axis];
        if d > 0.0 {
            step[axis] = 1;
            t_delta[axis] = 1.0 / d;
            t_max[axis] = ((cell[axis] + 1) as f32 - origin[axis]) / d;
        } else if d < 0.0 {
            step[axis] = -1;
            t_delta[axis] = -1.0 / d;
            t_max[axis] = (cell[axis] as f32 - origin[axis]) / d;
        }
    }

    let world_height = grid.world_height_blocks();
    loop {
        let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
            0
        } else if t_max[1] <= t_max[2] {
            1
        } else {
            2
        };

        let t = t_max[axis];
        if t > max_t {
            return None;
        }
        cell[axis] += step[axis];
        t_max[axis] += t_delta[axis];

        if cell[1] < 0 || cell[1] >= world_height {
            return None;
        }

        let block_position = Point3::new(cell[0], cell[1], cell[2]);
        let chunk_position = world_to_chunk_coord(block_position);
        let chunk = grid.chunk_at(chunk_position).unwrap_or_else(|| {
            panic!(
                "raycast entered block {:?} in unloaded chunk {:?}",
                block_position, chunk_position
            )
        });

        let local = world_to_local(block_position);
        let block_type = chunk.get().get_block(local.x, local.y, local.z);
        if block_type != BlockType::AIR && block_type != BlockType::INVALID {
            return Some(RaycastHit {
                block_position,
                chunk,
                block_type,
                face: BlockSide::entered_through(axis, step[axis]),
                distance: t * length,
            });
        }
    }
}
