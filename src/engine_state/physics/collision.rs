//! Swept AABB collision of a moving box against the block grid.
//!
//! A step is resolved in at most [`MAX_ITERATIONS`] passes. Each pass gathers
//! every solid block overlapping the broadphase box of the remaining motion,
//! finds the earliest time of impact among them, moves the body up to that
//! contact and slides the velocity along the contact plane. Later passes only
//! spend the part of the step left after the contact.
//!
//! Cells below the world floor (`y < 0`) are solid; cells above the world's
//! top are empty.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::engine_state::voxels::{chunk::coordinates::world_to_chunk_coord, chunk_grid::ChunkGrid};

use super::{Aabb, PhysicsBody};

/// Most collision passes per step.
pub const MAX_ITERATIONS: usize = 4;
/// Factor applied to the velocity left over after each contact.
pub const DAMPING: f32 = 0.98;
/// Contacts whose normal has a larger vertical component are ground.
pub const GROUND_NORMAL_Y: f32 = 0.5;
/// Remaining velocity below this length ends the step.
const MIN_VELOCITY: f32 = 1.0e-5;

/// First contact between a moving box and an obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Fraction of the step, in `[0, 1]`, at which the boxes start touching
    pub entry_time: f32,
    /// Unit normal of the obstacle face that was hit
    pub normal: Vector3<f32>,
}

/// Entry and exit times along one axis.
fn axis_times(moving_min: f32, moving_max: f32, obstacle_min: f32, obstacle_max: f32, velocity: f32) -> (f32, f32) {
    if velocity > 0.0 {
        (
            (obstacle_min - moving_max) / velocity,
            (obstacle_max - moving_min) / velocity,
        )
    } else if velocity < 0.0 {
        (
            (obstacle_max - moving_min) / velocity,
            (obstacle_min - moving_max) / velocity,
        )
    } else if moving_max > obstacle_min && moving_min < obstacle_max {
        (f32::NEG_INFINITY, f32::INFINITY)
    } else {
        (f32::INFINITY, f32::NEG_INFINITY)
    }
}

/// Time of impact of `moving`, displaced by `velocity` over one step, with a
/// static `obstacle`.
///
/// # Returns
/// `None` if the boxes do not start touching within the step.
pub fn swept_aabb(moving: &Aabb, velocity: Vector3<f32>, obstacle: &Aabb) -> Option<Collision> {
    let (moving_max, obstacle_max) = (moving.max(), obstacle.max());
    let x = axis_times(moving.min.x, moving_max.x, obstacle.min.x, obstacle_max.x, velocity.x);
    let y = axis_times(moving.min.y, moving_max.y, obstacle.min.y, obstacle_max.y, velocity.y);
    let z = axis_times(moving.min.z, moving_max.z, obstacle.min.z, obstacle_max.z, velocity.z);

    let entry_time = x.0.max(y.0).max(z.0);
    let exit_time = x.1.min(y.1).min(z.1);
    if entry_time > exit_time || !(0.0..=1.0).contains(&entry_time) {
        return None;
    }

    // on equal entry times the normal is vertical
    let normal = if y.0 == entry_time {
        Vector3::new(0.0, -velocity.y.signum(), 0.0)
    } else if x.0 == entry_time {
        Vector3::new(-velocity.x.signum(), 0.0, 0.0)
    } else {
        Vector3::new(0.0, 0.0, -velocity.z.signum())
    };

    Some(Collision { entry_time, normal })
}

/// Whether a cell blocks movement.
///
/// # Panics
/// Panics if the cell is inside the world's vertical bounds and its chunk is
/// not resident.
fn is_solid_cell(grid: &ChunkGrid, cell: Point3<i32>) -> bool {
    if cell.y < 0 {
        return true;
    }
    if cell.y >= grid.world_height_blocks() {
        return false;
    }
    match grid.block_at(cell) {
        Some(block_type) => block_type.is_solid(),
        None => panic!(
            "collision query touched block {:?} in unloaded chunk {:?}",
            cell,
            world_to_chunk_coord(cell)
        ),
    }
}

/// Earliest collision of `body` moving by `velocity` against solid cells.
fn nearest_collision(grid: &ChunkGrid, bounds: &Aabb, velocity: Vector3<f32>) -> Option<(Collision, Aabb)> {
    let broadphase = bounds.union(&bounds.translated(velocity));
    let (low, high) = broadphase.block_range();

    let mut nearest: Option<(Collision, Aabb)> = None;
    for y in low.y..=high.y {
        for z in low.z..=high.z {
            for x in low.x..=high.x {
                let cell = Point3::new(x, y, z);
                if !is_solid_cell(grid, cell) {
                    continue;
                }
                let obstacle = Aabb::block(cell);
                if let Some(collision) = swept_aabb(bounds, velocity, &obstacle) {
                    if nearest.map_or(true, |(best, _)| collision.entry_time < best.entry_time) {
                        nearest = Some((collision, obstacle));
                    }
                }
            }
        }
    }
    nearest
}

/// Puts the body exactly against the face it hit, so rounding never leaves
/// it inside the obstacle.
fn snap_to_contact(bounds: &mut Aabb, collision: &Collision, obstacle: &Aabb) {
    let obstacle_max = obstacle.max();
    let n = collision.normal;
    if n.x > 0.0 {
        bounds.min.x = obstacle_max.x;
    } else if n.x < 0.0 {
        bounds.min.x = obstacle.min.x - bounds.size.x;
    } else if n.y > 0.0 {
        bounds.min.y = obstacle_max.y;
    } else if n.y < 0.0 {
        bounds.min.y = obstacle.min.y - bounds.size.y;
    } else if n.z > 0.0 {
        bounds.min.z = obstacle_max.z;
    } else if n.z < 0.0 {
        bounds.min.z = obstacle.min.z - bounds.size.z;
    }
}

/// Advances `body` by one tick of its velocity, stopping and sliding at solid
/// blocks.
///
/// On return `body.velocity` holds what is left after the contacts of this
/// step and `body.grounded` whether one of them was ground.
///
/// Each pass after a contact moves by the slid velocity times the fraction of
/// the step still left. Sliding only removes or damps velocity components, so
/// the body never leaves [`PhysicsBody::broadphase`] as it was on entry.
///
/// # Returns
/// Whether the body ended the step standing on ground.
///
/// # Panics
/// Panics if the step's broadphase region touches a chunk that is not resident.
pub fn resolve(body: &mut PhysicsBody, grid: &ChunkGrid) -> bool {
    let mut velocity = body.velocity;
    let mut remaining = 1.0;
    let mut grounded = false;

    for _ in 0..MAX_ITERATIONS {
        let motion = velocity * remaining;
        if motion.magnitude() < MIN_VELOCITY {
            break;
        }

        match nearest_collision(grid, &body.bounds, motion) {
            None => {
                body.bounds.min += motion;
                break;
            }
            Some((collision, obstacle)) => {
                body.bounds.min += motion * collision.entry_time;
                snap_to_contact(&mut body.bounds, &collision, &obstacle);
                if collision.normal.y > GROUND_NORMAL_Y {
                    grounded = true;
                }
                remaining *= 1.0 - collision.entry_time;
                velocity -= collision.normal * velocity.dot(collision.normal);
                velocity *= DAMPING;
            }
        }
    }

    body.velocity = velocity;
    body.grounded = grounded;
    grounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{
        block::block_type::BlockType,
        chunk::{Chunk, CHUNK_SIZE},
        chunk_grid::GridSettings,
        generation::{FlatTerrain, WorldGenerator},
    };

    fn empty_grid() -> ChunkGrid {
        let settings = GridSettings {
            world_height_chunks: 2,
            ..Default::default()
        };
        let mut grid = ChunkGrid::new(settings, WorldGenerator::new(FlatTerrain::new(40)), 1);
        for x in -1..=1 {
            for y in 0..2 {
                for z in -1..=1 {
                    let mut chunk = Chunk::new(Point3::new(x, y, z));
                    chunk.fill(vec![BlockType::AIR; CHUNK_SIZE as usize].into_boxed_slice());
                    grid.insert_chunk(chunk);
                }
            }
        }
        grid
    }

    fn body_at(x: f32, y: f32, z: f32) -> PhysicsBody {
        PhysicsBody::new(Point3::new(x, y, z), Vector3::new(0.6, 1.8, 0.6))
    }

    #[test]
    fn swept_aabb_finds_entry_time() {
        let moving = Aabb::block(Point3::new(0, 3, 0));
        let obstacle = Aabb::block(Point3::new(0, 0, 0));
        let collision = swept_aabb(&moving, Vector3::new(0.0, -4.0, 0.0), &obstacle).unwrap();
        assert_eq!(collision.entry_time, 0.5);
        assert_eq!(collision.normal, Vector3::new(0.0, 1.0, 0.0));

        assert!(swept_aabb(&moving, Vector3::new(0.0, -1.0, 0.0), &obstacle).is_none());
        assert!(swept_aabb(&moving, Vector3::new(0.0, 4.0, 0.0), &obstacle).is_none());
    }

    #[test]
    fn zero_velocity_axes_require_overlap() {
        let moving = Aabb::block(Point3::new(2, 3, 0));
        let obstacle = Aabb::block(Point3::new(0, 0, 0));
        assert!(swept_aabb(&moving, Vector3::new(0.0, -4.0, 0.0), &obstacle).is_none());
    }

    #[test]
    fn free_fall_moves_by_the_full_velocity() {
        let grid = empty_grid();
        let mut body = body_at(4.2, 20.0, 4.2);
        body.velocity = Vector3::new(0.25, -0.5, 0.0);

        assert!(!resolve(&mut body, &grid));
        let moved = body.position() - Point3::new(4.2, 20.0, 4.2);
        assert!((moved - Vector3::new(0.25, -0.5, 0.0)).magnitude() < 1.0e-5);
        assert_eq!(body.velocity, Vector3::new(0.25, -0.5, 0.0));
    }

    #[test]
    fn zero_velocity_never_collides() {
        let grid = empty_grid();
        grid.set_block(Point3::new(4, 19, 4), BlockType::STONE);
        let mut body = body_at(4.2, 20.0, 4.2);

        assert!(!resolve(&mut body, &grid));
        assert_eq!(body.position(), Point3::new(4.2, 20.0, 4.2));
    }

    #[test]
    fn falling_body_lands_on_top_of_a_block() {
        let grid = empty_grid();
        grid.set_block(Point3::new(4, 10, 4), BlockType::STONE);
        let mut body = body_at(4.2, 11.3, 4.2);
        body.velocity = Vector3::new(0.0, -0.6, 0.0);

        assert!(resolve(&mut body, &grid));
        assert!(body.grounded);
        assert_eq!(body.position().y, 11.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn resting_body_stays_grounded_under_gravity() {
        let grid = empty_grid();
        grid.set_block(Point3::new(4, 10, 4), BlockType::STONE);
        let mut body = body_at(4.2, 11.0, 4.2);
        for _ in 0..10 {
            body.apply_gravity();
            assert!(resolve(&mut body, &grid));
        }
        assert_eq!(body.position().y, 11.0);
    }

    #[test]
    fn walls_stop_motion_and_bodies_slide_along_them() {
        let grid = empty_grid();
        for y in 10..13 {
            grid.set_block(Point3::new(6, y, 4), BlockType::STONE);
        }
        let mut body = body_at(5.0, 10.0, 4.2);
        body.velocity = Vector3::new(0.8, 0.0, 0.3);

        assert!(!resolve(&mut body, &grid));
        assert!((body.position().x - 5.4).abs() < 1.0e-5);
        assert!(body.position().z > 4.2);
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn sliding_spends_only_the_rest_of_the_step() {
        let grid = empty_grid();
        for y in 10..13 {
            grid.set_block(Point3::new(6, y, 4), BlockType::STONE);
        }
        let mut body = body_at(5.0, 10.0, 4.2);
        body.velocity = Vector3::new(0.8, 0.0, 0.3);
        let checked = body.broadphase();

        resolve(&mut body, &grid);
        // half the step to the wall, then the damped slide for the other half
        let moved_z = body.position().z - 4.2;
        assert!((moved_z - (0.15 + 0.5 * 0.3 * DAMPING)).abs() < 1.0e-5);
        assert!(moved_z <= 0.3);

        let (low, high) = (checked.min, checked.max());
        let (min, max) = (body.bounds.min, body.bounds.max());
        assert!(min.x >= low.x && min.y >= low.y && min.z >= low.z);
        assert!(max.x <= high.x + 1.0e-5 && max.y <= high.y + 1.0e-5 && max.z <= high.z + 1.0e-5);
    }

    #[test]
    fn water_does_not_block() {
        let grid = empty_grid();
        grid.set_block(Point3::new(4, 10, 4), BlockType::WATER);
        let mut body = body_at(4.2, 11.3, 4.2);
        body.velocity = Vector3::new(0.0, -0.6, 0.0);

        assert!(!resolve(&mut body, &grid));
        assert!((body.position().y - 10.7).abs() < 1.0e-5);
    }

    #[test]
    fn the_world_floor_is_solid() {
        let grid = empty_grid();
        let mut body = body_at(4.2, 0.5, 4.2);
        body.velocity = Vector3::new(0.0, -1.0, 0.0);

        assert!(resolve(&mut body, &grid));
        assert_eq!(body.position().y, 0.0);
    }

    #[test]
    #[should_panic(expected = "unloaded chunk")]
    fn unloaded_chunks_are_a_precondition_violation() {
        let grid = empty_grid();
        let mut body = body_at(63.8, 10.0, 4.2);
        body.velocity = Vector3::new(1.0, 0.0, 0.0);
        resolve(&mut body, &grid);
    }
}
