//! Conversions between world block space and chunk space.
//!
//! World block positions are plain integer triples. A chunk coordinate names
//! the chunk whose `(0,0,0)` corner sits at `coordinate * CHUNK_DIMENSION`.
//! Every conversion floors towards negative infinity, so block `-1` lives in
//! chunk `-1` at local position `CHUNK_DIMENSION - 1`.

use cgmath::{Point3, Vector3};

use super::CHUNK_DIMENSION;

/// World block position of the chunk's minimum corner.
pub fn chunk_origin(chunk_position: Point3<i32>) -> Point3<i32> {
    chunk_position * CHUNK_DIMENSION
}

/// Chunk coordinate containing a world block position.
pub fn world_to_chunk_coord(world: Point3<i32>) -> Point3<i32> {
    Point3::new(
        world.x.div_euclid(CHUNK_DIMENSION),
        world.y.div_euclid(CHUNK_DIMENSION),
        world.z.div_euclid(CHUNK_DIMENSION),
    )
}

/// Position of a world block inside its chunk. Every component is in
/// `0..CHUNK_DIMENSION`.
pub fn world_to_local(world: Point3<i32>) -> Point3<i32> {
    Point3::new(
        world.x.rem_euclid(CHUNK_DIMENSION),
        world.y.rem_euclid(CHUNK_DIMENSION),
        world.z.rem_euclid(CHUNK_DIMENSION),
    )
}

/// The block cell containing a floating point world position.
pub fn block_containing(position: Point3<f32>) -> Point3<i32> {
    Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    )
}

/// Chunk coordinate containing a floating point world position.
pub fn chunk_containing(position: Point3<f32>) -> Point3<i32> {
    world_to_chunk_coord(block_containing(position))
}

/// Largest per-axis distance between two chunk coordinates.
pub fn chebyshev_distance(a: Point3<i32>, b: Point3<i32>) -> i32 {
    let d = a - b;
    d.x.abs().max(d.y.abs()).max(d.z.abs())
}

/// Squared euclidean distance between two chunk coordinates.
pub fn squared_distance(a: Point3<i32>, b: Point3<i32>) -> i32 {
    let d: Vector3<i32> = a - b;
    d.x * d.x + d.y * d.y + d.z * d.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_plus_local_offset_maps_back_to_the_chunk() {
        let chunk_positions = [
            Point3::new(0, 0, 0),
            Point3::new(3, -2, 7),
            Point3::new(-1, -1, -1),
            Point3::new(-40, 5, 12),
        ];
        let offsets = [0, 1, 15, CHUNK_DIMENSION - 1];

        for chunk_position in chunk_positions {
            let origin = chunk_origin(chunk_position);
            for lx in offsets {
                for ly in offsets {
                    for lz in offsets {
                        let world = origin + Vector3::new(lx, ly, lz);
                        assert_eq!(world_to_chunk_coord(world), chunk_position);
                        assert_eq!(world_to_local(world), Point3::new(lx, ly, lz));
                    }
                }
            }
        }
    }

    #[test]
    fn negative_blocks_floor_into_the_previous_chunk() {
        let world = Point3::new(-1, -CHUNK_DIMENSION, -CHUNK_DIMENSION - 1);
        assert_eq!(world_to_chunk_coord(world), Point3::new(-1, -1, -2));
        assert_eq!(
            world_to_local(world),
            Point3::new(CHUNK_DIMENSION - 1, 0, CHUNK_DIMENSION - 1)
        );
    }

    #[test]
    fn float_positions_floor() {
        assert_eq!(
            block_containing(Point3::new(-0.25, 3.99, 0.0)),
            Point3::new(-1, 3, 0)
        );
        assert_eq!(
            chunk_containing(Point3::new(-0.25, 40.0, 31.9)),
            Point3::new(-1, 1, 0)
        );
    }

    #[test]
    fn distances() {
        let a = Point3::new(1, -2, 3);
        let b = Point3::new(-1, 2, 3);
        assert_eq!(chebyshev_distance(a, b), 4);
        assert_eq!(squared_distance(a, b), 20);
    }
}
