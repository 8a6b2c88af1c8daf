//! # Physics Module
//!
//! Geometric queries against the live chunk grid.
//!
//! ## Key Components
//! - [`Aabb`]: Axis-aligned box in world space, stored as minimum corner plus size
//! - [`PhysicsBody`]: A box with a per-tick velocity
//! - [`collision`]: Swept AABB resolution of a body against solid blocks
//! - [`raycast`]: Voxel traversal for block selection
//!
//! Velocities are displacements per simulation tick; one call to
//! [`collision::resolve`] advances a body by exactly one tick.
//!
//! Both queries run on the main thread after the tick's task barrier and
//! require every chunk they touch to be resident. Touching a chunk that is not
//! loaded is a programming error and panics.

use cgmath::{Point3, Vector3};

pub mod collision;
pub mod raycast;

/// Downward acceleration applied to bodies, in blocks per tick squared.
pub const GRAVITY: f32 = 0.04;
/// Fastest a body may fall, in blocks per tick.
pub const TERMINAL_VELOCITY: f32 = 1.5;

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point3<f32>,
    /// Extent along each axis, never negative
    pub size: Vector3<f32>,
}

impl Aabb {
    /// Creates a box from its minimum corner and size.
    pub fn new(min: Point3<f32>, size: Vector3<f32>) -> Self {
        debug_assert!(size.x >= 0.0 && size.y >= 0.0 && size.z >= 0.0);
        Aabb { min, size }
    }

    /// The unit box occupying a block cell.
    pub fn block(cell: Point3<i32>) -> Self {
        Aabb::new(
            Point3::new(cell.x as f32, cell.y as f32, cell.z as f32),
            Vector3::new(1.0, 1.0, 1.0),
        )
    }

    /// Maximum corner.
    pub fn max(&self) -> Point3<f32> {
        self.min + self.size
    }

    /// The same box moved by `offset`.
    pub fn translated(&self, offset: Vector3<f32>) -> Aabb {
        Aabb::new(self.min + offset, self.size)
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        let (a, b) = (self.max(), other.max());
        let min = Point3::new(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.min.z.min(other.min.z),
        );
        let max = Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z));
        Aabb::new(min, max - min)
    }

    /// Whether the interiors of the two boxes overlap. Touching faces do not count.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let (a, b) = (self.max(), other.max());
        self.min.x < b.x
            && a.x > other.min.x
            && self.min.y < b.y
            && a.y > other.min.y
            && self.min.z < b.z
            && a.z > other.min.z
    }

    /// Inclusive range of block cells whose interior the box overlaps.
    pub fn block_range(&self) -> (Point3<i32>, Point3<i32>) {
        let max = self.max();
        let low = Point3::new(
            self.min.x.floor() as i32,
            self.min.y.floor() as i32,
            self.min.z.floor() as i32,
        );
        let high = Point3::new(
            (max.x.ceil() as i32 - 1).max(low.x),
            (max.y.ceil() as i32 - 1).max(low.y),
            (max.z.ceil() as i32 - 1).max(low.z),
        );
        (low, high)
    }
}

/// A box moved by the collision resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBody {
    /// Current bounds; `bounds.min` is the body's position
    pub bounds: Aabb,
    /// Displacement per tick
    pub velocity: Vector3<f32>,
    /// Whether the last step ended standing on ground
    pub grounded: bool,
}

impl PhysicsBody {
    /// Creates a body at rest.
    pub fn new(position: Point3<f32>, size: Vector3<f32>) -> Self {
        PhysicsBody {
            bounds: Aabb::new(position, size),
            velocity: Vector3::new(0.0, 0.0, 0.0),
            grounded: false,
        }
    }

    /// The body's position, its minimum corner.
    pub fn position(&self) -> Point3<f32> {
        self.bounds.min
    }

    /// Accelerates the body downwards, capped at [`TERMINAL_VELOCITY`].
    pub fn apply_gravity(&mut self) {
        self.velocity.y = (self.velocity.y - GRAVITY).max(-TERMINAL_VELOCITY);
    }

    /// The world region a step with the current velocity may touch.
    pub fn broadphase(&self) -> Aabb {
        self.bounds.union(&self.bounds.translated(self.velocity))
    }
}
