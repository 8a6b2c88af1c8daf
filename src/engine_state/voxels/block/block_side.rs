//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and their geometry:
//! outward normals, opposites, and the numeric face id stored in packed
//! face records.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The discriminant is the face id written into the top 4 bits of a packed
/// face record, so the order here is part of the renderer contract.
///
/// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in face-id order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Decodes a face id (0-5) back into a `BlockSide`.
    ///
    /// # Returns
    /// `None` for ids outside 0-5.
    pub fn from_id(id: u8) -> Option<BlockSide> {
        match id {
            0 => Some(BlockSide::FRONT),
            1 => Some(BlockSide::BACK),
            2 => Some(BlockSide::BOTTOM),
            3 => Some(BlockSide::TOP),
            4 => Some(BlockSide::LEFT),
            5 => Some(BlockSide::RIGHT),
            _ => None,
        }
    }

    /// The unit offset from a block to the neighbour that shares this face.
    pub fn normal(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
        }
    }

    /// The face on the other side of the block.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::FRONT => BlockSide::BACK,
            BlockSide::BACK => BlockSide::FRONT,
            BlockSide::BOTTOM => BlockSide::TOP,
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::LEFT => BlockSide::RIGHT,
            BlockSide::RIGHT => BlockSide::LEFT,
        }
    }

    /// The face a traversal enters through after stepping one cell along `axis`
    /// (0 = x, 1 = y, 2 = z) in direction `step` (+1 or -1).
    ///
    /// Stepping in +x enters the next cell through its LEFT face, and so on:
    /// the crossed face always points back against the step.
    pub fn entered_through(axis: usize, step: i32) -> BlockSide {
        match (axis, step > 0) {
            (0, true) => BlockSide::LEFT,
            (0, false) => BlockSide::RIGHT,
            (1, true) => BlockSide::BOTTOM,
            (1, false) => BlockSide::TOP,
            (2, true) => BlockSide::BACK,
            _ => BlockSide::FRONT,
        }
    }
}
