//! # Block Module
//!
//! This module provides the static block catalog: block types, block faces, and
//! the mapping from each block face to its tile in the 16x16 texture atlas.

use block_side::BlockSide;
use block_type::BlockType;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
pub type BlockTypeSize = u8;

/// Number of tiles along each edge of the texture atlas.
pub const ATLAS_TILES_PER_AXIS: u8 = 16;

/// Position of a tile in the texture atlas, in tiles.
///
/// Both components are below [`ATLAS_TILES_PER_AXIS`] so each fits the 4-bit
/// fields of a packed face record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtlasOffset {
    /// Tile column
    pub x: u8,
    /// Tile row
    pub y: u8,
}

impl AtlasOffset {
    const fn new(x: u8, y: u8) -> Self {
        AtlasOffset { x, y }
    }
}

/// Looks up the atlas tile drawn on `side` of a `block_type` block.
///
/// Sides are mapped in the order [Front, Back, Bottom, Top, Left, Right], same
/// as [`BlockSide`] ids.
///
/// # Panics
/// Panics for [`BlockType::INVALID`]. Every real block type has a mapping; a
/// face record built for the sentinel is a content error, not something to
/// recover from at runtime.
pub fn atlas_offset(block_type: BlockType, side: BlockSide) -> AtlasOffset {
    let faces: [AtlasOffset; 6] = match block_type {
        BlockType::AIR => [AtlasOffset::new(15, 15); 6],
        BlockType::GRASS => [
            AtlasOffset::new(3, 0),
            AtlasOffset::new(3, 0),
            AtlasOffset::new(2, 0),
            AtlasOffset::new(0, 0),
            AtlasOffset::new(3, 0),
            AtlasOffset::new(3, 0),
        ],
        BlockType::DIRT => [AtlasOffset::new(2, 0); 6],
        BlockType::STONE => [AtlasOffset::new(1, 0); 6],
        BlockType::SAND => [AtlasOffset::new(2, 1); 6],
        BlockType::WOOD => [
            AtlasOffset::new(4, 1),
            AtlasOffset::new(4, 1),
            AtlasOffset::new(5, 1),
            AtlasOffset::new(5, 1),
            AtlasOffset::new(4, 1),
            AtlasOffset::new(4, 1),
        ],
        BlockType::LEAVES => [AtlasOffset::new(4, 3); 6],
        BlockType::WATER => [AtlasOffset::new(13, 12); 6],
        BlockType::INVALID => panic!("no atlas mapping for block type {:?}", block_type),
    };
    faces[side as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_block_type_maps_inside_the_atlas() {
        for block_type in BlockType::ALL {
            for side in BlockSide::all() {
                let offset = atlas_offset(block_type, side);
                assert!(offset.x < ATLAS_TILES_PER_AXIS);
                assert!(offset.y < ATLAS_TILES_PER_AXIS);
            }
        }
    }

    #[test]
    fn grass_top_differs_from_its_sides() {
        assert_ne!(
            atlas_offset(BlockType::GRASS, BlockSide::TOP),
            atlas_offset(BlockType::GRASS, BlockSide::LEFT)
        );
        assert_eq!(
            atlas_offset(BlockType::GRASS, BlockSide::BOTTOM),
            atlas_offset(BlockType::DIRT, BlockSide::TOP)
        );
    }

    #[test]
    #[should_panic(expected = "no atlas mapping")]
    fn sentinel_has_no_atlas_tile() {
        atlas_offset(BlockType::INVALID, BlockSide::TOP);
    }
}
