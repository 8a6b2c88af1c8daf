//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world and
//! their material predicates. Block names resolve through a compile-time
//! perfect hash map, which is also the serde representation used by the
//! configuration file and the on-disk edit store.

use std::{fmt, str::FromStr};

use num_derive::FromPrimitive;
use phf::phf_map;
use serde::{Deserialize, Serialize};

use super::BlockTypeSize;

/// Enumerates all possible block types in the voxel world.
///
/// `INVALID` is the sentinel stored in freshly reserved chunks before
/// generation runs and returned by bounds-checked lookups that miss the chunk.
/// It is never written by generation or by edits.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BlockType {
    /// Empty space.
    AIR = 0,
    /// Grass-topped soil, the usual surface block.
    GRASS = 1,
    /// Soil under grass.
    DIRT = 2,
    /// Rock below the surface band and on high ground.
    STONE = 3,
    /// Beach material near sea level.
    SAND = 4,
    /// Tree trunks.
    WOOD = 5,
    /// Tree canopy. Translucent.
    LEAVES = 6,
    /// Fills terrain hollows up to sea level. Translucent and not solid.
    WATER = 7,
    /// Sentinel for unassigned or out-of-range cells.
    INVALID = 255,
}

static BLOCK_NAMES: phf::Map<&'static str, BlockType> = phf_map! {
    "air" => BlockType::AIR,
    "grass" => BlockType::GRASS,
    "dirt" => BlockType::DIRT,
    "stone" => BlockType::STONE,
    "sand" => BlockType::SAND,
    "wood" => BlockType::WOOD,
    "leaves" => BlockType::LEAVES,
    "water" => BlockType::WATER,
};

/// Error returned when a block name does not match any known block type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown block type `{0}`")]
pub struct UnknownBlockType(pub String);

impl BlockType {
    /// Every placeable block type, i.e. everything except the sentinel.
    pub const ALL: [BlockType; 8] = [
        BlockType::AIR,
        BlockType::GRASS,
        BlockType::DIRT,
        BlockType::STONE,
        BlockType::SAND,
        BlockType::WOOD,
        BlockType::LEAVES,
        BlockType::WATER,
    ];

    /// Whether the block participates in collision.
    ///
    /// Everything except air and water is solid. The sentinel is not.
    pub fn is_solid(self) -> bool {
        !matches!(self, BlockType::AIR | BlockType::WATER | BlockType::INVALID)
    }

    /// Whether the block is drawn in the translucent pass.
    pub fn is_translucent(self) -> bool {
        matches!(self, BlockType::LEAVES | BlockType::WATER)
    }

    /// Whether the block is opaque, non-air geometry.
    pub fn is_opaque(self) -> bool {
        !matches!(self, BlockType::AIR | BlockType::INVALID) && !self.is_translucent()
    }

    /// Decodes the compact storage representation.
    ///
    /// # Returns
    /// `None` if `value` is not the discriminant of any block type.
    pub fn from_size(value: BlockTypeSize) -> Option<BlockType> {
        num_traits::FromPrimitive::from_u8(value)
    }

    /// The lowercase name used in configuration and on disk.
    ///
    /// # Panics
    /// Panics for the sentinel, which has no name and must never be persisted.
    pub fn name(self) -> &'static str {
        match self {
            BlockType::AIR => "air",
            BlockType::GRASS => "grass",
            BlockType::DIRT => "dirt",
            BlockType::STONE => "stone",
            BlockType::SAND => "sand",
            BlockType::WOOD => "wood",
            BlockType::LEAVES => "leaves",
            BlockType::WATER => "water",
            BlockType::INVALID => panic!("the INVALID sentinel has no block name"),
        }
    }
}

impl FromStr for BlockType {
    type Err = UnknownBlockType;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        BLOCK_NAMES
            .get(name.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| UnknownBlockType(name.to_string()))
    }
}

impl TryFrom<String> for BlockType {
    type Error = UnknownBlockType;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<BlockType> for &'static str {
    fn from(block_type: BlockType) -> Self {
        block_type.name()
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::INVALID => f.write_str("<invalid>"),
            other => f.write_str(other.name()),
        }
    }
}
