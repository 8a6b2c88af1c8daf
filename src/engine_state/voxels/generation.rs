//! # World Generation Module
//!
//! Deterministic terrain generation. A chunk's initial contents depend only on
//! the world seed and the chunk coordinate, never on load order or on other
//! chunks, so any worker may generate any chunk at any time.
//!
//! ## Terrain Oracle
//!
//! The noise functions are hidden behind [`TerrainOracle`], which answers three
//! questions per world column: how high the terrain is, whether the column is
//! forested, and whether a tree grows there. [`NoiseTerrain`] answers them with
//! seeded `noise` functions; [`FlatTerrain`] gives tests a predictable world.
//!
//! ## Column Layout
//!
//! For a column of height `h` (cells `y < h` are ground):
//! - `y < h - SURFACE_BAND_DEPTH`: stone
//! - `h - SURFACE_BAND_DEPTH <= y < h`: the surface material (grass on top of dirt,
//!   sand near sea level, bare stone on high ground)
//! - `y >= h`: water up to and including `SEA_LEVEL`, air above

use std::ops::RangeInclusive;

use cgmath::Point3;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::{
    block::block_type::BlockType,
    chunk::{coordinates::chunk_origin, Chunk, CHUNK_DIMENSION, CHUNK_SIZE},
};

/// Highest world y that is filled with water where the terrain is lower.
pub const SEA_LEVEL: i32 = 28;
/// Thickness of the surface material band on top of the stone.
pub const SURFACE_BAND_DEPTH: i32 = 4;
/// Columns at most this far above sea level are beaches.
pub const BEACH_HEIGHT: i32 = 2;
/// Columns at least this far above sea level have a bare stone surface.
pub const MOUNTAIN_OFFSET: i32 = 20;
/// Terrain heights on which trees may grow.
pub const FOREST_ELEVATION: RangeInclusive<i32> = (SEA_LEVEL + BEACH_HEIGHT + 1)..=(SEA_LEVEL + MOUNTAIN_OFFSET - 1);

/// Number of wood cells in a trunk.
pub const TRUNK_HEIGHT: i32 = 4;
/// Vertical extent of a whole tree, trunk plus canopy.
pub const TREE_HEIGHT: i32 = TRUNK_HEIGHT + 2;

const BASE_HEIGHT: f64 = 34.0;
const HEIGHT_AMPLITUDE: f64 = 24.0;
const HEIGHT_FREQUENCY: f64 = 0.006;
const HEIGHT_OCTAVES: usize = 4;
const FOREST_FREQUENCY: f64 = 0.01;
const FOREST_THRESHOLD: f64 = 0.05;
const TREE_DENSITY: f32 = 0.03;

/// Per-column queries the generator needs from the terrain noise.
///
/// Implementations must be pure functions of their inputs (and their own seed).
pub trait TerrainOracle: Send + Sync {
    /// Terrain height of the column: cells below this y are ground.
    fn height_at(&self, x: i32, z: i32) -> i32;

    /// Whether the column lies in a forest biome.
    fn is_forest(&self, x: i32, z: i32) -> bool;

    /// Whether a tree grows from this column, if the column is otherwise suitable.
    fn has_tree(&self, x: i32, z: i32) -> bool;
}

/// Seeded noise terrain.
pub struct NoiseTerrain {
    seed: u64,
    height_noise: Fbm<Perlin>,
    forest_noise: Perlin,
}

impl NoiseTerrain {
    /// Creates the terrain for a world seed.
    pub fn new(seed: u64) -> Self {
        let noise_seed = (seed ^ (seed >> 32)) as u32;
        NoiseTerrain {
            seed,
            height_noise: Fbm::<Perlin>::new(noise_seed)
                .set_octaves(HEIGHT_OCTAVES)
                .set_frequency(HEIGHT_FREQUENCY),
            forest_noise: Perlin::new(noise_seed.wrapping_add(1)),
        }
    }

    /// Stable per-column hash of the seed and the column.
    pub fn column_hash(&self, x: i32, z: i32) -> u64 {
        let column = (x as u32 as u64) << 32 | z as u32 as u64;
        splitmix64(self.seed ^ splitmix64(column))
    }
}

/// SplitMix64 finalizer.
fn splitmix64(value: u64) -> u64 {
    let mut value = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    value = (value ^ (value >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    value = (value ^ (value >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    value ^ (value >> 31)
}

impl TerrainOracle for NoiseTerrain {
    fn height_at(&self, x: i32, z: i32) -> i32 {
        let sample = self.height_noise.get([x as f64, z as f64]);
        (BASE_HEIGHT + sample * HEIGHT_AMPLITUDE).round() as i32
    }

    fn is_forest(&self, x: i32, z: i32) -> bool {
        let sample = self
            .forest_noise
            .get([x as f64 * FOREST_FREQUENCY, z as f64 * FOREST_FREQUENCY]);
        sample > FOREST_THRESHOLD
    }

    fn has_tree(&self, x: i32, z: i32) -> bool {
        // top 24 bits as a fraction in [0, 1)
        let roll = (self.column_hash(x, z) >> 40) as f32 / (1u64 << 24) as f32;
        roll < TREE_DENSITY
    }
}

/// Terrain of constant height, with trees exactly where listed.
#[derive(Debug, Clone, Default)]
pub struct FlatTerrain {
    /// Height of every column
    pub height: i32,
    /// Whether every column is forested
    pub forest: bool,
    /// World (x, z) columns that grow a tree
    pub tree_columns: Vec<(i32, i32)>,
}

impl FlatTerrain {
    /// Flat ground at `height` with no trees.
    pub fn new(height: i32) -> Self {
        FlatTerrain {
            height,
            ..Default::default()
        }
    }
}

impl TerrainOracle for FlatTerrain {
    fn height_at(&self, _x: i32, _z: i32) -> i32 {
        self.height
    }

    fn is_forest(&self, _x: i32, _z: i32) -> bool {
        self.forest
    }

    fn has_tree(&self, x: i32, z: i32) -> bool {
        self.tree_columns.contains(&(x, z))
    }
}

/// Surface material of a column of the given height.
pub fn surface_material(height: i32) -> BlockType {
    if height <= SEA_LEVEL + BEACH_HEIGHT {
        BlockType::SAND
    } else if height >= SEA_LEVEL + MOUNTAIN_OFFSET {
        BlockType::STONE
    } else {
        BlockType::GRASS
    }
}

/// Produces the initial block contents of chunks.
pub struct WorldGenerator {
    terrain: Box<dyn TerrainOracle>,
}

impl WorldGenerator {
    /// Creates a generator over the given terrain.
    pub fn new(terrain: impl TerrainOracle + 'static) -> Self {
        WorldGenerator {
            terrain: Box::new(terrain),
        }
    }

    /// Creates a generator over [`NoiseTerrain`] for `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(NoiseTerrain::new(seed))
    }

    /// The terrain queried by this generator.
    pub fn terrain(&self) -> &dyn TerrainOracle {
        self.terrain.as_ref()
    }

    /// Generates the blocks of the chunk at `chunk_position`.
    ///
    /// # Returns
    /// A dense block array in [`Chunk::index`] order. Every cell is assigned;
    /// none is left as [`BlockType::INVALID`].
    pub fn generate(&self, chunk_position: Point3<i32>) -> Box<[BlockType]> {
        let origin = chunk_origin(chunk_position);
        let mut blocks = vec![BlockType::AIR; CHUNK_SIZE as usize].into_boxed_slice();

        let mut heights = [[0i32; CHUNK_DIMENSION as usize]; CHUNK_DIMENSION as usize];
        for (lz, row) in heights.iter_mut().enumerate() {
            for (lx, height) in row.iter_mut().enumerate() {
                *height = self
                    .terrain
                    .height_at(origin.x + lx as i32, origin.z + lz as i32);
            }
        }

        for lz in 0..CHUNK_DIMENSION {
            for lx in 0..CHUNK_DIMENSION {
                let height = heights[lz as usize][lx as usize];
                let surface = surface_material(height);
                for ly in 0..CHUNK_DIMENSION {
                    blocks[Chunk::index(lx as usize, ly as usize, lz as usize)] =
                        column_block(origin.y + ly, height, surface);
                }
            }
        }

        for lz in 1..CHUNK_DIMENSION - 1 {
            for lx in 1..CHUNK_DIMENSION - 1 {
                let height = heights[lz as usize][lx as usize];
                let (x, z) = (origin.x + lx, origin.z + lz);
                let base = height - origin.y;
                let fits = base >= 0 && base + TREE_HEIGHT <= CHUNK_DIMENSION;

                if fits
                    && FOREST_ELEVATION.contains(&height)
                    && self.terrain.is_forest(x, z)
                    && self.terrain.has_tree(x, z)
                {
                    stamp_tree(&mut blocks, lx, base, lz);
                }
            }
        }

        blocks
    }
}

fn column_block(y: i32, height: i32, surface: BlockType) -> BlockType {
    if y < height - SURFACE_BAND_DEPTH {
        BlockType::STONE
    } else if y < height {
        if surface == BlockType::GRASS && y < height - 1 {
            BlockType::DIRT
        } else {
            surface
        }
    } else if y <= SEA_LEVEL {
        BlockType::WATER
    } else {
        BlockType::AIR
    }
}

/// Writes a tree whose trunk starts at local `(lx, base, lz)` into filled
/// terrain. Only air cells are written, so ground and water stay as they are.
/// The canopy reaches one block sideways, so `lx` and `lz` must not lie on the
/// chunk border.
fn stamp_tree(blocks: &mut [BlockType], lx: i32, base: i32, lz: i32) {
    let mut place = |x: i32, y: i32, z: i32, block_type: BlockType| {
        let cell = &mut blocks[Chunk::index(x as usize, y as usize, z as usize)];
        if *cell == BlockType::AIR {
            *cell = block_type;
        }
    };

    for dy in 0..TRUNK_HEIGHT {
        place(lx, base + dy, lz, BlockType::WOOD);
    }

    for dy in TRUNK_HEIGHT - 2..TRUNK_HEIGHT + 1 {
        for dz in -1..=1 {
            for dx in -1..=1 {
                place(lx + dx, base + dy, lz + dz, BlockType::LEAVES);
            }
        }
    }

    // plus-shaped crown
    let top = base + TREE_HEIGHT - 1;
    for (dx, dz) in [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)] {
        place(lx + dx, top, lz + dz, BlockType::LEAVES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(blocks: &[BlockType], x: i32, y: i32, z: i32) -> BlockType {
        blocks[Chunk::index(x as usize, y as usize, z as usize)]
    }

    #[test]
    fn noise_generation_is_deterministic() {
        let first = WorldGenerator::from_seed(1234).generate(Point3::new(0, 0, 0));
        let second = WorldGenerator::from_seed(1234).generate(Point3::new(0, 0, 0));
        assert_eq!(first, second);
        assert!(first.iter().all(|b| *b != BlockType::INVALID));
    }

    #[test]
    fn generation_does_not_depend_on_order() {
        let generator = WorldGenerator::from_seed(77);
        let before = generator.generate(Point3::new(2, 1, -3));
        generator.generate(Point3::new(0, 0, 0));
        generator.generate(Point3::new(2, 0, -3));
        assert_eq!(before, generator.generate(Point3::new(2, 1, -3)));
    }

    #[test]
    fn flat_column_layers() {
        let height = SEA_LEVEL + 12;
        let blocks = WorldGenerator::new(FlatTerrain::new(height)).generate(Point3::new(0, 1, 0));
        let local_top = height - CHUNK_DIMENSION;

        assert_eq!(block(&blocks, 0, local_top - 1, 0), BlockType::GRASS);
        assert_eq!(block(&blocks, 0, local_top - 2, 0), BlockType::DIRT);
        assert_eq!(block(&blocks, 0, local_top - SURFACE_BAND_DEPTH, 0), BlockType::DIRT);
        assert_eq!(block(&blocks, 0, local_top - SURFACE_BAND_DEPTH - 1, 0), BlockType::STONE);
        assert_eq!(block(&blocks, 0, local_top, 0), BlockType::AIR);
    }

    #[test]
    fn low_terrain_is_flooded_to_sea_level() {
        let height = SEA_LEVEL - 5;
        let blocks = WorldGenerator::new(FlatTerrain::new(height)).generate(Point3::new(0, 0, 0));

        assert_eq!(block(&blocks, 3, height - 1, 3), BlockType::SAND);
        assert_eq!(block(&blocks, 3, height, 3), BlockType::WATER);
        assert_eq!(block(&blocks, 3, SEA_LEVEL, 3), BlockType::WATER);
        assert_eq!(block(&blocks, 3, SEA_LEVEL + 1, 3), BlockType::AIR);
    }

    #[test]
    fn surface_material_bands() {
        assert_eq!(surface_material(SEA_LEVEL), BlockType::SAND);
        assert_eq!(surface_material(SEA_LEVEL + BEACH_HEIGHT + 1), BlockType::GRASS);
        assert_eq!(surface_material(SEA_LEVEL + MOUNTAIN_OFFSET), BlockType::STONE);
    }

    #[test]
    fn trees_grow_only_in_interior_forest_columns() {
        let height = SEA_LEVEL + 6;
        let terrain = FlatTerrain {
            height,
            forest: true,
            tree_columns: vec![(5, 5), (0, 9), (CHUNK_DIMENSION - 1, 9)],
        };
        let blocks = WorldGenerator::new(terrain).generate(Point3::new(0, 1, 0));
        let base = height - CHUNK_DIMENSION;

        for dy in 0..TRUNK_HEIGHT {
            assert_eq!(block(&blocks, 5, base + dy, 5), BlockType::WOOD);
        }
        assert_eq!(block(&blocks, 6, base + TRUNK_HEIGHT - 1, 5), BlockType::LEAVES);
        assert_eq!(block(&blocks, 5, base + TREE_HEIGHT - 1, 5), BlockType::LEAVES);
        assert_eq!(block(&blocks, 6, base + TREE_HEIGHT - 1, 6), BlockType::AIR);
        assert_eq!(block(&blocks, 5, base + TREE_HEIGHT, 5), BlockType::AIR);

        // border columns never grow trees
        assert_eq!(block(&blocks, 0, base, 9), BlockType::AIR);
        assert_eq!(block(&blocks, CHUNK_DIMENSION - 1, base, 9), BlockType::AIR);
    }

    #[test]
    fn trees_need_forest_elevation_and_vertical_room() {
        let outside_band = FlatTerrain {
            height: SEA_LEVEL + 1,
            forest: true,
            tree_columns: vec![(5, 5)],
        };
        let blocks = WorldGenerator::new(outside_band).generate(Point3::new(0, 0, 0));
        assert_eq!(block(&blocks, 5, SEA_LEVEL + 1, 5), BlockType::AIR);

        // trunk base on the top layer of the chunk: the tree would poke out
        let height = CHUNK_DIMENSION - 1;
        assert!(FOREST_ELEVATION.contains(&height));
        let no_room = FlatTerrain {
            height,
            forest: true,
            tree_columns: vec![(5, 5)],
        };
        let blocks = WorldGenerator::new(no_room).generate(Point3::new(0, 0, 0));
        assert_eq!(block(&blocks, 5, height, 5), BlockType::AIR);
    }

    /// Ground 40 high west of x = 6 and 44 high from there on.
    struct StepTerrain;

    impl TerrainOracle for StepTerrain {
        fn height_at(&self, x: i32, _z: i32) -> i32 {
            if x < 6 {
                40
            } else {
                44
            }
        }

        fn is_forest(&self, _x: i32, _z: i32) -> bool {
            true
        }

        fn has_tree(&self, x: i32, z: i32) -> bool {
            (x, z) == (5, 5)
        }
    }

    #[test]
    fn tree_canopy_never_replaces_taller_ground() {
        let blocks = WorldGenerator::new(StepTerrain).generate(Point3::new(0, 1, 0));
        let base = 40 - CHUNK_DIMENSION;

        assert_eq!(block(&blocks, 5, base, 5), BlockType::WOOD);
        // canopy cells west of the step are leaves, east of it the ground stays
        assert_eq!(block(&blocks, 4, base + 2, 5), BlockType::LEAVES);
        assert_eq!(block(&blocks, 6, base + 2, 5), BlockType::DIRT);
        assert_eq!(block(&blocks, 6, base + 3, 5), BlockType::GRASS);
        assert_eq!(block(&blocks, 6, base + 4, 5), BlockType::LEAVES);

        for z in 4..=6 {
            for y in 0..44 - CHUNK_DIMENSION {
                assert_ne!(block(&blocks, 6, y, z), BlockType::LEAVES);
            }
        }
    }

    #[test]
    fn column_hashes_are_pinned() {
        let terrain = NoiseTerrain::new(1337);
        assert_eq!(terrain.column_hash(0, 0), 0x95be_b7b6_c696_d147);
        assert_eq!(terrain.column_hash(-5, 12), 0xdc36_4317_651c_b5e6);
        assert_eq!(NoiseTerrain::new(0).column_hash(0, 0), 0xa706_dd2f_4d19_7e6f);

        assert!(terrain.has_tree(-40, -5));
        assert!(terrain.has_tree(-39, -4));
        assert!(!terrain.has_tree(0, 0));
        assert!(!terrain.has_tree(-5, 12));
    }
}
