//! # Engine State Module
//!
//! The core engine module that manages the state and functionality of the voxel engine.
//!
//! ## Key Components
//!
//! * `EngineState` - The per-tick driver and the block edit entry point
//! * `buffer_state` - Headless face buffers and frame plans
//! * `camera_state` - Camera and player controller
//! * `config` - Engine settings
//! * `physics` - Swept AABB collision and voxel raycasting
//! * `rendering` - Meshing and the render backend interface
//! * `task_management` - Worker pool and batch barrier
//! * `voxels` - Blocks, chunks, terrain generation and the chunk grid
//!
//! ## Tick Order
//!
//! 1. Unload far chunks and refresh the render window
//! 2. Load and generate missing chunks, replaying stored edits
//! 3. Mesh and upload unbaked chunks
//! 4. Step the player and free bodies against the now current grid
//! 5. Cast the selection ray and apply requested edits
//!
//! Steps 2 and 3 end with a full barrier on the worker pool, so physics and
//! raycasting always see a grid with no task in flight.

use cgmath::{Point3, Vector3};
use log::{debug, info, warn};
use web_time::{Duration, Instant};

use crate::engine_state::{
    camera_state::{player::PLAYER_HEIGHT, Player},
    config::EngineConfig,
    physics::{
        collision,
        raycast::{raycast, Ray, RaycastHit},
        Aabb, PhysicsBody,
    },
    rendering::RenderBackend,
    voxels::{
        block::{block_side::BlockSide, block_type::BlockType},
        chunk::coordinates::{chunk_containing, world_to_chunk_coord, world_to_local},
        chunk_grid::ChunkGrid,
        edit_store::{BlockEdit, EditStore, StoreError},
        generation::WorldGenerator,
    },
};

pub mod buffer_state;
pub mod camera_state;
pub mod config;
pub mod physics;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Player intent for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Walk along the view direction
    pub move_forward: bool,
    /// Walk against the view direction
    pub move_backward: bool,
    /// Strafe left
    pub move_left: bool,
    /// Strafe right
    pub move_right: bool,
    /// Jump, if standing on ground
    pub jump: bool,
    /// View rotation (horizontal, vertical), in input units
    pub rotate_view: Option<(f64, f64)>,
    /// Break the selected block
    pub break_block: bool,
    /// Place a block against the selected face
    pub place_block: Option<BlockType>,
}

/// Errors raised by block edits.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// The edit was applied in the world but could not be persisted.
    #[error("block edit could not be saved: {0}")]
    Store(#[from] StoreError),
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Chunks evicted
    pub unloaded: usize,
    /// Chunks generated
    pub loaded: usize,
    /// Chunks meshed and uploaded
    pub baked: usize,
    /// Whether the player was stepped; it waits while its region is loading
    pub player_stepped: bool,
    /// Free bodies stepped
    pub bodies_stepped: usize,
    /// The block under the selection ray and the face it was entered through
    pub selection: Option<(Point3<i32>, BlockSide)>,
    /// Wall time of the tick
    pub elapsed: Duration,
}

/// The main state container for the voxel engine
///
/// Owns the chunk grid, the player and free bodies, the edit store and the
/// render backend the baked chunks are uploaded to.
///
/// # Examples
///
/// ```
/// use voxel_world::engine_state::{
///     buffer_state::BufferState, config::EngineConfig, voxels::edit_store::MemoryEditStore,
///     EngineState, PlayerInput,
/// };
///
/// let config = EngineConfig {
///     render_distance: 1,
///     load_distance: 1,
///     worker_threads: 2,
///     ..Default::default()
/// };
/// let mut engine = EngineState::new(config, Box::new(MemoryEditStore::new()), BufferState::new());
/// let report = engine.tick(&PlayerInput::default());
/// assert!(report.loaded > 0);
/// ```
pub struct EngineState<B: RenderBackend> {
    config: EngineConfig,
    grid: ChunkGrid,
    edit_store: Box<dyn EditStore>,
    render_backend: B,
    player: Player,
    bodies: Vec<PhysicsBody>,
    ticks: u64,
}

impl<B: RenderBackend> EngineState<B> {
    /// Creates an engine with the player standing on the terrain at the world
    /// origin. Nothing is loaded until the first tick.
    ///
    /// # Arguments
    /// * `config` - Engine settings, validated here
    /// * `edit_store` - Where block edits are persisted and replayed from
    /// * `render_backend` - Receiver of baked chunk buffers
    pub fn new(config: EngineConfig, edit_store: Box<dyn EditStore>, render_backend: B) -> Self {
        let config = config.validated();
        let generator = WorldGenerator::from_seed(config.world_seed);
        let grid = ChunkGrid::new(config.grid_settings(), generator, config.worker_threads);

        let top = (grid.world_height_blocks() as f32 - PLAYER_HEIGHT).floor();
        let ground = grid.generator().terrain().height_at(0, 0) as f32;
        let player = Player::new(Point3::new(0.5, ground.min(top).max(0.0), 0.5));

        info!(
            "Engine created: seed {}, {} workers, player at {:?}",
            config.world_seed,
            config.worker_threads,
            player.feet_position()
        );

        EngineState {
            config,
            grid,
            edit_store,
            render_backend,
            player,
            bodies: Vec::new(),
            ticks: 0,
        }
    }

    /// The validated settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The chunk grid.
    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// The render backend.
    pub fn render_backend(&self) -> &B {
        &self.render_backend
    }

    /// The player.
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable access to the player, e.g. to teleport it or turn the camera.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// The free bodies, in spawn order.
    pub fn bodies(&self) -> &[PhysicsBody] {
        &self.bodies
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Chunk the viewpoint is in.
    pub fn viewpoint(&self) -> Point3<i32> {
        chunk_containing(self.player.eye_position())
    }

    /// Whether a chunk is inside the render window as of the last tick.
    pub fn is_chunk_visible(&self, chunk_position: Point3<i32>) -> bool {
        self.grid
            .chunk_at(chunk_position)
            .map_or(false, |chunk| chunk.get().in_render)
    }

    /// Adds a free body that falls under gravity.
    ///
    /// # Returns
    /// Its index in [`EngineState::bodies`].
    pub fn spawn_body(&mut self, position: Point3<f32>, size: Vector3<f32>) -> usize {
        self.bodies.push(PhysicsBody::new(position, size));
        self.bodies.len() - 1
    }

    /// Runs one simulation tick.
    pub fn tick(&mut self, input: &PlayerInput) -> TickReport {
        let start = Instant::now();
        let mut report = TickReport::default();
        let viewpoint = self.viewpoint();

        report.unloaded = self.grid.unload(viewpoint, &mut self.render_backend);
        report.loaded = self
            .grid
            .load(viewpoint, self.edit_store.as_mut(), &mut self.render_backend);
        report.baked = self
            .grid
            .bake(viewpoint, self.edit_store.as_mut(), &mut self.render_backend);
        let chunks_done = start.elapsed();

        report.player_stepped = self.step_player(input);
        report.bodies_stepped = self.step_bodies();

        let ray = self.player.view_ray();
        report.selection = self
            .select(&ray)
            .map(|hit| (hit.block_position, hit.face));

        if input.break_block {
            if let Err(error) = self.break_block(&ray) {
                warn!("{}", error);
            }
        }
        if let Some(block_type) = input.place_block {
            if let Err(error) = self.place_block(&ray, block_type) {
                warn!("{}", error);
            }
        }

        self.ticks += 1;
        report.elapsed = start.elapsed();
        debug!(
            "Tick {}: unloaded {}, loaded {}, baked {} in {:?} (total {:?})",
            self.ticks, report.unloaded, report.loaded, report.baked, chunks_done, report.elapsed
        );
        report
    }

    /// Whether every chunk a box touches is resident and generated.
    fn region_ready(&self, aabb: &Aabb) -> bool {
        let (low, high) = aabb.block_range();
        self.grid.is_region_ready(low, high)
    }

    fn step_player(&mut self, input: &PlayerInput) -> bool {
        let resting = self.player.body;
        self.player.apply_input(input);
        if self.region_ready(&self.player.body.broadphase()) {
            self.player.step(&self.grid);
            true
        } else {
            self.player.body = resting;
            false
        }
    }

    fn step_bodies(&mut self) -> usize {
        let mut stepped = 0;
        for index in 0..self.bodies.len() {
            let mut body = self.bodies[index];
            body.apply_gravity();
            if self.region_ready(&body.broadphase()) {
                collision::resolve(&mut body, &self.grid);
                self.bodies[index] = body;
                stepped += 1;
            }
        }
        stepped
    }

    /// Casts `ray` over the reach distance, if the reach region is loaded.
    fn select(&self, ray: &Ray) -> Option<RaycastHit> {
        let reach = self.config.reach_distance;
        let reach_box = Aabb::new(
            ray.origin - Vector3::new(reach, reach, reach),
            Vector3::new(reach, reach, reach) * 2.0,
        );
        if !self.region_ready(&reach_box) {
            return None;
        }
        raycast(&self.grid, ray, reach)
    }

    /// Writes a block, invalidates the affected meshes and persists the edit.
    ///
    /// # Returns
    /// The edited position, or `None` if the owning chunk is not ready.
    fn apply_edit(&mut self, world: Point3<i32>, block_type: BlockType) -> Result<Option<Point3<i32>>, EditError> {
        if self.grid.set_block(world, block_type).is_none() {
            return Ok(None);
        }
        let edit = BlockEdit::new(world_to_local(world), block_type);
        self.edit_store.save_edit(world_to_chunk_coord(world), edit)?;
        debug!("Set {:?} to {:?}", world, block_type);
        Ok(Some(world))
    }

    /// Breaks the block `ray` selects within reach.
    ///
    /// # Returns
    /// The broken block's position, or `None` if nothing was selected.
    ///
    /// # Errors
    /// [`EditError::Store`] if the edit could not be saved. The block stays
    /// broken in the loaded world.
    pub fn break_block(&mut self, ray: &Ray) -> Result<Option<Point3<i32>>, EditError> {
        let Some(hit) = self.select(ray) else {
            return Ok(None);
        };
        self.apply_edit(hit.block_position, BlockType::AIR)
    }

    /// Places a block against the face `ray` selects within reach.
    ///
    /// The target cell must hold air or water, and a solid block is never
    /// placed where it would overlap the player.
    ///
    /// # Returns
    /// The placed block's position, or `None` if nothing was placed.
    ///
    /// # Errors
    /// [`EditError::Store`] if the edit could not be saved. The block stays
    /// placed in the loaded world.
    pub fn place_block(&mut self, ray: &Ray, block_type: BlockType) -> Result<Option<Point3<i32>>, EditError> {
        if block_type == BlockType::INVALID || block_type == BlockType::AIR {
            warn!("Refusing to place {:?}", block_type);
            return Ok(None);
        }
        let Some(hit) = self.select(ray) else {
            return Ok(None);
        };

        let target = hit.adjacent_position();
        if !matches!(self.grid.block_at(target), Some(BlockType::AIR | BlockType::WATER)) {
            return Ok(None);
        }
        if block_type.is_solid() && Aabb::block(target).intersects(&self.player.bounds()) {
            return Ok(None);
        }
        self.apply_edit(target, block_type)
    }
}
