#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A chunked voxel world engine: procedural terrain, face-culled meshing, a
//! bounded window of loaded chunks around a moving player, voxel raycasting
//! and swept AABB collision.
//!
//! ## Key Modules
//!
//! * `core` - Shared resource handles used across threads
//! * `engine_state` - The engine: chunk grid, meshing, physics, player and the tick loop
//!
//! ## Architecture
//!
//! One main thread drives the tick; a fixed worker pool generates and meshes
//! chunks in barrier-separated batches. Rendering is behind the
//! `RenderBackend` trait, with a headless buffer store provided, and block
//! edits persist through the `EditStore` trait.
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_world::run();
//! }
//! ```

use log::{error, info};

use engine_state::{
    buffer_state::BufferState, config::EngineConfig, voxels::block::block_type::BlockType,
    voxels::edit_store::open_store, EngineState, PlayerInput,
};

pub mod core;
pub mod engine_state;

/// Ticks the headless demo runs for.
pub const DEMO_TICKS: u64 = 600;

/// Blocks the demo walk builds with.
const DEMO_BLOCKS: [BlockType; 4] = [BlockType::WOOD, BlockType::STONE, BlockType::LEAVES, BlockType::SAND];

/// Input of the demo walk for one tick: walk, turn now and then, jump over
/// obstacles and dig or build on a fixed beat.
fn scripted_input(tick: u64, rng: &mut fastrand::Rng) -> PlayerInput {
    PlayerInput {
        move_forward: true,
        jump: tick % 40 == 0,
        rotate_view: (tick % 150 == 0).then(|| (rng.f64() * 400.0 - 200.0, 0.0)),
        break_block: tick % 97 == 0,
        place_block: (tick % 131 == 0).then(|| DEMO_BLOCKS[rng.usize(..DEMO_BLOCKS.len())]),
        ..Default::default()
    }
}

/// Runs the headless engine.
///
/// The first command line argument, if any, is the path of a JSON
/// configuration file. Logging is controlled by `RUST_LOG`.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(error) => {
                error!("{}", error);
                return;
            }
        },
        None => EngineConfig::default(),
    };

    let edit_store = match open_store(config.edits_directory.as_deref()) {
        Ok(edit_store) => edit_store,
        Err(error) => {
            error!("{}", error);
            return;
        }
    };

    let mut rng = fastrand::Rng::with_seed(config.world_seed);
    let mut engine = EngineState::new(config, edit_store, BufferState::new());
    for tick in 0..DEMO_TICKS {
        let report = engine.tick(&scripted_input(tick, &mut rng));
        if tick % 60 == 0 {
            info!(
                "Tick {}: {} chunks resident, {} uploaded, player at {:?}, {:?}",
                tick,
                engine.grid().len(),
                engine.render_backend().chunk_count(),
                engine.player().feet_position(),
                report.elapsed
            );
        }
    }

    let frame = engine
        .render_backend()
        .frame_plan(|chunk_position| engine.is_chunk_visible(chunk_position));
    info!(
        "Finished {} ticks: {} draws in the last frame, {} bytes of face buffers",
        engine.ticks(),
        frame.len(),
        engine.render_backend().get_total_used_memory()
    );
}
