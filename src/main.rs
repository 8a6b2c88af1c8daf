//! # Voxel World Entry Point
//!
//! Runs the headless engine through the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- config.json
//! ```

fn main() {
    voxel_world::run();
}
