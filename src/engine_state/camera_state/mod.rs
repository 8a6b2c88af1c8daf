//! # Camera State Management
//!
//! The player's view of the world.
//!
//! ## Core Components
//! - [`Camera`]: Position and orientation, view matrix and selection ray
//! - [`Player`]: The walking, jumping body the camera rides on
//!
//! The camera follows the player's eyes after every physics step, so the
//! chunk window and the selection ray always start where the player stands.

pub mod camera;
pub mod player;

pub use camera::Camera;
pub use player::Player;
