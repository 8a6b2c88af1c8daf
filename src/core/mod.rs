//! # Core Module
//!
//! Shared-ownership primitives used throughout the engine.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking.
//!   Chunks live behind one of these so worker threads can be handed a stable
//!   handle to a chunk slot instead of a reference into the chunk map.
//!
//! ## Usage
//! ```rust
//! use voxel_world::core::MtResource;
//!
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//! ```

pub mod mt_resource;

pub use mt_resource::MtResource;
