//! # Voxel Task System
//!
//! This module contains tasks related to voxel world generation. They run on
//! the worker pool during the load step of a tick.

pub mod chunk_generation_task;
