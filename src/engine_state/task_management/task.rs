//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which provides a framework for executing work asynchronously across multiple threads.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that can be executed asynchronously
//! - `TaskResult`: Represents the result of a completed task
//! - `TaskContext`: The main-thread collaborators a result may use when it is applied
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. Once the whole batch has finished, `TaskManager::complete_batch()` calls
//!    each result's `handle_result()` on the main thread
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the main thread
//! - Tasks reach shared chunk data only through `MtResource` handles

use crate::engine_state::{rendering::RenderBackend, voxels::edit_store::EditStore};

/// A trait representing a unit of work that can be executed asynchronously.
///
/// Tasks are the primary mechanism for offloading work from the main thread to
/// background workers. They should be self-contained and own (or hold handles to)
/// all the data they need.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should be relatively coarse-grained to amortize task scheduling overhead
/// - Must only write into the chunk it was created for
pub trait Task: Send {
    /// Processes the task and returns a result.
    ///
    /// Runs on a worker thread. Jobs are expected to be total; a panic here is
    /// carried back to the main thread and re-raised there.
    ///
    /// # Returns
    /// A boxed `TaskResult` that will be processed on the main thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// Main-thread collaborators available while results are applied.
pub struct TaskContext<'a> {
    /// Store of persisted block edits
    pub edit_store: &'a mut dyn EditStore,
    /// Receiver of baked face buffers
    pub render_backend: &'a mut dyn RenderBackend,
}

/// A trait representing the result of processing a `Task`.
///
/// Results are applied on the main thread after the batch barrier, so every
/// other job of the batch has finished and no worker touches chunk data.
pub trait TaskResult: Send {
    /// Applies the result.
    ///
    /// # Arguments
    /// * `context` - Edit store and render backend of the engine
    fn handle_result(self: Box<Self>, context: &mut TaskContext);
}
