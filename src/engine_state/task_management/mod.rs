//! # Task Management System
//!
//! This module provides the worker pool that runs chunk generation and chunk
//! meshing off the main thread.
//!
//! ## Architecture Overview
//!
//! The task management system consists of several key components:
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed asynchronously
//! - `TaskResult`: The result of a completed task, applied on the main thread
//! - `TaskChannel`: Communication channel between the main thread and one worker thread
//!
//! Each worker owns a dedicated task channel and all workers report into one
//! shared result channel. Tasks are handed out round-robin, at most
//! `MAX_TASKS_IN_FLIGHT` per worker; the rest wait in a FIFO queue.
//!
//! ## Batches
//!
//! The chunk grid uses the pool as a coarse barrier: it publishes a batch of
//! tasks, then calls `TaskManager::complete_batch()`, which blocks on the result
//! channel until every task of the batch has reported back (no polling) and
//! only then applies the results on the calling thread.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and send back results
//! 4. `complete_batch()` waits for the batch, then calls each result's `handle_result()`
//!
//! ## Failure Model
//! Tasks are expected to be total functions of their inputs. A task that panics
//! is caught on the worker, reported, and re-raised on the main thread; there is
//! no retry.
//!
//! ## Example Usage
//! ```rust,ignore
//! let mut task_manager = TaskManager::new(4);
//!
//! task_manager.publish_task(Box::new(MyTask::new(...)));
//! task_manager.publish_task(Box::new(MyTask::new(...)));
//!
//! // Blocks until both tasks are done, then applies their results.
//! task_manager.complete_batch(&mut context);
//! ```

pub mod task;

use std::{
    any::Any,
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{channel, Receiver, Sender},
    thread::{self, JoinHandle},
};

use log::info;
use task::{Task, TaskContext, TaskResult};

/// What a worker sends back: the result, or the panic message of the task.
type TaskOutcome = Result<Box<dyn TaskResult + Send>, String>;

/// A communication channel between the main thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from main thread to worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `worker`: Handle to the worker thread, joined when the manager drops
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating and joining worker threads
/// - Distributing tasks across available workers
/// - Queuing tasks when all workers are busy
/// - Waiting for a batch and applying its results
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    result_receiver: Receiver<(usize, TaskOutcome)>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Set to 1 so a worker never sits on a backlog while another one is idle.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create, at least one is always created
    ///
    /// # Panics
    /// Panics if the underlying thread creation fails.
    pub fn new(num_workers: usize) -> Self {
        let num_workers = num_workers.max(1);
        let mut channels = Vec::with_capacity(num_workers);
        let (result_tx, result_rx) = channel::<(usize, TaskOutcome)>();

        info!(
            "Starting {} task workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        for channel_idx in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let result_tx = result_tx.clone();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.process()))
                        .map_err(panic_message);
                    if result_tx.send((channel_idx, outcome)).is_err() {
                        break;
                    }
                }
            };

            channels.push(TaskChannel {
                task_sender: task_tx,
                num_tasks_in_flight: 0,
                worker: thread::spawn(task_closure),
            });
        }

        TaskManager {
            channels,
            result_receiver: result_rx,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of tasks currently being processed by workers.
    pub fn tasks_in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Number of tasks waiting for a free worker.
    pub fn queued_task_count(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Whether nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.tasks_in_flight() == 0
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was successfully sent to the worker
    /// - `Err(task)` if the send failed (worker disconnected)
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an available worker channel that can accept a new task.
    ///
    /// Round-robin starting from the channel after the last one used, skipping
    /// channels that already have `MAX_TASKS_IN_FLIGHT` tasks.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;

        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// Never blocks: the task goes to a free worker or is queued.
    ///
    /// # Returns
    /// - `true` if the task was immediately scheduled on an available worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to free workers, oldest first, until either runs out.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // Channel is disconnected, put task back and stop processing
                    self.queued_tasks.push_front(task);
                    return;
                }
            }
        }
    }

    /// Waits for every published task to finish, then applies all results.
    ///
    /// This is the batch barrier. The calling thread blocks on the result
    /// channel, feeding queued tasks to workers as they free up, until nothing is
    /// queued or in flight. Results are applied afterwards, in completion order,
    /// so `handle_result` never runs while a worker still touches chunk data.
    ///
    /// # Arguments
    /// * `context` - Main-thread collaborators passed to every result
    ///
    /// # Returns
    /// The number of results applied.
    ///
    /// # Panics
    /// Re-raises the panic of any task of the batch, and panics if the workers
    /// disappear while tasks are outstanding.
    pub fn complete_batch(&mut self, context: &mut TaskContext) -> usize {
        let mut results = Vec::new();
        self.process_queued_tasks();

        while self.tasks_in_flight() > 0 {
            let Ok((channel_idx, outcome)) = self.result_receiver.recv() else {
                panic!(
                    "task workers disconnected with {} tasks in flight",
                    self.tasks_in_flight()
                );
            };
            self.channels[channel_idx].num_tasks_in_flight -= 1;

            match outcome {
                Ok(result) => results.push(result),
                Err(message) => panic!("task panicked on worker {channel_idx}: {message}"),
            }

            self.process_queued_tasks();
        }

        assert!(
            self.queued_tasks.is_empty(),
            "{} tasks left queued with no worker able to take them",
            self.queued_tasks.len()
        );

        let completed = results.len();
        for result in results {
            result.handle_result(context);
        }
        completed
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        for TaskChannel {
            task_sender, worker, ..
        } in self.channels.drain(..)
        {
            // closing the channel ends the worker loop
            drop(task_sender);
            let _ = worker.join();
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::engine_state::{
        buffer_state::BufferState, voxels::edit_store::MemoryEditStore,
    };

    struct SquareTask {
        value: u64,
        output: Arc<Mutex<Vec<u64>>>,
    }

    struct SquareResult {
        square: u64,
        output: Arc<Mutex<Vec<u64>>>,
    }

    impl Task for SquareTask {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            Box::new(SquareResult {
                square: self.value * self.value,
                output: self.output.clone(),
            })
        }
    }

    impl TaskResult for SquareResult {
        fn handle_result(self: Box<Self>, _context: &mut TaskContext) {
            self.output.lock().unwrap().push(self.square);
        }
    }

    struct PanickingTask;

    impl Task for PanickingTask {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            panic!("generation blew up")
        }
    }

    fn run_batch(task_manager: &mut TaskManager) -> usize {
        let mut edit_store = MemoryEditStore::new();
        let mut render_backend = BufferState::new();
        let mut context = TaskContext {
            edit_store: &mut edit_store,
            render_backend: &mut render_backend,
        };
        task_manager.complete_batch(&mut context)
    }

    #[test]
    fn batch_barrier_applies_every_result() {
        let mut task_manager = TaskManager::new(3);
        let output = Arc::new(Mutex::new(Vec::new()));

        let mut scheduled = 0;
        for value in 0..20 {
            if task_manager.publish_task(Box::new(SquareTask {
                value,
                output: output.clone(),
            })) {
                scheduled += 1;
            }
        }
        assert!(scheduled <= 3 * MAX_TASKS_IN_FLIGHT);

        assert_eq!(run_batch(&mut task_manager), 20);
        assert!(task_manager.is_idle());

        let mut squares = output.lock().unwrap().clone();
        squares.sort_unstable();
        assert_eq!(squares, (0..20u64).map(|v| v * v).collect::<Vec<_>>());
    }

    #[test]
    fn empty_batch_returns_immediately() {
        let mut task_manager = TaskManager::new(2);
        assert_eq!(run_batch(&mut task_manager), 0);
    }

    #[test]
    fn zero_workers_still_gets_one() {
        let task_manager = TaskManager::new(0);
        assert_eq!(task_manager.worker_count(), 1);
    }

    #[test]
    #[should_panic(expected = "generation blew up")]
    fn task_panics_are_fatal_on_the_main_thread() {
        let mut task_manager = TaskManager::new(1);
        task_manager.publish_task(Box::new(PanickingTask));
        run_batch(&mut task_manager);
    }
}
