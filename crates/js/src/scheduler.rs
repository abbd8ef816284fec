//! Single-threaded cooperative scheduler for guest continuations.

use std::future::Future;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::RemoteHandle;
use futures::task::LocalSpawnExt as _;

use crate::bindings::JSError;

/// Runs guest continuations one turn at a time on the current thread.
pub struct Scheduler {
    pool: LocalPool,
    spawner: LocalSpawner,
}

impl Scheduler {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self { pool, spawner }
    }

    /// Queue a continuation.
    ///
    /// # Errors
    /// Returns an internal error if the scheduler has shut down.
    pub fn spawn<F>(&self, task: F) -> Result<(), JSError>
    where
        F: Future<Output = ()> + 'static,
    {
        self.spawner
            .spawn_local(task)
            .map_err(|error| JSError::InternalError(error.to_string()))
    }

    /// Queue a continuation and get a handle resolving to its output.
    ///
    /// # Errors
    /// Returns an internal error if the scheduler has shut down.
    pub fn spawn_with_handle<F>(&self, task: F) -> Result<RemoteHandle<F::Output>, JSError>
    where
        F: Future + 'static,
    {
        self.spawner
            .spawn_local_with_handle(task)
            .map_err(|error| JSError::InternalError(error.to_string()))
    }

    /// Run turns until no continuation can make progress.
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Run until every queued continuation has finished.
    pub fn run(&mut self) {
        self.pool.run();
    }

    /// Drive `future` to completion, running other continuations in between.
    pub fn block_on<F: Future>(&mut self, future: F) -> F::Output {
        self.pool.run_until(future)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
