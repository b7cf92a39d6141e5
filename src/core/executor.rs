//! Execution pools that actions are scheduled on.
use std::{future::Future, sync::Arc};

use eyre::{Result, WrapErr, eyre};
use tokio::{
    runtime::{Builder, Handle, Runtime},
    task::JoinHandle,
};

use crate::{config::models::ExecutorConfig, core::error::ActionError};

/// A shared, long-lived pool. Cloning is cheap; clones schedule onto the same
/// threads.
#[derive(Clone, Debug, Default)]
pub struct Executor {
    kind: ExecutorKind,
}

#[derive(Clone, Debug, Default)]
enum ExecutorKind {
    /// Whatever tokio runtime is current when work is spawned.
    #[default]
    Ambient,
    Handle(Handle),
    Dedicated(Arc<DedicatedPool>),
}

/// Owns a runtime and shuts it down without blocking when the last executor
/// clone goes away (dropping a `Runtime` inside async code would panic).
#[derive(Debug)]
struct DedicatedPool {
    name: String,
    runtime: Option<Runtime>,
}

impl Drop for DedicatedPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            tracing::debug!("Shutting down execution pool {}", self.name);
            runtime.shutdown_background();
        }
    }
}

impl Executor {
    /// Schedule onto the runtime current at spawn time.
    pub fn ambient() -> Self {
        Self::default()
    }

    pub fn from_handle(handle: Handle) -> Self {
        Self {
            kind: ExecutorKind::Handle(handle),
        }
    }

    /// Build a dedicated multi-threaded pool.
    ///
    /// Falls back to [`Executor::ambient`] when no worker count is configured.
    pub fn from_config(config: &ExecutorConfig) -> Result<Self> {
        match config.worker_threads {
            Some(workers) => Self::dedicated(workers, &config.thread_name),
            None => Ok(Self::ambient()),
        }
    }

    pub fn dedicated(worker_threads: usize, thread_name: &str) -> Result<Self> {
        if worker_threads == 0 {
            return Err(eyre!(
                "worker_threads must be greater than 0 for execution pool '{thread_name}'"
            ));
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name(thread_name)
            .enable_all()
            .build()
            .wrap_err_with(|| format!("Failed to build execution pool '{thread_name}'"))?;

        tracing::info!(
            "Execution pool '{}' started with {} worker threads",
            thread_name,
            worker_threads
        );

        Ok(Self {
            kind: ExecutorKind::Dedicated(Arc::new(DedicatedPool {
                name: thread_name.to_string(),
                runtime: Some(runtime),
            })),
        })
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        match &self.kind {
            ExecutorKind::Ambient => "ambient",
            ExecutorKind::Handle(_) => "handle",
            ExecutorKind::Dedicated(pool) => &pool.name,
        }
    }

    /// Spawn `future` on this pool.
    pub fn spawn<F>(&self, future: F) -> Result<JoinHandle<F::Output>, ActionError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let handle = match &self.kind {
            ExecutorKind::Ambient => {
                Handle::try_current().map_err(|e| ActionError::NoExecutor(e.to_string()))?
            }
            ExecutorKind::Handle(handle) => handle.clone(),
            ExecutorKind::Dedicated(pool) => pool
                .runtime
                .as_ref()
                .map(|runtime| runtime.handle().clone())
                .ok_or_else(|| ActionError::NoExecutor(format!("{} is shut down", pool.name)))?,
        };
        Ok(handle.spawn(future))
    }
}
