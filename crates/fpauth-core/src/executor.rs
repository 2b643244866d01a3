//! Dedicated single-worker executor for platform prompt callbacks
//!
//! Prompt events are consumed on one OS thread running a current-thread Tokio
//! runtime, so platform callback delivery never blocks the caller's thread.

use futures_util::future::BoxFuture;
use std::future::Future;
use std::thread;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cancel::CancellationSignal;
use crate::error::{FpAuthError, Result};

/// Handle to the worker thread
///
/// The worker exits when every handle is dropped or on [`PromptExecutor::shutdown`].
/// Jobs still running at that point are dropped.
#[derive(Debug, Clone)]
pub struct PromptExecutor {
    job_tx: mpsc::UnboundedSender<BoxFuture<'static, ()>>,
    stop: CancellationSignal,
}

impl PromptExecutor {
    /// Start the worker thread
    pub fn spawn(name: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (job_tx, mut job_rx) = mpsc::unbounded_channel::<BoxFuture<'static, ()>>();
        let stop = CancellationSignal::new();
        let worker_stop = stop.clone();
        let thread_name = name.to_string();

        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                runtime.block_on(async move {
                    loop {
                        tokio::select! {
                            job = job_rx.recv() => match job {
                                Some(job) => {
                                    tokio::spawn(job);
                                }
                                None => break,
                            },
                            _ = worker_stop.cancelled() => break,
                        }
                    }
                });
                debug!("Prompt executor {} stopped", thread_name);
            })?;

        Ok(Self { job_tx, stop })
    }

    /// Queue a job on the worker
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_stopped() {
            return Err(FpAuthError::Executor("prompt executor has stopped".to_string()));
        }

        self.job_tx
            .send(Box::pin(job))
            .map_err(|_| FpAuthError::Executor("prompt executor has stopped".to_string()))
    }

    /// Stop the worker; later jobs are refused
    pub fn shutdown(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}
