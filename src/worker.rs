//! Background execution of a run for interactive front-ends.
//!
//! A window or other event loop must stay responsive while files are moved,
//! so the whole run is handed to a worker thread. The organizer itself stays
//! synchronous on that thread; the front-end learns about completion through
//! exactly one [`RunCompletion`] message, which it can poll from its own loop
//! or block on.

use crate::file_organizer::OrganizeError;
use crate::run::{OrganizerRun, RunReport};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// The single message a worker sends when its run ends.
pub type RunCompletion = Result<RunReport, OrganizeError>;

/// Status line a front-end can show while a worker is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Running,
    Completed,
    Failed,
}

impl WorkerStatus {
    pub fn label(&self) -> &'static str {
        match self {
            WorkerStatus::Running => "Organizing...",
            WorkerStatus::Completed => "Completed.",
            WorkerStatus::Failed => "Error",
        }
    }
}

/// Handle to a run executing on a background thread.
pub struct RunWorker {
    status: WorkerStatus,
    receiver: Receiver<RunCompletion>,
    handle: Option<JoinHandle<()>>,
}

impl RunWorker {
    /// Starts `run` on a new thread.
    pub fn spawn(run: OrganizerRun) -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || {
            info!(
                source = %run.source_dir().display(),
                target = %run.target_dir().display(),
                mode = run.mode().name(),
                "worker started"
            );
            let completion = run.execute();
            if let Err(e) = &completion {
                error!(error = %e, "worker run failed");
            }
            // The front-end may have gone away; nothing left to notify.
            let _ = sender.send(completion);
        });

        Self {
            status: WorkerStatus::Running,
            receiver,
            handle: Some(handle),
        }
    }

    /// Starts `run` and calls `on_complete` from the worker thread when done.
    pub fn spawn_with_callback<F>(run: OrganizerRun, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(RunCompletion) + Send + 'static,
    {
        thread::spawn(move || on_complete(run.execute()))
    }

    pub fn status(&self) -> WorkerStatus {
        self.status
    }

    /// Checks for completion without blocking.
    ///
    /// Returns the completion once; later calls return `None` and
    /// [`status`](Self::status) keeps reporting the final state.
    pub fn poll(&mut self) -> Option<RunCompletion> {
        match self.receiver.try_recv() {
            Ok(completion) => Some(self.finish(completion)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if self.status == WorkerStatus::Running {
                    self.status = WorkerStatus::Failed;
                }
                None
            }
        }
    }

    /// Blocks until the run ends.
    ///
    /// Returns `None` if the worker thread panicked or the completion was
    /// already taken by [`poll`](Self::poll).
    pub fn wait(mut self) -> Option<RunCompletion> {
        let received = self.receiver.recv().ok();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        received.map(|completion| self.finish(completion))
    }

    fn finish(&mut self, completion: RunCompletion) -> RunCompletion {
        self.status = match &completion {
            Ok(report) if report.is_clean() => WorkerStatus::Completed,
            _ => WorkerStatus::Failed,
        };
        completion
    }
}
