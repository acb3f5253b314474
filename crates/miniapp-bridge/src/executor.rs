// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// "Post to UI thread" capability.
//
// UI objects must be built on the surface's main thread. The dispatcher
// never touches platform threading directly; it posts a task here and
// reports whether scheduling succeeded.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use miniapp_core::error::Result;

/// Work to run on the UI thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

pub trait UiExecutor: Send + Sync {
    /// Schedule `task`. Returns once scheduled, never waits for it to run.
    fn post(&self, task: UiTask) -> Result<()>;
}

/// Runs tasks immediately on the calling thread. For hosts whose dispatch
/// thread already is the UI thread, and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl UiExecutor for InlineExecutor {
    fn post(&self, task: UiTask) -> Result<()> {
        task();
        Ok(())
    }
}

type Wake = Box<dyn Fn() -> Result<()> + Send + Sync>;

/// Queues tasks and asks the host to drain them on its UI thread.
///
/// `wake` is called after every post; the host answers by calling
/// [`QueuedExecutor::run_pending`] from the UI thread.
pub struct QueuedExecutor {
    queue: Mutex<Queue>,
    wake: Wake,
}

#[derive(Default)]
struct Queue {
    next_id: u64,
    tasks: VecDeque<(u64, UiTask)>,
}

impl QueuedExecutor {
    pub fn new(wake: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        Self {
            queue: Mutex::new(Queue::default()),
            wake: Box::new(wake),
        }
    }

    /// Run everything queued so far. Must be called on the UI thread.
    pub fn run_pending(&self) -> usize {
        let drained: Vec<(u64, UiTask)> = self.lock().tasks.drain(..).collect();
        let count = drained.len();
        for (_, task) in drained {
            task();
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.lock().tasks.len()
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UiExecutor for QueuedExecutor {
    fn post(&self, task: UiTask) -> Result<()> {
        let id = {
            let mut queue = self.lock();
            let id = queue.next_id;
            queue.next_id = queue.next_id.wrapping_add(1);
            queue.tasks.push_back((id, task));
            id
        };
        let Err(e) = (self.wake)() else {
            return Ok(());
        };

        // Nothing will drain it; drop this task rather than run it late.
        let mut queue = self.lock();
        match queue.tasks.iter().position(|(queued, _)| *queued == id) {
            Some(index) => {
                queue.tasks.remove(index);
                tracing::warn!(error = %e, "UI executor wake failed");
                Err(e)
            }
            None => {
                // A drain already ran it.
                tracing::debug!(error = %e, "UI executor wake failed after task ran");
                Ok(())
            }
        }
    }
}
