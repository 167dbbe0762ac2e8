//! Per-render mutable context, passed explicitly to every node render.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::error::{RenderError, Warning};

/// Shell-facing side of a render: lets the caller cancel it and poll its
/// progress from another task.
#[derive(Debug, Clone, Default)]
pub struct RenderHandle {
    cancelled: Arc<AtomicBool>,
    progress: Arc<ProgressCounter>,
}

#[derive(Debug, Default)]
struct ProgressCounter {
    done: AtomicUsize,
    total: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.done.min(self.total) as f64 / self.total as f64;
        ratio * 100.0
    }
}

impl RenderHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            done: self.progress.done.load(Ordering::Relaxed),
            total: self.progress.total.load(Ordering::Relaxed),
        }
    }

    /// Whether two handles control the same render.
    pub fn same_render(&self, other: &RenderHandle) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

/// Mutable context owned by exactly one render.
#[derive(Debug)]
pub struct RenderState {
    handle: RenderHandle,
    warnings: Vec<Warning>,
}

impl RenderState {
    pub fn new(handle: RenderHandle) -> Self {
        Self {
            handle,
            warnings: Vec::new(),
        }
    }

    pub fn handle(&self) -> &RenderHandle {
        &self.handle
    }

    /// Cancellation boundary: composite nodes call this before laying out.
    pub fn check_cancelled(&self) -> Result<(), RenderError> {
        if self.handle.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn set_total(&self, total: usize) {
        self.handle.progress.total.store(total, Ordering::Relaxed);
        self.handle.progress.done.store(0, Ordering::Relaxed);
    }

    /// Count `nodes` more nodes as rendered.
    pub fn advance(&self, nodes: usize) {
        self.handle.progress.done.fetch_add(nodes, Ordering::Relaxed);
    }

    pub fn warn(&mut self, warning: Warning) {
        warn!(%warning, "render warning");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
