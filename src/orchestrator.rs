//! Drives one render from AST to mounted drawing, and serializes requests so
//! at most one render is active at a time.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info};

use crate::ast::Expression;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::geometry::Boxed;
use crate::layout::normalize;
use crate::parser::parse;
use crate::render::{render_expression, RenderContext};
use crate::state::{Progress, RenderHandle, RenderState};
use crate::surface::Surface;

/// What a successful render hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    /// Final surface size, margins included.
    pub width: f64,
    pub height: f64,
    pub warnings: Vec<String>,
}

/// Render `expr` into `surface`.
///
/// Yields once before traversal so the caller can show a loading state.
/// The surface is only touched once traversal has finished uncancelled. A
/// render whose cancel flag is raised at any point settles with
/// [`RenderError::Cancelled`]; if that happens during mounting, the drawing
/// is left for whichever render pre-empted it to replace.
pub async fn render_tree<S: Surface>(
    expr: &Expression,
    surface: &mut S,
    mut state: RenderState,
    config: &RenderConfig,
) -> Result<RenderOutput, RenderError> {
    let nodes = expr.root.count();
    state.set_total(nodes);
    tokio::task::yield_now().await;
    state.check_cancelled()?;

    debug!(nodes, "render started");
    let mut rendered = {
        let mut ctx = RenderContext {
            config,
            groups: &expr.groups,
            state: &mut state,
        };
        render_expression(expr, &mut ctx)?
    };

    if state.handle().is_cancelled() {
        debug!("discarding result of cancelled render");
        return Err(RenderError::Cancelled);
    }

    let bbox = normalize(rendered.shape.measure());
    if !bbox.is_finite() {
        return Err(RenderError::Geometry(format!(
            "drawing has non-finite bounds {bbox:?}"
        )));
    }
    rendered.translate(config.margin - bbox.x, config.margin - bbox.y);

    let width = bbox.width + 2.0 * config.margin;
    let height = bbox.height + 2.0 * config.margin;
    surface.mount(rendered.shape);
    surface.resize(width, height);
    // A newer render may have pre-empted this one while it was mounting;
    // that render will overwrite the surface.
    if state.handle().is_cancelled() {
        debug!("render cancelled while mounting");
        return Err(RenderError::Cancelled);
    }
    debug!(width, height, "render finished");

    Ok(RenderOutput {
        width,
        height,
        warnings: state.into_warnings(),
    })
}

/// Owns a surface and renders source strings into it, one at a time.
///
/// A new request cancels whatever render is active and waits
/// `config.cancel_delay` for it to unwind before claiming the slot.
#[derive(Debug)]
pub struct Renderer<S> {
    config: RenderConfig,
    surface: tokio::sync::Mutex<S>,
    running: Mutex<Option<RenderHandle>>,
}

impl<S: Surface> Renderer<S> {
    pub fn new(surface: S, config: RenderConfig) -> Self {
        Self {
            config,
            surface: tokio::sync::Mutex::new(surface),
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn surface(&self) -> &tokio::sync::Mutex<S> {
        &self.surface
    }

    /// Handle of the active render, if there is one.
    pub fn active(&self) -> Option<RenderHandle> {
        self.slot().clone()
    }

    /// Ask the active render to stop. Returns whether there was one.
    pub fn cancel(&self) -> bool {
        match self.active() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn progress(&self) -> Option<Progress> {
        self.active().map(|handle| handle.progress())
    }

    /// Parse `source` and render it into the surface.
    pub async fn show_expression(&self, source: &str) -> Result<RenderOutput, RenderError> {
        let handle = self.claim().await;
        let _slot = ActiveRender {
            running: &self.running,
            handle: handle.clone(),
        };

        let expr = parse(source)?;
        let mut surface = self.surface.lock().await;
        render_tree(&expr, &mut *surface, RenderState::new(handle), &self.config).await
    }

    async fn claim(&self) -> RenderHandle {
        loop {
            let previous = {
                let mut running = self.slot();
                match running.as_ref() {
                    Some(active) => active.clone(),
                    None => {
                        let handle = RenderHandle::new();
                        *running = Some(handle.clone());
                        return handle;
                    }
                }
            };
            info!("cancelling in-flight render for new request");
            previous.cancel();
            tokio::time::sleep(self.config.cancel_delay).await;
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<RenderHandle>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the active slot when a render settles, unless a newer render
/// has already taken it.
struct ActiveRender<'a> {
    running: &'a Mutex<Option<RenderHandle>>,
    handle: RenderHandle,
}

impl Drop for ActiveRender<'_> {
    fn drop(&mut self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running
            .as_ref()
            .is_some_and(|active| active.same_render(&self.handle))
        {
            *running = None;
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
