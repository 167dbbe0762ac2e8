pub mod ast;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod orchestrator;
pub mod parser;
pub mod render;
pub mod state;
pub mod surface;

use bytes::Bytes;

pub use crate::ast::Expression;
pub use crate::config::RenderConfig;
pub use crate::error::{ConfigError, RenderError, SyntaxError, Warning};
pub use crate::orchestrator::{render_tree, RenderOutput, Renderer};
pub use crate::parser::parse;
pub use crate::state::{Progress, RenderHandle, RenderState};
pub use crate::surface::{Surface, SvgSurface};

/// Parse `source` and render it into a fresh SVG document.
pub async fn render_svg(
    source: &str,
    config: &RenderConfig,
) -> Result<(Bytes, RenderOutput), RenderError> {
    let expr = parse(source)?;
    let mut surface = SvgSurface::new();
    let output = render_tree(
        &expr,
        &mut surface,
        RenderState::new(RenderHandle::new()),
        config,
    )
    .await?;
    Ok((surface.to_svg(), output))
}
