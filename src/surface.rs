//! Drawable targets a finished diagram is mounted into.

use std::fmt::Write;

use bytes::{BufMut, Bytes, BytesMut};

use crate::geometry::{PathCmd, Shape};

/// A container that can host a finished drawing. The caller owns it; the
/// orchestrator only touches it once a render has completed.
pub trait Surface {
    /// Replace whatever is drawn with `drawing`.
    fn mount(&mut self, drawing: Shape);
    fn resize(&mut self, width: f64, height: f64);
}

const STYLE: &str = "\
text{font-family:Arial,Helvetica,sans-serif;font-size:12px}\
rect.label{fill:#bada55;stroke:#000;stroke-width:2}\
.literal>.label{fill:#dae9e5}\
.escape>.label,.any-character>.label,.anchor>.label{fill:#bada55}\
.charset>.label{fill:#cbcbba}\
.backref>.label{fill:#e6c9a8}\
.unresolved>.label{fill:#f2b8b8;stroke-dasharray:4,2}\
.box{fill:none;stroke:#908c83;stroke-width:2}\
.lookaround>.box{stroke-dasharray:6,2}\
.negative>.box{stroke:#b00}\
.connector{fill:none;stroke:#000;stroke-width:2}\
.arrow{fill:none;stroke:#000;stroke-width:2}\
.begin,.end{fill:#6b6659;stroke:#000;stroke-width:2}\
.caption,.repeat-label,.flags{font-size:10px}";

/// In-memory SVG document.
#[derive(Debug, Clone, Default)]
pub struct SvgSurface {
    drawing: Option<Shape>,
    width: f64,
    height: f64,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        self.drawing.is_none()
    }

    pub fn drawing(&self) -> Option<&Shape> {
        self.drawing.as_ref()
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Serialize as a standalone SVG document.
    pub fn to_svg(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(4096);
        out.put_slice(b"<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\"");
        // Writing into BytesMut cannot fail.
        let _ = write!(out, " width=\"{}\" height=\"{}\">", num(self.width), num(self.height));
        out.put_slice(b"<style>");
        out.put_slice(STYLE.as_bytes());
        out.put_slice(b"</style>");
        if let Some(drawing) = &self.drawing {
            write_shape(&mut out, drawing);
        }
        out.put_slice(b"</svg>\n");
        out.freeze()
    }
}

impl Surface for SvgSurface {
    fn mount(&mut self, drawing: Shape) {
        self.drawing = Some(drawing);
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }
}

fn write_shape(out: &mut BytesMut, shape: &Shape) {
    let _ = match shape {
        Shape::Group {
            class,
            dx,
            dy,
            children,
        } => {
            let _ = write!(out, "<g");
            if let Some(class) = class {
                let _ = write!(out, " class=\"{class}\"");
            }
            if *dx != 0.0 || *dy != 0.0 {
                let _ = write!(out, " transform=\"translate({} {})\"", num(*dx), num(*dy));
            }
            out.put_u8(b'>');
            for child in children {
                write_shape(out, child);
            }
            write!(out, "</g>")
        }
        Shape::Rect {
            class,
            x,
            y,
            width,
            height,
            rx,
        } => write!(
            out,
            "<rect class=\"{class}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\"/>",
            num(*x),
            num(*y),
            num(*width),
            num(*height),
            num(*rx)
        ),
        Shape::Circle { class, cx, cy, r } => write!(
            out,
            "<circle class=\"{class}\" cx=\"{}\" cy=\"{}\" r=\"{}\"/>",
            num(*cx),
            num(*cy),
            num(*r)
        ),
        Shape::Text {
            class,
            x,
            y,
            height,
            content,
            ..
        } => {
            // SVG text is positioned by its baseline.
            let baseline = y + height * 0.8;
            write!(
                out,
                "<text class=\"{class}\" x=\"{}\" y=\"{}\">{}</text>",
                num(*x),
                num(baseline),
                escape_xml(content)
            )
        }
        Shape::Path { class, commands } => {
            write!(out, "<path class=\"{class}\" d=\"{}\"/>", path_data(commands))
        }
    };
}

pub fn path_data(commands: &[PathCmd]) -> String {
    let mut d = String::new();
    for cmd in commands {
        if !d.is_empty() {
            d.push(' ');
        }
        let _ = match *cmd {
            PathCmd::Move(x, y) => write!(d, "M{},{}", num(x), num(y)),
            PathCmd::Line(x, y) => write!(d, "L{},{}", num(x), num(y)),
            PathCmd::Quad(cx, cy, x, y) => {
                write!(d, "Q{},{} {},{}", num(cx), num(cy), num(x), num(y))
            }
        };
    }
    d
}

/// Compact number formatting: integers without a fraction, others to two places.
fn num(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let formatted = format!("{value:.2}");
        formatted.trim_end_matches('0').to_string()
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "surface_test.rs"]
mod tests;
