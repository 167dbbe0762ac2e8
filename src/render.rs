//! Per-node rendering: turns each AST node into positioned shapes.
//!
//! Every node renders at the origin; its parent moves it into place with
//! the layout primitives. Composite nodes (`Sequence`, `Alternation`) are
//! the cancellation boundaries.

use crate::ast::{
    CharacterClass, ClassItem, Direction, Expression, Group, GroupTable, Literal, Lookaround,
    Node, Polarity, RepeatShape, Repetition,
};
use crate::config::RenderConfig;
use crate::error::{RenderError, Warning};
use crate::geometry::{Boxed, PathCmd, Rendered, Shape};
use crate::layout::{finish, space_horizontally, space_vertically, union};
use crate::state::RenderState;

const LABEL_PADDING: f64 = 5.0;
const BOX_PADDING: f64 = 10.0;
const CURVE: f64 = 10.0;
const MARKER_RADIUS: f64 = 5.0;
const ARROW: f64 = 4.0;

/// Everything a node needs while rendering, passed down explicitly.
pub struct RenderContext<'a> {
    pub config: &'a RenderConfig,
    pub groups: &'a GroupTable,
    pub state: &'a mut RenderState,
}

type RenderResult = Result<Rendered, RenderError>;

/// Render a whole expression: begin and end markers around the tree, and
/// the flags caption when there are any.
pub fn render_expression(expr: &Expression, ctx: &mut RenderContext<'_>) -> RenderResult {
    ctx.state.check_cancelled()?;
    let content = render_node(&expr.root, ctx)?;

    let mut items = vec![marker("begin"), content, marker("end")];
    space_horizontally(&mut items, ctx.config.sequence_padding);
    let placed = union(&items);
    let mut children = connectors(&items);
    children.extend(items.into_iter().map(|item| item.shape));

    if !expr.flags.is_empty() {
        let caption = format!("Flags: {}", expr.flags.names().join(", "));
        let (width, height) = ctx.config.text_size(&caption);
        children.push(Shape::Text {
            class: "flags",
            x: placed.x,
            y: placed.y - height - LABEL_PADDING,
            width,
            height,
            content: caption,
        });
    }
    Ok(finish(Shape::group(Some("diagram"), children), None))
}

/// Render one node and its subtree.
pub fn render_node(node: &Node, ctx: &mut RenderContext<'_>) -> RenderResult {
    let rendered = match node {
        Node::Sequence { items } => return render_sequence(items, ctx),
        Node::Alternation { branches } => return render_alternation(branches, ctx),
        Node::Group(group) => render_group(group, ctx)?,
        Node::Lookaround(look) => render_lookaround(look, ctx)?,
        Node::Repetition(repeat) => render_repetition(repeat, ctx)?,
        Node::CharacterClass(class) => {
            let class_name = if class.negated { "charset negated" } else { "charset" };
            label_box(ctx.config, &class_label(class), class_name)
        }
        Node::Literal { literal } => {
            let class_name = match literal {
                Literal::Char(_) => "literal",
                Literal::Any => "any-character",
                Literal::Class(_) | Literal::Escaped(_) => "escape",
            };
            label_box(ctx.config, &literal.label(), class_name)
        }
        Node::Anchor { anchor } => label_box(ctx.config, anchor.label(), "anchor"),
        Node::Backreference { target } => {
            let label = format!("back reference {target}");
            if ctx.groups.resolves(target) {
                label_box(ctx.config, &label, "backref")
            } else {
                ctx.state.warn(Warning::UnresolvedReference(target.clone()));
                label_box(ctx.config, &label, "backref unresolved")
            }
        }
    };
    ctx.state.advance(1);
    Ok(rendered)
}

/// Left-to-right row of items joined by straight links. Runs of plain
/// characters are drawn as a single quoted literal.
fn render_sequence(items: &[Node], ctx: &mut RenderContext<'_>) -> RenderResult {
    ctx.state.check_cancelled()?;

    let mut rendered = Vec::with_capacity(items.len());
    let mut run = String::new();
    for item in items {
        if let Node::Literal {
            literal: Literal::Char(c),
        } = item
        {
            run.push(*c);
            continue;
        }
        flush_literal_run(&mut run, &mut rendered, ctx);
        rendered.push(render_node(item, ctx)?);
    }
    flush_literal_run(&mut run, &mut rendered, ctx);
    ctx.state.advance(1);

    if rendered.is_empty() {
        // Zero-width anchor so connectors still have somewhere to attach.
        return Ok(finish(Shape::group(Some("sequence"), Vec::new()), None));
    }

    space_horizontally(&mut rendered, ctx.config.sequence_padding);
    let first = rendered[0].bbox;
    let last = rendered[rendered.len() - 1].bbox;
    let axis = (first.ax, last.ax2, first.ay);
    let mut children = connectors(&rendered);
    children.extend(rendered.into_iter().map(|item| item.shape));
    Ok(finish(Shape::group(Some("sequence"), children), Some(axis)))
}

fn flush_literal_run(run: &mut String, rendered: &mut Vec<Rendered>, ctx: &mut RenderContext<'_>) {
    if run.is_empty() {
        return;
    }
    let label = format!("\"{run}\"");
    rendered.push(label_box(ctx.config, &label, "literal"));
    ctx.state.advance(run.chars().count());
    run.clear();
}

/// Branches stacked vertically between a fan-out and a fan-in junction.
fn render_alternation(branches: &[Node], ctx: &mut RenderContext<'_>) -> RenderResult {
    ctx.state.check_cancelled()?;

    let mut rendered = branches
        .iter()
        .map(|branch| render_node(branch, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    space_vertically(&mut rendered, ctx.config.alternation_padding);
    let stacked = union(&rendered);
    for item in &mut rendered {
        item.translate(2.0 * CURVE - stacked.x, 0.0);
    }

    let content = union(&rendered);
    let center = content.cy();
    let right = content.x2() + 2.0 * CURVE;

    let mut fan_out = Vec::with_capacity(rendered.len());
    let mut fan_in = Vec::with_capacity(rendered.len());
    for item in &rendered {
        let b = item.bbox;
        fan_out.push(Shape::path("connector", fan_out_path(center, b.ax, b.ay)));
        fan_in.push(Shape::path("connector", fan_in_path(center, right, b.ax2, b.ay)));
    }

    let mut children = vec![
        Shape::group(Some("fan-out"), fan_out),
        Shape::group(Some("fan-in"), fan_in),
    ];
    children.extend(rendered.into_iter().map(|item| item.shape));
    ctx.state.advance(1);
    Ok(finish(
        Shape::group(Some("alternation"), children),
        Some((0.0, right, center)),
    ))
}

/// From the junction at `(0, center)` to a branch's left axis point.
fn fan_out_path(center: f64, ax: f64, ay: f64) -> Vec<PathCmd> {
    let mut cmds = vec![PathCmd::Move(0.0, center)];
    let distance = (ay - center).abs();
    let dir = (ay - center).signum();
    if distance >= 2.0 * CURVE {
        cmds.push(PathCmd::Quad(CURVE, center, CURVE, center + dir * CURVE));
        cmds.push(PathCmd::Line(CURVE, ay - dir * CURVE));
        cmds.push(PathCmd::Quad(CURVE, ay, 2.0 * CURVE, ay));
    } else if distance > 0.0 {
        let mid = (center + ay) / 2.0;
        cmds.push(PathCmd::Quad(CURVE, center, CURVE, mid));
        cmds.push(PathCmd::Quad(CURVE, ay, 2.0 * CURVE, ay));
    }
    cmds.push(PathCmd::Line(ax, ay));
    cmds
}

/// From a branch's right axis point to the junction at `(right, center)`.
fn fan_in_path(center: f64, right: f64, ax2: f64, ay: f64) -> Vec<PathCmd> {
    let mut cmds = vec![PathCmd::Move(ax2, ay)];
    let distance = (ay - center).abs();
    let dir = (center - ay).signum();
    if distance > 0.0 {
        cmds.push(PathCmd::Line(right - 2.0 * CURVE, ay));
    }
    if distance >= 2.0 * CURVE {
        cmds.push(PathCmd::Quad(right - CURVE, ay, right - CURVE, ay + dir * CURVE));
        cmds.push(PathCmd::Line(right - CURVE, center - dir * CURVE));
        cmds.push(PathCmd::Quad(right - CURVE, center, right, center));
    } else if distance > 0.0 {
        let mid = (center + ay) / 2.0;
        cmds.push(PathCmd::Quad(right - CURVE, ay, right - CURVE, mid));
        cmds.push(PathCmd::Quad(right - CURVE, center, right, center));
    } else {
        cmds.push(PathCmd::Line(right, center));
    }
    cmds
}

fn render_group(group: &Group, ctx: &mut RenderContext<'_>) -> RenderResult {
    let content = render_node(&group.body, ctx)?;
    let caption = match (group.index, &group.name) {
        (Some(index), Some(name)) => Some(format!("group #{index}: {name}")),
        (Some(index), None) => Some(format!("group #{index}")),
        _ => None,
    };
    Ok(labeled_box(ctx.config, caption.as_deref(), content, "subexp"))
}

fn render_lookaround(look: &Lookaround, ctx: &mut RenderContext<'_>) -> RenderResult {
    let content = render_node(&look.body, ctx)?;
    let (polarity, class) = match look.polarity {
        Polarity::Positive => ("positive", "lookaround positive"),
        Polarity::Negative => ("negative", "lookaround negative"),
    };
    let direction = match look.direction {
        Direction::Ahead => "lookahead",
        Direction::Behind => "lookbehind",
    };
    let caption = format!("{polarity} {direction}");
    Ok(labeled_box(ctx.config, Some(&caption), content, class))
}

/// Repetition drawn with a skip path above the body when it may match
/// zero times and a loop-back below it when it may match more than once.
fn render_repetition(repeat: &Repetition, ctx: &mut RenderContext<'_>) -> RenderResult {
    let mut content = render_node(&repeat.body, ctx)?;
    let shape = repeat.shape();
    let (skip, looped) = match shape {
        RepeatShape::Optional => (true, false),
        RepeatShape::ZeroOrMore => (true, true),
        RepeatShape::OneOrMore | RepeatShape::AtLeast(_) => (false, true),
        RepeatShape::Exact(_) => (false, false),
        RepeatShape::Bounded(min, _) => (min == 0, true),
    };
    let lead = if skip {
        2.0 * CURVE
    } else if looped {
        CURVE
    } else {
        0.0
    };

    let start = content.bbox;
    content.translate(lead - start.x, 0.0);
    let cb = content.bbox;
    let ay = cb.ay;
    let right = cb.x2() + lead;
    let mut children = Vec::new();

    if lead > 0.0 {
        children.push(Shape::hline(0.0, cb.ax, ay));
        children.push(Shape::hline(cb.ax2, right, ay));
    }
    if skip {
        let top = cb.y - CURVE;
        children.push(Shape::path(
            "connector skip",
            vec![
                PathCmd::Move(0.0, ay),
                PathCmd::Quad(CURVE, ay, CURVE, ay - CURVE),
                PathCmd::Line(CURVE, top + CURVE),
                PathCmd::Quad(CURVE, top, 2.0 * CURVE, top),
                PathCmd::Line(right - 2.0 * CURVE, top),
                PathCmd::Quad(right - CURVE, top, right - CURVE, top + CURVE),
                PathCmd::Line(right - CURVE, ay - CURVE),
                PathCmd::Quad(right - CURVE, ay, right, ay),
            ],
        ));
        children.push(arrow(cb.cx(), top, 1.0));
    }
    let bottom = cb.y2() + CURVE;
    if looped {
        let (x1, x2) = (cb.x, cb.x2());
        children.push(Shape::path(
            "connector loop",
            vec![
                PathCmd::Move(cb.ax2, ay),
                PathCmd::Line(x2, ay),
                PathCmd::Quad(x2 + CURVE, ay, x2 + CURVE, ay + CURVE),
                PathCmd::Line(x2 + CURVE, bottom - CURVE),
                PathCmd::Quad(x2 + CURVE, bottom, x2, bottom),
                PathCmd::Line(x1, bottom),
                PathCmd::Quad(x1 - CURVE, bottom, x1 - CURVE, bottom - CURVE),
                PathCmd::Line(x1 - CURVE, ay + CURVE),
                PathCmd::Quad(x1 - CURVE, ay, x1, ay),
                PathCmd::Line(cb.ax, ay),
            ],
        ));
        children.push(arrow(cb.cx(), bottom, -1.0));
    }

    if let Some(label) = repeat_label(shape, repeat.greedy) {
        let (width, height) = ctx.config.text_size(&label);
        let (label_right, label_top) = if looped {
            (cb.x2() + CURVE, bottom + 2.0)
        } else {
            (cb.x2(), cb.y2() + 2.0)
        };
        children.push(Shape::Text {
            class: "repeat-label",
            x: label_right - width,
            y: label_top,
            width,
            height,
            content: label,
        });
    }

    children.push(content.shape);
    Ok(finish(Shape::group(Some("repeat"), children), Some((0.0, right, ay))))
}

/// Count annotation for a repetition; the plain `?`, `*` and `+` shapes
/// speak for themselves.
pub fn repeat_label(shape: RepeatShape, greedy: bool) -> Option<String> {
    let times = |n: u32| if n == 1 { "1 time".to_string() } else { format!("{n} times") };
    let label = match shape {
        RepeatShape::Optional | RepeatShape::ZeroOrMore | RepeatShape::OneOrMore => None,
        RepeatShape::Exact(n) => Some(times(n)),
        RepeatShape::Bounded(min, max) => Some(format!("{min}\u{2013}{max} times")),
        RepeatShape::AtLeast(min) => Some(format!("{min}+ times")),
    };
    match (label, greedy) {
        (label, true) => label,
        (Some(label), false) => Some(format!("{label} (lazy)")),
        (None, false) => Some("lazy".to_string()),
    }
}

/// Small arrowhead centred on `(x, y)`; `dir` is +1 for rightwards, -1 for leftwards.
fn arrow(x: f64, y: f64, dir: f64) -> Shape {
    Shape::path(
        "arrow",
        vec![
            PathCmd::Move(x - dir * ARROW, y - ARROW),
            PathCmd::Line(x + dir * ARROW / 2.0, y),
            PathCmd::Line(x - dir * ARROW, y + ARROW),
        ],
    )
}

/// Straight links between adjacent, already-spaced items.
fn connectors(items: &[Rendered]) -> Vec<Shape> {
    items
        .windows(2)
        .map(|pair| Shape::hline(pair[0].bbox.ax2, pair[1].bbox.ax, pair[0].bbox.ay))
        .collect()
}

fn marker(class: &'static str) -> Rendered {
    let circle = Shape::Circle {
        class,
        cx: MARKER_RADIUS,
        cy: MARKER_RADIUS,
        r: MARKER_RADIUS,
    };
    finish(Shape::group(Some("marker"), vec![circle]), None)
}

/// A single line of text in a padded, rounded box.
fn label_box(config: &RenderConfig, text: &str, class: &'static str) -> Rendered {
    let (width, height) = config.text_size(text);
    let rect = Shape::Rect {
        class: "label",
        x: 0.0,
        y: 0.0,
        width: width + 2.0 * LABEL_PADDING,
        height: height + 2.0 * LABEL_PADDING,
        rx: 3.0,
    };
    let label = Shape::Text {
        class: "label-text",
        x: LABEL_PADDING,
        y: LABEL_PADDING,
        width,
        height,
        content: text.to_string(),
    };
    finish(Shape::group(Some(class), vec![rect, label]), None)
}

/// Wrap rendered content in a rectangle with an optional caption above
/// it. The box's axis runs from the rectangle's edges at the content's
/// baseline.
fn labeled_box(
    config: &RenderConfig,
    caption: Option<&str>,
    content: Rendered,
    class: &'static str,
) -> Rendered {
    let cb = content.bbox;
    let (x, y) = (cb.x - BOX_PADDING, cb.y - BOX_PADDING);
    let (width, height) = (cb.width + 2.0 * BOX_PADDING, cb.height + 2.0 * BOX_PADDING);

    let mut children = Vec::new();
    if let Some(caption) = caption {
        let (text_width, text_height) = config.text_size(caption);
        children.push(Shape::Text {
            class: "caption",
            x,
            y: y - text_height - 2.0,
            width: text_width,
            height: text_height,
            content: caption.to_string(),
        });
    }
    children.push(Shape::Rect {
        class: "box",
        x,
        y,
        width,
        height,
        rx: 3.0,
    });
    children.push(Shape::hline(x, cb.ax, cb.ay));
    children.push(Shape::hline(cb.ax2, x + width, cb.ay));
    children.push(content.shape);
    finish(Shape::group(Some(class), children), Some((x, x + width, cb.ay)))
}

/// Source-like text for a class, e.g. `[a-z0-9]` or `[^\d_]`.
pub fn class_label(class: &CharacterClass) -> String {
    let mut out = String::from("[");
    if class.negated {
        out.push('^');
    }
    for item in &class.items {
        match *item {
            ClassItem::Char(c) => push_class_char(&mut out, c),
            ClassItem::Range(lo, hi) => {
                push_class_char(&mut out, lo);
                out.push('-');
                push_class_char(&mut out, hi);
            }
            ClassItem::Escape(escape) => out.push_str(escape.source()),
        }
    }
    out.push(']');
    out
}

fn push_class_char(out: &mut String, c: char) {
    match c {
        '\\' | ']' | '^' | '-' => {
            out.push('\\');
            out.push(c);
        }
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
        c => out.push(c),
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
