//! Vector primitives produced by rendering: shapes, paths and bounding boxes.

/// An axis-aligned box as measured from drawn shapes, before axis points
/// are known.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub ax: Option<f64>,
    pub ax2: Option<f64>,
    pub ay: Option<f64>,
}

/// A bounding box with its connection axis: `ax`/`ax2` are where lines
/// attach on the left/right, `ay` is the shared baseline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub ax: f64,
    pub ax2: f64,
    pub ay: f64,
}

impl RawBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_axis(mut self, ax: f64, ax2: f64, ay: f64) -> Self {
        self.ax = Some(ax);
        self.ax2 = Some(ax2);
        self.ay = Some(ay);
        self
    }
}

impl BBox {
    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    pub fn y2(&self) -> f64 {
        self.y + self.height
    }

    pub fn cx(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn cy(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ax: self.ax + dx,
            ax2: self.ax2 + dx,
            ay: self.ay + dy,
            ..*self
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height, self.ax, self.ax2, self.ay]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Running union of points and boxes.
#[derive(Debug, Clone, Copy)]
pub struct Extent {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }
}

impl Extent {
    pub fn add_point(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn add_box(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.add_point(x, y);
        self.add_point(x + width, y + height);
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    /// The union as a box; an empty extent is a zero-size box at the origin.
    pub fn to_raw(self) -> RawBox {
        if self.is_empty() {
            return RawBox::default();
        }
        RawBox::new(
            self.min_x,
            self.min_y,
            self.max_x - self.min_x,
            self.max_y - self.min_y,
        )
    }
}

/// Absolute path commands. Curves are quadratic with a single control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    Move(f64, f64),
    Line(f64, f64),
    Quad(f64, f64, f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Group {
        class: Option<&'static str>,
        dx: f64,
        dy: f64,
        children: Vec<Shape>,
    },
    Rect {
        class: &'static str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
    },
    Circle {
        class: &'static str,
        cx: f64,
        cy: f64,
        r: f64,
    },
    /// `x`/`y` is the top-left of the text box; `width`/`height` are the
    /// measured text extent.
    Text {
        class: &'static str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        content: String,
    },
    Path {
        class: &'static str,
        commands: Vec<PathCmd>,
    },
}

impl Shape {
    pub fn group(class: Option<&'static str>, children: Vec<Shape>) -> Self {
        Shape::Group {
            class,
            dx: 0.0,
            dy: 0.0,
            children,
        }
    }

    pub fn path(class: &'static str, commands: Vec<PathCmd>) -> Self {
        Shape::Path { class, commands }
    }

    /// Straight horizontal connector.
    pub fn hline(x1: f64, x2: f64, y: f64) -> Self {
        Shape::path("connector", vec![PathCmd::Move(x1, y), PathCmd::Line(x2, y)])
    }

    pub fn class(&self) -> Option<&'static str> {
        match self {
            Shape::Group { class, .. } => *class,
            Shape::Rect { class, .. }
            | Shape::Circle { class, .. }
            | Shape::Text { class, .. }
            | Shape::Path { class, .. } => Some(class),
        }
    }

    pub fn translate(&mut self, by_x: f64, by_y: f64) {
        match self {
            Shape::Group { dx, dy, .. } => {
                *dx += by_x;
                *dy += by_y;
            }
            Shape::Rect { x, y, .. } | Shape::Text { x, y, .. } => {
                *x += by_x;
                *y += by_y;
            }
            Shape::Circle { cx, cy, .. } => {
                *cx += by_x;
                *cy += by_y;
            }
            Shape::Path { commands, .. } => {
                for cmd in commands {
                    *cmd = match *cmd {
                        PathCmd::Move(x, y) => PathCmd::Move(x + by_x, y + by_y),
                        PathCmd::Line(x, y) => PathCmd::Line(x + by_x, y + by_y),
                        PathCmd::Quad(cx, cy, x, y) => {
                            PathCmd::Quad(cx + by_x, cy + by_y, x + by_x, y + by_y)
                        }
                    };
                }
            }
        }
    }

    /// Bounding extent in the parent's coordinates. Curve control points
    /// are included, which slightly over-approximates curves.
    pub fn extend(&self, extent: &mut Extent) {
        self.extend_offset(extent, 0.0, 0.0);
    }

    fn extend_offset(&self, extent: &mut Extent, ox: f64, oy: f64) {
        match self {
            Shape::Group {
                dx, dy, children, ..
            } => {
                for child in children {
                    child.extend_offset(extent, ox + dx, oy + dy);
                }
            }
            Shape::Rect {
                x, y, width, height, ..
            }
            | Shape::Text {
                x, y, width, height, ..
            } => extent.add_box(ox + x, oy + y, *width, *height),
            Shape::Circle { cx, cy, r, .. } => {
                extent.add_box(ox + cx - r, oy + cy - r, 2.0 * r, 2.0 * r);
            }
            Shape::Path { commands, .. } => {
                for cmd in commands {
                    match *cmd {
                        PathCmd::Move(x, y) | PathCmd::Line(x, y) => {
                            extent.add_point(ox + x, oy + y);
                        }
                        PathCmd::Quad(cx, cy, x, y) => {
                            extent.add_point(ox + cx, oy + cy);
                            extent.add_point(ox + x, oy + y);
                        }
                    }
                }
            }
        }
    }

    pub fn measure(&self) -> RawBox {
        let mut extent = Extent::default();
        self.extend(&mut extent);
        extent.to_raw()
    }

    /// Depth-first visit of this shape and all descendants.
    pub fn walk<'s>(&'s self, visit: &mut impl FnMut(&'s Shape)) {
        visit(self);
        if let Shape::Group { children, .. } = self {
            for child in children {
                child.walk(visit);
            }
        }
    }
}

/// Anything with a bounding box that can be moved. Layout is written
/// against this so it can position rendered nodes and bare boxes alike.
pub trait Boxed {
    fn bbox(&self) -> BBox;
    fn translate(&mut self, dx: f64, dy: f64);
}

impl Boxed for BBox {
    fn bbox(&self) -> BBox {
        *self
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        *self = self.translated(dx, dy);
    }
}

/// The output of rendering one node: its drawing plus its normalized box,
/// both in the parent's coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub shape: Shape,
    pub bbox: BBox,
}

impl Boxed for Rendered {
    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.shape.translate(dx, dy);
        self.bbox = self.bbox.translated(dx, dy);
    }
}
