//! Layout primitives shared by every composite node.
//!
//! Composite nodes never position children by hand: they render children
//! at the origin and then hand them to [`space_horizontally`] or
//! [`space_vertically`].

use crate::geometry::{BBox, Boxed, RawBox, Rendered, Shape};

/// Fill in axis points the renderer did not set: `ax` defaults to the left
/// edge, `ax2` to the right edge and `ay` to the vertical center.
pub fn normalize(raw: RawBox) -> BBox {
    BBox {
        x: raw.x,
        y: raw.y,
        width: raw.width,
        height: raw.height,
        ax: raw.ax.unwrap_or(raw.x),
        ax2: raw.ax2.unwrap_or(raw.x + raw.width),
        ay: raw.ay.unwrap_or(raw.y + raw.height / 2.0),
    }
}

/// Lay items out in a row with `padding` between them and their axis
/// points on one baseline (the lowest `ay` among them).
pub fn space_horizontally<T: Boxed>(items: &mut [T], padding: f64) {
    let boxes: Vec<BBox> = items.iter().map(Boxed::bbox).collect();
    let baseline = boxes.iter().fold(0.0_f64, |center, b| center.max(b.ay));

    let mut offset = 0.0;
    for (item, b) in items.iter_mut().zip(&boxes) {
        item.translate(offset - b.x, baseline - b.ay);
        offset += b.width + padding;
    }
}

/// Stack items in a column with `padding` between them, centered on the
/// widest item's horizontal center.
pub fn space_vertically<T: Boxed>(items: &mut [T], padding: f64) {
    let boxes: Vec<BBox> = items.iter().map(Boxed::bbox).collect();
    let center = boxes.iter().fold(0.0_f64, |center, b| center.max(b.cx()));

    let mut offset = 0.0;
    for (item, b) in items.iter_mut().zip(&boxes) {
        item.translate(center - b.cx(), offset - b.y);
        offset += b.height + padding;
    }
}

/// Measure a finished drawing and attach optional explicit axis points.
pub fn finish(shape: Shape, axis: Option<(f64, f64, f64)>) -> Rendered {
    let mut raw = shape.measure();
    if let Some((ax, ax2, ay)) = axis {
        raw = raw.with_axis(ax, ax2, ay);
    }
    Rendered {
        shape,
        bbox: normalize(raw),
    }
}

/// Union of already-positioned items' boxes.
pub fn union<T: Boxed>(items: &[T]) -> BBox {
    let mut extent = crate::geometry::Extent::default();
    for item in items {
        let b = item.bbox();
        extent.add_box(b.x, b.y, b.width, b.height);
    }
    normalize(extent.to_raw())
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
