// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use svgtypes::PointsParser;

use super::path::Path;
use crate::geom::{Rect, Size, Transform};
use crate::tree::{ElementKind, PrimitiveElement};

/// A shape geometry in the VML group coordinates.
#[derive(Clone, Debug)]
pub(crate) enum Geometry {
    Rect(Rect),
    RoundRect { rect: Rect, arcsize: f64 },
    Oval(Rect),
    Line { from: (f64, f64), to: (f64, f64) },
    Polyline(Vec<(f64, f64)>),
    /// An arbitrary outline. Used for paths, polygons and transformed shapes.
    Shape(Path),
}

impl Geometry {
    /// Checks that the geometry has an interior that can be filled.
    pub fn can_fill(&self) -> bool {
        !matches!(self, Geometry::Line { .. } | Geometry::Polyline(_))
    }
}

/// Converts a primitive into a VML geometry.
///
/// `ts` maps user coordinates into the group coordinates.
/// `base` is used to resolve percentage lengths.
///
/// Returns a reason when the primitive is degenerate and must be skipped.
pub(crate) fn convert(
    el: &PrimitiveElement,
    ts: &Transform,
    base: Size,
) -> Result<Geometry, String> {
    match el.kind {
        ElementKind::Rect => convert_rect(el, ts, base),
        ElementKind::Circle => convert_circle(el, ts, base),
        ElementKind::Ellipse => convert_ellipse(el, ts, base),
        ElementKind::Line => convert_line(el, ts, base),
        ElementKind::Polyline => {
            let points = parse_points(el)?;
            Ok(Geometry::Polyline(
                points.into_iter().map(|(x, y)| ts.apply(x, y)).collect(),
            ))
        }
        ElementKind::Polygon => {
            let points = parse_points(el)?;
            Ok(Geometry::Shape(Path::from_points(&points, true).transform(ts)))
        }
        ElementKind::Path => {
            let path = Path::from_data(el.attribute("d").unwrap_or_default());
            if !path.has_area() {
                return Err("a path without drawing commands was skipped".to_string());
            }

            Ok(Geometry::Shape(path.transform(ts)))
        }
        ElementKind::Unsupported(ref name) => Err(format!("'{}' cannot be converted", name)),
    }
}

/// Returns a base for radius-like lengths, like `r`.
fn diagonal(base: Size) -> f64 {
    ((base.width() * base.width() + base.height() * base.height()) / 2.0).sqrt()
}

fn convert_rect(el: &PrimitiveElement, ts: &Transform, base: Size) -> Result<Geometry, String> {
    let width = el.length("width", base.width()).unwrap_or(0.0);
    let height = el.length("height", base.height()).unwrap_or(0.0);
    if !(width > 0.0 && height > 0.0) {
        return Err("a rect with a non-positive size was skipped".to_string());
    }

    let x = el.length("x", base.width()).unwrap_or(0.0);
    let y = el.length("y", base.height()).unwrap_or(0.0);
    let rect = Rect::from_xywh(x, y, width, height)
        .ok_or_else(|| "a rect with an invalid size was skipped".to_string())?;

    let (rx, ry) = resolve_rx_ry(el, base);
    // Clamp rx/ry to the half of the width/height.
    let rx = rx.min(width / 2.0);
    let ry = ry.min(height / 2.0);
    let is_rounded = rx > 0.0 && ry > 0.0;

    match ts.map_rect(rect) {
        Some(mapped) if is_rounded => {
            let radius = (rx * ts.scale_x()).min(ry * ts.scale_y());
            let half_side = mapped.width().min(mapped.height()) / 2.0;
            let arcsize = if half_side > 0.0 {
                (radius / half_side).min(1.0)
            } else {
                0.0
            };

            Ok(Geometry::RoundRect {
                rect: mapped,
                arcsize,
            })
        }
        Some(mapped) => Ok(Geometry::Rect(mapped)),
        None => {
            let (rx, ry) = if is_rounded { (rx, ry) } else { (0.0, 0.0) };
            Ok(Geometry::Shape(Path::from_rect(rect, rx, ry).transform(ts)))
        }
    }
}

fn resolve_rx_ry(el: &PrimitiveElement, base: Size) -> (f64, f64) {
    let valid = |v: Option<f64>| v.filter(|n| *n >= 0.0);
    let rx = valid(el.length("rx", base.width()));
    let ry = valid(el.length("ry", base.height()));

    match (rx, ry) {
        (None, None) => (0.0, 0.0),
        (Some(rx), None) => (rx, rx),
        (None, Some(ry)) => (ry, ry),
        (Some(rx), Some(ry)) => (rx, ry),
    }
}

fn convert_circle(el: &PrimitiveElement, ts: &Transform, base: Size) -> Result<Geometry, String> {
    let r = el.length("r", diagonal(base)).unwrap_or(0.0);
    if !(r > 0.0) {
        return Err("a circle with a non-positive radius was skipped".to_string());
    }

    let cx = el.length("cx", base.width()).unwrap_or(0.0);
    let cy = el.length("cy", base.height()).unwrap_or(0.0);

    if ts.is_axis_aligned() {
        // A circle has no independent X and Y radii, so it stays a circle.
        let (x, y) = ts.apply(cx, cy);
        let r = r * ts.min_scale();
        let rect = Rect::from_xywh(x - r, y - r, r * 2.0, r * 2.0)
            .ok_or_else(|| "a circle with an invalid size was skipped".to_string())?;
        Ok(Geometry::Oval(rect))
    } else {
        Ok(Geometry::Shape(Path::from_ellipse(cx, cy, r, r).transform(ts)))
    }
}

fn convert_ellipse(el: &PrimitiveElement, ts: &Transform, base: Size) -> Result<Geometry, String> {
    let (rx, ry) = resolve_rx_ry(el, base);
    if !(rx > 0.0 && ry > 0.0) {
        return Err("an ellipse with a non-positive radius was skipped".to_string());
    }

    let cx = el.length("cx", base.width()).unwrap_or(0.0);
    let cy = el.length("cy", base.height()).unwrap_or(0.0);
    let rect = Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0)
        .ok_or_else(|| "an ellipse with an invalid size was skipped".to_string())?;

    match ts.map_rect(rect) {
        Some(mapped) => Ok(Geometry::Oval(mapped)),
        None => Ok(Geometry::Shape(
            Path::from_ellipse(cx, cy, rx, ry).transform(ts),
        )),
    }
}

fn convert_line(el: &PrimitiveElement, ts: &Transform, base: Size) -> Result<Geometry, String> {
    let x1 = el.length("x1", base.width()).unwrap_or(0.0);
    let y1 = el.length("y1", base.height()).unwrap_or(0.0);
    let x2 = el.length("x2", base.width()).unwrap_or(0.0);
    let y2 = el.length("y2", base.height()).unwrap_or(0.0);

    Ok(Geometry::Line {
        from: ts.apply(x1, y1),
        to: ts.apply(x2, y2),
    })
}

fn parse_points(el: &PrimitiveElement) -> Result<Vec<(f64, f64)>, String> {
    let name = el.kind.tag_name();
    let points: Vec<_> = match el.attribute("points") {
        Some(text) => PointsParser::from(text).collect(),
        None => Vec::new(),
    };

    // 'polyline' and 'polygon' elements must contain at least 2 points.
    if points.len() < 2 {
        return Err(format!("a {} with less than 2 points was skipped", name));
    }

    Ok(points)
}
