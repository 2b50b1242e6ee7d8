// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt::Write;

use svgtypes::SimplePathSegment;

use crate::geom::{Rect, Transform};

/// Control point distance for a quarter of a circle.
const KAPPA: f64 = 0.552_284_749_831;

/// An absolute path segment.
///
/// Only commands that VML supports directly.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum Segment {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    CurveTo { x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64 },
    ClosePath,
}

/// A path in absolute coordinates.
#[derive(Clone, Default, Debug)]
pub(crate) struct Path {
    segments: Vec<Segment>,
}

impl Path {
    #[cfg(test)]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Checks that the path has at least one drawing segment.
    pub fn has_area(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::LineTo { .. } | Segment::CurveTo { .. }))
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.segments.push(Segment::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.segments.push(Segment::LineTo { x, y });
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.segments.push(Segment::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    pub fn close(&mut self) {
        self.segments.push(Segment::ClosePath);
    }

    /// Parses an SVG path data.
    ///
    /// Relative, shorthand and arc commands are converted into absolute lines and curves.
    /// Quadratic curves are converted into cubic ones.
    /// Parsing stops at the first error, like in SVG itself.
    pub fn from_data(data: &str) -> Self {
        let mut path = Path::default();
        let mut prev = (0.0, 0.0);

        for segment in svgtypes::SimplifyingPathParser::from(data) {
            let segment = match segment {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("Path data parsing stopped cause {}.", e);
                    break;
                }
            };

            match segment {
                SimplePathSegment::MoveTo { x, y } => {
                    path.move_to(x, y);
                    prev = (x, y);
                }
                SimplePathSegment::LineTo { x, y } => {
                    path.line_to(x, y);
                    prev = (x, y);
                }
                SimplePathSegment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    path.curve_to(x1, y1, x2, y2, x, y);
                    prev = (x, y);
                }
                SimplePathSegment::Quadratic { x1, y1, x, y } => {
                    let (px, py) = prev;
                    path.curve_to(
                        px + 2.0 / 3.0 * (x1 - px),
                        py + 2.0 / 3.0 * (y1 - py),
                        x + 2.0 / 3.0 * (x1 - x),
                        y + 2.0 / 3.0 * (y1 - y),
                        x,
                        y,
                    );
                    prev = (x, y);
                }
                SimplePathSegment::ClosePath => {
                    path.close();
                    // The current point goes back to the subpath start.
                    if let Some((x, y)) = path.subpath_start() {
                        prev = (x, y);
                    }
                }
            }
        }

        path
    }

    /// Creates a path from a list of points.
    pub fn from_points(points: &[(f64, f64)], closed: bool) -> Self {
        let mut path = Path::default();
        for (i, &(x, y)) in points.iter().enumerate() {
            if i == 0 {
                path.move_to(x, y);
            } else {
                path.line_to(x, y);
            }
        }

        if closed && !points.is_empty() {
            path.close();
        }

        path
    }

    /// Creates a rectangle outline, with optionally rounded corners.
    pub fn from_rect(rect: Rect, rx: f64, ry: f64) -> Self {
        let (x, y, r, b) = (rect.x(), rect.y(), rect.right(), rect.bottom());
        let mut path = Path::default();

        if rx > 0.0 && ry > 0.0 {
            let kx = rx * KAPPA;
            let ky = ry * KAPPA;
            path.move_to(x + rx, y);
            path.line_to(r - rx, y);
            path.curve_to(r - rx + kx, y, r, y + ry - ky, r, y + ry);
            path.line_to(r, b - ry);
            path.curve_to(r, b - ry + ky, r - rx + kx, b, r - rx, b);
            path.line_to(x + rx, b);
            path.curve_to(x + rx - kx, b, x, b - ry + ky, x, b - ry);
            path.line_to(x, y + ry);
            path.curve_to(x, y + ry - ky, x + rx - kx, y, x + rx, y);
        } else {
            path.move_to(x, y);
            path.line_to(r, y);
            path.line_to(r, b);
            path.line_to(x, b);
        }

        path.close();
        path
    }

    /// Creates an ellipse outline using four cubic curves.
    pub fn from_ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        let kx = rx * KAPPA;
        let ky = ry * KAPPA;

        let mut path = Path::default();
        path.move_to(cx + rx, cy);
        path.curve_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
        path.curve_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
        path.curve_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
        path.curve_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
        path.close();
        path
    }

    fn subpath_start(&self) -> Option<(f64, f64)> {
        self.segments.iter().rev().find_map(|s| match *s {
            Segment::MoveTo { x, y } => Some((x, y)),
            _ => None,
        })
    }

    /// Returns a transformed copy.
    pub fn transform(&self, ts: &Transform) -> Path {
        let segments = self
            .segments
            .iter()
            .map(|seg| match *seg {
                Segment::MoveTo { x, y } => {
                    let (x, y) = ts.apply(x, y);
                    Segment::MoveTo { x, y }
                }
                Segment::LineTo { x, y } => {
                    let (x, y) = ts.apply(x, y);
                    Segment::LineTo { x, y }
                }
                Segment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    let (x1, y1) = ts.apply(x1, y1);
                    let (x2, y2) = ts.apply(x2, y2);
                    let (x, y) = ts.apply(x, y);
                    Segment::CurveTo {
                        x1,
                        y1,
                        x2,
                        y2,
                        x,
                        y,
                    }
                }
                Segment::ClosePath => Segment::ClosePath,
            })
            .collect();

        Path { segments }
    }

    /// Writes the path using the VML path syntax.
    ///
    /// VML paths accept only integers, so all coordinates are multiplied
    /// by `scale` and rounded. The shape `coordsize` must be scaled as well.
    pub fn to_vml(&self, scale: f64) -> String {
        let round = |n: f64| (n * scale).round() as i64;

        let mut s = String::new();
        for seg in &self.segments {
            // Writing into a String never fails.
            let _ = match *seg {
                Segment::MoveTo { x, y } => write!(s, "m {},{} ", round(x), round(y)),
                Segment::LineTo { x, y } => write!(s, "l {},{} ", round(x), round(y)),
                Segment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => write!(
                    s,
                    "c {},{},{},{},{},{} ",
                    round(x1),
                    round(y1),
                    round(x2),
                    round(y2),
                    round(x),
                    round(y)
                ),
                Segment::ClosePath => write!(s, "x "),
            };
        }

        s.push('e');
        s
    }
}
