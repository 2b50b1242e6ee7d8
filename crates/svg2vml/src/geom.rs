// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use float_cmp::ApproxEqUlps;

fn is_valid_length(n: f64) -> bool {
    n > 0.0 && n.is_finite()
}

/// A width and height pair.
///
/// Both values are positive and finite.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Size {
    width: f64,
    height: f64,
}

impl Size {
    /// Creates a new `Size`.
    ///
    /// Returns `None` when any of the values is not positive or not finite.
    pub fn from_wh(width: f64, height: f64) -> Option<Self> {
        if is_valid_length(width) && is_valid_length(height) {
            Some(Size { width, height })
        } else {
            None
        }
    }

    /// Creates a square size.
    ///
    /// `side` must be positive and finite.
    pub(crate) const fn square(side: f64) -> Self {
        Size {
            width: side,
            height: side,
        }
    }

    /// Returns the width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns `height / width`.
    pub fn aspect(&self) -> f64 {
        self.height / self.width
    }
}

/// A coordinate viewport, defined by the `viewBox` attribute.
///
/// `width` and `height` are positive and finite.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ViewBox {
    /// Minimum X.
    pub x: f64,
    /// Minimum Y.
    pub y: f64,
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
}

impl ViewBox {
    /// Creates a new `ViewBox`.
    ///
    /// Returns `None` when `width` or `height` is not positive.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Option<Self> {
        if x.is_finite() && y.is_finite() && is_valid_length(width) && is_valid_length(height) {
            Some(ViewBox {
                x,
                y,
                width,
                height,
            })
        } else {
            None
        }
    }

    /// Returns the viewport size.
    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }
}

impl std::str::FromStr for ViewBox {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let vb: svgtypes::ViewBox = text.parse().map_err(|_| "invalid viewBox")?;
        ViewBox::new(vb.x, vb.y, vb.w, vb.h).ok_or("viewBox has an invalid size")
    }
}

/// A rectangle.
///
/// Width and height are never negative.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Rect {
    /// Creates a new `Rect`.
    ///
    /// Returns `None` when `width` or `height` is negative or not finite.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Option<Self> {
        if x.is_finite() && y.is_finite() && width >= 0.0 && height >= 0.0 {
            if width.is_finite() && height.is_finite() {
                return Some(Rect {
                    x,
                    y,
                    width,
                    height,
                });
            }
        }

        None
    }

    /// Creates a new `Rect` from two opposite corners.
    pub fn from_points(x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Self> {
        Rect::from_xywh(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }

    /// Returns the left edge.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Returns the top edge.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Returns the width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Returns the bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// An affine transform.
///
/// Uses the SVG `matrix(a b c d e f)` notation.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl From<svgtypes::Transform> for Transform {
    fn from(ts: svgtypes::Transform) -> Self {
        Transform::new(ts.a, ts.b, ts.c, ts.d, ts.e, ts.f)
    }
}

impl Transform {
    /// Creates a new transform.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Transform { a, b, c, d, e, f }
    }

    /// Creates a scale and translate transform.
    pub fn from_scale_translate(sx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Transform::new(sx, 0.0, 0.0, sy, tx, ty)
    }

    /// Checks that the transform is an identity.
    pub fn is_default(&self) -> bool {
        *self == Transform::default()
    }

    /// Checks that the transform has no rotation and no skew.
    pub fn is_axis_aligned(&self) -> bool {
        self.b.approx_eq_ulps(&0.0, 4) && self.c.approx_eq_ulps(&0.0, 4)
    }

    /// Returns `self * other`.
    ///
    /// `other` is applied first.
    pub fn pre_concat(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Maps a point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Returns the horizontal scale factor.
    pub fn scale_x(&self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Returns the vertical scale factor.
    pub fn scale_y(&self) -> f64 {
        self.c.hypot(self.d)
    }

    /// Returns the smallest of the two scale factors.
    ///
    /// Used for values without independent X and Y components,
    /// like a circle radius or a stroke width.
    pub fn min_scale(&self) -> f64 {
        self.scale_x().min(self.scale_y())
    }

    /// Maps an axis-aligned rectangle.
    ///
    /// Returns `None` when the transform has a rotation or a skew.
    pub fn map_rect(&self, rect: Rect) -> Option<Rect> {
        if !self.is_axis_aligned() {
            return None;
        }

        let (x1, y1) = self.apply(rect.x(), rect.y());
        let (x2, y2) = self.apply(rect.right(), rect.bottom());
        Rect::from_points(x1, y1, x2, y2)
    }
}
