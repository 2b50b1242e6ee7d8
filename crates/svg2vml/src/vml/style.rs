// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use xmlwriter::XmlWriter;

use super::fmt_num;
use crate::color::{self, Paint};
use crate::tree::PrimitiveElement;

const DEFAULT_COLOR: &str = "black";

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Fill {
    pub color: String,
    pub opacity: f64,
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Stroke {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
    pub endcap: Option<&'static str>,
    pub joinstyle: Option<&'static str>,
    pub dashed: bool,
}

impl Stroke {
    fn has_extras(&self) -> bool {
        self.opacity < 1.0 || self.endcap.is_some() || self.joinstyle.is_some() || self.dashed
    }
}

fn opacity(el: &PrimitiveElement, name: &str) -> f64 {
    el.attribute(name)
        .and_then(color::parse_opacity)
        .unwrap_or(1.0)
}

/// Resolves the shape fill.
///
/// A missing fill is black, like in SVG.
pub(crate) fn resolve_fill(el: &PrimitiveElement) -> Option<Fill> {
    let color = match el.attribute("fill") {
        Some(value) => match color::convert(value) {
            Some(Paint::Color(c)) => c,
            Some(Paint::None) => return None,
            None => DEFAULT_COLOR.to_string(),
        },
        None => DEFAULT_COLOR.to_string(),
    };

    Some(Fill {
        color,
        opacity: opacity(el, "opacity") * opacity(el, "fill-opacity"),
    })
}

/// Resolves the shape stroke.
///
/// Unlike in SVG, a missing stroke is black for unfilled shapes, like lines,
/// since they would be invisible otherwise.
pub(crate) fn resolve_stroke(el: &PrimitiveElement, is_unfilled: bool, scale: f64) -> Option<Stroke> {
    let color = match el.attribute("stroke").map(color::convert) {
        Some(Some(Paint::Color(c))) => c,
        Some(Some(Paint::None)) => return None,
        Some(None) | None if is_unfilled => DEFAULT_COLOR.to_string(),
        Some(None) | None => return None,
    };

    let width = el
        .attribute("stroke-width")
        .and_then(|v| crate::units::parse_length(v, 0.0))
        .unwrap_or(1.0)
        * scale;
    if !(width > 0.0) {
        return None;
    }

    let endcap = match el.attribute("stroke-linecap") {
        Some("round") => Some("round"),
        Some("square") => Some("square"),
        _ => None,
    };

    let joinstyle = match el.attribute("stroke-linejoin") {
        Some("miter") => Some("miter"),
        Some("bevel") => Some("bevel"),
        _ => None,
    };

    let dashed = el
        .attribute("stroke-dasharray")
        .map_or(false, |v| v.trim() != "none" && !v.trim().is_empty());

    Some(Stroke {
        color,
        width,
        opacity: opacity(el, "opacity") * opacity(el, "stroke-opacity"),
        endcap,
        joinstyle,
        dashed,
    })
}

/// Writes fill and stroke attributes.
///
/// Must be called right after the shape attributes.
/// Optional `v:fill` and `v:stroke` children are written as well.
pub(crate) fn write(fill: Option<&Fill>, stroke: Option<&Stroke>, xml: &mut XmlWriter) {
    match fill {
        Some(fill) => xml.write_attribute("fillcolor", &fill.color),
        None => xml.write_attribute("filled", "f"),
    }

    match stroke {
        Some(stroke) => {
            xml.write_attribute("strokecolor", &stroke.color);
            xml.write_attribute_fmt("strokeweight", format_args!("{}px", fmt_num(stroke.width)));
        }
        None => xml.write_attribute("stroked", "f"),
    }

    if let Some(fill) = fill.filter(|f| f.opacity < 1.0) {
        xml.start_element("v:fill");
        xml.write_attribute("opacity", &fmt_num(fill.opacity));
        xml.end_element();
    }

    if let Some(stroke) = stroke.filter(|s| s.has_extras()) {
        xml.start_element("v:stroke");
        if stroke.opacity < 1.0 {
            xml.write_attribute("opacity", &fmt_num(stroke.opacity));
        }

        if let Some(endcap) = stroke.endcap {
            xml.write_attribute("endcap", endcap);
        }

        if let Some(joinstyle) = stroke.joinstyle {
            xml.write_attribute("joinstyle", joinstyle);
        }

        if stroke.dashed {
            xml.write_attribute("dashstyle", "dash");
        }

        xml.end_element();
    }
}
