// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

mod path;
mod shapes;
mod style;

use xmlwriter::XmlWriter;

use self::shapes::Geometry;
use crate::analyze::{analyze_with, can_transpile, AnalyzeOptions};
use crate::geom::{Size, Transform};
use crate::report::{Category, ComplexityReport, Finding, Severity};
use crate::tree::{ElementKind, PrimitiveTree};

const VML_NS: &str = "urn:schemas-microsoft-com:vml";

/// A size used when neither the caller nor the document provides one.
pub const DEFAULT_SIZE: f64 = 200.0;

/// Conversion options.
#[derive(Clone, Debug)]
pub struct TranspileOptions {
    /// Target width in pixels.
    ///
    /// When only one of the target dimensions is set, the other one
    /// is derived from the document aspect ratio.
    ///
    /// Default: `None`, the intrinsic document width
    pub width: Option<f64>,

    /// Target height in pixels.
    ///
    /// Default: `None`, the intrinsic document height
    pub height: Option<f64>,

    /// A placeholder fill color.
    ///
    /// Default: `#cccccc`
    pub placeholder_color: String,

    /// Options of the feasibility analysis.
    pub analyze: AnalyzeOptions,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        TranspileOptions {
            width: None,
            height: None,
            placeholder_color: "#cccccc".to_string(),
            analyze: AnalyzeOptions::default(),
        }
    }
}

/// A conversion result.
///
/// Contains either a fully converted VML group or a single placeholder rectangle,
/// never a mix of both.
#[derive(Clone, Debug)]
pub struct DialectDocument {
    markup: String,
    group: String,
    report: ComplexityReport,
    size: Size,
    is_placeholder: bool,
}

impl DialectDocument {
    /// Returns the VML markup, wrapped into an Outlook conditional comment.
    ///
    /// Skipped elements are listed in comments before the conditional block.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Returns the bare `v:group` element.
    ///
    /// Use it when the markup is going to be wrapped into a conditional comment anyway.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns findings raised during the conversion.
    pub fn report(&self) -> &ComplexityReport {
        &self.report
    }

    /// Returns the group size in pixels.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Checks that the document is a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.is_placeholder
    }
}

/// Converts an SVG document into VML.
///
/// See [`transpile_with`] for details.
pub fn transpile(text: &str, width: Option<f64>, height: Option<f64>) -> DialectDocument {
    let opt = TranspileOptions {
        width,
        height,
        ..TranspileOptions::default()
    };

    transpile_with(text, &opt)
}

/// Converts an SVG document into VML.
///
/// The document should be sanitized first.
///
/// Never fails. When the document has a `high` severity finding or cannot be parsed,
/// a placeholder is returned instead.
pub fn transpile_with(text: &str, opt: &TranspileOptions) -> DialectDocument {
    let report = analyze_with(text, &opt.analyze);
    if !can_transpile(&report) {
        let mut categories: Vec<_> = report
            .iter()
            .filter(|f| f.severity == Severity::High)
            .map(|f| f.category.to_str())
            .collect();
        categories.dedup();

        let reason = format!("unsupported features: {}", categories.join(", "));
        return placeholder(text, opt, &reason);
    }

    match PrimitiveTree::parse(text) {
        Ok(tree) => convert(&tree, opt),
        Err(e) => placeholder(text, opt, &e.to_string()),
    }
}

fn convert(tree: &PrimitiveTree, opt: &TranspileOptions) -> DialectDocument {
    let size = target_size(opt, tree.size());

    let viewport = match tree.view_box() {
        Some(vb) => {
            let sx = size.width() / vb.width;
            let sy = size.height() / vb.height;
            Transform::from_scale_translate(sx, sy, -vb.x * sx, -vb.y * sy)
        }
        None => Transform::default(),
    };

    // A base for percentage lengths.
    let base = tree
        .view_box()
        .map(|vb| vb.size())
        .or_else(|| tree.size())
        .unwrap_or(size);

    let mut findings = tree.findings().to_vec();
    let mut skipped = Vec::new();

    let mut xml = start_group(size);
    for el in tree.elements() {
        if let ElementKind::Unsupported(ref name) = el.kind {
            log::warn!("'{}' elements are not supported. Skipped.", name);
            findings.push(Finding::new(
                Category::Conversion,
                format!("'{}' elements are not supported and were skipped", name),
            ));
            skipped.push(name.clone());
            continue;
        }

        let ts = viewport.pre_concat(&el.transform);
        match shapes::convert(el, &ts, base) {
            Ok(geometry) => {
                let fill = if geometry.can_fill() {
                    style::resolve_fill(el)
                } else {
                    None
                };
                let stroke = style::resolve_stroke(el, !geometry.can_fill(), ts.min_scale());

                write_geometry(&geometry, size, &mut xml);
                style::write(fill.as_ref(), stroke.as_ref(), &mut xml);
                xml.end_element();
            }
            Err(reason) => {
                log::warn!("{}.", reason);
                findings.push(Finding::with_severity(
                    Category::Conversion,
                    Severity::Low,
                    reason,
                ));
            }
        }
    }

    let group = xml.end_document();

    let mut markup = String::new();
    for name in skipped {
        // `--` is not allowed inside a comment.
        let name = name.replace("--", "-");
        markup.push_str(&format!("<!-- svg2vml: skipped unsupported '{}' -->", name));
    }
    markup.push_str(&wrap(&group));

    DialectDocument {
        markup,
        group,
        report: ComplexityReport::from_findings(findings),
        size,
        is_placeholder: false,
    }
}

fn placeholder(text: &str, opt: &TranspileOptions, reason: &str) -> DialectDocument {
    log::warn!("Cannot convert to VML cause {}. A placeholder will be used.", reason);

    let intrinsic = crate::parse_xml(text)
        .ok()
        .and_then(|doc| crate::source::read_geometry(doc.root_element()).0);
    let size = target_size(opt, intrinsic);

    let mut xml = start_group(size);
    xml.start_element("v:rect");
    write_position(0.0, 0.0, size.width(), size.height(), &mut xml);
    xml.write_attribute("fillcolor", &opt.placeholder_color);
    xml.write_attribute("stroked", "f");
    xml.end_element();
    let group = xml.end_document();

    DialectDocument {
        markup: wrap(&group),
        group,
        report: ComplexityReport::single(Finding::with_severity(
            Category::Conversion,
            Severity::High,
            format!("cannot transpile: {}", reason),
        )),
        size,
        is_placeholder: true,
    }
}

/// Resolves the target size.
///
/// Explicit dimensions have priority. A missing one is derived from the document
/// aspect ratio.
fn target_size(opt: &TranspileOptions, intrinsic: Option<Size>) -> Size {
    let valid = |n: Option<f64>| n.filter(|n| n.is_finite() && *n > 0.0);
    let (width, height) = match (valid(opt.width), valid(opt.height), intrinsic) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some(s)) => (w, w * s.aspect()),
        (None, Some(h), Some(s)) => (h / s.aspect(), h),
        (Some(w), None, None) => (w, w),
        (None, Some(h), None) => (h, h),
        (None, None, Some(s)) => (s.width(), s.height()),
        (None, None, None) => (DEFAULT_SIZE, DEFAULT_SIZE),
    };

    Size::from_wh(width, height).unwrap_or(Size::square(DEFAULT_SIZE))
}

fn start_group(size: Size) -> XmlWriter {
    let mut xml = XmlWriter::new(xmlwriter::Options {
        use_single_quote: false,
        indent: xmlwriter::Indent::None,
        attributes_indent: xmlwriter::Indent::None,
    });

    let (w, h) = pixel_size(size);
    xml.start_element("v:group");
    xml.write_attribute("xmlns:v", VML_NS);
    xml.write_attribute_fmt("coordsize", format_args!("{},{}", w, h));
    xml.write_attribute("coordorigin", "0,0");
    xml.write_attribute_fmt("style", format_args!("width:{}px;height:{}px;", w, h));
    xml
}

fn wrap(group: &str) -> String {
    format!("<!--[if gte mso 9]>{}<![endif]-->", group)
}

/// Shape path units per pixel.
///
/// Path coordinates are integers, so a finer coordinate space keeps curves
/// of small logos smooth.
const SHAPE_SCALE: u32 = 100;

/// VML coordinates are integers.
fn pixel_size(size: Size) -> (u32, u32) {
    let px = |n: f64| n.round().max(1.0) as u32;
    (px(size.width()), px(size.height()))
}

/// Starts a shape element and writes its geometry.
fn write_geometry(geometry: &Geometry, size: Size, xml: &mut XmlWriter) {
    match *geometry {
        Geometry::Rect(r) => {
            xml.start_element("v:rect");
            write_position(r.x(), r.y(), r.width(), r.height(), xml);
        }
        Geometry::RoundRect { rect: r, arcsize } => {
            xml.start_element("v:roundrect");
            write_position(r.x(), r.y(), r.width(), r.height(), xml);
            xml.write_attribute("arcsize", &fmt_num(arcsize));
        }
        Geometry::Oval(r) => {
            xml.start_element("v:oval");
            write_position(r.x(), r.y(), r.width(), r.height(), xml);
        }
        Geometry::Line { from, to } => {
            xml.start_element("v:line");
            xml.write_attribute("style", "position:absolute;");
            xml.write_attribute_fmt("from", format_args!("{},{}", fmt_num(from.0), fmt_num(from.1)));
            xml.write_attribute_fmt("to", format_args!("{},{}", fmt_num(to.0), fmt_num(to.1)));
        }
        Geometry::Polyline(ref points) => {
            xml.start_element("v:polyline");
            xml.write_attribute("style", "position:absolute;");
            let points: Vec<_> = points
                .iter()
                .map(|(x, y)| format!("{},{}", fmt_num(*x), fmt_num(*y)))
                .collect();
            xml.write_attribute("points", &points.join(" "));
        }
        Geometry::Shape(ref path) => {
            let (w, h) = pixel_size(size);
            xml.start_element("v:shape");
            write_position(0.0, 0.0, f64::from(w), f64::from(h), xml);
            xml.write_attribute_fmt(
                "coordsize",
                format_args!("{},{}", w.saturating_mul(SHAPE_SCALE), h.saturating_mul(SHAPE_SCALE)),
            );
            xml.write_attribute("path", &path.to_vml(f64::from(SHAPE_SCALE)));
        }
    }
}

fn write_position(x: f64, y: f64, width: f64, height: f64, xml: &mut XmlWriter) {
    xml.write_attribute_fmt(
        "style",
        format_args!(
            "position:absolute;left:{}px;top:{}px;width:{}px;height:{}px;",
            fmt_num(x),
            fmt_num(y),
            fmt_num(width),
            fmt_num(height)
        ),
    );
}

/// Formats a number with up to 2 decimal places.
fn fmt_num(n: f64) -> String {
    let v = (n * 100.0).round() / 100.0;
    if v.fract() == 0.0 {
        // Also turns `-0` into `0`.
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_from_width_only() {
        let opt = TranspileOptions {
            width: Some(100.0),
            ..TranspileOptions::default()
        };

        let size = target_size(&opt, Size::from_wh(50.0, 25.0));
        assert_eq!(size, Size::from_wh(100.0, 50.0).unwrap());
    }

    #[test]
    fn invalid_size_is_ignored() {
        let opt = TranspileOptions {
            width: Some(-1.0),
            height: Some(f64::NAN),
            ..TranspileOptions::default()
        };

        assert_eq!(target_size(&opt, None), Size::square(DEFAULT_SIZE));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(fmt_num(20.0), "20");
        assert_eq!(fmt_num(-0.001), "0");
        assert_eq!(fmt_num(1.23456), "1.23");
    }
}
