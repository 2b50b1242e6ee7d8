// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Cow;
use std::fmt::Write;

use xmlwriter::XmlWriter;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const SODIPODI_NS: &str = "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd";
const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";

const EMPTY_SVG: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\"/>";

/// Elements that can execute code or embed foreign markup.
const EXECUTABLE: &[&str] = &["script", "foreignObject", "handler", "listener"];

/// Elements in which text is content and not formatting.
const TEXT_CONTENT: &[&str] = &["desc", "style", "text", "textPath", "title", "tref", "tspan"];

/// Attributes that contain only numbers and can be rounded.
const NUMERIC: &[&str] = &[
    "cx", "cy", "d", "dx", "dy", "fx", "fy", "height", "offset", "points", "r", "rx", "ry",
    "stroke-width", "transform", "viewBox", "width", "x", "x1", "x2", "y", "y1", "y2",
];

/// Markup optimization options.
#[derive(Clone, Debug)]
pub struct CleanupOptions {
    /// Used to add a custom prefix to each element ID and to each reference.
    ///
    /// Useful when several documents are embedded into the same page.
    ///
    /// Default: `None`
    pub id_prefix: Option<String>,

    /// Set the numeric precision of geometry attributes.
    ///
    /// Default: 3
    pub precision: u8,

    /// Remove `metadata` elements and editor-specific elements and attributes,
    /// like the Inkscape and Sodipodi ones.
    ///
    /// Default: true
    pub strip_metadata: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        CleanupOptions {
            id_prefix: None,
            precision: 3,
            strip_metadata: true,
        }
    }
}

/// Removes executable content from an SVG document.
///
/// Removes `script` and `foreignObject` elements, event handler attributes,
/// `javascript:` links, comments and processing instructions.
/// The result is a compact, re-serialized document.
///
/// Never fails. A document that cannot be parsed becomes an empty `svg` element,
/// since unparsed content cannot be checked.
pub fn sanitize(text: &str) -> String {
    write(text, None)
}

/// Sanitizes and optimizes an SVG document.
///
/// Shares the serialization with [`sanitize`], so the result is always sanitized as well.
/// Should be applied after the conversion and never before, since the rounding
/// may affect the geometry.
pub fn minify(text: &str, opt: &CleanupOptions) -> String {
    write(text, Some(opt))
}

fn write(text: &str, opt: Option<&CleanupOptions>) -> String {
    let doc = match crate::parse_xml(text) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("Failed to parse an SVG cause {}. An empty document will be used.", e);
            return EMPTY_SVG.to_string();
        }
    };

    let mut xml = XmlWriter::new(xmlwriter::Options {
        use_single_quote: false,
        indent: xmlwriter::Indent::None,
        attributes_indent: xmlwriter::Indent::None,
    });

    write_element(doc.root_element(), opt, &mut xml);
    xml.end_document()
}

fn write_element(node: roxmltree::Node, opt: Option<&CleanupOptions>, xml: &mut XmlWriter) {
    let name = match qualified_name(node, node.tag_name().namespace(), node.tag_name().name(), true)
    {
        Some(v) => v,
        None => return,
    };

    xml.start_element(&name);
    write_namespaces(node, opt, xml);

    for attr in node.attributes() {
        if is_unsafe_attribute(attr.name(), attr.value()) {
            log::warn!("Unsafe '{}' attribute was removed.", attr.name());
            continue;
        }

        if let Some(opt) = opt {
            if opt.strip_metadata && is_editor_namespace(attr.namespace()) {
                continue;
            }
        }

        let name = match qualified_name(node, attr.namespace(), attr.name(), false) {
            Some(v) => v,
            None => continue,
        };

        match opt {
            Some(opt) => {
                let value = optimize_value(attr.name(), attr.value(), opt);
                xml.write_attribute(&name, &escape(&value));
            }
            None => xml.write_attribute(&name, &escape(attr.value())),
        }
    }

    let is_text_content = TEXT_CONTENT.contains(&node.tag_name().name());
    for child in node.children() {
        if child.is_element() {
            if is_removed(child, opt) {
                continue;
            }

            write_element(child, opt, xml);
        } else if let Some(text) = child.text().filter(|_| child.is_text()) {
            if is_text_content || !text.trim().is_empty() {
                xml.write_text(&escape(text));
            }
        }
        // Comments and processing instructions are dropped.
    }

    xml.end_element();
}

/// Escapes markup characters.
///
/// `xmlwriter` escapes only quotes in attributes and `<` in text,
/// while roxmltree returns unescaped values.
fn escape(text: &str) -> Cow<str> {
    if !text.contains(|c| matches!(c, '&' | '<' | '>')) {
        return Cow::Borrowed(text);
    }

    let mut s = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            _ => s.push(c),
        }
    }

    Cow::Owned(s)
}

fn is_removed(node: roxmltree::Node, opt: Option<&CleanupOptions>) -> bool {
    let name = node.tag_name().name();
    if EXECUTABLE.contains(&name) {
        log::warn!("Unsafe '{}' element was removed.", name);
        return true;
    }

    if let Some(opt) = opt {
        if opt.strip_metadata
            && (name == "metadata" || is_editor_namespace(node.tag_name().namespace()))
        {
            return true;
        }
    }

    false
}

fn is_editor_namespace(ns: Option<&str>) -> bool {
    matches!(ns, Some(SODIPODI_NS) | Some(INKSCAPE_NS))
}

fn is_unsafe_attribute(name: &str, value: &str) -> bool {
    let is_handler = name.len() > 2 && name.as_bytes()[..2].eq_ignore_ascii_case(b"on");
    if is_handler {
        return true;
    }

    // `set` and `animate` can assign a link as well.
    if matches!(name, "href" | "to" | "from" | "values") {
        let normalized: String = value
            .chars()
            .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
            .take(11)
            .collect();
        return normalized.eq_ignore_ascii_case("javascript:");
    }

    false
}

/// Returns an element or an attribute name with a prefix.
///
/// Unprefixed attributes do not belong to any namespace, unlike elements,
/// which can use the default one.
fn qualified_name(
    node: roxmltree::Node,
    ns: Option<&str>,
    local_name: &str,
    is_element: bool,
) -> Option<String> {
    let uri = match ns {
        Some(v) => v,
        None => return Some(local_name.to_string()),
    };

    if uri == XML_NS {
        return Some(format!("xml:{}", local_name));
    }

    let mut prefixed = None;
    for ns in node.namespaces().filter(|ns| ns.uri() == uri) {
        match ns.name() {
            None if is_element => return Some(local_name.to_string()),
            None => {}
            Some(prefix) => prefixed = Some(format!("{}:{}", prefix, local_name)),
        }
    }

    if prefixed.is_none() {
        log::warn!("'{}' has an unknown namespace and will be skipped.", local_name);
    }

    prefixed
}

/// Writes namespace declarations that are not inherited from the parent element.
fn write_namespaces(node: roxmltree::Node, opt: Option<&CleanupOptions>, xml: &mut XmlWriter) {
    let strip_editor = opt.map_or(false, |opt| opt.strip_metadata);
    let parent = node.parent_element();

    for ns in node.namespaces() {
        if ns.uri() == XML_NS || (strip_editor && is_editor_namespace(Some(ns.uri()))) {
            continue;
        }

        let is_inherited = parent.map_or(false, |p| {
            p.namespaces()
                .any(|pns| pns.name() == ns.name() && pns.uri() == ns.uri())
        });
        if is_inherited {
            continue;
        }

        match ns.name() {
            Some(prefix) => xml.write_attribute(&format!("xmlns:{}", prefix), ns.uri()),
            None => xml.write_attribute("xmlns", ns.uri()),
        }
    }
}

fn optimize_value(name: &str, value: &str, opt: &CleanupOptions) -> String {
    let mut value = match name {
        "d" => round_path(value, opt.precision),
        "points" => round_points(value, opt.precision),
        _ if NUMERIC.contains(&name) => round_numbers(value, opt.precision),
        _ => value.to_string(),
    };

    if let Some(ref prefix) = opt.id_prefix {
        if name == "id" {
            value = format!("{}{}", prefix, value);
        } else if name == "href" && value.starts_with('#') {
            value = format!("#{}{}", prefix, &value[1..]);
        } else if value.contains("url(") {
            for pattern in ["url(#", "url('#", "url(\"#"] {
                value = value.replace(pattern, &format!("{}{}", pattern, prefix));
            }
        }
    }

    value
}

/// Rewrites a path data with rounded coordinates.
///
/// Implicit commands become explicit ones. Invalid path data is kept as is,
/// so it would be rendered up to the same error.
fn round_path(text: &str, precision: u8) -> String {
    use svgtypes::PathSegment;

    let mut out = String::with_capacity(text.len());
    for segment in svgtypes::PathParser::from(text) {
        let segment = match segment {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Failed to parse path data cause {}. It will be kept as is.", e);
                return text.to_string();
            }
        };

        let flag = |v: bool| if v { 1.0 } else { 0.0 };
        let (cmd, abs, numbers) = match segment {
            PathSegment::MoveTo { abs, x, y } => (b'M', abs, vec![x, y]),
            PathSegment::LineTo { abs, x, y } => (b'L', abs, vec![x, y]),
            PathSegment::HorizontalLineTo { abs, x } => (b'H', abs, vec![x]),
            PathSegment::VerticalLineTo { abs, y } => (b'V', abs, vec![y]),
            PathSegment::CurveTo { abs, x1, y1, x2, y2, x, y } => {
                (b'C', abs, vec![x1, y1, x2, y2, x, y])
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => (b'S', abs, vec![x2, y2, x, y]),
            PathSegment::Quadratic { abs, x1, y1, x, y } => (b'Q', abs, vec![x1, y1, x, y]),
            PathSegment::SmoothQuadratic { abs, x, y } => (b'T', abs, vec![x, y]),
            PathSegment::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => (
                b'A',
                abs,
                vec![rx, ry, x_axis_rotation, flag(large_arc), flag(sweep), x, y],
            ),
            PathSegment::ClosePath { abs } => (b'Z', abs, Vec::new()),
        };

        let cmd = if abs { cmd } else { cmd.to_ascii_lowercase() };
        out.push(char::from(cmd));
        for (i, n) in numbers.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&format_number(*n, precision));
        }
    }

    out
}

/// Rewrites a points list with rounded coordinates.
///
/// An odd trailing number is dropped, like renderers do.
fn round_points(text: &str, precision: u8) -> String {
    let mut out = String::with_capacity(text.len());
    for (x, y) in svgtypes::PointsParser::from(text) {
        if !out.is_empty() {
            out.push(' ');
        }

        let _ = write!(
            out,
            "{},{}",
            format_number(x, precision),
            format_number(y, precision)
        );
    }

    out
}

/// Rounds all numbers in a list-like attribute, like a transform or a viewBox.
///
/// Everything else is copied as is.
fn round_numbers(text: &str, precision: u8) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while pos < bytes.len() {
        let len = number_len(&bytes[pos..]);
        if len == 0 {
            if let Some(c) = text[pos..].chars().next() {
                out.push(c);
                pos += c.len_utf8();
            }
            continue;
        }

        let token = &text[pos..pos + len];
        match token.parse::<f64>() {
            Ok(n) if n.is_finite() => {
                let formatted = format_number(n, precision);
                // A number like `.5` can depend on the previous number as a separator.
                let needs_separator = out
                    .bytes()
                    .last()
                    .map_or(false, |c| c.is_ascii_digit() || c == b'.')
                    && formatted.bytes().next().map_or(false, |c| c.is_ascii_digit());
                if needs_separator {
                    out.push(' ');
                }
                out.push_str(&formatted);
            }
            _ => out.push_str(token),
        }

        pos += len;
    }

    out
}

/// Returns the length of a number at the start of the slice.
fn number_len(s: &[u8]) -> usize {
    let mut i = 0;
    if matches!(s.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let digits_start = i;
    while s.get(i).map_or(false, |c| c.is_ascii_digit()) {
        i += 1;
    }

    if s.get(i) == Some(&b'.') {
        i += 1;
        while s.get(i).map_or(false, |c| c.is_ascii_digit()) {
            i += 1;
        }
    }

    // A sign or a dot without digits is not a number.
    if !s[digits_start..i].iter().any(|c| c.is_ascii_digit()) {
        return 0;
    }

    if matches!(s.get(i), Some(b'e') | Some(b'E')) {
        let mut j = i + 1;
        if matches!(s.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }

        if s.get(j).map_or(false, |c| c.is_ascii_digit()) {
            while s.get(j).map_or(false, |c| c.is_ascii_digit()) {
                j += 1;
            }
            i = j;
        }
    }

    i
}

fn format_number(n: f64, precision: u8) -> String {
    let p = 10f64.powi(i32::from(precision.min(15)));
    let v = (n * p).round() / p;

    let mut s = String::new();
    if v.fract() == 0.0 && v.abs() < 1e15 {
        // Also turns `-0` into `0`.
        let _ = write!(s, "{}", v as i64);
    } else {
        let _ = write!(s, "{}", v);
    }

    s
}
