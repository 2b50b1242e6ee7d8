// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::str::FromStr;

use simplecss::Declaration;

use crate::geom::{Size, Transform, ViewBox};
use crate::report::{Category, Finding};
use crate::Error;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Elements that never render by themselves.
const NON_RENDERING: &[&str] = &[
    "clipPath",
    "defs",
    "desc",
    "filter",
    "linearGradient",
    "marker",
    "mask",
    "meshgradient",
    "metadata",
    "pattern",
    "radialGradient",
    "script",
    "style",
    "symbol",
    "title",
];

/// Properties that are passed from a group to its children.
const INHERITED: &[&str] = &[
    "color",
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-dasharray",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "visibility",
];

/// Properties that can be set via CSS.
const PRESENTATION: &[&str] = &[
    "color",
    "display",
    "fill",
    "fill-opacity",
    "fill-rule",
    "opacity",
    "stroke",
    "stroke-dasharray",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "stop-color",
    "transform",
    "visibility",
];

/// A primitive kind.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ElementKind {
    /// `rect`
    Rect,
    /// `circle`
    Circle,
    /// `ellipse`
    Ellipse,
    /// `line`
    Line,
    /// `polyline`
    Polyline,
    /// `polygon`
    Polygon,
    /// `path`
    Path,
    /// Any other rendering element, like `text` or `use`.
    Unsupported(String),
}

impl ElementKind {
    fn from_tag_name(name: &str) -> Self {
        match name {
            "rect" => ElementKind::Rect,
            "circle" => ElementKind::Circle,
            "ellipse" => ElementKind::Ellipse,
            "line" => ElementKind::Line,
            "polyline" => ElementKind::Polyline,
            "polygon" => ElementKind::Polygon,
            "path" => ElementKind::Path,
            _ => ElementKind::Unsupported(name.to_string()),
        }
    }

    /// Returns the SVG element name.
    pub fn tag_name(&self) -> &str {
        match self {
            ElementKind::Rect => "rect",
            ElementKind::Circle => "circle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Line => "line",
            ElementKind::Polyline => "polyline",
            ElementKind::Polygon => "polygon",
            ElementKind::Path => "path",
            ElementKind::Unsupported(ref name) => name,
        }
    }
}

/// A flattened SVG element.
#[derive(Clone, Debug)]
pub struct PrimitiveElement {
    /// Element kind.
    pub kind: ElementKind,

    /// Element attributes.
    ///
    /// Presentation attributes are already resolved: inherited from ancestors,
    /// then overridden by CSS rules and the `style` attribute.
    /// `currentColor` and gradient references are replaced by plain colors.
    pub attributes: HashMap<String, String>,

    /// An absolute transform.
    ///
    /// Contains the element's own transform and the transforms of all its ancestors.
    pub transform: Transform,
}

impl PrimitiveElement {
    /// Returns an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns a length attribute in user units.
    pub(crate) fn length(&self, name: &str, percent_base: f64) -> Option<f64> {
        crate::units::parse_length(self.attribute(name)?, percent_base)
    }
}

/// A flat, ordered list of primitives parsed from an SVG document.
///
/// The order matches the document order, which is also the rendering order.
#[derive(Clone, Debug)]
pub struct PrimitiveTree {
    elements: Vec<PrimitiveElement>,
    size: Option<Size>,
    view_box: Option<ViewBox>,
    findings: Vec<Finding>,
}

impl PrimitiveTree {
    /// Parses a tree from an SVG string.
    ///
    /// Groups are flattened and non-rendering elements are skipped.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let doc = crate::parse_xml(text)?;
        let root = doc.root_element();
        let (size, view_box) = crate::source::read_geometry(root);

        let mut ctx = Context {
            style_sheet: resolve_css(&doc),
            id_map: doc
                .descendants()
                .filter_map(|n| n.attribute("id").map(|id| (id, n)))
                .collect(),
            findings: Vec::new(),
        };

        let mut root_attrs = ctx.resolve_attributes(root, &HashMap::new());
        let opacity = root_attrs
            .get("opacity")
            .and_then(|v| crate::color::parse_opacity(v))
            .unwrap_or(1.0);
        root_attrs.retain(|name, _| INHERITED.contains(&name.as_str()));

        let mut elements = Vec::new();
        parse_children(root, &root_attrs, Transform::default(), opacity, &mut ctx, &mut elements);

        Ok(PrimitiveTree {
            elements,
            size,
            view_box,
            findings: ctx.findings,
        })
    }

    /// Returns primitives in the rendering order.
    pub fn elements(&self) -> &[PrimitiveElement] {
        &self.elements
    }

    /// Returns the intrinsic size.
    pub fn size(&self) -> Option<Size> {
        self.size
    }

    /// Returns the coordinate viewport.
    pub fn view_box(&self) -> Option<ViewBox> {
        self.view_box
    }

    /// Returns findings raised during parsing, like a flattened gradient.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }
}

struct Context<'a, 'input: 'a> {
    style_sheet: simplecss::StyleSheet<'a>,
    id_map: HashMap<&'a str, roxmltree::Node<'a, 'input>>,
    findings: Vec<Finding>,
}

fn parse_children(
    parent: roxmltree::Node,
    inherited: &HashMap<String, String>,
    transform: Transform,
    opacity: f64,
    ctx: &mut Context,
    elements: &mut Vec<PrimitiveElement>,
) {
    for node in parent.children().filter(|n| n.is_element()) {
        match node.tag_name().namespace() {
            None | Some(SVG_NS) => {}
            // Editor-specific elements.
            _ => continue,
        }

        let tag_name = node.tag_name().name();
        if NON_RENDERING.contains(&tag_name) {
            continue;
        }

        let mut attributes = ctx.resolve_attributes(node, inherited);
        if attributes.get("display").map(String::as_str) == Some("none") {
            continue;
        }

        let transform = match attributes.get("transform") {
            Some(value) => match svgtypes::Transform::from_str(value) {
                Ok(ts) => transform.pre_concat(&Transform::from(ts)),
                Err(_) => {
                    log::warn!("Failed to parse a transform: '{}'.", value);
                    transform
                }
            },
            None => transform,
        };

        let opacity = opacity
            * attributes
                .get("opacity")
                .and_then(|v| crate::color::parse_opacity(v))
                .unwrap_or(1.0);

        if matches!(tag_name, "g" | "a" | "switch") {
            attributes.remove("transform");
            attributes.remove("opacity");
            attributes.retain(|name, _| INHERITED.contains(&name.as_str()));
            parse_children(node, &attributes, transform, opacity, ctx, elements);
            continue;
        }

        attributes.remove("transform");
        if opacity < 1.0 {
            attributes.insert("opacity".to_string(), opacity.to_string());
        } else {
            attributes.remove("opacity");
        }

        ctx.resolve_paint(node, "fill", &mut attributes);
        ctx.resolve_paint(node, "stroke", &mut attributes);

        elements.push(PrimitiveElement {
            kind: ElementKind::from_tag_name(tag_name),
            attributes,
            transform,
        });
    }
}

impl<'a, 'input: 'a> Context<'a, 'input> {
    fn resolve_attributes(
        &self,
        node: roxmltree::Node,
        inherited: &HashMap<String, String>,
    ) -> HashMap<String, String> {
        let mut attributes = inherited.clone();

        for attr in node.attributes() {
            let name = match attr.namespace() {
                None | Some(SVG_NS) => attr.name().to_string(),
                Some(XLINK_NS) => format!("xlink:{}", attr.name()),
                _ => continue,
            };

            if name == "style" {
                continue;
            }

            attributes.insert(name, attr.value().to_string());
        }

        let mut write_declaration = |declaration: &Declaration| {
            if PRESENTATION.contains(&declaration.name) {
                // `!important` is not supported, but shouldn't break the value.
                let value = declaration.value.trim_end_matches("!important").trim();
                attributes.insert(declaration.name.to_string(), value.to_string());
            }
        };

        for rule in &self.style_sheet.rules {
            if rule.selector.matches(&XmlNode(node)) {
                for declaration in &rule.declarations {
                    write_declaration(declaration);
                }
            }
        }

        if let Some(value) = node.attribute("style") {
            for declaration in simplecss::DeclarationTokenizer::from(value) {
                write_declaration(&declaration);
            }
        }

        // `inherit` simply falls back to the parent value.
        attributes.retain(|_, value| value != "inherit");
        for (name, value) in inherited {
            attributes.entry(name.clone()).or_insert_with(|| value.clone());
        }

        attributes
    }

    /// Replaces `currentColor` and paint server references with plain colors.
    fn resolve_paint(
        &mut self,
        node: roxmltree::Node,
        name: &str,
        attributes: &mut HashMap<String, String>,
    ) {
        let value = match attributes.get(name) {
            Some(v) => v.clone(),
            None => return,
        };

        let current_color = || {
            attributes
                .get("color")
                .cloned()
                .unwrap_or_else(|| "black".to_string())
        };

        let resolved = match svgtypes::Paint::from_str(&value) {
            Ok(svgtypes::Paint::CurrentColor) => current_color(),
            Ok(svgtypes::Paint::FuncIRI(id, fallback)) => match self.gradient_color(id) {
                Some(color) => {
                    self.findings.push(Finding::new(
                        Category::Conversion,
                        format!("gradient '{}' was flattened to its first stop color", id),
                    ));
                    color
                }
                None => {
                    log::warn!(
                        "'{}' on '{}' references an unsupported paint server '{}'.",
                        name,
                        node.tag_name().name(),
                        id
                    );
                    match fallback {
                        Some(svgtypes::PaintFallback::CurrentColor) => current_color(),
                        Some(svgtypes::PaintFallback::Color(c)) => {
                            format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
                        }
                        Some(svgtypes::PaintFallback::None) | None => "none".to_string(),
                    }
                }
            },
            _ => return,
        };

        attributes.insert(name.to_string(), resolved);
    }

    /// Returns the first stop color of a gradient.
    ///
    /// Stops can be inherited from another gradient via `xlink:href`.
    fn gradient_color(&self, id: &str) -> Option<String> {
        let mut node = *self.id_map.get(id)?;

        // Protects from a recursive `xlink:href`.
        for _ in 0..8 {
            if !matches!(
                node.tag_name().name(),
                "linearGradient" | "radialGradient" | "meshgradient"
            ) {
                return None;
            }

            if let Some(stop) = node.children().find(|n| n.has_tag_name("stop")) {
                let mut attributes = self.resolve_attributes(stop, &HashMap::new());
                let color = attributes
                    .remove("stop-color")
                    .unwrap_or_else(|| "black".to_string());
                return Some(color);
            }

            let href = node
                .attribute((XLINK_NS, "href"))
                .or_else(|| node.attribute("href"))?;
            node = *self.id_map.get(href.strip_prefix('#')?)?;
        }

        None
    }
}

fn resolve_css<'a>(xml: &'a roxmltree::Document<'a>) -> simplecss::StyleSheet<'a> {
    let mut sheet = simplecss::StyleSheet::new();

    for node in xml.descendants().filter(|n| n.has_tag_name("style")) {
        match node.attribute("type") {
            Some("text/css") => {}
            Some(_) => continue,
            None => {}
        }

        let text = match node.text() {
            Some(v) => v,
            None => continue,
        };

        sheet.parse_more(text);
    }

    sheet
}

struct XmlNode<'a, 'input: 'a>(roxmltree::Node<'a, 'input>);

impl simplecss::Element for XmlNode<'_, '_> {
    fn parent_element(&self) -> Option<Self> {
        self.0.parent_element().map(XmlNode)
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.0.prev_sibling_element().map(XmlNode)
    }

    fn has_local_name(&self, local_name: &str) -> bool {
        self.0.tag_name().name() == local_name
    }

    fn attribute_matches(&self, local_name: &str, operator: simplecss::AttributeOperator) -> bool {
        match self.0.attribute(local_name) {
            Some(value) => operator.matches(value),
            None => false,
        }
    }

    fn pseudo_class_matches(&self, class: simplecss::PseudoClass) -> bool {
        match class {
            simplecss::PseudoClass::FirstChild => self.prev_sibling_element().is_none(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> PrimitiveTree {
        PrimitiveTree::parse(text).unwrap()
    }

    #[test]
    fn groups_are_flattened() {
        let tree = parse(
            "<svg xmlns='http://www.w3.org/2000/svg' fill='red'>
                <rect width='1' height='1'/>
                <g transform='translate(10 0)' stroke='blue'>
                    <circle r='5' fill='green'/>
                </g>
                <defs><rect id='r' width='5' height='5'/></defs>
                <path d='M 0 0 L 1 1'/>
            </svg>",
        );

        let kinds: Vec<_> = tree.elements().iter().map(|e| e.kind.clone()).collect();
        assert_eq!(kinds, vec![ElementKind::Rect, ElementKind::Circle, ElementKind::Path]);

        let circle = &tree.elements()[1];
        assert_eq!(circle.attribute("fill"), Some("green"));
        assert_eq!(circle.attribute("stroke"), Some("blue"));
        assert_eq!(circle.transform.e, 10.0);
        assert_eq!(tree.elements()[2].attribute("fill"), Some("red"));
        assert_eq!(tree.elements()[2].attribute("stroke"), None);
    }

    #[test]
    fn css_overrides_attributes() {
        let tree = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <style>.a { fill: blue } rect { stroke: red }</style>
                <rect class='a' fill='green' width='1' height='1'/>
                <rect class='a' style='fill:yellow' width='1' height='1'/>
            </svg>",
        );

        assert_eq!(tree.elements()[0].attribute("fill"), Some("blue"));
        assert_eq!(tree.elements()[0].attribute("stroke"), Some("red"));
        assert_eq!(tree.elements()[1].attribute("fill"), Some("yellow"));
    }

    #[test]
    fn current_color() {
        let tree = parse(
            "<svg xmlns='http://www.w3.org/2000/svg' color='#123456'>
                <rect fill='currentColor' width='1' height='1'/>
            </svg>",
        );

        assert_eq!(tree.elements()[0].attribute("fill"), Some("#123456"));
    }

    #[test]
    fn gradient_is_flattened() {
        let tree = parse(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>
                <linearGradient id='lg1'><stop offset='0' stop-color='#ff0000'/></linearGradient>
                <linearGradient id='lg2' xlink:href='#lg1'/>
                <rect fill='url(#lg2)' width='1' height='1'/>
                <rect fill='url(#missing) blue' width='1' height='1'/>
            </svg>",
        );

        assert_eq!(tree.elements()[0].attribute("fill"), Some("#ff0000"));
        assert_eq!(tree.elements()[1].attribute("fill"), Some("#0000ff"));
        assert_eq!(tree.findings().len(), 1);
    }

    #[test]
    fn group_opacity() {
        let tree = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <g opacity='0.5'><rect opacity='0.5' width='1' height='1'/></g>
                <g style='display:none'><rect width='1' height='1'/></g>
            </svg>",
        );

        assert_eq!(tree.elements().len(), 1);
        assert_eq!(tree.elements()[0].attribute("opacity"), Some("0.25"));
    }

    #[test]
    fn unsupported_elements() {
        let tree = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <text>Logo</text>
                <sodipodi:namedview xmlns:sodipodi='http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd'/>
            </svg>",
        );

        assert_eq!(tree.elements().len(), 1);
        assert_eq!(tree.elements()[0].kind, ElementKind::Unsupported("text".to_string()));
    }
}
