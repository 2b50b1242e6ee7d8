use std::collections::HashMap;

use float_cmp::ApproxEq;
use svg2vml::{Category, DialectDocument, Severity, TranspileOptions};

fn load(name: &str) -> String {
    std::fs::read_to_string(format!("tests/files/{}.svg", name)).unwrap()
}

#[derive(Debug)]
struct Shape {
    name: String,
    attributes: HashMap<String, String>,
}

impl Shape {
    fn attr(&self, name: &str) -> &str {
        self.attributes.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Returns a `style` property without the `px` suffix.
    fn style(&self, name: &str) -> f64 {
        self.attr("style")
            .split(';')
            .filter_map(|p| p.split_once(':'))
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.trim_end_matches("px").parse().unwrap())
            .unwrap()
    }

    fn numbers(&self, name: &str) -> Vec<f64> {
        self.attr(name)
            .split(|c: char| c == ',' || c == ' ')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap())
            .collect()
    }
}

fn shapes(doc: &DialectDocument) -> Vec<Shape> {
    let xml = roxmltree::Document::parse(doc.group()).unwrap();
    let group = xml.root_element();
    assert_eq!(group.tag_name().name(), "group");

    group
        .children()
        .filter(|n| n.is_element())
        .map(|n| Shape {
            name: n.tag_name().name().to_string(),
            attributes: n
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
        })
        .collect()
}

fn single_shape(svg: &str) -> Shape {
    let doc = svg2vml::transpile(svg, Some(200.0), Some(200.0));
    assert!(!doc.is_placeholder());
    let mut shapes = shapes(&doc);
    assert_eq!(shapes.len(), 1);
    shapes.remove(0)
}

fn approx(a: f64, b: f64) -> bool {
    a.approx_eq(b, (0.5, 2))
}

#[test]
fn circle_is_scaled() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <circle cx='50' cy='50' r='40'/>
        </svg>",
    );

    assert_eq!(shape.name, "oval");
    assert_eq!(shape.style("left"), 20.0);
    assert_eq!(shape.style("top"), 20.0);
    assert_eq!(shape.style("width"), 160.0);
    assert_eq!(shape.style("height"), 160.0);
}

#[test]
fn conditional_wrapper() {
    let doc = svg2vml::transpile(&load("logo-basic"), Some(400.0), None);
    assert!(doc.markup().starts_with("<!--[if gte mso 9]><v:group"));
    assert!(doc.markup().ends_with("</v:group><![endif]-->"));
    assert!(doc.group().contains("xmlns:v=\"urn:schemas-microsoft-com:vml\""));
    assert!(doc.group().contains("coordsize=\"400,200\""));
    assert!(doc.group().contains("style=\"width:400px;height:200px;\""));
    assert!(doc.report().is_empty());
}

#[test]
fn document_order_is_preserved() {
    let doc = svg2vml::transpile(&load("logo-basic"), None, None);
    let names: Vec<_> = shapes(&doc).into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["roundrect", "oval", "shape", "line"]);
}

#[test]
fn colors() {
    let doc = svg2vml::transpile(&load("logo-basic"), None, None);
    let shapes = shapes(&doc);

    assert_eq!(shapes[0].attr("fillcolor"), "#1a73e8");
    assert_eq!(shapes[0].attr("stroked"), "f");
    assert_eq!(shapes[1].attr("fillcolor"), "#ffffff");
    assert_eq!(shapes[2].attr("fillcolor"), "white");
    assert_eq!(shapes[2].attr("strokecolor"), "#0b3d91");
    assert_eq!(shapes[2].attr("strokeweight"), "2px");
    assert_eq!(shapes[3].attr("strokecolor"), "white");
}

#[test]
fn rect_round_trip() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <rect x='10' y='20' width='30' height='40'/>
        </svg>",
    );

    assert_eq!(shape.name, "rect");
    assert!(approx(shape.style("left") / 2.0, 10.0));
    assert!(approx(shape.style("top") / 2.0, 20.0));
    assert!(approx(shape.style("width") / 2.0, 30.0));
    assert!(approx(shape.style("height") / 2.0, 40.0));
    assert_eq!(shape.attr("fillcolor"), "black");
}

#[test]
fn ellipse_round_trip() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 400 100'>
            <ellipse cx='200' cy='50' rx='100' ry='25'/>
        </svg>",
    );

    // Non-uniform scale: 0.5 horizontally and 2 vertically.
    assert_eq!(shape.name, "oval");
    assert!(approx(shape.style("left"), 50.0));
    assert!(approx(shape.style("top"), 50.0));
    assert!(approx(shape.style("width"), 100.0));
    assert!(approx(shape.style("height"), 100.0));
}

#[test]
fn line_round_trip() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <line x1='10' y1='20' x2='90' y2='80' stroke-width='3'/>
        </svg>",
    );

    assert_eq!(shape.name, "line");
    assert_eq!(shape.numbers("from"), vec![20.0, 40.0]);
    assert_eq!(shape.numbers("to"), vec![180.0, 160.0]);
    assert_eq!(shape.attr("strokecolor"), "black");
    assert_eq!(shape.attr("strokeweight"), "6px");
}

#[test]
fn polygon_round_trip() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <polygon points='50,10 90,90 10,90' fill='#f00'/>
        </svg>",
    );

    assert_eq!(shape.name, "shape");
    assert_eq!(shape.attr("coordsize"), "20000,20000");
    assert_eq!(shape.attr("path"), "m 10000,2000 l 18000,18000 l 2000,18000 x e");
    assert_eq!(shape.attr("fillcolor"), "#f00");
}

#[test]
fn polyline_is_open_and_unfilled() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <polyline points='0,0 50,50 100,0' stroke='blue'/>
        </svg>",
    );

    assert_eq!(shape.name, "polyline");
    assert_eq!(shape.numbers("points"), vec![0.0, 0.0, 100.0, 100.0, 200.0, 0.0]);
    assert_eq!(shape.attr("filled"), "f");
    assert_eq!(shape.attr("strokecolor"), "blue");
}

#[test]
fn path_endpoints_are_preserved() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <path d='M 10 50 C 10 10 90 10 90 50 Q 50 90 10 50 A 40 40 0 0 1 90 50 z'/>
        </svg>",
    );

    let path = shape.attr("path");
    assert!(path.starts_with("m 2000,10000 c 2000,2000,18000,2000,18000,10000 c "));
    assert!(path.ends_with("18000,10000 x e"));
    assert!(!path.contains('q'));
    assert!(!path.contains('a'));
}

#[test]
fn path_uses_per_axis_scale() {
    let doc = svg2vml::transpile(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <path d='M 10 10 L 90 90'/>
        </svg>",
        Some(200.0),
        Some(100.0),
    );

    let shapes = shapes(&doc);
    assert_eq!(shapes[0].attr("path"), "m 2000,1000 l 18000,9000 e");
}

#[test]
fn small_logo_keeps_subpixel_precision() {
    let doc = svg2vml::transpile(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <path d='M 10 10 L 90 90'/>
        </svg>",
        Some(16.0),
        Some(16.0),
    );

    let shapes = shapes(&doc);
    assert_eq!(shapes[0].attr("coordsize"), "1600,1600");
    assert_eq!(shapes[0].attr("path"), "m 160,160 l 1440,1440 e");
    assert_eq!(shapes[0].style("width"), 16.0);
}

#[test]
fn view_box_offset() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='50 50 100 100'>
            <rect x='50' y='100' width='10' height='10'/>
        </svg>",
    );

    assert_eq!(shape.style("left"), 0.0);
    assert_eq!(shape.style("top"), 100.0);
}

#[test]
fn group_transform() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <g transform='translate(10 10)'>
                <rect width='10' height='10' transform='scale(2)'/>
            </g>
        </svg>",
    );

    assert_eq!(shape.style("left"), 20.0);
    assert_eq!(shape.style("width"), 40.0);
}

#[test]
fn rotated_rect_is_an_outline() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <rect x='-10' y='-10' width='20' height='20' transform='translate(50 50) rotate(45)'/>
        </svg>",
    );

    assert_eq!(shape.name, "shape");
    assert!(shape.attr("path").starts_with("m 10000,"));
}

#[test]
fn rounded_rect() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <rect width='100' height='50' rx='10'/>
        </svg>",
    );

    assert_eq!(shape.name, "roundrect");
    assert_eq!(shape.attr("arcsize"), "0.4");
}

#[test]
fn opacity() {
    let doc = svg2vml::transpile(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <rect width='10' height='10' fill='red' fill-opacity='0.5' stroke='none'/>
        </svg>",
        None,
        None,
    );

    assert!(doc.group().contains("<v:fill opacity=\"0.5\"/>"));
    assert!(doc.group().contains("stroked=\"f\""));
}

#[test]
fn gradient_is_flattened() {
    let doc = svg2vml::transpile(&load("logo-gradient"), None, None);
    assert!(!doc.is_placeholder());

    let shapes = shapes(&doc);
    assert_eq!(shapes[0].attr("fillcolor"), "#ff6600");
    assert!(doc.report().contains(Category::Conversion));
    assert_eq!(doc.report().max_severity(), Some(Severity::Medium));
}

#[test]
fn unsupported_elements_are_skipped() {
    let doc = svg2vml::transpile(&load("logo-text"), None, None);
    assert!(!doc.is_placeholder());
    assert!(doc.markup().starts_with("<!-- svg2vml: skipped unsupported 'text' -->"));
    assert_eq!(shapes(&doc).len(), 1);

    let finding = &doc.report().findings()[0];
    assert_eq!(finding.category, Category::Conversion);
    assert_eq!(finding.severity, Severity::Medium);
}

#[test]
fn degenerate_elements_are_skipped() {
    let doc = svg2vml::transpile(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
            <rect width='0' height='10'/>
            <circle r='-1'/>
            <path d=''/>
            <polygon points='10 10'/>
            <rect width='10' height='10'/>
        </svg>",
        None,
        None,
    );

    assert!(!doc.is_placeholder());
    assert_eq!(shapes(&doc).len(), 1);
    assert_eq!(doc.report().len(), 4);
    assert_eq!(doc.report().max_severity(), Some(Severity::Low));
}

#[test]
fn infeasible_input_is_a_placeholder() {
    for name in &["logo-animated", "logo-filter"] {
        let doc = svg2vml::transpile(&load(name), Some(300.0), Some(100.0));
        assert!(doc.is_placeholder());
        assert_eq!(doc.report().len(), 1);
        assert_eq!(doc.report().findings()[0].severity, Severity::High);

        let shapes = shapes(&doc);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name, "rect");
        assert_eq!(shapes[0].attr("fillcolor"), "#cccccc");
        assert_eq!(shapes[0].style("width"), 300.0);
        assert_eq!(shapes[0].style("height"), 100.0);
    }
}

#[test]
fn placeholder_default_size() {
    let svg = "<svg xmlns='http://www.w3.org/2000/svg'><rect mask='url(#m)' width='5' height='5'/></svg>";
    let doc = svg2vml::transpile(svg, None, None);
    assert!(doc.is_placeholder());
    assert_eq!(doc.size().width(), 200.0);
    assert_eq!(doc.size().height(), 200.0);
}

#[test]
fn malformed_input_is_a_placeholder() {
    for svg in &["", "<svg", "<html/>", "<svg><rect></svg>"] {
        let doc = svg2vml::transpile(svg, None, None);
        assert!(doc.is_placeholder());
        assert_eq!(doc.report().findings()[0].severity, Severity::High);
    }
}

#[test]
fn custom_placeholder_color() {
    let opt = TranspileOptions {
        placeholder_color: "#ffffff".to_string(),
        ..TranspileOptions::default()
    };

    let doc = svg2vml::transpile_with(&load("logo-animated"), &opt);
    assert!(doc.group().contains("fillcolor=\"#ffffff\""));
}

#[test]
fn feasible_input_is_never_a_placeholder() {
    for name in &["logo-basic", "logo-gradient", "logo-inkscape", "logo-text"] {
        let sanitized = svg2vml::sanitize(&load(name));
        let doc = svg2vml::transpile(&sanitized, None, None);
        assert!(!doc.is_placeholder(), "'{}' became a placeholder", name);
    }
}

#[test]
fn size_from_width_only() {
    let doc = svg2vml::transpile(&load("logo-basic"), Some(100.0), None);
    assert_eq!(doc.size().width(), 100.0);
    assert_eq!(doc.size().height(), 50.0);
}
