use svg2vml::{AnalyzeOptions, Category, Severity};

fn load(name: &str) -> String {
    std::fs::read_to_string(format!("tests/files/{}.svg", name)).unwrap()
}

fn categories(text: &str) -> Vec<Category> {
    svg2vml::analyze(text).iter().map(|f| f.category).collect()
}

#[test]
fn simple_logo_has_no_findings() {
    let report = svg2vml::analyze(&load("logo-basic"));
    assert!(report.is_empty());
    assert!(svg2vml::can_transpile(&report));
}

#[test]
fn smil_animation() {
    let report = svg2vml::analyze(&load("logo-animated"));
    assert_eq!(categories(&load("logo-animated")), vec![Category::Animation]);
    assert_eq!(report.max_severity(), Some(Severity::High));
    assert!(!svg2vml::can_transpile(&report));
}

#[test]
fn css_animation() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg'>
        <style>@keyframes spin { to { transform: rotate(1turn) } }</style>
        <rect width='10' height='10'/>
    </svg>
    ";

    assert_eq!(categories(svg), vec![Category::Animation]);
}

#[test]
fn filter_element_and_reference() {
    // Both the element and the attribute are present, but the finding is reported once.
    assert_eq!(categories(&load("logo-filter")), vec![Category::Filter]);
}

#[test]
fn mask_and_clip_path() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg'>
        <rect width='10' height='10' mask='url(#m)' clip-path='url(#c)'/>
    </svg>
    ";

    let report = svg2vml::analyze(svg);
    assert!(report.contains(Category::Mask));
    assert!(report.contains(Category::ClipPath));
    assert!(report.iter().all(|f| f.severity == Severity::High));
}

#[test]
fn medium_findings_do_not_block_conversion() {
    let report = svg2vml::analyze(&load("logo-gradient"));
    assert_eq!(categories(&load("logo-gradient")), vec![Category::Gradient]);
    assert_eq!(report.max_severity(), Some(Severity::Medium));
    assert!(svg2vml::can_transpile(&report));
}

#[test]
fn text_and_images() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg'>
        <text>Logo</text>
        <image href='logo.png' width='10' height='10'/>
    </svg>
    ";

    assert_eq!(categories(svg), vec![Category::EmbeddedImage, Category::Text]);
}

#[test]
fn complex_path() {
    let mut data = String::from("M 0 0");
    for i in 0..60 {
        data.push_str(&format!(" L {} {}", i, i));
    }

    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg'><path d='{}'/></svg>",
        data
    );

    let report = svg2vml::analyze(&svg);
    assert_eq!(report.len(), 1);
    assert_eq!(report.findings()[0].category, Category::ComplexPath);
    assert_eq!(report.findings()[0].severity, Severity::Low);
}

#[test]
fn custom_thresholds() {
    let opt = AnalyzeOptions {
        max_document_size: 64,
        max_path_commands: 2,
    };

    let svg = "<svg xmlns='http://www.w3.org/2000/svg'><path d='M 0 0 L 10 10 L 20 0 Z'/></svg>";
    let report = svg2vml::analyze_with(svg, &opt);
    assert!(report.contains(Category::ComplexPath));
    assert!(report.contains(Category::DocumentSize));
}

#[test]
fn malformed_input_degrades_to_a_finding() {
    let svg = "<svg xmlns='http://www.w3.org/2000/svg'><path d='M 0 0 L 10 10";
    let report = svg2vml::analyze(svg);
    assert_eq!(report.len(), 1);
    assert_eq!(report.findings()[0].category, Category::AnalysisFailed);
    assert_eq!(report.findings()[0].severity, Severity::Medium);
}

#[test]
fn malformed_input_keeps_other_findings() {
    let svg = "<svg><animate/><path d='M 0 0";
    let report = svg2vml::analyze(svg);
    assert!(report.contains(Category::Animation));
    assert!(report.contains(Category::AnalysisFailed));
}

#[test]
fn invalid_data() {
    let report = svg2vml::analyze_data(&[0x3c, 0xff, 0xfe, 0x00], &AnalyzeOptions::default());
    assert_eq!(report.len(), 1);
    assert_eq!(report.findings()[0].category, Category::AnalysisFailed);
}

#[test]
fn empty_input() {
    assert!(svg2vml::analyze("").is_empty());
}

#[test]
fn large_document() {
    let mut svg = String::from("<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>");
    for i in 0..20_000 {
        svg.push_str(&format!("<rect x='{}' y='1' width='2' height='2'/>", i % 100));
    }
    svg.push_str("<text>Logo</text></svg>");

    let start = std::time::Instant::now();
    let report = svg2vml::analyze(&svg);
    assert!(start.elapsed() < std::time::Duration::from_secs(5));

    assert_eq!(categories(&svg), vec![Category::Text, Category::DocumentSize]);
    assert!(svg2vml::can_transpile(&report));
}
