use mailsvg::svg2vml::{Category, ComplexityReport, Finding, Severity};
use mailsvg::{
    decide, decide_all, CompatibilitySummary, Quality, Raster, Representation, RepresentationKind,
    RepresentationSet, Surface, SurfaceCapability,
};

fn surface(supports_native: bool, supports_dialect: bool) -> Surface {
    Surface {
        id: "test",
        name: "Test",
        capability: SurfaceCapability::new(supports_native, supports_dialect),
        market_share: 1.0,
    }
}

fn all_representations() -> RepresentationSet {
    RepresentationSet::new()
        .with(Representation::NativeVector("<svg/>".to_string()))
        .with(Representation::DialectVector("<v:group/>".to_string()))
        .with(Representation::Raster(Raster::new(vec![1, 2, 3], "image/png")))
}

fn report(category: Category, severity: Severity) -> ComplexityReport {
    ComplexityReport::single(Finding::with_severity(category, severity, "test"))
}

#[test]
fn native_surface_prefers_native_regardless_of_severity() {
    let reps = all_representations();
    for severity in &[Severity::Low, Severity::Medium, Severity::High] {
        let choice = decide(&surface(true, false), &reps, &report(Category::Filter, *severity));
        assert_eq!(choice.kind, RepresentationKind::NativeVector);
    }
}

#[test]
fn native_quality() {
    let reps = all_representations();
    let native = surface(true, false);

    let choice = decide(&native, &reps, &ComplexityReport::default());
    assert_eq!(choice.quality, Quality::Excellent);

    let choice = decide(&native, &reps, &report(Category::Gradient, Severity::Medium));
    assert_eq!(choice.quality, Quality::Excellent);

    let choice = decide(&native, &reps, &report(Category::Mask, Severity::High));
    assert_eq!(choice.quality, Quality::Good);
}

#[test]
fn dialect_quality() {
    let reps = all_representations();
    let outlook = surface(false, true);

    let choice = decide(&outlook, &reps, &ComplexityReport::default());
    assert_eq!(choice.kind, RepresentationKind::DialectVector);
    assert_eq!(choice.quality, Quality::Excellent);

    let choice = decide(&outlook, &reps, &report(Category::Conversion, Severity::Medium));
    assert_eq!(choice.quality, Quality::Fair);

    let choice = decide(&outlook, &reps, &report(Category::Conversion, Severity::High));
    assert_eq!(choice.quality, Quality::Fair);

    // Not a conversion finding.
    let choice = decide(&outlook, &reps, &report(Category::Text, Severity::Medium));
    assert_eq!(choice.quality, Quality::Excellent);

    let choice = decide(&outlook, &reps, &report(Category::Animation, Severity::High));
    assert_eq!(choice.quality, Quality::Good);
}

#[test]
fn native_wins_over_dialect() {
    let choice = decide(&surface(true, true), &all_representations(), &ComplexityReport::default());
    assert_eq!(choice.kind, RepresentationKind::NativeVector);
}

#[test]
fn missing_representation_falls_back_to_raster() {
    let reps = RepresentationSet::new()
        .with(Representation::DialectVector("<v:group/>".to_string()));

    let choice = decide(&surface(true, false), &reps, &ComplexityReport::default());
    assert_eq!(choice.kind, RepresentationKind::Raster);
    assert_eq!(choice.quality, Quality::Good);
}

#[test]
fn raster_is_always_available() {
    let choice = decide(&surface(true, true), &RepresentationSet::new(), &ComplexityReport::default());
    assert_eq!(choice.kind, RepresentationKind::Raster);
    assert_eq!(choice.quality, Quality::Good);
}

#[test]
fn raster_only_surface() {
    let report = report(Category::Mask, Severity::High);
    let choice = decide(&surface(false, false), &all_representations(), &report);
    assert_eq!(choice.kind, RepresentationKind::Raster);
    assert_eq!(choice.quality, Quality::Good);
}

#[test]
fn poor_is_never_produced() {
    let reports = [
        ComplexityReport::default(),
        report(Category::Conversion, Severity::High),
        report(Category::Animation, Severity::High),
    ];

    for report in &reports {
        for choice in decide_all(mailsvg::surface::BUILTIN, &all_representations(), report) {
            assert_ne!(choice.quality, Quality::Poor);
        }
    }
}

#[test]
fn decide_all_keeps_registry_order() {
    let choices = decide_all(
        mailsvg::surface::BUILTIN,
        &all_representations(),
        &ComplexityReport::default(),
    );

    let ids: Vec<_> = choices.iter().map(|c| c.surface.id).collect();
    let expected: Vec<_> = mailsvg::surface::BUILTIN.iter().map(|s| s.id).collect();
    assert_eq!(ids, expected);

    let gmail = choices.iter().find(|c| c.surface.id == "gmail").unwrap();
    assert_eq!(gmail.kind, RepresentationKind::Raster);

    let outlook = choices.iter().find(|c| c.surface.id == "outlook-desktop").unwrap();
    assert_eq!(outlook.kind, RepresentationKind::DialectVector);
}

#[test]
fn summary_is_weighted_by_market_share() {
    let surfaces = [
        Surface {
            market_share: 30.0,
            ..surface(true, false)
        },
        Surface {
            market_share: 10.0,
            ..surface(false, false)
        },
    ];

    let choices = decide_all(&surfaces, &all_representations(), &ComplexityReport::default());
    let summary = CompatibilitySummary::new(&choices);

    assert!((summary.kind_share(RepresentationKind::NativeVector) - 75.0).abs() < 1e-9);
    assert!((summary.kind_share(RepresentationKind::Raster) - 25.0).abs() < 1e-9);
    assert!((summary.quality_share(Quality::Excellent) - 75.0).abs() < 1e-9);
    assert!((summary.quality_share(Quality::Good) - 25.0).abs() < 1e-9);
    assert!((summary.vector_share() - 75.0).abs() < 1e-9);
}

#[test]
fn summary_shares_add_up() {
    let choices = decide_all(
        mailsvg::surface::BUILTIN,
        &all_representations(),
        &ComplexityReport::default(),
    );
    let summary = CompatibilitySummary::new(&choices);

    let total: f64 = Quality::ALL.iter().map(|q| summary.quality_share(*q)).sum();
    assert!((total - 100.0).abs() < 1e-9);

    let total: f64 = RepresentationKind::ALL
        .iter()
        .map(|k| summary.kind_share(*k))
        .sum();
    assert!((total - 100.0).abs() < 1e-9);
}

#[test]
fn empty_summary() {
    let summary = CompatibilitySummary::new(&[]);
    assert_eq!(summary.vector_share(), 0.0);
}
