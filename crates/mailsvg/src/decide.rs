// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;

use svg2vml::{Category, ComplexityReport, Severity};

use crate::raster::Raster;
use crate::surface::Surface;

/// A representation kind.
///
/// Variants are listed in the selection order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RepresentationKind {
    /// Inline SVG.
    NativeVector,
    /// VML.
    DialectVector,
    /// A raster image.
    Raster,
}

impl RepresentationKind {
    /// All kinds in the selection order.
    pub const ALL: [RepresentationKind; 3] = [
        RepresentationKind::NativeVector,
        RepresentationKind::DialectVector,
        RepresentationKind::Raster,
    ];

    /// Returns a kebab-case keyword for the kind.
    pub fn to_str(self) -> &'static str {
        match self {
            RepresentationKind::NativeVector => "native-vector",
            RepresentationKind::DialectVector => "dialect-vector",
            RepresentationKind::Raster => "raster",
        }
    }
}

impl fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// A generated asset representation.
#[derive(Clone, PartialEq, Debug)]
pub enum Representation {
    /// SVG markup.
    NativeVector(String),
    /// VML markup.
    DialectVector(String),
    /// An encoded image.
    Raster(Raster),
}

impl Representation {
    /// Returns the representation kind.
    pub fn kind(&self) -> RepresentationKind {
        match self {
            Representation::NativeVector(_) => RepresentationKind::NativeVector,
            Representation::DialectVector(_) => RepresentationKind::DialectVector,
            Representation::Raster(_) => RepresentationKind::Raster,
        }
    }
}

/// Representations available for a single asset.
///
/// Holds at most one representation of each kind.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct RepresentationSet {
    native: Option<String>,
    dialect: Option<String>,
    raster: Option<Raster>,
}

impl RepresentationSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        RepresentationSet::default()
    }

    /// Adds a representation.
    ///
    /// A representation of the same kind is replaced and returned.
    pub fn insert(&mut self, representation: Representation) -> Option<Representation> {
        match representation {
            Representation::NativeVector(markup) => self
                .native
                .replace(markup)
                .map(Representation::NativeVector),
            Representation::DialectVector(markup) => self
                .dialect
                .replace(markup)
                .map(Representation::DialectVector),
            Representation::Raster(raster) => {
                self.raster.replace(raster).map(Representation::Raster)
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, representation: Representation) -> Self {
        self.insert(representation);
        self
    }

    /// Checks that a representation of the specified kind is present.
    pub fn contains(&self, kind: RepresentationKind) -> bool {
        match kind {
            RepresentationKind::NativeVector => self.native.is_some(),
            RepresentationKind::DialectVector => self.dialect.is_some(),
            RepresentationKind::Raster => self.raster.is_some(),
        }
    }

    /// Returns the SVG markup.
    pub fn native(&self) -> Option<&str> {
        self.native.as_deref()
    }

    /// Returns the VML markup.
    pub fn dialect(&self) -> Option<&str> {
        self.dialect.as_deref()
    }

    /// Returns the raster image.
    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }

    /// Returns the number of representations.
    pub fn len(&self) -> usize {
        RepresentationKind::ALL
            .iter()
            .filter(|k| self.contains(**k))
            .count()
    }

    /// Checks that the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An estimated rendering quality.
///
/// Ordered from the worst to the best.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Quality {
    /// Reserved. Never produced by [`decide`].
    Poor,
    /// Noticeably approximated.
    Fair,
    /// Correct, but not pixel perfect.
    Good,
    /// Rendered exactly as designed.
    Excellent,
}

impl Quality {
    /// All ratings from the best to the worst.
    pub const ALL: [Quality; 4] = [Quality::Excellent, Quality::Good, Quality::Fair, Quality::Poor];

    /// Returns a lowercase keyword for the rating.
    pub fn to_str(self) -> &'static str {
        match self {
            Quality::Poor => "poor",
            Quality::Fair => "fair",
            Quality::Good => "good",
            Quality::Excellent => "excellent",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// A representation chosen for a surface.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FallbackChoice {
    /// The target surface.
    pub surface: Surface,
    /// The chosen representation.
    pub kind: RepresentationKind,
    /// The estimated quality.
    pub quality: Quality,
}

/// Chooses a representation for a surface.
///
/// Native vector wins when both the surface and the asset have one,
/// then dialect vector under the same condition, then raster.
/// Raster is always considered available, even when `representations` has none.
pub fn decide(
    surface: &Surface,
    representations: &RepresentationSet,
    report: &ComplexityReport,
) -> FallbackChoice {
    let capability = surface.capability;
    let kind = if capability.supports_native && representations.contains(RepresentationKind::NativeVector) {
        RepresentationKind::NativeVector
    } else if capability.supports_dialect
        && representations.contains(RepresentationKind::DialectVector)
    {
        RepresentationKind::DialectVector
    } else {
        RepresentationKind::Raster
    };

    FallbackChoice {
        surface: *surface,
        kind,
        quality: quality(kind, report),
    }
}

/// Chooses a representation for each surface, in the registry order.
pub fn decide_all(
    surfaces: &[Surface],
    representations: &RepresentationSet,
    report: &ComplexityReport,
) -> Vec<FallbackChoice> {
    surfaces
        .iter()
        .map(|s| decide(s, representations, report))
        .collect()
}

/// Estimates the rendering quality of a representation.
pub fn quality(kind: RepresentationKind, report: &ComplexityReport) -> Quality {
    let vector = || {
        if report.has_at_least(Severity::High) {
            Quality::Good
        } else {
            Quality::Excellent
        }
    };

    match kind {
        RepresentationKind::NativeVector => vector(),
        RepresentationKind::DialectVector => {
            let is_lossy = report
                .iter()
                .any(|f| f.category == Category::Conversion && f.severity >= Severity::Medium);
            if is_lossy {
                Quality::Fair
            } else {
                vector()
            }
        }
        RepresentationKind::Raster => Quality::Good,
    }
}

/// Fallback choices aggregated by market share.
///
/// All shares are in percents of the total share of the decided surfaces.
#[derive(Clone, Debug)]
pub struct CompatibilitySummary {
    by_quality: [f64; 4],
    by_kind: [f64; 3],
}

impl CompatibilitySummary {
    /// Aggregates choices.
    pub fn new(choices: &[FallbackChoice]) -> Self {
        let mut by_quality = [0.0; 4];
        let mut by_kind = [0.0; 3];

        let total: f64 = choices.iter().map(|c| c.surface.market_share).sum();
        if total > 0.0 {
            for choice in choices {
                let share = choice.surface.market_share / total * 100.0;
                by_quality[quality_index(choice.quality)] += share;
                by_kind[kind_index(choice.kind)] += share;
            }
        }

        CompatibilitySummary {
            by_quality,
            by_kind,
        }
    }

    /// Returns the share of surfaces with the specified quality.
    pub fn quality_share(&self, quality: Quality) -> f64 {
        self.by_quality[quality_index(quality)]
    }

    /// Returns the share of surfaces that use the specified representation.
    pub fn kind_share(&self, kind: RepresentationKind) -> f64 {
        self.by_kind[kind_index(kind)]
    }

    /// Returns the share of surfaces that render a vector representation.
    pub fn vector_share(&self) -> f64 {
        self.kind_share(RepresentationKind::NativeVector)
            + self.kind_share(RepresentationKind::DialectVector)
    }
}

fn quality_index(quality: Quality) -> usize {
    quality as usize
}

fn kind_index(kind: RepresentationKind) -> usize {
    kind as usize
}
