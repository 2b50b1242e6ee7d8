// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;

/// A finding severity.
///
/// Ordered from the least to the most severe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Severity {
    /// Affects the output quality only marginally.
    Low,
    /// Degrades the output quality, but the conversion is still possible.
    Medium,
    /// Blocks the conversion.
    High,
}

impl Severity {
    /// Returns a lowercase keyword for the severity.
    pub fn to_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// A finding category.
///
/// Every category, except [`Category::Conversion`], corresponds to exactly one
/// analysis signal and has a fixed severity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Category {
    /// `animate`, `set` and other SMIL elements or CSS animations.
    Animation,
    /// Linear, radial and mesh gradients.
    Gradient,
    /// Filter effects.
    Filter,
    /// Masks.
    Mask,
    /// Clip paths.
    ClipPath,
    /// Embedded raster images.
    EmbeddedImage,
    /// Text and text on path.
    Text,
    /// A path with too many drawing commands.
    ComplexPath,
    /// A document above the size threshold.
    DocumentSize,
    /// The analysis itself has failed.
    AnalysisFailed,
    /// Raised by the converter: skipped or approximated content.
    Conversion,
}

impl Category {
    /// Returns the severity assigned to the category.
    ///
    /// [`Category::Conversion`] findings may use any severity,
    /// `Medium` is only a default.
    pub fn severity(self) -> Severity {
        match self {
            Category::Animation | Category::Filter | Category::Mask | Category::ClipPath => {
                Severity::High
            }
            Category::Gradient
            | Category::EmbeddedImage
            | Category::Text
            | Category::DocumentSize
            | Category::AnalysisFailed
            | Category::Conversion => Severity::Medium,
            Category::ComplexPath => Severity::Low,
        }
    }

    /// Returns a kebab-case keyword for the category.
    pub fn to_str(self) -> &'static str {
        match self {
            Category::Animation => "animation",
            Category::Gradient => "gradient",
            Category::Filter => "filter",
            Category::Mask => "mask",
            Category::ClipPath => "clip-path",
            Category::EmbeddedImage => "embedded-image",
            Category::Text => "text",
            Category::ComplexPath => "complex-path",
            Category::DocumentSize => "document-size",
            Category::AnalysisFailed => "analysis-failed",
            Category::Conversion => "conversion",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// A severity-tagged observation about the source content.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Finding {
    /// The finding category.
    pub category: Category,
    /// A human readable description.
    pub message: String,
    /// The finding severity.
    pub severity: Severity,
}

impl Finding {
    /// Creates a new finding with the category severity.
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Finding {
            category,
            message: message.into(),
            severity: category.severity(),
        }
    }

    /// Creates a new finding with an explicit severity.
    pub fn with_severity(category: Category, severity: Severity, message: impl Into<String>) -> Self {
        Finding {
            category,
            message: message.into(),
            severity,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)
    }
}

/// An immutable list of findings.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct ComplexityReport {
    findings: Vec<Finding>,
}

impl ComplexityReport {
    /// Creates a report from a list of findings.
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        ComplexityReport { findings }
    }

    /// Creates a report with a single finding.
    pub fn single(finding: Finding) -> Self {
        ComplexityReport {
            findings: vec![finding],
        }
    }

    /// Returns all findings in the order they were raised.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Returns an iterator over findings.
    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.findings.iter()
    }

    /// Checks that the report has no findings.
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns the number of findings.
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// Checks that the report has a finding of the specified category.
    pub fn contains(&self, category: Category) -> bool {
        self.findings.iter().any(|f| f.category == category)
    }

    /// Checks that the report has a finding of at least the specified severity.
    pub fn has_at_least(&self, severity: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= severity)
    }

    /// Returns the highest severity in the report.
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    /// Returns a new report that contains findings of both reports.
    ///
    /// Findings that are already present in `self` are not repeated.
    pub fn merged(&self, other: &ComplexityReport) -> ComplexityReport {
        let mut findings = self.findings.clone();
        for finding in &other.findings {
            if !findings.contains(finding) {
                findings.push(finding.clone());
            }
        }

        ComplexityReport { findings }
    }
}

impl<'a> IntoIterator for &'a ComplexityReport {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.iter()
    }
}
