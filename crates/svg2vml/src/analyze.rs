// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::fmt;

use crate::report::{Category, ComplexityReport, Finding, Severity};

/// Analysis options.
#[derive(Clone, Copy, Debug)]
pub struct AnalyzeOptions {
    /// A document size in bytes above which a `document-size` finding is raised.
    ///
    /// Default: 100 KiB
    pub max_document_size: usize,

    /// A number of drawing commands in a single path above which
    /// a `complex-path` finding is raised.
    ///
    /// Default: 50
    pub max_path_commands: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        AnalyzeOptions {
            max_document_size: 100 * 1024,
            max_path_commands: 50,
        }
    }
}

/// A feature signal.
///
/// All patterns are lowercase, since the matching is done on a lowercased copy
/// of the source.
struct Signal {
    category: Category,
    /// Element local names.
    tags: &'static [&'static str],
    /// Attribute names. Matched as ` name=`.
    attributes: &'static [&'static str],
    /// Plain substrings, mostly CSS properties.
    markers: &'static [&'static str],
    message: &'static str,
}

impl Signal {
    fn matches(&self, text: &str, tags: &HashSet<&str>) -> bool {
        self.tags.iter().any(|name| tags.contains(*name))
            || self.attributes.iter().any(|name| has_attribute(text, name))
            || self.markers.iter().any(|marker| text.contains(marker))
    }
}

static SIGNALS: &[Signal] = &[
    Signal {
        category: Category::Animation,
        tags: &["animate", "animatetransform", "animatemotion", "animatecolor", "set"],
        attributes: &[],
        markers: &["@keyframes", "animation:", "animation-name:"],
        message: "animations cannot be represented by static markup",
    },
    Signal {
        category: Category::Gradient,
        tags: &["lineargradient", "radialgradient", "meshgradient"],
        attributes: &[],
        markers: &[],
        message: "gradients will be flattened to a solid color",
    },
    Signal {
        category: Category::Filter,
        tags: &["filter"],
        attributes: &["filter"],
        markers: &["filter:"],
        message: "filter effects are not supported",
    },
    Signal {
        category: Category::Mask,
        tags: &["mask"],
        attributes: &["mask"],
        markers: &["mask:"],
        message: "masks are not supported",
    },
    Signal {
        category: Category::ClipPath,
        tags: &["clippath"],
        attributes: &["clip-path"],
        markers: &["clip-path:"],
        message: "clip paths are not supported",
    },
    Signal {
        category: Category::EmbeddedImage,
        tags: &["image"],
        attributes: &[],
        markers: &[],
        message: "embedded raster images will be dropped from the vector output",
    },
    Signal {
        category: Category::Text,
        tags: &["text", "textpath", "tspan"],
        attributes: &[],
        markers: &[],
        message: "text will be dropped from the vector output",
    },
];

/// Analyzes an SVG source using the default options.
///
/// See [`analyze_with`].
pub fn analyze(text: &str) -> ComplexityReport {
    analyze_with(text, &AnalyzeOptions::default())
}

/// Analyzes an SVG source.
///
/// This is a lightweight textual scan and not a parser,
/// so it works on malformed and truncated documents as well.
/// Each signal is reported at most once.
///
/// Never fails. A scanning error produces an `analysis-failed` finding
/// while the rest of the signals are still reported.
pub fn analyze_with(text: &str, opt: &AnalyzeOptions) -> ComplexityReport {
    let lower = text.to_ascii_lowercase();
    let tags = tag_names(&lower);
    let mut findings = Vec::new();

    for signal in SIGNALS {
        if signal.matches(&lower, &tags) {
            findings.push(Finding::new(signal.category, signal.message));
        }
    }

    match max_path_commands(&lower) {
        Ok(count) if count > opt.max_path_commands => {
            findings.push(Finding::new(
                Category::ComplexPath,
                format!(
                    "a path has {} drawing commands, the limit is {}",
                    count, opt.max_path_commands
                ),
            ));
        }
        Ok(_) => {}
        Err(e) => {
            log::warn!("SVG analysis failed cause {}.", e);
            findings.push(analysis_failed(&e));
        }
    }

    if text.len() > opt.max_document_size {
        findings.push(Finding::new(
            Category::DocumentSize,
            format!(
                "the document is {} bytes, the limit is {}",
                text.len(),
                opt.max_document_size
            ),
        ));
    }

    ComplexityReport::from_findings(findings)
}

/// Analyzes a raw SVG or SVGZ data.
///
/// Data that cannot be decoded produces a single `analysis-failed` finding.
pub fn analyze_data(data: &[u8], opt: &AnalyzeOptions) -> ComplexityReport {
    match crate::source::decode(data) {
        Ok(text) => analyze_with(&text, opt),
        Err(e) => {
            log::warn!("SVG analysis failed cause {}.", e);
            ComplexityReport::single(analysis_failed(&e))
        }
    }
}

/// Checks that a report allows the VML conversion.
///
/// Only `high` severity findings block the conversion.
pub fn can_transpile(report: &ComplexityReport) -> bool {
    !report.iter().any(|f| f.severity == Severity::High)
}

fn analysis_failed(e: &dyn fmt::Display) -> Finding {
    Finding::new(Category::AnalysisFailed, format!("analysis failed: {}", e))
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum ScanError {
    UnterminatedAttribute { name: &'static str, offset: usize },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ScanError::UnterminatedAttribute { name, offset } => {
                write!(f, "unterminated '{}' attribute at byte {}", name, offset)
            }
        }
    }
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b':' | b'-' | b'_' | b'.')
}

/// Collects local names of all elements in a single pass.
///
/// A namespace prefix, like in `<svg:animate`, is skipped.
fn tag_names(text: &str) -> HashSet<&str> {
    let bytes = text.as_bytes();
    let mut names = HashSet::new();
    for (idx, _) in text.match_indices('<') {
        let start = idx + 1;
        let len = bytes[start..].iter().take_while(|c| is_name_char(**c)).count();
        let name = &text[start..start + len];
        let local = match name.rfind(':') {
            Some(colon) => &name[colon + 1..],
            None => name,
        };

        if !local.is_empty() {
            names.insert(local);
        }
    }

    names
}

fn has_attribute(text: &str, name: &str) -> bool {
    let bytes = text.as_bytes();
    text.match_indices(name).any(|(idx, _)| {
        if idx == 0 || !bytes[idx - 1].is_ascii_whitespace() {
            return false;
        }

        let mut i = idx + name.len();
        while bytes.get(i).map_or(false, |c| c.is_ascii_whitespace()) {
            i += 1;
        }

        bytes.get(i) == Some(&b'=')
    })
}

/// Iterates over quoted values of an attribute.
struct AttributeValues<'a> {
    text: &'a str,
    name: &'static str,
    pos: usize,
}

impl<'a> Iterator for AttributeValues<'a> {
    type Item = Result<&'a str, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();
        loop {
            let idx = self.pos + self.text.get(self.pos..)?.find(self.name)?;
            self.pos = idx + self.name.len();

            if idx == 0 || !bytes[idx - 1].is_ascii_whitespace() {
                continue;
            }

            let mut i = self.pos;
            while bytes.get(i).map_or(false, |c| c.is_ascii_whitespace()) {
                i += 1;
            }

            if bytes.get(i) != Some(&b'=') {
                continue;
            }
            i += 1;

            while bytes.get(i).map_or(false, |c| c.is_ascii_whitespace()) {
                i += 1;
            }

            let quote = match bytes.get(i) {
                Some(&c) if c == b'"' || c == b'\'' => c as char,
                _ => continue,
            };

            let start = i + 1;
            return match self.text[start..].find(quote) {
                Some(len) => {
                    self.pos = start + len + 1;
                    Some(Ok(&self.text[start..start + len]))
                }
                None => {
                    self.pos = self.text.len();
                    Some(Err(ScanError::UnterminatedAttribute {
                        name: self.name,
                        offset: idx,
                    }))
                }
            };
        }
    }
}

/// Returns the largest number of drawing commands in a single path data.
fn max_path_commands(text: &str) -> Result<usize, ScanError> {
    let values = AttributeValues {
        text,
        name: "d",
        pos: 0,
    };

    let mut max = 0;
    for value in values {
        let count = value?
            .bytes()
            // `e` is an exponent and not a command.
            .filter(|c| c.is_ascii_alphabetic() && *c != b'e')
            .count();
        max = max.max(count);
    }

    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matching() {
        let has_tag = |text: &str, name: &str| tag_names(text).contains(name);
        assert!(has_tag("<svg><set attributeName='x'/></svg>", "set"));
        assert!(has_tag("<svg:animate/>", "animate"));
        assert!(!has_tag("<settings/>", "set"));
        assert!(!has_tag("<imagery>", "image"));
        assert!(has_tag("<image", "image"));
        assert!(has_tag("<svg xmlns='http://www.w3.org/2000/svg'><rect/>", "rect"));
        assert!(!has_tag("<a>1 < 2</a>", "2"));
    }

    #[test]
    fn attribute_matching() {
        assert!(has_attribute("<rect mask = 'url(#m)'/>", "mask"));
        assert!(!has_attribute("<rect id='mask'/>", "mask"));
        assert!(!has_attribute("<mask id='m'/>", "mask"));
    }

    #[test]
    fn path_commands_count() {
        let text = "<path d='m 1e2 0 l 10 10 z'/><path d=\"m0 0h1v1h-1z\"/>";
        assert_eq!(max_path_commands(text), Ok(5));
    }

    #[test]
    fn unterminated_path_data() {
        let text = "<path d='m 0 0 l 10 10";
        assert!(max_path_commands(text).is_err());
    }
}
