// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`svg2vml` converts SVG logos into [VML], the vector dialect understood by the
Outlook desktop family of mail clients.

The crate is a set of pure functions over a single SVG document:

- [`analyze`] scans the source for features that cannot survive the
  conversion and returns a [`ComplexityReport`].
- [`sanitize`] strips executable content and re-serializes the document.
  [`minify`] shares the same writer and additionally removes editor metadata.
- [`can_transpile`] is the feasibility gate: no `high` severity finding.
- [`transpile`] rewrites the supported primitives (`rect`, `circle`, `ellipse`,
  `line`, `polyline`, `polygon` and `path`) into VML, scaled to a target size.

None of these functions return an error for bad input. Malformed or infeasible
documents degrade to a neutral placeholder and a finding in the report.

## Limitations

- Only a bounded subset of SVG is converted. Animations, filters, masks and
  clip paths block the conversion. Gradients are flattened to a single color.
- Curves are converted approximately.
- Text is not converted.

[VML]: https://en.wikipedia.org/wiki/Vector_Markup_Language
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod analyze;
mod color;
mod geom;
mod report;
mod sanitize;
mod source;
mod tree;
mod units;
mod vml;

pub use analyze::{analyze, analyze_data, analyze_with, can_transpile, AnalyzeOptions};
pub use geom::{Rect, Size, Transform, ViewBox};
pub use report::{Category, ComplexityReport, Finding, Severity};
pub use sanitize::{minify, sanitize, CleanupOptions};
pub use source::{decompress_svgz, VectorSource};
pub use tree::{ElementKind, PrimitiveElement, PrimitiveTree};
pub use vml::{transpile, transpile_with, DialectDocument, TranspileOptions, DEFAULT_SIZE};

/// List of all errors.
///
/// Errors never leave the analysis or conversion functions. They are used
/// by [`VectorSource::from_data`] and [`PrimitiveTree::parse`] and are turned
/// into findings everywhere else.
#[derive(Debug)]
pub enum Error {
    /// Only UTF-8 content are supported.
    NotAnUtf8Str,

    /// Compressed SVG must use the GZip algorithm.
    MalformedGZip,

    /// The root element is not `svg`.
    NotAnSvg,

    /// Failed to parse an SVG data.
    ParsingFailed(roxmltree::Error),
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::ParsingFailed(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::NotAnUtf8Str => {
                write!(f, "provided data has not an UTF-8 encoding")
            }
            Error::MalformedGZip => {
                write!(f, "provided data has a malformed GZip content")
            }
            Error::NotAnSvg => {
                write!(f, "the root element is not an SVG element")
            }
            Error::ParsingFailed(ref e) => {
                write!(f, "SVG data parsing failed cause {}", e)
            }
        }
    }
}

impl std::error::Error for Error {}

pub(crate) fn parse_xml(text: &str) -> Result<roxmltree::Document<'_>, Error> {
    let opt = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };

    let doc = roxmltree::Document::parse_with_options(text, opt)?;
    if !doc.root_element().has_tag_name("svg") {
        return Err(Error::NotAnSvg);
    }

    Ok(doc)
}
