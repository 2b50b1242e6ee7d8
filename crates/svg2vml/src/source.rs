// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::geom::{Size, ViewBox};
use crate::{units, Error};

/// An ingested SVG source.
///
/// Holds the source text together with its intrinsic size and viewport.
/// The text is never modified after creation.
#[derive(Clone, Debug)]
pub struct VectorSource {
    text: String,
    size: Option<Size>,
    view_box: Option<ViewBox>,
}

impl VectorSource {
    /// Creates a new source from an SVG string.
    ///
    /// Never fails. When the text cannot be parsed, the source simply
    /// has no size and no viewport.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let (size, view_box) = match crate::parse_xml(&text) {
            Ok(doc) => read_geometry(doc.root_element()),
            Err(e) => {
                log::debug!("Failed to read the SVG geometry cause {}.", e);
                (None, None)
            }
        };

        VectorSource {
            text,
            size,
            view_box,
        }
    }

    /// Creates a new source from an SVG or SVGZ data.
    pub fn from_data(data: &[u8]) -> Result<Self, Error> {
        let text = decode(data)?;
        Ok(Self::new(text))
    }

    /// Returns the source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the source text, consuming the source.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Returns the intrinsic size.
    ///
    /// When explicit dimensions are absent, the size is derived from the viewport.
    pub fn size(&self) -> Option<Size> {
        self.size
    }

    /// Returns the coordinate viewport.
    pub fn view_box(&self) -> Option<ViewBox> {
        self.view_box
    }
}

/// Reads the intrinsic size and the viewport of the root `svg` element.
pub(crate) fn read_geometry(svg: roxmltree::Node) -> (Option<Size>, Option<ViewBox>) {
    let view_box = svg
        .attribute("viewBox")
        .and_then(|v| v.parse::<ViewBox>().ok());
    let width = svg.attribute("width").and_then(units::parse_dimension);
    let height = svg.attribute("height").and_then(units::parse_dimension);

    let size = match (width, height, view_box) {
        (Some(w), Some(h), _) => Size::from_wh(w, h),
        (Some(w), None, Some(vb)) => Size::from_wh(w, w * vb.height / vb.width),
        (None, Some(h), Some(vb)) => Size::from_wh(h * vb.width / vb.height, h),
        (None, None, Some(vb)) => Some(vb.size()),
        _ => None,
    };

    (size, view_box)
}

/// Decodes an SVG or SVGZ data into a string.
pub(crate) fn decode(data: &[u8]) -> Result<String, Error> {
    let text = if data.starts_with(&[0x1f, 0x8b]) {
        let data = decompress_svgz(data)?;
        String::from_utf8(data).map_err(|_| Error::NotAnUtf8Str)?
    } else {
        std::str::from_utf8(data)
            .map_err(|_| Error::NotAnUtf8Str)?
            .to_string()
    };

    match text.strip_prefix('\u{feff}') {
        Some(stripped) => Ok(stripped.to_string()),
        None => Ok(text),
    }
}

/// Decompresses an SVGZ file.
pub fn decompress_svgz(data: &[u8]) -> Result<Vec<u8>, Error> {
    use std::io::Read;

    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut decoded = Vec::with_capacity(data.len() * 2);
    decoder
        .read_to_end(&mut decoded)
        .map_err(|_| Error::MalformedGZip)?;
    Ok(decoded)
}
