// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::hash::{Hash, Hasher};

use svg2vml::{
    AnalyzeOptions, Category, CleanupOptions, ComplexityReport, DialectDocument, Finding, Size,
    TranspileOptions, VectorSource,
};

use crate::assemble::{assemble_with, AssembleOptions, LayeredDocument};
use crate::cache::TranspileCache;
use crate::decide::{
    decide_all, CompatibilitySummary, FallbackChoice, Representation, RepresentationSet,
};
use crate::raster::{self, RasterCodec, RecompressOptions};
use crate::surface::{Surface, BUILTIN};
use crate::Error;

/// Pipeline options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Logo width in CSS pixels.
    ///
    /// When only one of the dimensions is set, the other one
    /// is derived from the logo aspect ratio.
    ///
    /// Default: `None`, the intrinsic logo width
    pub width: Option<u32>,

    /// Logo height in CSS pixels.
    ///
    /// Default: `None`, the intrinsic logo height
    pub height: Option<u32>,

    /// An alternative text.
    ///
    /// Default: empty
    pub alt: String,

    /// Includes the inline SVG layer.
    ///
    /// Default: true
    pub native: bool,

    /// Includes the VML layer.
    ///
    /// Default: true
    pub dialect: bool,

    /// Uses a gray image when the raster codec fails.
    /// Otherwise the codec error is returned.
    ///
    /// Default: true
    pub raster_placeholder: bool,

    /// Analysis options.
    pub analyze: AnalyzeOptions,

    /// Minification options of the SVG layer.
    ///
    /// When `id_prefix` is not set, a prefix derived from the source is used,
    /// so several logos can be placed into the same message.
    pub cleanup: CleanupOptions,

    /// A fill color of the VML placeholder.
    ///
    /// Default: `#cccccc`
    pub placeholder_color: String,

    /// Raster recompression options.
    pub recompress: RecompressOptions,

    /// Assembling options.
    pub assemble: AssembleOptions,

    /// Surfaces to decide on.
    ///
    /// Default: [`BUILTIN`]
    pub surfaces: &'static [Surface],
}

impl Default for Options {
    fn default() -> Self {
        Options {
            width: None,
            height: None,
            alt: String::new(),
            native: true,
            dialect: true,
            raster_placeholder: true,
            analyze: AnalyzeOptions::default(),
            cleanup: CleanupOptions::default(),
            placeholder_color: TranspileOptions::default().placeholder_color,
            recompress: RecompressOptions::default(),
            assemble: AssembleOptions::default(),
            surfaces: BUILTIN,
        }
    }
}

/// A pipeline result.
#[derive(Clone, Debug)]
pub struct Output {
    /// The final markup.
    pub document: LayeredDocument,
    /// Findings of the analysis and the conversion.
    pub report: ComplexityReport,
    /// Generated representations.
    pub representations: RepresentationSet,
    /// The VML conversion result, including a placeholder one.
    ///
    /// `None` for raster sources or when the VML layer is disabled.
    pub dialect: Option<DialectDocument>,
    /// A representation chosen for each surface.
    pub choices: Vec<FallbackChoice>,
    /// The logo size in CSS pixels.
    pub size: (u32, u32),
    /// Checks that the raster codec has failed and a placeholder is used instead.
    pub raster_is_placeholder: bool,
}

impl Output {
    /// Aggregates choices by market share.
    pub fn summary(&self) -> CompatibilitySummary {
        CompatibilitySummary::new(&self.choices)
    }
}

/// Processes a single logo.
///
/// `data` is an SVG, SVGZ or a raster image. `mime_hint` can be empty,
/// in which case the format is detected from the data.
///
/// Bad vector content never produces an error. It degrades to fewer layers
/// and findings in the report. Only raster codec failures are reported,
/// and only when [`Options::raster_placeholder`] is disabled.
pub fn process(
    data: &[u8],
    mime_hint: &str,
    opt: &Options,
    codec: &dyn RasterCodec,
) -> Result<Output, Error> {
    run(data, mime_hint, opt, codec, &mut svg2vml::transpile_with)
}

/// Like [`process`], but VML conversions are looked up in a cache first.
pub fn process_cached(
    data: &[u8],
    mime_hint: &str,
    opt: &Options,
    codec: &dyn RasterCodec,
    cache: &mut TranspileCache,
) -> Result<Output, Error> {
    run(data, mime_hint, opt, codec, &mut |text: &str, topt: &TranspileOptions| {
        cache.transpile(text, topt)
    })
}

type TranspileFn<'a> = dyn FnMut(&str, &TranspileOptions) -> DialectDocument + 'a;

struct Layers {
    native: Option<String>,
    dialect: Option<DialectDocument>,
    report: ComplexityReport,
    size: (u32, u32),
    raster_source: Vec<u8>,
    raster_mime: &'static str,
}

fn run(
    data: &[u8],
    mime_hint: &str,
    opt: &Options,
    codec: &dyn RasterCodec,
    transpile: &mut TranspileFn<'_>,
) -> Result<Output, Error> {
    let layers = if raster::is_vector(data, mime_hint) {
        vector_layers(data, opt, transpile)
    } else {
        log::debug!("Processing a raster logo.");
        Layers {
            native: None,
            dialect: None,
            report: ComplexityReport::default(),
            size: layout_size(opt, png_size(data)),
            raster_source: data.to_vec(),
            raster_mime: "",
        }
    };

    let (width, height) = layers.size;
    let mime = if layers.raster_mime.is_empty() {
        mime_hint
    } else {
        layers.raster_mime
    };

    let raster = codec
        .render(&layers.raster_source, mime, width, height)
        .and_then(|r| codec.recompress(&r, &opt.recompress));
    let (raster, raster_is_placeholder) = match raster {
        Ok(raster) => (raster, false),
        Err(e) if opt.raster_placeholder => {
            log::warn!("{}. A placeholder will be used.", e);
            (raster::placeholder(width, height), true)
        }
        Err(e) => return Err(e),
    };

    let mut representations = RepresentationSet::new();
    if let Some(ref svg) = layers.native {
        representations.insert(Representation::NativeVector(svg.clone()));
    }

    // A placeholder is never shown. Such surfaces get the raster layer instead.
    let group = layers
        .dialect
        .as_ref()
        .filter(|doc| !doc.is_placeholder())
        .map(|doc| doc.group());
    if let Some(group) = group {
        representations.insert(Representation::DialectVector(group.to_string()));
    }

    representations.insert(Representation::Raster(raster.clone()));

    let choices = decide_all(opt.surfaces, &representations, &layers.report);
    let document = assemble_with(
        layers.native.as_deref(),
        group,
        &raster,
        width,
        height,
        &opt.alt,
        &opt.assemble,
    );

    Ok(Output {
        document,
        report: layers.report,
        representations,
        dialect: layers.dialect,
        choices,
        size: (width, height),
        raster_is_placeholder,
    })
}

fn vector_layers(data: &[u8], opt: &Options, transpile: &mut TranspileFn<'_>) -> Layers {
    let mut report = svg2vml::analyze_data(data, &opt.analyze);

    let source = match VectorSource::from_data(data) {
        Ok(source) => source,
        Err(e) => {
            log::warn!("Failed to read the SVG cause {}. Only the raster layer will be used.", e);
            return Layers {
                native: None,
                dialect: None,
                report,
                size: layout_size(opt, None),
                raster_source: data.to_vec(),
                raster_mime: raster::SVG_MIME,
            };
        }
    };

    let size = layout_size(opt, source.size());

    if let Err(e) = svg2vml::PrimitiveTree::parse(source.text()) {
        log::warn!("Failed to parse the SVG cause {}. Only the raster layer will be used.", e);
        let finding = Finding::new(
            Category::AnalysisFailed,
            format!("the document cannot be parsed: {}", e),
        );
        return Layers {
            native: None,
            dialect: None,
            report: report.merged(&ComplexityReport::single(finding)),
            size,
            raster_source: data.to_vec(),
            raster_mime: raster::SVG_MIME,
        };
    }

    let sanitized = svg2vml::sanitize(source.text());

    let dialect = if opt.dialect {
        let topt = TranspileOptions {
            width: Some(f64::from(size.0)),
            height: Some(f64::from(size.1)),
            placeholder_color: opt.placeholder_color.clone(),
            analyze: opt.analyze,
        };

        let doc = transpile(&sanitized, &topt);
        report = report.merged(doc.report());
        Some(doc)
    } else {
        None
    };

    let native = if opt.native {
        let mut cleanup = opt.cleanup.clone();
        if cleanup.id_prefix.is_none() {
            cleanup.id_prefix = Some(id_prefix(&sanitized));
        }

        Some(svg2vml::minify(&sanitized, &cleanup))
    } else {
        None
    };

    Layers {
        native,
        dialect,
        report,
        size,
        raster_source: sanitized.into_bytes(),
        raster_mime: raster::SVG_MIME,
    }
}

/// Resolves the logo size in CSS pixels.
fn layout_size(opt: &Options, intrinsic: Option<Size>) -> (u32, u32) {
    let default = svg2vml::DEFAULT_SIZE;
    let px = |n: f64| n.round().max(1.0) as u32;
    let aspect = intrinsic.map(|s| s.aspect());

    let (w, h) = match (opt.width.filter(|n| *n > 0), opt.height.filter(|n| *n > 0)) {
        (Some(w), Some(h)) => return (w, h),
        (Some(w), None) => {
            let w = f64::from(w);
            (w, aspect.map_or(w, |a| w * a))
        }
        (None, Some(h)) => {
            let h = f64::from(h);
            (aspect.map_or(h, |a| h / a), h)
        }
        (None, None) => intrinsic.map_or((default, default), |s| (s.width(), s.height())),
    };

    (px(w), px(h))
}

fn id_prefix(text: &str) -> String {
    let mut hasher = siphasher::sip::SipHasher13::new();
    text.hash(&mut hasher);
    format!("l{:08x}-", hasher.finish() as u32)
}

/// Reads the size of a PNG image from its header.
fn png_size(data: &[u8]) -> Option<Size> {
    if !data.starts_with(b"\x89PNG\r\n\x1a\n") || data.len() < 24 || &data[12..16] != b"IHDR" {
        return None;
    }

    let read = |i: usize| u32::from_be_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
    Size::from_wh(f64::from(read(16)), f64::from(read(20)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(width: Option<u32>, height: Option<u32>) -> Options {
        Options {
            width,
            height,
            ..Options::default()
        }
    }

    #[test]
    fn size_from_aspect_ratio() {
        let intrinsic = Size::from_wh(200.0, 100.0);
        assert_eq!(layout_size(&options(Some(100), None), intrinsic), (100, 50));
        assert_eq!(layout_size(&options(None, Some(100)), intrinsic), (200, 100));
        assert_eq!(layout_size(&options(None, None), intrinsic), (200, 100));
        assert_eq!(layout_size(&options(Some(30), Some(40)), intrinsic), (30, 40));
    }

    #[test]
    fn default_size() {
        assert_eq!(layout_size(&options(None, None), None), (200, 200));
        assert_eq!(layout_size(&options(Some(0), None), None), (200, 200));
        assert_eq!(layout_size(&options(Some(64), None), None), (64, 64));
    }

    #[test]
    fn png_header() {
        let mut data = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        data.extend_from_slice(&300u32.to_be_bytes());
        data.extend_from_slice(&150u32.to_be_bytes());
        assert_eq!(png_size(&data), Size::from_wh(300.0, 150.0));
        assert_eq!(png_size(b"GIF89a"), None);
    }

    #[test]
    fn stable_id_prefix() {
        assert_eq!(id_prefix("<svg/>"), id_prefix("<svg/>"));
        assert_ne!(id_prefix("<svg/>"), id_prefix("<svg />"));
    }
}
