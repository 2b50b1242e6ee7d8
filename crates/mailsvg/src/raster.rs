// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use base64::Engine;

use crate::Error;

/// Mime type of the images produced by [`SkiaCodec`].
pub const PNG_MIME: &str = "image/png";

/// Mime type of SVG.
pub const SVG_MIME: &str = "image/svg+xml";

/// The largest raster side in pixels.
const MAX_SIDE: u32 = 8192;

const PLACEHOLDER_COLOR: (u8, u8, u8) = (0xcc, 0xcc, 0xcc);

/// An encoded image.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Raster {
    /// Encoded image data.
    pub data: Vec<u8>,
    /// Image mime type, like `image/png`.
    pub mime: String,
}

impl Raster {
    /// Creates a new image.
    pub fn new(data: Vec<u8>, mime: impl Into<String>) -> Self {
        Raster {
            data,
            mime: mime.into(),
        }
    }

    /// Returns the image as a base64 data URI.
    pub fn to_data_uri(&self) -> String {
        let mut uri = format!("data:{};base64,", self.mime);
        base64::engine::general_purpose::STANDARD.encode_string(&self.data, &mut uri);
        uri
    }
}

/// Recompression options.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RecompressOptions {
    /// Images wider than this are downscaled.
    ///
    /// Default: 1200
    pub max_width: u32,

    /// Images higher than this are downscaled.
    ///
    /// Default: 1200
    pub max_height: u32,
}

impl Default for RecompressOptions {
    fn default() -> Self {
        RecompressOptions {
            max_width: 1200,
            max_height: 1200,
        }
    }
}

/// A raster codec.
///
/// Produces the universal fallback image. Calls are synchronous and never retried.
pub trait RasterCodec {
    /// Renders a source asset into an image of the specified size in CSS pixels.
    ///
    /// `mime_hint` is the source mime type, when known. Can be empty.
    fn render(&self, source: &[u8], mime_hint: &str, width: u32, height: u32)
        -> Result<Raster, Error>;

    /// Re-encodes an image.
    fn recompress(&self, raster: &Raster, opt: &RecompressOptions) -> Result<Raster, Error>;
}

/// A codec backed by `resvg` and `tiny-skia`.
///
/// SVG and PNG sources are rendered into PNG. Other formats are passed through.
#[derive(Clone, Copy, Debug)]
pub struct SkiaCodec {
    /// A device pixel ratio.
    ///
    /// Images are rendered `pixel_ratio` times larger than the requested size
    /// to stay sharp on high density screens.
    ///
    /// Default: 2
    pub pixel_ratio: f32,
}

impl Default for SkiaCodec {
    fn default() -> Self {
        SkiaCodec { pixel_ratio: 2.0 }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Format {
    Svg,
    Png,
    Other,
}

fn detect_format(data: &[u8], mime_hint: &str) -> Format {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Format::Png;
    }

    match mime_hint {
        SVG_MIME => Format::Svg,
        PNG_MIME => Format::Png,
        "" => {
            // SVGZ or an XML text.
            let is_xml = data
                .iter()
                .find(|c| !c.is_ascii_whitespace())
                .map_or(false, |c| *c == b'<');
            if data.starts_with(&[0x1f, 0x8b]) || is_xml {
                Format::Svg
            } else {
                Format::Other
            }
        }
        _ => Format::Other,
    }
}

/// Checks that the data is an SVG or SVGZ document.
pub fn is_vector(data: &[u8], mime_hint: &str) -> bool {
    detect_format(data, mime_hint) == Format::Svg
}

impl SkiaCodec {
    fn device_size(&self, width: u32, height: u32) -> Result<(u32, u32), Error> {
        let scale = |n: u32| (n as f32 * self.pixel_ratio).round() as u32;
        let (w, h) = (scale(width), scale(height));
        if w == 0 || h == 0 {
            return Err(Error::Raster("target size is zero".to_string()));
        }

        if w > MAX_SIDE || h > MAX_SIDE {
            return Err(Error::Raster(format!(
                "raster size too large: {}x{} (max {}x{})",
                w, h, MAX_SIDE, MAX_SIDE
            )));
        }

        Ok((w, h))
    }

    fn render_svg(&self, data: &[u8], width: u32, height: u32) -> Result<tiny_skia::Pixmap, Error> {
        let tree = resvg::usvg::Tree::from_data(data, &resvg::usvg::Options::default())?;
        let (w, h) = self.device_size(width, height)?;
        let mut pixmap = new_pixmap(w, h)?;

        let size = tree.size();
        let ts = tiny_skia::Transform::from_scale(w as f32 / size.width(), h as f32 / size.height());
        resvg::render(&tree, ts, &mut pixmap.as_mut());
        Ok(pixmap)
    }

    fn render_png(&self, data: &[u8], width: u32, height: u32) -> Result<tiny_skia::Pixmap, Error> {
        let image = decode_png(data)?;
        let (w, h) = self.device_size(width, height)?;
        resize(&image, w, h)
    }
}

impl RasterCodec for SkiaCodec {
    fn render(
        &self,
        source: &[u8],
        mime_hint: &str,
        width: u32,
        height: u32,
    ) -> Result<Raster, Error> {
        let pixmap = match detect_format(source, mime_hint) {
            Format::Svg => self.render_svg(source, width, height)?,
            Format::Png => self.render_png(source, width, height)?,
            Format::Other => {
                log::debug!("'{}' images are passed through as is.", mime_hint);
                let mime = if mime_hint.is_empty() {
                    "application/octet-stream"
                } else {
                    mime_hint
                };
                return Ok(Raster::new(source.to_vec(), mime));
            }
        };

        encode_png(&pixmap)
    }

    fn recompress(&self, raster: &Raster, opt: &RecompressOptions) -> Result<Raster, Error> {
        if detect_format(&raster.data, &raster.mime) != Format::Png {
            return Ok(raster.clone());
        }

        let image = decode_png(&raster.data)?;
        let (w, h) = (image.width(), image.height());
        let scale = (opt.max_width as f32 / w as f32)
            .min(opt.max_height as f32 / h as f32)
            .min(1.0);

        let image = if scale < 1.0 {
            let new_w = ((w as f32 * scale).round() as u32).max(1);
            let new_h = ((h as f32 * scale).round() as u32).max(1);
            resize(&image, new_w, new_h)?
        } else {
            image
        };

        encode_png(&image)
    }
}

/// Creates a neutral gray image.
///
/// Used when a codec fails. Falls back to an SVG image when even
/// a plain PNG cannot be produced.
pub fn placeholder(width: u32, height: u32) -> Raster {
    let (w, h) = (width.clamp(1, MAX_SIDE), height.clamp(1, MAX_SIDE));
    let (r, g, b) = PLACEHOLDER_COLOR;

    let png = new_pixmap(w, h).and_then(|mut pixmap| {
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
        encode_png(&pixmap)
    });

    match png {
        Ok(raster) => raster,
        Err(e) => {
            log::warn!("Failed to create a PNG placeholder cause {}.", e);
            let svg = format!(
                "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\">\
                 <rect width=\"100%\" height=\"100%\" fill=\"#{:02x}{:02x}{:02x}\"/></svg>",
                w, h, r, g, b
            );
            Raster::new(svg.into_bytes(), SVG_MIME)
        }
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<tiny_skia::Pixmap, Error> {
    tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| Error::Raster(format!("failed to allocate a {}x{} pixmap", width, height)))
}

fn decode_png(data: &[u8]) -> Result<tiny_skia::Pixmap, Error> {
    tiny_skia::Pixmap::decode_png(data).map_err(|e| Error::Raster(e.to_string()))
}

fn encode_png(pixmap: &tiny_skia::Pixmap) -> Result<Raster, Error> {
    let data = pixmap
        .encode_png()
        .map_err(|e| Error::Raster(e.to_string()))?;
    Ok(Raster::new(data, PNG_MIME))
}

fn resize(image: &tiny_skia::Pixmap, width: u32, height: u32) -> Result<tiny_skia::Pixmap, Error> {
    if image.width() == width && image.height() == height {
        return Ok(image.clone());
    }

    let mut pixmap = new_pixmap(width, height)?;
    let ts = tiny_skia::Transform::from_scale(
        width as f32 / image.width() as f32,
        height as f32 / image.height() as f32,
    );

    let paint = tiny_skia::PixmapPaint {
        quality: tiny_skia::FilterQuality::Bicubic,
        ..tiny_skia::PixmapPaint::default()
    };

    pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, ts, None);
    Ok(pixmap)
}
