// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`mailsvg` packages a logo for email.

Email clients disagree on what they can render. Apple Mail renders inline SVG,
the Outlook desktop family renders only VML and most webmails render only raster
images. This crate produces all three representations and assembles them into
a single HTML snippet where each client picks exactly one via conditional markup.

The pipeline:

1. The SVG source is analyzed and sanitized by [`svg2vml`].
2. The sanitized source is converted into VML.
3. A raster fallback is produced by a [`RasterCodec`](raster::RasterCodec).
4. A representation is chosen for each known [`Surface`](surface::Surface).
5. All representations are assembled into a [`LayeredDocument`](assemble::LayeredDocument).

Use [`process`] to run the whole pipeline or call the individual steps directly.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(clippy::uninlined_format_args)]

pub mod assemble;
pub mod cache;
pub mod decide;
pub mod pipeline;
pub mod raster;
pub mod surface;

pub use assemble::{assemble, assemble_with, AssembleOptions, LayeredDocument};
pub use cache::TranspileCache;
pub use decide::{
    decide, decide_all, CompatibilitySummary, FallbackChoice, Quality, Representation,
    RepresentationKind, RepresentationSet,
};
pub use pipeline::{process, process_cached, Options, Output};
pub use raster::{Raster, RasterCodec, RecompressOptions, SkiaCodec};
pub use surface::{Surface, SurfaceCapability};

pub use svg2vml;

/// List of all errors.
///
/// Vector content never produces an error, it degrades to placeholders
/// and findings instead. Only external collaborators can fail.
#[derive(Debug)]
pub enum Error {
    /// Raster generation failed.
    Raster(String),
}

impl From<resvg::usvg::Error> for Error {
    fn from(e: resvg::usvg::Error) -> Self {
        Error::Raster(e.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Raster(ref e) => {
                write!(f, "raster generation failed cause {}", e)
            }
        }
    }
}

impl std::error::Error for Error {}
