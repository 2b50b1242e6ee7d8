// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt::Write;
use std::hash::{Hash, Hasher};

use crate::decide::RepresentationKind;
use crate::raster::Raster;
use crate::surface::SurfaceCapability;

const LAYER_STYLE: &str = "position:absolute;top:0;left:0;width:100%;height:100%;";

/// Assembling options.
#[derive(Clone, Debug)]
pub struct AssembleOptions {
    /// A prefix of the generated class names.
    ///
    /// Must be a valid CSS identifier.
    ///
    /// Default: `logo-`
    pub class_prefix: String,

    /// The largest container width in pixels.
    ///
    /// Default: `None`, the logo width
    pub max_width: Option<u32>,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        AssembleOptions {
            class_prefix: "logo-".to_string(),
            max_width: None,
        }
    }
}

/// A final markup with all representations of a logo.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LayeredDocument {
    markup: String,
    id: String,
    has_native: bool,
    has_dialect: bool,
}

impl LayeredDocument {
    /// Returns the HTML markup.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Returns the class name that scopes the document styles.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns included layers in the document order.
    ///
    /// The raster layer is always present.
    pub fn layers(&self) -> Vec<RepresentationKind> {
        let mut layers = Vec::with_capacity(3);
        if self.has_dialect {
            layers.push(RepresentationKind::DialectVector);
        }

        if self.has_native {
            layers.push(RepresentationKind::NativeVector);
        }

        layers.push(RepresentationKind::Raster);
        layers
    }

    /// Returns layers that will be rendered by a surface.
    ///
    /// Conditional comments are evaluated only by surfaces that render VML.
    pub fn visible_layers(&self, capability: &SurfaceCapability) -> Vec<RepresentationKind> {
        let is_mso = capability.supports_dialect;
        // Hidden by `<!--[if !mso]>`.
        let is_gated = is_mso && self.has_dialect;

        let mut layers = Vec::new();
        if self.has_dialect && is_mso {
            layers.push(RepresentationKind::DialectVector);
        }

        let native_visible = self.has_native && !is_gated && capability.supports_native;
        if native_visible {
            layers.push(RepresentationKind::NativeVector);
        }

        // The image is hidden by a sibling selector only when the `svg` survives.
        if !is_gated && !native_visible {
            layers.push(RepresentationKind::Raster);
        }

        layers
    }
}

/// Assembles a layered document.
///
/// See [`assemble_with`] for details.
pub fn assemble(
    native: Option<&str>,
    dialect: Option<&str>,
    raster: &Raster,
    width: u32,
    height: u32,
    alt: &str,
) -> LayeredDocument {
    assemble_with(native, dialect, raster, width, height, alt, &AssembleOptions::default())
}

/// Assembles a layered document.
///
/// `native` is an SVG document and `dialect` is a bare VML group,
/// like [`svg2vml::DialectDocument::group`]. Both are inserted as is,
/// so they should be sanitized beforehand.
///
/// The output depends only on the inputs.
pub fn assemble_with(
    native: Option<&str>,
    dialect: Option<&str>,
    raster: &Raster,
    width: u32,
    height: u32,
    alt: &str,
    opt: &AssembleOptions,
) -> LayeredDocument {
    let width = width.max(1);
    let height = height.max(1);

    let id = format!(
        "{}{:016x}",
        opt.class_prefix,
        content_hash(native, dialect, raster, width, height, alt)
    );

    // Alt text is escaped once and reused everywhere.
    let alt = escape(alt);

    let native = native.and_then(|svg| match prepare_native(svg, &id, &alt) {
        Some(svg) => Some(svg),
        None => {
            log::warn!("The native layer is not a valid SVG. Skipped.");
            None
        }
    });

    let mut markup = String::new();
    let _ = write!(
        markup,
        "<div class=\"{}\" style=\"width:100%;max-width:{}px;\">",
        id,
        opt.max_width.unwrap_or(width)
    );
    let _ = write!(
        markup,
        "<div style=\"position:relative;width:100%;height:0;padding-bottom:{}%;overflow:hidden;\">",
        fmt_percent(height as f64 / width as f64 * 100.0)
    );

    if let Some(group) = dialect {
        markup.push_str("<!--[if mso]>");
        markup.push_str(group);
        markup.push_str("<![endif]-->");
        markup.push_str("<!--[if !mso]><!-->");
    }

    if let Some(ref svg) = native {
        let _ = write!(
            markup,
            "<style>.{0}-svg + .{0}-img{{display:none}}</style>",
            id
        );
        markup.push_str(svg);
    }

    let _ = write!(
        markup,
        "<img class=\"{}-img\" src=\"{}\" alt=\"{}\" width=\"{}\" height=\"{}\" \
         style=\"display:block;border:0;{}\">",
        id,
        raster.to_data_uri(),
        alt,
        width,
        height,
        LAYER_STYLE
    );

    if dialect.is_some() {
        markup.push_str("<!--<![endif]-->");
    }

    markup.push_str("</div></div>");

    LayeredDocument {
        markup,
        id,
        has_native: native.is_some(),
        has_dialect: dialect.is_some(),
    }
}

fn content_hash(
    native: Option<&str>,
    dialect: Option<&str>,
    raster: &Raster,
    width: u32,
    height: u32,
    alt: &str,
) -> u64 {
    let mut hasher = siphasher::sip::SipHasher13::new();
    native.hash(&mut hasher);
    dialect.hash(&mut hasher);
    raster.hash(&mut hasher);
    width.hash(&mut hasher);
    height.hash(&mut hasher);
    alt.hash(&mut hasher);
    hasher.finish()
}

/// Rewrites the root `svg` start tag and inserts a `title`.
///
/// The rest of the document is copied as is.
fn prepare_native(text: &str, id: &str, alt: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(text).ok()?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return None;
    }

    let range = root.range();
    let tag = &text[range.clone()];
    let tag_end = start_tag_end(tag)?;
    let is_empty = tag[..tag_end].ends_with('/');
    let qname_len = tag[1..]
        .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .unwrap_or(0);
    let qname = &tag[1..1 + qname_len];

    let mut svg = String::new();
    svg.push('<');
    svg.push_str(qname);

    for ns in root.namespaces() {
        if ns.name() == Some("xml") {
            continue;
        }

        match ns.name() {
            Some(prefix) => {
                let _ = write!(svg, " xmlns:{}=\"{}\"", prefix, escape(ns.uri()));
            }
            None => {
                let _ = write!(svg, " xmlns=\"{}\"", escape(ns.uri()));
            }
        }
    }

    let mut class = format!("{}-svg", id);
    let mut style = String::new();
    for attr in root.attributes() {
        let name = match attr.namespace() {
            Some(ns) => match root.lookup_prefix(ns) {
                Some(prefix) => format!("{}:{}", prefix, attr.name()),
                None => continue,
            },
            None => attr.name().to_string(),
        };

        match name.as_str() {
            "class" => {
                class.push(' ');
                class.push_str(attr.value());
            }
            "style" => {
                style.push_str(attr.value());
                if !style.ends_with(';') {
                    style.push(';');
                }
            }
            "role" | "aria-label" | "aria-hidden" => {}
            _ => {
                let _ = write!(svg, " {}=\"{}\"", name, escape(attr.value()));
            }
        }
    }

    style.push_str(LAYER_STYLE);
    let _ = write!(
        svg,
        " class=\"{}\" style=\"{}\" role=\"img\" aria-label=\"{}\">",
        escape(&class),
        escape(&style),
        alt
    );

    // A `title` inherits the prefix of the root element.
    let title = match qname.split_once(':') {
        Some((prefix, _)) => format!("{}:title", prefix),
        None => "title".to_string(),
    };
    let _ = write!(svg, "<{0}>{1}</{0}>", title, alt);

    if is_empty {
        let _ = write!(svg, "</{}>", qname);
    } else {
        svg.push_str(&tag[tag_end + 1..]);
    }

    Some(svg)
}

/// Returns the position of the start tag's `>`.
fn start_tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in tag.char_indices() {
        match (quote, c) {
            (None, '"') | (None, '\'') => quote = Some(c),
            (Some(q), _) if q == c => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }

    None
}

/// Escapes text for HTML attributes and content.
pub fn escape(text: &str) -> String {
    let mut s = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&#39;"),
            _ => s.push(c),
        }
    }

    s
}

fn fmt_percent(n: f64) -> String {
    let s = format!("{:.4}", n);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_formatting() {
        assert_eq!(fmt_percent(50.0), "50");
        assert_eq!(fmt_percent(100.0 / 3.0), "33.3333");
        assert_eq!(fmt_percent(12.5), "12.5");
    }

    #[test]
    fn escaping() {
        assert_eq!(escape("A&B <\"x\"> 'y'"), "A&amp;B &lt;&quot;x&quot;&gt; &#39;y&#39;");
    }

    #[test]
    fn start_tag_with_quoted_bracket() {
        let tag = "<svg data-x='a>b' width=\"1\">";
        assert_eq!(start_tag_end(tag), Some(tag.len() - 1));
    }

    #[test]
    fn empty_root() {
        let svg = prepare_native("<svg xmlns='http://www.w3.org/2000/svg'/>", "x", "Logo").unwrap();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" class=\"x-svg\""));
        assert!(svg.ends_with("<title>Logo</title></svg>"));
    }

    #[test]
    fn existing_class_and_style_are_kept() {
        let svg = prepare_native(
            "<svg xmlns='http://www.w3.org/2000/svg' class='brand' style='color:red' role='presentation'><rect/></svg>",
            "x",
            "Logo",
        )
        .unwrap();
        assert!(svg.contains("class=\"x-svg brand\""));
        assert!(svg.contains(&format!("style=\"color:red;{}\"", LAYER_STYLE)));
        assert!(!svg.contains("presentation"));
        assert!(svg.ends_with("<title>Logo</title><rect/></svg>"));
    }

    #[test]
    fn not_an_svg() {
        assert!(prepare_native("<html/>", "x", "Logo").is_none());
        assert!(prepare_native("<svg>", "x", "Logo").is_none());
    }
}
