// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// What kind of vector markup a rendering surface understands.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SurfaceCapability {
    /// Inline SVG is rendered.
    pub supports_native: bool,
    /// VML is rendered.
    pub supports_dialect: bool,
}

impl SurfaceCapability {
    /// Creates a new capability.
    pub const fn new(supports_native: bool, supports_dialect: bool) -> Self {
        SurfaceCapability {
            supports_native,
            supports_dialect,
        }
    }

    /// A raster-only surface.
    pub const RASTER_ONLY: SurfaceCapability = SurfaceCapability::new(false, false);
}

/// An email client or a webmail renderer.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Surface {
    /// A stable identifier.
    pub id: &'static str,
    /// A human readable name.
    pub name: &'static str,
    /// Rendering capabilities.
    pub capability: SurfaceCapability,
    /// An approximate share of opened emails, in percents.
    pub market_share: f64,
}

/// Built-in rendering surfaces.
///
/// The Outlook desktop family is the only one that renders VML.
pub static BUILTIN: &[Surface] = &[
    Surface {
        id: "apple-mail",
        name: "Apple Mail",
        capability: SurfaceCapability::new(true, false),
        market_share: 35.0,
    },
    Surface {
        id: "ios-mail",
        name: "iOS Mail",
        capability: SurfaceCapability::new(true, false),
        market_share: 20.0,
    },
    Surface {
        id: "gmail",
        name: "Gmail",
        capability: SurfaceCapability::RASTER_ONLY,
        market_share: 27.0,
    },
    Surface {
        id: "outlook-desktop",
        name: "Outlook (Windows desktop)",
        capability: SurfaceCapability::new(false, true),
        market_share: 5.0,
    },
    Surface {
        id: "outlook-com",
        name: "Outlook.com",
        capability: SurfaceCapability::RASTER_ONLY,
        market_share: 4.0,
    },
    Surface {
        id: "yahoo",
        name: "Yahoo Mail",
        capability: SurfaceCapability::RASTER_ONLY,
        market_share: 3.0,
    },
    Surface {
        id: "samsung-mail",
        name: "Samsung Email",
        capability: SurfaceCapability::new(true, false),
        market_share: 3.0,
    },
    Surface {
        id: "thunderbird",
        name: "Thunderbird",
        capability: SurfaceCapability::new(true, false),
        market_share: 1.0,
    },
];

/// Finds a built-in surface by its identifier.
pub fn find(id: &str) -> Option<&'static Surface> {
    BUILTIN.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        for (i, a) in BUILTIN.iter().enumerate() {
            assert!(BUILTIN[i + 1..].iter().all(|b| a.id != b.id), "duplicated '{}'", a.id);
        }
    }

    #[test]
    fn only_outlook_desktop_renders_vml() {
        let dialect: Vec<_> = BUILTIN
            .iter()
            .filter(|s| s.capability.supports_dialect)
            .map(|s| s.id)
            .collect();
        assert_eq!(dialect, vec!["outlook-desktop"]);
    }

    #[test]
    fn lookup() {
        assert_eq!(find("gmail").map(|s| s.capability), Some(SurfaceCapability::RASTER_ONLY));
        assert!(find("lotus-notes").is_none());
    }
}
