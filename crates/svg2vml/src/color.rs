// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

/// A resolved VML paint.
#[derive(Clone, PartialEq, Debug)]
pub(crate) enum Paint {
    /// `filled="f"` or `stroked="f"`.
    None,
    /// A color in a form VML understands.
    Color(String),
}

/// Converts an SVG color into a VML one.
///
/// Hex and named colors are kept as is, since VML understands both.
/// Functional notations, like `rgb()` or `hsl()`, are converted into hex.
///
/// Returns `None` for an invalid value.
pub(crate) fn convert(value: &str) -> Option<Paint> {
    let value = value.trim();
    if value == "none" || value == "transparent" {
        return Some(Paint::None);
    }

    let color = match svgtypes::Color::from_str(value) {
        Ok(c) => c,
        Err(_) => {
            log::warn!("'{}' is not a valid color.", value);
            return None;
        }
    };

    if value.starts_with('#') || value.bytes().all(|c| c.is_ascii_alphabetic()) {
        Some(Paint::Color(value.to_string()))
    } else {
        Some(Paint::Color(to_hex(color)))
    }
}

fn to_hex(c: svgtypes::Color) -> String {
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}

/// Parses an opacity value, like `0.5` or `50%`.
///
/// The result is clamped to the 0..1 range.
pub(crate) fn parse_opacity(value: &str) -> Option<f64> {
    let value = value.trim();
    let n = match value.strip_suffix('%') {
        Some(v) => v.trim().parse::<f64>().ok()? / 100.0,
        None => value.parse::<f64>().ok()?,
    };

    if n.is_finite() {
        Some(n.max(0.0).min(1.0))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test {
        ($name:ident, $text:expr, $result:expr) => {
            #[test]
            fn $name() {
                assert_eq!(convert($text), $result);
            }
        };
    }

    test!(hex, "#FF0000", Some(Paint::Color("#FF0000".to_string())));
    test!(short_hex, "#f00", Some(Paint::Color("#f00".to_string())));
    test!(named, "red", Some(Paint::Color("red".to_string())));
    test!(rgb, "rgb(255, 0, 10)", Some(Paint::Color("#ff000a".to_string())));
    test!(rgb_percent, "rgb(100%, 0%, 0%)", Some(Paint::Color("#ff0000".to_string())));
    test!(none, "none", Some(Paint::None));
    test!(transparent, "transparent", Some(Paint::None));
    test!(invalid, "qwe(1)", None);

    #[test]
    fn opacity() {
        assert_eq!(parse_opacity("0.5"), Some(0.5));
        assert_eq!(parse_opacity("50%"), Some(0.5));
        assert_eq!(parse_opacity("2"), Some(1.0));
        assert_eq!(parse_opacity("q"), None);
    }
}
