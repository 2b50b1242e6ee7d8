// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use svgtypes::{Length, LengthUnit as Unit};

const DPI: f64 = 96.0;
const FONT_SIZE: f64 = 16.0;

/// Converts a length into user units.
///
/// Percentages are resolved against `percent_base`.
pub(crate) fn convert_length(length: Length, percent_base: f64) -> f64 {
    let n = length.number;
    match length.unit {
        Unit::None | Unit::Px => n,
        Unit::Em => n * FONT_SIZE,
        Unit::Ex => n * FONT_SIZE / 2.0,
        Unit::In => n * DPI,
        Unit::Cm => n * DPI / 2.54,
        Unit::Mm => n * DPI / 25.4,
        Unit::Pt => n * DPI / 72.0,
        Unit::Pc => n * DPI / 6.0,
        Unit::Percent => percent_base * n / 100.0,
    }
}

/// Parses and converts a length attribute value.
pub(crate) fn parse_length(value: &str, percent_base: f64) -> Option<f64> {
    let length: Length = value.parse().ok()?;
    let n = convert_length(length, percent_base);
    if n.is_finite() {
        Some(n)
    } else {
        None
    }
}

/// Parses a document dimension, like `width="120px"`.
///
/// Percentages are treated as absent, since they depend on the embedding context.
pub(crate) fn parse_dimension(value: &str) -> Option<f64> {
    let length: Length = value.parse().ok()?;
    if length.unit == Unit::Percent {
        return None;
    }

    let n = convert_length(length, 0.0);
    if n > 0.0 && n.is_finite() {
        Some(n)
    } else {
        None
    }
}
