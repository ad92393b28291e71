// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Fixed-width exact decimal values.
//!
//! A decimal is stored in a tuple slot as an unscaled little-endian signed
//! integer; the declared precision of its [`ScalarType::Decimal`] selects
//! one of three physical widths, and the declared scale positions the
//! decimal point when the value is rendered. Two decimals are only
//! comparable when their declared precision and scale match; alignment of
//! mismatched parameters is the caller's responsibility.
//!
//! [`ScalarType::Decimal`]: crate::ScalarType::Decimal

use std::fmt;
use std::io;

/// The maximum number of digits expressable in any decimal value.
pub const MAX_PRECISION: u8 = 38;

/// The physical slot width in bytes for a decimal of the given precision.
pub fn storage_width(precision: u8) -> usize {
    debug_assert!(precision >= 1 && precision <= MAX_PRECISION);
    match precision {
        0..=9 => 4,
        10..=18 => 8,
        _ => 16,
    }
}

macro_rules! decimal_value {
    ($name:ident, $int:ty, $width:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(pub(crate) $int);

        impl $name {
            /// Wraps an unscaled integer value.
            pub fn new(unscaled: $int) -> $name {
                $name(unscaled)
            }

            /// The unscaled integer value.
            pub fn unscaled(self) -> $int {
                self.0
            }

            /// Reads a value from its little-endian slot encoding.
            pub fn from_slot_bytes(slot: &[u8]) -> $name {
                let mut buf = [0u8; $width];
                buf.copy_from_slice(&slot[..$width]);
                $name(<$int>::from_le_bytes(buf))
            }

            /// The value's little-endian slot encoding.
            pub fn to_le_bytes(self) -> [u8; $width] {
                self.0.to_le_bytes()
            }

            /// Renders the value with `scale` fractional digits.
            pub fn write<W: io::Write>(self, scale: u8, out: &mut W) -> io::Result<()> {
                write_unscaled(i128::from(self.0), scale, out)
            }
        }

        impl From<$int> for $name {
            fn from(unscaled: $int) -> $name {
                $name(unscaled)
            }
        }

        impl fmt::Display for $name {
            /// Displays the raw unscaled value; rendering with a decimal
            /// point requires the scale from the type descriptor.
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

decimal_value!(
    Decimal4Value,
    i32,
    4,
    "A decimal of precision at most 9, stored in four bytes."
);
decimal_value!(
    Decimal8Value,
    i64,
    8,
    "A decimal of precision at most 18, stored in eight bytes."
);
decimal_value!(
    Decimal16Value,
    i128,
    16,
    "A decimal of precision at most 38, stored in sixteen bytes."
);

/// Renders an unscaled decimal value with `scale` fractional digits.
pub fn write_unscaled<W: io::Write>(unscaled: i128, scale: u8, out: &mut W) -> io::Result<()> {
    if scale == 0 {
        return write!(out, "{}", unscaled);
    }
    let magnitude = unscaled.unsigned_abs();
    let divisor = 10u128.pow(u32::from(scale));
    write!(
        out,
        "{}{}.{:0width$}",
        if unscaled < 0 { "-" } else { "" },
        magnitude / divisor,
        magnitude % divisor,
        width = usize::from(scale),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(unscaled: i128, scale: u8) -> String {
        let mut out = Vec::new();
        write_unscaled(unscaled, scale, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn rendering() {
        assert_eq!(render(123456789, 0), "123456789");
        assert_eq!(render(123456789, 1), "12345678.9");
        assert_eq!(render(123456789, 6), "123.456789");
        assert_eq!(render(5, 2), "0.05");
        assert_eq!(render(-5, 2), "-0.05");
        assert_eq!(render(0, 4), "0.0000");
        assert_eq!(render(-123456789, 1), "-12345678.9");
    }

    #[test]
    fn slot_round_trip() {
        let d4 = Decimal4Value::new(-123456789);
        assert_eq!(Decimal4Value::from_slot_bytes(&d4.to_le_bytes()), d4);
        let d8 = Decimal8Value::new(i64::MIN);
        assert_eq!(Decimal8Value::from_slot_bytes(&d8.to_le_bytes()), d8);
        let d16 = Decimal16Value::new(i128::MAX);
        assert_eq!(Decimal16Value::from_slot_bytes(&d16.to_le_bytes()), d16);
    }

    #[test]
    fn widths() {
        assert_eq!(storage_width(9), 4);
        assert_eq!(storage_width(10), 8);
        assert_eq!(storage_width(18), 8);
        assert_eq!(storage_width(19), 16);
        assert_eq!(storage_width(MAX_PRECISION), 16);
    }
}
