// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Methods for the fixed-width `char` type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The length of a [`ScalarType::Char`].
///
/// This newtype wrapper ensures that the length is within the valid range.
///
/// [`ScalarType::Char`]: crate::ScalarType::Char
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct CharLength(pub(crate) u32);

impl CharLength {
    /// A length of one.
    pub const ONE: CharLength = CharLength(1);

    /// The largest valid length.
    pub const MAX: CharLength = CharLength(255);

    /// Consumes the newtype wrapper, returning the length as a `u32`.
    pub fn into_u32(self) -> u32 {
        self.0
    }

    /// Consumes the newtype wrapper, returning the length as a `usize`.
    pub fn into_usize(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<i64> for CharLength {
    type Error = InvalidCharLengthError;

    fn try_from(length: i64) -> Result<Self, Self::Error> {
        match u32::try_from(length) {
            Ok(length) if length > 0 && length <= CharLength::MAX.0 => Ok(CharLength(length)),
            _ => Err(InvalidCharLengthError),
        }
    }
}

impl TryFrom<usize> for CharLength {
    type Error = InvalidCharLengthError;

    fn try_from(length: usize) -> Result<Self, Self::Error> {
        Self::try_from(i64::try_from(length).map_err(|_| InvalidCharLengthError)?)
    }
}

/// The error returned when constructing a [`CharLength`] from an invalid
/// value.
#[derive(Debug, Clone)]
pub struct InvalidCharLengthError;

impl fmt::Display for InvalidCharLengthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "length for type character must be between 1 and {}",
            CharLength::MAX.0,
        )
    }
}

impl std::error::Error for InvalidCharLengthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_bounds() {
        assert!(CharLength::try_from(0i64).is_err());
        assert!(CharLength::try_from(-1i64).is_err());
        assert!(CharLength::try_from(256i64).is_err());
        assert_eq!(CharLength::try_from(1i64).unwrap(), CharLength::ONE);
        assert_eq!(CharLength::try_from(255i64).unwrap(), CharLength::MAX);
        assert_eq!(CharLength::try_from(42usize).unwrap().into_usize(), 42);
    }
}
