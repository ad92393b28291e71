// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Methods for the bounded variable-width `varchar` type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The maximum length of a [`ScalarType::VarChar`].
///
/// This newtype wrapper ensures that the length is within the valid range.
///
/// [`ScalarType::VarChar`]: crate::ScalarType::VarChar
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct VarCharMaxLength(pub(crate) u32);

impl VarCharMaxLength {
    /// The largest valid maximum length.
    pub const MAX: VarCharMaxLength = VarCharMaxLength(65535);

    /// Consumes the newtype wrapper, returning the maximum length as a
    /// `u32`.
    pub fn into_u32(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for VarCharMaxLength {
    type Error = InvalidVarCharMaxLengthError;

    fn try_from(max_length: i64) -> Result<Self, Self::Error> {
        match u32::try_from(max_length) {
            Ok(max_length) if max_length > 0 && max_length <= VarCharMaxLength::MAX.0 => {
                Ok(VarCharMaxLength(max_length))
            }
            _ => Err(InvalidVarCharMaxLengthError),
        }
    }
}

/// The error returned when constructing a [`VarCharMaxLength`] from an
/// invalid value.
#[derive(Debug, Clone)]
pub struct InvalidVarCharMaxLengthError;

impl fmt::Display for InvalidVarCharMaxLengthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "length for type character varying must be between 1 and {}",
            VarCharMaxLength::MAX.0,
        )
    }
}

impl std::error::Error for InvalidVarCharMaxLengthError {}
