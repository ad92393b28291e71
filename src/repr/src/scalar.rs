// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::adt::char::CharLength;
use crate::adt::decimal;
use crate::adt::varchar::VarCharMaxLength;

/// Width of a variable-length slot in a tuple, in bytes.
///
/// The in-memory form holds `(chunk: u32, offset: u32, len: u32)` naming
/// bytes in a memory pool; the wire form holds `(offset: u64, len: u32)`
/// into a batch's contiguous data blob. Both forms occupy the same twelve
/// bytes, so serialization can rewrite one into the other in place.
pub const VAR_LEN_SLOT_WIDTH: usize = 12;

/// The runtime type of a value in a tuple slot.
///
/// This is the type descriptor consumed by every raw-value operation and by
/// the tuple layout computation. The set is closed: every operation on slot
/// bytes dispatches with an exhaustive match on this enum, so adding a
/// variant is a cross-cutting change by design.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    /// An 8-bit signed integer.
    Int8,
    /// A 16-bit signed integer.
    Int16,
    /// A 32-bit signed integer.
    Int32,
    /// A 64-bit signed integer.
    Int64,
    /// A 32-bit floating point number.
    Float32,
    /// A 64-bit floating point number.
    Float64,
    /// A fixed-width string of exactly the given length. The payload lives
    /// inline in the slot and is not required to be valid UTF-8; CHAR slots
    /// sometimes carry opaque fixed-size binary payloads.
    Char(CharLength),
    /// A variable-width string with a declared upper bound on its length.
    VarChar(VarCharMaxLength),
    /// A variable-width string without a declared bound.
    String,
    /// A point in time, stored as microseconds since the Unix epoch.
    Timestamp,
    /// An exact decimal number, stored as an unscaled integer of 4, 8, or
    /// 16 bytes depending on `precision`.
    Decimal { precision: u8, scale: u8 },
}

impl ScalarType {
    /// Constructs a `Decimal` type, validating the precision and scale.
    pub fn decimal(precision: u8, scale: u8) -> Result<ScalarType, InvalidDecimalError> {
        if precision < 1 || precision > decimal::MAX_PRECISION || scale > precision {
            return Err(InvalidDecimalError { precision, scale });
        }
        Ok(ScalarType::Decimal { precision, scale })
    }

    /// The number of bytes a value of this type occupies in a tuple slot.
    ///
    /// For variable-length types this is the width of the reference slot,
    /// not of the payload it names.
    pub fn slot_width(&self) -> usize {
        match self {
            ScalarType::Bool | ScalarType::Int8 => 1,
            ScalarType::Int16 => 2,
            ScalarType::Int32 | ScalarType::Float32 => 4,
            ScalarType::Int64 | ScalarType::Float64 | ScalarType::Timestamp => 8,
            ScalarType::Char(length) => length.into_usize(),
            ScalarType::VarChar(_) | ScalarType::String => VAR_LEN_SLOT_WIDTH,
            ScalarType::Decimal { precision, .. } => decimal::storage_width(*precision),
        }
    }

    /// The alignment of this type's slot within a tuple.
    pub fn slot_alignment(&self) -> usize {
        match self {
            ScalarType::Char(_) => 1,
            ScalarType::VarChar(_) | ScalarType::String => 4,
            _ => self.slot_width(),
        }
    }

    /// True if values of this type store their payload outside the tuple,
    /// referenced from the slot.
    pub fn is_var_len(&self) -> bool {
        matches!(self, ScalarType::VarChar(_) | ScalarType::String)
    }

    /// Reports the precision and scale of a `Decimal` type.
    ///
    /// Panics if called on any other type.
    pub fn unwrap_decimal_parts(&self) -> (u8, u8) {
        match self {
            ScalarType::Decimal { precision, scale } => (*precision, *scale),
            _ => panic!("ScalarType::unwrap_decimal_parts called on {:?}", self),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ScalarType::*;
        match self {
            Bool => f.write_str("bool"),
            Int8 => f.write_str("i8"),
            Int16 => f.write_str("i16"),
            Int32 => f.write_str("i32"),
            Int64 => f.write_str("i64"),
            Float32 => f.write_str("f32"),
            Float64 => f.write_str("f64"),
            Char(length) => write!(f, "char({})", length.into_u32()),
            VarChar(max_length) => write!(f, "varchar({})", max_length.into_u32()),
            String => f.write_str("string"),
            Timestamp => f.write_str("timestamp"),
            Decimal { precision, scale } => write!(f, "decimal({}, {})", precision, scale),
        }
    }
}

/// The error returned when constructing a [`ScalarType::Decimal`] with an
/// out-of-range precision or scale.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct InvalidDecimalError {
    pub precision: u8,
    pub scale: u8,
}

impl fmt::Display for InvalidDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid decimal parameters ({}, {}): precision must be in 1..={} and scale must \
             not exceed precision",
            self.precision,
            self.scale,
            decimal::MAX_PRECISION,
        )
    }
}

impl std::error::Error for InvalidDecimalError {}
