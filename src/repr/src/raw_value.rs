// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Operations on raw, untyped slot values.
//!
//! A raw value is a pointer-free view of one column value: `None` for SQL
//! NULL, otherwise the slot's bytes for fixed-width types or the resolved
//! payload bytes for variable-length types. Every operation dispatches on
//! the [`ScalarType`] descriptor with an exhaustive match — never on the
//! bytes themselves — so the closed type set stays exhaustively checkable
//! and the hot path carries no virtual calls.
//!
//! Callers guarantee that the bytes match the descriptor. These operations
//! have no error channel: a short buffer is a programmer error and panics,
//! the same class of failure as an out-of-range row index.

use std::cmp::Ordering;
use std::io::{self, Write};

use crate::adt::decimal::{self, Decimal16Value, Decimal4Value, Decimal8Value};
use crate::adt::timestamp::TimestampValue;
use crate::hash;
use crate::scalar::ScalarType;

/// A raw value: `None` is SQL NULL, `Some` holds slot bytes (fixed-width
/// types) or payload bytes (variable-length types).
///
/// NULL is distinct from every present value, including an empty string and
/// a false boolean; the operations below never conflate them.
pub type RawValue<'a> = Option<&'a [u8]>;

#[inline]
fn read_i16(v: &[u8]) -> i16 {
    i16::from_le_bytes(v[..2].try_into().expect("i16 slot width"))
}

#[inline]
fn read_i32(v: &[u8]) -> i32 {
    i32::from_le_bytes(v[..4].try_into().expect("i32 slot width"))
}

#[inline]
fn read_i64(v: &[u8]) -> i64 {
    i64::from_le_bytes(v[..8].try_into().expect("i64 slot width"))
}

#[inline]
fn read_f32(v: &[u8]) -> f32 {
    f32::from_le_bytes(v[..4].try_into().expect("f32 slot width"))
}

#[inline]
fn read_f64(v: &[u8]) -> f64 {
    f64::from_le_bytes(v[..8].try_into().expect("f64 slot width"))
}

/// Orders floats natively: -0.0 ties 0.0, and NaNs order after every
/// ordered value.
#[inline]
fn cmp_float<T: PartialOrd>(a: T, b: T) -> Ordering {
    if a < b {
        Ordering::Less
    } else if a == b {
        Ordering::Equal
    } else {
        Ordering::Greater
    }
}

/// Totally orders two non-NULL values of type `ty`.
///
/// Fixed-width numerics compare natively; booleans order false before true;
/// `Char(n)` compares exactly the first `n` bytes of each operand as
/// unsigned byte sequences, so both operands must have `n` addressable
/// bytes; `VarChar`/`String` compare lexicographically over each value's
/// own length, a strict prefix ordering before its extensions; timestamps
/// compare chronologically; decimals compare their unscaled values, which
/// requires both operands to share the descriptor's precision and scale —
/// aligning mismatched parameters is the caller's responsibility.
///
/// NULL operands never reach this function. The engine-wide convention,
/// applied by callers, is that NULLs sort last; [`compare_nullable`]
/// implements it.
pub fn compare(a: &[u8], b: &[u8], ty: &ScalarType) -> Ordering {
    match ty {
        ScalarType::Bool => a[0].cmp(&b[0]),
        ScalarType::Int8 => (a[0] as i8).cmp(&(b[0] as i8)),
        ScalarType::Int16 => read_i16(a).cmp(&read_i16(b)),
        ScalarType::Int32 => read_i32(a).cmp(&read_i32(b)),
        ScalarType::Int64 => read_i64(a).cmp(&read_i64(b)),
        ScalarType::Float32 => cmp_float(read_f32(a), read_f32(b)),
        ScalarType::Float64 => cmp_float(read_f64(a), read_f64(b)),
        ScalarType::Char(length) => {
            let n = length.into_usize();
            a[..n].cmp(&b[..n])
        }
        ScalarType::VarChar(_) | ScalarType::String => a.cmp(b),
        ScalarType::Timestamp => read_i64(a).cmp(&read_i64(b)),
        ScalarType::Decimal { precision, .. } => match decimal::storage_width(*precision) {
            4 => Decimal4Value::from_slot_bytes(a).cmp(&Decimal4Value::from_slot_bytes(b)),
            8 => Decimal8Value::from_slot_bytes(a).cmp(&Decimal8Value::from_slot_bytes(b)),
            _ => Decimal16Value::from_slot_bytes(a).cmp(&Decimal16Value::from_slot_bytes(b)),
        },
    }
}

/// Totally orders two nullable values under the engine convention that
/// NULLs sort last.
pub fn compare_nullable(a: RawValue, b: RawValue, ty: &ScalarType) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare(a, b, ty),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The bytes a hash of `value` covers: the full fixed slot, the first `n`
/// bytes of a `Char(n)` (or the whole payload when it is shorter), or a
/// var-len payload as-is.
#[inline]
fn hashed_bytes<'a>(value: &'a [u8], ty: &ScalarType) -> &'a [u8] {
    match ty {
        ScalarType::Char(length) => &value[..length.into_usize().min(value.len())],
        ScalarType::VarChar(_) | ScalarType::String => value,
        _ => &value[..ty.slot_width()],
    }
}

#[inline]
fn hash_dispatch(value: RawValue, ty: &ScalarType, seed: u32, f: fn(&[u8], u32) -> u32) -> u32 {
    let Some(value) = value else {
        return hash::hash_null(seed);
    };
    if ty.is_var_len() && value.is_empty() {
        return hash::hash_empty(seed);
    }
    f(hashed_bytes(value, ty), seed)
}

/// The general-purpose engine hash of a raw value.
///
/// Deterministic in `(bytes, ty, seed)`. NULL, the empty string, and false
/// hash to values pairwise distinct from each other and from `seed`, for
/// every seed. Chaining (using one column's hash to seed the next) is the
/// engine's multi-column key fold.
pub fn hash(value: RawValue, ty: &ScalarType, seed: u32) -> u32 {
    hash_dispatch(value, ty, seed, hash::hash_bytes)
}

/// The FNV-variant hash of a raw value. Independent from [`hash`] but with
/// the same NULL/empty/false guarantees, and unskewed under chaining.
pub fn hash_fnv(value: RawValue, ty: &ScalarType, seed: u32) -> u32 {
    hash_dispatch(value, ty, seed, hash::fnv_bytes)
}

/// The type-parameterized call path of the raw-value hashes.
///
/// Operators that already hold a decoded value hash it through this trait
/// via [`hash_value`] / [`hash_value_fnv`]; the result is identical to
/// dispatching the corresponding slot bytes through [`hash`] /
/// [`hash_fnv`] with the matching descriptor. Both paths funnel into one
/// implementation, and a test pins the equivalence for every supported
/// type.
pub trait RawHash {
    /// Calls `f` on the value's slot-encoded bytes.
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R;
}

impl RawHash for bool {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&[u8::from(*self)])
    }
}

impl RawHash for i8 {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

impl RawHash for i16 {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

impl RawHash for i32 {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

impl RawHash for i64 {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

impl RawHash for f32 {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

impl RawHash for f64 {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

impl RawHash for [u8] {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl RawHash for str {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl RawHash for TimestampValue {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

impl RawHash for Decimal4Value {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

impl RawHash for Decimal8Value {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

impl RawHash for Decimal16Value {
    fn with_raw_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

/// The general-purpose engine hash of a typed value. Agrees exactly with
/// [`hash`] on the value's slot encoding.
pub fn hash_value<T>(value: Option<&T>, ty: &ScalarType, seed: u32) -> u32
where
    T: RawHash + ?Sized,
{
    match value {
        None => hash::hash_null(seed),
        Some(value) => value.with_raw_bytes(|bytes| hash_dispatch(Some(bytes), ty, seed, hash::hash_bytes)),
    }
}

/// The FNV-variant hash of a typed value. Agrees exactly with [`hash_fnv`]
/// on the value's slot encoding.
pub fn hash_value_fnv<T>(value: Option<&T>, ty: &ScalarType, seed: u32) -> u32
where
    T: RawHash + ?Sized,
{
    match value {
        None => hash::hash_null(seed),
        Some(value) => value.with_raw_bytes(|bytes| hash_dispatch(Some(bytes), ty, seed, hash::fnv_bytes)),
    }
}

/// Writes the textual form of a raw value.
///
/// `scale` bounds the fractional digits of floating-point output; a
/// negative scale means the shortest round-trippable form. The output is
/// binary-safe: `Char(n)` emits its `n` payload bytes verbatim — embedded
/// zero bytes and non-ASCII bytes unchanged, since CHAR slots sometimes
/// carry opaque binary payloads — and var-len payloads are likewise written
/// as raw bytes. NULL prints as `NULL`.
pub fn print_value<W: Write>(
    value: RawValue,
    ty: &ScalarType,
    scale: i32,
    out: &mut W,
) -> io::Result<()> {
    let Some(v) = value else {
        return out.write_all(b"NULL");
    };
    match ty {
        ScalarType::Bool => write!(out, "{}", v[0] != 0),
        ScalarType::Int8 => write!(out, "{}", v[0] as i8),
        ScalarType::Int16 => write!(out, "{}", read_i16(v)),
        ScalarType::Int32 => write!(out, "{}", read_i32(v)),
        ScalarType::Int64 => write!(out, "{}", read_i64(v)),
        ScalarType::Float32 => match usize::try_from(scale) {
            Ok(scale) => write!(out, "{:.*}", scale, read_f32(v)),
            Err(_) => write!(out, "{}", read_f32(v)),
        },
        ScalarType::Float64 => match usize::try_from(scale) {
            Ok(scale) => write!(out, "{:.*}", scale, read_f64(v)),
            Err(_) => write!(out, "{}", read_f64(v)),
        },
        ScalarType::Char(length) => out.write_all(&v[..length.into_usize()]),
        ScalarType::VarChar(_) | ScalarType::String => out.write_all(v),
        ScalarType::Timestamp => write!(out, "{}", TimestampValue::from_slot_bytes(v)),
        ScalarType::Decimal { precision, scale } => {
            let unscaled = match decimal::storage_width(*precision) {
                4 => i128::from(Decimal4Value::from_slot_bytes(v).unscaled()),
                8 => i128::from(Decimal8Value::from_slot_bytes(v).unscaled()),
                _ => Decimal16Value::from_slot_bytes(v).unscaled(),
            };
            decimal::write_unscaled(unscaled, *scale, out)
        }
    }
}
