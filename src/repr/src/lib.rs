// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Fundamental data representation for Tern's execution engine.
//!
//! This crate defines how a single column value exists at execution time:
//! the closed set of runtime types ([`ScalarType`]), the fixed slot
//! encoding of each type, the tuple and row schema descriptors supplied by
//! the catalog, and the type-dispatched operations — comparison, hashing,
//! printing — that operators apply to raw slot bytes.
//!
//! The batch container that moves many such values between operators lives
//! in `tern-runtime`, which builds on the descriptors and operations here.

pub mod adt;
pub mod desc;
pub mod hash;
pub mod raw_value;
pub mod scalar;

pub use crate::desc::{NullIndicator, RowSchema, SlotDescriptor, TupleDescriptor};
pub use crate::scalar::ScalarType;
