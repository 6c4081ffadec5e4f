// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Set operations over array-of-numbers sketches.
//!
//! These wrap the generic tuple set operations with the element-wise-sum
//! policy and enforce that all operands carry the same number of values
//! per summary.

use crate::array_of_numbers::ArrayOfNumbersSketchView;
use crate::array_of_numbers::sketch::ArrayOfNumbersCompactSketch;
use crate::array_of_numbers::summary::FixedWidthNumeric;
use crate::array_of_numbers::summary::VectorSumPolicy;
use crate::array_of_numbers::summary::VectorSummary;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::tuple::TupleIntersection;
use crate::tuple::TupleUnion;

/// Union of array-of-numbers sketches; colliding summaries add
/// element-wise.
#[derive(Debug)]
pub struct ArrayOfNumbersUnion<V: FixedWidthNumeric> {
    inner: TupleUnion<VectorSummary<V>, VectorSumPolicy>,
    num_values: u8,
}

impl<V: FixedWidthNumeric> ArrayOfNumbersUnion<V> {
    /// Creates a union for sketches carrying `num_values` numbers per key,
    /// with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if `num_values` is zero.
    pub fn new(num_values: u8) -> Self {
        Self::with_lg_k_and_seed(num_values, crate::tuple::DEFAULT_LG_K, DEFAULT_UPDATE_SEED)
    }

    /// Creates a union with an explicit nominal capacity and seed.
    ///
    /// # Panics
    ///
    /// Panics if `num_values` is zero, `lg_k` is out of range, or the seed
    /// hashes to a zero fingerprint.
    pub fn with_lg_k_and_seed(num_values: u8, lg_k: u8, seed: u64) -> Self {
        assert!(num_values >= 1, "num_values must be in [1, 255], got 0");
        Self {
            inner: TupleUnion::builder(VectorSumPolicy)
                .lg_k(lg_k)
                .seed(seed)
                .build(),
            num_values,
        }
    }

    /// Merges a sketch into this union.
    ///
    /// # Errors
    ///
    /// Fails if the operand's summary shape differs, on a seed-hash
    /// mismatch, or on a corrupt operand.
    pub fn update<W: ArrayOfNumbersSketchView<V>>(&mut self, sketch: &W) -> Result<(), Error> {
        if sketch.num_values() != self.num_values {
            return Err(Error::summary_shape_mismatch(
                self.num_values as usize,
                sketch.num_values() as usize,
            ));
        }
        self.inner.update(sketch)
    }

    /// Returns the union result.
    pub fn result(&self, ordered: bool) -> ArrayOfNumbersCompactSketch<V> {
        ArrayOfNumbersCompactSketch {
            inner: self.inner.result(ordered),
            num_values: self.num_values,
        }
    }

    /// Resets the union to its initial empty state.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Intersection of array-of-numbers sketches; colliding summaries add
/// element-wise.
#[derive(Debug)]
pub struct ArrayOfNumbersIntersection<V: FixedWidthNumeric> {
    inner: TupleIntersection<VectorSummary<V>, VectorSumPolicy>,
    num_values: u8,
}

impl<V: FixedWidthNumeric> ArrayOfNumbersIntersection<V> {
    /// Creates an intersection for sketches carrying `num_values` numbers
    /// per key.
    ///
    /// # Panics
    ///
    /// Panics if `num_values` is zero.
    pub fn new(num_values: u8, seed: u64) -> Self {
        assert!(num_values >= 1, "num_values must be in [1, 255], got 0");
        Self {
            inner: TupleIntersection::new(VectorSumPolicy, seed),
            num_values,
        }
    }

    /// Creates an intersection with the default seed.
    pub fn new_with_default_seed(num_values: u8) -> Self {
        Self::new(num_values, DEFAULT_UPDATE_SEED)
    }

    /// Narrows the intersection with a given sketch.
    ///
    /// # Errors
    ///
    /// Fails if the operand's summary shape differs, on a seed-hash
    /// mismatch, or on a corrupt operand.
    pub fn update<W: ArrayOfNumbersSketchView<V>>(&mut self, sketch: &W) -> Result<(), Error> {
        if sketch.num_values() != self.num_values {
            return Err(Error::summary_shape_mismatch(
                self.num_values as usize,
                sketch.num_values() as usize,
            ));
        }
        self.inner.update(sketch)
    }

    /// Returns whether this operator has received at least one update.
    pub fn has_result(&self) -> bool {
        self.inner.has_result()
    }

    /// Returns the intersection result.
    ///
    /// # Errors
    ///
    /// Fails if called before the first [`update`](Self::update).
    pub fn result(&self, ordered: bool) -> Result<ArrayOfNumbersCompactSketch<V>, Error> {
        Ok(ArrayOfNumbersCompactSketch {
            inner: self.inner.result(ordered)?,
            num_values: self.num_values,
        })
    }
}

/// Computes the set difference `A \ B` of two array-of-numbers sketches
/// with the default seed.
///
/// # Errors
///
/// Fails if the operands' summary shapes differ or on a seed-hash
/// mismatch.
pub fn a_not_b<V, A, B>(
    a: &A,
    b: &B,
    ordered: bool,
) -> Result<ArrayOfNumbersCompactSketch<V>, Error>
where
    V: FixedWidthNumeric,
    A: ArrayOfNumbersSketchView<V>,
    B: ArrayOfNumbersSketchView<V>,
{
    a_not_b_with_seed(a, b, ordered, DEFAULT_UPDATE_SEED)
}

/// Computes the set difference `A \ B` of two array-of-numbers sketches.
pub fn a_not_b_with_seed<V, A, B>(
    a: &A,
    b: &B,
    ordered: bool,
    seed: u64,
) -> Result<ArrayOfNumbersCompactSketch<V>, Error>
where
    V: FixedWidthNumeric,
    A: ArrayOfNumbersSketchView<V>,
    B: ArrayOfNumbersSketchView<V>,
{
    if a.num_values() != b.num_values() {
        return Err(Error::summary_shape_mismatch(
            a.num_values() as usize,
            b.num_values() as usize,
        ));
    }
    Ok(ArrayOfNumbersCompactSketch {
        inner: crate::tuple::a_not_b_with_seed(a, b, ordered, seed)?,
        num_values: a.num_values(),
    })
}
