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

//! Array-of-numbers sketch implementation
//!
//! A specialization of the tuple sketch whose summary is a fixed-length
//! vector of a numeric type, merged by element-wise addition. Every sketch
//! and operand in a computation must carry the same number of values per
//! summary; mixing shapes is an error.
//!
//! The serialized form is distinct from the generic tuple format (a fixed
//! 16-byte header that always carries theta) and matches the
//! array-of-doubles images produced by the Java, C++ and Go DataSketches
//! implementations when `V = f64`; the `ArrayOfDoubles*` aliases name that
//! configuration.
//!
//! # Usage
//!
//! ```rust
//! use datasketches_tuple::array_of_numbers::ArrayOfDoublesUpdateSketch;
//!
//! let mut sketch = ArrayOfDoublesUpdateSketch::builder(2).build();
//! sketch.update_str("user-1", &[1.0, 20.0]).unwrap();
//! sketch.update_str("user-1", &[1.0, 22.0]).unwrap();
//! sketch.update_str("user-2", &[1.0, 7.0]).unwrap();
//! assert_eq!(sketch.estimate(), 2.0);
//! ```

mod ops;
mod serialization;
mod sketch;
mod summary;

pub use self::ops::ArrayOfNumbersIntersection;
pub use self::ops::ArrayOfNumbersUnion;
pub use self::ops::a_not_b;
pub use self::ops::a_not_b_with_seed;
pub use self::serialization::AON_SERIAL_VERSION;
pub use self::serialization::SKETCH_TYPE_AON_COMPACT;
pub use self::sketch::ArrayOfNumbersCompactSketch;
pub use self::sketch::ArrayOfNumbersUpdateSketch;
pub use self::sketch::ArrayOfNumbersUpdateSketchBuilder;
pub use self::summary::FixedWidthNumeric;
pub use self::summary::VectorSumPolicy;
pub use self::summary::VectorSummary;
pub use self::summary::VectorSummaryFactory;

use crate::tuple::TupleSketchView;

/// Array-of-doubles update sketch, the configuration shared with the peer
/// implementations.
pub type ArrayOfDoublesUpdateSketch = ArrayOfNumbersUpdateSketch<f64>;

/// Array-of-doubles compact sketch.
pub type ArrayOfDoublesCompactSketch = ArrayOfNumbersCompactSketch<f64>;

/// Array-of-doubles union.
pub type ArrayOfDoublesUnion = ArrayOfNumbersUnion<f64>;

/// Array-of-doubles intersection.
pub type ArrayOfDoublesIntersection = ArrayOfNumbersIntersection<f64>;

/// Read access common to update and compact array-of-numbers sketches.
///
/// Extends the generic tuple view with the summary shape, which the set
/// operations check before combining operands.
pub trait ArrayOfNumbersSketchView<V: FixedWidthNumeric>:
    TupleSketchView<VectorSummary<V>>
{
    /// Returns the number of values carried per summary.
    fn num_values(&self) -> u8;
}
