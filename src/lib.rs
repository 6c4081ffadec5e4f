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

//! Tuple sketches for approximate distinct counting with per-key summaries.
//!
//! A Tuple sketch generalizes the Theta sketch: every retained hash carries a
//! mutable, application-defined [`Summary`](tuple::Summary) that accumulates a
//! per-key aggregate (a count, a sum, a vector of numbers). The library
//! provides:
//!
//! - [`tuple::UpdateTupleSketch`] for streaming ingest and
//!   [`tuple::CompactTupleSketch`] as its immutable, serializable snapshot;
//! - the set operations [`tuple::TupleUnion`], [`tuple::TupleIntersection`],
//!   [`tuple::a_not_b`] and [`tuple::jaccard`], whose results are again
//!   sketches with calibrated confidence bounds;
//! - the [`array_of_numbers`] specialization, whose summary is a fixed-length
//!   vector of a numeric type with element-wise-addition merge semantics.
//!
//! Serialized sketches are byte-compatible with the Apache DataSketches
//! implementations in Java, C++ and Go.
//!
//! # Usage
//!
//! ```rust
//! use datasketches_tuple::tuple::IntegerSummaryFactory;
//! use datasketches_tuple::tuple::IntegerSummaryMode;
//! use datasketches_tuple::tuple::UpdateTupleSketch;
//!
//! let factory = IntegerSummaryFactory::new(IntegerSummaryMode::Sum);
//! let mut sketch = UpdateTupleSketch::builder(factory).lg_k(12).build();
//! sketch.update_str("page-1", &1).unwrap();
//! sketch.update_str("page-2", &1).unwrap();
//! sketch.update_str("page-1", &1).unwrap();
//! assert_eq!(sketch.estimate(), 2.0);
//! ```

pub mod array_of_numbers;
pub mod codec;
pub mod common;
pub mod error;
pub mod hash;
pub mod tuple;
