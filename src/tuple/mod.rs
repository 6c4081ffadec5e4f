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

//! Generic Tuple sketch implementation
//!
//! A Tuple sketch estimates the number of distinct keys in a stream and
//! keeps an application-defined [`Summary`] next to every retained key
//! hash. [`UpdateTupleSketch`] ingests the stream; [`CompactTupleSketch`]
//! is its immutable snapshot and the type that serializes, with a binary
//! format shared with the Java, C++ and Go DataSketches implementations.
//!
//! The set operations [`TupleUnion`], [`TupleIntersection`], [`a_not_b`]
//! and [`jaccard`] combine sketches built with the same seed; when both
//! operands retain the same key, the user's [`Policy`] decides how the two
//! summaries merge.

mod a_not_b;
mod compact;
mod hash_table;
mod integer_summary;
mod intersection;
mod jaccard;
mod serialization;
mod sketch;
mod summary;
mod union;

pub use self::a_not_b::a_not_b;
pub use self::a_not_b::a_not_b_with_seed;
pub use self::compact::CompactTupleSketch;
pub use self::hash_table::DEFAULT_LG_K;
pub use self::hash_table::MAX_LG_K;
pub use self::hash_table::MAX_THETA;
pub use self::hash_table::MIN_LG_K;
pub use self::integer_summary::IntegerSummary;
pub use self::integer_summary::IntegerSummaryFactory;
pub use self::integer_summary::IntegerSummaryMode;
pub use self::integer_summary::IntegerSummaryPolicy;
pub use self::integer_summary::IntegerSummarySerde;
pub use self::intersection::TupleIntersection;
pub use self::jaccard::JaccardBounds;
pub use self::jaccard::exactly_equal;
pub use self::jaccard::exactly_equal_with_seed;
pub use self::jaccard::is_dissimilar;
pub use self::jaccard::is_similar;
pub use self::jaccard::jaccard;
pub use self::jaccard::jaccard_with_seed;
pub use self::serialization::SERIAL_VERSION;
pub use self::serialization::SERIAL_VERSION_LEGACY;
pub use self::serialization::SKETCH_TYPE_COMPACT_TUPLE;
pub use self::serialization::TUPLE_FAMILY_ID;
pub use self::sketch::UpdateTupleSketch;
pub use self::sketch::UpdateTupleSketchBuilder;
pub use self::summary::Policy;
pub use self::summary::Summary;
pub use self::summary::SummaryFactory;
pub use self::summary::SummarySerde;
pub use self::union::TupleUnion;
pub use self::union::TupleUnionBuilder;

/// Read access common to update and compact tuple sketches.
///
/// Set operations accept any view so that update sketches, compact
/// sketches and decoded sketches mix freely as operands.
pub trait TupleSketchView<S: Summary> {
    /// Returns true if the source set is logically empty.
    fn is_empty(&self) -> bool;

    /// Returns true if [`entries`](Self::entries) yields hashes in strictly
    /// increasing order.
    fn is_ordered(&self) -> bool;

    /// Returns the sampling threshold as a 64-bit value.
    fn theta64(&self) -> u64;

    /// Returns the 16-bit fingerprint of the seed this sketch was hashed
    /// with.
    fn seed_hash(&self) -> u16;

    /// Returns the number of retained entries.
    fn num_retained(&self) -> usize;

    /// Returns an iterator over the retained `(hash, summary)` entries.
    fn entries<'a>(&'a self) -> impl Iterator<Item = (u64, &'a S)>
    where
        S: 'a;

    /// Returns the number of retained hashes below the given threshold.
    fn count_less_than_theta(&self, theta: u64) -> usize {
        self.entries().filter(|&(hash, _)| hash < theta).count()
    }
}
