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

//! The summary abstraction: per-key aggregates and their merge policies.

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;

/// An application-defined aggregate carried with every retained hash.
///
/// Cloning must produce a deep copy: summaries cross sketch boundaries by
/// cloning, and the copies are mutated independently afterwards.
pub trait Summary: Clone + std::fmt::Debug {
    /// The value type folded into the summary on each update.
    type Input: ?Sized;

    /// Folds an incoming value into this summary.
    ///
    /// Must be associative for union results to be well defined.
    fn update(&mut self, input: &Self::Input);

    /// Restores the initial state.
    fn reset(&mut self);
}

/// Creates fresh summaries for keys seen for the first time.
///
/// An update sketch owns one factory; the factory carries whatever
/// configuration the summary needs (a mode, a vector length).
pub trait SummaryFactory {
    /// The summary type this factory produces.
    type Summary: Summary;

    /// Returns a summary in its initial state.
    fn new_summary(&self) -> Self::Summary;
}

/// Resolves summary collisions in set operations.
///
/// When a union or intersection finds the same hash in both operands, the
/// policy folds the incoming summary into the existing one (sum it, keep
/// the first, or anything the application needs).
pub trait Policy<S: Summary> {
    /// Merges `incoming` into `existing`.
    fn apply(&self, existing: &mut S, incoming: &S);
}

impl<S: Summary, P: Policy<S>> Policy<S> for &P {
    fn apply(&self, existing: &mut S, incoming: &S) {
        (*self).apply(existing, incoming);
    }
}

/// Serializer/deserializer for the summaries stored in a sketch image.
///
/// Implementations are instances rather than bare functions so a
/// deserializer can carry configuration that the wire format does not
/// encode (for example a merge mode).
pub trait SummarySerde<S> {
    /// Appends the wire encoding of a summary.
    fn serialize_summary(&self, bytes: &mut SketchBytes, summary: &S);

    /// Reads one summary from the wire encoding.
    fn deserialize_summary(&self, slice: &mut SketchSlice<'_>) -> Result<S, Error>;
}
