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

//! Stock 32-bit integer summary.
//!
//! The integer summary keeps one `i32` per key under a configurable
//! aggregation mode. Its 4-byte little-endian wire encoding matches the
//! integer summaries of the peer implementations, so serialized sketches
//! round-trip across languages.

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;
use crate::tuple::Policy;
use crate::tuple::Summary;
use crate::tuple::SummaryFactory;
use crate::tuple::SummarySerde;

/// Aggregation mode of an [`IntegerSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerSummaryMode {
    /// Keep the sum of the presented values.
    Sum,
    /// Keep the minimum presented value.
    Min,
    /// Keep the maximum presented value.
    Max,
    /// Keep the constant 1 (pure distinct counting).
    AlwaysOne,
}

/// A summary holding a single `i32` aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerSummary {
    value: i32,
    mode: IntegerSummaryMode,
}

impl IntegerSummary {
    /// Creates a summary in its initial state for the given mode.
    pub fn new(mode: IntegerSummaryMode) -> Self {
        Self {
            value: Self::initial_value(mode),
            mode,
        }
    }

    pub(crate) fn with_value(mode: IntegerSummaryMode, value: i32) -> Self {
        Self { value, mode }
    }

    /// Returns the current aggregate value.
    pub fn value(&self) -> i32 {
        self.value
    }

    fn initial_value(mode: IntegerSummaryMode) -> i32 {
        match mode {
            IntegerSummaryMode::Sum => 0,
            IntegerSummaryMode::Min => i32::MAX,
            IntegerSummaryMode::Max => i32::MIN,
            IntegerSummaryMode::AlwaysOne => 1,
        }
    }

    fn merge(&mut self, incoming: i32) {
        match self.mode {
            IntegerSummaryMode::Sum => self.value = self.value.wrapping_add(incoming),
            IntegerSummaryMode::Min => self.value = self.value.min(incoming),
            IntegerSummaryMode::Max => self.value = self.value.max(incoming),
            IntegerSummaryMode::AlwaysOne => self.value = 1,
        }
    }
}

impl Summary for IntegerSummary {
    type Input = i32;

    fn update(&mut self, input: &i32) {
        self.merge(*input);
    }

    fn reset(&mut self) {
        self.value = Self::initial_value(self.mode);
    }
}

/// Factory producing [`IntegerSummary`] instances of one mode.
#[derive(Debug, Clone, Copy)]
pub struct IntegerSummaryFactory {
    mode: IntegerSummaryMode,
}

impl IntegerSummaryFactory {
    /// Creates a factory for the given mode.
    pub fn new(mode: IntegerSummaryMode) -> Self {
        Self { mode }
    }
}

impl SummaryFactory for IntegerSummaryFactory {
    type Summary = IntegerSummary;

    fn new_summary(&self) -> IntegerSummary {
        IntegerSummary::new(self.mode)
    }
}

/// Collision policy that merges integer summaries by their own mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerSummaryPolicy;

impl Policy<IntegerSummary> for IntegerSummaryPolicy {
    fn apply(&self, existing: &mut IntegerSummary, incoming: &IntegerSummary) {
        existing.merge(incoming.value);
    }
}

/// Serializer/deserializer for [`IntegerSummary`].
///
/// The wire encoding is the bare 4-byte little-endian value; the mode is
/// configuration carried by the serde, not part of the image.
#[derive(Debug, Clone, Copy)]
pub struct IntegerSummarySerde {
    mode: IntegerSummaryMode,
}

impl IntegerSummarySerde {
    /// Creates a serde that reconstructs summaries with the given mode.
    pub fn new(mode: IntegerSummaryMode) -> Self {
        Self { mode }
    }
}

impl SummarySerde<IntegerSummary> for IntegerSummarySerde {
    fn serialize_summary(&self, bytes: &mut SketchBytes, summary: &IntegerSummary) {
        bytes.write_i32_le(summary.value);
    }

    fn deserialize_summary(&self, slice: &mut SketchSlice<'_>) -> Result<IntegerSummary, Error> {
        let value = slice
            .read_i32_le()
            .map_err(|_| Error::insufficient_data("integer summary value"))?;
        Ok(IntegerSummary::with_value(self.mode, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_mode() {
        let mut summary = IntegerSummary::new(IntegerSummaryMode::Sum);
        summary.update(&10);
        summary.update(&5);
        assert_eq!(summary.value(), 15);
        summary.reset();
        assert_eq!(summary.value(), 0);
    }

    #[test]
    fn test_min_max_modes() {
        let mut min = IntegerSummary::new(IntegerSummaryMode::Min);
        min.update(&7);
        min.update(&3);
        min.update(&9);
        assert_eq!(min.value(), 3);

        let mut max = IntegerSummary::new(IntegerSummaryMode::Max);
        max.update(&7);
        max.update(&3);
        max.update(&9);
        assert_eq!(max.value(), 9);
    }

    #[test]
    fn test_always_one_mode() {
        let mut summary = IntegerSummary::new(IntegerSummaryMode::AlwaysOne);
        summary.update(&100);
        assert_eq!(summary.value(), 1);
    }

    #[test]
    fn test_policy_applies_mode_of_existing() {
        let policy = IntegerSummaryPolicy;
        let mut existing = IntegerSummary::new(IntegerSummaryMode::Sum);
        existing.update(&10);
        let mut incoming = IntegerSummary::new(IntegerSummaryMode::Sum);
        incoming.update(&32);
        policy.apply(&mut existing, &incoming);
        assert_eq!(existing.value(), 42);
    }

    #[test]
    fn test_serde_round_trip() {
        let serde = IntegerSummarySerde::new(IntegerSummaryMode::Sum);
        let mut bytes = SketchBytes::with_capacity(4);
        serde.serialize_summary(&mut bytes, &IntegerSummary::with_value(IntegerSummaryMode::Sum, -7));
        let buf = bytes.into_bytes();
        assert_eq!(buf.len(), 4);

        let mut slice = SketchSlice::new(&buf);
        let restored = serde.deserialize_summary(&mut slice).unwrap();
        assert_eq!(restored.value(), -7);
    }
}
