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

//! Compact Tuple sketch implementation
//!
//! A compact tuple sketch is the immutable form of a tuple sketch: theta,
//! the retained `(hash, summary)` entries, the seed fingerprint and the
//! empty/ordered flags. It is the input to the set operations and the only
//! form that serializes.
//!
//! The binary format is the DataSketches compact tuple format used by the
//! Java, C++ and Go implementations; summary payloads go through the
//! caller's [`SummarySerde`].

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common::NumStdDev;
use crate::common::binomial_bounds;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::compute_seed_hash;
use crate::tuple::Summary;
use crate::tuple::SummarySerde;
use crate::tuple::TupleSketchView;
use crate::tuple::hash_table::MAX_THETA;
use crate::tuple::serialization::*;

/// A compact, immutable tuple sketch.
///
/// Produced by [`UpdateTupleSketch::compact`], by the set operations, or by
/// decoding a serialized image. Supports estimation, bounds, iteration,
/// filtering and serialization, but no further updates.
///
/// [`UpdateTupleSketch::compact`]: crate::tuple::UpdateTupleSketch::compact
///
/// # Example
///
/// ```
/// use datasketches_tuple::tuple::CompactTupleSketch;
/// use datasketches_tuple::tuple::IntegerSummaryFactory;
/// use datasketches_tuple::tuple::IntegerSummaryMode;
/// use datasketches_tuple::tuple::IntegerSummarySerde;
/// use datasketches_tuple::tuple::UpdateTupleSketch;
///
/// let factory = IntegerSummaryFactory::new(IntegerSummaryMode::Sum);
/// let mut sketch = UpdateTupleSketch::builder(factory).build();
/// sketch.update_str("apple", &1).unwrap();
/// sketch.update_str("banana", &1).unwrap();
///
/// let compact = sketch.compact(true);
/// let serde = IntegerSummarySerde::new(IntegerSummaryMode::Sum);
/// let bytes = compact.serialize(&serde);
///
/// let restored = CompactTupleSketch::deserialize(&bytes, &serde).unwrap();
/// assert_eq!(compact.estimate(), restored.estimate());
/// ```
#[derive(Debug, Clone)]
pub struct CompactTupleSketch<S> {
    theta: u64,
    entries: Vec<(u64, S)>,
    seed_hash: u16,
    is_empty: bool,
    is_ordered: bool,
}

impl<S: Summary> CompactTupleSketch<S> {
    /// Assembles a compact sketch, sorting the entries iff `ordered` is
    /// requested. Empty and single-entry sketches are trivially ordered.
    ///
    /// An empty sketch is normalized to `theta == MAX_THETA` so that
    /// emptiness always implies no sampling, even when the source sketch
    /// was configured with a sampling probability below one.
    pub(crate) fn from_entries(
        mut entries: Vec<(u64, S)>,
        theta: u64,
        seed_hash: u16,
        is_empty: bool,
        ordered: bool,
    ) -> Self {
        debug_assert!(!is_empty || entries.is_empty());
        let theta = if is_empty { MAX_THETA } else { theta };
        if ordered && entries.len() > 1 {
            entries.sort_unstable_by_key(|&(hash, _)| hash);
        }
        let is_ordered = ordered || entries.len() <= 1;
        Self {
            theta,
            entries,
            seed_hash,
            is_empty,
            is_ordered,
        }
    }

    /// Check if the sketch is empty (no keys were ever presented)
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Check if the retained entries are sorted by hash
    pub fn is_ordered(&self) -> bool {
        self.is_ordered
    }

    /// Get the estimated number of distinct keys
    pub fn estimate(&self) -> f64 {
        if self.is_empty {
            return 0.0;
        }
        let num_retained = self.entries.len() as f64;
        num_retained / self.theta()
    }

    /// Return theta as a fraction (0.0 to 1.0)
    pub fn theta(&self) -> f64 {
        self.theta as f64 / MAX_THETA as f64
    }

    /// Return theta as a 64-bit value
    pub fn theta64(&self) -> u64 {
        self.theta
    }

    /// Check if sketch is in estimation mode
    pub fn is_estimation_mode(&self) -> bool {
        self.theta < MAX_THETA
    }

    /// Return number of retained entries
    pub fn num_retained(&self) -> usize {
        self.entries.len()
    }

    /// Return the 16-bit fingerprint of the seed this sketch was hashed
    /// with
    pub fn seed_hash(&self) -> u16 {
        self.seed_hash
    }

    /// Return iterator over `(hash, summary)` entries
    pub fn iter(&self) -> impl Iterator<Item = (u64, &S)> + '_ {
        self.entries.iter().map(|(hash, summary)| (*hash, summary))
    }

    /// Returns the approximate lower error bound given the specified number
    /// of standard deviations.
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if self.is_empty {
            return 0.0;
        }
        if !self.is_estimation_mode() {
            return self.num_retained() as f64;
        }
        binomial_bounds::lower_bound(self.num_retained() as u64, self.theta(), num_std_dev)
            .expect("theta should always be valid")
    }

    /// Returns the approximate upper error bound given the specified number
    /// of standard deviations.
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if self.is_empty {
            return 0.0;
        }
        if !self.is_estimation_mode() {
            return self.num_retained() as f64;
        }
        binomial_bounds::upper_bound(
            self.num_retained() as u64,
            self.theta(),
            num_std_dev,
            self.is_empty,
        )
        .expect("theta should always be valid")
    }

    /// Returns a new compact sketch with only the entries whose summary
    /// satisfies the predicate, preserving theta and the seed fingerprint.
    ///
    /// The result is empty iff this sketch was empty, or was in exact mode
    /// and the filter removed every entry.
    pub fn filter<P: FnMut(&S) -> bool>(&self, mut predicate: P) -> CompactTupleSketch<S> {
        let entries: Vec<(u64, S)> = self
            .entries
            .iter()
            .filter(|(_, summary)| predicate(summary))
            .cloned()
            .collect();
        let is_empty = self.is_empty || (!self.is_estimation_mode() && entries.is_empty());
        Self {
            theta: self.theta,
            entries,
            seed_hash: self.seed_hash,
            is_empty,
            is_ordered: self.is_ordered,
        }
    }

    /// Serialize the sketch to bytes in the compact tuple format.
    ///
    /// Summaries are encoded by `serde` immediately after their hash.
    pub fn serialize<Sd: SummarySerde<S>>(&self, serde: &Sd) -> Vec<u8> {
        let num_entries = self.entries.len();
        let is_single_item = !self.is_empty && num_entries == 1 && !self.is_estimation_mode();

        let preamble_longs = if self.is_empty || is_single_item {
            PREAMBLE_LONGS_EMPTY_OR_SINGLE
        } else if self.is_estimation_mode() {
            PREAMBLE_LONGS_ESTIMATION
        } else {
            PREAMBLE_LONGS_EXACT
        };

        let preamble_bytes = (preamble_longs as usize) * 8;
        let mut bytes = SketchBytes::with_capacity(preamble_bytes + num_entries * HASH_SIZE_BYTES);

        let mut flags = FLAG_IS_READ_ONLY | FLAG_IS_COMPACT;
        if self.is_empty {
            flags |= FLAG_IS_EMPTY;
        }
        if self.is_ordered {
            flags |= FLAG_IS_ORDERED;
        }

        bytes.write_u8(preamble_longs);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(TUPLE_FAMILY_ID);
        bytes.write_u8(SKETCH_TYPE_COMPACT_TUPLE);
        bytes.write_u8(0); // unused
        bytes.write_u8(flags);
        bytes.write_u16_le(self.seed_hash);

        if preamble_longs >= PREAMBLE_LONGS_EXACT {
            bytes.write_u32_le(num_entries as u32);
            bytes.write_u32_le(0); // reserved
        }
        if preamble_longs >= PREAMBLE_LONGS_ESTIMATION {
            bytes.write_u64_le(self.theta);
        }

        for (hash, summary) in &self.entries {
            bytes.write_u64_le(*hash);
            serde.serialize_summary(&mut bytes, summary);
        }

        bytes.into_bytes()
    }

    /// Deserialize a compact sketch from bytes.
    ///
    /// Uses the default seed for validation. For sketches created with a
    /// different seed, use
    /// [`deserialize_with_seed`](Self::deserialize_with_seed).
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are truncated, the header does not
    /// describe a compact tuple sketch, or the stored seed fingerprint does
    /// not match.
    pub fn deserialize<Sd: SummarySerde<S>>(bytes: &[u8], serde: &Sd) -> Result<Self, Error> {
        Self::deserialize_with_seed(bytes, serde, DEFAULT_UPDATE_SEED)
    }

    /// Deserialize a compact sketch from bytes with a specific seed.
    ///
    /// Empty sketches skip seed validation; non-empty sketches fail if the
    /// stored seed fingerprint differs from the fingerprint of `seed`.
    pub fn deserialize_with_seed<Sd: SummarySerde<S>>(
        bytes: &[u8],
        serde: &Sd,
        seed: u64,
    ) -> Result<Self, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |_| Error::insufficient_data(tag)
        }

        let mut cursor = SketchSlice::new(bytes);

        let preamble_longs = cursor.read_u8().map_err(make_error("preamble_longs"))?;
        let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
        let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
        let sketch_type = cursor.read_u8().map_err(make_error("sketch_type"))?;
        let _unused = cursor.read_u8().map_err(make_error("unused"))?;
        let flags = cursor.read_u8().map_err(make_error("flags"))?;
        let stored_seed_hash = cursor.read_u16_le().map_err(make_error("seed_hash"))?;

        if family_id != TUPLE_FAMILY_ID {
            return Err(Error::invalid_family(TUPLE_FAMILY_ID, family_id, "Tuple"));
        }
        if sketch_type != SKETCH_TYPE_COMPACT_TUPLE {
            return Err(Error::invalid_sketch_type(
                SKETCH_TYPE_COMPACT_TUPLE,
                sketch_type,
                "CompactTuple",
            ));
        }
        if serial_version != SERIAL_VERSION && serial_version != SERIAL_VERSION_LEGACY {
            return Err(Error::unsupported_serial_version(
                SERIAL_VERSION,
                serial_version,
            ));
        }
        if !(PREAMBLE_LONGS_EMPTY_OR_SINGLE..=PREAMBLE_LONGS_ESTIMATION).contains(&preamble_longs) {
            return Err(Error::deserial(format!(
                "preamble longs must be in [1, 3], got {preamble_longs}"
            )));
        }

        let is_empty = (flags & FLAG_IS_EMPTY) != 0;
        let is_ordered = (flags & FLAG_IS_ORDERED) != 0;

        // Empty sketches skip seed validation.
        if is_empty {
            return Ok(Self {
                theta: MAX_THETA,
                entries: Vec::new(),
                seed_hash: stored_seed_hash,
                is_empty: true,
                is_ordered: true,
            });
        }

        let expected_seed_hash = compute_seed_hash(seed);
        if stored_seed_hash != expected_seed_hash {
            return Err(Error::seed_hash_mismatch(expected_seed_hash, stored_seed_hash));
        }

        let (num_entries, theta) = if preamble_longs == PREAMBLE_LONGS_EMPTY_OR_SINGLE {
            // Single-item form: one exact-mode entry, no count field.
            (1usize, MAX_THETA)
        } else {
            let num_entries = cursor.read_u32_le().map_err(make_error("num_entries"))? as usize;
            let _reserved = cursor.read_u32_le().map_err(make_error("reserved"))?;
            let theta = if preamble_longs >= PREAMBLE_LONGS_ESTIMATION {
                cursor.read_u64_le().map_err(make_error("theta"))?
            } else {
                MAX_THETA
            };
            (num_entries, theta)
        };

        let mut entries = Vec::with_capacity(num_entries);
        for i in 0..num_entries {
            let hash = cursor.read_u64_le().map_err(|_| {
                Error::insufficient_data(format!(
                    "expected {num_entries} entries, failed at index {i}"
                ))
            })?;
            if hash == 0 || hash >= theta {
                return Err(Error::corrupt_input(format!(
                    "entry hash {hash:#x} out of range at index {i}"
                )));
            }
            let summary = serde.deserialize_summary(&mut cursor)?;
            entries.push((hash, summary));
        }

        Ok(Self {
            theta,
            entries,
            seed_hash: stored_seed_hash,
            is_empty: false,
            is_ordered,
        })
    }
}

impl<S: Summary> TupleSketchView<S> for CompactTupleSketch<S> {
    fn is_empty(&self) -> bool {
        self.is_empty
    }

    fn is_ordered(&self) -> bool {
        self.is_ordered
    }

    fn theta64(&self) -> u64 {
        self.theta
    }

    fn seed_hash(&self) -> u16 {
        self.seed_hash
    }

    fn num_retained(&self) -> usize {
        self.entries.len()
    }

    fn entries<'a>(&'a self) -> impl Iterator<Item = (u64, &'a S)>
    where
        S: 'a,
    {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::IntegerSummary;
    use crate::tuple::IntegerSummaryMode;
    use crate::tuple::IntegerSummarySerde;

    fn summary(value: i32) -> IntegerSummary {
        let mut s = IntegerSummary::new(IntegerSummaryMode::Sum);
        s.update(&value);
        s
    }

    fn seed_hash() -> u16 {
        compute_seed_hash(DEFAULT_UPDATE_SEED)
    }

    #[test]
    fn test_empty_compact_sketch() {
        let sketch = CompactTupleSketch::<IntegerSummary>::from_entries(
            Vec::new(),
            MAX_THETA,
            seed_hash(),
            true,
            true,
        );
        assert!(sketch.is_empty());
        assert!(sketch.is_ordered());
        assert_eq!(sketch.estimate(), 0.0);
        assert_eq!(sketch.num_retained(), 0);
        assert!(!sketch.is_estimation_mode());
    }

    #[test]
    fn test_unordered_entries_are_sorted_on_request() {
        let entries = vec![(300, summary(3)), (100, summary(1)), (200, summary(2))];
        let sketch =
            CompactTupleSketch::from_entries(entries, MAX_THETA, seed_hash(), false, true);
        let hashes: Vec<u64> = sketch.iter().map(|(hash, _)| hash).collect();
        assert_eq!(hashes, vec![100, 200, 300]);
        assert!(sketch.is_ordered());
        assert_eq!(sketch.estimate(), 3.0);
    }

    #[test]
    fn test_single_entry_is_trivially_ordered() {
        let sketch = CompactTupleSketch::from_entries(
            vec![(42, summary(1))],
            MAX_THETA,
            seed_hash(),
            false,
            false,
        );
        assert!(sketch.is_ordered());
    }

    #[test]
    fn test_estimation_mode_estimate() {
        let entries = vec![(100, summary(1)), (200, summary(1)), (300, summary(1))];
        let sketch =
            CompactTupleSketch::from_entries(entries, MAX_THETA / 2, seed_hash(), false, true);
        assert!(sketch.is_estimation_mode());
        assert!((sketch.estimate() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_keeps_theta_and_seed_hash() {
        let entries = vec![(100, summary(1)), (200, summary(5)), (300, summary(9))];
        let sketch =
            CompactTupleSketch::from_entries(entries, MAX_THETA / 2, seed_hash(), false, true);

        let filtered = sketch.filter(|s| s.value() >= 5);
        assert_eq!(filtered.num_retained(), 2);
        assert_eq!(filtered.theta64(), sketch.theta64());
        assert_eq!(filtered.seed_hash(), sketch.seed_hash());
        // Estimation mode: dropping every entry does not make it empty.
        let emptied = sketch.filter(|_| false);
        assert_eq!(emptied.num_retained(), 0);
        assert!(!emptied.is_empty());
    }

    #[test]
    fn test_filter_emptying_exact_sketch_is_empty() {
        let entries = vec![(100, summary(1))];
        let sketch =
            CompactTupleSketch::from_entries(entries, MAX_THETA, seed_hash(), false, true);
        let emptied = sketch.filter(|_| false);
        assert!(emptied.is_empty());
        assert_eq!(emptied.estimate(), 0.0);
    }

    #[test]
    fn test_serialize_deserialize_estimation_mode() {
        let serde = IntegerSummarySerde::new(IntegerSummaryMode::Sum);
        let entries = vec![(100, summary(7)), (200, summary(8)), (300, summary(9))];
        let sketch =
            CompactTupleSketch::from_entries(entries, MAX_THETA / 2, seed_hash(), false, true);

        let bytes = sketch.serialize(&serde);
        let restored = CompactTupleSketch::deserialize(&bytes, &serde).unwrap();

        assert!(!restored.is_empty());
        assert!(restored.is_estimation_mode());
        assert_eq!(restored.theta64(), sketch.theta64());
        assert_eq!(restored.num_retained(), 3);
        let values: Vec<i32> = restored.iter().map(|(_, s)| s.value()).collect();
        assert_eq!(values, vec![7, 8, 9]);
    }

    #[test]
    fn test_deserialize_rejects_wrong_family() {
        let serde = IntegerSummarySerde::new(IntegerSummaryMode::Sum);
        let sketch = CompactTupleSketch::<IntegerSummary>::from_entries(
            Vec::new(),
            MAX_THETA,
            seed_hash(),
            true,
            true,
        );
        let mut bytes = sketch.serialize(&serde);
        bytes[2] = 99;
        assert!(CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde).is_err());
    }

    #[test]
    fn test_deserialize_rejects_wrong_seed() {
        let serde = IntegerSummarySerde::new(IntegerSummaryMode::Sum);
        let sketch = CompactTupleSketch::from_entries(
            vec![(42, summary(1))],
            MAX_THETA,
            seed_hash(),
            false,
            true,
        );
        let bytes = sketch.serialize(&serde);
        let result =
            CompactTupleSketch::<IntegerSummary>::deserialize_with_seed(&bytes, &serde, 12345);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_accepts_legacy_serial_version() {
        let serde = IntegerSummarySerde::new(IntegerSummaryMode::Sum);
        let sketch = CompactTupleSketch::from_entries(
            vec![(42, summary(1)), (43, summary(2))],
            MAX_THETA,
            seed_hash(),
            false,
            true,
        );
        let mut bytes = sketch.serialize(&serde);
        bytes[1] = SERIAL_VERSION_LEGACY;
        let restored = CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde).unwrap();
        assert_eq!(restored.num_retained(), 2);
    }

    #[test]
    fn test_deserialize_rejects_truncated_entries() {
        let serde = IntegerSummarySerde::new(IntegerSummaryMode::Sum);
        let sketch = CompactTupleSketch::from_entries(
            vec![(42, summary(1)), (43, summary(2))],
            MAX_THETA,
            seed_hash(),
            false,
            true,
        );
        let bytes = sketch.serialize(&serde);
        let truncated = &bytes[..bytes.len() - 6];
        assert!(CompactTupleSketch::<IntegerSummary>::deserialize(truncated, &serde).is_err());
    }
}
