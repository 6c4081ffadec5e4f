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

//! Update and compact array-of-numbers sketches.

use crate::array_of_numbers::ArrayOfNumbersSketchView;
use crate::array_of_numbers::serialization::*;
use crate::array_of_numbers::summary::FixedWidthNumeric;
use crate::array_of_numbers::summary::VectorSummary;
use crate::array_of_numbers::summary::VectorSummaryFactory;
use crate::array_of_numbers::summary::VectorSummarySerde;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common::NumStdDev;
use crate::common::ResizeFactor;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::compute_seed_hash;
use crate::tuple::CompactTupleSketch;
use crate::tuple::SummarySerde;
use crate::tuple::TUPLE_FAMILY_ID;
use crate::tuple::TupleSketchView;
use crate::tuple::UpdateTupleSketch;

/// Mutable sketch whose summary is a fixed-length numeric vector, merged
/// by element-wise addition.
///
/// # Examples
///
/// ```
/// use datasketches_tuple::array_of_numbers::ArrayOfNumbersUpdateSketch;
///
/// let mut sketch = ArrayOfNumbersUpdateSketch::<f64>::builder(2).build();
/// sketch.update_u64(1, &[10.0, 20.0]).unwrap();
/// sketch.update_u64(1, &[5.0, 10.0]).unwrap();
/// let (_, values) = sketch.iter().next().unwrap();
/// assert_eq!(values, &[15.0, 30.0]);
/// ```
#[derive(Debug)]
pub struct ArrayOfNumbersUpdateSketch<V: FixedWidthNumeric> {
    inner: UpdateTupleSketch<VectorSummaryFactory<V>>,
    num_values: u8,
}

impl<V: FixedWidthNumeric> ArrayOfNumbersUpdateSketch<V> {
    /// Create a new builder for sketches carrying `num_values` numbers per
    /// key.
    ///
    /// # Panics
    ///
    /// Panics if `num_values` is zero.
    pub fn builder(num_values: u8) -> ArrayOfNumbersUpdateSketchBuilder<V> {
        assert!(num_values >= 1, "num_values must be in [1, 255], got 0");
        ArrayOfNumbersUpdateSketchBuilder {
            num_values,
            inner: UpdateTupleSketch::builder(VectorSummaryFactory::new(num_values)),
        }
    }

    /// Update the sketch with an unsigned 64-bit key.
    ///
    /// # Errors
    ///
    /// Fails if `values` does not have exactly `num_values` elements.
    pub fn update_u64(&mut self, key: u64, values: &[V]) -> Result<(), Error> {
        self.check_shape(values)?;
        self.inner.update_u64(key, values)
    }

    /// Update the sketch with a signed 64-bit key.
    pub fn update_i64(&mut self, key: i64, values: &[V]) -> Result<(), Error> {
        self.check_shape(values)?;
        self.inner.update_i64(key, values)
    }

    /// Update the sketch with a 64-bit floating-point key.
    pub fn update_f64(&mut self, key: f64, values: &[V]) -> Result<(), Error> {
        self.check_shape(values)?;
        self.inner.update_f64(key, values)
    }

    /// Update the sketch with a string key.
    ///
    /// # Errors
    ///
    /// Fails on an empty string key or a shape mismatch.
    pub fn update_str(&mut self, key: &str, values: &[V]) -> Result<(), Error> {
        self.check_shape(values)?;
        self.inner.update_str(key, values)
    }

    /// Update the sketch with a raw byte key.
    ///
    /// # Errors
    ///
    /// Fails on an empty byte key or a shape mismatch.
    pub fn update_bytes(&mut self, key: &[u8], values: &[V]) -> Result<(), Error> {
        self.check_shape(values)?;
        self.inner.update_bytes(key, values)
    }

    fn check_shape(&self, values: &[V]) -> Result<(), Error> {
        if values.len() != self.num_values as usize {
            return Err(Error::summary_shape_mismatch(
                self.num_values as usize,
                values.len(),
            ));
        }
        Ok(())
    }

    /// Return the number of values carried per key.
    pub fn num_values(&self) -> u8 {
        self.num_values
    }

    /// Return cardinality estimate
    pub fn estimate(&self) -> f64 {
        self.inner.estimate()
    }

    /// Return theta as a fraction (0.0 to 1.0)
    pub fn theta(&self) -> f64 {
        self.inner.theta()
    }

    /// Check if sketch is in estimation mode
    pub fn is_estimation_mode(&self) -> bool {
        self.inner.is_estimation_mode()
    }

    /// Check if sketch is empty
    pub fn is_empty(&self) -> bool {
        TupleSketchView::is_empty(&self.inner)
    }

    /// Return number of retained entries
    pub fn num_retained(&self) -> usize {
        TupleSketchView::num_retained(&self.inner)
    }

    /// Returns the approximate lower error bound given the specified number
    /// of standard deviations.
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.inner.lower_bound(num_std_dev)
    }

    /// Returns the approximate upper error bound given the specified number
    /// of standard deviations.
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.inner.upper_bound(num_std_dev)
    }

    /// Return iterator over `(hash, values)` entries
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[V])> + '_ {
        self.inner.iter().map(|(hash, summary)| (hash, summary.values()))
    }

    /// Returns an immutable snapshot of this sketch, cloning the retained
    /// entries.
    pub fn compact(&self, ordered: bool) -> ArrayOfNumbersCompactSketch<V> {
        ArrayOfNumbersCompactSketch {
            inner: self.inner.compact(ordered),
            num_values: self.num_values,
        }
    }

    /// Consumes this sketch into an immutable snapshot without cloning.
    pub fn into_compact(self, ordered: bool) -> ArrayOfNumbersCompactSketch<V> {
        ArrayOfNumbersCompactSketch {
            inner: self.inner.into_compact(ordered),
            num_values: self.num_values,
        }
    }

    /// Trim the sketch to nominal size k.
    pub fn trim(&mut self) -> Result<(), Error> {
        self.inner.trim()
    }

    /// Reset the sketch to its initial empty state.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl<V: FixedWidthNumeric> TupleSketchView<VectorSummary<V>> for ArrayOfNumbersUpdateSketch<V> {
    fn is_empty(&self) -> bool {
        TupleSketchView::is_empty(&self.inner)
    }

    fn is_ordered(&self) -> bool {
        TupleSketchView::is_ordered(&self.inner)
    }

    fn theta64(&self) -> u64 {
        TupleSketchView::theta64(&self.inner)
    }

    fn seed_hash(&self) -> u16 {
        TupleSketchView::seed_hash(&self.inner)
    }

    fn num_retained(&self) -> usize {
        TupleSketchView::num_retained(&self.inner)
    }

    fn entries<'a>(&'a self) -> impl Iterator<Item = (u64, &'a VectorSummary<V>)>
    where
        VectorSummary<V>: 'a,
    {
        TupleSketchView::entries(&self.inner)
    }
}

impl<V: FixedWidthNumeric> ArrayOfNumbersSketchView<V> for ArrayOfNumbersUpdateSketch<V> {
    fn num_values(&self) -> u8 {
        self.num_values
    }
}

/// Builder for [`ArrayOfNumbersUpdateSketch`]
#[derive(Debug)]
pub struct ArrayOfNumbersUpdateSketchBuilder<V: FixedWidthNumeric> {
    num_values: u8,
    inner: crate::tuple::UpdateTupleSketchBuilder<VectorSummaryFactory<V>>,
}

impl<V: FixedWidthNumeric> ArrayOfNumbersUpdateSketchBuilder<V> {
    /// Set lg_k (log2 of nominal size k).
    ///
    /// # Panics
    ///
    /// If lg_k is not in range [5, 26]
    pub fn lg_k(mut self, lg_k: u8) -> Self {
        self.inner = self.inner.lg_k(lg_k);
        self
    }

    /// Set resize factor.
    pub fn resize_factor(mut self, factor: ResizeFactor) -> Self {
        self.inner = self.inner.resize_factor(factor);
        self
    }

    /// Set sampling probability p.
    ///
    /// # Panics
    ///
    /// Panics if p is not in range (0.0, 1.0]
    pub fn sampling_probability(mut self, probability: f32) -> Self {
        self.inner = self.inner.sampling_probability(probability);
        self
    }

    /// Set hash seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.inner = self.inner.seed(seed);
        self
    }

    /// Build the sketch.
    pub fn build(self) -> ArrayOfNumbersUpdateSketch<V> {
        ArrayOfNumbersUpdateSketch {
            inner: self.inner.build(),
            num_values: self.num_values,
        }
    }
}

/// A compact, immutable array-of-numbers sketch.
///
/// Serializes to the dedicated array-of-numbers wire format with a 16-byte
/// header; the `aod_*` reference images of the peer implementations decode
/// into this type (with `V = f64`).
#[derive(Debug, Clone)]
pub struct ArrayOfNumbersCompactSketch<V: FixedWidthNumeric> {
    pub(crate) inner: CompactTupleSketch<VectorSummary<V>>,
    pub(crate) num_values: u8,
}

impl<V: FixedWidthNumeric> ArrayOfNumbersCompactSketch<V> {
    /// Return the number of values carried per key.
    pub fn num_values(&self) -> u8 {
        self.num_values
    }

    /// Check if the sketch is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Check if the retained entries are sorted by hash
    pub fn is_ordered(&self) -> bool {
        self.inner.is_ordered()
    }

    /// Get the estimated number of distinct keys
    pub fn estimate(&self) -> f64 {
        self.inner.estimate()
    }

    /// Return theta as a fraction (0.0 to 1.0)
    pub fn theta(&self) -> f64 {
        self.inner.theta()
    }

    /// Check if sketch is in estimation mode
    pub fn is_estimation_mode(&self) -> bool {
        self.inner.is_estimation_mode()
    }

    /// Return number of retained entries
    pub fn num_retained(&self) -> usize {
        TupleSketchView::num_retained(&self.inner)
    }

    /// Returns the approximate lower error bound given the specified number
    /// of standard deviations.
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.inner.lower_bound(num_std_dev)
    }

    /// Returns the approximate upper error bound given the specified number
    /// of standard deviations.
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        self.inner.upper_bound(num_std_dev)
    }

    /// Return iterator over `(hash, values)` entries
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[V])> + '_ {
        self.inner.iter().map(|(hash, summary)| (hash, summary.values()))
    }

    /// Serialize the sketch to bytes in the array-of-numbers format.
    pub fn serialize(&self) -> Vec<u8> {
        let num_entries = self.num_retained();
        let has_entries = num_entries > 0;

        let mut flags = 0u8;
        if self.is_empty() {
            flags |= AON_FLAG_IS_EMPTY;
        }
        if has_entries {
            flags |= AON_FLAG_HAS_ENTRIES;
        }
        if self.is_ordered() {
            flags |= AON_FLAG_IS_ORDERED;
        }

        let header_bytes = 16;
        let entries_bytes = if has_entries {
            8 + num_entries * (8 + self.num_values as usize * V::SIZE_BYTES)
        } else {
            0
        };
        let mut bytes = SketchBytes::with_capacity(header_bytes + entries_bytes);

        bytes.write_u8(AON_PREAMBLE_LONGS);
        bytes.write_u8(AON_SERIAL_VERSION);
        bytes.write_u8(TUPLE_FAMILY_ID);
        bytes.write_u8(SKETCH_TYPE_AON_COMPACT);
        bytes.write_u8(flags);
        bytes.write_u8(self.num_values);
        bytes.write_u16_le(TupleSketchView::seed_hash(&self.inner));
        bytes.write_u64_le(TupleSketchView::theta64(&self.inner));

        if has_entries {
            bytes.write_u32_le(num_entries as u32);
            bytes.write_u32_le(0); // reserved
            for (hash, _) in self.inner.iter() {
                bytes.write_u64_le(hash);
            }
            let serde: VectorSummarySerde<V> = VectorSummarySerde::new(self.num_values);
            for (_, summary) in self.inner.iter() {
                serde.serialize_summary(&mut bytes, summary);
            }
        }

        bytes.into_bytes()
    }

    /// Deserialize a sketch from bytes, validating against the default
    /// seed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_seed(bytes, DEFAULT_UPDATE_SEED)
    }

    /// Deserialize a sketch from bytes with a specific seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are truncated, the header does not
    /// describe a compact array-of-numbers sketch, or (when entries are
    /// present) the stored seed fingerprint does not match.
    pub fn deserialize_with_seed(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |_| Error::insufficient_data(tag)
        }

        let mut cursor = SketchSlice::new(bytes);

        let _preamble_longs = cursor.read_u8().map_err(make_error("preamble_longs"))?;
        let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
        let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
        let sketch_type = cursor.read_u8().map_err(make_error("sketch_type"))?;
        let flags = cursor.read_u8().map_err(make_error("flags"))?;
        let num_values = cursor.read_u8().map_err(make_error("num_values"))?;
        let stored_seed_hash = cursor.read_u16_le().map_err(make_error("seed_hash"))?;
        let theta = cursor.read_u64_le().map_err(make_error("theta"))?;

        if family_id != TUPLE_FAMILY_ID {
            return Err(Error::invalid_family(TUPLE_FAMILY_ID, family_id, "Tuple"));
        }
        if sketch_type != SKETCH_TYPE_AON_COMPACT {
            return Err(Error::invalid_sketch_type(
                SKETCH_TYPE_AON_COMPACT,
                sketch_type,
                "ArrayOfNumbersCompact",
            ));
        }
        // Only one version exists for this format; the legacy acceptance of
        // the generic tuple path does not extend here.
        if serial_version != AON_SERIAL_VERSION {
            return Err(Error::unsupported_serial_version(
                AON_SERIAL_VERSION,
                serial_version,
            ));
        }
        if num_values == 0 {
            return Err(Error::deserial("num_values must be in [1, 255], got 0"));
        }

        let is_empty = (flags & AON_FLAG_IS_EMPTY) != 0;
        let has_entries = (flags & AON_FLAG_HAS_ENTRIES) != 0;
        let is_ordered = (flags & AON_FLAG_IS_ORDERED) != 0;

        if has_entries {
            let expected_seed_hash = compute_seed_hash(seed);
            if stored_seed_hash != expected_seed_hash {
                return Err(Error::seed_hash_mismatch(
                    expected_seed_hash,
                    stored_seed_hash,
                ));
            }
        }

        let mut entries: Vec<(u64, VectorSummary<V>)> = Vec::new();
        if has_entries {
            let num_entries = cursor.read_u32_le().map_err(make_error("num_entries"))? as usize;
            let _reserved = cursor.read_u32_le().map_err(make_error("reserved"))?;
            if is_empty && num_entries > 0 {
                return Err(Error::corrupt_input("empty sketch claims entries"));
            }

            let mut hashes = Vec::with_capacity(num_entries);
            for i in 0..num_entries {
                let hash = cursor.read_u64_le().map_err(|_| {
                    Error::insufficient_data(format!(
                        "expected {num_entries} hashes, failed at index {i}"
                    ))
                })?;
                if hash == 0 || hash >= theta {
                    return Err(Error::corrupt_input(format!(
                        "entry hash {hash:#x} out of range at index {i}"
                    )));
                }
                hashes.push(hash);
            }

            let serde: VectorSummarySerde<V> = VectorSummarySerde::new(num_values);
            entries.reserve(num_entries);
            for hash in hashes {
                let summary = serde.deserialize_summary(&mut cursor)?;
                entries.push((hash, summary));
            }
        }

        Ok(Self {
            inner: CompactTupleSketch::from_entries(
                entries,
                theta,
                stored_seed_hash,
                is_empty,
                is_ordered,
            ),
            num_values,
        })
    }
}

impl<V: FixedWidthNumeric> TupleSketchView<VectorSummary<V>> for ArrayOfNumbersCompactSketch<V> {
    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn is_ordered(&self) -> bool {
        self.inner.is_ordered()
    }

    fn theta64(&self) -> u64 {
        TupleSketchView::theta64(&self.inner)
    }

    fn seed_hash(&self) -> u16 {
        TupleSketchView::seed_hash(&self.inner)
    }

    fn num_retained(&self) -> usize {
        TupleSketchView::num_retained(&self.inner)
    }

    fn entries<'a>(&'a self) -> impl Iterator<Item = (u64, &'a VectorSummary<V>)>
    where
        VectorSummary<V>: 'a,
    {
        TupleSketchView::entries(&self.inner)
    }
}

impl<V: FixedWidthNumeric> ArrayOfNumbersSketchView<V> for ArrayOfNumbersCompactSketch<V> {
    fn num_values(&self) -> u8 {
        self.num_values
    }
}
