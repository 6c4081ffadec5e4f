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

//! Update Tuple sketch implementation
//!
//! This module provides the mutable sketch that ingests a stream of
//! `(key, value)` pairs, hashing keys and folding values into per-key
//! summaries.

use crate::common::NumStdDev;
use crate::common::ResizeFactor;
use crate::common::binomial_bounds;
use crate::common::canonical_double;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::compute_hash;
use crate::hash::compute_seed_hash;
use crate::tuple::CompactTupleSketch;
use crate::tuple::Summary;
use crate::tuple::SummaryFactory;
use crate::tuple::TupleSketchView;
use crate::tuple::hash_table::DEFAULT_LG_K;
use crate::tuple::hash_table::MAX_LG_K;
use crate::tuple::hash_table::MAX_THETA;
use crate::tuple::hash_table::MIN_LG_K;
use crate::tuple::hash_table::TupleHashTable;

type InputOf<F> = <<F as SummaryFactory>::Summary as Summary>::Input;

/// Mutable tuple sketch for building from a stream of keyed updates.
///
/// Every update hashes the key, screens the hash against theta, and folds
/// the value into the key's summary; a fresh summary comes from the
/// factory when the key is seen for the first time.
///
/// # Examples
///
/// ```
/// use datasketches_tuple::tuple::IntegerSummaryFactory;
/// use datasketches_tuple::tuple::IntegerSummaryMode;
/// use datasketches_tuple::tuple::UpdateTupleSketch;
///
/// let factory = IntegerSummaryFactory::new(IntegerSummaryMode::Sum);
/// let mut sketch = UpdateTupleSketch::builder(factory).build();
/// sketch.update_u64(1, &10).unwrap();
/// sketch.update_u64(1, &5).unwrap();
/// assert_eq!(sketch.estimate(), 1.0);
/// let (_, summary) = sketch.iter().next().unwrap();
/// assert_eq!(summary.value(), 15);
/// ```
#[derive(Debug)]
pub struct UpdateTupleSketch<F: SummaryFactory> {
    table: TupleHashTable<F::Summary>,
    factory: F,
}

impl<F: SummaryFactory> UpdateTupleSketch<F> {
    /// Create a new builder with the given summary factory.
    pub fn builder(factory: F) -> UpdateTupleSketchBuilder<F> {
        UpdateTupleSketchBuilder {
            lg_k: DEFAULT_LG_K,
            resize_factor: ResizeFactor::X8,
            sampling_probability: 1.0,
            seed: DEFAULT_UPDATE_SEED,
            factory,
        }
    }

    /// Update the sketch with an unsigned 64-bit key.
    ///
    /// # Errors
    ///
    /// Fails only on hash table corruption.
    pub fn update_u64(&mut self, key: u64, value: &InputOf<F>) -> Result<(), Error> {
        self.update_encoded(&key.to_le_bytes(), value)
    }

    /// Update the sketch with a signed 64-bit key.
    pub fn update_i64(&mut self, key: i64, value: &InputOf<F>) -> Result<(), Error> {
        self.update_encoded(&key.to_le_bytes(), value)
    }

    /// Update the sketch with an unsigned 32-bit key.
    pub fn update_u32(&mut self, key: u32, value: &InputOf<F>) -> Result<(), Error> {
        self.update_i64(i64::from(key), value)
    }

    /// Update the sketch with a signed 32-bit key.
    pub fn update_i32(&mut self, key: i32, value: &InputOf<F>) -> Result<(), Error> {
        self.update_i64(i64::from(key), value)
    }

    /// Update the sketch with an unsigned 16-bit key.
    pub fn update_u16(&mut self, key: u16, value: &InputOf<F>) -> Result<(), Error> {
        self.update_i64(i64::from(key), value)
    }

    /// Update the sketch with a signed 16-bit key.
    pub fn update_i16(&mut self, key: i16, value: &InputOf<F>) -> Result<(), Error> {
        self.update_i64(i64::from(key), value)
    }

    /// Update the sketch with an unsigned 8-bit key.
    pub fn update_u8(&mut self, key: u8, value: &InputOf<F>) -> Result<(), Error> {
        self.update_i64(i64::from(key), value)
    }

    /// Update the sketch with a signed 8-bit key.
    pub fn update_i8(&mut self, key: i8, value: &InputOf<F>) -> Result<(), Error> {
        self.update_i64(i64::from(key), value)
    }

    /// Update the sketch with a 64-bit floating-point key.
    ///
    /// The key is canonicalized for compatibility with the Java
    /// implementation: `-0.0` counts as `0.0` and every NaN bit pattern
    /// counts as the same key.
    pub fn update_f64(&mut self, key: f64, value: &InputOf<F>) -> Result<(), Error> {
        let canonical = canonical_double(key);
        self.update_encoded(&canonical.to_bits().to_le_bytes(), value)
    }

    /// Update the sketch with a 32-bit floating-point key.
    pub fn update_f32(&mut self, key: f32, value: &InputOf<F>) -> Result<(), Error> {
        self.update_f64(f64::from(key), value)
    }

    /// Update the sketch with a string key, hashed from its UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Fails if the key is the empty string.
    pub fn update_str(&mut self, key: &str, value: &InputOf<F>) -> Result<(), Error> {
        if key.is_empty() {
            return Err(Error::invalid_argument(
                "empty string is not a valid update key",
            ));
        }
        self.update_encoded(key.as_bytes(), value)
    }

    /// Update the sketch with a raw byte key.
    ///
    /// # Errors
    ///
    /// Fails if the key is the empty slice.
    pub fn update_bytes(&mut self, key: &[u8], value: &InputOf<F>) -> Result<(), Error> {
        if key.is_empty() {
            return Err(Error::invalid_argument(
                "empty byte slice is not a valid update key",
            ));
        }
        self.update_encoded(key, value)
    }

    fn update_encoded(&mut self, key_bytes: &[u8], value: &InputOf<F>) -> Result<(), Error> {
        let hash = compute_hash(key_bytes, self.table.hash_seed());
        if !self.table.screen(hash) {
            return Ok(());
        }
        let (index, found) = self.table.find(hash)?;
        if found {
            self.table.summary_mut(index).update(value);
        } else {
            let mut summary = self.factory.new_summary();
            summary.update(value);
            self.table.insert(index, hash, summary)?;
        }
        Ok(())
    }

    /// Return cardinality estimate
    pub fn estimate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let num_retained = self.table.num_retained() as f64;
        num_retained / self.theta()
    }

    /// Return theta as a fraction (0.0 to 1.0)
    pub fn theta(&self) -> f64 {
        self.table.theta() as f64 / MAX_THETA as f64
    }

    /// Return theta as a 64-bit value
    pub fn theta64(&self) -> u64 {
        self.table.theta()
    }

    /// Check if sketch is empty
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Check if sketch is in estimation mode
    pub fn is_estimation_mode(&self) -> bool {
        self.table.theta() < MAX_THETA
    }

    /// Return number of retained entries
    pub fn num_retained(&self) -> usize {
        self.table.num_retained()
    }

    /// Return the 16-bit fingerprint of the seed this sketch hashes with
    pub fn seed_hash(&self) -> u16 {
        self.table.seed_hash()
    }

    /// Return lg_k
    pub fn lg_k(&self) -> u8 {
        self.table.lg_nom_size()
    }

    /// Returns the approximate lower error bound given the specified number
    /// of standard deviations.
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        if !self.is_estimation_mode() {
            return self.num_retained() as f64;
        }
        // sampling_probability is > 0, so theta is always > 0 and the
        // bounds computation cannot fail
        binomial_bounds::lower_bound(self.num_retained() as u64, self.theta(), num_std_dev)
            .expect("theta should always be valid")
    }

    /// Returns the approximate upper error bound given the specified number
    /// of standard deviations.
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        if !self.is_estimation_mode() {
            return self.num_retained() as f64;
        }
        binomial_bounds::upper_bound(
            self.num_retained() as u64,
            self.theta(),
            num_std_dev,
            self.is_empty(),
        )
        .expect("theta should always be valid")
    }

    /// Return iterator over `(hash, summary)` entries
    pub fn iter(&self) -> impl Iterator<Item = (u64, &F::Summary)> + '_ {
        self.table.iter()
    }

    /// Returns an immutable snapshot of this sketch, cloning the retained
    /// entries.
    ///
    /// The entries are sorted by hash iff `ordered` is requested; empty and
    /// single-entry snapshots are always ordered.
    pub fn compact(&self, ordered: bool) -> CompactTupleSketch<F::Summary> {
        let entries: Vec<(u64, F::Summary)> = self
            .table
            .iter()
            .map(|(hash, summary)| (hash, summary.clone()))
            .collect();
        CompactTupleSketch::from_entries(
            entries,
            self.table.theta(),
            self.table.seed_hash(),
            self.table.is_empty(),
            ordered,
        )
    }

    /// Consumes this sketch into an immutable snapshot, moving the retained
    /// entries instead of cloning them.
    pub fn into_compact(self, ordered: bool) -> CompactTupleSketch<F::Summary> {
        let theta = self.table.theta();
        let seed_hash = self.table.seed_hash();
        let is_empty = self.table.is_empty();
        CompactTupleSketch::from_entries(
            self.table.into_entries(),
            theta,
            seed_hash,
            is_empty,
            ordered,
        )
    }

    /// Trim the sketch to nominal size k, lowering theta if entries must be
    /// discarded.
    pub fn trim(&mut self) -> Result<(), Error> {
        self.table.trim()
    }

    /// Reset the sketch to its initial empty state.
    pub fn reset(&mut self) {
        self.table.reset();
    }
}

impl<F: SummaryFactory> TupleSketchView<F::Summary> for UpdateTupleSketch<F> {
    fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn is_ordered(&self) -> bool {
        // Entries sit in probe order; only trivial sketches are ordered.
        self.table.num_retained() <= 1
    }

    fn theta64(&self) -> u64 {
        self.table.theta()
    }

    fn seed_hash(&self) -> u16 {
        self.table.seed_hash()
    }

    fn num_retained(&self) -> usize {
        self.table.num_retained()
    }

    fn entries<'a>(&'a self) -> impl Iterator<Item = (u64, &'a F::Summary)>
    where
        F::Summary: 'a,
    {
        self.table.iter()
    }
}

/// Builder for [`UpdateTupleSketch`]
#[derive(Debug)]
pub struct UpdateTupleSketchBuilder<F> {
    lg_k: u8,
    resize_factor: ResizeFactor,
    sampling_probability: f32,
    seed: u64,
    factory: F,
}

impl<F: SummaryFactory> UpdateTupleSketchBuilder<F> {
    /// Set lg_k (log2 of nominal size k).
    ///
    /// # Panics
    ///
    /// If lg_k is not in range [5, 26]
    pub fn lg_k(mut self, lg_k: u8) -> Self {
        assert!(
            (MIN_LG_K..=MAX_LG_K).contains(&lg_k),
            "lg_k must be in [{}, {}], got {}",
            MIN_LG_K,
            MAX_LG_K,
            lg_k
        );
        self.lg_k = lg_k;
        self
    }

    /// Set resize factor.
    pub fn resize_factor(mut self, factor: ResizeFactor) -> Self {
        self.resize_factor = factor;
        self
    }

    /// Set sampling probability p.
    ///
    /// The sampling probability controls the fraction of hashed keys that
    /// are retained. Must be greater than 0 to keep theta valid for bound
    /// calculations.
    ///
    /// # Panics
    ///
    /// Panics if p is not in range (0.0, 1.0]
    pub fn sampling_probability(mut self, probability: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability) && probability > 0.0,
            "sampling_probability must be in (0.0, 1.0], got {probability}"
        );
        self.sampling_probability = probability;
        self
    }

    /// Set hash seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the sketch.
    ///
    /// # Panics
    ///
    /// Panics if the seed hashes to a zero fingerprint; such a seed cannot
    /// be used.
    pub fn build(self) -> UpdateTupleSketch<F> {
        // Fail fast on a seed that cannot be fingerprinted.
        let _ = compute_seed_hash(self.seed);
        let table = TupleHashTable::new(
            self.lg_k,
            self.resize_factor,
            self.sampling_probability,
            self.seed,
        );
        UpdateTupleSketch {
            table,
            factory: self.factory,
        }
    }
}
