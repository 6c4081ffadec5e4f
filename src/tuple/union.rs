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

use std::marker::PhantomData;

use crate::common::ResizeFactor;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::compute_seed_hash;
use crate::tuple::CompactTupleSketch;
use crate::tuple::Policy;
use crate::tuple::Summary;
use crate::tuple::TupleSketchView;
use crate::tuple::hash_table::DEFAULT_LG_K;
use crate::tuple::hash_table::MAX_LG_K;
use crate::tuple::hash_table::MIN_LG_K;
use crate::tuple::hash_table::TupleHashTable;

/// Stateful union operator for tuple sketches.
///
/// The union accumulates sketches into a private hash table; when both an
/// operand and the table retain the same hash, the summaries merge through
/// the user's [`Policy`]. [`result`](Self::result) trims the accumulated
/// set to the nominal capacity `k` with a quickselect, the same bounding
/// step the update sketch uses.
///
/// # Examples
///
/// ```
/// use datasketches_tuple::tuple::IntegerSummaryFactory;
/// use datasketches_tuple::tuple::IntegerSummaryMode;
/// use datasketches_tuple::tuple::IntegerSummaryPolicy;
/// use datasketches_tuple::tuple::TupleUnion;
/// use datasketches_tuple::tuple::UpdateTupleSketch;
///
/// let factory = IntegerSummaryFactory::new(IntegerSummaryMode::Sum);
/// let mut a = UpdateTupleSketch::builder(factory).build();
/// let mut b = UpdateTupleSketch::builder(factory).build();
/// a.update_u64(1, &1).unwrap();
/// b.update_u64(2, &1).unwrap();
///
/// let mut union = TupleUnion::builder(IntegerSummaryPolicy).build();
/// union.update(&a).unwrap();
/// union.update(&b).unwrap();
/// assert_eq!(union.result(true).estimate(), 2.0);
/// ```
#[derive(Debug)]
pub struct TupleUnion<S, P> {
    table: TupleHashTable<S>,
    union_theta: u64,
    policy: P,
}

impl<S: Summary, P: Policy<S>> TupleUnion<S, P> {
    /// Create a new builder with the given collision policy.
    pub fn builder(policy: P) -> TupleUnionBuilder<S, P> {
        TupleUnionBuilder {
            lg_k: DEFAULT_LG_K,
            resize_factor: ResizeFactor::X8,
            sampling_probability: 1.0,
            seed: DEFAULT_UPDATE_SEED,
            policy,
            _summary: PhantomData,
        }
    }

    /// Merges a sketch into this union.
    ///
    /// An empty operand is the identity and always succeeds, even when its
    /// seed differs.
    ///
    /// # Errors
    ///
    /// Fails on a seed-hash mismatch or a corrupt operand; the union is
    /// unchanged in that case.
    pub fn update<V: TupleSketchView<S>>(&mut self, sketch: &V) -> Result<(), Error> {
        if sketch.is_empty() {
            return Ok(());
        }
        if sketch.seed_hash() != self.table.seed_hash() {
            return Err(Error::seed_hash_mismatch(
                self.table.seed_hash(),
                sketch.seed_hash(),
            ));
        }

        self.table.set_empty(false);
        self.union_theta = self.union_theta.min(sketch.theta64());

        for (hash, summary) in sketch.entries() {
            if hash < self.union_theta && hash < self.table.theta() {
                let (index, found) = self.table.find(hash)?;
                if found {
                    self.policy.apply(self.table.summary_mut(index), summary);
                } else {
                    self.table.insert(index, hash, summary.clone())?;
                }
            } else if sketch.is_ordered() && hash >= self.union_theta {
                break; // early stop for ordered sketches
            }
        }

        // Table rebuilds may have lowered theta further.
        self.union_theta = self.union_theta.min(self.table.theta());
        Ok(())
    }

    /// Returns the union result as a compact tuple sketch.
    ///
    /// Entries at or above the union theta are dropped; if more than `k`
    /// survive, the `k` smallest are kept and theta drops to the next
    /// hash, exactly as in an update sketch rebuild.
    pub fn result(&self, ordered: bool) -> CompactTupleSketch<S> {
        if self.table.is_empty() {
            return CompactTupleSketch::from_entries(
                Vec::new(),
                self.union_theta,
                self.table.seed_hash(),
                true,
                true,
            );
        }

        let mut theta = self.union_theta.min(self.table.theta());
        let mut entries: Vec<(u64, S)> = self
            .table
            .iter()
            .filter(|&(hash, _)| hash < theta)
            .map(|(hash, summary)| (hash, summary.clone()))
            .collect();

        let k = 1usize << self.table.lg_nom_size();
        if entries.len() > k {
            entries.select_nth_unstable_by_key(k, |&(hash, _)| hash);
            theta = entries[k].0;
            entries.truncate(k);
        }

        CompactTupleSketch::from_entries(entries, theta, self.table.seed_hash(), false, ordered)
    }

    /// Resets the union to its initial empty state.
    pub fn reset(&mut self) {
        self.table.reset();
        self.union_theta = self.table.theta();
    }
}

/// Builder for [`TupleUnion`]
#[derive(Debug)]
pub struct TupleUnionBuilder<S, P> {
    lg_k: u8,
    resize_factor: ResizeFactor,
    sampling_probability: f32,
    seed: u64,
    policy: P,
    _summary: PhantomData<S>,
}

impl<S: Summary, P: Policy<S>> TupleUnionBuilder<S, P> {
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

    /// Build the union.
    ///
    /// # Panics
    ///
    /// Panics if the seed hashes to a zero fingerprint.
    pub fn build(self) -> TupleUnion<S, P> {
        let _ = compute_seed_hash(self.seed);
        let table = TupleHashTable::new(
            self.lg_k,
            self.resize_factor,
            self.sampling_probability,
            self.seed,
        );
        let union_theta = table.theta();
        TupleUnion {
            table,
            union_theta,
            policy: self.policy,
        }
    }
}
