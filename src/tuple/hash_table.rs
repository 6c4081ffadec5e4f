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

use crate::common::ResizeFactor;
use crate::error::Error;
use crate::hash::compute_seed_hash;

/// Maximum theta value (signed max for compatibility with Java)
pub const MAX_THETA: u64 = i64::MAX as u64;

/// Minimum log2 of K
pub const MIN_LG_K: u8 = 5;

/// Maximum log2 of K
pub const MAX_LG_K: u8 = 26;

/// Default log2 of K
pub const DEFAULT_LG_K: u8 = 12;

/// Resize threshold (0.5 = 50% load factor)
const RESIZE_THRESHOLD: f64 = 0.5;

/// Rebuild threshold (15/16 = 93.75% load factor)
pub(crate) const REBUILD_THRESHOLD: f64 = 15.0 / 16.0;

/// Theta-bounded hash table for tuple sketches.
///
/// Open-addressed and linear-probed, the table stores a hash and its summary
/// in parallel arrays with `hash == 0` marking an empty slot. Capacity grows
/// toward `2^(lg_nom_size + 1)`:
/// * Before it reaches the max capacity, the array extends geometrically by
///   `resize_factor` at a 1/2 load factor.
/// * At max capacity, exceeding the 15/16 load factor triggers a quickselect
///   rebuild: only the smallest `2^lg_nom_size` entries are kept and theta
///   drops to the k-th smallest hash.
#[derive(Debug)]
pub(crate) struct TupleHashTable<S> {
    lg_cur_size: u8,
    lg_nom_size: u8,
    lg_max_size: u8,
    resize_factor: ResizeFactor,
    sampling_probability: f32,
    hash_seed: u64,

    // Logical emptiness of the source set. This can be false even when
    // `num_retained` is 0 (e.g. all updates screened by theta).
    is_empty: bool,

    theta: u64,

    hashes: Vec<u64>,
    summaries: Vec<Option<S>>,

    // Number of retained non-zero hashes currently stored.
    num_retained: usize,
}

impl<S> TupleHashTable<S> {
    /// Create a new hash table
    pub fn new(
        lg_nom_size: u8,
        resize_factor: ResizeFactor,
        sampling_probability: f32,
        hash_seed: u64,
    ) -> Self {
        let lg_max_size = lg_nom_size + 1;
        let lg_cur_size = starting_sub_multiple(lg_max_size, MIN_LG_K, resize_factor.lg_value());
        Self::from_raw_parts(
            lg_cur_size,
            lg_nom_size,
            resize_factor,
            sampling_probability,
            starting_theta_from_sampling_probability(sampling_probability),
            hash_seed,
            true,
        )
    }

    /// Create a table with explicit state.
    ///
    /// `lg_cur_size == 0` produces a zero-capacity table, used by set
    /// operators before their first copy.
    ///
    /// # Panics
    ///
    /// Panics if `lg_cur_size > lg_nom_size + 1`.
    pub fn from_raw_parts(
        lg_cur_size: u8,
        lg_nom_size: u8,
        resize_factor: ResizeFactor,
        sampling_probability: f32,
        theta: u64,
        hash_seed: u64,
        is_empty: bool,
    ) -> Self {
        let lg_max_size = lg_nom_size + 1;
        assert!(
            lg_cur_size <= lg_max_size,
            "lg_cur_size must be <= lg_nom_size + 1, got lg_cur_size={lg_cur_size}, lg_nom_size={lg_nom_size}"
        );
        let size = if lg_cur_size > 0 { 1 << lg_cur_size } else { 0 };
        Self {
            lg_cur_size,
            lg_nom_size,
            lg_max_size,
            resize_factor,
            sampling_probability,
            hash_seed,
            is_empty,
            theta,
            hashes: vec![0u64; size],
            summaries: (0..size).map(|_| None).collect(),
            num_retained: 0,
        }
    }

    /// Smallest table lg_size whose rebuild-threshold capacity holds `count`
    /// entries, used to size set-operation result tables.
    pub fn lg_size_from_count_for_rebuild(count: usize, threshold: f64) -> u8 {
        let mut lg_size = MIN_LG_K;
        while (((1usize << lg_size) as f64 * threshold) as usize) < count {
            lg_size += 1;
        }
        lg_size
    }

    /// Marks the source set non-empty and screens a hash against theta.
    ///
    /// Returns false if the hash must be dropped (empty sentinel or out of
    /// the sampling range).
    pub fn screen(&mut self, hash: u64) -> bool {
        self.is_empty = false;
        hash != 0 && hash < self.theta
    }

    /// Find the slot for a hash.
    ///
    /// Returns the slot index and whether the hash is already present (an
    /// absent hash lands on the empty slot where it would be inserted).
    ///
    /// # Errors
    ///
    /// Fails if probing wraps around without finding the hash or an empty
    /// slot, which indicates a corrupt input or a structural bug.
    pub fn find(&self, hash: u64) -> Result<(usize, bool), Error> {
        match Self::find_slot(&self.hashes, self.lg_cur_size, hash) {
            Some(index) => Ok((index, self.hashes[index] == hash)),
            None => Err(Error::corrupt_input(
                "hash table probing failed to find a slot",
            )),
        }
    }

    /// Returns whether the table holds the given hash.
    pub fn contains(&self, hash: u64) -> bool {
        Self::find_slot(&self.hashes, self.lg_cur_size, hash)
            .is_some_and(|index| self.hashes[index] == hash)
    }

    /// Find the slot index for a hash in a given slot array.
    ///
    /// Probing starts from the high bits of the hash and steps linearly; it
    /// terminates at an empty slot or a slot containing the hash. Returns
    /// None if the table is zero-capacity or probing wrapped around.
    fn find_slot(hashes: &[u64], lg_size: u8, hash: u64) -> Option<usize> {
        if hashes.is_empty() {
            return None;
        }
        let mask = hashes.len() - 1;
        let mut index = ((hash >> (64 - lg_size)) as usize) & mask;
        let loop_index = index;
        loop {
            let probe = hashes[index];
            if probe == 0 || probe == hash {
                return Some(index);
            }
            index = (index + 1) & mask;
            if index == loop_index {
                return None;
            }
        }
    }

    /// Inserts an entry at the empty slot a prior [`find`](Self::find)
    /// returned, then resizes or rebuilds if the load threshold is exceeded.
    pub fn insert(&mut self, index: usize, hash: u64, summary: S) -> Result<(), Error> {
        debug_assert_eq!(self.hashes[index], 0, "insert slot must be empty");
        self.hashes[index] = hash;
        self.summaries[index] = Some(summary);
        self.num_retained += 1;

        if self.num_retained > self.capacity() {
            if self.lg_cur_size <= self.lg_nom_size {
                self.resize()?;
            } else {
                self.rebuild()?;
            }
        }
        Ok(())
    }

    /// Returns the summary stored at an occupied slot.
    pub fn summary(&self, index: usize) -> &S {
        debug_assert_ne!(self.hashes[index], 0);
        self.summaries[index]
            .as_ref()
            .expect("occupied slot carries a summary")
    }

    /// Returns the mutable summary stored at an occupied slot.
    pub fn summary_mut(&mut self, index: usize) -> &mut S {
        debug_assert_ne!(self.hashes[index], 0);
        self.summaries[index]
            .as_mut()
            .expect("occupied slot carries a summary")
    }

    /// Get capacity threshold
    fn capacity(&self) -> usize {
        let fraction = if self.lg_cur_size <= self.lg_nom_size {
            RESIZE_THRESHOLD
        } else {
            REBUILD_THRESHOLD
        };
        (fraction * self.hashes.len() as f64) as usize
    }

    /// Resize the hash table
    fn resize(&mut self) -> Result<(), Error> {
        let new_lg_size = std::cmp::min(
            self.lg_cur_size + self.resize_factor.lg_value(),
            self.lg_max_size,
        );
        let new_size = 1usize << new_lg_size;

        let mut new_hashes = vec![0u64; new_size];
        let mut new_summaries: Vec<Option<S>> = (0..new_size).map(|_| None).collect();
        for i in 0..self.hashes.len() {
            let hash = self.hashes[i];
            if hash != 0 {
                let index = Self::find_slot(&new_hashes, new_lg_size, hash).ok_or_else(|| {
                    Error::corrupt_input("no empty slot while resizing hash table")
                })?;
                new_hashes[index] = hash;
                new_summaries[index] = self.summaries[i].take();
            }
        }

        self.hashes = new_hashes;
        self.summaries = new_summaries;
        self.lg_cur_size = new_lg_size;
        Ok(())
    }

    /// Rebuild the hash table:
    /// The number of entries is reduced to the nominal size k and theta
    /// drops to the k-th smallest hash.
    fn rebuild(&mut self) -> Result<(), Error> {
        let k = 1usize << self.lg_nom_size;
        let mut entries: Vec<(u64, S)> = Vec::with_capacity(self.num_retained);
        for i in 0..self.hashes.len() {
            if self.hashes[i] != 0 {
                let summary = self.summaries[i]
                    .take()
                    .expect("occupied slot carries a summary");
                entries.push((self.hashes[i], summary));
            }
        }
        debug_assert!(entries.len() > k);

        // Select the k-th smallest entry as new theta and keep the lesser
        // entries.
        entries.select_nth_unstable_by_key(k, |&(hash, _)| hash);
        self.theta = entries[k].0;
        entries.truncate(k);

        let size = 1usize << self.lg_cur_size;
        self.hashes = vec![0u64; size];
        self.summaries = (0..size).map(|_| None).collect();
        self.num_retained = 0;
        for (hash, summary) in entries {
            let index = Self::find_slot(&self.hashes, self.lg_cur_size, hash)
                .ok_or_else(|| Error::corrupt_input("no empty slot while rebuilding hash table"))?;
            self.hashes[index] = hash;
            self.summaries[index] = Some(summary);
            self.num_retained += 1;
        }

        debug_assert_eq!(self.num_retained, k);
        Ok(())
    }

    /// Trim the table to nominal size k
    pub fn trim(&mut self) -> Result<(), Error> {
        if self.num_retained > (1 << self.lg_nom_size) {
            self.rebuild()?;
        }
        Ok(())
    }

    /// Reset the table to empty state
    pub fn reset(&mut self) {
        let init_theta = starting_theta_from_sampling_probability(self.sampling_probability);
        let init_lg_cur = starting_sub_multiple(
            self.lg_nom_size + 1,
            MIN_LG_K,
            self.resize_factor.lg_value(),
        );

        let size = 1usize << init_lg_cur;
        self.hashes = vec![0u64; size];
        self.summaries = (0..size).map(|_| None).collect();
        self.num_retained = 0;
        self.theta = init_theta;
        self.is_empty = true;
        self.lg_cur_size = init_lg_cur;
    }

    /// Return number of retained entries
    pub fn num_retained(&self) -> usize {
        self.num_retained
    }

    /// Get theta
    pub fn theta(&self) -> u64 {
        self.theta
    }

    /// Set theta
    pub fn set_theta(&mut self, theta: u64) {
        self.theta = theta;
    }

    /// Check emptiness of the source set
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Set emptiness of the source set
    pub fn set_empty(&mut self, is_empty: bool) {
        self.is_empty = is_empty;
    }

    /// Get iterator over occupied entries
    pub fn iter(&self) -> impl Iterator<Item = (u64, &S)> + '_ {
        self.hashes
            .iter()
            .zip(self.summaries.iter())
            .filter(|&(&hash, _)| hash != 0)
            .map(|(&hash, summary)| {
                (
                    hash,
                    summary.as_ref().expect("occupied slot carries a summary"),
                )
            })
    }

    /// Consumes the table into its occupied entries, in slot order.
    pub fn into_entries(self) -> Vec<(u64, S)> {
        self.hashes
            .into_iter()
            .zip(self.summaries)
            .filter(|&(hash, _)| hash != 0)
            .map(|(hash, summary)| {
                (
                    hash,
                    summary.expect("occupied slot carries a summary"),
                )
            })
            .collect()
    }

    /// Get log2 of nominal size
    pub fn lg_nom_size(&self) -> u8 {
        self.lg_nom_size
    }

    /// Get the seed used to hash the input.
    pub fn hash_seed(&self) -> u64 {
        self.hash_seed
    }

    /// Get the hash of the seed that was used to hash the input.
    pub fn seed_hash(&self) -> u16 {
        compute_seed_hash(self.hash_seed)
    }
}

/// Compute initial lg_size for hash table based on target lg_size, minimum
/// lg_size, and resize factor. Make sure `lg_target = lg_init + n *
/// lg_resize_factor`, where `n` is an integer and `lg_init >= lg_min`
fn starting_sub_multiple(lg_target: u8, lg_min: u8, lg_resize_factor: u8) -> u8 {
    if lg_target <= lg_min {
        lg_min
    } else if lg_resize_factor == 0 {
        lg_target
    } else {
        ((lg_target - lg_min) % lg_resize_factor) + lg_min
    }
}

/// Compute initial theta for hash table based on sampling probability.
pub(crate) fn starting_theta_from_sampling_probability(sampling_probability: f32) -> u64 {
    if sampling_probability < 1.0 {
        (MAX_THETA as f64 * sampling_probability as f64) as u64
    } else {
        MAX_THETA
    }
}
