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
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::tuple::CompactTupleSketch;
use crate::tuple::Policy;
use crate::tuple::Summary;
use crate::tuple::TupleSketchView;
use crate::tuple::hash_table::MAX_THETA;
use crate::tuple::hash_table::REBUILD_THRESHOLD;
use crate::tuple::hash_table::TupleHashTable;

/// Stateful intersection operator for tuple sketches.
///
/// The intersection starts from the conceptual "universe" set; every update
/// narrows the current set to the overlap with the operand, merging the
/// colliding summaries through the user's [`Policy`]. Before the first
/// [`update`](Self::update) the result is undefined; use
/// [`has_result`](Self::has_result) to check.
#[derive(Debug)]
pub struct TupleIntersection<S, P> {
    is_valid: bool,
    table: TupleHashTable<S>,
    policy: P,
}

impl<S: Summary, P: Policy<S>> TupleIntersection<S, P> {
    /// Creates a new intersection operator for the given `seed`.
    pub fn new(policy: P, seed: u64) -> Self {
        Self {
            is_valid: false,
            table: TupleHashTable::from_raw_parts(
                0,
                0,
                ResizeFactor::X1,
                1.0,
                MAX_THETA,
                seed,
                false,
            ),
            policy,
        }
    }

    /// Creates a new intersection operator with the default seed.
    pub fn new_with_default_seed(policy: P) -> Self {
        Self::new(policy, DEFAULT_UPDATE_SEED)
    }

    /// Narrows the intersection with a given sketch.
    ///
    /// # Errors
    ///
    /// Fails on a seed-hash mismatch with a non-empty operand, or when the
    /// operand is internally inconsistent (duplicate hashes, entry counts
    /// that do not match its claimed size).
    pub fn update<V: TupleSketchView<S>>(&mut self, sketch: &V) -> Result<(), Error> {
        let new_default_table = |table: &TupleHashTable<S>| {
            TupleHashTable::from_raw_parts(
                0,
                0,
                ResizeFactor::X1,
                1.0,
                table.theta(),
                table.hash_seed(),
                table.is_empty(),
            )
        };

        // Logical emptiness is terminal.
        if self.table.is_empty() {
            return Ok(());
        }

        if !sketch.is_empty() && sketch.seed_hash() != self.table.seed_hash() {
            return Err(Error::seed_hash_mismatch(
                self.table.seed_hash(),
                sketch.seed_hash(),
            ));
        }

        self.table
            .set_empty(self.table.is_empty() || sketch.is_empty());
        let theta = if self.table.is_empty() {
            MAX_THETA
        } else {
            self.table.theta().min(sketch.theta64())
        };
        self.table.set_theta(theta);

        if self.is_valid && self.table.num_retained() == 0 {
            return Ok(());
        }

        if sketch.num_retained() == 0 {
            self.is_valid = true;
            self.table = new_default_table(&self.table);
            return Ok(());
        }

        if !self.is_valid {
            // First update: copy the incoming entries.
            self.is_valid = true;
            let lg_size = TupleHashTable::<S>::lg_size_from_count_for_rebuild(
                sketch.num_retained(),
                REBUILD_THRESHOLD,
            );
            let mut table = TupleHashTable::from_raw_parts(
                lg_size,
                lg_size - 1,
                ResizeFactor::X1,
                1.0,
                self.table.theta(),
                self.table.hash_seed(),
                self.table.is_empty(),
            );
            for (hash, summary) in sketch.entries() {
                if hash == 0 || hash >= table.theta() {
                    return Err(Error::corrupt_input(format!(
                        "entry hash {hash:#x} out of range while copying input sketch"
                    )));
                }
                let (index, found) = table.find(hash)?;
                if found {
                    return Err(Error::corrupt_input(
                        "duplicate hash while copying input sketch",
                    ));
                }
                table.insert(index, hash, summary.clone())?;
            }
            if table.num_retained() != sketch.num_retained() {
                return Err(Error::corrupt_input(
                    "entry count mismatch while copying input sketch",
                ));
            }
            self.table = table;
        } else {
            // Narrow: the match set becomes the new contents.
            let max_matches = self.table.num_retained().min(sketch.num_retained());
            let mut matched: Vec<(u64, S)> = Vec::with_capacity(max_matches);
            let mut count = 0usize;
            for (hash, summary) in sketch.entries() {
                if hash < self.table.theta() {
                    let (index, found) = self.table.find(hash)?;
                    if found {
                        if matched.len() == max_matches {
                            return Err(Error::corrupt_input(
                                "more matching entries than either operand retains",
                            ));
                        }
                        let mut merged = self.table.summary(index).clone();
                        self.policy.apply(&mut merged, summary);
                        matched.push((hash, merged));
                    }
                } else if sketch.is_ordered() {
                    break; // early stop for ordered sketches
                }
                count += 1;
            }
            if count > sketch.num_retained() {
                return Err(Error::corrupt_input("more entries than expected"));
            } else if !sketch.is_ordered() && count < sketch.num_retained() {
                return Err(Error::corrupt_input("fewer entries than expected"));
            }

            if matched.is_empty() {
                self.table = new_default_table(&self.table);
                if self.table.theta() == MAX_THETA {
                    self.table.set_empty(true);
                }
            } else {
                // Re-pack the match set into a freshly sized table.
                let lg_size = TupleHashTable::<S>::lg_size_from_count_for_rebuild(
                    matched.len(),
                    REBUILD_THRESHOLD,
                );
                let mut table = TupleHashTable::from_raw_parts(
                    lg_size,
                    lg_size - 1,
                    ResizeFactor::X1,
                    1.0,
                    self.table.theta(),
                    self.table.hash_seed(),
                    self.table.is_empty(),
                );
                for (hash, summary) in matched {
                    let (index, found) = table.find(hash)?;
                    if found {
                        return Err(Error::corrupt_input(
                            "duplicate hash while re-packing intersection",
                        ));
                    }
                    table.insert(index, hash, summary)?;
                }
                self.table = table;
            }
        }
        Ok(())
    }

    /// Returns whether this operator has received at least one update.
    pub fn has_result(&self) -> bool {
        self.is_valid
    }

    /// Returns the intersection result as a compact tuple sketch.
    ///
    /// # Errors
    ///
    /// Fails if called before the first [`update`](Self::update).
    pub fn result(&self, ordered: bool) -> Result<CompactTupleSketch<S>, Error> {
        if !self.is_valid {
            return Err(Error::invalid_argument(
                "intersection result requested before any update",
            ));
        }
        let entries: Vec<(u64, S)> = self
            .table
            .iter()
            .map(|(hash, summary)| (hash, summary.clone()))
            .collect();
        Ok(CompactTupleSketch::from_entries(
            entries,
            self.table.theta(),
            self.table.seed_hash(),
            self.table.is_empty(),
            ordered,
        ))
    }
}
