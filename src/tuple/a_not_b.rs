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

use std::collections::HashSet;

use crate::common::ResizeFactor;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::compute_seed_hash;
use crate::tuple::CompactTupleSketch;
use crate::tuple::Summary;
use crate::tuple::TupleSketchView;
use crate::tuple::hash_table::REBUILD_THRESHOLD;
use crate::tuple::hash_table::TupleHashTable;

/// Computes the set difference `A \ B` with the default seed.
///
/// The result keeps A's summaries for the surviving keys; B's summaries
/// only decide membership. See [`a_not_b_with_seed`].
pub fn a_not_b<S, A, B>(a: &A, b: &B, ordered: bool) -> Result<CompactTupleSketch<S>, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
{
    a_not_b_with_seed(a, b, ordered, DEFAULT_UPDATE_SEED)
}

/// Computes the set difference `A \ B`.
///
/// When both operands are ordered, B is collected into a transient hash
/// set and A is scanned in order; otherwise B's hashes are probed through
/// a temporary theta-bounded table sized from its retained count. Either
/// way the scan stops early at the first out-of-theta hash of an ordered
/// operand.
///
/// # Errors
///
/// Fails if either non-empty operand was hashed under a different seed.
pub fn a_not_b_with_seed<S, A, B>(
    a: &A,
    b: &B,
    ordered: bool,
    seed: u64,
) -> Result<CompactTupleSketch<S>, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
{
    // An empty A wins regardless of B.
    if a.is_empty() {
        return Ok(CompactTupleSketch::from_entries(
            Vec::new(),
            a.theta64(),
            a.seed_hash(),
            true,
            true,
        ));
    }
    // An empty B leaves A untouched.
    if b.is_empty() {
        let entries: Vec<(u64, S)> = a
            .entries()
            .map(|(hash, summary)| (hash, summary.clone()))
            .collect();
        return Ok(CompactTupleSketch::from_entries(
            entries,
            a.theta64(),
            a.seed_hash(),
            false,
            ordered || a.is_ordered(),
        ));
    }

    let expected_seed_hash = compute_seed_hash(seed);
    if a.seed_hash() != expected_seed_hash {
        return Err(Error::seed_hash_mismatch(expected_seed_hash, a.seed_hash()));
    }
    if b.seed_hash() != expected_seed_hash {
        return Err(Error::seed_hash_mismatch(expected_seed_hash, b.seed_hash()));
    }

    let theta = a.theta64().min(b.theta64());
    let mut entries: Vec<(u64, S)> = Vec::new();

    if a.is_ordered() && b.is_ordered() {
        // Sort-based path: scan A in order against a set of B's hashes.
        let b_hashes: HashSet<u64> = b.entries().map(|(hash, _)| hash).collect();
        for (hash, summary) in a.entries() {
            if hash >= theta {
                break;
            }
            if !b_hashes.contains(&hash) {
                entries.push((hash, summary.clone()));
            }
        }
    } else {
        // Probe-based path: load B's in-range hashes into a temporary table.
        let lg_size = TupleHashTable::<S>::lg_size_from_count_for_rebuild(
            b.num_retained(),
            REBUILD_THRESHOLD,
        );
        let mut b_table: TupleHashTable<()> = TupleHashTable::from_raw_parts(
            lg_size,
            lg_size - 1,
            ResizeFactor::X1,
            1.0,
            theta,
            seed,
            false,
        );
        for (hash, _) in b.entries() {
            if hash < theta {
                let (index, found) = b_table.find(hash)?;
                if !found {
                    b_table.insert(index, hash, ())?;
                }
            } else if b.is_ordered() {
                break;
            }
        }
        for (hash, summary) in a.entries() {
            if hash < theta {
                if !b_table.contains(hash) {
                    entries.push((hash, summary.clone()));
                }
            } else if a.is_ordered() {
                break;
            }
        }
    }

    let is_empty = entries.is_empty() && theta == crate::tuple::hash_table::MAX_THETA;
    Ok(CompactTupleSketch::from_entries(
        entries,
        theta,
        expected_seed_hash,
        is_empty,
        ordered || a.is_ordered(),
    ))
}
