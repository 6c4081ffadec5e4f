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

//! Jaccard similarity of two tuple sketches.
//!
//! `J(A, B) = |A ∩ B| / |A ∪ B|`, reported as a confidence interval. The
//! computation builds a union sized from both operands, then an
//! intersection that is additionally fed the union itself: funneling the
//! intersection through the union guarantees it is a subset sampled at the
//! union's theta, which is what the ratio bounds require. That structure is
//! load-bearing; do not shortcut it.

use crate::common::bounds_on_ratios;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::tuple::CompactTupleSketch;
use crate::tuple::Policy;
use crate::tuple::Summary;
use crate::tuple::TupleIntersection;
use crate::tuple::TupleSketchView;
use crate::tuple::TupleUnion;
use crate::tuple::hash_table::MAX_LG_K;
use crate::tuple::hash_table::MAX_THETA;
use crate::tuple::hash_table::MIN_LG_K;

/// A Jaccard similarity interval: `lower <= estimate <= upper`, all in
/// `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JaccardBounds {
    /// Lower bound of the similarity at roughly two standard deviations.
    pub lower: f64,
    /// Estimate of the similarity.
    pub estimate: f64,
    /// Upper bound of the similarity at roughly two standard deviations.
    pub upper: f64,
}

const ONES: JaccardBounds = JaccardBounds {
    lower: 1.0,
    estimate: 1.0,
    upper: 1.0,
};

const ZEROS: JaccardBounds = JaccardBounds {
    lower: 0.0,
    estimate: 0.0,
    upper: 0.0,
};

/// Computes the Jaccard similarity interval of two sketches built with the
/// default seed.
pub fn jaccard<S, A, B, P>(a: &A, b: &B, policy: &P) -> Result<JaccardBounds, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
    P: Policy<S>,
{
    jaccard_with_seed(a, b, policy, DEFAULT_UPDATE_SEED)
}

/// Computes the Jaccard similarity interval of two sketches.
///
/// Two empty sketches are identical (`(1, 1, 1)`); exactly one empty
/// sketch means disjoint (`(0, 0, 0)`).
///
/// # Errors
///
/// Fails if either non-empty sketch was hashed under a different seed.
pub fn jaccard_with_seed<S, A, B, P>(
    a: &A,
    b: &B,
    policy: &P,
    seed: u64,
) -> Result<JaccardBounds, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
    P: Policy<S>,
{
    if a.is_empty() && b.is_empty() {
        return Ok(ONES);
    }
    if a.is_empty() || b.is_empty() {
        return Ok(ZEROS);
    }

    let count_a = a.num_retained();
    let count_b = b.num_retained();
    let union_ab = unioned(a, b, policy, seed)?;
    let count_u = union_ab.num_retained();

    // Identical sets short-circuit.
    if count_u == count_a
        && count_u == count_b
        && union_ab.theta64() == a.theta64()
        && union_ab.theta64() == b.theta64()
    {
        return Ok(ONES);
    }

    let mut intersection = TupleIntersection::new(policy, seed);
    intersection.update(a)?;
    intersection.update(b)?;
    // Funnel through the union so the intersection is a subset of it.
    intersection.update(&union_ab)?;
    let inter_abu = intersection.result(true)?;

    Ok(JaccardBounds {
        lower: lower_bound_of_b_over_a(&union_ab, &inter_abu)?,
        estimate: estimate_of_b_over_a(&union_ab, &inter_abu)?,
        upper: upper_bound_of_b_over_a(&union_ab, &inter_abu)?,
    })
}

/// Returns true if the lower similarity bound reaches the threshold, i.e.
/// the sketches are similar with high confidence.
pub fn is_similar<S, A, B, P>(a: &A, b: &B, policy: &P, threshold: f64) -> Result<bool, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
    P: Policy<S>,
{
    Ok(jaccard(a, b, policy)?.lower >= threshold)
}

/// Returns true if the upper similarity bound stays at or below the
/// threshold, i.e. the sketches are dissimilar with high confidence.
pub fn is_dissimilar<S, A, B, P>(a: &A, b: &B, policy: &P, threshold: f64) -> Result<bool, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
    P: Policy<S>,
{
    Ok(jaccard(a, b, policy)?.upper <= threshold)
}

/// Returns true if the two sketches provably hold the same retained set,
/// using the default seed.
pub fn exactly_equal<S, A, B, P>(a: &A, b: &B, policy: &P) -> Result<bool, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
    P: Policy<S>,
{
    exactly_equal_with_seed(a, b, policy, DEFAULT_UPDATE_SEED)
}

/// Returns true if the two sketches provably hold the same retained set.
pub fn exactly_equal_with_seed<S, A, B, P>(
    a: &A,
    b: &B,
    policy: &P,
    seed: u64,
) -> Result<bool, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
    P: Policy<S>,
{
    if a.is_empty() && b.is_empty() {
        return Ok(true);
    }
    if a.is_empty() || b.is_empty() {
        return Ok(false);
    }

    let count_a = a.num_retained();
    let count_b = b.num_retained();
    let union_ab = unioned(a, b, policy, seed)?;
    let count_u = union_ab.num_retained();

    Ok(count_u == count_a
        && count_u == count_b
        && union_ab.theta64() == a.theta64()
        && union_ab.theta64() == b.theta64())
}

/// Builds the union of both operands with a nominal capacity sized from
/// their combined retained counts, so k-truncation cannot bite.
fn unioned<S, A, B, P>(a: &A, b: &B, policy: &P, seed: u64) -> Result<CompactTupleSketch<S>, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
    P: Policy<S>,
{
    let combined = (a.num_retained() + b.num_retained()).max(1);
    let new_k = combined
        .next_power_of_two()
        .clamp(1usize << MIN_LG_K, 1usize << MAX_LG_K);
    let lg_k = new_k.trailing_zeros() as u8;

    let mut union = TupleUnion::builder(policy).lg_k(lg_k).seed(seed).build();
    union.update(a)?;
    union.update(b)?;
    Ok(union.result(false))
}

// Ratio bounds over theta-sketched sets, with B a subset of A. The counts
// are re-screened at the smaller theta before the sampled-set bounds apply.

fn checked_counts<S, A, B>(a: &A, b: &B) -> Result<(u64, u64, f64), Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
{
    let theta_a = a.theta64();
    let theta_b = b.theta64();
    if theta_b > theta_a {
        return Err(Error::invalid_argument(
            "subset sketch cannot have a larger theta than its superset",
        ));
    }
    let theta_ab = theta_a.min(theta_b);
    let count_b = b.num_retained() as u64;
    let count_a = if theta_a == theta_b {
        a.num_retained()
    } else {
        a.count_less_than_theta(theta_ab)
    } as u64;
    let f = theta_ab as f64 / MAX_THETA as f64;
    Ok((count_a, count_b, f))
}

fn lower_bound_of_b_over_a<S, A, B>(a: &A, b: &B) -> Result<f64, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
{
    let (count_a, count_b, f) = checked_counts(a, b)?;
    bounds_on_ratios::lower_bound_for_b_over_a(count_a, count_b, f)
}

fn upper_bound_of_b_over_a<S, A, B>(a: &A, b: &B) -> Result<f64, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
{
    let (count_a, count_b, f) = checked_counts(a, b)?;
    bounds_on_ratios::upper_bound_for_b_over_a(count_a, count_b, f)
}

fn estimate_of_b_over_a<S, A, B>(a: &A, b: &B) -> Result<f64, Error>
where
    S: Summary,
    A: TupleSketchView<S>,
    B: TupleSketchView<S>,
{
    let (count_a, count_b, _) = checked_counts(a, b)?;
    Ok(bounds_on_ratios::estimate_of_b_over_a(count_a, count_b))
}
