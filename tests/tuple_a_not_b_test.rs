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

use datasketches_tuple::tuple::IntegerSummaryFactory;
use datasketches_tuple::tuple::IntegerSummaryMode;
use datasketches_tuple::tuple::UpdateTupleSketch;
use datasketches_tuple::tuple::a_not_b;
use datasketches_tuple::tuple::a_not_b_with_seed;
use googletest::assert_that;
use googletest::prelude::near;

fn sketch_with_range(start: u64, count: u64) -> UpdateTupleSketch<IntegerSummaryFactory> {
    let mut sketch =
        UpdateTupleSketch::builder(IntegerSummaryFactory::new(IntegerSummaryMode::Sum)).build();
    for i in 0..count {
        sketch.update_u64(start + i, &1).unwrap();
    }
    sketch
}

#[test]
fn test_a_minus_itself_is_empty() {
    let a = sketch_with_range(0, 1000);
    let result = a_not_b(&a, &a, true).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.estimate(), 0.0);
}

#[test]
fn test_a_minus_empty_is_a() {
    let a = sketch_with_range(0, 1000);
    let empty = sketch_with_range(0, 0);

    let result = a_not_b(&a, &empty, true).unwrap();
    assert!(!result.is_empty());
    assert_eq!(result.num_retained(), a.num_retained());
    assert_eq!(result.theta64(), a.theta64());
    assert_eq!(result.estimate(), 1000.0);
}

#[test]
fn test_empty_minus_b_is_empty() {
    let empty = sketch_with_range(0, 0);
    let b = sketch_with_range(0, 1000);

    let result = a_not_b(&empty, &b, true).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.estimate(), 0.0);
    assert!(!result.is_estimation_mode());
}

#[test]
fn test_exact_half_overlap() {
    let a = sketch_with_range(0, 1000);
    let b = sketch_with_range(500, 1000);

    let result = a_not_b(&a, &b, true).unwrap();
    assert!(!result.is_empty());
    assert!(!result.is_estimation_mode());
    assert_eq!(result.estimate(), 500.0);
}

#[test]
fn test_estimation_disjoint() {
    let a = sketch_with_range(0, 10_000);
    let b = sketch_with_range(10_000, 10_000);

    let result = a_not_b(&a, &b, true).unwrap();
    assert!(!result.is_empty());
    assert!(result.is_estimation_mode());
    assert_that!(result.estimate(), near(10_000.0, 200.0));
}

#[test]
fn test_estimation_full_overlap() {
    let a = sketch_with_range(0, 10_000);
    let result = a_not_b(&a, &a.compact(true), true).unwrap();
    assert_eq!(result.estimate(), 0.0);
    assert!(result.is_estimation_mode());
    assert!(!result.is_empty());
}

#[test]
fn test_sort_based_and_probe_based_paths_agree() {
    let a = sketch_with_range(0, 5_000);
    let b = sketch_with_range(2_500, 5_000);

    // Both operands ordered takes the sort-based path; update sketches
    // take the probe-based path.
    let sorted = a_not_b(&a.compact(true), &b.compact(true), true).unwrap();
    let probed = a_not_b(&a, &b, true).unwrap();

    assert_eq!(sorted.num_retained(), probed.num_retained());
    assert_eq!(sorted.theta64(), probed.theta64());
    let hashes_sorted: Vec<u64> = sorted.iter().map(|(hash, _)| hash).collect();
    let hashes_probed: Vec<u64> = probed.iter().map(|(hash, _)| hash).collect();
    assert_eq!(hashes_sorted, hashes_probed);
}

#[test]
fn test_result_keeps_a_summaries() {
    let mut a =
        UpdateTupleSketch::builder(IntegerSummaryFactory::new(IntegerSummaryMode::Sum)).build();
    let mut b =
        UpdateTupleSketch::builder(IntegerSummaryFactory::new(IntegerSummaryMode::Sum)).build();
    a.update_str("kept", &7).unwrap();
    a.update_str("dropped", &3).unwrap();
    b.update_str("dropped", &100).unwrap();

    let result = a_not_b(&a, &b, true).unwrap();
    assert_eq!(result.num_retained(), 1);
    let (_, summary) = result.iter().next().unwrap();
    assert_eq!(summary.value(), 7);
}

#[test]
fn test_ordered_a_gives_ordered_result() {
    let a = sketch_with_range(0, 1000);
    let b = sketch_with_range(500, 1000);

    let result = a_not_b(&a.compact(true), &b, false).unwrap();
    assert!(result.is_ordered());
    let hashes: Vec<u64> = result.iter().map(|(hash, _)| hash).collect();
    assert!(hashes.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_seed_mismatch_is_rejected() {
    let a = sketch_with_range(0, 100);
    let mut b =
        UpdateTupleSketch::builder(IntegerSummaryFactory::new(IntegerSummaryMode::Sum))
            .seed(12345)
            .build();
    b.update_u64(1, &1).unwrap();

    assert!(a_not_b(&a, &b, true).is_err());
    assert!(a_not_b_with_seed(&a, &b, true, 12345).is_err());
}
