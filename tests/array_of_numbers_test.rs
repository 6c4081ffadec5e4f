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

use datasketches_tuple::array_of_numbers::ArrayOfDoublesCompactSketch;
use datasketches_tuple::array_of_numbers::ArrayOfDoublesUnion;
use datasketches_tuple::array_of_numbers::ArrayOfDoublesUpdateSketch;
use datasketches_tuple::array_of_numbers::ArrayOfNumbersIntersection;
use datasketches_tuple::array_of_numbers::ArrayOfNumbersUnion;
use datasketches_tuple::array_of_numbers::ArrayOfNumbersUpdateSketch;
use datasketches_tuple::array_of_numbers::a_not_b;
use datasketches_tuple::common::NumStdDev;
use googletest::assert_that;
use googletest::prelude::near;

fn doubles_sketch_with_range(start: u64, count: u64) -> ArrayOfDoublesUpdateSketch {
    let mut sketch = ArrayOfDoublesUpdateSketch::builder(1).build();
    for i in 0..count {
        sketch.update_u64(start + i, &[1.0]).unwrap();
    }
    sketch
}

#[test]
fn test_summary_merge() {
    let mut sketch = ArrayOfDoublesUpdateSketch::builder(2).build();
    sketch.update_u64(1, &[10.0, 20.0]).unwrap();
    sketch.update_u64(1, &[5.0, 10.0]).unwrap();

    assert_eq!(sketch.estimate(), 1.0);
    let (_, values) = sketch.iter().next().unwrap();
    assert_eq!(values, &[15.0, 30.0]);
}

#[test]
fn test_update_value_shape_is_enforced() {
    let mut sketch = ArrayOfDoublesUpdateSketch::builder(2).build();
    assert!(sketch.update_u64(1, &[1.0]).is_err());
    assert!(sketch.update_u64(1, &[1.0, 2.0, 3.0]).is_err());
    assert!(sketch.is_empty());
    sketch.update_u64(1, &[1.0, 2.0]).unwrap();
    assert_eq!(sketch.estimate(), 1.0);
}

#[test]
fn test_integer_vectors() {
    let mut sketch = ArrayOfNumbersUpdateSketch::<i64>::builder(3).build();
    sketch.update_str("key", &[1, 2, 3]).unwrap();
    sketch.update_str("key", &[10, 20, 30]).unwrap();

    let (_, values) = sketch.iter().next().unwrap();
    assert_eq!(values, &[11, 22, 33]);
}

#[test]
fn test_estimation_accuracy_and_bounds() {
    let sketch = doubles_sketch_with_range(0, 10_000);
    assert!(sketch.is_estimation_mode());
    assert_that!(sketch.estimate(), near(10_000.0, 0.02 * 10_000.0));
    assert!(sketch.lower_bound(NumStdDev::Two) <= sketch.estimate());
    assert!(sketch.estimate() <= sketch.upper_bound(NumStdDev::Two));
}

#[test]
fn test_serialize_empty() {
    let sketch = ArrayOfDoublesUpdateSketch::builder(2).build();
    let bytes = sketch.compact(true).serialize();

    // Empty sketch is the bare 16-byte header.
    assert_eq!(bytes.len(), 16);
    assert_eq!(bytes[0], 1, "preamble longs");
    assert_eq!(bytes[1], 1, "serial version");
    assert_eq!(bytes[3], 3, "sketch type");
    assert_ne!(bytes[4] & (1 << 2), 0, "empty flag set");
    assert_eq!(bytes[4] & (1 << 3), 0, "no entries");
    assert_eq!(bytes[5], 2, "num values");

    let restored = ArrayOfDoublesCompactSketch::deserialize(&bytes).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.num_values(), 2);
    assert_eq!(restored.estimate(), 0.0);
}

#[test]
fn test_serialize_round_trip_exact_mode() {
    let mut sketch = ArrayOfDoublesUpdateSketch::builder(2).build();
    for i in 0..100u64 {
        sketch.update_u64(i, &[i as f64, 1.0]).unwrap();
    }
    let compact = sketch.compact(true);
    let bytes = compact.serialize();

    // 16-byte header + count/reserved + 100 hashes + 100 two-double
    // summaries.
    assert_eq!(bytes.len(), 16 + 8 + 100 * 8 + 100 * 16);
    let num_entries = u32::from_le_bytes(bytes[16..20].try_into().unwrap());
    assert_eq!(num_entries, 100);

    let restored = ArrayOfDoublesCompactSketch::deserialize(&bytes).unwrap();
    assert_eq!(restored.num_retained(), 100);
    assert_eq!(restored.estimate(), 100.0);
    assert!(restored.is_ordered());

    let original: Vec<(u64, Vec<f64>)> =
        compact.iter().map(|(h, v)| (h, v.to_vec())).collect();
    let decoded: Vec<(u64, Vec<f64>)> =
        restored.iter().map(|(h, v)| (h, v.to_vec())).collect();
    assert_eq!(original, decoded);
}

#[test]
fn test_serialize_round_trip_estimation_mode() {
    let sketch = doubles_sketch_with_range(0, 20_000);
    let compact = sketch.compact(true);
    let bytes = compact.serialize();

    let stored_theta = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
    let restored = ArrayOfDoublesCompactSketch::deserialize(&bytes).unwrap();
    assert!(restored.is_estimation_mode());
    assert_eq!(restored.estimate(), compact.estimate());
    assert_eq!(restored.num_retained(), compact.num_retained());
    assert!(stored_theta < u64::MAX / 2);
}

#[test]
fn test_deserialize_rejects_unknown_version() {
    let sketch = doubles_sketch_with_range(0, 10);
    let mut bytes = sketch.compact(true).serialize();
    // This format accepts exactly one serial version, unlike the generic
    // tuple decoder.
    bytes[1] = 3;
    assert!(ArrayOfDoublesCompactSketch::deserialize(&bytes).is_err());
}

#[test]
fn test_deserialize_rejects_wrong_seed() {
    let mut sketch = ArrayOfDoublesUpdateSketch::builder(1).seed(12345).build();
    sketch.update_u64(1, &[1.0]).unwrap();
    let bytes = sketch.compact(true).serialize();

    assert!(ArrayOfDoublesCompactSketch::deserialize(&bytes).is_err());
    let restored = ArrayOfDoublesCompactSketch::deserialize_with_seed(&bytes, 12345).unwrap();
    assert_eq!(restored.estimate(), 1.0);
}

#[test]
fn test_union_sums_colliding_vectors() {
    let mut a = ArrayOfDoublesUpdateSketch::builder(2).build();
    let mut b = ArrayOfDoublesUpdateSketch::builder(2).build();
    a.update_str("shared", &[1.0, 2.0]).unwrap();
    a.update_str("only_a", &[5.0, 5.0]).unwrap();
    b.update_str("shared", &[3.0, 4.0]).unwrap();

    let mut union = ArrayOfDoublesUnion::new(2);
    union.update(&a).unwrap();
    union.update(&b).unwrap();
    let result = union.result(true);

    assert_eq!(result.estimate(), 2.0);
    let shared = result
        .iter()
        .find(|(_, values)| values[0] == 4.0)
        .expect("shared key present");
    assert_eq!(shared.1, &[4.0, 6.0]);
}

#[test]
fn test_union_rejects_shape_mismatch() {
    let a = ArrayOfDoublesUpdateSketch::builder(2).build();
    let mut wide = ArrayOfDoublesUpdateSketch::builder(3).build();
    wide.update_u64(1, &[1.0, 2.0, 3.0]).unwrap();

    let mut union = ArrayOfDoublesUnion::new(2);
    union.update(&a).unwrap();
    assert!(union.update(&wide).is_err());
}

#[test]
fn test_intersection_narrows_and_sums() {
    let mut a = ArrayOfDoublesUpdateSketch::builder(1).build();
    let mut b = ArrayOfDoublesUpdateSketch::builder(1).build();
    for i in 0..1000u64 {
        a.update_u64(i, &[1.0]).unwrap();
    }
    for i in 500..1500u64 {
        b.update_u64(i, &[2.0]).unwrap();
    }

    let mut intersection = ArrayOfNumbersIntersection::<f64>::new_with_default_seed(1);
    intersection.update(&a).unwrap();
    intersection.update(&b).unwrap();
    let result = intersection.result(true).unwrap();

    assert_eq!(result.estimate(), 500.0);
    for (_, values) in result.iter() {
        assert_eq!(values, &[3.0]);
    }
}

#[test]
fn test_intersection_rejects_shape_mismatch() {
    let mut a = ArrayOfDoublesUpdateSketch::builder(1).build();
    a.update_u64(1, &[1.0]).unwrap();
    let mut wide = ArrayOfDoublesUpdateSketch::builder(2).build();
    wide.update_u64(1, &[1.0, 2.0]).unwrap();

    let mut intersection = ArrayOfNumbersIntersection::<f64>::new_with_default_seed(1);
    intersection.update(&a).unwrap();
    assert!(intersection.update(&wide).is_err());
}

#[test]
fn test_a_not_b() {
    let a = doubles_sketch_with_range(0, 1000);
    let b = doubles_sketch_with_range(500, 1000);

    let result = a_not_b(&a, &b, true).unwrap();
    assert_eq!(result.estimate(), 500.0);
    assert_eq!(result.num_values(), 1);
}

#[test]
fn test_a_not_b_rejects_shape_mismatch() {
    let a = doubles_sketch_with_range(0, 10);
    let wide = ArrayOfDoublesUpdateSketch::builder(2).build();
    assert!(a_not_b(&a, &wide, true).is_err());
}

#[test]
fn test_generic_numeric_union() {
    let mut a = ArrayOfNumbersUpdateSketch::<u32>::builder(2).build();
    let mut b = ArrayOfNumbersUpdateSketch::<u32>::builder(2).build();
    a.update_u64(7, &[1, 2]).unwrap();
    b.update_u64(7, &[10, 20]).unwrap();

    let mut union = ArrayOfNumbersUnion::<u32>::new(2);
    union.update(&a).unwrap();
    union.update(&b).unwrap();
    let result = union.result(true);

    let (_, values) = result.iter().next().unwrap();
    assert_eq!(values, &[11, 22]);
}
