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

//! Serialization tests for the generic compact tuple format

use datasketches_tuple::tuple::CompactTupleSketch;
use datasketches_tuple::tuple::IntegerSummary;
use datasketches_tuple::tuple::IntegerSummaryFactory;
use datasketches_tuple::tuple::IntegerSummaryMode;
use datasketches_tuple::tuple::IntegerSummarySerde;
use datasketches_tuple::tuple::SERIAL_VERSION;
use datasketches_tuple::tuple::SKETCH_TYPE_COMPACT_TUPLE;
use datasketches_tuple::tuple::TUPLE_FAMILY_ID;
use datasketches_tuple::tuple::UpdateTupleSketch;

fn serde() -> IntegerSummarySerde {
    IntegerSummarySerde::new(IntegerSummaryMode::Sum)
}

fn sketch_with_range(start: u64, count: u64) -> UpdateTupleSketch<IntegerSummaryFactory> {
    let mut sketch =
        UpdateTupleSketch::builder(IntegerSummaryFactory::new(IntegerSummaryMode::Sum)).build();
    for i in 0..count {
        sketch.update_u64(start + i, &1).unwrap();
    }
    sketch
}

#[test]
fn test_serialize_empty() {
    let sketch = sketch_with_range(0, 0);
    let bytes = sketch.compact(true).serialize(&serde());

    // Empty sketch is the bare 8-byte preamble.
    assert_eq!(bytes.len(), 8);
    assert_eq!(bytes[0], 1, "PreLongs should be 1 for empty");
    assert_eq!(bytes[1], SERIAL_VERSION);
    assert_eq!(bytes[2], TUPLE_FAMILY_ID);
    assert_eq!(bytes[3], SKETCH_TYPE_COMPACT_TUPLE);
    assert_eq!(bytes[4], 0, "unused byte");
    assert_ne!(bytes[5] & (1 << 2), 0, "empty flag set");

    let restored = CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde()).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.estimate(), 0.0);
    assert!(!restored.is_estimation_mode());
}

#[test]
fn test_serialize_single_item() {
    let sketch = sketch_with_range(7, 1);
    let bytes = sketch.compact(true).serialize(&serde());

    // Single item in exact mode: 8-byte preamble + 8-byte hash + 4-byte
    // integer summary.
    assert_eq!(bytes.len(), 20);
    assert_eq!(bytes[0], 1, "PreLongs should be 1 for single item");

    let restored = CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde()).unwrap();
    assert!(!restored.is_empty());
    assert_eq!(restored.estimate(), 1.0);
    assert_eq!(restored.num_retained(), 1);
}

#[test]
fn test_serialize_exact_mode() {
    let sketch = sketch_with_range(0, 100);
    let compact = sketch.compact(true);
    let bytes = compact.serialize(&serde());

    // 16-byte preamble + 100 * (8-byte hash + 4-byte summary).
    assert_eq!(bytes.len(), 16 + 100 * 12);
    assert_eq!(bytes[0], 2, "PreLongs should be 2 for exact mode");
    let num_entries = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
    assert_eq!(num_entries, 100);

    let restored = CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde()).unwrap();
    assert!(!restored.is_estimation_mode());
    assert_eq!(restored.num_retained(), 100);
    assert_eq!(restored.estimate(), 100.0);
    assert!(restored.is_ordered());
}

#[test]
fn test_serialize_estimation_mode() {
    let sketch = sketch_with_range(0, 20_000);
    let compact = sketch.compact(true);
    let bytes = compact.serialize(&serde());

    assert_eq!(bytes[0], 3, "PreLongs should be 3 for estimation mode");
    let stored_theta = u64::from_le_bytes(bytes[16..24].try_into().unwrap());
    assert_eq!(stored_theta, compact.theta64());

    let restored = CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde()).unwrap();
    assert!(restored.is_estimation_mode());
    assert_eq!(restored.theta64(), compact.theta64());
    assert_eq!(restored.num_retained(), compact.num_retained());
    assert_eq!(restored.estimate(), compact.estimate());
}

#[test]
fn test_round_trip_preserves_summaries() {
    let mut sketch =
        UpdateTupleSketch::builder(IntegerSummaryFactory::new(IntegerSummaryMode::Sum)).build();
    for i in 0..50u64 {
        sketch.update_u64(i, &(i as i32)).unwrap();
        sketch.update_u64(i, &1).unwrap();
    }
    let compact = sketch.compact(true);
    let bytes = compact.serialize(&serde());
    let restored = CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde()).unwrap();

    let original: Vec<(u64, i32)> = compact.iter().map(|(h, s)| (h, s.value())).collect();
    let decoded: Vec<(u64, i32)> = restored.iter().map(|(h, s)| (h, s.value())).collect();
    assert_eq!(original, decoded);
}

#[test]
fn test_unordered_round_trip_keeps_flag() {
    let sketch = sketch_with_range(0, 100);
    let compact = sketch.compact(false);
    assert!(!compact.is_ordered());

    let bytes = compact.serialize(&serde());
    let restored = CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde()).unwrap();
    assert!(!restored.is_ordered());
    assert_eq!(restored.num_retained(), 100);
}

#[test]
fn test_custom_seed_round_trip() {
    let mut sketch = UpdateTupleSketch::builder(IntegerSummaryFactory::new(
        IntegerSummaryMode::Sum,
    ))
    .seed(12345)
    .build();
    for i in 0..10u64 {
        sketch.update_u64(i, &1).unwrap();
    }
    let bytes = sketch.compact(true).serialize(&serde());

    // Default-seed decode fails, matching-seed decode succeeds.
    assert!(CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde()).is_err());
    let restored =
        CompactTupleSketch::<IntegerSummary>::deserialize_with_seed(&bytes, &serde(), 12345)
            .unwrap();
    assert_eq!(restored.estimate(), 10.0);
}

#[test]
fn test_empty_sketch_skips_seed_validation() {
    let mut sketch = UpdateTupleSketch::builder(IntegerSummaryFactory::new(
        IntegerSummaryMode::Sum,
    ))
    .seed(12345)
    .build();
    sketch.reset();
    let bytes = sketch.compact(true).serialize(&serde());

    // Decoding an empty image under any seed succeeds.
    let restored = CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde()).unwrap();
    assert!(restored.is_empty());
}

#[test]
fn test_reject_unknown_serial_version() {
    let sketch = sketch_with_range(0, 5);
    let mut bytes = sketch.compact(true).serialize(&serde());
    bytes[1] = 2;
    assert!(CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde()).is_err());
}

#[test]
fn test_reject_wrong_sketch_type() {
    let sketch = sketch_with_range(0, 5);
    let mut bytes = sketch.compact(true).serialize(&serde());
    bytes[3] = 0;
    assert!(CompactTupleSketch::<IntegerSummary>::deserialize(&bytes, &serde()).is_err());
}

#[test]
fn test_reject_truncated_input() {
    let sketch = sketch_with_range(0, 5);
    let bytes = sketch.compact(true).serialize(&serde());
    for cut in [0, 4, 7, 12, bytes.len() - 1] {
        assert!(
            CompactTupleSketch::<IntegerSummary>::deserialize(&bytes[..cut], &serde()).is_err(),
            "decode should fail at {cut} bytes"
        );
    }
}
