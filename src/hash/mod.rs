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

//! Hashing of update keys and seeds.
//!
//! All sketches hash their input through MurmurHash3 x64-128 with a
//! user-chosen 64-bit seed, matching the Java, C++ and Go DataSketches
//! implementations bit for bit. Only the canonical byte encodings of keys
//! live at the call sites; the hash function itself is in
//! [`murmurhash`](self::murmurhash) and is cross-checked against the
//! reference C API in its tests.

mod murmurhash;

use self::murmurhash::murmurhash3_x64_128;

/// Default seed used by all sketches unless overridden.
///
/// Sketches hashed with different seeds cannot be combined.
pub const DEFAULT_UPDATE_SEED: u64 = 9001;

/// Computes the 128-bit MurmurHash3 of `bytes` under a 64-bit `seed`.
pub(crate) fn hash128(bytes: &[u8], seed: u64) -> (u64, u64) {
    murmurhash3_x64_128(bytes, seed)
}

/// Computes the update hash of a canonical key encoding.
///
/// The low 64 bits of the 128-bit hash are shifted right by one so the
/// value is a positive magnitude; `0` is reserved for empty table slots.
pub(crate) fn compute_hash(bytes: &[u8], seed: u64) -> u64 {
    let (h0, _) = hash128(bytes, seed);
    h0 >> 1
}

/// Computes the 16-bit fingerprint of a seed.
///
/// The fingerprint is the low 16 bits of the hash of the seed's 8-byte
/// little-endian encoding. It is stored in every serialized sketch and
/// gates cross-sketch compatibility.
///
/// # Panics
///
/// Panics if the seed hashes to zero; such a seed cannot be fingerprinted
/// and a different one must be chosen.
pub fn compute_seed_hash(seed: u64) -> u16 {
    let (h0, _) = hash128(&seed.to_le_bytes(), 0);
    let seed_hash = (h0 & 0xFFFF) as u16;
    assert_ne!(
        seed_hash, 0,
        "seed {seed} hashes to zero, choose a different seed"
    );
    seed_hash
}
