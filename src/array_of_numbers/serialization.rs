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

//! Binary serialization format constants for array-of-numbers sketches.
//!
//! The array-of-numbers compact format has a fixed 16-byte header carrying
//! theta unconditionally, its own sketch type, and the summary vector
//! length; unlike the generic tuple format it accepts exactly one serial
//! version on read.

/// Serialization version of the array-of-numbers format
pub const AON_SERIAL_VERSION: u8 = 1;

/// Sketch type byte for a compact array-of-numbers sketch
pub const SKETCH_TYPE_AON_COMPACT: u8 = 3;

/// Preamble longs byte; informational, the header is always 16 bytes
pub const AON_PREAMBLE_LONGS: u8 = 1;

// Flags (byte 4) - bit masks
/// Flag: sketch is empty
pub const AON_FLAG_IS_EMPTY: u8 = 1 << 2;
/// Flag: entry count and entries follow the header
pub const AON_FLAG_HAS_ENTRIES: u8 = 1 << 3;
/// Flag: hash values are ordered (sorted)
pub const AON_FLAG_IS_ORDERED: u8 = 1 << 4;
