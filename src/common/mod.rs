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

//! Shared configuration types and numeric helpers.

pub mod binomial_bounds;
pub mod bounds_on_ratios;

/// Number of standard deviations for confidence bounds.
///
/// One, two and three standard deviations correspond to confidence
/// levels of approximately 68.3%, 95.4% and 99.7%.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumStdDev {
    /// One standard deviation (~68.3% confidence).
    One,
    /// Two standard deviations (~95.4% confidence).
    Two,
    /// Three standard deviations (~99.7% confidence).
    Three,
}

impl NumStdDev {
    /// Returns the number of standard deviations as an integer.
    pub fn value(self) -> u8 {
        match self {
            NumStdDev::One => 1,
            NumStdDev::Two => 2,
            NumStdDev::Three => 3,
        }
    }
}

/// Growth factor applied when a sketch's hash table fills up, before the
/// table reaches its maximum size.
///
/// `X1` means the table is allocated at full size up front; `X8` (the
/// default) starts small and multiplies the size by 8 on each resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFactor {
    /// No resizing: allocate the final size immediately.
    X1,
    /// Double the table on each resize.
    X2,
    /// Quadruple the table on each resize.
    X4,
    /// Multiply the table size by 8 on each resize.
    X8,
}

impl ResizeFactor {
    /// Returns log2 of the growth factor.
    pub fn lg_value(self) -> u8 {
        match self {
            ResizeFactor::X1 => 0,
            ResizeFactor::X2 => 1,
            ResizeFactor::X4 => 2,
            ResizeFactor::X8 => 3,
        }
    }
}

/// Canonicalizes a double before hashing, for compatibility with the Java
/// implementation: `-0.0` maps to `0.0` and every NaN bit pattern maps to
/// the single canonical NaN.
pub(crate) fn canonical_double(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else if value.is_nan() {
        f64::from_bits(0x7FF8_0000_0000_0000)
    } else {
        value
    }
}
