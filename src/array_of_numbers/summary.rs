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

//! The fixed-length numeric vector summary and its traits.

use byteorder::ByteOrder;
use byteorder::LE;

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;
use crate::tuple::Policy;
use crate::tuple::Summary;
use crate::tuple::SummaryFactory;
use crate::tuple::SummarySerde;

/// A numeric type that occupies a fixed number of bytes on the wire.
///
/// Implemented for the integer primitives up to 64 bits and for `f32` and
/// `f64`. The `add` operation is the element-wise merge of the vector
/// summary; integers wrap on overflow.
pub trait FixedWidthNumeric: Copy + Default + PartialEq + std::fmt::Debug {
    /// Number of bytes of the little-endian wire encoding.
    const SIZE_BYTES: usize;

    /// Returns the sum of two values.
    fn add(self, rhs: Self) -> Self;

    /// Writes the value into the start of `buf` in little-endian order.
    fn put_le(self, buf: &mut [u8]);

    /// Reads the value from the start of `buf` in little-endian order.
    fn get_le(buf: &[u8]) -> Self;
}

macro_rules! impl_fixed_width_int {
    ($t:ty, $size:expr, $write:ident, $read:ident) => {
        impl FixedWidthNumeric for $t {
            const SIZE_BYTES: usize = $size;

            fn add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            fn put_le(self, buf: &mut [u8]) {
                LE::$write(buf, self);
            }

            fn get_le(buf: &[u8]) -> Self {
                LE::$read(buf)
            }
        }
    };
}

macro_rules! impl_fixed_width_float {
    ($t:ty, $size:expr, $write:ident, $read:ident) => {
        impl FixedWidthNumeric for $t {
            const SIZE_BYTES: usize = $size;

            fn add(self, rhs: Self) -> Self {
                self + rhs
            }

            fn put_le(self, buf: &mut [u8]) {
                LE::$write(buf, self);
            }

            fn get_le(buf: &[u8]) -> Self {
                LE::$read(buf)
            }
        }
    };
}

impl FixedWidthNumeric for u8 {
    const SIZE_BYTES: usize = 1;

    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    fn put_le(self, buf: &mut [u8]) {
        buf[0] = self;
    }

    fn get_le(buf: &[u8]) -> Self {
        buf[0]
    }
}

impl FixedWidthNumeric for i8 {
    const SIZE_BYTES: usize = 1;

    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    fn put_le(self, buf: &mut [u8]) {
        buf[0] = self as u8;
    }

    fn get_le(buf: &[u8]) -> Self {
        buf[0] as i8
    }
}

impl_fixed_width_int!(u16, 2, write_u16, read_u16);
impl_fixed_width_int!(i16, 2, write_i16, read_i16);
impl_fixed_width_int!(u32, 4, write_u32, read_u32);
impl_fixed_width_int!(i32, 4, write_i32, read_i32);
impl_fixed_width_int!(u64, 8, write_u64, read_u64);
impl_fixed_width_int!(i64, 8, write_i64, read_i64);
impl_fixed_width_float!(f32, 4, write_f32, read_f32);
impl_fixed_width_float!(f64, 8, write_f64, read_f64);

/// A summary holding a fixed-length vector of numbers, merged by
/// element-wise addition.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSummary<V> {
    values: Vec<V>,
}

impl<V: FixedWidthNumeric> VectorSummary<V> {
    pub(crate) fn zeroed(num_values: u8) -> Self {
        Self {
            values: vec![V::default(); num_values as usize],
        }
    }

    pub(crate) fn from_values(values: Vec<V>) -> Self {
        Self { values }
    }

    /// Returns the vector of accumulated values.
    pub fn values(&self) -> &[V] {
        &self.values
    }
}

impl<V: FixedWidthNumeric> Summary for VectorSummary<V> {
    type Input = [V];

    fn update(&mut self, input: &[V]) {
        debug_assert_eq!(input.len(), self.values.len());
        for (value, incoming) in self.values.iter_mut().zip(input) {
            *value = value.add(*incoming);
        }
    }

    fn reset(&mut self) {
        self.values.fill(V::default());
    }
}

/// Factory producing zeroed vector summaries of one length.
#[derive(Debug, Clone, Copy)]
pub struct VectorSummaryFactory<V> {
    num_values: u8,
    _marker: std::marker::PhantomData<V>,
}

impl<V: FixedWidthNumeric> VectorSummaryFactory<V> {
    pub(crate) fn new(num_values: u8) -> Self {
        Self {
            num_values,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<V: FixedWidthNumeric> SummaryFactory for VectorSummaryFactory<V> {
    type Summary = VectorSummary<V>;

    fn new_summary(&self) -> VectorSummary<V> {
        VectorSummary::zeroed(self.num_values)
    }
}

/// Collision policy of the array-of-numbers family: element-wise addition.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorSumPolicy;

impl<V: FixedWidthNumeric> Policy<VectorSummary<V>> for VectorSumPolicy {
    fn apply(&self, existing: &mut VectorSummary<V>, incoming: &VectorSummary<V>) {
        existing.update(&incoming.values);
    }
}

/// Serializer/deserializer packing each summary as `num_values`
/// little-endian values.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VectorSummarySerde<V> {
    num_values: u8,
    _marker: std::marker::PhantomData<V>,
}

impl<V: FixedWidthNumeric> VectorSummarySerde<V> {
    pub(crate) fn new(num_values: u8) -> Self {
        Self {
            num_values,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<V: FixedWidthNumeric> SummarySerde<VectorSummary<V>> for VectorSummarySerde<V> {
    fn serialize_summary(&self, bytes: &mut SketchBytes, summary: &VectorSummary<V>) {
        let mut scratch = vec![0u8; V::SIZE_BYTES];
        for value in summary.values() {
            value.put_le(&mut scratch);
            bytes.write(&scratch);
        }
    }

    fn deserialize_summary(
        &self,
        slice: &mut SketchSlice<'_>,
    ) -> Result<VectorSummary<V>, Error> {
        let mut scratch = vec![0u8; V::SIZE_BYTES];
        let mut values = Vec::with_capacity(self.num_values as usize);
        for _ in 0..self.num_values {
            slice
                .read_exact(&mut scratch)
                .map_err(|_| Error::insufficient_data("summary values"))?;
            values.push(V::get_le(&scratch));
        }
        Ok(VectorSummary::from_values(values))
    }
}
