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

//! Confidence bounds on the number of distinct values, given the number of
//! retained hashes and the sampling threshold theta.
//!
//! The retained count of a theta-sampled stream is a binomial observation of
//! the unknown distinct count `n` with success probability `theta`. The
//! bounds invert the binomial tails:
//!
//! - closed forms for zero and one sample,
//! - an exact tail inversion for `2 <= num_samples <= 120`,
//! - a Gaussian approximation with continuity correction beyond 120 samples,
//!   clamped so that `num_samples <= lower <= estimate <= upper`.

use crate::common::NumStdDev;
use crate::error::Error;

// One-sided tail probabilities of the standard normal distribution at 1, 2
// and 3 standard deviations. Index 0 is unused.
const DELTA_OF_NUM_SDEV: [f64; 4] = [
    0.5,
    0.1586553191586026479,
    0.0227502618904135701,
    0.0013498126861731796,
];

/// Returns the approximate lower bound on the number of distinct values.
///
/// # Errors
///
/// Returns an error if `theta` is outside `(0, 1]`.
pub fn lower_bound(num_samples: u64, theta: f64, num_std_dev: NumStdDev) -> Result<f64, Error> {
    check_theta(theta)?;
    let num_samples_f = num_samples as f64;
    let raw = lower_bound_raw(num_samples, theta, num_std_dev);
    let estimate = num_samples_f / theta;
    Ok(estimate.min(raw.max(num_samples_f)))
}

/// Returns the approximate upper bound on the number of distinct values.
///
/// `no_data_seen` short-circuits to `0.0` for sketches that never received
/// an update.
///
/// # Errors
///
/// Returns an error if `theta` is outside `(0, 1]`.
pub fn upper_bound(
    num_samples: u64,
    theta: f64,
    num_std_dev: NumStdDev,
    no_data_seen: bool,
) -> Result<f64, Error> {
    if no_data_seen {
        return Ok(0.0);
    }
    check_theta(theta)?;
    let num_samples_f = num_samples as f64;
    let raw = upper_bound_raw(num_samples, theta, num_std_dev);
    let estimate = num_samples_f / theta;
    Ok(estimate.max(raw))
}

fn check_theta(theta: f64) -> Result<(), Error> {
    if !(theta > 0.0 && theta <= 1.0) {
        return Err(
            Error::invalid_argument("theta must be in (0, 1]").with_context("theta", theta)
        );
    }
    Ok(())
}

fn lower_bound_raw(num_samples: u64, theta: f64, num_std_dev: NumStdDev) -> f64 {
    let num_samples_f = num_samples as f64;
    let num_sdev_f = f64::from(num_std_dev.value());
    let delta = DELTA_OF_NUM_SDEV[num_std_dev.value() as usize];

    if theta == 1.0 {
        return num_samples_f;
    }
    if num_samples == 0 {
        return 0.0;
    }
    if num_samples == 1 {
        // Solves P[X >= 1 | n, theta] = delta in closed form.
        return ((1.0 - delta).ln() / (1.0 - theta).ln()).floor();
    }
    if num_samples > 120 {
        return cont_classic_lb(num_samples_f, theta, num_sdev_f) - 0.5;
    }
    if theta > 1.0 - 1e-5 {
        return num_samples_f;
    }
    if theta < num_samples_f / 360.0 {
        // Very sparse sampling; the Gaussian with continuity correction is
        // accurate enough here and the search below would be unbounded.
        return cont_classic_lb(num_samples_f, theta, num_sdev_f) - 0.5;
    }
    exact_lower_bound(num_samples, theta, delta)
}

fn upper_bound_raw(num_samples: u64, theta: f64, num_std_dev: NumStdDev) -> f64 {
    let num_samples_f = num_samples as f64;
    let num_sdev_f = f64::from(num_std_dev.value());
    let delta = DELTA_OF_NUM_SDEV[num_std_dev.value() as usize];

    if theta == 1.0 {
        return num_samples_f;
    }
    if num_samples == 0 {
        // Zero retained hashes still bound n from above: solves
        // P[X = 0 | n, theta] = delta.
        return (delta.ln() / (1.0 - theta).ln()).ceil();
    }
    if num_samples > 120 {
        return cont_classic_ub(num_samples_f, theta, num_sdev_f) + 0.5;
    }
    if theta > 1.0 - 1e-5 {
        return num_samples_f + 1.0;
    }
    if theta < num_samples_f / 360.0 {
        return cont_classic_ub(num_samples_f, theta, num_sdev_f) + 0.5;
    }
    exact_upper_bound(num_samples, theta, delta)
}

// The classic Gaussian bounds with continuity correction.

fn cont_classic_lb(num_samples_f: f64, theta: f64, num_sdev: f64) -> f64 {
    let n_hat = (num_samples_f - 0.5) / theta;
    let b = num_sdev * ((1.0 - theta) / theta).sqrt();
    let d = 0.5 * b * ((b * b) + (4.0 * n_hat)).sqrt();
    let center = n_hat + (0.5 * (b * b));
    center - d
}

fn cont_classic_ub(num_samples_f: f64, theta: f64, num_sdev: f64) -> f64 {
    let n_hat = (num_samples_f + 0.5) / theta;
    let b = num_sdev * ((1.0 - theta) / theta).sqrt();
    let d = 0.5 * b * ((b * b) + (4.0 * n_hat)).sqrt();
    let center = n_hat + (0.5 * (b * b));
    center + d
}

// Exact binomial tail inversions for the 2..=120 sample band. The searches
// stay cheap because this band guarantees theta >= num_samples / 360, so the
// bracket never exceeds a few thousand candidates.

/// Smallest `n` such that observing at least `num_samples` successes is not
/// surprising: `P[X >= num_samples | n, theta] > delta`.
fn exact_lower_bound(num_samples: u64, theta: f64, delta: f64) -> f64 {
    let mut lo = num_samples;
    if upper_tail(num_samples, lo, theta) > delta {
        return lo as f64;
    }
    let mut hi = ((num_samples as f64) / theta).ceil() as u64 + 1;
    while upper_tail(num_samples, hi, theta) <= delta {
        hi *= 2;
    }
    while lo < hi {
        let mid = lo + ((hi - lo) / 2);
        if upper_tail(num_samples, mid, theta) > delta {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo as f64
}

/// Largest `n` such that observing at most `num_samples` successes is not
/// surprising: `P[X <= num_samples | n, theta] >= delta`.
fn exact_upper_bound(num_samples: u64, theta: f64, delta: f64) -> f64 {
    let mut lo = ((num_samples as f64) / theta).floor() as u64 + 1;
    while lower_tail(num_samples, lo, theta) < delta {
        // The estimate sits near the median, so this walk is short.
        lo -= 1;
    }
    let mut hi = lo + 1;
    while lower_tail(num_samples, hi, theta) >= delta {
        hi *= 2;
    }
    while hi - lo > 1 {
        let mid = lo + ((hi - lo) / 2);
        if lower_tail(num_samples, mid, theta) >= delta {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo as f64
}

/// `P[X >= k | n, theta]` for a binomial X.
fn upper_tail(k: u64, n: u64, theta: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    1.0 - binomial_cdf(k - 1, n, theta)
}

/// `P[X <= k | n, theta]` for a binomial X.
fn lower_tail(k: u64, n: u64, theta: f64) -> f64 {
    binomial_cdf(k, n, theta)
}

/// `P[X <= j_max | n, theta]` via the log-space term recurrence
/// `ln t_{j+1} = ln t_j + ln((n-j)/(j+1)) + ln(theta/(1-theta))`.
///
/// Terms are accumulated in log space because `(1-theta)^n` underflows for
/// theta near 1 while later terms of the sum are still significant.
fn binomial_cdf(j_max: u64, n: u64, theta: f64) -> f64 {
    if j_max >= n {
        return 1.0;
    }
    let q = 1.0 - theta;
    let ln_ratio = (theta / q).ln();
    let mut ln_term = (n as f64) * q.ln();
    let mut ln_terms = Vec::with_capacity(j_max as usize + 1);
    ln_terms.push(ln_term);
    for j in 0..j_max {
        ln_term += ((((n - j) as f64) / ((j + 1) as f64)).ln()) + ln_ratio;
        ln_terms.push(ln_term);
    }
    let ln_max = ln_terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if ln_max < -700.0 {
        return 0.0;
    }
    let sum: f64 = ln_terms.iter().map(|&lt| (lt - ln_max).exp()).sum();
    (ln_max.exp() * sum).min(1.0)
}
