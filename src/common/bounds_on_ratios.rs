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

//! Confidence bounds on binomial proportions and on ratios of sampled sets.
//!
//! Given `k` successes in `n` trials, the proportion bounds approximate the
//! Clopper-Pearson interval for the unknown success probability `p` by
//! inverting the incomplete beta function with Abramowitz & Stegun formula
//! 26.5.22, with closed forms at the corners `k in {0, 1, n-1, n}`. The
//! normal CDF uses an `erf` from A&S formula 7.1.28 (about 7 decimal
//! digits).
//!
//! The sampled-set functions bound `|B| / |A|` for `B` a subset of `A` when
//! both were sampled at rate `f`; they widen the proportion bounds by an
//! empirical adjustment that accounts for the sampling. Jaccard similarity
//! is computed on top of these.

use crate::error::Error;

// Number of standard deviations used for the sampled-set ratio bounds,
// shared with the peer implementations.
const NUM_STD_DEVS: f64 = 2.0;

/// Returns the estimate of the unknown binomial proportion `p`.
///
/// # Errors
///
/// Returns an error if `k > n`.
pub fn estimate_unknown_p(n: u64, k: u64) -> Result<f64, Error> {
    check_inputs(n, k)?;
    if n == 0 {
        return Ok(0.5); // the coin was never flipped, so we know nothing
    }
    Ok(k as f64 / n as f64)
}

/// Returns the approximate lower bound on the unknown binomial proportion
/// `p`, given `k` successes in `n` trials.
///
/// # Errors
///
/// Returns an error if `k > n`.
pub fn approximate_lower_bound_on_p(n: u64, k: u64, num_std_devs: f64) -> Result<f64, Error> {
    check_inputs(n, k)?;
    if n == 0 || k == 0 {
        return Ok(0.0);
    }
    let delta = delta_of_num_std_devs(num_std_devs);
    if k == 1 {
        return Ok(exact_lower_bound_on_p_for_k_equals_one(n as f64, delta));
    }
    if k == n {
        return Ok(exact_lower_bound_on_p_for_k_equals_n(n as f64, delta));
    }
    let x = abramowitz_stegun_formula_26_5_22((n - k) as f64 + 1.0, k as f64, -num_std_devs);
    Ok(1.0 - x)
}

/// Returns the approximate upper bound on the unknown binomial proportion
/// `p`, given `k` successes in `n` trials.
///
/// # Errors
///
/// Returns an error if `k > n`.
pub fn approximate_upper_bound_on_p(n: u64, k: u64, num_std_devs: f64) -> Result<f64, Error> {
    check_inputs(n, k)?;
    if n == 0 || k == n {
        return Ok(1.0);
    }
    let delta = delta_of_num_std_devs(num_std_devs);
    if k == n - 1 {
        return Ok(exact_upper_bound_on_p_for_k_equals_n_minus_one(
            n as f64, delta,
        ));
    }
    if k == 0 {
        return Ok(exact_upper_bound_on_p_for_k_equals_zero(n as f64, delta));
    }
    let x = abramowitz_stegun_formula_26_5_22((n - k) as f64, (k + 1) as f64, num_std_devs);
    Ok(1.0 - x)
}

/// Returns the estimate of `|B| / |A|` from the observed counts of two
/// sampled sets with `B` a subset of `A`.
pub(crate) fn estimate_of_b_over_a(a: u64, b: u64) -> f64 {
    if a == 0 {
        return 0.5;
    }
    b as f64 / a as f64
}

/// Returns the lower bound of `|B| / |A|` for sets sampled at rate `f`.
pub(crate) fn lower_bound_for_b_over_a(a: u64, b: u64, f: f64) -> Result<f64, Error> {
    if a == 0 {
        return Ok(0.0);
    }
    if f == 1.0 {
        return Ok(b as f64 / a as f64);
    }
    approximate_lower_bound_on_p(a, b, NUM_STD_DEVS * hacky_adjuster(f))
}

/// Returns the upper bound of `|B| / |A|` for sets sampled at rate `f`.
pub(crate) fn upper_bound_for_b_over_a(a: u64, b: u64, f: f64) -> Result<f64, Error> {
    if a == 0 {
        return Ok(1.0);
    }
    if f == 1.0 {
        return Ok(b as f64 / a as f64);
    }
    approximate_upper_bound_on_p(a, b, NUM_STD_DEVS * hacky_adjuster(f))
}

// Empirical widening of the proportion bounds as the sampling rate falls.
// Shared with the peer implementations, tuning constants included.
fn hacky_adjuster(f: f64) -> f64 {
    let tmp = (1.0 - f).sqrt();
    if f <= 0.5 { tmp } else { tmp + (0.01 * (f - 0.5)) }
}

fn check_inputs(n: u64, k: u64) -> Result<(), Error> {
    if k > n {
        return Err(Error::invalid_argument("k cannot exceed n")
            .with_context("n", n)
            .with_context("k", k));
    }
    Ok(())
}

fn delta_of_num_std_devs(kappa: f64) -> f64 {
    normal_cdf(-kappa)
}

// Closed forms at the corners of the Clopper-Pearson interval.

fn exact_upper_bound_on_p_for_k_equals_zero(n: f64, delta: f64) -> f64 {
    1.0 - delta.powf(1.0 / n)
}

fn exact_lower_bound_on_p_for_k_equals_one(n: f64, delta: f64) -> f64 {
    1.0 - (1.0 - delta).powf(1.0 / n)
}

fn exact_lower_bound_on_p_for_k_equals_n(n: f64, delta: f64) -> f64 {
    delta.powf(1.0 / n)
}

fn exact_upper_bound_on_p_for_k_equals_n_minus_one(n: f64, delta: f64) -> f64 {
    (1.0 - delta).powf(1.0 / n)
}

/// Approximate inversion of the incomplete beta function: returns `x` such
/// that `I_x(a, b)` equals the tail probability at `yp` standard normal
/// deviates. Abramowitz & Stegun formula 26.5.22.
fn abramowitz_stegun_formula_26_5_22(a: f64, b: f64, yp: f64) -> f64 {
    let b2m1 = (2.0 * b) - 1.0;
    let a2m1 = (2.0 * a) - 1.0;
    let lambda = ((yp * yp) - 3.0) / 6.0;
    let htmp = (1.0 / a2m1) + (1.0 / b2m1);
    let h = 2.0 / htmp;
    let term1 = (yp * ((h + lambda).sqrt())) / h;
    let term2 = (1.0 / b2m1) - (1.0 / a2m1);
    let term3 = (lambda + (5.0 / 6.0)) - (2.0 / (3.0 * h));
    let w = term1 + (term2 * term3);
    a / (a + (b * (2.0 * w).exp()))
}

/// The standard normal cumulative distribution function.
fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    if x < 0.0 {
        -erf_of_nonneg(-x)
    } else {
        erf_of_nonneg(x)
    }
}

// Abramowitz & Stegun formula 7.1.28. Claims accuracy of about 7 decimal
// digits.
fn erf_of_nonneg(x: f64) -> f64 {
    // The constants, formatted for easy checking against the book:
    //    a1 = 0.07052 30784
    //    a3 = 0.00927 05272
    //    a5 = 0.00027 65672
    //    a2 = 0.04228 20123
    //    a4 = 0.00015 20143
    //    a6 = 0.00004 30638
    let a1 = 0.0705230784;
    let a3 = 0.0092705272;
    let a5 = 0.0002765672;
    let a2 = 0.0422820123;
    let a4 = 0.0001520143;
    let a6 = 0.0000430638;
    let x2 = x * x; // x squared, cubed, etc.
    let x3 = x2 * x;
    let x4 = x2 * x2;
    let x5 = x2 * x3;
    let x6 = x3 * x3;
    let sum = 1.0 + (a1 * x) + (a2 * x2) + (a3 * x3) + (a4 * x4) + (a5 * x5) + (a6 * x6);
    // Raise the sum to the 16th power.
    let sum2 = sum * sum;
    let sum4 = sum2 * sum2;
    let sum8 = sum4 * sum4;
    let sum16 = sum8 * sum8;
    1.0 - (1.0 / sum16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_greater_than_n_is_rejected() {
        assert!(estimate_unknown_p(3, 4).is_err());
        assert!(approximate_lower_bound_on_p(3, 4, 2.0).is_err());
        assert!(approximate_upper_bound_on_p(3, 4, 2.0).is_err());
    }

    #[test]
    fn test_erf_reference_values() {
        // erf(1) = 0.8427007929..., erf(2) = 0.9953222650...
        assert!((erf(1.0) - 0.8427007929).abs() < 1e-6);
        assert!((erf(2.0) - 0.9953222650).abs() < 1e-6);
        assert!((erf(-1.0) + 0.8427007929).abs() < 1e-6);
        assert_eq!(erf(0.0), 0.0);
    }

    #[test]
    fn test_normal_cdf_reference_values() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-9);
        assert!((normal_cdf(-2.0) - 0.0227502618904135701).abs() < 1e-6);
        assert!((normal_cdf(2.0) - 0.9772497381095864).abs() < 1e-6);
    }

    #[test]
    fn test_proportion_bounds_bracket_estimate() {
        for &(n, k) in &[(10u64, 0u64), (10, 1), (10, 5), (10, 9), (10, 10), (1000, 337)] {
            let est = estimate_unknown_p(n, k).unwrap();
            let lb = approximate_lower_bound_on_p(n, k, 2.0).unwrap();
            let ub = approximate_upper_bound_on_p(n, k, 2.0).unwrap();
            assert!(
                lb <= est && est <= ub,
                "bounds {lb}..{ub} do not bracket {est} (n={n}, k={k})"
            );
            assert!((0.0..=1.0).contains(&lb));
            assert!((0.0..=1.0).contains(&ub));
        }
    }

    #[test]
    fn test_zero_trials() {
        assert_eq!(estimate_unknown_p(0, 0).unwrap(), 0.5);
        assert_eq!(approximate_lower_bound_on_p(0, 0, 2.0).unwrap(), 0.0);
        assert_eq!(approximate_upper_bound_on_p(0, 0, 2.0).unwrap(), 1.0);
    }

    #[test]
    fn test_interval_narrows_with_n() {
        let narrow = approximate_upper_bound_on_p(10_000, 3_333, 2.0).unwrap()
            - approximate_lower_bound_on_p(10_000, 3_333, 2.0).unwrap();
        let wide = approximate_upper_bound_on_p(100, 33, 2.0).unwrap()
            - approximate_lower_bound_on_p(100, 33, 2.0).unwrap();
        assert!(narrow < wide);
        assert!(narrow < 0.02);
    }

    #[test]
    fn test_ratio_bounds_full_sampling_are_exact() {
        assert_eq!(lower_bound_for_b_over_a(100, 25, 1.0).unwrap(), 0.25);
        assert_eq!(upper_bound_for_b_over_a(100, 25, 1.0).unwrap(), 0.25);
        assert_eq!(estimate_of_b_over_a(100, 25), 0.25);
    }

    #[test]
    fn test_ratio_bounds_widen_under_sampling() {
        let est = estimate_of_b_over_a(1000, 333);
        let lb = lower_bound_for_b_over_a(1000, 333, 0.1).unwrap();
        let ub = upper_bound_for_b_over_a(1000, 333, 0.1).unwrap();
        assert!(lb < est && est < ub);

        let lb_tighter = lower_bound_for_b_over_a(1000, 333, 0.9).unwrap();
        let ub_tighter = upper_bound_for_b_over_a(1000, 333, 0.9).unwrap();
        assert!(lb < lb_tighter);
        assert!(ub > ub_tighter);
    }

    #[test]
    fn test_ratio_bounds_empty_a() {
        assert_eq!(lower_bound_for_b_over_a(0, 0, 0.5).unwrap(), 0.0);
        assert_eq!(upper_bound_for_b_over_a(0, 0, 0.5).unwrap(), 1.0);
        assert_eq!(estimate_of_b_over_a(0, 0), 0.5);
    }
}
