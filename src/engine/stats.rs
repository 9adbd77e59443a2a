//! Distribution and descriptive-statistics helpers shared by generators
//! and answer computations.

/// Critical z-value for a common confidence level (percent). Unlisted
/// levels fall back to the 95% value.
pub fn z_for_confidence(confidence_percent: i64) -> f64 {
    match confidence_percent {
        90 => 1.645,
        95 => 1.96,
        99 => 2.576,
        _ => 1.96,
    }
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Error function, Abramowitz & Stegun formula 7.1.26 (|error| < 1.5e-7).
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Inverse of the standard normal CDF, Acklam's rational approximation.
pub fn normal_ppf(p: f64) -> f64 {
    debug_assert!(p > 0.0 && p < 1.0, "probability must be in (0, 1)");

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

/// Binomial coefficient as a float, multiplicative form to avoid overflow
/// for the trial counts quiz questions use.
fn binomial_coefficient(n: u64, k: u64) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 0..k {
        result *= (n - i) as f64 / (i + 1) as f64;
    }
    result
}

/// P(X = k) for X ~ Binomial(n, p).
pub fn binomial_pmf(k: u64, n: u64, p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) || k > n {
        return 0.0;
    }
    binomial_coefficient(n, k) * p.powi(k as i32) * (1.0 - p).powi((n - k) as i32)
}

/// P(X <= k) for X ~ Binomial(n, p).
pub fn binomial_cdf(k: u64, n: u64, p: f64) -> f64 {
    (0..=k.min(n)).map(|i| binomial_pmf(i, n, p)).sum()
}

/// P(X = k) for X ~ Poisson(lambda), computed iteratively for stability.
pub fn poisson_pmf(k: u64, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 0.0;
    }
    let mut pmf = (-lambda).exp();
    for i in 1..=k {
        pmf *= lambda / i as f64;
    }
    pmf
}

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample variance with the n-1 denominator. Needs at least two points.
pub fn sample_variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data);
    let sum_sq: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
    Some(sum_sq / (data.len() - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn z_table_covers_common_levels() {
        assert_eq!(z_for_confidence(90), 1.645);
        assert_eq!(z_for_confidence(95), 1.96);
        assert_eq!(z_for_confidence(99), 2.576);
        assert_eq!(z_for_confidence(85), 1.96);
    }

    #[test]
    fn normal_cdf_matches_reference_points() {
        assert!(close(normal_cdf(0.0), 0.5, 1e-9));
        assert!(close(normal_cdf(1.96), 0.975, 1e-4));
        assert!(close(normal_cdf(-1.645), 0.05, 1e-3));
    }

    #[test]
    fn normal_ppf_inverts_cdf() {
        for &p in &[0.01, 0.05, 0.5, 0.8, 0.975, 0.995] {
            let z = normal_ppf(p);
            assert!(close(normal_cdf(z), p, 1e-4), "round trip failed at {p}");
        }
    }

    #[test]
    fn binomial_pmf_known_value() {
        // P(X=2) for n=5, p=0.5 is 10/32
        assert!(close(binomial_pmf(2, 5, 0.5), 0.3125, 1e-12));
        assert_eq!(binomial_pmf(6, 5, 0.5), 0.0);
    }

    #[test]
    fn binomial_cdf_sums_to_one() {
        assert!(close(binomial_cdf(10, 10, 0.3), 1.0, 1e-12));
        assert!(close(binomial_cdf(1, 2, 0.5), 0.75, 1e-12));
    }

    #[test]
    fn poisson_pmf_known_value() {
        assert!(close(poisson_pmf(0, 2.0), (-2.0f64).exp(), 1e-12));
        assert!(close(poisson_pmf(3, 2.0), (-2.0f64).exp() * 8.0 / 6.0, 1e-12));
    }

    #[test]
    fn sample_variance_uses_n_minus_one() {
        let data = [2.0, 4.0, 6.0];
        assert!(close(sample_variance(&data).expect("three points"), 4.0, 1e-12));
        assert!(sample_variance(&[1.0]).is_none());
    }
}
