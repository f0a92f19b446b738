//! Wilcoxon rank-sum test (normal approximation).

use std::f64::consts::SQRT_2;

/// Test statistic and two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankSum {
    pub statistic: f64,
    pub p_value: f64,
}

/// Inputs the test cannot be computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RankSumError {
    #[error("rank-sum test needs two non-empty samples")]
    EmptySample,
    #[error("sample contains a non-finite value")]
    NonFinite,
    #[error("all observations are tied")]
    AllTied,
}

/// Two-sample Wilcoxon rank-sum test of `x` against `y`.
///
/// Ties get average ranks. The statistic is the z-score of the rank sum of
/// `x`, `(R1 - n1(n1+n2+1)/2) / sqrt(n1 n2 (n1+n2+1) / 12)`, without tie
/// correction; a positive value means `x` tends to be larger. The p-value
/// is two-sided. When every pooled value is the same the samples carry no
/// rank information and the test is reported as uncomputable.
pub fn rank_sum(x: &[f64], y: &[f64]) -> Result<RankSum, RankSumError> {
    if x.is_empty() || y.is_empty() {
        return Err(RankSumError::EmptySample);
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(RankSumError::NonFinite);
    }

    let n1 = x.len() as f64;
    let n2 = y.len() as f64;
    let n = n1 + n2;

    let mut pooled: Vec<(f64, bool)> = x
        .iter()
        .map(|&v| (v, true))
        .chain(y.iter().map(|&v| (v, false)))
        .collect();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut rank_sum_x = 0.0;
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < pooled.len() {
        let mut end = start + 1;
        while end < pooled.len() && pooled[end].0 == pooled[start].0 {
            end += 1;
        }
        // Positions start..end share the average of ranks start+1..=end.
        let rank = (start + end + 1) as f64 / 2.0;
        let from_x = pooled[start..end].iter().filter(|(_, in_x)| *in_x).count();
        rank_sum_x += rank * from_x as f64;
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }

    // Tie-corrected variance vanishes exactly when all values are equal.
    if n * n * n - n - tie_term <= 0.0 {
        return Err(RankSumError::AllTied);
    }

    let expected = n1 * (n + 1.0) / 2.0;
    let std_dev = (n1 * n2 * (n + 1.0) / 12.0).sqrt();
    let statistic = (rank_sum_x - expected) / std_dev;
    let p_value = erfc(statistic.abs() / SQRT_2).min(1.0);
    Ok(RankSum { statistic, p_value })
}

/// Complementary error function, Chebyshev fit with fractional error below
/// 1.2e-7 everywhere.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 { ans } else { 2.0 - ans }
}
