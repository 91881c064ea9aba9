use statrs::distribution::{Binomial, DiscreteCDF};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BinomialError {
    #[error("Success probability must lie in [0, 1], got {0}")]
    InvalidProbability(f64),
    #[error("Binomial construction failed for n={n}, p={p}: {reason}")]
    Distribution { n: u64, p: f64, reason: String },
}

/// Parameters of a binomial distribution.
///
/// Models `n` independent Bernoulli trials with success probability `p`.
/// X is the number of successes.
#[derive(Debug, Clone)]
pub struct BinomialParams {
    n: u64,
    p: f64,
    dist: Binomial,
}

impl BinomialParams {
    /// Construct validated binomial parameters.
    ///
    /// # Parameters
    /// - `n`: Number of trials.
    /// - `p`: Success probability, in `[0, 1]`.
    ///
    /// # Returns
    /// Validated parameters or [`BinomialError::InvalidProbability`].
    pub fn new(n: u64, p: f64) -> Result<Self, BinomialError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(BinomialError::InvalidProbability(p));
        }
        let dist = Binomial::new(p, n).map_err(|e| BinomialError::Distribution {
            n,
            p,
            reason: e.to_string(),
        })?;
        Ok(Self { n, p, dist })
    }

    /// Number of trials.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Success probability.
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Expected value `E[X] = n * p`.
    pub fn mean(&self) -> f64 {
        self.n as f64 * self.p
    }

    /// Variance `n * p * (1 - p)`.
    pub fn variance(&self) -> f64 {
        self.n as f64 * self.p * (1.0 - self.p)
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Left tail `P(X <= k)`.
    ///
    /// Defined for every integer `k`: negative `k` gives 0 and `k >= n`
    /// gives 1, so `cdf(r - 1)` is safe to call with `r = 0`.
    pub fn cdf(&self, k: i64) -> f64 {
        if k < 0 {
            return 0.0;
        }
        let k = k as u64;
        if k >= self.n {
            return 1.0;
        }
        if self.p == 0.0 {
            return 1.0;
        }
        if self.p == 1.0 {
            return 0.0;
        }
        self.dist.cdf(k)
    }

    /// Right tail `P(X > k)`.
    ///
    /// Evaluated directly rather than as `1 - cdf(k)` so tiny upper tails
    /// keep their relative precision.
    pub fn sf(&self, k: i64) -> f64 {
        if k < 0 {
            return 1.0;
        }
        let k = k as u64;
        if k >= self.n {
            return 0.0;
        }
        if self.p == 0.0 {
            return 0.0;
        }
        if self.p == 1.0 {
            return 1.0;
        }
        self.dist.sf(k)
    }
}

/// `F(k; n, p) = P(X <= k)` for `X ~ Binomial(n, p)`.
pub fn cdf(k: i64, n: u64, p: f64) -> Result<f64, BinomialError> {
    Ok(BinomialParams::new(n, p)?.cdf(k))
}

/// `P(X > k)` for `X ~ Binomial(n, p)`.
pub fn sf(k: i64, n: u64, p: f64) -> Result<f64, BinomialError> {
    Ok(BinomialParams::new(n, p)?.sf(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_cdf_small_exact() {
        // Bin(4, 0.5): P(X <= 1) = (1 + 4) / 16
        let params = BinomialParams::new(4, 0.5).unwrap();
        assert!(close(params.cdf(1), 5.0 / 16.0, 1e-12));
        assert!(close(params.sf(1), 11.0 / 16.0, 1e-12));
    }

    #[test]
    fn test_cdf_out_of_support() {
        let params = BinomialParams::new(10, 0.3).unwrap();
        assert_eq!(params.cdf(-1), 0.0);
        assert_eq!(params.cdf(-50), 0.0);
        assert_eq!(params.cdf(10), 1.0);
        assert_eq!(params.cdf(11), 1.0);
        assert_eq!(params.sf(-1), 1.0);
        assert_eq!(params.sf(10), 0.0);
    }

    #[test]
    fn test_zero_trials() {
        let params = BinomialParams::new(0, 0.4).unwrap();
        assert_eq!(params.cdf(0), 1.0);
        assert_eq!(params.sf(0), 0.0);
        assert_eq!(params.mean(), 0.0);
    }

    #[test]
    fn test_degenerate_probabilities() {
        let never = BinomialParams::new(5, 0.0).unwrap();
        assert_eq!(never.cdf(0), 1.0);
        assert_eq!(never.sf(0), 0.0);

        let always = BinomialParams::new(5, 1.0).unwrap();
        assert_eq!(always.cdf(4), 0.0);
        assert_eq!(always.cdf(5), 1.0);
        assert_eq!(always.sf(4), 1.0);
    }

    #[test]
    fn test_r_zero_tail_is_certain() {
        // P(X >= 0) = 1
        let params = BinomialParams::new(25, 0.2).unwrap();
        assert_eq!(params.sf(-1), 1.0);
        // P(X <= 0) = (1 - p)^n
        assert!(close(params.cdf(0), 0.8f64.powi(25), 1e-14));
    }

    #[test]
    fn test_invalid_probability() {
        assert!(matches!(
            BinomialParams::new(10, -0.1),
            Err(BinomialError::InvalidProbability(_))
        ));
        assert!(BinomialParams::new(10, 1.5).is_err());
        assert!(BinomialParams::new(10, f64::NAN).is_err());
        assert!(cdf(3, 10, 2.0).is_err());
    }

    #[test]
    fn test_moments() {
        let params = BinomialParams::new(600, 0.25).unwrap();
        assert!(close(params.mean(), 150.0, 1e-12));
        assert!(close(params.variance(), 112.5, 1e-12));
        assert!(close(params.std_dev(), 112.5f64.sqrt(), 1e-12));
    }

    #[test]
    fn test_user_scenario_value() {
        // Reference point shared with the inverse solver tests.
        let f = cdf(149, 600, 0.2210495).unwrap();
        assert!(close(f, 0.95, 1e-6), "F(149; 600, 0.2210495) = {f}");
    }

    #[test]
    fn test_small_upper_tail_keeps_precision() {
        // P(X > 45) for Bin(50, 0.1) is ~1e-40; 1 - cdf would round to zero.
        let params = BinomialParams::new(50, 0.1).unwrap();
        let tail = params.sf(45);
        assert!(tail > 0.0 && tail < 1e-30, "tail = {tail}");
    }

    // ---------------------------------------------------------------
    // Proptest: property-based / randomized tests
    // ---------------------------------------------------------------

    use proptest::prelude::*;
    use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence, RngAlgorithm};

    fn prob_proptest_config() -> ProptestConfig {
        ProptestConfig {
            cases: 64,
            source_file: Some(file!()),
            failure_persistence: Some(Box::new(FileFailurePersistence::WithSource(
                "proptest-regressions",
            ))),
            rng_algorithm: RngAlgorithm::ChaCha,
            ..ProptestConfig::default()
        }
    }

    proptest! {
        #![proptest_config(prob_proptest_config())]

        /// cdf(k) + sf(k) = 1 across the support.
        #[test]
        fn cdf_and_sf_are_complementary(n in 1u64..400, p in 0.01f64..0.99, k_frac in 0.0f64..=1.0) {
            let params = BinomialParams::new(n, p).unwrap();
            let k = (k_frac * n as f64) as i64;
            let total = params.cdf(k) + params.sf(k);
            prop_assert!((total - 1.0).abs() < 1e-9, "cdf + sf = {total} for n={n}, p={p}, k={k}");
        }

        /// The CDF is non-decreasing in k.
        #[test]
        fn cdf_is_monotone_in_k(n in 1u64..300, p in 0.01f64..0.99) {
            let params = BinomialParams::new(n, p).unwrap();
            let mut prev = 0.0;
            for k in -1..=(n as i64) {
                let f = params.cdf(k);
                prop_assert!(f + 1e-12 >= prev, "cdf({k}) = {f} < cdf({}) = {prev}", k - 1);
                prop_assert!((0.0..=1.0).contains(&f));
                prev = f;
            }
        }

        /// For k < n, F(k; n, p) is non-increasing in p.
        #[test]
        fn cdf_is_non_increasing_in_p(
            n in 1u64..300,
            k_frac in 0.0f64..1.0,
            p1 in 0.01f64..0.99,
            p2 in 0.01f64..0.99,
        ) {
            let k = ((k_frac * n as f64) as i64).min(n as i64 - 1);
            let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
            let f_lo = cdf(k, n, lo).unwrap();
            let f_hi = cdf(k, n, hi).unwrap();
            prop_assert!(f_hi <= f_lo + 1e-12, "F({k}; {n}, {hi}) = {f_hi} > F({k}; {n}, {lo}) = {f_lo}");
        }
    }
}
