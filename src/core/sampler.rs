use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A stream of uniform draws in `[0, 1)`.
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

impl<S: UniformSource + ?Sized> UniformSource for &mut S {
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }
}

/// Adapts any `rand` generator into a [`UniformSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> UniformSource for RngSource<R> {
    fn next_uniform(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// Box-Muller transform of two uniform draws into two independent
/// standard-normal deviates. `u1` must be strictly positive.
pub fn box_muller(u1: f64, u2: f64) -> (f64, f64) {
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * PI * u2;
    (r * theta.cos(), r * theta.sin())
}

/// Produces standard-normal deviates from a [`UniformSource`].
///
/// A `u1` draw of exactly zero is discarded and redrawn, so the logarithm is
/// always defined. By default the second deviate of each Box-Muller pair is
/// thrown away, which keeps two uniform draws per deviate. With pair reuse
/// enabled it is returned on the following call instead.
#[derive(Debug, Clone)]
pub struct NormalSampler<S> {
    source: S,
    reuse_pair: bool,
    cached_normal: Option<f64>,
}

impl<S: UniformSource> NormalSampler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            reuse_pair: false,
            cached_normal: None,
        }
    }

    pub fn with_pair_reuse(source: S) -> Self {
        Self {
            source,
            reuse_pair: true,
            cached_normal: None,
        }
    }

    pub fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.cached_normal.take() {
            return z;
        }

        let u1 = self.positive_uniform();
        let u2 = self.source.next_uniform();
        let (z0, z1) = box_muller(u1, u2);
        if self.reuse_pair {
            self.cached_normal = Some(z1);
        }
        z0
    }

    fn positive_uniform(&mut self) -> f64 {
        loop {
            let u = self.source.next_uniform();
            if u > 0.0 {
                return u;
            }
        }
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

/// Seed for one run of a parallel ensemble, decorrelated from its neighbours.
pub fn derive_seed(base_seed: u64, run_index: u64) -> u64 {
    splitmix64(base_seed ^ run_index.rotate_left(32))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::UniformSource;

    /// Replays a fixed list of uniform draws, cycling when exhausted.
    #[derive(Debug, Clone)]
    pub struct ScriptedSource {
        draws: Vec<f64>,
        next: usize,
    }

    impl ScriptedSource {
        pub fn new(draws: &[f64]) -> Self {
            assert!(!draws.is_empty(), "scripted source needs at least one draw");
            Self {
                draws: draws.to_vec(),
                next: 0,
            }
        }

        pub fn consumed(&self) -> usize {
            self.next
        }
    }

    impl UniformSource for ScriptedSource {
        fn next_uniform(&mut self) -> f64 {
            let value = self.draws[self.next % self.draws.len()];
            self.next += 1;
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedSource;
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-12;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn box_muller_matches_closed_form() {
        let (z0, z1) = box_muller(0.5, 0.25);
        let r = (-2.0 * 0.5_f64.ln()).sqrt();
        assert_approx(z0, r * (0.5 * PI).cos());
        assert_approx(z1, r);
    }

    #[test]
    fn sampler_consumes_two_draws_and_discards_second_deviate() {
        let mut sampler = NormalSampler::new(ScriptedSource::new(&[0.5, 0.0, 0.5, 0.5]));
        let first = sampler.standard_normal();
        let second = sampler.standard_normal();
        let r = (-2.0 * 0.5_f64.ln()).sqrt();
        assert_approx(first, r);
        assert_approx(second, -r);
        assert_eq!(sampler.into_source().consumed(), 4);
    }

    #[test]
    fn sampler_redraws_zero_u1() {
        let mut sampler = NormalSampler::new(ScriptedSource::new(&[0.0, 0.0, 0.5, 0.0]));
        let z = sampler.standard_normal();
        assert!(z.is_finite());
        assert_approx(z, (-2.0 * 0.5_f64.ln()).sqrt());
        assert_eq!(sampler.into_source().consumed(), 4);
    }

    #[test]
    fn pair_reuse_returns_cached_sine_deviate() {
        let mut sampler = NormalSampler::with_pair_reuse(ScriptedSource::new(&[0.5, 0.25]));
        let (expected0, expected1) = box_muller(0.5, 0.25);
        assert_approx(sampler.standard_normal(), expected0);
        assert_approx(sampler.standard_normal(), expected1);
        assert_eq!(sampler.into_source().consumed(), 2);
    }

    #[test]
    fn seeded_sources_are_reproducible() {
        let mut a = NormalSampler::new(RngSource::seeded(7));
        let mut b = NormalSampler::new(RngSource::seeded(7));
        for _ in 0..32 {
            assert_eq!(a.standard_normal().to_bits(), b.standard_normal().to_bits());
        }
    }

    #[test]
    fn entropy_source_draws_unit_interval() {
        let mut source = RngSource::from_entropy();
        for _ in 0..256 {
            let u = source.next_uniform();
            assert!((0.0..1.0).contains(&u), "draw {u} outside [0, 1)");
        }
    }

    #[test]
    fn seeded_sampler_has_roughly_standard_moments() {
        let mut sampler = NormalSampler::new(RngSource::seeded(2024));
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| sampler.standard_normal()).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }

    #[test]
    fn derive_seed_changes_per_run() {
        let a = derive_seed(42, 0);
        let b = derive_seed(42, 1);
        let c = derive_seed(43, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, derive_seed(42, 0));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_box_muller_is_finite_for_open_unit_draws(
            u1 in 1e-300_f64..1.0,
            u2 in 0.0_f64..1.0,
        ) {
            let (z0, z1) = box_muller(u1, u2);
            prop_assert!(z0.is_finite());
            prop_assert!(z1.is_finite());
            let radius_sq = z0 * z0 + z1 * z1;
            prop_assert!((radius_sq - (-2.0 * u1.ln())).abs() <= 1e-9 * radius_sq.max(1.0));
        }
    }
}
