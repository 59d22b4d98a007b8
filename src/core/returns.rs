use super::sampler::{NormalSampler, UniformSource};
use super::types::Scenario;

/// Fractional return for one period given a standard-normal deviate.
///
/// No clamping: returns below -100% are passed through unchanged.
pub fn annual_return(scenario: &Scenario, z0: f64) -> f64 {
    let mean = scenario.expected_return_pct() * 0.01;
    let vol = scenario.volatility_pct() * 0.01;
    if vol == 0.0 {
        return mean;
    }
    mean + vol * z0
}

pub fn random_annual_return<S: UniformSource>(
    scenario: &Scenario,
    sampler: &mut NormalSampler<S>,
) -> f64 {
    let z0 = sampler.standard_normal();
    annual_return(scenario, z0)
}
