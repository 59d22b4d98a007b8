use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use tracing::debug;

use super::error::{Result, SimulationError};
use super::returns::random_annual_return;
use super::sampler::{NormalSampler, RngSource, UniformSource, derive_seed};
use super::stats::summarize;
use super::types::{OutcomeSet, RunCount, Scenario, Statistics, Trajectory};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EnsembleMode {
    /// All runs share one random stream, executed in order.
    #[default]
    Sequential,
    /// Each run draws from its own stream seeded by `derive_seed`.
    Parallel,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EnsembleOptions {
    pub runs: RunCount,
    /// Base seed. `None` picks one from OS entropy.
    pub seed: Option<u64>,
    pub mode: EnsembleMode,
    pub reuse_normal_pair: bool,
}

impl EnsembleOptions {
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

/// One period of growth: compound the balance, then add the contribution.
pub fn apply_period(balance: f64, return_fraction: f64, contribution: f64) -> f64 {
    balance * (1.0 + return_fraction) + contribution
}

/// Evolves `initial_balance` through `duration_periods` periods, drawing a
/// fresh return for each one.
pub fn simulate_growth<S: UniformSource>(
    scenario: &Scenario,
    sampler: &mut NormalSampler<S>,
) -> Trajectory {
    let periods = scenario.duration_periods() as usize;
    let contribution = scenario.periodic_contribution();
    let mut trajectory = Trajectory::with_capacity(scenario.initial_balance(), periods);

    let mut balance = scenario.initial_balance();
    for _ in 0..periods {
        let return_fraction = random_annual_return(scenario, sampler);
        balance = apply_period(balance, return_fraction, contribution);
        trajectory.push(return_fraction, balance);
    }
    trajectory
}

/// Final balance of one run. Draws exactly what [`simulate_growth`] draws,
/// without keeping the path.
pub fn final_balance<S: UniformSource>(
    scenario: &Scenario,
    sampler: &mut NormalSampler<S>,
) -> f64 {
    let contribution = scenario.periodic_contribution();
    (0..scenario.duration_periods()).fold(scenario.initial_balance(), |balance, _| {
        let return_fraction = random_annual_return(scenario, sampler);
        apply_period(balance, return_fraction, contribution)
    })
}

/// Runs `runs` independent trajectories sequentially against one sampler.
pub fn run_simulations<S: UniformSource>(
    scenario: &Scenario,
    runs: RunCount,
    sampler: &mut NormalSampler<S>,
) -> OutcomeSet {
    (0..runs.get())
        .map(|_| final_balance(scenario, sampler))
        .collect()
}

/// Like [`run_simulations`], but checks `cancel` before scheduling each run.
pub fn run_simulations_with_cancel<S: UniformSource>(
    scenario: &Scenario,
    runs: RunCount,
    sampler: &mut NormalSampler<S>,
    cancel: &AtomicBool,
) -> Result<OutcomeSet> {
    let mut outcomes = Vec::with_capacity(runs.as_usize());
    for _ in 0..runs.get() {
        if cancel.load(Ordering::Relaxed) {
            return Err(SimulationError::Cancelled {
                completed: outcomes.len(),
            });
        }
        outcomes.push(final_balance(scenario, sampler));
    }
    Ok(OutcomeSet::from(outcomes))
}

/// Runs trajectories on the rayon pool. Run `i` always uses the stream seeded
/// by `derive_seed(base_seed, i)`, so results do not depend on thread count.
pub fn run_simulations_parallel(
    scenario: &Scenario,
    runs: RunCount,
    base_seed: u64,
    reuse_normal_pair: bool,
) -> OutcomeSet {
    let values: Vec<f64> = (0..runs.get())
        .into_par_iter()
        .map(|run_index| {
            let mut sampler = run_sampler(
                EnsembleMode::Parallel,
                base_seed,
                u64::from(run_index),
                reuse_normal_pair,
            );
            final_balance(scenario, &mut sampler)
        })
        .collect();
    OutcomeSet::from(values)
}

fn run_sampler(
    mode: EnsembleMode,
    base_seed: u64,
    run_index: u64,
    reuse_normal_pair: bool,
) -> NormalSampler<RngSource<StdRng>> {
    let seed = match mode {
        EnsembleMode::Sequential => base_seed,
        EnsembleMode::Parallel => derive_seed(base_seed, run_index),
    };
    let source = RngSource::seeded(seed);
    if reuse_normal_pair {
        NormalSampler::with_pair_reuse(source)
    } else {
        NormalSampler::new(source)
    }
}

/// Builds the outcome set for `scenario` with the given seed.
pub fn run_ensemble_seeded(
    scenario: &Scenario,
    options: &EnsembleOptions,
    seed: u64,
) -> OutcomeSet {
    debug!(
        runs = options.runs.get(),
        seed,
        mode = ?options.mode,
        duration = scenario.duration_periods(),
        "running ensemble"
    );
    match options.mode {
        EnsembleMode::Sequential => {
            let mut sampler = run_sampler(
                EnsembleMode::Sequential,
                seed,
                0,
                options.reuse_normal_pair,
            );
            run_simulations(scenario, options.runs, &mut sampler)
        }
        EnsembleMode::Parallel => {
            run_simulations_parallel(scenario, options.runs, seed, options.reuse_normal_pair)
        }
    }
}

pub fn run_ensemble(scenario: &Scenario, options: &EnsembleOptions) -> OutcomeSet {
    run_ensemble_seeded(scenario, options, options.resolved_seed())
}

/// The trajectory that run 0 of an ensemble with this seed would follow.
pub fn first_trajectory(
    scenario: &Scenario,
    options: &EnsembleOptions,
    seed: u64,
) -> Trajectory {
    let mut sampler = run_sampler(options.mode, seed, 0, options.reuse_normal_pair);
    simulate_growth(scenario, &mut sampler)
}

pub fn simulation_statistics(scenario: &Scenario, options: &EnsembleOptions) -> Statistics {
    summarize(&run_ensemble(scenario, options))
}
