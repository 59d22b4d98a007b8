mod engine;
mod error;
mod returns;
mod sampler;
mod stats;
mod types;

pub use engine::{
    EnsembleMode, EnsembleOptions, apply_period, final_balance, first_trajectory, run_ensemble,
    run_ensemble_seeded, run_simulations, run_simulations_parallel, run_simulations_with_cancel,
    simulate_growth, simulation_statistics,
};
pub use error::{Result, SimulationError};
pub use returns::{annual_return, random_annual_return};
pub use sampler::{NormalSampler, RngSource, UniformSource, box_muller, derive_seed};
pub use stats::{summarize, summarize_values};
pub use types::{
    DEFAULT_DURATION_PERIODS, DEFAULT_EXPECTED_RETURN_PCT, DEFAULT_INITIAL_BALANCE,
    DEFAULT_PERIODIC_CONTRIBUTION, DEFAULT_RUNS, DEFAULT_VOLATILITY_PCT, MAX_DURATION_PERIODS,
    MAX_RUNS, OutcomeSet, RunCount, Scenario, ScenarioBuilder, Statistics, Trajectory,
};
