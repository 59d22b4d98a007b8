use serde::Serialize;

use super::error::{Result, SimulationError};

pub const DEFAULT_INITIAL_BALANCE: f64 = 1_000.0;
pub const DEFAULT_PERIODIC_CONTRIBUTION: f64 = 1_000.0;
pub const DEFAULT_EXPECTED_RETURN_PCT: f64 = 7.5;
pub const DEFAULT_VOLATILITY_PCT: f64 = 15.0;
pub const DEFAULT_DURATION_PERIODS: u32 = 30;
pub const DEFAULT_RUNS: u32 = 1_000;

/// Largest accepted `duration_periods`.
pub const MAX_DURATION_PERIODS: u32 = 10_000;
/// Largest accepted run count; bounds the memory held by one outcome set.
pub const MAX_RUNS: u32 = 1_000_000;

/// Validated, immutable inputs for one simulation.
///
/// Percentages are expressed in whole percent (`7.5` means 7.5%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    initial_balance: f64,
    periodic_contribution: f64,
    expected_return_pct: f64,
    volatility_pct: f64,
    duration_periods: u32,
}

impl Scenario {
    pub fn new(
        initial_balance: f64,
        periodic_contribution: f64,
        expected_return_pct: f64,
        volatility_pct: f64,
        duration_periods: u32,
    ) -> Result<Self> {
        ScenarioBuilder::new()
            .initial_balance(initial_balance)
            .periodic_contribution(periodic_contribution)
            .expected_return_pct(expected_return_pct)
            .volatility_pct(volatility_pct)
            .duration_periods(i64::from(duration_periods))
            .build()
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn periodic_contribution(&self) -> f64 {
        self.periodic_contribution
    }

    pub fn expected_return_pct(&self) -> f64 {
        self.expected_return_pct
    }

    pub fn volatility_pct(&self) -> f64 {
        self.volatility_pct
    }

    pub fn duration_periods(&self) -> u32 {
        self.duration_periods
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            periodic_contribution: DEFAULT_PERIODIC_CONTRIBUTION,
            expected_return_pct: DEFAULT_EXPECTED_RETURN_PCT,
            volatility_pct: DEFAULT_VOLATILITY_PCT,
            duration_periods: DEFAULT_DURATION_PERIODS,
        }
    }
}

/// Collects optional scenario fields, fills the absent ones with the
/// documented defaults and validates the result.
#[derive(Debug, Clone, Default)]
pub struct ScenarioBuilder {
    initial_balance: Option<f64>,
    periodic_contribution: Option<f64>,
    expected_return_pct: Option<f64>,
    volatility_pct: Option<f64>,
    duration_periods: Option<i64>,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_balance(mut self, value: f64) -> Self {
        self.initial_balance = Some(value);
        self
    }

    pub fn periodic_contribution(mut self, value: f64) -> Self {
        self.periodic_contribution = Some(value);
        self
    }

    pub fn expected_return_pct(mut self, value: f64) -> Self {
        self.expected_return_pct = Some(value);
        self
    }

    pub fn volatility_pct(mut self, value: f64) -> Self {
        self.volatility_pct = Some(value);
        self
    }

    pub fn duration_periods(mut self, value: i64) -> Self {
        self.duration_periods = Some(value);
        self
    }

    pub fn maybe_initial_balance(mut self, value: Option<f64>) -> Self {
        if value.is_some() {
            self.initial_balance = value;
        }
        self
    }

    pub fn maybe_periodic_contribution(mut self, value: Option<f64>) -> Self {
        if value.is_some() {
            self.periodic_contribution = value;
        }
        self
    }

    pub fn maybe_expected_return_pct(mut self, value: Option<f64>) -> Self {
        if value.is_some() {
            self.expected_return_pct = value;
        }
        self
    }

    pub fn maybe_volatility_pct(mut self, value: Option<f64>) -> Self {
        if value.is_some() {
            self.volatility_pct = value;
        }
        self
    }

    pub fn maybe_duration_periods(mut self, value: Option<i64>) -> Self {
        if value.is_some() {
            self.duration_periods = value;
        }
        self
    }

    pub fn build(self) -> Result<Scenario> {
        let initial_balance = non_negative(
            "initial_balance",
            self.initial_balance.unwrap_or(DEFAULT_INITIAL_BALANCE),
        )?;
        let periodic_contribution = non_negative(
            "periodic_contribution",
            self.periodic_contribution
                .unwrap_or(DEFAULT_PERIODIC_CONTRIBUTION),
        )?;
        let expected_return_pct = self
            .expected_return_pct
            .unwrap_or(DEFAULT_EXPECTED_RETURN_PCT);
        if !expected_return_pct.is_finite() {
            return Err(SimulationError::invalid(
                "expected_return_pct",
                "must be a finite number",
            ));
        }
        let volatility_pct = non_negative(
            "volatility_pct",
            self.volatility_pct.unwrap_or(DEFAULT_VOLATILITY_PCT),
        )?;

        let duration = self
            .duration_periods
            .unwrap_or(i64::from(DEFAULT_DURATION_PERIODS));
        if duration <= 0 {
            return Err(SimulationError::invalid(
                "duration_periods",
                format!("must be greater than 0, got {duration}"),
            ));
        }
        let duration_periods = u32::try_from(duration)
            .ok()
            .filter(|d| *d <= MAX_DURATION_PERIODS)
            .ok_or_else(|| {
                SimulationError::invalid(
                    "duration_periods",
                    format!("must be at most {MAX_DURATION_PERIODS}, got {duration}"),
                )
            })?;

        Ok(Scenario {
            initial_balance,
            periodic_contribution,
            expected_return_pct,
            volatility_pct,
            duration_periods,
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(SimulationError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(SimulationError::invalid(
            field,
            format!("must be greater than or equal to 0, got {value}"),
        ));
    }
    Ok(value)
}

/// Number of independent trajectories in one ensemble run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunCount(u32);

impl RunCount {
    pub fn new(requested: i64) -> Result<Self> {
        u32::try_from(requested)
            .ok()
            .filter(|n| (1..=MAX_RUNS).contains(n))
            .map(RunCount)
            .ok_or(SimulationError::InvalidRunCount { requested })
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for RunCount {
    fn default() -> Self {
        RunCount(DEFAULT_RUNS)
    }
}

/// One simulated path of balances, plus the per-period returns that drove it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    balances: Vec<f64>,
    returns: Vec<f64>,
}

impl Trajectory {
    pub(crate) fn with_capacity(initial_balance: f64, periods: usize) -> Self {
        let mut balances = Vec::with_capacity(periods + 1);
        balances.push(initial_balance);
        Self {
            balances,
            returns: Vec::with_capacity(periods),
        }
    }

    pub(crate) fn push(&mut self, return_fraction: f64, balance: f64) {
        self.returns.push(return_fraction);
        self.balances.push(balance);
    }

    /// Balances from the starting balance (index 0) to the final period.
    pub fn balances(&self) -> &[f64] {
        &self.balances
    }

    /// Fractional return applied in each period; one shorter than `balances`.
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn final_balance(&self) -> f64 {
        *self
            .balances
            .last()
            .expect("trajectory always holds the initial balance")
    }

    pub fn into_balances(self) -> Vec<f64> {
        self.balances
    }
}

/// Final balances collected from an ensemble run. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OutcomeSet {
    values: Vec<f64>,
}

impl OutcomeSet {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl From<Vec<f64>> for OutcomeSet {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

impl FromIterator<f64> for OutcomeSet {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub average: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Statistics {
    /// Field names paired with values, in presentation order.
    pub fn fields(&self) -> [(&'static str, f64); 4] {
        [
            ("average", self.average),
            ("median", self.median),
            ("min", self.min),
            ("max", self.max),
        ]
    }
}
