//! Simulated time series and the time grids that request them.

use crate::error::{EcoError, Result};
use crate::params::StateVector;
use serde::{Deserialize, Serialize};

/// Sampling interval used when a caller only gives a horizon.
pub const DEFAULT_SAMPLE_STEP: f64 = 0.1;

/// Which output times a continuous simulation should report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeSpec {
    /// Explicit, strictly increasing output times.
    Explicit { times: Vec<f64> },
    /// `0, step, 2*step, ...` up to and including `horizon`.
    Horizon { horizon: f64, step: f64 },
}

impl TimeSpec {
    pub fn horizon(horizon: f64) -> Self {
        TimeSpec::Horizon {
            horizon,
            step: DEFAULT_SAMPLE_STEP,
        }
    }

    /// Expands into the validated output grid.
    pub fn times(&self) -> Result<Vec<f64>> {
        match self {
            TimeSpec::Explicit { times } => {
                validate_times(times)?;
                Ok(times.clone())
            }
            TimeSpec::Horizon { horizon, step } => {
                if !horizon.is_finite() || *horizon < 0.0 {
                    return Err(EcoError::invalid_value(
                        "horizon",
                        "must be finite and non-negative",
                    ));
                }
                if !step.is_finite() || *step <= 0.0 {
                    return Err(EcoError::invalid_value("step", "must be finite and positive"));
                }
                // Index-based so long horizons do not accumulate rounding.
                let count = (horizon / step + 1e-9).floor() as usize;
                let mut times: Vec<f64> = (0..=count).map(|i| i as f64 * step).collect();
                if let Some(last) = times.last_mut() {
                    if (horizon - *last).abs() <= 1e-9 * step {
                        *last = *horizon;
                    } else if *last < *horizon {
                        times.push(*horizon);
                    }
                }
                Ok(times)
            }
        }
    }
}

fn validate_times(times: &[f64]) -> Result<()> {
    if times.is_empty() {
        return Err(EcoError::invalid_input("times", "at least one output time is required"));
    }
    if times.iter().any(|t| !t.is_finite()) {
        return Err(EcoError::invalid_value("times", "must be finite"));
    }
    if times.windows(2).any(|w| w[1] <= w[0]) {
        return Err(EcoError::invalid_value("times", "must be strictly increasing"));
    }
    Ok(())
}

/// Ordered `(time, state)` samples produced by one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub compartments: Vec<String>,
    pub times: Vec<f64>,
    /// One row per time, columns ordered as `compartments`.
    pub states: Vec<Vec<f64>>,
}

impl Trajectory {
    pub fn new(compartments: &[&str]) -> Self {
        Self {
            compartments: compartments.iter().map(|c| c.to_string()).collect(),
            times: Vec::new(),
            states: Vec::new(),
        }
    }

    pub fn push(&mut self, t: f64, state: &[f64]) {
        self.times.push(t);
        self.states.push(state.to_vec());
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.compartments.len()
    }

    /// Checks that every time has one row and every row one value per compartment.
    ///
    /// Trajectories deserialized from callers are not guaranteed to be rectangular.
    pub fn check_shape(&self) -> Result<()> {
        if self.times.len() != self.states.len() {
            return Err(EcoError::invalid_input(
                "trajectory",
                format!("has {} times but {} state rows", self.times.len(), self.states.len()),
            ));
        }
        let width = self.dimension();
        if let Some(row) = self.states.iter().position(|row| row.len() != width) {
            return Err(EcoError::invalid_input(
                "trajectory",
                format!(
                    "row {row} has {} values, expected {width}",
                    self.states[row].len()
                ),
            ));
        }
        Ok(())
    }

    pub fn index_of(&self, compartment: &str) -> Result<usize> {
        self.compartments
            .iter()
            .position(|c| c == compartment)
            .ok_or_else(|| EcoError::unknown_compartment(compartment))
    }

    /// The time series of one compartment.
    pub fn series(&self, compartment: &str) -> Result<Vec<f64>> {
        let idx = self.index_of(compartment)?;
        Ok(self.states.iter().map(|row| row[idx]).collect())
    }

    pub fn final_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    pub fn final_state(&self) -> Option<&[f64]> {
        self.states.last().map(Vec::as_slice)
    }

    /// The last sample as a named state vector.
    pub fn final_named_state(&self) -> Option<StateVector> {
        let last = self.states.last()?;
        let names: Vec<&str> = self.compartments.iter().map(String::as_str).collect();
        Some(StateVector::from_parts(&names, last))
    }

    /// Appends `other`, skipping its first sample when it repeats our last time.
    pub fn extend_from(&mut self, other: &Trajectory) {
        let skip = match (self.times.last(), other.times.first()) {
            (Some(last), Some(first)) if first <= last => 1,
            _ => 0,
        };
        for (t, state) in other.times.iter().zip(&other.states).skip(skip) {
            self.push(*t, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationKind;

    #[test]
    fn horizon_expands_to_inclusive_grid() {
        let times = TimeSpec::Horizon {
            horizon: 1.0,
            step: 0.25,
        }
        .times()
        .unwrap();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn default_step_reaches_the_horizon_exactly() {
        let times = TimeSpec::horizon(50.0).times().unwrap();
        assert_eq!(times.len(), 501);
        assert_eq!(*times.last().unwrap(), 50.0);
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn ragged_horizon_appends_the_endpoint() {
        let times = TimeSpec::Horizon {
            horizon: 1.05,
            step: 0.5,
        }
        .times()
        .unwrap();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.05]);
    }

    #[test]
    fn explicit_times_must_increase() {
        let spec = TimeSpec::Explicit {
            times: vec![0.0, 1.0, 1.0],
        };
        assert!(spec.times().is_err());
        let spec = TimeSpec::Explicit { times: vec![] };
        assert!(spec.times().is_err());
    }

    #[test]
    fn series_and_extension() {
        let mut traj = Trajectory::new(&["H", "P"]);
        traj.push(0.0, &[10.0, 2.0]);
        traj.push(1.0, &[12.0, 2.5]);
        let mut tail = Trajectory::new(&["H", "P"]);
        tail.push(1.0, &[12.0, 2.5]);
        tail.push(2.0, &[13.0, 3.0]);
        traj.extend_from(&tail);
        assert_eq!(traj.times, vec![0.0, 1.0, 2.0]);
        assert_eq!(traj.series("P").unwrap(), vec![2.0, 2.5, 3.0]);
        assert!(traj.series("N").is_err());
        let last = traj.final_named_state().unwrap();
        assert_eq!(last.get("H"), Some(13.0));
    }

    #[test]
    fn ragged_rows_fail_the_shape_check() {
        let mut traj = Trajectory::new(&["H", "P"]);
        traj.push(0.0, &[10.0, 2.0]);
        assert!(traj.check_shape().is_ok());
        traj.push(1.0, &[12.0]);
        let err = traj.check_shape().unwrap_err();
        assert_eq!(err.configuration_kind(), Some(ConfigurationKind::InvalidInput));
        assert!(err.to_string().contains("row 1 has 1 values"));

        let mut short = Trajectory::new(&["H", "P"]);
        short.push(0.0, &[10.0, 2.0]);
        short.times.push(1.0);
        assert!(short.check_shape().unwrap_err().to_string().contains("2 times but 1"));
    }
}
