//! Bounded "run until equilibrium".
//!
//! The horizon doubles after every attempt that ends away from equilibrium,
//! and the search gives up with [`EcoError::Convergence`] after
//! `max_attempts` runs instead of extending forever.

use crate::error::{EcoError, Result};
use crate::integrate::{simulate, IntegratorSettings};
use crate::models::continuous::ContinuousModel;
use crate::models::discrete::{iterate, DiscreteModel};
use crate::trajectory::{Trajectory, TimeSpec, DEFAULT_SAMPLE_STEP};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumSearch {
    /// First horizon tried: time units for flows, steps for maps.
    pub initial_horizon: f64,
    pub max_attempts: usize,
    /// Accepted distance: relative to `max(1, |x*|)` against a target, the
    /// largest rate component otherwise.
    pub tolerance: f64,
}

impl Default for EquilibriumSearch {
    fn default() -> Self {
        Self {
            initial_horizon: 50.0,
            max_attempts: 12,
            tolerance: 1e-6,
        }
    }
}

impl EquilibriumSearch {
    fn validate(&self) -> Result<()> {
        if !self.initial_horizon.is_finite() || self.initial_horizon <= 0.0 {
            return Err(EcoError::invalid_value(
                "initial_horizon",
                "must be finite and positive",
            ));
        }
        if self.max_attempts == 0 {
            return Err(EcoError::invalid_value("max_attempts", "must be at least 1"));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(EcoError::invalid_value("tolerance", "must be finite and positive"));
        }
        Ok(())
    }

    fn horizon(&self, attempt: usize) -> f64 {
        self.initial_horizon * 2f64.powi(attempt as i32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumRun {
    pub trajectory: Trajectory,
    pub attempts: usize,
    pub distance: f64,
}

/// Integrates until the final state sits within tolerance of equilibrium.
///
/// With a `target` the distance is measured to it; without one it is the size
/// of the rate at the final state.
pub fn continuous_until_equilibrium(
    model: &ContinuousModel,
    y0: &[f64],
    target: Option<&[f64]>,
    search: &EquilibriumSearch,
    settings: &IntegratorSettings,
) -> Result<EquilibriumRun> {
    search.validate()?;
    check_target(model.compartments().len(), target)?;
    let mut rate = vec![0.0; y0.len()];
    run_search(search, |attempt| {
        let horizon = search.horizon(attempt);
        let times = TimeSpec::Horizon {
            horizon,
            step: DEFAULT_SAMPLE_STEP.min(horizon),
        }
        .times()?;
        let trajectory = simulate(model, y0, &times, settings)?;
        let distance = match (target, trajectory.final_state()) {
            (Some(target), Some(last)) => relative_distance(last, target),
            (None, Some(last)) => {
                model.rate(horizon, last, &mut rate);
                rate.iter().map(|v| v.abs()).fold(0.0, f64::max)
            }
            (_, None) => f64::INFINITY,
        };
        Ok((trajectory, distance))
    })
}

/// Iterates a map until its final state sits within tolerance of equilibrium.
///
/// Without a `target` the distance is `|f(x) - x|` at the final state.
pub fn discrete_until_equilibrium(
    model: &DiscreteModel,
    y0: &[f64],
    target: Option<&[f64]>,
    search: &EquilibriumSearch,
) -> Result<EquilibriumRun> {
    search.validate()?;
    check_target(model.compartments().len(), target)?;
    let mut image = vec![0.0; y0.len()];
    run_search(search, |attempt| {
        let n_steps = search.horizon(attempt).ceil() as usize;
        let trajectory = iterate(model, y0, n_steps)?;
        let distance = match (target, trajectory.final_state()) {
            (Some(target), Some(last)) => relative_distance(last, target),
            (None, Some(last)) => {
                model.step(last, &mut image);
                relative_distance(&image, last)
            }
            (_, None) => f64::INFINITY,
        };
        Ok((trajectory, distance))
    })
}

fn check_target(dim: usize, target: Option<&[f64]>) -> Result<()> {
    match target {
        Some(target) if target.len() != dim => Err(EcoError::invalid_input(
            "target",
            format!("expected {dim} compartments, got {}", target.len()),
        )),
        Some(target) if target.iter().any(|v| !v.is_finite()) => {
            Err(EcoError::invalid_value("target", "must be finite"))
        }
        _ => Ok(()),
    }
}

fn run_search<F>(search: &EquilibriumSearch, mut attempt_run: F) -> Result<EquilibriumRun>
where
    F: FnMut(usize) -> Result<(Trajectory, f64)>,
{
    let mut last = (0.0, f64::INFINITY);
    for attempt in 0..search.max_attempts {
        let (trajectory, distance) = attempt_run(attempt)?;
        let end = trajectory.final_time().unwrap_or(0.0);
        log::trace!("attempt {}: t = {end}, distance = {distance:e}", attempt + 1);
        if distance <= search.tolerance {
            return Ok(EquilibriumRun {
                trajectory,
                attempts: attempt + 1,
                distance,
            });
        }
        last = (end, distance);
    }
    log::warn!(
        "no equilibrium within {} attempts (last distance {:e})",
        search.max_attempts,
        last.1
    );
    Err(EcoError::Convergence {
        attempts: search.max_attempts,
        last_time: last.0,
        distance: last.1,
    })
}

fn relative_distance(state: &[f64], target: &[f64]) -> f64 {
    state
        .iter()
        .zip(target)
        .map(|(x, t)| (x - t).abs() / t.abs().max(1.0))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::continuous::{LogisticParams, LotkaVolterraParams};
    use crate::models::discrete::{LogisticMapParams, SourceSinkParams};

    #[test]
    fn logistic_reaches_carrying_capacity() {
        let model = ContinuousModel::Logistic(LogisticParams { r: 0.1, k: 500.0 });
        let search = EquilibriumSearch {
            initial_horizon: 10.0,
            ..EquilibriumSearch::default()
        };
        let run = continuous_until_equilibrium(
            &model,
            &[5.0],
            Some(&[500.0]),
            &search,
            &IntegratorSettings::default(),
        )
        .unwrap();
        assert!(run.attempts > 1);
        assert!(run.distance <= 1e-6);
        let end = run.trajectory.final_time().unwrap();
        assert_eq!(end, 10.0 * 2f64.powi(run.attempts as i32 - 1));
    }

    #[test]
    fn closed_orbit_never_converges() {
        let model = ContinuousModel::LotkaVolterra(LotkaVolterraParams {
            r: 1.0,
            a: 0.1,
            e: 0.5,
            d: 0.5,
        });
        let search = EquilibriumSearch {
            initial_horizon: 5.0,
            max_attempts: 3,
            tolerance: 1e-6,
        };
        let result = continuous_until_equilibrium(
            &model,
            &[20.0, 5.0],
            Some(&[10.0, 10.0]),
            &search,
            &IntegratorSettings::default(),
        );
        match result {
            Err(EcoError::Convergence {
                attempts,
                last_time,
                distance,
            }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last_time, 20.0);
                assert!(distance > 1e-6);
            }
            other => panic!("expected convergence error, got {other:?}"),
        }
    }

    #[test]
    fn source_sink_settles_without_a_target() {
        let model = DiscreteModel::SourceSink(SourceSinkParams {
            pa: 0.7,
            pj: 0.2,
            beta1: 3.0,
            beta2: 1.0,
            source_capacity: 300.0,
        });
        let run = discrete_until_equilibrium(
            &model,
            &[110.0, 100.0],
            None,
            &EquilibriumSearch::default(),
        )
        .unwrap();
        let last = run.trajectory.final_state().unwrap();
        assert!((last[1] - 900.0).abs() < 1e-3);
    }

    #[test]
    fn chaotic_map_reports_non_convergence() {
        let model = DiscreteModel::LogisticMap(LogisticMapParams { r_d: 3.9, k: 100.0 });
        let search = EquilibriumSearch {
            initial_horizon: 8.0,
            max_attempts: 4,
            tolerance: 1e-6,
        };
        let err = discrete_until_equilibrium(&model, &[50.0], None, &search).unwrap_err();
        assert!(matches!(err, EcoError::Convergence { attempts: 4, .. }));
    }

    #[test]
    fn rejects_bad_searches() {
        let model = DiscreteModel::LogisticMap(LogisticMapParams { r_d: 2.0, k: 100.0 });
        let zero = EquilibriumSearch {
            max_attempts: 0,
            ..EquilibriumSearch::default()
        };
        assert!(discrete_until_equilibrium(&model, &[10.0], None, &zero).is_err());
        let search = EquilibriumSearch::default();
        assert!(discrete_until_equilibrium(&model, &[10.0], Some(&[1.0, 2.0]), &search).is_err());
    }
}
