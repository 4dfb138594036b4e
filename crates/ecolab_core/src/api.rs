//! Function-call surface consumed by a UI layer.
//!
//! Every call validates its string-keyed inputs into typed records first, so
//! a malformed request fails before any arithmetic runs.

use crate::convergence::{
    continuous_until_equilibrium, discrete_until_equilibrium, EquilibriumRun, EquilibriumSearch,
};
use crate::equilibrium::{
    self, CompetitionAnalysis, EquilibriumSet, StabilityReport, SystemKind,
};
use crate::error::{EcoError, Result};
use crate::integrate::{self, IntegratorSettings};
use crate::leslie::{DominantEigen, LeslieMatrix};
use crate::models::continuous::ContinuousModel;
use crate::models::discrete::{self, DiscreteModel};
use crate::models::{ContinuousModelId, DiscreteModelId, ModelId};
use crate::params::{ParamSet, StateVector};
use crate::trajectory::{TimeSpec, Trajectory};
use crate::vector_field::{self, VectorField};

/// Integrates a continuous model with default solver settings.
pub fn simulate_continuous(
    model_id: ContinuousModelId,
    time_spec: &TimeSpec,
    init: &StateVector,
    params: &ParamSet,
) -> Result<Trajectory> {
    simulate_continuous_with(model_id, time_spec, init, params, &IntegratorSettings::default())
}

pub fn simulate_continuous_with(
    model_id: ContinuousModelId,
    time_spec: &TimeSpec,
    init: &StateVector,
    params: &ParamSet,
    settings: &IntegratorSettings,
) -> Result<Trajectory> {
    let model = ContinuousModel::from_params(model_id, params)?;
    let y0 = init.to_ordered(model.compartments())?;
    let times = time_spec.times()?;
    log::debug!(
        "simulating {model_id} over {} output times ({:?})",
        times.len(),
        settings.method
    );
    integrate::simulate(&model, &y0, &times, settings)
}

/// Iterates a discrete model for `n_steps` years.
pub fn simulate_discrete(
    model_id: DiscreteModelId,
    init: &StateVector,
    params: &ParamSet,
    n_steps: usize,
) -> Result<Trajectory> {
    let model = DiscreteModel::from_params(model_id, params)?;
    let y0 = init.to_ordered(model.compartments())?;
    discrete::iterate(&model, &y0, n_steps)
}

/// Phase-plane arrows for the first two compartments of the model.
pub fn vector_field(
    model_id: ModelId,
    trajectory: &Trajectory,
    params: &ParamSet,
    grid_density: usize,
) -> Result<VectorField> {
    vector_field_on(model_id, trajectory, params, grid_density, None)
}

/// Phase-plane arrows over a chosen pair of compartments.
pub fn vector_field_on(
    model_id: ModelId,
    trajectory: &Trajectory,
    params: &ParamSet,
    grid_density: usize,
    axes: Option<(&str, &str)>,
) -> Result<VectorField> {
    match model_id {
        ModelId::Continuous(id) => {
            let model = ContinuousModel::from_params(id, params)?;
            check_trajectory(trajectory, model.compartments())?;
            vector_field::sample(&model, SystemKind::Flow, trajectory, axes, grid_density)
        }
        ModelId::Discrete(id) => {
            let model = DiscreteModel::from_params(id, params)?;
            check_trajectory(trajectory, model.compartments())?;
            vector_field::sample(&model, SystemKind::Map, trajectory, axes, grid_density)
        }
        ModelId::Analytic(id) => Err(no_dynamics(id.as_str())),
    }
}

fn check_trajectory(trajectory: &Trajectory, compartments: &[&str]) -> Result<()> {
    trajectory.check_shape()?;
    if trajectory.compartments.iter().map(String::as_str).ne(compartments.iter().copied()) {
        return Err(EcoError::invalid_input(
            "trajectory",
            format!(
                "compartments {:?} do not match the model's {:?}",
                trajectory.compartments, compartments
            ),
        ));
    }
    Ok(())
}

fn no_dynamics(id: &str) -> EcoError {
    EcoError::invalid_input("model", format!("`{id}` has no time dynamics"))
}

/// Projects an age distribution `n_steps` times.
pub fn leslie_project(matrix: &[Vec<f64>], init: &[f64], n_steps: usize) -> Result<Trajectory> {
    LeslieMatrix::from_rows(matrix)?.project_n(init, n_steps)
}

/// Dominant eigenvalue and stable age distribution.
pub fn leslie_eigen(matrix: &[Vec<f64>]) -> Result<DominantEigen> {
    LeslieMatrix::from_rows(matrix)?.dominant_eigen()
}

pub fn equilibria(model_id: ModelId, params: &ParamSet) -> Result<EquilibriumSet> {
    equilibrium::equilibria(model_id, params)
}

/// Boundary and interior equilibria plus the outcome of two-species competition.
pub fn competition(model_id: ContinuousModelId, params: &ParamSet) -> Result<CompetitionAnalysis> {
    match ContinuousModel::from_params(model_id, params)? {
        ContinuousModel::CompetitionCarrying(p) => equilibrium::competition(&p),
        ContinuousModel::CompetitionAbsolute(p) => equilibrium::competition_absolute(&p),
        _ => Err(EcoError::invalid_input(
            "model",
            format!("`{model_id}` is not a competition model"),
        )),
    }
}

/// Linear stability of the model at `state`.
pub fn stability(
    model_id: ModelId,
    params: &ParamSet,
    state: &StateVector,
) -> Result<StabilityReport> {
    match model_id {
        ModelId::Continuous(id) => {
            let model = ContinuousModel::from_params(id, params)?;
            let x = state.to_ordered(model.compartments())?;
            equilibrium::stability(&model, SystemKind::Flow, &x)
        }
        ModelId::Discrete(id) => {
            let model = DiscreteModel::from_params(id, params)?;
            let x = state.to_ordered(model.compartments())?;
            equilibrium::stability(&model, SystemKind::Map, &x)
        }
        ModelId::Analytic(id) => Err(no_dynamics(id.as_str())),
    }
}

/// Runs the model with a doubling horizon until it stops moving.
///
/// With `target` the run must end within tolerance of that state instead.
pub fn simulate_to_equilibrium(
    model_id: ModelId,
    init: &StateVector,
    params: &ParamSet,
    target: Option<&StateVector>,
    search: &EquilibriumSearch,
) -> Result<EquilibriumRun> {
    match model_id {
        ModelId::Continuous(id) => {
            let model = ContinuousModel::from_params(id, params)?;
            let y0 = init.to_ordered(model.compartments())?;
            let target = ordered_target(target, model.compartments())?;
            continuous_until_equilibrium(
                &model,
                &y0,
                target.as_deref(),
                search,
                &IntegratorSettings::default(),
            )
        }
        ModelId::Discrete(id) => {
            let model = DiscreteModel::from_params(id, params)?;
            let y0 = init.to_ordered(model.compartments())?;
            let target = ordered_target(target, model.compartments())?;
            discrete_until_equilibrium(&model, &y0, target.as_deref(), search)
        }
        ModelId::Analytic(id) => Err(no_dynamics(id.as_str())),
    }
}

fn ordered_target(
    target: Option<&StateVector>,
    compartments: &[&str],
) -> Result<Option<Vec<f64>>> {
    target.map(|t| t.to_ordered(compartments)).transpose()
}
