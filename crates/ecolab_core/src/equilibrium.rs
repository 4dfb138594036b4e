//! Closed-form equilibria, zero-growth isoclines and local stability.
//!
//! Every calculator is total over its algebraic domain and reports a
//! [`EcoError::Domain`] instead of returning a NaN, an infinity, or an
//! equilibrium with a negative population.

use crate::error::{EcoError, Result};
use crate::models::continuous::{
    CompetitionAbsoluteParams, CompetitionCarryingParams, ContinuousModel, TilmanParams,
    TwoPredatorParams,
};
use crate::models::discrete::{DiscreteModel, NicholsonBaileyParams, SourceSinkParams};
use crate::models::{AnalyticModelId, ModelId, ModelParams};
use crate::params::{ParamReader, ParamSet};
use crate::traits::DynamicalSystem;
use nalgebra::{DMatrix, Matrix2, Vector2};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether the system is a flow (`dx/dt = f`) or a map (`x' = f`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemKind {
    Flow,
    Map,
}

/// Named equilibrium values, e.g. `H*`, `P*`, `S_eq`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquilibriumSet(BTreeMap<String, f64>);

impl EquilibriumSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

fn ratio(numerator: f64, denominator: f64, what: &str) -> Result<f64> {
    if denominator == 0.0 {
        return Err(EcoError::domain(format!("{what}: denominator is zero")));
    }
    let value = numerator / denominator;
    if !value.is_finite() {
        return Err(EcoError::domain(format!("{what} is not finite")));
    }
    Ok(value)
}

// --- Resource competition ---

/// Break-even resource levels of the two Tilman consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RStar {
    /// `values[i][j]` is consumer `i`'s R* on resource `j`.
    pub values: [[f64; 2]; 2],
    /// Index of the resource that limits each consumer.
    pub limiting: [usize; 2],
}

impl RStar {
    /// The R* each consumer realizes on its limiting resource.
    pub fn realized(&self) -> [f64; 2] {
        [
            self.values[0][self.limiting[0]],
            self.values[1][self.limiting[1]],
        ]
    }
}

/// R*_ij = k_ij m_i / (r_i - m_i); a consumer is limited by its larger R*.
pub fn r_star(params: &TilmanParams) -> Result<RStar> {
    let consumers = [
        (params.r1, params.m1, [params.k11, params.k12]),
        (params.r2, params.m2, [params.k21, params.k22]),
    ];
    let mut values = [[0.0; 2]; 2];
    let mut limiting = [0; 2];
    for (i, (r, m, k)) in consumers.iter().enumerate() {
        if r <= m {
            return Err(EcoError::domain(format!(
                "consumer {} cannot break even: r{} = {r} does not exceed m{} = {m}",
                i + 1,
                i + 1,
                i + 1
            )));
        }
        for j in 0..2 {
            values[i][j] = k[j] * m / (r - m);
        }
        limiting[i] = if values[i][1] > values[i][0] { 1 } else { 0 };
    }
    Ok(RStar { values, limiting })
}

/// R*_i = d_i / (a_i (e_i - d_i T_h,i)) for the two shared-resource predators.
pub fn two_predator_r_star(params: &TwoPredatorParams) -> Result<[f64; 2]> {
    let predators = [
        (params.a1, params.e1, params.d1, params.t_h1),
        (params.a2, params.e2, params.d2, params.t_h2),
    ];
    let mut out = [0.0; 2];
    for (i, (a, e, d, t_h)) in predators.iter().enumerate() {
        let margin = e - d * t_h;
        if margin <= 0.0 || *a <= 0.0 {
            return Err(EcoError::domain(format!(
                "predator {n} cannot persist: needs a{n} > 0 and e{n} > d{n} T_h{n}",
                n = i + 1
            )));
        }
        out[i] = ratio(*d, a * margin, "predator R*")?;
    }
    Ok(out)
}

// --- Predator-prey isoclines ---

/// Prey density at which predator growth is zero (the vertical isocline).
///
/// H* = d/(ea) for a linear response, d/(ea - adT_h) for a Type II response.
pub fn vertical_isocline(model: &ContinuousModel) -> Result<f64> {
    let (a, e, d, t_h) = match model {
        ContinuousModel::LotkaVolterra(p) => (p.a, p.e, p.d, 0.0),
        ContinuousModel::LogisticPrey(p) => (p.a, p.e, p.d, 0.0),
        ContinuousModel::HollingTypeTwo(p) => (p.a, p.e, p.d, p.t_h),
        ContinuousModel::RosenzweigMacArthur(p) => (p.a, p.e, p.d, p.t_h),
        other => return Err(not_predator_prey(other)),
    };
    let denominator = e * a - a * d * t_h;
    if denominator <= 0.0 {
        return Err(EcoError::domain(
            "predator cannot persist: ea must exceed adT_h",
        ));
    }
    ratio(d, denominator, "prey isocline H*")
}

/// Predator density at which prey growth is zero, as a function of `h`.
pub fn sloped_isocline(model: &ContinuousModel, h: f64) -> Result<f64> {
    let value = match model {
        ContinuousModel::LotkaVolterra(p) => ratio(p.r, p.a, "predator isocline")?,
        ContinuousModel::LogisticPrey(p) => {
            ratio(p.r, p.a, "predator isocline")? * (1.0 - h / p.k)
        }
        ContinuousModel::HollingTypeTwo(p) => {
            ratio(p.r, p.a, "predator isocline")? * (1.0 + p.a * p.t_h * h)
        }
        ContinuousModel::RosenzweigMacArthur(p) => {
            let saturation = 1.0 + p.a * p.t_h * h;
            ratio(p.r, p.a, "predator isocline")? * (1.0 - h / p.k) * saturation
        }
        other => return Err(not_predator_prey(other)),
    };
    Ok(value)
}

fn not_predator_prey(model: &ContinuousModel) -> EcoError {
    EcoError::invalid_input(
        "model",
        format!("`{}` has no predator-prey isoclines", model.id()),
    )
}

/// Coexistence point where the two isoclines cross.
pub fn predator_prey_equilibrium(model: &ContinuousModel) -> Result<[f64; 2]> {
    let h = vertical_isocline(model)?;
    let p = sloped_isocline(model, h)?;
    if p < 0.0 {
        return Err(EcoError::domain(format!(
            "predator cannot persist: prey isocline H* = {h} exceeds the carrying capacity"
        )));
    }
    Ok([h, p])
}

// --- Lotka-Volterra competition ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompetitionOutcome {
    /// Each species can invade the other's monoculture.
    StableCoexistence,
    /// Neither can invade; whichever establishes first wins.
    PriorityEffect,
    /// Only `winner` (1 or 2) can invade.
    Exclusion { winner: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompetitionAnalysis {
    pub species1_only: [f64; 2],
    pub species2_only: [f64; 2],
    /// Isocline intersection, when both coordinates are positive.
    pub interior: Option<[f64; 2]>,
    /// `1 - alpha12 alpha21`, the determinant of the isocline system.
    pub determinant: f64,
    pub outcome: CompetitionOutcome,
}

/// Equilibria and outcome of two-species competition in carrying-capacity form.
pub fn competition(params: &CompetitionCarryingParams) -> Result<CompetitionAnalysis> {
    let system = Matrix2::new(1.0, params.alpha12, params.alpha21, 1.0);
    let determinant = system.determinant();
    if determinant == 0.0 {
        return Err(EcoError::domain(
            "competition isoclines are parallel (alpha12 * alpha21 = 1)",
        ));
    }
    let solution = system
        .lu()
        .solve(&Vector2::new(params.k1, params.k2))
        .ok_or_else(|| EcoError::domain("competition isocline system is singular"))?;
    let interior = (solution[0] > 0.0 && solution[1] > 0.0).then(|| [solution[0], solution[1]]);

    let one_invades = params.k1 > params.alpha12 * params.k2;
    let two_invades = params.k2 > params.alpha21 * params.k1;
    let outcome = match (one_invades, two_invades) {
        (true, true) => CompetitionOutcome::StableCoexistence,
        (false, false) => CompetitionOutcome::PriorityEffect,
        (true, false) => CompetitionOutcome::Exclusion { winner: 1 },
        (false, true) => CompetitionOutcome::Exclusion { winner: 2 },
    };

    Ok(CompetitionAnalysis {
        species1_only: [params.k1, 0.0],
        species2_only: [0.0, params.k2],
        interior,
        determinant,
        outcome,
    })
}

/// Same analysis for the absolute-coefficient form.
pub fn competition_absolute(params: &CompetitionAbsoluteParams) -> Result<CompetitionAnalysis> {
    let mut analysis = competition(&params.to_carrying_capacity()?)?;
    analysis.determinant =
        params.alpha11 * params.alpha22 - params.alpha12 * params.alpha21;
    Ok(analysis)
}

// --- Discrete models ---

/// n2* = (lambda1 - 1) N* / (1 - lambda2), with the source full at N*.
pub fn source_sink(params: &SourceSinkParams) -> Result<[f64; 2]> {
    let (lambda1, lambda2) = params.growth_rates();
    if lambda1 <= 1.0 {
        return Err(EcoError::domain(format!(
            "source does not grow (lambda1 = {lambda1}); no surplus reaches the sink"
        )));
    }
    if lambda2 >= 1.0 {
        return Err(EcoError::domain(format!(
            "sink grows on its own (lambda2 = {lambda2}); it has no finite equilibrium"
        )));
    }
    let sink = (lambda1 - 1.0) * params.source_capacity / (1.0 - lambda2);
    Ok([params.source_capacity, sink])
}

/// H* = lambda ln(lambda) / ((lambda - 1) a c), P* = ln(lambda) / a.
pub fn nicholson_bailey(params: &NicholsonBaileyParams) -> Result<[f64; 2]> {
    let NicholsonBaileyParams { lambda, a, c } = *params;
    if lambda <= 1.0 {
        return Err(EcoError::domain("hosts cannot persist unless lambda > 1"));
    }
    let log_lambda = lambda.ln();
    let host = ratio(lambda * log_lambda, (lambda - 1.0) * a * c, "host equilibrium")?;
    let parasitoid = ratio(log_lambda, a, "parasitoid equilibrium")?;
    Ok([host, parasitoid])
}

// --- Island biogeography ---

/// MacArthur-Wilson island: mainland pool `M`, distance `D`, area `A`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IslandParams {
    #[serde(rename = "M")]
    pub pool: f64,
    #[serde(rename = "D")]
    pub distance: f64,
    #[serde(rename = "A")]
    pub area: f64,
}

impl ModelParams for IslandParams {
    const PARAMS: &'static [&'static str] = &["M", "D", "A"];
    const COMPARTMENTS: &'static [&'static str] = &["S"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            pool: reader.positive("M")?,
            distance: reader.positive("D")?,
            area: reader.positive("A")?,
        })
    }
}

impl IslandParams {
    /// I(S) = (1/D)(1 - S/M)
    pub fn immigration(&self, species: f64) -> f64 {
        (1.0 - species / self.pool) / self.distance
    }

    /// E(S) = (1/A)(S/M)
    pub fn extinction(&self, species: f64) -> f64 {
        species / self.pool / self.area
    }

    /// S_eq = M A / (D + A), where the two rate curves cross.
    pub fn equilibrium_richness(&self) -> f64 {
        self.pool * self.area / (self.distance + self.area)
    }
}

// --- Local stability ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexNumber {
    pub re: f64,
    pub im: f64,
}

impl From<Complex<f64>> for ComplexNumber {
    fn from(value: Complex<f64>) -> Self {
        Self {
            re: value.re,
            im: value.im,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    Stable,
    Unstable,
    /// Leading eigenvalue on the stability boundary, within tolerance.
    Centre,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    /// Row-major `dim x dim` Jacobian.
    pub jacobian: Vec<f64>,
    pub eigenvalues: Vec<ComplexNumber>,
    pub stability: Stability,
}

const BOUNDARY_TOLERANCE: f64 = 1e-6;

/// Linearizes `system` at `state` and classifies the point.
///
/// Flows are stable when every eigenvalue has negative real part, maps when
/// every eigenvalue lies inside the unit circle.
pub fn stability<S: DynamicalSystem>(
    system: &S,
    kind: SystemKind,
    state: &[f64],
) -> Result<StabilityReport> {
    let dim = system.dimension();
    if state.len() != dim {
        return Err(EcoError::invalid_input(
            "state",
            format!("expected {dim} compartments, got {}", state.len()),
        ));
    }
    if state.iter().any(|v| !v.is_finite()) {
        return Err(EcoError::invalid_value("state", "must be finite"));
    }
    let jacobian = jacobian(system, state);
    if jacobian.iter().any(|v| !v.is_finite()) {
        return Err(EcoError::domain("Jacobian is not finite at this state"));
    }
    let eigenvalues = DMatrix::from_row_slice(dim, dim, &jacobian).complex_eigenvalues();

    let leading = match kind {
        SystemKind::Flow => eigenvalues
            .iter()
            .map(|l| l.re)
            .fold(f64::NEG_INFINITY, f64::max),
        SystemKind::Map => eigenvalues
            .iter()
            .map(|l| l.norm() - 1.0)
            .fold(f64::NEG_INFINITY, f64::max),
    };
    let stability = if leading < -BOUNDARY_TOLERANCE {
        Stability::Stable
    } else if leading > BOUNDARY_TOLERANCE {
        Stability::Unstable
    } else {
        Stability::Centre
    };

    Ok(StabilityReport {
        jacobian,
        eigenvalues: eigenvalues.iter().copied().map(ComplexNumber::from).collect(),
        stability,
    })
}

/// Central-difference Jacobian, row-major.
fn jacobian<S: DynamicalSystem>(system: &S, state: &[f64]) -> Vec<f64> {
    let dim = state.len();
    let mut jacobian = vec![0.0; dim * dim];
    let mut probe = state.to_vec();
    let mut forward = vec![0.0; dim];
    let mut backward = vec![0.0; dim];
    for j in 0..dim {
        let h = 1e-6 * state[j].abs().max(1.0);
        probe[j] = state[j] + h;
        system.apply(0.0, &probe, &mut forward);
        probe[j] = state[j] - h;
        system.apply(0.0, &probe, &mut backward);
        probe[j] = state[j];
        for i in 0..dim {
            jacobian[i * dim + j] = (forward[i] - backward[i]) / (2.0 * h);
        }
    }
    jacobian
}

// --- Dispatch by model id ---

/// Every closed-form equilibrium the model has, keyed by name.
pub fn equilibria(id: ModelId, params: &ParamSet) -> Result<EquilibriumSet> {
    let mut set = EquilibriumSet::new();
    match id {
        ModelId::Continuous(id) => {
            continuous_equilibria(&ContinuousModel::from_params(id, params)?, &mut set)?
        }
        ModelId::Discrete(id) => {
            discrete_equilibria(&DiscreteModel::from_params(id, params)?, &mut set)?
        }
        ModelId::Analytic(AnalyticModelId::IslandBiogeography) => {
            let island = IslandParams::from_params(params)?;
            set.insert("S_eq", island.equilibrium_richness());
        }
    }
    log::debug!("{id}: {} equilibrium values", set.len());
    Ok(set)
}

fn continuous_equilibria(model: &ContinuousModel, set: &mut EquilibriumSet) -> Result<()> {
    match model {
        ContinuousModel::Exponential(_) => set.insert("N*", 0.0),
        ContinuousModel::Logistic(p) => set.insert("N*", p.k),
        ContinuousModel::LaggedLogistic(p) => set.insert("N*", p.k),
        ContinuousModel::LotkaVolterra(_)
        | ContinuousModel::LogisticPrey(_)
        | ContinuousModel::HollingTypeTwo(_)
        | ContinuousModel::RosenzweigMacArthur(_) => {
            let [h, p] = predator_prey_equilibrium(model)?;
            set.insert("H*", h);
            set.insert("P*", p);
            match model {
                ContinuousModel::LogisticPrey(p) => set.insert("H_prey_only", p.k),
                ContinuousModel::RosenzweigMacArthur(p) => set.insert("H_prey_only", p.k),
                _ => {}
            }
        }
        ContinuousModel::TwoPredator(p) => {
            let [first, second] = two_predator_r_star(p)?;
            set.insert("R*_P1", first);
            set.insert("R*_P2", second);
        }
        ContinuousModel::Tilman(p) => {
            let r_star = r_star(p)?;
            for (i, row) in r_star.values.iter().enumerate() {
                for (j, value) in row.iter().enumerate() {
                    set.insert(&format!("R*_{}{}", i + 1, j + 1), *value);
                }
            }
            let realized = r_star.realized();
            set.insert("R*_1", realized[0]);
            set.insert("R*_2", realized[1]);
        }
        ContinuousModel::CompetitionCarrying(p) => insert_competition(&competition(p)?, set),
        ContinuousModel::CompetitionAbsolute(p) => {
            insert_competition(&competition_absolute(p)?, set)
        }
    }
    Ok(())
}

fn insert_competition(analysis: &CompetitionAnalysis, set: &mut EquilibriumSet) {
    set.insert("N1_trivial", 0.0);
    set.insert("N2_trivial", 0.0);
    set.insert("N1_alone", analysis.species1_only[0]);
    set.insert("N2_alone", analysis.species2_only[1]);
    if let Some([n1, n2]) = analysis.interior {
        set.insert("N1*", n1);
        set.insert("N2*", n2);
    }
}

fn discrete_equilibria(model: &DiscreteModel, set: &mut EquilibriumSet) -> Result<()> {
    match model {
        DiscreteModel::Geometric(_) => set.insert("N*", 0.0),
        DiscreteModel::LogisticMap(p) => {
            if p.r_d <= 1.0 {
                return Err(EcoError::domain(format!(
                    "logistic map with r_d = {} <= 1 has no positive equilibrium",
                    p.r_d
                )));
            }
            set.insert("N*", p.k * (1.0 - 1.0 / p.r_d));
        }
        DiscreteModel::Ricker(p) => set.insert("N*", p.k),
        DiscreteModel::BevertonHolt(p) => set.insert("N*", p.k),
        DiscreteModel::NicholsonBailey(p) => {
            let [h, q] = nicholson_bailey(p)?;
            set.insert("H*", h);
            set.insert("P*", q);
        }
        DiscreteModel::NicholsonBaileyDensity(p) => set.insert("H_parasitoid_free", p.k),
        DiscreteModel::SourceSink(p) => {
            let [n1, n2] = source_sink(p)?;
            set.insert("n1*", n1);
            set.insert("n2*", n2);
        }
    }
    Ok(())
}
