//! Discrete-time population recurrences.
//!
//! `step` maps the state at year `t` to the state at `t + 1`. The maps are
//! evaluated exactly as written, with no clamping, so chaotic regimes of the
//! logistic map and the Nicholson-Bailey oscillations come out unaltered.

use super::{DiscreteModelId, ModelParams};
use crate::error::{EcoError, Result};
use crate::params::{ParamReader, ParamSet};
use crate::solvers::DiscreteMap;
use crate::trajectory::Trajectory;
use crate::traits::{DynamicalSystem, Steppable};
use serde::{Deserialize, Serialize};

/// N' = lambda N
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeometricParams {
    pub lambda: f64,
}

impl ModelParams for GeometricParams {
    const PARAMS: &'static [&'static str] = &["lambda"];
    const COMPARTMENTS: &'static [&'static str] = &["N"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            lambda: reader.non_negative("lambda")?,
        })
    }
}

impl GeometricParams {
    pub fn step(&self, x: &[f64], out: &mut [f64]) {
        out[0] = self.lambda * x[0];
    }
}

/// N' = r_d N (1 - N/K)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogisticMapParams {
    pub r_d: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

impl ModelParams for LogisticMapParams {
    const PARAMS: &'static [&'static str] = &["r_d", "K"];
    const COMPARTMENTS: &'static [&'static str] = &["N"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r_d: reader.value("r_d")?,
            k: reader.positive("K")?,
        })
    }
}

impl LogisticMapParams {
    pub fn step(&self, x: &[f64], out: &mut [f64]) {
        let n = x[0];
        out[0] = self.r_d * n * (1.0 - n / self.k);
    }
}

/// N' = N exp(r (1 - N/K))
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RickerParams {
    pub r: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

impl ModelParams for RickerParams {
    const PARAMS: &'static [&'static str] = &["r", "K"];
    const COMPARTMENTS: &'static [&'static str] = &["N"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.value("r")?,
            k: reader.positive("K")?,
        })
    }
}

impl RickerParams {
    pub fn step(&self, x: &[f64], out: &mut [f64]) {
        let n = x[0];
        out[0] = n * (self.r * (1.0 - n / self.k)).exp();
    }
}

/// N' = R N / (1 + ((R - 1)/K) N)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BevertonHoltParams {
    #[serde(rename = "R")]
    pub big_r: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

impl ModelParams for BevertonHoltParams {
    const PARAMS: &'static [&'static str] = &["R", "K"];
    const COMPARTMENTS: &'static [&'static str] = &["N"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            big_r: reader.positive("R")?,
            k: reader.positive("K")?,
        })
    }
}

impl BevertonHoltParams {
    pub fn step(&self, x: &[f64], out: &mut [f64]) {
        let n = x[0];
        out[0] = self.big_r * n / (1.0 + ((self.big_r - 1.0) / self.k) * n);
    }
}

/// Host-parasitoid model.
///
/// H' = lambda H exp(-a P), P' = c H (1 - exp(-a P))
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NicholsonBaileyParams {
    pub lambda: f64,
    pub a: f64,
    pub c: f64,
}

impl ModelParams for NicholsonBaileyParams {
    const PARAMS: &'static [&'static str] = &["lambda", "a", "c"];
    const COMPARTMENTS: &'static [&'static str] = &["H", "P"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            lambda: reader.non_negative("lambda")?,
            a: reader.non_negative("a")?,
            c: reader.non_negative("c")?,
        })
    }
}

impl NicholsonBaileyParams {
    pub fn step(&self, x: &[f64], out: &mut [f64]) {
        let (h, p) = (x[0], x[1]);
        let escape = (-self.a * p).exp();
        out[0] = self.lambda * h * escape;
        out[1] = self.c * h * (1.0 - escape);
    }
}

/// Nicholson-Bailey with Ricker density dependence in the host.
///
/// H' = H exp(r (1 - H/K) - a P), P' = c H (1 - exp(-a P))
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NicholsonBaileyDensityParams {
    pub r: f64,
    #[serde(rename = "K")]
    pub k: f64,
    pub a: f64,
    pub c: f64,
}

impl ModelParams for NicholsonBaileyDensityParams {
    const PARAMS: &'static [&'static str] = &["r", "K", "a", "c"];
    const COMPARTMENTS: &'static [&'static str] = &["H", "P"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.value("r")?,
            k: reader.positive("K")?,
            a: reader.non_negative("a")?,
            c: reader.non_negative("c")?,
        })
    }
}

impl NicholsonBaileyDensityParams {
    pub fn step(&self, x: &[f64], out: &mut [f64]) {
        let (h, p) = (x[0], x[1]);
        out[0] = h * (self.r * (1.0 - h / self.k) - self.a * p).exp();
        out[1] = self.c * h * (1.0 - (-self.a * p).exp());
    }
}

/// Pulliam source-sink metapopulation.
///
/// Each patch grows by `lambda_i = pa + pj * beta_i`; whatever the source
/// produces above its capacity `N1` emigrates to the sink in the same year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSinkParams {
    /// Adult survival.
    pub pa: f64,
    /// Juvenile survival.
    pub pj: f64,
    /// Fecundity in the source.
    pub beta1: f64,
    /// Fecundity in the sink.
    pub beta2: f64,
    /// Number of breeding sites in the source.
    #[serde(rename = "N1")]
    pub source_capacity: f64,
}

impl ModelParams for SourceSinkParams {
    const PARAMS: &'static [&'static str] = &["pa", "pj", "beta1", "beta2", "N1"];
    const COMPARTMENTS: &'static [&'static str] = &["n1", "n2"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            pa: reader.non_negative("pa")?,
            pj: reader.non_negative("pj")?,
            beta1: reader.non_negative("beta1")?,
            beta2: reader.non_negative("beta2")?,
            source_capacity: reader.non_negative("N1")?,
        })
    }
}

impl SourceSinkParams {
    /// Per-patch annual growth rates `(lambda1, lambda2)`.
    pub fn growth_rates(&self) -> (f64, f64) {
        (
            self.pa + self.pj * self.beta1,
            self.pa + self.pj * self.beta2,
        )
    }

    pub fn step(&self, x: &[f64], out: &mut [f64]) {
        let (lambda1, lambda2) = self.growth_rates();
        let grown = lambda1 * x[0];
        let excess = (grown - self.source_capacity).max(0.0);
        out[0] = grown.min(self.source_capacity);
        out[1] = lambda2 * x[1] + excess;
    }
}

/// A discrete model together with its validated coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", content = "params", rename_all = "snake_case")]
pub enum DiscreteModel {
    #[serde(rename = "discrete_exponential")]
    Geometric(GeometricParams),
    LogisticMap(LogisticMapParams),
    Ricker(RickerParams),
    BevertonHolt(BevertonHoltParams),
    NicholsonBailey(NicholsonBaileyParams),
    #[serde(rename = "nicholson_bailey_dd")]
    NicholsonBaileyDensity(NicholsonBaileyDensityParams),
    SourceSink(SourceSinkParams),
}

impl DiscreteModel {
    pub fn from_params(id: DiscreteModelId, params: &ParamSet) -> Result<Self> {
        Ok(match id {
            DiscreteModelId::Exponential => {
                DiscreteModel::Geometric(GeometricParams::from_params(params)?)
            }
            DiscreteModelId::LogisticMap => {
                DiscreteModel::LogisticMap(LogisticMapParams::from_params(params)?)
            }
            DiscreteModelId::Ricker => DiscreteModel::Ricker(RickerParams::from_params(params)?),
            DiscreteModelId::BevertonHolt => {
                DiscreteModel::BevertonHolt(BevertonHoltParams::from_params(params)?)
            }
            DiscreteModelId::NicholsonBailey => {
                DiscreteModel::NicholsonBailey(NicholsonBaileyParams::from_params(params)?)
            }
            DiscreteModelId::NicholsonBaileyDensity => DiscreteModel::NicholsonBaileyDensity(
                NicholsonBaileyDensityParams::from_params(params)?,
            ),
            DiscreteModelId::SourceSink => {
                DiscreteModel::SourceSink(SourceSinkParams::from_params(params)?)
            }
        })
    }

    pub fn id(&self) -> DiscreteModelId {
        match self {
            DiscreteModel::Geometric(_) => DiscreteModelId::Exponential,
            DiscreteModel::LogisticMap(_) => DiscreteModelId::LogisticMap,
            DiscreteModel::Ricker(_) => DiscreteModelId::Ricker,
            DiscreteModel::BevertonHolt(_) => DiscreteModelId::BevertonHolt,
            DiscreteModel::NicholsonBailey(_) => DiscreteModelId::NicholsonBailey,
            DiscreteModel::NicholsonBaileyDensity(_) => DiscreteModelId::NicholsonBaileyDensity,
            DiscreteModel::SourceSink(_) => DiscreteModelId::SourceSink,
        }
    }

    pub fn compartments(&self) -> &'static [&'static str] {
        compartments(self.id())
    }

    /// One year of the recurrence.
    pub fn step(&self, x: &[f64], out: &mut [f64]) {
        match self {
            DiscreteModel::Geometric(p) => p.step(x, out),
            DiscreteModel::LogisticMap(p) => p.step(x, out),
            DiscreteModel::Ricker(p) => p.step(x, out),
            DiscreteModel::BevertonHolt(p) => p.step(x, out),
            DiscreteModel::NicholsonBailey(p) => p.step(x, out),
            DiscreteModel::NicholsonBaileyDensity(p) => p.step(x, out),
            DiscreteModel::SourceSink(p) => p.step(x, out),
        }
    }
}

impl DynamicalSystem for DiscreteModel {
    fn dimension(&self) -> usize {
        self.compartments().len()
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        self.step(x, out);
    }
}

pub fn compartments(id: DiscreteModelId) -> &'static [&'static str] {
    match id {
        DiscreteModelId::Exponential => GeometricParams::COMPARTMENTS,
        DiscreteModelId::LogisticMap => LogisticMapParams::COMPARTMENTS,
        DiscreteModelId::Ricker => RickerParams::COMPARTMENTS,
        DiscreteModelId::BevertonHolt => BevertonHoltParams::COMPARTMENTS,
        DiscreteModelId::NicholsonBailey => NicholsonBaileyParams::COMPARTMENTS,
        DiscreteModelId::NicholsonBaileyDensity => NicholsonBaileyDensityParams::COMPARTMENTS,
        DiscreteModelId::SourceSink => SourceSinkParams::COMPARTMENTS,
    }
}

pub fn parameter_names(id: DiscreteModelId) -> &'static [&'static str] {
    match id {
        DiscreteModelId::Exponential => GeometricParams::PARAMS,
        DiscreteModelId::LogisticMap => LogisticMapParams::PARAMS,
        DiscreteModelId::Ricker => RickerParams::PARAMS,
        DiscreteModelId::BevertonHolt => BevertonHoltParams::PARAMS,
        DiscreteModelId::NicholsonBailey => NicholsonBaileyParams::PARAMS,
        DiscreteModelId::NicholsonBaileyDensity => NicholsonBaileyDensityParams::PARAMS,
        DiscreteModelId::SourceSink => SourceSinkParams::PARAMS,
    }
}

/// Iterates `model` for `n_steps` years from `y0`.
///
/// The trajectory holds `n_steps + 1` samples at times `0, 1, ..., n_steps`.
/// Large or wildly alternating values are returned as they are; a state that
/// overflows to a non-finite value stops the run.
pub fn iterate(model: &DiscreteModel, y0: &[f64], n_steps: usize) -> Result<Trajectory> {
    let dim = model.compartments().len();
    if y0.len() != dim {
        return Err(EcoError::invalid_input(
            "initial state",
            format!("expected {dim} compartments, got {}", y0.len()),
        ));
    }
    if y0.iter().any(|v| !v.is_finite()) {
        return Err(EcoError::invalid_value("initial state", "must be finite"));
    }

    let mut trajectory = Trajectory::new(model.compartments());
    let mut stepper = DiscreteMap::new(dim);
    let mut t = 0.0;
    let mut state = y0.to_vec();
    trajectory.push(t, &state);
    for _ in 0..n_steps {
        let before = state.clone();
        stepper.step(model, &mut t, &mut state, 1.0);
        if state.iter().any(|v| !v.is_finite()) {
            log::warn!("{} overflowed after t = {}", model.id(), t - 1.0);
            return Err(EcoError::Integration {
                last_time: t - 1.0,
                last_state: before,
                reason: "state became non-finite".into(),
            });
        }
        trajectory.push(t, &state);
    }
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationKind;

    fn one_step(model: &DiscreteModel, x: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; x.len()];
        model.step(x, &mut out);
        out
    }

    #[test]
    fn logistic_map_reproduces_the_chaotic_reference_sequence() {
        let model = DiscreteModel::LogisticMap(LogisticMapParams { r_d: 3.9, k: 100.0 });
        let traj = iterate(&model, &[50.0], 12).unwrap();
        let expected = [
            50.0,
            97.5,
            9.506250000000009,
            33.54999222656253,
            86.94649252590003,
            44.2633109113109,
            96.2165255336889,
            14.19727793616143,
            47.508438619961545,
            97.25789275369054,
            10.400971326746626,
            36.344760197259426,
            90.22784261125632,
        ];
        assert_eq!(traj.series("N").unwrap(), expected.to_vec());
        assert_eq!(traj.times, (0..=12).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn ricker_and_beverton_holt_settle_at_carrying_capacity() {
        let ricker = DiscreteModel::Ricker(RickerParams { r: 0.5, k: 200.0 });
        let bh = DiscreteModel::BevertonHolt(BevertonHoltParams {
            big_r: 1.8,
            k: 200.0,
        });
        for model in [ricker, bh] {
            assert_eq!(one_step(&model, &[200.0]), vec![200.0]);
            let traj = iterate(&model, &[20.0], 200).unwrap();
            let last = traj.final_state().unwrap()[0];
            assert!((last - 200.0).abs() < 1e-6, "{} ended at {last}", model.id());
        }
    }

    #[test]
    fn nicholson_bailey_without_parasitoids_is_geometric() {
        let model = DiscreteModel::NicholsonBailey(NicholsonBaileyParams {
            lambda: 2.0,
            a: 0.05,
            c: 1.0,
        });
        assert_eq!(one_step(&model, &[10.0, 0.0]), vec![20.0, 0.0]);
        let next = one_step(&model, &[10.0, 20.0]);
        let escape = (-1.0f64).exp();
        assert!((next[0] - 20.0 * escape).abs() < 1e-12);
        assert!((next[1] - 10.0 * (1.0 - escape)).abs() < 1e-12);
    }

    #[test]
    fn density_dependent_host_reduces_to_ricker() {
        let nb = DiscreteModel::NicholsonBaileyDensity(NicholsonBaileyDensityParams {
            r: 1.1,
            k: 50.0,
            a: 0.02,
            c: 0.8,
        });
        let ricker = DiscreteModel::Ricker(RickerParams { r: 1.1, k: 50.0 });
        let host = one_step(&nb, &[30.0, 0.0])[0];
        assert_eq!(host, one_step(&ricker, &[30.0])[0]);
    }

    fn pulliam() -> SourceSinkParams {
        SourceSinkParams {
            pa: 0.7,
            pj: 0.2,
            beta1: 3.0,
            beta2: 1.0,
            source_capacity: 300.0,
        }
    }

    #[test]
    fn source_sink_first_year_has_no_emigration() {
        let model = DiscreteModel::SourceSink(pulliam());
        let next = one_step(&model, &[110.0, 100.0]);
        assert!((next[0] - 143.0).abs() < 1e-9);
        assert!((next[1] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn saturated_source_exports_its_surplus() {
        let model = DiscreteModel::SourceSink(pulliam());
        let next = one_step(&model, &[300.0, 0.0]);
        assert_eq!(next[0], 300.0);
        assert!((next[1] - 90.0).abs() < 1e-9);

        let traj = iterate(&model, &[110.0, 100.0], 400).unwrap();
        let last = traj.final_state().unwrap();
        assert_eq!(last[0], 300.0);
        assert!((last[1] - 900.0).abs() < 1e-6, "sink ended at {}", last[1]);
    }

    #[test]
    fn iterate_rejects_bad_initial_states() {
        let model = DiscreteModel::Geometric(GeometricParams { lambda: 1.1 });
        assert!(iterate(&model, &[1.0, 2.0], 3).is_err());
        assert!(iterate(&model, &[f64::NAN], 3).is_err());
        let traj = iterate(&model, &[5.0], 0).unwrap();
        assert_eq!(traj.len(), 1);
    }

    #[test]
    fn overflow_stops_with_last_finite_state() {
        let model = DiscreteModel::Geometric(GeometricParams { lambda: 1e200 });
        match iterate(&model, &[1e200], 5) {
            Err(EcoError::Integration {
                last_time,
                last_state,
                ..
            }) => {
                assert_eq!(last_time, 0.0);
                assert_eq!(last_state, vec![1e200]);
            }
            other => panic!("expected overflow error, got {other:?}"),
        }
    }

    #[test]
    fn from_params_is_strict() {
        let params = ParamSet::from([("r_d", 3.2), ("K", 100.0)]);
        let model = DiscreteModel::from_params(DiscreteModelId::LogisticMap, &params).unwrap();
        assert_eq!(model.compartments(), &["N"]);

        let extra = params.clone().with("r", 1.0);
        let err = DiscreteModel::from_params(DiscreteModelId::LogisticMap, &extra).unwrap_err();
        assert_eq!(
            err.configuration_kind(),
            Some(ConfigurationKind::UnknownParameter)
        );
        let bad_k = ParamSet::from([("r_d", 3.2), ("K", 0.0)]);
        let err = DiscreteModel::from_params(DiscreteModelId::LogisticMap, &bad_k).unwrap_err();
        assert_eq!(err.configuration_kind(), Some(ConfigurationKind::InvalidValue));
    }
}
