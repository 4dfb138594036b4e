//! Continuous-time population models.
//!
//! Each record holds exactly the coefficients its right-hand side reads and
//! exposes `rate`, a pure function of `(t, state)` writing `dx/dt`. Handling
//! time terms use `1 + a*T_h*H`, which stays at least 1 for non-negative `H`,
//! so the rate functions never divide by zero on admissible states.

use super::{ContinuousModelId, ModelParams};
use crate::error::{EcoError, Result};
use crate::params::{ParamReader, ParamSet};
use crate::traits::{DelaySystem, DynamicalSystem};
use serde::{Deserialize, Serialize};

/// dN/dt = r N
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExponentialParams {
    pub r: f64,
}

impl ModelParams for ExponentialParams {
    const PARAMS: &'static [&'static str] = &["r"];
    const COMPARTMENTS: &'static [&'static str] = &["N"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.value("r")?,
        })
    }
}

impl ExponentialParams {
    pub fn rate(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = self.r * x[0];
    }
}

/// dN/dt = r N (1 - N/K)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogisticParams {
    pub r: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

impl ModelParams for LogisticParams {
    const PARAMS: &'static [&'static str] = &["r", "K"];
    const COMPARTMENTS: &'static [&'static str] = &["N"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.value("r")?,
            k: reader.positive("K")?,
        })
    }
}

impl LogisticParams {
    pub fn rate(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let n = x[0];
        out[0] = self.r * n * (1.0 - n / self.k);
    }
}

/// dN/dt = r N(t) (1 - N(t - tau)/K)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaggedLogisticParams {
    pub r: f64,
    #[serde(rename = "K")]
    pub k: f64,
    pub tau: f64,
}

impl ModelParams for LaggedLogisticParams {
    const PARAMS: &'static [&'static str] = &["r", "K", "tau"];
    const COMPARTMENTS: &'static [&'static str] = &["N"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.value("r")?,
            k: reader.positive("K")?,
            tau: reader.non_negative("tau")?,
        })
    }
}

impl LaggedLogisticParams {
    pub fn rate(&self, _t: f64, x: &[f64], x_lagged: &[f64], out: &mut [f64]) {
        out[0] = self.r * x[0] * (1.0 - x_lagged[0] / self.k);
    }
}

/// Lotka-Volterra predator-prey with a linear (Type I) functional response.
///
/// dH = rH - aHP, dP = e a H P - d P
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LotkaVolterraParams {
    pub r: f64,
    pub a: f64,
    pub e: f64,
    pub d: f64,
}

impl ModelParams for LotkaVolterraParams {
    const PARAMS: &'static [&'static str] = &["r", "a", "e", "d"];
    const COMPARTMENTS: &'static [&'static str] = &["H", "P"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.value("r")?,
            a: reader.non_negative("a")?,
            e: reader.non_negative("e")?,
            d: reader.non_negative("d")?,
        })
    }
}

impl LotkaVolterraParams {
    pub fn rate(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let (h, p) = (x[0], x[1]);
        let predation = self.a * h * p;
        out[0] = self.r * h - predation;
        out[1] = self.e * predation - self.d * p;
    }

    /// V(H, P) = e a H - d ln H + a P - r ln P, constant along orbits.
    pub fn invariant(&self, h: f64, p: f64) -> f64 {
        self.e * self.a * h - self.d * h.ln() + self.a * p - self.r * p.ln()
    }
}

/// Logistic prey with Type I predation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogisticPreyParams {
    pub r: f64,
    #[serde(rename = "K")]
    pub k: f64,
    pub a: f64,
    pub e: f64,
    pub d: f64,
}

impl ModelParams for LogisticPreyParams {
    const PARAMS: &'static [&'static str] = &["r", "K", "a", "e", "d"];
    const COMPARTMENTS: &'static [&'static str] = &["H", "P"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.value("r")?,
            k: reader.positive("K")?,
            a: reader.non_negative("a")?,
            e: reader.non_negative("e")?,
            d: reader.non_negative("d")?,
        })
    }
}

impl LogisticPreyParams {
    pub fn rate(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let (h, p) = (x[0], x[1]);
        let predation = self.a * h * p;
        out[0] = self.r * h * (1.0 - h / self.k) - predation;
        out[1] = self.e * predation - self.d * p;
    }
}

/// Exponential prey with a saturating (Holling Type II) functional response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeTwoParams {
    pub r: f64,
    pub a: f64,
    pub e: f64,
    pub d: f64,
    #[serde(rename = "T_h")]
    pub t_h: f64,
}

impl ModelParams for TypeTwoParams {
    const PARAMS: &'static [&'static str] = &["r", "a", "e", "d", "T_h"];
    const COMPARTMENTS: &'static [&'static str] = &["H", "P"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.value("r")?,
            a: reader.non_negative("a")?,
            e: reader.non_negative("e")?,
            d: reader.non_negative("d")?,
            t_h: reader.non_negative("T_h")?,
        })
    }
}

impl TypeTwoParams {
    pub fn rate(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let (h, p) = (x[0], x[1]);
        let consumption = holling_two(self.a, self.t_h, h) * p;
        out[0] = self.r * h - consumption;
        out[1] = self.e * consumption - self.d * p;
    }
}

/// Logistic prey with Type II predation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosenzweigMacArthurParams {
    pub r: f64,
    #[serde(rename = "K")]
    pub k: f64,
    pub a: f64,
    pub e: f64,
    pub d: f64,
    #[serde(rename = "T_h")]
    pub t_h: f64,
}

impl ModelParams for RosenzweigMacArthurParams {
    const PARAMS: &'static [&'static str] = &["r", "K", "a", "e", "d", "T_h"];
    const COMPARTMENTS: &'static [&'static str] = &["H", "P"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.value("r")?,
            k: reader.positive("K")?,
            a: reader.non_negative("a")?,
            e: reader.non_negative("e")?,
            d: reader.non_negative("d")?,
            t_h: reader.non_negative("T_h")?,
        })
    }
}

impl RosenzweigMacArthurParams {
    pub fn rate(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let (h, p) = (x[0], x[1]);
        let consumption = holling_two(self.a, self.t_h, h) * p;
        out[0] = self.r * h * (1.0 - h / self.k) - consumption;
        out[1] = self.e * consumption - self.d * p;
    }
}

/// Two Type II predators sharing one self-limited resource.
///
/// dR = rR(1 - qR) - Σ a_i R P_i / (1 + a_i T_i R)
/// dP_i = e_i a_i R P_i / (1 + a_i T_i R) - d_i P_i
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TwoPredatorParams {
    pub r: f64,
    pub q: f64,
    pub a1: f64,
    pub a2: f64,
    #[serde(rename = "T_h1")]
    pub t_h1: f64,
    #[serde(rename = "T_h2")]
    pub t_h2: f64,
    pub e1: f64,
    pub e2: f64,
    pub d1: f64,
    pub d2: f64,
}

impl ModelParams for TwoPredatorParams {
    const PARAMS: &'static [&'static str] = &[
        "r", "q", "a1", "a2", "T_h1", "T_h2", "e1", "e2", "d1", "d2",
    ];
    const COMPARTMENTS: &'static [&'static str] = &["R", "P1", "P2"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.value("r")?,
            q: reader.non_negative("q")?,
            a1: reader.non_negative("a1")?,
            a2: reader.non_negative("a2")?,
            t_h1: reader.non_negative("T_h1")?,
            t_h2: reader.non_negative("T_h2")?,
            e1: reader.non_negative("e1")?,
            e2: reader.non_negative("e2")?,
            d1: reader.non_negative("d1")?,
            d2: reader.non_negative("d2")?,
        })
    }
}

impl TwoPredatorParams {
    pub fn rate(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let (res, p1, p2) = (x[0], x[1], x[2]);
        let eaten1 = holling_two(self.a1, self.t_h1, res) * p1;
        let eaten2 = holling_two(self.a2, self.t_h2, res) * p2;
        out[0] = self.r * res * (1.0 - self.q * res) - eaten1 - eaten2;
        out[1] = self.e1 * eaten1 - self.d1 * p1;
        out[2] = self.e2 * eaten2 - self.d2 * p2;
    }
}

/// Two consumers on two essential resources in a chemostat.
///
/// Consumer growth follows Liebig's law: the smallest Monod term wins.
/// Resources are supplied at rate `D` toward supply points `S1`, `S2` and drawn
/// down by each consumer in proportion to `c_ij * N_i * (growth_i + m_i)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TilmanParams {
    pub r1: f64,
    pub r2: f64,
    pub m1: f64,
    pub m2: f64,
    pub k11: f64,
    pub k12: f64,
    pub k21: f64,
    pub k22: f64,
    pub c11: f64,
    pub c12: f64,
    pub c21: f64,
    pub c22: f64,
    #[serde(rename = "S1")]
    pub s1: f64,
    #[serde(rename = "S2")]
    pub s2: f64,
    #[serde(rename = "D")]
    pub dilution: f64,
}

impl ModelParams for TilmanParams {
    const PARAMS: &'static [&'static str] = &[
        "r1", "r2", "m1", "m2", "k11", "k12", "k21", "k22", "c11", "c12", "c21", "c22", "S1",
        "S2", "D",
    ];
    const COMPARTMENTS: &'static [&'static str] = &["N1", "N2", "R1", "R2"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r1: reader.non_negative("r1")?,
            r2: reader.non_negative("r2")?,
            m1: reader.non_negative("m1")?,
            m2: reader.non_negative("m2")?,
            k11: reader.positive("k11")?,
            k12: reader.positive("k12")?,
            k21: reader.positive("k21")?,
            k22: reader.positive("k22")?,
            c11: reader.non_negative("c11")?,
            c12: reader.non_negative("c12")?,
            c21: reader.non_negative("c21")?,
            c22: reader.non_negative("c22")?,
            s1: reader.non_negative("S1")?,
            s2: reader.non_negative("S2")?,
            dilution: reader.non_negative("D")?,
        })
    }
}

impl TilmanParams {
    /// Per-capita growth of consumer `i` (0 or 1) before mortality.
    pub fn gross_growth(&self, i: usize, r1: f64, r2: f64) -> f64 {
        let (rate, k_a, k_b) = match i {
            0 => (self.r1, self.k11, self.k12),
            _ => (self.r2, self.k21, self.k22),
        };
        let on_first = rate * r1 / (k_a + r1);
        let on_second = rate * r2 / (k_b + r2);
        on_first.min(on_second)
    }

    pub fn rate(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let (n1, n2, res1, res2) = (x[0], x[1], x[2], x[3]);
        let uptake1 = self.gross_growth(0, res1, res2);
        let uptake2 = self.gross_growth(1, res1, res2);
        out[0] = n1 * (uptake1 - self.m1);
        out[1] = n2 * (uptake2 - self.m2);
        // Realized growth + mortality equals the gross uptake term.
        let draw1 = n1 * uptake1;
        let draw2 = n2 * uptake2;
        out[2] = self.dilution * (self.s1 - res1) - self.c11 * draw1 - self.c21 * draw2;
        out[3] = self.dilution * (self.s2 - res2) - self.c12 * draw1 - self.c22 * draw2;
    }
}

/// Lotka-Volterra competition in carrying-capacity form.
///
/// dN_i = r_i N_i (1 - (N_i + alpha_ij N_j) / K_i)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompetitionCarryingParams {
    pub r1: f64,
    pub r2: f64,
    #[serde(rename = "K1")]
    pub k1: f64,
    #[serde(rename = "K2")]
    pub k2: f64,
    pub alpha12: f64,
    pub alpha21: f64,
}

impl ModelParams for CompetitionCarryingParams {
    const PARAMS: &'static [&'static str] = &["r1", "r2", "K1", "K2", "alpha12", "alpha21"];
    const COMPARTMENTS: &'static [&'static str] = &["N1", "N2"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r1: reader.value("r1")?,
            r2: reader.value("r2")?,
            k1: reader.positive("K1")?,
            k2: reader.positive("K2")?,
            alpha12: reader.value("alpha12")?,
            alpha21: reader.value("alpha21")?,
        })
    }
}

impl CompetitionCarryingParams {
    pub fn rate(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let (n1, n2) = (x[0], x[1]);
        out[0] = self.r1 * n1 * (1.0 - (n1 + self.alpha12 * n2) / self.k1);
        out[1] = self.r2 * n2 * (1.0 - (n2 + self.alpha21 * n1) / self.k2);
    }

    /// alpha_ii = 1/K_i and alpha_ij = alpha_ij(relative) / K_i.
    pub fn to_absolute(&self) -> CompetitionAbsoluteParams {
        CompetitionAbsoluteParams {
            r1: self.r1,
            r2: self.r2,
            alpha11: 1.0 / self.k1,
            alpha12: self.alpha12 / self.k1,
            alpha21: self.alpha21 / self.k2,
            alpha22: 1.0 / self.k2,
        }
    }
}

/// Lotka-Volterra competition with absolute interaction coefficients.
///
/// dN_i = r_i N_i (1 - Σ_j alpha_ij N_j)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompetitionAbsoluteParams {
    pub r1: f64,
    pub r2: f64,
    pub alpha11: f64,
    pub alpha12: f64,
    pub alpha21: f64,
    pub alpha22: f64,
}

impl ModelParams for CompetitionAbsoluteParams {
    const PARAMS: &'static [&'static str] =
        &["r1", "r2", "alpha11", "alpha12", "alpha21", "alpha22"];
    const COMPARTMENTS: &'static [&'static str] = &["N1", "N2"];

    fn read(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            r1: reader.value("r1")?,
            r2: reader.value("r2")?,
            alpha11: reader.value("alpha11")?,
            alpha12: reader.value("alpha12")?,
            alpha21: reader.value("alpha21")?,
            alpha22: reader.value("alpha22")?,
        })
    }
}

impl CompetitionAbsoluteParams {
    pub fn rate(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let (n1, n2) = (x[0], x[1]);
        out[0] = self.r1 * n1 * (1.0 - self.alpha11 * n1 - self.alpha12 * n2);
        out[1] = self.r2 * n2 * (1.0 - self.alpha21 * n1 - self.alpha22 * n2);
    }

    /// K_i = 1/alpha_ii and alpha_ij(relative) = alpha_ij / alpha_ii.
    pub fn to_carrying_capacity(&self) -> Result<CompetitionCarryingParams> {
        if self.alpha11 <= 0.0 || self.alpha22 <= 0.0 {
            return Err(EcoError::domain(
                "intraspecific coefficients must be positive to define carrying capacities",
            ));
        }
        Ok(CompetitionCarryingParams {
            r1: self.r1,
            r2: self.r2,
            k1: 1.0 / self.alpha11,
            k2: 1.0 / self.alpha22,
            alpha12: self.alpha12 / self.alpha11,
            alpha21: self.alpha21 / self.alpha22,
        })
    }
}

/// Per-predator consumption rate a H / (1 + a T_h H).
pub fn holling_two(a: f64, t_h: f64, h: f64) -> f64 {
    a * h / (1.0 + a * t_h * h)
}

/// A continuous model together with its validated coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", content = "params", rename_all = "snake_case")]
pub enum ContinuousModel {
    Exponential(ExponentialParams),
    Logistic(LogisticParams),
    LaggedLogistic(LaggedLogisticParams),
    LotkaVolterra(LotkaVolterraParams),
    LogisticPrey(LogisticPreyParams),
    #[serde(rename = "holling_type2")]
    HollingTypeTwo(TypeTwoParams),
    #[serde(rename = "rosenzweig_macarthur")]
    RosenzweigMacArthur(RosenzweigMacArthurParams),
    TwoPredator(TwoPredatorParams),
    Tilman(TilmanParams),
    #[serde(rename = "competition_k")]
    CompetitionCarrying(CompetitionCarryingParams),
    #[serde(rename = "competition_alpha")]
    CompetitionAbsolute(CompetitionAbsoluteParams),
}

impl ContinuousModel {
    pub fn from_params(id: ContinuousModelId, params: &ParamSet) -> Result<Self> {
        Ok(match id {
            ContinuousModelId::Exponential => {
                ContinuousModel::Exponential(ExponentialParams::from_params(params)?)
            }
            ContinuousModelId::Logistic => {
                ContinuousModel::Logistic(LogisticParams::from_params(params)?)
            }
            ContinuousModelId::LaggedLogistic => {
                ContinuousModel::LaggedLogistic(LaggedLogisticParams::from_params(params)?)
            }
            ContinuousModelId::LotkaVolterra => {
                ContinuousModel::LotkaVolterra(LotkaVolterraParams::from_params(params)?)
            }
            ContinuousModelId::LogisticPrey => {
                ContinuousModel::LogisticPrey(LogisticPreyParams::from_params(params)?)
            }
            ContinuousModelId::HollingTypeTwo => {
                ContinuousModel::HollingTypeTwo(TypeTwoParams::from_params(params)?)
            }
            ContinuousModelId::RosenzweigMacArthur => ContinuousModel::RosenzweigMacArthur(
                RosenzweigMacArthurParams::from_params(params)?,
            ),
            ContinuousModelId::TwoPredator => {
                ContinuousModel::TwoPredator(TwoPredatorParams::from_params(params)?)
            }
            ContinuousModelId::Tilman => {
                ContinuousModel::Tilman(TilmanParams::from_params(params)?)
            }
            ContinuousModelId::CompetitionCarrying => ContinuousModel::CompetitionCarrying(
                CompetitionCarryingParams::from_params(params)?,
            ),
            ContinuousModelId::CompetitionAbsolute => ContinuousModel::CompetitionAbsolute(
                CompetitionAbsoluteParams::from_params(params)?,
            ),
        })
    }

    pub fn id(&self) -> ContinuousModelId {
        match self {
            ContinuousModel::Exponential(_) => ContinuousModelId::Exponential,
            ContinuousModel::Logistic(_) => ContinuousModelId::Logistic,
            ContinuousModel::LaggedLogistic(_) => ContinuousModelId::LaggedLogistic,
            ContinuousModel::LotkaVolterra(_) => ContinuousModelId::LotkaVolterra,
            ContinuousModel::LogisticPrey(_) => ContinuousModelId::LogisticPrey,
            ContinuousModel::HollingTypeTwo(_) => ContinuousModelId::HollingTypeTwo,
            ContinuousModel::RosenzweigMacArthur(_) => ContinuousModelId::RosenzweigMacArthur,
            ContinuousModel::TwoPredator(_) => ContinuousModelId::TwoPredator,
            ContinuousModel::Tilman(_) => ContinuousModelId::Tilman,
            ContinuousModel::CompetitionCarrying(_) => ContinuousModelId::CompetitionCarrying,
            ContinuousModel::CompetitionAbsolute(_) => ContinuousModelId::CompetitionAbsolute,
        }
    }

    pub fn compartments(&self) -> &'static [&'static str] {
        compartments(self.id())
    }

    /// Rate with an explicit lagged state. Only the lagged logistic reads it.
    pub fn rate_with_lag(&self, t: f64, x: &[f64], x_lagged: &[f64], out: &mut [f64]) {
        match self {
            ContinuousModel::LaggedLogistic(p) => p.rate(t, x, x_lagged, out),
            _ => self.rate(t, x, out),
        }
    }

    /// Instantaneous rate at `(t, x)`.
    ///
    /// Without history the lagged logistic reads its own current state as the
    /// lagged value, which is the zero-lag slice of its vector field.
    pub fn rate(&self, t: f64, x: &[f64], out: &mut [f64]) {
        match self {
            ContinuousModel::Exponential(p) => p.rate(t, x, out),
            ContinuousModel::Logistic(p) => p.rate(t, x, out),
            ContinuousModel::LaggedLogistic(p) => p.rate(t, x, x, out),
            ContinuousModel::LotkaVolterra(p) => p.rate(t, x, out),
            ContinuousModel::LogisticPrey(p) => p.rate(t, x, out),
            ContinuousModel::HollingTypeTwo(p) => p.rate(t, x, out),
            ContinuousModel::RosenzweigMacArthur(p) => p.rate(t, x, out),
            ContinuousModel::TwoPredator(p) => p.rate(t, x, out),
            ContinuousModel::Tilman(p) => p.rate(t, x, out),
            ContinuousModel::CompetitionCarrying(p) => p.rate(t, x, out),
            ContinuousModel::CompetitionAbsolute(p) => p.rate(t, x, out),
        }
    }
}

impl DynamicalSystem for ContinuousModel {
    fn dimension(&self) -> usize {
        self.compartments().len()
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        self.rate(t, x, out);
    }
}

impl DelaySystem for ContinuousModel {
    fn dimension(&self) -> usize {
        self.compartments().len()
    }

    fn delay(&self) -> f64 {
        match self {
            ContinuousModel::LaggedLogistic(p) => p.tau,
            _ => 0.0,
        }
    }

    fn apply(&self, t: f64, x: &[f64], x_lagged: &[f64], out: &mut [f64]) {
        self.rate_with_lag(t, x, x_lagged, out);
    }
}

pub fn compartments(id: ContinuousModelId) -> &'static [&'static str] {
    match id {
        ContinuousModelId::Exponential => ExponentialParams::COMPARTMENTS,
        ContinuousModelId::Logistic => LogisticParams::COMPARTMENTS,
        ContinuousModelId::LaggedLogistic => LaggedLogisticParams::COMPARTMENTS,
        ContinuousModelId::LotkaVolterra => LotkaVolterraParams::COMPARTMENTS,
        ContinuousModelId::LogisticPrey => LogisticPreyParams::COMPARTMENTS,
        ContinuousModelId::HollingTypeTwo => TypeTwoParams::COMPARTMENTS,
        ContinuousModelId::RosenzweigMacArthur => RosenzweigMacArthurParams::COMPARTMENTS,
        ContinuousModelId::TwoPredator => TwoPredatorParams::COMPARTMENTS,
        ContinuousModelId::Tilman => TilmanParams::COMPARTMENTS,
        ContinuousModelId::CompetitionCarrying => CompetitionCarryingParams::COMPARTMENTS,
        ContinuousModelId::CompetitionAbsolute => CompetitionAbsoluteParams::COMPARTMENTS,
    }
}

pub fn parameter_names(id: ContinuousModelId) -> &'static [&'static str] {
    match id {
        ContinuousModelId::Exponential => ExponentialParams::PARAMS,
        ContinuousModelId::Logistic => LogisticParams::PARAMS,
        ContinuousModelId::LaggedLogistic => LaggedLogisticParams::PARAMS,
        ContinuousModelId::LotkaVolterra => LotkaVolterraParams::PARAMS,
        ContinuousModelId::LogisticPrey => LogisticPreyParams::PARAMS,
        ContinuousModelId::HollingTypeTwo => TypeTwoParams::PARAMS,
        ContinuousModelId::RosenzweigMacArthur => RosenzweigMacArthurParams::PARAMS,
        ContinuousModelId::TwoPredator => TwoPredatorParams::PARAMS,
        ContinuousModelId::Tilman => TilmanParams::PARAMS,
        ContinuousModelId::CompetitionCarrying => CompetitionCarryingParams::PARAMS,
        ContinuousModelId::CompetitionAbsolute => CompetitionAbsoluteParams::PARAMS,
    }
}
