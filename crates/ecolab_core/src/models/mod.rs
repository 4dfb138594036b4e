//! Model identifiers and the typed parameter records behind them.

pub mod continuous;
pub mod discrete;

use crate::error::{EcoError, Result};
use crate::params::{ParamReader, ParamSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A typed parameter record read strictly from a [`ParamSet`].
pub trait ModelParams: Sized {
    /// Every parameter the model reads, and nothing else.
    const PARAMS: &'static [&'static str];
    /// State compartments in the order the rate/step functions index them.
    const COMPARTMENTS: &'static [&'static str];

    fn read(reader: &ParamReader<'_>) -> Result<Self>;

    fn from_params(params: &ParamSet) -> Result<Self> {
        Self::read(&params.reader(Self::PARAMS)?)
    }
}

macro_rules! model_ids {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $id:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $id)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $id),+
                }
            }
        }

        impl FromStr for $name {
            type Err = EcoError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($id => Ok($name::$variant),)+
                    other => Err(EcoError::unknown_model(other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

model_ids! {
    /// Continuous-time (ODE/DDE) model variants.
    ContinuousModelId {
        Exponential => "exponential",
        Logistic => "logistic",
        LaggedLogistic => "lagged_logistic",
        LotkaVolterra => "lotka_volterra",
        LogisticPrey => "logistic_prey",
        HollingTypeTwo => "holling_type2",
        RosenzweigMacArthur => "rosenzweig_macarthur",
        TwoPredator => "two_predator",
        Tilman => "tilman",
        CompetitionCarrying => "competition_k",
        CompetitionAbsolute => "competition_alpha",
    }
}

model_ids! {
    /// Discrete-time recurrence variants.
    DiscreteModelId {
        Exponential => "discrete_exponential",
        LogisticMap => "logistic_map",
        Ricker => "ricker",
        BevertonHolt => "beverton_holt",
        NicholsonBailey => "nicholson_bailey",
        NicholsonBaileyDensity => "nicholson_bailey_dd",
        SourceSink => "source_sink",
    }
}

/// Any model the library knows about, including the analytic-only ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelId {
    Continuous(ContinuousModelId),
    Discrete(DiscreteModelId),
    Analytic(AnalyticModelId),
}

model_ids! {
    /// Models that only have closed-form analytics (no trajectory).
    AnalyticModelId {
        IslandBiogeography => "island_biogeography",
    }
}

impl ModelId {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Continuous(id) => id.as_str(),
            ModelId::Discrete(id) => id.as_str(),
            ModelId::Analytic(id) => id.as_str(),
        }
    }
}

impl FromStr for ModelId {
    type Err = EcoError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(id) = s.parse::<ContinuousModelId>() {
            return Ok(ModelId::Continuous(id));
        }
        if let Ok(id) = s.parse::<DiscreteModelId>() {
            return Ok(ModelId::Discrete(id));
        }
        s.parse::<AnalyticModelId>().map(ModelId::Analytic)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
