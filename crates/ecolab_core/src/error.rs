//! Error taxonomy shared by every model, solver and analytic routine.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// What was wrong with a caller-supplied configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationKind {
    MissingParameter,
    UnknownParameter,
    MissingCompartment,
    UnknownCompartment,
    InvalidValue,
    UnknownModel,
    InvalidInput,
}

impl fmt::Display for ConfigurationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigurationKind::MissingParameter => "missing parameter",
            ConfigurationKind::UnknownParameter => "unknown parameter",
            ConfigurationKind::MissingCompartment => "missing compartment",
            ConfigurationKind::UnknownCompartment => "unknown compartment",
            ConfigurationKind::InvalidValue => "invalid value for",
            ConfigurationKind::UnknownModel => "unknown model",
            ConfigurationKind::InvalidInput => "invalid input",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EcoError {
    /// Malformed input: a missing or extra key, a non-finite number, an unknown model id.
    #[error("configuration error: {kind} `{name}`{}", detail_suffix(.detail))]
    Configuration {
        kind: ConfigurationKind,
        name: String,
        detail: Option<String>,
    },

    /// A closed-form result is undefined or not biologically meaningful.
    #[error("domain error: {0}")]
    Domain(String),

    /// The stepper could not reach the requested horizon.
    #[error("integration failed at t = {last_time}: {reason}")]
    Integration {
        last_time: f64,
        last_state: Vec<f64>,
        reason: String,
    },

    /// A bounded "run until equilibrium" loop used up its attempts.
    #[error(
        "no equilibrium after {attempts} attempts (t = {last_time}, distance = {distance:e})"
    )]
    Convergence {
        attempts: usize,
        last_time: f64,
        distance: f64,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(text) => format!(": {text}"),
        None => String::new(),
    }
}

impl EcoError {
    pub fn missing_parameter(name: &str) -> Self {
        Self::configuration(ConfigurationKind::MissingParameter, name, None)
    }

    pub fn unknown_parameter(name: &str) -> Self {
        Self::configuration(ConfigurationKind::UnknownParameter, name, None)
    }

    pub fn missing_compartment(name: &str) -> Self {
        Self::configuration(ConfigurationKind::MissingCompartment, name, None)
    }

    pub fn unknown_compartment(name: &str) -> Self {
        Self::configuration(ConfigurationKind::UnknownCompartment, name, None)
    }

    pub fn invalid_value(name: &str, detail: impl Into<String>) -> Self {
        Self::configuration(ConfigurationKind::InvalidValue, name, Some(detail.into()))
    }

    pub fn unknown_model(name: &str) -> Self {
        Self::configuration(ConfigurationKind::UnknownModel, name, None)
    }

    pub fn invalid_input(name: &str, detail: impl Into<String>) -> Self {
        Self::configuration(ConfigurationKind::InvalidInput, name, Some(detail.into()))
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    fn configuration(kind: ConfigurationKind, name: &str, detail: Option<String>) -> Self {
        Self::Configuration {
            kind,
            name: name.to_string(),
            detail,
        }
    }

    /// Configuration kind, when this is a configuration error.
    pub fn configuration_kind(&self) -> Option<ConfigurationKind> {
        match self {
            EcoError::Configuration { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EcoError>;
