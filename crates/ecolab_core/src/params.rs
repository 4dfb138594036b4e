//! Named parameter sets and state vectors.
//!
//! Callers hand the library string-keyed maps; every model validates them into
//! a typed record before any arithmetic happens.

use crate::error::{EcoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Parameter name -> finite real value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet(BTreeMap<String, f64>);

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
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

    /// Starts a strict read of this set against a model's parameter list.
    pub fn reader<'a>(&'a self, expected: &'static [&'static str]) -> Result<ParamReader<'a>> {
        for name in self.0.keys() {
            if !expected.contains(&name.as_str()) {
                return Err(EcoError::unknown_parameter(name));
            }
        }
        for name in expected {
            if !self.0.contains_key(*name) {
                return Err(EcoError::missing_parameter(name));
            }
        }
        for (name, value) in &self.0 {
            if !value.is_finite() {
                return Err(EcoError::invalid_value(name, "must be finite"));
            }
        }
        Ok(ParamReader { params: self })
    }
}

impl<const N: usize> From<[(&str, f64); N]> for ParamSet {
    fn from(entries: [(&str, f64); N]) -> Self {
        let mut set = ParamSet::new();
        for (name, value) in entries {
            set.insert(name, value);
        }
        set
    }
}

/// Validated view over a [`ParamSet`]; every expected key is known to exist.
pub struct ParamReader<'a> {
    params: &'a ParamSet,
}

impl ParamReader<'_> {
    pub fn value(&self, name: &str) -> Result<f64> {
        self.params
            .get(name)
            .ok_or_else(|| EcoError::missing_parameter(name))
    }

    pub fn positive(&self, name: &str) -> Result<f64> {
        let value = self.value(name)?;
        if value <= 0.0 {
            return Err(EcoError::invalid_value(name, "must be positive"));
        }
        Ok(value)
    }

    pub fn non_negative(&self, name: &str) -> Result<f64> {
        let value = self.value(name)?;
        if value < 0.0 {
            return Err(EcoError::invalid_value(name, "must be non-negative"));
        }
        Ok(value)
    }
}

/// Compartment name -> population size or resource level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateVector(BTreeMap<String, f64>);

impl StateVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Pairs names with values; lengths must already agree.
    pub fn from_parts(names: &[&str], values: &[f64]) -> Self {
        let mut state = StateVector::new();
        for (name, value) in names.iter().zip(values) {
            state.insert(name, *value);
        }
        state
    }

    /// Orders values by `compartments`, rejecting missing, extra or non-finite entries.
    pub fn to_ordered(&self, compartments: &[&str]) -> Result<Vec<f64>> {
        let known: BTreeSet<&str> = compartments.iter().copied().collect();
        if let Some(extra) = self.0.keys().find(|name| !known.contains(name.as_str())) {
            return Err(EcoError::unknown_compartment(extra));
        }
        compartments
            .iter()
            .map(|name| {
                let value = self
                    .get(name)
                    .ok_or_else(|| EcoError::missing_compartment(name))?;
                if !value.is_finite() {
                    return Err(EcoError::invalid_value(name, "must be finite"));
                }
                Ok(value)
            })
            .collect()
    }
}

impl<const N: usize> From<[(&str, f64); N]> for StateVector {
    fn from(entries: [(&str, f64); N]) -> Self {
        let mut state = StateVector::new();
        for (name, value) in entries {
            state.insert(name, value);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationKind;

    const LOGISTIC: &[&str] = &["r", "K"];

    #[test]
    fn reader_rejects_missing_and_unknown_keys() {
        let missing = ParamSet::from([("r", 1.0)]);
        let err = missing.reader(LOGISTIC).err().expect("missing K");
        assert_eq!(
            err.configuration_kind(),
            Some(ConfigurationKind::MissingParameter)
        );
        assert!(err.to_string().contains("`K`"));

        let extra = ParamSet::from([("r", 1.0), ("K", 10.0), ("q", 0.1)]);
        let err = extra.reader(LOGISTIC).err().expect("extra q");
        assert_eq!(
            err.configuration_kind(),
            Some(ConfigurationKind::UnknownParameter)
        );
    }

    #[test]
    fn reader_rejects_non_finite_values() {
        let params = ParamSet::from([("r", f64::NAN), ("K", 10.0)]);
        let err = params.reader(LOGISTIC).err().expect("nan r");
        assert_eq!(err.configuration_kind(), Some(ConfigurationKind::InvalidValue));
    }

    #[test]
    fn positive_check_names_the_parameter() {
        let params = ParamSet::from([("r", 1.0), ("K", 0.0)]);
        let reader = params.reader(LOGISTIC).expect("keys ok");
        let err = reader.positive("K").expect_err("K = 0");
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn state_orders_by_compartment_list() {
        let state = StateVector::from([("P", 2.0), ("H", 10.0)]);
        assert_eq!(state.to_ordered(&["H", "P"]).unwrap(), vec![10.0, 2.0]);
        let err = state.to_ordered(&["H"]).expect_err("extra P");
        assert_eq!(
            err.configuration_kind(),
            Some(ConfigurationKind::UnknownCompartment)
        );
        let err = state.to_ordered(&["H", "P", "Q"]).expect_err("missing Q");
        assert_eq!(
            err.configuration_kind(),
            Some(ConfigurationKind::MissingCompartment)
        );
    }
}
