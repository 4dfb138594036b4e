//! Caller-owned memoization of simulation requests.
//!
//! Requests are keyed on the exact bit patterns of their inputs, so a hit
//! returns the same trajectory a fresh run would produce. The cache is
//! bounded; when full an arbitrary entry is evicted.

use crate::api;
use crate::error::Result;
use crate::integrate::{IntegratorMethod, IntegratorSettings};
use crate::models::{ContinuousModelId, DiscreteModelId};
use crate::params::{ParamSet, StateVector};
use crate::trajectory::{TimeSpec, Trajectory};
use std::collections::HashMap;

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RequestKey {
    model: &'static str,
    params: Vec<(String, u64)>,
    init: Vec<(String, u64)>,
    /// Output times, or the step count of a discrete run.
    schedule: Vec<u64>,
    settings: Vec<u64>,
}

impl RequestKey {
    fn new(
        model: &'static str,
        params: &ParamSet,
        init: &StateVector,
        schedule: Vec<u64>,
        settings: Vec<u64>,
    ) -> Self {
        Self {
            model,
            params: params.iter().map(|(k, v)| (k.to_string(), v.to_bits())).collect(),
            init: init.iter().map(|(k, v)| (k.to_string(), v.to_bits())).collect(),
            schedule,
            settings,
        }
    }
}

fn time_bits(time_spec: &TimeSpec) -> Vec<u64> {
    match time_spec {
        TimeSpec::Explicit { times } => {
            let mut bits = vec![0];
            bits.extend(times.iter().map(|t| t.to_bits()));
            bits
        }
        TimeSpec::Horizon { horizon, step } => vec![1, horizon.to_bits(), step.to_bits()],
    }
}

fn settings_bits(settings: &IntegratorSettings) -> Vec<u64> {
    let method = match settings.method {
        IntegratorMethod::DormandPrince => [0, 0],
        IntegratorMethod::Rk4 { dt } => [1, dt.to_bits()],
    };
    vec![
        method[0],
        method[1],
        settings.rtol.to_bits(),
        settings.atol.to_bits(),
        settings.h_min.to_bits(),
        settings.h_max.map_or(u64::MAX, f64::to_bits),
        settings.max_steps as u64,
    ]
}

/// Bounded map from simulation request to trajectory.
pub struct SimulationCache {
    entries: HashMap<RequestKey, Trajectory>,
    capacity: usize,
}

impl Default for SimulationCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl SimulationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero disables storage; every call recomputes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    /// Memoized [`api::simulate_continuous_with`].
    pub fn simulate_continuous(
        &mut self,
        model_id: ContinuousModelId,
        time_spec: &TimeSpec,
        init: &StateVector,
        params: &ParamSet,
        settings: &IntegratorSettings,
    ) -> Result<Trajectory> {
        let key = RequestKey::new(
            model_id.as_str(),
            params,
            init,
            time_bits(time_spec),
            settings_bits(settings),
        );
        self.get_or_insert(key, || {
            api::simulate_continuous_with(model_id, time_spec, init, params, settings)
        })
    }

    /// Memoized [`api::simulate_discrete`].
    pub fn simulate_discrete(
        &mut self,
        model_id: DiscreteModelId,
        init: &StateVector,
        params: &ParamSet,
        n_steps: usize,
    ) -> Result<Trajectory> {
        let key = RequestKey::new(
            model_id.as_str(),
            params,
            init,
            vec![n_steps as u64],
            Vec::new(),
        );
        self.get_or_insert(key, || {
            api::simulate_discrete(model_id, init, params, n_steps)
        })
    }

    fn get_or_insert<F>(&mut self, key: RequestKey, compute: F) -> Result<Trajectory>
    where
        F: FnOnce() -> Result<Trajectory>,
    {
        if let Some(cached) = self.entries.get(&key) {
            log::debug!("cache hit for {}", key.model);
            return Ok(cached.clone());
        }
        let trajectory = compute()?;
        if self.capacity == 0 {
            return Ok(trajectory);
        }
        if self.entries.len() >= self.capacity {
            // Arbitrary victim: HashMap iteration order.
            if let Some(victim) = self.entries.keys().next().cloned() {
                self.entries.remove(&victim);
            }
        }
        self.entries.insert(key, trajectory.clone());
        Ok(trajectory)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
