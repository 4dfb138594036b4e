//! Trajectory-producing calls and the session cache.

use crate::{core_error, parse_id, parse_input, parse_or_default, to_js};
use ecolab_core::api;
use ecolab_core::cache::{SimulationCache, DEFAULT_CACHE_CAPACITY};
use ecolab_core::convergence::EquilibriumSearch;
use ecolab_core::integrate::IntegratorSettings;
use ecolab_core::{ContinuousModelId, DiscreteModelId, ModelId, ParamSet, StateVector, TimeSpec};
use wasm_bindgen::prelude::*;

/// Integrates a continuous model. `settings` may be omitted for the defaults.
#[wasm_bindgen(js_name = simulateContinuous)]
pub fn simulate_continuous(
    model_id: &str,
    time_spec: JsValue,
    init: JsValue,
    params: JsValue,
    settings: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let id: ContinuousModelId = parse_id(model_id)?;
    let time_spec: TimeSpec = parse_input("time_spec", time_spec)?;
    let init: StateVector = parse_input("init", init)?;
    let params: ParamSet = parse_input("params", params)?;
    let settings: IntegratorSettings = parse_or_default("settings", settings)?;

    let trajectory = api::simulate_continuous_with(id, &time_spec, &init, &params, &settings)
        .map_err(|e| core_error("Simulation failed", e))?;
    to_js(&trajectory)
}

#[wasm_bindgen(js_name = simulateDiscrete)]
pub fn simulate_discrete(
    model_id: &str,
    init: JsValue,
    params: JsValue,
    n_steps: u32,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let id: DiscreteModelId = parse_id(model_id)?;
    let init: StateVector = parse_input("init", init)?;
    let params: ParamSet = parse_input("params", params)?;

    let trajectory = api::simulate_discrete(id, &init, &params, n_steps as usize)
        .map_err(|e| core_error("Simulation failed", e))?;
    to_js(&trajectory)
}

/// Runs until equilibrium with a doubling horizon. `target` and `search` are optional.
#[wasm_bindgen(js_name = simulateToEquilibrium)]
pub fn simulate_to_equilibrium(
    model_id: &str,
    init: JsValue,
    params: JsValue,
    target: JsValue,
    search: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let id: ModelId = parse_id(model_id)?;
    let init: StateVector = parse_input("init", init)?;
    let params: ParamSet = parse_input("params", params)?;
    let target: Option<StateVector> = if target.is_undefined() || target.is_null() {
        None
    } else {
        Some(parse_input("target", target)?)
    };
    let search: EquilibriumSearch = parse_or_default("search", search)?;

    let run = api::simulate_to_equilibrium(id, &init, &params, target.as_ref(), &search)
        .map_err(|e| core_error("Equilibrium run failed", e))?;
    to_js(&run)
}

/// Memoizes simulations for the lifetime of a UI session.
#[wasm_bindgen]
pub struct WasmSimulationCache {
    cache: SimulationCache,
}

#[wasm_bindgen]
impl WasmSimulationCache {
    #[wasm_bindgen(constructor)]
    pub fn new(capacity: Option<u32>) -> WasmSimulationCache {
        console_error_panic_hook::set_once();
        let capacity = capacity.map_or(DEFAULT_CACHE_CAPACITY, |c| c as usize);
        WasmSimulationCache {
            cache: SimulationCache::with_capacity(capacity),
        }
    }

    pub fn simulate_continuous(
        &mut self,
        model_id: &str,
        time_spec: JsValue,
        init: JsValue,
        params: JsValue,
        settings: JsValue,
    ) -> Result<JsValue, JsValue> {
        let id: ContinuousModelId = parse_id(model_id)?;
        let time_spec: TimeSpec = parse_input("time_spec", time_spec)?;
        let init: StateVector = parse_input("init", init)?;
        let params: ParamSet = parse_input("params", params)?;
        let settings: IntegratorSettings = parse_or_default("settings", settings)?;

        let trajectory = self
            .cache
            .simulate_continuous(id, &time_spec, &init, &params, &settings)
            .map_err(|e| core_error("Simulation failed", e))?;
        to_js(&trajectory)
    }

    pub fn simulate_discrete(
        &mut self,
        model_id: &str,
        init: JsValue,
        params: JsValue,
        n_steps: u32,
    ) -> Result<JsValue, JsValue> {
        let id: DiscreteModelId = parse_id(model_id)?;
        let init: StateVector = parse_input("init", init)?;
        let params: ParamSet = parse_input("params", params)?;

        let trajectory = self
            .cache
            .simulate_discrete(id, &init, &params, n_steps as usize)
            .map_err(|e| core_error("Simulation failed", e))?;
        to_js(&trajectory)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecolab_core::integrate::IntegratorMethod;
    use ecolab_core::Trajectory;
    use serde_wasm_bindgen::from_value;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn params_value(pairs: &[(&str, f64)]) -> JsValue {
        let mut params = ParamSet::new();
        for (name, value) in pairs {
            params.insert(name, *value);
        }
        to_js(&params).expect("params")
    }

    #[wasm_bindgen_test]
    fn discrete_run_reaches_js_as_a_trajectory() {
        let init = to_js(&StateVector::from([("N", 1.0)])).expect("init");
        let result = simulate_discrete(
            "discrete_exponential",
            init,
            params_value(&[("lambda", 2.0)]),
            3,
        )
        .expect("simulation");
        let trajectory: Trajectory = from_value(result).expect("trajectory");
        assert_eq!(trajectory.series("N").unwrap(), vec![1.0, 2.0, 4.0, 8.0]);
    }

    #[wasm_bindgen_test]
    fn unknown_model_is_reported() {
        let init = to_js(&StateVector::from([("N", 1.0)])).expect("init");
        let message = simulate_discrete("fibonacci", init, params_value(&[]), 3)
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("Unknown model"));
    }

    #[wasm_bindgen_test]
    fn missing_settings_fall_back_to_defaults() {
        let time_spec = to_js(&TimeSpec::horizon(1.0)).expect("time spec");
        let init = to_js(&StateVector::from([("N", 10.0)])).expect("init");
        let result = simulate_continuous(
            "logistic",
            time_spec,
            init,
            params_value(&[("r", 0.5), ("K", 100.0)]),
            JsValue::UNDEFINED,
        );
        assert!(result.is_ok());
    }

    #[derive(serde::Serialize)]
    struct PartialSettings {
        method: IntegratorMethod,
        max_steps: usize,
    }

    #[wasm_bindgen_test]
    fn partial_settings_keep_the_other_defaults() {
        let run = |settings: JsValue| {
            simulate_continuous(
                "logistic",
                to_js(&TimeSpec::horizon(1.0)).expect("time spec"),
                to_js(&StateVector::from([("N", 10.0)])).expect("init"),
                params_value(&[("r", 0.5), ("K", 100.0)]),
                settings,
            )
        };
        let budget = PartialSettings {
            method: IntegratorMethod::Rk4 { dt: 0.01 },
            max_steps: 10,
        };
        let message = run(to_js(&budget).expect("settings"))
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("max_steps = 10"), "{message}");

        let roomy = PartialSettings {
            max_steps: 1_000,
            ..budget
        };
        assert!(run(to_js(&roomy).expect("settings")).is_ok());
    }

    #[wasm_bindgen_test]
    fn cache_reuses_identical_requests() {
        let mut cache = WasmSimulationCache::new(Some(4));
        for _ in 0..3 {
            let init = to_js(&StateVector::from([("N", 10.0)])).expect("init");
            cache
                .simulate_discrete("ricker", init, params_value(&[("r", 1.2), ("K", 50.0)]), 10)
                .expect("simulation");
        }
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
