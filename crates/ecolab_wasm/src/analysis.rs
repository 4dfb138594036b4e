//! Analytic calls: vector fields, Leslie matrices, equilibria and stability.

use crate::{core_error, parse_id, parse_input, to_js};
use ecolab_core::api;
use ecolab_core::equilibrium::IslandParams;
use ecolab_core::models::{continuous, discrete, ModelParams};
use ecolab_core::{
    AnalyticModelId, ContinuousModelId, DiscreteModelId, ModelId, ParamSet, StateVector,
    Trajectory,
};
use js_sys::Float64Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_name = vectorField)]
pub fn vector_field(
    model_id: &str,
    trajectory: JsValue,
    params: JsValue,
    grid_density: u32,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let id: ModelId = parse_id(model_id)?;
    let trajectory: Trajectory = parse_input("trajectory", trajectory)?;
    let params: ParamSet = parse_input("params", params)?;

    let field = api::vector_field(id, &trajectory, &params, grid_density as usize)
        .map_err(|e| core_error("Vector field failed", e))?;
    to_js(&field)
}

/// `matrix` is an array of rows.
#[wasm_bindgen(js_name = leslieProject)]
pub fn leslie_project(matrix: JsValue, init: Vec<f64>, n_steps: u32) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let rows: Vec<Vec<f64>> = parse_input("matrix", matrix)?;
    let trajectory = api::leslie_project(&rows, &init, n_steps as usize)
        .map_err(|e| core_error("Leslie projection failed", e))?;
    to_js(&trajectory)
}

#[wasm_bindgen(js_name = leslieEigen)]
pub fn leslie_eigen(matrix: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let rows: Vec<Vec<f64>> = parse_input("matrix", matrix)?;
    let eigen = api::leslie_eigen(&rows).map_err(|e| core_error("Leslie eigen failed", e))?;
    to_js(&eigen)
}

/// Stable age distribution only, as a typed array for plotting.
#[wasm_bindgen(js_name = leslieStableDistribution)]
pub fn leslie_stable_distribution(matrix: JsValue) -> Result<Float64Array, JsValue> {
    console_error_panic_hook::set_once();
    let rows: Vec<Vec<f64>> = parse_input("matrix", matrix)?;
    let eigen = api::leslie_eigen(&rows).map_err(|e| core_error("Leslie eigen failed", e))?;
    Ok(Float64Array::from(eigen.stable_distribution.as_slice()))
}

#[wasm_bindgen]
pub fn equilibria(model_id: &str, params: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let id: ModelId = parse_id(model_id)?;
    let params: ParamSet = parse_input("params", params)?;
    let set = api::equilibria(id, &params).map_err(|e| core_error("Equilibria failed", e))?;
    to_js(&set)
}

#[wasm_bindgen]
pub fn competition(model_id: &str, params: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let id: ContinuousModelId = parse_id(model_id)?;
    let params: ParamSet = parse_input("params", params)?;
    let analysis =
        api::competition(id, &params).map_err(|e| core_error("Competition analysis failed", e))?;
    to_js(&analysis)
}

#[wasm_bindgen]
pub fn stability(model_id: &str, params: JsValue, state: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let id: ModelId = parse_id(model_id)?;
    let params: ParamSet = parse_input("params", params)?;
    let state: StateVector = parse_input("state", state)?;
    let report = api::stability(id, &params, &state)
        .map_err(|e| core_error("Stability analysis failed", e))?;
    to_js(&report)
}

#[derive(Serialize)]
struct CatalogEntry {
    id: &'static str,
    kind: &'static str,
    compartments: &'static [&'static str],
    parameters: &'static [&'static str],
}

/// Every model id with the names its parameters and compartments must use.
#[wasm_bindgen(js_name = modelCatalog)]
pub fn model_catalog() -> Result<JsValue, JsValue> {
    let mut entries = Vec::new();
    for id in ContinuousModelId::ALL {
        entries.push(CatalogEntry {
            id: id.as_str(),
            kind: "continuous",
            compartments: continuous::compartments(*id),
            parameters: continuous::parameter_names(*id),
        });
    }
    for id in DiscreteModelId::ALL {
        entries.push(CatalogEntry {
            id: id.as_str(),
            kind: "discrete",
            compartments: discrete::compartments(*id),
            parameters: discrete::parameter_names(*id),
        });
    }
    for id in AnalyticModelId::ALL {
        let (compartments, parameters) = match id {
            AnalyticModelId::IslandBiogeography => {
                (IslandParams::COMPARTMENTS, IslandParams::PARAMS)
            }
        };
        entries.push(CatalogEntry {
            id: id.as_str(),
            kind: "analytic",
            compartments,
            parameters,
        });
    }
    to_js(&entries)
}
