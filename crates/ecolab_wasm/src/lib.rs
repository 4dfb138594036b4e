//! WASM bridge for the ecolab core library.
//!
//! Payloads cross the boundary as plain JS objects. Results are serialized
//! JSON-compatible so maps arrive as objects rather than `Map`s.

mod analysis;
mod simulation;

pub use analysis::*;
pub use simulation::*;

use ecolab_core::EcoError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;

pub(crate) fn core_error(context: &str, err: EcoError) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

pub(crate) fn parse_input<T: DeserializeOwned>(name: &str, value: JsValue) -> Result<T, JsValue> {
    from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", name, e)))
}

/// Like [`parse_input`], with `undefined`/`null` meaning the default.
pub(crate) fn parse_or_default<T>(name: &str, value: JsValue) -> Result<T, JsValue>
where
    T: DeserializeOwned + Default,
{
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    parse_input(name, value)
}

pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

pub(crate) fn parse_id<T>(model_id: &str) -> Result<T, JsValue>
where
    T: std::str::FromStr<Err = EcoError>,
{
    model_id.parse().map_err(|e| core_error("Unknown model", e))
}
