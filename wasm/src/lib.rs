use kinchart::config::{Config, parse_config};
use kinchart::layout_dump::chart_to_json;
use kinchart::{ChartInput, compute_chart, render_svg};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Per-call knobs on top of an optional config document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartOptions {
    /// Same shape as a `kinchart` config file.
    config: Option<serde_json::Value>,
    focus: Option<String>,
    max_depth: Option<u32>,
}

fn to_js(error: impl ToString) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn prepare(input_json: &str, options_json: Option<String>) -> Result<(ChartInput, Config), String> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<ChartOptions>(&raw).map_err(|e| e.to_string())?,
        None => ChartOptions::default(),
    };
    let mut input: ChartInput = serde_json::from_str(input_json).map_err(|e| e.to_string())?;
    if options.focus.is_some() {
        input.focus = options.focus;
    }
    if options.max_depth.is_some() {
        input.max_depth = options.max_depth;
    }
    let config = match options.config {
        Some(value) => parse_config(&value.to_string()).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    Ok((input, config))
}

/// Full layout and connector geometry as JSON, for drawing on the JS side.
#[wasm_bindgen]
pub fn chart_layout_json(input_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let (input, config) = prepare(input_json, options_json).map_err(to_js)?;
    let chart = compute_chart(&input, &config.layout);
    chart_to_json(&chart).map_err(to_js)
}

#[wasm_bindgen]
pub fn chart_svg(input_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let (input, config) = prepare(input_json, options_json).map_err(to_js)?;
    let chart = compute_chart(&input, &config.layout);
    Ok(render_svg(&chart, &config.theme, &config.layout))
}
