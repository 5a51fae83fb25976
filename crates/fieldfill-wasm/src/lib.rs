//! WASM bindings for fillable-field detection and mapping.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.
//! Documents are passed in as text or as serialized structures; reading
//! `.docx` and `.pdf` files is left to the host.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use fieldfill_core::models::config::DetectionConfig;
use fieldfill_core::{
    DataRecord, DetectedField, DocumentSource, FieldDetector, FieldFillConfig, rule_based_mapping,
    validate_structure,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Detect fields in plain text with the built-in catalog.
#[wasm_bindgen]
pub fn detect_fields_in_text(text: &str) -> Result<JsValue, JsValue> {
    to_js(&FieldDetector::new().detect_in_text(text))
}

/// Resolve detected fields against a data object by key matching.
///
/// Takes the array returned by a detect call and a plain object of values.
#[wasm_bindgen]
pub fn map_fields(fields: JsValue, data: JsValue) -> Result<JsValue, JsValue> {
    let fields: Vec<DetectedField> = serde_wasm_bindgen::from_value(fields).map_err(js_error)?;
    let data: DataRecord = serde_wasm_bindgen::from_value(data).map_err(js_error)?;
    to_js(&rule_based_mapping(&fields, &data))
}

/// Same as `map_fields`, over JSON strings.
#[wasm_bindgen]
pub fn map_fields_json(fields_json: &str, data_json: &str) -> Result<String, JsValue> {
    let fields: Vec<DetectedField> = serde_json::from_str(fields_json).map_err(js_error)?;
    let data: DataRecord = serde_json::from_str(data_json).map_err(js_error)?;
    serde_json::to_string(&rule_based_mapping(&fields, &data)).map_err(js_error)
}

/// Field detector class for browser use.
#[wasm_bindgen(js_name = FieldDetector)]
pub struct WasmFieldDetector {
    detector: FieldDetector,
}

#[wasm_bindgen(js_class = FieldDetector)]
impl WasmFieldDetector {
    /// Create a detector, optionally from a JSON configuration.
    ///
    /// Accepts either a full configuration or just its `detection` section.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmFieldDetector, JsValue> {
        let detection = match config_json.as_deref() {
            None => DetectionConfig::default(),
            Some(json) => parse_detection_config(json).map_err(js_error)?,
        };
        let detector = FieldDetector::from_config(&detection).map_err(js_error)?;
        Ok(Self { detector })
    }

    /// Detect fields in plain text.
    #[wasm_bindgen]
    pub fn detect(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.detector.detect_in_text(text))
    }

    /// Detect fields in plain text, returned as JSON.
    #[wasm_bindgen(js_name = detectJson)]
    pub fn detect_json(&self, text: &str) -> Result<String, JsValue> {
        serde_json::to_string(&self.detector.detect_in_text(text)).map_err(js_error)
    }

    /// Detect fields in a serialized document structure.
    ///
    /// Expects `{kind: "word_processor", paragraphs, tables}` or
    /// `{kind: "pdf", pages}`.
    #[wasm_bindgen(js_name = detectStructure)]
    pub fn detect_structure(&self, structure: JsValue) -> Result<JsValue, JsValue> {
        let document: DocumentSource =
            serde_wasm_bindgen::from_value(structure).map_err(js_error)?;
        validate_structure(&document).map_err(js_error)?;
        to_js(&self.detector.detect(&document))
    }

    /// Names of the active patterns, in catalog order.
    #[wasm_bindgen(js_name = patternNames)]
    pub fn pattern_names(&self) -> js_sys::Array {
        self.names().into_iter().map(JsValue::from).collect()
    }

    #[wasm_bindgen(getter, js_name = patternCount)]
    pub fn pattern_count(&self) -> usize {
        self.detector.catalog().len()
    }
}

impl WasmFieldDetector {
    fn names(&self) -> Vec<String> {
        self.detector
            .catalog()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

fn parse_detection_config(json: &str) -> Result<DetectionConfig, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if value.get("detection").is_some() {
        let config: FieldFillConfig = serde_json::from_value(value)?;
        Ok(config.detection)
    } else {
        serde_json::from_value(value)
    }
}
