/// Failures that can reach a caller.
///
/// Rendering problems (shader compile/link errors, unresolved uniforms) never
/// show up here; they are logged and the effect keeps running.
#[derive(Debug, thiserror::Error)]
pub enum HikariError {
    #[error("invalid color: {0}")]
    Color(String),

    #[error("invalid options: {0}")]
    Config(String),

    #[error("graphics context unavailable: {0}")]
    Context(String),

    #[error("canvas not found: {0}")]
    Canvas(String),

    #[error("javascript error: {0}")]
    Js(String),
}

impl From<serde_json::Error> for HikariError {
    fn from(err: serde_json::Error) -> Self {
        HikariError::Config(err.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for HikariError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        HikariError::Js(format!("{value:?}"))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<HikariError> for wasm_bindgen::JsValue {
    fn from(err: HikariError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
