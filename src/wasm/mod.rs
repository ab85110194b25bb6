//! JS classes `MorphGradient` and `BalatroGradient`.

use wasm_bindgen::prelude::*;

use crate::config::{BalatroConfig, MorphConfig};
use crate::effect::balatro::ColorSlot;
use crate::effect::{BalatroGradient, Effect, MorphGradient};
use crate::gl::WebGl;

mod render;

use render::Runtime;

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // Everything is compiled in; `debug: true` on an effect lifts the filter.
    if console_log::init_with_level(log::Level::Debug).is_ok() {
        log::set_max_level(log::LevelFilter::Warn);
    }
    Ok(())
}

fn options_json(options: &JsValue) -> Result<String, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok("{}".to_owned());
    }
    let json = js_sys::JSON::stringify(options)?;
    Ok(String::from(json))
}

fn enable_debug(debug: bool) {
    if debug {
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn notify(on_init: Option<js_sys::Function>, handle: JsValue) -> Result<(), JsValue> {
    if let Some(callback) = on_init {
        callback.call1(&JsValue::NULL, &handle)?;
    }
    Ok(())
}

#[wasm_bindgen(js_name = MorphGradient)]
#[derive(Clone)]
pub struct MorphHandle {
    runtime: Runtime<MorphGradient<WebGl>>,
}

#[wasm_bindgen(js_class = MorphGradient)]
impl MorphHandle {
    /// `options` is a plain object of camelCase fields. With a `selector`
    /// the effect connects right away and `on_init` receives the instance.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue, on_init: Option<js_sys::Function>) -> Result<MorphHandle, JsValue> {
        let config = MorphConfig::from_json(&options_json(&options)?)?;
        enable_debug(config.debug);
        let selector = config.selector.clone();
        let handle = MorphHandle {
            runtime: Runtime::new(MorphGradient::new(config)),
        };
        if let Some(selector) = selector {
            handle.init_gradient(&selector, on_init)?;
        }
        Ok(handle)
    }

    /// Returns `false` when `selector` matches nothing.
    #[wasm_bindgen(js_name = initGradient)]
    pub fn init_gradient(&self, selector: &str, on_init: Option<js_sys::Function>) -> Result<bool, JsValue> {
        let connected = self.runtime.connect(selector)?;
        if connected {
            notify(on_init, JsValue::from(self.clone()))?;
        }
        Ok(connected)
    }

    pub fn play(&self) -> Result<(), JsValue> {
        self.runtime.play()
    }

    pub fn pause(&self) {
        self.runtime.pause();
    }

    pub fn resize(&self) {
        self.runtime.resize();
    }

    pub fn disconnect(&self) {
        self.runtime.disconnect();
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.runtime.with_effect(|e| e.animator().is_playing())
    }

    #[wasm_bindgen(js_name = toggleColor)]
    pub fn toggle_color(&self, index: usize) {
        self.runtime.with_effect(|e| e.toggle_color(index));
    }

    /// Without `delta` the configured `freqDelta` is used.
    #[wasm_bindgen(js_name = updateFrequency)]
    pub fn update_frequency(&self, delta: Option<f32>) {
        self.runtime.with_effect(|e| match delta {
            Some(delta) => e.update_frequency(delta),
            None => e.step_frequency(),
        });
    }

    #[wasm_bindgen(js_name = setAmplitude)]
    pub fn set_amplitude(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_amplitude(value));
    }

    #[wasm_bindgen(js_name = setSeed)]
    pub fn set_seed(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_seed(value));
    }

    #[wasm_bindgen(js_name = setFreqX)]
    pub fn set_freq_x(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_freq_x(value));
    }

    #[wasm_bindgen(js_name = setFreqY)]
    pub fn set_freq_y(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_freq_y(value));
    }

    #[wasm_bindgen(js_name = setBaseColor)]
    pub fn set_base_color(&self, value: &str) {
        let value = self.runtime.resolve_css(value);
        self.runtime.with_effect(|e| e.set_base_color(&value));
    }

    #[wasm_bindgen(js_name = setWaveColor)]
    pub fn set_wave_color(&self, index: usize, value: &str) {
        let value = self.runtime.resolve_css(value);
        self.runtime.with_effect(|e| e.set_wave_color(index, &value));
    }

    #[wasm_bindgen(js_name = setDarkenTop)]
    pub fn set_darken_top(&self, value: bool) {
        self.runtime.with_effect(|e| e.set_darken_top(value));
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_zoom(value));
    }

    #[wasm_bindgen(js_name = setRotation)]
    pub fn set_rotation(&self, degrees: f32) {
        self.runtime.with_effect(|e| e.set_rotation(degrees));
    }

    #[wasm_bindgen(js_name = setWireframe)]
    pub fn set_wireframe(&self, value: bool) {
        self.runtime.with_effect(|e| e.set_wireframe(value));
    }

    #[wasm_bindgen(js_name = setDensity)]
    pub fn set_density(&self, x: f32, y: f32) {
        self.runtime.with_effect(|e| e.set_density([x, y]));
    }

    #[wasm_bindgen(js_name = setMaxFrameTimeStep)]
    pub fn set_max_frame_time_step(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_max_frame_time_step(value));
    }
}

#[wasm_bindgen(js_name = BalatroGradient)]
#[derive(Clone)]
pub struct BalatroHandle {
    runtime: Runtime<BalatroGradient<WebGl>>,
}

#[wasm_bindgen(js_class = BalatroGradient)]
impl BalatroHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue, on_init: Option<js_sys::Function>) -> Result<BalatroHandle, JsValue> {
        let config = BalatroConfig::from_json(&options_json(&options)?)?;
        enable_debug(config.debug);
        let selector = config.selector.clone();
        let handle = BalatroHandle {
            runtime: Runtime::new(BalatroGradient::new(config)),
        };
        if let Some(selector) = selector {
            handle.init_gradient(&selector, on_init)?;
        }
        Ok(handle)
    }

    #[wasm_bindgen(js_name = initGradient)]
    pub fn init_gradient(&self, selector: &str, on_init: Option<js_sys::Function>) -> Result<bool, JsValue> {
        let connected = self.runtime.connect(selector)?;
        if connected {
            notify(on_init, JsValue::from(self.clone()))?;
        }
        Ok(connected)
    }

    pub fn play(&self) -> Result<(), JsValue> {
        self.runtime.play()
    }

    pub fn pause(&self) {
        self.runtime.pause();
    }

    pub fn resize(&self) {
        self.runtime.resize();
    }

    pub fn disconnect(&self) {
        self.runtime.disconnect();
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.runtime.with_effect(|e| e.animator().is_playing())
    }

    #[wasm_bindgen(js_name = setSpinRotation)]
    pub fn set_spin_rotation(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_spin_rotation(value));
    }

    #[wasm_bindgen(js_name = setSpinSpeed)]
    pub fn set_spin_speed(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_spin_speed(value));
    }

    #[wasm_bindgen(js_name = setOffset)]
    pub fn set_offset(&self, x: f32, y: f32) {
        self.runtime.with_effect(|e| e.set_offset([x, y]));
    }

    #[wasm_bindgen(js_name = setColor1)]
    pub fn set_color1(&self, value: &str) {
        self.set_color(ColorSlot::One, value);
    }

    #[wasm_bindgen(js_name = setColor2)]
    pub fn set_color2(&self, value: &str) {
        self.set_color(ColorSlot::Two, value);
    }

    #[wasm_bindgen(js_name = setColor3)]
    pub fn set_color3(&self, value: &str) {
        self.set_color(ColorSlot::Three, value);
    }

    #[wasm_bindgen(js_name = setContrast)]
    pub fn set_contrast(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_contrast(value));
    }

    #[wasm_bindgen(js_name = setLighting)]
    pub fn set_lighting(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_lighting(value));
    }

    #[wasm_bindgen(js_name = setSpinAmount)]
    pub fn set_spin_amount(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_spin_amount(value));
    }

    #[wasm_bindgen(js_name = setPixelFilter)]
    pub fn set_pixel_filter(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_pixel_filter(value));
    }

    #[wasm_bindgen(js_name = setSpinEase)]
    pub fn set_spin_ease(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_spin_ease(value));
    }

    #[wasm_bindgen(js_name = setIsRotate)]
    pub fn set_is_rotate(&self, value: bool) {
        self.runtime.with_effect(|e| e.set_is_rotate(value));
    }

    /// The pointer listener is installed at connect only when interaction
    /// was enabled then.
    #[wasm_bindgen(js_name = setMouseInteraction)]
    pub fn set_mouse_interaction(&self, value: bool) {
        self.runtime.with_effect(|e| e.set_mouse_interaction(value));
    }

    #[wasm_bindgen(js_name = setWireframe)]
    pub fn set_wireframe(&self, value: bool) {
        self.runtime.with_effect(|e| e.set_wireframe(value));
    }

    #[wasm_bindgen(js_name = setMaxFrameTimeStep)]
    pub fn set_max_frame_time_step(&self, value: f32) {
        self.runtime.with_effect(|e| e.set_max_frame_time_step(value));
    }
}

impl BalatroHandle {
    fn set_color(&self, slot: ColorSlot, value: &str) {
        let value = self.runtime.resolve_css(value);
        self.runtime.with_effect(|e| e.set_color(slot, &value));
    }
}
