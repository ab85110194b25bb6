//! Effect options.
//!
//! Each effect takes one immutable snapshot decoded from the (camelCase) JS
//! options object. Absent fields fall back to the defaults below.

use serde::Deserialize;

use crate::color::resolve_css;
use crate::error::HikariError;

/// `u_active_colors` is a vec4: one slot for the base color, three for waves.
pub const MAX_WAVE_COLORS: usize = 3;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MorphConfig {
    pub selector: Option<String>,
    pub wireframe: bool,
    /// Segments per pixel along x and y.
    pub density: [f32; 2],
    /// Frames per second the time step is clamped to; 0 disables the clamp.
    pub max_frame_time_step: f32,
    pub debug: bool,
    pub playing: bool,
    pub base_color: String,
    pub wave_colors: Vec<String>,
    pub amplitude: f32,
    pub seed: f32,
    pub freq_x: f32,
    pub freq_y: f32,
    pub freq_delta: f32,
    pub darken_top: bool,
    pub zoom: f32,
    /// Degrees.
    pub rotation: f32,
    /// Fixed canvas height in pixels; measured from the canvas when unset.
    pub height: Option<f32>,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            selector: None,
            wireframe: false,
            density: [0.06, 0.16],
            max_frame_time_step: 15.0,
            debug: false,
            playing: true,
            base_color: "#a960ee".into(),
            wave_colors: vec!["#ff333d".into(), "#90e0ff".into(), "#ffcb57".into()],
            amplitude: 320.0,
            seed: 5.0,
            freq_x: 14e-5,
            freq_y: 29e-5,
            freq_delta: 1e-5,
            darken_top: false,
            zoom: 1.0,
            rotation: 0.0,
            height: None,
        }
    }
}

impl MorphConfig {
    pub fn from_json(json: &str) -> Result<Self, HikariError> {
        let mut config: Self = serde_json::from_str(json)?;
        if config.wave_colors.is_empty() {
            return Err(HikariError::Config("waveColors needs at least one color".into()));
        }
        if config.wave_colors.len() > MAX_WAVE_COLORS {
            return Err(HikariError::Config(format!(
                "waveColors takes at most {MAX_WAVE_COLORS} colors, got {}",
                config.wave_colors.len()
            )));
        }
        config.density = config.density.map(|d| d.max(0.0));
        Ok(config)
    }

    /// Replaces CSS custom property references with their resolved values.
    pub fn resolve_css_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        resolve_in_place(&mut self.base_color, &lookup);
        for color in &mut self.wave_colors {
            resolve_in_place(color, &lookup);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalatroConfig {
    pub selector: Option<String>,
    pub wireframe: bool,
    pub max_frame_time_step: f32,
    pub debug: bool,
    pub playing: bool,
    pub spin_rotation: f32,
    pub spin_speed: f32,
    pub offset: [f32; 2],
    pub color1: String,
    pub color2: String,
    pub color3: String,
    pub contrast: f32,
    pub lighting: f32,
    pub spin_amount: f32,
    pub pixel_filter: f32,
    pub spin_ease: f32,
    pub is_rotate: bool,
    pub mouse_interaction: bool,
}

impl Default for BalatroConfig {
    fn default() -> Self {
        Self {
            selector: None,
            wireframe: false,
            max_frame_time_step: 0.0,
            debug: false,
            playing: true,
            spin_rotation: -2.0,
            spin_speed: 7.0,
            offset: [0.0, 0.0],
            color1: "#DE443B".into(),
            color2: "#006BB4".into(),
            color3: "#162325".into(),
            contrast: 3.5,
            lighting: 0.4,
            spin_amount: 0.25,
            pixel_filter: 745.0,
            spin_ease: 1.0,
            is_rotate: false,
            mouse_interaction: true,
        }
    }
}

impl BalatroConfig {
    pub fn from_json(json: &str) -> Result<Self, HikariError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn resolve_css_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for color in [&mut self.color1, &mut self.color2, &mut self.color3] {
            resolve_in_place(color, &lookup);
        }
    }
}

/// Unresolvable references are left as-is so parsing falls back to the
/// slot's default.
fn resolve_in_place<F>(value: &mut String, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(resolved) = resolve_css(value, lookup) {
        *value = resolved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(MorphConfig::from_json("{}").unwrap(), MorphConfig::default());
        assert_eq!(BalatroConfig::from_json("{}").unwrap(), BalatroConfig::default());
    }

    #[test]
    fn camel_case_options_are_recognized() {
        let config = BalatroConfig::from_json(
            r##"{"selector":"#bg","spinSpeed":3.0,"mouseInteraction":false,"offset":[0.1,0.2]}"##,
        )
        .unwrap();
        assert_eq!(config.selector.as_deref(), Some("#bg"));
        assert_eq!(config.spin_speed, 3.0);
        assert!(!config.mouse_interaction);
        assert_eq!(config.offset, [0.1, 0.2]);
        assert_eq!(config.color1, "#DE443B");
    }

    #[test]
    fn morph_requires_a_wave_color() {
        assert!(MorphConfig::from_json(r#"{"waveColors":[]}"#).is_err());
        assert!(MorphConfig::from_json(r##"{"waveColors":["#111","#222","#333","#444"]}"##).is_err());
        assert!(MorphConfig::from_json(r##"{"waveColors":["#111","#222","#333"]}"##).is_ok());
        assert!(MorphConfig::from_json(r#"{"density":"dense"}"#).is_err());
    }

    #[test]
    fn css_vars_resolve_into_colors() {
        let mut config = MorphConfig {
            base_color: "--gradient-color-1".into(),
            wave_colors: vec!["var(--unset, #010203)".into(), "--unset".into()],
            ..MorphConfig::default()
        };
        config.resolve_css_vars(|name| (name == "--gradient-color-1").then(|| "#abc".to_owned()));
        assert_eq!(config.base_color, "#abc");
        assert_eq!(config.wave_colors, ["#010203", "--unset"]);
    }
}
