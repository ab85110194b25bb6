//! Color strings: hex literals and CSS custom properties.
//!
//! Supports `#RGB`, `#RRGGBB` and `#RRGGBBAA`, plus `--name`,
//! `var(--name)` and `var(--name, fallback)` resolved through a lookup
//! function (the canvas computed style in the browser).

use crate::error::HikariError;

/// Normalized RGBA, each channel in 0..=1.
pub type Rgba = [f32; 4];

/// Parses a hex color into normalized RGBA. Alpha defaults to 1.
pub fn parse_hex(s: &str) -> Result<Rgba, HikariError> {
    let s = s.trim();
    let invalid = || HikariError::Color(s.to_owned());
    let hex = s.strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize, width: usize| -> Result<f32, HikariError> {
        let digits = &hex[i * width..(i + 1) * width];
        let value = u8::from_str_radix(digits, 16).map_err(|_| invalid())?;
        // #RGB: each digit doubles (f -> ff)
        let value = if width == 1 { value * 17 } else { value };
        Ok(value as f32 / 255.0)
    };
    match hex.len() {
        3 => Ok([channel(0, 1)?, channel(1, 1)?, channel(2, 1)?, 1.0]),
        6 => Ok([channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, 1.0]),
        8 => Ok([channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, channel(3, 2)?]),
        _ => Err(invalid()),
    }
}

/// Resolves CSS custom property references. Literal values pass through.
///
/// Returns `None` when a referenced property is unset and no fallback is
/// given.
pub fn resolve_css<F>(value: &str, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = value.trim();
    let defined = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

    if let Some(inner) = value.strip_prefix("var(").and_then(|v| v.strip_suffix(')')) {
        let (name, fallback) = match inner.split_once(',') {
            Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
            None => (inner.trim(), None),
        };
        return defined(name).or_else(|| fallback.map(str::to_owned));
    }
    if value.starts_with("--") {
        return defined(value);
    }
    Some(value.to_owned())
}

/// Parses `value`, falling back to `default` on malformed input.
pub fn parse_or(value: &str, default: Rgba) -> Rgba {
    match parse_hex(value) {
        Ok(rgba) => rgba,
        Err(err) => {
            log::warn!(target: "hikari::color", "{err}, using default");
            default
        }
    }
}

pub fn rgb(rgba: Rgba) -> [f32; 3] {
    [rgba[0], rgba[1], rgba[2]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq4(a: Rgba, b: Rgba) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn parses_all_hex_lengths() {
        assert!(approx_eq4(
            parse_hex("#DE443B").unwrap(),
            [222.0 / 255.0, 68.0 / 255.0, 59.0 / 255.0, 1.0]
        ));
        assert!(approx_eq4(parse_hex("#fff").unwrap(), [1.0, 1.0, 1.0, 1.0]));
        assert!(approx_eq4(
            parse_hex("#00000080").unwrap(),
            [0.0, 0.0, 0.0, 128.0 / 255.0]
        ));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["", "DE443B", "#12", "#12345", "#ggg", "#+12345"] {
            assert!(parse_hex(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(parse_or("nope", [0.5, 0.5, 0.5, 1.0]), [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn resolves_custom_properties() {
        let lookup = |name: &str| (name == "--gradient-color-1").then(|| " #ff0000 ".to_owned());
        assert_eq!(resolve_css("--gradient-color-1", lookup).as_deref(), Some("#ff0000"));
        assert_eq!(resolve_css("var(--gradient-color-1)", lookup).as_deref(), Some("#ff0000"));
        assert_eq!(resolve_css("var(--missing, #00ff00)", lookup).as_deref(), Some("#00ff00"));
        assert_eq!(resolve_css("var(--missing)", lookup), None);
        assert_eq!(resolve_css("--missing", lookup), None);
        assert_eq!(resolve_css("#123", lookup).as_deref(), Some("#123"));
    }
}
