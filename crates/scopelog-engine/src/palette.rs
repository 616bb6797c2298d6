//! Deterministic namespace colours
//!
//! Each namespace gets a dark, readable colour derived only from its position
//! in the configured namespace list, so colours are stable across runs.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use scopelog_types::Rgb;

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_895;

/// Colour for the namespace at `index`
pub fn namespace_color(index: usize) -> Rgb {
    let mut rng = ChaCha8Rng::seed_from_u64(index as u64 * 1000);

    let hue = (rng.gen_range(0.0..1.0) + index as f64 * GOLDEN_RATIO_CONJUGATE).fract() * 360.0;
    // dark luminosity: saturated, low value
    let saturation = rng.gen_range(0.55..1.0);
    let value = rng.gen_range(0.35..0.65);

    hsv_to_rgb(hue, saturation, value)
}

/// Map every namespace to its colour
pub fn assign_colors(namespaces: &[String]) -> HashMap<String, Rgb> {
    namespaces
        .iter()
        .enumerate()
        .map(|(index, namespace)| (namespace.clone(), namespace_color(index)))
        .collect()
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb {
    let chroma = value * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = value - chroma;
    let channel = |c: f64| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;

    Rgb::new(channel(r), channel(g), channel(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_are_deterministic() {
        for index in 0..16 {
            assert_eq!(namespace_color(index), namespace_color(index));
        }
    }

    #[test]
    fn test_colors_are_dark() {
        for index in 0..32 {
            let color = namespace_color(index);
            let brightest = color.r.max(color.g).max(color.b);
            assert!(brightest <= 166, "index {index} too bright: {}", color.hex());
        }
    }

    #[test]
    fn test_assign_colors_follows_order() {
        let namespaces = vec!["net".to_string(), "ui".to_string()];
        let colors = assign_colors(&namespaces);
        assert_eq!(colors["net"], namespace_color(0));
        assert_eq!(colors["ui"], namespace_color(1));
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Rgb::new(255, 0, 0));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), Rgb::new(0, 255, 0));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), Rgb::new(0, 0, 255));
    }
}
