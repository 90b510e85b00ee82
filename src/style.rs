//! Marker and path styling.
//!
//! `COLOR_SCALE` is the single source for both `choose_color` and the legend.

/// One bucket of the color ladder. `threshold` is exclusive; `None` is the
/// catch-all bucket and must be last.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub threshold: Option<f64>,
    pub hex: &'static str,
    pub label: &'static str,
}

/// Ordered by descending threshold, evaluated highest-first.
pub const COLOR_SCALE: [ColorStop; 6] = [
    ColorStop { threshold: Some(9.0), hex: "#D90000", label: ">9" },
    ColorStop { threshold: Some(7.0), hex: "#ff2828", label: "7-9" },
    ColorStop { threshold: Some(5.0), hex: "#f16966", label: "5-7" },
    ColorStop { threshold: Some(3.0), hex: "#f7a9a8", label: "3-5" },
    ColorStop { threshold: Some(1.0), hex: "#facbcb", label: "1-3" },
    ColorStop { threshold: None, hex: "#FFFFFF", label: "<1" },
];

pub const WHITE: &str = "#FFFFFF";

/// Marker radius in Braille pixels. Not clamped: zero or negative
/// magnitudes give degenerate markers.
#[inline(always)]
pub fn marker_size(magnitude: f64) -> f64 {
    2.0 * magnitude
}

/// Fill color for a magnitude (or depth) value. Total over `f64`:
/// NaN matches no threshold and lands in the catch-all bucket.
pub fn choose_color(value: f64) -> &'static str {
    COLOR_SCALE
        .iter()
        .find(|stop| stop.threshold.map_or(true, |t| value > t))
        .map_or(WHITE, |stop| stop.hex)
}

/// Which feature value drives the fill color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorBy {
    #[default]
    Magnitude,
    Depth,
}

impl ColorBy {
    /// Legend heading for this mode
    pub fn title(self) -> &'static str {
        match self {
            ColorBy::Magnitude => "Magnitude",
            ColorBy::Depth => "Depth (km)",
        }
    }
}

/// Style of an earthquake circle marker
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_color: &'static str,
    pub fill_opacity: f64,
    pub stroke: bool,
    pub stroke_color: &'static str,
    pub stroke_weight: f64,
}

impl MarkerStyle {
    /// Style for a quake of `magnitude`, filled by `color_value`
    pub fn for_quake(magnitude: f64, color_value: f64) -> Self {
        Self {
            radius: marker_size(magnitude),
            fill_color: choose_color(color_value),
            fill_opacity: 0.9,
            stroke: true,
            stroke_color: WHITE,
            stroke_weight: 0.3,
        }
    }
}

/// Style of a plate-boundary line
#[derive(Clone, Debug, PartialEq)]
pub struct PathStyle {
    pub color: &'static str,
    pub weight: f64,
}

impl PathStyle {
    pub fn plate_boundary() -> Self {
        Self {
            color: WHITE,
            weight: 2.0,
        }
    }
}

/// 8-bit RGB triple
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Parse `#rrggbb` (case-insensitive). Anything else is `None`.
pub fn parse_hex(hex: &str) -> Option<Rgb> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Composite `fg` over `bg` at `opacity` (clamped to 0..=1)
pub fn blend(fg: Rgb, bg: Rgb, opacity: f64) -> Rgb {
    let a = opacity.clamp(0.0, 1.0);
    let mix = |f: u8, b: u8| (f as f64 * a + b as f64 * (1.0 - a)).round() as u8;
    Rgb(mix(fg.0, bg.0), mix(fg.1, bg.1), mix(fg.2, bg.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_color_buckets() {
        assert_eq!(choose_color(9.5), "#D90000");
        assert_eq!(choose_color(8.5), "#ff2828");
        assert_eq!(choose_color(6.0), "#f16966");
        assert_eq!(choose_color(4.2), "#f7a9a8");
        assert_eq!(choose_color(2.0), "#facbcb");
        assert_eq!(choose_color(0.5), "#FFFFFF");
        assert_eq!(choose_color(-3.0), "#FFFFFF");
    }

    #[test]
    fn test_choose_color_boundaries_exclusive() {
        assert_eq!(choose_color(9.0), "#ff2828");
        assert_eq!(choose_color(7.0), "#f16966");
        assert_eq!(choose_color(5.0), "#f7a9a8");
        assert_eq!(choose_color(3.0), "#facbcb");
        assert_eq!(choose_color(1.0), "#FFFFFF");
    }

    #[test]
    fn test_choose_color_total() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0, 1e300] {
            let color = choose_color(v);
            assert_eq!(COLOR_SCALE.iter().filter(|s| s.hex == color).count(), 1);
        }
        assert_eq!(choose_color(f64::NAN), "#FFFFFF");
        assert_eq!(choose_color(f64::INFINITY), "#D90000");
    }

    #[test]
    fn test_marker_size_unclamped() {
        assert_eq!(marker_size(0.0), 0.0);
        assert_eq!(marker_size(-1.0), -2.0);
        assert_eq!(marker_size(8.5), 17.0);
        assert!(marker_size(4.1) < marker_size(4.2));
    }

    #[test]
    fn test_quake_style() {
        let style = MarkerStyle::for_quake(8.5, 8.5);
        assert_eq!(style.radius, 17.0);
        assert_eq!(style.fill_color, "#ff2828");
        assert_eq!(style.fill_opacity, 0.9);
        assert_eq!(style.stroke_weight, 0.3);
        assert!(style.stroke);

        assert_eq!(MarkerStyle::for_quake(9.5, 9.5).fill_color, "#D90000");
    }

    #[test]
    fn test_scale_is_descending() {
        let thresholds: Vec<f64> = COLOR_SCALE.iter().filter_map(|s| s.threshold).collect();
        assert!(thresholds.windows(2).all(|w| w[0] > w[1]));
        assert!(COLOR_SCALE.last().is_some_and(|s| s.threshold.is_none()));
    }

    #[test]
    fn test_parse_hex_and_blend() {
        assert_eq!(parse_hex("#D90000"), Some(Rgb(0xd9, 0, 0)));
        assert_eq!(parse_hex("#facbcb"), Some(Rgb(0xfa, 0xcb, 0xcb)));
        assert_eq!(parse_hex("white"), None);
        assert_eq!(parse_hex("#fff"), None);
        for stop in COLOR_SCALE {
            assert!(parse_hex(stop.hex).is_some());
        }

        let white = Rgb(255, 255, 255);
        let black = Rgb(0, 0, 0);
        assert_eq!(blend(white, black, 1.0), white);
        assert_eq!(blend(white, black, 0.0), black);
        assert_eq!(blend(Rgb(200, 100, 0), black, 0.5), Rgb(100, 50, 0));
        assert_eq!(blend(white, black, 7.0), white);
    }
}
