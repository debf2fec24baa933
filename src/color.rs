use std::rc::Rc;

use image::RgbaImage;

use crate::geom::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Color,
}

impl ColorStop {
    pub const fn new(offset: f64, color: Color) -> Self {
        Self { offset, color }
    }
}

fn sorted_stops(mut stops: Vec<ColorStop>) -> Vec<ColorStop> {
    stops.sort_by(|a, b| {
        a.offset
            .partial_cmp(&b.offset)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    stops
}

// Linear gradient along `angle` radians. Stops are kept sorted by
// offset from construction on.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    angle: f64,
    stops: Vec<ColorStop>,
}

impl LinearGradient {
    pub fn new(angle: f64, stops: Vec<ColorStop>) -> Self {
        Self {
            angle,
            stops: sorted_stops(stops),
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    center: Point,
    rx: f64,
    ry: f64,
    stops: Vec<ColorStop>,
}

impl RadialGradient {
    pub fn new(center: Point, rx: f64, ry: f64, stops: Vec<ColorStop>) -> Self {
        Self {
            center,
            rx,
            ry,
            stops: sorted_stops(stops),
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radii(&self) -> (f64, f64) {
        (self.rx, self.ry)
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    bitmap: RgbaImage,
    object_aligned: bool,
}

impl Pattern {
    pub fn new(bitmap: RgbaImage) -> Self {
        Self {
            bitmap,
            object_aligned: true,
        }
    }

    pub fn with_object_aligned(mut self, object_aligned: bool) -> Self {
        self.object_aligned = object_aligned;
        self
    }

    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    pub fn object_aligned(&self) -> bool {
        self.object_aligned
    }
}

// A fill or stroke source. Gradients and patterns are shared through
// `Rc`; the exporter deduplicates them by pointer identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Color(Color),
    Linear(Rc<LinearGradient>),
    Radial(Rc<RadialGradient>),
    Pattern(Rc<Pattern>),
}

impl Paint {
    pub fn color(&self) -> Option<Color> {
        match self {
            Paint::Color(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<Color> for Paint {
    fn from(value: Color) -> Self {
        Paint::Color(value)
    }
}

// The id inside a url(#...) paint reference, if the value is one.
pub fn extract_url_reference(text: &str) -> Option<&str> {
    let rest = text.trim().strip_prefix("url(#")?;
    let end = rest.find(')')?;
    Some(&rest[..end])
}

fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn hex_component(text: &str) -> Option<u8> {
    u8::from_str_radix(text, 16).ok()
}

fn parse_hex_color(text: &str, opacity: f64) -> Option<Color> {
    let digits = text.strip_prefix('#')?;
    let (r, g, b) = match digits.len() {
        // #rgb doubles each digit.
        3 => {
            let r = hex_component(&digits[0..1])?;
            let g = hex_component(&digits[1..2])?;
            let b = hex_component(&digits[2..3])?;
            (r * 16 + r, g * 16 + g, b * 16 + b)
        }
        6 => (
            hex_component(&digits[0..2])?,
            hex_component(&digits[2..4])?,
            hex_component(&digits[4..6])?,
        ),
        _ => return None,
    };
    Some(Color::rgba(r, g, b, clamp_u8(opacity * 255.0)))
}

fn parse_rgb_component(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(percent) = text.strip_suffix('%') {
        return percent.parse::<f64>().ok().map(|v| v / 100.0 * 255.0);
    }
    text.parse::<f64>().ok()
}

fn parse_rgb_func(text: &str, opacity: f64) -> Option<Color> {
    let inner = text
        .strip_prefix("rgba(")
        .or_else(|| text.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let r = clamp_u8(parse_rgb_component(parts[0])?);
    let g = clamp_u8(parse_rgb_component(parts[1])?);
    let b = clamp_u8(parse_rgb_component(parts[2])?);
    // Four-component rgb() carries an explicit 0-255 alpha.
    let a = if parts.len() == 4 {
        clamp_u8(parts[3].trim().parse::<f64>().ok()? * opacity)
    } else {
        clamp_u8(opacity * 255.0)
    };
    Some(Color::rgba(r, g, b, a))
}

// Parses a color literal: hex, rgb()/rgba(), a named color or
// currentColor. Does not resolve url(#...) references. Returns None
// for values it cannot read, "none" included.
pub fn parse_color_noref(text: &str, opacity: f64, current_color: Color) -> Option<Color> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(color) = parse_hex_color(s, opacity) {
        return Some(color);
    }
    let lower = s.to_ascii_lowercase();
    if lower == "currentcolor" {
        let a = clamp_u8(current_color.a as f64 * opacity);
        return Some(Color::rgba(
            current_color.r,
            current_color.g,
            current_color.b,
            a,
        ));
    }
    if lower.starts_with("rgb(") || lower.starts_with("rgba(") {
        return parse_rgb_func(&lower, opacity);
    }
    SVG_COLOR_NAMES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, (r, g, b))| Color::rgba(*r, *g, *b, clamp_u8(opacity * 255.0)))
}

// SVG 1.1 color keywords.
static SVG_COLOR_NAMES: &[(&str, (u8, u8, u8))] = &[
    ("aliceblue", (240, 248, 255)),
    ("antiquewhite", (250, 235, 215)),
    ("aqua", (0, 255, 255)),
    ("aquamarine", (127, 255, 212)),
    ("azure", (240, 255, 255)),
    ("beige", (245, 245, 220)),
    ("bisque", (255, 228, 196)),
    ("black", (0, 0, 0)),
    ("blanchedalmond", (255, 235, 205)),
    ("blue", (0, 0, 255)),
    ("blueviolet", (138, 43, 226)),
    ("brown", (165, 42, 42)),
    ("burlywood", (222, 184, 135)),
    ("cadetblue", (95, 158, 160)),
    ("chartreuse", (127, 255, 0)),
    ("chocolate", (210, 105, 30)),
    ("coral", (255, 127, 80)),
    ("cornflowerblue", (100, 149, 237)),
    ("cornsilk", (255, 248, 220)),
    ("crimson", (220, 20, 60)),
    ("cyan", (0, 255, 255)),
    ("darkblue", (0, 0, 139)),
    ("darkcyan", (0, 139, 139)),
    ("darkgoldenrod", (184, 134, 11)),
    ("darkgray", (169, 169, 169)),
    ("darkgreen", (0, 100, 0)),
    ("darkgrey", (169, 169, 169)),
    ("darkkhaki", (189, 183, 107)),
    ("darkmagenta", (139, 0, 139)),
    ("darkolivegreen", (85, 107, 47)),
    ("darkorange", (255, 140, 0)),
    ("darkorchid", (153, 50, 204)),
    ("darkred", (139, 0, 0)),
    ("darksalmon", (233, 150, 122)),
    ("darkseagreen", (143, 188, 143)),
    ("darkslateblue", (72, 61, 139)),
    ("darkslategray", (47, 79, 79)),
    ("darkslategrey", (47, 79, 79)),
    ("darkturquoise", (0, 206, 209)),
    ("darkviolet", (148, 0, 211)),
    ("deeppink", (255, 20, 147)),
    ("deepskyblue", (0, 191, 255)),
    ("dimgray", (105, 105, 105)),
    ("dimgrey", (105, 105, 105)),
    ("dodgerblue", (30, 144, 255)),
    ("firebrick", (178, 34, 34)),
    ("floralwhite", (255, 250, 240)),
    ("forestgreen", (34, 139, 34)),
    ("fuchsia", (255, 0, 255)),
    ("gainsboro", (220, 220, 220)),
    ("ghostwhite", (248, 248, 255)),
    ("gold", (255, 215, 0)),
    ("goldenrod", (218, 165, 32)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("green", (0, 128, 0)),
    ("greenyellow", (173, 255, 47)),
    ("honeydew", (240, 255, 240)),
    ("hotpink", (255, 105, 180)),
    ("indianred", (205, 92, 92)),
    ("indigo", (75, 0, 130)),
    ("ivory", (255, 255, 240)),
    ("khaki", (240, 230, 140)),
    ("lavender", (230, 230, 250)),
    ("lavenderblush", (255, 240, 245)),
    ("lawngreen", (124, 252, 0)),
    ("lemonchiffon", (255, 250, 205)),
    ("lightblue", (173, 216, 230)),
    ("lightcoral", (240, 128, 128)),
    ("lightcyan", (224, 255, 255)),
    ("lightgoldenrodyellow", (250, 250, 210)),
    ("lightgray", (211, 211, 211)),
    ("lightgreen", (144, 238, 144)),
    ("lightgrey", (211, 211, 211)),
    ("lightpink", (255, 182, 193)),
    ("lightsalmon", (255, 160, 122)),
    ("lightseagreen", (32, 178, 170)),
    ("lightskyblue", (135, 206, 250)),
    ("lightslategray", (119, 136, 153)),
    ("lightslategrey", (119, 136, 153)),
    ("lightsteelblue", (176, 196, 222)),
    ("lightyellow", (255, 255, 224)),
    ("lime", (0, 255, 0)),
    ("limegreen", (50, 205, 50)),
    ("linen", (250, 240, 230)),
    ("magenta", (255, 0, 255)),
    ("maroon", (128, 0, 0)),
    ("mediumaquamarine", (102, 205, 170)),
    ("mediumblue", (0, 0, 205)),
    ("mediumorchid", (186, 85, 211)),
    ("mediumpurple", (147, 112, 219)),
    ("mediumseagreen", (60, 179, 113)),
    ("mediumslateblue", (123, 104, 238)),
    ("mediumspringgreen", (0, 250, 154)),
    ("mediumturquoise", (72, 209, 204)),
    ("mediumvioletred", (199, 21, 133)),
    ("midnightblue", (25, 25, 112)),
    ("mintcream", (245, 255, 250)),
    ("mistyrose", (255, 228, 225)),
    ("moccasin", (255, 228, 181)),
    ("navajowhite", (255, 222, 173)),
    ("navy", (0, 0, 128)),
    ("oldlace", (253, 245, 230)),
    ("olive", (128, 128, 0)),
    ("olivedrab", (107, 142, 35)),
    ("orange", (255, 165, 0)),
    ("orangered", (255, 69, 0)),
    ("orchid", (218, 112, 214)),
    ("palegoldenrod", (238, 232, 170)),
    ("palegreen", (152, 251, 152)),
    ("paleturquoise", (175, 238, 238)),
    ("palevioletred", (219, 112, 147)),
    ("papayawhip", (255, 239, 213)),
    ("peachpuff", (255, 218, 185)),
    ("peru", (205, 133, 63)),
    ("pink", (255, 192, 203)),
    ("plum", (221, 160, 221)),
    ("powderblue", (176, 224, 230)),
    ("purple", (128, 0, 128)),
    ("red", (255, 0, 0)),
    ("rosybrown", (188, 143, 143)),
    ("royalblue", (65, 105, 225)),
    ("saddlebrown", (139, 69, 19)),
    ("salmon", (250, 128, 114)),
    ("sandybrown", (244, 164, 96)),
    ("seagreen", (46, 139, 87)),
    ("seashell", (255, 245, 238)),
    ("sienna", (160, 82, 45)),
    ("silver", (192, 192, 192)),
    ("skyblue", (135, 206, 235)),
    ("slateblue", (106, 90, 205)),
    ("slategray", (112, 128, 144)),
    ("slategrey", (112, 128, 144)),
    ("snow", (255, 250, 250)),
    ("springgreen", (0, 255, 127)),
    ("steelblue", (70, 130, 180)),
    ("tan", (210, 180, 140)),
    ("teal", (0, 128, 128)),
    ("thistle", (216, 191, 216)),
    ("tomato", (255, 99, 71)),
    ("turquoise", (64, 224, 208)),
    ("violet", (238, 130, 238)),
    ("wheat", (245, 222, 179)),
    ("white", (255, 255, 255)),
    ("whitesmoke", (245, 245, 245)),
    ("yellow", (255, 255, 0)),
    ("yellowgreen", (154, 205, 50)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(
            parse_color_noref("#ff0000", 1.0, Color::BLACK),
            Some(Color::rgb(255, 0, 0))
        );
        assert_eq!(
            parse_color_noref("#1a2b3c", 1.0, Color::BLACK),
            Some(Color::rgb(26, 43, 60))
        );
    }

    #[test]
    fn short_hex_doubles_digits() {
        assert_eq!(
            parse_color_noref("#f0a", 1.0, Color::BLACK),
            Some(Color::rgb(255, 0, 170))
        );
    }

    #[test]
    fn parses_rgb_function_with_percent_components() {
        assert_eq!(
            parse_color_noref("rgb(255, 0, 0)", 1.0, Color::BLACK),
            Some(Color::rgb(255, 0, 0))
        );
        assert_eq!(
            parse_color_noref("rgb(100%, 0%, 50%)", 1.0, Color::BLACK),
            Some(Color::rgb(255, 0, 128))
        );
    }

    #[test]
    fn four_component_rgb_carries_alpha() {
        assert_eq!(
            parse_color_noref("rgb(10, 20, 30, 40)", 1.0, Color::BLACK),
            Some(Color::rgba(10, 20, 30, 40))
        );
    }

    #[test]
    fn opacity_scales_alpha() {
        assert_eq!(
            parse_color_noref("#000000", 0.5, Color::BLACK),
            Some(Color::rgba(0, 0, 0, 128))
        );
    }

    #[test]
    fn named_colors_resolve_case_insensitively() {
        assert_eq!(
            parse_color_noref("RebeccaPurple", 1.0, Color::BLACK),
            None,
            "names outside the SVG 1.1 table should not resolve"
        );
        assert_eq!(
            parse_color_noref("CornflowerBlue", 1.0, Color::BLACK),
            Some(Color::rgb(100, 149, 237))
        );
    }

    #[test]
    fn current_color_resolves_from_state() {
        let current = Color::rgb(1, 2, 3);
        assert_eq!(
            parse_color_noref("currentColor", 1.0, current),
            Some(current)
        );
    }

    #[test]
    fn garbage_and_none_do_not_parse() {
        assert_eq!(parse_color_noref("none", 1.0, Color::BLACK), None);
        assert_eq!(parse_color_noref("#12345", 1.0, Color::BLACK), None);
        assert_eq!(parse_color_noref("blurple", 1.0, Color::BLACK), None);
    }

    #[test]
    fn url_reference_extraction() {
        assert_eq!(extract_url_reference("url(#lgradient1)"), Some("lgradient1"));
        assert_eq!(extract_url_reference("rgb(0,0,0)"), None);
    }

    #[test]
    fn gradient_stops_sort_on_construction() {
        let g = LinearGradient::new(
            0.0,
            vec![
                ColorStop::new(0.9, Color::BLACK),
                ColorStop::new(0.1, Color::WHITE),
                ColorStop::new(0.5, Color::rgb(9, 9, 9)),
            ],
        );
        let offsets: Vec<f64> = g.stops().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.1, 0.5, 0.9]);
    }
}
