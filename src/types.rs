use crate::color::{Color, Paint};

// How a shape is painted: outline, interior or both. The fg/bg slots
// in Settings shift meaning with this: fg is the stroke paint whenever
// a border is present, otherwise the fill paint; bg is the fill paint
// when both are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStyle {
    None,
    Fill,
    Border,
    BorderAndFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    LongDash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cap {
    Flat,
    Round,
}

impl Cap {
    pub fn to_svg(self) -> &'static str {
        match self {
            Cap::Flat => "butt",
            Cap::Round => "round",
        }
    }

    pub fn from_svg(value: &str) -> Option<Cap> {
        match value {
            "butt" | "square" => Some(Cap::Flat),
            "round" => Some(Cap::Round),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    Miter,
    Round,
    Bevel,
}

impl Join {
    pub fn to_svg(self) -> &'static str {
        match self {
            Join::Miter => "miter",
            Join::Round => "round",
            Join::Bevel => "bevel",
        }
    }

    pub fn from_svg(value: &str) -> Option<Join> {
        match value {
            "miter" => Some(Join::Miter),
            "round" => Some(Join::Round),
            "bevel" => Some(Join::Bevel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    None,
    Front,
    Back,
    Both,
}

impl Arrow {
    pub fn has_front(self) -> bool {
        matches!(self, Arrow::Front | Arrow::Both)
    }

    pub fn has_back(self) -> bool {
        matches!(self, Arrow::Back | Arrow::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

impl HAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            HAlign::Left => "left",
            HAlign::Center => "center",
            HAlign::Right => "right",
        }
    }

    pub fn from_str(value: &str) -> Option<HAlign> {
        match value {
            "left" => Some(HAlign::Left),
            "center" => Some(HAlign::Center),
            "right" => Some(HAlign::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

impl VAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            VAlign::Top => "top",
            VAlign::Middle => "middle",
            VAlign::Bottom => "bottom",
        }
    }

    pub fn from_str(value: &str) -> Option<VAlign> {
        match value {
            "top" => Some(VAlign::Top),
            "middle" => Some(VAlign::Middle),
            "bottom" => Some(VAlign::Bottom),
            _ => None,
        }
    }
}

// Transparency mode for raster objects: masked treats the background
// color (the bg paint) as transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterStyle {
    Masked,
    Opaque,
}

impl RasterStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            RasterStyle::Masked => "masked",
            RasterStyle::Opaque => "opaque",
        }
    }

    pub fn from_str(value: &str) -> Option<RasterStyle> {
        match value {
            "masked" => Some(RasterStyle::Masked),
            "opaque" => Some(RasterStyle::Opaque),
            _ => None,
        }
    }
}

// The inheritable style record carried down the parse and attached to
// every created object.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub fill_style: FillStyle,
    pub fg: Paint,
    pub bg: Paint,
    pub line_width: f64,
    pub line_style: LineStyle,
    pub cap: Cap,
    pub join: Join,
    pub fill_rule: FillRule,
    pub arrow: Arrow,
    pub font_face: String,
    pub font_size: f64,
    pub font_bold: bool,
    pub font_italic: bool,
    pub bounded: bool,
    pub halign: HAlign,
    pub valign: VAlign,
    pub background_style: RasterStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fill_style: FillStyle::Fill,
            fg: Paint::Color(Color::BLACK),
            bg: Paint::Color(Color::BLACK),
            line_width: 1.0,
            line_style: LineStyle::Solid,
            cap: Cap::Flat,
            join: Join::Miter,
            fill_rule: FillRule::NonZero,
            arrow: Arrow::None,
            font_face: String::new(),
            font_size: 12.0,
            font_bold: false,
            font_italic: false,
            bounded: true,
            halign: HAlign::Left,
            valign: VAlign::Top,
            background_style: RasterStyle::Opaque,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_round_trips_through_svg_names() {
        assert_eq!(Cap::from_svg(Cap::Flat.to_svg()), Some(Cap::Flat));
        assert_eq!(Cap::from_svg(Cap::Round.to_svg()), Some(Cap::Round));
        assert_eq!(Cap::from_svg("square"), Some(Cap::Flat));
    }

    #[test]
    fn arrow_mode_queries() {
        assert!(Arrow::Both.has_front() && Arrow::Both.has_back());
        assert!(Arrow::Front.has_front() && !Arrow::Front.has_back());
        assert!(!Arrow::None.has_front() && !Arrow::None.has_back());
    }
}
