// SVG 1.1 writer.
//
// Serializes one frame to a standalone SVG document. Styling is
// flattened into `style` attributes, shared gradients and patterns are
// written once under `<defs>` and referenced by `url(#id)`, and
// editor-specific state that plain SVG cannot carry (exact triangles,
// shape kinds, raster background styles) goes in `faint:` attributes
// so a later import can rebuild the objects losslessly.

use std::path::Path;
use std::rc::Rc;

use base64::Engine;
use image::RgbaImage;

use crate::canvas::{Background, Frame, ObjId, Shape, encode_png};
use crate::color::{Color, ColorStop, LinearGradient, Paint, Pattern, RadialGradient};
use crate::error::SaveError;
use crate::geom::{Point, Tri, rad_angle, rad_to_deg, rotate_point};
use crate::path::{PathSeg, spline_to_svg_path_data, to_svg_path_data};
use crate::types::{Arrow, FillRule, FillStyle, HAlign, LineStyle, Settings, VAlign};
use crate::xml::{Element, FAINT_NS, SVG_NS, XLINK_NS, fmt_f64, to_svg_document};

// Knobs for `write` and `to_svg`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    // Indent the output for readability instead of emitting one line.
    pub pretty_print: bool,
    // Embed a raster background as a base64 PNG. When disabled a
    // non-uniform background degrades to a white rectangle.
    pub embed_raster: bool,
}

impl ExportOptions {
    pub fn new() -> Self {
        Self {
            pretty_print: false,
            embed_raster: false,
        }
    }

    pub fn pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    pub fn embed_raster(mut self, embed: bool) -> Self {
        self.embed_raster = embed;
        self
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new()
    }
}

// Write `frame` as an SVG document to `path`, or to stdout when `path`
// is `None`. Returns the warnings collected while building the
// document.
pub fn write(
    path: Option<&Path>,
    frame: &Frame,
    options: &ExportOptions,
) -> Result<Vec<String>, SaveError> {
    let (text, warnings) = to_svg(frame, options);
    match path {
        Some(path) => std::fs::write(path, text.as_bytes())?,
        None => {
            use std::io::Write as _;
            std::io::stdout().write_all(text.as_bytes())?;
        }
    }
    Ok(warnings)
}

// Serialize `frame` to SVG text plus any warnings raised for content
// that could not be expressed.
pub fn to_svg(frame: &Frame, options: &ExportOptions) -> (String, Vec<String>) {
    let mut state = BuildState::new();

    let background = create_background(&mut state, frame, options);
    let mut shapes = Vec::new();
    for &id in frame.top_level() {
        if let Some(element) = create_element(&mut state, frame, id) {
            shapes.push(element);
        }
    }

    let mut root = Element::new("svg");
    root.set("version", "1.1");
    root.set("xmlns", SVG_NS);
    root.set("xmlns:faint", FAINT_NS);
    root.set("xmlns:xlink", XLINK_NS);
    root.set("width", fmt_f64(frame.size().w));
    root.set("height", fmt_f64(frame.size().h));
    root.append(create_defs(&mut state));
    root.append(background);
    for element in shapes {
        root.append(element);
    }

    (to_svg_document(&root, options.pretty_print), state.warnings)
}

// Per-document registry of shared paint sources and markers. Gradients
// and patterns are deduplicated by allocation so two objects sharing
// one `Rc` reference the same def.
struct BuildState {
    linear: Vec<Rc<LinearGradient>>,
    patterns: Vec<Rc<Pattern>>,
    radial: Vec<Rc<RadialGradient>>,
    arrowhead: bool,
    arrowtail: bool,
    warnings: Vec<String>,
}

impl BuildState {
    fn new() -> Self {
        Self {
            linear: Vec::new(),
            patterns: Vec::new(),
            radial: Vec::new(),
            arrowhead: false,
            arrowtail: false,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        log::debug!("svg write: {}", message);
        self.warnings.push(message);
    }

    // Attribute value for a paint: an rgb literal for plain colors,
    // otherwise a reference to the def registered for the source.
    fn paint_value(&mut self, paint: &Paint) -> String {
        match paint {
            Paint::Color(color) => to_rgb_color(*color),
            Paint::Linear(gradient) => {
                format!("url(#{})", slot_id("lgradient", &mut self.linear, gradient))
            }
            Paint::Radial(gradient) => {
                format!("url(#{})", slot_id("rgradient", &mut self.radial, gradient))
            }
            Paint::Pattern(pattern) => {
                format!("url(#{})", slot_id("pattern", &mut self.patterns, pattern))
            }
        }
    }
}

fn slot_id<T>(prefix: &str, known: &mut Vec<Rc<T>>, item: &Rc<T>) -> String {
    let index = match known.iter().position(|k| Rc::ptr_eq(k, item)) {
        Some(index) => index,
        None => {
            known.push(Rc::clone(item));
            known.len() - 1
        }
    };
    format!("{}{}", prefix, index + 1)
}

fn to_rgb_color(color: Color) -> String {
    format!("rgb({}, {}, {})", color.r, color.g, color.b)
}

// Like `to_rgb_color` but keeps a non-opaque alpha as a fourth
// component, which the reader accepts in `rgb()` values.
fn to_color_literal(color: Color) -> String {
    if color.a == 255 {
        to_rgb_color(color)
    } else {
        format!("rgb({}, {}, {}, {})", color.r, color.g, color.b, color.a)
    }
}

fn alpha_opacity(a: u8) -> String {
    if a == 255 {
        "1.0".to_string()
    } else {
        fmt_f64(f64::from(a) / 255.0)
    }
}

// Opacity string for a paint. Gradient and pattern alpha lives in
// their stops and pixels, so only plain colors contribute here.
fn to_opacity_str(paint: &Paint) -> String {
    match paint.color() {
        Some(color) => alpha_opacity(color.a),
        None => "1.0".to_string(),
    }
}

// Flatten key/value pairs into a style attribute. Keys are sorted so
// the output is stable regardless of construction order.
fn to_style(mut pairs: Vec<(&str, String)>) -> String {
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let mut out = String::new();
    for (key, value) in pairs {
        out.push_str(key);
        out.push(':');
        out.push_str(&value);
        out.push(';');
    }
    out
}

fn fill_style_pairs(state: &mut BuildState, settings: &Settings) -> Vec<(&'static str, String)> {
    match settings.fill_style {
        FillStyle::Border => vec![
            ("fill", "none".to_string()),
            ("stroke-width", fmt_f64(settings.line_width)),
            ("stroke", state.paint_value(&settings.fg)),
            ("stroke-opacity", to_opacity_str(&settings.fg)),
        ],
        FillStyle::Fill => vec![
            ("stroke", "none".to_string()),
            ("fill", state.paint_value(&settings.fg)),
            ("fill-opacity", to_opacity_str(&settings.fg)),
        ],
        FillStyle::BorderAndFill => vec![
            ("stroke", state.paint_value(&settings.fg)),
            ("stroke-width", fmt_f64(settings.line_width)),
            ("fill", state.paint_value(&settings.bg)),
            ("fill-opacity", to_opacity_str(&settings.bg)),
            ("stroke-opacity", to_opacity_str(&settings.fg)),
        ],
        FillStyle::None => vec![
            ("fill", "none".to_string()),
            ("stroke", "none".to_string()),
        ],
    }
}

fn dash_style(settings: &Settings) -> String {
    if settings.line_style == LineStyle::LongDash {
        let dash = (settings.line_width * 2.0) as i64;
        format!("stroke-dasharray:{},{};", dash, dash)
    } else {
        String::new()
    }
}

// Style for filled shapes: fill and stroke from the fill style, plus
// dashing.
fn fill_style_with_dash(state: &mut BuildState, settings: &Settings) -> String {
    let mut pairs = fill_style_pairs(state, settings);
    if settings.fill_rule == FillRule::EvenOdd {
        pairs.push(("fill-rule", "evenodd".to_string()));
    }
    let mut style = to_style(pairs);
    style.push_str(&dash_style(settings));
    style
}

// `fill_style_with_dash` plus the line join, for shapes with
// corners.
fn shape_style(state: &mut BuildState, settings: &Settings) -> String {
    let mut style = fill_style_with_dash(state, settings);
    style.push_str("stroke-linejoin:");
    style.push_str(settings.join.to_svg());
    style.push(';');
    style
}

fn line_style(state: &mut BuildState, settings: &Settings) -> String {
    let mut style = to_style(vec![
        ("stroke", state.paint_value(&settings.fg)),
        ("stroke-width", fmt_f64(settings.line_width)),
        ("stroke-opacity", to_opacity_str(&settings.fg)),
        ("stroke-linecap", settings.cap.to_svg().to_string()),
    ]);
    style.push_str(&dash_style(settings));
    style
}

fn points_attr(points: &[Point]) -> String {
    let pairs: Vec<String> = points
        .iter()
        .map(|p| format!("{},{}", fmt_f64(p.x), fmt_f64(p.y)))
        .collect();
    pairs.join(" ")
}

fn tri_attr(tri: Tri) -> String {
    points_attr(&[tri.p0(), tri.p1(), tri.p2()])
}

fn png_data_uri(data: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}

fn create_element(state: &mut BuildState, frame: &Frame, id: ObjId) -> Option<Element> {
    let obj = frame.object(id);
    let tri = frame.get_obj_tri(id);
    match &obj.shape {
        Shape::Ellipse => Some(create_ellipse(state, tri, &obj.settings)),
        Shape::Group { children } => Some(create_group(state, frame, children)),
        Shape::Line { points } => Some(create_line(state, points, &obj.settings)),
        Shape::Path { segs } => create_path(state, segs, &obj.settings),
        Shape::Polygon { points } => Some(create_polygon(state, points, &obj.settings)),
        Shape::Raster { bitmap } => create_raster(state, tri, bitmap, &obj.settings),
        Shape::Rect => Some(create_rect(state, tri, &obj.settings)),
        Shape::Spline { points } => Some(create_spline(state, points, &obj.settings)),
        Shape::Text { text } => Some(create_text(state, tri, text, &obj.settings)),
    }
}

fn create_group(state: &mut BuildState, frame: &Frame, children: &[ObjId]) -> Element {
    let mut group = Element::new("g");
    for &child in children {
        if let Some(element) = create_element(state, frame, child) {
            group.append(element);
        }
    }
    group
}

// Rectangles become polygons so a rotated or skewed triangle can be
// written exactly. The corner order p0, p1, p3, p2 walks the
// perimeter; the reader rebuilds the triangle from corners 0, 1 and 3.
fn create_rect(state: &mut BuildState, tri: Tri, settings: &Settings) -> Element {
    let mut element = Element::new("polygon");
    element.set("faint:type", "rect");
    element.set(
        "points",
        points_attr(&[tri.p0(), tri.p1(), tri.p3(), tri.p2()]),
    );
    element.set("style", shape_style(state, settings));
    element
}

fn create_polygon(state: &mut BuildState, points: &[Point], settings: &Settings) -> Element {
    let mut element = Element::new("polygon");
    element.set("points", points_attr(points));
    element.set("style", shape_style(state, settings));
    element
}

// Ellipses are written as a two-arc path, with the exact triangle in
// `faint:tri` since arc endpoints cannot express a degenerate ellipse.
fn create_ellipse(state: &mut BuildState, tri: Tri, settings: &Settings) -> Element {
    let mut element = Element::new("path");
    element.set("d", ellipse_path_data(tri));
    element.set("style", fill_style_with_dash(state, settings));
    element.set("faint:tri", tri_attr(tri));
    element.set("faint:type", "ellipse");
    element
}

fn ellipse_path_data(tri: Tri) -> String {
    let angle = tri.angle();
    let flat = tri.with_angle(0.0);
    let rx = flat.width() / 2.0;
    let ry = flat.height() / 2.0;
    let center = Point::new(flat.p0().x + rx, flat.p0().y + ry);
    let start = rotate_point(Point::new(center.x - rx, center.y), angle, tri.p0());
    let end = rotate_point(Point::new(center.x + rx, center.y), angle, tri.p0());
    let rot = fmt_f64(rad_to_deg(angle));
    let rx = fmt_f64(rx.abs());
    let ry = fmt_f64(ry.abs());
    format!(
        "M {} {} A {} {} {} 1 0 {} {} A {} {} {} 1 0 {} {} z",
        fmt_f64(start.x),
        fmt_f64(start.y),
        rx,
        ry,
        rot,
        fmt_f64(end.x),
        fmt_f64(end.y),
        rx,
        ry,
        rot,
        fmt_f64(start.x),
        fmt_f64(start.y),
    )
}

fn create_line(state: &mut BuildState, points: &[Point], settings: &Settings) -> Element {
    if points.len() == 2 {
        create_simple_line(state, points, settings)
    } else {
        create_polyline(state, points, settings)
    }
}

fn create_simple_line(state: &mut BuildState, points: &[Point], settings: &Settings) -> Element {
    let mut element = Element::new("line");
    let tip = if settings.arrow == Arrow::Front {
        shortened_line_end(points[1], points[0], settings.line_width)
    } else {
        points[1]
    };
    element.set("x1", fmt_f64(points[0].x));
    element.set("y1", fmt_f64(points[0].y));
    element.set("x2", fmt_f64(tip.x));
    element.set("y2", fmt_f64(tip.y));
    element.set("style", line_style(state, settings));
    set_arrow_markers(state, &mut element, settings.arrow);
    element
}

fn create_polyline(state: &mut BuildState, points: &[Point], settings: &Settings) -> Element {
    let mut element = Element::new("polyline");
    let mut points = points.to_vec();
    let n = points.len();
    if settings.arrow == Arrow::Front && n >= 2 {
        points[n - 1] = shortened_line_end(points[n - 1], points[n - 2], settings.line_width);
    }
    element.set("points", points_attr(&points));
    let mut style = line_style(state, settings);
    style.push_str("fill:none;");
    element.set("style", style);
    set_arrow_markers(state, &mut element, settings.arrow);
    element
}

// Pull the end point back along the line so the arrow marker, whose
// tip extends past its anchor, ends up where the stored tip is. The
// reader applies the inverse offset.
fn shortened_line_end(tip: Point, prev: Point, line_width: f64) -> Point {
    let angle = rad_angle(tip, prev);
    let length = 15.0 * (line_width / 2.0);
    Point::new(
        tip.x + libm::cos(angle) * length,
        tip.y + libm::sin(angle) * length,
    )
}

fn set_arrow_markers(state: &mut BuildState, element: &mut Element, arrow: Arrow) {
    if arrow.has_front() {
        state.arrowhead = true;
        element.set("marker-end", "url(#Arrowhead)");
    }
    if arrow.has_back() {
        state.arrowtail = true;
        element.set("marker-start", "url(#Arrowtail)");
    }
}

fn create_path(state: &mut BuildState, segs: &[PathSeg], settings: &Settings) -> Option<Element> {
    let d = to_svg_path_data(segs);
    if d.is_empty() {
        state.warn("Skipping empty path".to_string());
        return None;
    }
    let mut element = Element::new("path");
    element.set("d", d);
    element.set("style", shape_style(state, settings));
    Some(element)
}

fn create_spline(state: &mut BuildState, points: &[Point], settings: &Settings) -> Element {
    let mut element = Element::new("path");
    element.set("d", spline_to_svg_path_data(points));
    element.set("faint:type", "spline");
    let mut style = line_style(state, settings);
    style.push_str("fill:none;");
    element.set("style", style);
    element
}

fn create_raster(
    state: &mut BuildState,
    tri: Tri,
    bitmap: &RgbaImage,
    settings: &Settings,
) -> Option<Element> {
    let png = match encode_png(bitmap) {
        Ok(png) => png,
        Err(err) => {
            state.warn(format!("Failed encoding raster object: {}", err));
            return None;
        }
    };
    let mut element = Element::new("image");
    let (transform, x_offset) = transform_and_offset(tri);
    if !transform.is_empty() {
        element.set("transform", transform);
    }
    element.set("x", fmt_f64(tri.p0().x + x_offset));
    element.set("y", fmt_f64(tri.p0().y));
    element.set("width", fmt_f64(tri.width()));
    element.set("height", fmt_f64(tri.height()));
    element.set("faint:bg-style", settings.background_style.as_str());
    if let Some(color) = settings.bg.color() {
        element.set("faint:mask-color", to_color_literal(color));
    }
    element.set("xlink:href", png_data_uri(&png));
    Some(element)
}

// Rotation and skew of a raster triangle expressed as a transform
// attribute, plus the x adjustment the skew shear introduces at the
// image's y position.
fn transform_and_offset(tri: Tri) -> (String, f64) {
    let mut transform = String::new();
    let angle = tri.angle();
    let flat = if angle != 0.0 {
        transform = format!(
            "rotate({},{},{})",
            fmt_f64(rad_to_deg(angle)),
            fmt_f64(tri.p0().x),
            fmt_f64(tri.p0().y)
        );
        tri.with_angle(0.0)
    } else {
        tri
    };
    let mut x_offset = 0.0;
    let skew = flat.skew();
    if skew != 0.0 {
        let skew_angle = libm::atan2(skew, flat.p0().y - flat.p2().y);
        if !transform.is_empty() {
            transform.push(' ');
        }
        transform.push_str(&format!("skewX({})", fmt_f64(rad_to_deg(skew_angle))));
        x_offset = -flat.p0().y * libm::tan(skew_angle);
    }
    (transform, x_offset)
}

fn create_text(state: &mut BuildState, tri: Tri, text: &str, settings: &Settings) -> Element {
    let angle = tri.angle();
    let flat = tri.with_angle(0.0);
    let origin = flat.p0();
    let width = flat.width();
    let height = flat.height();
    let text_height = settings.font_size;

    let mut element = Element::new("text");
    element.set("faint:bounded", if settings.bounded { "1" } else { "0" });
    if settings.halign != HAlign::Left {
        element.set("faint:halign", settings.halign.as_str());
    }
    if settings.valign != VAlign::Top {
        element.set("faint:valign", settings.valign.as_str());
    }

    // The anchor matches the text-anchor mode so the reader can undo
    // the offset and recover the left edge.
    let anchor_x = match settings.halign {
        HAlign::Center => origin.x + width / 2.0,
        HAlign::Left | HAlign::Right => origin.x,
    };
    element.set("x", fmt_f64(anchor_x));
    element.set("y", fmt_f64(origin.y + text_height));
    element.set("width", fmt_f64(width));
    element.set("height", fmt_f64(height));
    match settings.halign {
        HAlign::Center => element.set("text-anchor", "middle"),
        HAlign::Right => element.set("text-anchor", "end"),
        HAlign::Left => {}
    }

    element.set(
        "style",
        to_style(vec![
            ("fill", state.paint_value(&settings.fg)),
            ("font-size", format!("{}px", fmt_f64(settings.font_size))),
            ("font-family", settings.font_face.clone()),
            (
                "font-style",
                if settings.font_italic { "italic" } else { "normal" }.to_string(),
            ),
            (
                "font-weight",
                if settings.font_bold { "bold" } else { "normal" }.to_string(),
            ),
        ]),
    );

    let lines: Vec<&str> = text.split('\n').collect();
    let count = lines.len();
    for (index, line) in lines.into_iter().enumerate() {
        let mut tspan = Element::new("tspan");
        tspan.set("x", fmt_f64(anchor_x));
        tspan.set("y", fmt_f64(origin.y + text_height * (index as f64 + 1.0)));
        if index + 1 < count {
            tspan.set("faint:hardbreak", "1");
        }
        tspan.set_text(line);
        element.append(tspan);
    }

    if angle != 0.0 {
        element.set(
            "transform",
            format!(
                "rotate({},{},{})",
                fmt_f64(rad_to_deg(angle)),
                fmt_f64(origin.x),
                fmt_f64(origin.y)
            ),
        );
    }
    element
}

fn create_background(state: &mut BuildState, frame: &Frame, options: &ExportOptions) -> Element {
    if let Some(color) = frame.one_color_background() {
        return background_color_rect(color);
    }
    let Background::Bitmap(bitmap) = frame.background() else {
        // one_color_background covers every color background.
        return background_color_rect(Color::WHITE);
    };
    if !options.embed_raster {
        state.warn("Raster background dropped (raster embedding is disabled)".to_string());
        return background_color_rect(Color::WHITE);
    }
    match encode_png(bitmap) {
        Ok(png) => {
            let mut element = Element::new("image");
            element.set("faint:background", "1");
            element.set("x", "0");
            element.set("y", "0");
            element.set("width", fmt_f64(frame.size().w));
            element.set("height", fmt_f64(frame.size().h));
            element.set("xlink:href", png_data_uri(&png));
            element
        }
        Err(err) => {
            state.warn(format!("Failed encoding background raster: {}", err));
            background_color_rect(Color::WHITE)
        }
    }
}

fn background_color_rect(color: Color) -> Element {
    let mut element = Element::new("rect");
    element.set("faint:background", "1");
    element.set("x", "0");
    element.set("y", "0");
    element.set("width", "100%");
    element.set("height", "100%");
    element.set("fill", to_color_literal(color));
    element
}

// The defs block, which is emitted even when empty: linear gradients,
// patterns, radial gradients, then arrow markers, ids numbered from 1
// in registration order.
fn create_defs(state: &mut BuildState) -> Element {
    let mut defs = Element::new("defs");
    let linear = state.linear.clone();
    for (index, gradient) in linear.iter().enumerate() {
        defs.append(create_linear_gradient(
            gradient,
            &format!("lgradient{}", index + 1),
        ));
    }
    let patterns = state.patterns.clone();
    for (index, pattern) in patterns.iter().enumerate() {
        let id = format!("pattern{}", index + 1);
        match create_pattern(pattern, &id) {
            Ok(element) => defs.append(element),
            Err(err) => {
                state.warn(format!("Failed encoding pattern {}: {}", id, err));
            }
        }
    }
    let radial = state.radial.clone();
    for (index, gradient) in radial.iter().enumerate() {
        defs.append(create_radial_gradient(
            gradient,
            &format!("rgradient{}", index + 1),
        ));
    }
    if state.arrowhead {
        defs.append(create_arrowhead());
    }
    if state.arrowtail {
        defs.append(create_arrowtail());
    }
    defs
}

// A linear gradient angle maps to a unit direction vector. Negative
// components are moved to the start coordinate since SVG gradient
// vectors use only the 0..1 object box.
fn create_linear_gradient(gradient: &LinearGradient, id: &str) -> Element {
    let mut element = Element::new("linearGradient");
    element.set("id", id);
    let angle = gradient.angle();
    let mut x1 = 0.0;
    let mut y1 = 0.0;
    let mut x2 = 1.0;
    let mut y2 = 0.0;
    if angle != 0.0 {
        x2 = libm::cos(angle);
        if x2 < 0.0 {
            x1 = -x2;
            x2 = 0.0;
        }
        y2 = libm::sin(angle);
        if y2 < 0.0 {
            y1 = -y2;
            y2 = 0.0;
        }
    }
    element.set("x1", fmt_f64(x1));
    element.set("y1", fmt_f64(y1));
    element.set("x2", fmt_f64(x2));
    element.set("y2", fmt_f64(y2));
    for stop in create_color_stops(gradient.stops()) {
        element.append(stop);
    }
    element
}

fn create_radial_gradient(gradient: &RadialGradient, id: &str) -> Element {
    let mut element = Element::new("radialGradient");
    element.set("id", id);
    let center = gradient.center();
    let (rx, ry) = gradient.radii();
    element.set("cx", fmt_f64(center.x));
    element.set("cy", fmt_f64(center.y));
    element.set("rx", fmt_f64(rx));
    element.set("ry", fmt_f64(ry));
    for stop in create_color_stops(gradient.stops()) {
        element.append(stop);
    }
    element
}

fn create_color_stops(stops: &[ColorStop]) -> Vec<Element> {
    stops
        .iter()
        .map(|stop| {
            let mut element = Element::new("stop");
            element.set("offset", fmt_f64(stop.offset));
            element.set(
                "style",
                to_style(vec![
                    ("stop-color", to_rgb_color(stop.color)),
                    ("stop-opacity", alpha_opacity(stop.color.a)),
                ]),
            );
            element
        })
        .collect()
}

fn create_pattern(pattern: &Pattern, id: &str) -> Result<Element, image::ImageError> {
    let bitmap = pattern.bitmap();
    let (width, height) = bitmap.dimensions();
    let png = encode_png(bitmap)?;
    let mut element = Element::new("pattern");
    element.set("id", id);
    element.set("x", "0");
    element.set("y", "0");
    element.set("width", width.to_string());
    element.set("height", height.to_string());
    if !pattern.object_aligned() {
        element.set("patternUnits", "userSpaceOnUse");
        element.set("patternContentUnits", "userSpaceOnUse");
    }
    let mut image = Element::new("image");
    image.set("width", width.to_string());
    image.set("height", height.to_string());
    image.set("xlink:href", png_data_uri(&png));
    element.append(image);
    Ok(element)
}

fn create_arrowhead() -> Element {
    let mut marker = Element::new("marker");
    marker.set("id", "Arrowhead");
    marker.set("markerUnits", "strokeWidth");
    marker.set("markerWidth", "7.5");
    marker.set("markerHeight", "6.6");
    marker.set("orient", "auto");
    marker.set("refX", "0");
    // Anchor on the barb center line.
    marker.set("refY", "3.3");
    let mut path = Element::new("path");
    path.set("d", "M 0 0 L 7.5 3.3 L 0 6.6 z");
    marker.append(path);
    marker
}

fn create_arrowtail() -> Element {
    let mut marker = Element::new("marker");
    marker.set("id", "Arrowtail");
    marker.set("markerUnits", "strokeWidth");
    marker.set("viewBox", "0 0 10 10");
    marker.set("markerWidth", "10");
    marker.set("markerHeight", "10");
    marker.set("orient", "auto");
    marker.set("refX", "10");
    marker.set("refY", "5");
    let mut path = Element::new("path");
    path.set("d", "M 10 0 L 0 5 L 10 10 z");
    marker.append(path);
    marker
}
