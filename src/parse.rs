// SVG 1.1 reader. Descends the element tree recursively, carrying a
// per-branch state of CTM, inherited settings and currentColor, and
// turns supported elements into objects on a frame. Per-element
// problems become warning strings on the `Image`; only unreadable
// XML, a non-svg root and io failures are fatal.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use base64::Engine;

use crate::canvas::{Frame, Image, ObjId, decode_raster};
use crate::color::{
    Color, ColorStop, LinearGradient, Paint, Pattern, RadialGradient, extract_url_reference,
    parse_color_noref,
};
use crate::error::LoadError;
use crate::geom::{Matrix, Point, Rect, Size, Tri, center_based_to_rect, deg_to_rad, rad_angle};
use crate::path::{PathSeg, parse_path_data, spline_points_from_segs};
use crate::types::{
    Arrow, Cap, FillRule, FillStyle, HAlign, Join, LineStyle, RasterStyle, Settings, VAlign,
};
use crate::xml::{FAINT_NS, XLINK_NS};

// Frame dimensions used when the document does not provide usable ones.
const DEFAULT_SIZE: Size = Size::new(640.0, 480.0);

// Initial value for currentColor.
const DEFAULT_CURRENT_COLOR: Color = Color::rgb(255, 0, 0);

// Feature strings accepted in requiredFeatures tests on switch children.
static SUPPORTED_FEATURES: &[&str] = &[
    "http://www.w3.org/TR/SVG11/feature#SVG",
    "http://www.w3.org/TR/SVG11/feature#SVGDOM",
    "http://www.w3.org/TR/SVG11/feature#SVG-static",
    "http://www.w3.org/TR/SVG11/feature#SVGDOM-static",
    "http://www.w3.org/TR/SVG11/feature#Structure",
    "http://www.w3.org/TR/SVG11/feature#BasicStructure",
    "http://www.w3.org/TR/SVG11/feature#ConditionalProcessing",
    "http://www.w3.org/TR/SVG11/feature#Image",
    "http://www.w3.org/TR/SVG11/feature#Style",
    "http://www.w3.org/TR/SVG11/feature#Shape",
    "http://www.w3.org/TR/SVG11/feature#Text",
    "http://www.w3.org/TR/SVG11/feature#BasicText",
    "http://www.w3.org/TR/SVG11/feature#PaintAttribute",
    "http://www.w3.org/TR/SVG11/feature#BasicPaintAttribute",
    "http://www.w3.org/TR/SVG11/feature#OpacityAttribute",
    "http://www.w3.org/TR/SVG11/feature#GraphicsAttribute",
    "http://www.w3.org/TR/SVG11/feature#BasicGraphicsAttribute",
    "http://www.w3.org/TR/SVG11/feature#Gradient",
    "http://www.w3.org/TR/SVG11/feature#XlinkAttribute",
    "http://www.w3.org/TR/SVG11/feature#Font",
    "http://www.w3.org/TR/SVG11/feature#BasicFont",
];

// Import knobs for `parse_document` and `parse_string`.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    system_language: String,
}

impl ImportOptions {
    pub fn new() -> Self {
        Self {
            system_language: "en".to_string(),
        }
    }

    // Language code matched against systemLanguage attributes when
    // picking a switch branch.
    pub fn system_language(mut self, code: &str) -> Self {
        self.system_language = code.to_string();
        self
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_document(path: &Path, options: &ImportOptions) -> Result<Image, LoadError> {
    let text = std::fs::read_to_string(path)?;
    parse_string(&text, options)
}

pub fn parse_string(text: &str, options: &ImportOptions) -> Result<Image, LoadError> {
    // Saved documents carry the SVG 1.1 doctype, which roxmltree only
    // accepts when DTDs are explicitly allowed.
    let doc = roxmltree::Document::parse_with_options(
        text,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        },
    )?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(LoadError::NotSvg);
    }
    let mut image = Image::new();
    parse_root(&mut image, root, options);
    Ok(image)
}

// Mutable side of a parse: the frame being filled, the warning sink
// and the registries backing url(#...) resolution.
struct ParseCtx<'f, 'a, 'input> {
    frame: &'f mut Frame,
    warnings: &'f mut Vec<String>,
    // Candidate paint-defining nodes by id. First definition wins.
    defs: HashMap<String, roxmltree::Node<'a, 'input>>,
    // Resolved paints by id, including the black fallback for misses.
    ids: HashMap<String, Paint>,
    // Ids on the current href resolution chain, to cut cycles.
    visiting: Vec<String>,
}

impl ParseCtx<'_, '_, '_> {
    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

// Inherited per-branch parse state. Cloned and adjusted on the way
// down, never mutated in place.
#[derive(Debug, Clone)]
struct ParseState {
    ctm: Matrix,
    settings: Settings,
    current_color: Color,
    container_size: Size,
    system_language: String,
}

impl ParseState {
    // The state for a node's subtree: its transform multiplied onto
    // the CTM, currentColor picked up, and presentation attributes and
    // inline style folded into the settings.
    fn updated(&self, ctx: &mut ParseCtx<'_, '_, '_>, node: roxmltree::Node<'_, '_>) -> ParseState {
        let mut next = self.clone();
        next.ctm = apply_transforms(ctx, node, self.ctm);
        if let Some(value) = node.attribute("color") {
            match parse_color_noref(value, 1.0, self.current_color) {
                Some(color) => next.current_color = color,
                None => ctx.warn(format!("Invalid color: {}", value)),
            }
        }
        let settings = updated_settings(ctx, node, &next);
        next.settings = settings;
        next
    }
}

type ElementFn = for<'f, 'a, 'input> fn(
    &mut ParseCtx<'f, 'a, 'input>,
    roxmltree::Node<'a, 'input>,
    &ParseState,
) -> Option<ObjId>;

// Elements recognized inside <svg> and <g>. Tags absent from the table
// are skipped without a sound.
static CONTENT_PARSERS: &[(&str, ElementFn)] = &[
    ("a", ignore_element),
    ("altGlyphDef", ignore_element),
    ("animate", ignore_element),
    ("animateColor", ignore_element),
    ("animateMotion", ignore_element),
    ("animateTransform", ignore_element),
    ("circle", parse_circle),
    ("clipPath", ignore_element),
    ("color-profile", ignore_element),
    ("cursor", ignore_element),
    ("defs", parse_defs),
    ("desc", ignore_element),
    ("ellipse", parse_ellipse),
    ("filter", ignore_element),
    ("font", ignore_element),
    ("font-face", ignore_element),
    ("foreignObject", ignore_element),
    ("g", parse_group),
    ("image", parse_image_custom),
    ("line", parse_line),
    ("linearGradient", register_paint_source),
    ("marker", ignore_element),
    ("mask", ignore_element),
    ("metadata", ignore_element),
    ("path", parse_path_custom),
    ("pattern", ignore_element),
    ("polygon", parse_polygon_custom),
    ("polyline", parse_polyline),
    ("radialGradient", register_paint_source),
    ("rect", parse_rect_custom),
    ("script", ignore_element),
    ("set", ignore_element),
    ("style", ignore_element),
    ("svg", ignore_element),
    ("switch", parse_switch),
    ("symbol", ignore_element),
    ("text", parse_text),
    ("title", ignore_element),
    ("use", ignore_element),
    ("view", ignore_element),
];

// Elements eligible as <switch> branches. Membership decides whether a
// child can be picked at all; ignored members still consume the switch.
static SWITCH_PARSERS: &[(&str, ElementFn)] = &[
    ("a", ignore_element),
    ("animate", ignore_element),
    ("animateColor", ignore_element),
    ("animateMotion", ignore_element),
    ("animateTransform", ignore_element),
    ("circle", parse_circle),
    ("desc", ignore_element),
    ("ellipse", parse_ellipse),
    ("foreignObject", ignore_element),
    ("g", parse_group),
    ("image", parse_image),
    ("line", parse_line),
    ("metadata", ignore_element),
    ("path", parse_path_custom),
    ("polygon", parse_polygon_custom),
    ("polyline", parse_polyline),
    ("rect", parse_rect_custom),
    ("set", ignore_element),
    ("svg", ignore_element),
    ("switch", parse_switch),
    ("text", parse_text),
    ("title", ignore_element),
    ("use", ignore_element),
];

// Elements handled inside <defs>.
static DEFS_PARSERS: &[(&str, ElementFn)] = &[
    ("defs", parse_defs),
    ("linearGradient", register_paint_source),
    ("pattern", register_paint_source),
    ("radialGradient", register_paint_source),
];

fn lookup(table: &[(&str, ElementFn)], name: &str) -> Option<ElementFn> {
    table
        .iter()
        .find(|(tag, _)| *tag == name)
        .map(|(_, parser)| *parser)
}

fn parse_root(image: &mut Image, root: roxmltree::Node<'_, '_>, options: &ImportOptions) {
    let mut root_warnings = Vec::new();
    let view_box = parse_view_box(root);
    let size = root_size(&mut root_warnings, root, view_box);
    for warning in root_warnings {
        image.add_warning(warning);
    }

    if size.w <= 0.0 || size.h <= 0.0 {
        if size.w <= 0.0 {
            image.add_warning("SVG element has negative width".to_string());
        }
        if size.h <= 0.0 {
            image.add_warning("SVG element has negative height".to_string());
        }
        image.add_frame(DEFAULT_SIZE);
        return;
    }

    let frame_id = image.add_frame(size);
    let (frame, warnings) = image.frame_and_warnings(frame_id);
    let mut ctx = ParseCtx {
        frame,
        warnings,
        defs: HashMap::new(),
        ids: HashMap::new(),
        visiting: Vec::new(),
    };

    let mut ctm = Matrix::identity();
    if view_box.0 != 0.0 || view_box.1 != 0.0 {
        // A viewBox away from the origin shifts all content back onto it.
        ctm = Matrix::translation(-view_box.0, -view_box.1).mul(ctm);
    }
    let state = ParseState {
        ctm,
        settings: Settings::default(),
        current_color: DEFAULT_CURRENT_COLOR,
        container_size: size,
        system_language: options.system_language.clone(),
    };
    parse_content_children(&mut ctx, root, &state);
}

fn parse_view_box(node: roxmltree::Node<'_, '_>) -> (f64, f64, f64, f64) {
    let fallback = (0.0, 0.0, DEFAULT_SIZE.w, DEFAULT_SIZE.h);
    let Some(text) = node.attribute("viewBox") else {
        return fallback;
    };
    let values: Vec<f64> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    if values.len() == 4 {
        (values[0], values[1], values[2], values[3])
    } else {
        fallback
    }
}

// Frame size from the width/height attributes, with the viewBox
// dimensions as both the percentage base and the fallback. Dimensions
// are truncated to whole pixels.
fn root_size(
    warnings: &mut Vec<String>,
    node: roxmltree::Node<'_, '_>,
    view_box: (f64, f64, f64, f64),
) -> Size {
    let mut dimension = |name: &str, span: f64| match node.attribute(name) {
        Some(text) => match convert_length(warnings, text, span) {
            Some(value) => value,
            None => {
                warnings.push(format!("Invalid length: {}", text));
                span
            }
        },
        None => span,
    };
    let w = dimension("width", view_box.2);
    let h = dimension("height", view_box.3);
    Size::new(w.trunc(), h.trunc())
}

fn parse_content_children<'f, 'a, 'input>(
    ctx: &mut ParseCtx<'f, 'a, 'input>,
    node: roxmltree::Node<'a, 'input>,
    state: &ParseState,
) -> Vec<ObjId> {
    let mut created = Vec::new();
    for child in node.children().filter(|n| n.is_element()) {
        let Some(parser) = lookup(CONTENT_PARSERS, child.tag_name().name()) else {
            continue;
        };
        if let Some(id) = parser(ctx, child, state) {
            created.push(id);
        }
    }
    created
}

fn ignore_element(
    _ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    _state: &ParseState,
) -> Option<ObjId> {
    log::debug!("skipping svg element <{}>", node.tag_name().name());
    None
}

fn parse_group<'f, 'a, 'input>(
    ctx: &mut ParseCtx<'f, 'a, 'input>,
    node: roxmltree::Node<'a, 'input>,
    state: &ParseState,
) -> Option<ObjId> {
    let state = state.updated(ctx, node);
    let members = parse_content_children(ctx, node, &state);
    ctx.frame.add_group(members)
}

fn parse_switch<'f, 'a, 'input>(
    ctx: &mut ParseCtx<'f, 'a, 'input>,
    node: roxmltree::Node<'a, 'input>,
    state: &ParseState,
) -> Option<ObjId> {
    for child in node.children().filter(|n| n.is_element()) {
        let Some(parser) = lookup(SWITCH_PARSERS, child.tag_name().name()) else {
            continue;
        };
        if child
            .attribute("requiredExtensions")
            .is_some_and(|v| !v.is_empty())
        {
            continue;
        }
        if let Some(features) = child.attribute("requiredFeatures") {
            if features
                .split(' ')
                .any(|feature| !SUPPORTED_FEATURES.contains(&feature))
            {
                continue;
            }
        }
        let language = child
            .attribute("systemLanguage")
            .unwrap_or(state.system_language.as_str());
        if language != state.system_language.as_str() {
            continue;
        }
        // First eligible branch wins, even if it produces nothing.
        return parser(ctx, child, state);
    }
    ctx.warn("No supported child node of SVG switch-element".to_string());
    None
}

fn parse_defs<'f, 'a, 'input>(
    ctx: &mut ParseCtx<'f, 'a, 'input>,
    node: roxmltree::Node<'a, 'input>,
    state: &ParseState,
) -> Option<ObjId> {
    // Register every child carrying an id so href chains can reach
    // nodes of kinds this reader does not otherwise handle.
    for child in node.children().filter(|n| n.is_element()) {
        if let Some(id) = child.attribute("id") {
            ctx.defs.entry(id.to_string()).or_insert(child);
        }
    }
    for child in node.children().filter(|n| n.is_element()) {
        if let Some(parser) = lookup(DEFS_PARSERS, child.tag_name().name()) {
            parser(ctx, child, state);
        }
    }
    None
}

// Records a gradient or pattern node for on-demand resolution. The
// first definition of an id wins.
fn register_paint_source<'f, 'a, 'input>(
    ctx: &mut ParseCtx<'f, 'a, 'input>,
    node: roxmltree::Node<'a, 'input>,
    _state: &ParseState,
) -> Option<ObjId> {
    if let Some(id) = node.attribute("id") {
        ctx.defs.entry(id.to_string()).or_insert(node);
    }
    None
}

fn parse_circle(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let state = state.updated(ctx, node);
    let cx = svg_length(ctx, &state, node.attribute("cx").unwrap_or("0"), Axis::Horizontal);
    let cy = svg_length(ctx, &state, node.attribute("cy").unwrap_or("0"), Axis::Vertical);
    let r = svg_length(ctx, &state, node.attribute("r").unwrap_or("0"), Axis::Horizontal);
    let tri = state
        .ctm
        .apply_tri(Tri::from_rect(center_based_to_rect(cx, cy, r, r)));
    Some(ctx.frame.add_ellipse(tri, state.settings.clone()))
}

fn parse_ellipse(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let state = state.updated(ctx, node);
    let cx = svg_length(ctx, &state, node.attribute("cx").unwrap_or("0"), Axis::Horizontal);
    let cy = svg_length(ctx, &state, node.attribute("cy").unwrap_or("0"), Axis::Vertical);
    let rx = svg_length(ctx, &state, node.attribute("rx").unwrap_or("0"), Axis::Horizontal);
    let ry = svg_length(ctx, &state, node.attribute("ry").unwrap_or("0"), Axis::Vertical);
    let tri = state
        .ctm
        .apply_tri(Tri::from_rect(center_based_to_rect(cx, cy, rx, ry)));
    Some(ctx.frame.add_ellipse(tri, state.settings.clone()))
}

fn parse_line(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let state = state.updated(ctx, node);
    let x1 = svg_coord(ctx, &state, node.attribute("x1").unwrap_or("0"), Axis::Horizontal);
    let y1 = svg_coord(ctx, &state, node.attribute("y1").unwrap_or("0"), Axis::Vertical);
    let x2 = svg_coord(ctx, &state, node.attribute("x2").unwrap_or("0"), Axis::Horizontal);
    let y2 = svg_coord(ctx, &state, node.attribute("y2").unwrap_or("0"), Axis::Vertical);
    let mut points = vec![Point::new(x1, y1), Point::new(x2, y2)];
    if state.settings.arrow == Arrow::Front {
        restore_arrow_tip(state.settings.line_width, &mut points);
    }
    let points = points.into_iter().map(|p| state.ctm.apply(p)).collect();
    Some(ctx.frame.add_line(points, state.settings.clone()))
}

fn parse_polyline(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let state = state.updated(ctx, node);
    let mut points = parse_points(node.attribute("points").unwrap_or(""));
    if points.is_empty() {
        return None;
    }
    if state.settings.arrow == Arrow::Front {
        restore_arrow_tip(state.settings.line_width, &mut points);
    }
    let points = points.into_iter().map(|p| state.ctm.apply(p)).collect();
    Some(ctx.frame.add_line(points, state.settings.clone()))
}

// A stored line is shortened on export when it ends in an arrowhead,
// leaving room for the marker to carry the tip. Move the endpoint back
// out to recover the stored geometry.
fn restore_arrow_tip(line_width: f64, points: &mut [Point]) {
    let n = points.len();
    if n < 2 {
        return;
    }
    let end = points[n - 1];
    let prev = points[n - 2];
    let angle = rad_angle(end, prev);
    let length = 15.0 * (line_width / 2.0);
    points[n - 1] = Point::new(
        end.x - libm::cos(angle) * length,
        end.y - libm::sin(angle) * length,
    );
}

fn parse_polygon_custom(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    if faint_attr(node, "type") == Some("rect") {
        let points = parse_points(node.attribute("points").unwrap_or(""));
        if points.len() == 4 {
            let state = state.updated(ctx, node);
            let tri = state
                .ctm
                .apply_tri(Tri::new(points[0], points[1], points[3]));
            return Some(ctx.frame.add_rect(tri, state.settings.clone()));
        }
    }
    parse_polygon_plain(ctx, node, state)
}

fn parse_polygon_plain(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let state = state.updated(ctx, node);
    let points = parse_points(node.attribute("points").unwrap_or(""));
    if points.is_empty() {
        return None;
    }
    let points = points.into_iter().map(|p| state.ctm.apply(p)).collect();
    Some(ctx.frame.add_polygon(points, state.settings.clone()))
}

fn parse_rect_custom(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    if faint_attr(node, "background").is_some() {
        return parse_rect_as_background(ctx, node, state);
    }
    let state = state.updated(ctx, node);
    let x = svg_length(ctx, &state, node.attribute("x").unwrap_or("0"), Axis::Horizontal);
    let y = svg_length(ctx, &state, node.attribute("y").unwrap_or("0"), Axis::Vertical);
    let w = svg_length(ctx, &state, node.attribute("width").unwrap_or("0"), Axis::Horizontal);
    let h = svg_length(ctx, &state, node.attribute("height").unwrap_or("0"), Axis::Vertical);
    let tri = state.ctm.apply_tri(Tri::from_rect(Rect::new(x, y, w, h)));
    Some(ctx.frame.add_rect(tri, state.settings.clone()))
}

// A rect flagged as the frame background sets the background color
// instead of creating an object.
fn parse_rect_as_background(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let value = node.attribute("fill")?;
    let paint = parse_paint(ctx, state, value, 1.0);
    if let Some(color) = paint.color() {
        ctx.frame.set_background_color(color);
    }
    None
}

fn parse_path_custom(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    match faint_attr(node, "type") {
        Some("ellipse") => {
            parse_path_as_ellipse(ctx, node, state).or_else(|| parse_path_plain(ctx, node, state))
        }
        Some("spline") => {
            parse_path_as_spline(ctx, node, state).or_else(|| parse_path_plain(ctx, node, state))
        }
        _ => parse_path_plain(ctx, node, state),
    }
}

// An exported ellipse is a two-arc path plus its exact pre-export tri
// in a faint:tri attribute. Prefer the tri; the arcs only approximate.
fn parse_path_as_ellipse(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let points = parse_points(faint_attr(node, "tri")?);
    if points.len() != 3 {
        return None;
    }
    let state = state.updated(ctx, node);
    let tri = state
        .ctm
        .apply_tri(Tri::new(points[0], points[1], points[2]));
    Some(ctx.frame.add_ellipse(tri, state.settings.clone()))
}

fn parse_path_as_spline(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let segs = parse_path_data(node.attribute("d")?)?;
    let points = spline_points_from_segs(&segs)?;
    let state = state.updated(ctx, node);
    let points = points.into_iter().map(|p| state.ctm.apply(p)).collect();
    Some(ctx.frame.add_spline(points, state.settings.clone()))
}

fn parse_path_plain(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let state = state.updated(ctx, node);
    let d = node.attribute("d").unwrap_or("");
    if d.trim().is_empty() {
        ctx.warn(format!(
            "Ignored path-element without definition attribute{}.",
            maybe_id_ref(node)
        ));
        return None;
    }
    match parse_path_data(d) {
        Some(segs) => {
            let segs = transform_segs(&segs, state.ctm);
            Some(ctx.frame.add_path(segs, state.settings.clone()))
        }
        None => {
            ctx.warn(format!(
                "Failed parsing a path definition{}.",
                maybe_id_ref(node)
            ));
            None
        }
    }
}

fn transform_segs(segs: &[PathSeg], ctm: Matrix) -> Vec<PathSeg> {
    segs.iter()
        .map(|seg| match *seg {
            PathSeg::Move(p) => PathSeg::Move(ctm.apply(p)),
            PathSeg::Line(p) => PathSeg::Line(ctm.apply(p)),
            PathSeg::Cubic(c1, c2, end) => {
                PathSeg::Cubic(ctm.apply(c1), ctm.apply(c2), ctm.apply(end))
            }
            PathSeg::Close => PathSeg::Close,
        })
        .collect()
}

fn parse_image_custom(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    if faint_attr(node, "background").is_some() {
        return parse_image_as_background(ctx, node, state);
    }
    parse_image(ctx, node, state)
}

// An image flagged as the frame background replaces the background
// bitmap instead of creating an object. Only png payloads qualify.
fn parse_image_as_background(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    _state: &ParseState,
) -> Option<ObjId> {
    let Some(href) = xlink_href(node) else {
        ctx.warn("Ignored image element with no data.".to_string());
        return None;
    };
    match parse_data_uri(href) {
        Some((media, data)) if media == "image/png" => match decode_raster(&data) {
            Ok(bitmap) => {
                ctx.frame.set_background_bitmap(bitmap);
                None
            }
            Err(_) => {
                ctx.warn("Ignored image element with no data.".to_string());
                None
            }
        },
        Some((media, _)) => {
            ctx.warn(format!(
                "Ignored image element with unsupported type: {}",
                media
            ));
            None
        }
        None => {
            ctx.warn("Ignored image element with no data.".to_string());
            None
        }
    }
}

fn parse_image(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let state = state.updated(ctx, node);
    let plain = |name: &str| -> f64 {
        node.attribute(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0.0)
    };
    let x = plain("x");
    let y = plain("y");
    let w = plain("width");
    let h = plain("height");

    let Some(href) = xlink_href(node) else {
        ctx.warn("Ignored image element with no data.".to_string());
        return None;
    };
    let Some((media, data)) = parse_data_uri(href) else {
        ctx.warn("Ignored image element with no data.".to_string());
        return None;
    };
    if media != "image/png" && media != "image/jpeg" {
        ctx.warn(format!(
            "Ignored image element with unsupported type: {}",
            media
        ));
        return None;
    }
    let Ok(bitmap) = decode_raster(&data) else {
        ctx.warn("Ignored image element with no data.".to_string());
        return None;
    };

    let mut settings = state.settings.clone();
    if let Some(value) = faint_attr(node, "bg_style").or_else(|| faint_attr(node, "bg-style")) {
        if let Some(style) = RasterStyle::from_str(value) {
            settings.background_style = style;
        }
    }
    if let Some(value) = faint_attr(node, "mask-color") {
        if let Some(color) = parse_color_noref(value, 1.0, state.current_color) {
            settings.bg = Paint::Color(color);
        }
    }
    let tri = state.ctm.apply_tri(Tri::from_rect(Rect::new(x, y, w, h)));
    Some(ctx.frame.add_raster(tri, bitmap, settings))
}

fn parse_text(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Option<ObjId> {
    let state = state.updated(ctx, node);
    let mut x = svg_length(ctx, &state, node.attribute("x").unwrap_or("0"), Axis::Horizontal);
    let y = svg_length(ctx, &state, node.attribute("y").unwrap_or("0"), Axis::Vertical);
    let w = match faint_attr(node, "width").or_else(|| node.attribute("width")) {
        Some(value) => svg_length(ctx, &state, value, Axis::Horizontal),
        None => 200.0,
    };
    let h = match faint_attr(node, "height").or_else(|| node.attribute("height")) {
        Some(value) => svg_length(ctx, &state, value, Axis::Vertical),
        None => 200.0,
    };

    let mut settings = state.settings.clone();
    settings.bounded = faint_attr(node, "bounded").unwrap_or("1") == "1";
    settings.halign = faint_attr(node, "halign")
        .and_then(HAlign::from_str)
        .unwrap_or(HAlign::Left);
    settings.valign = faint_attr(node, "valign")
        .and_then(VAlign::from_str)
        .unwrap_or(VAlign::Top);
    let style = parse_style_dict(node.attribute("style").unwrap_or(""));
    if let Some(fill) = style.get("fill") {
        settings.fg = parse_paint(ctx, &state, fill, 1.0);
    }

    // A middle anchor stores the center x, so shift back to the left
    // edge when reading it.
    match node.attribute("text-anchor") {
        Some("start") => settings.halign = HAlign::Left,
        Some("middle") => {
            settings.halign = HAlign::Center;
            x -= w / 2.0;
        }
        Some("end") => settings.halign = HAlign::Right,
        _ => {}
    }

    let mut text = String::new();
    if let Some(lead) = node.text() {
        // Indentation-only leading text is serializer noise, not content.
        if !lead.trim().is_empty() {
            text.push_str(lead);
        }
    }
    for child in node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "tspan")
    {
        if let Some(chunk) = child.text() {
            text.push_str(chunk);
        }
        if faint_attr(child, "hardbreak") == Some("1") {
            text.push('\n');
        }
    }

    // The y attribute holds the first baseline; the object tri starts
    // one text-height above it.
    let tri = Tri::from_rect(Rect::new(x, y, w, h));
    let id = ctx.frame.add_text(state.ctm.apply_tri(tri), text, settings);
    let ascent = ctx.frame.get_obj_text_height(id);
    ctx.frame
        .set_obj_tri(id, state.ctm.apply_tri(tri.translated(0.0, -ascent)));
    Some(id)
}

// Resolves a url(#...) reference to a paint, parsing the referenced
// definition on first use and memoizing the result. Unresolvable
// references degrade to black.
fn resolve_paint(ctx: &mut ParseCtx<'_, '_, '_>, state: &ParseState, ref_id: &str) -> Paint {
    if let Some(paint) = ctx.ids.get(ref_id) {
        return paint.clone();
    }
    let paint = match resolve_paint_node(ctx, state, ref_id) {
        Some(paint) => paint,
        None => {
            ctx.warn(format!("Referenced gradient not found: {} ", ref_id));
            Paint::Color(Color::BLACK)
        }
    };
    ctx.ids.insert(ref_id.to_string(), paint.clone());
    paint
}

fn resolve_paint_node(
    ctx: &mut ParseCtx<'_, '_, '_>,
    state: &ParseState,
    ref_id: &str,
) -> Option<Paint> {
    if ctx.visiting.iter().any(|id| id == ref_id) {
        return None;
    }
    let node = ctx.defs.get(ref_id).copied()?;
    ctx.visiting.push(ref_id.to_string());
    let resolved = match node.tag_name().name() {
        "linearGradient" => parse_linear_gradient_node(ctx, state, node, ref_id),
        "radialGradient" => parse_radial_gradient_node(ctx, state, node, ref_id),
        "pattern" => parse_pattern_node(ctx, node, ref_id),
        _ => None,
    };
    ctx.visiting.pop();
    resolved
}

fn parse_linear_gradient_node(
    ctx: &mut ParseCtx<'_, '_, '_>,
    state: &ParseState,
    node: roxmltree::Node<'_, '_>,
    gradient_id: &str,
) -> Option<Paint> {
    let x1 = gradient_coord(node, "x1");
    let y1 = gradient_coord(node, "y1");
    let x2 = gradient_coord(node, "x2");
    let y2 = gradient_coord(node, "y2");
    let stops = gradient_stops(ctx, state, node, gradient_id, "linearGradient")?;
    let angle = libm::atan2(y2 - y1, x2 - x1);
    Some(Paint::Linear(Rc::new(LinearGradient::new(angle, stops))))
}

fn parse_radial_gradient_node(
    ctx: &mut ParseCtx<'_, '_, '_>,
    state: &ParseState,
    node: roxmltree::Node<'_, '_>,
    gradient_id: &str,
) -> Option<Paint> {
    let cx = gradient_coord(node, "cx");
    let cy = gradient_coord(node, "cy");
    let mut rx = gradient_coord(node, "r");
    let mut ry = rx;
    if node.has_attribute("rx") {
        rx = gradient_coord(node, "rx");
    }
    if node.has_attribute("ry") {
        ry = gradient_coord(node, "ry");
    }
    let stops = gradient_stops(ctx, state, node, gradient_id, "radialGradient")?;
    Some(Paint::Radial(Rc::new(RadialGradient::new(
        Point::new(cx, cy),
        rx,
        ry,
        stops,
    ))))
}

// A gradient's stops: its own stop children, or the stops of the
// gradient its xlink:href points at. No stops at all is an error.
fn gradient_stops(
    ctx: &mut ParseCtx<'_, '_, '_>,
    state: &ParseState,
    node: roxmltree::Node<'_, '_>,
    gradient_id: &str,
    kind: &str,
) -> Option<Vec<ColorStop>> {
    let mut stops = parse_color_stops(ctx, state, node);
    if stops.is_empty() {
        if let Some(href) = xlink_href(node) {
            stops = linked_stops(ctx, state, href.trim_start_matches('#'));
        }
    }
    if stops.is_empty() {
        ctx.warn(format!("{} with id={} has no color-stops", kind, gradient_id));
        return None;
    }
    Some(stops)
}

fn linked_stops(ctx: &mut ParseCtx<'_, '_, '_>, state: &ParseState, ref_id: &str) -> Vec<ColorStop> {
    if let Some(paint) = ctx.ids.get(ref_id) {
        return paint_stops(paint);
    }
    match resolve_paint_node(ctx, state, ref_id) {
        Some(paint) => {
            ctx.ids.insert(ref_id.to_string(), paint.clone());
            paint_stops(&paint)
        }
        None => {
            ctx.warn(format!("Referenced gradient not found: {} ", ref_id));
            Vec::new()
        }
    }
}

fn paint_stops(paint: &Paint) -> Vec<ColorStop> {
    match paint {
        Paint::Linear(gradient) => gradient.stops().to_vec(),
        Paint::Radial(gradient) => gradient.stops().to_vec(),
        _ => Vec::new(),
    }
}

fn parse_color_stops(
    ctx: &mut ParseCtx<'_, '_, '_>,
    state: &ParseState,
    node: roxmltree::Node<'_, '_>,
) -> Vec<ColorStop> {
    let mut stops = Vec::new();
    for child in node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "stop")
    {
        let style = parse_style_dict(child.attribute("style").unwrap_or(""));
        let stop_color = child
            .attribute("stop-color")
            .or_else(|| style.get("stop-color").map(|s| s.as_str()));
        let opacity = child
            .attribute("stop-opacity")
            .or_else(|| style.get("stop-opacity").map(|s| s.as_str()))
            .unwrap_or("1.0")
            .trim()
            .parse::<f64>()
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);
        let offset = match parse_stop_offset(child.attribute("offset")) {
            Some(offset) => offset,
            None => {
                ctx.warn("Failed parsing gradient offset".to_string());
                continue;
            }
        };
        let color = stop_color
            .and_then(|value| parse_color_noref(value, opacity, state.current_color))
            .unwrap_or_else(|| Color::rgba(0, 0, 0, (opacity * 255.0).round() as u8));
        stops.push(ColorStop::new(offset, color));
    }
    stops
}

// Stop offset as a 0-1 ratio. A missing attribute means 0; a present
// but unreadable one is a parse failure.
fn parse_stop_offset(value: Option<&str>) -> Option<f64> {
    let Some(text) = value else {
        return Some(0.0);
    };
    let text = text.trim();
    if let Some(percent) = text.strip_suffix('%') {
        let v = percent.trim().parse::<f64>().ok()?;
        return Some((v / 100.0).clamp(0.0, 1.0));
    }
    let v = text.parse::<f64>().ok()?;
    Some(v.clamp(0.0, 1.0))
}

// Gradient geometry attribute: a plain number, or a percentage read
// as a 0-1 ratio. Missing or unreadable values are 0.
fn gradient_coord(node: roxmltree::Node<'_, '_>, name: &str) -> f64 {
    let Some(text) = node.attribute(name) else {
        return 0.0;
    };
    let text = text.trim();
    if let Some(percent) = text.strip_suffix('%') {
        return percent
            .trim()
            .parse::<f64>()
            .map(|v| v / 100.0)
            .unwrap_or(0.0);
    }
    text.parse().unwrap_or(0.0)
}

fn parse_pattern_node(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    pattern_id: &str,
) -> Option<Paint> {
    let object_aligned = node.attribute("patternUnits") != Some("userSpaceOnUse");
    for child in node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "image")
    {
        let Some(href) = xlink_href(child) else {
            continue;
        };
        let Some((media, data)) = parse_data_uri(href) else {
            continue;
        };
        if media != "image/png" {
            continue;
        }
        if let Ok(bitmap) = decode_raster(&data) {
            let pattern = Pattern::new(bitmap).with_object_aligned(object_aligned);
            return Some(Paint::Pattern(Rc::new(pattern)));
        }
    }
    ctx.warn(format!("Failed parsing pattern with id={}", pattern_id));
    None
}

// A paint attribute value: either a url(#...) reference or a color
// literal. Unreadable values degrade to black.
fn parse_paint(ctx: &mut ParseCtx<'_, '_, '_>, state: &ParseState, value: &str, opacity: f64) -> Paint {
    let value = value.trim();
    if let Some(ref_id) = extract_url_reference(value) {
        return resolve_paint(ctx, state, ref_id);
    }
    match parse_color_noref(value, opacity, state.current_color) {
        Some(color) => Paint::Color(color),
        None => {
            ctx.warn(format!("Invalid color: {}", value));
            Paint::Color(Color::BLACK)
        }
    }
}

// Folds a node's inline style and presentation attributes into a copy
// of the inherited settings. Presentation attributes override the
// style dictionary.
fn updated_settings(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    state: &ParseState,
) -> Settings {
    let mut settings = state.settings.clone();
    let mut merged = parse_style_dict(node.attribute("style").unwrap_or(""));
    for attr in node.attributes() {
        if attr.namespace().is_none() {
            merged.insert(attr.name().to_string(), attr.value().to_string());
        }
    }

    let fill_opacity = opacity_value(merged.get("fill-opacity"));
    let stroke_opacity = opacity_value(merged.get("stroke-opacity"));
    apply_fill_and_stroke(
        ctx,
        state,
        &mut settings,
        merged.get("stroke").map(|s| s.as_str()),
        merged.get("fill").map(|s| s.as_str()),
        stroke_opacity,
        fill_opacity,
    );

    if let Some(value) = merged.get("stroke-width") {
        // Scale with the CTM so a transformed group keeps its look.
        settings.line_width = svg_length(ctx, state, value, Axis::Horizontal) * state.ctm.a;
    }
    if let Some(value) = merged.get("stroke-dasharray") {
        settings.line_style = if value == "none" {
            LineStyle::Solid
        } else {
            LineStyle::LongDash
        };
    }
    if let Some(value) = merged.get("stroke-linejoin") {
        if value != "inherit" {
            if let Some(join) = Join::from_svg(value) {
                settings.join = join;
            }
        }
    }
    if let Some(value) = merged.get("stroke-linecap") {
        if let Some(cap) = Cap::from_svg(value) {
            settings.cap = cap;
        }
    }
    if let Some(value) = merged.get("font-size") {
        settings.font_size = if value == "medium" {
            12.0
        } else {
            svg_length(ctx, state, value, Axis::Horizontal)
        };
    }
    if let Some(value) = merged.get("font-family") {
        settings.font_face = value.clone();
    }
    if let Some(value) = merged.get("font-style") {
        settings.font_italic = value == "italic";
    }
    if let Some(value) = merged.get("font-weight") {
        settings.font_bold = value == "bold";
    }
    if let Some(value) = merged.get("fill-rule") {
        settings.fill_rule = if value == "evenodd" {
            FillRule::EvenOdd
        } else {
            FillRule::NonZero
        };
    }
    parse_marker_attr(node, &mut settings);
    settings
}

fn opacity_value(value: Option<&String>) -> f64 {
    value
        .map(|s| s.as_str())
        .unwrap_or("1.0")
        .trim()
        .parse()
        .unwrap_or(1.0)
}

// Maps the fill/stroke attribute pair onto the fill-style model, where
// fg is the stroke paint whenever a border is present.
fn apply_fill_and_stroke(
    ctx: &mut ParseCtx<'_, '_, '_>,
    state: &ParseState,
    settings: &mut Settings,
    stroke: Option<&str>,
    fill: Option<&str>,
    stroke_opacity: f64,
    fill_opacity: f64,
) {
    match (stroke, fill) {
        (None, None) => {}
        (None, Some(fill)) => {
            if fill == "none" {
                remove_fill(settings);
            } else {
                let paint = parse_paint(ctx, state, fill, fill_opacity);
                add_fill(settings, paint);
            }
        }
        (Some(stroke), None) => {
            if stroke == "none" {
                remove_stroke(settings);
            } else {
                let paint = parse_paint(ctx, state, stroke, stroke_opacity);
                add_stroke(settings, paint);
            }
        }
        (Some(stroke), Some(fill)) => match (stroke == "none", fill == "none") {
            (true, true) => settings.fill_style = FillStyle::None,
            (true, false) => {
                settings.fill_style = FillStyle::Fill;
                settings.fg = parse_paint(ctx, state, fill, fill_opacity);
            }
            (false, true) => {
                settings.fill_style = FillStyle::Border;
                settings.fg = parse_paint(ctx, state, stroke, stroke_opacity);
            }
            (false, false) => {
                settings.fill_style = FillStyle::BorderAndFill;
                settings.fg = parse_paint(ctx, state, stroke, stroke_opacity);
                settings.bg = parse_paint(ctx, state, fill, fill_opacity);
            }
        },
    }
}

fn add_fill(settings: &mut Settings, fill: Paint) {
    match settings.fill_style {
        FillStyle::Border => {
            settings.fill_style = FillStyle::BorderAndFill;
            settings.bg = fill;
        }
        _ => {
            settings.fill_style = FillStyle::Fill;
            settings.fg = fill;
        }
    }
}

fn add_stroke(settings: &mut Settings, stroke: Paint) {
    match settings.fill_style {
        FillStyle::Fill => {
            settings.fill_style = FillStyle::BorderAndFill;
            settings.bg = settings.fg.clone();
            settings.fg = stroke;
        }
        _ => {
            settings.fill_style = FillStyle::Border;
            settings.fg = stroke;
        }
    }
}

fn remove_fill(settings: &mut Settings) {
    match settings.fill_style {
        FillStyle::Fill => settings.fill_style = FillStyle::None,
        FillStyle::BorderAndFill => settings.fill_style = FillStyle::Border,
        _ => {}
    }
}

fn remove_stroke(settings: &mut Settings) {
    match settings.fill_style {
        FillStyle::Border => settings.fill_style = FillStyle::None,
        FillStyle::BorderAndFill => {
            settings.fill_style = FillStyle::Fill;
            settings.fg = settings.bg.clone();
        }
        _ => {}
    }
}

// Arrowheads ride in as the stock marker references the writer emits;
// anything else in marker-start/marker-end clears the arrow.
fn parse_marker_attr(node: roxmltree::Node<'_, '_>, settings: &mut Settings) {
    let front = node.attribute("marker-end") == Some("url(#Arrowhead)");
    let back = node.attribute("marker-start") == Some("url(#Arrowtail)");
    settings.arrow = match (front, back) {
        (true, true) => Arrow::Both,
        (true, false) => Arrow::Front,
        (false, true) => Arrow::Back,
        (false, false) => Arrow::None,
    };
}

fn apply_transforms(
    ctx: &mut ParseCtx<'_, '_, '_>,
    node: roxmltree::Node<'_, '_>,
    initial: Matrix,
) -> Matrix {
    let mut ctm = initial;
    let Some(text) = node.attribute("transform") else {
        return ctm;
    };
    let mut rest = text;
    loop {
        let Some(open) = rest.find('(') else { break };
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        let close = open + close;
        let name = rest[..open].trim().trim_start_matches(',').trim();
        let args: Vec<f64> = rest[open + 1..close]
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();

        let term = match (name, args.len()) {
            ("matrix", 6) => Some(Matrix {
                a: args[0],
                b: args[1],
                c: args[2],
                d: args[3],
                e: args[4],
                f: args[5],
            }),
            ("translate", 1) => Some(Matrix::translation(args[0], 0.0)),
            ("translate", 2) => Some(Matrix::translation(args[0], args[1])),
            ("scale", 1) => Some(Matrix::scale(args[0], args[0])),
            ("scale", 2) => Some(Matrix::scale(args[0], args[1])),
            ("rotate", 1) => Some(Matrix::rotation(deg_to_rad(args[0]))),
            ("rotate", 3) => Some(Matrix::rotation_about(
                deg_to_rad(args[0]),
                Point::new(args[1], args[2]),
            )),
            ("skewX", 1) => Some(Matrix::skew_x(deg_to_rad(args[0]))),
            ("skewY", 1) => Some(Matrix::skew_y(deg_to_rad(args[0]))),
            _ => None,
        };
        match term {
            Some(term) => ctm = ctm.mul(term),
            None => ctx.warn(format!("Unsupported transform: {}", name)),
        }
        rest = &rest[close + 1..];
    }
    ctm
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

// Splits "12.5mm" into the leading number and its unit suffix. The
// exponent probe keeps the e of "12em" out of the number.
fn split_number(text: &str) -> Option<(f64, &str)> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut probe = end + 1;
        if probe < bytes.len() && (bytes[probe] == b'+' || bytes[probe] == b'-') {
            probe += 1;
        }
        if probe < bytes.len() && bytes[probe].is_ascii_digit() {
            end = probe + 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
    }
    let value = text[..end].parse::<f64>().ok()?;
    Some((value, &text[end..]))
}

// A length in user units. Percentages resolve against `span`; unknown
// units warn and pass the number through.
fn convert_length(warnings: &mut Vec<String>, text: &str, span: f64) -> Option<f64> {
    let (value, unit) = split_number(text.trim())?;
    match unit.trim() {
        "" | "px" => Some(value),
        "pt" => Some(value * 1.25),
        "mm" => Some(value * 3.543307),
        "cm" => Some(value * 35.43307),
        "%" => Some(value / 100.0 * span),
        unit @ ("em" | "ex") => {
            warnings.push(format!("Unsupported unit: {}", unit));
            Some(value)
        }
        unit => {
            warnings.push(format!("Invalid unit: {}", unit));
            Some(value)
        }
    }
}

fn axis_span(state: &ParseState, axis: Axis) -> f64 {
    match axis {
        Axis::Horizontal => state.container_size.w,
        Axis::Vertical => state.container_size.h,
    }
}

fn svg_length(ctx: &mut ParseCtx<'_, '_, '_>, state: &ParseState, text: &str, axis: Axis) -> f64 {
    match convert_length(ctx.warnings, text, axis_span(state, axis)) {
        Some(value) => value,
        None => {
            ctx.warn(format!("Invalid length: {}", text));
            0.0
        }
    }
}

fn svg_coord(ctx: &mut ParseCtx<'_, '_, '_>, state: &ParseState, text: &str, axis: Axis) -> f64 {
    match convert_length(ctx.warnings, text, axis_span(state, axis)) {
        Some(value) => value,
        None => {
            ctx.warn(format!("Invalid coordinate: {}", text));
            0.0
        }
    }
}

// Coordinate pairs from a points attribute. A trailing unpaired number
// is dropped.
fn parse_points(text: &str) -> Vec<Point> {
    let values: Vec<f64> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    values
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

fn parse_style_dict(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for item in text.split(';') {
        let Some((key, value)) = item.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if !key.is_empty() {
            map.insert(key.to_string(), value.trim().to_string());
        }
    }
    map
}

// " (id=...)" for warnings, when the node has an id.
fn maybe_id_ref(node: roxmltree::Node<'_, '_>) -> String {
    node.attribute("id")
        .map(|id| format!(" (id={})", id))
        .unwrap_or_default()
}

fn xlink_href<'a>(node: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    node.attribute((XLINK_NS, "href"))
        .or_else(|| node.attribute("href"))
}

fn faint_attr<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((FAINT_NS, name))
}

// Splits a data: uri into its media type and decoded payload.
fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let media = header.split(';').next().unwrap_or_default().to_string();
    if header.contains("base64") {
        let cleaned: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let data = base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .ok()?;
        Some((media, data))
    } else {
        Some((media, payload.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Background, Object, Shape};

    fn import(svg: &str) -> Image {
        parse_string(svg, &ImportOptions::new()).expect("import should succeed")
    }

    fn only_object(frame: &Frame) -> &Object {
        assert_eq!(frame.top_level().len(), 1, "expected exactly one object");
        frame.object(frame.top_level()[0])
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn points_close(a: Point, b: Point) -> bool {
        close(a.x, b.x) && close(a.y, b.y)
    }

    #[test]
    fn rect_maps_to_axis_aligned_tri() {
        let image = import(r#"<svg><rect x="10" y="20" width="30" height="40"/></svg>"#);
        let frame = &image.frames()[0];
        let obj = only_object(frame);
        assert!(matches!(obj.shape, Shape::Rect));
        let tri = frame.get_obj_tri(frame.top_level()[0]);
        assert!(points_close(tri.p0(), Point::new(10.0, 20.0)));
        assert!(points_close(tri.p1(), Point::new(40.0, 20.0)));
        assert!(points_close(tri.p2(), Point::new(10.0, 60.0)));
    }

    #[test]
    fn percentages_resolve_against_the_matching_frame_axis() {
        let image = import(
            r#"<svg width="200" height="100"><rect x="0" y="0" width="50%" height="50%"/></svg>"#,
        );
        let frame = &image.frames()[0];
        let tri = frame.get_obj_tri(frame.top_level()[0]);
        assert!(close(tri.p1().x, 100.0), "50% of a 200 wide frame");
        assert!(close(tri.p2().y, 50.0), "50% of a 100 tall frame");

        // Root percentages resolve against the viewBox instead.
        let image = import(r#"<svg width="50%" height="50%"/>"#);
        assert_eq!(image.frames()[0].size(), Size::new(320.0, 240.0));
    }

    #[test]
    fn unit_suffixes_scale_lengths() {
        let image = import(
            r#"<svg><rect x="0" y="0" width="10pt" height="10mm"/><rect x="2em" y="12xyz" width="1" height="1"/></svg>"#,
        );
        let frame = &image.frames()[0];
        let tri = frame.get_obj_tri(frame.top_level()[0]);
        assert!(close(tri.p1().x, 12.5));
        assert!(close(tri.p2().y, 35.43307));
        let tri = frame.get_obj_tri(frame.top_level()[1]);
        assert!(close(tri.p0().x, 2.0), "em passes the number through");
        assert!(close(tri.p0().y, 12.0), "unknown units pass through");
        assert!(image.warnings().iter().any(|w| w == "Unsupported unit: em"));
        assert!(image.warnings().iter().any(|w| w == "Invalid unit: xyz"));
    }

    #[test]
    fn non_svg_root_is_fatal() {
        let err = parse_string("<html/>", &ImportOptions::new()).unwrap_err();
        assert!(matches!(err, LoadError::NotSvg));
        assert_eq!(format!("{}", err), "Root element was not <svg>.");
    }

    #[test]
    fn malformed_xml_is_fatal() {
        let err = parse_string("<svg><rect</svg>", &ImportOptions::new()).unwrap_err();
        assert!(matches!(err, LoadError::Xml(_)));
    }

    #[test]
    fn bad_path_data_warns_and_parsing_continues() {
        let image = import(
            r#"<svg><path id="p1" d="M 0 0 L"/><path/><rect width="5" height="5"/></svg>"#,
        );
        let frame = &image.frames()[0];
        assert_eq!(frame.top_level().len(), 1, "only the rect should survive");
        assert!(
            image
                .warnings()
                .iter()
                .any(|w| w == "Failed parsing a path definition (id=p1)."),
            "warnings: {:?}",
            image.warnings()
        );
        assert!(
            image
                .warnings()
                .iter()
                .any(|w| w == "Ignored path-element without definition attribute."),
        );
    }

    #[test]
    fn gradient_stops_come_out_sorted_by_offset() {
        let image = import(
            r#"<svg>
              <defs>
                <linearGradient id="g">
                  <stop offset="1.0" stop-color="rgb(255,255,255)"/>
                  <stop offset="0.0" stop-color="rgb(0,0,0)"/>
                </linearGradient>
              </defs>
              <rect width="10" height="10" fill="url(#g)"/>
            </svg>"#,
        );
        let obj = only_object(&image.frames()[0]);
        let Paint::Linear(gradient) = &obj.settings.fg else {
            panic!("expected a linear gradient fill");
        };
        assert_eq!(gradient.stops().len(), 2);
        assert!(close(gradient.stops()[0].offset, 0.0));
        assert!(close(gradient.stops()[1].offset, 1.0));
        assert_eq!(gradient.stops()[0].color, Color::BLACK);
    }

    #[test]
    fn first_definition_of_a_duplicate_id_wins() {
        let image = import(
            r#"<svg>
              <defs>
                <linearGradient id="g"><stop offset="0" stop-color="rgb(255,0,0)"/></linearGradient>
                <linearGradient id="g"><stop offset="0" stop-color="rgb(0,255,0)"/></linearGradient>
              </defs>
              <rect width="5" height="5" fill="url(#g)"/>
            </svg>"#,
        );
        let obj = only_object(&image.frames()[0]);
        let Paint::Linear(gradient) = &obj.settings.fg else {
            panic!("expected a linear gradient fill");
        };
        assert_eq!(gradient.stops()[0].color, Color::rgb(255, 0, 0));
    }

    #[test]
    fn switch_picks_the_first_eligible_child() {
        let image = import(
            r#"<svg><switch>
              <rect requiredExtensions="http://example.com/ext" width="5" height="5"/>
              <rect systemLanguage="sv" width="6" height="6"/>
              <rect width="7" height="7"/>
              <rect width="8" height="8"/>
            </switch></svg>"#,
        );
        let frame = &image.frames()[0];
        let obj = only_object(frame);
        assert!(matches!(obj.shape, Shape::Rect));
        let tri = frame.get_obj_tri(frame.top_level()[0]);
        assert!(close(tri.width(), 7.0), "third child should be picked");
    }

    #[test]
    fn switch_without_eligible_children_warns() {
        let image = import(
            r#"<svg><switch>
              <rect requiredFeatures="http://www.w3.org/TR/SVG11/feature#Filter" width="5" height="5"/>
            </switch></svg>"#,
        );
        assert!(image.frames()[0].top_level().is_empty());
        assert!(
            image
                .warnings()
                .iter()
                .any(|w| w == "No supported child node of SVG switch-element")
        );
    }

    #[test]
    fn switch_honors_the_configured_language() {
        let options = ImportOptions::new().system_language("sv");
        let image = parse_string(
            r#"<svg><switch>
              <rect systemLanguage="en" width="5" height="5"/>
              <rect systemLanguage="sv" width="6" height="6"/>
            </switch></svg>"#,
            &options,
        )
        .expect("import should succeed");
        let frame = &image.frames()[0];
        let tri = frame.get_obj_tri(frame.top_level()[0]);
        assert!(close(tri.width(), 6.0));
    }

    #[test]
    fn missing_gradient_reference_degrades_to_black() {
        let image = import(r#"<svg><rect width="5" height="5" fill="url(#nope)"/></svg>"#);
        let obj = only_object(&image.frames()[0]);
        assert_eq!(obj.settings.fg, Paint::Color(Color::BLACK));
        assert!(
            image
                .warnings()
                .iter()
                .any(|w| w == "Referenced gradient not found: nope "),
            "warnings: {:?}",
            image.warnings()
        );
    }

    #[test]
    fn href_only_gradients_borrow_stops_and_cycles_terminate() {
        let image = import(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink">
              <defs>
                <linearGradient id="a" xlink:href="#b"/>
                <linearGradient id="b">
                  <stop offset="0" stop-color="rgb(1,2,3)"/>
                  <stop offset="1" stop-color="rgb(4,5,6)"/>
                </linearGradient>
                <linearGradient id="c" xlink:href="#d"/>
                <linearGradient id="d" xlink:href="#c"/>
              </defs>
              <rect width="5" height="5" fill="url(#a)"/>
              <rect width="5" height="5" fill="url(#c)"/>
            </svg>"##,
        );
        let frame = &image.frames()[0];
        let linked = frame.object(frame.top_level()[0]);
        let Paint::Linear(gradient) = &linked.settings.fg else {
            panic!("expected a linear gradient fill");
        };
        assert_eq!(gradient.stops().len(), 2);
        assert_eq!(gradient.stops()[0].color, Color::rgb(1, 2, 3));

        let cyclic = frame.object(frame.top_level()[1]);
        assert_eq!(cyclic.settings.fg, Paint::Color(Color::BLACK));
        assert!(
            image
                .warnings()
                .iter()
                .any(|w| w == "linearGradient with id=c has no color-stops")
        );
    }

    #[test]
    fn viewbox_origin_shifts_content() {
        let image = import(
            r#"<svg viewBox="10 20 100 100"><rect x="10" y="20" width="30" height="40"/></svg>"#,
        );
        let frame = &image.frames()[0];
        assert_eq!(frame.size(), Size::new(100.0, 100.0));
        let tri = frame.get_obj_tri(frame.top_level()[0]);
        assert!(points_close(tri.p0(), Point::new(0.0, 0.0)));
    }

    #[test]
    fn group_members_collapse_into_one_object() {
        let image = import(
            r#"<svg><g>
              <rect width="5" height="5"/>
              <rect x="10" width="5" height="5"/>
            </g></svg>"#,
        );
        let frame = &image.frames()[0];
        let obj = only_object(frame);
        let Shape::Group { children } = &obj.shape else {
            panic!("expected a group");
        };
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn single_member_group_is_unwrapped() {
        let image = import(r#"<svg><g><rect width="5" height="5"/></g></svg>"#);
        let obj = only_object(&image.frames()[0]);
        assert!(matches!(obj.shape, Shape::Rect));
    }

    #[test]
    fn unusable_root_size_keeps_the_default_frame_and_skips_content() {
        let image = import(r#"<svg width="0" height="100"><rect width="5" height="5"/></svg>"#);
        assert_eq!(image.frames()[0].size(), DEFAULT_SIZE);
        assert!(image.frames()[0].top_level().is_empty());
        assert!(
            image
                .warnings()
                .iter()
                .any(|w| w == "SVG element has negative width")
        );
    }

    #[test]
    fn ellipse_path_restores_the_saved_tri() {
        let image = import(
            r#"<svg xmlns:faint="http://www.code.google.com/p/faint-graphics-editor">
              <path faint:type="ellipse" faint:tri="1,2 31,2 1,42" d="M 0 0"/>
            </svg>"#,
        );
        let frame = &image.frames()[0];
        let obj = only_object(frame);
        assert!(matches!(obj.shape, Shape::Ellipse));
        let tri = frame.get_obj_tri(frame.top_level()[0]);
        assert!(points_close(tri.p0(), Point::new(1.0, 2.0)));
        assert!(points_close(tri.p1(), Point::new(31.0, 2.0)));
        assert!(points_close(tri.p2(), Point::new(1.0, 42.0)));
    }

    #[test]
    fn spline_path_recovers_control_points() {
        let image = import(
            r#"<svg xmlns:faint="http://www.code.google.com/p/faint-graphics-editor">
              <path faint:type="spline" d="M 0 0 L 5 5"/>
            </svg>"#,
        );
        let obj = only_object(&image.frames()[0]);
        let Shape::Spline { points } = &obj.shape else {
            panic!("expected a spline");
        };
        assert_eq!(points.len(), 2);
        assert!(points_close(points[0], Point::new(0.0, 0.0)));
        assert!(points_close(points[1], Point::new(10.0, 10.0)));
    }

    #[test]
    fn presentation_attribute_overrides_inline_style() {
        let image = import(
            r#"<svg><rect style="fill:rgb(0,255,0)" fill="rgb(255,0,0)" width="5" height="5"/></svg>"#,
        );
        let obj = only_object(&image.frames()[0]);
        assert_eq!(obj.settings.fg, Paint::Color(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn group_scale_scales_stroke_width() {
        let image = import(
            r#"<svg><g transform="scale(2)">
              <line x1="0" y1="0" x2="5" y2="0" stroke="rgb(0,0,0)" stroke-width="3"/>
            </g></svg>"#,
        );
        let frame = &image.frames()[0];
        let obj = only_object(frame);
        assert!(close(obj.settings.line_width, 6.0));
        let Shape::Line { points } = &obj.shape else {
            panic!("expected a line");
        };
        assert!(points_close(points[1], Point::new(10.0, 0.0)));
    }

    #[test]
    fn dash_cap_and_join_attributes_map_to_settings() {
        let image = import(
            r#"<svg><line x1="0" y1="0" x2="5" y2="0" stroke="black" stroke-dasharray="4,4" stroke-linecap="round" stroke-linejoin="bevel"/></svg>"#,
        );
        let obj = only_object(&image.frames()[0]);
        assert_eq!(obj.settings.line_style, LineStyle::LongDash);
        assert_eq!(obj.settings.cap, Cap::Round);
        assert_eq!(obj.settings.join, Join::Bevel);
    }

    #[test]
    fn text_collects_tspans_and_centers_on_middle_anchor() {
        let image = import(
            r#"<svg xmlns:faint="http://www.code.google.com/p/faint-graphics-editor"><text x="100" y="50" font-size="10" faint:width="50" text-anchor="middle"><tspan faint:hardbreak="1">ab</tspan><tspan>cd</tspan></text></svg>"#,
        );
        let frame = &image.frames()[0];
        let obj = only_object(frame);
        let Shape::Text { text } = &obj.shape else {
            panic!("expected a text object");
        };
        assert_eq!(text, "ab\ncd");
        assert_eq!(obj.settings.halign, HAlign::Center);
        assert!(close(obj.settings.font_size, 10.0));
        let tri = frame.get_obj_tri(frame.top_level()[0]);
        // x is pulled back by half the width, y up by the text height.
        assert!(points_close(tri.p0(), Point::new(75.0, 40.0)));
    }

    #[test]
    fn current_color_defaults_to_red_and_inherits() {
        let image = import(
            r#"<svg>
              <rect width="5" height="5" fill="currentColor"/>
              <g color="rgb(0,0,255)"><rect width="5" height="5" fill="currentColor"/></g>
            </svg>"#,
        );
        let frame = &image.frames()[0];
        let plain = frame.object(frame.top_level()[0]);
        assert_eq!(plain.settings.fg, Paint::Color(Color::rgb(255, 0, 0)));
        let tinted = frame.object(frame.top_level()[1]);
        assert_eq!(tinted.settings.fg, Paint::Color(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn background_rect_sets_the_frame_color() {
        let image = import(
            r#"<svg xmlns:faint="http://www.code.google.com/p/faint-graphics-editor">
              <rect faint:background="1" width="100%" height="100%" fill="rgb(10,20,30)"/>
            </svg>"#,
        );
        let frame = &image.frames()[0];
        assert!(frame.top_level().is_empty(), "background is not an object");
        assert_eq!(*frame.background(), Background::Color(Color::rgb(10, 20, 30)));
    }

    #[test]
    fn front_arrow_marker_restores_the_tip() {
        let image = import(
            r#"<svg><line x1="0" y1="0" x2="10" y2="0" stroke="rgb(0,0,0)" stroke-width="2" marker-end="url(#Arrowhead)"/></svg>"#,
        );
        let obj = only_object(&image.frames()[0]);
        assert_eq!(obj.settings.arrow, Arrow::Front);
        let Shape::Line { points } = &obj.shape else {
            panic!("expected a line");
        };
        assert!(points_close(points[1], Point::new(25.0, 0.0)));
    }
}
