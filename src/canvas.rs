// In-memory image model targeted by the SVG reader and consumed by
// the writer: frames with a background and a z-ordered list of vector
// objects, each carrying a bounding `Tri` and its `Settings`.

use image::RgbaImage;

use crate::color::Color;
use crate::geom::{Point, Rect, Size, Tri, tri_to_tri};
use crate::path::PathSeg;
use crate::types::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Ellipse,
    Group { children: Vec<ObjId> },
    Line { points: Vec<Point> },
    Path { segs: Vec<PathSeg> },
    Polygon { points: Vec<Point> },
    Raster { bitmap: RgbaImage },
    Rect,
    Spline { points: Vec<Point> },
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub shape: Shape,
    pub settings: Settings,
    tri: Tri,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Color(Color),
    Bitmap(RgbaImage),
}

// Objects live in an arena indexed by `ObjId`; `order` holds the
// top level z-order, with group members reachable only through their
// group.
#[derive(Debug, Clone)]
pub struct Frame {
    size: Size,
    background: Background,
    objects: Vec<Object>,
    order: Vec<ObjId>,
}

impl Frame {
    fn new(size: Size) -> Self {
        Self {
            size,
            background: Background::Color(Color::WHITE),
            objects: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.background = Background::Color(color);
    }

    pub fn set_background_bitmap(&mut self, bitmap: RgbaImage) {
        self.background = Background::Bitmap(bitmap);
    }

    // The background color when the background is a single color,
    // including a bitmap where every pixel is the same.
    pub fn one_color_background(&self) -> Option<Color> {
        match &self.background {
            Background::Color(c) => Some(*c),
            Background::Bitmap(bitmap) => {
                let mut pixels = bitmap.pixels();
                let first = *pixels.next()?;
                if pixels.all(|p| *p == first) {
                    Some(Color::rgba(first[0], first[1], first[2], first[3]))
                } else {
                    None
                }
            }
        }
    }

    pub fn object(&self, id: ObjId) -> &Object {
        &self.objects[id.0]
    }

    // Top level objects in z-order, bottom-most first.
    pub fn top_level(&self) -> &[ObjId] {
        &self.order
    }

    pub fn add_rect(&mut self, tri: Tri, settings: Settings) -> ObjId {
        self.push(Shape::Rect, tri, settings)
    }

    pub fn add_ellipse(&mut self, tri: Tri, settings: Settings) -> ObjId {
        self.push(Shape::Ellipse, tri, settings)
    }

    pub fn add_line(&mut self, points: Vec<Point>, settings: Settings) -> ObjId {
        let tri = Tri::from_rect(points_bounds(&points));
        self.push(Shape::Line { points }, tri, settings)
    }

    pub fn add_polygon(&mut self, points: Vec<Point>, settings: Settings) -> ObjId {
        let tri = Tri::from_rect(points_bounds(&points));
        self.push(Shape::Polygon { points }, tri, settings)
    }

    pub fn add_path(&mut self, segs: Vec<PathSeg>, settings: Settings) -> ObjId {
        let tri = Tri::from_rect(segs_bounds(&segs));
        self.push(Shape::Path { segs }, tri, settings)
    }

    pub fn add_spline(&mut self, points: Vec<Point>, settings: Settings) -> ObjId {
        let tri = Tri::from_rect(points_bounds(&points));
        self.push(Shape::Spline { points }, tri, settings)
    }

    pub fn add_text(&mut self, tri: Tri, text: String, settings: Settings) -> ObjId {
        self.push(Shape::Text { text }, tri, settings)
    }

    pub fn add_raster(&mut self, tri: Tri, bitmap: RgbaImage, settings: Settings) -> ObjId {
        self.push(Shape::Raster { bitmap }, tri, settings)
    }

    // Groups top level objects. A single member is returned as-is and
    // an empty list yields no object.
    pub fn add_group(&mut self, children: Vec<ObjId>) -> Option<ObjId> {
        match children.len() {
            0 => None,
            1 => Some(children[0]),
            _ => {
                let bounds = bounds_of(children.iter().flat_map(|id| {
                    let tri = self.objects[id.0].tri;
                    [tri.p0(), tri.p1(), tri.p2(), tri.p3()]
                }));
                self.order.retain(|id| !children.contains(id));
                let id = self.push(
                    Shape::Group { children },
                    Tri::from_rect(bounds),
                    Settings::default(),
                );
                Some(id)
            }
        }
    }

    pub fn get_obj_tri(&self, id: ObjId) -> Tri {
        self.objects[id.0].tri
    }

    // Moves an object to a new bounding tri. Point and path shapes
    // have their geometry remapped by the affine map between the old
    // and new tri; groups forward the map to their members.
    pub fn set_obj_tri(&mut self, id: ObjId, tri: Tri) {
        let old = self.objects[id.0].tri;
        let map = tri_to_tri(old, tri);
        self.objects[id.0].tri = tri;
        match &mut self.objects[id.0].shape {
            Shape::Line { points } | Shape::Polygon { points } | Shape::Spline { points } => {
                for p in points.iter_mut() {
                    *p = map.apply(*p);
                }
            }
            Shape::Path { segs } => {
                for seg in segs.iter_mut() {
                    *seg = match *seg {
                        PathSeg::Move(p) => PathSeg::Move(map.apply(p)),
                        PathSeg::Line(p) => PathSeg::Line(map.apply(p)),
                        PathSeg::Cubic(c1, c2, p) => {
                            PathSeg::Cubic(map.apply(c1), map.apply(c2), map.apply(p))
                        }
                        PathSeg::Close => PathSeg::Close,
                    };
                }
            }
            Shape::Group { children } => {
                let members = children.clone();
                for child in members {
                    let mapped = map.apply_tri(self.objects[child.0].tri);
                    self.set_obj_tri(child, mapped);
                }
            }
            Shape::Ellipse | Shape::Raster { .. } | Shape::Rect | Shape::Text { .. } => {}
        }
    }

    // Height used for baseline adjustment of text objects.
    pub fn get_obj_text_height(&self, id: ObjId) -> f64 {
        self.objects[id.0].settings.font_size
    }

    fn push(&mut self, shape: Shape, tri: Tri, settings: Settings) -> ObjId {
        let id = ObjId(self.objects.len());
        self.objects.push(Object {
            shape,
            settings,
            tri,
        });
        self.order.push(id);
        id
    }
}

// An image under construction: frames plus the warnings collected
// while reading it.
#[derive(Debug, Clone, Default)]
pub struct Image {
    frames: Vec<Frame>,
    warnings: Vec<String>,
}

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_frame(&mut self, size: Size) -> FrameId {
        let id = FrameId(self.frames.len());
        self.frames.push(Frame::new(size));
        id
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.0]
    }

    pub fn frame_mut(&mut self, id: FrameId) -> &mut Frame {
        &mut self.frames[id.0]
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    // Splits the borrow so element parsers can grow a frame while
    // appending warnings.
    pub(crate) fn frame_and_warnings(&mut self, id: FrameId) -> (&mut Frame, &mut Vec<String>) {
        let Image { frames, warnings } = self;
        (&mut frames[id.0], warnings)
    }
}

fn points_bounds(points: &[Point]) -> Rect {
    bounds_of(points.iter().copied())
}

fn segs_bounds(segs: &[PathSeg]) -> Rect {
    // Control points give a conservative hull, which is all the tri
    // needs to stay consistent under remapping.
    bounds_of(segs.iter().flat_map(|seg| match *seg {
        PathSeg::Move(p) | PathSeg::Line(p) => vec![p],
        PathSeg::Cubic(c1, c2, p) => vec![c1, c2, p],
        PathSeg::Close => vec![],
    }))
}

fn bounds_of(points: impl Iterator<Item = Point>) -> Rect {
    let mut min = Point::new(f64::MAX, f64::MAX);
    let mut max = Point::new(f64::MIN, f64::MIN);
    let mut any = false;
    for p in points {
        any = true;
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }
    if !any {
        return Rect::new(0.0, 0.0, 0.0, 0.0);
    }
    Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
}

// Decodes raster data (PNG or JPEG) into RGBA pixels.
pub(crate) fn decode_raster(data: &[u8]) -> Result<RgbaImage, image::ImageError> {
    Ok(image::load_from_memory(data)?.to_rgba8())
}

pub(crate) fn encode_png(bitmap: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(bitmap.clone())
        .write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(Size::new(640.0, 480.0))
    }

    #[test]
    fn added_objects_keep_z_order() {
        let mut frame = frame();
        let a = frame.add_rect(
            Tri::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Settings::default(),
        );
        let b = frame.add_ellipse(
            Tri::from_rect(Rect::new(5.0, 5.0, 10.0, 10.0)),
            Settings::default(),
        );
        assert_eq!(frame.top_level(), &[a, b]);
    }

    #[test]
    fn grouping_removes_members_from_top_level() {
        let mut frame = frame();
        let a = frame.add_rect(
            Tri::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Settings::default(),
        );
        let b = frame.add_rect(
            Tri::from_rect(Rect::new(20.0, 0.0, 10.0, 10.0)),
            Settings::default(),
        );
        let g = frame.add_group(vec![a, b]).expect("group created");
        assert_eq!(frame.top_level(), &[g]);
        let Shape::Group { children } = &frame.object(g).shape else {
            panic!("expected group");
        };
        assert_eq!(children, &[a, b]);
    }

    #[test]
    fn single_member_group_stays_ungrouped() {
        let mut frame = frame();
        let a = frame.add_rect(
            Tri::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Settings::default(),
        );
        assert_eq!(frame.add_group(vec![a]), Some(a));
        assert_eq!(frame.add_group(vec![]), None);
        assert_eq!(frame.top_level(), &[a]);
    }

    #[test]
    fn set_obj_tri_remaps_polygon_points() {
        let mut frame = frame();
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        let id = frame.add_polygon(points, Settings::default());
        let moved = frame.get_obj_tri(id).translated(5.0, -5.0);
        frame.set_obj_tri(id, moved);
        let Shape::Polygon { points } = &frame.object(id).shape else {
            panic!("expected polygon");
        };
        assert_eq!(points[0], Point::new(5.0, -5.0));
        assert_eq!(points[2], Point::new(15.0, 5.0));
    }

    #[test]
    fn uniform_bitmap_background_reads_as_one_color() {
        let mut frame = frame();
        let bitmap = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        frame.set_background_bitmap(bitmap);
        assert_eq!(
            frame.one_color_background(),
            Some(Color::rgba(10, 20, 30, 255))
        );

        let mut mixed = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        mixed.put_pixel(0, 0, image::Rgba([0, 0, 0, 255]));
        frame.set_background_bitmap(mixed);
        assert_eq!(frame.one_color_background(), None);
    }

    #[test]
    fn png_round_trip_preserves_pixels() {
        let bitmap = RgbaImage::from_fn(3, 2, |x, y| {
            image::Rgba([x as u8 * 40, y as u8 * 90, 200, 255])
        });
        let encoded = encode_png(&bitmap).expect("png encoding");
        let decoded = decode_raster(&encoded).expect("png decoding");
        assert_eq!(decoded, bitmap);
    }
}
