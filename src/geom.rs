use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.x + self.w, self.y)
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.x, self.y + self.h)
    }
}

// Bounding rect with center (cx, cy) and radii (rx, ry).
pub fn center_based_to_rect(cx: f64, cy: f64, rx: f64, ry: f64) -> Rect {
    Rect::new(cx - rx, cy - ry, rx * 2.0, ry * 2.0)
}

pub fn distance(a: Point, b: Point) -> f64 {
    libm::hypot(b.x - a.x, b.y - a.y)
}

// Angle in radians of the vector from `from` to `to`, screen-style
// (y grows downwards).
pub fn rad_angle(from: Point, to: Point) -> f64 {
    libm::atan2(to.y - from.y, to.x - from.x)
}

pub fn rotate_point(pt: Point, angle: f64, origin: Point) -> Point {
    let s = libm::sin(angle);
    let c = libm::cos(angle);
    let dx = pt.x - origin.x;
    let dy = pt.y - origin.y;
    Point::new(
        origin.x + dx * c - dy * s,
        origin.y + dx * s + dy * c,
    )
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / PI
}

// Oriented box described by three corners: p0 is the logical top-left,
// p1 the top-right and p2 the bottom-left. Rotation, scaling and skew
// are all expressed by where the corners sit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tri {
    p0: Point,
    p1: Point,
    p2: Point,
}

impl Tri {
    pub const fn new(p0: Point, p1: Point, p2: Point) -> Self {
        Self { p0, p1, p2 }
    }

    pub fn from_rect(r: Rect) -> Self {
        Self::new(r.top_left(), r.top_right(), r.bottom_left())
    }

    pub fn p0(&self) -> Point {
        self.p0
    }

    pub fn p1(&self) -> Point {
        self.p1
    }

    pub fn p2(&self) -> Point {
        self.p2
    }

    pub fn p3(&self) -> Point {
        let w = self.width();
        let angle = self.angle();
        Point::new(
            self.p2.x + w * libm::cos(angle),
            self.p2.y + w * libm::sin(angle),
        )
    }

    pub fn angle(&self) -> f64 {
        rad_angle(self.p0, self.p1)
    }

    pub fn width(&self) -> f64 {
        distance(self.p0, self.p1)
    }

    // Signed height: negative when p2 does not lie on the expected
    // perpendicular side of the p0-p1 edge (0.1 tolerance on the
    // sin/cos decomposition).
    pub fn height(&self) -> f64 {
        let angle2 = rad_angle(self.p0, self.p2);
        let angle3 = self.angle() + PI / 2.0;
        let h = distance(self.p0, self.p2);

        if (libm::sin(angle2) - libm::sin(angle3)).abs() > 0.1 {
            return -h;
        }
        if (libm::cos(angle2) - libm::cos(angle3)).abs() > 0.1 {
            return -h;
        }
        h
    }

    // Horizontal displacement of p2 relative to an unskewed box.
    pub fn skew(&self) -> f64 {
        let p0 = rotate_point(self.p0, -self.angle(), self.p2);
        p0.x - self.p2.x
    }

    pub fn rotated(&self, angle: f64, origin: Point) -> Tri {
        Tri::new(
            rotate_point(self.p0, angle, origin),
            rotate_point(self.p1, angle, origin),
            rotate_point(self.p2, angle, origin),
        )
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Tri {
        let d = Point::new(dx, dy);
        Tri::new(self.p0 + d, self.p1 + d, self.p2 + d)
    }

    // Re-orient the tri to the given angle by rotating around p0.
    pub fn with_angle(&self, angle: f64) -> Tri {
        self.rotated(-self.angle(), self.p0)
            .rotated(angle, self.p0)
    }
}

// SVG-style 2x3 affine matrix. apply() computes
// x' = a*x + c*y + e, y' = b*x + d*y + f.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: tx,
            f: ty,
        }
    }

    pub fn rotation(rad: f64) -> Self {
        let s = libm::sin(rad);
        let c = libm::cos(rad);
        Self {
            a: c,
            b: s,
            c: -s,
            d: c,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn rotation_about(rad: f64, pivot: Point) -> Self {
        Matrix::translation(pivot.x, pivot.y)
            .mul(Matrix::rotation(rad))
            .mul(Matrix::translation(-pivot.x, -pivot.y))
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn skew_x(rad: f64) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: libm::tan(rad),
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn skew_y(rad: f64) -> Self {
        Self {
            a: 1.0,
            b: libm::tan(rad),
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    // Compose so that `other` is applied first: (self.mul(other)).apply(p)
    // equals self.apply(other.apply(p)).
    pub fn mul(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn apply_tri(self, tri: Tri) -> Tri {
        Tri::new(
            self.apply(tri.p0()),
            self.apply(tri.p1()),
            self.apply(tri.p2()),
        )
    }
}

// The affine map taking the corners of `from` onto the corners of `to`.
// Degenerate source tris (collinear corners) fall back to a pure
// translation of p0.
pub fn tri_to_tri(from: Tri, to: Tri) -> Matrix {
    let u = from.p1() - from.p0();
    let v = from.p2() - from.p0();
    let det = u.x * v.y - u.y * v.x;
    if det.abs() < 1e-12 {
        let d = to.p0() - from.p0();
        return Matrix::translation(d.x, d.y);
    }

    let up = to.p1() - to.p0();
    let vp = to.p2() - to.p0();
    let a = (up.x * v.y - vp.x * u.y) / det;
    let c = (vp.x * u.x - up.x * v.x) / det;
    let b = (up.y * v.y - vp.y * u.y) / det;
    let d = (vp.y * u.x - up.y * v.x) / det;

    let e = to.p0().x - (a * from.p0().x + c * from.p0().y);
    let f = to.p0().y - (b * from.p0().x + d * from.p0().y);
    Matrix { a, b, c, d, e, f }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn points_close(a: Point, b: Point) -> bool {
        close(a.x, b.x) && close(a.y, b.y)
    }

    #[test]
    fn tri_from_rect_has_plain_geometry() {
        let t = Tri::from_rect(Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(t.p0(), Point::new(10.0, 20.0));
        assert_eq!(t.p1(), Point::new(40.0, 20.0));
        assert_eq!(t.p2(), Point::new(10.0, 60.0));
        assert!(close(t.angle(), 0.0));
        assert!(close(t.width(), 30.0));
        assert!(close(t.height(), 40.0));
        assert!(close(t.skew(), 0.0));
        assert!(points_close(t.p3(), Point::new(40.0, 60.0)));
    }

    #[test]
    fn tri_height_is_signed() {
        // p2 above the p0-p1 edge.
        let t = Tri::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, -5.0),
        );
        assert!(close(t.height(), -5.0));
    }

    #[test]
    fn rotation_preserves_width_and_height() {
        let t = Tri::from_rect(Rect::new(0.0, 0.0, 20.0, 10.0));
        let r = t.rotated(std::f64::consts::FRAC_PI_4, t.p0());
        assert!(close(r.width(), 20.0));
        assert!(close(r.height(), 10.0));
        assert!(close(r.angle(), std::f64::consts::FRAC_PI_4));
        assert!(points_close(r.p0(), t.p0()));
    }

    #[test]
    fn with_angle_rotates_around_p0() {
        let t = Tri::from_rect(Rect::new(5.0, 5.0, 10.0, 4.0));
        let r = t.with_angle(1.0);
        assert!(close(r.angle(), 1.0));
        assert!(points_close(r.p0(), t.p0()));
        let back = r.with_angle(0.0);
        assert!(points_close(back.p1(), t.p1()));
        assert!(points_close(back.p2(), t.p2()));
    }

    #[test]
    fn matrix_mul_applies_right_operand_first() {
        let m = Matrix::translation(5.0, 0.0).mul(Matrix::scale(2.0, 2.0));
        let p = m.apply(Point::new(1.0, 1.0));
        assert!(points_close(p, Point::new(7.0, 2.0)));
    }

    #[test]
    fn rotation_about_pivot_keeps_pivot_fixed() {
        let pivot = Point::new(3.0, 4.0);
        let m = Matrix::rotation_about(1.2, pivot);
        assert!(points_close(m.apply(pivot), pivot));
    }

    #[test]
    fn tri_to_tri_maps_all_three_corners() {
        let from = Tri::from_rect(Rect::new(0.0, 0.0, 4.0, 2.0));
        let to = Tri::new(
            Point::new(1.0, 1.0),
            Point::new(1.0, 9.0),
            Point::new(-3.0, 1.0),
        );
        let m = tri_to_tri(from, to);
        assert!(points_close(m.apply(from.p0()), to.p0()));
        assert!(points_close(m.apply(from.p1()), to.p1()));
        assert!(points_close(m.apply(from.p2()), to.p2()));
    }

    #[test]
    fn degenerate_tri_to_tri_translates() {
        let from = Tri::new(
            Point::new(2.0, 2.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 2.0),
        );
        let to = from.translated(5.0, -1.0);
        let m = tri_to_tri(from, to);
        assert!(points_close(m.apply(Point::new(2.0, 2.0)), Point::new(7.0, 1.0)));
    }
}
