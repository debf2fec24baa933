use crate::geom::Point;
use crate::xml::fmt_f64;

// Path geometry lowered to four primitives. The parser normalizes
// H/V, S/T reflections, quadratics and arcs away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSeg {
    Move(Point),
    Line(Point),
    Cubic(Point, Point, Point),
    Close,
}

impl PathSeg {
    // End point of the segment, if it has one.
    pub fn end(&self) -> Option<Point> {
        match self {
            PathSeg::Move(p) | PathSeg::Line(p) | PathSeg::Cubic(_, _, p) => Some(*p),
            PathSeg::Close => None,
        }
    }
}

// Parses SVG 1.1 path data. Returns None when the data is malformed:
// not starting with a move, a command with a truncated argument tuple,
// or garbage between commands.
pub fn parse_path_data(d: &str) -> Option<Vec<PathSeg>> {
    let mut segs: Vec<PathSeg> = Vec::new();
    let mut p = Cursor::new(d);
    let mut cmd: Option<u8> = None;
    let mut cur = Point::new(0.0, 0.0);
    let mut start = cur;
    let mut last_cubic_ctrl2: Option<Point> = None;
    let mut last_quad_ctrl: Option<Point> = None;

    loop {
        p.skip_ws();
        if p.at_end() {
            break;
        }
        if let Some(c) = p.take_command() {
            if segs.is_empty() && !matches!(c, b'M' | b'm') {
                return None;
            }
            cmd = Some(c);
        }
        // A number with no command in effect is malformed.
        let c = cmd?;

        match c {
            b'M' | b'm' => {
                let rel = c == b'm';
                let pt = p.pair()?;
                let pt = if rel { cur + pt } else { pt };
                segs.push(PathSeg::Move(pt));
                cur = pt;
                start = pt;
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
                // Implicit repeats after a move are line-tos.
                cmd = Some(if rel { b'l' } else { b'L' });
            }
            b'L' | b'l' => {
                let pt = p.pair()?;
                let pt = if c == b'l' { cur + pt } else { pt };
                segs.push(PathSeg::Line(pt));
                cur = pt;
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
            }
            b'H' | b'h' => {
                let x = p.number()?;
                let x = if c == b'h' { cur.x + x } else { x };
                cur = Point::new(x, cur.y);
                segs.push(PathSeg::Line(cur));
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
            }
            b'V' | b'v' => {
                let y = p.number()?;
                let y = if c == b'v' { cur.y + y } else { y };
                cur = Point::new(cur.x, y);
                segs.push(PathSeg::Line(cur));
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
            }
            b'C' | b'c' => {
                let c1 = p.pair()?;
                let c2 = p.pair()?;
                let end = p.pair()?;
                let (c1, c2, end) = if c == b'c' {
                    (cur + c1, cur + c2, cur + end)
                } else {
                    (c1, c2, end)
                };
                segs.push(PathSeg::Cubic(c1, c2, end));
                cur = end;
                last_cubic_ctrl2 = Some(c2);
                last_quad_ctrl = None;
            }
            b'S' | b's' => {
                let c2 = p.pair()?;
                let end = p.pair()?;
                let (c2, end) = if c == b's' { (cur + c2, cur + end) } else { (c2, end) };
                let c1 = match last_cubic_ctrl2 {
                    Some(prev) => Point::new(2.0 * cur.x - prev.x, 2.0 * cur.y - prev.y),
                    None => cur,
                };
                segs.push(PathSeg::Cubic(c1, c2, end));
                cur = end;
                last_cubic_ctrl2 = Some(c2);
                last_quad_ctrl = None;
            }
            b'Q' | b'q' => {
                let q = p.pair()?;
                let end = p.pair()?;
                let (q, end) = if c == b'q' { (cur + q, cur + end) } else { (q, end) };
                let (c1, c2) = quad_to_cubic(cur, q, end);
                segs.push(PathSeg::Cubic(c1, c2, end));
                cur = end;
                last_quad_ctrl = Some(q);
                last_cubic_ctrl2 = Some(c2);
            }
            b'T' | b't' => {
                let end = p.pair()?;
                let end = if c == b't' { cur + end } else { end };
                let q = match last_quad_ctrl {
                    Some(prev) => Point::new(2.0 * cur.x - prev.x, 2.0 * cur.y - prev.y),
                    None => cur,
                };
                let (c1, c2) = quad_to_cubic(cur, q, end);
                segs.push(PathSeg::Cubic(c1, c2, end));
                cur = end;
                last_quad_ctrl = Some(q);
                last_cubic_ctrl2 = Some(c2);
            }
            b'A' | b'a' => {
                let rx = p.number()?;
                let ry = p.number()?;
                let rot = p.number()?;
                let large = p.arc_flag()?;
                let sweep = p.arc_flag()?;
                let end = p.pair()?;
                let end = if c == b'a' { cur + end } else { end };
                let curves = arc_to_cubics(cur, rx, ry, rot, large, sweep, end);
                last_cubic_ctrl2 = curves.iter().rev().find_map(|seg| match seg {
                    PathSeg::Cubic(_, c2, _) => Some(*c2),
                    _ => None,
                });
                segs.extend(curves);
                cur = end;
                last_quad_ctrl = None;
            }
            b'Z' | b'z' => {
                segs.push(PathSeg::Close);
                cur = start;
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
                // Numbers may not follow a close-path directly.
                cmd = None;
            }
            _ => return None,
        }
    }

    if segs.is_empty() {
        return None;
    }
    Some(segs)
}

// Serializes segments back to path data.
pub fn to_svg_path_data(segs: &[PathSeg]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(segs.len());
    for seg in segs {
        match seg {
            PathSeg::Move(p) => {
                parts.push(format!("M {} {}", fmt_f64(p.x), fmt_f64(p.y)));
            }
            PathSeg::Line(p) => {
                parts.push(format!("L {} {}", fmt_f64(p.x), fmt_f64(p.y)));
            }
            PathSeg::Cubic(c1, c2, p) => {
                parts.push(format!(
                    "C {} {} {} {} {} {}",
                    fmt_f64(c1.x),
                    fmt_f64(c1.y),
                    fmt_f64(c2.x),
                    fmt_f64(c2.y),
                    fmt_f64(p.x),
                    fmt_f64(p.y)
                ));
            }
            PathSeg::Close => parts.push("z".to_string()),
        }
    }
    parts.join(" ")
}

// Serializes spline points in the host's spline path form: a move to
// the first point, a line to the first midpoint, one cubic per interior
// point with both controls at that point, and a final line to the last
// point. spline_points_from_segs inverts this exactly.
pub fn spline_to_svg_path_data(points: &[Point]) -> String {
    if points.is_empty() {
        return String::new();
    }
    if points.len() == 1 {
        return format!("M {} {}", fmt_f64(points[0].x), fmt_f64(points[0].y));
    }

    let p0 = points[0];
    let m = midpoint(points[0], points[1]);
    let mut parts = vec![
        format!("M {} {}", fmt_f64(p0.x), fmt_f64(p0.y)),
        format!("L {} {}", fmt_f64(m.x), fmt_f64(m.y)),
    ];
    for k in 2..points.len() - 1 {
        let q = points[k - 1];
        let e = midpoint(points[k - 1], points[k]);
        parts.push(format!(
            "C {} {} {} {} {} {}",
            fmt_f64(q.x),
            fmt_f64(q.y),
            fmt_f64(q.x),
            fmt_f64(q.y),
            fmt_f64(e.x),
            fmt_f64(e.y)
        ));
    }
    if points.len() >= 3 {
        let last = points[points.len() - 1];
        parts.push(format!("L {} {}", fmt_f64(last.x), fmt_f64(last.y)));
    }
    parts.join(" ")
}

// Recovers spline points from parsed path segments, or None when the
// segments do not have the spline shape.
pub fn spline_points_from_segs(segs: &[PathSeg]) -> Option<Vec<Point>> {
    if segs.len() < 2 {
        return None;
    }
    let PathSeg::Move(p0) = segs[0] else {
        return None;
    };
    let PathSeg::Line(m) = segs[1] else {
        return None;
    };
    let mut points = vec![p0, Point::new(2.0 * m.x - p0.x, 2.0 * m.y - p0.y)];

    let rest = &segs[2..];
    if rest.is_empty() {
        return Some(points);
    }
    let (last, curves) = rest.split_last()?;
    for seg in curves {
        let PathSeg::Cubic(_, c2, e) = seg else {
            return None;
        };
        points.push(Point::new(2.0 * e.x - c2.x, 2.0 * e.y - c2.y));
    }
    let PathSeg::Line(end) = last else {
        return None;
    };
    points.push(*end);
    Some(points)
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

fn quad_to_cubic(p0: Point, q: Point, end: Point) -> (Point, Point) {
    let c1 = Point::new(
        p0.x + (2.0 / 3.0) * (q.x - p0.x),
        p0.y + (2.0 / 3.0) * (q.y - p0.y),
    );
    let c2 = Point::new(
        end.x + (2.0 / 3.0) * (q.x - end.x),
        end.y + (2.0 / 3.0) * (q.y - end.y),
    );
    (c1, c2)
}

// SVG elliptical arc to cubic Beziers, following the SVG 1.1
// implementation notes (center parameterization).
fn arc_to_cubics(
    from: Point,
    rx_in: f64,
    ry_in: f64,
    x_axis_rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
    to: Point,
) -> Vec<PathSeg> {
    use std::f64::consts::PI;

    let mut rx = rx_in.abs();
    let mut ry = ry_in.abs();
    if rx == 0.0 || ry == 0.0 || from == to {
        return vec![PathSeg::Line(to)];
    }

    let phi = x_axis_rotation_deg * PI / 180.0;
    let sin_phi = libm::sin(phi);
    let cos_phi = libm::cos(phi);

    let dx2 = (from.x - to.x) / 2.0;
    let dy2 = (from.y - to.y) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    // Scale radii up if they cannot span the endpoints.
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = libm::sqrt(lambda);
        rx *= s;
        ry *= s;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let x1p2 = x1p * x1p;
    let y1p2 = y1p * y1p;
    let num = rx2 * ry2 - rx2 * y1p2 - ry2 * x1p2;
    let den = rx2 * y1p2 + ry2 * x1p2;
    let mut coef = 0.0;
    if den != 0.0 {
        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        coef = sign * libm::sqrt((num / den).max(0.0));
    }
    let cxp = coef * (rx * y1p / ry);
    let cyp = coef * (-ry * x1p / rx);

    let cx = cos_phi * cxp - sin_phi * cyp + (from.x + to.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (from.y + to.y) / 2.0;

    fn angle(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
        let dot = ux * vx + uy * vy;
        let det = ux * vy - uy * vx;
        libm::atan2(det, dot)
    }

    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;

    let mut theta1 = angle(1.0, 0.0, ux, uy);
    let mut dtheta = angle(ux, uy, vx, vy);

    if !sweep && dtheta > 0.0 {
        dtheta -= 2.0 * PI;
    } else if sweep && dtheta < 0.0 {
        dtheta += 2.0 * PI;
    }

    // At most 90 degrees per cubic.
    let count = (libm::ceil(dtheta.abs() / (PI / 2.0)).max(1.0)) as i32;
    let delta = dtheta / (count as f64);

    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (c1, c2, end) = arc_segment_to_cubic(cx, cy, rx, ry, sin_phi, cos_phi, theta1, theta1 + delta);
        out.push(PathSeg::Cubic(c1, c2, end));
        theta1 += delta;
    }
    out
}

fn arc_segment_to_cubic(
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    sin_phi: f64,
    cos_phi: f64,
    t1: f64,
    t2: f64,
) -> (Point, Point, Point) {
    let dt = t2 - t1;
    let k = (4.0 / 3.0) * libm::tan(dt / 4.0);

    let s1 = libm::sin(t1);
    let c1 = libm::cos(t1);
    let s2 = libm::sin(t2);
    let c2 = libm::cos(t2);

    let map = |x: f64, y: f64| {
        let x = rx * x;
        let y = ry * y;
        Point::new(
            cx + cos_phi * x - sin_phi * y,
            cy + sin_phi * x + cos_phi * y,
        )
    };

    (
        map(c1 - k * s1, s1 + k * c1),
        map(c2 + k * s2, s2 - k * c2),
        map(c2, s2),
    )
}

struct Cursor<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            i: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.i >= self.bytes.len()
    }

    fn skip_ws(&mut self) {
        while self.i < self.bytes.len() {
            match self.bytes[self.i] {
                b' ' | b'\n' | b'\r' | b'\t' | b',' => self.i += 1,
                _ => break,
            }
        }
    }

    fn take_command(&mut self) -> Option<u8> {
        if self.at_end() {
            return None;
        }
        let b = self.bytes[self.i];
        if b.is_ascii_alphabetic() {
            self.i += 1;
            return Some(b);
        }
        None
    }

    fn number(&mut self) -> Option<f64> {
        self.skip_ws();
        if self.at_end() {
            return None;
        }
        let start = self.i;
        let mut has_digits = false;

        if matches!(self.bytes[self.i], b'+' | b'-') {
            self.i += 1;
        }
        while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
            self.i += 1;
            has_digits = true;
        }
        if self.i < self.bytes.len() && self.bytes[self.i] == b'.' {
            self.i += 1;
            while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
                self.i += 1;
                has_digits = true;
            }
        }
        if has_digits && self.i < self.bytes.len() && matches!(self.bytes[self.i], b'e' | b'E') {
            let before_exp = self.i;
            self.i += 1;
            if self.i < self.bytes.len() && matches!(self.bytes[self.i], b'+' | b'-') {
                self.i += 1;
            }
            let mut exp_digits = false;
            while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
                self.i += 1;
                exp_digits = true;
            }
            if !exp_digits {
                self.i = before_exp;
            }
        }

        if !has_digits {
            self.i = start;
            return None;
        }

        std::str::from_utf8(&self.bytes[start..self.i])
            .ok()?
            .parse::<f64>()
            .ok()
    }

    fn pair(&mut self) -> Option<Point> {
        let x = self.number()?;
        let y = self.number()?;
        Some(Point::new(x, y))
    }

    // Arc flags may be packed without separators ("01" is two flags).
    fn arc_flag(&mut self) -> Option<bool> {
        self.skip_ws();
        if self.at_end() {
            return None;
        }
        match self.bytes[self.i] {
            b'0' => {
                self.i += 1;
                Some(false)
            }
            b'1' => {
                self.i += 1;
                Some(true)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn parses_simple_path() {
        let segs = parse_path_data("M 0 0 L 10 0 L 10 10 z").expect("valid path");
        assert_eq!(segs[0], PathSeg::Move(pt(0.0, 0.0)));
        assert_eq!(segs[1], PathSeg::Line(pt(10.0, 0.0)));
        assert_eq!(segs[3], PathSeg::Close);
    }

    #[test]
    fn relative_commands_accumulate() {
        let segs = parse_path_data("m 1 1 l 2 0 l 0 3").expect("valid path");
        assert_eq!(segs[1], PathSeg::Line(pt(3.0, 1.0)));
        assert_eq!(segs[2], PathSeg::Line(pt(3.0, 4.0)));
    }

    #[test]
    fn implicit_moveto_repeats_become_lines() {
        let segs = parse_path_data("M 0 0 5 5 10 0").expect("valid path");
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1], PathSeg::Line(pt(5.0, 5.0)));
        assert_eq!(segs[2], PathSeg::Line(pt(10.0, 0.0)));
    }

    #[test]
    fn quadratics_and_arcs_lower_to_cubics() {
        let segs =
            parse_path_data("M 0 0 Q 10 0 10 10 T 20 20 A 5 5 0 0 1 30 30 z").expect("valid path");
        assert!(segs.iter().any(|s| matches!(s, PathSeg::Cubic(..))));
        assert!(!segs.iter().any(|s| matches!(s, PathSeg::Line(..))));
    }

    #[test]
    fn compact_arc_flags_parse() {
        let segs = parse_path_data("M10 10 A5 5 0 01 20 20").expect("valid path");
        assert!(segs.iter().any(|s| matches!(s, PathSeg::Cubic(..))));
    }

    #[test]
    fn smooth_cubic_reflects_previous_control() {
        let segs = parse_path_data("M 0 0 C 0 10 10 10 10 0 S 20 -10 20 0").expect("valid path");
        let PathSeg::Cubic(c1, _, _) = segs[2] else {
            panic!("expected cubic");
        };
        // Reflection of (10, 10) about (10, 0).
        assert_eq!(c1, pt(10.0, -10.0));
    }

    #[test]
    fn malformed_data_is_rejected() {
        assert!(parse_path_data("").is_none());
        assert!(parse_path_data("L 10 10").is_none(), "must start with a move");
        assert!(parse_path_data("M 0 0 C 1 2").is_none(), "truncated tuple");
        assert!(parse_path_data("M 0 0 ! 3 4").is_none(), "garbage byte");
        assert!(parse_path_data("M 0 0 z 1 2").is_none(), "numbers after close");
    }

    #[test]
    fn serialized_path_reparses_identically() {
        let segs = parse_path_data("M 0 0 L 10 0 C 10 5 5 10 0 10 z").expect("valid path");
        let text = to_svg_path_data(&segs);
        let reparsed = parse_path_data(&text).expect("round-tripped path");
        assert_eq!(segs, reparsed);
    }

    #[test]
    fn spline_wire_form_inverts_exactly() {
        let points = vec![
            pt(0.0, 0.0),
            pt(10.0, 0.0),
            pt(10.0, 10.0),
            pt(20.0, 10.0),
            pt(25.0, 0.0),
        ];
        let d = spline_to_svg_path_data(&points);
        let segs = parse_path_data(&d).expect("valid spline path");
        let recovered = spline_points_from_segs(&segs).expect("spline shape");
        assert_eq!(recovered, points);
    }

    #[test]
    fn two_point_spline_inverts() {
        let points = vec![pt(1.0, 2.0), pt(3.0, 8.0)];
        let d = spline_to_svg_path_data(&points);
        let segs = parse_path_data(&d).expect("valid spline path");
        assert_eq!(
            spline_points_from_segs(&segs).expect("spline shape"),
            points
        );
    }

    #[test]
    fn non_spline_segments_are_rejected() {
        let segs = parse_path_data("M 0 0 C 1 1 2 2 3 3").expect("valid path");
        assert!(spline_points_from_segs(&segs).is_none());
    }
}
