use super::distance_2d::point_to_segment_dist;
use super::{cross_2d, Point2, TOLERANCE};

/// Distance below which a point is considered to lie on a polygon edge.
pub const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Relative slack for a corner that turns against the quad's orientation
/// before the quad stops counting as convex.
const CONVEX_SLACK: f64 = 1e-9;

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Computes the unsigned area of a polygon.
#[must_use]
pub fn polygon_area(points: &[Point2]) -> f64 {
    signed_area(points).abs()
}

/// Ray-casting point-in-polygon test.
///
/// Points within [`BOUNDARY_TOLERANCE`] of an edge count as inside.
/// Returns `false` for fewer than 3 vertices.
#[must_use]
pub fn point_in_polygon(p: &Point2, points: &[Point2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = &points[i];
        let b = &points[j];
        if point_to_segment_dist(p, a, b) <= BOUNDARY_TOLERANCE {
            return true;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Orientation of the triple `(a, b, c)`: positive for a left turn,
/// negative for a right turn, zero (within tolerance) when collinear.
#[must_use]
pub fn orientation(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let o = cross_2d(&(b - a), &(c - a));
    if o.abs() <= TOLERANCE {
        0.0
    } else {
        o
    }
}

/// Returns `true` if `q` lies within the bounding box of segment `a`→`b`.
fn on_segment_box(a: &Point2, q: &Point2, b: &Point2) -> bool {
    q.x <= a.x.max(b.x) + TOLERANCE
        && q.x >= a.x.min(b.x) - TOLERANCE
        && q.y <= a.y.max(b.y) + TOLERANCE
        && q.y >= a.y.min(b.y) - TOLERANCE
}

/// Orientation-predicate test for whether segments `p1`→`p2` and `q1`→`q2`
/// intersect, including touching endpoints and collinear overlap.
#[must_use]
pub fn segments_intersect(p1: &Point2, p2: &Point2, q1: &Point2, q2: &Point2) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if o1 * o2 < 0.0 && o3 * o4 < 0.0 {
        return true;
    }

    (o1 == 0.0 && on_segment_box(p1, q1, p2))
        || (o2 == 0.0 && on_segment_box(p1, q2, p2))
        || (o3 == 0.0 && on_segment_box(q1, p1, q2))
        || (o4 == 0.0 && on_segment_box(q1, p2, q2))
}

/// Convexity test for a quad given in cyclic order.
///
/// The four consecutive edge cross products must agree in sign with the
/// quad's orientation. A corner turning against that orientation is tolerated
/// up to a small relative slack, so near-collinear corners classify as convex.
/// Quads with zero area are never convex.
#[must_use]
pub fn is_convex_quad(quad: &[Point2; 4]) -> bool {
    let area = signed_area(quad);
    if area.abs() <= TOLERANCE {
        return false;
    }
    let sign = area.signum();

    let scale = (0..4)
        .map(|i| (quad[(i + 1) % 4] - quad[i]).norm_squared())
        .fold(0.0, f64::max);

    (0..4).all(|i| {
        let prev = &quad[(i + 3) % 4];
        let curr = &quad[i];
        let next = &quad[(i + 1) % 4];
        let turn = cross_2d(&(curr - prev), &(next - curr)) * sign;
        turn >= -CONVEX_SLACK * scale
    })
}

/// Splits segment `a`→`b` into `max(1, ceil(len / target))` equal spans and
/// returns the span endpoints, including both `a` and `b`.
///
/// Interior points are computed as `a + (b - a) * (i / n)` so that every caller
/// subdividing the same edge obtains bit-identical vertices.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn subdivide_segment(a: &Point2, b: &Point2, target: f64) -> Vec<Point2> {
    let len = (b - a).norm();
    let spans = if target > 0.0 && len.is_finite() {
        ((len / target).ceil() as usize).max(1)
    } else {
        1
    };
    let d = b - a;
    let mut out = Vec::with_capacity(spans + 1);
    out.push(*a);
    for i in 1..spans {
        out.push(a + d * (i as f64 / spans as f64));
    }
    out.push(*b);
    out
}

/// Subdivides every edge of a closed loop, returning the densified loop
/// without repeating the first vertex at the end.
#[must_use]
pub fn subdivide_loop(points: &[Point2], target: f64) -> Vec<Point2> {
    let n = points.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let span = subdivide_segment(&points[i], &points[(i + 1) % n], target);
        out.extend_from_slice(&span[..span.len() - 1]);
    }
    out
}
