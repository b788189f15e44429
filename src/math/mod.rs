pub mod distance_2d;
pub mod polygon_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Scalar (z-component) cross product of two 2D vectors.
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Lifts a 2D point to 3D at elevation `z`.
#[must_use]
pub fn lift(p: &Point2, z: f64) -> Point3 {
    Point3::new(p.x, p.y, z)
}

/// Area of a planar quad in space: half the norm of the diagonal cross product.
#[must_use]
pub fn quad_area_3d(quad: &[Point3; 4]) -> f64 {
    0.5 * (quad[2] - quad[0]).cross(&(quad[3] - quad[1])).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_2d_sign_follows_turn() {
        let x = Vector2::new(1.0, 0.0);
        let y = Vector2::new(0.0, 1.0);
        assert!((cross_2d(&x, &y) - 1.0).abs() < TOLERANCE);
        assert!((cross_2d(&y, &x) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn lift_keeps_xy() {
        let p = lift(&Point2::new(2.0, -3.0), 4.5);
        assert_eq!(p, Point3::new(2.0, -3.0, 4.5));
    }

    #[test]
    fn quad_area_of_tilted_rectangle() {
        let q = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 3.0),
        ];
        assert!((quad_area_3d(&q) - 6.0).abs() < TOLERANCE);
    }
}
