pub mod bezier;
pub mod intersect_2d;
pub mod polygon_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 2D affine transformation (the SVG `matrix(a b c d e f)` form).
pub type Transform2 = nalgebra::Affine2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Builds a [`Transform2`] from SVG matrix coefficients.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
#[must_use]
pub fn transform_from_coefficients(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Transform2 {
    Transform2::from_matrix_unchecked(nalgebra::Matrix3::new(a, c, e, b, d, f, 0.0, 0.0, 1.0))
}

/// Returns `true` when the transform is the identity within [`TOLERANCE`].
#[must_use]
pub fn is_identity(transform: &Transform2) -> bool {
    let m = transform.matrix();
    let id = nalgebra::Matrix3::<f64>::identity();
    m.iter().zip(id.iter()).all(|(a, b)| (a - b).abs() < TOLERANCE)
}

/// 2D cross product (z component of the 3D cross product).
#[must_use]
pub fn cross(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_follow_svg_matrix_order() {
        let t = transform_from_coefficients(2.0, 0.0, 0.0, 3.0, 10.0, 20.0);
        let p = t.transform_point(&Point2::new(1.0, 1.0));
        assert!((p.x - 12.0).abs() < TOLERANCE);
        assert!((p.y - 23.0).abs() < TOLERANCE);
    }

    #[test]
    fn identity_detection() {
        assert!(is_identity(&Transform2::identity()));
        assert!(!is_identity(&transform_from_coefficients(
            1.0, 0.0, 0.0, 1.0, 0.5, 0.0
        )));
    }
}
