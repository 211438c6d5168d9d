//! Circle overlap geometry

use std::f64::consts::PI;

/// Returns the area of intersection of two circles
///
/// The circles have radii `big_r` and `r` and their centers are `d` apart.
/// All three arguments must be non-negative.
pub fn intersection_area(d: f64, big_r: f64, r: f64) -> f64 {
    if d <= (big_r - r).abs() {
        // one circle is entirely enclosed in the other
        return PI * big_r.min(r).powi(2);
    }
    if d >= r + big_r {
        return 0f64;
    }
    let (r2, big_r2, d2) = (r * r, big_r * big_r, d * d);
    let alpha = ((d2 + r2 - big_r2) / (2. * d * r)).acos();
    let beta = ((d2 + big_r2 - r2) / (2. * d * big_r)).acos();
    r2 * alpha + big_r2 * beta - 0.5 * (r2 * (2. * alpha).sin() + big_r2 * (2. * beta).sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concentric() {
        assert!((intersection_area(0., 2., 0.75) - PI * 0.75 * 0.75).abs() < 1e-12);
        assert!((intersection_area(0., 0.75, 2.) - PI * 0.75 * 0.75).abs() < 1e-12);
    }

    #[test]
    fn disjoint() {
        assert_eq!(intersection_area(2.75, 2., 0.75), 0.);
        assert_eq!(intersection_area(10., 2., 0.75), 0.);
    }

    #[test]
    fn symmetric_radii() {
        for d in [0.3, 0.9, 1.5, 2.2, 2.7] {
            let a = intersection_area(d, 2., 0.75);
            let b = intersection_area(d, 0.75, 2.);
            assert!((a - b).abs() < 1e-10, "d={d}: {a} vs {b}");
        }
    }

    #[test]
    fn continuous_at_enclosure() {
        let (big_r, r) = (2., 0.75);
        let edge = big_r - r;
        let inside = intersection_area(edge, big_r, r);
        let outside = intersection_area(edge + 1e-9, big_r, r);
        assert!((inside - outside).abs() < 1e-6, "{inside} vs {outside}");
    }

    #[test]
    fn equal_circles_half_overlap() {
        // two unit circles one radius apart: 2π/3 - √3/2
        let a = intersection_area(1., 1., 1.);
        assert!((a - (2. * PI / 3. - 3f64.sqrt() / 2.)).abs() < 1e-12);
    }

    #[test]
    fn bounded_by_smaller_disk() {
        let full = PI * 0.75 * 0.75;
        let mut last = full;
        for i in 0..=30 {
            let d = 1.25 + i as f64 * 0.05;
            let a = intersection_area(d, 2., 0.75);
            assert!(a <= last + 1e-12);
            assert!(a >= 0.);
            last = a;
        }
    }
}
