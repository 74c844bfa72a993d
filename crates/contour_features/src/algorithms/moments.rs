//! Spatial moments of a closed polygon.
//!
//! The polygon is the contour itself (not its pixel mask), so a 60×60 block
//! whose border pixels run from 20 to 79 has area 59².

use serde::{Deserialize, Serialize};

/// Raw spatial moments up to third order
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,
}

impl Moments {
    /// Moments of the polygon through `points`, closed implicitly.
    ///
    /// Uses Green's theorem over each edge. The result is independent of the
    /// winding direction: m00 is never negative.
    pub fn from_polygon(points: &[[f64; 2]]) -> Self {
        if points.len() < 3 {
            return Self::default();
        }

        let mut acc = Self::default();
        let [mut xp, mut yp] = points[points.len() - 1];

        for &[x, y] in points {
            let cross = xp * y - x * yp;
            let xs = xp + x;
            let ys = yp + y;
            let (xp2, yp2, x2, y2) = (xp * xp, yp * yp, x * x, y * y);

            acc.m00 += cross;
            acc.m10 += cross * xs;
            acc.m01 += cross * ys;
            acc.m20 += cross * (xp * xs + x2);
            acc.m11 += cross * (xp * (ys + yp) + x * (ys + y));
            acc.m02 += cross * (yp * ys + y2);
            acc.m30 += cross * xs * (xp2 + x2);
            acc.m21 += cross * (xp2 * (3.0 * yp + y) + 2.0 * x * xp * ys + x2 * (yp + 3.0 * y));
            acc.m12 += cross * (yp2 * (3.0 * xp + x) + 2.0 * y * yp * xs + y2 * (xp + 3.0 * x));
            acc.m03 += cross * ys * (yp2 + y2);

            xp = x;
            yp = y;
        }

        let sign = if acc.m00 < 0.0 { -1.0 } else { 1.0 };
        Self {
            m00: sign * acc.m00 / 2.0,
            m10: sign * acc.m10 / 6.0,
            m01: sign * acc.m01 / 6.0,
            m20: sign * acc.m20 / 12.0,
            m11: sign * acc.m11 / 24.0,
            m02: sign * acc.m02 / 12.0,
            m30: sign * acc.m30 / 20.0,
            m21: sign * acc.m21 / 60.0,
            m12: sign * acc.m12 / 60.0,
            m03: sign * acc.m03 / 20.0,
        }
    }

    pub fn area(&self) -> f64 {
        self.m00
    }

    /// Centre of mass, `None` for a zero-area polygon
    pub fn centroid(&self) -> Option<[f64; 2]> {
        if self.m00.abs() <= f64::EPSILON {
            return None;
        }
        Some([self.m10 / self.m00, self.m01 / self.m00])
    }

    /// Second-order central moments `(mu20, mu11, mu02)`
    pub fn central_second_order(&self) -> Option<(f64, f64, f64)> {
        let [cx, cy] = self.centroid()?;
        Some((
            self.m20 - cx * self.m10,
            self.m11 - cx * self.m01,
            self.m02 - cy * self.m01,
        ))
    }

    /// Seven Hu invariants of the normalised central moments
    pub fn hu_invariants(&self) -> Option<[f64; 7]> {
        let [cx, cy] = self.centroid()?;
        let (mu20, mu11, mu02) = self.central_second_order()?;
        let mu30 = self.m30 - 3.0 * cx * self.m20 + 2.0 * cx * cx * self.m10;
        let mu21 = self.m21 - 2.0 * cx * self.m11 - cy * self.m20 + 2.0 * cx * cx * self.m01;
        let mu12 = self.m12 - 2.0 * cy * self.m11 - cx * self.m02 + 2.0 * cy * cy * self.m10;
        let mu03 = self.m03 - 3.0 * cy * self.m02 + 2.0 * cy * cy * self.m01;

        let s2 = self.m00 * self.m00;
        let s3 = s2 * self.m00.sqrt();
        let (n20, n11, n02) = (mu20 / s2, mu11 / s2, mu02 / s2);
        let (n30, n21, n12, n03) = (mu30 / s3, mu21 / s3, mu12 / s3, mu03 / s3);

        let t0 = n30 + n12;
        let t1 = n21 + n03;
        let q0 = t0 * t0;
        let q1 = t1 * t1;
        let n4 = 4.0 * n11;
        let s = n20 + n02;
        let d = n20 - n02;

        Some([
            s,
            d * d + n4 * n11,
            (n30 - 3.0 * n12).powi(2) + (3.0 * n21 - n03).powi(2),
            q0 + q1,
            (n30 - 3.0 * n12) * t0 * (q0 - 3.0 * q1) + (3.0 * n21 - n03) * t1 * (3.0 * q0 - q1),
            d * (q0 - q1) + n4 * t0 * t1,
            (3.0 * n21 - n03) * t0 * (q0 - 3.0 * q1) - (n30 - 3.0 * n12) * t1 * (3.0 * q0 - q1),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<[f64; 2]> {
        vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }

    #[test]
    fn test_unit_square_moments() {
        let m = Moments::from_polygon(&rect(0.0, 0.0, 1.0, 1.0));
        assert_relative_eq!(m.m00, 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.m10, 0.5, epsilon = 1e-12);
        assert_relative_eq!(m.m01, 0.5, epsilon = 1e-12);
        assert_relative_eq!(m.m20, 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.m11, 0.25, epsilon = 1e-12);
        assert_relative_eq!(m.m02, 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.m30, 0.25, epsilon = 1e-12);
        assert_relative_eq!(m.m03, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_winding_does_not_change_sign() {
        let mut pts = rect(2.0, 3.0, 12.0, 8.0);
        let forward = Moments::from_polygon(&pts);
        pts.reverse();
        let backward = Moments::from_polygon(&pts);

        assert_relative_eq!(forward.m00, 50.0, epsilon = 1e-9);
        assert_relative_eq!(backward.m00, 50.0, epsilon = 1e-9);
        assert_relative_eq!(forward.m10, backward.m10, epsilon = 1e-9);
    }

    #[test]
    fn test_centroid_of_offset_rectangle() {
        let m = Moments::from_polygon(&rect(20.0, 20.0, 79.0, 79.0));
        assert_relative_eq!(m.area(), 59.0 * 59.0, epsilon = 1e-9);
        let [cx, cy] = m.centroid().expect("non-degenerate");
        assert_relative_eq!(cx, 49.5, epsilon = 1e-9);
        assert_relative_eq!(cy, 49.5, epsilon = 1e-9);
    }

    #[test]
    fn test_central_moments_of_rectangle() {
        // w=10, h=4: mu20 = w^3 h / 12, mu02 = w h^3 / 12, mu11 = 0
        let m = Moments::from_polygon(&rect(5.0, 5.0, 15.0, 9.0));
        let (mu20, mu11, mu02) = m.central_second_order().expect("non-degenerate");
        assert_relative_eq!(mu20, 1000.0 * 4.0 / 12.0, epsilon = 1e-6);
        assert_relative_eq!(mu02, 10.0 * 64.0 / 12.0, epsilon = 1e-6);
        assert_relative_eq!(mu11, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_polygons() {
        assert_eq!(Moments::from_polygon(&[]), Moments::default());
        assert_eq!(Moments::from_polygon(&[[1.0, 1.0], [2.0, 2.0]]), Moments::default());

        let line = Moments::from_polygon(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assert_eq!(line.m00, 0.0);
        assert!(line.centroid().is_none());
    }

    #[test]
    fn test_hu_invariants_are_translation_invariant() {
        let a = Moments::from_polygon(&[[0.0, 0.0], [8.0, 0.0], [3.0, 5.0]])
            .hu_invariants()
            .expect("non-degenerate");
        let b = Moments::from_polygon(&[[40.0, 10.0], [48.0, 10.0], [43.0, 15.0]])
            .hu_invariants()
            .expect("non-degenerate");
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-9, max_relative = 1e-6);
        }
    }
}
