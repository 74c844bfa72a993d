//! Ellipse fitting for contour point sets.
//!
//! [`DirectEllipseFitter`] implements the direct least-squares conic fit of
//! Fitzgibbon et al. (1999), which always yields an ellipse when the points
//! admit one. [`MomentEllipseFitter`] builds the ellipse sharing the
//! contour's second central moments and works for any polygon with area.

use nalgebra::{DMatrix, Matrix3, Vector3};
use crate::{
    algorithms::Moments,
    error::{FeatureError, Result},
    traits::EllipseFitter,
    types::{EllipseMethod, FittedEllipse},
};

/// Minimum number of points a conic fit needs
pub const MIN_FIT_POINTS: usize = 5;

/// Direct least-squares ellipse fit, optionally falling back to the moment
/// ellipse when the point set is too small or degenerate
#[derive(Debug, Clone)]
pub struct DirectEllipseFitter {
    pub fallback_to_moments: bool,
}

impl Default for DirectEllipseFitter {
    fn default() -> Self {
        Self { fallback_to_moments: true }
    }
}

impl EllipseFitter for DirectEllipseFitter {
    fn fit(&self, points: &[[f64; 2]], moments: &Moments) -> Option<FittedEllipse> {
        match fit_ellipse_direct(points) {
            Ok(ellipse) => Some(ellipse),
            Err(err) if self.fallback_to_moments => {
                tracing::trace!(%err, points = points.len(), "direct fit failed, using moment ellipse");
                MomentEllipseFitter.fit(points, moments)
            }
            Err(err) => {
                tracing::trace!(%err, points = points.len(), "direct fit failed");
                None
            }
        }
    }
}

/// Ellipse with the same area-normalised second moments as the contour
#[derive(Debug, Clone, Default)]
pub struct MomentEllipseFitter;

impl EllipseFitter for MomentEllipseFitter {
    fn fit(&self, _points: &[[f64; 2]], moments: &Moments) -> Option<FittedEllipse> {
        moment_ellipse(moments)
    }
}

/// For a filled ellipse with semi-axes a, b the normalised second moments
/// are a²/4 and b²/4, so each full axis is 4·sqrt(eigenvalue).
pub fn moment_ellipse(moments: &Moments) -> Option<FittedEllipse> {
    if moments.m00 <= 0.0 {
        return None;
    }
    let center = moments.centroid()?;
    let (mu20, mu11, mu02) = moments.central_second_order()?;
    let (a, b, c) = (mu20 / moments.m00, mu11 / moments.m00, mu02 / moments.m00);

    let half_sum = (a + c) / 2.0;
    let root = (((a - c) / 2.0).powi(2) + b * b).sqrt();
    let l1 = half_sum + root;
    let l2 = (half_sum - root).max(0.0);
    if !(l1 > 0.0) {
        return None;
    }

    let angle = 0.5 * (2.0 * b).atan2(a - c);
    let ellipse = FittedEllipse::from_axes(
        center,
        4.0 * l1.sqrt(),
        4.0 * l2.sqrt(),
        angle,
        EllipseMethod::Moments,
    );
    ellipse.is_valid().then_some(ellipse)
}

/// Direct least-squares fit (Fitzgibbon). Needs at least five points that
/// are not all on one line.
pub fn fit_ellipse_direct(points: &[[f64; 2]]) -> Result<FittedEllipse> {
    let n = points.len();
    if n < MIN_FIT_POINTS {
        return Err(FeatureError::EllipseFit(format!(
            "need at least {MIN_FIT_POINTS} points, got {n}"
        )));
    }

    // Centre on the mean and scale so the mean radius is sqrt(2)
    let inv = 1.0 / n as f64;
    let mx = points.iter().map(|p| p[0]).sum::<f64>() * inv;
    let my = points.iter().map(|p| p[1]).sum::<f64>() * inv;
    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - mx).powi(2) + (p[1] - my).powi(2)).sqrt())
        .sum::<f64>()
        * inv;
    let scale = if mean_dist > 1e-12 { std::f64::consts::SQRT_2 / mean_dist } else { 1.0 };

    let mut design = DMatrix::<f64>::zeros(n, 6);
    for (i, &[px, py]) in points.iter().enumerate() {
        let x = (px - mx) * scale;
        let y = (py - my) * scale;
        design[(i, 0)] = x * x;
        design[(i, 1)] = x * y;
        design[(i, 2)] = y * y;
        design[(i, 3)] = x;
        design[(i, 4)] = y;
        design[(i, 5)] = 1.0;
    }

    let scatter = design.transpose() * &design;
    let s1: Matrix3<f64> = scatter.fixed_view::<3, 3>(0, 0).into_owned();
    let s2: Matrix3<f64> = scatter.fixed_view::<3, 3>(0, 3).into_owned();
    let s3: Matrix3<f64> = scatter.fixed_view::<3, 3>(3, 3).into_owned();

    let singular = || FeatureError::EllipseFit("points are collinear or coincident".into());
    let s3_inv = s3.try_inverse().ok_or_else(singular)?;
    let reduced = s1 - s2 * s3_inv * s2.transpose();

    // Inverse of the constraint matrix [[0,0,2],[0,-1,0],[2,0,0]]
    let c1_inv = Matrix3::new(0.0, 0.0, 0.5, 0.0, -1.0, 0.0, 0.5, 0.0, 0.0);
    let system = c1_inv * reduced;

    let quadratic = constrained_eigenvector(&system)
        .ok_or_else(|| FeatureError::EllipseFit("no eigenvector satisfies the ellipse constraint".into()))?;
    let linear = -(s3_inv * s2.transpose() * quadratic);

    let coeffs = denormalize([quadratic[0], quadratic[1], quadratic[2], linear[0], linear[1], linear[2]], mx, my, scale);

    conic_to_ellipse(coeffs)
        .ok_or_else(|| FeatureError::EllipseFit("fitted conic is not a proper ellipse".into()))
}

/// Eigenvector of the 3x3 system satisfying 4ac - b² > 0, taking the
/// smallest eigenvalue magnitude when several qualify.
fn constrained_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let tr = system.trace();
    let minors = system[(0, 0)] * system[(1, 1)] - system[(0, 1)] * system[(1, 0)]
        + system[(0, 0)] * system[(2, 2)] - system[(0, 2)] * system[(2, 0)]
        + system[(1, 1)] * system[(2, 2)] - system[(1, 2)] * system[(2, 1)];
    let det = system.determinant();

    let mut best: Option<(f64, Vector3<f64>)> = None;
    for lambda in real_cubic_roots(-tr, minors, -det) {
        let shifted = system - Matrix3::identity() * lambda;
        let Some(v) = null_vector(&shifted) else { continue };
        if 4.0 * v[0] * v[2] - v[1] * v[1] <= 0.0 {
            continue;
        }
        if best.as_ref().is_none_or(|(l, _)| lambda.abs() < *l) {
            best = Some((lambda.abs(), v));
        }
    }
    best.map(|(_, v)| v)
}

/// Largest-norm row of the adjugate; proportional to the null vector of a
/// rank-2 matrix
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let r0 = Vector3::new(m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let r1 = Vector3::new(m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    let r2 = Vector3::new(m[(2, 0)], m[(2, 1)], m[(2, 2)]);

    [r1.cross(&r2), r2.cross(&r0), r0.cross(&r1)]
        .into_iter()
        .map(|v| (v.norm_squared(), v))
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .filter(|(norm_sq, _)| *norm_sq > 1e-30)
        .map(|(norm_sq, v)| v / norm_sq.sqrt())
}

/// Real roots of x³ + b x² + c x + d
fn real_cubic_roots(b: f64, c: f64, d: f64) -> Vec<f64> {
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;
    let disc = -4.0 * p * p * p - 27.0 * q * q;

    if disc >= 0.0 {
        let r = (-p / 3.0).max(0.0).sqrt();
        let cos_arg = if r < 1e-15 { 0.0 } else { (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0) };
        let theta = cos_arg.acos();
        (0..3)
            .map(|k| 2.0 * r * ((theta + std::f64::consts::TAU * k as f64) / 3.0).cos() + shift)
            .collect()
    } else {
        let sq = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        vec![(-q / 2.0 + sq).cbrt() + (-q / 2.0 - sq).cbrt() + shift]
    }
}

/// Undo x' = s(x - mx), y' = s(y - my) on conic coefficients
fn denormalize(c: [f64; 6], mx: f64, my: f64, s: f64) -> [f64; 6] {
    let [a, b, cc, d, e, f] = c;
    let s2 = s * s;
    [
        a * s2,
        b * s2,
        cc * s2,
        -2.0 * a * s2 * mx - b * s2 * my + d * s,
        -b * s2 * mx - 2.0 * cc * s2 * my + e * s,
        a * s2 * mx * mx + b * s2 * mx * my + cc * s2 * my * my - d * s * mx - e * s * my + f,
    ]
}

/// Geometric parameters of A x² + B xy + C y² + D x + E y + F = 0
fn conic_to_ellipse([a, b, c, d, e, f]: [f64; 6]) -> Option<FittedEllipse> {
    let denom = 4.0 * a * c - b * b;
    if denom <= 0.0 {
        return None;
    }

    let cx = (b * e - 2.0 * c * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;
    let f_center = a * cx * cx + b * cx * cy + c * cy * cy + d * cx + e * cy + f;
    if f_center.abs() < 1e-300 {
        return None;
    }

    // Eigenvalues of [[A, B/2], [B/2, C]]; lambda1 belongs to direction `angle`
    let half_sum = (a + c) / 2.0;
    let root = (((a - c) / 2.0).powi(2) + b * b / 4.0).sqrt();
    let lambda1 = half_sum + root;
    let lambda2 = half_sum - root;
    let angle = 0.5 * b.atan2(a - c);

    let semi1_sq = -f_center / lambda1;
    let semi2_sq = -f_center / lambda2;
    if !(semi1_sq > 0.0 && semi2_sq > 0.0) {
        return None;
    }

    let ellipse = FittedEllipse::from_axes(
        [cx, cy],
        2.0 * semi1_sq.sqrt(),
        2.0 * semi2_sq.sqrt(),
        angle,
        EllipseMethod::Direct,
    );
    ellipse.is_valid().then_some(ellipse)
}
