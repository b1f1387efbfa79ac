//! Bernstein-basis kernels shared by the Bézier curve families.
//!
//! Everything here works on raw coordinate vectors so the same code serves
//! points, derivative vectors and (as one-dimensional vectors) weights. All
//! interpolation goes through [`interpolate_scalar`], which makes evaluation
//! at `t = 0` and `t = 1` return the literal first and last control point.

use nalgebra::SVector;

use crate::geometry::quantity::interpolate_scalar;
use crate::geometry::{Interval, Length, Point, Vector, VectorBox};

pub(crate) type Coords<const D: usize> = SVector<f64, D>;

pub(crate) fn lerp<const D: usize>(a: &Coords<D>, b: &Coords<D>, t: f64) -> Coords<D> {
    Coords::from_fn(|i, _| interpolate_scalar(a[i], b[i], t))
}

/// Evaluate a Bézier polynomial by repeated linear interpolation.
pub(crate) fn de_casteljau<const D: usize>(points: &[Coords<D>], t: f64) -> Coords<D> {
    let mut work = points.to_vec();
    let n = work.len();
    for level in 1..n {
        for i in 0..n - level {
            work[i] = lerp(&work[i], &work[i + 1], t);
        }
    }
    work.first().copied().unwrap_or_else(Coords::zeros)
}

/// Split at `t` into the control polygons of `[0, t]` and `[t, 1]`.
pub(crate) fn split<const D: usize>(
    points: &[Coords<D>],
    t: f64,
) -> (Vec<Coords<D>>, Vec<Coords<D>>) {
    let n = points.len();
    let mut work = points.to_vec();
    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    if n == 0 {
        return (left, right);
    }
    left.push(work[0]);
    right.push(work[n - 1]);
    for level in 1..n {
        for i in 0..n - level {
            work[i] = lerp(&work[i], &work[i + 1], t);
        }
        left.push(work[0]);
        right.push(work[n - 1 - level]);
    }
    right.reverse();
    (left, right)
}

/// Polar form: de Casteljau with a different parameter at each level.
pub(crate) fn blossom<const D: usize>(points: &[Coords<D>], args: &[f64]) -> Coords<D> {
    let mut work = points.to_vec();
    let n = work.len();
    for (level, &u) in (1..n).zip(args) {
        for i in 0..n - level {
            work[i] = lerp(&work[i], &work[i + 1], u);
        }
    }
    work.first().copied().unwrap_or_else(Coords::zeros)
}

/// Blossom arguments for control point `j` of the restriction to `domain`.
fn restriction_args(degree: usize, j: usize, domain: &Interval) -> Vec<f64> {
    let mut args = vec![domain.min(); degree - j];
    args.extend(std::iter::repeat(domain.max()).take(j));
    args
}

/// Control points of the same polynomial re-parameterized over `domain`.
pub(crate) fn restrict<const D: usize>(points: &[Coords<D>], domain: &Interval) -> Vec<Coords<D>> {
    let degree = points.len().saturating_sub(1);
    (0..points.len())
        .map(|j| blossom(points, &restriction_args(degree, j, domain)))
        .collect()
}

/// Control points of the derivative polynomial.
pub(crate) fn hodograph<const D: usize>(points: &[Coords<D>]) -> Vec<Coords<D>> {
    let degree = points.len().saturating_sub(1);
    if degree == 0 {
        return vec![Coords::zeros()];
    }
    let scale = degree as f64;
    points.windows(2).map(|w| (w[1] - w[0]) * scale).collect()
}

pub(crate) fn derivative_control_points<const D: usize>(
    points: &[Coords<D>],
    order: usize,
) -> Vec<Coords<D>> {
    let mut current = points.to_vec();
    for _ in 0..order {
        current = hodograph(&current);
    }
    current
}

pub(crate) fn derivative<const D: usize>(points: &[Coords<D>], order: usize, t: f64) -> Coords<D> {
    de_casteljau(&derivative_control_points(points, order), t)
}

/// Box containing the `order`-th derivative over `domain`: the hull of the
/// restricted derivative control points.
pub(crate) fn derivative_box<C, const D: usize>(
    points: &[Coords<D>],
    order: usize,
    domain: &Interval,
) -> VectorBox<C, D> {
    let control = derivative_control_points(points, order);
    VectorBox::hull_of(restrict(&control, domain)).unwrap_or_else(VectorBox::zero)
}

/// Scalar polynomial variant of [`derivative_box`].
pub(crate) fn scalar_derivative_interval(values: &[f64], order: usize, domain: &Interval) -> Interval {
    let points = as_scalars(values);
    derivative_box::<(), 1>(&points, order, domain).component(0)
}

pub(crate) fn polygon_length<const D: usize>(points: &[Coords<D>]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

fn as_scalars(values: &[f64]) -> Vec<Coords<1>> {
    values.iter().map(|&v| Coords::<1>::new(v)).collect()
}

pub(crate) fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

// ── Rational (weighted) variants ───────────────────────────────────────────
//
// Control points stay in Cartesian form and interpolation uses the weight
// ratio, which keeps endpoint evaluation exact and splits weights and points
// consistently.

pub(crate) fn rational_lerp<const D: usize>(
    (p0, w0): (&Coords<D>, f64),
    (p1, w1): (&Coords<D>, f64),
    t: f64,
) -> (Coords<D>, f64) {
    let w = interpolate_scalar(w0, w1, t);
    let s = if w == 0.0 { t } else { t * w1 / w };
    (lerp(p0, p1, s), w)
}

fn rational_level<const D: usize>(points: &mut [Coords<D>], weights: &mut [f64], count: usize, t: f64) {
    for i in 0..count {
        let (p, w) = rational_lerp((&points[i], weights[i]), (&points[i + 1], weights[i + 1]), t);
        points[i] = p;
        weights[i] = w;
    }
}

pub(crate) fn rational_de_casteljau<const D: usize>(
    points: &[Coords<D>],
    weights: &[f64],
    t: f64,
) -> Coords<D> {
    rational_blossom_with(points, weights, |_| t).0
}

pub(crate) fn rational_blossom<const D: usize>(
    points: &[Coords<D>],
    weights: &[f64],
    args: &[f64],
) -> (Coords<D>, f64) {
    rational_blossom_with(points, weights, |level| args.get(level - 1).copied().unwrap_or(0.0))
}

fn rational_blossom_with<const D: usize>(
    points: &[Coords<D>],
    weights: &[f64],
    arg: impl Fn(usize) -> f64,
) -> (Coords<D>, f64) {
    let mut work = points.to_vec();
    let mut w = weights.to_vec();
    let n = work.len().min(w.len());
    for level in 1..n {
        rational_level(&mut work, &mut w, n - level, arg(level));
    }
    match (work.first(), w.first()) {
        (Some(p), Some(&weight)) => (*p, weight),
        _ => (Coords::zeros(), 1.0),
    }
}

pub(crate) type Weighted<const D: usize> = (Vec<Coords<D>>, Vec<f64>);

pub(crate) fn rational_split<const D: usize>(
    points: &[Coords<D>],
    weights: &[f64],
    t: f64,
) -> (Weighted<D>, Weighted<D>) {
    let n = points.len().min(weights.len());
    let mut work = points[..n].to_vec();
    let mut w = weights[..n].to_vec();
    let mut left = (Vec::with_capacity(n), Vec::with_capacity(n));
    let mut right = (Vec::with_capacity(n), Vec::with_capacity(n));
    if n == 0 {
        return (left, right);
    }
    left.0.push(work[0]);
    left.1.push(w[0]);
    right.0.push(work[n - 1]);
    right.1.push(w[n - 1]);
    for level in 1..n {
        rational_level(&mut work, &mut w, n - level, t);
        left.0.push(work[0]);
        left.1.push(w[0]);
        right.0.push(work[n - 1 - level]);
        right.1.push(w[n - 1 - level]);
    }
    right.0.reverse();
    right.1.reverse();
    (left, right)
}

pub(crate) fn rational_restrict<const D: usize>(
    points: &[Coords<D>],
    weights: &[f64],
    domain: &Interval,
) -> Weighted<D> {
    let degree = points.len().saturating_sub(1);
    (0..points.len())
        .map(|j| rational_blossom(points, weights, &restriction_args(degree, j, domain)))
        .unzip()
}

fn homogeneous<const D: usize>(points: &[Coords<D>], weights: &[f64]) -> Vec<Coords<D>> {
    points.iter().zip(weights).map(|(p, &w)| p * w).collect()
}

/// Position and derivatives up to `order` by the quotient rule recurrence
/// `P(k) = (N(k) - sum_i C(k, i) W(i) P(k - i)) / W`.
pub(crate) fn rational_derivatives<const D: usize>(
    points: &[Coords<D>],
    weights: &[f64],
    order: usize,
    t: f64,
) -> Vec<Coords<D>> {
    let numerator = homogeneous(points, weights);
    let scalars = as_scalars(weights);
    let w: Vec<f64> = (0..=order).map(|i| derivative(&scalars, i, t)[0]).collect();
    let mut result = Vec::with_capacity(order + 1);
    result.push(rational_de_casteljau(points, weights, t));
    for k in 1..=order {
        let mut acc = derivative(&numerator, k, t);
        for i in 1..=k {
            acc -= result[k - i] * (binomial(k, i) * w[i]);
        }
        result.push(acc / w[0]);
    }
    result
}

/// Interval version of [`rational_derivatives`], for positive weights.
pub(crate) fn rational_derivative_box<C, const D: usize>(
    points: &[Coords<D>],
    weights: &[f64],
    order: usize,
    domain: &Interval,
) -> VectorBox<C, D> {
    let (restricted, _) = rational_restrict(points, weights, domain);
    let mut boxes: Vec<VectorBox<C, D>> =
        vec![VectorBox::hull_of(restricted).unwrap_or_else(VectorBox::zero)];
    let numerator = homogeneous(points, weights);
    let w: Vec<Interval> = (0..=order)
        .map(|i| scalar_derivative_interval(weights, i, domain))
        .collect();
    for k in 1..=order {
        let mut acc = derivative_box::<C, D>(&numerator, k, domain);
        for i in 1..=k {
            acc = acc - boxes[k - i] * (w[i] * binomial(k, i));
        }
        boxes.push(acc.div_positive(&w[0]));
    }
    boxes.pop().unwrap_or_else(VectorBox::zero)
}

// ── Point-level wrappers used by the polynomial families ───────────────────

pub(crate) fn coords_of<C, const D: usize>(points: &[Point<C, D>]) -> Vec<Coords<D>> {
    points.iter().map(|p| *p.coords()).collect()
}

/// Rebuild a fixed-size control polygon. `coords` must hold at least `N` entries.
pub(crate) fn points_from<C, const D: usize, const N: usize>(coords: &[Coords<D>]) -> [Point<C, D>; N] {
    std::array::from_fn(|i| Point::from_coords(coords[i]))
}

pub(crate) fn point_on<C, const D: usize>(points: &[Point<C, D>], t: f64) -> Point<C, D> {
    Point::from_coords(de_casteljau(&coords_of(points), t))
}

pub(crate) fn nth_derivative<C, const D: usize>(points: &[Point<C, D>], n: usize, t: f64) -> Vector<C, D> {
    Vector::from_components(derivative(&coords_of(points), n, t))
}

pub(crate) fn bounding_derivative<C, const D: usize>(
    points: &[Point<C, D>],
    order: usize,
    domain: &Interval,
) -> VectorBox<C, D> {
    derivative_box(&coords_of(points), order, domain)
}

/// Control polygon length of the restriction to `domain`, an upper bound on
/// the arc length over that domain.
pub(crate) fn length_bound<C, const D: usize>(points: &[Point<C, D>], domain: &Interval) -> Length {
    Length::meters(polygon_length(&restrict(&coords_of(points), domain)))
}

/// The shared point, if every control point is exactly equal.
pub(crate) fn coincident_point<C, const D: usize>(points: &[Point<C, D>]) -> Option<Point<C, D>> {
    let first = *points.first()?;
    points.iter().all(|p| *p == first).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(values: &[(f64, f64)]) -> Vec<Coords<2>> {
        values.iter().map(|&(x, y)| Coords::<2>::new(x, y)).collect()
    }

    #[test]
    fn test_de_casteljau_endpoints_exact() {
        let p = pts(&[(0.1, 0.3), (0.7, -2.2), (1.9, 0.4), (3.3, 1.7)]);
        assert_eq!(de_casteljau(&p, 0.0), p[0]);
        assert_eq!(de_casteljau(&p, 1.0), p[3]);
    }

    #[test]
    fn test_quadratic_midpoint() {
        let p = pts(&[(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);
        assert_eq!(de_casteljau(&p, 0.5), Coords::<2>::new(1.0, 1.0));
    }

    #[test]
    fn test_hodograph_of_quadratic() {
        let p = pts(&[(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);
        let h = hodograph(&p);
        assert_eq!(h, pts(&[(2.0, 4.0), (2.0, -4.0)]));
        assert_eq!(derivative(&p, 2, 0.3), Coords::<2>::new(0.0, -8.0));
        assert_eq!(derivative(&p, 3, 0.3), Coords::<2>::zeros());
    }

    #[test]
    fn test_split_matches_evaluation() {
        let p = pts(&[(0.0, 0.0), (1.0, 3.0), (4.0, 3.0), (5.0, 0.0)]);
        let (left, right) = split(&p, 0.3);
        assert_eq!(left[0], p[0]);
        assert_eq!(right[3], p[3]);
        assert_eq!(left[3], right[0]);
        for k in 0..=10 {
            let t = k as f64 / 10.0;
            let a = de_casteljau(&left, t);
            let b = de_casteljau(&p, 0.3 * t);
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_restrict_to_unit_is_identity() {
        let p = pts(&[(0.1, 0.2), (0.3, 0.9), (1.7, -0.4)]);
        assert_eq!(restrict(&p, &Interval::unit()), p);
    }

    #[test]
    fn test_derivative_box_contains_samples() {
        let p = pts(&[(0.0, 0.0), (1.0, 3.0), (4.0, -3.0), (5.0, 1.0)]);
        let domain = Interval::new(0.2, 0.6);
        let b: VectorBox<(), 2> = derivative_box(&p, 1, &domain);
        for k in 0..=20 {
            let t = domain.interpolate(k as f64 / 20.0);
            let d = derivative(&p, 1, t);
            assert!(b.component(0).min() - 1e-12 <= d[0] && d[0] <= b.component(0).max() + 1e-12);
            assert!(b.component(1).min() - 1e-12 <= d[1] && d[1] <= b.component(1).max() + 1e-12);
        }
    }

    #[test]
    fn test_rational_unit_weights_match_polynomial() {
        let p = pts(&[(0.0, 0.0), (1.0, 3.0), (4.0, -3.0), (5.0, 1.0)]);
        let w = [1.0; 4];
        for k in 0..=8 {
            let t = k as f64 / 8.0;
            let rational = rational_derivatives(&p, &w, 2, t);
            assert!((rational[0] - de_casteljau(&p, t)).norm() < 1e-12);
            assert!((rational[1] - derivative(&p, 1, t)).norm() < 1e-10);
            assert!((rational[2] - derivative(&p, 2, t)).norm() < 1e-9);
        }
    }

    #[test]
    fn test_rational_quarter_circle() {
        // Quadratic rational arc from (1, 0) to (0, 1) with middle weight 1/sqrt(2).
        let p = pts(&[(1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let w = [1.0, std::f64::consts::FRAC_1_SQRT_2, 1.0];
        for k in 0..=10 {
            let point = rational_de_casteljau(&p, &w, k as f64 / 10.0);
            assert!((point.norm() - 1.0).abs() < 1e-12);
        }
        assert_eq!(rational_de_casteljau(&p, &w, 1.0), p[2]);
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(4, 0), 1.0);
        assert_eq!(binomial(4, 2), 6.0);
        assert_eq!(binomial(5, 5), 1.0);
    }
}
