use crate::backend::{Backend, Scalar};
use crate::point::Point;

type P<B> = Point<<B as Backend>::Scalar>;

#[inline]
pub fn midp<S: Scalar>(a: &Point<S>, b: &Point<S>) -> Point<S> {
    (a + b).scale(0.5)
}

/// Other endpoint of a segment with endpoint `a` and midpoint `m`.
#[inline]
pub fn midp_from<S: Scalar>(m: &Point<S>, a: &Point<S>) -> Point<S> {
    a + &(m - a).scale(2.0)
}

#[inline]
pub fn sqdist<S: Scalar>(a: &Point<S>, b: &Point<S>) -> S {
    (a.x.clone() - b.x.clone()).sq() + (a.y.clone() - b.y.clone()).sq()
}

#[inline]
pub fn dist<B: Backend>(be: &B, a: &P<B>, b: &P<B>) -> B::Scalar {
    be.sqrt(&sqdist(a, b))
}

/// Dot product of two points read as vectors.
#[inline]
pub fn inner_product<S: Scalar>(a: &Point<S>, b: &Point<S>) -> S {
    a.x.clone() * b.x.clone() + a.y.clone() * b.y.clone()
}

/// 2×2 matrix given by its rows, applied to `p`.
#[inline]
pub fn matrix_mul<S: Scalar>(rows: &(Point<S>, Point<S>), p: &Point<S>) -> Point<S> {
    Point::new(inner_product(&rows.0, p), inner_product(&rows.1, p))
}

/// Rows of the counterclockwise rotation by `theta`.
pub fn rotation_matrix<B: Backend>(be: &B, theta: &B::Scalar) -> (P<B>, P<B>) {
    let (c, s) = (be.cos(theta), be.sin(theta));
    (Point::new(c.clone(), -s.clone()), Point::new(s, c))
}

#[inline]
pub fn rotate_ccw<B: Backend>(be: &B, theta: &B::Scalar, p: &P<B>) -> P<B> {
    matrix_mul(&rotation_matrix(be, theta), p)
}

#[inline]
pub fn rotate_cw_90<S: Scalar>(p: &Point<S>) -> Point<S> {
    Point::new(p.y.clone(), -p.x.clone())
}

#[inline]
pub fn rotate_ccw_90<S: Scalar>(p: &Point<S>) -> Point<S> {
    Point::new(-p.y.clone(), p.x.clone())
}

/// `(|BC|, |CA|, |AB|)`, the sides opposite `A`, `B`, `C`.
pub fn side_lengths<B: Backend>(
    be: &B,
    a: &P<B>,
    b: &P<B>,
    c: &P<B>,
) -> (B::Scalar, B::Scalar, B::Scalar) {
    (dist(be, b, c), dist(be, c, a), dist(be, a, b))
}

/// Angle `ABC` at vertex `b`, in `[0, π]`, by the law of cosines.
///
/// The cosine is saturated into `[-1, 1]` before `acos`, so rounding on
/// nearly flat triangles yields `0` or `π` instead of NaN. A zero-length side
/// still divides by zero.
pub fn angle<B: Backend>(be: &B, a: &P<B>, b: &P<B>, c: &P<B>) -> B::Scalar {
    let (la, lb, lc) = side_lengths(be, a, b, c);
    let cos = (la.sq() + lc.sq() - lb.sq()) / (la * lc * 2.0);
    be.acos(&clamp_unit(be, cos))
}

#[inline]
fn clamp_unit<B: Backend>(be: &B, x: B::Scalar) -> B::Scalar {
    let lo = be.max(&x, &be.constant(-1.0));
    -be.max(&-lo, &be.constant(-1.0))
}
