//! Triangle centers via trilinear and barycentric coordinates.
//!
//! Conventions: `a, b, c` are the side lengths opposite `A, B, C`;
//! Conway values `Sa = (b² + c² − a²)/2` and cyclic.

use super::basic::side_lengths;
use crate::backend::{Backend, Scalar};
use crate::point::Point;

type P<B> = Point<<B as Backend>::Scalar>;

pub fn conway_vals<B: Backend>(
    be: &B,
    a: &P<B>,
    b: &P<B>,
    c: &P<B>,
) -> (B::Scalar, B::Scalar, B::Scalar) {
    let (la, lb, lc) = side_lengths(be, a, b, c);
    let (a2, b2, c2) = (la.sq(), lb.sq(), lc.sq());
    (
        (b2.clone() + c2.clone() - a2.clone()) / 2.0,
        (c2.clone() + a2.clone() - b2.clone()) / 2.0,
        (a2 + b2 - c2) / 2.0,
    )
}

/// Cartesian point with trilinear coordinates `x : y : z` relative to `ABC`.
pub fn trilinear<B: Backend>(
    be: &B,
    a: &P<B>,
    b: &P<B>,
    c: &P<B>,
    x: B::Scalar,
    y: B::Scalar,
    z: B::Scalar,
) -> P<B> {
    let (la, lb, lc) = side_lengths(be, a, b, c);
    let (wa, wb, wc) = (la * x, lb * y, lc * z);
    let denom = wa.clone() + wb.clone() + wc.clone();
    Point::new(
        (wa.clone() * a.x.clone() + wb.clone() * b.x.clone() + wc.clone() * c.x.clone())
            / denom.clone(),
        (wa * a.y.clone() + wb * b.y.clone() + wc * c.y.clone()) / denom,
    )
}

/// Cartesian point with barycentric coordinates `x : y : z` relative to `ABC`.
pub fn barycentric<B: Backend>(
    be: &B,
    a: &P<B>,
    b: &P<B>,
    c: &P<B>,
    x: B::Scalar,
    y: B::Scalar,
    z: B::Scalar,
) -> P<B> {
    let (la, lb, lc) = side_lengths(be, a, b, c);
    trilinear(be, a, b, c, x / la, y / lb, z / lc)
}

/// Barycentrics `a²Sa : b²Sb : c²Sc`.
pub fn circumcenter<B: Backend>(be: &B, a: &P<B>, b: &P<B>, c: &P<B>) -> P<B> {
    let (la, lb, lc) = side_lengths(be, a, b, c);
    let (sa, sb, sc) = conway_vals(be, a, b, c);
    barycentric(be, a, b, c, la.sq() * sa, lb.sq() * sb, lc.sq() * sc)
}

/// Barycentrics `SbSc : ScSa : SaSb`.
pub fn orthocenter<B: Backend>(be: &B, a: &P<B>, b: &P<B>, c: &P<B>) -> P<B> {
    let (sa, sb, sc) = conway_vals(be, a, b, c);
    barycentric(be, a, b, c, sb.clone() * sc.clone(), sc * sa.clone(), sa * sb)
}

pub fn centroid<B: Backend>(be: &B, a: &P<B>, b: &P<B>, c: &P<B>) -> P<B> {
    let one = || be.constant(1.0);
    barycentric(be, a, b, c, one(), one(), one())
}

pub fn incenter<B: Backend>(be: &B, a: &P<B>, b: &P<B>, c: &P<B>) -> P<B> {
    let one = || be.constant(1.0);
    trilinear(be, a, b, c, one(), one(), one())
}
