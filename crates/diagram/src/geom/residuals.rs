//! Predicate residuals: scalars that are zero exactly when a predicate holds.

use super::basic::sqdist;
use crate::backend::{Backend, Scalar};
use crate::point::Point;

/// Inset applied at both ends of a segment by `between_gap`.
pub const BETWEEN_EPS: f64 = 0.2;

/// `(A−B)·(C−D)`: zero iff AB ⟂ CD.
pub fn perp_phi<S: Scalar>(a: &Point<S>, b: &Point<S>, c: &Point<S>, d: &Point<S>) -> S {
    (a.x.clone() - b.x.clone()) * (c.x.clone() - d.x.clone())
        + (a.y.clone() - b.y.clone()) * (c.y.clone() - d.y.clone())
}

/// `(A−B)×(C−D)`: zero iff AB ∥ CD.
pub fn para_phi<S: Scalar>(a: &Point<S>, b: &Point<S>, c: &Point<S>, d: &Point<S>) -> S {
    (a.x.clone() - b.x.clone()) * (c.y.clone() - d.y.clone())
        - (a.y.clone() - b.y.clone()) * (c.x.clone() - d.x.clone())
}

/// `|AB|² − |CD|²`.
pub fn cong_diff<S: Scalar>(a: &Point<S>, b: &Point<S>, c: &Point<S>, d: &Point<S>) -> S {
    sqdist(a, b) - sqdist(c, d)
}

/// Twice the signed area of ABC.
pub fn coll_phi<S: Scalar>(a: &Point<S>, b: &Point<S>, c: &Point<S>) -> S {
    a.x.clone() * (b.y.clone() - c.y.clone())
        + b.x.clone() * (c.y.clone() - a.y.clone())
        + c.x.clone() * (a.y.clone() - b.y.clone())
}

/// Soft betweenness of `x` on segment AB, one term per axis.
///
/// The segment is first shrunk by `BETWEEN_EPS` of its length at each end to
/// `A1B1`; a term is `max(0, (x−A1)(x−B1))` along its axis, positive only when
/// `x` falls outside `[A1, B1]` on that axis. Not an exact test: points near
/// the ends of AB are penalised too.
pub fn between_gap<B: Backend>(
    be: &B,
    x: &Point<B::Scalar>,
    a: &Point<B::Scalar>,
    b: &Point<B::Scalar>,
) -> [B::Scalar; 2] {
    let a1 = a + &(b - a).scale(BETWEEN_EPS);
    let b1 = b + &(a - b).scale(BETWEEN_EPS);
    let zero = be.constant(0.0);
    let gap = |p: B::Scalar, lo: B::Scalar, hi: B::Scalar| {
        be.max(&zero, &((p.clone() - lo) * (p - hi)))
    };
    [gap(x.x.clone(), a1.x, b1.x), gap(x.y.clone(), a1.y, b1.y)]
}
