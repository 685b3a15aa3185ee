//! Line constructions and the slope-intercept normal form.
//!
//! Each `LinePred` reduces to two points on the line; `pp2sif` turns those into
//! `y = m·x + b` while keeping the two points, and `inter_ll` intersects two
//! normal forms.

use super::basic::{angle, dist, midp, rotate_ccw, rotate_ccw_90};
use crate::backend::{Backend, Scalar};
use crate::point::Point;

type P<B> = Point<<B as Backend>::Scalar>;

/// How a line is specified by its operand points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinePred {
    /// `[A, B]`: the line through A and B.
    Connecting,
    /// `[X, A, B]`: through X, parallel to AB.
    ParaAt,
    /// `[X, A, B]`: through X, perpendicular to AB.
    PerpAt,
    /// `[A, B]`: perpendicular bisector of AB.
    Mediator,
    /// `[A, B, C]`: internal bisector of angle ABC.
    IBisector,
    /// `[A, B, C]`: external bisector of angle ABC.
    EBisector,
    /// `[B, C, D, E, F]`: through B, making angle DEF with BC.
    EqOAngle,
}

impl LinePred {
    pub fn from_id(id: &str) -> Option<Self> {
        Some(match id {
            "connecting" => LinePred::Connecting,
            "paraAt" => LinePred::ParaAt,
            "perpAt" => LinePred::PerpAt,
            "mediator" => LinePred::Mediator,
            "ibisector" => LinePred::IBisector,
            "ebisector" => LinePred::EBisector,
            "eqoangle" => LinePred::EqOAngle,
            _ => return None,
        })
    }

    /// Number of operand points.
    pub fn arity(self) -> usize {
        match self {
            LinePred::Connecting | LinePred::Mediator => 2,
            LinePred::ParaAt | LinePred::PerpAt | LinePred::IBisector | LinePred::EBisector => 3,
            LinePred::EqOAngle => 5,
        }
    }
}

/// Normal form `y = m·x + b`, with the two points it was derived from.
///
/// `m` and `b` are infinite for vertical lines; `inter_ll` works from `p1`,
/// `p2` and is unaffected.
#[derive(Clone, Debug)]
pub struct SlopeIntercept<S> {
    pub p1: Point<S>,
    pub p2: Point<S>,
}

impl<S: Scalar> SlopeIntercept<S> {
    /// Direction `p2 − p1`.
    #[inline]
    pub fn direction(&self) -> Point<S> {
        &self.p2 - &self.p1
    }

    /// `m` in `y = m·x + b`.
    pub fn slope(&self) -> S {
        let d = self.direction();
        d.y / d.x
    }

    /// `b` in `y = m·x + b`.
    pub fn intercept(&self) -> S {
        self.p1.y.clone() - self.slope() * self.p1.x.clone()
    }
}

/// Two distinct points on the line. `ps.len()` must equal `pred.arity()`.
pub fn line_points<B: Backend>(be: &B, pred: LinePred, ps: &[P<B>]) -> (P<B>, P<B>) {
    debug_assert_eq!(ps.len(), pred.arity(), "line operand count");
    match pred {
        LinePred::Connecting => (ps[0].clone(), ps[1].clone()),
        LinePred::ParaAt => {
            let (x, a, b) = (&ps[0], &ps[1], &ps[2]);
            (x.clone(), x + &(b - a))
        }
        LinePred::PerpAt => {
            let (x, a, b) = (&ps[0], &ps[1], &ps[2]);
            (x.clone(), x + &rotate_ccw_90(&(a - b)))
        }
        LinePred::Mediator => {
            let m = midp(&ps[0], &ps[1]);
            let n = &m + &rotate_ccw_90(&(&ps[0] - &ps[1]));
            (m, n)
        }
        LinePred::IBisector => bisector_foot(be, &ps[0], &ps[1], &ps[2]),
        LinePred::EBisector => {
            let (b, m) = bisector_foot(be, &ps[0], &ps[1], &ps[2]);
            let y = &b + &rotate_ccw_90(&(&m - &b));
            (b, y)
        }
        LinePred::EqOAngle => {
            let (b, c) = (&ps[0], &ps[1]);
            let theta = angle(be, &ps[2], &ps[3], &ps[4]);
            (b.clone(), b + &rotate_ccw(be, &theta, &(c - b)))
        }
    }
}

/// Vertex `B` and the midpoint of `C` and the point on ray BA at distance |BC|.
fn bisector_foot<B: Backend>(be: &B, a: &P<B>, b: &P<B>, c: &P<B>) -> (P<B>, P<B>) {
    let x = b + &(a - b).smul(dist(be, b, c) / dist(be, b, a));
    (b.clone(), midp(&x, c))
}

/// Normal form of the line through `p1` and `p2`; slope and intercept are
/// derived on demand.
pub fn pp2sif<S: Scalar>(p1: Point<S>, p2: Point<S>) -> SlopeIntercept<S> {
    SlopeIntercept { p1, p2 }
}

/// Cross product of the two directions; zero iff the lines are parallel.
#[inline]
pub fn inter_ll_det<S: Scalar>(l1: &SlopeIntercept<S>, l2: &SlopeIntercept<S>) -> S {
    let (d1, d2) = (l1.direction(), l2.direction());
    d1.x.clone() * d2.y.clone() - d1.y * d2.x
}

/// Intersection of two lines.
///
/// Solved from the defining points (`p1 + t·d1`), which agrees with the
/// slope-intercept solution `x = (b2 − b1)/(m1 − m2)` whenever both slopes are
/// finite. Parallel lines divide by zero; callers check `inter_ll_det` first.
pub fn inter_ll<S: Scalar>(l1: &SlopeIntercept<S>, l2: &SlopeIntercept<S>) -> Point<S> {
    let d1 = l1.direction();
    let d2 = l2.direction();
    let w = &l2.p1 - &l1.p1;
    let t = (w.x * d2.y.clone() - w.y * d2.x.clone()) / inter_ll_det(l1, l2);
    &l1.p1 + &d1.smul(t)
}
