//! Circle constructions and the center-radius normal form.

use super::basic::{dist, midp};
use super::centers::circumcenter;
use crate::backend::Backend;
use crate::point::Point;

type P<B> = Point<<B as Backend>::Scalar>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CirclePred {
    /// `[A, B, C]`: circumcircle of ABC.
    C3,
    /// `[O, A]`: centered at O through A.
    COA,
    /// `[O, X, Y]`: centered at O with radius |XY|.
    Cong,
    /// `[B, C]`: circle with diameter BC.
    Diam,
}

impl CirclePred {
    pub fn arity(self) -> usize {
        match self {
            CirclePred::COA | CirclePred::Diam => 2,
            CirclePred::C3 | CirclePred::Cong => 3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircleNf<S> {
    pub center: Point<S>,
    pub radius: S,
}

/// Center-radius form. `ps.len()` must equal `pred.arity()`.
pub fn circle_nf<B: Backend>(be: &B, pred: CirclePred, ps: &[P<B>]) -> CircleNf<B::Scalar> {
    debug_assert_eq!(ps.len(), pred.arity(), "circle operand count");
    let (center, radius) = match pred {
        CirclePred::C3 => {
            let o = circumcenter(be, &ps[0], &ps[1], &ps[2]);
            let r = dist(be, &o, &ps[0]);
            (o, r)
        }
        CirclePred::COA => (ps[0].clone(), dist(be, &ps[0], &ps[1])),
        CirclePred::Cong => (ps[0].clone(), dist(be, &ps[1], &ps[2])),
        CirclePred::Diam => {
            let o = midp(&ps[0], &ps[1]);
            let r = dist(be, &o, &ps[0]);
            (o, r)
        }
    };
    CircleNf { center, radius }
}
