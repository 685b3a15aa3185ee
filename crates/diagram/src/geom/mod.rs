//! Computational geometry over backend scalars.
//!
//! Every function is pure and generic over the `Backend`; the backend supplies
//! the elementary functions, so the same formula yields a float or a
//! differentiable expression.
//!
//! - `basic`: distances, rotations, side lengths, angles.
//! - `centers`: Conway values, trilinear/barycentric maps, triangle centers.
//! - `lines`: line constructions and the slope-intercept normal form.
//! - `circles`: circle constructions and the center-radius normal form.
//! - `residuals`: predicate residuals that vanish exactly when a predicate holds.

mod basic;
mod centers;
mod circles;
mod lines;
mod residuals;

pub use basic::{
    angle, dist, inner_product, matrix_mul, midp, midp_from, rotate_ccw, rotate_ccw_90,
    rotate_cw_90, rotation_matrix, side_lengths, sqdist,
};
pub use centers::{
    barycentric, centroid, circumcenter, conway_vals, incenter, orthocenter, trilinear,
};
pub use circles::{circle_nf, CircleNf, CirclePred};
pub use lines::{inter_ll, inter_ll_det, line_points, pp2sif, LinePred, SlopeIntercept};
pub use residuals::{between_gap, coll_phi, cong_diff, para_phi, perp_phi, BETWEEN_EPS};
