//! Initial placements: free points, soft-regular polygons, shaped triangles.
//!
//! Purpose
//! - Sampling creates the trainable variables a diagram starts from. Every
//!   sampler returns its points (aligned with the requested names) and any
//!   shape regularizers as a `Staged` batch; the compiler commits it.
//!
//! Model
//! - The polygon and shaped-triangle samplers fix the gauge: the first edge
//!   (or the base BC) runs from `(-2, 0)` to `(2, 0)`. Remaining freedom is
//!   expressed through squashed variables (`tanh`, `sigmoid`) so initial
//!   values stay in a sensible range without hard bounds.
//!
//! Polygon walk
//! - Interior angle `θᵢ = (n−2)π/n + (π/n)·tanh(0.2·zᵢ)`, side scale
//!   `σᵢ = 0.5·tanh(0.2·sᵢ)`. Vertex `i` is the previous vertex plus the
//!   previous edge reversed, rotated clockwise by `θ_{i−1}`, rescaled to length
//!   `4·(1 + σ_{i−1})`. At `z = s = 0` this is the regular n-gon on the gauge edge.

use std::f64::consts::PI;

use tracing::warn;

use crate::backend::{Backend, Scalar, SimplifyMethod, VarSpec};
use crate::compile::{CompileError, LossTerm, Staged};
use crate::geom::{angle, dist, rotate_ccw};
use crate::point::Point;

type P<B> = Point<<B as Backend>::Scalar>;

/// Length of the fixed gauge edge.
const GAUGE_SIDE: f64 = 4.0;

/// Shape constraints for `sample_triangle`; all unset means "any triangle".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriangleShape {
    /// Apex of an isosceles triangle.
    pub iso: Option<String>,
    /// Vertex carrying the right angle.
    pub right: Option<String>,
    pub acute: bool,
    pub equi: bool,
}

impl TriangleShape {
    #[inline]
    pub fn is_plain(&self) -> bool {
        self.iso.is_none() && self.right.is_none() && !self.acute && !self.equi
    }

    fn vertex(&self) -> Option<&str> {
        self.iso.as_deref().or(self.right.as_deref())
    }
}

/// Free point from two scalars `"{name}x"`, `"{name}y"` with the default hint.
pub fn uniform_point<B: Backend>(be: &mut B, name: &str) -> Result<P<B>, CompileError> {
    let x = be.variable(VarSpec::scalar(&format!("{name}x")))?;
    let y = be.variable(VarSpec::scalar(&format!("{name}y")))?;
    Ok(be.point(x, y))
}

pub fn sample_uniform<B: Backend>(
    be: &mut B,
    names: &[String],
) -> Result<Staged<B::Scalar>, CompileError> {
    let mut out = Staged::default();
    for name in names {
        out.points.push((name.clone(), uniform_point(be, name)?));
    }
    Ok(out)
}

/// Closed polygon through `names` with three shape regularizers.
pub fn sample_polygon<B: Backend>(
    be: &mut B,
    names: &[String],
) -> Result<Staged<B::Scalar>, CompileError> {
    let n = names.len();
    if n < 3 {
        return Err(CompileError::contract(format!(
            "polygon sampling needs at least 3 points, got {n}"
        )));
    }
    if n < 4 {
        warn!(n, "polygon sampling expects more than 3 points");
    }

    let interior = (n as f64 - 2.0) * PI / n as f64;
    let spread = PI / n as f64;
    let mut angles = Vec::with_capacity(n);
    for i in 0..n {
        let name = format!("polygon_angle_z_{i}");
        let z = be.variable(VarSpec::scalar(&name).bounds(-0.5, 0.5))?;
        angles.push(be.tanh(&(z * 0.2)) * spread + interior);
    }
    let mut scales = Vec::with_capacity(n);
    for i in 0..n {
        let name = format!("polygon_scale_z_{i}");
        let s = be.variable(VarSpec::scalar(&name))?;
        scales.push(be.tanh(&(s * 0.2)) * 0.5);
    }
    let be = &*be;

    let mut ps = vec![be.const_point(-2.0, 0.0), be.const_point(2.0, 0.0)];
    for i in 2..=n {
        let (a, b) = (&ps[i - 2], &ps[i - 1]);
        let x = b + &rotate_ccw(be, &-angles[i - 1].clone(), &(a - b));
        let len = (scales[i - 1].clone() + 1.0) * GAUGE_SIDE / dist(be, &x, b);
        let p = b + &(&x - b).smul(len);
        ps.push(be.simplify(p, SimplifyMethod::Trig));
    }

    let angle_sum = be.sum(&angles) - (n as f64 - 2.0) * PI;
    let closure = dist(be, &ps[0], &ps[n]);
    let first = angles[0].clone() - angle(be, &ps[n - 1], &ps[0], &ps[1]);

    Ok(Staged {
        points: names.iter().cloned().zip(ps.into_iter().take(n)).collect(),
        losses: vec![
            ("polygon-angle-sum".to_owned(), LossTerm::new(angle_sum, 0.1)),
            ("polygon-first-eq-last".to_owned(), LossTerm::new(closure, 0.01)),
            (
                "polygon-first-angle-eq-sampled".to_owned(),
                LossTerm::new(first, 0.01),
            ),
        ],
    })
}

/// Triangle `names = [A, B, C]` with optional shape constraints.
///
/// Without constraints this is `sample_polygon`. Otherwise the base is fixed
/// at `B = (-2, 0)`, `C = (2, 0)` and only the apex `A` moves; when the shape
/// vertex is `B` or `C` the roles are swapped so the named vertex is the apex.
pub fn sample_triangle<B: Backend>(
    be: &mut B,
    names: &[String],
    shape: &TriangleShape,
) -> Result<Staged<B::Scalar>, CompileError> {
    if shape.is_plain() {
        return sample_polygon(be, names);
    }
    let [na, nb, nc] = names else {
        return Err(CompileError::contract(format!(
            "triangle sampling needs 3 points, got {}",
            names.len()
        )));
    };
    let apex_role = match shape.vertex() {
        None => 0,
        Some(v) if v == na => 0,
        Some(v) if v == nb => 1,
        Some(v) if v == nc => 2,
        Some(v) => {
            return Err(CompileError::contract(format!(
                "shape vertex `{v}` is not one of {na}, {nb}, {nc}"
            )))
        }
    };

    let b = be.const_point(-2.0, 0.0);
    let c = be.const_point(2.0, 0.0);
    let ax = if shape.iso.is_some() || shape.equi {
        be.constant(0.0)
    } else {
        be.variable(VarSpec::scalar("tri_x").bounds(-1.0, 1.2))?
    };
    let ay = if shape.right.is_some() {
        be.sqrt(&(be.constant(4.0) - ax.sq()))
    } else if shape.equi {
        be.constant(2.0 * 3f64.sqrt())
    } else {
        let floor = if shape.acute { 1.1 } else { 0.4 };
        let z = be.variable(VarSpec::scalar("tri"))?;
        be.sigmoid(&z) * 3.0 + floor
    };
    let a = be.point(ax, ay);

    let (pa, pb, pc) = match apex_role {
        1 => (b, a, c),
        2 => (c, b, a),
        _ => (a, b, c),
    };
    Ok(Staged {
        points: vec![(na.clone(), pa), (nb.clone(), pb), (nc.clone(), pc)],
        losses: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::expr::ExprBackend;
    use crate::backend::float::FloatBackend;
    use crate::backend::VarInit;
    use crate::geom::sqdist;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn polygon_names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("P{i}")).collect()
    }

    fn point<'a, S>(staged: &'a Staged<S>, name: &str) -> &'a Point<S> {
        &staged.points.iter().find(|(n, _)| n == name).unwrap().1
    }

    #[test]
    fn polygon_regularizers_vanish_at_zero_deviation() {
        for n in 3..=8 {
            let mut be = FloatBackend::new(VarInit::Constant(0.0));
            let out = sample_polygon(&mut be, &polygon_names(n)).unwrap();
            assert_eq!(out.points.len(), n);
            assert_eq!(out.losses.len(), 3);
            for (name, term) in &out.losses {
                assert!(term.residual.abs() < 1e-6, "n={n} {name}: {}", term.residual);
            }
            // regular: every side has the gauge length
            for i in 0..n {
                let (p, q) = (&out.points[i].1, &out.points[(i + 1) % n].1);
                assert!((sqdist(p, q).sqrt() - GAUGE_SIDE).abs() < 1e-9);
            }
            assert_eq!(be.variables().len(), 2 * n);
        }
    }

    #[test]
    fn polygon_gauge_and_orientation() {
        let mut be = FloatBackend::seeded(3);
        let out = sample_polygon(&mut be, &polygon_names(5)).unwrap();
        assert_eq!(out.points[0].1, Point::new(-2.0, 0.0));
        assert_eq!(out.points[1].1, Point::new(2.0, 0.0));
        // counterclockwise walk: the third vertex lies above the gauge edge
        assert!(out.points[2].1.y > 0.0);
    }

    #[test]
    fn polygon_expr_matches_float() {
        let mut fb = FloatBackend::new(VarInit::Uniform { seed: 11 });
        let mut eb = ExprBackend::new(VarInit::Uniform { seed: 11 });
        let f = sample_polygon(&mut fb, &polygon_names(6)).unwrap();
        let e = sample_polygon(&mut eb, &polygon_names(6)).unwrap();
        for ((_, p), (_, q)) in f.points.iter().zip(&e.points) {
            assert!((p.value() - q.value()).norm() < 1e-9);
        }
        for ((_, s), (_, t)) in f.losses.iter().zip(&e.losses) {
            assert!((s.value() - t.value()).abs() < 1e-9);
        }
    }

    #[test]
    fn polygon_rejects_fewer_than_three_points() {
        let mut be = FloatBackend::default();
        assert!(matches!(
            sample_polygon(&mut be, &names(&["A", "B"])),
            Err(CompileError::ContractViolation(_))
        ));
        assert!(be.variables().is_empty());
    }

    #[test]
    fn plain_triangle_is_a_polygon() {
        let mut be = FloatBackend::default();
        let shape = TriangleShape::default();
        let out = sample_triangle(&mut be, &names(&["A", "B", "C"]), &shape).unwrap();
        assert_eq!(out.losses.len(), 3);
    }

    #[test]
    fn equilateral_has_equal_sides() {
        let mut be = FloatBackend::default();
        let shape = TriangleShape {
            equi: true,
            ..Default::default()
        };
        let out = sample_triangle(&mut be, &names(&["A", "B", "C"]), &shape).unwrap();
        let [a, b, c] = [&out.points[0].1, &out.points[1].1, &out.points[2].1];
        for d in [sqdist(a, b), sqdist(b, c), sqdist(c, a)] {
            assert!((d - 16.0).abs() < 1e-9);
        }
        assert!(be.variables().is_empty());
    }

    #[test]
    fn isosceles_apex_is_permuted_to_named_vertex() {
        let mut be = FloatBackend::seeded(5);
        let shape = TriangleShape {
            iso: Some("B".into()),
            ..Default::default()
        };
        let out = sample_triangle(&mut be, &names(&["A", "B", "C"]), &shape).unwrap();
        let (a, b, c) = (point(&out, "A"), point(&out, "B"), point(&out, "C"));
        assert_eq!(b.x, 0.0);
        assert!((sqdist(b, a) - sqdist(b, c)).abs() < 1e-12);
        assert_eq!(*a, Point::new(-2.0, 0.0));
    }

    #[test]
    fn isosceles_apex_at_third_vertex() {
        let mut be = FloatBackend::seeded(8);
        let shape = TriangleShape {
            iso: Some("C".into()),
            ..Default::default()
        };
        let out = sample_triangle(&mut be, &names(&["A", "B", "C"]), &shape).unwrap();
        let (a, b, c) = (point(&out, "A"), point(&out, "B"), point(&out, "C"));
        assert_eq!(c.x, 0.0);
        assert!(c.y > 0.0);
        assert!((sqdist(c, a) - sqdist(c, b)).abs() < 1e-12);
        assert_eq!(*a, Point::new(2.0, 0.0));
        assert_eq!(*b, Point::new(-2.0, 0.0));
    }

    #[test]
    fn right_angle_follows_named_vertex() {
        for (vertex, seed) in [("B", 2), ("C", 9)] {
            let mut be = FloatBackend::seeded(seed);
            let shape = TriangleShape {
                right: Some(vertex.into()),
                ..Default::default()
            };
            let out = sample_triangle(&mut be, &names(&["A", "B", "C"]), &shape).unwrap();
            let (a, b, c) = (point(&out, "A"), point(&out, "B"), point(&out, "C"));
            let (at, others) = match vertex {
                "B" => (b, (a, c)),
                _ => (c, (b, a)),
            };
            let theta = angle(&be, others.0, at, others.1);
            assert!((theta - FRAC_PI_2).abs() < 1e-9, "{vertex}: {theta}");
            assert!(at.y > 0.0);
        }
    }

    #[test]
    fn acute_apex_stays_above_floor() {
        for seed in 0..16 {
            let mut be = FloatBackend::seeded(seed);
            let shape = TriangleShape {
                acute: true,
                ..Default::default()
            };
            let out = sample_triangle(&mut be, &names(&["A", "B", "C"]), &shape).unwrap();
            assert!(out.points[0].1.y > 1.1);
        }
    }

    #[test]
    fn unknown_shape_vertex_is_rejected() {
        let mut be = FloatBackend::default();
        let shape = TriangleShape {
            right: Some("D".into()),
            ..Default::default()
        };
        assert!(matches!(
            sample_triangle(&mut be, &names(&["A", "B", "C"]), &shape),
            Err(CompileError::ContractViolation(_))
        ));
    }

    proptest! {
        #[test]
        fn right_triangle_has_right_angle(ax in -1.0..1.2f64) {
            let mut be = FloatBackend::default().assign("tri_x", ax);
            let shape = TriangleShape { right: Some("A".into()), ..Default::default() };
            let out = sample_triangle(&mut be, &names(&["A", "B", "C"]), &shape).unwrap();
            let (a, b, c) = (point(&out, "A"), point(&out, "B"), point(&out, "C"));
            prop_assert!((angle(&be, b, a, c) - FRAC_PI_2).abs() < 1e-9);
        }
    }
}
