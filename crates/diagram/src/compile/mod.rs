//! Instruction compiler: instruction stream → point table + loss table.
//!
//! Purpose
//! - Process instructions strictly in order. Each one either registers new
//!   named points (sample, compute, parameterize) or new weighted residuals
//!   (assert). Later instructions may reference anything registered earlier.
//!
//! Model
//! - A `Compiler<B>` owns its backend and both tables for one run.
//! - Every instruction builds a `Staged` batch first and commits it only on
//!   success, so a failing instruction leaves the tables untouched. Target
//!   names are checked before the backend creates any variable.
//! - Unknown identifiers, undefined names, negated assertions and parallel
//!   line intersections are fatal; nothing is retried here.
//!
//! Loss naming
//! - An assertion with one residual is named `"{pred}_{P1_P2_…}"`; with several,
//!   each gets a `_{i}` suffix and weight `1/len`.

pub mod error;
pub mod instruction;
pub mod methods;
pub mod tables;

use std::collections::{BTreeMap, HashSet};

use nalgebra::Vector2;
use tracing::{debug, info};

use crate::backend::{Backend, Scalar};
use crate::geom::{
    between_gap, centroid, circle_nf, circumcenter, coll_phi, cong_diff, dist, incenter,
    inter_ll, inter_ll_det, line_points, midp, midp_from, orthocenter, para_phi, perp_phi,
    pp2sif, sqdist, CirclePred, LinePred, SlopeIntercept,
};
use crate::point::Point;
use crate::sample::{sample_polygon, sample_triangle, sample_uniform, uniform_point};

pub use error::{CompileError, MethodKind};
pub use instruction::{Computation, Constraint, Instruction, Line, Operand};
pub use methods::{ComputeMethod, Parameterization, Predicate, Sampler};
pub use tables::{LossTable, LossTerm, PointTable, Staged};

type P<B> = Point<<B as Backend>::Scalar>;

/// Compiler knobs.
#[derive(Clone, Copy, Debug)]
pub struct CompileCfg {
    /// Weight of `points-norm` (mean distance of points from the origin); 0 disables.
    pub regularize_points: f64,
    /// Weight of `points-distinct` (mean `1/(1+|P−Q|²)` over pairs); 0 disables.
    pub make_distinct: f64,
    /// Relative threshold below which two lines count as parallel.
    pub degeneracy_eps: f64,
}

impl Default for CompileCfg {
    fn default() -> Self {
        Self {
            regularize_points: 0.0,
            make_distinct: 0.0,
            degeneracy_eps: 1e-12,
        }
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct Compiled<B: Backend> {
    pub backend: B,
    pub points: PointTable<B::Scalar>,
    pub losses: LossTable<B::Scalar>,
}

impl<B: Backend> Compiled<B> {
    /// `Σ weight · residual²` over the whole loss table.
    pub fn total_loss(&self) -> B::Scalar {
        self.losses.total(&self.backend)
    }

    /// Point coordinates under the backend's current assignment.
    pub fn resolve(&self) -> BTreeMap<String, Vector2<f64>> {
        self.points
            .iter()
            .map(|(name, p)| (name.to_owned(), p.value()))
            .collect()
    }
}

/// Compile a whole instruction stream.
pub fn compile<B: Backend>(
    backend: B,
    instructions: &[Instruction],
    cfg: CompileCfg,
) -> Result<Compiled<B>, CompileError> {
    let mut c = Compiler::with_cfg(backend, cfg);
    for ins in instructions {
        c.process(ins)?;
    }
    Ok(c.finish())
}

#[derive(Debug)]
pub struct Compiler<B: Backend> {
    backend: B,
    points: PointTable<B::Scalar>,
    losses: LossTable<B::Scalar>,
    cfg: CompileCfg,
}

impl<B: Backend> Compiler<B> {
    pub fn new(backend: B) -> Self {
        Self::with_cfg(backend, CompileCfg::default())
    }

    pub fn with_cfg(backend: B, cfg: CompileCfg) -> Self {
        Self {
            backend,
            points: PointTable::default(),
            losses: LossTable::default(),
            cfg,
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn points(&self) -> &PointTable<B::Scalar> {
        &self.points
    }

    #[inline]
    pub fn losses(&self) -> &LossTable<B::Scalar> {
        &self.losses
    }

    /// Process one instruction; on error both tables are unchanged.
    pub fn process(&mut self, ins: &Instruction) -> Result<(), CompileError> {
        debug!(?ins, "instruction");
        let staged = match ins {
            Instruction::Sample {
                points,
                sampler,
                args,
            } => self.sample(points, sampler, args)?,
            Instruction::Compute { point, computation } => {
                let p = self.compute(point, computation)?;
                Staged::point(point.clone(), p)
            }
            Instruction::Parameterize {
                point,
                parameterization,
            } => self.parameterize(point, parameterization)?,
            Instruction::Assert { constraint } => self.assert(constraint)?,
        };
        self.commit(staged);
        Ok(())
    }

    /// Add the configured global regularizers and hand out the tables.
    pub fn finish(mut self) -> Compiled<B> {
        if self.cfg.regularize_points > 0.0 && !self.points.is_empty() {
            let origin = self.backend.const_point(0.0, 0.0);
            let norms: Vec<_> = self
                .points
                .iter()
                .map(|(_, p)| dist(&self.backend, p, &origin))
                .collect();
            let mean = self.backend.sum(&norms) / norms.len() as f64;
            self.losses.push(
                "points-norm",
                LossTerm::new(mean, self.cfg.regularize_points),
            );
        }
        if self.cfg.make_distinct > 0.0 && self.points.len() > 1 {
            let ps: Vec<_> = self.points.iter().map(|(_, p)| p).collect();
            let one = self.backend.constant(1.0);
            let mut terms = Vec::new();
            for (i, p) in ps.iter().enumerate() {
                for q in &ps[i + 1..] {
                    terms.push(one.clone() / (sqdist(*p, *q) + 1.0));
                }
            }
            let mean = self.backend.sum(&terms) / terms.len() as f64;
            self.losses.push(
                "points-distinct",
                LossTerm::new(mean, self.cfg.make_distinct),
            );
        }
        info!(
            points = self.points.len(),
            losses = self.losses.len(),
            "compiled diagram"
        );
        Compiled {
            backend: self.backend,
            points: self.points,
            losses: self.losses,
        }
    }

    fn commit(&mut self, staged: Staged<B::Scalar>) {
        for (name, p) in staged.points {
            self.points.insert(name, p);
        }
        for (name, term) in staged.losses {
            self.losses.push(name, term);
        }
    }

    /// Targets must be new and pairwise distinct.
    fn check_fresh<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), CompileError> {
        let mut seen = HashSet::new();
        for name in names {
            if self.points.contains(name) || !seen.insert(name) {
                return Err(CompileError::contract(format!(
                    "point `{name}` is already defined"
                )));
            }
        }
        Ok(())
    }

    fn sample(
        &mut self,
        points: &[String],
        sampler: &str,
        args: &[String],
    ) -> Result<Staged<B::Scalar>, CompileError> {
        let sampler = Sampler::from_id(sampler, args)?;
        self.check_fresh(points.iter().map(String::as_str))?;
        match sampler {
            Sampler::Uniform => sample_uniform(&mut self.backend, points),
            Sampler::Polygon => sample_polygon(&mut self.backend, points),
            Sampler::Triangle(shape) => sample_triangle(&mut self.backend, points, &shape),
        }
    }

    fn parameterize(&mut self, point: &str, id: &str) -> Result<Staged<B::Scalar>, CompileError> {
        let method = Parameterization::from_id(id)?;
        self.check_fresh([point])?;
        let p = match method {
            Parameterization::Coords => uniform_point(&mut self.backend, point)?,
        };
        Ok(Staged::point(point, p))
    }

    fn compute(&self, point: &str, comp: &Computation) -> Result<P<B>, CompileError> {
        let method = ComputeMethod::from_id(&comp.method)?;
        self.check_fresh([point])?;
        let be = &self.backend;
        let ops = &comp.operands;
        Ok(match method {
            ComputeMethod::Midp => {
                let [a, b] = self.point_operands::<2>(&comp.method, ops)?;
                midp(&a, &b)
            }
            ComputeMethod::MidpFrom => {
                let [m, a] = self.point_operands::<2>(&comp.method, ops)?;
                midp_from(&m, &a)
            }
            ComputeMethod::Circumcenter => {
                let [a, b, c] = self.point_operands::<3>(&comp.method, ops)?;
                circumcenter(be, &a, &b, &c)
            }
            ComputeMethod::Orthocenter => {
                let [a, b, c] = self.point_operands::<3>(&comp.method, ops)?;
                orthocenter(be, &a, &b, &c)
            }
            ComputeMethod::Centroid => {
                let [a, b, c] = self.point_operands::<3>(&comp.method, ops)?;
                centroid(be, &a, &b, &c)
            }
            ComputeMethod::Incenter => {
                let [a, b, c] = self.point_operands::<3>(&comp.method, ops)?;
                incenter(be, &a, &b, &c)
            }
            ComputeMethod::InterLL => self.intersect_lines(ops)?,
        })
    }

    fn point_operands<const N: usize>(
        &self,
        method: &str,
        operands: &[Operand],
    ) -> Result<[P<B>; N], CompileError> {
        let ps = operands
            .iter()
            .map(|o| match o {
                Operand::Point(name) => self.points.get(name).cloned(),
                Operand::Line(_) => Err(CompileError::contract(format!(
                    "`{method}` takes point operands, got a line"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let n = ps.len();
        ps.try_into().map_err(|_| {
            CompileError::contract(format!("`{method}` takes {N} operands, got {n}"))
        })
    }

    fn lookup_all(&self, names: &[String]) -> Result<Vec<P<B>>, CompileError> {
        names.iter().map(|n| self.points.get(n).cloned()).collect()
    }

    fn line_nf(&self, line: &Line) -> Result<SlopeIntercept<B::Scalar>, CompileError> {
        let pred = LinePred::from_id(&line.pred)
            .ok_or_else(|| CompileError::unsupported(MethodKind::Line, line.pred.as_str()))?;
        if line.points.len() != pred.arity() {
            return Err(CompileError::contract(format!(
                "line `{}` takes {} points, got {}",
                line.pred,
                pred.arity(),
                line.points.len()
            )));
        }
        let ps = self.lookup_all(&line.points)?;
        let (p1, p2) = line_points(&self.backend, pred, &ps);
        Ok(pp2sif(p1, p2))
    }

    fn intersect_lines(&self, operands: &[Operand]) -> Result<P<B>, CompileError> {
        let [Operand::Line(l1), Operand::Line(l2)] = operands else {
            return Err(CompileError::contract("`interLL` takes exactly two line operands"));
        };
        let (n1, n2) = (self.line_nf(l1)?, self.line_nf(l2)?);
        let det = inter_ll_det(&n1, &n2).value();
        let scale = n1.direction().value().norm() * n2.direction().value().norm();
        if !(det.abs() > self.cfg.degeneracy_eps * scale) {
            return Err(CompileError::NumericDegeneracy(format!(
                "lines {}({}) and {}({}) are parallel or degenerate",
                l1.pred,
                l1.points.join(", "),
                l2.pred,
                l2.points.join(", ")
            )));
        }
        Ok(inter_ll(&n1, &n2))
    }

    fn assert(&self, c: &Constraint) -> Result<Staged<B::Scalar>, CompileError> {
        if c.negate {
            return Err(CompileError::contract(format!(
                "negated `{}` assertion reached the compiler",
                c.pred
            )));
        }
        let pred = Predicate::from_id(&c.pred)?;
        if c.points.len() != pred.arity() {
            return Err(CompileError::contract(format!(
                "`{}` takes {} points, got {}",
                c.pred,
                pred.arity(),
                c.points.len()
            )));
        }
        let ps = self.lookup_all(&c.points)?;
        let residuals = self.assertion_vals(pred, &ps);

        let base = format!("{}_{}", c.pred, c.points.join("_"));
        let weight = 1.0 / residuals.len() as f64;
        let mut out = Staged::default();
        if let [r] = residuals.as_slice() {
            out.losses.push((base, LossTerm::new(r.clone(), weight)));
        } else {
            for (i, r) in residuals.into_iter().enumerate() {
                out.losses.push((format!("{base}_{i}"), LossTerm::new(r, weight)));
            }
        }
        Ok(out)
    }

    /// Residuals of `pred` over `ps`; `ps.len() == pred.arity()`.
    fn assertion_vals(&self, pred: Predicate, ps: &[P<B>]) -> Vec<B::Scalar> {
        let be = &self.backend;
        match pred {
            Predicate::Perp => vec![perp_phi(&ps[0], &ps[1], &ps[2], &ps[3])],
            Predicate::Para => vec![para_phi(&ps[0], &ps[1], &ps[2], &ps[3])],
            Predicate::Cong => vec![cong_diff(&ps[0], &ps[1], &ps[2], &ps[3])],
            Predicate::Midp => vec![dist(be, &ps[0], &midp(&ps[1], &ps[2]))],
            Predicate::Coll => vec![coll_phi(&ps[0], &ps[1], &ps[2])],
            Predicate::Between => between_gap(be, &ps[0], &ps[1], &ps[2]).to_vec(),
            Predicate::OnCirc => {
                let circ = circle_nf(be, CirclePred::COA, &ps[1..]);
                vec![dist(be, &ps[0], &circ.center) - circ.radius]
            }
            Predicate::Concyc => {
                let circ = circle_nf(be, CirclePred::C3, &ps[..3]);
                vec![dist(be, &ps[3], &circ.center) - circ.radius]
            }
        }
    }
}
