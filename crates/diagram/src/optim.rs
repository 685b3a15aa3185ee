//! Gradient descent over expression-graph variables.
//!
//! Purpose
//! - Drive the compiled total loss toward zero by adjusting the trainable
//!   variables in place. Gradients are exact (reverse mode over the `Expr`
//!   DAG); the step length comes from a backtracking line search with the
//!   Armijo sufficient-decrease test.
//!
//! Stopping
//! - `loss < tolerance`: converged.
//! - Vanishing gradient (relative to `max(|loss|, 1)`), a line search that
//!   finds no strict decrease, or an accepted step whose decrease is below
//!   one ulp of the loss: stalled at a stationary point; reported with
//!   `converged = false`.
//! - Iteration budget spent: `OptimError::DidNotConverge`.
//!
//! Non-finite gradient components (e.g. from a division by a zero side
//! length) are zeroed so the remaining coordinates can still move.

use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::backend::expr::{Expr, Var};

#[derive(Clone, Copy, Debug)]
pub struct OptimCfg {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub initial_step: f64,
    /// Step shrink factor per rejected trial.
    pub backtrack: f64,
    pub max_backtracks: usize,
    /// Gradient norm below `min_grad_norm · max(|loss|, 1)` counts as stationary.
    pub min_grad_norm: f64,
}

impl Default for OptimCfg {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            tolerance: 1e-10,
            initial_step: 1.0,
            backtrack: 0.5,
            max_backtracks: 40,
            min_grad_norm: 1e-14,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OptimReport {
    pub converged: bool,
    pub iterations: usize,
    pub final_loss: f64,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum OptimError {
    #[error("minimizer did not converge after {iterations} iterations (loss {loss:e})")]
    DidNotConverge { iterations: usize, loss: f64 },
    #[error("loss is not finite at iteration {iteration}")]
    NonFiniteLoss { iteration: usize },
}

/// Armijo constant.
const SUFFICIENT_DECREASE: f64 = 1e-4;

/// Minimize `loss` over `vars`, leaving the best assignment in the variables.
pub fn minimize(loss: &Expr, vars: &[Rc<Var>], cfg: &OptimCfg) -> Result<OptimReport, OptimError> {
    let n_grad = vars.iter().map(|v| v.index() + 1).max().unwrap_or(0);
    let mut step = cfg.initial_step;
    let mut f = loss.eval();
    if !f.is_finite() {
        return Err(OptimError::NonFiniteLoss { iteration: 0 });
    }

    for it in 0..cfg.max_iterations {
        if f < cfg.tolerance {
            return Ok(finish(true, it, f));
        }
        let (_, mut grad) = loss.gradient(n_grad);
        for g in grad.iter_mut().filter(|g| !g.is_finite()) {
            *g = 0.0;
        }
        let g: Vec<f64> = vars.iter().map(|v| grad[v.index()]).collect();
        let g_sq: f64 = g.iter().map(|x| x * x).sum();
        if g_sq.sqrt() < cfg.min_grad_norm * f.abs().max(1.0) {
            debug!(iteration = it, loss = f, "gradient vanished");
            return Ok(finish(false, it, f));
        }

        let x0: Vec<f64> = vars.iter().map(|v| v.value()).collect();
        let mut accepted = None;
        for _ in 0..cfg.max_backtracks {
            for ((v, x), gi) in vars.iter().zip(&x0).zip(&g) {
                v.set(x - step * gi);
            }
            let trial = loss.eval();
            let armijo = f - SUFFICIENT_DECREASE * step * g_sq;
            if trial.is_finite() && trial < f && trial <= armijo {
                accepted = Some(trial);
                break;
            }
            step *= cfg.backtrack;
        }
        match accepted {
            Some(trial) => {
                let decrease = f - trial;
                f = trial;
                if decrease <= f64::EPSILON * f.abs().max(1.0) && f >= cfg.tolerance {
                    debug!(
                        iteration = it,
                        loss = f,
                        decrease,
                        "decrease below loss precision"
                    );
                    return Ok(finish(false, it + 1, f));
                }
                step = (step / cfg.backtrack).min(cfg.initial_step);
            }
            None => {
                for (v, x) in vars.iter().zip(&x0) {
                    v.set(*x);
                }
                debug!(iteration = it, loss = f, "line search found no decrease");
                return Ok(finish(false, it, f));
            }
        }
    }

    if f < cfg.tolerance {
        return Ok(finish(true, cfg.max_iterations, f));
    }
    Err(OptimError::DidNotConverge {
        iterations: cfg.max_iterations,
        loss: f,
    })
}

fn finish(converged: bool, iterations: usize, final_loss: f64) -> OptimReport {
    info!(converged, iterations, final_loss, "minimizer finished");
    OptimReport {
        converged,
        iterations,
        final_loss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::expr::ExprBackend;
    use crate::backend::{Backend, Scalar, VarInit, VarSpec};
    use crate::compile::{compile, CompileCfg, Instruction};
    use crate::geom::{cong_diff, perp_phi};

    #[test]
    fn quadratic_bowl() {
        let mut be = ExprBackend::new(VarInit::Constant(0.0));
        let x = be.variable(VarSpec::scalar("x")).unwrap();
        let y = be.variable(VarSpec::scalar("y")).unwrap();
        let loss = (x.clone() - 3.0).sq() + (y.clone() + 1.0).sq() * 2.0;
        let report = minimize(&loss, be.variables(), &OptimCfg::default()).unwrap();
        assert!(report.converged);
        assert!((x.eval() - 3.0).abs() < 1e-5);
        assert!((y.eval() + 1.0).abs() < 1e-5);
    }

    #[test]
    fn already_solved_takes_no_steps() {
        let mut be = ExprBackend::new(VarInit::Constant(2.0));
        let x = be.variable(VarSpec::scalar("x")).unwrap();
        let loss = (x - 2.0).sq();
        let report = minimize(&loss, be.variables(), &OptimCfg::default()).unwrap();
        assert_eq!(
            report,
            OptimReport {
                converged: true,
                iterations: 0,
                final_loss: 0.0
            }
        );
    }

    #[test]
    fn stationary_point_is_reported_not_failed() {
        // (x² − 1)² + 1 has minimum 1 > tolerance
        let mut be = ExprBackend::new(VarInit::Constant(0.5));
        let x = be.variable(VarSpec::scalar("x")).unwrap();
        let loss = (x.sq() - 1.0).sq() + 1.0;
        let report = minimize(&loss, be.variables(), &OptimCfg::default()).unwrap();
        assert!(!report.converged);
        assert!((report.final_loss - 1.0).abs() < 1e-9);
    }

    #[test]
    fn stall_is_detected_for_any_budget() {
        for max_iterations in [200, 1000, 5000] {
            let mut be = ExprBackend::new(VarInit::Constant(0.5));
            let x = be.variable(VarSpec::scalar("x")).unwrap();
            let loss = (x.sq() - 1.0).sq() + 1.0;
            let cfg = OptimCfg {
                max_iterations,
                ..Default::default()
            };
            let report = minimize(&loss, be.variables(), &cfg).unwrap();
            assert!(!report.converged);
            assert!(report.iterations < max_iterations, "{report:?}");
            assert!((x.eval() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn budget_exhaustion_is_an_error() {
        let mut be = ExprBackend::new(VarInit::Constant(10.0));
        let x = be.variable(VarSpec::scalar("x")).unwrap();
        let loss = x.sq().sq();
        let cfg = OptimCfg {
            max_iterations: 3,
            ..Default::default()
        };
        assert!(matches!(
            minimize(&loss, be.variables(), &cfg),
            Err(OptimError::DidNotConverge { iterations: 3, .. })
        ));
    }

    #[test]
    fn non_finite_start_is_rejected() {
        let mut be = ExprBackend::new(VarInit::Constant(-1.0));
        let x = be.variable(VarSpec::scalar("x")).unwrap();
        let loss = be.sqrt(&x);
        assert_eq!(
            minimize(&loss, be.variables(), &OptimCfg::default()),
            Err(OptimError::NonFiniteLoss { iteration: 0 })
        );
    }

    #[test]
    fn solves_perpendicular_and_congruent_segments() {
        let prog = [
            Instruction::sample("uniform", &["A", "B", "C", "D"]),
            Instruction::assert("perp", &["A", "B", "C", "D"]),
            Instruction::assert("cong", &["A", "B", "C", "D"]),
        ];
        let out = compile(ExprBackend::seeded(42), &prog, CompileCfg::default()).unwrap();
        let cfg = OptimCfg {
            max_iterations: 20_000,
            ..Default::default()
        };
        let report = minimize(&out.total_loss(), out.backend.variables(), &cfg).unwrap();
        assert!(report.converged, "{report:?}");

        let p = |n: &str| out.points.get(n).unwrap().clone();
        let (a, b, c, d) = (p("A"), p("B"), p("C"), p("D"));
        assert!(perp_phi(&a, &b, &c, &d).eval().abs() < 1e-4);
        assert!(cong_diff(&a, &b, &c, &d).eval().abs() < 1e-4);
    }
}
