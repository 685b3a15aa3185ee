//! Numeric capability set.
//!
//! Purpose
//! - Geometry, sampling and the compiler never touch numbers directly. They
//!   build scalars through a `Backend`: constants, trainable variables and a
//!   handful of elementary functions. Swapping the backend swaps the meaning of
//!   "scalar" (a plain float, or a node in a differentiable expression graph).
//!
//! Implementations
//! - `float::FloatBackend`: `Scalar = f64`, evaluation only.
//! - `expr::ExprBackend`: `Scalar = Expr`, reverse-mode gradients for `optim`.

pub mod expr;
pub mod float;

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use rand::rngs::StdRng;
use rand::Rng;
use thiserror::Error;

use crate::point::Point;

/// Arithmetic every backend scalar supports.
///
/// Right-hand `f64` operands cover the many literal coefficients in the
/// geometry formulas without a round trip through `Backend::constant`.
pub trait Scalar:
    Clone
    + fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
{
    /// Numeric value under the current variable assignment.
    fn value(&self) -> f64;

    #[inline]
    fn sq(&self) -> Self {
        self.clone() * self.clone()
    }
}

impl Scalar for f64 {
    #[inline]
    fn value(&self) -> f64 {
        *self
    }
}

/// Rewrite selector for `Backend::simplify`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimplifyMethod {
    /// Every rewrite the backend knows.
    All,
    /// Trigonometric identities only (odd/even symmetry of sin/cos).
    Trig,
}

/// Request for one trainable scalar.
///
/// `lo`/`hi` are hints for the initial value, not hard constraints.
#[derive(Clone, Copy, Debug)]
pub struct VarSpec<'a> {
    pub name: &'a str,
    pub shape: &'a [usize],
    pub lo: f64,
    pub hi: f64,
}

impl<'a> VarSpec<'a> {
    /// Scalar variable with the default `[-1, 1]` hint.
    #[inline]
    pub fn scalar(name: &'a str) -> Self {
        Self {
            name,
            shape: &[],
            lo: -1.0,
            hi: 1.0,
        }
    }

    #[inline]
    pub fn bounds(self, lo: f64, hi: f64) -> Self {
        Self { lo, hi, ..self }
    }

    #[inline]
    pub fn with_shape(self, shape: &'a [usize]) -> Self {
        Self { shape, ..self }
    }

    /// Only scalars (empty shape or all-ones) with finite, ordered bounds are accepted.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.shape.iter().product::<usize>() != 1 {
            return Err(BackendError::NonScalarShape {
                name: self.name.to_owned(),
                shape: self.shape.to_vec(),
            });
        }
        if !(self.lo.is_finite() && self.hi.is_finite()) || self.lo > self.hi {
            return Err(BackendError::InvalidBounds {
                name: self.name.to_owned(),
                lo: self.lo,
                hi: self.hi,
            });
        }
        Ok(())
    }
}

/// Initial-value policy for trainable variables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VarInit {
    /// Uniform draw from the variable's `[lo, hi]` hint.
    Uniform { seed: u64 },
    /// Same value for every variable.
    Constant(f64),
}

impl Default for VarInit {
    fn default() -> Self {
        VarInit::Uniform { seed: 0 }
    }
}

impl VarInit {
    pub(crate) fn draw(&self, rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
        match *self {
            VarInit::Uniform { .. } if lo < hi => rng.gen_range(lo..=hi),
            VarInit::Uniform { .. } => lo,
            VarInit::Constant(v) => v,
        }
    }

    pub(crate) fn seed(&self) -> u64 {
        match *self {
            VarInit::Uniform { seed } => seed,
            VarInit::Constant(_) => 0,
        }
    }
}

/// Caller contract violations detected by a backend.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BackendError {
    #[error("variable `{name}`: only scalar variables are supported, got shape {shape:?}")]
    NonScalarShape { name: String, shape: Vec<usize> },
    #[error("variable `{name}`: invalid bounds [{lo}, {hi}]")]
    InvalidBounds { name: String, lo: f64, hi: f64 },
}

/// Capability set the geometry library and compiler are written against.
pub trait Backend {
    type Scalar: Scalar;

    /// Inject a numeric literal.
    fn constant(&self, v: f64) -> Self::Scalar;

    /// Create a trainable scalar.
    fn variable(&mut self, spec: VarSpec<'_>) -> Result<Self::Scalar, BackendError>;

    #[inline]
    fn point(&self, x: Self::Scalar, y: Self::Scalar) -> Point<Self::Scalar> {
        Point::new(x, y)
    }

    #[inline]
    fn const_point(&self, x: f64, y: f64) -> Point<Self::Scalar> {
        self.point(self.constant(x), self.constant(y))
    }

    fn sum(&self, xs: &[Self::Scalar]) -> Self::Scalar {
        let mut it = xs.iter().cloned();
        match it.next() {
            Some(first) => it.fold(first, |acc, x| acc + x),
            None => self.constant(0.0),
        }
    }

    fn sqrt(&self, x: &Self::Scalar) -> Self::Scalar;
    fn sin(&self, x: &Self::Scalar) -> Self::Scalar;
    fn cos(&self, x: &Self::Scalar) -> Self::Scalar;
    fn acos(&self, x: &Self::Scalar) -> Self::Scalar;
    fn tanh(&self, x: &Self::Scalar) -> Self::Scalar;
    fn sigmoid(&self, x: &Self::Scalar) -> Self::Scalar;
    fn max(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;

    /// Value-preserving rewrite of a point's coordinate expressions.
    /// Backends without a rewriter return the point unchanged.
    fn simplify(&self, p: Point<Self::Scalar>, _method: SimplifyMethod) -> Point<Self::Scalar> {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_spec_rejects_tensors_and_bad_bounds() {
        assert!(VarSpec::scalar("x").validate().is_ok());
        assert!(VarSpec::scalar("x").with_shape(&[1, 1]).validate().is_ok());
        assert!(matches!(
            VarSpec::scalar("x").with_shape(&[2]).validate(),
            Err(BackendError::NonScalarShape { .. })
        ));
        assert!(matches!(
            VarSpec::scalar("x").bounds(1.0, -1.0).validate(),
            Err(BackendError::InvalidBounds { .. })
        ));
        assert!(VarSpec::scalar("x").bounds(0.0, f64::NAN).validate().is_err());
    }
}
