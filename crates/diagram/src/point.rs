//! Immutable 2D point over backend scalars.

use std::ops::{Add, Neg, Sub};

use nalgebra::Vector2;

use crate::backend::Scalar;

/// Point (or vector) `(x, y)`; arithmetic always builds a new point.
#[derive(Clone, Debug, PartialEq)]
pub struct Point<S> {
    pub x: S,
    pub y: S,
}

impl<S> Point<S> {
    #[inline]
    pub fn new(x: S, y: S) -> Self {
        Self { x, y }
    }
}

impl<S: Scalar> Point<S> {
    /// Multiply both coordinates by a backend scalar.
    #[inline]
    pub fn smul(&self, k: S) -> Self {
        Self::new(self.x.clone() * k.clone(), self.y.clone() * k)
    }

    /// Multiply both coordinates by a literal.
    #[inline]
    pub fn scale(&self, k: f64) -> Self {
        Self::new(self.x.clone() * k, self.y.clone() * k)
    }

    /// Coordinates under the current variable assignment.
    #[inline]
    pub fn value(&self) -> Vector2<f64> {
        Vector2::new(self.x.value(), self.y.value())
    }
}

impl<S: Scalar> Add for Point<S> {
    type Output = Point<S>;
    #[inline]
    fn add(self, rhs: Point<S>) -> Point<S> {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<S: Scalar> Sub for Point<S> {
    type Output = Point<S>;
    #[inline]
    fn sub(self, rhs: Point<S>) -> Point<S> {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<'a, S: Scalar> Add for &'a Point<S> {
    type Output = Point<S>;
    #[inline]
    fn add(self, rhs: &'a Point<S>) -> Point<S> {
        Point::new(self.x.clone() + rhs.x.clone(), self.y.clone() + rhs.y.clone())
    }
}

impl<'a, S: Scalar> Sub for &'a Point<S> {
    type Output = Point<S>;
    #[inline]
    fn sub(self, rhs: &'a Point<S>) -> Point<S> {
        Point::new(self.x.clone() - rhs.x.clone(), self.y.clone() - rhs.y.clone())
    }
}

impl<S: Scalar> Neg for Point<S> {
    type Output = Point<S>;
    #[inline]
    fn neg(self) -> Point<S> {
        Point::new(-self.x, -self.y)
    }
}
