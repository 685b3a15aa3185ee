//! Named point and loss tables owned by one compilation run.

use std::collections::HashMap;

use super::error::CompileError;
use crate::backend::{Backend, Scalar};
use crate::point::Point;

/// Weighted residual. Its contribution to the total loss is `weight · residual²`.
#[derive(Clone, Debug)]
pub struct LossTerm<S> {
    pub residual: S,
    pub weight: f64,
}

impl<S: Scalar> LossTerm<S> {
    #[inline]
    pub fn new(residual: S, weight: f64) -> Self {
        Self { residual, weight }
    }

    /// `residual²` at the current assignment (unweighted).
    #[inline]
    pub fn value(&self) -> f64 {
        let r = self.residual.value();
        r * r
    }

    #[inline]
    pub fn weighted(&self) -> S {
        self.residual.sq() * self.weight
    }
}

/// Name → point, iterated in registration order. Names are never rebound.
#[derive(Clone, Debug)]
pub struct PointTable<S> {
    entries: Vec<(String, Point<S>)>,
    index: HashMap<String, usize>,
}

impl<S> Default for PointTable<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<S> PointTable<S> {
    pub fn get(&self, name: &str) -> Result<&Point<S>, CompileError> {
        self.lookup(name)
            .ok_or_else(|| CompileError::UndefinedPoint(name.to_owned()))
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<&Point<S>> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Point<S>)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Callers check `contains` first; a duplicate here is a logic error.
    pub(crate) fn insert(&mut self, name: String, p: Point<S>) {
        debug_assert!(!self.contains(&name), "point `{name}` registered twice");
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, p));
    }
}

/// Ordered loss entries. Duplicate names are kept and all contribute.
#[derive(Clone, Debug)]
pub struct LossTable<S> {
    entries: Vec<(String, LossTerm<S>)>,
}

impl<S> Default for LossTable<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: Scalar> LossTable<S> {
    pub fn push(&mut self, name: impl Into<String>, term: LossTerm<S>) {
        self.entries.push((name.into(), term));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LossTerm<S>)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry registered under `name`.
    pub fn get(&self, name: &str) -> Option<&LossTerm<S>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    /// `Σ weight · residual²` as a backend scalar.
    pub fn total<B: Backend<Scalar = S>>(&self, be: &B) -> S {
        let terms: Vec<S> = self.entries.iter().map(|(_, t)| t.weighted()).collect();
        be.sum(&terms)
    }

    /// `Σ weight · residual²` at the current assignment.
    pub fn total_value(&self) -> f64 {
        self.entries.iter().map(|(_, t)| t.weight * t.value()).sum()
    }
}

/// Output of one instruction, held back until the whole instruction succeeds.
#[derive(Clone, Debug)]
pub struct Staged<S> {
    pub points: Vec<(String, Point<S>)>,
    pub losses: Vec<(String, LossTerm<S>)>,
}

impl<S> Default for Staged<S> {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            losses: Vec::new(),
        }
    }
}

impl<S> Staged<S> {
    pub fn point(name: impl Into<String>, p: Point<S>) -> Self {
        Self {
            points: vec![(name.into(), p)],
            losses: Vec::new(),
        }
    }
}
