//! Differentiable expression graph.
//!
//! Model
//! - `Expr` is a reference-counted node in a DAG. Sharing is the norm: a
//!   sampled polygon vertex feeds every later vertex, so evaluation and
//!   differentiation memoise on node identity.
//! - Leaves are constants or `Var`s. A `Var` owns its current value in a
//!   `Cell`, so the minimizer updates values in place and every expression
//!   built on it sees the change.
//! - Constant subtrees are folded at construction.
//!
//! Threading
//! - `Rc`/`Cell` make the graph `!Send`; one graph belongs to one run.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{Backend, BackendError, Scalar, SimplifyMethod, VarInit, VarSpec};
use crate::point::Point;

/// Trainable leaf.
#[derive(Debug)]
pub struct Var {
    name: String,
    index: usize,
    value: Cell<f64>,
}

impl Var {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Position in the owning backend's variable list (and in gradients).
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
    #[inline]
    pub fn value(&self) -> f64 {
        self.value.get()
    }
    #[inline]
    pub fn set(&self, v: f64) {
        self.value.set(v);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Unary {
    Sqrt,
    Sin,
    Cos,
    Acos,
    Tanh,
    Sigmoid,
}

impl Unary {
    #[inline]
    fn apply(self, x: f64) -> f64 {
        match self {
            Unary::Sqrt => x.sqrt(),
            Unary::Sin => x.sin(),
            Unary::Cos => x.cos(),
            Unary::Acos => x.acos(),
            Unary::Tanh => x.tanh(),
            Unary::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }

    /// d(op)/dx given the argument `x` and the output `v`.
    #[inline]
    fn derivative(self, x: f64, v: f64) -> f64 {
        match self {
            // Subgradient 0 at the kink keeps `dist` of coincident points finite.
            Unary::Sqrt if v > 0.0 => 0.5 / v,
            Unary::Sqrt => 0.0,
            Unary::Sin => x.cos(),
            Unary::Cos => -x.sin(),
            Unary::Acos if x * x < 1.0 => -1.0 / (1.0 - x * x).sqrt(),
            Unary::Acos => 0.0,
            Unary::Tanh => 1.0 - v * v,
            Unary::Sigmoid => v * (1.0 - v),
        }
    }
}

#[derive(Debug)]
enum Node {
    Const(f64),
    Var(Rc<Var>),
    Add(Expr, Expr),
    Sub(Expr, Expr),
    Mul(Expr, Expr),
    Div(Expr, Expr),
    Neg(Expr),
    Unary(Unary, Expr),
    Max(Expr, Expr),
}

/// Scalar node of the expression graph.
#[derive(Clone)]
pub struct Expr(Rc<Node>);

type Key = *const Node;

impl Expr {
    #[inline]
    pub fn constant(v: f64) -> Self {
        Expr(Rc::new(Node::Const(v)))
    }

    #[inline]
    pub fn var(v: Rc<Var>) -> Self {
        Expr(Rc::new(Node::Var(v)))
    }

    #[inline]
    fn key(&self) -> Key {
        Rc::as_ptr(&self.0)
    }

    #[inline]
    pub fn as_const(&self) -> Option<f64> {
        match *self.0 {
            Node::Const(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    fn is_const(&self, v: f64) -> bool {
        self.as_const() == Some(v)
    }

    fn unary(op: Unary, x: Expr) -> Expr {
        match x.as_const() {
            Some(c) => Expr::constant(op.apply(c)),
            None => Expr(Rc::new(Node::Unary(op, x))),
        }
    }

    fn max(a: Expr, b: Expr) -> Expr {
        match (a.as_const(), b.as_const()) {
            (Some(x), Some(y)) => Expr::constant(x.max(y)),
            _ => Expr(Rc::new(Node::Max(a, b))),
        }
    }

    fn children(&self) -> Vec<&Expr> {
        match &*self.0 {
            Node::Const(_) | Node::Var(_) => Vec::new(),
            Node::Neg(x) | Node::Unary(_, x) => vec![x],
            Node::Add(l, r)
            | Node::Sub(l, r)
            | Node::Mul(l, r)
            | Node::Div(l, r)
            | Node::Max(l, r) => vec![l, r],
        }
    }

    /// Nodes reachable from `self`, children before parents.
    fn topo(&self) -> Vec<Expr> {
        let mut order = Vec::new();
        let mut seen: HashSet<Key> = HashSet::new();
        let mut stack: Vec<(Expr, bool)> = vec![(self.clone(), false)];
        while let Some((e, expanded)) = stack.pop() {
            if expanded {
                order.push(e);
                continue;
            }
            if !seen.insert(e.key()) {
                continue;
            }
            stack.push((e.clone(), true));
            for c in e.children() {
                if !seen.contains(&c.key()) {
                    stack.push((c.clone(), false));
                }
            }
        }
        order
    }

    /// Node value given already-computed child values.
    fn forward(&self, vals: &HashMap<Key, f64>) -> f64 {
        let v = |e: &Expr| vals[&e.key()];
        match &*self.0 {
            Node::Const(c) => *c,
            Node::Var(var) => var.value(),
            Node::Add(l, r) => v(l) + v(r),
            Node::Sub(l, r) => v(l) - v(r),
            Node::Mul(l, r) => v(l) * v(r),
            Node::Div(l, r) => v(l) / v(r),
            Node::Neg(x) => -v(x),
            Node::Unary(op, x) => op.apply(v(x)),
            Node::Max(l, r) => v(l).max(v(r)),
        }
    }

    fn forward_all(order: &[Expr]) -> HashMap<Key, f64> {
        let mut vals = HashMap::with_capacity(order.len());
        for e in order {
            let v = e.forward(&vals);
            vals.insert(e.key(), v);
        }
        vals
    }

    /// Value under the current variable assignment.
    pub fn eval(&self) -> f64 {
        if let Some(c) = self.as_const() {
            return c;
        }
        let order = self.topo();
        Self::forward_all(&order)[&self.key()]
    }

    /// Value and gradient with respect to variables `0..n_vars` (by `Var::index`).
    pub fn gradient(&self, n_vars: usize) -> (f64, Vec<f64>) {
        let order = self.topo();
        let vals = Self::forward_all(&order);
        let mut grad = vec![0.0; n_vars];
        let mut adj: HashMap<Key, f64> = HashMap::with_capacity(order.len());
        adj.insert(self.key(), 1.0);
        for e in order.iter().rev() {
            let a = match adj.get(&e.key()) {
                Some(&a) if a != 0.0 => a,
                _ => continue,
            };
            let mut push = |c: &Expr, d: f64| {
                *adj.entry(c.key()).or_insert(0.0) += d;
            };
            let v = |c: &Expr| vals[&c.key()];
            match &*e.0 {
                Node::Const(_) => {}
                Node::Var(var) => {
                    if let Some(g) = grad.get_mut(var.index()) {
                        *g += a;
                    }
                }
                Node::Add(l, r) => {
                    push(l, a);
                    push(r, a);
                }
                Node::Sub(l, r) => {
                    push(l, a);
                    push(r, -a);
                }
                Node::Mul(l, r) => {
                    push(l, a * v(r));
                    push(r, a * v(l));
                }
                Node::Div(l, r) => {
                    let rv = v(r);
                    push(l, a / rv);
                    push(r, -a * v(l) / (rv * rv));
                }
                Node::Neg(x) => push(x, -a),
                Node::Unary(op, x) => push(x, a * op.derivative(v(x), vals[&e.key()])),
                Node::Max(l, r) => {
                    if v(l) >= v(r) {
                        push(l, a);
                    } else {
                        push(r, a);
                    }
                }
            }
        }
        (vals[&self.key()], grad)
    }

    /// Number of distinct nodes in the graph rooted here.
    pub fn node_count(&self) -> usize {
        self.topo().len()
    }

    /// Value-preserving rewrite; shared subtrees are rewritten once.
    pub fn simplify(&self, method: SimplifyMethod) -> Expr {
        let mut memo = HashMap::new();
        self.rewrite(method, &mut memo)
    }

    fn rewrite(&self, method: SimplifyMethod, memo: &mut HashMap<Key, Expr>) -> Expr {
        if let Some(done) = memo.get(&self.key()) {
            return done.clone();
        }
        let all = method == SimplifyMethod::All;
        let out = match &*self.0 {
            Node::Const(_) | Node::Var(_) => self.clone(),
            Node::Add(l, r) => {
                let (l, r) = (l.rewrite(method, memo), r.rewrite(method, memo));
                if all && r.is_const(0.0) {
                    l
                } else if all && l.is_const(0.0) {
                    r
                } else {
                    l + r
                }
            }
            Node::Sub(l, r) => {
                let (l, r) = (l.rewrite(method, memo), r.rewrite(method, memo));
                if all && r.is_const(0.0) {
                    l
                } else {
                    l - r
                }
            }
            Node::Mul(l, r) => {
                let (l, r) = (l.rewrite(method, memo), r.rewrite(method, memo));
                if all && r.is_const(1.0) {
                    l
                } else if all && l.is_const(1.0) {
                    r
                } else {
                    l * r
                }
            }
            Node::Div(l, r) => {
                let (l, r) = (l.rewrite(method, memo), r.rewrite(method, memo));
                if all && r.is_const(1.0) {
                    l
                } else {
                    l / r
                }
            }
            Node::Neg(x) => {
                let x = x.rewrite(method, memo);
                match &*x.0 {
                    Node::Neg(inner) => inner.clone(),
                    _ => -x,
                }
            }
            Node::Unary(op, x) => {
                let x = x.rewrite(method, memo);
                match (op, &*x.0) {
                    (Unary::Sin, Node::Neg(inner)) => -Expr::unary(Unary::Sin, inner.clone()),
                    (Unary::Cos, Node::Neg(inner)) => Expr::unary(Unary::Cos, inner.clone()),
                    _ => Expr::unary(*op, x),
                }
            }
            Node::Max(l, r) => Expr::max(l.rewrite(method, memo), r.rewrite(method, memo)),
        };
        memo.insert(self.key(), out.clone());
        out
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Node::Const(c) => f.debug_tuple("Const").field(c).finish(),
            Node::Var(v) => f.debug_tuple("Var").field(&v.name).finish(),
            _ => f
                .debug_struct("Expr")
                .field("value", &self.eval())
                .field("nodes", &self.node_count())
                .finish(),
        }
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, $node:ident, $op:tt) => {
        impl $trait for Expr {
            type Output = Expr;
            #[inline]
            fn $method(self, rhs: Expr) -> Expr {
                match (self.as_const(), rhs.as_const()) {
                    (Some(a), Some(b)) => Expr::constant(a $op b),
                    _ => Expr(Rc::new(Node::$node(self, rhs))),
                }
            }
        }
        impl $trait<f64> for Expr {
            type Output = Expr;
            #[inline]
            fn $method(self, rhs: f64) -> Expr {
                self.$method(Expr::constant(rhs))
            }
        }
    };
}

binary_op!(Add, add, Add, +);
binary_op!(Sub, sub, Sub, -);
binary_op!(Mul, mul, Mul, *);
binary_op!(Div, div, Div, /);

impl Neg for Expr {
    type Output = Expr;
    #[inline]
    fn neg(self) -> Expr {
        match self.as_const() {
            Some(c) => Expr::constant(-c),
            None => Expr(Rc::new(Node::Neg(self))),
        }
    }
}

impl Scalar for Expr {
    #[inline]
    fn value(&self) -> f64 {
        self.eval()
    }
}

/// Backend producing `Expr` scalars; owns the trainable variables of one run.
#[derive(Debug)]
pub struct ExprBackend {
    init: VarInit,
    rng: StdRng,
    vars: Vec<Rc<Var>>,
}

impl Default for ExprBackend {
    fn default() -> Self {
        Self::new(VarInit::default())
    }
}

impl ExprBackend {
    pub fn new(init: VarInit) -> Self {
        Self {
            init,
            rng: StdRng::seed_from_u64(init.seed()),
            vars: Vec::new(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(VarInit::Uniform { seed })
    }

    /// Trainable variables in creation order (`vars()[i].index() == i`).
    pub fn variables(&self) -> &[Rc<Var>] {
        &self.vars
    }

    /// Current values of all variables.
    pub fn values(&self) -> Vec<f64> {
        self.vars.iter().map(|v| v.value()).collect()
    }
}

impl Backend for ExprBackend {
    type Scalar = Expr;

    #[inline]
    fn constant(&self, v: f64) -> Expr {
        Expr::constant(v)
    }

    fn variable(&mut self, spec: VarSpec<'_>) -> Result<Expr, BackendError> {
        spec.validate()?;
        let v0 = self.init.draw(&mut self.rng, spec.lo, spec.hi);
        let var = Rc::new(Var {
            name: spec.name.to_owned(),
            index: self.vars.len(),
            value: Cell::new(v0),
        });
        self.vars.push(Rc::clone(&var));
        Ok(Expr::var(var))
    }

    fn sqrt(&self, x: &Expr) -> Expr {
        Expr::unary(Unary::Sqrt, x.clone())
    }
    fn sin(&self, x: &Expr) -> Expr {
        Expr::unary(Unary::Sin, x.clone())
    }
    fn cos(&self, x: &Expr) -> Expr {
        Expr::unary(Unary::Cos, x.clone())
    }
    fn acos(&self, x: &Expr) -> Expr {
        Expr::unary(Unary::Acos, x.clone())
    }
    fn tanh(&self, x: &Expr) -> Expr {
        Expr::unary(Unary::Tanh, x.clone())
    }
    fn sigmoid(&self, x: &Expr) -> Expr {
        Expr::unary(Unary::Sigmoid, x.clone())
    }
    fn max(&self, a: &Expr, b: &Expr) -> Expr {
        Expr::max(a.clone(), b.clone())
    }

    fn simplify(&self, p: Point<Expr>, method: SimplifyMethod) -> Point<Expr> {
        Point::new(p.x.simplify(method), p.y.simplify(method))
    }
}
