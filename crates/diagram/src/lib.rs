//! Constraint-driven construction of planar diagrams.
//!
//! Purpose
//! - Turn an ordered instruction stream (sample, compute, parameterize, assert)
//!   into a named point table plus a weighted table of scalar loss terms whose
//!   joint minimum is a diagram satisfying the asserted constraints.
//! - Ship the computational-geometry library the compiler relies on (centers,
//!   barycentric/trilinear maps, line normal forms, predicate residuals) and the
//!   samplers that place free points, polygons and shaped triangles.
//!
//! Layout
//! - `backend`: the numeric capability set everything else is written against,
//!   with a plain `f64` implementation and a differentiable expression graph.
//! - `point`, `geom`, `sample`: point algebra, geometry, initial placements.
//! - `compile`: instruction types, method identifiers, tables, the compiler.
//! - `optim`: gradient descent over expression-graph variables.
//!
//! API Policy
//! - Project-internal crate; breaking changes are fine when they improve clarity.

pub mod backend;
pub mod compile;
pub mod geom;
pub mod optim;
pub mod point;
pub mod sample;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use backend::{Backend, BackendError, Scalar, SimplifyMethod, VarInit, VarSpec};
pub use compile::{
    compile, CompileCfg, CompileError, Compiled, Compiler, Instruction, LossTable, LossTerm,
    PointTable,
};
pub use point::Point;

/// Common exports for callers that compile and solve diagrams.
pub mod prelude {
    pub use crate::backend::{
        expr::{Expr, ExprBackend, Var},
        float::FloatBackend,
        Backend, Scalar, SimplifyMethod, VarInit, VarSpec,
    };
    pub use crate::compile::{
        compile, CompileCfg, CompileError, Compiled, Compiler, Computation, Constraint,
        Instruction, Line, Operand,
    };
    pub use crate::optim::{minimize, OptimCfg, OptimError, OptimReport};
    pub use crate::point::Point;
    pub use nalgebra::Vector2 as Vec2;
}
