//! Instruction stream as delivered by the problem parser.
//!
//! Method identifiers stay strings here; the compiler maps them onto closed
//! enums (`methods`) and rejects anything it does not know. The serde layout
//! is internally tagged by `kind`:
//!
//! ```json
//! {"kind": "sample", "points": ["A", "B", "C"], "sampler": "acuteTri"}
//! {"kind": "compute", "point": "H", "computation": {"method": "orthocenter", "operands": ["A", "B", "C"]}}
//! {"kind": "compute", "point": "X", "computation": {"method": "interLL", "operands": [
//!     {"pred": "connecting", "points": ["A", "B"]}, {"pred": "mediator", "points": ["C", "D"]}]}}
//! {"kind": "assert", "constraint": {"pred": "perp", "points": ["A", "H", "B", "C"]}}
//! ```

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    Sample {
        points: Vec<String>,
        sampler: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Compute {
        point: String,
        computation: Computation,
    },
    Parameterize {
        point: String,
        parameterization: String,
    },
    Assert {
        constraint: Constraint,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Computation {
    pub method: String,
    pub operands: Vec<Operand>,
}

/// A computation operand: a point name or a line specification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Point(String),
    Line(Line),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub pred: String,
    pub points: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub pred: String,
    pub points: Vec<String>,
    #[serde(default)]
    pub negate: bool,
}

fn names(ps: &[&str]) -> Vec<String> {
    ps.iter().map(|p| (*p).to_owned()).collect()
}

impl Instruction {
    pub fn sample(sampler: &str, points: &[&str]) -> Self {
        Self::sample_with(sampler, points, &[])
    }

    pub fn sample_with(sampler: &str, points: &[&str], args: &[&str]) -> Self {
        Instruction::Sample {
            points: names(points),
            sampler: sampler.to_owned(),
            args: names(args),
        }
    }

    pub fn compute(point: &str, method: &str, operands: Vec<Operand>) -> Self {
        Instruction::Compute {
            point: point.to_owned(),
            computation: Computation {
                method: method.to_owned(),
                operands,
            },
        }
    }

    /// Computation whose operands are all point names.
    pub fn compute_pts(point: &str, method: &str, points: &[&str]) -> Self {
        Self::compute(point, method, points.iter().map(|&p| Operand::from(p)).collect())
    }

    pub fn parameterize(point: &str, parameterization: &str) -> Self {
        Instruction::Parameterize {
            point: point.to_owned(),
            parameterization: parameterization.to_owned(),
        }
    }

    pub fn assert(pred: &str, points: &[&str]) -> Self {
        Instruction::Assert {
            constraint: Constraint {
                pred: pred.to_owned(),
                points: names(points),
                negate: false,
            },
        }
    }
}

impl Line {
    pub fn new(pred: &str, points: &[&str]) -> Self {
        Self {
            pred: pred.to_owned(),
            points: names(points),
        }
    }
}

impl From<&str> for Operand {
    fn from(p: &str) -> Self {
        Operand::Point(p.to_owned())
    }
}

impl From<Line> for Operand {
    fn from(l: Line) -> Self {
        Operand::Line(l)
    }
}
