//! Closed method enums and their identifier parsing.
//!
//! Everything downstream of `from_id` matches exhaustively; an identifier
//! outside these tables surfaces as `CompileError::UnsupportedMethod`.

use super::error::{CompileError, MethodKind};
use crate::sample::TriangleShape;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sampler {
    Uniform,
    Polygon,
    Triangle(TriangleShape),
}

impl Sampler {
    /// `args[0]` names the shape vertex for `isoTri`, `acuteIsoTri`, `rightTri`.
    pub fn from_id(id: &str, args: &[String]) -> Result<Self, CompileError> {
        let vertex = || {
            args.first().cloned().ok_or_else(|| {
                CompileError::contract(format!("sampler `{id}` needs the shape vertex as args[0]"))
            })
        };
        let plain = TriangleShape::default();
        Ok(match id {
            "uniform" => Sampler::Uniform,
            "polygon" => Sampler::Polygon,
            "triangle" => Sampler::Triangle(plain),
            "isoTri" => Sampler::Triangle(TriangleShape {
                iso: Some(vertex()?),
                ..plain
            }),
            "acuteTri" => Sampler::Triangle(TriangleShape {
                acute: true,
                ..plain
            }),
            "acuteIsoTri" => Sampler::Triangle(TriangleShape {
                iso: Some(vertex()?),
                acute: true,
                ..plain
            }),
            "rightTri" => Sampler::Triangle(TriangleShape {
                right: Some(vertex()?),
                ..plain
            }),
            "equiTri" => Sampler::Triangle(TriangleShape {
                equi: true,
                ..plain
            }),
            _ => return Err(CompileError::unsupported(MethodKind::Sampling, id)),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComputeMethod {
    /// `[A, B]`
    Midp,
    /// `[M, A]`: the endpoint B with midpoint M of AB.
    MidpFrom,
    Circumcenter,
    Orthocenter,
    Centroid,
    Incenter,
    /// Two line operands; every other method takes points.
    InterLL,
}

impl ComputeMethod {
    pub fn from_id(id: &str) -> Result<Self, CompileError> {
        Ok(match id {
            "midp" => ComputeMethod::Midp,
            "midpFrom" => ComputeMethod::MidpFrom,
            "circumcenter" => ComputeMethod::Circumcenter,
            "orthocenter" => ComputeMethod::Orthocenter,
            "centroid" => ComputeMethod::Centroid,
            "incenter" => ComputeMethod::Incenter,
            "interLL" => ComputeMethod::InterLL,
            _ => return Err(CompileError::unsupported(MethodKind::Computation, id)),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parameterization {
    /// Both coordinates free.
    Coords,
}

impl Parameterization {
    pub fn from_id(id: &str) -> Result<Self, CompileError> {
        match id {
            "coords" => Ok(Parameterization::Coords),
            _ => Err(CompileError::unsupported(MethodKind::Parameterization, id)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// `[A, B, C, D]`: AB ⟂ CD.
    Perp,
    /// `[A, B, C, D]`: AB ∥ CD.
    Para,
    /// `[A, B, C, D]`: |AB| = |CD|.
    Cong,
    /// `[M, A, B]`: M is the midpoint of AB.
    Midp,
    /// `[A, B, C]`
    Coll,
    /// `[X, A, B]`: X lies between A and B.
    Between,
    /// `[X, O, A]`: X on the circle centered O through A.
    OnCirc,
    /// `[A, B, C, D]`: D on the circumcircle of ABC.
    Concyc,
}

impl Predicate {
    pub fn from_id(id: &str) -> Result<Self, CompileError> {
        Ok(match id {
            "perp" => Predicate::Perp,
            "para" => Predicate::Para,
            "cong" => Predicate::Cong,
            "midp" => Predicate::Midp,
            "coll" => Predicate::Coll,
            "between" => Predicate::Between,
            "onCirc" => Predicate::OnCirc,
            "concyc" => Predicate::Concyc,
            _ => return Err(CompileError::unsupported(MethodKind::Predicate, id)),
        })
    }

    pub fn arity(self) -> usize {
        match self {
            Predicate::Perp | Predicate::Para | Predicate::Cong | Predicate::Concyc => 4,
            Predicate::Midp | Predicate::Coll | Predicate::Between | Predicate::OnCirc => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sampler_ids() {
        assert_eq!(Sampler::from_id("uniform", &[]).unwrap(), Sampler::Uniform);
        match Sampler::from_id("acuteIsoTri", &args(&["B"])).unwrap() {
            Sampler::Triangle(s) => {
                assert_eq!(s.iso.as_deref(), Some("B"));
                assert!(s.acute && !s.equi && s.right.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            Sampler::from_id("rightTri", &[]),
            Err(CompileError::ContractViolation(_))
        ));
        assert!(matches!(
            Sampler::from_id("hexagon", &[]),
            Err(CompileError::UnsupportedMethod {
                kind: MethodKind::Sampling,
                ..
            })
        ));
    }

    #[test]
    fn unknown_ids_name_their_namespace() {
        let kind = |e: CompileError| match e {
            CompileError::UnsupportedMethod { kind, .. } => kind,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(
            kind(ComputeMethod::from_id("foot").unwrap_err()),
            MethodKind::Computation
        );
        assert_eq!(
            kind(Parameterization::from_id("polar").unwrap_err()),
            MethodKind::Parameterization
        );
        assert_eq!(
            kind(Predicate::from_id("tangent").unwrap_err()),
            MethodKind::Predicate
        );
        assert_eq!(
            ComputeMethod::from_id("interLL"),
            Ok(ComputeMethod::InterLL)
        );
        assert_eq!(Predicate::from_id("concyc").unwrap().arity(), 4);
    }
}
