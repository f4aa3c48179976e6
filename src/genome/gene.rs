//! Gene units: the atomic, cloneable elements of a genome.

use std::fmt;
use std::sync::Arc;

use crate::error::{MetaModelError, Result};

use super::GeneType;

/// Contribution of a clustering gene unit to a core point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointGene {
    pub core_point: u32,
    pub dimension: u32,
    pub value: f64,
}

/// Typed content carried by a gene unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No content; the unit only contributes its presence.
    Empty,
    /// A named symbol such as a city.
    Symbol(String),
    /// A probability in `[0, 1]`.
    Rate(f64),
    /// A small non-negative integer, such as the `k` of a k-opt move.
    Degree(u32),
    /// A clustering contribution.
    Point(PointGene),
}

impl Payload {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Empty => "empty",
            Payload::Symbol(_) => "symbol",
            Payload::Rate(_) => "rate",
            Payload::Degree(_) => "degree",
            Payload::Point(_) => "point",
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => write!(f, "-"),
            Payload::Symbol(name) => write!(f, "{name}"),
            Payload::Rate(rate) => write!(f, "{rate:.4}"),
            Payload::Degree(degree) => write!(f, "{degree}"),
            Payload::Point(p) => write!(f, "({},{},{:.1})", p.core_point, p.dimension, p.value),
        }
    }
}

/// An element of a genome: a gene type, a coding flag and a payload.
///
/// Cloning a unit deep-copies the payload and shares the type. Units are
/// never modified in place except as freshly cloned copies during mutation.
#[derive(Clone)]
pub struct GeneUnit {
    gene_type: Arc<GeneType>,
    coding: bool,
    payload: Payload,
}

impl GeneUnit {
    /// A coding unit of the given type.
    pub fn new(gene_type: &Arc<GeneType>, payload: Payload) -> Self {
        Self {
            gene_type: Arc::clone(gene_type),
            coding: true,
            payload,
        }
    }

    pub fn non_coding(gene_type: &Arc<GeneType>, payload: Payload) -> Self {
        Self::new(gene_type, payload).with_coding(false)
    }

    pub fn with_coding(mut self, coding: bool) -> Self {
        self.coding = coding;
        self
    }

    pub fn gene_type(&self) -> &Arc<GeneType> {
        &self.gene_type
    }

    pub fn is_coding(&self) -> bool {
        self.coding
    }

    pub fn set_coding(&mut self, coding: bool) {
        self.coding = coding;
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    pub fn rate(&self) -> Result<f64> {
        match self.payload {
            Payload::Rate(rate) => Ok(rate),
            ref other => Err(mismatch("rate", other)),
        }
    }

    pub fn degree(&self) -> Result<u32> {
        match self.payload {
            Payload::Degree(degree) => Ok(degree),
            ref other => Err(mismatch("degree", other)),
        }
    }

    pub fn symbol(&self) -> Result<&str> {
        match &self.payload {
            Payload::Symbol(name) => Ok(name),
            other => Err(mismatch("symbol", other)),
        }
    }

    pub fn point(&self) -> Result<&PointGene> {
        match &self.payload {
            Payload::Point(point) => Ok(point),
            other => Err(mismatch("point", other)),
        }
    }

    pub fn point_mut(&mut self) -> Result<&mut PointGene> {
        match &mut self.payload {
            Payload::Point(point) => Ok(point),
            other => Err(mismatch("point", other)),
        }
    }
}

fn mismatch(expected: &'static str, found: &Payload) -> MetaModelError {
    MetaModelError::PayloadMismatch {
        expected,
        found: found.kind(),
    }
}

impl PartialEq for GeneUnit {
    fn eq(&self, other: &Self) -> bool {
        self.gene_type == other.gene_type
            && self.coding == other.coding
            && self.payload == other.payload
    }
}

impl fmt::Debug for GeneUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneUnit")
            .field("gene_type", &self.gene_type.name())
            .field("coding", &self.coding)
            .field("payload", &self.payload)
            .finish()
    }
}

impl fmt::Display for GeneUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coding {
            write!(f, "{}", self.payload)
        } else {
            write!(f, "~{}", self.payload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{MachineKind, MachineRegistry};

    fn point_type() -> Arc<GeneType> {
        GeneType::builder("points", MachineKind::Transcriber)
            .build(&MachineRegistry::with_builtins())
            .unwrap()
    }

    #[test]
    fn test_clone_is_independent() {
        let gene_type = point_type();
        let original = GeneUnit::new(
            &gene_type,
            Payload::Point(PointGene {
                core_point: 1,
                dimension: 2,
                value: 0.5,
            }),
        );
        let mut copy = original.clone();
        copy.point_mut().unwrap().value = 9.0;
        copy.set_coding(false);

        assert_eq!(original.point().unwrap().value, 0.5);
        assert!(original.is_coding());
        assert_ne!(original, copy);
    }

    #[test]
    fn test_payload_accessors_reject_other_kinds() {
        let gene_type = point_type();
        let unit = GeneUnit::new(&gene_type, Payload::Rate(0.25));
        assert_eq!(unit.rate().unwrap(), 0.25);
        assert!(matches!(
            unit.degree(),
            Err(MetaModelError::PayloadMismatch {
                expected: "degree",
                found: "rate"
            })
        ));
    }

    #[test]
    fn test_display_marks_non_coding() {
        let gene_type = point_type();
        let unit = GeneUnit::non_coding(&gene_type, Payload::Symbol("York".into()));
        assert_eq!(unit.to_string(), "~York");
    }
}
