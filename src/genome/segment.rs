//! Genome segments: ordered runs of gene units sharing one gene type.

use std::fmt;
use std::sync::Arc;

use crate::error::{MetaModelError, Result};
use crate::space::{Space, WeakSpace};

use super::{GeneType, GeneUnit};

/// An ordered sequence of gene units of a single type, bound to the space
/// it executes in.
///
/// The environment is a non-owning back-reference and may be rebound; the
/// code is owned and deep-cloned along with the segment.
#[derive(Clone)]
pub struct GenomeSegment {
    gene_type: Arc<GeneType>,
    code: Vec<GeneUnit>,
    environment: WeakSpace,
}

impl GenomeSegment {
    /// Create a segment executing in `environment`.
    pub fn new(environment: &Space, code: Vec<GeneUnit>, gene_type: &Arc<GeneType>) -> Result<Self> {
        Self::with_environment(environment.downgrade(), code, gene_type)
    }

    /// Create a segment with no environment yet.
    pub fn detached(code: Vec<GeneUnit>, gene_type: &Arc<GeneType>) -> Result<Self> {
        Self::with_environment(WeakSpace::default(), code, gene_type)
    }

    pub fn with_environment(
        environment: WeakSpace,
        code: Vec<GeneUnit>,
        gene_type: &Arc<GeneType>,
    ) -> Result<Self> {
        if let Some(stray) = code.iter().find(|unit| unit.gene_type() != gene_type) {
            return Err(MetaModelError::WrongGeneType {
                expected: gene_type.name().to_string(),
                found: stray.gene_type().name().to_string(),
            });
        }
        Ok(Self {
            gene_type: Arc::clone(gene_type),
            code,
            environment,
        })
    }

    pub fn gene_type(&self) -> &Arc<GeneType> {
        &self.gene_type
    }

    pub fn code(&self) -> &[GeneUnit] {
        &self.code
    }

    pub fn into_code(self) -> Vec<GeneUnit> {
        self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn coding_len(&self) -> usize {
        self.code.iter().filter(|unit| unit.is_coding()).count()
    }

    /// The space this segment executes in, if it is still alive.
    pub fn environment(&self) -> Option<Space> {
        self.environment.upgrade()
    }

    pub fn environment_ref(&self) -> &WeakSpace {
        &self.environment
    }

    pub fn set_environment(&mut self, environment: &Space) {
        self.environment = environment.downgrade();
    }

    /// Copy of this segment keeping only the units accepted by `keep`.
    pub fn filtered(&self, keep: impl Fn(&GeneUnit) -> bool) -> Self {
        Self {
            gene_type: Arc::clone(&self.gene_type),
            code: self.code.iter().filter(|unit| keep(unit)).cloned().collect(),
            environment: self.environment.clone(),
        }
    }
}

impl PartialEq for GenomeSegment {
    fn eq(&self, other: &Self) -> bool {
        self.gene_type == other.gene_type && self.code == other.code
    }
}

impl fmt::Debug for GenomeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenomeSegment")
            .field("gene_type", &self.gene_type.name())
            .field("code", &self.code)
            .field("environment", &self.environment)
            .finish()
    }
}

impl fmt::Display for GenomeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.gene_type.name())?;
        for (i, unit) in self.code.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{unit}")?;
        }
        write!(f, "]")
    }
}
