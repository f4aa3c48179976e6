//! Gene types: the policy object shared by every unit of a genome segment.
//!
//! A type names the machine its segments express into (resolved through a
//! [`MachineRegistry`] when the type is built) and the mutation operator used
//! when a segment of this type is copied during replication.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;

use crate::error::{MetaModelError, Result};
use crate::machine::{Capability, Kloner, Machine, MachineConstructor, MachineKind, MachineRegistry};

use super::{GeneUnit, GenomeSegment};

/// Mutation operator: produces the (possibly altered) code of a copy.
pub type Mutator = Arc<dyn Fn(&[GeneUnit], &Kloner) -> Result<Vec<GeneUnit>> + Send + Sync>;

static NEXT_GENE_TYPE_ID: AtomicU64 = AtomicU64::new(0);

/// Type-and-policy of a family of genome segments.
pub struct GeneType {
    id: u64,
    name: String,
    kind: MachineKind,
    capability: Capability,
    essential: bool,
    constructor: MachineConstructor,
    mutator: Mutator,
}

/// Builder for [`GeneType`].
pub struct GeneTypeBuilder {
    name: String,
    kind: MachineKind,
    mutator: Option<Mutator>,
}

impl GeneTypeBuilder {
    /// Replace the default exact-copy mutation operator.
    pub fn mutator<F>(mut self, mutator: F) -> Self
    where
        F: Fn(&[GeneUnit], &Kloner) -> Result<Vec<GeneUnit>> + Send + Sync + 'static,
    {
        self.mutator = Some(Arc::new(mutator));
        self
    }

    pub fn shared_mutator(mut self, mutator: Mutator) -> Self {
        self.mutator = Some(mutator);
        self
    }

    /// Resolve the machine constructor and finish the type.
    pub fn build(self, registry: &MachineRegistry) -> Result<Arc<GeneType>> {
        let registration = registry.resolve(&self.kind)?;
        Ok(Arc::new(GeneType {
            id: NEXT_GENE_TYPE_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            kind: self.kind,
            capability: registration.capability,
            essential: registration.essential,
            constructor: Arc::clone(&registration.constructor),
            mutator: self.mutator.unwrap_or_else(GeneType::exact_copy),
        }))
    }
}

impl GeneType {
    pub fn builder(name: impl Into<String>, kind: MachineKind) -> GeneTypeBuilder {
        GeneTypeBuilder {
            name: name.into(),
            kind,
            mutator: None,
        }
    }

    /// The default mutation operator: a faithful deep copy.
    pub fn exact_copy() -> Mutator {
        Arc::new(|code: &[GeneUnit], _: &Kloner| Ok(code.to_vec()))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &MachineKind {
        &self.kind
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Whether every viable individual must carry an expressed machine of this type.
    pub fn is_essential(&self) -> bool {
        self.essential
    }

    /// Build the machine described by a segment of this type.
    pub fn construct(&self, segment: GenomeSegment) -> Result<Arc<dyn Machine>> {
        self.check(&segment)?;
        (self.constructor)(segment)
    }

    /// Apply this type's mutation operator to a copy of `segment`.
    ///
    /// The resulting segment keeps the environment of the original.
    pub fn mutate(&self, segment: &GenomeSegment, carrier: &Kloner) -> Result<GenomeSegment> {
        self.check(segment)?;
        let code = (self.mutator)(segment.code(), carrier)?;
        trace!(
            "Mutated '{}' segment from {} to {} units",
            self.name,
            segment.len(),
            code.len()
        );
        GenomeSegment::with_environment(
            segment.environment_ref().clone(),
            code,
            segment.gene_type(),
        )
    }

    fn check(&self, segment: &GenomeSegment) -> Result<()> {
        if segment.gene_type().id != self.id {
            return Err(MetaModelError::WrongGeneType {
                expected: self.name.clone(),
                found: segment.gene_type().name.clone(),
            });
        }
        Ok(())
    }
}

impl PartialEq for GeneType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GeneType {}

impl fmt::Debug for GeneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("essential", &self.essential)
            .finish()
    }
}

impl fmt::Display for GeneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
