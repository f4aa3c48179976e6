//! Explicit registry of machine constructors.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{MetaModelError, Result};
use crate::genome::GenomeSegment;

use super::{Capability, Kloner, Machine, Reproducer, Transcriber, Translator};

/// Builds a machine from the segment that describes it.
pub type MachineConstructor =
    Arc<dyn Fn(GenomeSegment) -> Result<Arc<dyn Machine>> + Send + Sync>;

/// Tag naming a machine constructor in a [`MachineRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MachineKind {
    Transcriber,
    Translator,
    Kloner,
    Reproducer,
    Named(String),
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineKind::Named(name) => write!(f, "{name}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Constructor and policy registered for a machine kind.
#[derive(Clone)]
pub struct Registration {
    pub capability: Capability,
    pub essential: bool,
    pub constructor: MachineConstructor,
}

/// Maps machine kinds to their constructors.
#[derive(Clone, Default)]
pub struct MachineRegistry {
    entries: HashMap<MachineKind, Registration>,
}

impl MachineRegistry {
    /// A registry with no kinds at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry knowing the gene expression and replication machines.
    ///
    /// Transcribers and translators are essential: every new individual gets
    /// them expressed during replication.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            MachineKind::Transcriber,
            Capability::Transcriber,
            true,
            |segment| Ok(Arc::new(Transcriber::new(segment)) as Arc<dyn Machine>),
        );
        registry.register(
            MachineKind::Translator,
            Capability::Translator,
            true,
            |segment| Ok(Arc::new(Translator::new(segment)) as Arc<dyn Machine>),
        );
        registry.register(
            MachineKind::Kloner,
            Capability::Kloner,
            false,
            |segment| Ok(Arc::new(Kloner::new(segment)) as Arc<dyn Machine>),
        );
        registry.register(
            MachineKind::Reproducer,
            Capability::Reproducer,
            false,
            |segment| Ok(Arc::new(Reproducer::new(segment)) as Arc<dyn Machine>),
        );
        registry
    }

    /// Register (or replace) the constructor for a kind.
    pub fn register<F>(&mut self, kind: MachineKind, capability: Capability, essential: bool, constructor: F)
    where
        F: Fn(GenomeSegment) -> Result<Arc<dyn Machine>> + Send + Sync + 'static,
    {
        self.entries.insert(
            kind,
            Registration {
                capability,
                essential,
                constructor: Arc::new(constructor),
            },
        );
    }

    pub fn resolve(&self, kind: &MachineKind) -> Result<&Registration> {
        self.entries
            .get(kind)
            .ok_or_else(|| MetaModelError::UnknownMachineKind(kind.to_string()))
    }

    pub fn contains(&self, kind: &MachineKind) -> bool {
        self.entries.contains_key(kind)
    }
}

impl fmt::Debug for MachineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let registry = MachineRegistry::with_builtins();
        for kind in [
            MachineKind::Transcriber,
            MachineKind::Translator,
            MachineKind::Kloner,
            MachineKind::Reproducer,
        ] {
            assert!(registry.contains(&kind), "{kind} missing");
        }
        assert!(!registry.contains(&MachineKind::Named("calculator".into())));
    }

    #[test]
    fn test_register_replaces_entry() {
        let mut registry = MachineRegistry::with_builtins();
        registry.register(MachineKind::Kloner, Capability::Custom("spare"), true, |segment| {
            Ok(Arc::new(Kloner::new(segment)) as Arc<dyn Machine>)
        });
        let registration = registry.resolve(&MachineKind::Kloner).unwrap();
        assert_eq!(registration.capability, Capability::Custom("spare"));
        assert!(registration.essential);
    }
}
