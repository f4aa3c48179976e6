//! Space module - The spatial container hierarchy individuals live in.
//!
//! Every node of the hierarchy is a [`Space`]: a shared handle with a weak
//! link to its container and a mutex-guarded, ordered list of children.
//! Nodes differ by composition rather than by type:
//!
//! - a **child constraint** (sites only accept individuals),
//! - optional **lattice** addressing of the children (toroidal worlds),
//! - an optional **organism** state, which makes the node an [`Individual`].

mod dataset;
mod individual;
mod lattice;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{MetaModelError, Result};

pub use dataset::*;
pub use individual::*;
pub use lattice::*;

use individual::Organism;

static NEXT_SPACE_ID: AtomicU64 = AtomicU64::new(0);

/// What a space accepts as children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildConstraint {
    #[default]
    Any,
    IndividualsOnly,
}

pub(crate) struct SpaceNode {
    id: u64,
    parent: Mutex<Weak<SpaceNode>>,
    children: Mutex<Vec<Space>>,
    constraint: ChildConstraint,
    lattice: Option<Lattice>,
    position: Option<(usize, usize)>,
    run_count: AtomicU64,
    dataset: Option<Arc<dyn Dataset>>,
    organism: Option<Arc<Organism>>,
}

impl SpaceNode {
    pub(crate) fn new(constraint: ChildConstraint) -> Self {
        Self {
            id: NEXT_SPACE_ID.fetch_add(1, Ordering::Relaxed),
            parent: Mutex::new(Weak::new()),
            children: Mutex::new(Vec::new()),
            constraint,
            lattice: None,
            position: None,
            run_count: AtomicU64::new(0),
            dataset: None,
            organism: None,
        }
    }
}

/// Shared handle to a node of the space hierarchy.
#[derive(Clone)]
pub struct Space {
    node: Arc<SpaceNode>,
}

/// Non-owning reference to a space.
#[derive(Clone, Default)]
pub struct WeakSpace(Weak<SpaceNode>);

impl WeakSpace {
    pub fn upgrade(&self) -> Option<Space> {
        self.0.upgrade().map(|node| Space { node })
    }
}

impl fmt::Debug for WeakSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(space) => write!(f, "WeakSpace({})", space.id()),
            None => write!(f, "WeakSpace(gone)"),
        }
    }
}

impl Space {
    pub(crate) fn from_node(node: SpaceNode) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// An unconstrained container with no parent.
    pub fn container() -> Self {
        Self::from_node(SpaceNode::new(ChildConstraint::Any))
    }

    /// An unconstrained container offering `dataset` to everything inside it.
    pub fn with_dataset(dataset: Arc<dyn Dataset>) -> Self {
        let mut node = SpaceNode::new(ChildConstraint::Any);
        node.dataset = Some(dataset);
        Self::from_node(node)
    }

    /// A site at `(x, y)` that only holds individuals.
    pub fn site(x: usize, y: usize) -> Self {
        let mut node = SpaceNode::new(ChildConstraint::IndividualsOnly);
        node.position = Some((x, y));
        Self::from_node(node)
    }

    pub(crate) fn with_organism(organism: Arc<Organism>) -> Self {
        let mut node = SpaceNode::new(ChildConstraint::Any);
        node.organism = Some(organism);
        Self::from_node(node)
    }

    pub fn id(&self) -> u64 {
        self.node.id
    }

    pub fn downgrade(&self) -> WeakSpace {
        WeakSpace(Arc::downgrade(&self.node))
    }

    pub fn constraint(&self) -> ChildConstraint {
        self.node.constraint
    }

    pub fn lattice(&self) -> Option<Lattice> {
        self.node.lattice
    }

    /// Coordinates of a lattice site.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.node.position
    }

    /// The containing space, if any.
    pub fn parent(&self) -> Option<Space> {
        self.node.parent.lock().upgrade().map(|node| Space { node })
    }

    pub fn is_individual(&self) -> bool {
        self.node.organism.is_some()
    }

    pub fn as_individual(&self) -> Option<Individual> {
        Individual::from_space(self.clone())
    }

    pub(crate) fn organism(&self) -> Option<&Arc<Organism>> {
        self.node.organism.as_ref()
    }

    /// The dataset attached to this space or the nearest ancestor.
    pub fn dataset(&self) -> Option<Arc<dyn Dataset>> {
        let mut current = Some(self.clone());
        while let Some(space) = current {
            if let Some(dataset) = &space.node.dataset {
                return Some(Arc::clone(dataset));
            }
            current = space.parent();
        }
        None
    }

    pub fn run_count(&self) -> u64 {
        self.node.run_count.load(Ordering::Relaxed)
    }

    /// Count one more run of this space, returning the new count.
    pub fn increment_run_count(&self) -> u64 {
        self.node.run_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn check_child(&self, child: &Space) -> Result<()> {
        if self.node.constraint == ChildConstraint::IndividualsOnly && !child.is_individual() {
            return Err(MetaModelError::NotAnIndividual(self.id()));
        }
        Ok(())
    }

    /// Move `child` out of its current container and point it at this one.
    fn adopt(&self, child: &Space) {
        if let Some(old) = child.parent()
            && old != *self
        {
            old.remove_child(child);
        }
        *child.node.parent.lock() = Arc::downgrade(&self.node);
        if self.node.constraint == ChildConstraint::IndividualsOnly {
            self.node.run_count.store(0, Ordering::Relaxed);
        }
    }

    /// Append a child, moving it out of its previous container.
    pub fn add_child(&self, child: Space) -> Result<()> {
        self.check_child(&child)?;
        self.adopt(&child);
        let mut children = self.node.children.lock();
        if !children.contains(&child) {
            children.push(child);
        }
        Ok(())
    }

    /// Insert a child at `index` (clamped to the end).
    pub fn insert_child(&self, index: usize, child: Space) -> Result<()> {
        self.check_child(&child)?;
        self.adopt(&child);
        let mut children = self.node.children.lock();
        if !children.contains(&child) {
            let index = index.min(children.len());
            children.insert(index, child);
        }
        Ok(())
    }

    /// Add a child only if this space holds nothing yet.
    ///
    /// Returns whether the child was placed. The emptiness check and the
    /// insertion happen under one lock.
    pub fn add_child_if_empty(&self, child: Space) -> Result<bool> {
        self.check_child(&child)?;
        let mut children = self.node.children.lock();
        if !children.is_empty() {
            return Ok(false);
        }
        *child.node.parent.lock() = Arc::downgrade(&self.node);
        if self.node.constraint == ChildConstraint::IndividualsOnly {
            self.node.run_count.store(0, Ordering::Relaxed);
        }
        children.push(child);
        Ok(true)
    }

    /// Remove a child. Its back-reference is left as it was.
    pub fn remove_child(&self, child: &Space) -> bool {
        let mut children = self.node.children.lock();
        match children.iter().position(|c| c == child) {
            Some(index) => {
                children.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every child, returning them.
    pub fn clear(&self) -> Vec<Space> {
        std::mem::take(&mut *self.node.children.lock())
    }

    /// Snapshot of the children.
    pub fn children(&self) -> Vec<Space> {
        self.node.children.lock().clone()
    }

    pub fn child(&self, index: usize) -> Option<Space> {
        self.node.children.lock().get(index).cloned()
    }

    pub fn first_child(&self) -> Option<Space> {
        self.child(0)
    }

    pub fn child_count(&self) -> usize {
        self.node.children.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.node.children.lock().is_empty()
    }

    pub fn position_of(&self, child: &Space) -> Option<usize> {
        self.node.children.lock().iter().position(|c| c == child)
    }

    /// The children that are individuals.
    pub fn individuals(&self) -> Vec<Individual> {
        self.children()
            .into_iter()
            .filter_map(Individual::from_space)
            .collect()
    }

    /// A detached copy of this space's shape.
    ///
    /// Children are cloned recursively; organism state, run counts and the
    /// parent link start fresh. The caller decides where the copy goes.
    pub(crate) fn clone_shell_with(&self, organism: Option<Arc<Organism>>) -> Space {
        let mut node = SpaceNode::new(self.node.constraint);
        node.lattice = self.node.lattice;
        node.position = self.node.position;
        node.dataset = self.node.dataset.clone();
        node.organism = organism;
        let shell = Space::from_node(node);
        let children: Vec<Space> = self
            .children()
            .iter()
            .map(|child| {
                let organism = child.organism().map(|_| Arc::new(Organism::default()));
                let copy = child.clone_shell_with(organism);
                *copy.node.parent.lock() = Arc::downgrade(&shell.node);
                copy
            })
            .collect();
        *shell.node.children.lock() = children;
        shell
    }
}

impl PartialEq for Space {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Space {}

impl fmt::Debug for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Space");
        s.field("id", &self.id());
        if let Some(position) = self.position() {
            s.field("position", &position);
        }
        s.field("children", &self.child_count())
            .field("individual", &self.is_individual())
            .finish()
    }
}
