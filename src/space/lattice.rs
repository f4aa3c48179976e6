//! Toroidal lattice addressing of a space's children.

use std::sync::Arc;

use rand::Rng;

use crate::error::{MetaModelError, Result};

use super::{ChildConstraint, Dataset, Space, SpaceNode};

/// Shape of a wrap-around grid of sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lattice {
    pub x_size: usize,
    pub y_size: usize,
}

/// Neighbour filter for lattice queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Empty,
    Occupied,
}

impl Occupancy {
    fn admits(self, site: &Space) -> bool {
        match self {
            Occupancy::Empty => site.is_empty(),
            Occupancy::Occupied => !site.is_empty(),
        }
    }
}

impl Lattice {
    pub fn new(x_size: usize, y_size: usize) -> Self {
        Self { x_size, y_size }
    }

    pub fn cell_count(&self) -> usize {
        self.x_size * self.y_size
    }

    /// Child index of the site at `(x, y)`.
    pub fn index(&self, x: usize, y: usize) -> usize {
        x * self.y_size + y
    }

    /// Map a coordinate one step outside the grid back onto it.
    pub fn wrap_x(&self, x: isize) -> usize {
        wrap(x, self.x_size)
    }

    pub fn wrap_y(&self, y: isize) -> usize {
        wrap(y, self.y_size)
    }

    /// Coordinates of the (up to) eight sites around `(x, y)`.
    pub fn neighbourhood(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut cells = Vec::with_capacity(8);
        for dx in -1..=1isize {
            for dy in -1..=1isize {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let cell = (self.wrap_x(x as isize + dx), self.wrap_y(y as isize + dy));
                if cell != (x, y) && !cells.contains(&cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}

fn wrap(v: isize, size: usize) -> usize {
    let size = size as isize;
    let mapped = if v < 0 {
        v + size
    } else if v >= size {
        v - size
    } else {
        v
    };
    mapped as usize
}

impl Space {
    /// A toroidal world of `x_size * y_size` empty sites.
    pub fn toroidal(x_size: usize, y_size: usize, dataset: Option<Arc<dyn Dataset>>) -> Space {
        let lattice = Lattice::new(x_size, y_size);
        let mut node = SpaceNode::new(ChildConstraint::Any);
        node.lattice = Some(lattice);
        node.dataset = dataset;
        let world = Space::from_node(node);
        {
            let mut children = world.node.children.lock();
            for x in 0..x_size {
                for y in 0..y_size {
                    let site = Space::site(x, y);
                    *site.node.parent.lock() = std::sync::Arc::downgrade(&world.node);
                    children.push(site);
                }
            }
        }
        world
    }

    fn require_lattice(&self) -> Result<Lattice> {
        self.lattice()
            .ok_or(MetaModelError::NotALattice(self.id()))
    }

    /// The site at `(x, y)`.
    pub fn cell(&self, x: usize, y: usize) -> Result<Space> {
        let lattice = self.require_lattice()?;
        self.child(lattice.index(x, y))
            .ok_or(MetaModelError::NotALattice(self.id()))
    }

    /// Sites adjacent to `(x, y)` with the given occupancy.
    pub fn neighbours(&self, x: usize, y: usize, occupancy: Occupancy) -> Result<Vec<Space>> {
        let lattice = self.require_lattice()?;
        let children = self.children();
        Ok(lattice
            .neighbourhood(x, y)
            .into_iter()
            .filter_map(|(nx, ny)| children.get(lattice.index(nx, ny)).cloned())
            .filter(|site| occupancy.admits(site))
            .collect())
    }

    /// Neighbours of a site, looked up through its containing lattice.
    pub fn site_neighbours(&self, occupancy: Occupancy) -> Result<Vec<Space>> {
        let (x, y) = self
            .position()
            .ok_or(MetaModelError::NotALattice(self.id()))?;
        let world = self
            .parent()
            .ok_or(MetaModelError::NotALattice(self.id()))?;
        world.neighbours(x, y, occupancy)
    }

    /// A uniformly chosen empty site, or `None` if every site is occupied.
    pub fn random_empty_cell<R: Rng>(&self, rng: &mut R) -> Result<Option<Space>> {
        self.require_lattice()?;
        let empty: Vec<Space> = self
            .children()
            .into_iter()
            .filter(Space::is_empty)
            .collect();
        if empty.is_empty() {
            return Ok(None);
        }
        Ok(Some(empty[rng.gen_range(0..empty.len())].clone()))
    }

    /// Number of occupied sites.
    pub fn occupied_count(&self) -> usize {
        self.children().iter().filter(|site| !site.is_empty()).count()
    }
}
