//! Named cities and the symmetric distances between them.

use std::collections::HashMap;

use crate::error::{MetaModelError, Result};

/// A set of cities with symmetric pairwise distances.
///
/// Distances are stored once per unordered pair; the first distance
/// recorded for a pair is kept.
#[derive(Debug, Clone, Default)]
pub struct CityMap {
    names: Vec<String>,
    index: HashMap<String, usize>,
    distances: HashMap<(usize, usize), f64>,
}

fn pair(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

impl CityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cities at planar coordinates, with every pair joined by its
    /// euclidean distance.
    pub fn from_coordinates(cities: &[(&str, f64, f64)]) -> Result<Self> {
        let mut map = Self::new();
        for (name, _, _) in cities {
            map.add_city(name);
        }
        for (i, (from, x1, y1)) in cities.iter().enumerate() {
            for (to, x2, y2) in &cities[i + 1..] {
                map.add_distance(from, to, (x1 - x2).hypot(y1 - y2))?;
            }
        }
        Ok(map)
    }

    /// `count` cities named `c0, c1, ...` evenly spaced on the unit circle.
    /// The optimal tour visits them in index order.
    pub fn on_circle(count: usize) -> Result<Self> {
        let cities: Vec<(String, f64, f64)> = (0..count)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / count as f64;
                (format!("c{i}"), angle.cos(), angle.sin())
            })
            .collect();
        let named: Vec<(&str, f64, f64)> = cities.iter().map(|(n, x, y)| (n.as_str(), *x, *y)).collect();
        Self::from_coordinates(&named)
    }

    /// Add a city, answering its index. Adding a known name is a no-op.
    pub fn add_city(&mut self, name: &str) -> usize {
        if let Some(&index) = self.index.get(name) {
            return index;
        }
        let index = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), index);
        index
    }

    /// Record the distance between two known, distinct cities.
    pub fn add_distance(&mut self, from: &str, to: &str, distance: f64) -> Result<()> {
        let a = self.lookup(from)?;
        let b = self.lookup(to)?;
        if a == b {
            return Err(MetaModelError::Data(format!(
                "cannot set a distance from '{from}' to itself"
            )));
        }
        self.distances.entry(pair(a, b)).or_insert(distance);
        Ok(())
    }

    pub fn distance(&self, from: &str, to: &str) -> Result<f64> {
        let key = pair(self.lookup(from)?, self.lookup(to)?);
        self.distances.get(&key).copied().ok_or_else(|| {
            MetaModelError::Data(format!("no distance between '{from}' and '{to}'"))
        })
    }

    /// Length of the closed tour visiting `route` in order and returning to its start.
    pub fn tour_length(&self, route: &[&str]) -> Result<f64> {
        if route.len() < 2 {
            return Err(MetaModelError::DegenerateGenome(format!(
                "route of {} cities is not a journey",
                route.len()
            )));
        }
        let mut total = 0.0;
        for leg in route.windows(2) {
            total += self.distance(leg[0], leg[1])?;
        }
        total += self.distance(route[route.len() - 1], route[0])?;
        Ok(total)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn city_count(&self) -> usize {
        self.names.len()
    }

    fn lookup(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| MetaModelError::Data(format!("unknown city '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uk() -> CityMap {
        let mut map = CityMap::new();
        for name in ["Birmingham", "London", "Liverpool", "York"] {
            map.add_city(name);
        }
        map.add_distance("Birmingham", "London", 2.87).unwrap();
        map.add_distance("Birmingham", "Liverpool", 2.18).unwrap();
        map.add_distance("Birmingham", "York", 2.47).unwrap();
        map.add_distance("London", "York", 4.02).unwrap();
        map.add_distance("Liverpool", "York", 2.43).unwrap();
        map.add_distance("Liverpool", "London", 4.43).unwrap();
        map
    }

    #[test]
    fn test_distances_are_symmetric() {
        let map = uk();
        assert_eq!(map.distance("York", "Liverpool").unwrap(), 2.43);
        assert_eq!(map.distance("Liverpool", "York").unwrap(), 2.43);
    }

    #[test]
    fn test_first_distance_wins() {
        let mut map = uk();
        map.add_distance("York", "London", 99.0).unwrap();
        assert_eq!(map.distance("London", "York").unwrap(), 4.02);
    }

    #[test]
    fn test_tour_length_is_closed() {
        let map = uk();
        let length = map
            .tour_length(&["Birmingham", "London", "York", "Liverpool"])
            .unwrap();
        assert!((length - (2.87 + 4.02 + 2.43 + 2.18)).abs() < 1e-12);
        assert!((map.tour_length(&["York", "London"]).unwrap() - 8.04).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_and_unknown_routes() {
        let map = uk();
        assert!(matches!(
            map.tour_length(&["York"]),
            Err(MetaModelError::DegenerateGenome(_))
        ));
        assert!(matches!(
            map.tour_length(&["York", "Leeds"]),
            Err(MetaModelError::Data(_))
        ));
        assert!(CityMap::new().add_distance("York", "York", 1.0).is_err());
    }

    #[test]
    fn test_from_coordinates() {
        let map = CityMap::from_coordinates(&[("a", 0.0, 0.0), ("b", 3.0, 4.0), ("c", 3.0, 0.0)]).unwrap();
        assert_eq!(map.city_count(), 3);
        assert_eq!(map.distance("a", "b").unwrap(), 5.0);
        assert_eq!(map.tour_length(&["a", "b", "c"]).unwrap(), 12.0);
    }

    #[test]
    fn test_circle_tour_in_order_is_shortest() {
        let map = CityMap::on_circle(6).unwrap();
        let ordered = map.tour_length(&["c0", "c1", "c2", "c3", "c4", "c5"]).unwrap();
        let crossed = map.tour_length(&["c0", "c3", "c1", "c4", "c2", "c5"]).unwrap();
        assert!((ordered - 6.0).abs() < 1e-9);
        assert!(crossed > ordered);
    }
}
