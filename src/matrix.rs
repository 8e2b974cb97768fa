use ndarray::Array2;

use crate::errors::MatrixError;

/// The travel cost between two named waypoints, as supplied by the cost cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CostEntry {
    pub from: String,
    pub to: String,
    pub cost: f64,
}

/// Index of a waypoint in the cost matrix.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct WaypointId(pub usize);

/// A complete, symmetric table of non-negative travel costs between waypoints.
///
/// Once built, every pair of waypoints has a known cost, so lookups cannot fail.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    names: Vec<String>,
    costs: Array2<f64>,
}

impl CostMatrix {
    /// Build the matrix for the given waypoints. Entries that mention other waypoints are ignored,
    /// every pair of the given waypoints must be covered.
    pub fn from_entries<'a, I>(waypoints: Vec<String>, entries: I) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = &'a CostEntry>,
    {
        if waypoints.len() < 2 {
            return Err(MatrixError::TooFewWaypoints(waypoints.len()));
        }

        for (index, name) in waypoints.iter().enumerate() {
            if waypoints[..index].contains(name) {
                return Err(MatrixError::DuplicateWaypoint(name.clone()));
            }
        }

        let count = waypoints.len();
        // NaN marks pairs without a known cost
        let mut costs = Array2::from_elem((count, count), std::f64::NAN);
        let index_of = |name: &str| waypoints.iter().position(|w| w == name);

        for entry in entries {
            let (from, to) = match (index_of(&entry.from), index_of(&entry.to)) {
                (Some(from), Some(to)) => (from, to),
                _ => continue,
            };

            if from == to {
                return Err(MatrixError::SelfLoop(entry.from.clone()));
            }
            if !entry.cost.is_finite() || entry.cost < 0.0 {
                return Err(MatrixError::InvalidCost {
                    from: entry.from.clone(),
                    to: entry.to.clone(),
                    cost: entry.cost,
                });
            }

            let previous = costs[(from, to)];
            if !previous.is_nan() && previous != entry.cost {
                return Err(MatrixError::ConflictingCost {
                    from: entry.from.clone(),
                    to: entry.to.clone(),
                });
            }

            costs[(from, to)] = entry.cost;
            costs[(to, from)] = entry.cost;
        }

        for index in 0..count {
            costs[(index, index)] = 0.0;
        }

        if let Some(((from, to), _)) = costs.indexed_iter().find(|(_, cost)| cost.is_nan()) {
            return Err(MatrixError::MissingCost {
                from: waypoints[from].clone(),
                to: waypoints[to].clone(),
            });
        }

        Ok(CostMatrix {
            names: waypoints,
            costs,
        })
    }

    pub fn cost(&self, from: WaypointId, to: WaypointId) -> f64 {
        self.costs[(from.0, to.0)]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, waypoint: WaypointId) -> &str {
        self.names[waypoint.0].as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn entry(from: &str, to: &str, cost: f64) -> CostEntry {
        CostEntry {
            from: from.to_owned(),
            to: to.to_owned(),
            cost,
        }
    }

    pub fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    /// Four waypoints whose best round trip is A-B-C-D-A with cost 7.
    pub fn square() -> CostMatrix {
        let entries = vec![
            entry("A", "B", 1.0),
            entry("A", "C", 4.0),
            entry("A", "D", 3.0),
            entry("B", "C", 2.0),
            entry("B", "D", 4.0),
            entry("C", "D", 1.0),
        ];
        CostMatrix::from_entries(names(&["A", "B", "C", "D"]), &entries).unwrap()
    }

    /// `count` waypoints evenly spaced on a circle of radius 100.
    pub fn circle(count: usize) -> CostMatrix {
        let points: Vec<(f64, f64)> = (0..count)
            .map(|i| {
                let angle = 2.0 * std::f64::consts::PI * i as f64 / count as f64;
                (100.0 * angle.cos(), 100.0 * angle.sin())
            })
            .collect();
        let names: Vec<String> = (0..count).map(|i| format!("P{}", i)).collect();

        let mut entries: Vec<CostEntry> = Vec::new();
        for i in 0..count {
            for j in i + 1..count {
                let (dx, dy) = (points[i].0 - points[j].0, points[i].1 - points[j].1);
                entries.push(entry(&names[i], &names[j], (dx * dx + dy * dy).sqrt()));
            }
        }
        CostMatrix::from_entries(names, &entries).unwrap()
    }

    #[test]
    fn lookups_are_symmetric() {
        let matrix = square();
        assert_eq!(matrix.len(), 4);
        assert_eq!(matrix.cost(WaypointId(0), WaypointId(2)), 4.0);
        assert_eq!(matrix.cost(WaypointId(2), WaypointId(0)), 4.0);
        assert_eq!(matrix.cost(WaypointId(3), WaypointId(3)), 0.0);
        assert_eq!(matrix.name(WaypointId(1)), "B");
    }

    #[test]
    fn ignores_unselected_waypoints() {
        let entries = vec![entry("A", "B", 5.0), entry("A", "Z", 1.0), entry("Z", "B", 1.0)];
        let matrix = CostMatrix::from_entries(names(&["B", "A"]), &entries).unwrap();
        assert_eq!(matrix.cost(WaypointId(0), WaypointId(1)), 5.0);
        assert_eq!(matrix.len(), 2);
    }

    #[test]
    fn rejects_incomplete_tables() {
        let entries = vec![entry("A", "B", 1.0), entry("B", "C", 1.0)];
        let error = CostMatrix::from_entries(names(&["A", "B", "C"]), &entries).unwrap_err();
        assert_eq!(
            error,
            MatrixError::MissingCost {
                from: "A".to_owned(),
                to: "C".to_owned()
            }
        );
    }

    #[test]
    fn rejects_bad_inputs() {
        let no_entries: Vec<CostEntry> = Vec::new();
        assert_eq!(
            CostMatrix::from_entries(names(&["A"]), &no_entries).unwrap_err(),
            MatrixError::TooFewWaypoints(1)
        );
        assert_eq!(
            CostMatrix::from_entries(names(&["A", "A"]), &no_entries).unwrap_err(),
            MatrixError::DuplicateWaypoint("A".to_owned())
        );

        let negative = vec![entry("A", "B", -1.0)];
        assert!(matches!(
            CostMatrix::from_entries(names(&["A", "B"]), &negative),
            Err(MatrixError::InvalidCost { .. })
        ));

        let looped = vec![entry("A", "A", 1.0)];
        assert_eq!(
            CostMatrix::from_entries(names(&["A", "B"]), &looped).unwrap_err(),
            MatrixError::SelfLoop("A".to_owned())
        );

        let conflicting = vec![entry("A", "B", 1.0), entry("B", "A", 2.0)];
        assert!(matches!(
            CostMatrix::from_entries(names(&["A", "B"]), &conflicting),
            Err(MatrixError::ConflictingCost { .. })
        ));
    }
}
