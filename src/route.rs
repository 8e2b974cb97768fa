use itertools::Itertools;
use rand::seq::SliceRandom;

use crate::ga::Fitness;
use crate::matrix::{CostMatrix, WaypointId};

/// An order in which to visit every waypoint exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    stops: Vec<WaypointId>,
}

impl Route {
    pub fn new(stops: Vec<WaypointId>) -> Self {
        Route { stops }
    }

    /// A uniformly shuffled route over the waypoints `0..waypoint_count`.
    pub fn random<R: rand::Rng>(rng: &mut R, waypoint_count: usize) -> Self {
        let mut stops: Vec<_> = (0..waypoint_count).map(WaypointId).collect();
        stops.shuffle(rng);
        Route { stops }
    }

    pub fn stops(&self) -> &[WaypointId] {
        self.stops.as_slice()
    }

    pub fn into_stops(self) -> Vec<WaypointId> {
        self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Check that the route visits each of the waypoints `0..waypoint_count` exactly once.
    pub fn is_permutation(&self, waypoint_count: usize) -> bool {
        if self.stops.len() != waypoint_count {
            return false;
        }
        let mut seen = vec![false; waypoint_count];
        for stop in self.stops.iter() {
            match seen.get_mut(stop.0) {
                Some(visited) if !*visited => *visited = true,
                _ => return false,
            }
        }
        true
    }
}

/// Whether the trip returns to its starting point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tour {
    /// The last leg leads back to the first waypoint.
    Closed,
    /// The trip ends at the last waypoint.
    Open,
}

/// Computes the total travel cost of routes.
#[derive(Debug, Copy, Clone)]
pub struct TourEvaluator<'m> {
    matrix: &'m CostMatrix,
    tour: Tour,
}

impl<'m> TourEvaluator<'m> {
    pub fn new(matrix: &'m CostMatrix, tour: Tour) -> Self {
        TourEvaluator { matrix, tour }
    }

    pub fn matrix(&self) -> &'m CostMatrix {
        self.matrix
    }

    pub fn tour(&self) -> Tour {
        self.tour
    }

    /// The legs of the trip in travel order, including the return leg of a closed tour.
    pub fn legs<'r>(&self, route: &'r Route) -> impl Iterator<Item = (WaypointId, WaypointId)> + 'r {
        let closing = match (self.tour, route.stops.first(), route.stops.last()) {
            (Tour::Closed, Some(first), Some(last)) if route.len() > 1 => Some((*last, *first)),
            _ => None,
        };
        route
            .stops
            .iter()
            .copied()
            .tuple_windows::<(_, _)>()
            .chain(closing)
    }

    /// The total cost of travelling the route, lower is better.
    pub fn evaluate(&self, route: &Route) -> Fitness {
        assert_eq!(
            route.len(),
            self.matrix.len(),
            "route must visit every waypoint of the cost matrix"
        );
        let total = self
            .legs(route)
            .map(|(from, to)| self.matrix.cost(from, to))
            .sum::<f64>();
        Fitness::new(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::tests::square;
    use rand::{rngs::StdRng, SeedableRng};

    fn route(ids: &[usize]) -> Route {
        Route::new(ids.iter().copied().map(WaypointId).collect())
    }

    #[test]
    fn closed_tour_includes_return_leg() {
        let matrix = square();
        let evaluator = TourEvaluator::new(&matrix, Tour::Closed);
        // A-B-C-D-A = 1 + 2 + 1 + 3
        assert_eq!(evaluator.evaluate(&route(&[0, 1, 2, 3])).raw(), 7.0);
        // A-C-B-D-A = 4 + 2 + 4 + 3
        assert_eq!(evaluator.evaluate(&route(&[0, 2, 1, 3])).raw(), 13.0);
    }

    #[test]
    fn open_tour_skips_return_leg() {
        let matrix = square();
        let evaluator = TourEvaluator::new(&matrix, Tour::Open);
        assert_eq!(evaluator.evaluate(&route(&[0, 1, 2, 3])).raw(), 4.0);
        assert_eq!(evaluator.legs(&route(&[0, 1, 2, 3])).count(), 3);
    }

    #[test]
    fn evaluation_is_deterministic_and_symmetric() {
        let matrix = square();
        let mut rng = StdRng::seed_from_u64(5);
        for tour in [Tour::Closed, Tour::Open].iter().copied() {
            let evaluator = TourEvaluator::new(&matrix, tour);
            for _ in 0..20 {
                let forward = Route::random(&mut rng, matrix.len());
                let mut stops = forward.stops().to_vec();
                stops.reverse();
                let backward = Route::new(stops);

                let fitness = evaluator.evaluate(&forward);
                assert_eq!(fitness, evaluator.evaluate(&forward));
                assert_eq!(fitness, evaluator.evaluate(&backward));
                assert!(fitness.raw() >= 0.0);
            }
        }
    }

    #[test]
    fn detects_broken_permutations() {
        assert!(route(&[2, 0, 1]).is_permutation(3));
        assert!(!route(&[2, 0, 0]).is_permutation(3));
        assert!(!route(&[2, 0]).is_permutation(3));
        assert!(!route(&[2, 0, 3]).is_permutation(3));
    }

    #[test]
    fn random_routes_are_permutations() {
        let mut rng = StdRng::seed_from_u64(1);
        for count in 0..10 {
            assert!(Route::random(&mut rng, count).is_permutation(count));
        }
    }
}
