//! Exhaustive branch-and-bound search for the cheapest route.
//!
//! Routes are extended one waypoint at a time. A partial route is abandoned once its cost plus
//! the cheapest leg into each waypoint still to be reached is no better than the best complete
//! route found so far. Closed tours always start at the first waypoint, since every rotation of
//! a round trip costs the same.

use crate::errors::ConfigError;
use crate::ga::Individual;
use crate::matrix::WaypointId;
use crate::route::{Route, Tour, TourEvaluator};

/// The largest trip the exact search accepts.
pub const EXACT_LIMIT: usize = 12;

/// Find a cheapest route for the evaluator's matrix and tour shape.
pub fn solve(evaluator: &TourEvaluator) -> Result<Individual<Route>, ConfigError> {
    let count = evaluator.matrix().len();
    if count > EXACT_LIMIT {
        return Err(ConfigError::TooManyForExact {
            waypoints: count,
            limit: EXACT_LIMIT,
        });
    }

    let mut search = Search::new(evaluator);
    let starts = match evaluator.tour() {
        Tour::Closed => 0..1,
        Tour::Open => 0..count,
    };
    for start in starts {
        search.visit(WaypointId(start));
        search.extend(0.0);
        search.leave();
    }
    tracing::debug!(nodes = search.nodes, "exact search finished");

    let route = Route::new(search.best.unwrap_or_default());
    let fitness = evaluator.evaluate(&route);
    Ok(Individual::new(0, route, fitness))
}

struct Search<'e, 'm> {
    evaluator: &'e TourEvaluator<'m>,
    /// The cheapest leg touching each waypoint.
    cheapest: Vec<f64>,
    visited: Vec<bool>,
    path: Vec<WaypointId>,
    best: Option<Vec<WaypointId>>,
    best_cost: f64,
    nodes: u64,
}

impl<'e, 'm> Search<'e, 'm> {
    fn new(evaluator: &'e TourEvaluator<'m>) -> Self {
        let matrix = evaluator.matrix();
        let count = matrix.len();
        let cheapest = (0..count)
            .map(|from| {
                (0..count)
                    .filter(|to| *to != from)
                    .map(|to| matrix.cost(WaypointId(from), WaypointId(to)))
                    .fold(std::f64::INFINITY, f64::min)
            })
            .collect();

        Search {
            evaluator,
            cheapest,
            visited: vec![false; count],
            path: Vec::with_capacity(count),
            best: None,
            best_cost: std::f64::INFINITY,
            nodes: 0,
        }
    }

    fn visit(&mut self, waypoint: WaypointId) {
        self.visited[waypoint.0] = true;
        self.path.push(waypoint);
    }

    fn leave(&mut self) {
        if let Some(waypoint) = self.path.pop() {
            self.visited[waypoint.0] = false;
        }
    }

    /// A lower bound on the cost still to come after the current partial route.
    fn remaining_bound(&self) -> f64 {
        let unvisited: f64 = self
            .visited
            .iter()
            .enumerate()
            .filter(|(_, visited)| !**visited)
            .map(|(index, _)| self.cheapest[index])
            .sum();
        match (self.evaluator.tour(), self.path.first()) {
            (Tour::Closed, Some(start)) => unvisited + self.cheapest[start.0],
            _ => unvisited,
        }
    }

    fn extend(&mut self, cost: f64) {
        self.nodes += 1;
        let matrix = self.evaluator.matrix();
        let last = match self.path.last() {
            Some(last) => *last,
            None => return,
        };

        if self.path.len() == matrix.len() {
            let total = match (self.evaluator.tour(), self.path.first()) {
                (Tour::Closed, Some(first)) if self.path.len() > 1 => cost + matrix.cost(last, *first),
                _ => cost,
            };
            if self.best.is_none() || total < self.best_cost {
                self.best = Some(self.path.clone());
                self.best_cost = total;
            }
            return;
        }

        if self.best.is_some() && cost + self.remaining_bound() >= self.best_cost {
            return;
        }

        for next in 0..matrix.len() {
            if self.visited[next] {
                continue;
            }
            let next = WaypointId(next);
            self.visit(next);
            self.extend(cost + matrix.cost(last, next));
            self.leave();
        }
    }
}
