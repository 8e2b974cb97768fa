//! Recombination and mutation of routes.
//!
//! All operators take parents by reference or consume the route they change, and always return
//! permutations of the waypoints they were given.

use std::str::FromStr;

use crate::errors::ConfigError;
use crate::route::Route;

/// How two parents are combined into two children.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Crossover {
    /// Order-preserving crossover, see [`order_crossover`].
    Order,
    /// The children are copies of their parents, so only mutation changes the routes.
    Clone,
}

impl FromStr for Crossover {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(Crossover::Order),
            "clone" => Ok(Crossover::Clone),
            other => Err(format!("unknown crossover {:?}, expected order or clone", other)),
        }
    }
}

impl Crossover {
    pub fn apply<R: rand::Rng>(self, rng: &mut R, parent1: &Route, parent2: &Route) -> (Route, Route) {
        match self {
            Crossover::Order => order_crossover(rng, parent1, parent2),
            Crossover::Clone => (parent1.clone(), parent2.clone()),
        }
    }
}

/// Pick two random cut points and recombine the parents with [`order_crossover_at`].
/// Routes with fewer than two stops are returned unchanged.
pub fn order_crossover<R: rand::Rng>(rng: &mut R, parent1: &Route, parent2: &Route) -> (Route, Route) {
    assert_eq!(parent1.len(), parent2.len(), "parents must have the same length");

    let len = parent1.len();
    if len < 2 {
        return (parent1.clone(), parent2.clone());
    }

    // two distinct cut points out of 0..=len
    let mut cuts = rand::seq::index::sample(rng, len + 1, 2).into_vec();
    cuts.sort();

    order_crossover_at(parent1, parent2, cuts[0], cuts[1])
}

/// Each child keeps the stops `start..end` of one parent in place and takes the remaining
/// waypoints, front to back, in the order in which they appear in the other parent.
pub fn order_crossover_at(parent1: &Route, parent2: &Route, start: usize, end: usize) -> (Route, Route) {
    let len = parent1.len();
    assert!(
        parent1.is_permutation(len) && parent2.is_permutation(len),
        "parents must be permutations of the same waypoints"
    );
    assert!(start <= end && end <= len, "cut points out of range");

    (
        keep_segment(parent1, parent2, start, end),
        keep_segment(parent2, parent1, start, end),
    )
}

fn keep_segment(kept: &Route, donor: &Route, start: usize, end: usize) -> Route {
    let mut placed = vec![false; kept.len()];
    for stop in kept.stops()[start..end].iter() {
        placed[stop.0] = true;
    }

    let mut remaining = donor.stops().iter().copied().filter(|stop| !placed[stop.0]);

    let stops = kept
        .stops()
        .iter()
        .enumerate()
        .map(|(index, stop)| {
            if (start..end).contains(&index) {
                Some(*stop)
            } else {
                remaining.next()
            }
        })
        .collect::<Option<Vec<_>>>()
        .expect("donor covers every waypoint outside the kept segment");

    Route::new(stops)
}

/// Which mutation the command line asked for, before its limits are known.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MutationKind {
    Swap,
    Shuffle,
}

impl FromStr for MutationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "swap" => Ok(MutationKind::Swap),
            "shuffle" => Ok(MutationKind::Shuffle),
            other => Err(format!("unknown mutation {:?}, expected swap or shuffle", other)),
        }
    }
}

/// How a single route is perturbed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Exchange two stops, between one and `max_swaps` times.
    Swap { max_swaps: usize },
    /// Cut out a run of between 2 and `max_segment` stops and put it back elsewhere.
    Shuffle { max_segment: usize },
}

impl Mutation {
    pub fn swap(max_swaps: usize) -> Result<Self, ConfigError> {
        if max_swaps == 0 {
            return Err(ConfigError::NoSwaps);
        }
        Ok(Mutation::Swap { max_swaps })
    }

    pub fn shuffle(max_segment: usize) -> Result<Self, ConfigError> {
        if max_segment < 2 {
            return Err(ConfigError::SegmentTooShort(max_segment));
        }
        Ok(Mutation::Shuffle { max_segment })
    }

    /// Routes with fewer than two stops are returned unchanged.
    pub fn apply<R: rand::Rng>(self, rng: &mut R, route: Route) -> Route {
        if route.len() < 2 {
            return route;
        }
        match self {
            Mutation::Swap { max_swaps } => swap_mutation(rng, route, max_swaps),
            Mutation::Shuffle { max_segment } => shuffle_mutation(rng, route, max_segment),
        }
    }
}

fn swap_mutation<R: rand::Rng>(rng: &mut R, route: Route, max_swaps: usize) -> Route {
    let mut stops = route.into_stops();
    let len = stops.len();

    let num_swaps = rng.gen_range(1, max_swaps + 1);
    for _ in 0..num_swaps {
        let i = rng.gen_range(0, len);
        // draw from the other len - 1 positions
        let mut j = rng.gen_range(0, len - 1);
        if j >= i {
            j += 1;
        }
        stops.swap(i, j);
    }

    Route::new(stops)
}

fn shuffle_mutation<R: rand::Rng>(rng: &mut R, route: Route, max_segment: usize) -> Route {
    let mut stops = route.into_stops();
    let len = stops.len();

    let segment_len = rng.gen_range(2, max_segment.min(len) + 1);
    let start = rng.gen_range(0, len);
    // segments starting near the end are cut short
    let end = (start + segment_len).min(len);

    let segment: Vec<_> = stops.drain(start..end).collect();
    let insert_at = rng.gen_range(0, stops.len() + 1);
    stops.splice(insert_at..insert_at, segment);

    Route::new(stops)
}
