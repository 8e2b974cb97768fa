//! Parent selection.
//!
//! Two strategies are available. Tournament selection samples a handful of routes and keeps the
//! two cheapest. Proportional selection draws parents with a probability that grows the cheaper a
//! route is relative to the most expensive one in the population.

use std::str::FromStr;

use itertools::{Itertools, MinMaxResult};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;

use crate::errors::ConfigError;
use crate::ga::Individual;
use crate::route::Route;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    Tournament,
    Proportional,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tournament" => Ok(Strategy::Tournament),
            "proportional" => Ok(Strategy::Proportional),
            other => Err(format!(
                "unknown selection {:?}, expected tournament or proportional",
                other
            )),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Selection {
    strategy: Strategy,
    /// Used by tournament selection, and by proportional selection when weights cannot be formed.
    tournament_size: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Selection {
            strategy: Strategy::Proportional,
            tournament_size: 10,
        }
    }
}

impl Selection {
    pub fn new(strategy: Strategy, tournament_size: usize) -> Result<Self, ConfigError> {
        if tournament_size < 2 {
            return Err(ConfigError::TournamentTooSmall(tournament_size));
        }
        Ok(Selection {
            strategy,
            tournament_size,
        })
    }

    /// Choose two parents from a non-empty population. Both may be the same individual.
    pub fn select_pair<'p, R: rand::Rng>(
        &self,
        rng: &mut R,
        population: &'p [Individual<Route>],
    ) -> (&'p Individual<Route>, &'p Individual<Route>) {
        assert!(!population.is_empty(), "cannot select from an empty population");

        match self.strategy {
            Strategy::Tournament => tournament_pair(rng, population, self.tournament_size),
            Strategy::Proportional => proportional_pair(rng, population).unwrap_or_else(|| {
                tracing::debug!("proportional weights unusable, running a tournament instead");
                tournament_pair(rng, population, self.tournament_size)
            }),
        }
    }
}

/// Draw `size` individuals with replacement and return the best two of the sample.
pub fn tournament_pair<'p, R: rand::Rng>(
    rng: &mut R,
    population: &'p [Individual<Route>],
    size: usize,
) -> (&'p Individual<Route>, &'p Individual<Route>) {
    assert!(size >= 2, "a tournament needs at least two slots");

    let mut sample: Vec<&Individual<Route>> = std::iter::repeat_with(|| {
        &population[rng.gen_range(0, population.len())]
    })
    .take(size)
    .collect();
    sample.sort_by_key(|individual| individual.fitness());

    (sample[0], sample[1])
}

/// Draw two individuals with replacement, weighted by how much cheaper they are than the
/// most expensive individual.
///
/// The weight of a route is `max - fitness + (max - min) / len`, so even the worst route keeps a
/// small chance. If all routes cost the same, parents are drawn uniformly. Returns `None` if the
/// fitness values do not yield usable weights.
pub fn proportional_pair<'p, R: rand::Rng>(
    rng: &mut R,
    population: &'p [Individual<Route>],
) -> Option<(&'p Individual<Route>, &'p Individual<Route>)> {
    let (min, max) = match population.iter().map(|ind| ind.fitness().raw()).minmax() {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(fitness) => (fitness, fitness),
        MinMaxResult::MinMax(min, max) => (min, max),
    };

    let spread = max - min;
    if !max.is_finite() || !spread.is_finite() {
        return None;
    }
    if spread == 0.0 {
        let first = population.choose(rng)?;
        let second = population.choose(rng)?;
        return Some((first, second));
    }

    let epsilon = spread / population.len() as f64;
    let weights: Vec<f64> = population
        .iter()
        .map(|individual| max - individual.fitness().raw() + epsilon)
        .collect();
    // WeightedIndex panics instead of failing when the total overflows
    if !weights.iter().sum::<f64>().is_finite() {
        return None;
    }
    let wheel = WeightedIndex::<f64>::new(weights).ok()?;

    Some((&population[wheel.sample(rng)], &population[wheel.sample(rng)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::Fitness;
    use crate::matrix::WaypointId;
    use rand::{rngs::StdRng, SeedableRng};

    /// Individuals that are told apart by their generation, with the given fitness values.
    fn population(fitness: &[f64]) -> Vec<Individual<Route>> {
        fitness
            .iter()
            .enumerate()
            .map(|(index, value)| {
                Individual::new(
                    index,
                    Route::new(vec![WaypointId(0), WaypointId(1)]),
                    Fitness::new(*value),
                )
            })
            .collect()
    }

    #[test]
    fn rejects_tiny_tournaments() {
        assert_eq!(
            Selection::new(Strategy::Tournament, 1),
            Err(ConfigError::TournamentTooSmall(1))
        );
        assert!(Selection::new(Strategy::Proportional, 2).is_ok());
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("tournament".parse::<Strategy>(), Ok(Strategy::Tournament));
        assert_eq!("proportional".parse::<Strategy>(), Ok(Strategy::Proportional));
        assert!("roulette".parse::<Strategy>().is_err());
    }

    #[test]
    fn tournament_returns_best_of_sample() {
        let population = population(&[13.0, 7.0, 9.0, 11.0]);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..20 {
            let (first, second) = tournament_pair(&mut rng, &population, 50);
            assert_eq!(first.generation(), 1);
            assert!(first.fitness() <= second.fitness());
        }
    }

    #[test]
    fn tournament_may_pick_the_same_individual_twice() {
        let population = population(&[4.0]);
        let mut rng = StdRng::seed_from_u64(0);
        let (first, second) = tournament_pair(&mut rng, &population, 2);
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn proportional_favours_cheap_routes() {
        // weights: 13 - 7 + 3 = 9 and 13 - 13 + 3 = 3, so the cheap route is picked 75% of the time
        let population = population(&[7.0, 13.0]);
        let mut rng = StdRng::seed_from_u64(42);

        let draws = 2000;
        let mut cheap = 0;
        for _ in 0..draws {
            let (first, second) = proportional_pair(&mut rng, &population).unwrap();
            cheap += (first.generation() == 0) as usize + (second.generation() == 0) as usize;
        }

        let share = cheap as f64 / (2 * draws) as f64;
        assert!((share - 0.75).abs() < 0.05, "share of cheap route was {}", share);
    }

    #[test]
    fn proportional_is_uniform_for_equal_fitness() {
        let population = population(&[5.0, 5.0]);
        let mut rng = StdRng::seed_from_u64(7);

        let draws = 2000;
        let mut first_picked = 0;
        for _ in 0..draws {
            let (first, _) = proportional_pair(&mut rng, &population).unwrap();
            first_picked += (first.generation() == 0) as usize;
        }

        let share = first_picked as f64 / draws as f64;
        assert!((share - 0.5).abs() < 0.05, "share of first route was {}", share);
    }

    #[test]
    fn proportional_falls_back_on_unusable_weights() {
        let population = population(&[1.0, std::f64::INFINITY]);
        let mut rng = StdRng::seed_from_u64(9);
        assert!(proportional_pair(&mut rng, &population).is_none());

        let selection = Selection::new(Strategy::Proportional, 30).unwrap();
        let (first, _) = selection.select_pair(&mut rng, &population);
        assert_eq!(first.generation(), 0);
    }

    #[test]
    fn proportional_falls_back_when_weights_overflow() {
        // every fitness is finite, but the weights add up to more than f64::MAX
        let population = population(&[0.0, 1.0e308, 1.5e308, 1.7e308]);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(proportional_pair(&mut rng, &population).is_none());

        let all_infinite = self::population(&[std::f64::INFINITY, std::f64::INFINITY]);
        assert!(proportional_pair(&mut rng, &all_infinite).is_none());

        let selection = Selection::default();
        for _ in 0..20 {
            let (first, second) = selection.select_pair(&mut rng, &population);
            assert!(first.fitness() <= second.fitness());
        }
    }
}
