use itertools::{Itertools, MinMaxResult};

use crate::ga::{Fitness, Individual};
use crate::route::{Route, TourEvaluator};

pub type Population = Vec<Individual<Route>>;

/// Generate `size` independently shuffled routes, evaluated as members of generation 0.
/// Identical routes are not filtered out.
pub fn initialize<R: rand::Rng>(
    rng: &mut R,
    size: usize,
    evaluator: &TourEvaluator,
) -> Population {
    let waypoint_count = evaluator.matrix().len();
    std::iter::repeat_with(|| {
        let route = Route::random(rng, waypoint_count);
        let fitness = evaluator.evaluate(&route);
        Individual::new(0, route, fitness)
    })
    .take(size)
    .collect()
}

/// Sort the population best first. Equal fitness keeps the existing order.
pub fn rank(population: &mut Population) {
    population.sort_by_key(|individual| individual.fitness());
}

/// Summary figures of one generation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Stats {
    pub best: Fitness,
    pub worst: Fitness,
    pub average: f64,
    /// The number of distinct routes in the population.
    pub unique: usize,
}

pub fn summarize(population: &[Individual<Route>]) -> Option<Stats> {
    let (best, worst) = match population.iter().map(Individual::fitness).minmax() {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(fitness) => (fitness, fitness),
        MinMaxResult::MinMax(best, worst) => (best, worst),
    };
    let total = population.iter().map(|ind| ind.fitness().raw()).sum::<f64>();
    let unique = population.iter().map(Individual::genome).unique().count();

    Some(Stats {
        best,
        worst,
        average: total / population.len() as f64,
        unique,
    })
}
