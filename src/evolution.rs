use std::time::{Duration, Instant};

use crate::errors::ConfigError;
use crate::ga::Individual;
use crate::operators::{Crossover, Mutation};
use crate::population::{self, Population};
use crate::route::{Route, TourEvaluator};
use crate::selection::Selection;

/// The number of best routes copied unchanged into the next generation.
const ELITES: usize = 2;

/// Parameters of an evolutionary run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub population_size: usize,
    /// The run stops once this many generations have been bred.
    pub generation_limit: usize,
    /// The run stops once the best route costs at most this much.
    pub fitness_limit: Option<f64>,
    /// The run stops once this much wall-clock time has passed.
    pub time_limit: Option<Duration>,
    pub selection: Selection,
    pub crossover: Crossover,
    pub mutation: Mutation,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            population_size: 100,
            generation_limit: 1000,
            fitness_limit: None,
            time_limit: None,
            selection: Selection::default(),
            crossover: Crossover::Order,
            mutation: Mutation::Shuffle { max_segment: 20 },
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        Ok(())
    }
}

/// Why a run stopped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Termination {
    FitnessReached,
    GenerationLimit,
    TimeLimit,
}

/// The result of a run.
#[derive(Debug)]
pub struct Outcome {
    /// The last generation, best first.
    pub population: Population,
    /// The index of the last generation, 0 being the random initial one.
    pub generation: usize,
    pub termination: Termination,
}

impl Outcome {
    pub fn best(&self) -> &Individual<Route> {
        self.population.first().expect("population is at least 1")
    }
}

/// Generational genetic search for a cheap route.
///
/// The population is kept sorted best first. Each generation keeps the two best routes and
/// fills up with mutated offspring of selected parents. If an odd number of places is left,
/// the second child of the last pair is dropped.
#[derive(Debug)]
pub struct Evolution<'m, R> {
    rng: R,
    config: Config,
    evaluator: TourEvaluator<'m>,
    population: Population,
    generation: usize,
}

impl<'m, R: rand::Rng> Evolution<'m, R> {
    pub fn new(mut rng: R, config: Config, evaluator: TourEvaluator<'m>) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut initial_population = population::initialize(&mut rng, config.population_size, &evaluator);
        population::rank(&mut initial_population);

        Ok(Evolution {
            rng,
            config,
            evaluator,
            population: initial_population,
            generation: 0,
        })
    }

    /// Evolve until one of the stopping conditions holds. `progress` sees every ranked
    /// generation, including the initial and the final one.
    pub fn run<F>(mut self, mut progress: F) -> Outcome
    where
        F: FnMut(&[Individual<Route>], usize, &TourEvaluator<'m>),
    {
        let started = Instant::now();
        tracing::info!(
            population = self.config.population_size,
            generation_limit = self.config.generation_limit,
            waypoints = self.evaluator.matrix().len(),
            "starting evolution"
        );

        loop {
            progress(self.population.as_slice(), self.generation, &self.evaluator);
            tracing::debug!(
                generation = self.generation,
                best = self.best().fitness().raw(),
                "generation ranked"
            );

            if let Some(termination) = self.termination(started) {
                tracing::info!(
                    generation = self.generation,
                    best = self.best().fitness().raw(),
                    reason = ?termination,
                    "evolution finished"
                );
                return Outcome {
                    population: self.population,
                    generation: self.generation,
                    termination,
                };
            }

            self.breed();
        }
    }

    /// Replace the population by the next generation.
    pub fn breed(&mut self) {
        self.generation += 1;

        let size = self.config.population_size;
        let mut next_generation: Population = Vec::with_capacity(size);
        next_generation.extend(self.population.iter().take(ELITES).cloned());

        while next_generation.len() < size {
            let (parent1, parent2) = self.config.selection.select_pair(&mut self.rng, &self.population);
            let (child1, child2) = self
                .config
                .crossover
                .apply(&mut self.rng, parent1.genome(), parent2.genome());

            for child in vec![child1, child2] {
                if next_generation.len() == size {
                    break;
                }
                let child = self.config.mutation.apply(&mut self.rng, child);
                next_generation.push(self.make_individual(child));
            }
        }

        population::rank(&mut next_generation);
        self.population = next_generation;
    }

    /// The reason to stop at the current generation, if any.
    pub fn termination(&self, started: Instant) -> Option<Termination> {
        let best = self.best().fitness().raw();

        if self.config.fitness_limit.map_or(false, |limit| best <= limit) {
            Some(Termination::FitnessReached)
        } else if self.generation >= self.config.generation_limit {
            Some(Termination::GenerationLimit)
        } else if self.config.time_limit.map_or(false, |limit| started.elapsed() >= limit) {
            Some(Termination::TimeLimit)
        } else {
            None
        }
    }

    pub fn best(&self) -> &Individual<Route> {
        self.population.first().expect("population is at least 1")
    }

    #[cfg(test)]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[cfg(test)]
    pub fn population(&self) -> &[Individual<Route>] {
        self.population.as_slice()
    }

    fn make_individual(&self, route: Route) -> Individual<Route> {
        assert!(
            route.is_permutation(self.evaluator.matrix().len()),
            "operator produced an invalid route: {:?}",
            route
        );
        let fitness = self.evaluator.evaluate(&route);
        Individual::new(self.generation, route, fitness)
    }
}
