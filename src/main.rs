use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use structopt::StructOpt;
use tracing::Level;

// submodules
mod errors;
mod evolution;
mod exact;
mod ga;
mod input;
mod matrix;
mod operators;
mod population;
mod route;
mod selection;

use evolution::{Config, Evolution};
use input::{CostTable, Metric};
use matrix::CostMatrix;
use operators::{Crossover, Mutation, MutationKind};
use route::{Route, Tour, TourEvaluator};
use selection::{Selection, Strategy};

/// The command line options that can be given to this application.
#[derive(Debug, StructOpt)]
#[structopt(name = "road-trip-planner", about = "An evolutionary planner for the cheapest road trip through a set of waypoints.")]
struct Opt {
    /// Cost cache file (waypoint1, waypoint2, distance_m, duration_s), stdin if not present
    #[structopt(short = "i", long = "input", parse(from_os_str))]
    input: Option<PathBuf>,

    /// Output file, stdout if not present
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,

    /// The cost to minimize: distance or duration
    #[structopt(short = "m", long = "metric", default_value = "distance")]
    metric: Metric,

    /// A waypoint to visit, may be repeated. All waypoints of the cost cache are visited if not present.
    #[structopt(short = "w", long = "waypoint", number_of_values = 1, use_delimiter = false)]
    waypoints: Vec<String>,

    /// Print the waypoints of the cost cache and exit
    #[structopt(long = "list")]
    list: bool,

    /// Population size used for the evolutionary algorithm.
    #[structopt(short = "n", long = "population", default_value = "100")]
    population_size: usize,

    /// Maximum number of generations
    #[structopt(short = "g", long = "generations", default_value = "1000")]
    generations: usize,

    /// Stop once a route costs at most this much
    #[structopt(short = "t", long = "target")]
    target: Option<f64>,

    /// Stop after this many seconds
    #[structopt(long = "time-limit")]
    time_limit: Option<u64>,

    /// Parent selection: proportional or tournament
    #[structopt(long = "selection", default_value = "proportional")]
    selection: Strategy,

    /// Number of routes competing in a tournament
    #[structopt(long = "tournament-size", default_value = "10")]
    tournament_size: usize,

    /// Recombination of parents: order or clone
    #[structopt(long = "crossover", default_value = "order")]
    crossover: Crossover,

    /// Mutation of offspring: shuffle or swap
    #[structopt(long = "mutation", default_value = "shuffle")]
    mutation: MutationKind,

    /// Maximum number of swaps per swap mutation
    #[structopt(long = "max-swaps", default_value = "3")]
    max_swaps: usize,

    /// Maximum length of the segment moved by a shuffle mutation
    #[structopt(long = "max-segment", default_value = "20")]
    max_segment: usize,

    /// Search every route instead of evolving, for small trips only
    #[structopt(long = "exact")]
    exact: bool,

    /// Do not return to the first waypoint at the end of the trip
    #[structopt(long = "open")]
    open: bool,

    /// Seed for the random number generator, for reproducible runs
    #[structopt(long = "seed")]
    seed: Option<u64>,

    /// Quiet mode, do not print the progress table to stderr
    #[structopt(short = "q", long = "quiet")]
    quiet: bool,

    /// Print diagnostic messages to stderr, repeat for more detail
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,
}

/// Implements Write but doesn't write anything.
struct NullWrite;

impl Write for NullWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn main() -> ! {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(opt) {
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1)
        },
        Ok(_) => {
            std::process::exit(0)
        }
    }
}

fn run(opt: Opt) -> errors::Result<()> {
    let table = match opt.input.as_ref() {
        None => CostTable::load(std::io::stdin(), opt.metric, Path::new("<stdin>"))?,
        Some(file_name) => {
            let file = File::open(file_name)?;
            CostTable::load(file, opt.metric, file_name)?
        },
    };

    if opt.list {
        return print_waypoints(std::io::stdout(), table.waypoints());
    }

    let mut log_out: Box<dyn Write> = if opt.quiet {
        Box::new(NullWrite)
    } else {
        Box::new(std::io::stderr())
    };

    let waypoints = table.select(&opt.waypoints)?;
    let matrix = CostMatrix::from_entries(waypoints, table.entries())?;
    let tour = if opt.open { Tour::Open } else { Tour::Closed };
    let evaluator = TourEvaluator::new(&matrix, tour);

    if opt.exact {
        writeln!(log_out, "Number of waypoints: {}", matrix.len())?;
        writeln!(log_out, "Searching all routes")?;
        let best = exact::solve(&evaluator)?;
        writeln!(log_out, "Best cost {:.1}", best.fitness().raw())?;
        return write_solution(opt.output.as_ref(), &evaluator, best.genome());
    }

    let mutation = match opt.mutation {
        MutationKind::Swap => Mutation::swap(opt.max_swaps)?,
        MutationKind::Shuffle => Mutation::shuffle(opt.max_segment)?,
    };
    let config = Config {
        population_size: opt.population_size,
        generation_limit: opt.generations,
        fitness_limit: opt.target,
        time_limit: opt.time_limit.map(Duration::from_secs),
        selection: Selection::new(opt.selection, opt.tournament_size)?,
        crossover: opt.crossover,
        mutation,
    };

    let rng = match opt.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let evolution = Evolution::new(rng, config, evaluator)?;

    writeln!(log_out, "Number of waypoints: {}", matrix.len())?;
    writeln!(log_out, "Population size: {}\n", opt.population_size)?;
    writeln!(log_out, "Beginning evolutionary optimization")?;
    writeln!(log_out, "Generation | Average cost | Worst cost | Best cost | Unique routes")?;

    // Only print generations that improved on the best route so far
    let mut best_so_far: Option<ga::Fitness> = None;
    let outcome = evolution.run(|individuals, generation, _| {
        let stats = match population::summarize(individuals) {
            Some(stats) => stats,
            None => return,
        };
        if best_so_far.map_or(false, |best| stats.best >= best) {
            return;
        }
        best_so_far = Some(stats.best);

        let row = writeln!(
            log_out,
            "{: >10} | {: >12.1} | {: >10.1} | {: >9.1} | {: >13}",
            generation, stats.average, stats.worst.raw(), stats.best.raw(), stats.unique
        );
        if let Err(err) = row {
            tracing::warn!(error = %err, "could not write progress");
        }
    });

    writeln!(
        log_out,
        "Stopped after generation {} ({:?}), best cost {:.1} found in generation {}",
        outcome.generation,
        outcome.termination,
        outcome.best().fitness().raw(),
        outcome.best().generation()
    )?;

    write_solution(opt.output.as_ref(), &evaluator, outcome.best().genome())
}

fn write_solution(output: Option<&PathBuf>, evaluator: &TourEvaluator, route: &Route) -> errors::Result<()> {
    match output {
        None => print_solution(std::io::stdout(), evaluator, route),
        Some(file_name) => {
            let file = File::create(file_name)?;
            print_solution(file, evaluator, route)
        },
    }
}

fn print_waypoints<W: Write>(mut out: W, waypoints: &[String]) -> errors::Result<()> {
    for (index, name) in waypoints.iter().enumerate() {
        writeln!(out, "{}: {}", index, name)?;
    }
    Ok(())
}

/// Write the route as a table with one row per stop. A closed tour ends with the return to the start.
fn print_solution<W: Write>(out: W, evaluator: &TourEvaluator, route: &Route) -> errors::Result<()> {
    let matrix = evaluator.matrix();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(out);

    writer.write_record(&["stop", "waypoint", "leg_cost", "total_cost"])?;

    let start = match route.stops().first() {
        Some(start) => *start,
        None => return Ok(()),
    };
    writer.write_record(&["1", matrix.name(start), "0", "0"])?;

    let mut total = 0.0;
    for (index, (from, to)) in evaluator.legs(route).enumerate() {
        let cost = matrix.cost(from, to);
        total += cost;
        writer.write_record(&[
            (index + 2).to_string().as_str(),
            matrix.name(to),
            cost.to_string().as_str(),
            total.to_string().as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::tests::square;
    use crate::matrix::WaypointId;

    fn solution_text(tour: Tour) -> String {
        let matrix = square();
        let evaluator = TourEvaluator::new(&matrix, tour);
        let route = Route::new(vec![WaypointId(1), WaypointId(2), WaypointId(3), WaypointId(0)]);

        let mut out: Vec<u8> = Vec::new();
        print_solution(&mut out, &evaluator, &route).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_closed_tour_with_return_leg() {
        assert_eq!(
            solution_text(Tour::Closed),
            "stop\twaypoint\tleg_cost\ttotal_cost\n\
             1\tB\t0\t0\n\
             2\tC\t2\t2\n\
             3\tD\t1\t3\n\
             4\tA\t3\t6\n\
             5\tB\t1\t7\n"
        );
    }

    #[test]
    fn prints_open_tour() {
        let text = solution_text(Tour::Open);
        assert_eq!(text.lines().count(), 5);
        assert!(text.ends_with("4\tA\t3\t6\n"));
    }

    #[test]
    fn lists_waypoints_with_index() {
        let mut out: Vec<u8> = Vec::new();
        print_waypoints(&mut out, &["Arches, Utah".to_owned(), "Zion, Utah".to_owned()]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0: Arches, Utah\n1: Zion, Utah\n");
    }

    #[test]
    fn parses_command_line() {
        let opt = Opt::from_iter(&[
            "road-trip-planner",
            "-i", "cache.tsv",
            "-w", "Arches, Utah",
            "-w", "Zion, Utah",
            "--metric", "duration",
            "--selection", "tournament",
            "--mutation", "swap",
            "--open",
            "--exact",
            "-vv",
        ]);
        assert_eq!(opt.input, Some(PathBuf::from("cache.tsv")));
        assert_eq!(opt.waypoints, vec!["Arches, Utah", "Zion, Utah"]);
        assert_eq!(opt.metric, Metric::Duration);
        assert_eq!(opt.selection, Strategy::Tournament);
        assert_eq!(opt.mutation, MutationKind::Swap);
        assert_eq!(opt.crossover, Crossover::Order);
        assert_eq!(opt.population_size, 100);
        assert!(opt.open);
        assert!(opt.exact);
        assert_eq!(opt.verbose, 2);
    }
}
