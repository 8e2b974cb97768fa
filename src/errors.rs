use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// The various kinds of errors that can happen before the search starts.
#[derive(Debug)]
pub enum Error {
    /// An I/O error (such as not being able to read the input file)
    Io(std::io::Error),
    /// An error while reading or writing CSV.
    Csv(csv::Error),
    /// The cost table file is not valid.
    InvalidCostTable {
        file: PathBuf,
        line: u64,
        error: CostTableError,
    },
    /// A waypoint was requested that does not appear in the cost table.
    UnknownWaypoint(String),
    /// The cost matrix cannot be built from the given waypoints and costs.
    Matrix(MatrixError),
    /// The search parameters are not usable.
    Config(ConfigError),
}

#[derive(Debug, PartialEq)]
pub enum CostTableError {
    /// A row has fewer than the four expected columns.
    MissingColumn,
    /// A cost column does not contain a number.
    InvalidNumber(String),
}

#[derive(Debug, PartialEq)]
pub enum MatrixError {
    /// A tour needs at least two waypoints.
    TooFewWaypoints(usize),
    /// The same waypoint name was given twice.
    DuplicateWaypoint(String),
    /// A cost is negative, infinite or NaN.
    InvalidCost { from: String, to: String, cost: f64 },
    /// An entry connects a waypoint to itself.
    SelfLoop(String),
    /// Two entries for the same pair disagree.
    ConflictingCost { from: String, to: String },
    /// No cost is known for a pair of waypoints.
    MissingCost { from: String, to: String },
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The population must hold at least one route.
    EmptyPopulation,
    /// Tournament selection needs at least two slots.
    TournamentTooSmall(usize),
    /// Swap mutation needs to perform at least one swap.
    NoSwaps,
    /// Shuffle mutation needs segments of at least two waypoints.
    SegmentTooShort(usize),
    /// The exact search is limited to small trips.
    TooManyForExact { waypoints: usize, limit: usize },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Error {
        Error::Csv(err)
    }
}

impl From<MatrixError> for Error {
    fn from(err: MatrixError) -> Error {
        Error::Matrix(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "{}", err),
            Error::Csv(err) => write!(f, "{}", err),
            Error::InvalidCostTable { file, line, error } => {
                write!(f, "{}:{}: {}", file.to_string_lossy(), line, error)
            }
            Error::UnknownWaypoint(name) => write!(f, "Unknown waypoint: {}", name),
            Error::Matrix(err) => write!(f, "{}", err),
            Error::Config(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(error) => Some(error),
            Error::Csv(error) => Some(error),
            Error::InvalidCostTable { error, .. } => Some(error),
            Error::UnknownWaypoint(_) => None,
            Error::Matrix(error) => Some(error),
            Error::Config(error) => Some(error),
        }
    }
}

impl fmt::Display for CostTableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CostTableError::MissingColumn => write!(
                f,
                "Expected four columns: waypoint1, waypoint2, distance_m, duration_s"
            ),
            CostTableError::InvalidNumber(value) => write!(f, "Not a number: {:?}", value),
        }
    }
}

impl std::error::Error for CostTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MatrixError::TooFewWaypoints(count) => {
                write!(f, "A route needs at least two waypoints, got {}", count)
            }
            MatrixError::DuplicateWaypoint(name) => write!(f, "Waypoint listed twice: {}", name),
            MatrixError::InvalidCost { from, to, cost } => {
                write!(f, "Invalid cost {} between {} and {}", cost, from, to)
            }
            MatrixError::SelfLoop(name) => write!(f, "Cost entry from {} to itself", name),
            MatrixError::ConflictingCost { from, to } => {
                write!(f, "Conflicting costs between {} and {}", from, to)
            }
            MatrixError::MissingCost { from, to } => {
                write!(f, "No cost known between {} and {}", from, to)
            }
        }
    }
}

impl std::error::Error for MatrixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::EmptyPopulation => write!(f, "Population size must be at least 1"),
            ConfigError::TournamentTooSmall(size) => {
                write!(f, "Tournament size must be at least 2, got {}", size)
            }
            ConfigError::NoSwaps => write!(f, "Swap mutation needs at least one swap"),
            ConfigError::SegmentTooShort(len) => {
                write!(f, "Shuffle segments must be at least 2 long, got {}", len)
            }
            ConfigError::TooManyForExact { waypoints, limit } => write!(
                f,
                "Exact search supports at most {} waypoints, got {}",
                limit, waypoints
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
