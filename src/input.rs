use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use itertools::Itertools;

use crate::errors::{CostTableError, Error, Result};
use crate::matrix::CostEntry;

/// Which of the two cached measurements is used as the travel cost.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Metric {
    /// Driving distance in meters.
    Distance,
    /// Driving duration in seconds.
    Duration,
}

impl Metric {
    fn column(self) -> usize {
        match self {
            Metric::Distance => 2,
            Metric::Duration => 3,
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "distance" => Ok(Metric::Distance),
            "duration" => Ok(Metric::Duration),
            other => Err(format!("unknown metric {:?}, expected distance or duration", other)),
        }
    }
}

/// The pairwise costs read from a waypoint cache file.
///
/// The file is tab separated with the header `waypoint1 waypoint2 distance_m duration_s`
/// and one row per unordered pair of waypoints.
#[derive(Debug)]
pub struct CostTable {
    /// All waypoints mentioned in the file, in order of first appearance.
    waypoints: Vec<String>,
    entries: Vec<CostEntry>,
}

impl CostTable {
    /// Read the cost table from an input stream. `source` is only used in error messages.
    pub fn load<In: Read>(stream: In, metric: Metric, source: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(stream);

        let invalid = |line, error| Error::InvalidCostTable {
            file: source.to_owned(),
            line,
            error,
        };

        let mut entries = Vec::new();

        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |pos| pos.line());

            if record.len() < 4 {
                return Err(invalid(line, CostTableError::MissingColumn));
            }

            let cost_cell = &record[metric.column()];
            let cost = cost_cell
                .parse::<f64>()
                .map_err(|_| invalid(line, CostTableError::InvalidNumber(cost_cell.to_owned())))?;

            entries.push(CostEntry {
                from: record[0].to_owned(),
                to: record[1].to_owned(),
                cost,
            });
        }

        let waypoints = entries
            .iter()
            .flat_map(|entry| vec![entry.from.clone(), entry.to.clone()])
            .unique()
            .collect();

        Ok(CostTable { waypoints, entries })
    }

    pub fn waypoints(&self) -> &[String] {
        self.waypoints.as_slice()
    }

    pub fn entries(&self) -> &[CostEntry] {
        self.entries.as_slice()
    }

    /// Resolve the requested waypoint names against the table.
    /// Requesting nothing selects every waypoint in the table.
    pub fn select(&self, requested: &[String]) -> Result<Vec<String>> {
        if requested.is_empty() {
            return Ok(self.waypoints.clone());
        }

        requested
            .iter()
            .map(|name| {
                if self.waypoints.contains(name) {
                    Ok(name.clone())
                } else {
                    Err(Error::UnknownWaypoint(name.clone()))
                }
            })
            .collect()
    }
}
