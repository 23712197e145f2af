use std::fmt;

use sgraph_core::{GridError, Point};

/// Errors raised while preprocessing, persisting or querying a graph.
///
/// A query between disconnected cells is not an error: it succeeds with no
/// path. A query that stops early is one.
#[derive(Debug)]
pub enum SubgoalError {
    /// Start or goal is out of bounds or blocked.
    InvalidLocation(Point),
    /// A grid-level lookup was asked about a blocked or out-of-bounds cell.
    InvalidQuery(Point),
    /// The map has more subgoals than ids can address.
    MapTooLarge { subgoals: usize, budget: usize },
    /// A serialized graph is inconsistent.
    CorruptGraphFile(String),
    /// A query between connected cells gave up after `expansions` node
    /// expansions, per `GraphConfig::max_expansions`.
    SearchBounded { expansions: usize },
    /// An abstract hop could not be expanded into grid cells.
    Unrefinable { from: Point, to: Point },
    /// Preprocessing was cancelled through its context.
    Cancelled,
    /// The map itself could not be built.
    Grid(GridError),
    Io(std::io::Error),
}

impl fmt::Display for SubgoalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLocation(p) => write!(f, "invalid location {p}: out of bounds or blocked"),
            Self::InvalidQuery(p) => write!(f, "invalid query at {p}: cell is not traversable"),
            Self::MapTooLarge { subgoals, budget } => {
                write!(f, "map too large: {subgoals} subgoals exceed the budget of {budget}")
            }
            Self::CorruptGraphFile(reason) => write!(f, "corrupt graph file: {reason}"),
            Self::SearchBounded { expansions } => {
                write!(f, "search abandoned after {expansions} expansions")
            }
            Self::Unrefinable { from, to } => write!(f, "hop {from} -> {to} could not be refined"),
            Self::Cancelled => f.write_str("preprocessing cancelled"),
            Self::Grid(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for SubgoalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SubgoalError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<GridError> for SubgoalError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<bincode::Error> for SubgoalError {
    fn from(e: bincode::Error) -> Self {
        match *e {
            bincode::ErrorKind::Io(io) => Self::Io(io),
            other => Self::CorruptGraphFile(other.to_string()),
        }
    }
}

pub type Result<T, E = SubgoalError> = std::result::Result<T, E>;
