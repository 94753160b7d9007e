use thiserror::Error;

/// Top-level error type for the Flatland arrangement kernel.
#[derive(Debug, Error)]
pub enum FlatlandError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors related to geometric input.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate segment: source and target coincide at ({x}, {y})")]
    DegenerateSegment { x: f64, y: f64 },

    #[error("non-finite coordinate: ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },
}

/// Errors related to the topological structure of an arrangement.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("boundary walk did not return to its start within {cap} steps")]
    CorruptedBoundary { cap: usize },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to point-location queries.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("arrangement construction did not complete; queries are unavailable")]
    UnfinishedArrangement,
}

/// Errors related to reading and writing arrangement files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("malformed record at line {line}: {content:?}")]
    MalformedRecord { line: usize, content: String },

    #[error(transparent)]
    Resource(#[from] std::io::Error),
}

/// Convenience type alias for results using [`FlatlandError`].
pub type Result<T> = std::result::Result<T, FlatlandError>;
