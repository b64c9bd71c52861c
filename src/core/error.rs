//! Crate wide error type.
use super::geometry::Point3f;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No region of the tissue claims the position. The tissue is not an
    /// exhaustive partition of space, which is a configuration defect.
    #[error("no tissue region contains position {position}")]
    Geometry { position: Point3f },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("photon database format error: {0}")]
    DatabaseFormat(String),

    #[error("invalid simulation input: {0}")]
    Config(String),

    #[error("perturbation error: {0}")]
    Perturbation(String),

    #[error("simulation cancelled")]
    Cancelled,

    #[error("unable to build worker pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, Error>;
