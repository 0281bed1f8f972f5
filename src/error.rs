use thiserror::Error;

/// Errors returned by the resolution stages in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid parameter value, rejected when a stage is constructed.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// A profile's identifier does not match its position in its collection.
    #[error("profile id mismatch: expected {expected}, found {found}")]
    ProfileIdMismatch {
        /// Position of the profile in its collection.
        expected: usize,
        /// Identifier carried by the profile.
        found: usize,
    },

    /// A candidate pair references a profile the dataset does not contain.
    #[error("profile index {index} out of range for dataset of {len} profiles")]
    ProfileOutOfRange {
        /// Offending unified profile index.
        index: usize,
        /// Number of profiles in the dataset.
        len: usize,
    },

    /// A known-duplicate pair that does not name two distinct profiles.
    #[error("duplicate pair ({left}, {right}) does not join two distinct profiles")]
    InvalidDuplicatePair {
        /// First index as given.
        left: usize,
        /// Second index as given.
        right: usize,
    },

    /// A scorer returned a value outside `[0, 1]` (or NaN).
    #[error("invalid score {score} for pair ({left}, {right})")]
    InvalidScore {
        /// First profile of the pair.
        left: usize,
        /// Second profile of the pair.
        right: usize,
        /// Returned score.
        score: f64,
    },

    /// An edge connecting a node to itself.
    #[error("self-loop on node {0}")]
    SelfLoop(usize),

    /// Edge weight that is negative or not finite.
    #[error("invalid edge weight {weight} for ({left}, {right})")]
    InvalidWeight {
        /// First endpoint.
        left: usize,
        /// Second endpoint.
        right: usize,
        /// Offending weight.
        weight: f64,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
