//! Error types

use thiserror::Error;

/// Failures the cache construction can surface. No error is retried
/// internally: the cache either completes fully or reports one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An unknown configuration tag was supplied to the factory.
    #[error("unknown photon GI cache configuration: {0}")]
    Configuration(String),

    /// The Markov chain bootstrap could not find any light path depositing
    /// photons.
    #[error("unable to find a useful light path; the scene may be empty")]
    EmptyScene,

    /// Construction was cooperatively interrupted.
    #[error("photon GI cache construction was cancelled")]
    Cancelled,
}
