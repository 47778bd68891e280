use std::fmt;

use thiserror::Error;

/// Why a single API call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Which part of the view a failed fetch was loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Repository,
    Issues,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Repository => write!(f, "repository"),
            Resource::Issues => write!(f, "issues"),
        }
    }
}

/// Failure signal surfaced to the view alongside the affected resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load {resource}: {cause}")]
pub struct FetchFailure {
    pub resource: Resource,
    pub cause: ApiError,
}

impl FetchFailure {
    pub fn new(resource: Resource, cause: ApiError) -> Self {
        Self { resource, cause }
    }
}

#[derive(Error, Debug)]
pub enum RepoLensError {
    #[error("Invalid repository identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RepoLensError>;
