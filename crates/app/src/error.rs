use thiserror::Error;
use tracker_store::StoreError;
use unifi::SourceError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("authenticate: {0}")]
    Auth(#[source] SourceError),
    #[error("fetch device counters: {0}")]
    Fetch(#[source] SourceError),
    #[error("load usage state: {0}")]
    Load(#[source] StoreError),
    #[error("save usage state: {0}")]
    Save(#[source] StoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Cycle step that produced the error.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Auth(_) => "authenticate",
            Self::Fetch(_) => "fetch",
            Self::Load(_) => "load",
            Self::Save(_) => "save",
            Self::Io(_) => "io",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
