use thiserror::Error;

#[derive(Error, Debug)]
pub enum DictError {
    #[error("Service error: {0}")]
    Service(String),

    #[error("Collection failed for solution '{solution}' during {stage}: {message}")]
    Collection {
        solution: String,
        stage: String,
        message: String,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, DictError>;

impl DictError {
    /// Wrap a service failure with the solution and stage it happened in.
    pub fn in_collection(solution: &str, stage: &str, err: DictError) -> Self {
        Self::Collection {
            solution: solution.to_string(),
            stage: stage.to_string(),
            message: err.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for DictError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<std::io::Error> for DictError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DictError {
    fn from(err: serde_json::Error) -> Self {
        Self::Fixture(err.to_string())
    }
}
