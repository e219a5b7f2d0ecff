use thiserror::Error;
use wfc_core::WfcError;
use wfc_rules::LoadError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rule Loading Error: {0}")]
    Load(#[from] LoadError),

    #[error("WFC Core Error: {0}")]
    Wfc(#[from] WfcError),

    #[error("Output Error: {0}")]
    Output(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}
