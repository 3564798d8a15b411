use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotaryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Ledger error: {0}")]
    Ledger(String),
}

pub type Result<T> = std::result::Result<T, NotaryError>;
