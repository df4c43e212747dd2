use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),

    // Credential errors
    #[error("Invalid card UID: {0}")]
    InvalidCardUid(String),

    #[error("Invalid combination digit {digit}, maximum is {max}")]
    InvalidComboDigit { digit: u8, max: u8 },

    #[error("Invalid access policy: {0}")]
    InvalidPolicy(String),
}

pub type Result<T> = std::result::Result<T, Error>;
