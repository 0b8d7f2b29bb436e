use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorrectorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown bot profile: {0} (expected 'grammar' or 'english')")]
    UnknownProfile(String),

    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
}
