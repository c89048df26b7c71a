use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Poll(#[from] tokenpoll::TokenError),

    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error("cannot read configuration file `{path}`: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("prompt error: {source}")]
    Prompt {
        #[from]
        source: inquire::InquireError,
    },
}

impl CliError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
