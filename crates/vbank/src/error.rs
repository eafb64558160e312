use thiserror::Error;

pub type Result<T> = std::result::Result<T, VBankError>;

#[derive(Debug, Error)]
pub enum VBankError {
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid url: {0}")]
    Url(String),
}
