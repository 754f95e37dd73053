use thiserror::Error;

use crate::fetcher::FetchError;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("could not download the document: {0}")]
    Fetch(#[from] FetchError),

    #[error("{method} extraction failed: {message}")]
    Extraction {
        method: &'static str,
        message: String,
    },

    #[error(
        "no text could be extracted from the document; verify the file is valid and contains readable text"
    )]
    Empty,

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
}

impl ExtractError {
    pub fn extraction(method: &'static str, message: impl Into<String>) -> Self {
        Self::Extraction {
            method,
            message: message.into(),
        }
    }
}
