use thiserror::Error;

#[derive(Error, Debug)]
pub enum DokkaiError {
    #[error("{0}")]
    Validation(String),

    #[error("\"{word}\" is already in the vocabulary for {unit_title}")]
    Duplicate { word: String, unit_title: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("There are no vocabulary items to export")]
    NothingToExport,

    #[error("Request error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Write failed and could not be fully rolled back: {0}")]
    PartialWrite(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DokkaiError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        DokkaiError::NotFound { kind, id: id.into() }
    }

    /// True for failures of the remote store or the network path to it.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            DokkaiError::Reqwest(_)
                | DokkaiError::Http { .. }
                | DokkaiError::Remote(_)
                | DokkaiError::PartialWrite(_)
        )
    }

    /// Errors that are shown as a dismissible notice rather than a failure.
    pub fn is_notice(&self) -> bool {
        matches!(self, DokkaiError::Duplicate { .. } | DokkaiError::NothingToExport)
    }
}

impl From<std::io::Error> for DokkaiError {
    fn from(error: std::io::Error) -> Self {
        DokkaiError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for DokkaiError {
    fn from(error: reqwest::Error) -> Self {
        DokkaiError::Reqwest(Box::new(error))
    }
}

pub type Result<T> = std::result::Result<T, DokkaiError>;
