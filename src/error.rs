//! Error types for the card renderer

use thiserror::Error;

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while handling a render request
#[derive(Error, Debug)]
pub enum Error {
    /// Request used a method other than POST
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Request body carried no usable `html` field
    #[error("Missing HTML content")]
    MissingContent,

    /// Request body exceeded the configured limit
    #[error("Payload Too Large (limit {0} bytes)")]
    PayloadTooLarge(usize),

    /// The request body could not be read off the connection
    #[error("Unreadable request body: {0}")]
    BodyRead(String),

    /// The browser could not be launched
    #[error("Rendering engine unavailable: {0}")]
    RenderEngineUnavailable(String),

    /// Opening or configuring the page failed
    #[error("Page setup failed: {0}")]
    PageSetup(String),

    /// The document did not settle before the deadline
    #[error("Content load timed out after {0}ms")]
    ContentLoadTimeout(u64),

    /// The document could not be loaded into the page
    #[error("Content load failed: {0}")]
    ContentLoad(String),

    /// The page could not be printed to PDF
    #[error("PDF export failed: {0}")]
    PdfExportFailure(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status reported to the caller for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MethodNotAllowed => 405,
            Error::MissingContent | Error::BodyRead(_) => 400,
            Error::PayloadTooLarge(_) => 413,
            _ => 500,
        }
    }

    /// Whether the error was caused by the caller rather than the infrastructure.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
