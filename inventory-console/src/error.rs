use thiserror::Error;

pub const MSG_BAD_REQUEST: &str = "Campos faltantes o formato inválido.";
pub const MSG_SERVER_ERROR: &str = "Error interno del servidor.";
pub const MSG_UNAUTHORIZED: &str = "No autorizado";

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend answered 401; the local session has already been cleared.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not carry the fields the caller expected.
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// The envelope came back with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ConsoleError {
    /// Text shown to the operator for this failure.
    ///
    /// 400 and 5xx responses collapse to fixed messages; everything else
    /// carries its own description.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::BadRequest(_) => MSG_BAD_REQUEST.to_string(),
            ConsoleError::Server(_) => MSG_SERVER_ERROR.to_string(),
            ConsoleError::Unauthorized(_) => MSG_UNAUTHORIZED.to_string(),
            ConsoleError::Rejected(message)
            | ConsoleError::Validation(message)
            | ConsoleError::Workflow(message) => message.clone(),
            ConsoleError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, ConsoleError::Shape(_))
    }
}

impl From<validator::ValidationErrors> for ConsoleError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ConsoleError::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
