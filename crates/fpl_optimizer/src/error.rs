use thiserror::Error;

pub type Result<T> = std::result::Result<T, FplOptError>;

#[derive(Debug, Error)]
pub enum FplOptError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid CSV Header: {0}")]
    CsvHeader(String),

    #[error("Invalid CSV row {row}: expected at least {expected} columns, got {got}")]
    CsvRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Unknown club at row {row}: {label}")]
    UnknownClub { row: usize, label: String },

    #[error("Unknown position at row {row}: {label}")]
    UnknownPosition { row: usize, label: String },

    #[error("Invalid {field} at row {row}: {value}")]
    NumberParse {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Optimization solver error: {0}")]
    Solver(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FplOptError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        FplOptError::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for FplOptError {
    fn from(err: toml::de::Error) -> Self {
        FplOptError::Config(format!("TOML parse error: {}", err))
    }
}
