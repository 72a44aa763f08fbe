use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid {name} '{value}': expected one of {expected}")]
    InvalidArgument {
        name:     &'static str,
        value:    String,
        expected: String,
    },

    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Parse error in {table} at line {line}: {message}")]
    Parse {
        table:   String,
        line:    usize,
        message: String,
    },

    #[error("Engine '{engine}' panicked")]
    EnginePanicked { engine: &'static str },
}

pub type MetricsResult<T> = Result<T, MetricsError>;
