use std::path::PathBuf;
use thiserror::Error;

/// Result type for rankquest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rankquest operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The search plugin configuration file does not exist
    #[error("{} does not exist", .0.display())]
    ConfigurationNotFound(PathBuf),

    /// The test cases file does not exist
    #[error("{} does not exist", .0.display())]
    TestCasesNotFound(PathBuf),

    /// No plugin factory is registered for the configured plugin type
    #[error("plugin factory not found for {plugin_type}. Registered plugin types: {available:?}")]
    UnknownPluginType {
        plugin_type: String,
        available: Vec<String>,
    },

    /// The requested report destination is already present
    #[error("{} already exists", .0.display())]
    OutputAlreadyExists(PathBuf),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed configuration or test case documents
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// A search backend failed to answer a query
    #[error("Search error: {0}")]
    Search(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a parse error
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Creates a search backend error
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Creates an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error aborts a run before any backend call is made
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Search(_))
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}
