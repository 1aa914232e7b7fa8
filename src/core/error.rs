//! Purpose: Single error type shared by the session, codec, client and ABI layers.
//! Exports: `Error`, `ErrorKind`.
//! Role: Every fallible path in the crate returns `Result<_, Error>`.
//! Invariants: `ErrorKind::code` values are stable once published.
//! Invariants: Display text is exactly what lands in the `{"Err": ...}` envelope.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    InvalidInput,
    AlreadyInitialized,
    NotInitialized,
    AuthenticationFailed,
    NotFound,
    Upstream,
    Config,
}

impl ErrorKind {
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::Internal => 1,
            ErrorKind::InvalidInput => 2,
            ErrorKind::AlreadyInitialized => 3,
            ErrorKind::NotInitialized => 4,
            ErrorKind::AuthenticationFailed => 5,
            ErrorKind::NotFound => 6,
            ErrorKind::Upstream => 7,
            ErrorKind::Config => 8,
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            ErrorKind::Internal => "internal error",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::AlreadyInitialized => "already initialized",
            ErrorKind::NotInitialized => "not initialized",
            ErrorKind::AuthenticationFailed => "invalid credentials",
            ErrorKind::NotFound => "not found",
            ErrorKind::Upstream => "upstream error",
            ErrorKind::Config => "invalid configuration",
        }
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Wraps a failure reported by the scraping client, keeping its text verbatim.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream).with_message(message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message)?,
            None => f.write_str(self.kind.default_message())?,
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}
