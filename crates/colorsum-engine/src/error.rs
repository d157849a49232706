use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationErrorKind {
    MissingImage,
    Oversize,
    UnsupportedType,
    Unreadable,
    InFlight,
}

/// A recoverable problem with user input. Never changes the session state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_image() -> Self {
        Self::new(
            ValidationErrorKind::MissingImage,
            "Select an image first (use /open <path> or drop a file).",
        )
    }

    pub fn in_flight() -> Self {
        Self::new(
            ValidationErrorKind::InFlight,
            "A palette request is already in flight; wait for it to finish.",
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SummarizeErrorKind {
    /// The service answered with a non-2xx status.
    Status,
    /// No response was received.
    Transport,
    /// The response body was not the expected structured data.
    Parse,
}

impl SummarizeErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Transport => "transport",
            Self::Parse => "parse",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SummarizeError {
    pub kind: SummarizeErrorKind,
    pub message: String,
}

impl SummarizeError {
    pub fn status(code: u16, body: &str) -> Self {
        Self {
            kind: SummarizeErrorKind::Status,
            message: format!("HTTP {code}: {body}"),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: SummarizeErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: SummarizeErrorKind::Parse,
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind == SummarizeErrorKind::Transport
    }
}

impl fmt::Display for SummarizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SummarizeError {}
