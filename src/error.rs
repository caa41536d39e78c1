use std::fmt;

/// A parse or access failure, carrying a 1-based source position when one
/// is known. Errors produced outside of parsing have no position and
/// report -1 for both coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    reason: String,
    line: i32,
    column: i32,
}

impl Error {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            line: -1,
            column: -1,
        }
    }

    pub fn at(reason: impl Into<String>, line: i32, column: i32) -> Self {
        Self {
            reason: reason.into(),
            line,
            column,
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn line(&self) -> i32 {
        self.line
    }

    pub fn column(&self) -> i32 {
        self.column
    }

    pub fn has_position(&self) -> bool {
        self.line >= 0
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_position() {
            write!(f, "{} at [{}:{}]", self.reason, self.line, self.column)
        } else {
            write!(f, "{}", self.reason)
        }
    }
}

impl std::error::Error for Error {}
