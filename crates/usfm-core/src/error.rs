//! Error types for parsing and reassembly

use thiserror::Error;

/// Result type for USFM operations
pub type Result<T> = std::result::Result<T, UsfmError>;

/// Errors that can occur while transforming a USFM document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsfmError {
    /// The input text is not well-formed USFM
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-indexed source line
        line: usize,
        message: String,
    },

    /// A flattened verse could not be written back as `\v <n> ...`
    #[error("Failed to convert verse {verse} back to USFM")]
    Conversion { verse: String },
}

impl UsfmError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        UsfmError::Parse {
            line,
            message: message.into(),
        }
    }
}
