//! The error type shared by every typed value conversion in [`crate::values`].
use std::fmt;

use bstr::BString;

///
pub mod parse {
    use super::*;

    /// Returned when a raw config value's bytes don't form a valid instance of the requested type.
    #[derive(Debug)]
    pub struct Error {
        message: &'static str,
        input: BString,
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    }

    impl Error {
        /// Build a new error, recording the offending `input` for display.
        pub fn new(message: &'static str, input: impl Into<BString>) -> Self {
            Error {
                message,
                input: input.into(),
                source: None,
            }
        }

        /// Attach the lower-level `err` that caused this failure (e.g. a UTF-8 conversion error).
        pub fn with_err<E>(mut self, err: E) -> Self
        where
            E: std::error::Error + Send + Sync + 'static,
        {
            self.source = Some(Box::new(err));
            self
        }
    }

    impl fmt::Display for Error {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}: got {:?}", self.message, self.input)
        }
    }

    impl std::error::Error for Error {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.source.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
        }
    }
}
