//! Error types produced while binding arguments.

use std::fmt;

use thiserror::Error;

/// Result alias for single-field binding.
pub type BindResult<T> = Result<T, BindError>;

/// A problem with one argument.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BindError {
    /// The call arguments were not a JSON object.
    #[error("arguments must be an object, got {found}")]
    NotAnObject {
        /// Dynamic type that was received instead.
        found: &'static str,
    },

    /// A required key was absent or `null`.
    #[error("missing required parameter `{key}`")]
    Missing {
        /// Name of the missing key.
        key: String,
    },

    /// The value had a different dynamic type than expected.
    #[error("parameter `{key}` must be {expected}, got {found}")]
    WrongType {
        /// Name of the offending key.
        key: String,
        /// Expected dynamic type.
        expected: &'static str,
        /// Dynamic type that was received.
        found: &'static str,
    },

    /// A number destined for an integer field had a fractional part.
    #[error("parameter `{key}` must be an integer, got {value}")]
    NotIntegral {
        /// Name of the offending key.
        key: String,
        /// The received number.
        value: f64,
    },

    /// An integral number did not fit into the destination type.
    #[error("parameter `{key}` value {value} does not fit in {target}")]
    OutOfRange {
        /// Name of the offending key.
        key: String,
        /// The received number.
        value: f64,
        /// Destination integer type.
        target: &'static str,
    },

    /// A string did not match the expected date or time layout.
    #[error("parameter `{key}` must match format {format}, got `{value}`")]
    BadFormat {
        /// Name of the offending key.
        key: String,
        /// Human-readable layout, e.g. `YYYY-MM-DD`.
        format: &'static str,
        /// The received string.
        value: String,
    },

    /// The value is not part of the allowed set.
    #[error("parameter `{key}` value `{value}` is not one of [{}]", .allowed.join(", "))]
    NotAllowed {
        /// Name of the offending key.
        key: String,
        /// The rejected value.
        value: String,
        /// Accepted values.
        allowed: Vec<String>,
    },

    /// The value lies outside the accepted inclusive range.
    #[error("parameter `{key}` value {value} must be between {min} and {max}")]
    NotInRange {
        /// Name of the offending key.
        key: String,
        /// The rejected value.
        value: String,
        /// Smallest accepted value.
        min: String,
        /// Largest accepted value.
        max: String,
    },
}

impl BindError {
    /// Returns the argument key the error refers to, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::NotAnObject { .. } => None,
            Self::Missing { key }
            | Self::WrongType { key, .. }
            | Self::NotIntegral { key, .. }
            | Self::OutOfRange { key, .. }
            | Self::BadFormat { key, .. }
            | Self::NotAllowed { key, .. }
            | Self::NotInRange { key, .. } => Some(key),
        }
    }

    pub(crate) fn wrong_type(key: &str, expected: &'static str, found: &'static str) -> Self {
        Self::WrongType {
            key: key.to_owned(),
            expected,
            found,
        }
    }
}

/// Every problem found while binding one request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindErrors {
    errors: Vec<BindError>,
}

impl BindErrors {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error.
    pub fn push(&mut self, error: BindError) {
        self.errors.push(error);
    }

    /// Returns the recorded errors in extractor order.
    #[must_use]
    pub fn errors(&self) -> &[BindError] {
        &self.errors
    }

    /// Returns the number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts into `Ok(())` when empty, `Err(self)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<BindError> for BindErrors {
    fn from(error: BindError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for BindErrors {
    type Item = BindError;
    type IntoIter = std::vec::IntoIter<BindError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for BindErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            fmt::Display::fmt(error, f)?;
        }
        Ok(())
    }
}

impl std::error::Error for BindErrors {}
