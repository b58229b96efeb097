//! Error types for schema loading, form compilation and field validation.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the form engine.
///
/// Field-level validation failures are never reported through this type;
/// they are collected as [`ErrorKind`] values on each field.
#[derive(Debug, Error)]
pub enum FormError {
    /// No provider with this name exists in the loaded schema.
    #[error("provider not found: {0}")]
    NotFound(String),

    /// No category with this name exists in the current form.
    #[error("category not found: {0}")]
    CategoryNotFound(String),

    /// No field with this label exists in the given category.
    #[error("field not found: {category}/{label}")]
    FieldNotFound { category: String, label: String },

    /// The schema document has an invalid shape.
    #[error("invalid schema at {path}: {message}")]
    InvalidSchema { path: String, message: String },

    /// A schema was already loaded into the store.
    #[error("schema already loaded")]
    SchemaAlreadyLoaded,

    /// No schema has been loaded yet.
    #[error("schema not loaded")]
    SchemaNotLoaded,

    /// The document is not valid JSON.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FormError {
    pub(crate) fn invalid_schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

/// A single validation failure on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required field is empty.
    MissingValue,
    /// The value exceeds the configured maximum length.
    TooLong,
    /// The value contains something other than decimal digits.
    NonDigits,
    /// The value is not a well-formed dash-separated digit string or date.
    InvalidFormat,
    /// The date is not in the past.
    NotPast,
    /// The date is not in the future.
    NotFuture,
    /// The value is not a recognized province code.
    InvalidProvince,
}

impl ErrorKind {
    /// Returns the stable key the presentation layer uses to look up messages.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::MissingValue => "required",
            Self::TooLong => "maxlength",
            Self::NonDigits => "digits",
            Self::InvalidFormat => "invalid_format",
            Self::NotPast => "past_date",
            Self::NotFuture => "future_date",
            Self::InvalidProvince => "invalid_province",
        }
    }

    /// Returns the default human-readable message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingValue => "This field is required.",
            Self::TooLong => "This value is too long.",
            Self::NonDigits => "Only digits are allowed.",
            Self::InvalidFormat => "This value has an invalid format.",
            Self::NotPast => "The date must be in the past.",
            Self::NotFuture => "The date must be in the future.",
            Self::InvalidProvince => "Enter a valid province code.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The set of failures reported for one field.
pub type FieldErrors = BTreeSet<ErrorKind>;
