//! Field-level validation errors.
//!
//! Request bodies are checked field by field and every failure is collected,
//! so a client sees all problems with a submission at once rather than one
//! per round trip.

use core::fmt;

use serde::Serialize;

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `shippingAddress.city`.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

/// An ordered collection of [`FieldError`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// An empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Shorthand for a collection holding one error.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a failed check.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Whether no checks failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The recorded errors, in the order they were added.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any error refers to `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Trimmed copy of `value` if it has at least `min_chars` characters.
///
/// Records an error against `field` and returns `None` otherwise, including
/// when the value is missing altogether.
pub fn require_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    min_chars: usize,
) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.add(field, format!("{field} is required"));
        return None;
    }
    if trimmed.chars().count() < min_chars {
        errors.add(
            field,
            format!("{field} must be at least {min_chars} characters"),
        );
        return None;
    }
    Some(trimmed.to_owned())
}
