//! Tri-state operation outcome
//!
//! Every repository operation reports expected conditions through
//! [`Outcome`] instead of `Err`: a full success, a partial success carrying a
//! human-readable summary, or a failure with one or more
//! [`RepositoryError`]s.
//!
//! # Example
//!
//! ```rust
//! use cadastro::repository::{Outcome, RepositoryError};
//!
//! let ok: Outcome<u32> = Outcome::Success(3);
//! assert!(ok.is_success());
//!
//! let failed: Outcome<u32> = Outcome::fail(RepositoryError::not_found("Tarifa", "1"));
//! assert_eq!(failed.messages(), vec!["Tarifa não encontrado".to_string()]);
//! ```

use super::error::RepositoryError;

/// Result of a repository operation
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Outcome<T> {
    /// The operation completed fully
    Success(T),
    /// Some of the work completed; `message` summarises how much
    PartialSuccess { value: T, message: String },
    /// Nothing was done; never empty
    Fail(Vec<RepositoryError>),
}

impl<T> Outcome<T> {
    /// Failure with a single error
    ///
    /// ```rust
    /// use cadastro::repository::{Outcome, RepositoryError};
    ///
    /// let outcome: Outcome<()> = Outcome::fail(RepositoryError::validation_failed("Nome obrigatório"));
    /// assert_eq!(outcome.errors().len(), 1);
    /// ```
    pub fn fail(error: RepositoryError) -> Self {
        Outcome::Fail(vec![error])
    }

    /// Collapse an infrastructure fault into a failed outcome
    ///
    /// For callers that present faults and expected failures the same way.
    pub fn from_result(result: Result<Outcome<T>, RepositoryError>) -> Self {
        result.unwrap_or_else(Outcome::fail)
    }

    /// Whether the operation completed fully
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Whether only part of the work completed
    pub fn is_partial(&self) -> bool {
        matches!(self, Outcome::PartialSuccess { .. })
    }

    /// Whether nothing was done
    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    /// The carried value, if any work was done
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) | Outcome::PartialSuccess { value, .. } => Some(value),
            Outcome::Fail(_) => None,
        }
    }

    /// Take the carried value, dropping any partial-success message
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Success(value) | Outcome::PartialSuccess { value, .. } => Some(value),
            Outcome::Fail(_) => None,
        }
    }

    /// Errors of a failed outcome; empty otherwise
    pub fn errors(&self) -> &[RepositoryError] {
        match self {
            Outcome::Fail(errors) => errors,
            _ => &[],
        }
    }

    /// User-facing messages: the partial summary or the error messages
    pub fn messages(&self) -> Vec<String> {
        match self {
            Outcome::Success(_) => Vec::new(),
            Outcome::PartialSuccess { message, .. } => vec![message.clone()],
            Outcome::Fail(errors) => errors.iter().map(|e| e.message.clone()).collect(),
        }
    }

    /// Transform the carried value, keeping the variant and its message
    ///
    /// ```rust
    /// use cadastro::repository::Outcome;
    ///
    /// let partial = Outcome::PartialSuccess { value: vec![1, 2], message: "2 de 3 registros excluídos".to_string() };
    /// let counted = partial.map(|ids| ids.len());
    /// assert_eq!(counted.value(), Some(&2));
    /// assert!(counted.is_partial());
    /// ```
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::PartialSuccess { value, message } => Outcome::PartialSuccess {
                value: f(value),
                message,
            },
            Outcome::Fail(errors) => Outcome::Fail(errors),
        }
    }

    /// Chain a step that only runs when a value is available
    ///
    /// A partial result stays partial. When both steps are partial their
    /// messages are joined with `"; "`, outer first. A failing step wins.
    ///
    /// ```rust
    /// use cadastro::repository::Outcome;
    ///
    /// let first = Outcome::PartialSuccess { value: 2, message: "2 de 3 registros excluídos".to_string() };
    /// let chained = first.and_then(|n| Outcome::PartialSuccess { value: n * 10, message: "1 de 2 registros excluídos".to_string() });
    /// assert_eq!(chained.messages(), vec!["2 de 3 registros excluídos; 1 de 2 registros excluídos".to_string()]);
    /// ```
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::PartialSuccess { value, message } => match f(value) {
                Outcome::Success(value) => Outcome::PartialSuccess { value, message },
                Outcome::PartialSuccess {
                    value,
                    message: inner,
                } => Outcome::PartialSuccess {
                    value,
                    message: format!("{message}; {inner}"),
                },
                Outcome::Fail(errors) => Outcome::Fail(errors),
            },
            Outcome::Fail(errors) => Outcome::Fail(errors),
        }
    }
}

impl<T> From<RepositoryError> for Outcome<T> {
    fn from(error: RepositoryError) -> Self {
        Outcome::fail(error)
    }
}
