//! Repository error types
//!
//! Every expected failure of the core (missing rows, duplicates, referential
//! integrity, no-op updates, invalid queries) is described by a
//! [`RepositoryError`]. These values travel inside
//! [`Outcome::Fail`](super::Outcome::Fail); only infrastructure faults are
//! ever returned through `Err`.
//!
//! # Example
//!
//! ```rust
//! use cadastro::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("Tarifa", "42");
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert_eq!(error.message, "Tarifa não encontrado");
//! ```

use std::fmt;

use crate::store::StoreError;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Materializing a list of entities
    GetList,
    /// Finding a single entity by ID
    GetById,
    /// Checking whether any entity matches a specification
    Exists,
    /// Counting entities matching a specification
    Count,
    /// Staging a new entity
    Create,
    /// Staging an update of an existing entity
    Update,
    /// Staging the removal of an entity
    Remove,
    /// Building a paginated, projected page
    Paginate,
    /// Committing staged changes
    SaveChanges,
    /// Per-item deletion driven by the bulk coordinator
    BulkDelete,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetList => write!(f, "get_list"),
            Self::GetById => write!(f, "get_by_id"),
            Self::Exists => write!(f, "exists"),
            Self::Count => write!(f, "count"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Remove => write!(f, "remove"),
            Self::Paginate => write!(f, "paginate"),
            Self::SaveChanges => write!(f, "save_changes"),
            Self::BulkDelete => write!(f, "bulk_delete"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// The id does not resolve to a row
    NotFound,
    /// A unique value is already in use
    AlreadyExists,
    /// Other rows still reference the row being removed, or a referenced row is missing
    ReferentialIntegrity,
    /// Any other store constraint (duplicate primary key, missing row at commit)
    ConstraintViolation,
    /// Update requested with no effective change
    NoOpUpdate,
    /// Caller-supplied data failed a precondition
    ValidationFailed,
    /// Unknown column, include path, or malformed request
    InvalidQuery,
    /// The store could not be reached
    ConnectionFailed,
    /// A row could not be converted to or from its entity type
    SerializationError,
    /// Unclassified store failure
    DatabaseError,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ReferentialIntegrity => write!(f, "referential_integrity"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::NoOpUpdate => write!(f, "no_op_update"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::InvalidQuery => write!(f, "invalid_query"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::DatabaseError => write!(f, "database_error"),
        }
    }
}

/// Structured repository error with operation context
///
/// `message` is the human-facing text (Portuguese, as shown to end users);
/// `Display` adds the operation and kind for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The human name of the entity involved (e.g., "Tarifa", "Veículo")
    pub entity_type: Option<String>,
    /// The ID of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a "not found" error with entity context
    ///
    /// ```rust
    /// use cadastro::repository::RepositoryError;
    ///
    /// let error = RepositoryError::not_found("Distrito", "7");
    /// assert_eq!(error.entity_type, Some("Distrito".to_string()));
    /// assert_eq!(error.entity_id, Some("7".to_string()));
    /// ```
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        let entity_id = entity_id.into();
        Self {
            operation: RepositoryOperation::GetById,
            kind: RepositoryErrorKind::NotFound,
            message: format!("{entity_type} não encontrado"),
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
        }
    }

    /// Create an "already exists" error for a conflicting unique value
    ///
    /// ```rust
    /// use cadastro::repository::RepositoryError;
    ///
    /// let error = RepositoryError::already_exists("Cemitério", "Nome");
    /// assert_eq!(error.message, "Já existe um(a) Cemitério com este(a) Nome");
    /// ```
    pub fn already_exists(entity_type: impl Into<String>, field: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        let field = field.into();
        Self {
            operation: RepositoryOperation::Create,
            kind: RepositoryErrorKind::AlreadyExists,
            message: format!("Já existe um(a) {entity_type} com este(a) {field}"),
            entity_type: Some(entity_type),
            entity_id: None,
        }
    }

    /// Create a no-op update error
    pub fn no_op_update(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        Self {
            operation: RepositoryOperation::Update,
            kind: RepositoryErrorKind::NoOpUpdate,
            message: format!("Nenhuma alteração detectada em {entity_type}"),
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.into()),
        }
    }

    /// Create a validation failed error
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::Create,
            kind: RepositoryErrorKind::ValidationFailed,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create an invalid query error (unknown column or include path)
    pub fn invalid_query(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind: RepositoryErrorKind::InvalidQuery,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a referential integrity error
    pub fn referential_integrity(
        operation: RepositoryOperation,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind: RepositoryErrorKind::ReferentialIntegrity,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::GetList,
            kind: RepositoryErrorKind::ConnectionFailed,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a serialization error
    pub fn serialization_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind: RepositoryErrorKind::SerializationError,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is an infrastructure fault rather than an expected condition
    ///
    /// Faults are the only errors allowed to cross the repository boundary as `Err`.
    pub fn is_fault(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed
                | RepositoryErrorKind::SerializationError
                | RepositoryErrorKind::DatabaseError
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(ref entity_type), Some(ref entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        let kind = match &err {
            StoreError::Unavailable(_) => RepositoryErrorKind::ConnectionFailed,
            StoreError::UniqueViolation { .. } => RepositoryErrorKind::AlreadyExists,
            StoreError::ForeignKeyViolation { .. } | StoreError::RowReferenced { .. } => {
                RepositoryErrorKind::ReferentialIntegrity
            }
            StoreError::DuplicateKey { .. } | StoreError::MissingRow { .. } => {
                RepositoryErrorKind::ConstraintViolation
            }
            StoreError::MalformedRow { .. } => RepositoryErrorKind::SerializationError,
            StoreError::UnknownTable(_) => RepositoryErrorKind::DatabaseError,
        };

        let message = match &err {
            StoreError::RowReferenced { table, referencing_table, .. } => format!(
                "Registro de {table} está em uso por {referencing_table} e não pode ser excluído"
            ),
            StoreError::ForeignKeyViolation { column, referenced_table, .. } => {
                format!("{column} referencia um registro inexistente em {referenced_table}")
            }
            StoreError::UniqueViolation { table, column, .. } => {
                format!("Já existe um registro em {table} com este(a) {column}")
            }
            other => other.to_string(),
        };

        let entity_id = match &err {
            StoreError::RowReferenced { key, .. }
            | StoreError::DuplicateKey { key, .. }
            | StoreError::MissingRow { key, .. } => Some(key.clone()),
            _ => None,
        };

        Self {
            operation: RepositoryOperation::SaveChanges,
            kind,
            message,
            entity_type: None,
            entity_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_operation_display() {
        assert_eq!(format!("{}", RepositoryOperation::GetList), "get_list");
        assert_eq!(format!("{}", RepositoryOperation::GetById), "get_by_id");
        assert_eq!(format!("{}", RepositoryOperation::SaveChanges), "save_changes");
        assert_eq!(format!("{}", RepositoryOperation::BulkDelete), "bulk_delete");
    }

    #[test]
    fn test_repository_error_kind_display() {
        assert_eq!(format!("{}", RepositoryErrorKind::NotFound), "not_found");
        assert_eq!(
            format!("{}", RepositoryErrorKind::ReferentialIntegrity),
            "referential_integrity"
        );
        assert_eq!(format!("{}", RepositoryErrorKind::NoOpUpdate), "no_op_update");
        assert_eq!(format!("{}", RepositoryErrorKind::InvalidQuery), "invalid_query");
    }

    #[test]
    fn test_not_found_convenience() {
        let error = RepositoryError::not_found("Tarifa", "12");
        assert_eq!(error.operation, RepositoryOperation::GetById);
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.message, "Tarifa não encontrado");
        assert_eq!(error.entity_id, Some("12".to_string()));
    }

    #[test]
    fn test_no_op_update_convenience() {
        let error = RepositoryError::no_op_update("Licença", "3");
        assert_eq!(error.operation, RepositoryOperation::Update);
        assert_eq!(error.kind, RepositoryErrorKind::NoOpUpdate);
    }

    #[test]
    fn test_with_operation() {
        let error = RepositoryError::not_found("Tarifa", "1")
            .with_operation(RepositoryOperation::BulkDelete);
        assert_eq!(error.operation, RepositoryOperation::BulkDelete);
    }

    #[test]
    fn test_is_fault() {
        assert!(RepositoryError::connection_failed("refused").is_fault());
        assert!(!RepositoryError::not_found("Tarifa", "1").is_fault());
        assert!(!RepositoryError::validation_failed("invalid").is_fault());
    }

    #[test]
    fn test_display_with_entity() {
        let error = RepositoryError::not_found("Tarifa", "9");
        let display = format!("{}", error);
        assert!(display.contains("not_found"));
        assert!(display.contains("get_by_id"));
        assert!(display.contains("[Tarifa: 9]"));
    }

    #[test]
    fn test_display_without_entity() {
        let error = RepositoryError::validation_failed("Marca informada não existe");
        let display = format!("{}", error);
        assert!(display.contains("validation_failed"));
        assert!(!display.contains('['));
    }

    #[test]
    fn test_from_store_row_referenced() {
        let error = RepositoryError::from(StoreError::RowReferenced {
            table: "tarifas".to_string(),
            key: "4".to_string(),
            referencing_table: "itens".to_string(),
            column: "tarifa_id".to_string(),
        });
        assert_eq!(error.kind, RepositoryErrorKind::ReferentialIntegrity);
        assert_eq!(error.operation, RepositoryOperation::SaveChanges);
        assert_eq!(error.entity_id, Some("4".to_string()));
    }

    #[test]
    fn test_from_store_unavailable_is_fault() {
        let error = RepositoryError::from(StoreError::Unavailable("down".to_string()));
        assert!(error.is_fault());
    }
}
