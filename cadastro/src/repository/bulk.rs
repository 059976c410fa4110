//! Bulk mutation coordinator
//!
//! Deletes a set of ids one at a time, each with its own commit, so one bad
//! item (missing row, row still referenced) cannot sink the rest. After a
//! failed commit the session's tracked state is cleared before moving on;
//! otherwise the rejected change would be retried with every later commit.
//!
//! A run refuses to start while the session holds changes staged by the
//! caller: those would ride along with the first item's commit.

use crate::entity::Entity;
use crate::store::Store;

use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::generic::Repository;
use super::outcome::Outcome;

/// Per-item results of a bulk run
///
/// `succeeded.len() + failed.len()` always equals `requested`.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkReport<K> {
    pub requested: usize,
    pub succeeded: Vec<K>,
    pub failed: Vec<(K, RepositoryError)>,
}

impl<K> BulkReport<K> {
    fn new(requested: usize) -> Self {
        Self {
            requested,
            succeeded: Vec::with_capacity(requested),
            failed: Vec::new(),
        }
    }

    /// "N de M registros excluídos"
    pub fn summary(&self) -> String {
        format!(
            "{} de {} registros excluídos",
            self.succeeded.len(),
            self.requested
        )
    }

    /// All succeeded: `Success`; some: `PartialSuccess`; none: `Fail` with every item's error
    pub fn into_outcome(self) -> Outcome<Vec<K>> {
        if self.failed.is_empty() {
            return Outcome::Success(self.succeeded);
        }
        if self.succeeded.is_empty() {
            return Outcome::Fail(self.failed.into_iter().map(|(_, error)| error).collect());
        }
        let message = self.summary();
        Outcome::PartialSuccess {
            value: self.succeeded,
            message,
        }
    }
}

/// Name the item in the message so failures of a run stay distinguishable
fn label_item<E: Entity>(error: RepositoryError, id: &E::Id) -> RepositoryError {
    let message = match error.kind {
        RepositoryErrorKind::NotFound => format!("{} {id} não encontrado", E::NAME),
        _ => format!("{} {id}: {}", E::NAME, error.message),
    };
    RepositoryError {
        message,
        ..error.with_entity(E::NAME, id.to_string())
    }
}

fn first_error(errors: &[RepositoryError], fallback: impl FnOnce() -> RepositoryError) -> RepositoryError {
    errors
        .first()
        .cloned()
        .unwrap_or_else(fallback)
        .with_operation(RepositoryOperation::BulkDelete)
}

/// Remove each id in order, committing after every removal
///
/// Duplicate ids are processed per occurrence; a repeat fails as not found.
/// Infrastructure faults are recorded as that item's failure.
///
/// When the session already holds staged changes nothing is attempted:
/// every id fails with `ValidationFailed` and the staged work is left as is.
pub async fn delete_each<E: Entity, S: Store>(
    repository: &mut Repository<S>,
    ids: &[E::Id],
) -> BulkReport<E::Id> {
    let mut report = BulkReport::new(ids.len());

    if repository.session().has_pending() && !ids.is_empty() {
        let pending = repository.session().pending();
        tracing::warn!(
            entity = E::NAME,
            pending,
            "Bulk delete refused: session has staged changes"
        );
        let error = RepositoryError::validation_failed(
            "Existem alterações pendentes; salve ou descarte antes da exclusão em lote",
        )
        .with_operation(RepositoryOperation::BulkDelete);
        for id in ids {
            let error = error.clone().with_entity(E::NAME, id.to_string());
            report.failed.push((id.clone(), error));
        }
        return report;
    }

    for id in ids {
        let staged = match repository.remove_by_id::<E>(id.clone()).await {
            Ok(Outcome::Fail(errors)) => Err(first_error(&errors, || {
                RepositoryError::not_found(E::NAME, id.to_string())
            })),
            Ok(_) => Ok(()),
            Err(fault) => {
                tracing::error!(entity = E::NAME, id = %id, "Bulk delete lookup failed: {fault}");
                Err(fault.with_operation(RepositoryOperation::BulkDelete))
            }
        };
        if let Err(error) = staged {
            tracing::warn!(entity = E::NAME, id = %id, "Bulk delete skipped: {}", error.message);
            report.failed.push((id.clone(), label_item::<E>(error, id)));
            continue;
        }

        let committed = match repository.save_changes().await {
            Ok(Outcome::Fail(errors)) => Err(first_error(&errors, || {
                RepositoryError::referential_integrity(
                    RepositoryOperation::BulkDelete,
                    format!("{} não pôde ser excluído", E::NAME),
                )
            })),
            Ok(_) => Ok(()),
            Err(fault) => {
                tracing::error!(entity = E::NAME, id = %id, "Bulk delete commit failed: {fault}");
                Err(fault.with_operation(RepositoryOperation::BulkDelete))
            }
        };
        match committed {
            Ok(()) => report.succeeded.push(id.clone()),
            Err(error) => {
                tracing::warn!(entity = E::NAME, id = %id, "Bulk delete rejected: {}", error.message);
                repository.clear_tracked_state();
                report.failed.push((id.clone(), label_item::<E>(error, id)));
            }
        }
    }

    tracing::info!(
        entity = E::NAME,
        requested = report.requested,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "{}",
        report.summary()
    );
    report
}
