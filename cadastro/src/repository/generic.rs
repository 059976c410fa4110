//! Specification-driven generic repository
//!
//! One [`Repository`] serves every entity type: each operation is generic
//! over `E: Entity` (and a projection `D` where relevant). Reads run against
//! committed state; mutations are staged in the repository's session and
//! reach the store only on [`Repository::save_changes`].
//!
//! Expected conditions come back as [`Outcome::Fail`]. Only infrastructure
//! faults (unreachable store, unreadable rows) are returned as `Err`.

use std::sync::Arc;

use crate::config::PaginationConfig;
use crate::entity::{Entity, EntityKey, Projection};
use crate::store::{Change, Store};

use super::bulk;
use super::error::{RepositoryError, RepositoryOperation};
use super::evaluator::{evaluate, execute, Query};
use super::ordering::OrderBy;
use super::outcome::Outcome;
use super::pagination::{PaginatedResult, Pagination, TableFilter};
use super::session::{from_row, strip_navigation, to_row, Session};
use super::specification::{Predicate, Specification};

/// Result of a repository operation: `Err` carries infrastructure faults only
pub type RepositoryResult<T> = Result<Outcome<T>, RepositoryError>;

/// Split a fallible step into a fault (`Err`) or an expected failure (`Fail`)
fn settle<T>(result: Result<T, RepositoryError>) -> RepositoryResult<T> {
    match result {
        Ok(value) => Ok(Outcome::Success(value)),
        Err(error) if error.is_fault() => {
            tracing::error!(
                operation = %error.operation,
                kind = %error.kind,
                "Repository fault: {}",
                error.message
            );
            Err(error)
        }
        Err(error) => Ok(Outcome::fail(error)),
    }
}

/// Generic repository over a [`Store`], owning one change-tracking session
#[derive(Debug)]
pub struct Repository<S> {
    session: Session<S>,
    pagination: PaginationConfig,
}

impl<S: Store> Repository<S> {
    /// Repository over `store` with default pagination bounds
    ///
    /// ```rust
    /// use cadastro::prelude::*;
    ///
    /// let repo = Repository::new(MemoryStore::new()).with_pagination(PaginationConfig {
    ///     default_page_size: 20,
    ///     max_page_size: 200,
    /// });
    /// assert!(!repo.session().has_pending());
    /// ```
    pub fn new(store: S) -> Self {
        Self {
            session: Session::new(store),
            pagination: PaginationConfig::default(),
        }
    }

    /// Use configured page size bounds
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        self.session.store()
    }

    /// The change-tracking session, for inspecting staged work
    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    async fn fetch<E: Entity>(
        &self,
        base: Query<E>,
        spec: Option<&Specification<E>>,
        operation: RepositoryOperation,
    ) -> Result<Vec<E>, RepositoryError> {
        let query = evaluate(base, spec);
        execute(self.session.store(), &query, operation).await
    }

    /// Every entity satisfying `spec`, shaped by its includes, order and paging
    ///
    /// Without a specification all rows are returned in primary key order.
    /// An unknown include path comes back as `Fail(InvalidQuery)`.
    pub async fn get_list<E: Entity>(
        &self,
        spec: Option<&Specification<E>>,
    ) -> RepositoryResult<Vec<E>> {
        settle(
            self.fetch(Query::new(), spec, RepositoryOperation::GetList)
                .await,
        )
    }

    /// [`Repository::get_list`] mapped through a read-only projection
    pub async fn get_list_projected<E: Entity, D: Projection<E>>(
        &self,
        spec: Option<&Specification<E>>,
    ) -> RepositoryResult<Vec<D>> {
        Ok(self
            .get_list(spec)
            .await?
            .map(|items| items.iter().map(D::project).collect()))
    }

    /// Entity by key after applying `spec`; absence is `Fail(NotFound)`
    ///
    /// The specification's paging bounds are ignored.
    pub async fn get_by_id<E: Entity>(
        &self,
        id: E::Id,
        spec: Option<&Specification<E>>,
    ) -> RepositoryResult<E> {
        let by_id = Specification::by_id(id.clone());
        let spec = match spec {
            Some(spec) => by_id.and(spec.clone().without_paging()),
            None => by_id,
        };
        let result = self
            .fetch(Query::new(), Some(&spec), RepositoryOperation::GetById)
            .await
            .and_then(|items| {
                items
                    .into_iter()
                    .next()
                    .ok_or_else(|| RepositoryError::not_found(E::NAME, id.to_string()))
            });
        settle(result)
    }

    /// [`Repository::get_by_id`] mapped through a read-only projection
    pub async fn get_by_id_projected<E: Entity, D: Projection<E>>(
        &self,
        id: E::Id,
        spec: Option<&Specification<E>>,
    ) -> RepositoryResult<D> {
        Ok(self.get_by_id(id, spec).await?.map(|entity| D::project(&entity)))
    }

    /// Whether any committed row satisfies `spec`; paging is ignored
    pub async fn exists<E: Entity>(&self, spec: &Specification<E>) -> RepositoryResult<bool> {
        let spec = spec.clone().without_paging();
        let result = self
            .fetch(Query::new(), Some(&spec), RepositoryOperation::Exists)
            .await
            .map(|items| !items.is_empty());
        settle(result)
    }

    /// Number of committed rows satisfying `spec`; paging is ignored
    pub async fn count<E: Entity>(
        &self,
        spec: Option<&Specification<E>>,
    ) -> RepositoryResult<u64> {
        let spec = spec.map(|s| s.clone().without_paging());
        let result = self
            .fetch(Query::new(), spec.as_ref(), RepositoryOperation::Count)
            .await
            .map(|items| items.len() as u64);
        settle(result)
    }

    /// Stage an insert, assigning a key when the entity has none
    pub async fn create<E: Entity>(&mut self, entity: E) -> RepositoryResult<E> {
        let result = self.stage_insert(entity).await;
        settle(result)
    }

    async fn stage_insert<E: Entity>(&mut self, mut entity: E) -> Result<E, RepositoryError> {
        self.session.assign_key(&mut entity).await?;
        let row = to_row(&entity, RepositoryOperation::Create)?;
        let key = entity.id().to_key();
        tracing::debug!(entity = E::NAME, id = %key, "Staging insert");
        self.session.stage(Change::Insert {
            table: E::TABLE,
            key,
            row,
        });
        Ok(entity)
    }

    /// Stage several inserts; stops at the first entity that cannot be staged
    pub async fn create_range<E: Entity>(
        &mut self,
        entities: Vec<E>,
    ) -> RepositoryResult<Vec<E::Id>> {
        let mut ids = Vec::with_capacity(entities.len());
        for entity in entities {
            match self.stage_insert(entity).await {
                Ok(created) => ids.push(created.id()),
                Err(error) => return settle(Err(error)),
            }
        }
        Ok(Outcome::Success(ids))
    }

    /// Stage a full-value overwrite of an existing entity
    ///
    /// Fails with `NotFound` when no row has the entity's key and with
    /// `NoOpUpdate` when nothing would change.
    pub async fn update<E: Entity>(&mut self, entity: E) -> RepositoryResult<E> {
        let result = self.stage_update(entity).await;
        settle(result)
    }

    async fn stage_update<E: Entity>(&mut self, entity: E) -> Result<E, RepositoryError> {
        let id = entity.id();
        let key = id.to_key();
        let current = self
            .session
            .lookup(E::TABLE, &key)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Update))?;
        let Some(mut current) = current else {
            return Err(RepositoryError::not_found(E::NAME, id.to_string())
                .with_operation(RepositoryOperation::Update));
        };

        let row = to_row(&entity, RepositoryOperation::Update)?;
        strip_navigation::<E>(&mut current);
        if current == row {
            tracing::debug!(entity = E::NAME, id = %key, "Update without changes rejected");
            return Err(RepositoryError::no_op_update(E::NAME, id.to_string()));
        }

        tracing::debug!(entity = E::NAME, id = %key, "Staging update");
        self.session.stage(Change::Update {
            table: E::TABLE,
            key,
            row,
        });
        Ok(entity)
    }

    /// Stage removal by key, returning the entity's prior state
    pub async fn remove_by_id<E: Entity>(&mut self, id: E::Id) -> RepositoryResult<E> {
        let result = self.stage_remove::<E>(&id).await;
        settle(result)
    }

    async fn stage_remove<E: Entity>(&mut self, id: &E::Id) -> Result<E, RepositoryError> {
        let key = id.to_key();
        let current = self
            .session
            .lookup(E::TABLE, &key)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Remove))?;
        let Some(row) = current else {
            return Err(RepositoryError::not_found(E::NAME, id.to_string())
                .with_operation(RepositoryOperation::Remove));
        };
        let entity = from_row(row, RepositoryOperation::Remove)?;

        tracing::debug!(entity = E::NAME, id = %key, "Staging removal");
        self.session.stage(Change::Delete {
            table: E::TABLE,
            key,
        });
        Ok(entity)
    }

    /// Stage removal of every id that exists; `Fail(NotFound)` when none did
    pub async fn remove_range<E: Entity>(
        &mut self,
        ids: &[E::Id],
    ) -> RepositoryResult<Vec<E::Id>> {
        let mut removed = Vec::new();
        for id in ids {
            match self.stage_remove::<E>(id).await {
                Ok(_) => removed.push(id.clone()),
                Err(error) if error.is_fault() => return settle(Err(error)),
                Err(_) => {}
            }
        }
        if removed.is_empty() {
            let listed: Vec<String> = ids.iter().map(ToString::to_string).collect();
            return Ok(Outcome::fail(
                RepositoryError::not_found(E::NAME, listed.join(","))
                    .with_operation(RepositoryOperation::Remove),
            ));
        }
        Ok(Outcome::Success(removed))
    }

    /// One page of projected results
    ///
    /// The total is counted before paging. The specification's own paging
    /// bounds are ignored. Page `0` is read as page `1` and size `0` takes
    /// the configured default; larger sizes are honoured as given, so pages
    /// `1..=total_pages` always cover the whole filtered set.
    pub async fn get_paginated<E: Entity, D: Projection<E>>(
        &self,
        page_number: u64,
        page_size: u64,
        spec: Option<&Specification<E>>,
    ) -> RepositoryResult<PaginatedResult<D>> {
        let spec = spec.map(|s| s.clone().without_paging());
        let query = evaluate(Query::new(), spec.as_ref());
        let (page_number, page_size) = self.pagination.resolve(page_number, page_size);
        settle(self.paginate(query, page_number, page_size).await)
    }

    /// Page driven by a table request: column filters, multi-column sort, paging
    ///
    /// Filters are case-insensitive "contains" matches on the field's text;
    /// blank filter values are ignored. Table sorting, when present, takes
    /// precedence over the specification's ordering. The page size is capped
    /// at the configured `max_page_size`.
    pub async fn get_table<E: Entity, D: Projection<E>>(
        &self,
        filter: &TableFilter,
        spec: Option<&Specification<E>>,
    ) -> RepositoryResult<PaginatedResult<D>> {
        let filter = filter.clone().normalized(&self.pagination);
        let query = match table_query::<E>(&filter, spec) {
            Ok(query) => query,
            Err(error) => return settle(Err(error)),
        };
        settle(
            self.paginate(query, filter.page_number, filter.page_size)
                .await,
        )
    }

    async fn paginate<E: Entity, D: Projection<E>>(
        &self,
        query: Query<E>,
        page_number: u64,
        page_size: u64,
    ) -> Result<PaginatedResult<D>, RepositoryError> {
        let items = execute(self.session.store(), &query, RepositoryOperation::Paginate).await?;
        let total_records = items.len() as u64;
        let window = Pagination::page(page_number, page_size);
        let data: Vec<D> = items
            .iter()
            .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
            .map(D::project)
            .collect();
        tracing::debug!(
            entity = E::NAME,
            page_number,
            page_size,
            total_records,
            returned = data.len(),
            "Page built"
        );
        Ok(PaginatedResult::new(
            data,
            total_records,
            page_number,
            page_size,
        ))
    }

    /// Commit every staged change atomically
    ///
    /// Constraint violations come back as `Fail` and leave the changes staged.
    pub async fn save_changes(&mut self) -> RepositoryResult<u64> {
        let pending = self.session.pending();
        match self.session.save_changes().await {
            Ok(affected) => {
                tracing::info!(pending, affected, "Changes committed");
                Ok(Outcome::Success(affected))
            }
            Err(error) => {
                let error = RepositoryError::from(error);
                if !error.is_fault() {
                    tracing::warn!(pending, kind = %error.kind, "Commit rejected: {}", error.message);
                }
                settle(Err(error))
            }
        }
    }

    /// Discard staged changes and tracked snapshots
    pub fn clear_tracked_state(&mut self) {
        if self.session.has_pending() {
            tracing::debug!(
                discarded = self.session.pending(),
                "Clearing tracked state"
            );
        }
        self.session.clear();
    }

    /// `Fail(AlreadyExists)` when any row matches `spec`
    ///
    /// `field` names the conflicting value in the message ("Nome", "Placa").
    pub async fn ensure_unique<E: Entity>(
        &self,
        spec: &Specification<E>,
        field: &str,
    ) -> RepositoryResult<()> {
        Ok(self.exists(spec).await?.and_then(|exists| {
            if exists {
                Outcome::fail(RepositoryError::already_exists(E::NAME, field))
            } else {
                Outcome::Success(())
            }
        }))
    }

    /// `Fail(ValidationFailed)` when the referenced `P` row does not exist
    pub async fn ensure_exists<P: Entity>(&self, id: P::Id) -> RepositoryResult<()> {
        let result = self
            .session
            .store()
            .fetch(P::TABLE, &id.to_key())
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::GetById));
        match result {
            Ok(Some(_)) => Ok(Outcome::Success(())),
            Ok(None) => Ok(Outcome::fail(
                RepositoryError::validation_failed(format!("{} informado(a) não existe", P::NAME))
                    .with_entity(P::NAME, id.to_string()),
            )),
            Err(error) => settle(Err(error)),
        }
    }

    /// Delete each id with its own commit, tolerating per-item failures
    ///
    /// Returns `Success` when every id went, `PartialSuccess` with
    /// "N de M registros excluídos" when some did, and `Fail` with one error
    /// per id otherwise. Refuses to run while staged changes are pending.
    /// See [`bulk::delete_each`] for the protocol.
    pub async fn delete_many<E: Entity>(&mut self, ids: &[E::Id]) -> Outcome<Vec<E::Id>> {
        bulk::delete_each::<E, S>(self, ids).await.into_outcome()
    }
}

/// Build the query for a table request
fn table_query<E: Entity>(
    filter: &TableFilter,
    spec: Option<&Specification<E>>,
) -> Result<Query<E>, RepositoryError> {
    let mut query = Query::new();
    for (column, value) in filter.active_filters() {
        let field = E::field(column).ok_or_else(|| {
            RepositoryError::invalid_query(
                RepositoryOperation::Paginate,
                format!("Coluna de filtro '{column}' não existe em {}", E::NAME),
            )
        })?;
        if field.relation.is_some() {
            return Err(RepositoryError::invalid_query(
                RepositoryOperation::Paginate,
                format!("Filtro por '{column}' não é suportado"),
            ));
        }
        let read = field.read;
        let needle = value.to_string();
        let predicate: Predicate<E> = Arc::new(move |entity: &E| read(entity).contains_ignore_case(&needle));
        query = query.filter(predicate);
    }

    let spec = spec.map(|s| s.clone().without_paging());
    query = evaluate(query, spec.as_ref());

    if !filter.sorting.is_empty() {
        query = query.order_by(OrderBy::from_columns(&filter.sorting)?);
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Field, FieldValue, Relation};
    use crate::repository::{RepositoryErrorKind, SortColumn};
    use crate::store::MemoryStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Tipo {
        id: i32,
        nome: String,
    }

    impl Entity for Tipo {
        type Id = i32;
        const TABLE: &'static str = "tipos";
        const NAME: &'static str = "Tipo";
        const UNIQUE: &'static [&'static str] = &["nome"];

        fn id(&self) -> i32 {
            self.id
        }

        fn set_id(&mut self, id: i32) {
            self.id = id;
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Licenca {
        id: i32,
        numero: String,
        tipo_id: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tipo: Option<Tipo>,
    }

    impl Entity for Licenca {
        type Id = i32;
        const TABLE: &'static str = "licencas";
        const NAME: &'static str = "Licença";
        const RELATIONS: &'static [Relation] = &[Relation::belongs_to("tipo", "tipo_id", "tipos")];
        const FIELDS: &'static [Field<Self>] = &[
            Field::scalar("numero", |l: &Self| FieldValue::from(l.numero.as_str())),
            Field::related("tipo.nome", "tipo", |l: &Self| {
                FieldValue::from(l.tipo.as_ref().map(|t| t.nome.clone()))
            }),
        ];

        fn id(&self) -> i32 {
            self.id
        }

        fn set_id(&mut self, id: i32) {
            self.id = id;
        }
    }

    #[derive(Debug, PartialEq)]
    struct LicencaResumo {
        numero: String,
        tipo: Option<String>,
    }

    impl Projection<Licenca> for LicencaResumo {
        fn project(entity: &Licenca) -> Self {
            Self {
                numero: entity.numero.clone(),
                tipo: entity.tipo.as_ref().map(|t| t.nome.clone()),
            }
        }
    }

    fn repository() -> Repository<MemoryStore> {
        Repository::new(
            MemoryStore::new()
                .with_entity::<Tipo>()
                .with_entity::<Licenca>(),
        )
    }

    fn tipo(nome: &str) -> Tipo {
        Tipo {
            id: 0,
            nome: nome.to_string(),
        }
    }

    fn licenca(numero: &str, tipo_id: i32) -> Licenca {
        Licenca {
            numero: numero.to_string(),
            tipo_id,
            ..Licenca::default()
        }
    }

    async fn seeded() -> Repository<MemoryStore> {
        let mut repo = repository();
        repo.create(tipo("Comercial")).await.unwrap();
        repo.create(tipo("Ambiental")).await.unwrap();
        repo.create(licenca("L-003", 1)).await.unwrap();
        repo.create(licenca("L-001", 2)).await.unwrap();
        repo.create(licenca("X-002", 1)).await.unwrap();
        assert_eq!(repo.save_changes().await.unwrap(), Outcome::Success(5));
        repo
    }

    #[tokio::test]
    async fn test_create_assigns_keys_and_stages_only() {
        let mut repo = repository();
        let created = repo.create(tipo("Comercial")).await.unwrap();
        assert_eq!(created.value().map(|t| t.id), Some(1));
        assert!(repo.store().is_empty("tipos"));

        repo.save_changes().await.unwrap();
        assert_eq!(repo.store().len("tipos"), 1);
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let repo = seeded().await;
        let outcome = repo.get_by_id::<Licenca>(99, None).await.unwrap();
        assert_eq!(outcome.errors()[0].kind, RepositoryErrorKind::NotFound);
        assert_eq!(outcome.messages(), vec!["Licença não encontrado".to_string()]);
    }

    #[tokio::test]
    async fn test_get_by_id_respects_spec() {
        let repo = seeded().await;
        let spec = Specification::new(|l: &Licenca| l.numero.starts_with('X'));
        assert!(repo.get_by_id::<Licenca>(1, Some(&spec)).await.unwrap().is_fail());
        assert!(repo.get_by_id::<Licenca>(3, Some(&spec)).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_get_by_id_projected_with_include() {
        let repo = seeded().await;
        let spec = Specification::all().include("tipo");
        let outcome = repo
            .get_by_id_projected::<Licenca, LicencaResumo>(2, Some(&spec))
            .await
            .unwrap();
        assert_eq!(
            outcome.into_value(),
            Some(LicencaResumo {
                numero: "L-001".to_string(),
                tipo: Some("Ambiental".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_update_unchanged_is_no_op() {
        let mut repo = seeded().await;
        let current = repo
            .get_by_id::<Licenca>(1, None)
            .await
            .unwrap()
            .into_value()
            .unwrap();

        let outcome = repo.update(current.clone()).await.unwrap();
        assert_eq!(outcome.errors()[0].kind, RepositoryErrorKind::NoOpUpdate);
        assert!(!repo.session().has_pending());

        let changed = Licenca {
            numero: "L-003A".to_string(),
            ..current
        };
        assert!(repo.update(changed).await.unwrap().is_success());
        repo.save_changes().await.unwrap();
        let reloaded = repo.get_by_id::<Licenca>(1, None).await.unwrap();
        assert_eq!(reloaded.value().map(|l| l.numero.as_str()), Some("L-003A"));
    }

    #[tokio::test]
    async fn test_update_with_loaded_navigation_is_still_no_op() {
        let mut repo = seeded().await;
        let spec = Specification::all().include("tipo");
        let current = repo
            .get_by_id::<Licenca>(1, Some(&spec))
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert!(current.tipo.is_some());
        let outcome = repo.update(current).await.unwrap();
        assert_eq!(outcome.errors()[0].kind, RepositoryErrorKind::NoOpUpdate);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let mut repo = seeded().await;
        let ghost = Licenca {
            id: 50,
            ..licenca("L-999", 1)
        };
        let outcome = repo.update(ghost).await.unwrap();
        assert_eq!(outcome.errors()[0].kind, RepositoryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_remove_by_id_returns_prior_state() {
        let mut repo = seeded().await;
        let outcome = repo.remove_by_id::<Licenca>(2).await.unwrap();
        assert_eq!(outcome.value().map(|l| l.numero.as_str()), Some("L-001"));

        let again = repo.remove_by_id::<Licenca>(2).await.unwrap();
        assert!(again.is_fail());

        repo.save_changes().await.unwrap();
        assert_eq!(repo.count::<Licenca>(None).await.unwrap(), Outcome::Success(2));
    }

    #[tokio::test]
    async fn test_remove_range_skips_missing() {
        let mut repo = seeded().await;
        let outcome = repo.remove_range::<Licenca>(&[1, 42, 3]).await.unwrap();
        assert_eq!(outcome, Outcome::Success(vec![1, 3]));

        let none = repo.remove_range::<Licenca>(&[42, 43]).await.unwrap();
        assert_eq!(none.errors()[0].kind, RepositoryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_save_changes_referential_integrity() {
        let mut repo = seeded().await;
        repo.remove_by_id::<Tipo>(1).await.unwrap();
        let outcome = repo.save_changes().await.unwrap();
        assert_eq!(
            outcome.errors()[0].kind,
            RepositoryErrorKind::ReferentialIntegrity
        );
        assert_eq!(repo.session().pending(), 1);

        repo.clear_tracked_state();
        assert!(!repo.session().has_pending());
        assert_eq!(repo.count::<Tipo>(None).await.unwrap(), Outcome::Success(2));
    }

    #[tokio::test]
    async fn test_ensure_unique_and_exists() {
        let repo = seeded().await;
        let same_name = Specification::new(|t: &Tipo| t.nome.eq_ignore_ascii_case("comercial"));
        let outcome = repo.ensure_unique(&same_name, "Nome").await.unwrap();
        assert_eq!(outcome.errors()[0].kind, RepositoryErrorKind::AlreadyExists);

        let other = Specification::new(|t: &Tipo| t.nome == "Sanitária");
        assert!(repo.ensure_unique(&other, "Nome").await.unwrap().is_success());

        assert!(repo.ensure_exists::<Tipo>(2).await.unwrap().is_success());
        let missing = repo.ensure_exists::<Tipo>(9).await.unwrap();
        assert_eq!(missing.errors()[0].kind, RepositoryErrorKind::ValidationFailed);
        assert_eq!(missing.messages(), vec!["Tipo informado(a) não existe".to_string()]);
    }

    #[tokio::test]
    async fn test_get_table_filters_and_sorts() {
        let repo = seeded().await;
        let filter = TableFilter::new(1, 10)
            .with_filter("numero", "l-")
            .with_sort(SortColumn::asc("tipo.nome"));
        let page = repo
            .get_table::<Licenca, LicencaResumo>(&filter, None)
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(page.total_records, 2);
        let numeros: Vec<&str> = page.data.iter().map(|d| d.numero.as_str()).collect();
        assert_eq!(numeros, vec!["L-001", "L-003"]);
    }

    #[tokio::test]
    async fn test_get_table_rejects_unknown_and_related_filters() {
        let repo = seeded().await;
        let unknown = TableFilter::new(1, 10).with_filter("cor", "azul");
        let outcome = repo
            .get_table::<Licenca, LicencaResumo>(&unknown, None)
            .await
            .unwrap();
        assert_eq!(outcome.errors()[0].kind, RepositoryErrorKind::InvalidQuery);

        let related = TableFilter::new(1, 10).with_filter("tipo.nome", "com");
        let outcome = repo
            .get_table::<Licenca, LicencaResumo>(&related, None)
            .await
            .unwrap();
        assert_eq!(outcome.errors()[0].kind, RepositoryErrorKind::InvalidQuery);
    }

    #[tokio::test]
    async fn test_offline_store_is_a_fault() {
        let repo = seeded().await;
        repo.store().set_online(false);
        let error = repo.get_list::<Licenca>(None).await.unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::ConnectionFailed);
        assert!(Outcome::from_result(Err::<Outcome<Vec<Licenca>>, _>(error)).is_fail());
    }
}
