//! Entity capability traits and static metadata
//!
//! An entity is any serde-serializable record with a primary key. Besides the
//! key it declares, as `const` tables:
//!
//! - its belongs-to [`Relation`]s (used for eager loading and as foreign keys),
//! - its [`Field`]s (used for dynamic ordering and column filters),
//! - its unique columns.
//!
//! Navigation properties must be `#[serde(default)]` options named after the
//! relation; they are filled by eager loading and stripped before a row is
//! written back.
//!
//! # Example
//!
//! ```rust
//! use cadastro::entity::{Entity, Field, FieldValue, Relation};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
//! struct Marca {
//!     id: i32,
//!     nome: String,
//! }
//!
//! impl Entity for Marca {
//!     type Id = i32;
//!     const TABLE: &'static str = "marcas";
//!     const NAME: &'static str = "Marca";
//!     const UNIQUE: &'static [&'static str] = &["nome"];
//!     const FIELDS: &'static [Field<Self>] = &[
//!         Field::scalar("id", |m: &Self| FieldValue::from(m.id)),
//!         Field::scalar("nome", |m: &Self| FieldValue::from(m.nome.as_str())),
//!     ];
//!
//!     fn id(&self) -> i32 { self.id }
//!     fn set_id(&mut self, id: i32) { self.id = id; }
//! }
//!
//! assert_eq!(Marca::field("nome").map(|f| f.path), Some("nome"));
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::store::Key;

/// Primary key types an entity may use
pub trait EntityKey:
    Clone + fmt::Debug + fmt::Display + PartialEq + Send + Sync + 'static
{
    /// Whether new keys come from the table's integer sequence
    const SEQUENTIAL: bool;

    /// Normalised form used by the store
    fn to_key(&self) -> Key;

    /// Whether this value still needs a generated key (`0`, nil UUID)
    fn is_unassigned(&self) -> bool;

    /// Produce a fresh key; sequential keys receive the reserved sequence value
    fn allocate(sequence: Option<i64>) -> Option<Self>;
}

impl EntityKey for i32 {
    const SEQUENTIAL: bool = true;

    fn to_key(&self) -> Key {
        Key::Int(i64::from(*self))
    }

    fn is_unassigned(&self) -> bool {
        *self == 0
    }

    fn allocate(sequence: Option<i64>) -> Option<Self> {
        sequence.and_then(|value| i32::try_from(value).ok())
    }
}

impl EntityKey for i64 {
    const SEQUENTIAL: bool = true;

    fn to_key(&self) -> Key {
        Key::Int(*self)
    }

    fn is_unassigned(&self) -> bool {
        *self == 0
    }

    fn allocate(sequence: Option<i64>) -> Option<Self> {
        sequence
    }
}

impl EntityKey for Uuid {
    const SEQUENTIAL: bool = false;

    fn to_key(&self) -> Key {
        Key::Text(self.to_string())
    }

    fn is_unassigned(&self) -> bool {
        self.is_nil()
    }

    fn allocate(_: Option<i64>) -> Option<Self> {
        Some(Uuid::now_v7())
    }
}

/// Belongs-to relation: `foreign_key` on this entity points at `table`'s primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    /// Navigation property name, also the include path segment
    pub name: &'static str,
    pub foreign_key: &'static str,
    pub table: &'static str,
    pub table_key: &'static str,
    /// Relations of the related entity, for dotted include paths
    pub nested: &'static [Relation],
}

impl Relation {
    pub const fn belongs_to(
        name: &'static str,
        foreign_key: &'static str,
        table: &'static str,
    ) -> Self {
        Self {
            name,
            foreign_key,
            table,
            table_key: "id",
            nested: &[],
        }
    }

    #[must_use]
    pub const fn with_nested(mut self, nested: &'static [Relation]) -> Self {
        self.nested = nested;
        self
    }

    #[must_use]
    pub const fn with_table_key(mut self, table_key: &'static str) -> Self {
        self.table_key = table_key;
        self
    }
}

/// Comparable value read from an entity field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl FieldValue {
    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Int(_) | FieldValue::Float(_) => 2,
            FieldValue::Text(_) => 3,
            FieldValue::Date(_) => 4,
            FieldValue::Timestamp(_) => 5,
            FieldValue::Uuid(_) => 6,
        }
    }

    /// Total order: nulls first, numbers compared across int/float
    pub fn compare(&self, other: &Self) -> Ordering {
        use FieldValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Int(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Int(b)) => a.total_cmp(&(*b as f64)),
            (Text(a), Text(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (Uuid(a), Uuid(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Case-insensitive substring match on the textual form; null never matches
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        match self {
            FieldValue::Null => false,
            other => other
                .to_string()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(v) => write!(f, "{v}"),
            FieldValue::Date(v) => write!(f, "{}", v.format("%d/%m/%Y")),
            FieldValue::Timestamp(v) => write!(f, "{}", v.format("%d/%m/%Y %H:%M:%S")),
            FieldValue::Uuid(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Addressable field of an entity
///
/// `relation` names the include path the reader depends on; `None` for
/// scalar columns of the entity itself.
pub struct Field<E> {
    pub path: &'static str,
    pub relation: Option<&'static str>,
    pub read: fn(&E) -> FieldValue,
}

impl<E> Field<E> {
    pub const fn scalar(path: &'static str, read: fn(&E) -> FieldValue) -> Self {
        Self {
            path,
            relation: None,
            read,
        }
    }

    pub const fn related(
        path: &'static str,
        relation: &'static str,
        read: fn(&E) -> FieldValue,
    ) -> Self {
        Self {
            path,
            relation: Some(relation),
            read,
        }
    }
}

impl<E> Clone for Field<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Field<E> {}

impl<E> fmt::Debug for Field<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("path", &self.path)
            .field("relation", &self.relation)
            .finish()
    }
}

/// A persisted record type
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Id: EntityKey;

    /// Backing table name
    const TABLE: &'static str;

    /// Human name used in user-facing messages ("Tarifa", "Veículo")
    const NAME: &'static str;

    /// Column holding the primary key
    const PRIMARY_KEY: &'static str = "id";

    const UNIQUE: &'static [&'static str] = &[];

    const RELATIONS: &'static [Relation] = &[];

    const FIELDS: &'static [Field<Self>] = &[];

    fn id(&self) -> Self::Id;

    fn set_id(&mut self, id: Self::Id);

    /// Look up a field by its (possibly dotted) path
    fn field(path: &str) -> Option<&'static Field<Self>> {
        Self::FIELDS.iter().find(|field| field.path == path)
    }

    /// Look up a top-level relation by name
    fn relation(name: &str) -> Option<&'static Relation> {
        Self::RELATIONS.iter().find(|relation| relation.name == name)
    }
}

/// Read-only view derived from an entity; never written back
pub trait Projection<E: Entity>: Send {
    fn project(entity: &E) -> Self;
}
