//! Pagination and table-filter types
//!
//! [`TableFilter`] is the request shape a listing screen sends (page, page
//! size, per-column text filters and a multi-column sort); [`PaginatedResult`]
//! is what it gets back. Both serialize in camelCase.
//!
//! # Example
//!
//! ```rust
//! use cadastro::repository::{Pagination, SortColumn, TableFilter};
//!
//! let filter = TableFilter::new(2, 10)
//!     .with_filter("nome", "scania")
//!     .with_sort(SortColumn::desc("ano"));
//!
//! assert_eq!(filter.pagination(), Pagination::new(10, 10));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;

/// Offset/limit window over an ordered result set
///
/// ```rust
/// use cadastro::repository::Pagination;
///
/// let page3 = Pagination::page(3, 20);
/// assert_eq!(page3.offset, 40);
/// assert_eq!(page3.limit, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Window for a 1-indexed page number
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        let offset = page_number.saturating_sub(1).saturating_mul(page_size);
        Self {
            offset,
            limit: page_size,
        }
    }
}

/// One sort column of a table request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortColumn {
    /// Field path, possibly dotted (`"marca.nome"`)
    pub column: String,
    #[serde(default)]
    pub descending: bool,
}

impl SortColumn {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// Paging, filtering and sorting request for a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFilter {
    /// 1-indexed page number
    #[serde(default = "default_page_number")]
    pub page_number: u64,
    #[serde(default)]
    pub page_size: u64,
    /// Column path to search text; order is irrelevant
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    /// Ordered sort columns, first is primary
    #[serde(default)]
    pub sorting: Vec<SortColumn>,
}

fn default_page_number() -> u64 {
    1
}

impl Default for TableFilter {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: 0,
            filters: BTreeMap::new(),
            sorting: Vec::new(),
        }
    }
}

impl TableFilter {
    pub fn new(page_number: u64, page_size: u64) -> Self {
        Self {
            page_number,
            page_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(column.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_sort(mut self, column: SortColumn) -> Self {
        self.sorting.push(column);
        self
    }

    /// Filters with a non-blank value; blank values mean "no filter"
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .map(|(column, value)| (column.as_str(), value.trim()))
            .filter(|(_, value)| !value.is_empty())
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::page(self.page_number, self.page_size)
    }

    /// Clamp page number and size into the configured bounds
    ///
    /// Page numbers below 1 become 1; a zero size takes the default size and
    /// sizes above the maximum are capped.
    #[must_use]
    pub fn normalized(mut self, config: &PaginationConfig) -> Self {
        let (page_number, page_size) = config.normalize(self.page_number, self.page_size);
        self.page_number = page_number;
        self.page_size = page_size;
        self
    }
}

/// One page of projected results
///
/// `total_records` counts every row matching the filters, before paging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<D> {
    pub data: Vec<D>,
    pub total_records: u64,
    pub page_number: u64,
    pub page_size: u64,
}

impl<D> PaginatedResult<D> {
    pub fn new(data: Vec<D>, total_records: u64, page_number: u64, page_size: u64) -> Self {
        Self {
            data,
            total_records,
            page_number,
            page_size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total_records.div_ceil(self.page_size)
        }
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page_number > 1
    }
}
