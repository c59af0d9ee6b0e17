//! The unified request shape every dialect parser produces, regardless of
//! which query-string convention the caller used.

use serde_json::Value;
use std::collections::HashMap;

use crate::format::ResponseDialect;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page/offset pagination, always expressed 1-based internally — dialect
/// parsers normalize AG-Grid's 0-based row range and MUI's 0-based page
/// index up into this single representation. `page < 1` is clamped to `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// A filter value: either a single scalar, a list (for `In`/`Between`
/// style operators), or explicitly absent (for `IsNull`/`IsNotNull`).
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Value),
    List(Vec<Value>),
    None,
}

#[derive(Debug, Clone)]
pub struct FilterEntry {
    pub field: String,
    pub op: crate::metadata::FilterOp,
    pub value: FilterValue,
}

#[derive(Debug, Clone)]
pub struct SearchSpec {
    pub term: String,
    /// Explicit field list, or `None` to fall back to the model's default
    /// searchable fields.
    pub fields: Option<Vec<String>>,
}

/// Metadata about how the request was parsed, useful for diagnostics and
/// for the response formatter (e.g. deciding whether a `cache_key` is
/// needed for the SWR dialect).
#[derive(Debug, Clone)]
pub struct ParsedMeta {
    pub dialect: &'static str,
    /// Keys present in the raw query string that were not recognized by
    /// any known parameter and were treated as ad-hoc equality filters.
    pub inferred_filter_keys: Vec<String>,
    /// The dialect the response should be rendered in. Resolved by
    /// `parsers::parse_request` from the `responseFormat`/`format` query
    /// keys, falling back to a mapping from the inbound request dialect
    /// when neither is present.
    pub response_dialect: ResponseDialect,
}

/// The unified shape all four dialect parsers converge on.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub pagination: Pagination,
    pub sort: Vec<SortSpec>,
    pub filters: Vec<FilterEntry>,
    pub search: Option<SearchSpec>,
    pub meta: ParsedMeta,
}

impl ParsedRequest {
    #[must_use]
    pub fn empty(dialect: &'static str) -> Self {
        Self {
            pagination: Pagination::default(),
            sort: Vec::new(),
            filters: Vec::new(),
            search: None,
            meta: ParsedMeta {
                dialect,
                inferred_filter_keys: Vec::new(),
                response_dialect: ResponseDialect::Standard,
            },
        }
    }
}

/// A raw query string decomposed into a multi-map, the form every parser
/// consumes before applying its own dialect conventions.
pub type RawQuery = HashMap<String, Vec<String>>;
