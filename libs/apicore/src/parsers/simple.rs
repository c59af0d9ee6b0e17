//! The simple dialect: plain `page`/`pageSize` (or `per_page`)/`sort` (or
//! `sortBy`+`sortOrder`)/`q` (or `search`) keys, with every remaining query
//! key treated as an ad-hoc equality filter. This is the fallback dialect
//! — it always detects, so it must stay last in dispatch priority.

use super::{first, RequestParser};
use crate::error::PipelineError;
use crate::request::{
    FilterEntry, FilterValue, ParsedMeta, ParsedRequest, Pagination, RawQuery, SearchSpec,
    SortDirection, SortSpec,
};

pub struct SimpleParser;

/// Keys that have dedicated meaning and are never folded into an ad-hoc
/// equality filter.
const RESERVED_KEYS: &[&str] = &[
    "page",
    "pageSize",
    "per_page",
    "sort",
    "sortBy",
    "sortOrder",
    "q",
    "search",
    "searchFields",
    "search_fields",
    "responseFormat",
    "format",
    "include_total",
    "include_available_filters",
];

impl RequestParser for SimpleParser {
    fn dialect(&self) -> &'static str {
        "simple"
    }

    fn detect(&self, _query: &RawQuery) -> bool {
        true
    }

    fn parse(&self, query: &RawQuery) -> Result<ParsedRequest, PipelineError> {
        let page: u32 = first(query, "page")
            .unwrap_or("0")
            .parse()
            .map_err(|_| PipelineError::MalformedQuery("page must be an integer".to_owned()))?;
        let page_size: u32 = first(query, "pageSize")
            .or_else(|| first(query, "per_page"))
            .unwrap_or(&crate::request::DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .map_err(|_| PipelineError::MalformedQuery("pageSize must be an integer".to_owned()))?;

        let sort = parse_sort(query)?;

        let search = first(query, "q").or_else(|| first(query, "search")).map(|term| SearchSpec {
            term: term.to_owned(),
            fields: first(query, "searchFields")
                .or_else(|| first(query, "search_fields"))
                .map(split_trimmed),
        });

        let mut inferred_filter_keys = Vec::new();
        let mut filters = Vec::new();
        for (key, values) in query {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let field = super::sanitize::sanitize_field_name(key);
            if super::sanitize::is_always_blocked(&field) {
                continue;
            }
            inferred_filter_keys.push(field.clone());
            filters.push(FilterEntry {
                field,
                op: crate::metadata::FilterOp::Equals,
                value: FilterValue::Scalar(serde_json::Value::String(
                    values.first().cloned().unwrap_or_default(),
                )),
            });
        }

        Ok(ParsedRequest {
            pagination: Pagination::new(page, page_size),
            sort,
            filters,
            search,
            meta: ParsedMeta {
                dialect: self.dialect(),
                inferred_filter_keys,
                response_dialect: crate::format::ResponseDialect::Standard,
            },
        })
    }
}

/// Splits a comma-separated list, trimming whitespace and dropping empty
/// entries.
fn split_trimmed(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// `sortBy`+`sortOrder` takes precedence when present; otherwise falls
/// back to the comma-separated `sort` field (a leading `-` means
/// descending).
fn parse_sort(query: &RawQuery) -> Result<Vec<SortSpec>, PipelineError> {
    if let Some(field) = first(query, "sortBy") {
        let direction = match first(query, "sortOrder").unwrap_or("asc") {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => {
                return Err(PipelineError::MalformedQuery(format!(
                    "unknown sort direction: {other}"
                )))
            }
        };
        return Ok(vec![SortSpec {
            field: super::sanitize::sanitize_field_name(field),
            direction,
        }]);
    }

    Ok(match first(query, "sort") {
        Some(raw) if !raw.is_empty() => vec![parse_single_sort(raw)],
        _ => Vec::new(),
    })
}

/// `sort=-createdAt` means descending; a bare field name means ascending.
fn parse_single_sort(raw: &str) -> SortSpec {
    if let Some(field) = raw.strip_prefix('-') {
        SortSpec {
            field: super::sanitize::sanitize_field_name(field),
            direction: SortDirection::Desc,
        }
    } else {
        SortSpec {
            field: super::sanitize::sanitize_field_name(raw),
            direction: SortDirection::Asc,
        }
    }
}
