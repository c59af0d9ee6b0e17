//! MUI X DataGrid server-side convention: 0-based `page`/`pageSize`, a JSON
//! `sortModel` array of `{field, sort}`, and a JSON `filterModel` object
//! of `{items: [{field, operator, value}], logicOperator}`.

use super::{first, RequestParser};
use crate::error::PipelineError;
use crate::metadata::FilterOp;
use crate::request::{
    FilterEntry, FilterValue, ParsedMeta, ParsedRequest, Pagination, RawQuery, SortDirection,
    SortSpec,
};
use serde::Deserialize;

pub struct MuiDataGridParser;

#[derive(Deserialize)]
struct SortItem {
    field: String,
    sort: String,
}

#[derive(Deserialize)]
struct FilterModel {
    items: Vec<FilterItem>,
}

#[derive(Deserialize)]
struct FilterItem {
    field: String,
    operator: String,
    #[serde(default)]
    value: serde_json::Value,
}

impl RequestParser for MuiDataGridParser {
    fn dialect(&self) -> &'static str {
        "mui-datagrid"
    }

    fn detect(&self, query: &RawQuery) -> bool {
        query.contains_key("sortModel") && query.contains_key("page")
            || query.contains_key("filterModel") && query.contains_key("page")
    }

    fn parse(&self, query: &RawQuery) -> Result<ParsedRequest, PipelineError> {
        let page_raw: u32 = first(query, "page")
            .unwrap_or("0")
            .parse()
            .map_err(|_| PipelineError::MalformedQuery("page must be an integer".to_owned()))?;
        // MUI's page index is 0-based; convert to the pipeline's 1-based page.
        let page = page_raw + 1;
        let page_size: u32 = first(query, "pageSize")
            .unwrap_or(&crate::request::DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .map_err(|_| PipelineError::MalformedQuery("pageSize must be an integer".to_owned()))?;

        let sort = match first(query, "sortModel") {
            Some(raw) => parse_sort_model(raw)?,
            None => Vec::new(),
        };

        let filters = match first(query, "filterModel") {
            Some(raw) => parse_filter_model(raw)?,
            None => Vec::new(),
        };

        Ok(ParsedRequest {
            pagination: Pagination::new(page, page_size),
            sort,
            filters,
            search: None,
            meta: ParsedMeta {
                dialect: self.dialect(),
                inferred_filter_keys: Vec::new(),
                response_dialect: crate::format::ResponseDialect::Standard,
            },
        })
    }
}

fn parse_sort_model(raw: &str) -> Result<Vec<SortSpec>, PipelineError> {
    let items: Vec<SortItem> = serde_json::from_str(raw)
        .map_err(|e| PipelineError::MalformedQuery(format!("invalid sortModel: {e}")))?;

    items
        .into_iter()
        .map(|item| {
            let direction = match item.sort.as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => {
                    return Err(PipelineError::MalformedQuery(format!(
                        "unknown sort direction: {other}"
                    )))
                }
            };
            Ok(SortSpec {
                field: super::sanitize::sanitize_field_name(&item.field),
                direction,
            })
        })
        .collect()
}

fn parse_filter_model(raw: &str) -> Result<Vec<FilterEntry>, PipelineError> {
    let model: FilterModel = serde_json::from_str(raw)
        .map_err(|e| PipelineError::MalformedQuery(format!("invalid filterModel: {e}")))?;

    model
        .items
        .into_iter()
        .map(|item| {
            let op = operator(&item.operator)?;
            let value = if matches!(op, FilterOp::IsNull | FilterOp::IsNotNull) {
                FilterValue::None
            } else {
                FilterValue::Scalar(item.value)
            };
            Ok(FilterEntry {
                field: super::sanitize::sanitize_field_name(&item.field),
                op,
                value,
            })
        })
        .collect()
}

fn operator(op: &str) -> Result<FilterOp, PipelineError> {
    match op {
        "equals" | "is" => Ok(FilterOp::Equals),
        "not" => Ok(FilterOp::NotEquals),
        "contains" => Ok(FilterOp::Contains),
        "startsWith" => Ok(FilterOp::StartsWith),
        "endsWith" => Ok(FilterOp::EndsWith),
        ">" => Ok(FilterOp::GreaterThan),
        ">=" => Ok(FilterOp::GreaterThanOrEqual),
        "<" => Ok(FilterOp::LessThan),
        "<=" => Ok(FilterOp::LessThanOrEqual),
        "isEmpty" => Ok(FilterOp::IsNull),
        "isNotEmpty" => Ok(FilterOp::IsNotNull),
        "isAnyOf" => Ok(FilterOp::In),
        other => Err(PipelineError::MalformedQuery(format!(
            "unknown MUI operator: {other}"
        ))),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn query_with(pairs: &[(&str, &str)]) -> RawQuery {
        let mut query: RawQuery = HashMap::new();
        for (k, v) in pairs {
            query.insert((*k).to_owned(), vec![(*v).to_owned()]);
        }
        query
    }

    #[test]
    fn zero_based_page_becomes_page_one() {
        let query = query_with(&[("page", "0"), ("pageSize", "25")]);
        let parsed = MuiDataGridParser.parse(&query).unwrap();
        assert_eq!(parsed.pagination.page, 1);
        assert_eq!(parsed.pagination.page_size, 25);
    }

    #[test]
    fn raw_page_one_becomes_unified_page_two() {
        let query = query_with(&[("page", "1"), ("pageSize", "25")]);
        let parsed = MuiDataGridParser.parse(&query).unwrap();
        assert_eq!(parsed.pagination.page, 2);
    }

    #[test]
    fn detects_only_with_page_and_sort_or_filter_model() {
        let query = query_with(&[("page", "0")]);
        assert!(!MuiDataGridParser.detect(&query));
    }

    #[test]
    fn parses_is_any_of_as_in() {
        let query = query_with(&[
            ("page", "0"),
            (
                "filterModel",
                r#"{"items":[{"field":"status","operator":"isAnyOf","value":["a","b"]}]}"#,
            ),
        ]);
        let parsed = MuiDataGridParser.parse(&query).unwrap();
        assert_eq!(parsed.filters[0].op, FilterOp::In);
    }
}
