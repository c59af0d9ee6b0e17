//! AG-Grid server-side row model: `startRow`/`endRow` row range, a JSON
//! `sortModel` array, and a JSON `filterModel` object keyed by field name.

use super::{first, RequestParser};
use crate::error::PipelineError;
use crate::metadata::FilterOp;
use crate::request::{
    FilterEntry, FilterValue, ParsedMeta, ParsedRequest, Pagination, RawQuery, SortDirection,
    SortSpec,
};
use serde::Deserialize;

pub struct AgGridParser;

#[derive(Deserialize)]
struct SortModelEntry {
    #[serde(rename = "colId")]
    col_id: String,
    sort: String,
}

#[derive(Deserialize)]
#[serde(tag = "filterType", rename_all = "lowercase")]
enum FilterModelEntry {
    Text { r#type: String, filter: serde_json::Value },
    Number { r#type: String, filter: serde_json::Value },
    Set { values: Vec<serde_json::Value> },
}

impl RequestParser for AgGridParser {
    fn dialect(&self) -> &'static str {
        "ag-grid"
    }

    fn detect(&self, query: &RawQuery) -> bool {
        query.contains_key("startRow") || query.contains_key("endRow")
    }

    fn parse(&self, query: &RawQuery) -> Result<ParsedRequest, PipelineError> {
        let start_row: u64 = first(query, "startRow")
            .unwrap_or("0")
            .parse()
            .map_err(|_| PipelineError::MalformedQuery("startRow must be an integer".to_owned()))?;
        let end_row: u64 = first(query, "endRow")
            .unwrap_or(&(start_row + u64::from(crate::request::DEFAULT_PAGE_SIZE)).to_string())
            .parse()
            .map_err(|_| PipelineError::MalformedQuery("endRow must be an integer".to_owned()))?;

        let page_size = end_row.saturating_sub(start_row).max(1);
        let page = start_row / page_size + 1;
        let pagination = Pagination::new(
            u32::try_from(page).unwrap_or(u32::MAX),
            u32::try_from(page_size).unwrap_or(crate::request::MAX_PAGE_SIZE),
        );

        let sort = match first(query, "sortModel") {
            Some(raw) => parse_sort_model(raw)?,
            None => Vec::new(),
        };

        let filters = match first(query, "filterModel") {
            Some(raw) => parse_filter_model(raw)?,
            None => Vec::new(),
        };

        Ok(ParsedRequest {
            pagination,
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
    let entries: Vec<SortModelEntry> = serde_json::from_str(raw)
        .map_err(|e| PipelineError::MalformedQuery(format!("invalid sortModel: {e}")))?;

    entries
        .into_iter()
        .map(|entry| {
            let direction = match entry.sort.as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => {
                    return Err(PipelineError::MalformedQuery(format!(
                        "unknown sort direction: {other}"
                    )))
                }
            };
            Ok(SortSpec {
                field: super::sanitize::sanitize_field_name(&entry.col_id),
                direction,
            })
        })
        .collect()
}

fn parse_filter_model(raw: &str) -> Result<Vec<FilterEntry>, PipelineError> {
    let map: std::collections::HashMap<String, FilterModelEntry> = serde_json::from_str(raw)
        .map_err(|e| PipelineError::MalformedQuery(format!("invalid filterModel: {e}")))?;

    map.into_iter()
        .map(|(field, entry)| {
            let field = super::sanitize::sanitize_field_name(&field);
            let (op, value) = match entry {
                FilterModelEntry::Text { r#type, filter } => {
                    (text_op(&r#type)?, FilterValue::Scalar(filter))
                }
                FilterModelEntry::Number { r#type, filter } => {
                    (number_op(&r#type)?, FilterValue::Scalar(filter))
                }
                FilterModelEntry::Set { values } => (FilterOp::In, FilterValue::List(values)),
            };
            Ok(FilterEntry { field, op, value })
        })
        .collect()
}

fn text_op(op_type: &str) -> Result<FilterOp, PipelineError> {
    match op_type {
        "equals" => Ok(FilterOp::Equals),
        "notEqual" => Ok(FilterOp::NotEquals),
        "contains" => Ok(FilterOp::Contains),
        "startsWith" => Ok(FilterOp::StartsWith),
        "endsWith" => Ok(FilterOp::EndsWith),
        other => Err(PipelineError::MalformedQuery(format!(
            "unknown text filter type: {other}"
        ))),
    }
}

fn number_op(op_type: &str) -> Result<FilterOp, PipelineError> {
    match op_type {
        "equals" => Ok(FilterOp::Equals),
        "notEqual" => Ok(FilterOp::NotEquals),
        "greaterThan" => Ok(FilterOp::GreaterThan),
        "greaterThanOrEqual" => Ok(FilterOp::GreaterThanOrEqual),
        "lessThan" => Ok(FilterOp::LessThan),
        "lessThanOrEqual" => Ok(FilterOp::LessThanOrEqual),
        other => Err(PipelineError::MalformedQuery(format!(
            "unknown number filter type: {other}"
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
    fn converts_start_end_row_into_pagination() {
        let query = query_with(&[("startRow", "20"), ("endRow", "40")]);
        let parsed = AgGridParser.parse(&query).unwrap();
        assert_eq!(parsed.pagination.page, 2);
        assert_eq!(parsed.pagination.page_size, 20);
    }

    #[test]
    fn first_row_range_is_page_one() {
        let query = query_with(&[("startRow", "0"), ("endRow", "20")]);
        let parsed = AgGridParser.parse(&query).unwrap();
        assert_eq!(parsed.pagination.page, 1);
    }

    #[test]
    fn parses_sort_model_json() {
        let query = query_with(&[
            ("startRow", "0"),
            ("endRow", "20"),
            ("sortModel", r#"[{"colId":"name","sort":"asc"}]"#),
        ]);
        let parsed = AgGridParser.parse(&query).unwrap();
        assert_eq!(parsed.sort.len(), 1);
        assert_eq!(parsed.sort[0].field, "name");
        assert_eq!(parsed.sort[0].direction, SortDirection::Asc);
    }

    #[test]
    fn rejects_malformed_sort_model() {
        let query = query_with(&[("sortModel", "not json")]);
        assert!(AgGridParser.parse(&query).is_err());
    }

    #[test]
    fn parses_set_filter_as_in() {
        let query = query_with(&[(
            "filterModel",
            r#"{"status":{"filterType":"set","values":["active","pending"]}}"#,
        )]);
        let parsed = AgGridParser.parse(&query).unwrap();
        assert_eq!(parsed.filters.len(), 1);
        assert_eq!(parsed.filters[0].field, "status");
        assert_eq!(parsed.filters[0].op, FilterOp::In);
    }
}
