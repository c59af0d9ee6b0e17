//! The structured dialect: `filter[field][op]=value` query keys, a
//! `sort=field:asc,other:desc` comma list, and plain `page`/`pageSize`.

use super::{first, RequestParser};
use crate::error::PipelineError;
use crate::metadata::FilterOp;
use crate::request::{
    FilterEntry, FilterValue, ParsedMeta, ParsedRequest, Pagination, RawQuery, SearchSpec,
    SortDirection, SortSpec,
};

pub struct StructuredParser;

impl RequestParser for StructuredParser {
    fn dialect(&self) -> &'static str {
        "structured"
    }

    fn detect(&self, query: &RawQuery) -> bool {
        query.keys().any(|k| k.starts_with("filter["))
    }

    fn parse(&self, query: &RawQuery) -> Result<ParsedRequest, PipelineError> {
        let page: u32 = first(query, "page")
            .unwrap_or("0")
            .parse()
            .map_err(|_| PipelineError::MalformedQuery("page must be an integer".to_owned()))?;
        let page_size: u32 = first(query, "pageSize")
            .unwrap_or(&crate::request::DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .map_err(|_| PipelineError::MalformedQuery("pageSize must be an integer".to_owned()))?;

        let sort = match first(query, "sort") {
            Some(raw) => parse_sort(raw)?,
            None => Vec::new(),
        };

        let filters = parse_filters(query)?;

        let search = first(query, "q").map(|term| SearchSpec {
            term: term.to_owned(),
            fields: first(query, "searchFields").map(|f| {
                f.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            }),
        });

        Ok(ParsedRequest {
            pagination: Pagination::new(page, page_size),
            sort,
            filters,
            search,
            meta: ParsedMeta {
                dialect: self.dialect(),
                inferred_filter_keys: Vec::new(),
                response_dialect: crate::format::ResponseDialect::Standard,
            },
        })
    }
}

fn parse_sort(raw: &str) -> Result<Vec<SortSpec>, PipelineError> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (field, direction) = entry
                .split_once(':')
                .unwrap_or((entry, "asc"));
            let direction = match direction {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => {
                    return Err(PipelineError::MalformedQuery(format!(
                        "unknown sort direction: {other}"
                    )))
                }
            };
            Ok(SortSpec {
                field: super::sanitize::sanitize_field_name(field),
                direction,
            })
        })
        .collect()
}

/// Parses `filter[field][op]=value` keys into filter entries. Keys that
/// don't match this exact shape are left for the caller to treat however
/// it likes (the structured dialect ignores them rather than erroring,
/// since unrelated query keys like `page` coexist on the same string).
fn parse_filters(query: &RawQuery) -> Result<Vec<FilterEntry>, PipelineError> {
    let mut filters = Vec::new();

    for (key, values) in query {
        let Some(rest) = key.strip_prefix("filter[") else {
            continue;
        };
        let Some((field, rest)) = rest.split_once(']') else {
            continue;
        };
        let Some(op_raw) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) else {
            continue;
        };

        let op = parse_op(op_raw)?;
        let field = super::sanitize::sanitize_field_name(field);
        let value = if matches!(op, FilterOp::IsNull | FilterOp::IsNotNull) {
            FilterValue::None
        } else if matches!(op, FilterOp::In | FilterOp::Between) {
            let items = values
                .iter()
                .flat_map(|v| v.split(','))
                .map(|v| serde_json::Value::String(v.to_owned()))
                .collect();
            FilterValue::List(items)
        } else {
            FilterValue::Scalar(serde_json::Value::String(
                values.first().cloned().unwrap_or_default(),
            ))
        };

        filters.push(FilterEntry { field, op, value });
    }

    Ok(filters)
}

fn parse_op(raw: &str) -> Result<FilterOp, PipelineError> {
    match raw {
        "eq" => Ok(FilterOp::Equals),
        "ne" => Ok(FilterOp::NotEquals),
        "gt" => Ok(FilterOp::GreaterThan),
        "gte" => Ok(FilterOp::GreaterThanOrEqual),
        "lt" => Ok(FilterOp::LessThan),
        "lte" => Ok(FilterOp::LessThanOrEqual),
        "contains" => Ok(FilterOp::Contains),
        "startsWith" => Ok(FilterOp::StartsWith),
        "endsWith" => Ok(FilterOp::EndsWith),
        "in" => Ok(FilterOp::In),
        "between" => Ok(FilterOp::Between),
        "isNull" => Ok(FilterOp::IsNull),
        "isNotNull" => Ok(FilterOp::IsNotNull),
        other => Err(PipelineError::MalformedQuery(format!(
            "unknown filter operator: {other}"
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
    fn parses_bracketed_filter_syntax() {
        let query = query_with(&[("filter[name][eq]", "alice")]);
        let parsed = StructuredParser.parse(&query).unwrap();
        assert_eq!(parsed.filters.len(), 1);
        assert_eq!(parsed.filters[0].field, "name");
        assert_eq!(parsed.filters[0].op, FilterOp::Equals);
    }

    #[test]
    fn parses_comma_separated_sort_with_directions() {
        let query = query_with(&[("sort", "name:asc,createdAt:desc")]);
        let parsed = StructuredParser.parse(&query).unwrap();
        assert_eq!(parsed.sort.len(), 2);
        assert_eq!(parsed.sort[1].direction, SortDirection::Desc);
    }

    #[test]
    fn detect_requires_bracketed_filter_key() {
        let query = query_with(&[("page", "0")]);
        assert!(!StructuredParser.detect(&query));
        let query = query_with(&[("filter[a][eq]", "b")]);
        assert!(StructuredParser.detect(&query));
    }

    #[test]
    fn is_null_filter_carries_no_value() {
        let query = query_with(&[("filter[deletedAt][isNull]", "")]);
        let parsed = StructuredParser.parse(&query).unwrap();
        assert_eq!(parsed.filters[0].value, FilterValue::None);
    }

    #[test]
    fn search_fields_list_is_trimmed_and_drops_empties() {
        let query = query_with(&[("q", "alice"), ("searchFields", "name, email ,,")]);
        let parsed = StructuredParser.parse(&query).unwrap();
        let search = parsed.search.unwrap();
        assert_eq!(
            search.fields,
            Some(vec!["name".to_owned(), "email".to_owned()])
        );
    }
}
