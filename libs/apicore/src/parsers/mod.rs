//! Dialect parsers: each understands one query-string convention and
//! converts it into the pipeline's unified [`ParsedRequest`](crate::request::ParsedRequest).
//!
//! Dispatch is priority-ordered and first-match-wins: AG-Grid, then MUI
//! DataGrid, then the structured dialect, then the simple dialect (which
//! never refuses — every remaining key becomes an ad-hoc equality filter,
//! so it always matches and must stay last).

pub mod ag_grid;
pub mod mui;
pub mod sanitize;
pub mod simple;
pub mod structured;

use crate::error::PipelineError;
use crate::format::ResponseDialect;
use crate::request::{ParsedRequest, RawQuery};

/// Implemented by each dialect. `detect` is a cheap, side-effect-free probe
/// run during dispatch; `parse` does the real work and is only called on
/// the first dialect whose `detect` returns true.
pub trait RequestParser {
    fn dialect(&self) -> &'static str;
    fn detect(&self, query: &RawQuery) -> bool;
    fn parse(&self, query: &RawQuery) -> Result<ParsedRequest, PipelineError>;
}

/// Parsers in priority order. The simple dialect is last and always
/// detects, acting as the universal fallback.
#[must_use]
pub fn dialects() -> Vec<Box<dyn RequestParser>> {
    vec![
        Box::new(ag_grid::AgGridParser),
        Box::new(mui::MuiDataGridParser),
        Box::new(structured::StructuredParser),
        Box::new(simple::SimpleParser),
    ]
}

/// Run dialect detection/parse in priority order and return the first
/// match. Guaranteed to return `Some` because [`simple::SimpleParser`]
/// always detects.
///
/// # Errors
/// Returns the matched dialect's parse error, if any.
pub fn parse_request(query: &RawQuery) -> Result<ParsedRequest, PipelineError> {
    for parser in dialects() {
        if parser.detect(query) {
            let mut parsed = parser.parse(query)?;
            parsed.meta.response_dialect = resolve_response_dialect(query, parsed.meta.dialect);
            return Ok(parsed);
        }
    }
    unreachable!("simple dialect always detects")
}

/// The caller picks the output dialect with `responseFormat` or `format`
/// (checked in that order); absent either, the response mirrors whichever
/// dialect the inbound query was parsed as.
fn resolve_response_dialect(query: &RawQuery, inbound_dialect: &str) -> ResponseDialect {
    first(query, "responseFormat")
        .or_else(|| first(query, "format"))
        .map_or_else(|| ResponseDialect::parse(inbound_dialect), ResponseDialect::parse)
}

/// Helper shared by every dialect: read the first value for `key`, if any.
pub(crate) fn first<'a>(query: &'a RawQuery, key: &str) -> Option<&'a str> {
    query.get(key).and_then(|v| v.first()).map(String::as_str)
}
