//! Response formatting: the same underlying result set (items + total
//! count + pagination) rendered in whichever of the seven dialects the
//! caller's framework expects. An unknown dialect name falls back to
//! `standard` rather than erroring — formatting is never the reason a
//! request fails.

use sha2::{Digest, Sha256};

use crate::request::Pagination;

/// Output dialects the formatter understands. `Other` carries the raw
/// requested name purely for logging; it always renders as `Standard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDialect {
    Standard,
    AgGrid,
    Mui,
    TanStack,
    Swr,
    Cursor,
    InfiniteScroll,
}

impl ResponseDialect {
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "ag-grid" => Self::AgGrid,
            "mui" => Self::Mui,
            "tanstack" => Self::TanStack,
            "swr" => Self::Swr,
            "cursor" => Self::Cursor,
            "infinite-scroll" => Self::InfiniteScroll,
            _ => Self::Standard,
        }
    }
}

pub struct ResultSet {
    pub items: Vec<serde_json::Value>,
    pub total: u64,
    pub pagination: Pagination,
}

pub struct ResponseFormatter;

impl ResponseFormatter {
    #[must_use]
    pub fn format(dialect: ResponseDialect, result: &ResultSet) -> serde_json::Value {
        match dialect {
            ResponseDialect::Standard => Self::standard(result),
            ResponseDialect::AgGrid => Self::ag_grid(result),
            ResponseDialect::Mui => Self::mui(result),
            ResponseDialect::TanStack => Self::tanstack(result),
            ResponseDialect::Swr => Self::swr(result),
            ResponseDialect::Cursor => Self::cursor(result),
            ResponseDialect::InfiniteScroll => Self::infinite_scroll(result),
        }
    }

    fn standard(result: &ResultSet) -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "data": result.items,
            "pagination": {
                "page": result.pagination.page,
                "pageSize": result.pagination.page_size,
                "total": result.total,
            },
        })
    }

    fn ag_grid(result: &ResultSet) -> serde_json::Value {
        serde_json::json!({
            "rowData": result.items,
            "rowCount": result.total,
        })
    }

    fn mui(result: &ResultSet) -> serde_json::Value {
        serde_json::json!({
            "rows": result.items,
            "rowCount": result.total,
        })
    }

    fn tanstack(result: &ResultSet) -> serde_json::Value {
        let page_count = if result.pagination.page_size == 0 {
            0
        } else {
            result.total.div_ceil(u64::from(result.pagination.page_size))
        };
        serde_json::json!({
            "data": result.items,
            "pageCount": page_count,
            "rowCount": result.total,
        })
    }

    fn swr(result: &ResultSet) -> serde_json::Value {
        let cache_key = cache_key(result);
        serde_json::json!({
            "data": result.items,
            "total": result.total,
            "cacheKey": cache_key,
        })
    }

    fn cursor(result: &ResultSet) -> serde_json::Value {
        let next_cursor = if result.items.is_empty() {
            None
        } else {
            Some((result.pagination.offset() + result.items.len() as u64).to_string())
        };
        serde_json::json!({
            "data": result.items,
            "nextCursor": next_cursor,
            "hasMore": result.pagination.offset() + result.items.len() as u64 < result.total,
        })
    }

    fn infinite_scroll(result: &ResultSet) -> serde_json::Value {
        let has_next_page = result.pagination.offset() + result.items.len() as u64 < result.total;
        serde_json::json!({
            "pages": [{ "data": result.items, "page": result.pagination.page }],
            "hasNextPage": has_next_page,
        })
    }
}

/// A stable cache key for the SWR dialect: a hash of the page/pageSize and
/// item count, so the client can detect that the underlying data changed
/// between requests to the same page.
fn cache_key(result: &ResultSet) -> String {
    let mut hasher = Sha256::new();
    hasher.update(result.pagination.page.to_le_bytes());
    hasher.update(result.pagination.page_size.to_le_bytes());
    hasher.update(result.total.to_le_bytes());
    hex::encode(hasher.finalize())
}
