//! Pagination defaults for listing endpoints
//!
//! Requests carry `offset`, `limit` (0-100) and `order` (-1, 0, 1). A zero
//! limit means the default page size and a zero order means newest first.

use crate::store::SortOrder;

/// Page size used when the request gives `limit=0`
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest accepted `limit`
pub const MAX_LIMIT: i64 = 100;

/// Order used when the request gives `order=0` (descending)
pub const DEFAULT_ORDER: i64 = -1;

/// Resolved pagination for one store query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Documents to skip
    pub skip: u64,
    /// Maximum documents to return
    pub limit: u64,
    /// Sort direction on the time field
    pub order: SortOrder,
}

/// Apply defaults to validated request values
///
/// # Examples
/// ```
/// use quake_api::pagination::calculate_pagination;
/// use quake_api::store::SortOrder;
///
/// let p = calculate_pagination(20, 0, 0);
/// assert_eq!(p.skip, 20);
/// assert_eq!(p.limit, 10);
/// assert_eq!(p.order, SortOrder::Descending);
/// ```
pub fn calculate_pagination(offset: i64, limit: i64, order: i64) -> Pagination {
    let limit = match u64::try_from(limit) {
        Ok(0) | Err(_) => DEFAULT_LIMIT,
        Ok(l) => l,
    };
    let order = if order == 0 { DEFAULT_ORDER } else { order };

    Pagination {
        skip: u64::try_from(offset).unwrap_or(0),
        limit,
        order: SortOrder::from_order(order),
    }
}
