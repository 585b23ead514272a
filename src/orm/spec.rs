//! Storage-independent description of what a field resolution should fetch

use serde_json::{Map, Value};

use super::traits::OrderDirection;
use crate::error::QuerySpecError;

/// One `order_by` entry: `"name"`, `"+name"` or `"-name"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDirective {
    pub field: String,
    pub direction: OrderDirection,
}

impl OrderDirective {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parse a directive; a leading `-` sorts descending.
    pub fn parse(raw: &str) -> Result<Self, QuerySpecError> {
        let raw = raw.trim();
        let (field, direction) = match raw.strip_prefix('-') {
            Some(rest) => (rest, OrderDirection::Desc),
            None => (raw.strip_prefix('+').unwrap_or(raw), OrderDirection::Asc),
        };

        if field.is_empty() {
            return Err(QuerySpecError::EmptyOrderBy);
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// Offset/limit window selected by `page` and `paginate_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

/// Filters, ordering and pagination intent for one field resolution.
///
/// Slicing only applies when both `page` and `paginate_by` are present;
/// either one alone leaves the query unsliced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub filters: Map<String, Value>,
    pub order_by: Vec<OrderDirective>,
    pub page: Option<i64>,
    pub paginate_by: Option<i64>,
}

impl QuerySpec {
    /// Validate raw field arguments into a spec.
    ///
    /// `filters` may be absent or `null` (no filtering) or an object; any
    /// other JSON shape is rejected.
    pub fn new(
        filters: Option<Value>,
        order_by: &[String],
        page: Option<i64>,
        paginate_by: Option<i64>,
    ) -> Result<Self, QuerySpecError> {
        let filters = match filters {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(QuerySpecError::InvalidFilters),
        };

        let order_by = order_by
            .iter()
            .map(|raw| OrderDirective::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(page) = page {
            if page < 1 {
                return Err(QuerySpecError::InvalidPage(page));
            }
        }
        if let Some(paginate_by) = paginate_by {
            if paginate_by < 1 {
                return Err(QuerySpecError::InvalidPaginateBy(paginate_by));
            }
        }

        let spec = Self {
            filters,
            order_by,
            page,
            paginate_by,
        };

        if spec.page.is_some() != spec.paginate_by.is_some() {
            tracing::debug!(
                page = ?spec.page,
                paginate_by = ?spec.paginate_by,
                "Only one of page/paginate_by given, not slicing"
            );
        }

        Ok(spec)
    }

    /// The `[(page-1)*paginate_by, page*paginate_by)` window, if both are set.
    pub fn window(&self) -> Option<Window> {
        match (self.page, self.paginate_by) {
            (Some(page), Some(limit)) => Some(Window {
                offset: (page - 1).saturating_mul(limit),
                limit,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_parse_order_directives() {
        assert_eq!(OrderDirective::parse("name").unwrap(), OrderDirective::asc("name"));
        assert_eq!(OrderDirective::parse("+year").unwrap(), OrderDirective::asc("year"));
        assert_eq!(OrderDirective::parse("-year").unwrap(), OrderDirective::desc("year"));
        assert_matches!(OrderDirective::parse("-"), Err(QuerySpecError::EmptyOrderBy));
        assert_matches!(OrderDirective::parse("  "), Err(QuerySpecError::EmptyOrderBy));
    }

    #[test]
    fn test_defaults_are_empty() {
        let spec = QuerySpec::new(None, &[], None, None).unwrap();
        assert!(spec.filters.is_empty());
        assert!(spec.order_by.is_empty());
        assert_eq!(spec.window(), None);

        let spec = QuerySpec::new(Some(Value::Null), &[], None, None).unwrap();
        assert!(spec.filters.is_empty());
    }

    #[test]
    fn test_filters_must_be_object() {
        assert_matches!(
            QuerySpec::new(Some(json!(["name"])), &[], None, None),
            Err(QuerySpecError::InvalidFilters)
        );
        assert_matches!(
            QuerySpec::new(Some(json!("name")), &[], None, None),
            Err(QuerySpecError::InvalidFilters)
        );
    }

    #[test]
    fn test_rejects_non_positive_pagination() {
        assert_matches!(
            QuerySpec::new(None, &[], Some(0), Some(10)),
            Err(QuerySpecError::InvalidPage(0))
        );
        assert_matches!(
            QuerySpec::new(None, &[], Some(1), Some(-5)),
            Err(QuerySpecError::InvalidPaginateBy(-5))
        );
    }

    #[test]
    fn test_window() {
        let spec = QuerySpec::new(None, &[], Some(2), Some(10)).unwrap();
        assert_eq!(spec.window(), Some(Window { offset: 10, limit: 10 }));

        let spec = QuerySpec::new(None, &[], Some(1), Some(25)).unwrap();
        assert_eq!(spec.window(), Some(Window { offset: 0, limit: 25 }));
    }

    #[test]
    fn test_half_specified_pagination_does_not_slice() {
        let spec = QuerySpec::new(None, &[], Some(3), None).unwrap();
        assert_eq!(spec.window(), None);

        let spec = QuerySpec::new(None, &[], None, Some(10)).unwrap();
        assert_eq!(spec.window(), None);
    }
}
