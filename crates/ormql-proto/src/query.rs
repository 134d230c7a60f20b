//! Ordering, paging and the combined argument set of a list field.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::filter::FilterExpression;

/// A single sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderBy {
    /// Dotted property path to sort by.
    pub path: String,
    /// Sort descending instead of ascending.
    pub descending: bool,
}

impl OrderBy {
    /// Create an ascending sort key.
    pub fn asc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            descending: false,
        }
    }

    /// Create a descending sort key.
    pub fn desc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            descending: true,
        }
    }
}

/// Paging style requested by a list field.
///
/// `skip`/`take` and `page`/`row` are independent styles; a request may use
/// one or the other, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Skip a number of rows, then take at most `take` rows.
    SkipTake {
        /// Rows to skip.
        skip: u32,
        /// Maximum rows to return, unbounded when `None`.
        take: Option<u32>,
    },
    /// Zero-based page index with `row` rows per page.
    PageRow {
        /// Zero-based page index.
        page: u32,
        /// Rows per page.
        row: u32,
    },
}

impl Paging {
    /// Resolve into `(skip, take)` bounds.
    pub fn bounds(&self) -> (usize, Option<usize>) {
        match *self {
            Paging::SkipTake { skip, take } => (skip as usize, take.map(|t| t as usize)),
            Paging::PageRow { page, row } => {
                ((page as usize).saturating_mul(row as usize), Some(row as usize))
            }
        }
    }
}

/// Arguments of a list field, already deserialized by the GraphQL layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryArguments {
    /// Restrict to entities whose key is one of these ids.
    pub ids: Option<Vec<String>>,
    /// Filter expressions, combined as an implicit group.
    #[serde(rename = "where")]
    pub where_: Vec<FilterExpression>,
    /// Sort keys applied in list order.
    pub order_by: Vec<OrderBy>,
    /// Rows to skip.
    pub skip: Option<u32>,
    /// Maximum rows to return.
    pub take: Option<u32>,
    /// Zero-based page index.
    pub page: Option<u32>,
    /// Rows per page.
    pub row: Option<u32>,
}

impl QueryArguments {
    /// Create an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a set of ids.
    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Add a filter expression.
    pub fn with_where(mut self, expression: FilterExpression) -> Self {
        self.where_.push(expression);
        self
    }

    /// Add a sort key.
    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Set skip/take paging.
    pub fn with_skip_take(mut self, skip: u32, take: Option<u32>) -> Self {
        self.skip = Some(skip);
        self.take = take;
        self
    }

    /// Set page/row paging.
    pub fn with_page(mut self, page: u32, row: u32) -> Self {
        self.page = Some(page);
        self.row = Some(row);
        self
    }

    /// Resolve the paging style of this request.
    ///
    /// `row` without `page` means the first page. `page` without `row` is
    /// rejected because the page size is unknown.
    pub fn paging(&self) -> Result<Option<Paging>, Error> {
        let skip_take = self.skip.is_some() || self.take.is_some();
        let page_row = self.page.is_some() || self.row.is_some();

        match (skip_take, page_row) {
            (true, true) => Err(Error::ConflictingPaging(
                "skip/take cannot be combined with page/row".into(),
            )),
            (true, false) => Ok(Some(Paging::SkipTake {
                skip: self.skip.unwrap_or(0),
                take: self.take,
            })),
            (false, true) => match self.row {
                Some(row) => Ok(Some(Paging::PageRow {
                    page: self.page.unwrap_or(0),
                    row,
                })),
                None => Err(Error::InvalidPaging("page requires row".into())),
            },
            (false, false) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_take_bounds() {
        let args = QueryArguments::new().with_skip_take(5, Some(10));
        let paging = args.paging().unwrap().unwrap();
        assert_eq!(paging.bounds(), (5, Some(10)));

        let args = QueryArguments {
            take: Some(3),
            ..Default::default()
        };
        assert_eq!(args.paging().unwrap().unwrap().bounds(), (0, Some(3)));
    }

    #[test]
    fn test_page_row_bounds() {
        let args = QueryArguments::new().with_page(2, 25);
        assert_eq!(args.paging().unwrap().unwrap().bounds(), (50, Some(25)));

        let args = QueryArguments {
            row: Some(10),
            ..Default::default()
        };
        assert_eq!(args.paging().unwrap().unwrap().bounds(), (0, Some(10)));
    }

    #[test]
    fn test_paging_conflicts() {
        let args = QueryArguments::new()
            .with_skip_take(1, None)
            .with_page(1, 10);
        assert!(matches!(args.paging(), Err(Error::ConflictingPaging(_))));

        let args = QueryArguments {
            page: Some(1),
            ..Default::default()
        };
        assert!(matches!(args.paging(), Err(Error::InvalidPaging(_))));

        assert_eq!(QueryArguments::new().paging().unwrap(), None);
    }

    #[test]
    fn test_deserialize_arguments() {
        let json = r#"{
            "ids": ["1", "2"],
            "where": [{"path": "Name", "value": ["x"]}],
            "orderBy": [{"path": "Age", "descending": true}, {"path": "Name"}],
            "skip": 1,
            "take": 2
        }"#;

        let args: QueryArguments = serde_json::from_str(json).unwrap();
        assert_eq!(args.ids.as_ref().unwrap().len(), 2);
        assert_eq!(args.where_.len(), 1);
        assert_eq!(args.order_by, vec![OrderBy::desc("Age"), OrderBy::asc("Name")]);
        assert_eq!(args.paging().unwrap(), Some(Paging::SkipTake { skip: 1, take: Some(2) }));
    }
}
