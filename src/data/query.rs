//! Query contract for the remote venue store
//!
//! The remote store is reached through the `VenueSource` trait. Queries are
//! built with `VenueQuery` and answered with a `QueryResponse`, which mirrors
//! the `{data, error}` body shape of the hosted service: a request can succeed
//! at the transport level and still carry an embedded error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{LocationCount, Venue};

/// Errors raised while talking to the remote store
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The source cannot serve requests right now
    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}

/// Error indicator embedded in a query response body
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl QueryError {
    /// Creates an error carrying only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
            hint: None,
        }
    }
}

/// Result body of a remote query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse<T> {
    /// Rows returned, absent when the query failed
    pub data: Option<T>,
    /// Embedded error indicator
    pub error: Option<QueryError>,
}

impl<T> QueryResponse<T> {
    /// A successful response
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// A response carrying an embedded error
    pub fn err(error: QueryError) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    /// Collapses the response into its payload or its error
    ///
    /// A response with neither data nor an error is reported as an error.
    pub fn into_result(self) -> Result<T, QueryError> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(QueryError::new("query returned no data")),
        }
    }
}

/// A single column predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals value
    Eq { column: String, value: String },
    /// Column contains pattern, ignoring case
    ILike { column: String, pattern: String },
}

/// Builder for a venue table query
///
/// # Example
///
/// ```
/// use softplay::data::VenueQuery;
///
/// let query = VenueQuery::new().ilike("city", "leeds").order("rating", false).limit(10);
/// assert!(query.to_params().contains(&("city".to_string(), "ilike.*leeds*".to_string())));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenueQuery {
    columns: Option<String>,
    filters: Vec<Filter>,
    order: Option<(String, bool)>,
    limit: Option<usize>,
}

impl VenueQuery {
    /// Selects every column of every venue
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the returned columns (comma separated)
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Adds an equality predicate
    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.to_string(),
        });
        self
    }

    /// Adds a case-insensitive substring predicate
    pub fn ilike(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters.push(Filter::ILike {
            column: column.into(),
            pattern: pattern.into(),
        });
        self
    }

    /// Orders the rows by `column`
    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some((column.into(), ascending));
        self
    }

    /// Caps the number of rows returned
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Renders the query as PostgREST URL parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![(
            "select".to_string(),
            self.columns.clone().unwrap_or_else(|| "*".to_string()),
        )];

        for filter in &self.filters {
            params.push(match filter {
                Filter::Eq { column, value } => (column.clone(), format!("eq.{}", value)),
                Filter::ILike { column, pattern } => {
                    (column.clone(), format!("ilike.*{}*", pattern))
                }
            });
        }

        if let Some((column, ascending)) = &self.order {
            let direction = if *ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", column, direction)));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

/// A remote store of venue records
#[async_trait]
pub trait VenueSource: Send + Sync {
    /// Runs a query against the venue table
    async fn select_venues(
        &self,
        query: &VenueQuery,
    ) -> Result<QueryResponse<Vec<Venue>>, SourceError>;

    /// Returns how many venues are listed per city
    async fn location_counts(&self) -> Result<QueryResponse<Vec<LocationCount>>, SourceError>;
}
