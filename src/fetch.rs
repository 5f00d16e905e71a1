//! Timeout-bounded fetches that never fail outward
//!
//! Every remote call goes through here. A call gets exactly one attempt, raced
//! against a timer; whatever goes wrong (timeout, transport failure, or an
//! error embedded in the response body) is logged and turned into a
//! `FetchOutcome::Fallback` carrying the caller's fallback value.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::data::{QueryError, QueryResponse, SourceError};

/// Default bound on a single remote call, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Why a fetch did not produce fresh data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchFailure {
    /// The operation did not finish within the bound
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The operation itself failed
    #[error("request failed: {0}")]
    Transport(String),

    /// The operation completed but reported an error in its payload
    #[error("query error: {0}")]
    Query(QueryError),

    /// There is nothing to fetch from
    #[error("no remote data source configured")]
    NoSource,
}

/// Result of a guarded fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The operation succeeded in time
    Fresh(T),
    /// The operation failed; `value` is the fallback, if the caller gave one
    Fallback {
        reason: FetchFailure,
        value: Option<T>,
    },
}

impl<T> FetchOutcome<T> {
    pub fn is_fresh(&self) -> bool {
        matches!(self, FetchOutcome::Fresh(_))
    }

    /// Whether the fallback path was taken, even when the fallback is `None`
    pub fn fallback_used(&self) -> bool {
        matches!(self, FetchOutcome::Fallback { .. })
    }

    /// The failure behind a fallback
    pub fn reason(&self) -> Option<&FetchFailure> {
        match self {
            FetchOutcome::Fresh(_) => None,
            FetchOutcome::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FetchOutcome::Fresh(value) => Some(value),
            FetchOutcome::Fallback { value, .. } => value.as_ref(),
        }
    }

    /// The fresh payload, or else the fallback
    pub fn into_value(self) -> Option<T> {
        match self {
            FetchOutcome::Fresh(value) => Some(value),
            FetchOutcome::Fallback { value, .. } => value,
        }
    }

    /// The fresh payload, discarding any fallback
    pub fn into_result(self) -> Result<T, FetchFailure> {
        match self {
            FetchOutcome::Fresh(value) => Ok(value),
            FetchOutcome::Fallback { reason, .. } => Err(reason),
        }
    }
}

/// Runs `operation` once, bounded by `timeout`
///
/// The timer is dropped on whichever side of the race finishes first.
async fn run_bounded<T, E, Fut>(operation: Fut, timeout: Duration) -> Result<T, FetchFailure>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(FetchFailure::Transport(e.to_string())),
        Err(_) => Err(FetchFailure::Timeout(timeout)),
    }
}

fn fall_back<T>(reason: FetchFailure, fallback: Option<T>) -> FetchOutcome<T> {
    tracing::warn!(
        reason = %reason,
        has_fallback = fallback.is_some(),
        "remote fetch failed"
    );
    FetchOutcome::Fallback {
        reason,
        value: fallback,
    }
}

/// Races `fetcher` against `timeout`, substituting `fallback` on failure
///
/// # Returns
/// * `FetchOutcome::Fresh` - the operation finished in time and succeeded
/// * `FetchOutcome::Fallback` - it timed out or failed; carries `fallback`
pub async fn fetch_with_timeout<T, E, Fut>(
    fetcher: Fut,
    timeout: Duration,
    fallback: Option<T>,
) -> FetchOutcome<T>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
{
    match run_bounded(fetcher, timeout).await {
        Ok(value) => FetchOutcome::Fresh(value),
        Err(reason) => fall_back(reason, fallback),
    }
}

/// Runs a remote query with the default timeout
///
/// See `safe_query_with_timeout`.
pub async fn safe_query<T, Fut>(query: Fut, fallback: Option<T>) -> FetchOutcome<T>
where
    Fut: Future<Output = Result<QueryResponse<T>, SourceError>>,
{
    safe_query_with_timeout(query, Duration::from_millis(DEFAULT_TIMEOUT_MS), fallback).await
}

/// Runs a remote query, inspecting the response for an embedded error
///
/// Like `fetch_with_timeout`, but a response that arrives in time with its
/// `error` set is also a failure.
pub async fn safe_query_with_timeout<T, Fut>(
    query: Fut,
    timeout: Duration,
    fallback: Option<T>,
) -> FetchOutcome<T>
where
    Fut: Future<Output = Result<QueryResponse<T>, SourceError>>,
{
    let response = match run_bounded(query, timeout).await {
        Ok(response) => response,
        Err(reason) => return fall_back(reason, fallback),
    };

    match response.into_result() {
        Ok(data) => FetchOutcome::Fresh(data),
        Err(error) => fall_back(FetchFailure::Query(error), fallback),
    }
}
